use cgmath::{Point3, Rad};
use log::debug;

use super::orbit_camera::{CameraView, OrbitCamera};
use crate::asset::Bounds;
use crate::config::CameraRigConfig;

/// Cubic ease-out: fast start, gentle landing.
pub fn ease_out_cubic(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t).powi(3)
}

/// A timed distance change interpolated geometrically between two distances.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmoothDolly {
    pub from: f32,
    pub to: f32,
    pub elapsed_ms: f32,
    pub duration_ms: f32,
}

impl SmoothDolly {
    /// Advances the animation and returns the distance for this frame and
    /// whether the animation is finished.
    fn advance(&mut self, dt_ms: f32) -> (f32, bool) {
        self.elapsed_ms += dt_ms.max(0.0);
        let t = (self.elapsed_ms / self.duration_ms).min(1.0);
        let eased = ease_out_cubic(t);
        let distance = self.from * (self.to / self.from).powf(eased);
        (distance, t >= 1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct HomePose {
    distance: f32,
    pitch: f32,
    yaw: f32,
}

/// Orbit camera plus the smoothing layer the viewer drives it through.
///
/// The orbit pivot (`current_target`) is never set directly by commands.
/// Commands set `desired_target`; every [`tick`](Self::tick) moves the pivot
/// a frame-rate independent fraction of the remaining way there while the
/// eye stays put, so a retarget turns the view instead of teleporting it.
#[derive(Debug, Clone)]
pub struct CameraRig {
    config: CameraRigConfig,
    camera: OrbitCamera,
    centroid: Point3<f32>,
    desired_target: Point3<f32>,
    current_target: Point3<f32>,
    smooth_dolly: Option<SmoothDolly>,
    auto_rotate: bool,
    home: Option<HomePose>,
}

impl CameraRig {
    pub fn new(config: CameraRigConfig) -> Self {
        let origin = Point3::new(0.0, 0.0, 0.0);
        let mut camera = OrbitCamera::new(
            5.0,
            config.initial_pitch,
            config.initial_yaw,
            origin,
            1.0,
        );
        camera.fovy = Rad(config.fovy);
        Self {
            config,
            camera,
            centroid: origin,
            desired_target: origin,
            current_target: origin,
            smooth_dolly: None,
            auto_rotate: false,
            home: None,
        }
    }

    /// Places the camera so `bounds` fills the view, keeping the current
    /// viewing direction. Also re-centers the pivot on the bounds center,
    /// sets clip planes and dolly limits, and records the home pose.
    pub fn fit_to_bounds(&mut self, bounds: &Bounds) {
        let max_dim = bounds.max_dimension().max(f32::EPSILON);
        let half_fov = self.camera.fovy.0 * 0.5;
        let distance = (max_dim * 0.5) / half_fov.tan() * self.config.fit_padding;

        self.camera.znear = (distance / 100.0).max(0.01);
        self.camera.zfar = (self.camera.znear * 10.0).max(distance * 50.0);
        self.camera.bounds.min_distance = Some(distance * self.config.min_distance_ratio);
        self.camera.bounds.max_distance = Some(distance * self.config.max_distance_ratio);

        let center = bounds.center();
        self.centroid = center;
        self.desired_target = center;
        self.current_target = center;
        self.smooth_dolly = None;
        self.camera.target = center;
        self.camera.set_distance(distance);

        self.home = Some(HomePose {
            distance: self.camera.distance,
            pitch: self.camera.pitch,
            yaw: self.camera.yaw,
        });
        debug!(
            "camera fitted: distance {:.3}, near {:.4}, far {:.1}",
            distance, self.camera.znear, self.camera.zfar
        );
    }

    /// Sets the point the pivot eases toward; `None` means the asset centroid.
    pub fn set_desired_target(&mut self, target: Option<Point3<f32>>) {
        self.desired_target = target.unwrap_or(self.centroid);
    }

    /// Advances smoothing, the smooth dolly and auto-rotation by `dt` seconds.
    pub fn tick(&mut self, dt: f32) {
        let dt = dt.max(0.0);

        let alpha = 1.0 - (1.0 - self.config.target_smoothing).powf(dt * 60.0);
        if alpha > 0.0 {
            self.current_target += (self.desired_target - self.current_target) * alpha;
            self.camera.retarget_keep_eye(self.current_target);
        }

        if let Some(mut dolly) = self.smooth_dolly.take() {
            let (distance, finished) = dolly.advance(dt * 1000.0);
            self.camera.set_distance(distance);
            if !finished {
                self.smooth_dolly = Some(dolly);
            }
        }

        if self.auto_rotate {
            self.camera.add_yaw(self.config.auto_rotate_speed * dt);
        }
    }

    /// Multiplies the distance by `factor`, clamped to the dolly limits.
    /// Cancels any smooth dolly in flight.
    pub fn dolly(&mut self, factor: f32) {
        if !(factor.is_finite() && factor > 0.0) {
            return;
        }
        self.smooth_dolly = None;
        self.camera.set_distance(self.camera.distance * factor);
    }

    /// Eases the distance to `distance * factor` over `duration_ms`.
    pub fn dolly_smooth(&mut self, factor: f32, duration_ms: f32) {
        if !(factor.is_finite() && factor > 0.0) {
            return;
        }
        let from = self.camera.distance;
        if duration_ms <= 0.0 {
            self.dolly(factor);
            return;
        }
        let bounds = self.camera.bounds;
        let to = (from * factor).clamp(
            bounds.min_distance.unwrap_or(f32::EPSILON),
            bounds.max_distance.unwrap_or(f32::MAX),
        );
        self.smooth_dolly = Some(SmoothDolly {
            from,
            to,
            elapsed_ms: 0.0,
            duration_ms,
        });
    }

    pub fn orbit(&mut self, delta_yaw: f32, delta_pitch: f32) {
        self.camera.add_yaw(delta_yaw);
        self.camera.add_pitch(delta_pitch);
    }

    /// Pans eye, pivot and desired target together.
    pub fn pan(&mut self, delta: (f32, f32)) {
        let movement = self.camera.pan(delta);
        self.current_target += movement;
        self.desired_target += movement;
    }

    pub fn set_auto_rotate(&mut self, enabled: bool) {
        self.auto_rotate = enabled;
    }

    pub fn is_auto_rotating(&self) -> bool {
        self.auto_rotate
    }

    /// Returns pivot and orientation to the pose saved by the last fit.
    pub fn reset(&mut self) {
        self.smooth_dolly = None;
        self.desired_target = self.centroid;
        self.current_target = self.centroid;
        self.camera.target = self.centroid;
        if let Some(home) = self.home {
            self.camera.yaw = home.yaw;
            self.camera.set_pitch(home.pitch);
            self.camera.set_distance(home.distance);
        } else {
            self.camera.set_distance(self.camera.distance);
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.camera.resize_projection(width, height);
    }

    pub fn view(&self) -> CameraView {
        self.camera.view()
    }

    pub fn camera(&self) -> &OrbitCamera {
        &self.camera
    }

    pub fn distance(&self) -> f32 {
        self.camera.distance
    }

    pub fn current_target(&self) -> Point3<f32> {
        self.current_target
    }

    pub fn desired_target(&self) -> Point3<f32> {
        self.desired_target
    }

    pub fn centroid(&self) -> Point3<f32> {
        self.centroid
    }

    pub fn is_dollying(&self) -> bool {
        self.smooth_dolly.is_some()
    }
}
