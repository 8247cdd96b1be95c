use cgmath::*;

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.5,
    0.0, 0.0, 0.0, 1.0,
);

/// Snapshot of the camera handed to the rendering backend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraView {
    pub eye: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
    pub fovy: Rad<f32>,
    pub znear: f32,
    pub zfar: f32,
}

impl CameraView {
    pub fn view_projection(&self, aspect: f32) -> Matrix4<f32> {
        let view = Matrix4::look_at_rh(self.eye, self.target, self.up);
        let proj = OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, aspect, self.znear, self.zfar);
        proj * view
    }
}

/// Camera orbiting a target at `distance`, oriented by `pitch` and `yaw`.
#[derive(Debug, Clone, Copy)]
pub struct OrbitCamera {
    pub distance: f32,
    pub pitch: f32,
    pub yaw: f32,
    pub eye: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
    pub bounds: OrbitCameraBounds,
    pub aspect: f32,
    pub fovy: Rad<f32>,
    pub znear: f32,
    pub zfar: f32,
}

impl OrbitCamera {
    pub fn new(distance: f32, pitch: f32, yaw: f32, target: Point3<f32>, aspect: f32) -> Self {
        let mut camera = Self {
            distance,
            pitch,
            yaw,
            eye: target, // recomputed in `update()`
            target,
            up: Vector3::unit_y(),
            bounds: OrbitCameraBounds::default(),
            aspect,
            fovy: Rad(std::f32::consts::FRAC_PI_4),
            znear: 0.1,
            zfar: 1000.0,
        };
        camera.update();
        camera
    }

    pub fn set_distance(&mut self, distance: f32) {
        self.distance = distance.clamp(
            self.bounds.min_distance.unwrap_or(f32::EPSILON),
            self.bounds.max_distance.unwrap_or(f32::MAX),
        );
        self.update();
    }

    pub fn set_pitch(&mut self, pitch: f32) {
        self.pitch = pitch.clamp(self.bounds.min_pitch, self.bounds.max_pitch);
        self.update();
    }

    pub fn add_pitch(&mut self, delta: f32) {
        self.set_pitch(self.pitch + delta);
    }

    pub fn set_yaw(&mut self, yaw: f32) {
        self.yaw = yaw.rem_euclid(std::f32::consts::TAU);
        self.update();
    }

    pub fn add_yaw(&mut self, delta: f32) {
        self.set_yaw(self.yaw + delta);
    }

    /// Moves the orbit pivot to `target` while the eye stays where it is.
    /// Distance, pitch and yaw are re-derived from the new offset.
    pub fn retarget_keep_eye(&mut self, target: Point3<f32>) {
        let offset = self.eye - target;
        let distance = offset.magnitude();
        self.target = target;
        if distance <= f32::EPSILON {
            // eye on top of the pivot: keep the old orientation
            self.update();
            return;
        }
        self.distance = distance;
        self.pitch = (offset.y / distance)
            .clamp(-1.0, 1.0)
            .asin()
            .clamp(self.bounds.min_pitch, self.bounds.max_pitch);
        self.yaw = offset.x.atan2(offset.z).rem_euclid(std::f32::consts::TAU);
        self.update();
    }

    /// Pans the camera relative to the current view direction.
    /// Returns the world-space offset applied to both eye and target.
    pub fn pan(&mut self, delta: (f32, f32)) -> Vector3<f32> {
        let forward = (self.target - self.eye).normalize();
        let right = forward.cross(self.up).normalize();
        let up = right.cross(forward).normalize();

        // scale by distance for a consistent feel at all zoom levels
        let pan_scale = self.distance * 0.1;
        let movement = right * delta.0 * pan_scale + up * delta.1 * pan_scale;

        self.eye += movement;
        self.target += movement;
        movement
    }

    /// Unit vector from the target toward the eye.
    pub fn view_direction(&self) -> Vector3<f32> {
        direction_from_angles(self.pitch, self.yaw)
    }

    /// Recomputes the eye after changing `distance`, `pitch`, `yaw` or `target`.
    fn update(&mut self) {
        self.eye = self.target + direction_from_angles(self.pitch, self.yaw) * self.distance;
    }

    pub fn resize_projection(&mut self, width: u32, height: u32) {
        if height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    pub fn view(&self) -> CameraView {
        CameraView {
            eye: self.eye,
            target: self.target,
            up: self.up,
            fovy: self.fovy,
            znear: self.znear,
            zfar: self.zfar,
        }
    }

    pub fn build_view_projection_matrix(&self) -> Matrix4<f32> {
        self.view().view_projection(self.aspect)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct OrbitCameraBounds {
    pub min_distance: Option<f32>,
    pub max_distance: Option<f32>,
    pub min_pitch: f32,
    pub max_pitch: f32,
}

impl Default for OrbitCameraBounds {
    fn default() -> Self {
        Self {
            min_distance: None,
            max_distance: None,
            min_pitch: -std::f32::consts::FRAC_PI_2 + 0.01,
            max_pitch: std::f32::consts::FRAC_PI_2 - 0.01,
        }
    }
}

fn direction_from_angles(pitch: f32, yaw: f32) -> Vector3<f32> {
    Vector3::new(yaw.sin() * pitch.cos(), pitch.sin(), yaw.cos() * pitch.cos())
}
