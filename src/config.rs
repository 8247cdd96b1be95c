//! # Viewer Configuration
//!
//! Tuning constants for every controller in the viewer, grouped per
//! component. All structs implement [`Default`] with the values the viewer
//! ships with and expose `with_*` builder methods for overrides.
//!
//! ## Usage
//!
//! ```no_run
//! use explodeview::config::{RenderProfile, ViewerConfig};
//!
//! let config = ViewerConfig::default()
//!     .with_profile(RenderProfile::mobile());
//! ```
//!
//! The two [`RenderProfile`] presets replace the separate desktop and mobile
//! builds: they differ only in light rig, environment intensity, pivot
//! centering and how section names are discovered.

/// Light arrangement the rendering backend should use.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightRig {
    /// Key, fill and rim directional lights.
    Studio,
    /// Single sky/ground hemisphere light with a soft key.
    Hemisphere,
}

/// How part names are matched against the named-section pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionPromotion {
    /// Only the part's own name is considered.
    OwnName,
    /// The part's own name first, then descendant names in traversal order.
    /// `max_depth` limits how far below the part to look (`None` = unbounded).
    Descendants { max_depth: Option<usize> },
}

/// Per-deployment rendering and asset-interpretation choices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderProfile {
    pub light_rig: LightRig,
    pub environment_intensity: f32,
    /// Re-center the asset on its bounding-box center at load time.
    pub center_pivot: bool,
    pub section_promotion: SectionPromotion,
}

impl RenderProfile {
    /// Desktop preset: studio lighting, asset left where the file puts it,
    /// sections matched on part names only.
    pub fn desktop() -> Self {
        Self {
            light_rig: LightRig::Studio,
            environment_intensity: 1.0,
            center_pivot: false,
            section_promotion: SectionPromotion::OwnName,
        }
    }

    /// Mobile preset: hemisphere lighting, pivot centering, and section names
    /// promoted from any descendant.
    pub fn mobile() -> Self {
        Self {
            light_rig: LightRig::Hemisphere,
            environment_intensity: 0.8,
            center_pivot: true,
            section_promotion: SectionPromotion::Descendants { max_depth: None },
        }
    }

    pub fn with_light_rig(mut self, light_rig: LightRig) -> Self {
        self.light_rig = light_rig;
        self
    }

    pub fn with_environment_intensity(mut self, intensity: f32) -> Self {
        self.environment_intensity = intensity.max(0.0);
        self
    }

    pub fn with_center_pivot(mut self, center_pivot: bool) -> Self {
        self.center_pivot = center_pivot;
        self
    }

    pub fn with_section_promotion(mut self, promotion: SectionPromotion) -> Self {
        self.section_promotion = promotion;
        self
    }
}

impl Default for RenderProfile {
    fn default() -> Self {
        Self::desktop()
    }
}

/// Camera rig tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraRigConfig {
    /// Fraction of the remaining target distance closed per frame at 60 Hz.
    pub target_smoothing: f32,
    /// Margin applied by `fit_to_bounds` (>1 adds space around the asset).
    pub fit_padding: f32,
    /// Minimum dolly distance as a multiple of the fitted distance.
    pub min_distance_ratio: f32,
    /// Maximum dolly distance as a multiple of the fitted distance.
    pub max_distance_ratio: f32,
    /// Auto-rotate speed in radians per second.
    pub auto_rotate_speed: f32,
    /// Vertical field of view in radians.
    pub fovy: f32,
    pub initial_pitch: f32,
    pub initial_yaw: f32,
}

impl Default for CameraRigConfig {
    fn default() -> Self {
        Self {
            target_smoothing: 0.18,
            fit_padding: 1.2,
            min_distance_ratio: 0.05,
            max_distance_ratio: 20.0,
            auto_rotate_speed: 0.5,
            fovy: std::f32::consts::FRAC_PI_4,
            initial_pitch: 0.35,
            initial_yaw: 0.6,
        }
    }
}

impl CameraRigConfig {
    pub fn with_target_smoothing(mut self, smoothing: f32) -> Self {
        self.target_smoothing = smoothing.clamp(0.0, 1.0);
        self
    }

    pub fn with_fit_padding(mut self, padding: f32) -> Self {
        self.fit_padding = padding.max(f32::EPSILON);
        self
    }

    pub fn with_auto_rotate_speed(mut self, speed: f32) -> Self {
        self.auto_rotate_speed = speed;
        self
    }
}

/// Explode animation tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExplodeConfig {
    /// Distance multiplier applied when entering the exploded state.
    pub zoom_factor: f32,
    pub zoom_duration_ms: f32,
}

impl Default for ExplodeConfig {
    fn default() -> Self {
        Self {
            zoom_factor: 1.28,
            zoom_duration_ms: 400.0,
        }
    }
}

impl ExplodeConfig {
    pub fn with_zoom(mut self, factor: f32, duration_ms: f32) -> Self {
        self.zoom_factor = factor.max(f32::EPSILON);
        self.zoom_duration_ms = duration_ms.max(0.0);
        self
    }
}

/// Gesture classification thresholds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureConfig {
    pub pinch_min_scale: f32,
    pub pinch_max_scale: f32,
    /// Minimum vertical travel for a swipe, in pixels.
    pub swipe_min_distance: f32,
    /// Vertical travel must exceed horizontal travel by this ratio.
    pub swipe_dominance: f32,
    pub swipe_max_duration_ms: f64,
    /// Zoom strength per 100 units of modified wheel delta.
    pub wheel_zoom_strength: f32,
    /// Minimum |deltaY| for an unmodified wheel event to change stage.
    pub wheel_stage_threshold: f32,
    pub wheel_cooldown_ms: f64,
    /// Pixels per line for line-based wheel deltas.
    pub wheel_line_height: f32,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            pinch_min_scale: 0.2,
            pinch_max_scale: 5.0,
            swipe_min_distance: 44.0,
            swipe_dominance: 1.5,
            swipe_max_duration_ms: 600.0,
            wheel_zoom_strength: 0.15,
            wheel_stage_threshold: 30.0,
            wheel_cooldown_ms: 260.0,
            wheel_line_height: 40.0,
        }
    }
}

impl GestureConfig {
    pub fn with_wheel_cooldown_ms(mut self, cooldown_ms: f64) -> Self {
        self.wheel_cooldown_ms = cooldown_ms.max(0.0);
        self
    }

    pub fn with_swipe(mut self, min_distance: f32, dominance: f32, max_duration_ms: f64) -> Self {
        self.swipe_min_distance = min_distance;
        self.swipe_dominance = dominance;
        self.swipe_max_duration_ms = max_duration_ms;
        self
    }
}

/// Isolation / visibility masking constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IsolationConfig {
    /// Opacity applied to non-focused parts when a section is isolated.
    pub dim_opacity: f32,
    pub min_dim_opacity: f32,
    pub max_dim_opacity: f32,
    /// Base opacities at or above this are treated as fully opaque.
    pub opaque_threshold: f32,
    /// Material opacities at or below this are recorded as 1.0.
    pub min_material_opacity: f32,
}

impl Default for IsolationConfig {
    fn default() -> Self {
        Self {
            dim_opacity: 0.22,
            min_dim_opacity: 0.08,
            max_dim_opacity: 0.5,
            opaque_threshold: 0.98,
            min_material_opacity: 0.01,
        }
    }
}

impl IsolationConfig {
    pub fn with_dim_opacity(mut self, dim_opacity: f32) -> Self {
        self.dim_opacity = dim_opacity;
        self
    }
}

/// Complete viewer configuration.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ViewerConfig {
    pub profile: RenderProfile,
    pub camera: CameraRigConfig,
    pub explode: ExplodeConfig,
    pub gestures: GestureConfig,
    pub isolation: IsolationConfig,
}

impl ViewerConfig {
    pub fn with_profile(mut self, profile: RenderProfile) -> Self {
        self.profile = profile;
        self
    }

    pub fn with_camera(mut self, camera: CameraRigConfig) -> Self {
        self.camera = camera;
        self
    }

    pub fn with_explode(mut self, explode: ExplodeConfig) -> Self {
        self.explode = explode;
        self
    }

    pub fn with_gestures(mut self, gestures: GestureConfig) -> Self {
        self.gestures = gestures;
        self
    }

    pub fn with_isolation(mut self, isolation: IsolationConfig) -> Self {
        self.isolation = isolation;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profiles_differ_in_section_promotion() {
        assert_eq!(
            RenderProfile::desktop().section_promotion,
            SectionPromotion::OwnName
        );
        assert_eq!(
            RenderProfile::mobile().section_promotion,
            SectionPromotion::Descendants { max_depth: None }
        );
        assert!(RenderProfile::mobile().center_pivot);
    }

    #[test]
    fn test_builder_clamps() {
        let camera = CameraRigConfig::default().with_target_smoothing(3.0);
        assert_eq!(camera.target_smoothing, 1.0);

        let explode = ExplodeConfig::default().with_zoom(-1.0, -5.0);
        assert!(explode.zoom_factor > 0.0);
        assert_eq!(explode.zoom_duration_ms, 0.0);
    }
}
