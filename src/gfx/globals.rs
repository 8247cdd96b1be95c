//! # Frame Globals
//!
//! Per-frame uniform shared by every draw: camera, light rig and exposure.
//! The light rigs are plain data so they can be checked without a GPU.

use cgmath::{InnerSpace, Matrix4, SquareMatrix, Vector3};

use crate::camera::CameraView;
use crate::config::LightRig;

pub const MAX_LIGHTS: usize = 3;

const SKY_COLOR: [f32; 3] = [0.86, 0.91, 1.0];
const GROUND_COLOR: [f32; 3] = [0.34, 0.30, 0.26];

/// One directional light: unit vector towards the light plus intensity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    pub direction: Vector3<f32>,
    pub intensity: f32,
}

impl DirectionalLight {
    fn new(x: f32, y: f32, z: f32, intensity: f32) -> Self {
        Self {
            direction: Vector3::new(x, y, z).normalize(),
            intensity,
        }
    }
}

/// Lighting terms derived from a [`LightRig`].
#[derive(Debug, Clone, PartialEq)]
pub struct LightSetup {
    pub lights: Vec<DirectionalLight>,
    /// Flat ambient term.
    pub ambient: f32,
    /// Weight of the sky/ground gradient; 0 disables it.
    pub hemisphere: f32,
}

impl LightSetup {
    pub fn for_rig(rig: LightRig, environment_intensity: f32) -> Self {
        let env = environment_intensity.max(0.0);
        match rig {
            LightRig::Studio => Self {
                lights: vec![
                    DirectionalLight::new(0.5, 0.8, 0.6, 1.0),
                    DirectionalLight::new(-0.7, 0.3, 0.4, 0.35),
                    DirectionalLight::new(0.0, 0.4, -1.0, 0.5),
                ],
                ambient: 0.12 * env,
                hemisphere: 0.0,
            },
            LightRig::Hemisphere => Self {
                lights: vec![DirectionalLight::new(0.3, 1.0, 0.4, 0.45)],
                ambient: 0.0,
                hemisphere: 0.75 * env,
            },
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GlobalUniform {
    pub view_proj: [[f32; 4]; 4],
    pub eye: [f32; 4],
    /// xyz towards the light, w intensity.
    pub lights: [[f32; 4]; MAX_LIGHTS],
    /// rgb sky color, w hemisphere weight.
    pub sky: [f32; 4],
    /// rgb ground color, w flat ambient.
    pub ground: [f32; 4],
    /// x exposure, y light count.
    pub params: [f32; 4],
}

impl Default for GlobalUniform {
    fn default() -> Self {
        Self {
            view_proj: Matrix4::identity().into(),
            eye: [0.0, 0.0, 1.0, 1.0],
            lights: [[0.0; 4]; MAX_LIGHTS],
            sky: [0.0; 4],
            ground: [0.0; 4],
            params: [1.0, 0.0, 0.0, 0.0],
        }
    }
}

impl GlobalUniform {
    pub fn new(view: Option<&CameraView>, aspect: f32, lighting: &LightSetup, exposure: f32) -> Self {
        let mut uniform = Self::default();
        if let Some(view) = view {
            uniform.view_proj = view.view_projection(aspect).into();
            uniform.eye = [view.eye.x, view.eye.y, view.eye.z, 1.0];
        }
        for (slot, light) in uniform.lights.iter_mut().zip(&lighting.lights) {
            *slot = [
                light.direction.x,
                light.direction.y,
                light.direction.z,
                light.intensity,
            ];
        }
        uniform.sky = [SKY_COLOR[0], SKY_COLOR[1], SKY_COLOR[2], lighting.hemisphere];
        uniform.ground = [
            GROUND_COLOR[0],
            GROUND_COLOR[1],
            GROUND_COLOR[2],
            lighting.ambient,
        ];
        uniform.params = [
            exposure.max(0.0),
            lighting.lights.len().min(MAX_LIGHTS) as f32,
            0.0,
            0.0,
        ];
        uniform
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_studio_rig_uses_three_lights() {
        let setup = LightSetup::for_rig(LightRig::Studio, 1.0);
        assert_eq!(setup.lights.len(), 3);
        assert_eq!(setup.hemisphere, 0.0);
        for light in &setup.lights {
            assert!((light.direction.magnitude() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_environment_intensity_scales_hemisphere() {
        let dim = LightSetup::for_rig(LightRig::Hemisphere, 0.4);
        let bright = LightSetup::for_rig(LightRig::Hemisphere, 0.8);
        assert!((bright.hemisphere - 2.0 * dim.hemisphere).abs() < 1e-6);
        assert_eq!(dim.lights.len(), 1);
    }

    #[test]
    fn test_uniform_packs_exposure_and_light_count() {
        let setup = LightSetup::for_rig(LightRig::Studio, 1.0);
        let uniform = GlobalUniform::new(None, 1.0, &setup, 1.5);
        assert_eq!(uniform.params[0], 1.5);
        assert_eq!(uniform.params[1], 3.0);
        assert_eq!(uniform.lights[0][3], 1.0);
    }

    #[test]
    fn test_uniform_size_is_16_byte_aligned() {
        assert_eq!(std::mem::size_of::<GlobalUniform>() % 16, 0);
    }
}
