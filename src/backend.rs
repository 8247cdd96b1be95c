//! # Rendering Backend Interface
//!
//! [`SceneBackend`] lists everything the viewer needs from a rendering
//! engine. The viewer owns all scene state (clip times, opacities, camera)
//! and pushes the results through this trait, so engines can be swapped
//! without touching controller logic.
//!
//! Two implementations ship with the crate:
//!
//! - [`HeadlessBackend`]: records every write. Used by tests and by hosts
//!   that only need the controller (e.g. server-side pose computation).
//! - [`crate::gfx::GpuBackend`]: draws the asset with wgpu.

use std::collections::HashMap;

use cgmath::Matrix4;

use crate::asset::{LoadedAsset, NodeId};
use crate::camera::CameraView;
use crate::config::LightRig;
use crate::error::ViewerError;

pub trait SceneBackend {
    /// Uploads geometry and materials of a new asset. Called after the
    /// previous asset was detached.
    fn attach_asset(&mut self, asset: &LoadedAsset) -> Result<(), ViewerError>;

    /// Releases everything uploaded by `attach_asset`.
    fn detach_asset(&mut self);

    fn set_camera(&mut self, view: &CameraView);

    fn set_node_transform(&mut self, node: NodeId, world: Matrix4<f32>);

    fn set_node_opacity(&mut self, node: NodeId, opacity: f32);

    fn set_node_visible(&mut self, node: NodeId, visible: bool);

    fn set_exposure(&mut self, exposure: f32);

    fn set_lighting(&mut self, light_rig: LightRig, environment_intensity: f32);
}

/// Summary of the asset a [`HeadlessBackend`] currently holds.
#[derive(Debug, Clone, PartialEq)]
pub struct AttachedAsset {
    pub root_name: String,
    pub node_count: usize,
    pub clip_count: usize,
}

/// A backend that renders nothing and remembers everything.
#[derive(Debug, Clone)]
pub struct HeadlessBackend {
    attached: Option<AttachedAsset>,
    camera: Option<CameraView>,
    transforms: HashMap<NodeId, Matrix4<f32>>,
    opacities: HashMap<NodeId, f32>,
    visibility: HashMap<NodeId, bool>,
    exposure: f32,
    lighting: Option<(LightRig, f32)>,
    attach_count: usize,
    detach_count: usize,
    fail_next_attach: Option<String>,
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self {
            attached: None,
            camera: None,
            transforms: HashMap::new(),
            opacities: HashMap::new(),
            visibility: HashMap::new(),
            exposure: 1.0,
            lighting: None,
            attach_count: 0,
            detach_count: 0,
            fail_next_attach: None,
        }
    }
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `attach_asset` fail with `reason`.
    pub fn fail_next_attach(&mut self, reason: impl Into<String>) {
        self.fail_next_attach = Some(reason.into());
    }

    pub fn attached(&self) -> Option<&AttachedAsset> {
        self.attached.as_ref()
    }

    pub fn camera(&self) -> Option<&CameraView> {
        self.camera.as_ref()
    }

    pub fn node_transform(&self, node: NodeId) -> Option<Matrix4<f32>> {
        self.transforms.get(&node).copied()
    }

    pub fn node_opacity(&self, node: NodeId) -> Option<f32> {
        self.opacities.get(&node).copied()
    }

    pub fn node_visible(&self, node: NodeId) -> Option<bool> {
        self.visibility.get(&node).copied()
    }

    pub fn exposure(&self) -> f32 {
        self.exposure
    }

    pub fn lighting(&self) -> Option<(LightRig, f32)> {
        self.lighting
    }

    pub fn attach_count(&self) -> usize {
        self.attach_count
    }

    pub fn detach_count(&self) -> usize {
        self.detach_count
    }
}

impl SceneBackend for HeadlessBackend {
    fn attach_asset(&mut self, asset: &LoadedAsset) -> Result<(), ViewerError> {
        if let Some(reason) = self.fail_next_attach.take() {
            return Err(ViewerError::Backend(reason));
        }
        self.attached = Some(AttachedAsset {
            root_name: asset
                .graph
                .node(asset.graph.root())
                .map(|n| n.name.clone())
                .unwrap_or_default(),
            node_count: asset.graph.len(),
            clip_count: asset.clips.len(),
        });
        self.attach_count += 1;
        Ok(())
    }

    fn detach_asset(&mut self) {
        if self.attached.take().is_some() {
            self.detach_count += 1;
        }
        self.transforms.clear();
        self.opacities.clear();
        self.visibility.clear();
    }

    fn set_camera(&mut self, view: &CameraView) {
        self.camera = Some(*view);
    }

    fn set_node_transform(&mut self, node: NodeId, world: Matrix4<f32>) {
        self.transforms.insert(node, world);
    }

    fn set_node_opacity(&mut self, node: NodeId, opacity: f32) {
        self.opacities.insert(node, opacity);
    }

    fn set_node_visible(&mut self, node: NodeId, visible: bool) {
        self.visibility.insert(node, visible);
    }

    fn set_exposure(&mut self, exposure: f32) {
        self.exposure = exposure;
    }

    fn set_lighting(&mut self, light_rig: LightRig, environment_intensity: f32) {
        self.lighting = Some((light_rig, environment_intensity));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::{AssetLoader, AssetSource};

    #[test]
    fn test_headless_records_attach_and_detach() {
        let asset =
            AssetLoader::decode(&AssetSource::bytes("o a\nv 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n"))
                .unwrap();
        let mut backend = HeadlessBackend::new();
        backend.attach_asset(&asset).unwrap();
        backend.set_node_opacity(1, 0.5);
        assert_eq!(backend.attached().unwrap().node_count, 2);
        assert_eq!(backend.node_opacity(1), Some(0.5));

        backend.detach_asset();
        assert!(backend.attached().is_none());
        assert_eq!(backend.node_opacity(1), None);
        assert_eq!(backend.detach_count(), 1);
    }

    #[test]
    fn test_injected_attach_failure_fires_once() {
        let asset =
            AssetLoader::decode(&AssetSource::bytes("o a\nv 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n"))
                .unwrap();
        let mut backend = HeadlessBackend::new();
        backend.fail_next_attach("out of memory");
        assert!(matches!(
            backend.attach_asset(&asset),
            Err(ViewerError::Backend(_))
        ));
        assert!(backend.attach_asset(&asset).is_ok());
    }
}
