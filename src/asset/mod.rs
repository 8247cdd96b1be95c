//! # Asset Loading Module
//!
//! Decodes external 3D containers into the viewer's normalized
//! representation: a [`SceneGraph`] plus zero or more explode
//! [`AnimationClip`]s.
//!
//! ## Supported Formats
//!
//! - **Wavefront OBJ** (`.obj` + optional `.mtl`) through `tobj`. No clips.
//! - **glTF 2.0** (`.gltf` / `.glb`) through `gltf`, including animations.
//!
//! ## Usage
//!
//! ```no_run
//! use explodeview::asset::{AssetLoader, AssetSource};
//!
//! let asset = AssetLoader::decode(&AssetSource::path("product.glb"))?;
//! println!("{} nodes, {} clips", asset.graph.len(), asset.clips.len());
//! # Ok::<(), explodeview::error::LoadError>(())
//! ```

pub mod animation;
pub mod gltf_decoder;
pub mod obj_decoder;
pub mod scene_graph;

use std::path::{Path, PathBuf};

use cgmath::{EuclideanSpace, Matrix4, Point3, SquareMatrix, Vector3, Zero};
use log::info;

pub use animation::{AnimationClip, Interpolation, Track, TrackValues};
pub use scene_graph::{Bounds, MeshData, NodeId, Pose, SceneGraph, SceneNode, Transform};

use crate::error::LoadError;

/// Container formats the loader understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetFormat {
    Obj,
    Gltf,
}

impl AssetFormat {
    /// Picks a format from a file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        match extension.as_str() {
            "obj" => Ok(Self::Obj),
            "gltf" | "glb" => Ok(Self::Gltf),
            other => Err(LoadError::UnsupportedFormat(format!(
                "unknown extension '{other}' for {}",
                path.display()
            ))),
        }
    }

    /// Guesses a format from content: binary glTF magic or a JSON object
    /// means glTF, anything else is treated as OBJ text.
    pub fn sniff(bytes: &[u8]) -> Self {
        if bytes.starts_with(b"glTF") {
            return Self::Gltf;
        }
        match bytes.iter().find(|b| !b.is_ascii_whitespace()) {
            Some(b'{') => Self::Gltf,
            _ => Self::Obj,
        }
    }
}

/// Where an asset comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum AssetSource {
    Path(PathBuf),
    Bytes {
        data: Vec<u8>,
        /// `None` sniffs the format from the content.
        format: Option<AssetFormat>,
    },
}

impl AssetSource {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self::Path(path.into())
    }

    pub fn bytes(data: impl Into<Vec<u8>>) -> Self {
        Self::Bytes {
            data: data.into(),
            format: None,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Path(path) => path.display().to_string(),
            Self::Bytes { data, .. } => format!("<{} bytes>", data.len()),
        }
    }
}

/// A decoded asset, ready to be handed to the viewer.
#[derive(Debug, Clone)]
pub struct LoadedAsset {
    pub graph: SceneGraph,
    pub clips: Vec<AnimationClip>,
    /// Rest-pose bounds, before any pivot offset.
    pub bounds: Bounds,
    /// Translation applied above the root to re-center the asset.
    pub pivot_offset: Vector3<f32>,
}

impl LoadedAsset {
    /// Wraps a decoded graph; fails when nothing in it can be drawn.
    pub fn new(graph: SceneGraph, clips: Vec<AnimationClip>) -> Result<Self, LoadError> {
        let worlds = graph.world_matrices(&graph.rest_pose(), Matrix4::identity());
        let bounds = graph
            .bounds_of(graph.root(), &worlds)
            .ok_or(LoadError::NoRenderableGeometry)?;
        Ok(Self {
            graph,
            clips,
            bounds,
            pivot_offset: Vector3::zero(),
        })
    }

    /// Moves the pivot so the bounds center sits at the origin.
    pub fn with_centered_pivot(mut self) -> Self {
        self.pivot_offset = -self.bounds.center().to_vec();
        self
    }

    /// Transform applied above the root: `placement * pivot`.
    pub fn root_transform(&self, placement: Matrix4<f32>) -> Matrix4<f32> {
        placement * Matrix4::from_translation(self.pivot_offset)
    }

    /// Asset centroid in viewer space (pivot applied, no placement).
    pub fn centroid(&self) -> Point3<f32> {
        self.bounds.center() + self.pivot_offset
    }

    /// Bounds in viewer space (pivot applied, no placement).
    pub fn view_bounds(&self) -> Bounds {
        self.bounds
            .transformed(&Matrix4::from_translation(self.pivot_offset))
    }

    pub fn has_clips(&self) -> bool {
        !self.clips.is_empty()
    }

    /// World position of `node` in the given pose.
    pub fn node_focus(&self, node: NodeId, pose: &Pose, placement: Matrix4<f32>) -> Option<Point3<f32>> {
        let worlds = self.graph.world_matrices(pose, self.root_transform(placement));
        self.graph.focus_point(node, &worlds)
    }
}

/// Front door for decoding any supported [`AssetSource`].
pub struct AssetLoader;

impl AssetLoader {
    /// Decodes synchronously. The result is complete or an error; nothing is
    /// partially built.
    pub fn decode(source: &AssetSource) -> Result<LoadedAsset, LoadError> {
        let (graph, clips) = match source {
            AssetSource::Path(path) => match AssetFormat::from_path(path)? {
                AssetFormat::Obj => (obj_decoder::decode_path(path)?, Vec::new()),
                AssetFormat::Gltf => gltf_decoder::decode_path(path)?,
            },
            AssetSource::Bytes { data, format } => {
                match format.unwrap_or_else(|| AssetFormat::sniff(data)) {
                    AssetFormat::Obj => (obj_decoder::decode_bytes(data)?, Vec::new()),
                    AssetFormat::Gltf => gltf_decoder::decode_bytes(data)?,
                }
            }
        };

        let asset = LoadedAsset::new(graph, clips)?;
        info!(
            "decoded {}: {} nodes, {} clips",
            source.describe(),
            asset.graph.len(),
            asset.clips.len()
        );
        Ok(asset)
    }
}
