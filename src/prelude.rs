//! # Prelude
//!
//! The types most hosts need, in one import.
//!
//! ## Usage
//!
//! ```no_run
//! use explodeview::prelude::*;
//!
//! let mut viewer = create_viewer(
//!     ViewerConfig::default().with_profile(RenderProfile::mobile()),
//!     HeadlessBackend::new(),
//! );
//! pollster::block_on(viewer.load_asset(AssetSource::path("product.glb")))?;
//! viewer.set_stage(1);
//! # Ok::<(), ViewerError>(())
//! ```

// Viewer and its configuration
pub use crate::config::{
    CameraRigConfig, ExplodeConfig, GestureConfig, IsolationConfig, LightRig, RenderProfile,
    SectionPromotion, ViewerConfig,
};
pub use crate::error::{LoadError, ViewerError, XrError};
pub use crate::viewer::{create_viewer, Notice, Viewer};

// Assets and parts
pub use crate::asset::{AssetFormat, AssetSource, LoadedAsset};
pub use crate::registry::{NamedSection, Part, PartRegistry};

// Backends
pub use crate::backend::{HeadlessBackend, SceneBackend};
pub use crate::gfx::GpuBackend;

// State reported by the viewer
pub use crate::explode::ExplodeState;
pub use crate::stage::Stage;
pub use crate::xr::{XrMode, XrRuntime, XrRuntimeEvent, XrState};

// Input
pub use crate::gesture::{InputEvent, Modifiers, PointerId};

// Host application
pub use crate::app::ViewerApp;
