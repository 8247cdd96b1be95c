//! Exploded-view product viewer
//!
//! Loads one 3D asset, splits it into parts and named sections, and drives
//! an explode animation, a stage sequence, part isolation and a smoothed
//! orbit camera from pointer, wheel and touch gestures. Rendering goes
//! through the [`backend::SceneBackend`] trait; [`gfx::GpuBackend`] draws
//! with wgpu and [`app::ViewerApp`] hosts it in a winit window.

pub mod app;
pub mod asset;
pub mod backend;
pub mod camera;
pub mod config;
pub mod error;
pub mod explode;
pub mod gesture;
pub mod gfx;
pub mod prelude;
pub mod registry;
pub mod stage;
pub mod viewer;
pub mod visibility;
pub mod wgpu_utils;
pub mod xr;

// Re-export main types for convenience
pub use app::ViewerApp;
pub use error::{LoadError, ViewerError, XrError};
pub use viewer::{create_viewer, Viewer};
