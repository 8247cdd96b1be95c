//! # Graphics
//!
//! wgpu rendering for the viewer. Nothing here is needed by the controller
//! itself; hosts without a window use [`HeadlessBackend`](crate::backend::HeadlessBackend).

pub mod globals;
pub mod gpu_backend;
pub mod texture_resource;
pub mod vertex;

pub use globals::{GlobalUniform, LightSetup};
pub use gpu_backend::GpuBackend;
