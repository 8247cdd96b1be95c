//! Error types for the viewer
//!
//! Only asset loading surfaces errors to callers. Everything else the viewer
//! runs into (unresolvable camera targets, degenerate gestures, unsupported
//! XR sessions) is recovered locally and at most logged or reported as a
//! [`Notice`](crate::viewer::Notice).

use thiserror::Error;

use crate::xr::XrMode;

/// Failure while decoding an asset into a [`LoadedAsset`](crate::asset::LoadedAsset).
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to read asset: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse OBJ asset: {0}")]
    Obj(#[from] tobj::LoadError),

    #[error("failed to parse glTF asset: {0}")]
    Gltf(#[from] gltf::Error),

    #[error("unsupported asset format: {0}")]
    UnsupportedFormat(String),

    /// The container parsed but holds no scene to display.
    #[error("asset contains no scene root")]
    NoSceneRoot,

    #[error("asset contains no renderable geometry")]
    NoRenderableGeometry,
}

/// Errors returned by [`Viewer`](crate::viewer::Viewer) operations.
#[derive(Error, Debug)]
pub enum ViewerError {
    #[error(transparent)]
    Load(#[from] LoadError),

    /// The rendering backend refused the asset (e.g. GPU resource creation failed).
    #[error("rendering backend error: {0}")]
    Backend(String),

    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
}

/// Errors from negotiating an immersive session.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum XrError {
    #[error("{0:?} sessions are not supported on this host")]
    Unsupported(XrMode),

    #[error("session request rejected: {0}")]
    Rejected(String),

    #[error("no XR runtime registered")]
    NoRuntime,
}
