//! # Camera Module
//!
//! Orbit camera, the smoothing rig the viewer drives it through, and the
//! drag controls that map pointer motion onto it.
//!
//! ## Usage
//!
//! ```
//! use cgmath::{Point3, Vector3};
//! use explodeview::asset::Bounds;
//! use explodeview::camera::CameraRig;
//! use explodeview::config::CameraRigConfig;
//!
//! let mut rig = CameraRig::new(CameraRigConfig::default());
//! rig.fit_to_bounds(&Bounds::new(Vector3::new(-1.0, -1.0, -1.0), Vector3::new(1.0, 1.0, 1.0)));
//! rig.set_desired_target(Some(Point3::new(0.5, 0.0, 0.0)));
//! rig.tick(1.0 / 60.0);
//! ```

pub mod camera_controller;
pub mod camera_rig;
pub mod orbit_camera;

pub use camera_controller::OrbitControls;
pub use camera_rig::{ease_out_cubic, CameraRig, SmoothDolly};
pub use orbit_camera::{CameraView, OrbitCamera, OrbitCameraBounds};
