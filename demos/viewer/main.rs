//! # Exploded-View Viewer
//!
//! Opens a window on an OBJ or glTF/GLB file and lets you walk through its
//! stages with the keyboard, the mouse wheel, or swipes on a touch screen.
//!
//! ## Usage
//!
//! Run with: `cargo run --example viewer -- path/to/product.glb [--mobile]`
//!
//! `--mobile` switches to the mobile render profile (hemisphere lighting,
//! centered pivot, section names found on any descendant node).
//! Set `RUST_LOG=explodeview=debug` to follow stage changes.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use env_logger::Env;
use explodeview::prelude::*;

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let mut path: Option<PathBuf> = None;
    let mut profile = RenderProfile::desktop();
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--mobile" => profile = RenderProfile::mobile(),
            "--desktop" => profile = RenderProfile::desktop(),
            flag if flag.starts_with("--") => bail!("unknown flag {flag}"),
            _ => path = Some(PathBuf::from(arg)),
        }
    }
    let Some(path) = path else {
        bail!("usage: viewer <asset.obj|asset.gltf|asset.glb> [--mobile]");
    };

    let config = ViewerConfig::default().with_profile(profile);
    let app = ViewerApp::new(config, AssetSource::path(path.clone()))
        .context("creating viewer window")?;
    app.run()
        .with_context(|| format!("viewing {}", path.display()))?;
    Ok(())
}
