//! # Desktop Viewer Application
//!
//! Windowed host for a [`Viewer`] backed by [`GpuBackend`]: opens a winit
//! window, loads one asset, forwards pointer/wheel/touch input through
//! [`WinitInputTranslator`] and drives `tick` + render from a frame clock.
//!
//! ## Keys
//!
//! | Key                         | Action               |
//! |-----------------------------|----------------------|
//! | Right / Down / PageDown / Space | next stage       |
//! | Left / Up / PageUp          | previous stage       |
//! | Home / R                    | back to the overview |
//! | A                           | toggle auto-rotate   |
//! | + / -                       | exposure up / down   |
//! | Escape                      | quit                 |
//!
//! ## Usage
//!
//! ```no_run
//! use explodeview::app::ViewerApp;
//! use explodeview::asset::AssetSource;
//! use explodeview::config::ViewerConfig;
//!
//! let app = ViewerApp::new(ViewerConfig::default(), AssetSource::path("product.glb"))?;
//! app.run()?;
//! # Ok::<(), explodeview::error::ViewerError>(())
//! ```

use std::sync::Arc;
use std::time::Instant;

use log::{error, info, warn};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowAttributes, WindowId},
};

use crate::asset::AssetSource;
use crate::config::ViewerConfig;
use crate::error::ViewerError;
use crate::gesture::WinitInputTranslator;
use crate::gfx::GpuBackend;
use crate::viewer::{create_viewer, Notice, Viewer};

const EXPOSURE_STEP: f32 = 1.1;

/// Longest frame step fed to `tick`; longer stalls (window drags, breakpoints)
/// are treated as one slow frame.
const MAX_FRAME_SECONDS: f32 = 0.1;

/// Keyboard commands understood by the desktop host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCommand {
    NextStage,
    PreviousStage,
    Overview,
    ToggleAutoRotate,
    ExposureUp,
    ExposureDown,
    Quit,
}

impl KeyCommand {
    pub fn from_key(key: KeyCode) -> Option<Self> {
        match key {
            KeyCode::ArrowRight | KeyCode::ArrowDown | KeyCode::PageDown | KeyCode::Space => {
                Some(Self::NextStage)
            }
            KeyCode::ArrowLeft | KeyCode::ArrowUp | KeyCode::PageUp => Some(Self::PreviousStage),
            KeyCode::Home | KeyCode::KeyR => Some(Self::Overview),
            KeyCode::KeyA => Some(Self::ToggleAutoRotate),
            KeyCode::Equal | KeyCode::NumpadAdd => Some(Self::ExposureUp),
            KeyCode::Minus | KeyCode::NumpadSubtract => Some(Self::ExposureDown),
            KeyCode::Escape => Some(Self::Quit),
            _ => None,
        }
    }
}

pub struct ViewerApp {
    event_loop: EventLoop<()>,
    state: AppState,
}

struct AppState {
    config: ViewerConfig,
    source: AssetSource,
    window: Option<Arc<Window>>,
    viewer: Option<Viewer<GpuBackend>>,
    input: WinitInputTranslator,
    last_frame: Option<Instant>,
    failure: Option<ViewerError>,
}

impl ViewerApp {
    pub fn new(config: ViewerConfig, source: AssetSource) -> Result<Self, ViewerError> {
        let event_loop = EventLoop::new()?;
        Ok(Self {
            event_loop,
            state: AppState {
                config,
                input: WinitInputTranslator::new(config.gestures.wheel_line_height),
                source,
                window: None,
                viewer: None,
                last_frame: None,
                failure: None,
            },
        })
    }

    /// Runs until the window closes. Returns the load or GPU error that
    /// stopped the loop early, if any.
    pub fn run(mut self) -> Result<(), ViewerError> {
        self.event_loop.set_control_flow(ControlFlow::Poll);
        self.event_loop.run_app(&mut self.state)?;

        if let Some(viewer) = self.state.viewer.take() {
            viewer.dispose();
        }
        match self.state.failure.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl AppState {
    fn start(&mut self, window: Arc<Window>) -> Result<(), ViewerError> {
        let PhysicalSize { width, height } = window.inner_size();
        let backend = pollster::block_on(GpuBackend::new(window.clone(), width, height))?;

        let mut viewer = create_viewer(self.config, backend);
        viewer.resize(width, height);
        pollster::block_on(viewer.load_asset(self.source.clone()))?;
        info!(
            "{} parts, {} stages",
            viewer.part_count(),
            viewer.total_stages()
        );
        window.set_title(&format!("explodeview - {}", self.source.describe()));

        self.viewer = Some(viewer);
        self.window = Some(window);
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: ViewerError) {
        error!("{err}");
        self.failure = Some(err);
        event_loop.exit();
    }

    fn apply_key(&mut self, event_loop: &ActiveEventLoop, command: KeyCommand) {
        let Some(viewer) = self.viewer.as_mut() else {
            return;
        };
        match command {
            KeyCommand::NextStage => {
                viewer.next_stage();
            }
            KeyCommand::PreviousStage => {
                viewer.previous_stage();
            }
            KeyCommand::Overview => viewer.reset_to_overview(),
            KeyCommand::ToggleAutoRotate => {
                let enabled = !viewer.camera_rig().is_auto_rotating();
                viewer.set_auto_rotate(enabled);
            }
            KeyCommand::ExposureUp => viewer.set_exposure(viewer.exposure() * EXPOSURE_STEP),
            KeyCommand::ExposureDown => viewer.set_exposure(viewer.exposure() / EXPOSURE_STEP),
            KeyCommand::Quit => event_loop.exit(),
        }
    }

    fn frame(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        let dt = self
            .last_frame
            .map_or(0.0, |last| now.duration_since(last).as_secs_f32())
            .min(MAX_FRAME_SECONDS);
        self.last_frame = Some(now);

        let Some(viewer) = self.viewer.as_mut() else {
            return;
        };
        viewer.tick(dt);
        for notice in viewer.take_notices() {
            match notice {
                Notice::XrUnsupported(mode) => warn!("{mode:?} is not available"),
                Notice::XrRejected(reason) => warn!("XR session rejected: {reason}"),
                Notice::XrEnded => info!("XR session ended"),
            }
        }

        match viewer.backend_mut().render_frame() {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                let (width, height) = viewer.backend().surface_size();
                viewer.backend_mut().resize(width, height);
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                self.fail(event_loop, ViewerError::Backend("GPU out of memory".into()));
            }
            Err(err) => warn!("skipping frame: {err}"),
        }
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window = match event_loop.create_window(
            WindowAttributes::default()
                .with_title("explodeview")
                .with_inner_size(winit::dpi::LogicalSize::new(1200, 800)),
        ) {
            Ok(window) => Arc::new(window),
            Err(err) => {
                self.fail(event_loop, ViewerError::Backend(err.to_string()));
                return;
            }
        };

        if let Err(err) = self.start(window) {
            self.fail(event_loop, err);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let Some(input) = self.input.translate(&event) {
            if let Some(viewer) = self.viewer.as_mut() {
                viewer.handle_input(&input);
            }
        }

        match event {
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key_code),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                if let Some(command) = KeyCommand::from_key(key_code) {
                    self.apply_key(event_loop, command);
                }
            }
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                if let Some(viewer) = self.viewer.as_mut() {
                    viewer.resize(width, height);
                    viewer.backend_mut().resize(width, height);
                }
            }
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::RedrawRequested => self.frame(event_loop),
            _ => (),
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(ref window) = self.window {
            window.request_redraw();
        }
    }
}
