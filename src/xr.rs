//! # XR Session
//!
//! Immersive AR/VR entry as an explicit state machine:
//!
//! ```text
//! Idle --request--> Requesting --Granted--> Active --Ended/end()--> Ended
//!                       |                                            |
//!                       +--Denied--> Idle        Ended --request--> Requesting
//! ```
//!
//! Negotiating the session is the host runtime's job ([`XrRuntime`]). The
//! viewer calls [`XrSession::poll`] once per tick and reacts to the
//! resulting [`XrUpdate`]s; a select event yields a hit point where the
//! asset root is placed.

use cgmath::Point3;
use log::{debug, info, warn};

use crate::asset::NodeId;
use crate::error::XrError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XrMode {
    ImmersiveAr,
    ImmersiveVr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XrState {
    Idle,
    Requesting,
    Active,
    Ended,
}

/// Events a runtime reports back, drained through [`XrRuntime::poll`].
#[derive(Debug, Clone, PartialEq)]
pub enum XrRuntimeEvent {
    Granted,
    Denied(String),
    /// The user selected a real-world surface at this point.
    Select(Point3<f32>),
    Ended,
}

/// Host-side session negotiation.
pub trait XrRuntime {
    fn is_supported(&self, mode: XrMode) -> bool;

    /// Starts negotiating a session that will display `scene_root`.
    fn request_session(&mut self, mode: XrMode, scene_root: NodeId) -> Result<(), XrError>;

    /// Next pending event, if any.
    fn poll(&mut self) -> Option<XrRuntimeEvent>;

    fn end_session(&mut self);
}

/// What the viewer has to act on after a poll.
#[derive(Debug, Clone, PartialEq)]
pub enum XrUpdate {
    StateChanged(XrState),
    Place(Point3<f32>),
    Failed(XrError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XrSession {
    state: XrState,
    mode: Option<XrMode>,
}

impl Default for XrSession {
    fn default() -> Self {
        Self::new()
    }
}

impl XrSession {
    pub fn new() -> Self {
        Self {
            state: XrState::Idle,
            mode: None,
        }
    }

    pub fn state(&self) -> XrState {
        self.state
    }

    pub fn mode(&self) -> Option<XrMode> {
        self.mode
    }

    pub fn is_busy(&self) -> bool {
        matches!(self.state, XrState::Requesting | XrState::Active)
    }

    pub fn request(
        &mut self,
        runtime: &mut dyn XrRuntime,
        mode: XrMode,
        scene_root: NodeId,
    ) -> Result<(), XrError> {
        if self.is_busy() {
            return Err(XrError::Rejected(format!(
                "a session is already {:?}",
                self.state
            )));
        }
        if !runtime.is_supported(mode) {
            warn!("XR mode {mode:?} is not supported by the runtime");
            return Err(XrError::Unsupported(mode));
        }
        runtime.request_session(mode, scene_root)?;
        self.mode = Some(mode);
        self.transition(XrState::Requesting);
        Ok(())
    }

    /// Drains runtime events and returns what the viewer must apply.
    pub fn poll(&mut self, runtime: &mut dyn XrRuntime) -> Vec<XrUpdate> {
        let mut updates = Vec::new();
        while let Some(event) = runtime.poll() {
            match (self.state, event) {
                (XrState::Requesting, XrRuntimeEvent::Granted) => {
                    self.transition(XrState::Active);
                    updates.push(XrUpdate::StateChanged(XrState::Active));
                }
                (XrState::Requesting, XrRuntimeEvent::Denied(reason)) => {
                    warn!("XR session denied: {reason}");
                    self.mode = None;
                    self.transition(XrState::Idle);
                    updates.push(XrUpdate::Failed(XrError::Rejected(reason)));
                    updates.push(XrUpdate::StateChanged(XrState::Idle));
                }
                (XrState::Active, XrRuntimeEvent::Select(point)) => {
                    updates.push(XrUpdate::Place(point));
                }
                (XrState::Requesting | XrState::Active, XrRuntimeEvent::Ended) => {
                    self.transition(XrState::Ended);
                    updates.push(XrUpdate::StateChanged(XrState::Ended));
                }
                (state, event) => {
                    debug!("ignoring XR event {event:?} in state {state:?}");
                }
            }
        }
        updates
    }

    /// Ends an active or pending session. No-op otherwise.
    pub fn end(&mut self, runtime: &mut dyn XrRuntime) -> bool {
        if !self.is_busy() {
            return false;
        }
        runtime.end_session();
        self.transition(XrState::Ended);
        true
    }

    fn transition(&mut self, next: XrState) {
        if self.state != next {
            info!("XR session {:?} -> {:?}", self.state, next);
            self.state = next;
        }
    }
}
