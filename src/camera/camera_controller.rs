use log::trace;

use super::camera_rig::CameraRig;
use crate::gesture::{InputEvent, PointerId};

/// Default drag-to-orbit behavior: a single pointer drag orbits the camera,
/// or pans it while shift is held.
///
/// Touch drags only start while exactly one finger is down, and any drag in
/// progress is dropped as soon as a pinch begins.
pub struct OrbitControls {
    pub rotate_speed: f32,
    pub pan_speed: f32,
    is_shift_held: bool,
    drag: Option<Drag>,
}

#[derive(Debug, Clone, Copy)]
struct Drag {
    pointer: PointerId,
    last: [f32; 2],
}

impl OrbitControls {
    pub fn new(rotate_speed: f32, pan_speed: f32) -> Self {
        Self {
            rotate_speed,
            pan_speed,
            is_shift_held: false,
            drag: None,
        }
    }

    /// Applies `event` to `rig`.
    ///
    /// # Arguments
    ///
    /// * `orbit_suppressed` - true while the gesture router is tracking a pinch
    /// * `active_touches` - touches currently down, as seen by the router
    pub fn process_event(
        &mut self,
        event: &InputEvent,
        orbit_suppressed: bool,
        active_touches: usize,
        rig: &mut CameraRig,
    ) {
        if orbit_suppressed && self.drag.is_some_and(|d| d.pointer.is_touch()) {
            trace!("orbit drag dropped for pinch");
            self.drag = None;
        }

        match *event {
            InputEvent::ModifiersChanged(modifiers) => {
                self.is_shift_held = modifiers.shift;
            }
            InputEvent::PointerDown {
                pointer, position, ..
            } => {
                let allowed = !pointer.is_touch() || (!orbit_suppressed && active_touches == 1);
                if self.drag.is_none() && allowed {
                    self.drag = Some(Drag {
                        pointer,
                        last: position,
                    });
                }
            }
            InputEvent::PointerMove {
                pointer, position, ..
            } => {
                let Some(drag) = self.drag.as_mut().filter(|d| d.pointer == pointer) else {
                    return;
                };
                let delta = (position[0] - drag.last[0], position[1] - drag.last[1]);
                drag.last = position;

                if self.is_shift_held {
                    rig.pan((-delta.0 * self.pan_speed, delta.1 * self.pan_speed));
                } else {
                    rig.orbit(-delta.0 * self.rotate_speed, delta.1 * self.rotate_speed);
                }
            }
            InputEvent::PointerUp { pointer, .. } | InputEvent::PointerCancel { pointer } => {
                if self.drag.is_some_and(|d| d.pointer == pointer) {
                    self.drag = None;
                }
            }
            InputEvent::Wheel { .. } => {}
        }
    }

    /// Returns true if currently panning
    pub fn is_panning(&self) -> bool {
        self.drag.is_some() && self.is_shift_held
    }

    /// Returns true if currently rotating
    pub fn is_rotating(&self) -> bool {
        self.drag.is_some() && !self.is_shift_held
    }

    pub fn set_pan_speed(&mut self, speed: f32) {
        self.pan_speed = speed;
    }
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self::new(0.005, 0.01)
    }
}
