//! Translation from winit window events to [`InputEvent`]s
//!
//! winit events carry no timestamps, so the translator stamps them with a
//! monotonic clock started at construction. Line-based wheel deltas are
//! converted to pixels with the configured line height and the sign is
//! flipped so that scrolling down yields a positive `delta_y`.

use std::time::Instant;

use winit::event::{ElementState, MouseButton, MouseScrollDelta, TouchPhase, WindowEvent};

use super::{InputEvent, Modifiers, PointerId};

pub struct WinitInputTranslator {
    clock: Instant,
    line_height: f32,
    cursor: [f32; 2],
    modifiers: Modifiers,
}

impl WinitInputTranslator {
    pub fn new(line_height: f32) -> Self {
        Self {
            clock: Instant::now(),
            line_height,
            cursor: [0.0, 0.0],
            modifiers: Modifiers::default(),
        }
    }

    pub fn translate(&mut self, event: &WindowEvent) -> Option<InputEvent> {
        let now = self.clock.elapsed().as_secs_f64() * 1000.0;
        self.translate_at(event, now)
    }

    /// Same as [`translate`](Self::translate) with an explicit timestamp.
    pub fn translate_at(&mut self, event: &WindowEvent, time_ms: f64) -> Option<InputEvent> {
        match event {
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = [position.x as f32, position.y as f32];
                Some(InputEvent::PointerMove {
                    pointer: PointerId::mouse(),
                    position: self.cursor,
                    time_ms,
                })
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                let pointer = PointerId::mouse();
                let position = self.cursor;
                Some(match state {
                    ElementState::Pressed => InputEvent::PointerDown {
                        pointer,
                        position,
                        time_ms,
                    },
                    ElementState::Released => InputEvent::PointerUp {
                        pointer,
                        position,
                        time_ms,
                    },
                })
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let delta_y = match delta {
                    MouseScrollDelta::LineDelta(_, y) => -y * self.line_height,
                    MouseScrollDelta::PixelDelta(position) => -position.y as f32,
                };
                Some(InputEvent::Wheel {
                    delta_y,
                    modifiers: self.modifiers,
                    time_ms,
                })
            }
            WindowEvent::Touch(touch) => {
                let pointer = PointerId::touch(touch.id);
                let position = [touch.location.x as f32, touch.location.y as f32];
                Some(match touch.phase {
                    TouchPhase::Started => InputEvent::PointerDown {
                        pointer,
                        position,
                        time_ms,
                    },
                    TouchPhase::Moved => InputEvent::PointerMove {
                        pointer,
                        position,
                        time_ms,
                    },
                    TouchPhase::Ended => InputEvent::PointerUp {
                        pointer,
                        position,
                        time_ms,
                    },
                    TouchPhase::Cancelled => InputEvent::PointerCancel { pointer },
                })
            }
            WindowEvent::ModifiersChanged(modifiers) => {
                let state = modifiers.state();
                self.modifiers = Modifiers {
                    ctrl: state.control_key(),
                    meta: state.super_key(),
                    shift: state.shift_key(),
                };
                Some(InputEvent::ModifiersChanged(self.modifiers))
            }
            _ => None,
        }
    }
}
