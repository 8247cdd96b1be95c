//! # Gesture Router
//!
//! Classifies raw pointer, touch and wheel events into the two intents the
//! viewer acts on: dolly the camera by a factor, or step the stage by one.
//!
//! ## Classification
//!
//! - **Two touches**: a pinch, from the moment the second finger lands. Each
//!   move yields `DollyBy(1 / clamp(current / previous, min, max))`.
//! - **One touch**: a swipe candidate. On release, a fast, mostly vertical
//!   stroke becomes `ChangeStage(+1)` (upward) or `ChangeStage(-1)`.
//! - **Wheel + ctrl/meta**: `DollyBy(exp(delta_y / 100 * strength))`.
//! - **Plain wheel**: `ChangeStage(signum(delta_y))` past a magnitude
//!   threshold, at most once per cooldown window.
//!
//! Single-finger drags are never blocked: a swipe is judged only on release,
//! and the orbit controls keep working while it is in progress. Only a pinch
//! suppresses orbiting (see [`GestureRouter::orbit_suppressed`]).
//!
//! ## Usage
//!
//! ```
//! use explodeview::config::GestureConfig;
//! use explodeview::gesture::{GestureRouter, InputEvent, Intent, Modifiers};
//!
//! let mut router = GestureRouter::new(GestureConfig::default());
//! let intent = router.handle(&InputEvent::Wheel {
//!     delta_y: 50.0,
//!     modifiers: Modifiers::default(),
//!     time_ms: 0.0,
//! });
//! assert_eq!(intent, Some(Intent::ChangeStage(1)));
//! ```

pub mod winit_input;

pub use winit_input::WinitInputTranslator;

use log::trace;

use crate::config::GestureConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerKind {
    Mouse,
    Touch,
}

/// Identifies one pointer for the duration of its down/move/up sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PointerId {
    pub kind: PointerKind,
    pub id: u64,
}

impl PointerId {
    pub fn mouse() -> Self {
        Self {
            kind: PointerKind::Mouse,
            id: 0,
        }
    }

    pub fn touch(id: u64) -> Self {
        Self {
            kind: PointerKind::Touch,
            id,
        }
    }

    pub fn is_touch(&self) -> bool {
        self.kind == PointerKind::Touch
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
}

impl Modifiers {
    /// Ctrl or the platform meta key turns the wheel into a zoom.
    pub fn zooms_wheel(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// Host-agnostic input event. Positions are in physical pixels with y
/// growing downward; `time_ms` is any monotonic millisecond clock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    PointerDown {
        pointer: PointerId,
        position: [f32; 2],
        time_ms: f64,
    },
    PointerMove {
        pointer: PointerId,
        position: [f32; 2],
        time_ms: f64,
    },
    PointerUp {
        pointer: PointerId,
        position: [f32; 2],
        time_ms: f64,
    },
    PointerCancel {
        pointer: PointerId,
    },
    /// `delta_y > 0` scrolls down / away from the user.
    Wheel {
        delta_y: f32,
        modifiers: Modifiers,
        time_ms: f64,
    },
    ModifiersChanged(Modifiers),
}

/// What the viewer should do in response to a gesture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Intent {
    /// Multiply the camera distance by the factor.
    DollyBy(f32),
    /// Step the stage by `+1` (next) or `-1` (previous).
    ChangeStage(i32),
}

#[derive(Debug, Clone, Copy)]
struct ActiveTouch {
    pointer: PointerId,
    position: [f32; 2],
}

#[derive(Debug, Clone, Copy)]
struct SwipeCandidate {
    pointer: PointerId,
    start: [f32; 2],
    start_ms: f64,
}

/// Stateful classifier for one input surface.
#[derive(Debug, Clone)]
pub struct GestureRouter {
    config: GestureConfig,
    touches: Vec<ActiveTouch>,
    pinch_distance: Option<f32>,
    swipe: Option<SwipeCandidate>,
    last_wheel_stage_ms: Option<f64>,
}

impl GestureRouter {
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            touches: Vec::new(),
            pinch_distance: None,
            swipe: None,
            last_wheel_stage_ms: None,
        }
    }

    /// Feeds one event and returns the intent it completes, if any.
    pub fn handle(&mut self, event: &InputEvent) -> Option<Intent> {
        match *event {
            InputEvent::PointerDown {
                pointer,
                position,
                time_ms,
            } if pointer.is_touch() => {
                self.touch_down(pointer, position, time_ms);
                None
            }
            InputEvent::PointerMove {
                pointer, position, ..
            } if pointer.is_touch() => self.touch_move(pointer, position),
            InputEvent::PointerUp {
                pointer,
                position,
                time_ms,
            } if pointer.is_touch() => self.touch_up(pointer, position, time_ms),
            InputEvent::PointerCancel { pointer } if pointer.is_touch() => {
                self.remove_touch(pointer);
                self.refresh_pinch_baseline();
                if self.swipe.is_some_and(|s| s.pointer == pointer) {
                    self.swipe = None;
                }
                None
            }
            InputEvent::Wheel {
                delta_y,
                modifiers,
                time_ms,
            } => self.wheel(delta_y, modifiers, time_ms),
            _ => None,
        }
    }

    /// True while two touches are down; orbit controls must ignore touches
    /// for as long as this holds.
    pub fn orbit_suppressed(&self) -> bool {
        self.pinch_distance.is_some()
    }

    pub fn active_touches(&self) -> usize {
        self.touches.len()
    }

    fn touch_down(&mut self, pointer: PointerId, position: [f32; 2], time_ms: f64) {
        self.remove_touch(pointer);
        self.touches.push(ActiveTouch { pointer, position });

        match self.touches.len() {
            1 => {
                self.swipe = Some(SwipeCandidate {
                    pointer,
                    start: position,
                    start_ms: time_ms,
                });
            }
            2 => {
                // a second finger turns the gesture into a pinch for good
                self.swipe = None;
                self.refresh_pinch_baseline();
                trace!("pinch started");
            }
            _ => self.refresh_pinch_baseline(),
        }
    }

    fn touch_move(&mut self, pointer: PointerId, position: [f32; 2]) -> Option<Intent> {
        let touch = self.touches.iter_mut().find(|t| t.pointer == pointer)?;
        touch.position = position;

        let previous = self.pinch_distance?;
        if self.touches.len() != 2 {
            return None;
        }
        let current = self.finger_distance();
        self.pinch_distance = Some(current);
        if previous <= f32::EPSILON || current <= f32::EPSILON {
            trace!("pinch with zero baseline ignored");
            return None;
        }
        let ratio = (current / previous).clamp(self.config.pinch_min_scale, self.config.pinch_max_scale);
        Some(Intent::DollyBy(1.0 / ratio))
    }

    fn touch_up(&mut self, pointer: PointerId, position: [f32; 2], time_ms: f64) -> Option<Intent> {
        self.remove_touch(pointer);
        self.refresh_pinch_baseline();

        let swipe = self.swipe.filter(|s| s.pointer == pointer)?;
        self.swipe = None;
        self.classify_swipe(&swipe, position, time_ms)
    }

    fn classify_swipe(
        &self,
        swipe: &SwipeCandidate,
        end: [f32; 2],
        end_ms: f64,
    ) -> Option<Intent> {
        let dx = end[0] - swipe.start[0];
        let dy = end[1] - swipe.start[1];
        let elapsed = end_ms - swipe.start_ms;

        let abs_x = dx.abs();
        let abs_y = dy.abs();
        let is_swipe = abs_y > self.config.swipe_min_distance
            && abs_y > self.config.swipe_dominance * abs_x
            && elapsed < self.config.swipe_max_duration_ms;

        if !is_swipe {
            trace!("touch release not a swipe: dx {dx:.1}, dy {dy:.1}, {elapsed:.0} ms");
            return None;
        }
        // screen y grows downward: an upward stroke advances
        Some(Intent::ChangeStage(if dy < 0.0 { 1 } else { -1 }))
    }

    fn wheel(&mut self, delta_y: f32, modifiers: Modifiers, time_ms: f64) -> Option<Intent> {
        if modifiers.zooms_wheel() {
            let factor = (delta_y / 100.0 * self.config.wheel_zoom_strength).exp();
            return Some(Intent::DollyBy(factor));
        }

        if delta_y.abs() < self.config.wheel_stage_threshold {
            trace!("wheel delta {delta_y:.1} below stage threshold");
            return None;
        }
        if let Some(last) = self.last_wheel_stage_ms {
            if time_ms - last < self.config.wheel_cooldown_ms {
                trace!("wheel ignored during cooldown");
                return None;
            }
        }
        self.last_wheel_stage_ms = Some(time_ms);
        Some(Intent::ChangeStage(if delta_y > 0.0 { 1 } else { -1 }))
    }

    fn remove_touch(&mut self, pointer: PointerId) {
        self.touches.retain(|t| t.pointer != pointer);
    }

    /// Re-measures the pinch baseline after the finger set changed. The
    /// pair being measured may be a different one now.
    fn refresh_pinch_baseline(&mut self) {
        self.pinch_distance = if self.touches.len() >= 2 {
            Some(self.finger_distance())
        } else {
            None
        };
    }

    fn finger_distance(&self) -> f32 {
        match self.touches.as_slice() {
            [a, b, ..] => {
                let dx = a.position[0] - b.position[0];
                let dy = a.position[1] - b.position[1];
                (dx * dx + dy * dy).sqrt()
            }
            _ => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn router() -> GestureRouter {
        GestureRouter::new(GestureConfig::default())
    }

    fn down(id: u64, x: f32, y: f32, t: f64) -> InputEvent {
        InputEvent::PointerDown {
            pointer: PointerId::touch(id),
            position: [x, y],
            time_ms: t,
        }
    }

    fn move_to(id: u64, x: f32, y: f32, t: f64) -> InputEvent {
        InputEvent::PointerMove {
            pointer: PointerId::touch(id),
            position: [x, y],
            time_ms: t,
        }
    }

    fn up(id: u64, x: f32, y: f32, t: f64) -> InputEvent {
        InputEvent::PointerUp {
            pointer: PointerId::touch(id),
            position: [x, y],
            time_ms: t,
        }
    }

    fn wheel(delta_y: f32, t: f64) -> InputEvent {
        InputEvent::Wheel {
            delta_y,
            modifiers: Modifiers::default(),
            time_ms: t,
        }
    }

    #[test]
    fn test_pinch_spread_moves_camera_closer() {
        let mut router = router();
        assert_eq!(router.handle(&down(1, 0.0, 0.0, 0.0)), None);
        assert_eq!(router.handle(&down(2, 100.0, 0.0, 5.0)), None);
        assert!(router.orbit_suppressed());

        match router.handle(&move_to(2, 150.0, 0.0, 20.0)) {
            Some(Intent::DollyBy(k)) => assert!((k - 1.0 / 1.5).abs() < 1e-5),
            other => panic!("expected dolly, got {other:?}"),
        }
    }

    #[test]
    fn test_pinch_factor_is_clamped() {
        let mut router = router();
        router.handle(&down(1, 0.0, 0.0, 0.0));
        router.handle(&down(2, 10.0, 0.0, 0.0));
        assert_eq!(
            router.handle(&move_to(2, 1000.0, 0.0, 10.0)),
            Some(Intent::DollyBy(0.2))
        );
    }

    #[test]
    fn test_pinch_baseline_follows_finger_changes() {
        let mut router = router();
        router.handle(&down(1, 0.0, 0.0, 0.0));
        router.handle(&down(2, 100.0, 0.0, 5.0));
        router.handle(&down(3, 600.0, 0.0, 10.0));
        assert_eq!(router.handle(&up(1, 0.0, 0.0, 20.0)), None);
        assert!(router.orbit_suppressed());

        // fingers 2 and 3 are 500 px apart; a 1 px spread is a tiny zoom
        match router.handle(&move_to(3, 601.0, 0.0, 30.0)) {
            Some(Intent::DollyBy(k)) => assert!((k - 500.0 / 501.0).abs() < 1e-5),
            other => panic!("expected dolly, got {other:?}"),
        }
    }

    #[test]
    fn test_cancelled_finger_rebases_pinch() {
        let mut router = router();
        router.handle(&down(1, 0.0, 0.0, 0.0));
        router.handle(&down(2, 100.0, 0.0, 0.0));
        router.handle(&down(3, 0.0, 400.0, 0.0));
        router.handle(&InputEvent::PointerCancel {
            pointer: PointerId::touch(2),
        });

        // fingers 1 and 3 are 400 px apart
        match router.handle(&move_to(3, 0.0, 800.0, 10.0)) {
            Some(Intent::DollyBy(k)) => assert!((k - 0.5).abs() < 1e-5),
            other => panic!("expected dolly, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_pinch_baseline_is_noop() {
        let mut router = router();
        router.handle(&down(1, 50.0, 50.0, 0.0));
        router.handle(&down(2, 50.0, 50.0, 0.0));
        assert_eq!(router.handle(&move_to(2, 80.0, 50.0, 10.0)), None);
        // baseline is now 30 px, so the next move is measured against it
        assert_eq!(
            router.handle(&move_to(2, 110.0, 50.0, 20.0)),
            Some(Intent::DollyBy(0.5))
        );
    }

    #[test]
    fn test_pinch_ends_when_a_finger_lifts_and_is_never_a_swipe() {
        let mut router = router();
        router.handle(&down(1, 100.0, 300.0, 0.0));
        router.handle(&down(2, 200.0, 300.0, 10.0));
        assert_eq!(router.handle(&up(2, 200.0, 300.0, 50.0)), None);
        assert!(!router.orbit_suppressed());
        assert_eq!(router.handle(&up(1, 100.0, 100.0, 100.0)), None);
    }

    #[test]
    fn test_upward_swipe_advances() {
        let mut router = router();
        router.handle(&down(7, 100.0, 300.0, 1000.0));
        router.handle(&move_to(7, 102.0, 270.0, 1090.0));
        assert_eq!(
            router.handle(&up(7, 104.0, 240.0, 1180.0)),
            Some(Intent::ChangeStage(1))
        );
    }

    #[test]
    fn test_swipe_rejections() {
        let mut router = router();

        // too short
        router.handle(&down(1, 0.0, 100.0, 0.0));
        assert_eq!(router.handle(&up(1, 0.0, 140.0, 100.0)), None);

        // too diagonal
        router.handle(&down(1, 0.0, 100.0, 0.0));
        assert_eq!(router.handle(&up(1, 50.0, 170.0, 100.0)), None);

        // too slow
        router.handle(&down(1, 0.0, 100.0, 0.0));
        assert_eq!(router.handle(&up(1, 0.0, 200.0, 600.0)), None);

        // downward and valid
        router.handle(&down(1, 0.0, 100.0, 0.0));
        assert_eq!(
            router.handle(&up(1, 0.0, 200.0, 300.0)),
            Some(Intent::ChangeStage(-1))
        );
    }

    #[test]
    fn test_release_of_unknown_touch_is_noop() {
        let mut router = router();
        assert_eq!(router.handle(&up(42, 0.0, 0.0, 0.0)), None);
        assert_eq!(router.handle(&move_to(42, 0.0, 0.0, 0.0)), None);
    }

    #[test]
    fn test_wheel_cooldown() {
        let mut router = router();
        assert_eq!(router.handle(&wheel(50.0, 1000.0)), Some(Intent::ChangeStage(1)));
        assert_eq!(router.handle(&wheel(50.0, 1100.0)), None);
        assert_eq!(router.handle(&wheel(-50.0, 1300.0)), Some(Intent::ChangeStage(-1)));
    }

    #[test]
    fn test_small_wheel_does_not_start_cooldown() {
        let mut router = router();
        assert_eq!(router.handle(&wheel(10.0, 0.0)), None);
        assert_eq!(router.handle(&wheel(40.0, 50.0)), Some(Intent::ChangeStage(1)));
    }

    #[test]
    fn test_modified_wheel_zooms() {
        let mut router = router();
        let event = InputEvent::Wheel {
            delta_y: 100.0,
            modifiers: Modifiers {
                ctrl: true,
                ..Default::default()
            },
            time_ms: 0.0,
        };
        match router.handle(&event) {
            Some(Intent::DollyBy(k)) => assert!((k - 0.15f32.exp()).abs() < 1e-6),
            other => panic!("expected dolly, got {other:?}"),
        }

        let meta_in = InputEvent::Wheel {
            delta_y: -100.0,
            modifiers: Modifiers {
                meta: true,
                ..Default::default()
            },
            time_ms: 10.0,
        };
        assert!(matches!(router.handle(&meta_in), Some(Intent::DollyBy(k)) if k < 1.0));
    }

    #[test]
    fn test_mouse_events_are_ignored() {
        let mut router = router();
        let event = InputEvent::PointerDown {
            pointer: PointerId::mouse(),
            position: [0.0, 0.0],
            time_ms: 0.0,
        };
        assert_eq!(router.handle(&event), None);
        assert_eq!(router.active_touches(), 0);
    }
}
