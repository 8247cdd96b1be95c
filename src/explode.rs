//! # Explode Controller
//!
//! Drives the asset's explode clips between the assembled ("overview") and
//! separated ("exploded") layouts, with a scrub preview in between.
//!
//! Clips are never free-running. Each one is wrapped in a [`ClipAction`]
//! whose time and direction are set explicitly, and which stops (clamped)
//! at either end. That makes every layout reachable exactly: a transition
//! plays the clips one-shot, a repeated request snaps them, and a scrub
//! pauses them at a fraction of their duration.
//!
//! ## Transitions
//!
//! | From      | Request    | Clips                        | Camera             |
//! |-----------|------------|------------------------------|--------------------|
//! | overview  | exploded   | play forward from 0          | ease out by zoom   |
//! | exploded  | overview   | play reverse from the end    | ease in by 1/zoom  |
//! | overview  | overview   | snap to 0                    | -                  |
//! | exploded  | exploded   | snap to the end              | -                  |
//! | any       | scrub(f)   | pause at `duration * f`      | -                  |
//!
//! Scrubbing never changes the committed state. Without clips every call is
//! a silent no-op.

use log::debug;

use crate::asset::{AnimationClip, Pose, SceneGraph};
use crate::camera::CameraRig;
use crate::config::ExplodeConfig;

/// Explode layout as reported to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExplodeState {
    Overview,
    Scrubbing,
    Exploded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayDirection {
    Forward,
    Reverse,
}

/// Playback state of one clip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipAction {
    pub time: f32,
    pub duration: f32,
    pub direction: PlayDirection,
    pub playing: bool,
}

impl ClipAction {
    fn new(duration: f32) -> Self {
        Self {
            time: 0.0,
            duration: duration.max(0.0),
            direction: PlayDirection::Forward,
            playing: false,
        }
    }

    fn play_from(&mut self, time: f32, direction: PlayDirection) {
        self.time = time.clamp(0.0, self.duration);
        self.direction = direction;
        self.playing = true;
    }

    fn pause_at(&mut self, time: f32) {
        self.time = time.clamp(0.0, self.duration);
        self.playing = false;
    }

    /// Advances by `dt` seconds, stopping at whichever end is reached.
    fn advance(&mut self, dt: f32) {
        if !self.playing {
            return;
        }
        let (next, done) = match self.direction {
            PlayDirection::Forward => {
                let t = self.time + dt;
                (t.min(self.duration), t >= self.duration)
            }
            PlayDirection::Reverse => {
                let t = self.time - dt;
                (t.max(0.0), t <= 0.0)
            }
        };
        self.time = next;
        if done {
            self.playing = false;
        }
    }
}

pub struct ExplodeController {
    config: ExplodeConfig,
    clips: Vec<AnimationClip>,
    actions: Vec<ClipAction>,
    rest_pose: Pose,
    committed: ExplodeState,
    scrub_amount: Option<f32>,
}

impl ExplodeController {
    pub fn new(config: ExplodeConfig) -> Self {
        Self {
            config,
            clips: Vec::new(),
            actions: Vec::new(),
            rest_pose: Pose { locals: Vec::new() },
            committed: ExplodeState::Overview,
            scrub_amount: None,
        }
    }

    /// Takes over the clips of a freshly loaded asset, all stopped at 0.
    pub fn load(&mut self, graph: &SceneGraph, clips: &[AnimationClip]) {
        self.clips = clips.to_vec();
        self.actions = clips.iter().map(|c| ClipAction::new(c.duration)).collect();
        self.rest_pose = graph.rest_pose();
        self.committed = ExplodeState::Overview;
        self.scrub_amount = None;
    }

    /// Drops all clips, e.g. when the asset is unloaded.
    pub fn clear(&mut self) {
        self.clips.clear();
        self.actions.clear();
        self.rest_pose = Pose { locals: Vec::new() };
        self.committed = ExplodeState::Overview;
        self.scrub_amount = None;
    }

    pub fn has_clips(&self) -> bool {
        !self.clips.is_empty()
    }

    pub fn enter_overview(&mut self, rig: &mut CameraRig) {
        if !self.has_clips() {
            return;
        }
        self.scrub_amount = None;
        if self.committed == ExplodeState::Overview {
            self.actions.iter_mut().for_each(|a| a.pause_at(0.0));
            return;
        }

        debug!("explode: exploded -> overview");
        for action in &mut self.actions {
            let end = action.duration;
            action.play_from(end, PlayDirection::Reverse);
        }
        rig.dolly_smooth(1.0 / self.config.zoom_factor, self.config.zoom_duration_ms);
        self.committed = ExplodeState::Overview;
    }

    pub fn enter_exploded(&mut self, rig: &mut CameraRig) {
        if !self.has_clips() {
            return;
        }
        self.scrub_amount = None;
        if self.committed == ExplodeState::Exploded {
            self.actions.iter_mut().for_each(|a| {
                let end = a.duration;
                a.pause_at(end);
            });
            return;
        }

        debug!("explode: overview -> exploded");
        for action in &mut self.actions {
            action.play_from(0.0, PlayDirection::Forward);
        }
        rig.dolly_smooth(self.config.zoom_factor, self.config.zoom_duration_ms);
        self.committed = ExplodeState::Exploded;
    }

    /// Holds every clip at `duration * amount` for `amount` in (0, 1).
    pub fn scrub(&mut self, amount: f32) {
        if !self.has_clips() || !amount.is_finite() {
            return;
        }
        let amount = amount.clamp(0.0, 1.0);
        for action in &mut self.actions {
            let time = action.duration * amount;
            action.pause_at(time);
        }
        self.scrub_amount = Some(amount);
    }

    /// `amount <= 0` commits overview, `amount >= 1` commits exploded, and
    /// anything in between scrubs.
    pub fn set_explode_amount(&mut self, amount: f32, rig: &mut CameraRig) {
        if amount.is_nan() {
            return;
        }
        if amount <= 0.0 {
            self.enter_overview(rig);
        } else if amount >= 1.0 {
            self.enter_exploded(rig);
        } else {
            self.scrub(amount);
        }
    }

    pub fn tick(&mut self, dt: f32) {
        let dt = dt.max(0.0);
        self.actions.iter_mut().for_each(|a| a.advance(dt));
    }

    pub fn state(&self) -> ExplodeState {
        if self.scrub_amount.is_some() {
            ExplodeState::Scrubbing
        } else {
            self.committed
        }
    }

    /// Last discrete state, ignoring any scrub preview.
    pub fn committed_state(&self) -> ExplodeState {
        self.committed
    }

    pub fn is_animating(&self) -> bool {
        self.actions.iter().any(|a| a.playing)
    }

    pub fn actions(&self) -> &[ClipAction] {
        &self.actions
    }

    /// Local transforms at the clips' current times.
    pub fn current_pose(&self) -> Pose {
        let times: Vec<f32> = self.actions.iter().map(|a| a.time).collect();
        self.pose_at(&times)
    }

    /// Pose the committed transition ends in.
    pub fn settled_pose(&self) -> Pose {
        let times: Vec<f32> = self
            .actions
            .iter()
            .map(|a| match self.committed {
                ExplodeState::Exploded => a.duration,
                _ => 0.0,
            })
            .collect();
        self.pose_at(&times)
    }

    fn pose_at(&self, times: &[f32]) -> Pose {
        let mut pose = self.rest_pose.clone();
        for (clip, &time) in self.clips.iter().zip(times) {
            clip.apply(time, &mut pose);
        }
        pose
    }
}
