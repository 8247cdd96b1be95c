//! Keyframed animation clips
//!
//! A clip is a set of tracks, each driving one property (translation,
//! rotation or scale) of one node. Clips are sampled at an explicit time;
//! playback state lives in the explode controller.

use cgmath::{InnerSpace, Quaternion, Vector3};

use super::scene_graph::{NodeId, Pose};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Interpolation {
    Linear,
    Step,
    /// Hermite spline; values are stored as `(in_tangent, value, out_tangent)`
    /// triplets per keyframe.
    CubicSpline,
}

#[derive(Clone, Debug, PartialEq)]
pub enum TrackValues {
    Translations(Vec<Vector3<f32>>),
    Rotations(Vec<Quaternion<f32>>),
    Scales(Vec<Vector3<f32>>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Track {
    pub node: NodeId,
    /// Keyframe times in seconds, ascending.
    pub times: Vec<f32>,
    pub values: TrackValues,
    pub interpolation: Interpolation,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AnimationClip {
    pub name: String,
    pub tracks: Vec<Track>,
    pub duration: f32,
}

impl AnimationClip {
    /// Builds a clip whose duration is the last keyframe time of any track.
    pub fn new(name: impl Into<String>, tracks: Vec<Track>) -> Self {
        let duration = tracks
            .iter()
            .filter_map(|t| t.times.last().copied())
            .fold(0.0_f32, f32::max);
        Self {
            name: name.into(),
            tracks,
            duration,
        }
    }

    /// Overwrites the animated properties in `pose` with their values at `time`.
    pub fn apply(&self, time: f32, pose: &mut Pose) {
        for track in &self.tracks {
            let Some(local) = pose.locals.get_mut(track.node) else {
                continue;
            };
            match &track.values {
                TrackValues::Translations(values) => {
                    if let Some(v) = sample(&track.times, values, track.interpolation, time) {
                        local.translation = v;
                    }
                }
                TrackValues::Rotations(values) => {
                    if let Some(q) = sample(&track.times, values, track.interpolation, time) {
                        local.rotation = q;
                    }
                }
                TrackValues::Scales(values) => {
                    if let Some(s) = sample(&track.times, values, track.interpolation, time) {
                        local.scale = s;
                    }
                }
            }
        }
    }
}

trait Keyframe: Copy {
    fn lerp(a: Self, b: Self, u: f32) -> Self;
    fn hermite(v0: Self, out0: Self, v1: Self, in1: Self, dt: f32, u: f32) -> Self;
}

fn hermite_weights(u: f32) -> [f32; 4] {
    let u2 = u * u;
    let u3 = u2 * u;
    [
        2.0 * u3 - 3.0 * u2 + 1.0,
        u3 - 2.0 * u2 + u,
        -2.0 * u3 + 3.0 * u2,
        u3 - u2,
    ]
}

impl Keyframe for Vector3<f32> {
    fn lerp(a: Self, b: Self, u: f32) -> Self {
        a + (b - a) * u
    }

    fn hermite(v0: Self, out0: Self, v1: Self, in1: Self, dt: f32, u: f32) -> Self {
        let [h00, h10, h01, h11] = hermite_weights(u);
        v0 * h00 + out0 * (h10 * dt) + v1 * h01 + in1 * (h11 * dt)
    }
}

impl Keyframe for Quaternion<f32> {
    fn lerp(a: Self, b: Self, u: f32) -> Self {
        // shortest arc
        let b = if a.dot(b) < 0.0 { -b } else { b };
        (a * (1.0 - u) + b * u).normalize()
    }

    fn hermite(v0: Self, out0: Self, v1: Self, in1: Self, dt: f32, u: f32) -> Self {
        let [h00, h10, h01, h11] = hermite_weights(u);
        (v0 * h00 + out0 * (h10 * dt) + v1 * h01 + in1 * (h11 * dt)).normalize()
    }
}

fn sample<T: Keyframe>(
    times: &[f32],
    values: &[T],
    interpolation: Interpolation,
    time: f32,
) -> Option<T> {
    let count = times.len();
    if count == 0 {
        return None;
    }
    let stride = if interpolation == Interpolation::CubicSpline {
        3
    } else {
        1
    };
    if values.len() < count * stride {
        return None;
    }
    // value slot inside a keyframe's stride
    let value_at = |k: usize| values[k * stride + (stride / 2)];

    if count == 1 || time <= times[0] {
        return Some(value_at(0));
    }
    if time >= times[count - 1] {
        return Some(value_at(count - 1));
    }

    let next = times.partition_point(|&t| t <= time);
    let k = next - 1;
    let dt = times[next] - times[k];
    let u = if dt > 0.0 { (time - times[k]) / dt } else { 0.0 };

    Some(match interpolation {
        Interpolation::Step => value_at(k),
        Interpolation::Linear => T::lerp(value_at(k), value_at(next), u),
        Interpolation::CubicSpline => {
            let out0 = values[k * 3 + 2];
            let in1 = values[next * 3];
            T::hermite(value_at(k), out0, value_at(next), in1, dt, u)
        }
    })
}
