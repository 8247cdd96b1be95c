//! # Stage Sequencer
//!
//! Stages form a cycle: `0` is the overview, `1` the exploded layout, and
//! `2 + i` focuses the `i`-th named section. Every stage maps to a
//! [`StagePlan`] describing what the explode controller, the isolation
//! engine and the camera rig should do; the viewer re-applies the plan in
//! full whenever the stage or the section list changes.
//!
//! Index arithmetic is floor-correct modulo the stage count, so stepping
//! back from stage 0 lands on the last stage. With no stages at all the
//! index stays pinned at 0.

use crate::registry::NamedSection;

/// What a stage index means for the current section list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Overview,
    Exploded,
    /// Index into the sorted named-section list.
    Section(usize),
}

impl Stage {
    pub fn from_index(index: usize, section_count: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Overview),
            1 => Some(Self::Exploded),
            i if i - 2 < section_count => Some(Self::Section(i - 2)),
            _ => None,
        }
    }
}

/// Layout a stage asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExplodeTarget {
    Overview,
    Exploded,
}

/// Controller calls derived from one stage.
#[derive(Debug, Clone, PartialEq)]
pub struct StagePlan {
    pub stage: Stage,
    pub explode: ExplodeTarget,
    /// Part to isolate; `None` restores every part.
    pub isolate: Option<usize>,
    /// Name to aim the camera at; `None` means the asset centroid.
    pub target_name: Option<String>,
}

impl StagePlan {
    pub fn for_stage(stage: Stage, sections: &[NamedSection]) -> Self {
        match stage {
            Stage::Overview => Self {
                stage,
                explode: ExplodeTarget::Overview,
                isolate: None,
                target_name: None,
            },
            Stage::Exploded => Self {
                stage,
                explode: ExplodeTarget::Exploded,
                isolate: None,
                target_name: None,
            },
            Stage::Section(i) => {
                let section = sections.get(i);
                Self {
                    stage,
                    explode: ExplodeTarget::Exploded,
                    isolate: section.map(|s| s.part_index),
                    target_name: section.map(|s| s.display_name.clone()),
                }
            }
        }
    }
}

/// Floor-correct `index mod total`; 0 when `total` is 0.
pub fn wrap_stage(index: i64, total: usize) -> usize {
    if total == 0 {
        return 0;
    }
    index.rem_euclid(total as i64) as usize
}

/// Current stage index plus the stage count it cycles over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StageSequencer {
    current: usize,
    total: usize,
}

impl StageSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts over at stage 0 with a new stage count.
    pub fn reset(&mut self, total: usize) {
        self.total = total;
        self.current = 0;
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Jumps to `index`, wrapped into range. Returns the new stage.
    pub fn set(&mut self, index: i64) -> usize {
        self.current = wrap_stage(index, self.total);
        self.current
    }

    /// Moves by `delta` stages, wrapping at both ends.
    pub fn step(&mut self, delta: i64) -> usize {
        self.set(self.current as i64 + delta)
    }

    pub fn next(&mut self) -> usize {
        self.step(1)
    }

    pub fn previous(&mut self) -> usize {
        self.step(-1)
    }

    pub fn stage(&self, sections: &[NamedSection]) -> Stage {
        Stage::from_index(self.current, sections.len()).unwrap_or(Stage::Overview)
    }

    pub fn plan(&self, sections: &[NamedSection]) -> StagePlan {
        StagePlan::for_stage(self.stage(sections), sections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sections() -> Vec<NamedSection> {
        vec![
            NamedSection {
                part_index: 3,
                section_number: 1,
                display_name: "sec 1".into(),
            },
            NamedSection {
                part_index: 0,
                section_number: 2,
                display_name: "sec 2".into(),
            },
        ]
    }

    #[test]
    fn test_full_cycle_returns_to_start() {
        for total in 1..7usize {
            for start in 0..total {
                let mut seq = StageSequencer::new();
                seq.reset(total);
                seq.set(start as i64);
                for _ in 0..total {
                    seq.next();
                }
                assert_eq!(seq.current(), start, "total {total}, start {start}");
            }
        }
    }

    #[test]
    fn test_previous_from_overview_wraps_to_last_section() {
        let sections = sections();
        let mut seq = StageSequencer::new();
        seq.reset(2 + sections.len());

        assert_eq!(seq.previous(), 3);
        let plan = seq.plan(&sections);
        assert_eq!(plan.stage, Stage::Section(1));
        assert_eq!(plan.explode, ExplodeTarget::Exploded);
        assert_eq!(plan.isolate, Some(0));
        assert_eq!(plan.target_name.as_deref(), Some("sec 2"));
    }

    #[test]
    fn test_cycle_order() {
        let sections = sections();
        let mut seq = StageSequencer::new();
        seq.reset(4);
        let mut stages = vec![seq.stage(&sections)];
        for _ in 0..3 {
            seq.next();
            stages.push(seq.stage(&sections));
        }
        assert_eq!(
            stages,
            vec![
                Stage::Overview,
                Stage::Exploded,
                Stage::Section(0),
                Stage::Section(1)
            ]
        );
    }

    #[test]
    fn test_overview_and_exploded_plans() {
        let overview = StagePlan::for_stage(Stage::Overview, &[]);
        assert_eq!(overview.explode, ExplodeTarget::Overview);
        assert_eq!(overview.isolate, None);
        assert_eq!(overview.target_name, None);

        let exploded = StagePlan::for_stage(Stage::Exploded, &[]);
        assert_eq!(exploded.explode, ExplodeTarget::Exploded);
        assert_eq!(exploded.isolate, None);
    }

    #[test]
    fn test_empty_registry_pins_stage_to_zero() {
        let mut seq = StageSequencer::new();
        seq.reset(0);
        assert_eq!(seq.next(), 0);
        assert_eq!(seq.previous(), 0);
        assert_eq!(seq.set(7), 0);
    }

    #[test]
    fn test_absolute_set_wraps() {
        assert_eq!(wrap_stage(-1, 4), 3);
        assert_eq!(wrap_stage(-9, 4), 3);
        assert_eq!(wrap_stage(9, 4), 1);
    }
}
