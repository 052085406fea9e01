use std::collections::BTreeMap;

use serde::Serialize;

use crate::label::{Label, Phase, Quality};

/// Captures per phase that count as a complete training set.
pub const DEFAULT_PROGRESS_TARGET: u32 = 6;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QualityCounts {
    pub good: u32,
    pub bad: u32,
}

impl QualityCounts {
    pub fn total(&self) -> u32 {
        self.good + self.bad
    }
}

/// Committed captures per phase. Only used for progress display; the
/// classifier never reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhaseCounters {
    counts: BTreeMap<Phase, QualityCounts>,
}

impl Default for PhaseCounters {
    fn default() -> Self {
        Self {
            counts: Phase::ALL
                .into_iter()
                .map(|phase| (phase, QualityCounts::default()))
                .collect(),
        }
    }
}

impl PhaseCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&mut self, label: Label) {
        let counts = self.counts.entry(label.phase).or_default();
        match label.quality {
            Quality::Good => counts.good += 1,
            Quality::Bad => counts.bad += 1,
        }
    }

    pub fn get(&self, phase: Phase) -> QualityCounts {
        self.counts.get(&phase).copied().unwrap_or_default()
    }

    /// Completion towards `target` captures, as a percentage capped at 100.
    pub fn progress(&self, phase: Phase, target: u32) -> f64 {
        if target == 0 {
            return 100.0;
        }
        let total = self.get(phase).total() as f64;
        (total / target as f64 * 100.0).min(100.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Phase, QualityCounts)> + '_ {
        self.counts.iter().map(|(phase, counts)| (*phase, *counts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_increment_by_label() {
        let mut counters = PhaseCounters::new();
        counters.increment(Label::new(Phase::PlantFoot, Quality::Good));
        counters.increment(Label::new(Phase::PlantFoot, Quality::Bad));
        counters.increment(Label::new(Phase::PlantFoot, Quality::Bad));

        assert_eq!(counters.get(Phase::PlantFoot), QualityCounts { good: 1, bad: 2 });
        assert_eq!(counters.get(Phase::Stance), QualityCounts::default());
    }

    #[test]
    fn test_progress_caps_at_target() {
        let mut counters = PhaseCounters::new();
        let label = Label::new(Phase::Stance, Quality::Good);
        assert_eq!(counters.progress(Phase::Stance, DEFAULT_PROGRESS_TARGET), 0.0);

        for _ in 0..3 {
            counters.increment(label);
        }
        assert_abs_diff_eq!(counters.progress(Phase::Stance, DEFAULT_PROGRESS_TARGET), 50.0);

        for _ in 0..5 {
            counters.increment(label);
        }
        assert_eq!(counters.progress(Phase::Stance, DEFAULT_PROGRESS_TARGET), 100.0);
    }

    #[test]
    fn test_iter_lists_every_phase() {
        let phases: Vec<Phase> = PhaseCounters::new().iter().map(|(p, _)| p).collect();
        assert_eq!(phases, Phase::ALL);
    }
}
