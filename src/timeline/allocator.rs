// SYNOID Tutor Duration Allocator
// Copyright (c) 2026 Xing_The_Creator | SYNOID

use std::fmt;

/// Top-level narrative phases, in playback order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Intro,
    Setup,
    Motion,
    Concept,
    Math,
    Answer,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Intro => "intro",
            Phase::Setup => "setup",
            Phase::Motion => "motion",
            Phase::Concept => "concept",
            Phase::Math => "math",
            Phase::Answer => "answer",
        };
        f.write_str(name)
    }
}

/// Percent of the total duration given to each phase.
pub const PHASE_TABLE: [(Phase, u32); 6] = [
    (Phase::Intro, 5),
    (Phase::Setup, 15),
    (Phase::Motion, 15),
    (Phase::Concept, 22),
    (Phase::Math, 28),
    (Phase::Answer, 15),
];

const _: () = {
    let mut sum = 0;
    let mut i = 0;
    while i < PHASE_TABLE.len() {
        sum += PHASE_TABLE[i].1;
        i += 1;
    }
    assert!(sum == 100, "PHASE_TABLE must cover the whole video");
};

/// Fraction of the total for `percent`.
pub fn share(percent: u32) -> f64 {
    f64::from(percent) / 100.0
}

/// Absolute time window of one phase.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseWindow {
    pub phase: Phase,
    pub start: f64,
    pub end: f64,
}

impl PhaseWindow {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Phase windows for one total duration, in table order.
#[derive(Debug, Clone, PartialEq)]
pub struct PhasePlan {
    windows: Vec<PhaseWindow>,
}

impl PhasePlan {
    pub fn windows(&self) -> &[PhaseWindow] {
        &self.windows
    }

    /// Window for a phase. Every phase in `PHASE_TABLE` has exactly one.
    pub fn window(&self, phase: Phase) -> PhaseWindow {
        self.windows
            .iter()
            .copied()
            .find(|w| w.phase == phase)
            .unwrap_or(PhaseWindow {
                phase,
                start: 0.0,
                end: 0.0,
            })
    }
}

/// Split `total` seconds into contiguous phase windows.
///
/// Each window starts exactly where the previous one ended; no rounding
/// is applied along the way. The last window ends at `total` exactly.
pub fn allocate(total: f64) -> PhasePlan {
    let mut cursor = 0.0;
    let mut windows: Vec<PhaseWindow> = PHASE_TABLE
        .iter()
        .map(|&(phase, percent)| {
            let start = cursor;
            let end = start + total * share(percent);
            cursor = end;
            PhaseWindow { phase, start, end }
        })
        .collect();
    if let Some(last) = windows.last_mut() {
        last.end = total;
    }
    PhasePlan { windows }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hundred_second_boundaries() {
        let plan = allocate(100.0);
        let expected = [
            (0.0, 5.0),
            (5.0, 20.0),
            (20.0, 35.0),
            (35.0, 57.0),
            (57.0, 85.0),
            (85.0, 100.0),
        ];
        for (window, (start, end)) in plan.windows().iter().zip(expected) {
            assert!((window.start - start).abs() < 1e-9, "{} start {}", window.phase, window.start);
            assert!((window.end - end).abs() < 1e-9, "{} end {}", window.phase, window.end);
        }
    }

    #[test]
    fn test_windows_are_contiguous_for_many_totals() {
        for total in [1.0, 80.0, 97.3, 123.456, 180.0, 1000.0] {
            let plan = allocate(total);
            let windows = plan.windows();
            assert_eq!(windows[0].start, 0.0);
            for pair in windows.windows(2) {
                assert_eq!(pair[1].start, pair[0].end);
            }
            let last = windows.last().unwrap();
            assert!((last.end - total).abs() < 1e-6, "total {} ended at {}", total, last.end);
        }
    }

    #[test]
    fn test_table_order_is_narrative_order() {
        let plan = allocate(120.0);
        let phases: Vec<Phase> = plan.windows().iter().map(|w| w.phase).collect();
        assert_eq!(
            phases,
            vec![Phase::Intro, Phase::Setup, Phase::Motion, Phase::Concept, Phase::Math, Phase::Answer]
        );
        assert!((plan.window(Phase::Math).duration() - 120.0 * 0.28).abs() < 1e-9);
    }
}
