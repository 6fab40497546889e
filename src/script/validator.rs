// SYNOID Tutor Timing Validator
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Gate between an externally written script and everything downstream
// that assumes narration and animation share one clock.

use super::{word_budget, VoiceoverScript};
use crate::timeline::Timeline;
use std::collections::HashSet;
use std::fmt;

/// Allowed gap between the last segment's end and the script's declared total.
pub const END_TOLERANCE_SECS: f64 = 1.0;
/// Allowed gap between the script's declared total and the solution's.
pub const TOTAL_TOLERANCE_SECS: f64 = 5.0;
/// Drift between a segment and its scene that the audit reports.
pub const SCENE_DRIFT_SECS: f64 = 0.05;

/// Why a script failed timing validation.
#[derive(Debug, Clone, PartialEq)]
pub enum TimingIssue {
    NoSegments,
    Overlap {
        index: usize,
        end: f64,
        next_start: f64,
    },
    EndsEarlyOrLate {
        last_end: f64,
        declared: f64,
    },
    TotalMismatch {
        declared: f64,
        expected: f64,
    },
}

impl fmt::Display for TimingIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimingIssue::NoSegments => write!(f, "script has no segments"),
            TimingIssue::Overlap { index, end, next_start } => write!(
                f,
                "segment {} ends at {:.2}s after next starts at {:.2}s",
                index, end, next_start
            ),
            TimingIssue::EndsEarlyOrLate { last_end, declared } => write!(
                f,
                "last segment ends at {:.2}s, declared total is {:.2}s",
                last_end, declared
            ),
            TimingIssue::TotalMismatch { declared, expected } => write!(
                f,
                "script lasts {:.2}s, expected {:.2}s",
                declared, expected
            ),
        }
    }
}

/// First timing problem found, if any. Never mutates the script.
pub fn check_timing(script: &VoiceoverScript, expected_duration: f64) -> Result<(), TimingIssue> {
    let last = script.segments.last().ok_or(TimingIssue::NoSegments)?;

    for (index, pair) in script.segments.windows(2).enumerate() {
        if pair[0].end_time > pair[1].start_time {
            return Err(TimingIssue::Overlap {
                index,
                end: pair[0].end_time,
                next_start: pair[1].start_time,
            });
        }
    }

    if (last.end_time - script.total_duration).abs() > END_TOLERANCE_SECS {
        return Err(TimingIssue::EndsEarlyOrLate {
            last_end: last.end_time,
            declared: script.total_duration,
        });
    }

    if (script.total_duration - expected_duration).abs() >= TOTAL_TOLERANCE_SECS {
        return Err(TimingIssue::TotalMismatch {
            declared: script.total_duration,
            expected: expected_duration,
        });
    }

    Ok(())
}

/// Boolean view of [`check_timing`].
pub fn validate_timing(script: &VoiceoverScript, expected_duration: f64) -> bool {
    check_timing(script, expected_duration).is_ok()
}

/// Non-fatal findings about how well a script follows its timeline.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScriptAudit {
    pub missing_scenes: Vec<String>,
    pub unknown_scenes: Vec<String>,
    pub drifted: Vec<String>,
    /// (scene id, words used, budget)
    pub over_budget: Vec<(String, usize, usize)>,
}

impl ScriptAudit {
    pub fn is_clean(&self) -> bool {
        self.missing_scenes.is_empty()
            && self.unknown_scenes.is_empty()
            && self.drifted.is_empty()
            && self.over_budget.is_empty()
    }
}

pub fn audit_script(script: &VoiceoverScript, timeline: &Timeline) -> ScriptAudit {
    let mut audit = ScriptAudit::default();
    let narrated: HashSet<&str> = script.segments.iter().map(|s| s.scene_id.as_str()).collect();

    audit.missing_scenes = timeline
        .scenes()
        .iter()
        .filter(|s| !narrated.contains(s.scene_id.as_str()))
        .map(|s| s.scene_id.clone())
        .collect();

    for seg in &script.segments {
        let Some(scene) = timeline.scene(&seg.scene_id) else {
            audit.unknown_scenes.push(seg.scene_id.clone());
            continue;
        };
        if (seg.start_time - scene.start_time).abs() > SCENE_DRIFT_SECS
            || (seg.end_time - scene.end_time).abs() > SCENE_DRIFT_SECS
        {
            audit.drifted.push(seg.scene_id.clone());
        }
        let budget = word_budget(scene.duration);
        let words = seg.word_count();
        if words > budget {
            audit.over_budget.push((seg.scene_id.clone(), words, budget));
        }
    }

    audit
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::ScriptSegment;
    use crate::timeline::{Scene, SceneKind};

    fn seg(id: &str, start: f64, end: f64, text: &str) -> ScriptSegment {
        ScriptSegment {
            start_time: start,
            end_time: end,
            text: text.into(),
            scene_id: id.into(),
        }
    }

    fn script(segments: Vec<ScriptSegment>, total: f64) -> VoiceoverScript {
        VoiceoverScript {
            full_script: segments.iter().map(|s| s.text.clone()).collect::<Vec<_>>().join(" "),
            segments,
            total_duration: total,
        }
    }

    #[test]
    fn test_last_segment_tolerance() {
        let ok = script(vec![seg("a", 0.0, 50.0, ""), seg("b", 50.0, 99.3, "")], 100.0);
        assert!(validate_timing(&ok, 100.0));

        let late = script(vec![seg("a", 0.0, 50.0, ""), seg("b", 50.0, 97.0, "")], 100.0);
        assert_eq!(
            check_timing(&late, 100.0),
            Err(TimingIssue::EndsEarlyOrLate { last_end: 97.0, declared: 100.0 })
        );
    }

    #[test]
    fn test_gaps_allowed_overlaps_rejected() {
        let gappy = script(vec![seg("a", 0.0, 40.0, ""), seg("b", 45.0, 100.0, "")], 100.0);
        assert!(validate_timing(&gappy, 100.0));

        let overlapping = script(vec![seg("a", 0.0, 60.0, ""), seg("b", 55.0, 100.0, "")], 100.0);
        assert!(matches!(
            check_timing(&overlapping, 100.0),
            Err(TimingIssue::Overlap { index: 0, .. })
        ));
    }

    #[test]
    fn test_declared_total_cross_check() {
        let s = script(vec![seg("a", 0.0, 100.0, "")], 100.0);
        assert!(validate_timing(&s, 104.9));
        assert_eq!(
            check_timing(&s, 105.0),
            Err(TimingIssue::TotalMismatch { declared: 100.0, expected: 105.0 })
        );
    }

    #[test]
    fn test_empty_script_fails() {
        assert_eq!(check_timing(&script(vec![], 100.0), 100.0), Err(TimingIssue::NoSegments));
    }

    #[test]
    fn test_audit_reports_each_problem() {
        let timeline = Timeline::new(vec![
            Scene::spanning("intro", SceneKind::Intro, 0.0, 2.0, "i"),
            Scene::spanning("setup", SceneKind::Setup, 2.0, 6.0, "s"),
            Scene::spanning("answer", SceneKind::Answer, 6.0, 10.0, "a"),
        ])
        .unwrap();
        let s = script(
            vec![
                seg("intro", 0.0, 2.0, "one two three four five six"),
                seg("setup", 2.5, 6.0, "fine"),
                seg("ghost", 6.0, 7.0, "boo"),
            ],
            10.0,
        );
        let audit = audit_script(&s, &timeline);
        assert_eq!(audit.missing_scenes, vec!["answer"]);
        assert_eq!(audit.unknown_scenes, vec!["ghost"]);
        assert_eq!(audit.drifted, vec!["setup"]);
        assert_eq!(audit.over_budget, vec![("intro".to_string(), 6, 5)]);
        assert!(!audit.is_clean());
    }
}
