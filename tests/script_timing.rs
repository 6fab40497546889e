use synoid_tutor::script::validator::{audit_script, check_timing, validate_timing, TimingIssue};
use synoid_tutor::script::{segment_slots, ScriptSegment, VoiceoverScript};
use synoid_tutor::solution::{QuestionAnalysis, Solution, SolutionStep, TimedSolution};
use synoid_tutor::timeline::partition::{split_timeline, Part};

fn timed(total: f64) -> TimedSolution {
    let steps = vec![
        SolutionStep {
            step_number: 1,
            title: "Energy conservation".into(),
            explanation: "Potential energy becomes kinetic energy".into(),
            equations: vec!["mgh = \\frac{1}{2}mv^2 + \\frac{1}{2}I\\omega^2".into()],
            key_visual_elements: vec!["incline".into()],
            duration_seconds: 10.0,
            scenes: vec![],
        },
        SolutionStep {
            step_number: 2,
            title: "Solve for v".into(),
            explanation: "Substitute I = 2/5 mr^2".into(),
            equations: vec!["v = \\sqrt{10gh/7}".into(), "v = 6.48 m/s".into()],
            key_visual_elements: vec![],
            duration_seconds: 10.0,
            scenes: vec![],
        },
    ];
    Solution {
        question: "Sphere rolling down a 3 m incline".into(),
        analysis: QuestionAnalysis {
            topic: "Rotational dynamics".into(),
            subtopic: None,
            difficulty: "intermediate".into(),
            concepts: vec!["energy conservation".into()],
            prerequisite_knowledge: vec!["moment of inertia".into()],
        },
        steps,
        total_duration: total,
        scene_timeline: vec![],
    }
    .materialize()
    .unwrap()
}

/// A script that follows the timeline exactly and stays inside every budget.
fn faithful_script(solution: &TimedSolution) -> VoiceoverScript {
    let segments: Vec<ScriptSegment> = segment_slots(solution.timeline())
        .into_iter()
        .map(|slot| ScriptSegment {
            start_time: slot.scene.start_time,
            end_time: slot.scene.end_time,
            text: vec!["dekho"; slot.max_words.min(6)].join(" "),
            scene_id: slot.scene.scene_id.clone(),
        })
        .collect();
    VoiceoverScript {
        full_script: segments.iter().map(|s| s.text.as_str()).collect::<Vec<_>>().join(" "),
        segments,
        total_duration: solution.total_duration(),
    }
}

#[test]
fn test_faithful_script_validates_and_audits_clean() {
    let solution = timed(100.0);
    let script = faithful_script(&solution);
    assert_eq!(check_timing(&script, 100.0), Ok(()));
    assert!(audit_script(&script, solution.timeline()).is_clean());
}

#[test]
fn test_end_tolerance_scenarios() {
    let solution = timed(100.0);
    let mut script = faithful_script(&solution);

    script.segments.last_mut().unwrap().end_time = 99.3;
    assert!(validate_timing(&script, 100.0));

    script.segments.last_mut().unwrap().end_time = 97.0;
    assert!(!validate_timing(&script, 100.0));
    assert!(matches!(
        check_timing(&script, 100.0),
        Err(TimingIssue::EndsEarlyOrLate { .. })
    ));
}

#[test]
fn test_script_for_wrong_total_is_rejected() {
    // Script written for a 120s video checked against a 100s solution.
    let script = faithful_script(&timed(120.0));
    assert!(matches!(
        check_timing(&script, 100.0),
        Err(TimingIssue::TotalMismatch { .. })
    ));
    assert!(validate_timing(&script, 116.0));
}

#[test]
fn test_partition_segments_match_partition_scenes() {
    let solution = timed(100.0);
    let script = faithful_script(&solution);
    let split = split_timeline(solution.timeline());

    let mut seen = Vec::new();
    for part in [Part::Introduction, Part::Solution] {
        let partition = split.part(part);
        let segments = partition.segments_of(&script);
        let scene_ids: Vec<&str> = partition.scenes.iter().map(|s| s.scene_id.as_str()).collect();
        let segment_ids: Vec<&str> = segments.iter().map(|s| s.scene_id.as_str()).collect();
        assert_eq!(scene_ids, segment_ids);
        seen.extend(segments);
    }
    assert_eq!(seen, script.segments);
}

#[test]
fn test_over_budget_narration_is_reported() {
    let solution = timed(100.0);
    let mut script = faithful_script(&solution);
    // intro is 5s: budget 12 words
    script.segments[0].text = vec!["word"; 30].join(" ");

    let audit = audit_script(&script, solution.timeline());
    assert_eq!(audit.over_budget, vec![("intro".to_string(), 30, 12)]);
    // Budget overruns are advisory; timing still passes.
    assert!(validate_timing(&script, 100.0));
}
