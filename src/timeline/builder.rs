// SYNOID Tutor Scene Timeline Builder
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Lays a solution's steps onto the fixed phase plan:
// intro -> setup -> motion -> concept -> solve_1..n -> answer.

use super::allocator::{allocate, Phase, PhasePlan};
use super::{Scene, SceneKind, Timeline};
use crate::error::TimelineError;
use crate::solution::{Solution, SolutionStep};
use tracing::debug;

/// Keywords that mark a step as stating the governing principle.
const CONCEPT_TITLE_KEYWORDS: [&str; 4] = ["energy", "conservation", "principle", "concept"];

/// Diagram family drawn in the concept scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConceptDiagram {
    Energy,
    Force,
}

impl ConceptDiagram {
    pub fn visual_tag(&self) -> &'static str {
        match self {
            ConceptDiagram::Energy => "energy_diagram",
            ConceptDiagram::Force => "force_diagram",
        }
    }
}

/// Pick the concept diagram from the first analysis concept.
///
/// Plain case-insensitive substring match on "energy". Swap this out for a
/// taxonomy lookup without touching the builder.
pub fn classify_concept(concepts: &[String]) -> ConceptDiagram {
    match concepts.first() {
        Some(c) if c.to_lowercase().contains("energy") => ConceptDiagram::Energy,
        _ => ConceptDiagram::Force,
    }
}

/// True when a step title names the governing principle.
pub fn is_principle_title(title: &str) -> bool {
    let lower = title.to_lowercase();
    CONCEPT_TITLE_KEYWORDS.iter().any(|k| lower.contains(k))
}

/// Build the canonical timeline for a solution.
///
/// Callers go through [`Solution::materialize`], which only reaches here
/// when no timeline was supplied.
pub fn build_timeline(solution: &Solution) -> Result<Timeline, TimelineError> {
    let plan = allocate(solution.total_duration);
    let mut scenes = Vec::with_capacity(6 + solution.steps.len());

    scenes.push(intro_scene(&plan));
    scenes.push(setup_scene(&plan, solution.steps.first()));
    scenes.push(motion_scene(&plan));
    scenes.push(concept_scene(&plan, solution));
    scenes.extend(math_scenes(&plan, &solution.steps));
    scenes.push(answer_scene(&plan, &solution.steps));

    debug!(
        "[TIMELINE] Built {} scenes over {:.2}s",
        scenes.len(),
        solution.total_duration
    );
    Timeline::new(scenes)
}

fn intro_scene(plan: &PhasePlan) -> Scene {
    let w = plan.window(Phase::Intro);
    Scene::spanning("intro", SceneKind::Intro, w.start, w.end, "Title and problem statement")
        .with_visuals(vec!["title".into()])
}

fn setup_scene(plan: &PhasePlan, first_step: Option<&SolutionStep>) -> Scene {
    let w = plan.window(Phase::Setup);
    let mut visuals: Vec<String> = first_step
        .map(|s| s.key_visual_elements.clone())
        .unwrap_or_default();
    visuals.push("given_info_box".into());
    Scene::spanning("setup", SceneKind::Setup, w.start, w.end, "Build the physical scenario")
        .with_visuals(visuals)
}

fn motion_scene(plan: &PhasePlan) -> Scene {
    let w = plan.window(Phase::Motion);
    Scene::spanning(
        "motion",
        SceneKind::Visualization,
        w.start,
        w.end,
        "Animate the actual motion",
    )
    .with_visuals(vec![
        "dynamic_motion".into(),
        "velocity_arrow".into(),
        "what_we_find".into(),
    ])
}

fn concept_scene(plan: &PhasePlan, solution: &Solution) -> Scene {
    let w = plan.window(Phase::Concept);
    let equations = solution
        .steps
        .iter()
        .find(|s| is_principle_title(&s.title))
        .map(|s| s.equations.iter().take(2).cloned().collect())
        .unwrap_or_default();
    let headline = solution
        .analysis
        .concepts
        .first()
        .map(String::as_str)
        .unwrap_or("key concept");
    let diagram = classify_concept(&solution.analysis.concepts);

    Scene::spanning(
        "concept",
        SceneKind::Concept,
        w.start,
        w.end,
        format!("Show governing principle: {}", headline),
    )
    .with_visuals(vec![diagram.visual_tag().into()])
    .with_equations(equations)
}

/// One scene per equation-bearing step, sharing the math window equally.
/// Ids are positional (`solve_1`..), not step numbers.
fn math_scenes(plan: &PhasePlan, steps: &[SolutionStep]) -> Vec<Scene> {
    let w = plan.window(Phase::Math);
    let solving: Vec<&SolutionStep> = steps.iter().filter(|s| s.has_equations()).collect();

    if solving.is_empty() {
        return vec![Scene::spanning(
            "solve",
            SceneKind::Math,
            w.start,
            w.end,
            "Mathematical solution",
        )];
    }

    let share = w.duration() / solving.len() as f64;
    let last = solving.len() - 1;
    solving
        .iter()
        .enumerate()
        .map(|(i, step)| {
            let start = w.start + share * i as f64;
            let end = if i == last {
                w.end
            } else {
                w.start + share * (i + 1) as f64
            };
            Scene::spanning(format!("solve_{}", i + 1), SceneKind::Math, start, end, &step.title)
                .with_equations(step.equations.clone())
        })
        .collect()
}

fn answer_scene(plan: &PhasePlan, steps: &[SolutionStep]) -> Scene {
    let w = plan.window(Phase::Answer);
    let equations = steps
        .iter()
        .rev()
        .find(|s| s.has_equations())
        .map(|s| {
            let skip = s.equations.len().saturating_sub(2);
            s.equations[skip..].to_vec()
        })
        .unwrap_or_default();
    Scene::spanning(
        "answer",
        SceneKind::Answer,
        w.start,
        w.end,
        "Present final answer with emphasis",
    )
    .with_visuals(vec!["answer_box".into(), "final_value".into()])
    .with_equations(equations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solution::QuestionAnalysis;

    fn step(n: u32, title: &str, equations: &[&str]) -> SolutionStep {
        SolutionStep {
            step_number: n,
            title: title.into(),
            explanation: String::new(),
            equations: equations.iter().map(|e| e.to_string()).collect(),
            key_visual_elements: vec!["incline".into(), "sphere".into()],
            duration_seconds: 10.0,
            scenes: Vec::new(),
        }
    }

    fn solution(concepts: &[&str], steps: Vec<SolutionStep>) -> Solution {
        Solution {
            question: "q".into(),
            analysis: QuestionAnalysis {
                topic: "Mechanics".into(),
                subtopic: None,
                difficulty: "beginner".into(),
                concepts: concepts.iter().map(|c| c.to_string()).collect(),
                prerequisite_knowledge: vec![],
            },
            steps,
            total_duration: 100.0,
            scene_timeline: Vec::new(),
        }
    }

    #[test]
    fn test_classify_concept_is_case_insensitive() {
        assert_eq!(classify_concept(&["ENERGY conservation".into()]), ConceptDiagram::Energy);
        assert_eq!(classify_concept(&["Kinetic energy".into()]), ConceptDiagram::Energy);
        assert_eq!(classify_concept(&["Newton's second law".into()]), ConceptDiagram::Force);
        assert_eq!(classify_concept(&[]), ConceptDiagram::Force);
        // Only the first concept counts.
        assert_eq!(
            classify_concept(&["Torque".into(), "Energy".into()]),
            ConceptDiagram::Force
        );
    }

    #[test]
    fn test_principle_titles() {
        assert!(is_principle_title("Apply Conservation of Momentum"));
        assert!(is_principle_title("State the key CONCEPT"));
        assert!(!is_principle_title("Substitute values"));
    }

    #[test]
    fn test_phase_layout_and_tags() {
        let s = solution(
            &["Energy conservation"],
            vec![
                step(1, "Read the problem", &[]),
                step(2, "Energy principle", &["E_i = E_f", "mgh = KE", "third"]),
                step(3, "Solve", &["v^2 = 2gh", "v = sqrt(2gh)", "v = 7.67"]),
            ],
        );
        let timeline = build_timeline(&s).unwrap();
        let ids: Vec<&str> = timeline.scenes().iter().map(|s| s.scene_id.as_str()).collect();
        assert_eq!(ids, vec!["intro", "setup", "motion", "concept", "solve_1", "solve_2", "answer"]);

        let setup = timeline.scene("setup").unwrap();
        assert_eq!(setup.visual_elements, vec!["incline", "sphere", "given_info_box"]);

        let concept = timeline.scene("concept").unwrap();
        assert_eq!(concept.visual_elements, vec!["energy_diagram"]);
        assert_eq!(concept.equations, vec!["E_i = E_f", "mgh = KE"]);
        assert_eq!(concept.description, "Show governing principle: Energy conservation");

        let answer = timeline.scene("answer").unwrap();
        assert_eq!(answer.equations, vec!["v = sqrt(2gh)", "v = 7.67"]);
        assert_eq!(answer.visual_elements, vec!["answer_box", "final_value"]);

        let solve_1 = timeline.scene("solve_1").unwrap();
        assert_eq!(solve_1.description, "Energy principle");
        assert!(solve_1.visual_elements.is_empty());
    }

    #[test]
    fn test_math_collapses_to_single_scene_without_equations() {
        let s = solution(&["Forces"], vec![step(1, "Think", &[]), step(2, "Reason", &[])]);
        let timeline = build_timeline(&s).unwrap();
        assert_eq!(timeline.count_of(SceneKind::Math), 1);
        let solve = timeline.scene("solve").unwrap();
        assert!((solve.duration - 28.0).abs() < 1e-9);
        assert!(solve.equations.is_empty() && solve.visual_elements.is_empty());
        assert!(timeline.scene("answer").unwrap().equations.is_empty());
        assert!(timeline.scene("concept").unwrap().equations.is_empty());
    }

    #[test]
    fn test_math_ends_exactly_on_window_boundary() {
        let steps = (1..=7).map(|n| step(n, "Step", &["x"])).collect();
        let mut s = solution(&["Energy"], steps);
        s.total_duration = 133.7;
        let timeline = build_timeline(&s).unwrap();
        let answer = timeline.scene("answer").unwrap();
        let last_math = timeline.scene("solve_7").unwrap();
        assert_eq!(last_math.end_time, answer.start_time);
        assert!((timeline.total_duration() - 133.7).abs() < 1e-6);
    }
}
