// SYNOID Tutor Script Writer
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Asks the model for exactly one narration segment per timeline scene,
// each held to a hard word budget.

use crate::agent::llm_bridge::{parse_json_reply, ChatRequest, TextGenerator};
use crate::error::GenerationError;
use crate::script::{segment_slots, VoiceoverScript, SPEAKING_RATE_WPS};
use crate::solution::TimedSolution;
use async_trait::async_trait;
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::info;

#[async_trait]
pub trait ScriptGenerator: Send + Sync {
    async fn generate(&self, solution: &TimedSolution) -> Result<VoiceoverScript, GenerationError>;
}

const SCRIPT_SYSTEM: &str = r#"You write voiceover scripts for physics explainer videos in friendly, conversational Hinglish (Hindi connectors, English technical terms).
Timing is the hard constraint: one segment per scene, copying each scene's start_time, end_time and scene_id exactly, and never exceeding the scene's word budget.
Output JSON: {"full_script": string, "segments": [{"start_time", "end_time", "text", "scene_id"}], "total_duration": number}"#;

/// User prompt carrying the full timeline and per-scene word budgets.
pub fn script_prompt(solution: &TimedSolution) -> String {
    let mut scenes = String::new();
    for slot in segment_slots(solution.timeline()) {
        let s = slot.scene;
        let _ = write!(
            scenes,
            "\nScene: {} ({})\nStart: {:.2}s\nEnd: {:.2}s\nDuration: {:.2}s\nMax words: {}\n\
             Description: {}\nVisual elements: {}\nEquations: {}\n",
            s.scene_id,
            s.scene_type,
            s.start_time,
            s.end_time,
            s.duration,
            slot.max_words,
            s.description,
            join_or_none(&s.visual_elements),
            join_or_none(&s.equations),
        );
    }

    format!(
        "Create a voiceover script for this solution.\n\nTopic: {}\nDifficulty: {}\n\
         Total Duration: {} seconds\nQuestion: {}\n\nMatch narration to these EXACT scene timings:\n{}\n\
         Speaking rate is {} words per second: a segment may hold at most duration x {} words.\n\
         Create ONE segment for EACH scene above with identical start/end times and scene_id.\n\
         Return ONLY valid JSON.",
        solution.analysis().topic,
        solution.analysis().difficulty,
        solution.total_duration(),
        solution.question(),
        scenes,
        SPEAKING_RATE_WPS,
        SPEAKING_RATE_WPS,
    )
}

pub(crate) fn join_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "None".to_string()
    } else {
        items.join(", ")
    }
}

pub struct LlmScriptWriter {
    llm: Arc<dyn TextGenerator>,
}

impl LlmScriptWriter {
    pub fn new(llm: Arc<dyn TextGenerator>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl ScriptGenerator for LlmScriptWriter {
    async fn generate(&self, solution: &TimedSolution) -> Result<VoiceoverScript, GenerationError> {
        let request = ChatRequest::json(SCRIPT_SYSTEM, script_prompt(solution));
        let raw = self.llm.complete(&request).await?;
        let script: VoiceoverScript = parse_json_reply(&raw)?;
        if script.segments.is_empty() {
            return Err(GenerationError::Malformed("script has no segments".into()));
        }
        info!(
            "[SCRIPT] {} segments, {:.1}s, {} characters",
            script.segments.len(),
            script.total_duration,
            script.full_script.len()
        );
        Ok(script)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solution::{QuestionAnalysis, Solution, SolutionStep};

    fn timed() -> TimedSolution {
        Solution {
            question: "How fast is the sphere?".into(),
            analysis: QuestionAnalysis {
                topic: "Rolling motion".into(),
                subtopic: None,
                difficulty: "intermediate".into(),
                concepts: vec!["Energy conservation".into()],
                prerequisite_knowledge: vec![],
            },
            steps: vec![SolutionStep {
                step_number: 1,
                title: "Energy".into(),
                explanation: "e".into(),
                equations: vec!["mgh = KE".into()],
                key_visual_elements: vec![],
                duration_seconds: 10.0,
                scenes: vec![],
            }],
            total_duration: 100.0,
            scene_timeline: vec![],
        }
        .materialize()
        .unwrap()
    }

    #[test]
    fn test_prompt_lists_every_scene_with_budget() {
        let prompt = script_prompt(&timed());
        for id in ["intro", "setup", "motion", "concept", "solve_1", "answer"] {
            assert!(prompt.contains(&format!("Scene: {} (", id)), "missing {}", id);
        }
        // intro is 5s -> 12 words, solve_1 is 28s -> 70 words
        assert!(prompt.contains("Max words: 12"));
        assert!(prompt.contains("Max words: 70"));
        assert!(prompt.contains("Equations: mgh = KE"));
    }

    #[test]
    fn test_join_or_none() {
        assert_eq!(join_or_none(&[]), "None");
        assert_eq!(join_or_none(&["a".into(), "b".into()]), "a, b");
    }
}
