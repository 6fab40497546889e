// SYNOID Tutor Solution Writer
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Question analysis and step-by-step solution generation.

use crate::agent::llm_bridge::{parse_json_reply, ChatRequest, TextGenerator};
use crate::error::GenerationError;
use crate::solution::{QuestionAnalysis, Solution, SolutionStep};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

#[async_trait]
pub trait QuestionAnalyzer: Send + Sync {
    async fn analyze(&self, question: &str) -> Result<QuestionAnalysis, GenerationError>;
}

#[async_trait]
pub trait SolutionGenerator: Send + Sync {
    async fn generate(&self, question: &str) -> Result<Solution, GenerationError>;
}

const ANALYSIS_SYSTEM: &str = "You are an expert at analyzing physics and math problems.";

const SOLUTION_SYSTEM: &str = r#"You are an expert physics and mathematics tutor. Given a problem, produce a granular step-by-step solution for a narrated explainer video.
Rules:
- 8-15 steps, each 6-12 seconds of narration (duration_seconds between 5 and 20).
- Show every intermediate calculation as its own step: formula, substitution, simplification, number.
- Equations in LaTeX. Name the visual elements worth animating.
- total_duration between 100 and 150 seconds.
Output JSON: {"analysis": {"topic", "subtopic", "difficulty", "concepts": [], "prerequisite_knowledge": []},
"steps": [{"step_number", "title", "explanation", "equations": [], "key_visual_elements": [], "duration_seconds"}],
"total_duration"}"#;

/// Shape of the model's solution reply; the question is attached locally.
#[derive(Debug, Deserialize)]
struct SolutionReply {
    analysis: QuestionAnalysis,
    steps: Vec<SolutionStep>,
    total_duration: f64,
}

pub struct LlmSolutionWriter {
    llm: Arc<dyn TextGenerator>,
}

impl LlmSolutionWriter {
    pub fn new(llm: Arc<dyn TextGenerator>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl QuestionAnalyzer for LlmSolutionWriter {
    async fn analyze(&self, question: &str) -> Result<QuestionAnalysis, GenerationError> {
        let user = format!(
            "Analyze this physics/math question and identify the main topic and subtopic, \
             difficulty level, key concepts and prerequisite knowledge.\n\nQuestion: {}\n\n\
             Respond with JSON keys: topic, subtopic, difficulty, concepts, prerequisite_knowledge",
            question
        );
        let raw = self.llm.complete(&ChatRequest::json(ANALYSIS_SYSTEM, user)).await?;
        let analysis: QuestionAnalysis = parse_json_reply(&raw)?;
        if analysis.topic.trim().is_empty() {
            return Err(GenerationError::Malformed("analysis has no topic".into()));
        }
        info!("[SOLUTION] Topic: {} ({})", analysis.topic, analysis.difficulty);
        Ok(analysis)
    }
}

#[async_trait]
impl SolutionGenerator for LlmSolutionWriter {
    async fn generate(&self, question: &str) -> Result<Solution, GenerationError> {
        let user = format!(
            "Generate a detailed, video-optimized solution for this problem:\n\n{}\n\n\
             Return ONLY valid JSON matching the required structure.",
            question
        );
        let raw = self.llm.complete(&ChatRequest::json(SOLUTION_SYSTEM, user)).await?;
        let reply: SolutionReply = parse_json_reply(&raw)?;

        let solution = Solution {
            question: question.to_string(),
            analysis: reply.analysis,
            steps: reply.steps,
            total_duration: reply.total_duration,
            scene_timeline: Vec::new(),
        };
        solution.check_bounds()?;

        info!(
            "[SOLUTION] {} steps, declared {:.0}s (steps sum to {:.0}s)",
            solution.steps.len(),
            solution.total_duration,
            solution.estimated_duration()
        );
        Ok(solution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Canned(&'static str);

    #[async_trait]
    impl TextGenerator for Canned {
        async fn complete(&self, _request: &ChatRequest) -> Result<String, GenerationError> {
            Ok(self.0.to_string())
        }
    }

    #[tokio::test]
    async fn test_generate_attaches_question_and_checks_bounds() {
        let reply = r#"{
            "analysis": {"topic": "Rotational dynamics", "difficulty": "intermediate",
                         "concepts": ["Energy conservation"]},
            "steps": [{"step_number": 1, "title": "Energy principle", "explanation": "e",
                       "equations": ["mgh = KE"], "key_visual_elements": ["incline"],
                       "duration_seconds": 8}],
            "total_duration": 100
        }"#;
        let writer = LlmSolutionWriter::new(Arc::new(Canned(reply)));
        let solution = writer.generate("Sphere on incline").await.unwrap();
        assert_eq!(solution.question, "Sphere on incline");
        assert_eq!(solution.analysis.subtopic, None);
        assert!(solution.scene_timeline.is_empty());
    }

    #[tokio::test]
    async fn test_out_of_bounds_solution_is_malformed() {
        let reply = r#"{"analysis": {"topic": "t", "difficulty": "d"},
                        "steps": [{"step_number": 1, "title": "x", "explanation": "e",
                                   "duration_seconds": 8}],
                        "total_duration": 30}"#;
        let writer = LlmSolutionWriter::new(Arc::new(Canned(reply)));
        assert!(matches!(
            writer.generate("q").await,
            Err(GenerationError::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn test_analyze_rejects_garbage() {
        let writer = LlmSolutionWriter::new(Arc::new(Canned("sorry, I can't")));
        assert!(matches!(writer.analyze("q").await, Err(GenerationError::Json(_))));
    }
}
