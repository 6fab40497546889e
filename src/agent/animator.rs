// SYNOID Tutor Animator
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Turns one slice of the timeline into Manim source. Each role sees only
// its own scenes and narration, cut from the shared timeline snapshot.

use crate::agent::llm_bridge::{strip_code_fence, ChatRequest, TextGenerator};
use crate::agent::script_writer::join_or_none;
use crate::agent::validation_gate::SourceCheck;
use crate::error::{CodeGenerationError, GenerationError};
use crate::script::{ScriptSegment, VoiceoverScript};
use crate::solution::{SolutionStep, TimedSolution};
use crate::timeline::partition::{split_timeline, Part};
use crate::timeline::Scene;
use async_trait::async_trait;
use serde::Serialize;
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::{info, warn};

/// Which animation artifact is being produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CodeRole {
    Intro,
    Solution,
    /// Legacy single-agent mode covering the whole timeline.
    Single,
}

impl CodeRole {
    pub fn class_name(&self) -> &'static str {
        match self {
            CodeRole::Intro => "IntroSetupScene",
            CodeRole::Solution => "StepSolutionScene",
            CodeRole::Single => "PhysicsSolution",
        }
    }

    /// File-name tag: `animation_<tag>_<ts>.py`, empty for single mode.
    pub fn file_tag(&self) -> Option<&'static str> {
        match self {
            CodeRole::Intro => Some("intro"),
            CodeRole::Solution => Some("solution"),
            CodeRole::Single => None,
        }
    }
}

/// Generated, renderable source for one role.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnimationCode {
    pub code: String,
    pub class_name: String,
    pub estimated_duration: f64,
}

/// Problem context shared by every role.
#[derive(Debug, Clone, PartialEq)]
pub struct ProblemContext {
    pub question: String,
    pub topic: String,
    pub difficulty: String,
    pub concepts: Vec<String>,
}

/// Immutable input for one code-generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct CodeBrief {
    pub role: CodeRole,
    pub context: ProblemContext,
    pub scenes: Vec<Scene>,
    pub segments: Vec<ScriptSegment>,
    pub duration: f64,
    /// Worked steps. Always empty for the intro role.
    pub steps: Vec<SolutionStep>,
}

impl CodeBrief {
    pub fn new(role: CodeRole, solution: &TimedSolution, script: &VoiceoverScript) -> Self {
        let context = ProblemContext {
            question: solution.question().to_string(),
            topic: solution.analysis().topic.clone(),
            difficulty: solution.analysis().difficulty.clone(),
            concepts: solution.analysis().concepts.clone(),
        };

        let (scenes, segments, duration) = match role {
            CodeRole::Single => (
                solution.timeline().scenes().to_vec(),
                script.segments.clone(),
                solution.total_duration(),
            ),
            CodeRole::Intro | CodeRole::Solution => {
                let part = if role == CodeRole::Intro {
                    Part::Introduction
                } else {
                    Part::Solution
                };
                let split = split_timeline(solution.timeline());
                let partition = split.part(part);
                (
                    partition.scenes.clone(),
                    partition.segments_of(script),
                    partition.duration,
                )
            }
        };

        let steps = match role {
            CodeRole::Intro => Vec::new(),
            CodeRole::Solution | CodeRole::Single => solution.steps().to_vec(),
        };

        Self {
            role,
            context,
            scenes,
            segments,
            duration,
            steps,
        }
    }
}

#[async_trait]
pub trait CodeGenerator: Send + Sync {
    /// One generation attempt. Well-formedness is checked by the caller.
    async fn generate(&self, brief: &CodeBrief) -> Result<AnimationCode, GenerationError>;
}

const ANIMATOR_SYSTEM: &str = "You are a master Manim animator creating 3Blue1Brown-quality educational physics animations. \
Output only complete, runnable Python using `from manim import *`. Never use GrowArrow or self.camera.frame. \
Keep every element inside the frame and pace animations with self.wait() so each scene ends on its timestamp.";

/// User prompt for one brief.
pub fn animation_prompt(brief: &CodeBrief) -> String {
    let mut timeline = String::new();
    for s in &brief.scenes {
        let _ = write!(
            timeline,
            "\n# SCENE: {} ({})\n# Time: {:.2}s - {:.2}s (Duration: {:.2}s)\n# {}\n# Visuals: {}\n# Equations: {}\n",
            s.scene_id,
            s.scene_type,
            s.start_time,
            s.end_time,
            s.duration,
            s.description,
            join_or_none(&s.visual_elements),
            join_or_none(&s.equations),
        );
    }

    let mut narration = String::new();
    for (i, seg) in brief.segments.iter().enumerate() {
        let _ = write!(
            narration,
            "\nSegment {}: {:.2}s - {:.2}s ({:.2}s)\nScene: {}\nNarration: \"{}\"\n",
            i + 1,
            seg.start_time,
            seg.end_time,
            seg.duration(),
            seg.scene_id,
            seg.text,
        );
    }

    let mut steps = String::new();
    for step in &brief.steps {
        let _ = write!(
            steps,
            "\nStep {}: {}\nExplanation: {}\nEquations: {}\n",
            step.step_number,
            step.title,
            step.explanation,
            join_or_none(&step.equations),
        );
    }

    let mission = match brief.role {
        CodeRole::Intro => {
            "Animate PART 1 of 2: hook, build the physical scenario and show the motion. \
             End on the open question. Do NOT solve the problem and do NOT reveal the answer."
        }
        CodeRole::Solution => {
            "Animate PART 2 of 2: the scenario is already on screen from part 1. \
             Start directly with the governing principle, show every calculation step, \
             and end with the emphasized final answer. Do NOT re-introduce the problem."
        }
        CodeRole::Single => {
            "Animate the complete explainer: introduction, setup, motion, principle, \
             every calculation step and the emphasized final answer."
        }
    };

    let mut prompt = format!(
        "PROBLEM CONTEXT:\nTopic: {}\nDifficulty: {}\nQuestion: {}\nKey Concepts: {}\n\n{}\n\n\
         EXACT SCENE TIMELINE:\n{}\nVOICEOVER TIMING:\n{}",
        brief.context.topic,
        brief.context.difficulty,
        brief.context.question,
        join_or_none(&brief.context.concepts),
        mission,
        timeline,
        narration,
    );
    if !steps.is_empty() {
        let _ = write!(prompt, "\nSOLUTION BREAKDOWN:\n{}", steps);
    }
    let _ = write!(
        prompt,
        "\nTotal animation duration MUST be exactly {:.2} seconds.\n\
         Class name must be: {}(Scene)\nGenerate ONLY the Python code. No markdown.",
        brief.duration,
        brief.role.class_name(),
    );
    prompt
}

pub struct LlmAnimator {
    llm: Arc<dyn TextGenerator>,
}

impl LlmAnimator {
    pub fn new(llm: Arc<dyn TextGenerator>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl CodeGenerator for LlmAnimator {
    async fn generate(&self, brief: &CodeBrief) -> Result<AnimationCode, GenerationError> {
        let raw = self
            .llm
            .complete(&ChatRequest::text(ANIMATOR_SYSTEM, animation_prompt(brief)))
            .await?;
        let code = strip_code_fence(&raw).to_string();
        if code.is_empty() {
            return Err(GenerationError::EmptyResponse);
        }
        Ok(AnimationCode {
            code,
            class_name: brief.role.class_name().to_string(),
            estimated_duration: brief.duration,
        })
    }
}

/// Bounded retry around the well-formedness check.
#[derive(Debug, Clone, PartialEq)]
pub enum RetryState {
    /// About to make attempt `n` (1-based).
    Attempting(u32),
    Succeeded(AnimationCode),
    Exhausted { attempts: u32 },
}

impl RetryState {
    /// Advance after attempt `n` produced `outcome`.
    pub fn advance(self, outcome: Option<AnimationCode>, max_attempts: u32) -> RetryState {
        match self {
            RetryState::Attempting(n) => match outcome {
                Some(code) => RetryState::Succeeded(code),
                None if n >= max_attempts => RetryState::Exhausted { attempts: n },
                None => RetryState::Attempting(n + 1),
            },
            terminal => terminal,
        }
    }
}

/// Generate until the source passes `check` or `max_attempts` run out.
///
/// A generation error from the service itself is not retried.
pub async fn generate_with_retry(
    generator: &dyn CodeGenerator,
    check: &dyn SourceCheck,
    brief: &CodeBrief,
    max_attempts: u32,
) -> Result<AnimationCode, CodeGenerationError> {
    let class_name = brief.role.class_name();
    let max_attempts = max_attempts.max(1);
    let mut state = RetryState::Attempting(1);
    let mut last_rejection = String::new();
    let mut last_source = String::new();

    loop {
        match state {
            RetryState::Attempting(n) => {
                info!("[ANIMATOR] Generating {} (attempt {}/{})", class_name, n, max_attempts);
                let code = generator.generate(brief).await?;
                let outcome = match check.check(&code.code).await {
                    Ok(()) => Some(code),
                    Err(reason) => {
                        warn!("[ANIMATOR] {} rejected: {}", class_name, reason);
                        last_rejection = reason;
                        last_source = code.code;
                        None
                    }
                };
                state = RetryState::Attempting(n).advance(outcome, max_attempts);
            }
            RetryState::Succeeded(code) => {
                info!("[ANIMATOR] ✅ Valid {} generated", class_name);
                return Ok(code);
            }
            RetryState::Exhausted { attempts } => {
                return Err(CodeGenerationError::Exhausted {
                    class_name,
                    attempts,
                    last_rejection,
                    last_source,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code() -> AnimationCode {
        AnimationCode {
            code: "x = 1".into(),
            class_name: "PhysicsSolution".into(),
            estimated_duration: 10.0,
        }
    }

    #[test]
    fn test_retry_state_transitions() {
        assert_eq!(RetryState::Attempting(1).advance(None, 3), RetryState::Attempting(2));
        assert_eq!(
            RetryState::Attempting(3).advance(None, 3),
            RetryState::Exhausted { attempts: 3 }
        );
        assert_eq!(
            RetryState::Attempting(2).advance(Some(code()), 3),
            RetryState::Succeeded(code())
        );
        // Terminal states stay put.
        assert_eq!(
            RetryState::Exhausted { attempts: 3 }.advance(Some(code()), 3),
            RetryState::Exhausted { attempts: 3 }
        );
    }

    #[test]
    fn test_role_names() {
        assert_eq!(CodeRole::Intro.class_name(), "IntroSetupScene");
        assert_eq!(CodeRole::Solution.class_name(), "StepSolutionScene");
        assert_eq!(CodeRole::Single.file_tag(), None);
    }
}
