// SYNOID Tutor Solution Model
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// A `Solution` is the draft exactly as the generator produced it. It only
// becomes usable by the rest of the pipeline after `materialize`, which
// pins its scene timeline and hands back a `TimedSolution`.

use crate::error::{GenerationError, PipelineError, TimelineError};
use crate::timeline::builder::build_timeline;
use crate::timeline::{Scene, Timeline};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

pub const STEP_DURATION_BOUNDS: RangeInclusive<f64> = 5.0..=20.0;
pub const TOTAL_DURATION_BOUNDS: RangeInclusive<f64> = 80.0..=180.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionAnalysis {
    pub topic: String,
    #[serde(default)]
    pub subtopic: Option<String>,
    pub difficulty: String,
    #[serde(default)]
    pub concepts: Vec<String>,
    #[serde(default, alias = "prerequisites")]
    pub prerequisite_knowledge: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolutionStep {
    pub step_number: u32,
    pub title: String,
    pub explanation: String,
    #[serde(default)]
    pub equations: Vec<String>,
    #[serde(default)]
    pub key_visual_elements: Vec<String>,
    pub duration_seconds: f64,
    /// Upstream scene breakdown, carried through snapshots untouched.
    #[serde(default)]
    pub scenes: Vec<Scene>,
}

impl SolutionStep {
    pub fn has_equations(&self) -> bool {
        !self.equations.is_empty()
    }
}

/// Draft solution as returned by the solution generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    pub question: String,
    pub analysis: QuestionAnalysis,
    pub steps: Vec<SolutionStep>,
    pub total_duration: f64,
    /// Supplied timeline, if any. Empty means "derive from steps".
    #[serde(default)]
    pub scene_timeline: Vec<Scene>,
}

impl Solution {
    /// Sum of step durations. Advisory only.
    pub fn estimated_duration(&self) -> f64 {
        self.steps.iter().map(|s| s.duration_seconds).sum()
    }

    /// Reject generator output outside the duration bounds.
    pub fn check_bounds(&self) -> Result<(), GenerationError> {
        if self.steps.is_empty() {
            return Err(GenerationError::Malformed("solution has no steps".into()));
        }
        if !TOTAL_DURATION_BOUNDS.contains(&self.total_duration) {
            return Err(GenerationError::Malformed(format!(
                "total_duration {}s outside {:?}",
                self.total_duration, TOTAL_DURATION_BOUNDS
            )));
        }
        if let Some(step) = self
            .steps
            .iter()
            .find(|s| !STEP_DURATION_BOUNDS.contains(&s.duration_seconds))
        {
            return Err(GenerationError::Malformed(format!(
                "step {} duration {}s outside {:?}",
                step.step_number, step.duration_seconds, STEP_DURATION_BOUNDS
            )));
        }
        Ok(())
    }

    /// Pin the scene timeline.
    ///
    /// A supplied timeline wins and is only validated; otherwise one is
    /// built from the steps. Either way the result never changes on a
    /// second call, since `into_draft` carries the pinned timeline along.
    pub fn materialize(self) -> Result<TimedSolution, TimelineError> {
        let timeline = if self.scene_timeline.is_empty() {
            build_timeline(&self)?
        } else {
            Timeline::new(self.scene_timeline.clone())?
        };
        Ok(TimedSolution {
            draft: Solution {
                scene_timeline: Vec::new(),
                ..self
            },
            timeline,
        })
    }
}

/// A solution whose timeline has been pinned. Read-only from here on.
#[derive(Debug, Clone, PartialEq)]
pub struct TimedSolution {
    draft: Solution,
    timeline: Timeline,
}

impl TimedSolution {
    pub fn question(&self) -> &str {
        &self.draft.question
    }

    pub fn analysis(&self) -> &QuestionAnalysis {
        &self.draft.analysis
    }

    pub fn steps(&self) -> &[SolutionStep] {
        &self.draft.steps
    }

    pub fn total_duration(&self) -> f64 {
        self.draft.total_duration
    }

    pub fn estimated_duration(&self) -> f64 {
        self.draft.estimated_duration()
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Snapshot form with the pinned timeline embedded.
    pub fn into_draft(self) -> Solution {
        Solution {
            scene_timeline: self.timeline.into_scenes(),
            ..self.draft
        }
    }

    pub fn to_snapshot(&self) -> Solution {
        self.clone().into_draft()
    }

    /// Reload a persisted snapshot. Hand-edited files are held to the same
    /// duration bounds as generator output.
    pub fn from_snapshot(json: &str) -> Result<Self, PipelineError> {
        let draft: Solution = serde_json::from_str(json).map_err(GenerationError::from)?;
        draft.check_bounds()?;
        Ok(draft.materialize()?)
    }
}
