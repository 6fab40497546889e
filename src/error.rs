// SYNOID Tutor Error Taxonomy
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// One error enum per concern. The orchestrator is the only place that
// decides fatal vs. continue; it folds everything into `PipelineError`
// and labels it with the stage that failed.

use crate::agent::orchestrator::Stage;
use crate::script::validator::TimingIssue;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Startup configuration problems. Always fatal before any stage runs.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} not found in environment (set it in .env or export it)")]
    MissingCredential(&'static str),

    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Structural problems with a scene timeline.
#[derive(Debug, Error, PartialEq)]
pub enum TimelineError {
    #[error("timeline has no scenes")]
    Empty,

    #[error("first scene '{0}' does not start at 0")]
    NonZeroStart(String),

    #[error("scene '{id}' starts at {start:.3}s but previous scene ends at {previous_end:.3}s")]
    Discontiguous {
        id: String,
        start: f64,
        previous_end: f64,
    },

    #[error("scene '{0}' has end <= start")]
    EmptyInterval(String),

    #[error("scene '{id}' stores duration {stored:.3}s but spans {actual:.3}s")]
    DurationMismatch { id: String, stored: f64, actual: f64 },

    #[error("duplicate scene id '{0}'")]
    DuplicateId(String),
}

/// Failures from a text-generation collaborator.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("model returned an empty response")]
    EmptyResponse,

    #[error("could not parse model output: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed model output: {0}")]
    Malformed(String),
}

/// Failures from the speech synthesizer.
#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("speech request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("speech API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("could not write audio: {0}")]
    Io(#[from] std::io::Error),
}

/// Generated animation source never passed the well-formedness check.
#[derive(Debug, Error)]
pub enum CodeGenerationError {
    #[error("{class_name}: no valid source after {attempts} attempts (last rejection: {last_rejection})")]
    Exhausted {
        class_name: &'static str,
        attempts: u32,
        last_rejection: String,
        /// Source of the last rejected attempt, kept for inspection.
        last_source: String,
    },

    #[error("{0}: no scenes to animate")]
    EmptyBrief(&'static str),

    #[error(transparent)]
    Generation(#[from] GenerationError),
}

/// External process failures (renderer, ffmpeg, ffprobe).
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("failed to spawn {tool}: {source}")]
    Spawn {
        tool: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} timed out after {timeout:?}")]
    TimedOut { tool: &'static str, timeout: Duration },

    #[error("{tool} exited with {status}: {stderr}")]
    Failed {
        tool: &'static str,
        status: String,
        stderr: String,
    },

    #[error("expected output missing: {0:?}")]
    MissingOutput(PathBuf),

    #[error("probe failed: {0}")]
    Probe(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Durable artifact storage problems.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("artifact already exists for this run timestamp: {0:?}")]
    Collision(PathBuf),

    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Everything that can end a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Timeline(#[from] TimelineError),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Synthesis(#[from] SynthesisError),

    #[error(transparent)]
    CodeGeneration(#[from] CodeGenerationError),

    #[error("script timing rejected after {attempts} attempts: {issue}")]
    Timing { issue: TimingIssue, attempts: u32 },

    #[error(transparent)]
    Media(#[from] MediaError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("output validation failed: {0}")]
    OutputValidation(String),
}

/// Terminal error of a run, labelled with the stage that failed.
#[derive(Debug, Error)]
#[error("stage {stage} failed: {source}")]
pub struct StageFailure {
    pub stage: Stage,
    #[source]
    pub source: PipelineError,
}

impl StageFailure {
    pub fn new(stage: Stage, source: impl Into<PipelineError>) -> Self {
        Self {
            stage,
            source: source.into(),
        }
    }
}
