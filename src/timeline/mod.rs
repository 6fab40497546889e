// SYNOID Tutor Scene Timeline
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// A timeline is the single source of truth for timing. Every downstream
// artifact (narration, both animation halves) is cut from the same
// immutable scene list.

pub mod allocator;
pub mod builder;
pub mod partition;

use crate::error::TimelineError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Tolerance used when checking timelines that came from outside the
/// builder (e.g. a snapshot or a model response).
pub const TIME_EPSILON: f64 = 1e-6;

/// Narrative role of a scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SceneKind {
    Intro,
    Setup,
    Visualization,
    Concept,
    Math,
    Answer,
}

impl SceneKind {
    pub const ALL: [SceneKind; 6] = [
        SceneKind::Intro,
        SceneKind::Setup,
        SceneKind::Visualization,
        SceneKind::Concept,
        SceneKind::Math,
        SceneKind::Answer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SceneKind::Intro => "intro",
            SceneKind::Setup => "setup",
            SceneKind::Visualization => "visualization",
            SceneKind::Concept => "concept",
            SceneKind::Math => "math",
            SceneKind::Answer => "answer",
        }
    }
}

impl fmt::Display for SceneKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An atomic, named interval of the final video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub scene_id: String,
    pub scene_type: SceneKind,
    pub start_time: f64,
    pub end_time: f64,
    /// Persisted alongside start/end; must equal `end_time - start_time`.
    pub duration: f64,
    pub description: String,
    #[serde(default)]
    pub visual_elements: Vec<String>,
    #[serde(default)]
    pub equations: Vec<String>,
}

impl Scene {
    /// Build a scene over `[start, end)`, deriving the stored duration.
    pub fn spanning(
        scene_id: impl Into<String>,
        scene_type: SceneKind,
        start: f64,
        end: f64,
        description: impl Into<String>,
    ) -> Self {
        Self {
            scene_id: scene_id.into(),
            scene_type,
            start_time: start,
            end_time: end,
            duration: end - start,
            description: description.into(),
            visual_elements: Vec::new(),
            equations: Vec::new(),
        }
    }

    pub fn with_visuals(mut self, visuals: Vec<String>) -> Self {
        self.visual_elements = visuals;
        self
    }

    pub fn with_equations(mut self, equations: Vec<String>) -> Self {
        self.equations = equations;
        self
    }
}

/// Ordered, gap-free, overlap-free scene list starting at 0.
///
/// The only way to obtain one is through [`Timeline::new`], which checks
/// every invariant, so holders never need to re-validate.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Timeline {
    scenes: Vec<Scene>,
}

impl Timeline {
    pub fn new(scenes: Vec<Scene>) -> Result<Self, TimelineError> {
        let first = scenes.first().ok_or(TimelineError::Empty)?;
        if first.start_time.abs() > TIME_EPSILON {
            return Err(TimelineError::NonZeroStart(first.scene_id.clone()));
        }

        let mut seen = HashSet::new();
        let mut previous_end: Option<f64> = None;
        for scene in &scenes {
            if !seen.insert(scene.scene_id.as_str()) {
                return Err(TimelineError::DuplicateId(scene.scene_id.clone()));
            }
            if scene.end_time <= scene.start_time {
                return Err(TimelineError::EmptyInterval(scene.scene_id.clone()));
            }
            let actual = scene.end_time - scene.start_time;
            if (scene.duration - actual).abs() > TIME_EPSILON {
                return Err(TimelineError::DurationMismatch {
                    id: scene.scene_id.clone(),
                    stored: scene.duration,
                    actual,
                });
            }
            if let Some(prev) = previous_end {
                if (scene.start_time - prev).abs() > TIME_EPSILON {
                    return Err(TimelineError::Discontiguous {
                        id: scene.scene_id.clone(),
                        start: scene.start_time,
                        previous_end: prev,
                    });
                }
            }
            previous_end = Some(scene.end_time);
        }

        Ok(Self { scenes })
    }

    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    /// End time of the last scene.
    pub fn total_duration(&self) -> f64 {
        self.scenes.last().map(|s| s.end_time).unwrap_or(0.0)
    }

    pub fn scene(&self, scene_id: &str) -> Option<&Scene> {
        self.scenes.iter().find(|s| s.scene_id == scene_id)
    }

    pub fn count_of(&self, kind: SceneKind) -> usize {
        self.scenes.iter().filter(|s| s.scene_type == kind).count()
    }

    pub fn into_scenes(self) -> Vec<Scene> {
        self.scenes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene(id: &str, start: f64, end: f64) -> Scene {
        Scene::spanning(id, SceneKind::Math, start, end, id)
    }

    #[test]
    fn test_accepts_contiguous_scenes() {
        let timeline = Timeline::new(vec![scene("a", 0.0, 2.0), scene("b", 2.0, 5.0)]).unwrap();
        assert_eq!(timeline.len(), 2);
        assert_eq!(timeline.total_duration(), 5.0);
        assert!(timeline.scene("b").is_some());
    }

    #[test]
    fn test_rejects_gap() {
        let err = Timeline::new(vec![scene("a", 0.0, 2.0), scene("b", 2.5, 5.0)]).unwrap_err();
        assert!(matches!(err, TimelineError::Discontiguous { .. }));
    }

    #[test]
    fn test_rejects_overlap_and_late_start() {
        let err = Timeline::new(vec![scene("a", 0.0, 2.0), scene("b", 1.0, 5.0)]).unwrap_err();
        assert!(matches!(err, TimelineError::Discontiguous { .. }));

        let err = Timeline::new(vec![scene("a", 1.0, 2.0)]).unwrap_err();
        assert_eq!(err, TimelineError::NonZeroStart("a".into()));
    }

    #[test]
    fn test_rejects_stale_duration_field() {
        let mut bad = scene("a", 0.0, 4.0);
        bad.duration = 3.0;
        let err = Timeline::new(vec![bad]).unwrap_err();
        assert!(matches!(err, TimelineError::DurationMismatch { .. }));
    }

    #[test]
    fn test_rejects_duplicates_and_empty() {
        assert_eq!(Timeline::new(vec![]).unwrap_err(), TimelineError::Empty);
        let err = Timeline::new(vec![scene("a", 0.0, 1.0), scene("a", 1.0, 2.0)]).unwrap_err();
        assert_eq!(err, TimelineError::DuplicateId("a".into()));
    }

    #[test]
    fn test_scene_kind_serializes_lowercase() {
        let json = serde_json::to_string(&SceneKind::Visualization).unwrap();
        assert_eq!(json, "\"visualization\"");
    }
}
