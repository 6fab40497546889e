// SYNOID Tutor Scene-Subset Partitioner
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Splits one timeline into the two halves that are generated and
// rendered independently: the introduction (staging, no answer) and the
// solution (principle, working, answer).

use super::{Scene, SceneKind, Timeline};
use crate::script::{ScriptSegment, VoiceoverScript};
use std::collections::HashSet;

/// Which half of the video a scene belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Part {
    Introduction,
    Solution,
}

impl Part {
    pub fn of(kind: SceneKind) -> Part {
        match kind {
            SceneKind::Intro | SceneKind::Setup | SceneKind::Visualization => Part::Introduction,
            SceneKind::Concept | SceneKind::Math | SceneKind::Answer => Part::Solution,
        }
    }
}

/// Order-preserving subset of a timeline.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScenePartition {
    pub scenes: Vec<Scene>,
    pub duration: f64,
}

impl ScenePartition {
    fn from_scenes(scenes: Vec<Scene>) -> Self {
        let duration = scenes.iter().map(|s| s.duration).sum();
        Self { scenes, duration }
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    pub fn scene_ids(&self) -> HashSet<&str> {
        self.scenes.iter().map(|s| s.scene_id.as_str()).collect()
    }

    /// Segments narrating this partition's scenes, in script order.
    pub fn segments_of(&self, script: &VoiceoverScript) -> Vec<ScriptSegment> {
        let ids = self.scene_ids();
        script
            .segments
            .iter()
            .filter(|seg| ids.contains(seg.scene_id.as_str()))
            .cloned()
            .collect()
    }
}

/// Both halves of a timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineSplit {
    pub introduction: ScenePartition,
    pub solution: ScenePartition,
}

impl TimelineSplit {
    pub fn part(&self, part: Part) -> &ScenePartition {
        match part {
            Part::Introduction => &self.introduction,
            Part::Solution => &self.solution,
        }
    }
}

/// Partition by scene kind. Empty halves are returned as empty, never an error.
pub fn split_timeline(timeline: &Timeline) -> TimelineSplit {
    let (intro, solution): (Vec<Scene>, Vec<Scene>) = timeline
        .scenes()
        .iter()
        .cloned()
        .partition(|s| Part::of(s.scene_type) == Part::Introduction);
    TimelineSplit {
        introduction: ScenePartition::from_scenes(intro),
        solution: ScenePartition::from_scenes(solution),
    }
}
