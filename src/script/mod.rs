// SYNOID Tutor Voiceover Script
// Copyright (c) 2026 Xing_The_Creator | SYNOID

pub mod validator;

use crate::timeline::{Scene, Timeline};
use serde::{Deserialize, Serialize};

/// Narration pace the script writer is held to.
pub const SPEAKING_RATE_WPS: f64 = 2.5;

/// One narration utterance, tied to a scene by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptSegment {
    pub start_time: f64,
    pub end_time: f64,
    pub text: String,
    pub scene_id: String,
}

impl ScriptSegment {
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }

    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceoverScript {
    pub full_script: String,
    pub segments: Vec<ScriptSegment>,
    pub total_duration: f64,
}

/// Maximum words that fit in `duration` seconds of narration.
pub fn word_budget(duration: f64) -> usize {
    if duration <= 0.0 {
        return 0;
    }
    (duration * SPEAKING_RATE_WPS).floor() as usize
}

/// What the script writer must produce for one scene.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentSlot<'a> {
    pub scene: &'a Scene,
    pub max_words: usize,
}

/// One slot per scene, in timeline order.
pub fn segment_slots(timeline: &Timeline) -> Vec<SegmentSlot<'_>> {
    timeline
        .scenes()
        .iter()
        .map(|scene| SegmentSlot {
            scene,
            max_words: word_budget(scene.duration),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::SceneKind;

    #[test]
    fn test_word_budget() {
        assert_eq!(word_budget(10.0), 25);
        assert_eq!(word_budget(5.0), 12);
        assert_eq!(word_budget(0.0), 0);
        assert_eq!(word_budget(-3.0), 0);
    }

    #[test]
    fn test_one_slot_per_scene() {
        let timeline = Timeline::new(vec![
            Scene::spanning("intro", SceneKind::Intro, 0.0, 4.0, "t"),
            Scene::spanning("setup", SceneKind::Setup, 4.0, 16.0, "s"),
        ])
        .unwrap();
        let slots = segment_slots(&timeline);
        assert_eq!(slots.len(), 2);
        assert_eq!(slots[0].max_words, 10);
        assert_eq!(slots[1].max_words, 30);
        assert_eq!(slots[1].scene.scene_id, "setup");
    }
}
