// SYNOID Muxer: Audio/Video Synchronisation
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Combines the silent animation with the narration. When the narration
// runs longer the last video frame is held; otherwise the output is cut
// to the audio length.

use crate::agent::media_probe::{media_duration, run_tool, safe_arg_path};
use crate::error::MediaError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;
use tracing::{info, warn};

/// How far apart the two inputs are.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MismatchLevel {
    /// Under one second.
    Aligned,
    /// One to five seconds: warn and adjust.
    Adjust,
    /// Five seconds or more: regeneration would be better, but we continue.
    Severe,
}

impl MismatchLevel {
    pub fn classify(video: f64, audio: f64) -> Self {
        let diff = (video - audio).abs();
        if diff < 1.0 {
            MismatchLevel::Aligned
        } else if diff < 5.0 {
            MismatchLevel::Adjust
        } else {
            MismatchLevel::Severe
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SyncPlan {
    /// Audio is longer: clone the last frame for `pad` seconds.
    ExtendLastFrame { pad: f64 },
    /// Video is as long or longer: stop at the end of the audio.
    AudioLimited,
}

impl SyncPlan {
    pub fn decide(video: f64, audio: f64) -> Self {
        if audio > video {
            SyncPlan::ExtendLastFrame { pad: audio - video }
        } else {
            SyncPlan::AudioLimited
        }
    }

    /// FFmpeg arguments between the two inputs and the output path.
    pub fn ffmpeg_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if let SyncPlan::ExtendLastFrame { pad } = self {
            args.extend([
                "-filter_complex".to_string(),
                format!("[0:v]tpad=stop_mode=clone:stop_duration={:.3}[v]", pad),
                "-map".to_string(),
                "[v]".to_string(),
                "-map".to_string(),
                "1:a".to_string(),
            ]);
        }
        args.extend(
            [
                "-c:v", "libx264", "-preset", "medium", "-crf", "23", "-c:a", "aac", "-b:a", "192k",
                "-shortest",
            ]
            .map(String::from),
        );
        args
    }
}

/// Durations and plan of a finished sync.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncReport {
    pub output: PathBuf,
    pub video_duration: f64,
    pub audio_duration: f64,
    pub level: MismatchLevel,
    pub plan: SyncPlan,
}

#[async_trait]
pub trait AvSynchronizer: Send + Sync {
    async fn sync(&self, video: &Path, audio: &Path, output: &Path) -> Result<SyncReport, MediaError>;
}

pub struct FfmpegSynchronizer {
    pub timeout: Duration,
}

impl FfmpegSynchronizer {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl AvSynchronizer for FfmpegSynchronizer {
    async fn sync(&self, video: &Path, audio: &Path, output: &Path) -> Result<SyncReport, MediaError> {
        let video_duration = media_duration(video).await?;
        let audio_duration = media_duration(audio).await?;
        info!(
            "[MUXER] Video {:.2}s, audio {:.2}s",
            video_duration, audio_duration
        );

        let level = MismatchLevel::classify(video_duration, audio_duration);
        match level {
            MismatchLevel::Aligned => {}
            MismatchLevel::Adjust => warn!(
                "[MUXER] ⚠️ Timing mismatch of {:.1}s, adjusting",
                (video_duration - audio_duration).abs()
            ),
            MismatchLevel::Severe => warn!(
                "[MUXER] ❌ Large timing mismatch of {:.1}s; consider regenerating the solution. Continuing anyway",
                (video_duration - audio_duration).abs()
            ),
        }

        let plan = SyncPlan::decide(video_duration, audio_duration);
        if let SyncPlan::ExtendLastFrame { pad } = plan {
            info!("[MUXER] Audio is longer, holding last frame for {:.2}s", pad);
        }

        if let Some(parent) = output.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut cmd = Command::new("ffmpeg");
        cmd.arg("-y")
            .arg("-i")
            .arg(safe_arg_path(video))
            .arg("-i")
            .arg(safe_arg_path(audio))
            .args(plan.ffmpeg_args())
            .arg(safe_arg_path(output));
        run_tool(cmd, "ffmpeg", self.timeout).await?;

        info!("[MUXER] ✅ Synchronised: {:?}", output);
        Ok(SyncReport {
            output: output.to_path_buf(),
            video_duration,
            audio_duration,
            level,
            plan,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_longer_extends_last_frame() {
        let plan = SyncPlan::decide(100.0, 110.0);
        assert_eq!(plan, SyncPlan::ExtendLastFrame { pad: 10.0 });
        let args = plan.ffmpeg_args();
        assert!(args.contains(&"[0:v]tpad=stop_mode=clone:stop_duration=10.000[v]".to_string()));
        assert!(args.contains(&"-shortest".to_string()));
    }

    #[test]
    fn test_video_longer_is_audio_limited() {
        let plan = SyncPlan::decide(110.0, 100.0);
        assert_eq!(plan, SyncPlan::AudioLimited);
        assert_eq!(SyncPlan::decide(100.0, 100.0), SyncPlan::AudioLimited);
        let args = plan.ffmpeg_args();
        assert!(!args.iter().any(|a| a.contains("tpad")));
        assert_eq!(args.last().map(String::as_str), Some("-shortest"));
    }

    #[test]
    fn test_mismatch_levels() {
        assert_eq!(MismatchLevel::classify(100.0, 100.9), MismatchLevel::Aligned);
        assert_eq!(MismatchLevel::classify(100.0, 101.0), MismatchLevel::Adjust);
        assert_eq!(MismatchLevel::classify(104.9, 100.0), MismatchLevel::Adjust);
        assert_eq!(MismatchLevel::classify(100.0, 110.0), MismatchLevel::Severe);
    }
}
