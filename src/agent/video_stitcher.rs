// SYNOID Video Stitcher: Lossless Concatenation
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Joins the rendered introduction and solution using FFmpeg's concat
// demuxer (`-f concat`). Both parts come from the same renderer settings,
// so `-c copy` is safe and costs almost nothing.

use crate::agent::media_probe::{media_duration, run_tool, safe_arg_path};
use crate::error::MediaError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;
use tracing::{error, info};

#[async_trait]
pub trait VideoJoiner: Send + Sync {
    /// Concatenate `first` then `second` into `output`; returns its duration.
    async fn join(&self, first: &Path, second: &Path, output: &Path) -> Result<f64, MediaError>;
}

pub struct VideoStitcher {
    pub timeout: Duration,
}

impl VideoStitcher {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Build the contents of an FFmpeg concat manifest.
    ///
    /// Each line is `file '<absolute_path>'`; single quotes inside a path
    /// are escaped the way the concat demuxer expects.
    pub fn create_concat_manifest(segments: &[PathBuf]) -> String {
        segments
            .iter()
            .map(|p| {
                let abs = std::path::absolute(p).unwrap_or_else(|_| p.clone());
                format!("file '{}'", abs.to_string_lossy().replace('\'', "'\\''"))
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[async_trait]
impl VideoJoiner for VideoStitcher {
    async fn join(&self, first: &Path, second: &Path, output: &Path) -> Result<f64, MediaError> {
        for part in [first, second] {
            if !part.exists() {
                return Err(MediaError::MissingOutput(part.to_path_buf()));
            }
        }

        // Manifest lives next to the output file
        let manifest_path = output.with_extension("concat_manifest.txt");
        let manifest = Self::create_concat_manifest(&[first.to_path_buf(), second.to_path_buf()]);
        tokio::fs::write(&manifest_path, &manifest).await?;
        info!("[STITCHER] Manifest written: {:?}", manifest_path);

        let mut cmd = Command::new("ffmpeg");
        cmd.args(["-y", "-f", "concat", "-safe", "0", "-i"])
            .arg(&manifest_path)
            .args(["-c", "copy"])
            .arg(safe_arg_path(output));
        let result = run_tool(cmd, "ffmpeg", self.timeout).await;

        // Cleanup manifest
        let _ = tokio::fs::remove_file(&manifest_path).await;
        result?;

        if !output.exists() {
            error!("[STITCHER] ❌ FFmpeg reported success but {:?} is missing", output);
            return Err(MediaError::MissingOutput(output.to_path_buf()));
        }
        let duration = media_duration(output).await?;
        if duration <= 0.0 {
            return Err(MediaError::Probe(format!(
                "joined video {:?} has duration {:.2}s",
                output, duration
            )));
        }

        info!("[STITCHER] ✅ Joined video: {:?} ({:.2}s)", output, duration);
        Ok(duration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concat_manifest_generation() {
        let segments = vec![
            PathBuf::from("/tmp/video_intro_1.mp4"),
            PathBuf::from("/tmp/video_solution_1.mp4"),
        ];
        let manifest = VideoStitcher::create_concat_manifest(&segments);
        let lines: Vec<&str> = manifest.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "file '/tmp/video_intro_1.mp4'");
        assert!(lines[1].contains("video_solution_1.mp4"));
    }

    #[test]
    fn test_manifest_escapes_quotes() {
        let manifest = VideoStitcher::create_concat_manifest(&[PathBuf::from("/tmp/it's.mp4")]);
        assert_eq!(manifest, "file '/tmp/it'\\''s.mp4'");
    }

    #[test]
    fn test_empty_segments() {
        let manifest = VideoStitcher::create_concat_manifest(&[]);
        assert!(manifest.is_empty());
    }

    #[tokio::test]
    async fn test_missing_part_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let stitcher = VideoStitcher::new(Duration::from_secs(5));
        let err = stitcher
            .join(
                &dir.path().join("a.mp4"),
                &dir.path().join("b.mp4"),
                &dir.path().join("out.mp4"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::MissingOutput(p) if p.ends_with("a.mp4")));
    }
}
