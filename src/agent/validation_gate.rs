// SYNOID Validation Gate
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Two gates: generated Python must parse before it is rendered, and the
// final video must carry both a video and an audio stream with a positive
// duration before the run is reported as done.

use crate::agent::media_probe::{media_duration, stream_types};
use crate::error::MediaError;
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{error, info};

/// Well-formedness check for generated animation source.
#[async_trait]
pub trait SourceCheck: Send + Sync {
    /// `Err` carries a human-readable rejection reason.
    async fn check(&self, source: &str) -> Result<(), String>;
}

/// Parses the source with the system interpreter's `ast` module.
///
/// The code never touches disk and is never executed.
pub struct PythonSyntaxCheck {
    pub interpreter: String,
    pub timeout: Duration,
}

impl Default for PythonSyntaxCheck {
    fn default() -> Self {
        Self {
            interpreter: "python3".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

#[async_trait]
impl SourceCheck for PythonSyntaxCheck {
    async fn check(&self, source: &str) -> Result<(), String> {
        let mut child = Command::new(&self.interpreter)
            .args(["-c", "import ast,sys; ast.parse(sys.stdin.read())"])
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| format!("failed to spawn {}: {}", self.interpreter, e))?;

        let stdin = child.stdin.take();
        let parse = async move {
            if let Some(mut stdin) = stdin {
                stdin
                    .write_all(source.as_bytes())
                    .await
                    .map_err(|e| format!("failed to pipe source: {}", e))?;
                // Dropping stdin closes the pipe so the parser sees EOF.
            }
            child
                .wait_with_output()
                .await
                .map_err(|e| format!("syntax check failed: {}", e))
        };

        let output = tokio::time::timeout(self.timeout, parse)
            .await
            .map_err(|_| "syntax check timed out".to_string())??;

        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            // The final traceback line names the SyntaxError.
            Err(stderr
                .lines()
                .rev()
                .find(|l| !l.trim().is_empty())
                .unwrap_or("SyntaxError")
                .trim()
                .to_string())
        }
    }
}

/// Result of probing a finished video.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputReport {
    pub has_video: bool,
    pub has_audio: bool,
    pub duration: f64,
}

impl OutputReport {
    pub fn from_probe(stream_types: &[String], duration: f64) -> Self {
        Self {
            has_video: stream_types.iter().any(|t| t == "video"),
            has_audio: stream_types.iter().any(|t| t == "audio"),
            duration,
        }
    }

    /// `Err` names everything that is wrong with the file.
    pub fn verdict(&self) -> Result<(), String> {
        let mut problems = Vec::new();
        if !self.has_video {
            problems.push("no video stream".to_string());
        }
        if !self.has_audio {
            problems.push("no audio stream".to_string());
        }
        if self.duration <= 0.0 {
            problems.push(format!("non-positive duration {:.2}s", self.duration));
        }
        if problems.is_empty() {
            Ok(())
        } else {
            Err(problems.join(", "))
        }
    }
}

/// Final gate before a run is reported as successful.
#[async_trait]
pub trait OutputValidator: Send + Sync {
    async fn inspect(&self, path: &Path) -> Result<OutputReport, MediaError>;
}

/// ffprobe-backed output validator.
pub struct ValidationGate;

#[async_trait]
impl OutputValidator for ValidationGate {
    async fn inspect(&self, path: &Path) -> Result<OutputReport, MediaError> {
        if !path.exists() {
            return Err(MediaError::MissingOutput(path.to_path_buf()));
        }
        let types = stream_types(path).await?;
        let duration = media_duration(path).await?;
        let report = OutputReport::from_probe(&types, duration);

        match report.verdict() {
            Ok(()) => info!(
                "[VALIDATION] ✅ Output verified: {:?} ({:.2}s)",
                path.file_name().unwrap_or_default(),
                duration
            ),
            Err(ref reason) => error!("[VALIDATION] ❌ {:?}: {}", path, reason),
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn types(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_report_requires_both_streams() {
        let ok = OutputReport::from_probe(&types(&["video", "audio"]), 99.5);
        assert!(ok.verdict().is_ok());

        let silent = OutputReport::from_probe(&types(&["video"]), 99.5);
        assert_eq!(silent.verdict().unwrap_err(), "no audio stream");

        let empty = OutputReport::from_probe(&[], 0.0);
        let reason = empty.verdict().unwrap_err();
        assert!(reason.contains("no video stream"));
        assert!(reason.contains("non-positive duration"));
    }

    #[tokio::test]
    async fn test_verify_nonexistent_file() {
        let result = ValidationGate
            .inspect(&PathBuf::from("__nonexistent_file_xyz.mp4"))
            .await;
        assert!(matches!(result, Err(MediaError::MissingOutput(_))));
    }

    #[tokio::test]
    async fn test_missing_interpreter_rejects() {
        let check = PythonSyntaxCheck {
            interpreter: "__synoid_no_python__".into(),
            timeout: Duration::from_secs(5),
        };
        let reason = check.check("x = 1").await.unwrap_err();
        assert!(reason.contains("failed to spawn"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_stalled_interpreter_times_out_while_piping() {
        use std::os::unix::fs::PermissionsExt;

        // An interpreter that never reads its stdin.
        let dir = tempfile::tempdir().unwrap();
        let stalled = dir.path().join("stalled");
        std::fs::write(&stalled, "#!/bin/sh\nsleep 30\n").unwrap();
        std::fs::set_permissions(&stalled, std::fs::Permissions::from_mode(0o755)).unwrap();

        let check = PythonSyntaxCheck {
            interpreter: stalled.to_string_lossy().into_owned(),
            timeout: Duration::from_millis(300),
        };
        // Far larger than a pipe buffer, so the write itself blocks.
        let source = "x = 1\n".repeat(200_000);
        let started = std::time::Instant::now();
        let reason = check.check(&source).await.unwrap_err();
        assert_eq!(reason, "syntax check timed out");
        assert!(started.elapsed() < Duration::from_secs(10));
    }
}
