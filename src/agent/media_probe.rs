// SYNOID Media Probe
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Bounded subprocess execution plus ffprobe queries. Every external tool
// runs under a timeout and is killed if the future is dropped.

use crate::error::MediaError;
use std::path::{Path, PathBuf};
use std::process::Output;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Prefix relative paths that begin with '-' so tools never read them as flags.
pub fn safe_arg_path(path: &Path) -> PathBuf {
    if path.to_string_lossy().starts_with('-') {
        Path::new(".").join(path)
    } else {
        path.to_path_buf()
    }
}

/// Run `cmd` to completion within `timeout`, failing on a non-zero exit.
pub async fn run_tool(
    mut cmd: Command,
    tool: &'static str,
    timeout: Duration,
) -> Result<Output, MediaError> {
    debug!("[MEDIA] Running {} (timeout {:?})", tool, timeout);
    let output = tokio::time::timeout(timeout, cmd.kill_on_drop(true).output())
        .await
        .map_err(|_| MediaError::TimedOut { tool, timeout })?
        .map_err(|source| MediaError::Spawn { tool, source })?;

    if !output.status.success() {
        return Err(MediaError::Failed {
            tool,
            status: output.status.to_string(),
            stderr: tail(&String::from_utf8_lossy(&output.stderr), 2000),
        });
    }
    Ok(output)
}

/// Last `max` bytes of `text`, cut on a char boundary.
fn tail(text: &str, max: usize) -> String {
    let text = text.trim();
    if text.len() <= max {
        return text.to_string();
    }
    let mut start = text.len() - max;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    text[start..].to_string()
}

/// Container duration in seconds.
pub async fn media_duration(path: &Path) -> Result<f64, MediaError> {
    let mut cmd = Command::new("ffprobe");
    cmd.args([
        "-v",
        "error",
        "-show_entries",
        "format=duration",
        "-of",
        "default=noprint_wrappers=1:nokey=1",
    ])
    .arg(safe_arg_path(path));

    let output = run_tool(cmd, "ffprobe", PROBE_TIMEOUT).await?;
    parse_duration(&String::from_utf8_lossy(&output.stdout))
}

pub fn parse_duration(stdout: &str) -> Result<f64, MediaError> {
    let raw = stdout.trim();
    raw.parse::<f64>()
        .ok()
        .filter(|d| d.is_finite())
        .ok_or_else(|| MediaError::Probe(format!("unparseable duration {:?}", raw)))
}

/// Codec types of every stream in the file ("video", "audio", ...).
pub async fn stream_types(path: &Path) -> Result<Vec<String>, MediaError> {
    let mut cmd = Command::new("ffprobe");
    cmd.args([
        "-v",
        "error",
        "-show_entries",
        "stream=codec_type",
        "-of",
        "default=noprint_wrappers=1:nokey=1",
    ])
    .arg(safe_arg_path(path));

    let output = run_tool(cmd, "ffprobe", PROBE_TIMEOUT).await?;
    Ok(String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("12.480000\n").unwrap(), 12.48);
        assert!(matches!(parse_duration("N/A"), Err(MediaError::Probe(_))));
        assert!(parse_duration("").is_err());
    }

    #[test]
    fn test_safe_arg_path() {
        assert_eq!(safe_arg_path(Path::new("-evil.mp4")), PathBuf::from("./-evil.mp4"));
        assert_eq!(safe_arg_path(Path::new("out/a.mp4")), PathBuf::from("out/a.mp4"));
    }

    #[test]
    fn test_tail_keeps_end() {
        assert_eq!(tail("abcdef", 3), "def");
        assert_eq!(tail(" ok ", 10), "ok");
    }

    #[tokio::test]
    async fn test_missing_tool_is_spawn_error() {
        let cmd = Command::new("__synoid_no_such_tool__");
        let err = run_tool(cmd, "ghost", Duration::from_secs(5)).await.unwrap_err();
        assert!(matches!(err, MediaError::Spawn { tool: "ghost", .. }));
    }
}
