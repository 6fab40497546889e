// SYNOID Health Check
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Preflight for the `doctor` command: are the external tools on PATH and
// is the credential set.

use crate::agent::media_probe::run_tool;
use crate::error::MediaError;
use std::time::Duration;
use tokio::process::Command;
use tracing::{info, warn};

/// Health status of one dependency
#[derive(Debug, Clone, PartialEq)]
pub enum SubsystemStatus {
    Healthy(String),
    Down(String),
}

impl SubsystemStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, SubsystemStatus::Healthy(_))
    }
}

/// (binary, version flag)
pub const REQUIRED_TOOLS: [(&str, &str); 4] = [
    ("ffmpeg", "-version"),
    ("ffprobe", "-version"),
    ("manim", "--version"),
    ("python3", "--version"),
];

#[derive(Debug, Clone)]
pub struct DependencyReport {
    pub tools: Vec<(&'static str, SubsystemStatus)>,
    pub credential_set: bool,
}

impl DependencyReport {
    pub fn missing(&self) -> Vec<&'static str> {
        self.tools
            .iter()
            .filter(|(_, s)| !s.is_healthy())
            .map(|(name, _)| *name)
            .collect()
    }

    pub fn is_ready(&self) -> bool {
        self.credential_set && self.missing().is_empty()
    }

    pub fn status_report(&self) -> String {
        let mut lines: Vec<String> = self
            .tools
            .iter()
            .map(|(name, status)| match status {
                SubsystemStatus::Healthy(v) => format!("  ✅ {:<8} {}", name, v),
                SubsystemStatus::Down(why) => format!("  ❌ {:<8} {}", name, why),
            })
            .collect();
        lines.push(if self.credential_set {
            "  ✅ credential set".to_string()
        } else {
            "  ❌ credential missing".to_string()
        });
        lines.join("\n")
    }
}

/// First line of `<tool> <flag>` output, or why it could not run.
pub async fn probe_tool(tool: &'static str, flag: &str) -> SubsystemStatus {
    let mut cmd = Command::new(tool);
    cmd.arg(flag);
    match run_tool(cmd, tool, Duration::from_secs(30)).await {
        Ok(out) => {
            let text = if out.stdout.is_empty() { out.stderr } else { out.stdout };
            let version = String::from_utf8_lossy(&text)
                .lines()
                .next()
                .unwrap_or("")
                .trim()
                .to_string();
            SubsystemStatus::Healthy(version)
        }
        Err(MediaError::Spawn { .. }) => SubsystemStatus::Down("not found on PATH".to_string()),
        Err(e) => SubsystemStatus::Down(e.to_string()),
    }
}

pub async fn check_dependencies(credential_set: bool) -> DependencyReport {
    let mut tools = Vec::with_capacity(REQUIRED_TOOLS.len());
    for (tool, flag) in REQUIRED_TOOLS {
        let status = probe_tool(tool, flag).await;
        match &status {
            SubsystemStatus::Healthy(v) => info!("[HEALTH] {} OK: {}", tool, v),
            SubsystemStatus::Down(why) => warn!("[HEALTH] {} unavailable: {}", tool, why),
        }
        tools.push((tool, status));
    }
    DependencyReport {
        tools,
        credential_set,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_tool_is_down() {
        let status = probe_tool("__synoid_absent_binary__", "--version").await;
        assert_eq!(status, SubsystemStatus::Down("not found on PATH".into()));
    }

    #[test]
    fn test_report_lists_missing() {
        let report = DependencyReport {
            tools: vec![
                ("ffmpeg", SubsystemStatus::Healthy("ffmpeg version 6.1".into())),
                ("manim", SubsystemStatus::Down("not found on PATH".into())),
            ],
            credential_set: true,
        };
        assert_eq!(report.missing(), vec!["manim"]);
        assert!(!report.is_ready());
        assert!(report.status_report().contains("❌ manim"));
    }
}
