// SYNOID Artifact Store: Durable Run Outputs
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Every run writes under one output root, each file keyed by the run
// timestamp. Intermediate artifacts are persisted as soon as they exist so
// a failed run can be inspected afterwards. The run manifest is the
// "black box": it lists what was written, with digests, and where the run
// stopped.

use crate::agent::animator::{AnimationCode, CodeRole};
use crate::agent::orchestrator::Stage;
use crate::error::StorageError;
use crate::script::VoiceoverScript;
use crate::solution::Solution;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{info, warn};

pub const SUBDIRS: [&str; 6] = ["solutions", "manim_code", "scripts", "videos", "audio", "final"];

/// Run timestamp, `YYYYMMDD_HHMMSS` in local time.
pub fn run_timestamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
    timestamp: String,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>, timestamp: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            timestamp: timestamp.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    /// Create the output tree. Safe to call repeatedly.
    pub fn ensure_layout(&self) -> Result<(), StorageError> {
        for dir in SUBDIRS {
            let path = self.root.join(dir);
            std::fs::create_dir_all(&path).map_err(|source| StorageError::Io { path, source })?;
        }
        Ok(())
    }

    fn file(&self, dir: &str, stem: &str, ext: &str) -> PathBuf {
        self.root
            .join(dir)
            .join(format!("{}_{}.{}", stem, self.timestamp, ext))
    }

    pub fn solution_path(&self) -> PathBuf {
        self.file("solutions", "solution", "json")
    }

    pub fn script_path(&self) -> PathBuf {
        self.file("scripts", "script", "json")
    }

    pub fn audio_path(&self) -> PathBuf {
        self.file("audio", "audio", "mp3")
    }

    /// Last source the well-formedness check turned down for `role`.
    pub fn rejected_code_path(&self, role: CodeRole) -> PathBuf {
        match role.file_tag() {
            Some(tag) => self.file("manim_code", &format!("animation_{}", tag), "rejected.py"),
            None => self.file("manim_code", "animation", "rejected.py"),
        }
    }

    pub fn code_path(&self, role: CodeRole) -> PathBuf {
        match role.file_tag() {
            Some(tag) => self.file("manim_code", &format!("animation_{}", tag), "py"),
            None => self.file("manim_code", "animation", "py"),
        }
    }

    /// Rendered video for `role`.
    pub fn video_path(&self, role: CodeRole) -> PathBuf {
        match role.file_tag() {
            Some(tag) => self.file("videos", &format!("video_{}", tag), "mp4"),
            None => self.file("videos", "video", "mp4"),
        }
    }

    pub fn joined_path(&self) -> PathBuf {
        self.file("videos", "video_joined", "mp4")
    }

    pub fn final_path(&self) -> PathBuf {
        self.file("final", "final", "mp4")
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.file("final", "manifest", "json")
    }

    /// Scratch tree for the renderer's intermediate media.
    pub fn media_dir(&self) -> PathBuf {
        self.root.join("media")
    }

    /// Persist the solution snapshot. Refuses to replace an existing one.
    pub async fn save_solution(&self, solution: &Solution) -> Result<PathBuf, StorageError> {
        let path = self.solution_path();
        create_new(&path, &serde_json::to_vec_pretty(solution)?).await?;
        info!("[ARTIFACTS] 💾 Solution saved: {:?}", path);
        Ok(path)
    }

    pub async fn save_script(&self, script: &VoiceoverScript) -> Result<PathBuf, StorageError> {
        let path = self.script_path();
        write(&path, &serde_json::to_vec_pretty(script)?).await?;
        info!("[ARTIFACTS] 💾 Script saved: {:?}", path);
        Ok(path)
    }

    pub async fn save_code(&self, role: CodeRole, code: &AnimationCode) -> Result<PathBuf, StorageError> {
        let path = self.code_path(role);
        write(&path, code.code.as_bytes()).await?;
        info!("[ARTIFACTS] 💾 {} saved: {:?}", code.class_name, path);
        Ok(path)
    }

    pub async fn save_rejected_code(&self, role: CodeRole, source: &str) -> Result<PathBuf, StorageError> {
        let path = self.rejected_code_path(role);
        write(&path, source.as_bytes()).await?;
        warn!("[ARTIFACTS] Rejected {} kept at {:?}", role.class_name(), path);
        Ok(path)
    }
}

async fn write(path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
    tokio::fs::write(path, bytes)
        .await
        .map_err(|source| StorageError::Io {
            path: path.to_path_buf(),
            source,
        })
}

/// Write `bytes` to a file that must not exist yet.
async fn create_new(path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
    let io = |source: std::io::Error| StorageError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await
        .map_err(|source| {
            if source.kind() == std::io::ErrorKind::AlreadyExists {
                StorageError::Collision(path.to_path_buf())
            } else {
                io(source)
            }
        })?;
    file.write_all(bytes).await.map_err(io)?;
    file.flush().await.map_err(io)
}

/// SHA-256 of a file, lowercase hex.
pub async fn sha256_file(path: &Path) -> std::io::Result<String> {
    let mut file = tokio::fs::File::open(path).await?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; 8192];

    loop {
        let count = file.read(&mut buffer).await?;
        if count == 0 {
            break;
        }
        hasher.update(&buffer[..count]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArtifactRecord {
    pub kind: String,
    pub path: PathBuf,
    pub sha256: String,
    pub bytes: u64,
}

/// Summary of one run, written on success and on failure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunManifest {
    pub run: String,
    pub question: String,
    pub artifacts: Vec<ArtifactRecord>,
    pub stages_completed: Vec<Stage>,
    pub failed_stage: Option<Stage>,
    pub error: Option<String>,
}

impl RunManifest {
    pub fn new(run: &str, question: &str) -> Self {
        Self {
            run: run.to_string(),
            question: question.to_string(),
            artifacts: Vec::new(),
            stages_completed: Vec::new(),
            failed_stage: None,
            error: None,
        }
    }

    /// Record an artifact that is now on disk. Unreadable files are
    /// logged and skipped.
    pub async fn record(&mut self, kind: &str, path: &Path) {
        let digest = match sha256_file(path).await {
            Ok(d) => tokio::fs::metadata(path).await.map(|m| (d, m.len())),
            Err(e) => Err(e),
        };
        match digest {
            Ok((sha256, bytes)) => self.artifacts.push(ArtifactRecord {
                kind: kind.to_string(),
                path: path.to_path_buf(),
                sha256,
                bytes,
            }),
            Err(e) => warn!("[ARTIFACTS] Could not digest {:?}: {}", path, e),
        }
    }

    pub fn complete(&mut self, stage: Stage) {
        if !self.stages_completed.contains(&stage) {
            self.stages_completed.push(stage);
        }
    }

    pub fn fail(&mut self, stage: Stage, error: &dyn std::fmt::Display) {
        self.failed_stage = Some(stage);
        self.error = Some(error.to_string());
    }

    /// Write the manifest. A manifest already on disk for this timestamp
    /// belongs to another run and is left alone.
    pub async fn save(&self, path: &Path) -> Result<(), StorageError> {
        create_new(path, &serde_json::to_vec_pretty(self)?).await?;
        info!("[ARTIFACTS] 💾 Manifest saved: {:?}", path);
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, StorageError> {
        let json = std::fs::read_to_string(path).map_err(|source| StorageError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&json)?)
    }
}
