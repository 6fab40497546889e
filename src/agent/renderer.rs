// SYNOID Manim Renderer
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Renders one generated scene class to an mp4. Manim nests its output as
// media/videos/<file>/<quality>/<name>.mp4, so the file is found by name
// under the media directory and moved to the requested path.

use crate::agent::media_probe::{run_tool, safe_arg_path};
use crate::error::MediaError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;
use tracing::{info, warn};
use walkdir::WalkDir;

#[async_trait]
pub trait Renderer: Send + Sync {
    /// Render `class_name` from `source` into `output`.
    async fn render(
        &self,
        source: &Path,
        class_name: &str,
        output: &Path,
        timeout: Duration,
    ) -> Result<PathBuf, MediaError>;
}

pub struct ManimRenderer {
    /// Where Manim writes its intermediate media tree.
    pub media_dir: PathBuf,
}

impl ManimRenderer {
    pub fn new(media_dir: impl Into<PathBuf>) -> Self {
        Self {
            media_dir: media_dir.into(),
        }
    }
}

#[async_trait]
impl Renderer for ManimRenderer {
    async fn render(
        &self,
        source: &Path,
        class_name: &str,
        output: &Path,
        timeout: Duration,
    ) -> Result<PathBuf, MediaError> {
        let file_name = output
            .file_name()
            .ok_or_else(|| MediaError::MissingOutput(output.to_path_buf()))?
            .to_string_lossy()
            .to_string();

        if let Some(parent) = output.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        info!("[RENDER] Rendering {} (this may take a few minutes)", class_name);

        let mut cmd = Command::new("manim");
        cmd.args(["-qh", "--disable_caching", "--media_dir"])
            .arg(safe_arg_path(&self.media_dir))
            .arg("-o")
            .arg(&file_name)
            .arg(safe_arg_path(source))
            .arg(class_name);
        run_tool(cmd, "manim", timeout).await?;

        let rendered = find_rendered(&self.media_dir, &file_name).ok_or_else(|| {
            warn!("[RENDER] {} not found under {:?}", file_name, self.media_dir);
            MediaError::MissingOutput(self.media_dir.join(&file_name))
        })?;

        move_file(&rendered, output).await?;
        info!("[RENDER] ✅ {} -> {:?}", class_name, output);
        Ok(output.to_path_buf())
    }
}

/// Newest mp4 named `file_name` anywhere under `media_dir`.
///
/// Manim also writes partial movie files; those live in a
/// `partial_movie_files` directory and never carry the final name.
pub fn find_rendered(media_dir: &Path, file_name: &str) -> Option<PathBuf> {
    WalkDir::new(media_dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.file_name().to_string_lossy() == file_name)
        .filter(|e| {
            !e.path()
                .components()
                .any(|c| c.as_os_str() == "partial_movie_files")
        })
        .max_by_key(|e| e.metadata().ok().and_then(|m| m.modified().ok()))
        .map(|e| e.into_path())
}

/// Rename, falling back to copy + remove across filesystems.
async fn move_file(from: &Path, to: &Path) -> Result<(), MediaError> {
    if tokio::fs::rename(from, to).await.is_ok() {
        return Ok(());
    }
    tokio::fs::copy(from, to).await?;
    tokio::fs::remove_file(from).await?;
    Ok(())
}
