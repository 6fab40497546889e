// SYNOID Tutor Pipeline Orchestrator
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// ANALYZE → SCRIPT → SPEECH → CODE_GEN → RENDER → JOIN → SYNC → VALIDATE.
//
// Each stage runs only after the previous one succeeded. Retries stay
// inside a stage (code generation, strict script timing) and never roll
// back earlier stages. Every intermediate artifact is written to disk
// before the next stage starts, and the run manifest is written whether
// the run succeeds or not.

use crate::agent::animator::{generate_with_retry, CodeBrief, CodeGenerator, CodeRole, LlmAnimator};
use crate::agent::artifacts::{run_timestamp, ArtifactStore, RunManifest};
use crate::agent::llm_bridge::{LlmBridge, TextGenerator};
use crate::agent::muxer::{AvSynchronizer, FfmpegSynchronizer};
use crate::agent::renderer::{ManimRenderer, Renderer};
use crate::agent::script_writer::{LlmScriptWriter, ScriptGenerator};
use crate::agent::solution_writer::{LlmSolutionWriter, SolutionGenerator};
use crate::agent::tts::{OpenAiSpeech, SpeechSynthesizer};
use crate::agent::validation_gate::{OutputValidator, PythonSyntaxCheck, SourceCheck, ValidationGate};
use crate::agent::video_stitcher::{VideoJoiner, VideoStitcher};
use crate::config::{PipelineConfig, PipelineMode, Settings, TimingPolicy};
use crate::error::{CodeGenerationError, MediaError, PipelineError, StageFailure, StorageError};
use crate::script::validator::{audit_script, check_timing};
use crate::script::VoiceoverScript;
use crate::solution::TimedSolution;
use crate::timeline::partition::{split_timeline, Part};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    Analyze,
    Script,
    Speech,
    CodeGen,
    Render,
    Join,
    Sync,
    Validate,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Analyze => "ANALYZE",
            Stage::Script => "SCRIPT",
            Stage::Speech => "SPEECH",
            Stage::CodeGen => "CODE_GEN",
            Stage::Render => "RENDER",
            Stage::Join => "JOIN",
            Stage::Sync => "SYNC",
            Stage::Validate => "VALIDATE",
        }
    }

    /// Stages a run goes through in `mode`. Single mode has nothing to join.
    pub fn sequence(mode: PipelineMode) -> &'static [Stage] {
        const SPLIT: [Stage; 8] = [
            Stage::Analyze,
            Stage::Script,
            Stage::Speech,
            Stage::CodeGen,
            Stage::Render,
            Stage::Join,
            Stage::Sync,
            Stage::Validate,
        ];
        const SINGLE: [Stage; 7] = [
            Stage::Analyze,
            Stage::Script,
            Stage::Speech,
            Stage::CodeGen,
            Stage::Render,
            Stage::Sync,
            Stage::Validate,
        ];
        match mode {
            PipelineMode::Split => &SPLIT,
            PipelineMode::Single => &SINGLE,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Pending,
    Running(Stage),
    Done,
    Failed(Stage),
}

impl PipelineState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Failed(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoMetadata {
    pub topic: String,
    pub subtopic: Option<String>,
    pub difficulty: String,
    pub steps: usize,
    pub concepts: Vec<String>,
}

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoOutput {
    pub question: String,
    pub video_path: PathBuf,
    pub duration: f64,
    pub generated_at: String,
    pub metadata: VideoMetadata,
}

/// Every external collaborator the pipeline talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub solutions: Arc<dyn SolutionGenerator>,
    pub scripts: Arc<dyn ScriptGenerator>,
    pub speech: Arc<dyn SpeechSynthesizer>,
    pub animator: Arc<dyn CodeGenerator>,
    pub source_check: Arc<dyn SourceCheck>,
    pub renderer: Arc<dyn Renderer>,
    pub joiner: Arc<dyn VideoJoiner>,
    pub synchronizer: Arc<dyn AvSynchronizer>,
    pub output_check: Arc<dyn OutputValidator>,
}

impl Collaborators {
    /// Production wiring: one shared model client, ffmpeg/manim/python3 tools.
    pub fn live(settings: &Settings) -> Result<Self, PipelineError> {
        let llm: Arc<dyn TextGenerator> = Arc::new(LlmBridge::new(&settings.api)?);
        let media_timeout = settings.pipeline.mux_timeout;
        Ok(Self {
            solutions: Arc::new(LlmSolutionWriter::new(llm.clone())),
            scripts: Arc::new(LlmScriptWriter::new(llm.clone())),
            speech: Arc::new(OpenAiSpeech::new(&settings.api)?),
            animator: Arc::new(LlmAnimator::new(llm)),
            source_check: Arc::new(PythonSyntaxCheck::default()),
            renderer: Arc::new(ManimRenderer::new(settings.pipeline.output_dir.join("media"))),
            joiner: Arc::new(VideoStitcher::new(media_timeout)),
            synchronizer: Arc::new(FfmpegSynchronizer::new(media_timeout)),
            output_check: Arc::new(ValidationGate),
        })
    }
}

pub type ProgressCallback = Arc<dyn Fn(&str) + Send + Sync>;

fn at<E: Into<PipelineError>>(stage: Stage) -> impl FnOnce(E) -> StageFailure {
    move |e| StageFailure::new(stage, e)
}

/// The file must exist and hold at least one byte.
fn ensure_non_empty(path: &Path) -> Result<(), MediaError> {
    match std::fs::metadata(path) {
        Ok(meta) if meta.len() > 0 => Ok(()),
        _ => Err(MediaError::MissingOutput(path.to_path_buf())),
    }
}

pub struct Pipeline {
    config: PipelineConfig,
    parts: Collaborators,
    progress: Option<ProgressCallback>,
    state: PipelineState,
    transitions: Vec<PipelineState>,
}

impl Pipeline {
    pub fn new(config: PipelineConfig, parts: Collaborators) -> Self {
        Self {
            config,
            parts,
            progress: None,
            state: PipelineState::Pending,
            transitions: vec![PipelineState::Pending],
        }
    }

    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Every state the last run passed through, starting at `Pending`.
    pub fn transitions(&self) -> &[PipelineState] {
        &self.transitions
    }

    fn transition(&mut self, next: PipelineState) {
        self.state = next;
        self.transitions.push(next);
    }

    fn report_progress(&self, msg: &str) {
        info!("[PIPELINE] {}", msg);
        if let Some(ref callback) = self.progress {
            callback(msg);
        }
    }

    fn enter(&mut self, stage: Stage) {
        self.transition(PipelineState::Running(stage));
        let sequence = Stage::sequence(self.config.mode);
        let position = sequence.iter().position(|s| *s == stage).map_or(0, |i| i + 1);
        self.report_progress(&format!("Stage {}/{}: {}", position, sequence.len(), stage));
    }

    /// Run the whole pipeline for one question.
    pub async fn run(&mut self, question: &str) -> Result<VideoOutput, StageFailure> {
        let timestamp = run_timestamp();
        self.run_at(question, &timestamp).await
    }

    /// Run with an explicit artifact timestamp.
    pub async fn run_at(&mut self, question: &str, timestamp: &str) -> Result<VideoOutput, StageFailure> {
        self.state = PipelineState::Pending;
        self.transitions = vec![PipelineState::Pending];

        let store = ArtifactStore::new(&self.config.output_dir, timestamp);
        let mut manifest = RunManifest::new(timestamp, question);
        self.report_progress(&format!("Run {} started", timestamp));

        let result = self.execute(&store, &mut manifest, question).await;

        match &result {
            Ok(output) => {
                self.transition(PipelineState::Done);
                self.report_progress(&format!(
                    "✅ Video ready: {:?} ({:.1}s)",
                    output.video_path, output.duration
                ));
            }
            Err(failure) => {
                error!("[PIPELINE] ❌ {}", failure);
                manifest.fail(failure.stage, &failure.source);
                self.transition(PipelineState::Failed(failure.stage));
            }
        }

        match manifest.save(&store.manifest_path()).await {
            Ok(()) => {}
            Err(StorageError::Collision(path)) => {
                warn!("[PIPELINE] Manifest {:?} belongs to another run, not replaced", path)
            }
            Err(e) => warn!("[PIPELINE] Could not write run manifest: {}", e),
        }
        result
    }

    async fn execute(
        &mut self,
        store: &ArtifactStore,
        manifest: &mut RunManifest,
        question: &str,
    ) -> Result<VideoOutput, StageFailure> {
        // ANALYZE
        self.enter(Stage::Analyze);
        store.ensure_layout().map_err(at(Stage::Analyze))?;
        let draft = self
            .parts
            .solutions
            .generate(question)
            .await
            .map_err(at(Stage::Analyze))?;
        let timed = draft.materialize().map_err(at(Stage::Analyze))?;
        log_timeline(&timed);
        let path = store
            .save_solution(&timed.to_snapshot())
            .await
            .map_err(at(Stage::Analyze))?;
        manifest.record("solution", &path).await;
        manifest.complete(Stage::Analyze);

        // SCRIPT
        self.enter(Stage::Script);
        let script = self.generate_script(&timed, store, manifest).await?;
        let audit = audit_script(&script, timed.timeline());
        if !audit.is_clean() {
            warn!(
                "[PIPELINE] Script audit: missing {:?}, unknown {:?}, drifted {:?}, over budget {:?}",
                audit.missing_scenes, audit.unknown_scenes, audit.drifted, audit.over_budget
            );
        }
        manifest.complete(Stage::Script);

        // SPEECH
        self.enter(Stage::Speech);
        let audio = store.audio_path();
        self.parts
            .speech
            .synthesize(&script, &audio)
            .await
            .map_err(at(Stage::Speech))?;
        ensure_non_empty(&audio).map_err(at(Stage::Speech))?;
        manifest.record("audio", &audio).await;
        manifest.complete(Stage::Speech);

        // CODE_GEN
        self.enter(Stage::CodeGen);
        let roles: &[CodeRole] = match self.config.mode {
            PipelineMode::Split => &[CodeRole::Intro, CodeRole::Solution],
            PipelineMode::Single => &[CodeRole::Single],
        };
        // Both briefs are cut from the same pinned timeline and script.
        let briefs: Vec<CodeBrief> = roles
            .iter()
            .map(|role| CodeBrief::new(*role, &timed, &script))
            .collect();

        let sources: Vec<PathBuf> = match briefs.as_slice() {
            [intro, solution] if self.config.parallel_branches => {
                let (a, b) = tokio::try_join!(
                    self.generate_code(intro, store),
                    self.generate_code(solution, store)
                )?;
                vec![a, b]
            }
            _ => {
                let mut paths = Vec::with_capacity(briefs.len());
                for brief in &briefs {
                    paths.push(self.generate_code(brief, store).await?);
                }
                paths
            }
        };
        for path in &sources {
            manifest.record("animation_code", path).await;
        }
        manifest.complete(Stage::CodeGen);

        // RENDER
        self.enter(Stage::Render);
        let jobs: Vec<(CodeRole, &Path)> = roles
            .iter()
            .copied()
            .zip(sources.iter().map(PathBuf::as_path))
            .collect();
        let videos: Vec<PathBuf> = match jobs.as_slice() {
            [(intro, intro_src), (solution, solution_src)] if self.config.parallel_branches => {
                let (a, b) = tokio::try_join!(
                    self.render(*intro, intro_src, store),
                    self.render(*solution, solution_src, store)
                )?;
                vec![a, b]
            }
            _ => {
                let mut paths = Vec::with_capacity(jobs.len());
                for (role, source) in &jobs {
                    paths.push(self.render(*role, source, store).await?);
                }
                paths
            }
        };
        for video in &videos {
            manifest.record("video", video).await;
        }
        manifest.complete(Stage::Render);

        // JOIN
        let video = match (self.config.mode, videos.as_slice()) {
            (PipelineMode::Split, [intro, solution]) => {
                self.enter(Stage::Join);
                let joined = store.joined_path();
                let duration = self
                    .parts
                    .joiner
                    .join(intro, solution, &joined)
                    .await
                    .map_err(at(Stage::Join))?;
                ensure_non_empty(&joined).map_err(at(Stage::Join))?;
                info!("[PIPELINE] Joined video: {:.1}s", duration);
                manifest.record("joined_video", &joined).await;
                manifest.complete(Stage::Join);
                joined
            }
            (PipelineMode::Single, [single]) => single.clone(),
            _ => {
                return Err(StageFailure::new(
                    Stage::Render,
                    MediaError::MissingOutput(store.video_path(CodeRole::Single)),
                ))
            }
        };

        // SYNC
        self.enter(Stage::Sync);
        let final_path = store.final_path();
        let report = self
            .parts
            .synchronizer
            .sync(&video, &audio, &final_path)
            .await
            .map_err(at(Stage::Sync))?;
        info!(
            "[PIPELINE] Synced {:?}: video {:.1}s, audio {:.1}s ({:?})",
            report.plan, report.video_duration, report.audio_duration, report.level
        );
        ensure_non_empty(&final_path).map_err(at(Stage::Sync))?;
        manifest.record("final_video", &final_path).await;
        manifest.complete(Stage::Sync);

        // VALIDATE
        self.enter(Stage::Validate);
        let report = self
            .parts
            .output_check
            .inspect(&final_path)
            .await
            .map_err(at(Stage::Validate))?;
        report
            .verdict()
            .map_err(|reason| StageFailure::new(Stage::Validate, PipelineError::OutputValidation(reason)))?;
        manifest.complete(Stage::Validate);

        let analysis = timed.analysis();
        Ok(VideoOutput {
            question: question.to_string(),
            video_path: final_path,
            duration: report.duration,
            generated_at: store.timestamp().to_string(),
            metadata: VideoMetadata {
                topic: analysis.topic.clone(),
                subtopic: analysis.subtopic.clone(),
                difficulty: analysis.difficulty.clone(),
                steps: timed.steps().len(),
                concepts: analysis.concepts.clone(),
            },
        })
    }

    /// Generate the script, applying the configured timing policy.
    ///
    /// Every attempt is written to the script snapshot before its timing is
    /// checked; a regeneration replaces the previous attempt.
    async fn generate_script(
        &self,
        timed: &TimedSolution,
        store: &ArtifactStore,
        manifest: &mut RunManifest,
    ) -> Result<VoiceoverScript, StageFailure> {
        let expected = timed.total_duration();
        let mut attempt = 1;
        loop {
            let script = self
                .parts
                .scripts
                .generate(timed)
                .await
                .map_err(at(Stage::Script))?;
            let path = store.save_script(&script).await.map_err(at(Stage::Script))?;

            let issue = match check_timing(&script, expected) {
                Ok(()) => {
                    info!("[PIPELINE] Script timing validated ({:.1}s)", script.total_duration);
                    manifest.record("script", &path).await;
                    return Ok(script);
                }
                Err(issue) => issue,
            };

            match self.config.timing_policy {
                TimingPolicy::Permissive => {
                    warn!(
                        "[PIPELINE] ⚠️ Script timing validation failed: {} (script {:.1}s, expected {:.1}s). Continuing",
                        issue, script.total_duration, expected
                    );
                    manifest.record("script", &path).await;
                    return Ok(script);
                }
                TimingPolicy::Strict { max_attempts } => {
                    if attempt >= max_attempts.max(1) {
                        manifest.record("rejected_script", &path).await;
                        return Err(StageFailure::new(
                            Stage::Script,
                            PipelineError::Timing {
                                issue,
                                attempts: attempt,
                            },
                        ));
                    }
                    warn!(
                        "[PIPELINE] Script timing rejected ({}), regenerating (attempt {}/{})",
                        issue,
                        attempt + 1,
                        max_attempts
                    );
                    attempt += 1;
                }
            }
        }
    }

    /// Generate, check and persist one animation source.
    async fn generate_code(&self, brief: &CodeBrief, store: &ArtifactStore) -> Result<PathBuf, StageFailure> {
        let class_name = brief.role.class_name();
        if brief.scenes.is_empty() {
            return Err(StageFailure::new(
                Stage::CodeGen,
                CodeGenerationError::EmptyBrief(class_name),
            ));
        }
        info!(
            "[PIPELINE] {}: {} scenes, {} segments, {:.1}s",
            class_name,
            brief.scenes.len(),
            brief.segments.len(),
            brief.duration
        );

        let code = match generate_with_retry(
            self.parts.animator.as_ref(),
            self.parts.source_check.as_ref(),
            brief,
            self.config.code_attempts,
        )
        .await
        {
            Ok(code) => code,
            Err(e) => {
                if let CodeGenerationError::Exhausted { last_source, .. } = &e {
                    if let Err(keep) = store.save_rejected_code(brief.role, last_source).await {
                        warn!("[PIPELINE] Could not keep rejected {}: {}", class_name, keep);
                    }
                }
                return Err(StageFailure::new(Stage::CodeGen, e));
            }
        };

        store
            .save_code(brief.role, &code)
            .await
            .map_err(at(Stage::CodeGen))
    }

    async fn render(&self, role: CodeRole, source: &Path, store: &ArtifactStore) -> Result<PathBuf, StageFailure> {
        let output = store.video_path(role);
        let rendered = self
            .parts
            .renderer
            .render(source, role.class_name(), &output, self.config.render_timeout)
            .await
            .map_err(at(Stage::Render))?;
        ensure_non_empty(&rendered).map_err(at(Stage::Render))?;
        Ok(rendered)
    }
}

fn log_timeline(timed: &TimedSolution) {
    info!(
        "[TIMELINE] {} scenes over {:.1}s (steps sum to {:.1}s)",
        timed.timeline().len(),
        timed.total_duration(),
        timed.estimated_duration()
    );
    for scene in timed.timeline().scenes() {
        info!(
            "[TIMELINE]   {:<10} {:<13} {:>6.2}s - {:>6.2}s",
            scene.scene_id,
            scene.scene_type.as_str(),
            scene.start_time,
            scene.end_time
        );
    }
    let split = split_timeline(timed.timeline());
    info!(
        "[TIMELINE] Introduction {:.1}s, solution {:.1}s",
        split.part(Part::Introduction).duration,
        split.part(Part::Solution).duration
    );
}
