// SYNOID Tutor Main Entry Point
// Copyright (c) 2026 Xing_The_Creator | SYNOID

use synoid_tutor::agent::health::check_dependencies;
use synoid_tutor::agent::llm_bridge::LlmBridge;
use synoid_tutor::agent::orchestrator::{Collaborators, Pipeline};
use synoid_tutor::agent::solution_writer::{LlmSolutionWriter, QuestionAnalyzer};
use synoid_tutor::config::{PipelineMode, Settings, TimingPolicy, API_KEY_VAR};
use synoid_tutor::error::ConfigError;
use synoid_tutor::solution::TimedSolution;
use synoid_tutor::timeline::partition::{split_timeline, Part};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

const EXAMPLE_QUESTION: &str = "A solid sphere of mass 2 kg and radius 0.5 m rolls without slipping down \
an inclined plane that makes an angle of 30° with the horizontal. The sphere starts from rest at a height \
of 3 m above the ground. Find the linear velocity of the sphere when it reaches the bottom of the incline.";

/// Strict timing regenerates the script at most this many times.
const STRICT_SCRIPT_ATTEMPTS: u32 = 3;

#[derive(Parser)]
#[command(name = "synoid-tutor")]
#[command(about = "SYNOID Tutor: narrated, animated physics explainers", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a full explainer video
    Generate {
        /// Question text
        #[arg(short, long, conflicts_with = "file")]
        question: Option<String>,

        /// Read the question from a file
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Output root (overrides SYNOID_OUTPUT_DIR)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Legacy mode: one animation for the whole timeline
        #[arg(long)]
        single_pass: bool,

        /// Regenerate the script until its timing validates
        #[arg(long)]
        strict_timing: bool,

        /// Generate and render introduction and solution concurrently
        #[arg(long)]
        parallel: bool,
    },

    /// Analyze a question without generating anything
    Analyze {
        #[arg(short, long)]
        question: String,
    },

    /// Print the scene timeline of a saved solution snapshot (offline)
    Timeline {
        #[arg(short, long)]
        solution: PathBuf,
    },

    /// Check external tools and credentials
    Doctor,
}

#[tokio::main]
async fn main() {
    dotenv().ok();

    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    // Global panic handler: log panics instead of crashing silently
    std::panic::set_hook(Box::new(|panic_info| {
        let location = panic_info
            .location()
            .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
            .unwrap_or_else(|| "unknown".to_string());
        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };
        error!("🚨 [SYNOID PANIC] at {}: {}", location, message);
    }));

    info!("--- SYNOID TUTOR v{} ---", env!("CARGO_PKG_VERSION"));

    let args = Cli::parse();
    let code = match run(args.command).await {
        Ok(()) => 0,
        Err(e) => {
            if let Some(ConfigError::MissingCredential(var)) = e.downcast_ref::<ConfigError>() {
                error!("❌ {} is required. Add it to .env or export it.", var);
                2
            } else {
                error!("❌ {}", e);
                for cause in e.chain().skip(1) {
                    error!("   caused by: {}", cause);
                }
                1
            }
        }
    };
    std::process::exit(code);
}

async fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Generate {
            question,
            file,
            output_dir,
            single_pass,
            strict_timing,
            parallel,
        } => {
            let mut settings = Settings::from_env()?;
            if let Some(dir) = output_dir {
                settings.pipeline.output_dir = dir;
            }
            if single_pass {
                settings.pipeline.mode = PipelineMode::Single;
            }
            if strict_timing {
                settings.pipeline.timing_policy = TimingPolicy::Strict {
                    max_attempts: STRICT_SCRIPT_ATTEMPTS,
                };
            }
            settings.pipeline.parallel_branches = parallel;

            let question = match (question, file) {
                (Some(q), _) => q,
                (None, Some(path)) => std::fs::read_to_string(&path)
                    .with_context(|| format!("reading question from {:?}", path))?
                    .trim()
                    .to_string(),
                (None, None) => {
                    info!("No question given, using the built-in example");
                    EXAMPLE_QUESTION.to_string()
                }
            };
            info!("Question: {}", question);

            let parts = Collaborators::live(&settings)?;
            let progress = Arc::new(|msg: &str| println!("▶ {}", msg));
            let mut pipeline = Pipeline::new(settings.pipeline.clone(), parts).with_progress(progress);
            let output = pipeline.run(&question).await?;

            println!("\n✅ VIDEO GENERATION COMPLETE");
            println!("   Video:    {}", output.video_path.display());
            println!("   Duration: {:.1}s", output.duration);
            println!("   Topic:    {}", output.metadata.topic);
            println!("   Steps:    {}", output.metadata.steps);
            Ok(())
        }
        Commands::Analyze { question } => {
            let settings = Settings::from_env()?;
            let llm = Arc::new(LlmBridge::new(&settings.api)?);
            let analysis = LlmSolutionWriter::new(llm).analyze(&question).await?;
            println!("{}", serde_json::to_string_pretty(&analysis)?);
            Ok(())
        }
        Commands::Timeline { solution } => {
            let json = std::fs::read_to_string(&solution)
                .with_context(|| format!("reading solution snapshot {:?}", solution))?;
            let timed = TimedSolution::from_snapshot(&json)
                .with_context(|| format!("loading solution snapshot {:?}", solution))?;

            println!("{:<10} {:<13} {:>8} {:>8} {:>8}", "SCENE", "KIND", "START", "END", "DUR");
            for scene in timed.timeline().scenes() {
                println!(
                    "{:<10} {:<13} {:>8.2} {:>8.2} {:>8.2}",
                    scene.scene_id,
                    scene.scene_type.as_str(),
                    scene.start_time,
                    scene.end_time,
                    scene.duration
                );
            }
            let split = split_timeline(timed.timeline());
            println!(
                "\nIntroduction: {:.2}s  Solution: {:.2}s  Total: {:.2}s",
                split.part(Part::Introduction).duration,
                split.part(Part::Solution).duration,
                timed.timeline().total_duration()
            );
            Ok(())
        }
        Commands::Doctor => {
            let credential_set = std::env::var(API_KEY_VAR)
                .map(|k| !k.trim().is_empty())
                .unwrap_or(false);
            let report = check_dependencies(credential_set).await;
            println!("{}", report.status_report());
            if report.is_ready() {
                println!("\nAll dependencies available.");
            } else {
                warn!("Missing: {:?}", report.missing());
                anyhow::bail!("environment is not ready");
            }
            Ok(())
        }
    }
}
