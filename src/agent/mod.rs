// SYNOID Agent Modules
// Copyright (c) 2026 Xing_The_Creator | SYNOID

pub mod animator;
pub mod artifacts;
pub mod health;
pub mod llm_bridge;
pub mod media_probe;
pub mod muxer;
pub mod renderer;
pub mod script_writer;
pub mod solution_writer;
pub mod tts;
pub mod validation_gate;
pub mod video_stitcher;

pub mod orchestrator; // Pipeline core
