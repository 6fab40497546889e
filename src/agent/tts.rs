// SYNOID Speech Synthesis
// Copyright (c) 2026 Xing_The_Creator | SYNOID

use crate::config::ApiConfig;
use crate::error::SynthesisError;
use crate::script::VoiceoverScript;
use async_trait::async_trait;
use serde_json::json;
use std::path::Path;
use tracing::{error, info};

#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Narrate the full script into an mp3 at `output`.
    async fn synthesize(&self, script: &VoiceoverScript, output: &Path) -> Result<(), SynthesisError>;
}

/// OpenAI-compatible `audio/speech` client.
pub struct OpenAiSpeech {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    voice: String,
    speed: f32,
}

impl OpenAiSpeech {
    pub fn new(config: &ApiConfig) -> Result<Self, SynthesisError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint("audio/speech"),
            api_key: config.api_key.clone(),
            model: config.tts_model.clone(),
            voice: config.tts_voice.clone(),
            speed: config.tts_speed,
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for OpenAiSpeech {
    async fn synthesize(&self, script: &VoiceoverScript, output: &Path) -> Result<(), SynthesisError> {
        info!(
            "[TTS] Synthesizing {} characters with voice '{}'",
            script.full_script.len(),
            self.voice
        );

        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "model": self.model,
                "voice": self.voice,
                "input": script.full_script,
                "speed": self.speed,
                "response_format": "mp3"
            }))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            error!("[TTS] API Error {}: {}", status, body);
            return Err(SynthesisError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = resp.bytes().await?;
        if let Some(parent) = output.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(output, &bytes).await?;

        info!("[TTS] Audio saved: {:?} ({} bytes)", output, bytes.len());
        Ok(())
    }
}
