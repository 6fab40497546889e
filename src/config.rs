// SYNOID Tutor Configuration
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Built once in `main` from the environment (after dotenv) and CLI flags,
// then passed by reference to every collaborator. Nothing re-reads the
// environment mid-run.

use crate::error::ConfigError;
use std::path::PathBuf;
use std::time::Duration;

pub const API_KEY_VAR: &str = "OPENAI_API_KEY";

/// Connection settings for the text and speech services.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub api_key: String,
    pub base_url: String,
    pub chat_model: String,
    pub tts_model: String,
    pub tts_voice: String,
    pub tts_speed: f32,
    pub request_timeout: Duration,
}

impl ApiConfig {
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path.trim_start_matches('/'))
    }
}

/// How many animation artifacts a run produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineMode {
    /// Introduction and solution generated and rendered separately, then joined.
    Split,
    /// Legacy single-agent mode: one artifact for the whole timeline.
    Single,
}

/// What to do when the script fails timing validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimingPolicy {
    /// Log a warning and carry on.
    Permissive,
    /// Regenerate the script, failing the run after `max_attempts`.
    Strict { max_attempts: u32 },
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub output_dir: PathBuf,
    pub mode: PipelineMode,
    pub timing_policy: TimingPolicy,
    pub code_attempts: u32,
    pub render_timeout: Duration,
    pub mux_timeout: Duration,
    pub parallel_branches: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./output"),
            mode: PipelineMode::Split,
            timing_policy: TimingPolicy::Permissive,
            code_attempts: 3,
            render_timeout: Duration::from_secs(600),
            mux_timeout: Duration::from_secs(600),
            parallel_branches: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub api: ApiConfig,
    pub pipeline: PipelineConfig,
}

impl Settings {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary lookup (tests pass a map).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(API_KEY_VAR)
            .filter(|k| !k.trim().is_empty())
            .ok_or(ConfigError::MissingCredential(API_KEY_VAR))?;

        let text = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let api = ApiConfig {
            api_key,
            base_url: text("SYNOID_API_URL", "https://api.openai.com/v1"),
            chat_model: text("SYNOID_CHAT_MODEL", "gpt-5"),
            tts_model: text("SYNOID_TTS_MODEL", "tts-1-hd"),
            tts_voice: text("SYNOID_TTS_VOICE", "nova"),
            tts_speed: 1.0,
            request_timeout: Duration::from_secs(300),
        };

        let defaults = PipelineConfig::default();
        let pipeline = PipelineConfig {
            output_dir: lookup("SYNOID_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            render_timeout: secs(&lookup, "SYNOID_RENDER_TIMEOUT_SECS", defaults.render_timeout)?,
            mux_timeout: secs(&lookup, "SYNOID_MUX_TIMEOUT_SECS", defaults.mux_timeout)?,
            code_attempts: match lookup("SYNOID_CODE_ATTEMPTS") {
                None => defaults.code_attempts,
                Some(raw) => match raw.trim().parse::<u32>() {
                    Ok(n) if n > 0 => n,
                    _ => {
                        return Err(ConfigError::Invalid {
                            key: "SYNOID_CODE_ATTEMPTS",
                            value: raw,
                        })
                    }
                },
            },
            ..defaults
        };

        Ok(Self { api, pipeline })
    }
}

fn secs<F>(lookup: &F, key: &'static str, default: Duration) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(pairs: &[(&str, &str)]) -> Result<Settings, ConfigError> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Settings::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn test_missing_credential_is_fatal() {
        assert!(matches!(settings(&[]), Err(ConfigError::MissingCredential(API_KEY_VAR))));
        assert!(matches!(
            settings(&[(API_KEY_VAR, "  ")]),
            Err(ConfigError::MissingCredential(_))
        ));
    }

    #[test]
    fn test_defaults() {
        let s = settings(&[(API_KEY_VAR, "sk-test")]).unwrap();
        assert_eq!(s.api.chat_model, "gpt-5");
        assert_eq!(s.api.tts_voice, "nova");
        assert_eq!(s.pipeline.code_attempts, 3);
        assert_eq!(s.pipeline.mode, PipelineMode::Split);
        assert_eq!(s.pipeline.timing_policy, TimingPolicy::Permissive);
        assert_eq!(s.api.endpoint("/chat/completions"), "https://api.openai.com/v1/chat/completions");
    }

    #[test]
    fn test_overrides_and_bad_numbers() {
        let s = settings(&[
            (API_KEY_VAR, "sk-test"),
            ("SYNOID_API_URL", "http://localhost:11434/v1/"),
            ("SYNOID_RENDER_TIMEOUT_SECS", "42"),
        ])
        .unwrap();
        assert_eq!(s.pipeline.render_timeout, Duration::from_secs(42));
        assert_eq!(s.api.endpoint("audio/speech"), "http://localhost:11434/v1/audio/speech");

        let err = settings(&[(API_KEY_VAR, "sk"), ("SYNOID_MUX_TIMEOUT_SECS", "soon")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "SYNOID_MUX_TIMEOUT_SECS", .. }));

        let err = settings(&[(API_KEY_VAR, "sk"), ("SYNOID_CODE_ATTEMPTS", "0")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "SYNOID_CODE_ATTEMPTS", .. }));
    }
}
