// SYNOID Tutor LLM Bridge
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// OpenAI-compatible chat completion client. Every text-generating
// collaborator talks to the model through the `TextGenerator` seam so
// tests can swap in canned responses.

use crate::config::ApiConfig;
use crate::error::GenerationError;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, error, info};

/// One system + user exchange.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub system: String,
    pub user: String,
    /// Ask the service for a JSON object response.
    pub json_mode: bool,
}

impl ChatRequest {
    pub fn json(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            json_mode: true,
        }
    }

    pub fn text(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            json_mode: false,
        }
    }
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn complete(&self, request: &ChatRequest) -> Result<String, GenerationError>;
}

pub struct LlmBridge {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl LlmBridge {
    pub fn new(config: &ApiConfig) -> Result<Self, GenerationError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint("chat/completions"),
            api_key: config.api_key.clone(),
            model: config.chat_model.clone(),
        })
    }
}

#[async_trait]
impl TextGenerator for LlmBridge {
    async fn complete(&self, request: &ChatRequest) -> Result<String, GenerationError> {
        info!("[LLM] Requesting completion from {}", self.model);

        let mut payload = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": request.system },
                { "role": "user", "content": request.user }
            ]
        });
        if request.json_mode {
            payload["response_format"] = json!({ "type": "json_object" });
        }

        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            error!("[LLM] API Error {}: {}", status, body);
            return Err(GenerationError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let json: serde_json::Value = resp.json().await?;
        // choices[0].message.content
        let content = json["choices"][0]["message"]["content"]
            .as_str()
            .map(str::trim)
            .unwrap_or_default();
        if content.is_empty() {
            return Err(GenerationError::EmptyResponse);
        }
        debug!("[LLM] Received {} characters", content.len());
        Ok(content.to_string())
    }
}

/// Strip a surrounding Markdown code fence (```json, ```python, ```).
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the language tag on the opening fence line.
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    body.trim_end().trim_end_matches("```").trim()
}

/// Parse a model response as JSON, tolerating a code fence around it.
pub fn parse_json_reply<T: DeserializeOwned>(raw: &str) -> Result<T, GenerationError> {
    let clean = strip_code_fence(raw);
    serde_json::from_str(clean).map_err(|e| {
        debug!("[LLM] JSON parse failed. Response: {}", raw);
        GenerationError::Json(e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```python\nprint(1)\n```"), "print(1)");
        assert_eq!(strip_code_fence("```\n{\"a\": 1}\n```\n"), "{\"a\": 1}");
        assert_eq!(strip_code_fence("  plain text  "), "plain text");
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Probe {
        a: u32,
    }

    #[test]
    fn test_parse_json_reply() {
        let parsed: Probe = parse_json_reply("```json\n{\"a\": 7}\n```").unwrap();
        assert_eq!(parsed, Probe { a: 7 });
        assert!(matches!(
            parse_json_reply::<Probe>("not json"),
            Err(GenerationError::Json(_))
        ));
    }
}
