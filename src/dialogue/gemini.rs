//! Gemini Integration
//!
//! REST client for the `generateContent` endpoint. The persona turn is
//! sent as the system instruction; user and model turns become contents.

use super::{ConversationModel, Role, Turn};
use crate::config::Config;
use crate::error::{BotError, BotResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    contents: Vec<Content>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

/// Handles Gemini chat requests
#[derive(Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

impl GeminiClient {
    pub fn new(base_url: &str, model: &str, api_key: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
        }
    }

    pub fn from_config(config: &Config, api_key: &str) -> Self {
        Self::new(&config.gemini_url, &config.gemini_model, api_key)
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

fn build_request(history: &[Turn]) -> GenerateRequest {
    let persona: Vec<&str> = history
        .iter()
        .filter(|t| t.role == Role::System)
        .map(|t| t.text.as_str())
        .collect();

    let system_instruction = (!persona.is_empty()).then(|| Content {
        role: None,
        parts: vec![Part {
            text: persona.join("\n"),
        }],
    });

    let contents = history
        .iter()
        .filter_map(|t| {
            let role = match t.role {
                Role::User => "user",
                Role::Model => "model",
                Role::System => return None,
            };
            Some(Content {
                role: Some(role),
                parts: vec![Part {
                    text: t.text.clone(),
                }],
            })
        })
        .collect();

    GenerateRequest {
        system_instruction,
        contents,
    }
}

fn parse_reply(body: &str) -> BotResult<String> {
    let resp: GenerateResponse = serde_json::from_str(body)?;
    let text: String = resp
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(BotError::Dialogue("model returned no text".into()));
    }
    Ok(text.trim().to_string())
}

#[async_trait]
impl ConversationModel for GeminiClient {
    async fn reply(&self, history: &[Turn]) -> BotResult<String> {
        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&build_request(history))
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!("❌ Gemini API Error ({}): {}", status, body);
            return Err(BotError::Dialogue(format!("{}: {}", status, api_error_message(&body))));
        }

        debug!("🧠 Gemini raw body: {}", body);
        parse_reply(&body)
    }
}

/// Pull `error.message` out of an API error body, falling back to the body
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}
