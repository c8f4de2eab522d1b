use crate::error::{BotError, BotResult};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable holding the conversation model credential
pub const API_KEY_VAR: &str = "GEMINI_API_KEY";

/// Default persona instruction that seeds every dialogue session
pub const DEFAULT_PERSONA: &str = "You are a friendly and helpful AI assistant. \
Be conversational, show enthusiasm, and engage with the user naturally. \
Keep responses concise but warm.";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // Capture
    pub audio_device: Option<usize>,
    pub listen_timeout_secs: u64,
    pub phrase_limit_secs: u64,
    pub calibration_secs: u64,
    pub energy_threshold: f32,
    pub dynamic_energy_threshold: bool,
    pub language: String,

    // Wyoming
    pub wyoming_host: String,
    pub wyoming_port: u16,

    // Speech output
    pub voice_index: usize,
    pub speech_rate: u32,

    // Conversation model
    pub gemini_url: String,
    pub gemini_model: String,
    pub persona: String,

    // Meta
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            audio_device: None,
            listen_timeout_secs: 20,
            phrase_limit_secs: 10,
            calibration_secs: 1,
            energy_threshold: 4000.0,
            dynamic_energy_threshold: true,
            language: "en-US".to_string(),
            wyoming_host: "localhost".to_string(),
            wyoming_port: 10300,
            voice_index: 1,
            speech_rate: 150,
            gemini_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            gemini_model: "gemini-2.5-flash".to_string(),
            persona: DEFAULT_PERSONA.to_string(),
            log_level: "INFO".to_string(),
        }
    }
}

impl Config {
    /// Load config from the default location, or create default
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path())
    }

    /// Load config from a specific file. A corrupt file is moved aside and
    /// defaults are used instead.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        match serde_json::from_str(&content) {
            Ok(config) => Ok(config),
            Err(e) => {
                tracing::warn!("⚠️ Config file corrupted or invalid, using defaults: {}", e);
                let backup_path = path.with_extension("json.corrupt");
                let _ = std::fs::rename(path, &backup_path);
                Ok(Self::default())
            }
        }
    }

    /// Write config to a file, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Read the conversation model credential from the environment.
///
/// Missing or blank values are a startup configuration error.
pub fn api_key_from_env() -> BotResult<String> {
    match std::env::var(API_KEY_VAR) {
        Ok(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
        _ => Err(BotError::Config(format!(
            "{} must be set (environment or .env file)",
            API_KEY_VAR
        ))),
    }
}

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("voicebot")
        .join("config.json")
}
