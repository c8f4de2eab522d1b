//! Voicebot Error Types
//!
//! Centralized error handling. Every collaborator call returns a
//! `BotResult`, and the turn controller decides per variant whether to
//! recover or propagate.

use thiserror::Error;

/// Central error type for voicebot
#[derive(Error, Debug)]
pub enum BotError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Speech capture error: {0}")]
    Capture(#[from] CaptureError),

    #[error("TTS engine error: {0}")]
    Tts(String),

    #[error("Launch error: {0}")]
    Launch(String),

    #[error("Conversation model error: {0}")]
    Dialogue(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Failure classes of a single capture attempt.
///
/// The controller never distinguishes these; they only pick the
/// diagnostic printed before the utterance collapses to empty text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("no speech detected within timeout")]
    Timeout,

    #[error("speech was unintelligible")]
    Unintelligible,

    #[error("recognition service failed: {0}")]
    Service(String),

    #[error("input device failed: {0}")]
    Device(String),
}

/// Result type alias for voicebot operations
pub type BotResult<T> = Result<T, BotError>;
