//! ASR (Automatic Speech Recognition) Module
//!
//! Turns one spoken phrase into a transcript:
//! - listener: microphone capture with ambient calibration and an energy gate
//! - wyoming: remote recognition over the Wyoming protocol
//!
//! [`capture_utterance`] is the only entry point the turn loop uses. It
//! never fails; every failure class collapses to an empty utterance.

pub mod listener;
pub mod wyoming;

use crate::config::Config;
use crate::error::CaptureError;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info, warn};

pub use listener::MicListener;
pub use wyoming::WyomingClient;

/// Fixed capture parameters for a single listen call
#[derive(Debug, Clone, PartialEq)]
pub struct ListenParams {
    /// Maximum wait for speech to begin
    pub timeout: Duration,
    /// Maximum length of one phrase
    pub phrase_limit: Duration,
    /// Ambient noise calibration before every listen
    pub calibration: Duration,
    pub energy_threshold: f32,
    pub dynamic_threshold: bool,
    pub language: String,
}

impl Default for ListenParams {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(20),
            phrase_limit: Duration::from_secs(10),
            calibration: Duration::from_secs(1),
            energy_threshold: 4000.0,
            dynamic_threshold: true,
            language: "en-US".to_string(),
        }
    }
}

impl From<&Config> for ListenParams {
    fn from(config: &Config) -> Self {
        Self {
            timeout: Duration::from_secs(config.listen_timeout_secs),
            phrase_limit: Duration::from_secs(config.phrase_limit_secs),
            calibration: Duration::from_secs(config.calibration_secs),
            energy_threshold: config.energy_threshold,
            dynamic_threshold: config.dynamic_energy_threshold,
            language: config.language.clone(),
        }
    }
}

/// Trait for speech capture devices
#[async_trait]
pub trait CaptureDevice: Send {
    /// Capture one phrase and return its transcript
    async fn listen(&mut self, params: &ListenParams) -> Result<String, CaptureError>;
}

/// Capture one utterance. Never fails: errors are logged and mapped to "".
pub async fn capture_utterance(device: &mut dyn CaptureDevice, params: &ListenParams) -> String {
    info!("👂 Listening...");
    match device.listen(params).await {
        Ok(text) => {
            let text = text.trim().to_string();
            if text.is_empty() {
                debug!("Recognizer returned an empty transcript");
            } else {
                println!("\nYou said: {}", text);
            }
            text
        }
        Err(CaptureError::Timeout) => {
            info!("⏱️ No speech detected within timeout.");
            String::new()
        }
        Err(CaptureError::Unintelligible) => {
            println!("\nSorry, I couldn't understand that. Please speak clearly and try again.");
            String::new()
        }
        Err(CaptureError::Service(e)) => {
            warn!(
                "❌ Sorry, there was an error with the speech recognition service: {}",
                e
            );
            String::new()
        }
        Err(CaptureError::Device(e)) => {
            warn!("❌ Audio input failed: {}", e);
            String::new()
        }
    }
}
