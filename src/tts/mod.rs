//! TTS (Text-to-Speech) Module
//!
//! Wraps a stateful voice engine behind [`SpeechOutput`], which owns the
//! current engine handle and rebuilds it once when a speak call fails.

use crate::config::Config;
use crate::error::{BotError, BotResult};
use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, info, warn};

pub mod system;

/// Trait for voice engines
#[async_trait]
pub trait VoiceEngine: Send + Sync + std::fmt::Debug {
    /// Speak the given text, returning once playback has finished
    async fn speak(&self, text: &str) -> Result<()>;

    /// Whether the engine is currently mid-utterance
    fn is_busy(&self) -> bool;

    /// Stop the current utterance, if any
    async fn stop(&self) -> Result<()>;

    /// Identifiers of the voices this engine offers
    fn voices(&self) -> Vec<String>;

    /// Select a voice by identifier
    fn set_voice(&mut self, voice: &str) -> Result<()>;

    /// Set the speaking rate in words per minute
    fn set_rate(&mut self, words_per_minute: u32);

    /// Get the engine name
    fn name(&self) -> &str;
}

/// Builds fresh voice engine handles
pub trait EngineFactory: Send + Sync {
    fn create(&self) -> Result<Box<dyn VoiceEngine>>;
}

/// Voice selection and rate applied to every new engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoicePrefs {
    /// Preferred voice index; falls back to 0 when out of range
    pub voice_index: usize,
    pub rate: u32,
}

impl Default for VoicePrefs {
    fn default() -> Self {
        Self {
            voice_index: 1,
            rate: 150,
        }
    }
}

impl From<&Config> for VoicePrefs {
    fn from(config: &Config) -> Self {
        Self {
            voice_index: config.voice_index,
            rate: config.speech_rate,
        }
    }
}

impl VoicePrefs {
    /// Index of the voice to use out of `available` voices
    pub fn pick(&self, available: usize) -> usize {
        if self.voice_index < available {
            self.voice_index
        } else {
            0
        }
    }
}

/// Speech output adapter owning the live engine handle
pub struct SpeechOutput {
    engine: Box<dyn VoiceEngine>,
    factory: Box<dyn EngineFactory>,
    prefs: VoicePrefs,
}

impl std::fmt::Debug for SpeechOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeechOutput")
            .field("engine", &self.engine)
            .field("prefs", &self.prefs)
            .finish()
    }
}

impl SpeechOutput {
    /// Construct the first engine from `factory` and configure it
    pub fn new(factory: Box<dyn EngineFactory>, prefs: VoicePrefs) -> BotResult<Self> {
        let engine = build_engine(factory.as_ref(), prefs)?;
        info!("✅ TTS engine '{}' initialized", engine.name());
        Ok(Self {
            engine,
            factory,
            prefs,
        })
    }

    /// Name of the live engine
    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    /// Speak `text`, rebuilding the engine once if the fast path fails.
    ///
    /// A failure on the rebuilt engine is returned to the caller.
    pub async fn speak(&mut self, text: &str) -> BotResult<()> {
        let fast = if self.engine.is_busy() {
            Err(anyhow::anyhow!("engine is busy"))
        } else {
            self.engine.speak(text).await
        };

        let err = match fast {
            Ok(()) => return Ok(()),
            Err(e) => e,
        };

        warn!("🔁 Speech failed on '{}': {}, reinitializing", self.engine.name(), err);
        if let Err(e) = self.engine.stop().await {
            debug!("Ignoring stop failure during recovery: {}", e);
        }

        self.engine = self.reinitialize()?;

        self.engine
            .speak(text)
            .await
            .map_err(|e| BotError::Tts(format!("speak failed after reinitialize: {}", e)))
    }

    /// Build a fresh, configured engine handle. The caller replaces and
    /// drops the old one.
    pub fn reinitialize(&self) -> BotResult<Box<dyn VoiceEngine>> {
        let engine = build_engine(self.factory.as_ref(), self.prefs)?;
        info!("🔊 TTS engine '{}' reinitialized", engine.name());
        Ok(engine)
    }
}

fn build_engine(factory: &dyn EngineFactory, prefs: VoicePrefs) -> BotResult<Box<dyn VoiceEngine>> {
    let mut engine = factory
        .create()
        .map_err(|e| BotError::Tts(format!("failed to create engine: {}", e)))?;

    let voices = engine.voices();
    if voices.is_empty() {
        debug!("Engine '{}' reports no voices, keeping its default", engine.name());
    } else {
        let voice = &voices[prefs.pick(voices.len())];
        if let Err(e) = engine.set_voice(voice) {
            warn!("⚠️ Could not select voice '{}': {}", voice, e);
        }
    }
    engine.set_rate(prefs.rate);
    Ok(engine)
}
