//! Mock Voice Engine for Testing
//!
//! Records all spoken text and counts engine constructions.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use voicebot::tts::{EngineFactory, VoiceEngine};

#[derive(Debug)]
struct MockEngine {
    generation: usize,
    spoken: Arc<Mutex<Vec<(usize, String)>>>,
    failures: Arc<Mutex<VecDeque<bool>>>,
}

#[async_trait]
impl VoiceEngine for MockEngine {
    async fn speak(&self, text: &str) -> Result<()> {
        let fail = self.failures.lock().unwrap().pop_front().unwrap_or(false);
        if fail {
            return Err(anyhow::anyhow!("Mock TTS failure"));
        }
        self.spoken
            .lock()
            .unwrap()
            .push((self.generation, text.to_string()));
        Ok(())
    }

    fn is_busy(&self) -> bool {
        false
    }

    async fn stop(&self) -> Result<()> {
        Ok(())
    }

    fn voices(&self) -> Vec<String> {
        vec!["default".into(), "alternate".into()]
    }

    fn set_voice(&mut self, _voice: &str) -> Result<()> {
        Ok(())
    }

    fn set_rate(&mut self, _words_per_minute: u32) {}

    fn name(&self) -> &str {
        "mock"
    }
}

/// Factory handing out mock engines that share one transcript
#[derive(Debug, Clone, Default)]
pub struct MockTtsFactory {
    created: Arc<Mutex<usize>>,
    spoken: Arc<Mutex<Vec<(usize, String)>>>,
    failures: Arc<Mutex<VecDeque<bool>>>,
}

impl MockTtsFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `n` speak calls, across engines
    pub fn fail_next(&self, n: usize) {
        self.failures.lock().unwrap().extend(std::iter::repeat(true).take(n));
    }

    /// Engines built so far, including the initial one
    pub fn created(&self) -> usize {
        *self.created.lock().unwrap()
    }

    pub fn get_spoken(&self) -> Vec<String> {
        self.spoken
            .lock()
            .unwrap()
            .iter()
            .map(|(_, text)| text.clone())
            .collect()
    }

    pub fn was_spoken(&self, text: &str) -> bool {
        self.get_spoken().iter().any(|s| s.contains(text))
    }
}

impl EngineFactory for MockTtsFactory {
    fn create(&self) -> Result<Box<dyn VoiceEngine>> {
        let mut created = self.created.lock().unwrap();
        *created += 1;
        Ok(Box::new(MockEngine {
            generation: *created,
            spoken: self.spoken.clone(),
            failures: self.failures.clone(),
        }))
    }
}
