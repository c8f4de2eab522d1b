//! Mock Capture Device for Testing
//!
//! Replays scripted capture results, then reports timeouts.

use async_trait::async_trait;
use std::collections::VecDeque;
use voicebot::asr::{CaptureDevice, ListenParams};
use voicebot::error::CaptureError;

pub struct MockCapture {
    results: VecDeque<Result<String, CaptureError>>,
    pub listens: usize,
}

impl MockCapture {
    pub fn new(results: Vec<Result<String, CaptureError>>) -> Self {
        Self {
            results: results.into(),
            listens: 0,
        }
    }

    pub fn phrases(phrases: &[&str]) -> Self {
        Self::new(phrases.iter().map(|p| Ok(p.to_string())).collect())
    }
}

#[async_trait]
impl CaptureDevice for MockCapture {
    async fn listen(&mut self, _params: &ListenParams) -> Result<String, CaptureError> {
        self.listens += 1;
        match self.results.pop_front() {
            Some(result) => result,
            None => {
                // Keep the loop from spinning once the script is exhausted
                tokio::task::yield_now().await;
                Err(CaptureError::Timeout)
            }
        }
    }
}
