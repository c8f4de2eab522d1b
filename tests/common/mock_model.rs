//! Mock Conversation Model for Testing

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use voicebot::dialogue::{ConversationModel, Turn};
use voicebot::error::{BotError, BotResult};

#[derive(Debug, Clone, Default)]
pub struct MockModel {
    /// History seen by each call
    requests: Arc<Mutex<Vec<Vec<Turn>>>>,
    error: Arc<Mutex<Option<String>>>,
}

impl MockModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(message: &str) -> Self {
        let model = Self::default();
        *model.error.lock().unwrap() = Some(message.to_string());
        model
    }

    pub fn requests(&self) -> Vec<Vec<Turn>> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ConversationModel for MockModel {
    async fn reply(&self, history: &[Turn]) -> BotResult<String> {
        let mut requests = self.requests.lock().unwrap();
        requests.push(history.to_vec());
        if let Some(message) = self.error.lock().unwrap().clone() {
            return Err(BotError::Dialogue(message));
        }
        let last = history.last().map(|t| t.text.as_str()).unwrap_or_default();
        Ok(format!("Reply #{} to '{}'", requests.len(), last))
    }
}
