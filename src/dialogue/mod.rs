//! Dialogue Session
//!
//! Append-only conversation history with a language model, seeded with a
//! persona instruction.

use crate::error::BotResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub mod gemini;

pub use gemini::GeminiClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Persona instruction
    System,
    User,
    Model,
}

/// One entry of the dialogue history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub text: String,
}

impl Turn {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
        }
    }
}

/// Trait for conversation models
#[async_trait]
pub trait ConversationModel: Send + Sync {
    /// Produce the model's reply to the last user turn of `history`
    async fn reply(&self, history: &[Turn]) -> BotResult<String>;
}

/// Conversation with a model. History only ever grows.
pub struct DialogueSession {
    model: Box<dyn ConversationModel>,
    history: Vec<Turn>,
}

impl DialogueSession {
    /// Start a session whose history begins with the persona instruction
    pub fn start(model: Box<dyn ConversationModel>, persona: &str) -> Self {
        Self {
            model,
            history: vec![Turn::new(Role::System, persona)],
        }
    }

    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    /// Send one user turn and return the reply.
    ///
    /// Both turns are appended only when the model answers, so a failed
    /// send leaves the history unchanged.
    pub async fn send(&mut self, text: &str) -> BotResult<String> {
        let mut pending = self.history.clone();
        pending.push(Turn::new(Role::User, text));

        let reply = self.model.reply(&pending).await?;

        self.history = pending;
        self.history.push(Turn::new(Role::Model, reply.clone()));
        debug!("Dialogue history now {} turns", self.history.len());
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BotError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Counting {
        calls: Arc<AtomicUsize>,
        fail: bool,
    }

    #[async_trait]
    impl ConversationModel for Counting {
        async fn reply(&self, history: &[Turn]) -> BotResult<String> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if self.fail {
                return Err(BotError::Dialogue("model unavailable".into()));
            }
            let last = history.last().map(|t| t.text.clone()).unwrap_or_default();
            Ok(format!("reply {} to {}", n, last))
        }
    }

    fn session(fail: bool) -> (DialogueSession, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let model = Counting {
            calls: calls.clone(),
            fail,
        };
        (DialogueSession::start(Box::new(model), "Be nice."), calls)
    }

    #[test]
    fn test_seeded_with_persona() {
        let (s, _) = session(false);
        assert_eq!(s.history(), &[Turn::new(Role::System, "Be nice.")]);
    }

    #[tokio::test]
    async fn test_identical_sends_are_not_deduplicated() {
        let (mut s, calls) = session(false);
        let first = s.send("hello").await.unwrap();
        let second = s.send("hello").await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_ne!(first, second);
        assert_eq!(s.history().len(), 5);
        let roles: Vec<Role> = s.history().iter().map(|t| t.role).collect();
        assert_eq!(
            roles,
            vec![Role::System, Role::User, Role::Model, Role::User, Role::Model]
        );
    }

    #[tokio::test]
    async fn test_failed_send_leaves_history() {
        let (mut s, calls) = session(true);
        assert!(s.send("hello").await.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(s.history().len(), 1);
    }
}
