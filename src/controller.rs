//! Turn Controller
//!
//! Runs one conversation turn at a time: classify the utterance, dispatch
//! to a resolver or the dialogue session, then print and speak the result.
//! Once the loop is running nothing here returns an error; every failure
//! degrades to a printed or spoken message.

use crate::asr::{capture_utterance, CaptureDevice, ListenParams};
use crate::dialogue::DialogueSession;
use crate::intent::{self, Intent};
use crate::launcher::{self, LaunchTable, OsFamily, SystemLauncher};
use crate::tts::SpeechOutput;
use std::future::Future;
use std::io::Write;
use tracing::{error, info, warn};

/// Spoken when the user ends the session
pub const FAREWELL: &str = "Goodbye! Have a great day!";
/// Printed when the session is interrupted from the keyboard
pub const INTERRUPT_FAREWELL: &str = "Goodbye!";

/// Whether the loop should keep going after a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    Continue,
    Terminate,
}

/// How a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The user said the termination phrase
    Terminated,
    /// The shutdown signal fired
    Interrupted,
}

pub struct TurnController {
    session: DialogueSession,
    output: SpeechOutput,
    launcher: Box<dyn SystemLauncher>,
    table: LaunchTable,
    os: OsFamily,
}

impl TurnController {
    pub fn new(
        session: DialogueSession,
        output: SpeechOutput,
        launcher: Box<dyn SystemLauncher>,
        os: OsFamily,
    ) -> Self {
        Self {
            session,
            output,
            launcher,
            table: LaunchTable::builtin(),
            os,
        }
    }

    pub fn session(&self) -> &DialogueSession {
        &self.session
    }

    /// Handle one utterance. An empty utterance is a no-op.
    pub async fn run_turn(&mut self, utterance: &str) -> TurnOutcome {
        let utterance = intent::normalize(utterance);
        if utterance.is_empty() {
            return TurnOutcome::Continue;
        }

        match intent::classify(&utterance) {
            Intent::Terminate => {
                info!("👋 Termination phrase heard");
                self.respond(FAREWELL).await;
                return TurnOutcome::Terminate;
            }
            Intent::MediaSearch { query } => {
                let result = launcher::search_media(&query, self.launcher.as_ref());
                self.respond(&result).await;
            }
            Intent::LaunchTarget { name } => {
                let result = launcher::open_target(&name, self.os, &self.table, self.launcher.as_ref());
                self.respond(&result).await;
            }
            Intent::Converse { message } => {
                print!("  Bot is thinking...");
                let _ = std::io::stdout().flush();

                let reply = match self.session.send(&message).await {
                    Ok(reply) => reply,
                    Err(e) => {
                        warn!("❌ Conversation failed: {}", e);
                        format!("Oh no! I ran into an error: {}", e)
                    }
                };
                print!("\r");
                self.respond(&reply).await;
            }
        }

        TurnOutcome::Continue
    }

    /// Print `text`, then speak it. Speech failures are logged only.
    async fn respond(&mut self, text: &str) {
        println!("\n Bot: {}\n", text);
        if let Err(e) = self.output.speak(text).await {
            error!("🔇 Could not speak response: {}", e);
        }
    }

    /// Capture and handle turns until the user ends the session or
    /// `shutdown` resolves.
    pub async fn run_session<F>(
        &mut self,
        capture: &mut dyn CaptureDevice,
        params: &ListenParams,
        shutdown: F,
    ) -> SessionEnd
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            let turn = async {
                let utterance = capture_utterance(&mut *capture, params).await;
                self.run_turn(&utterance).await
            };

            tokio::select! {
                _ = &mut shutdown => {
                    println!("\n\n Bot: {} \n", INTERRUPT_FAREWELL);
                    return SessionEnd::Interrupted;
                }
                outcome = turn => {
                    if outcome == TurnOutcome::Terminate {
                        return SessionEnd::Terminated;
                    }
                }
            }
        }
    }
}
