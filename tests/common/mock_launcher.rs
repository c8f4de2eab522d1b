//! Mock Launcher for Testing
//!
//! Records every launch primitive call instead of touching the OS.

use std::sync::{Arc, Mutex};
use voicebot::error::{BotError, BotResult};
use voicebot::launcher::{AppDirective, SystemLauncher};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchCall {
    Url(String),
    App(AppDirective),
    Spawn(String),
}

#[derive(Debug, Clone, Default)]
pub struct MockLauncher {
    calls: Arc<Mutex<Vec<LaunchCall>>>,
    fail: Arc<Mutex<bool>>,
}

impl MockLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail(&self, fail: bool) {
        *self.fail.lock().unwrap() = fail;
    }

    pub fn calls(&self) -> Vec<LaunchCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: LaunchCall) -> BotResult<()> {
        self.calls.lock().unwrap().push(call);
        if *self.fail.lock().unwrap() {
            Err(BotError::Launch("mock launch failure".into()))
        } else {
            Ok(())
        }
    }
}

impl SystemLauncher for MockLauncher {
    fn open_url(&self, url: &str) -> BotResult<()> {
        self.record(LaunchCall::Url(url.to_string()))
    }

    fn open_application(&self, directive: &AppDirective) -> BotResult<()> {
        self.record(LaunchCall::App(directive.clone()))
    }

    fn spawn_by_name(&self, name: &str) -> BotResult<()> {
        self.record(LaunchCall::Spawn(name.to_string()))
    }
}
