//! System TTS engine driving espeak-ng, with spd-say as fallback

use super::{EngineFactory, VoiceEngine};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tracing::debug;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// espeak-ng's own default speaking rate
const ESPEAK_DEFAULT_WPM: i64 = 175;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    EspeakNg,
    SpdSay,
}

impl Backend {
    fn program(self) -> &'static str {
        match self {
            Backend::EspeakNg => "espeak-ng",
            Backend::SpdSay => "spd-say",
        }
    }
}

#[derive(Debug)]
pub struct SystemEngine {
    backend: Backend,
    voices: Vec<String>,
    voice: Option<String>,
    rate: u32,
    busy: AtomicBool,
    child: Mutex<Option<Child>>,
}

impl SystemEngine {
    pub fn new(backend: Backend, voices: Vec<String>) -> Self {
        Self {
            backend,
            voices,
            voice: None,
            rate: ESPEAK_DEFAULT_WPM as u32,
            busy: AtomicBool::new(false),
            child: Mutex::new(None),
        }
    }

    fn command(&self, text: &str) -> Command {
        let mut cmd = Command::new(self.backend.program());
        match self.backend {
            Backend::EspeakNg => {
                if let Some(voice) = &self.voice {
                    cmd.arg("-v").arg(voice);
                }
                cmd.arg("-s").arg(self.rate.to_string());
            }
            Backend::SpdSay => {
                cmd.arg("-w").arg("-r").arg(spd_rate(self.rate).to_string());
                if let Some(voice) = &self.voice {
                    cmd.arg("-y").arg(voice);
                }
            }
        }
        cmd.arg(text)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        cmd
    }

    async fn wait_for_child(&self) -> Result<()> {
        loop {
            {
                let mut guard = self.child.lock().await;
                let Some(child) = guard.as_mut() else {
                    return Err(anyhow::anyhow!("speech process was stopped"));
                };
                if let Some(status) = child.try_wait()? {
                    *guard = None;
                    if !status.success() {
                        return Err(anyhow::anyhow!(
                            "{} exited with {}",
                            self.backend.program(),
                            status
                        ));
                    }
                    return Ok(());
                }
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }
}

#[async_trait]
impl VoiceEngine for SystemEngine {
    async fn speak(&self, text: &str) -> Result<()> {
        debug!("System speaking: {}", text);

        if self.busy.swap(true, Ordering::SeqCst) {
            return Err(anyhow::anyhow!("engine is already speaking"));
        }

        let result = async {
            let child = self
                .command(text)
                .spawn()
                .with_context(|| format!("Failed to spawn {}", self.backend.program()))?;
            *self.child.lock().await = Some(child);
            self.wait_for_child().await
        }
        .await;

        self.busy.store(false, Ordering::SeqCst);
        result
    }

    fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    async fn stop(&self) -> Result<()> {
        let mut guard = self.child.lock().await;
        match guard.take() {
            Some(mut child) => {
                child.start_kill()?;
                Ok(())
            }
            None => Err(anyhow::anyhow!("nothing is being spoken")),
        }
    }

    fn voices(&self) -> Vec<String> {
        self.voices.clone()
    }

    fn set_voice(&mut self, voice: &str) -> Result<()> {
        if !self.voices.iter().any(|v| v == voice) {
            return Err(anyhow::anyhow!("unknown voice '{}'", voice));
        }
        self.voice = Some(voice.to_string());
        Ok(())
    }

    fn set_rate(&mut self, words_per_minute: u32) {
        self.rate = words_per_minute;
    }

    fn name(&self) -> &str {
        self.backend.program()
    }
}

/// Creates [`SystemEngine`]s, probing for espeak-ng first
#[derive(Debug, Default)]
pub struct SystemEngineFactory;

impl EngineFactory for SystemEngineFactory {
    fn create(&self) -> Result<Box<dyn VoiceEngine>> {
        match std::process::Command::new("espeak-ng").arg("--voices").output() {
            Ok(output) if output.status.success() => {
                let listing = String::from_utf8_lossy(&output.stdout);
                Ok(Box::new(SystemEngine::new(
                    Backend::EspeakNg,
                    parse_espeak_voices(&listing),
                )))
            }
            _ => {
                std::process::Command::new("spd-say")
                    .arg("--version")
                    .output()
                    .context("No system TTS command found (tried espeak-ng, spd-say)")?;
                Ok(Box::new(SystemEngine::new(Backend::SpdSay, Vec::new())))
            }
        }
    }
}

/// Voice identifiers from `espeak-ng --voices` (the language column)
pub fn parse_espeak_voices(listing: &str) -> Vec<String> {
    listing
        .lines()
        .skip(1)
        .filter_map(|line| line.split_whitespace().nth(1))
        .map(str::to_string)
        .collect()
}

/// Map words per minute onto spd-say's -100..100 rate scale
pub fn spd_rate(words_per_minute: u32) -> i64 {
    ((words_per_minute as i64 - ESPEAK_DEFAULT_WPM) / 2).clamp(-100, 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_espeak_voices() {
        let listing = "Pty Language       Age/Gender VoiceName          File                 Other Languages\n \
 5  af              --/M      Afrikaans          gmw/af\n \
 2  en-gb           --/M      English_(Great_Britain) gmw/en\n \
 5  en-us           --/M      English_(America)  gmw/en-US\n";
        assert_eq!(parse_espeak_voices(listing), vec!["af", "en-gb", "en-us"]);
        assert!(parse_espeak_voices("").is_empty());
    }

    #[test]
    fn test_spd_rate() {
        assert_eq!(spd_rate(175), 0);
        assert_eq!(spd_rate(150), -12);
        assert_eq!(spd_rate(1000), 100);
        assert_eq!(spd_rate(0), -87);
    }

    #[test]
    fn test_set_voice_rejects_unknown() {
        let mut engine = SystemEngine::new(Backend::EspeakNg, vec!["en-us".into()]);
        assert!(engine.set_voice("en-us").is_ok());
        assert!(engine.set_voice("klingon").is_err());
    }

    #[tokio::test]
    async fn test_idle_engine_is_not_busy() {
        let engine = SystemEngine::new(Backend::EspeakNg, Vec::new());
        assert!(!engine.is_busy());
        assert!(engine.stop().await.is_err());
    }

    #[test]
    fn test_espeak_command_arguments() {
        let mut engine = SystemEngine::new(Backend::EspeakNg, vec!["en-us".into()]);
        engine.set_voice("en-us").unwrap();
        engine.set_rate(150);

        let cmd = engine.command("hello");
        let std_cmd = cmd.as_std();
        assert_eq!(std_cmd.get_program(), "espeak-ng");
        let args: Vec<_> = std_cmd.get_args().collect();
        assert_eq!(args, ["-v", "en-us", "-s", "150", "hello"]);
    }
}
