//! Action audit log
//!
//! Every side effect the assistant performs on the host (URL opened,
//! process spawned) is appended here with a timestamp.

use anyhow::Result;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Default audit log location
pub fn log_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from(".local/share"))
        .join("voicebot")
        .join("actions.log")
}

/// Write an entry to the audit log
pub fn log(entry: &str) -> Result<()> {
    log_to(&log_path(), entry)
}

/// Write an entry to a specific audit log file
pub fn log_to(path: &Path, entry: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;

    writeln!(
        file,
        "[{}] {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        entry
    )?;
    Ok(())
}
