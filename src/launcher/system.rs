//! Native launcher backed by the OS default handler and process spawning

use super::{AppDirective, SystemLauncher};
use crate::audit;
use crate::error::{BotError, BotResult};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::JoinHandle;
use tracing::{debug, warn};

#[derive(Debug, Default)]
pub struct NativeLauncher;

impl NativeLauncher {
    pub fn new() -> Self {
        Self
    }

    fn record(action: &str) {
        if let Err(e) = audit::log(action) {
            warn!("⚠️ Could not write audit log: {}", e);
        }
    }
}

fn spawn_detached(program: &str, args: &[&str]) -> BotResult<()> {
    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| BotError::Launch(format!("{}: {}", program, e)))?;
    debug!("Spawned {} (pid {})", program, child.id());
    reap_in_background(child);
    Ok(())
}

/// Wait for a detached child on its own thread so it never lingers as a zombie
fn reap_in_background(mut child: Child) -> JoinHandle<Option<ExitStatus>> {
    std::thread::spawn(move || {
        let pid = child.id();
        match child.wait() {
            Ok(status) => {
                debug!("Launched process {} exited with {}", pid, status);
                Some(status)
            }
            Err(e) => {
                warn!("⚠️ Could not wait for launched process {}: {}", pid, e);
                None
            }
        }
    })
}

impl SystemLauncher for NativeLauncher {
    fn open_url(&self, url: &str) -> BotResult<()> {
        open::that(url).map_err(|e| BotError::Launch(format!("failed to open {}: {}", url, e)))?;
        Self::record(&format!("Opened URL: {}", url));
        Ok(())
    }

    fn open_application(&self, directive: &AppDirective) -> BotResult<()> {
        match directive {
            AppDirective::Program(path) => spawn_detached(path, &[])?,
            AppDirective::MacApp(app) => {
                let status = Command::new("open")
                    .arg("-a")
                    .arg(app)
                    .status()
                    .map_err(|e| BotError::Launch(format!("open -a {}: {}", app, e)))?;
                if !status.success() {
                    return Err(BotError::Launch(format!("open -a {} exited with {}", app, status)));
                }
            }
        }
        Self::record(&format!("Opened application: {:?}", directive));
        Ok(())
    }

    fn spawn_by_name(&self, name: &str) -> BotResult<()> {
        spawn_detached(name, &[])?;
        Self::record(&format!("Spawned by name: {}", name));
        Ok(())
    }
}
