use std::process::Command;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use super::{WindowAutomation, WindowRef};
use crate::error::{LivecapError, Result};

const ATTACH_RETRY_STEP: Duration = Duration::from_millis(200);

/// Window automation shelling out to xdotool
pub struct XdoAutomation {
    xdotool_path: String,
}

impl XdoAutomation {
    pub fn new() -> Self {
        Self {
            xdotool_path: "xdotool".to_string(),
        }
    }
}

impl Default for XdoAutomation {
    fn default() -> Self {
        Self::new()
    }
}

impl WindowAutomation for XdoAutomation {
    fn attach(&self, pid: u32, timeout: Duration) -> Result<WindowRef> {
        debug!("Attaching to window of pid {} (timeout {:?})", pid, timeout);
        let deadline = Instant::now() + timeout;

        loop {
            let output = Command::new(&self.xdotool_path)
                .args(["search", "--pid", &pid.to_string()])
                .output()
                .map_err(|e| {
                    LivecapError::Attach(format!("Failed to execute xdotool: {}", e))
                })?;

            // Nonzero exit just means no window yet; keep retrying
            if output.status.success() {
                let stdout = String::from_utf8_lossy(&output.stdout);
                if let Some(id) = stdout.lines().map(str::trim).find(|l| !l.is_empty()) {
                    debug!("Attached to window {}", id);
                    return Ok(WindowRef { id: id.to_string() });
                }
            }

            if Instant::now() >= deadline {
                return Err(LivecapError::Attach(format!(
                    "No window found for pid {} within {:?}",
                    pid, timeout
                )));
            }
            std::thread::sleep(ATTACH_RETRY_STEP);
        }
    }

    fn send_keys(&self, window: &WindowRef, chord: &str) -> Result<()> {
        debug!("Sending '{}' to window {}", chord, window.id);

        let output = Command::new(&self.xdotool_path)
            .args(["key", "--window", &window.id, chord])
            .output()
            .map_err(|e| LivecapError::Attach(format!("Failed to execute xdotool: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(LivecapError::Attach(format!(
                "Key send to window {} failed: {}",
                window.id,
                stderr.trim()
            )));
        }

        Ok(())
    }

    fn check_availability(&self) -> Result<()> {
        let output = Command::new(&self.xdotool_path)
            .arg("--version")
            .output()
            .map_err(|e| {
                LivecapError::Config(format!(
                    "Automation tool '{}' not found: {}",
                    self.xdotool_path, e
                ))
            })?;

        if output.status.success() {
            info!("Window automation tool is available");
            Ok(())
        } else {
            Err(LivecapError::Config(format!(
                "Automation tool '{}' version check failed",
                self.xdotool_path
            )))
        }
    }
}
