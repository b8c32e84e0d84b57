// Player control boundary
//
// This module launches the media player and keeps it in sync with the
// growing subtitle file:
// - Automation: OS window automation (xdotool-based)
// - Controller: player launch and the subtitle watch loop

pub mod automation;
pub mod controller;

use std::time::Duration;

pub use automation::*;
pub use controller::*;

use crate::error::Result;

/// Handle to an attached player window
#[derive(Debug, Clone, PartialEq)]
pub struct WindowRef {
    pub id: String,
}

/// Trait for OS window automation operations
#[cfg_attr(test, mockall::automock)]
pub trait WindowAutomation: Send + Sync {
    /// Attach to a top-level window of the given process, retrying
    /// until the timeout elapses
    fn attach(&self, pid: u32, timeout: Duration) -> Result<WindowRef>;

    /// Send a key chord to a window
    fn send_keys(&self, window: &WindowRef, chord: &str) -> Result<()>;

    /// Check if the automation tool is available
    fn check_availability(&self) -> Result<()>;
}

/// Factory for creating window automation instances
pub struct AutomationFactory;

impl AutomationFactory {
    /// Create the default window automation implementation (xdotool-based)
    pub fn create_automation() -> Box<dyn WindowAutomation> {
        Box::new(automation::XdoAutomation::new())
    }
}
