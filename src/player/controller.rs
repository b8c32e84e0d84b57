use std::path::Path;
use std::time::{Duration, SystemTime};
use tokio::process::{Child, Command};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{AutomationFactory, WindowAutomation};
use crate::config::Config;
use crate::error::{LivecapError, Result};

/// Lifecycle of the watch loop
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WatchState {
    Starting,
    Attached,
    Watching,
    ReloadSent,
    Stopped,
}

/// Tracks the subtitle file's modification time across ticks and
/// decides when a reload is due.
#[derive(Debug)]
pub struct MtimeTracker {
    last: Option<SystemTime>,
}

impl MtimeTracker {
    pub fn new(initial: Option<SystemTime>) -> Self {
        Self { last: initial }
    }

    /// Record an observed modification time; returns true when it
    /// differs from the previously recorded value.
    pub fn observe(&mut self, current: SystemTime) -> bool {
        if self.last == Some(current) {
            return false;
        }
        self.last = Some(current);
        true
    }
}

/// Launches the media player and nudges it whenever the subtitle file
/// changes on disk.
pub struct PlayerController {
    config: Config,
    automation: Box<dyn WindowAutomation>,
}

impl PlayerController {
    pub fn new(config: Config) -> Result<Self> {
        let automation = AutomationFactory::create_automation();
        automation.check_availability()?;
        Ok(Self { config, automation })
    }

    #[cfg(test)]
    fn with_automation(config: Config, automation: Box<dyn WindowAutomation>) -> Self {
        Self { config, automation }
    }

    /// Run the player until it exits or `cancel` fires.
    ///
    /// The baseline modification time is recorded before the player is
    /// launched, so captions appended during startup still trigger a
    /// reload on the first tick.
    pub async fn run(&self, cancel: CancellationToken) -> Result<()> {
        let caption_path = Path::new(&self.config.video.caption_path).to_path_buf();
        let mut tracker = MtimeTracker::new(read_mtime(&caption_path).await);
        let mut state = WatchState::Starting;

        let mut child = self.launch()?;
        let pid = child.id().ok_or_else(|| {
            LivecapError::Attach("Player exited before a window could be attached".to_string())
        })?;

        let window = self.automation.attach(
            pid,
            Duration::from_secs(self.config.player.attach_timeout_secs),
        )?;
        transition(&mut state, WatchState::Attached);
        info!("Attached to player window {}", window.id);

        let poll_interval = Duration::from_secs_f64(self.config.timing.poll_interval_secs);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Stop requested; leaving the player running");
                    transition(&mut state, WatchState::Stopped);
                    break;
                }
                _ = tokio::time::sleep(poll_interval) => {}
            }

            match child.try_wait() {
                Ok(Some(status)) => {
                    info!("Player exited with {}", status);
                    transition(&mut state, WatchState::Stopped);
                    break;
                }
                Ok(None) => {}
                Err(e) => {
                    warn!("Could not poll player process: {}", e);
                    continue;
                }
            }

            let mtime = match tokio::fs::metadata(&caption_path).await {
                Ok(meta) => match meta.modified() {
                    Ok(mtime) => mtime,
                    Err(e) => {
                        warn!("Could not read caption modification time: {}", e);
                        continue;
                    }
                },
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    debug!("Caption file not present yet");
                    continue;
                }
                Err(e) => {
                    warn!("Could not read caption metadata: {}", e);
                    continue;
                }
            };

            if tracker.observe(mtime) {
                match self
                    .automation
                    .send_keys(&window, &self.config.player.reload_keys)
                {
                    Ok(()) => {
                        transition(&mut state, WatchState::ReloadSent);
                        info!("Subtitle file changed; reload sent");
                    }
                    Err(e) => warn!("Failed to send reload chord: {}", e),
                }
            } else {
                transition(&mut state, WatchState::Watching);
            }
        }

        debug!("Watch loop finished in state {:?}", state);
        Ok(())
    }

    fn launch(&self) -> Result<Child> {
        let player = &self.config.player.executable_path;
        let mut cmd = Command::new(player);
        cmd.arg(&self.config.video.input_path);
        if let Some(flag) = &self.config.player.subtitle_flag {
            cmd.arg(flag);
        }
        cmd.arg(&self.config.video.caption_path);

        info!(
            "Launching player: {} {}",
            player, self.config.video.input_path
        );
        cmd.spawn()
            .map_err(|e| LivecapError::Launch(format!("Failed to start player '{}': {}", player, e)))
    }
}

fn transition(state: &mut WatchState, next: WatchState) {
    if *state != next {
        debug!("Player state: {:?} -> {:?}", *state, next);
        *state = next;
    }
}

async fn read_mtime(path: &Path) -> Option<SystemTime> {
    match tokio::fs::metadata(path).await {
        Ok(meta) => meta.modified().ok(),
        Err(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::Instant;

    use crate::player::{MockWindowAutomation, WindowRef};

    fn controller_config() -> Config {
        let mut config = Config::default();
        config.player.executable_path = "/nonexistent/player".to_string();
        config.video.input_path = "/tmp/live.mp4".to_string();
        config.video.caption_path = "/tmp/live.srt".to_string();
        config
    }

    fn stub_player(dir: &Path, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("player.sh");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn watch_config(player: &Path, caption: &Path) -> Config {
        let mut config = Config::default();
        config.player.executable_path = player.to_string_lossy().to_string();
        config.video.input_path = "/tmp/live.mp4".to_string();
        config.video.caption_path = caption.to_string_lossy().to_string();
        config.timing.poll_interval_secs = 0.05;
        config
    }

    async fn place_caption(path: &Path, contents: &str) {
        // Write then rename so the watcher never sees a half-written file
        let tmp = path.with_extension("tmp");
        tokio::fs::write(&tmp, contents).await.unwrap();
        tokio::fs::rename(&tmp, path).await.unwrap();
    }

    #[test]
    fn test_tracker_reports_each_distinct_mtime_once() {
        let t1 = SystemTime::UNIX_EPOCH + Duration::from_secs(100);
        let t2 = t1 + Duration::from_secs(5);

        let mut tracker = MtimeTracker::new(None);
        assert!(tracker.observe(t1));
        assert!(!tracker.observe(t1));
        assert!(tracker.observe(t2));
        assert!(!tracker.observe(t2));
    }

    #[test]
    fn test_tracker_ignores_baseline_mtime() {
        let t0 = SystemTime::UNIX_EPOCH + Duration::from_secs(50);
        let t1 = t0 + Duration::from_secs(5);

        let mut tracker = MtimeTracker::new(Some(t0));
        assert!(!tracker.observe(t0));
        assert!(tracker.observe(t1));
    }

    #[test]
    fn test_one_reload_per_distinct_mtime() {
        let mut mock = MockWindowAutomation::new();
        mock.expect_send_keys().times(2).returning(|_, _| Ok(()));

        let window = WindowRef {
            id: "0x1a2b".to_string(),
        };
        let t1 = SystemTime::UNIX_EPOCH + Duration::from_secs(100);
        let t2 = t1 + Duration::from_secs(5);

        let mut tracker = MtimeTracker::new(None);
        for observed in [t1, t1, t2, t2, t2] {
            if tracker.observe(observed) {
                mock.send_keys(&window, "ctrl+alt+shift+r").unwrap();
            }
        }
    }

    #[test]
    fn test_transition_is_idempotent() {
        let mut state = WatchState::Starting;
        transition(&mut state, WatchState::Attached);
        assert_eq!(state, WatchState::Attached);
        transition(&mut state, WatchState::Attached);
        assert_eq!(state, WatchState::Attached);
    }

    #[tokio::test]
    async fn test_launch_missing_player_fails() {
        let controller = PlayerController::with_automation(
            controller_config(),
            Box::new(MockWindowAutomation::new()),
        );

        let result = controller.launch();
        assert!(matches!(result, Err(LivecapError::Launch(_))));
    }

    #[tokio::test]
    async fn test_watch_loop_reloads_per_distinct_mtime() {
        let dir = tempfile::tempdir().unwrap();
        let caption_path = dir.path().join("live.srt");
        let player = stub_player(dir.path(), "sleep 1.5");

        let mut mock = MockWindowAutomation::new();
        mock.expect_attach().times(1).returning(|_, _| {
            Ok(WindowRef {
                id: "0x1a2b".to_string(),
            })
        });
        mock.expect_send_keys().times(2).returning(|_, _| Ok(()));

        let controller = PlayerController::with_automation(
            watch_config(&player, &caption_path),
            Box::new(mock),
        );

        // The caption file appears, disappears, and reappears while the
        // loop is polling; only the two distinct mtimes earn a reload.
        let written = caption_path.clone();
        let writer = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(300)).await;
            place_caption(&written, "1\n00:00:00,000 --> 00:00:04,200\nfirst\n\n").await;
            tokio::time::sleep(Duration::from_millis(300)).await;
            tokio::fs::remove_file(&written).await.unwrap();
            tokio::time::sleep(Duration::from_millis(300)).await;
            place_caption(&written, "1\n00:00:00,000 --> 00:00:04,200\nfirst\n\n").await;
        });

        controller.run(CancellationToken::new()).await.unwrap();
        writer.await.unwrap();
    }

    #[tokio::test]
    async fn test_watch_loop_stops_on_cancel() {
        let dir = tempfile::tempdir().unwrap();
        let caption_path = dir.path().join("live.srt");
        let player = stub_player(dir.path(), "sleep 5");

        let mut mock = MockWindowAutomation::new();
        mock.expect_attach().times(1).returning(|_, _| {
            Ok(WindowRef {
                id: "0x1a2b".to_string(),
            })
        });

        let controller = PlayerController::with_automation(
            watch_config(&player, &caption_path),
            Box::new(mock),
        );

        let cancel = CancellationToken::new();
        let stopper = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            stopper.cancel();
        });

        let started = Instant::now();
        controller.run(cancel).await.unwrap();
        // Well before the stub player's five second lifetime
        assert!(started.elapsed() < Duration::from_secs(4));
    }
}
