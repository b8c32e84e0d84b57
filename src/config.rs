use crate::error::{LivecapError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

fn default_reload_keys() -> String {
    "ctrl+alt+shift+r".to_string()
}

fn default_attach_timeout() -> u64 {
    10
}

fn default_min_new_duration() -> f64 {
    10.0
}

fn default_poll_interval() -> f64 {
    5.0
}

fn default_batch_size() -> usize {
    10
}

fn default_worker_count() -> usize {
    4
}

fn default_translate_endpoint() -> String {
    "https://translate.googleapis.com/translate_a/single".to_string()
}

fn default_whisper_binary() -> String {
    "whisper-ctranslate2".to_string()
}

fn default_model_name() -> String {
    "small".to_string()
}

fn default_model_device() -> String {
    "auto".to_string()
}

fn default_compute_type() -> String {
    "auto".to_string()
}

fn default_ffmpeg_path() -> String {
    "ffmpeg".to_string()
}

fn default_ffprobe_path() -> String {
    "ffprobe".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub player: PlayerConfig,
    #[serde(default)]
    pub video: VideoConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub translation: TranslationConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub media: MediaConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Path to the media player executable
    #[serde(default)]
    pub executable_path: String,
    /// Flag inserted before the subtitle path on the player command line,
    /// for players that need one (e.g. "/sub"); omitted when unset
    #[serde(default)]
    pub subtitle_flag: Option<String>,
    /// Key chord sent to the player window to reload subtitles (xdotool syntax)
    #[serde(default = "default_reload_keys")]
    pub reload_keys: String,
    /// Seconds to keep retrying window attachment after launch
    #[serde(default = "default_attach_timeout")]
    pub attach_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoConfig {
    /// Path to the growing video file
    #[serde(default)]
    pub input_path: String,
    /// Path to the subtitle file both processes share
    #[serde(default)]
    pub caption_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Minimum seconds of new video required before transcribing a span
    #[serde(default = "default_min_new_duration")]
    pub min_new_duration_secs: f64,
    /// Seconds to sleep between ticks in both polling loops
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationConfig {
    /// Whether caption texts are machine-translated after transcription
    #[serde(default)]
    pub enabled: bool,
    /// Maximum number of segments joined into one translation request
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Source language code (e.g. "en"); required when enabled
    #[serde(default)]
    pub source_lang: Option<String>,
    /// Target language code (e.g. "ja"); required when enabled
    #[serde(default)]
    pub target_lang: Option<String>,
    /// Maximum concurrent translation requests
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,
    /// Translation service endpoint URL
    #[serde(default = "default_translate_endpoint")]
    pub endpoint: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Path to the speech-to-text CLI binary
    #[serde(default = "default_whisper_binary")]
    pub binary_path: String,
    /// Model to transcribe with (e.g. "small", "large-v2")
    #[serde(default = "default_model_name")]
    pub name: String,
    /// Compute device ("auto", "cpu", "cuda")
    #[serde(default = "default_model_device")]
    pub device: String,
    /// Numeric precision ("auto", "int8", "float16")
    #[serde(default = "default_compute_type")]
    pub compute_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Path to the ffmpeg binary
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: String,
    /// Path to the ffprobe binary
    #[serde(default = "default_ffprobe_path")]
    pub ffprobe_path: String,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            executable_path: String::new(),
            subtitle_flag: None,
            reload_keys: default_reload_keys(),
            attach_timeout_secs: default_attach_timeout(),
        }
    }
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            input_path: String::new(),
            caption_path: String::new(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            min_new_duration_secs: default_min_new_duration(),
            poll_interval_secs: default_poll_interval(),
        }
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            batch_size: default_batch_size(),
            source_lang: None,
            target_lang: None,
            worker_count: default_worker_count(),
            endpoint: default_translate_endpoint(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            binary_path: default_whisper_binary(),
            name: default_model_name(),
            device: default_model_device(),
            compute_type: default_compute_type(),
        }
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            ffprobe_path: default_ffprobe_path(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            player: PlayerConfig::default(),
            video: VideoConfig::default(),
            timing: TimingConfig::default(),
            translation: TranslationConfig::default(),
            model: ModelConfig::default(),
            media: MediaConfig::default(),
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| LivecapError::Config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| LivecapError::Config(format!("Failed to parse config file: {}", e)))
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| LivecapError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| LivecapError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Validates the settings the transcription loop depends on.
    pub fn validate_transcribe(&self) -> Result<()> {
        self.validate_paths()?;
        if self.timing.min_new_duration_secs <= 0.0 {
            return Err(LivecapError::Config(
                "timing.min_new_duration_secs must be greater than zero".to_string(),
            ));
        }
        if self.timing.poll_interval_secs <= 0.0 {
            return Err(LivecapError::Config(
                "timing.poll_interval_secs must be greater than zero".to_string(),
            ));
        }
        if self.translation.enabled {
            if self.translation.batch_size == 0 {
                return Err(LivecapError::Config(
                    "translation.batch_size must be at least 1".to_string(),
                ));
            }
            if self.translation.worker_count == 0 {
                return Err(LivecapError::Config(
                    "translation.worker_count must be at least 1".to_string(),
                ));
            }
            self.translation.language_pair()?;
        }
        Ok(())
    }

    /// Validates the settings the player controller depends on.
    pub fn validate_play(&self) -> Result<()> {
        self.validate_paths()?;
        if self.player.executable_path.is_empty() {
            return Err(LivecapError::Config(
                "player.executable_path is not set".to_string(),
            ));
        }
        if self.timing.poll_interval_secs <= 0.0 {
            return Err(LivecapError::Config(
                "timing.poll_interval_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    fn validate_paths(&self) -> Result<()> {
        if self.video.input_path.is_empty() {
            return Err(LivecapError::Config(
                "video.input_path is not set".to_string(),
            ));
        }
        if self.video.caption_path.is_empty() {
            return Err(LivecapError::Config(
                "video.caption_path is not set".to_string(),
            ));
        }
        Ok(())
    }
}

impl TranslationConfig {
    /// Returns the configured language pair, or a configuration error
    /// when either side is missing.
    pub fn language_pair(&self) -> Result<(&str, &str)> {
        let source = self
            .source_lang
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                LivecapError::Config("translation.source_lang is not set".to_string())
            })?;
        let target = self
            .target_lang
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                LivecapError::Config("translation.target_lang is not set".to_string())
            })?;
        Ok((source, target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        let mut config = Config::default();
        config.video.input_path = "/tmp/input.mp4".to_string();
        config.video.caption_path = "/tmp/captions.srt".to_string();
        config.player.executable_path = "/usr/bin/mpv".to_string();
        config
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let content = r#"
[video]
input_path = "movie.mkv"
caption_path = "movie.srt"
"#;
        let config: Config = toml::from_str(content).unwrap();
        assert_eq!(config.video.input_path, "movie.mkv");
        assert_eq!(config.timing.min_new_duration_secs, 10.0);
        assert_eq!(config.player.reload_keys, "ctrl+alt+shift+r");
        assert_eq!(config.model.binary_path, "whisper-ctranslate2");
        assert!(!config.translation.enabled);
    }

    #[test]
    fn test_default_round_trips_through_toml() {
        let config = valid_config();
        let content = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&content).unwrap();
        assert_eq!(parsed.video.input_path, config.video.input_path);
        assert_eq!(
            parsed.timing.poll_interval_secs,
            config.timing.poll_interval_secs
        );
    }

    #[test]
    fn test_validate_rejects_missing_paths() {
        let config = Config::default();
        assert!(config.validate_transcribe().is_err());
        assert!(config.validate_play().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_delay() {
        let mut config = valid_config();
        config.timing.min_new_duration_secs = 0.0;
        assert!(config.validate_transcribe().is_err());
    }

    #[test]
    fn test_validate_requires_languages_when_translating() {
        let mut config = valid_config();
        config.translation.enabled = true;
        assert!(config.validate_transcribe().is_err());

        config.translation.source_lang = Some("en".to_string());
        config.translation.target_lang = Some("ja".to_string());
        assert!(config.validate_transcribe().is_ok());
    }

    #[test]
    fn test_validate_play_requires_player() {
        let mut config = valid_config();
        config.player.executable_path = String::new();
        assert!(config.validate_play().is_err());
    }
}
