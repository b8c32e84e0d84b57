use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use std::process::Command;
use tracing::{debug, info};

use super::{MediaCommandBuilder, MediaProcessorTrait, Span};
use crate::config::MediaConfig;
use crate::error::{LivecapError, Result};

/// Concrete media processor shelling out to ffmpeg and ffprobe
pub struct FfmpegProcessor {
    config: MediaConfig,
    command_builder: MediaCommandBuilder,
}

impl FfmpegProcessor {
    /// Create a new media processor implementation
    pub fn new(config: MediaConfig) -> Self {
        let command_builder = MediaCommandBuilder::new(&config.ffmpeg_path, &config.ffprobe_path);

        Self {
            config,
            command_builder,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

/// Pull the duration out of ffprobe's JSON output. A container that
/// does not report one yet (still being written) yields 0.0.
fn parse_probe_duration(stdout: &str) -> Result<f64> {
    let probe: ProbeOutput = serde_json::from_str(stdout)
        .map_err(|e| LivecapError::Probe(format!("Unreadable probe output: {}", e)))?;

    let duration = probe
        .format
        .and_then(|f| f.duration)
        .and_then(|d| d.parse::<f64>().ok())
        .unwrap_or(0.0);

    Ok(duration)
}

#[async_trait]
impl MediaProcessorTrait for FfmpegProcessor {
    async fn probe_duration(&self, video_path: &Path) -> Result<f64> {
        debug!("Probing duration of {}", video_path.display());

        let command = self.command_builder.probe_format(video_path);
        let stdout = command.execute_stdout().await?;
        let duration = parse_probe_duration(&stdout)?;

        debug!("Probed duration: {:.3}s", duration);
        Ok(duration)
    }

    async fn extract_span(&self, video_path: &Path, audio_path: &Path, span: Span) -> Result<()> {
        if span.duration() <= 0.0 {
            return Err(LivecapError::Extraction(format!(
                "Refusing to extract empty span {:.3}s..{:.3}s",
                span.start, span.end
            )));
        }

        info!(
            "Extracting audio span {:.3}s..{:.3}s from {} to {}",
            span.start,
            span.end,
            video_path.display(),
            audio_path.display()
        );

        let command = self
            .command_builder
            .extract_span(video_path, audio_path, span);
        command.execute().await?;

        info!("Audio extraction completed");
        Ok(())
    }

    fn check_availability(&self) -> Result<()> {
        for binary in [&self.config.ffmpeg_path, &self.config.ffprobe_path] {
            let output = Command::new(binary)
                .arg("-version")
                .output()
                .map_err(|e| {
                    LivecapError::Config(format!("Media tool '{}' not found: {}", binary, e))
                })?;

            if !output.status.success() {
                return Err(LivecapError::Config(format!(
                    "Media tool '{}' version check failed",
                    binary
                )));
            }
        }

        info!("Media tools are available");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_probe_duration() {
        let stdout = r#"{"format": {"filename": "live.mp4", "duration": "123.456000"}}"#;
        assert_eq!(parse_probe_duration(stdout).unwrap(), 123.456);
    }

    #[test]
    fn test_parse_probe_duration_missing_field() {
        let stdout = r#"{"format": {"filename": "live.mp4"}}"#;
        assert_eq!(parse_probe_duration(stdout).unwrap(), 0.0);

        let stdout = r#"{}"#;
        assert_eq!(parse_probe_duration(stdout).unwrap(), 0.0);
    }

    #[test]
    fn test_parse_probe_duration_rejects_garbage() {
        assert!(parse_probe_duration("not json").is_err());
    }

    #[tokio::test]
    async fn test_extract_rejects_empty_span() {
        let processor = FfmpegProcessor::new(MediaConfig::default());
        let result = processor
            .extract_span(
                Path::new("live.mp4"),
                Path::new("span.wav"),
                Span::new(10.0, 10.0),
            )
            .await;
        assert!(matches!(result, Err(LivecapError::Extraction(_))));
    }
}
