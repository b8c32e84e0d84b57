use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Command;
use tracing::{debug, info};

use super::{CaptionSegment, TranscriberTrait};
use crate::config::ModelConfig;
use crate::error::{LivecapError, Result};

/// JSON output format of the faster-whisper CLI
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhisperCliOutput {
    pub text: String,
    pub segments: Vec<WhisperCliSegment>,
    pub language: Option<String>,
}

/// Segment format within the CLI's JSON output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhisperCliSegment {
    pub id: u64,
    pub start: f64,
    pub end: f64,
    pub text: String,
    pub tokens: Option<Vec<i64>>,
    pub temperature: Option<f64>,
    pub avg_logprob: Option<f64>,
    pub compression_ratio: Option<f64>,
    pub no_speech_prob: Option<f64>,
}

/// Map the CLI output onto caption segments, trimming the padding the
/// model puts around each text
fn map_segments(output: WhisperCliOutput) -> Vec<CaptionSegment> {
    output
        .segments
        .into_iter()
        .map(|seg| CaptionSegment {
            start: seg.start,
            end: seg.end,
            text: seg.text.trim().to_string(),
        })
        .collect()
}

/// Transcriber shelling out to the faster-whisper CLI
pub struct WhisperCliTranscriber {
    config: ModelConfig,
}

impl WhisperCliTranscriber {
    pub fn new(config: ModelConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl TranscriberTrait for WhisperCliTranscriber {
    async fn transcribe(
        &self,
        audio_path: &Path,
        language: Option<&str>,
    ) -> Result<Vec<CaptionSegment>> {
        info!("Transcribing {}", audio_path.display());

        let temp_dir = tempfile::tempdir().map_err(|e| {
            LivecapError::Transcribe(format!("Failed to create temp directory: {}", e))
        })?;
        let output_dir = temp_dir.path();

        let mut cmd = Command::new(&self.config.binary_path);
        cmd.arg(audio_path)
            .arg("--model")
            .arg(&self.config.name)
            .arg("--device")
            .arg(&self.config.device)
            .arg("--compute_type")
            .arg(&self.config.compute_type)
            .arg("--vad_filter")
            .arg("True")
            .arg("--output_dir")
            .arg(output_dir)
            .arg("--output_format")
            .arg("json");

        if let Some(lang) = language {
            cmd.arg("--language").arg(lang);
        }

        debug!("Running speech model: {:?}", cmd);
        let output = cmd.output().map_err(|e| {
            LivecapError::Transcribe(format!(
                "Failed to execute {}: {}",
                self.config.binary_path, e
            ))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(LivecapError::Transcribe(format!(
                "Speech model failed: {}",
                stderr.trim()
            )));
        }

        let audio_filename = audio_path
            .file_stem()
            .ok_or_else(|| LivecapError::Transcribe("Invalid audio filename".to_string()))?;
        let json_file = output_dir.join(format!("{}.json", audio_filename.to_string_lossy()));

        let json_content = std::fs::read_to_string(&json_file)
            .map_err(|e| LivecapError::Transcribe(format!("Failed to read model output: {}", e)))?;

        let whisper_output: WhisperCliOutput = serde_json::from_str(&json_content)
            .map_err(|e| LivecapError::Transcribe(format!("Failed to parse model JSON: {}", e)))?;

        let segments = map_segments(whisper_output);
        info!("Transcribed {} segments", segments.len());
        Ok(segments)
    }

    fn check_availability(&self) -> Result<()> {
        let output = Command::new(&self.config.binary_path)
            .arg("--version")
            .output()
            .map_err(|e| {
                LivecapError::Config(format!(
                    "Speech model CLI '{}' not found: {}",
                    self.config.binary_path, e
                ))
            })?;

        if output.status.success() {
            info!("Speech model CLI is available");
            Ok(())
        } else {
            Err(LivecapError::Config(format!(
                "Speech model CLI '{}' version check failed",
                self.config.binary_path
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_segments_trims_text() {
        let json = r#"{
            "text": " Hello there. General Kenobi.",
            "segments": [
                {"id": 0, "start": 0.0, "end": 2.5, "text": " Hello there.",
                 "tokens": [1, 2], "temperature": 0.0, "avg_logprob": -0.3,
                 "compression_ratio": 1.1, "no_speech_prob": 0.01},
                {"id": 1, "start": 2.5, "end": 5.0, "text": " General Kenobi."}
            ],
            "language": "en"
        }"#;

        let output: WhisperCliOutput = serde_json::from_str(json).unwrap();
        let segments = map_segments(output);

        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].text, "Hello there.");
        assert_eq!(segments[0].start, 0.0);
        assert_eq!(segments[0].end, 2.5);
        assert_eq!(segments[1].text, "General Kenobi.");
    }

    #[test]
    fn test_segment_shift() {
        let mut segment = CaptionSegment {
            start: 1.0,
            end: 2.5,
            text: "hello".to_string(),
        };
        segment.shift(100.0);
        assert_eq!(segment.start, 101.0);
        assert_eq!(segment.end, 102.5);
    }
}
