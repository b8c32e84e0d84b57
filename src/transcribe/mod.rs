// Speech-to-text boundary
//
// This module wraps the external speech model behind a trait:
// - WhisperCli: faster-whisper command line implementation
//
// To add a new speech service:
// 1. Create service-specific data structures for parsing its output
// 2. Implement TranscriberTrait for the service
// 3. Update the factory to create your implementation

pub mod whisper_cli;

use async_trait::async_trait;
use std::path::Path;

use crate::config::ModelConfig;
use crate::error::Result;

/// One timed line of transcribed (and optionally translated) text.
/// Offsets are relative to the transcribed audio until shifted.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

impl CaptionSegment {
    /// Move both offsets forward, making span-relative times absolute
    pub fn shift(&mut self, offset: f64) {
        self.start += offset;
        self.end += offset;
    }
}

/// Main trait for transcription operations
#[async_trait]
pub trait TranscriberTrait: Send + Sync {
    /// Transcribe an audio file into ordered caption segments, with
    /// voice-activity filtering enabled
    async fn transcribe(
        &self,
        audio_path: &Path,
        language: Option<&str>,
    ) -> Result<Vec<CaptionSegment>>;

    /// Check if the speech model CLI is available
    fn check_availability(&self) -> Result<()>;
}

/// Factory for creating transcriber instances
pub struct TranscriberFactory;

impl TranscriberFactory {
    /// Create the default transcriber implementation (faster-whisper CLI)
    pub fn create_transcriber(config: ModelConfig) -> Box<dyn TranscriberTrait> {
        Box::new(whisper_cli::WhisperCliTranscriber::new(config))
    }
}
