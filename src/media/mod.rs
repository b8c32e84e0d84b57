// Media probing and extraction boundary
//
// This module wraps the external ffmpeg/ffprobe tools:
// - Commands: command builders and execution
// - Processor: ffprobe duration probing and ffmpeg span extraction

pub mod commands;
pub mod processor;

use async_trait::async_trait;
use std::path::Path;

pub use commands::*;
pub use processor::*;

use crate::config::MediaConfig;
use crate::error::Result;

/// A contiguous time interval of source video, in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Span {
    pub start: f64,
    pub end: f64,
}

impl Span {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Main trait for media probing and extraction operations
#[async_trait]
pub trait MediaProcessorTrait: Send + Sync {
    /// Probe the total duration of a possibly still-growing video file.
    /// Returns 0.0 when the container does not report a duration yet.
    async fn probe_duration(&self, video_path: &Path) -> Result<f64>;

    /// Extract the audio of `span` into a WAV file the speech model can read
    async fn extract_span(&self, video_path: &Path, audio_path: &Path, span: Span) -> Result<()>;

    /// Check if the media tools are available
    fn check_availability(&self) -> Result<()>;
}

/// Factory for creating media processor instances
pub struct MediaProcessorFactory;

impl MediaProcessorFactory {
    /// Create the default media processor implementation (FFmpeg-based)
    pub fn create_processor(config: MediaConfig) -> Box<dyn MediaProcessorTrait> {
        Box::new(processor::FfmpegProcessor::new(config))
    }
}
