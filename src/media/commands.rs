use std::path::Path;
use std::process::Command;
use tracing::debug;

use crate::error::{LivecapError, Result};
use crate::media::Span;

/// Abstract media tool command representation.
///
/// `fail_with` picks the error variant execution failures map to, so a
/// failed probe and a failed extraction surface as different errors.
#[derive(Debug, Clone)]
pub struct MediaCommand {
    pub binary_path: String,
    pub args: Vec<String>,
    pub description: String,
    fail_with: fn(String) -> LivecapError,
}

impl MediaCommand {
    /// Create a new media tool command
    pub fn new<S1: Into<String>, S2: Into<String>>(
        binary_path: S1,
        description: S2,
        fail_with: fn(String) -> LivecapError,
    ) -> Self {
        Self {
            binary_path: binary_path.into(),
            args: Vec::new(),
            description: description.into(),
            fail_with,
        }
    }

    /// Add an argument
    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(|s| s.into()));
        self
    }

    /// Add input file
    pub fn input<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg("-i").arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Add output file
    pub fn output<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Force overwrite output
    pub fn overwrite(self) -> Self {
        self.arg("-y")
    }

    /// Seek to a start position (placed before the input for fast seeking)
    pub fn seek(self, seconds: f64) -> Self {
        self.arg("-ss").arg(seconds.to_string())
    }

    /// Stop reading at a position
    pub fn until(self, seconds: f64) -> Self {
        self.arg("-to").arg(seconds.to_string())
    }

    /// Set audio codec
    pub fn audio_codec<S: Into<String>>(self, codec: S) -> Self {
        self.arg("-c:a").arg(codec)
    }

    /// Disable video
    pub fn no_video(self) -> Self {
        self.arg("-vn")
    }

    /// Set audio sample rate
    pub fn audio_sample_rate(self, rate: u32) -> Self {
        self.arg("-ar").arg(rate.to_string())
    }

    /// Set audio channels
    pub fn audio_channels(self, channels: u32) -> Self {
        self.arg("-ac").arg(channels.to_string())
    }

    /// Execute the command, discarding its output
    pub async fn execute(&self) -> Result<()> {
        self.run().await.map(|_| ())
    }

    /// Execute the command and return its captured stdout
    pub async fn execute_stdout(&self) -> Result<String> {
        let output = self.run().await?;
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    async fn run(&self) -> Result<std::process::Output> {
        debug!(
            "Executing media tool command: {} {:?}",
            self.binary_path, self.args
        );
        debug!("Description: {}", self.description);

        let mut cmd = Command::new(&self.binary_path);
        cmd.args(&self.args);

        let output = cmd.output().map_err(|e| {
            (self.fail_with)(format!("Failed to execute {}: {}", self.binary_path, e))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err((self.fail_with)(format!(
                "{} failed: {}",
                self.description,
                stderr.trim()
            )));
        }

        Ok(output)
    }
}

/// Builder for the media tool invocations the captioning loop needs
pub struct MediaCommandBuilder {
    ffmpeg_path: String,
    ffprobe_path: String,
}

impl MediaCommandBuilder {
    /// Create a new command builder
    pub fn new<S1: Into<String>, S2: Into<String>>(ffmpeg_path: S1, ffprobe_path: S2) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            ffprobe_path: ffprobe_path.into(),
        }
    }

    /// Build a container-format probe command with JSON output
    pub fn probe_format<P: AsRef<Path>>(&self, video_path: P) -> MediaCommand {
        MediaCommand::new(&self.ffprobe_path, "Duration probe", LivecapError::Probe)
            .arg("-v")
            .arg("error")
            .arg("-print_format")
            .arg("json")
            .arg("-show_format")
            .output(video_path)
    }

    /// Build a span extraction command producing 16 kHz mono PCM audio
    pub fn extract_span<P: AsRef<Path>>(
        &self,
        video_path: P,
        audio_path: P,
        span: Span,
    ) -> MediaCommand {
        MediaCommand::new(&self.ffmpeg_path, "Span extraction", LivecapError::Extraction)
            .seek(span.start)
            .until(span.end)
            .input(video_path)
            .no_video()
            .audio_codec("pcm_s16le")
            .audio_sample_rate(16000)
            .audio_channels(1)
            .overwrite()
            .output(audio_path)
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_format_args() {
        let builder = MediaCommandBuilder::new("ffmpeg", "ffprobe");
        let command = builder.probe_format("live.mp4");

        assert_eq!(command.binary_path, "ffprobe");
        assert_eq!(
            command.args,
            vec![
                "-v",
                "error",
                "-print_format",
                "json",
                "-show_format",
                "live.mp4"
            ]
        );
    }

    #[test]
    fn test_extract_span_args() {
        let builder = MediaCommandBuilder::new("ffmpeg", "ffprobe");
        let command = builder.extract_span("live.mp4", "span.wav", Span::new(100.0, 131.5));

        assert_eq!(command.binary_path, "ffmpeg");
        assert_eq!(
            command.args,
            vec![
                "-ss", "100", "-to", "131.5", "-i", "live.mp4", "-vn", "-c:a", "pcm_s16le",
                "-ar", "16000", "-ac", "1", "-y", "span.wav"
            ]
        );
    }
}
