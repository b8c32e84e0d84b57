use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::Result;
use crate::media::{MediaProcessorFactory, MediaProcessorTrait, Span};
use crate::subtitle::{self, SubtitleCursor};
use crate::transcribe::{TranscriberFactory, TranscriberTrait};
use crate::translate::{translate_batch, Translator, TranslatorFactory};

const SCRATCH_DIR: &str = ".livecap/scratch";
const SCRATCH_AUDIO: &str = "span_audio.wav";

/// Outcome of one transcription loop tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PollOutcome {
    /// Not enough new material accumulated; nothing was done
    Waited,
    /// A span was consumed and its captions appended
    Processed { appended: u64 },
}

/// Whether enough new video exists past the cursor to justify a span.
/// A shrunken or unprobeable duration never qualifies.
pub fn has_new_material(duration: f64, last_end: f64, min_new_duration: f64) -> bool {
    duration - last_end >= min_new_duration
}

/// The live captioning loop: probes the growing video, transcribes new
/// audio spans, optionally translates them and appends the result to
/// the subtitle file.
pub struct CaptionWorkflow {
    config: Config,
    media: Box<dyn MediaProcessorTrait>,
    transcriber: Box<dyn TranscriberTrait>,
    translator: Arc<dyn Translator>,
    scratch_audio: PathBuf,
    progress: ProgressBar,
}

impl CaptionWorkflow {
    pub fn new(config: Config) -> Result<Self> {
        let media = MediaProcessorFactory::create_processor(config.media.clone());
        let transcriber = TranscriberFactory::create_transcriber(config.model.clone());
        let translator = TranslatorFactory::create_translator(config.translation.clone());

        // Check dependencies
        media.check_availability()?;
        transcriber.check_availability()?;

        let progress = ProgressBar::new_spinner();
        progress.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap(),
        );

        Ok(Self {
            config,
            media,
            transcriber,
            translator,
            scratch_audio: Path::new(SCRATCH_DIR).join(SCRATCH_AUDIO),
            progress,
        })
    }

    #[cfg(test)]
    fn with_parts(
        config: Config,
        media: Box<dyn MediaProcessorTrait>,
        transcriber: Box<dyn TranscriberTrait>,
        translator: Arc<dyn Translator>,
        scratch_audio: PathBuf,
    ) -> Self {
        Self {
            config,
            media,
            transcriber,
            translator,
            scratch_audio,
            progress: ProgressBar::hidden(),
        }
    }

    /// Run the loop until `cancel` fires, resuming from whatever the
    /// subtitle file already contains.
    pub async fn run(&self, cancel: CancellationToken) -> Result<()> {
        let caption_path = Path::new(&self.config.video.caption_path);
        let mut cursor = subtitle::recover_cursor(caption_path).await?;
        info!(
            "Starting live captioning at {:.3}s (next index {})",
            cursor.last_end, cursor.next_index
        );

        self.progress.enable_steady_tick(Duration::from_millis(120));
        self.progress.set_message("Starting");

        let poll_interval = Duration::from_secs_f64(self.config.timing.poll_interval_secs);

        loop {
            if cancel.is_cancelled() {
                info!("Stop requested; ending transcription loop");
                break;
            }

            match self.poll_once(&mut cursor).await {
                Ok(PollOutcome::Processed { appended }) => {
                    debug!("Appended {} captions; re-checking for material", appended);
                }
                Ok(PollOutcome::Waited) => {
                    tokio::select! {
                        _ = cancel.cancelled() => {
                            info!("Stop requested; ending transcription loop");
                            break;
                        }
                        _ = tokio::time::sleep(poll_interval) => {}
                    }
                }
                Err(e) => {
                    self.progress.finish_and_clear();
                    return Err(e);
                }
            }
        }

        self.progress.finish_and_clear();
        Ok(())
    }

    /// One tick of the loop: probe, and when enough new material has
    /// accumulated, extract/transcribe/translate/append and advance the
    /// cursor past the consumed span.
    pub async fn poll_once(&self, cursor: &mut SubtitleCursor) -> Result<PollOutcome> {
        let video_path = Path::new(&self.config.video.input_path);
        let caption_path = Path::new(&self.config.video.caption_path);

        let duration = match self.media.probe_duration(video_path).await {
            Ok(duration) => duration,
            Err(e) => {
                warn!("Duration probe failed, treating as zero: {}", e);
                0.0
            }
        };

        if !has_new_material(
            duration,
            cursor.last_end,
            self.config.timing.min_new_duration_secs,
        ) {
            debug!(
                "Insufficient new material: {:.3}s available, cursor at {:.3}s",
                duration, cursor.last_end
            );
            self.progress
                .set_message(format!("waiting ({:.1}s captioned)", cursor.last_end));
            return Ok(PollOutcome::Waited);
        }

        let span = Span::new(cursor.last_end, duration);
        info!("Processing span {:.3}s..{:.3}s", span.start, span.end);

        self.progress
            .set_message(format!("Extracting {:.1}s..{:.1}s", span.start, span.end));
        if let Some(parent) = self.scratch_audio.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        self.media
            .extract_span(video_path, &self.scratch_audio, span)
            .await?;

        self.progress.set_message("Transcribing");
        let language = self.config.translation.source_lang.as_deref();
        let mut segments = self.transcriber.transcribe(&self.scratch_audio, language).await?;

        if self.config.translation.enabled && !segments.is_empty() {
            self.progress.set_message("Translating");
            info!("Translating {} segments", segments.len());
            if let Err(e) = translate_batch(
                Arc::clone(&self.translator),
                &mut segments,
                &self.config.translation,
            )
            .await
            {
                warn!("Translation failed, keeping original text: {}", e);
            }
        }

        for segment in &mut segments {
            segment.shift(span.start);
        }

        self.progress.set_message("Saving");
        let next_index = subtitle::append_segments(caption_path, &segments, cursor.next_index).await?;

        let appended = next_index - cursor.next_index;
        cursor.last_end = span.end;
        cursor.next_index = next_index;

        info!(
            "Cursor advanced to {:.3}s (next index {})",
            cursor.last_end, cursor.next_index
        );
        Ok(PollOutcome::Processed { appended })
    }
}
