use std::path::Path;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::error::{LivecapError, Result};
use crate::transcribe::CaptionSegment;

/// Resume position derived from the subtitle file: the end time of the
/// last written entry and the index the next entry must use.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubtitleCursor {
    pub last_end: f64,
    pub next_index: u64,
}

impl SubtitleCursor {
    pub fn start() -> Self {
        Self {
            last_end: 0.0,
            next_index: 1,
        }
    }
}

/// Recover the processing cursor from an existing subtitle file.
///
/// An absent or empty file yields the starting cursor; a present file
/// must end with a well-formed block or resuming would corrupt the
/// index sequence.
pub async fn recover_cursor<P: AsRef<Path>>(path: P) -> Result<SubtitleCursor> {
    let path = path.as_ref();
    let content = match fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(SubtitleCursor::start());
        }
        Err(e) => return Err(LivecapError::Io(e)),
    };

    let content = content.replace("\r\n", "\n");
    let last_block = match content.rsplit("\n\n").find(|b| !b.trim().is_empty()) {
        Some(block) => block,
        None => return Ok(SubtitleCursor::start()),
    };

    let cursor = parse_block_cursor(last_block)?;
    debug!(
        "Recovered subtitle cursor: end={:.3}s next_index={}",
        cursor.last_end, cursor.next_index
    );
    Ok(cursor)
}

fn parse_block_cursor(block: &str) -> Result<SubtitleCursor> {
    let mut lines = block.trim().lines();

    let index_line = lines
        .next()
        .ok_or_else(|| LivecapError::Subtitle("Empty subtitle block".to_string()))?;
    let index: u64 = index_line.trim().parse().map_err(|_| {
        LivecapError::Subtitle(format!("Invalid subtitle index: {}", index_line.trim()))
    })?;

    let timing_line = lines.next().ok_or_else(|| {
        LivecapError::Subtitle(format!("Subtitle block {} has no timing line", index))
    })?;
    let end_part = timing_line.split(" --> ").nth(1).ok_or_else(|| {
        LivecapError::Subtitle(format!("Invalid timing line: {}", timing_line.trim()))
    })?;
    let last_end = parse_srt_time(end_part)?;

    Ok(SubtitleCursor {
        last_end,
        next_index: index + 1,
    })
}

/// Append segments as SRT blocks numbered from `start_index`, returning
/// the index one past the last written block.
///
/// The whole chunk is assembled in memory and written with a single
/// call so a concurrent reader never observes a partial block. An empty
/// segment list returns without opening the file, leaving the
/// modification time alone.
pub async fn append_segments<P: AsRef<Path>>(
    path: P,
    segments: &[CaptionSegment],
    start_index: u64,
) -> Result<u64> {
    if segments.is_empty() {
        return Ok(start_index);
    }

    let mut srt_content = String::new();
    for (offset, segment) in segments.iter().enumerate() {
        let start_time = format_srt_time(segment.start);
        let end_time = format_srt_time(segment.end);

        srt_content.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            start_index + offset as u64,
            start_time,
            end_time,
            segment.text.trim()
        ));
    }

    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path.as_ref())
        .await?;
    file.write_all(srt_content.as_bytes()).await?;
    file.flush().await?;

    Ok(start_index + segments.len() as u64)
}

/// Format time in seconds to SRT time format (HH:MM:SS,mmm)
pub fn format_srt_time(seconds: f64) -> String {
    let total_milliseconds = (seconds * 1000.0) as u64;
    let hours = total_milliseconds / 3_600_000;
    let minutes = (total_milliseconds % 3_600_000) / 60_000;
    let secs = (total_milliseconds % 60_000) / 1_000;
    let millis = total_milliseconds % 1_000;

    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, secs, millis)
}

/// Parse an SRT timestamp (HH:MM:SS,mmm) back to seconds
pub fn parse_srt_time(value: &str) -> Result<f64> {
    let value = value.trim();
    let invalid = || LivecapError::Subtitle(format!("Invalid SRT timestamp: {}", value));

    let (clock, millis) = value.split_once(',').ok_or_else(invalid)?;
    let mut parts = clock.split(':');
    let hours: u64 = parts
        .next()
        .and_then(|p| p.parse().ok())
        .ok_or_else(invalid)?;
    let minutes: u64 = parts
        .next()
        .and_then(|p| p.parse().ok())
        .ok_or_else(invalid)?;
    let secs: u64 = parts
        .next()
        .and_then(|p| p.parse().ok())
        .ok_or_else(invalid)?;
    if parts.next().is_some() {
        return Err(invalid());
    }
    let millis: u64 = millis.parse().map_err(|_| invalid())?;

    let total_milliseconds = hours * 3_600_000 + minutes * 60_000 + secs * 1_000 + millis;
    Ok(total_milliseconds as f64 / 1000.0)
}
