use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::debug;

use super::Translator;
use crate::config::TranslationConfig;
use crate::error::{LivecapError, Result};
use crate::transcribe::CaptionSegment;

/// Texts within a chunk are joined with this before the request and the
/// response is split on it again, so caption texts must not contain it.
const DELIMITER: char = '\n';

/// Translate all segment texts in place as one batched operation.
///
/// Texts are partitioned into contiguous chunks of at most
/// `batch_size`, each chunk dispatched as one request on a worker pool
/// bounded by `worker_count`. Every request runs on its own freshly
/// opened session. Results are reassembled in chunk order and the
/// segment list is only mutated once every chunk has succeeded; a
/// failure aborts the requests still in flight.
pub async fn translate_batch(
    translator: Arc<dyn Translator>,
    segments: &mut [CaptionSegment],
    config: &TranslationConfig,
) -> Result<()> {
    let (source_lang, target_lang) = config.language_pair()?;

    if segments.is_empty() {
        return Ok(());
    }

    for (idx, segment) in segments.iter().enumerate() {
        if segment.text.contains(DELIMITER) {
            return Err(LivecapError::Translation(format!(
                "Caption text at position {} contains the batching delimiter",
                idx
            )));
        }
    }

    let texts: Vec<&str> = segments.iter().map(|s| s.text.as_str()).collect();
    let batch_size = config.batch_size.max(1);
    let chunk_sizes: Vec<usize> = texts.chunks(batch_size).map(|c| c.len()).collect();
    let requests: Vec<String> = texts
        .chunks(batch_size)
        .map(|chunk| chunk.join("\n"))
        .collect();

    debug!(
        "Translating {} segments in {} chunks ({} -> {})",
        segments.len(),
        requests.len(),
        source_lang,
        target_lang
    );

    let semaphore = Arc::new(Semaphore::new(config.worker_count.max(1)));
    let mut tasks: JoinSet<Result<(usize, String)>> = JoinSet::new();

    for (chunk_idx, request) in requests.into_iter().enumerate() {
        let translator = Arc::clone(&translator);
        let semaphore = Arc::clone(&semaphore);
        let source = source_lang.to_string();
        let target = target_lang.to_string();

        tasks.spawn(async move {
            let _permit = semaphore
                .acquire()
                .await
                .map_err(|_| LivecapError::Translation("Worker pool closed".to_string()))?;

            debug!("Dispatching translation chunk {}", chunk_idx);
            let session = translator.open_session().await?;
            let translated = session.translate(&request, &source, &target).await?;
            Ok((chunk_idx, translated))
        });
    }

    // Results arrive in completion order; an early return drops the
    // set, aborting whatever is still in flight.
    let mut chunks: Vec<(usize, Vec<String>)> = Vec::with_capacity(chunk_sizes.len());
    while let Some(joined) = tasks.join_next().await {
        let (chunk_idx, translated) = joined
            .map_err(|e| LivecapError::Translation(format!("Translation task panicked: {}", e)))??;

        let lines: Vec<&str> = translated.split(DELIMITER).collect();
        if lines.len() != chunk_sizes[chunk_idx] {
            return Err(LivecapError::Translation(format!(
                "Translation chunk {} returned {} lines for {} texts",
                chunk_idx,
                lines.len(),
                chunk_sizes[chunk_idx]
            )));
        }
        chunks.push((
            chunk_idx,
            lines.into_iter().map(|line| line.trim().to_string()).collect(),
        ));
    }
    chunks.sort_by_key(|(chunk_idx, _)| *chunk_idx);

    let translated_lines: Vec<String> = chunks.into_iter().flat_map(|(_, lines)| lines).collect();
    for (segment, translated) in segments.iter_mut().zip(translated_lines) {
        segment.text = translated;
    }

    Ok(())
}
