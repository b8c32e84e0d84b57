// Translation boundary
//
// This module wraps the external translation service behind a
// session-per-request model:
// - Translator: opens fresh single-use sessions
// - batch: chunked, concurrency-bounded translation of caption lists
// - Google: web endpoint implementation

pub mod batch;
pub mod google;

use async_trait::async_trait;
use std::sync::Arc;

pub use batch::translate_batch;

use crate::config::TranslationConfig;
use crate::error::Result;

/// A single-use translation session.
///
/// Sessions must never be shared between concurrent requests; the
/// backing clients are stateful and not safe for concurrent reuse.
#[async_trait]
pub trait TranslateSession: Send {
    /// Translate text between the given language pair
    async fn translate(&self, text: &str, source_lang: &str, target_lang: &str)
        -> Result<String>;
}

/// Main trait for translation backends: hands out a fresh session for
/// every request.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn open_session(&self) -> Result<Box<dyn TranslateSession>>;
}

/// Factory for creating translator instances
pub struct TranslatorFactory;

impl TranslatorFactory {
    /// Create the default translator implementation (Google web endpoint)
    pub fn create_translator(config: TranslationConfig) -> Arc<dyn Translator> {
        Arc::new(google::GoogleTranslator::new(config))
    }
}
