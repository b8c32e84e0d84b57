use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use super::{TranslateSession, Translator};
use crate::config::TranslationConfig;
use crate::error::{LivecapError, Result};

/// Translator backed by the public Google translate web endpoint
pub struct GoogleTranslator {
    config: TranslationConfig,
}

impl GoogleTranslator {
    pub fn new(config: TranslationConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Translator for GoogleTranslator {
    async fn open_session(&self) -> Result<Box<dyn TranslateSession>> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Box::new(GoogleSession {
            client,
            endpoint: self.config.endpoint.clone(),
        }))
    }
}

/// One request's worth of translation state: its own HTTP client,
/// discarded after use
pub struct GoogleSession {
    client: Client,
    endpoint: String,
}

#[async_trait]
impl TranslateSession for GoogleSession {
    async fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<String> {
        debug!(
            "Translating {} chars from {} to {}",
            text.len(),
            source_lang,
            target_lang
        );

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("client", "gtx"),
                ("sl", source_lang),
                ("tl", target_lang),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await?
            .error_for_status()?;

        let payload: Value = response.json().await?;
        parse_translation(&payload)
    }
}

/// The endpoint answers with nested arrays; translated fragments sit at
/// `[0][i][0]` and concatenate to the full translated text.
fn parse_translation(payload: &Value) -> Result<String> {
    let fragments = payload.get(0).and_then(Value::as_array).ok_or_else(|| {
        LivecapError::Translation("Unexpected translation response shape".to_string())
    })?;

    let mut translated = String::new();
    for fragment in fragments {
        if let Some(text) = fragment.get(0).and_then(Value::as_str) {
            translated.push_str(text);
        }
    }

    Ok(translated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_translation_concatenates_fragments() {
        let payload = json!([
            [
                ["Hola, ", "Hello, ", null, null, 10],
                ["mundo", "world", null, null, 10]
            ],
            null,
            "en"
        ]);

        assert_eq!(parse_translation(&payload).unwrap(), "Hola, mundo");
    }

    #[test]
    fn test_parse_translation_preserves_line_breaks() {
        let payload = json!([[["uno\ndos", "one\ntwo", null]], null, "en"]);
        assert_eq!(parse_translation(&payload).unwrap(), "uno\ndos");
    }

    #[test]
    fn test_parse_translation_rejects_unexpected_shape() {
        let payload = json!({"error": "nope"});
        assert!(parse_translation(&payload).is_err());
    }
}
