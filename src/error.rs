use thiserror::Error;

#[derive(Error, Debug)]
pub enum LivecapError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Player launch error: {0}")]
    Launch(String),

    #[error("Window attach error: {0}")]
    Attach(String),

    #[error("Media probe error: {0}")]
    Probe(String),

    #[error("Audio extraction error: {0}")]
    Extraction(String),

    #[error("Transcription error: {0}")]
    Transcribe(String),

    #[error("Translation error: {0}")]
    Translation(String),

    #[error("Subtitle file error: {0}")]
    Subtitle(String),
}

pub type Result<T> = std::result::Result<T, LivecapError>;
