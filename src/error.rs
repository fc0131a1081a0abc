//! Error types for sotto

use thiserror::Error;

/// Result type alias for sotto operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in sotto
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Model selection error (endpoint unreachable, empty model list)
    #[error("model selection error: {0}")]
    ModelSelection(String),

    /// Inference endpoint error
    #[error("inference error: {0}")]
    Inference(String),

    /// Audio device error
    #[error("audio error: {0}")]
    Audio(String),

    /// Speech-to-text error
    #[error("STT error: {0}")]
    Stt(String),

    /// Text-to-speech error
    #[error("TTS error: {0}")]
    Tts(String),

    /// Web fetch error
    #[error("web fetch error: {0}")]
    WebFetch(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}
