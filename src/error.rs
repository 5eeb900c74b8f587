//! Error types for Sermo

use crate::messages;
use std::io;
use thiserror::Error;

/// Main error type for Sermo
///
/// The network-facing variants (`Timeout`, `Http`, `Transport`, `Decode`)
/// are what a single synthesis attempt can fail with. `Playback` only
/// happens after audio has been fetched and is never retried.
#[derive(Error, Debug)]
pub enum TtsError {
    #[error("Request timed out")]
    Timeout,

    #[error("{message}")]
    Http { status: u16, message: String },

    #[error("Network error: {0}")]
    Transport(String),

    #[error("Invalid response: {0}")]
    Decode(String),

    #[error("Audio playback failed: {0}")]
    Playback(String),

    /// All attempts were used up. Carries the last attempt's error, if any
    /// attempt was made at all.
    #[error("{}", exhausted_message(.0))]
    RetriesExhausted(Option<Box<TtsError>>),

    #[error("Invalid value for {key}: {reason}")]
    InvalidSetting { key: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("INI parse error: {0}")]
    IniParse(String),

    #[error("Clipboard error: {0}")]
    Clipboard(String),

    #[error("{0}")]
    Other(String),
}

fn exhausted_message(cause: &Option<Box<TtsError>>) -> String {
    match cause {
        Some(err) => format!("{}: {}", messages::FAILED_AFTER_RETRIES, err),
        None => messages::FAILED_AFTER_RETRIES.to_string(),
    }
}

/// Result type alias for Sermo operations
pub type Result<T> = std::result::Result<T, TtsError>;

impl From<String> for TtsError {
    fn from(s: String) -> Self {
        TtsError::Other(s)
    }
}

impl From<&str> for TtsError {
    fn from(s: &str) -> Self {
        TtsError::Other(s.to_string())
    }
}

impl From<serde_json::Error> for TtsError {
    fn from(e: serde_json::Error) -> Self {
        TtsError::Decode(format!("JSON error: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exhausted_without_cause() {
        let err = TtsError::RetriesExhausted(None);
        assert_eq!(err.to_string(), "Failed after multiple attempts");
    }

    #[test]
    fn test_exhausted_wraps_cause() {
        let err = TtsError::RetriesExhausted(Some(Box::new(TtsError::Timeout)));
        assert_eq!(
            err.to_string(),
            "Failed after multiple attempts: Request timed out"
        );
    }

    #[test]
    fn test_http_error_shows_message() {
        let err = TtsError::Http {
            status: 503,
            message: "Service unavailable - server is down (503)".to_string(),
        };
        assert_eq!(err.to_string(), "Service unavailable - server is down (503)");
    }
}
