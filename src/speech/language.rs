//! Language hints for synthesis requests

/// Classifies the language of text before it is sent
///
/// Returning `None` leaves the `language` field out of the request and the
/// server detects the language itself.
pub trait LanguageDetector: Send + Sync {
    fn detect(&self, text: &str) -> Option<String>;
}

/// Leave detection to the server
pub struct ServerDetects;

impl LanguageDetector for ServerDetects {
    fn detect(&self, _text: &str) -> Option<String> {
        None
    }
}

/// Always report the same language (e.g. from `--language`)
pub struct FixedLanguage(pub String);

impl LanguageDetector for FixedLanguage {
    fn detect(&self, _text: &str) -> Option<String> {
        Some(self.0.clone())
    }
}
