//! Synthesis settings
//!
//! The three values the pipeline needs from its host: where to send text,
//! how long to wait for each attempt, and how many attempts to make.
//! Persistence lives in [`config`]; this module owns the value type, its
//! validation, and the shared holder the pipeline snapshots from.

pub mod config;

use crate::messages::{DEFAULT_API_URL, DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT_MS};
use crate::{Result, TtsError};
use log::debug;
use reqwest::Url;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

/// Settings for one speak operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Synthesis endpoint, an absolute http(s) URL
    pub endpoint_url: String,

    /// Per-attempt timeout in milliseconds (> 0)
    pub timeout_ms: u64,

    /// Number of attempts; 0 means speak always fails without a request
    pub max_retries: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoint_url: DEFAULT_API_URL.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl Settings {
    /// Per-attempt timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Check every field, reporting the first invalid one
    pub fn validate(&self) -> Result<()> {
        parse_url(&self.endpoint_url)?;
        if self.timeout_ms == 0 {
            return Err(invalid(SettingKey::Timeout, "must be a positive integer"));
        }
        Ok(())
    }

    /// Apply a textual value from a settings editor
    ///
    /// Invalid input is rejected and the previous value is kept.
    pub fn apply(&mut self, key: SettingKey, value: &str) -> Result<()> {
        match key {
            SettingKey::Url => self.endpoint_url = parse_url(value)?,
            SettingKey::Timeout => self.timeout_ms = parse_timeout(value)?,
            SettingKey::MaxRetries => self.max_retries = parse_max_retries(value)?,
        }
        debug!("Applied setting {} = {}", key, value.trim());
        Ok(())
    }

    /// Current value of a field, formatted the way it is persisted
    pub fn get(&self, key: SettingKey) -> String {
        match key {
            SettingKey::Url => self.endpoint_url.clone(),
            SettingKey::Timeout => self.timeout_ms.to_string(),
            SettingKey::MaxRetries => self.max_retries.to_string(),
        }
    }
}

/// Names of the editable settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKey {
    Url,
    Timeout,
    MaxRetries,
}

impl SettingKey {
    pub const ALL: [SettingKey; 3] = [SettingKey::Url, SettingKey::Timeout, SettingKey::MaxRetries];

    /// Key name used in the config file and on the command line
    pub fn as_str(&self) -> &'static str {
        match self {
            SettingKey::Url => "url",
            SettingKey::Timeout => "timeout",
            SettingKey::MaxRetries => "max_retries",
        }
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SettingKey {
    type Err = TtsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "url" | "api_url" => Ok(SettingKey::Url),
            "timeout" => Ok(SettingKey::Timeout),
            "max_retries" | "retries" => Ok(SettingKey::MaxRetries),
            other => Err(TtsError::Config(format!("Unknown setting: {}", other))),
        }
    }
}

fn invalid(key: SettingKey, reason: &str) -> TtsError {
    TtsError::InvalidSetting {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

/// Validate an endpoint URL (non-empty, absolute http or https)
pub fn parse_url(value: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(invalid(SettingKey::Url, "must not be empty"));
    }
    let url = Url::parse(value).map_err(|e| invalid(SettingKey::Url, &e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(value.to_string()),
        scheme => Err(invalid(
            SettingKey::Url,
            &format!("unsupported scheme '{}'", scheme),
        )),
    }
}

/// Validate a timeout in milliseconds (positive integer)
pub fn parse_timeout(value: &str) -> Result<u64> {
    match value.trim().parse::<u64>() {
        Ok(ms) if ms > 0 => Ok(ms),
        _ => Err(invalid(SettingKey::Timeout, "must be a positive integer")),
    }
}

/// Validate a retry count (non-negative integer)
pub fn parse_max_retries(value: &str) -> Result<u32> {
    value
        .trim()
        .parse::<u32>()
        .map_err(|_| invalid(SettingKey::MaxRetries, "must be a non-negative integer"))
}

/// Settings shared between the host and the pipeline
///
/// The host replaces the whole value; readers take a snapshot. A speak
/// operation snapshots once when it starts, so edits made while it is
/// running only affect the next call.
#[derive(Debug, Clone, Default)]
pub struct SharedSettings {
    inner: Arc<RwLock<Settings>>,
}

impl SharedSettings {
    pub fn new(settings: Settings) -> Self {
        Self {
            inner: Arc::new(RwLock::new(settings)),
        }
    }

    /// Copy of the current settings
    pub fn snapshot(&self) -> Settings {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the settings wholesale
    pub fn replace(&self, settings: Settings) {
        debug!("Settings replaced: {:?}", settings);
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = settings;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.endpoint_url, "http://sermo.home/speech");
        assert_eq!(settings.timeout_ms, 10_000);
        assert_eq!(settings.max_retries, 3);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_invalid_timeout_keeps_prior_value() {
        let mut settings = Settings::default();
        assert!(settings.apply(SettingKey::Timeout, "0").is_err());
        assert!(settings.apply(SettingKey::Timeout, "-5").is_err());
        assert!(settings.apply(SettingKey::Timeout, "soon").is_err());
        assert_eq!(settings.timeout_ms, 10_000);

        settings.apply(SettingKey::Timeout, " 2500 ").unwrap();
        assert_eq!(settings.timeout_ms, 2500);
    }

    #[test]
    fn test_retries_accept_zero() {
        let mut settings = Settings::default();
        settings.apply(SettingKey::MaxRetries, "0").unwrap();
        assert_eq!(settings.max_retries, 0);

        assert!(settings.apply(SettingKey::MaxRetries, "-1").is_err());
        assert_eq!(settings.max_retries, 0);
    }

    #[test]
    fn test_url_validation() {
        assert!(parse_url("http://localhost:8080/speech").is_ok());
        assert!(parse_url("https://tts.example.com").is_ok());
        assert!(parse_url("").is_err());
        assert!(parse_url("not a url").is_err());
        assert!(parse_url("ftp://example.com/speech").is_err());
    }

    #[test]
    fn test_setting_key_names() {
        for key in SettingKey::ALL {
            assert_eq!(key.as_str().parse::<SettingKey>().unwrap(), key);
        }
        assert!("volume".parse::<SettingKey>().is_err());
    }

    #[test]
    fn test_snapshot_is_detached() {
        let shared = SharedSettings::new(Settings::default());
        let before = shared.snapshot();

        shared.replace(Settings {
            timeout_ms: 1,
            ..Settings::default()
        });

        assert_eq!(before.timeout_ms, 10_000);
        assert_eq!(shared.snapshot().timeout_ms, 1);
    }
}
