//! Configuration management

use super::{parse_max_retries, parse_timeout, parse_url, SettingKey, Settings};
use crate::{Result, TtsError};
use ini::Ini;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};

/// INI section holding the API settings
const API_SECTION: &str = "api";

/// Environment variable that overrides the config file location
pub const CONFIG_ENV: &str = "SERMO_CONFIG";

/// Persistent configuration for the synthesis client
///
/// Stored as an INI file. Values present in the file are merged over the
/// defaults; anything missing or malformed falls back to its default.
pub struct Config {
    /// INI configuration storage
    ini: Ini,

    /// Config file path (~/.sermo.cfg unless overridden)
    path: PathBuf,

    /// Settings parsed from the file
    settings: Settings,
}

impl Config {
    /// Load configuration from the default location, creating it if needed
    pub fn load() -> Result<Self> {
        Self::load_from(Self::config_path())
    }

    /// Load configuration from a specific file, creating it if needed
    pub fn load_from(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        debug!("Loading config from {:?}", path);

        let ini = if path.exists() {
            Ini::load_from_file(&path)
                .map_err(|e| TtsError::IniParse(format!("Failed to load config: {}", e)))?
        } else {
            info!("Config file not found, creating default");
            let default = Self::default_config();
            default
                .write_to_file(&path)
                .map_err(|e| TtsError::IniParse(format!("Failed to write config: {}", e)))?;
            default
        };

        let settings = Self::parse_settings(&ini);
        debug!("Loaded settings: {:?}", settings);

        Ok(Self {
            ini,
            path,
            settings,
        })
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        debug!("Saving config to {:?}", self.path);
        self.ini
            .write_to_file(&self.path)
            .map_err(|e| TtsError::Config(format!("Failed to save config: {}", e)))
    }

    /// Get config file path
    ///
    /// `$SERMO_CONFIG` if set, otherwise `~/.sermo.cfg`
    pub fn config_path() -> PathBuf {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return PathBuf::from(path);
        }
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".sermo.cfg")
    }

    /// Expose the config file path for display
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current settings
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Create default configuration
    fn default_config() -> Ini {
        let defaults = Settings::default();
        let mut ini = Ini::new();

        ini.with_section(Some(API_SECTION))
            .set(SettingKey::Url.as_str(), defaults.endpoint_url)
            .set(SettingKey::Timeout.as_str(), defaults.timeout_ms.to_string())
            .set(SettingKey::MaxRetries.as_str(), defaults.max_retries.to_string());

        ini
    }

    /// Parse settings from the INI, merging over defaults
    fn parse_settings(ini: &Ini) -> Settings {
        let defaults = Settings::default();
        let get = |key: SettingKey| ini.get_from(Some(API_SECTION), key.as_str());

        let endpoint_url = match get(SettingKey::Url).map(parse_url) {
            Some(Ok(url)) => url,
            Some(Err(e)) => {
                warn!("Ignoring configured url: {}", e);
                defaults.endpoint_url
            }
            None => defaults.endpoint_url,
        };

        let timeout_ms = match get(SettingKey::Timeout).map(parse_timeout) {
            Some(Ok(ms)) => ms,
            Some(Err(e)) => {
                warn!("Ignoring configured timeout: {}", e);
                defaults.timeout_ms
            }
            None => defaults.timeout_ms,
        };

        let max_retries = match get(SettingKey::MaxRetries).map(parse_max_retries) {
            Some(Ok(n)) => n,
            Some(Err(e)) => {
                warn!("Ignoring configured max_retries: {}", e);
                defaults.max_retries
            }
            None => defaults.max_retries,
        };

        Settings {
            endpoint_url,
            timeout_ms,
            max_retries,
        }
    }

    /// Set a value from user input
    ///
    /// The value is validated first; on error nothing changes, neither in
    /// memory nor in the INI.
    pub fn set(&mut self, key: SettingKey, value: &str) -> Result<()> {
        self.settings.apply(key, value)?;
        let stored = self.settings.get(key);
        self.ini
            .with_section(Some(API_SECTION))
            .set(key.as_str(), stored);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_merges_over_defaults() {
        let mut ini = Ini::new();
        ini.with_section(Some(API_SECTION)).set("timeout", "2500");

        let settings = Config::parse_settings(&ini);
        assert_eq!(settings.timeout_ms, 2500);
        assert_eq!(settings.max_retries, 3);
        assert_eq!(settings.endpoint_url, "http://sermo.home/speech");
    }

    #[test]
    fn test_parse_ignores_invalid_values() {
        let mut ini = Ini::new();
        ini.with_section(Some(API_SECTION))
            .set("url", "")
            .set("timeout", "0")
            .set("max_retries", "many");

        assert_eq!(Config::parse_settings(&ini), Settings::default());
    }

    #[test]
    fn test_empty_ini_gives_defaults() {
        assert_eq!(Config::parse_settings(&Ini::new()), Settings::default());
    }
}
