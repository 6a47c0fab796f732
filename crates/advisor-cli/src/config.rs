//! Configuration file support

use advisor_chat::{DEFAULT_MODEL, RetryConfig};
use advisor_wire::{DEFAULT_ENDPOINT, RequestShape};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::locale::Language;

/// Configuration for legal-advisor
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Chat endpoint URL
    pub endpoint: String,
    /// Model sent with each request
    pub model: String,
    /// Request body layout
    pub request_shape: RequestShape,
    /// Interface language
    pub language: Language,
    /// Use the offline scripted backend and in-memory history
    pub mock: bool,
    /// Ask the model to title new conversations
    pub suggest_titles: bool,
    pub retry: RetrySettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            request_shape: RequestShape::default(),
            language: Language::default(),
            mock: false,
            suggest_titles: true,
            retry: RetrySettings::default(),
        }
    }
}

/// Retry settings for opening the response stream
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_retries: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        let defaults = RetryConfig::default();
        Self {
            max_retries: defaults.max_retries,
            initial_delay_ms: defaults.initial_delay.as_millis() as u64,
            max_delay_ms: defaults.max_delay.as_millis() as u64,
        }
    }
}

impl RetrySettings {
    pub fn to_retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_retries: self.max_retries,
            initial_delay: Duration::from_millis(self.initial_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
            ..RetryConfig::default()
        }
    }
}

impl Config {
    /// Get the config directory
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("legal-advisor")
    }

    /// Get the data directory (conversation history, last active id)
    pub fn data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("legal-advisor")
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("LEGAL_ADVISOR_CONFIG") {
            return PathBuf::from(path);
        }
        Self::config_dir().join("config.toml")
    }

    /// Load config from the default location
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Load config from `path`, falling back to defaults
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("Warning: Failed to parse config file: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                eprintln!("Warning: Failed to read config file: {}", e);
                Self::default()
            }
        }
    }

    /// Save config to the default location
    pub fn save(&self) -> std::io::Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let content = toml::to_string_pretty(self).map_err(std::io::Error::other)?;
        fs::write(path, content)
    }

    /// Create a config file with the example content if it doesn't exist
    pub fn init() -> std::io::Result<PathBuf> {
        let path = Self::config_path();
        if path.exists() {
            return Ok(path);
        }
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(&path, example_config())?;
        Ok(path)
    }
}

/// Generate example config content
pub fn example_config() -> &'static str {
    r#"# legal-advisor configuration file
# Place at ~/.config/legal-advisor/config.toml (Linux) or set LEGAL_ADVISOR_CONFIG

# Chat endpoint
endpoint = "http://localhost:8000/chat"

# Model sent with each request (ChatGPT, Gemini Pro, Gemini Flash)
model = "Gemini Flash"

# Request body layout: "queries" sends {"queries": [text], "model": ..},
# "message" sends {"message": text}
request_shape = "queries"

# Interface language (en, ne)
language = "en"

# Use the offline demo backend and keep history in memory only
mock = false

# Ask the model for a title after the first answer of a new conversation
suggest_titles = true

[retry]
max_retries = 3
initial_delay_ms = 1000
max_delay_ms = 60000
"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_example_config_parses_to_defaults() {
        let config: Config = toml::from_str(example_config()).unwrap();
        let defaults = Config::default();
        assert_eq!(config.endpoint, defaults.endpoint);
        assert_eq!(config.model, "Gemini Flash");
        assert_eq!(config.request_shape, RequestShape::Queries);
        assert_eq!(config.language, Language::English);
        assert!(!config.mock);
        assert!(config.suggest_titles);
        assert_eq!(config.retry.max_retries, 3);
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: Config = toml::from_str("language = \"ne\"\nrequest_shape = \"message\"").unwrap();
        assert_eq!(config.language, Language::Nepali);
        assert_eq!(config.request_shape, RequestShape::Message);
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert!(config.suggest_titles);

        let config: Config = toml::from_str("suggest_titles = false").unwrap();
        assert!(!config.suggest_titles);
    }

    #[test]
    fn test_load_missing_and_invalid_fall_back() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert_eq!(Config::load_from(&missing).model, DEFAULT_MODEL);

        let broken = dir.path().join("broken.toml");
        fs::write(&broken, "model = [").unwrap();
        assert_eq!(Config::load_from(&broken).model, DEFAULT_MODEL);
    }

    #[test]
    fn test_save_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = Config {
            model: "Gemini Pro".into(),
            language: Language::Nepali,
            ..Config::default()
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path);
        assert_eq!(loaded.model, "Gemini Pro");
        assert_eq!(loaded.language, Language::Nepali);
    }

    #[test]
    fn test_retry_settings_convert() {
        let settings = RetrySettings {
            max_retries: 1,
            initial_delay_ms: 250,
            max_delay_ms: 2000,
        };
        let retry = settings.to_retry_config();
        assert_eq!(retry.max_retries, 1);
        assert_eq!(retry.initial_delay, Duration::from_millis(250));
        assert_eq!(retry.max_delay, Duration::from_secs(2));
    }
}
