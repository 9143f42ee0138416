//! Configuration management for the Trustigo dashboard
//!
//! This module handles loading and validating configuration from environment
//! variables. A `.env` file in the working directory is honoured.

use std::env;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Default backend the dashboard talks to
pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8000";

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid environment value: {0}")]
    InvalidValue(String),

    #[error("Invalid API base URL: {0}")]
    InvalidUrl(String),
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the fraud-scoring backend
    pub api_base_url: String,

    /// Per-request timeout
    pub request_timeout: Duration,

    /// File extensions accepted by the dataset upload, lowercase with a leading dot
    pub accepted_upload_extensions: Vec<String>,

    /// Directory export documents are written to
    pub export_dir: PathBuf,

    /// Where the theme setting is persisted
    pub settings_path: PathBuf,

    /// Log level (RUST_LOG)
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(30),
            accepted_upload_extensions: vec![".csv".to_string()],
            export_dir: PathBuf::from("."),
            settings_path: default_settings_path(),
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors)
        dotenvy::dotenv().ok();

        let api_base_url = env::var("API_BASE_URL")
            .map(|url| normalize_base_url(&url))
            .unwrap_or_else(|_| Ok(DEFAULT_API_BASE_URL.to_string()))?;

        let request_timeout_secs = env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse::<u64>()
            .map_err(|_| {
                ConfigError::InvalidValue("REQUEST_TIMEOUT_SECS must be a whole number".to_string())
            })?;

        let accepted_upload_extensions = env::var("ACCEPTED_UPLOAD_EXTENSIONS")
            .map(|raw| parse_extensions(&raw))
            .unwrap_or_else(|_| Ok(vec![".csv".to_string()]))?;

        let export_dir = env::var("EXPORT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."));

        let settings_path = env::var("TRUSTIGO_SETTINGS_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_settings_path());

        let log_level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Ok(Config {
            api_base_url,
            request_timeout: Duration::from_secs(request_timeout_secs),
            accepted_upload_extensions,
            export_dir,
            settings_path,
            log_level,
        })
    }

    /// Point at a different backend, e.g. from a command-line flag
    pub fn with_api_base_url(mut self, raw: &str) -> Result<Self, ConfigError> {
        self.api_base_url = normalize_base_url(raw)?;
        Ok(self)
    }

    /// Join an endpoint path onto the base URL
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_base_url, path.trim_start_matches('/'))
    }
}

fn default_settings_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("trustigo")
        .join("settings.json")
}

/// Validate the scheme and strip trailing slashes
fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let host = trimmed
        .strip_prefix("http://")
        .or_else(|| trimmed.strip_prefix("https://"))
        .ok_or_else(|| {
            ConfigError::InvalidUrl(format!("'{}' must start with http:// or https://", raw))
        })?;

    if host.is_empty() {
        return Err(ConfigError::InvalidUrl(format!("'{}' has no host", raw)));
    }
    Ok(trimmed.to_string())
}

fn parse_extensions(raw: &str) -> Result<Vec<String>, ConfigError> {
    let extensions: Vec<String> = raw
        .split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .map(|s| if s.starts_with('.') { s } else { format!(".{}", s) })
        .collect();

    if extensions.is_empty() {
        return Err(ConfigError::InvalidValue(
            "ACCEPTED_UPLOAD_EXTENSIONS must list at least one extension".to_string(),
        ));
    }
    Ok(extensions)
}
