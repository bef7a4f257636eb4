//! Configuration management for hearth
//!
//! This module handles loading, validation, and management of
//! hearth configuration from YAML files, plus the API base URL
//! normalization shared by every HTTP call.

pub mod error;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub use error::ConfigError;

/// Environment variable that overrides `api.base_url`
pub const API_URL_ENV: &str = "HEARTH_API_URL";

// ==================== Configuration Types ====================

/// Backend API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the REST backend
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Timeout for plain JSON requests, in seconds
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: None,
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:3000/api".to_string()
}

/// Statement upload limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Largest accepted file in bytes
    #[serde(default = "default_max_size")]
    pub max_size_bytes: u64,
    /// Accepted file extensions, lowercase without the dot
    #[serde(default = "default_extensions")]
    pub allowed_extensions: Vec<String>,
    /// Accepted MIME types
    #[serde(default = "default_mime_types")]
    pub allowed_mime_types: Vec<String>,
    /// Seconds an upload error stays visible before the flow resets
    #[serde(default = "default_dismiss_secs")]
    pub error_dismiss_secs: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_size_bytes: default_max_size(),
            allowed_extensions: default_extensions(),
            allowed_mime_types: default_mime_types(),
            error_dismiss_secs: default_dismiss_secs(),
        }
    }
}

impl UploadConfig {
    pub fn error_dismiss_delay(&self) -> Duration {
        Duration::from_secs(self.error_dismiss_secs)
    }
}

fn default_max_size() -> u64 {
    10 * 1024 * 1024
}

fn default_extensions() -> Vec<String> {
    ["pdf", "jpg", "jpeg", "png", "xlsx", "xls", "csv"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_mime_types() -> Vec<String> {
    [
        "image/jpeg",
        "image/png",
        "image/jpg",
        "application/pdf",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "application/vnd.ms-excel",
        "text/csv",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_dismiss_secs() -> u64 {
    3
}

/// Where the CLI keeps the login session
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SessionConfig {
    /// Session file; defaults to `~/.hearth/session.json`
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Currency and number formatting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrencyConfig {
    /// Currency symbol
    #[serde(default = "default_symbol")]
    pub symbol: String,
    /// Number of decimal places
    #[serde(default = "default_decimal_places")]
    pub decimal_places: u32,
    /// Thousands separator
    #[serde(default = "default_thousands_sep")]
    pub thousands_separator: String,
    /// Decimal separator
    #[serde(default = "default_decimal_sep")]
    pub decimal_separator: String,
    /// Currency symbol position ("before" or "after")
    #[serde(default)]
    pub symbol_position: SymbolPosition,
}

impl Default for CurrencyConfig {
    fn default() -> Self {
        Self {
            symbol: default_symbol(),
            decimal_places: default_decimal_places(),
            thousands_separator: default_thousands_sep(),
            decimal_separator: default_decimal_sep(),
            symbol_position: SymbolPosition::Before,
        }
    }
}

fn default_symbol() -> String {
    "R$".to_string()
}

fn default_decimal_places() -> u32 {
    2
}

fn default_thousands_sep() -> String {
    ".".to_string()
}

fn default_decimal_sep() -> String {
    ",".to_string()
}

/// Currency symbol position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SymbolPosition {
    #[default]
    Before,
    After,
}

impl std::str::FromStr for SymbolPosition {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "before" => Ok(SymbolPosition::Before),
            "after" => Ok(SymbolPosition::After),
            _ => Err(format!("Invalid symbol position: {}", s)),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Backend API settings
    #[serde(default)]
    pub api: ApiConfig,
    /// Statement upload limits
    #[serde(default)]
    pub upload: UploadConfig,
    /// Session storage
    #[serde(default)]
    pub session: SessionConfig,
    /// Currency settings
    #[serde(default)]
    pub currency: CurrencyConfig,
    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration without blocking the runtime
    pub async fn load_async(path: &Path) -> Result<Self, ConfigError> {
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ConfigError::FileNotFound {
                    path: path.to_string_lossy().to_string(),
                });
            }
            Err(e) => return Err(e.into()),
        };
        Self::from_yaml(&content)
    }

    /// Load the file if present, falling back to defaults otherwise
    pub async fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        match Self::load_async(path).await {
            Err(ConfigError::FileNotFound { .. }) => {
                let config = Config::default();
                config.validate()?;
                Ok(config)
            }
            other => other,
        }
    }

    /// Parse and validate a YAML document
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(content)
            .map_err(|e| ConfigError::InvalidYaml { message: e.to_string() })?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api.base_url.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "api.base_url".to_string(),
                reason: "Base URL must not be empty".to_string(),
            });
        }

        if self.upload.max_size_bytes == 0 {
            return Err(ConfigError::InvalidValue {
                field: "upload.max_size_bytes".to_string(),
                reason: "Maximum upload size must be greater than 0".to_string(),
            });
        }

        if self.upload.allowed_extensions.is_empty() && self.upload.allowed_mime_types.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "upload.allowed_extensions".to_string(),
                reason: "At least one extension or MIME type must be allowed".to_string(),
            });
        }

        if self.currency.decimal_places > 10 {
            return Err(ConfigError::InvalidValue {
                field: "currency.decimal_places".to_string(),
                reason: "Decimal places must be between 0 and 10".to_string(),
            });
        }

        Ok(())
    }

    /// Generate a default configuration file
    pub fn generate_default() -> &'static str {
        include_str!("../templates/default_config.yaml")
    }

    /// Normalized API base URL, honoring the `HEARTH_API_URL` override
    pub fn api_url(&self) -> String {
        match std::env::var(API_URL_ENV) {
            Ok(url) if !url.trim().is_empty() => normalize_api_url(&url),
            _ => normalize_api_url(&self.api.base_url),
        }
    }

    /// Timeout for JSON requests, if configured
    pub fn request_timeout(&self) -> Option<Duration> {
        self.api.timeout_secs.map(Duration::from_secs)
    }
}

/// Strip trailing slashes and make sure the URL ends in `/api`
pub fn normalize_api_url(url: &str) -> String {
    let trimmed = url.trim().trim_end_matches('/');
    if trimmed.ends_with("/api") {
        trimmed.to_string()
    } else {
        format!("{}/api", trimmed)
    }
}

// ==================== Tests ====================
