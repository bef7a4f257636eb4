//! Errors raised while loading the configuration file

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {path}")]
    FileNotFound { path: String },

    #[error("Config file is not valid YAML: {message}")]
    InvalidYaml { message: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    /// Stable identifier for logs
    pub fn code(&self) -> &'static str {
        match self {
            ConfigError::FileNotFound { .. } => "CONFIG_NOT_FOUND",
            ConfigError::InvalidYaml { .. } => "CONFIG_INVALID_YAML",
            ConfigError::InvalidValue { .. } => "CONFIG_INVALID_VALUE",
            ConfigError::Io(_) => "CONFIG_IO",
        }
    }

    /// Dotted path of the offending setting
    pub fn field(&self) -> Option<&str> {
        match self {
            ConfigError::InvalidValue { field, .. } => Some(field),
            _ => None,
        }
    }

    /// What the user can do about it
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            ConfigError::FileNotFound { .. } => Some("Run `hearth init-config` to write a default config file"),
            ConfigError::InvalidYaml { .. } => Some("Compare the file with the output of `hearth init-config`"),
            _ => None,
        }
    }
}
