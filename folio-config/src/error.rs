//! Error types for folio configuration

use thiserror::Error;

/// Result type for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A source could not be read or did not match the expected shape
    #[error("Failed to parse configuration: {source}")]
    Parse {
        #[from]
        source: figment::Error,
    },

    /// A value parsed but is not usable
    #[error("Invalid configuration value for key '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

impl ConfigError {
    pub fn invalid_value(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            message: message.into(),
        }
    }
}
