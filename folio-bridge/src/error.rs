//! Error types for storage bridges

use thiserror::Error;

/// Result type for bridge operations
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Errors raised by a [`crate::Bridge`]
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Nothing is stored at the path
    #[error("not found: {path}")]
    NotFound { path: String },

    /// Path is absolute or climbs out of the bridge root
    #[error("invalid path: {path}")]
    InvalidPath { path: String },

    /// Glob pattern could not be parsed
    #[error("invalid glob pattern '{pattern}': {message}")]
    Pattern { pattern: String, message: String },

    /// Underlying I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound { path: path.into() }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
