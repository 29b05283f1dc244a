//! Error types for the content model

use std::path::PathBuf;
use thiserror::Error;

/// Result type for content model operations
pub type Result<T> = std::result::Result<T, FieldsError>;

/// Errors that can occur while reading a raw schema
#[derive(Debug, Error)]
pub enum FieldsError {
    /// Schema file extension is not one of yaml, yml or json
    #[error("unsupported schema file format: {path}")]
    UnsupportedSchemaFormat { path: PathBuf },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// JSON deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
