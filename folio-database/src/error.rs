//! Error types for the database layer

use thiserror::Error;

use folio_bridge::BridgeError;
use folio_schema::SchemaError;

/// Result type for database operations
pub type Result<T> = std::result::Result<T, DatabaseError>;

/// Errors that can occur reading or writing records
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// No schema has been installed or loaded yet
    #[error("no schema installed")]
    NotInitialized,

    /// No collection's path prefixes the document path
    #[error("no collection owns path: {path}")]
    CollectionNotFound { path: String },

    /// Stored discriminator matches no template of the owning collection
    #[error("template '{template}' not found in collection '{collection}' for {path}")]
    TemplateNotFound {
        path: String,
        collection: String,
        template: String,
    },

    /// Polymorphic collection document carries no discriminator
    #[error("document {path} in collection '{collection}' has no _template")]
    MissingDiscriminator { path: String, collection: String },

    /// Path extension is neither markdown nor JSON
    #[error("unsupported format for {path}")]
    UnsupportedFormat { path: String },

    /// Front matter block could not be parsed or is not a mapping
    #[error("invalid front matter in {path}: {message}")]
    Frontmatter { path: String, message: String },

    /// Stored content is not a record
    #[error("invalid document {path}: {message}")]
    InvalidDocument { path: String, message: String },

    /// Bridge failure
    #[error(transparent)]
    Bridge(#[from] BridgeError),

    /// Schema failed to compile or verify
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl DatabaseError {
    pub fn frontmatter(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Frontmatter {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn invalid_document(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidDocument {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Whether the bridge reported the path as absent.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Bridge(e) if e.is_not_found())
    }
}
