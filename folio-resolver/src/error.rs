//! Error types for document resolution

use thiserror::Error;

use folio_database::DatabaseError;

/// Result type for resolver operations
pub type Result<T> = std::result::Result<T, ResolverError>;

/// Errors raised while resolving or mutating documents
#[derive(Debug, Error)]
pub enum ResolverError {
    /// The named collection is not part of the installed schema
    #[error("collection not found: {name}")]
    CollectionNotFound { name: String },

    /// A stored polymorphic value's discriminator matches no declared template
    #[error("no template in {field} matches stored _template '{template}'")]
    TemplateForDataNotFound { field: String, template: String },

    /// Creation against a path that already holds a document
    #[error("document already exists: {path}")]
    AlreadyExists { path: String },

    /// The stored document changed since the caller read it
    #[error("version conflict on {path}: expected {expected}, found {actual}")]
    VersionConflict {
        path: String,
        expected: String,
        actual: String,
    },

    /// Mutation input does not fit the schema
    #[error("invalid params: {message}")]
    InvalidParams { message: String },

    /// Stored data does not fit the schema
    #[error("invalid data in {path} at {field}: {message}")]
    InvalidData {
        path: String,
        field: String,
        message: String,
    },

    /// A field-resolution callback is missing a required argument
    #[error("missing argument '{name}' for {field}")]
    MissingArgument { field: String, name: String },

    /// Compiled schema is internally inconsistent
    #[error("invalid schema: {message}")]
    InvalidSchema { message: String },

    /// Database failure
    #[error(transparent)]
    Database(#[from] DatabaseError),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ResolverError {
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::InvalidParams {
            message: message.into(),
        }
    }

    pub fn invalid_data(
        path: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidData {
            path: path.into(),
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn invalid_schema(message: impl Into<String>) -> Self {
        Self::InvalidSchema {
            message: message.into(),
        }
    }

    /// Whether the underlying store reported the document as absent.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Database(e) if e.is_not_found())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ResolverError::TemplateForDataNotFound {
            field: "pages.sections".into(),
            template: "banner".into(),
        };
        assert_eq!(
            err.to_string(),
            "no template in pages.sections matches stored _template 'banner'"
        );
        assert_eq!(
            ResolverError::invalid_params("bad").to_string(),
            "invalid params: bad"
        );
    }
}
