//! Error types for the folio facade

use std::path::PathBuf;

use thiserror::Error;

use folio_config::ConfigError;
use folio_database::DatabaseError;
use folio_fields::FieldsError;
use folio_resolver::ResolverError;

/// Result type for facade operations
pub type Result<T> = std::result::Result<T, FolioError>;

#[derive(Debug, Error)]
pub enum FolioError {
    /// The configured schema file does not exist
    #[error("schema file not found: {}", path.display())]
    SchemaNotFound { path: PathBuf },

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The schema file could not be read or parsed
    #[error(transparent)]
    Fields(#[from] FieldsError),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Resolver(#[from] ResolverError),
}
