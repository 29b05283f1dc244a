//! Folio: a schema-driven content engine
//!
//! Folio maps a declarative content schema (collections of documents, typed by
//! templates made of fields) onto a typed query surface, and resolves and
//! mutates that surface against markdown and JSON files.
//!
//! # Architecture
//!
//! - **`folio-fields`**: the raw, user-authored schema
//! - **`folio-schema`**: compilation into namespaced descriptors, the lookup
//!   map and the query-type graph
//! - **`folio-bridge`**: file access, on disk or in memory
//! - **`folio-database`**: system records and content documents
//! - **`folio-resolver`**: typed reads and writes through the field-type
//!   dispatch registry
//! - **`folio-config`**: layered configuration
//!
//! [`Folio`] wires them together for one project directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use folio_bridge::{Bridge, FsBridge};
use folio_database::{Database, Installed};
use folio_fields::RawSchema;

pub mod error;
pub mod logging;

pub use error::{FolioError, Result};
pub use logging::{init_tracing, Pretty};

pub use folio_config::{load_config, FolioConfig};
pub use folio_resolver::{
    Connection, Document, ResolveDocumentRequest, ResolveInfo, Resolver, ResolverError,
};

/// An opened project: configuration, installed schema and resolver.
pub struct Folio {
    config: FolioConfig,
    root: PathBuf,
    resolver: Resolver,
}

impl Folio {
    /// Load configuration for `project_dir` and open the project.
    pub async fn open(project_dir: impl AsRef<Path>) -> Result<Self> {
        let project_dir = project_dir.as_ref();
        let config = load_config(project_dir)?;
        Self::open_with(project_dir, config).await
    }

    /// Open a project with explicit configuration, installing its schema.
    pub async fn open_with(project_dir: &Path, config: FolioConfig) -> Result<Self> {
        let root = config.resolved_root(project_dir);
        let bridge: Arc<dyn Bridge> = Arc::new(FsBridge::new(&root));
        let db = Arc::new(Database::with_system_dir(bridge, &config.system_dir));

        let folio = Self {
            config,
            root,
            resolver: Resolver::new(db),
        };
        folio.reload_schema().await?;
        Ok(folio)
    }

    /// Re-read the schema file and install it.
    ///
    /// A schema that fails to compile or verify leaves the previous one active.
    pub async fn reload_schema(&self) -> Result<Arc<Installed>> {
        let path = self.schema_file();
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(FolioError::SchemaNotFound { path });
        }
        let raw = RawSchema::load(&path).await?;
        let installed = self.database().install_schema(&raw).await?;
        info!(
            root = %self.root.display(),
            collections = installed.schema.collections.len(),
            "opened project"
        );
        debug!("lookup map: {}", Pretty(&installed.lookup));
        Ok(installed)
    }

    pub fn config(&self) -> &FolioConfig {
        &self.config
    }

    /// Filesystem root documents and system records live under.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn schema_file(&self) -> PathBuf {
        self.root.join(&self.config.schema_path)
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    pub fn database(&self) -> &Arc<Database> {
        self.resolver.database()
    }
}
