//! Content and system-record store for folio
//!
//! `folio-database` reads and writes two kinds of records through a
//! [`folio_bridge::Bridge`]:
//!
//! - **System records**: the compiled schema, query-type graph and lookup map,
//!   JSON under logical keys in a system directory
//! - **Content documents**: markdown with front matter or JSON, validated
//!   against the installed schema on every read and decorated with identity keys
//!
//! A schema is installed all-or-nothing; readers take an immutable
//! [`Installed`] snapshot and keep it for the whole request.

pub mod database;
pub mod error;
pub mod frontmatter;
pub mod system;

pub use database::{content_version, format_for_path, Database, Installed, Record};
pub use error::{DatabaseError, Result};
pub use frontmatter::{parse_frontmatter, serialize_frontmatter, Frontmatter};
pub use system::{SystemRecord, SystemStore, DEFAULT_SYSTEM_DIR};
