//! Configuration management for folio
//!
//! Settings come from defaults, then an optional `folio.{toml,yaml,yml,json}`
//! file in the project directory, then `FOLIO_`-prefixed environment
//! variables. See [`ConfigProvider`] for the precedence rules.

pub mod error;
pub mod provider;
pub mod types;

pub use error::{ConfigError, ConfigResult};
pub use provider::{load_config, ConfigProvider, CONFIG_FILE_STEM, ENV_PREFIX};
pub use types::{FolioConfig, DEFAULT_LOG_FILTER, DEFAULT_SCHEMA_PATH, DEFAULT_SYSTEM_DIR};
