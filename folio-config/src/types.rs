//! The folio configuration record

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

pub const DEFAULT_SCHEMA_PATH: &str = ".folio/schema.yaml";
pub const DEFAULT_SYSTEM_DIR: &str = ".folio/__generated__";
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Settings for one folio project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FolioConfig {
    /// Filesystem root the content bridge is rooted at. Relative paths are
    /// taken from the project directory.
    pub content_root: PathBuf,
    /// Schema file, relative to the content root.
    pub schema_path: String,
    /// Directory for generated system records, relative to the content root.
    pub system_dir: String,
    /// `tracing` filter used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for FolioConfig {
    fn default() -> Self {
        Self {
            content_root: PathBuf::from("."),
            schema_path: DEFAULT_SCHEMA_PATH.to_string(),
            system_dir: DEFAULT_SYSTEM_DIR.to_string(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl FolioConfig {
    /// Content root resolved against `project_dir`.
    pub fn resolved_root(&self, project_dir: &Path) -> PathBuf {
        if self.content_root.is_absolute() {
            self.content_root.clone()
        } else {
            project_dir.join(&self.content_root)
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        check_relative("schema_path", &self.schema_path)?;
        let ext = self.schema_path.rsplit_once('.').map(|(_, ext)| ext);
        if !matches!(ext, Some("yaml" | "yml" | "json")) {
            return Err(ConfigError::invalid_value(
                "schema_path",
                "expected a .yaml, .yml or .json file",
            ));
        }
        check_relative("system_dir", &self.system_dir)?;
        if self.log_filter.trim().is_empty() {
            return Err(ConfigError::invalid_value("log_filter", "must not be empty"));
        }
        Ok(())
    }
}

/// Store paths are forward-slash and relative to the content root.
fn check_relative(key: &str, path: &str) -> ConfigResult<()> {
    if path.is_empty() {
        return Err(ConfigError::invalid_value(key, "must not be empty"));
    }
    if path.starts_with('/') || path.contains('\\') {
        return Err(ConfigError::invalid_value(
            key,
            format!("'{path}' must be a relative forward-slash path"),
        ));
    }
    if path.split('/').any(|seg| seg == "..") {
        return Err(ConfigError::invalid_value(
            key,
            format!("'{path}' must stay inside the content root"),
        ));
    }
    Ok(())
}
