//! Filesystem bridge rooted at a directory

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, trace};

use crate::bridge::{validate_path, Bridge, MATCH_OPTIONS};
use crate::error::{BridgeError, Result};

/// Stores entries as files under `root`, addressed by forward-slash paths
/// relative to it.
#[derive(Debug, Clone)]
pub struct FsBridge {
    root: PathBuf,
}

impl FsBridge {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let path = validate_path(path)?;
        Ok(self.root.join(path))
    }

    fn not_found(err: std::io::Error, path: &str) -> BridgeError {
        if err.kind() == ErrorKind::NotFound {
            BridgeError::not_found(path)
        } else {
            BridgeError::Io(err)
        }
    }
}

#[async_trait]
impl Bridge for FsBridge {
    async fn get(&self, path: &str) -> Result<String> {
        let full = self.resolve(path)?;
        trace!(path, "fs get");
        fs::read_to_string(&full)
            .await
            .map_err(|e| Self::not_found(e, path))
    }

    async fn put(&self, path: &str, contents: &str) -> Result<()> {
        let full = self.resolve(path)?;
        debug!(path, bytes = contents.len(), "fs put");
        atomic_write(&full, contents.as_bytes()).await
    }

    async fn glob(&self, pattern: &str) -> Result<Vec<String>> {
        let root = self.root.clone();
        let full = format!(
            "{}/{}",
            glob::Pattern::escape(&root.to_string_lossy()),
            pattern.trim_start_matches('/')
        );
        let pattern = pattern.to_string();

        tokio::task::spawn_blocking(move || {
            let entries = glob::glob_with(&full, MATCH_OPTIONS).map_err(|e| BridgeError::Pattern {
                pattern: pattern.clone(),
                message: e.to_string(),
            })?;
            let mut paths = Vec::new();
            for entry in entries {
                let entry = entry.map_err(|e| BridgeError::Io(e.into_error()))?;
                if !entry.is_file() {
                    continue;
                }
                if let Ok(relative) = entry.strip_prefix(&root) {
                    paths.push(to_slash(relative));
                }
            }
            paths.sort();
            Ok(paths)
        })
        .await
        .map_err(|e| BridgeError::Io(std::io::Error::other(e)))?
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let full = self.resolve(path)?;
        debug!(path, "fs delete");
        fs::remove_file(&full)
            .await
            .map_err(|e| Self::not_found(e, path))
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        let full = self.resolve(path)?;
        Ok(fs::try_exists(&full).await?)
    }
}

fn to_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Write via a temp file in the same directory, then rename over the target.
async fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let mut temp_name = path.file_name().unwrap_or_default().to_os_string();
    temp_name.push(".tmp");
    let temp_path = path.with_file_name(temp_name);
    fs::write(&temp_path, content).await?;

    // Rename (atomic on same filesystem)
    fs::rename(&temp_path, path).await?;

    Ok(())
}
