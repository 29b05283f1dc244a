//! In-memory bridge

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::trace;

use crate::bridge::{compile_pattern, validate_path, Bridge, MATCH_OPTIONS};
use crate::error::{BridgeError, Result};

type DelayFn = dyn Fn(&str) -> Duration + Send + Sync;

/// Ordered in-memory store, used in tests and for ephemeral workspaces.
///
/// Directories exist implicitly when an entry lives under them, or explicitly
/// once registered with [`MemoryBridge::with_dir`].
#[derive(Default)]
pub struct MemoryBridge {
    files: RwLock<BTreeMap<String, String>>,
    dirs: RwLock<BTreeSet<String>>,
    delay: Option<Arc<DelayFn>>,
}

impl MemoryBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an entry.
    pub fn with_file(mut self, path: impl Into<String>, contents: impl Into<String>) -> Self {
        self.files.get_mut().insert(path.into(), contents.into());
        self
    }

    /// Register an (empty) directory.
    pub fn with_dir(mut self, path: impl Into<String>) -> Self {
        let path = path.into();
        self.dirs
            .get_mut()
            .insert(path.trim_end_matches('/').to_string());
        self
    }

    /// Delay every `get` by `delay(path)` to simulate uneven I/O latency.
    pub fn with_delay<F>(mut self, delay: F) -> Self
    where
        F: Fn(&str) -> Duration + Send + Sync + 'static,
    {
        self.delay = Some(Arc::new(delay));
        self
    }

    /// Copy of every stored entry.
    pub async fn entries(&self) -> BTreeMap<String, String> {
        self.files.read().await.clone()
    }
}

#[async_trait]
impl Bridge for MemoryBridge {
    async fn get(&self, path: &str) -> Result<String> {
        let path = validate_path(path)?;
        if let Some(delay) = &self.delay {
            tokio::time::sleep(delay(path)).await;
        }
        trace!(path, "memory get");
        self.files
            .read()
            .await
            .get(path)
            .cloned()
            .ok_or_else(|| BridgeError::not_found(path))
    }

    async fn put(&self, path: &str, contents: &str) -> Result<()> {
        let path = validate_path(path)?;
        trace!(path, bytes = contents.len(), "memory put");
        self.files
            .write()
            .await
            .insert(path.to_string(), contents.to_string());
        Ok(())
    }

    async fn glob(&self, pattern: &str) -> Result<Vec<String>> {
        let compiled = compile_pattern(pattern)?;
        let files = self.files.read().await;
        // BTreeMap iteration is already sorted.
        Ok(files
            .keys()
            .filter(|path| compiled.matches_with(path, MATCH_OPTIONS))
            .cloned()
            .collect())
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let path = validate_path(path)?;
        self.files
            .write()
            .await
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| BridgeError::not_found(path))
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        let path = validate_path(path)?;
        let prefix = format!("{path}/");
        if self.files.read().await.keys().any(|k| k == path || k.starts_with(&prefix)) {
            return Ok(true);
        }
        Ok(self
            .dirs
            .read()
            .await
            .iter()
            .any(|d| d == path || d.starts_with(&prefix)))
    }
}
