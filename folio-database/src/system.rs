//! System records: compiled schema, type graph and lookup map
//!
//! System records live behind the same [`Bridge`] as content, under logical
//! keys inside a configurable directory, and are always JSON.

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use folio_bridge::Bridge;

use crate::error::Result;

/// Default directory for system records, relative to the bridge root.
pub const DEFAULT_SYSTEM_DIR: &str = ".folio/__generated__";

/// Logical names of the persisted system records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SystemRecord {
    Schema,
    Graph,
    Lookup,
}

impl SystemRecord {
    pub const ALL: [SystemRecord; 3] = [SystemRecord::Schema, SystemRecord::Graph, SystemRecord::Lookup];

    pub fn key(&self) -> &'static str {
        match self {
            SystemRecord::Schema => "_schema.json",
            SystemRecord::Graph => "_graph.json",
            SystemRecord::Lookup => "_lookup.json",
        }
    }
}

impl fmt::Display for SystemRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Reads and writes system records through a bridge.
#[derive(Clone)]
pub struct SystemStore {
    bridge: Arc<dyn Bridge>,
    dir: String,
}

impl SystemStore {
    pub fn new(bridge: Arc<dyn Bridge>, dir: impl Into<String>) -> Self {
        let dir = dir.into().trim_end_matches('/').to_string();
        Self { bridge, dir }
    }

    pub fn dir(&self) -> &str {
        &self.dir
    }

    pub fn path(&self, record: SystemRecord) -> String {
        format!("{}/{}", self.dir, record.key())
    }

    pub async fn read<T: DeserializeOwned>(&self, record: SystemRecord) -> Result<T> {
        let path = self.path(record);
        let text = self.bridge.get(&path).await?;
        Ok(serde_json::from_str(&text)?)
    }

    pub async fn write<T: Serialize>(&self, record: SystemRecord, value: &T) -> Result<()> {
        let path = self.path(record);
        let text = serde_json::to_string_pretty(value)?;
        debug!(record = %record, path = %path, bytes = text.len(), "writing system record");
        self.bridge.put(&path, &text).await?;
        Ok(())
    }
}
