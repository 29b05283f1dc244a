//! Resolved documents and request types

use serde::{Deserialize, Serialize};
use serde_json::Value;

use folio_fields::Format;

use crate::form::Form;

/// Identity and file metadata of a document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SystemInfo {
    /// File name without extension.
    pub filename: String,
    /// File name with extension.
    pub basename: String,
    /// Extension including the leading dot.
    pub extension: String,
    pub path: String,
    pub relative_path: String,
    /// Relative path segments, the last without its extension.
    pub breadcrumbs: Vec<String>,
    pub collection: String,
    pub template: String,
    pub version: String,
}

impl SystemInfo {
    pub fn new(
        path: &str,
        relative_path: &str,
        collection: impl Into<String>,
        template: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        let basename = path.rsplit('/').next().unwrap_or(path).to_string();
        let (filename, extension) = match basename.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => (stem.to_string(), format!(".{ext}")),
            _ => (basename.clone(), String::new()),
        };

        let mut breadcrumbs: Vec<String> = relative_path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        if let Some(last) = breadcrumbs.last_mut() {
            if let Some(stripped) = last.strip_suffix(extension.as_str()) {
                *last = stripped.to_string();
            }
        }

        Self {
            filename,
            basename,
            extension,
            path: path.to_string(),
            relative_path: relative_path.to_string(),
            breadcrumbs,
            collection: collection.into(),
            template: template.into(),
            version: version.into(),
        }
    }
}

/// A fully resolved document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    pub sys: SystemInfo,
    /// Query view: polymorphic entries carry `__typename`.
    pub data: Value,
    /// Editing view: polymorphic entries carry `_template`.
    pub values: Value,
    pub form: Form,
}

/// Input to [`crate::Resolver::resolve_document`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolveDocumentRequest {
    pub collection: String,
    pub relative_path: String,
    /// Mutation params; required when `is_mutation` is set.
    pub params: Option<Value>,
    pub is_mutation: bool,
    pub is_creation: bool,
    /// Version token the caller last read; a mismatch rejects the write.
    pub expected_version: Option<String>,
}

impl ResolveDocumentRequest {
    /// Read without writing.
    pub fn read(collection: impl Into<String>, relative_path: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            relative_path: relative_path.into(),
            ..Default::default()
        }
    }

    pub fn create(
        collection: impl Into<String>,
        relative_path: impl Into<String>,
        params: Value,
    ) -> Self {
        Self {
            params: Some(params),
            is_mutation: true,
            is_creation: true,
            ..Self::read(collection, relative_path)
        }
    }

    pub fn update(
        collection: impl Into<String>,
        relative_path: impl Into<String>,
        params: Value,
    ) -> Self {
        Self {
            params: Some(params),
            is_mutation: true,
            ..Self::read(collection, relative_path)
        }
    }

    pub fn expect_version(mut self, version: impl Into<String>) -> Self {
        self.expected_version = Some(version.into());
        self
    }
}

/// A batch of resolved documents in input order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub total_count: usize,
    pub edges: Vec<Document>,
}

impl From<Vec<Document>> for Connection {
    fn from(edges: Vec<Document>) -> Self {
        Self {
            total_count: edges.len(),
            edges,
        }
    }
}

/// Collection metadata with unresolved document paths.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CollectionListing {
    pub name: String,
    pub label: String,
    pub path: String,
    pub format: Format,
    /// Template names documents may follow.
    pub templates: Vec<String>,
    pub documents: Vec<String>,
}
