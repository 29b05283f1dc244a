//! Field-resolution callback for a generic query executor
//!
//! The executor knows nothing about the user's schema. For every field it
//! hands over the parent value, the field arguments and the declared return
//! type; [`Resolver::resolve_field`] looks that type up in the lookup map and
//! picks the matching fetch. Types without an entry resolve as plain property
//! access on the parent value.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::trace;

use folio_database::Installed;
use folio_schema::graph::MUTATION_TYPE;
use folio_schema::naming::DISCRIMINATOR_KEY;
use folio_schema::ResolveType;

use crate::dispatch::TYPENAME_KEY;
use crate::document::{Connection, ResolveDocumentRequest};
use crate::error::{ResolverError, Result};
use crate::resolver::{document_path, find_collection, Resolver};

/// Static facts about the field being resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveInfo {
    pub field_name: String,
    /// Declared return type name, without list wrapping.
    pub return_type: String,
    pub parent_type: String,
}

impl ResolveInfo {
    pub fn new(
        parent_type: impl Into<String>,
        field_name: impl Into<String>,
        return_type: impl Into<String>,
    ) -> Self {
        Self {
            field_name: field_name.into(),
            return_type: return_type.into(),
            parent_type: parent_type.into(),
        }
    }

    fn field(&self) -> String {
        format!("{}.{}", self.parent_type, self.field_name)
    }
}

impl Resolver {
    /// Resolve one field of a query or mutation.
    pub async fn resolve_field(
        &self,
        source: &Value,
        args: &Value,
        info: &ResolveInfo,
    ) -> Result<Value> {
        if info.parent_type == MUTATION_TYPE {
            return self.resolve_mutation(args, info).await;
        }

        let installed = self.database().snapshot().await?;
        let Some(entry) = installed.lookup.get(&info.return_type) else {
            return Ok(property(source, &info.field_name));
        };
        trace!(
            field = %info.field(),
            return_type = %info.return_type,
            strategy = entry.strategy.name(),
            "resolving through lookup"
        );

        let value = property(source, &info.field_name);
        match &entry.strategy {
            ResolveType::NodeDocument => {
                let id = required_str(args, "id", info)?;
                self.document_value(&installed, id).await
            }
            ResolveType::CollectionDocument { collection } => {
                match value.as_str() {
                    Some(path) => self.document_in(&installed, &[collection], path, info).await,
                    None if value.is_null() && source_has(source, &info.field_name) => {
                        Ok(Value::Null)
                    }
                    None => {
                        let relative = required_str(args, "relativePath", info)?;
                        self.document_at(&installed, collection, relative).await
                    }
                }
            }
            ResolveType::GlobalDocument { collection } => {
                if let Some(path) = value.as_str() {
                    return self.document_in(&installed, &[collection], path, info).await;
                }
                if let Some(relative) = args.get("relativePath").and_then(Value::as_str) {
                    return self.document_at(&installed, collection, relative).await;
                }
                let target = find_collection(&installed.schema, collection)?;
                match self.database().list_documents(target).await?.first() {
                    Some(path) => self.document_value(&installed, path).await,
                    None => Ok(Value::Null),
                }
            }
            ResolveType::MultiCollectionDocument { collections } => match &value {
                Value::String(path) => {
                    let allowed: Vec<&String> = collections.iter().collect();
                    self.document_in(&installed, &allowed, path, info).await
                }
                Value::Null if source_has(source, &info.field_name) => Ok(Value::Null),
                _ => {
                    let collection = required_str(args, "collection", info)?;
                    if !collections.iter().any(|c| c == collection) {
                        return Err(ResolverError::CollectionNotFound {
                            name: collection.to_string(),
                        });
                    }
                    let relative = required_str(args, "relativePath", info)?;
                    self.document_at(&installed, collection, relative).await
                }
            },
            ResolveType::CollectionDocumentList { collection } => match &value {
                Value::Array(_) => {
                    let paths = self.checked_paths(&installed, &[collection], &value, info)?;
                    connection_value(self.resolve_collection_connections(&paths).await?)
                }
                Value::Null if source_has(source, &info.field_name) => Ok(Value::Null),
                _ => connection_value(self.resolve_collection_connection(collection).await?),
            },
            ResolveType::MultiCollectionDocumentList { collections } => {
                let allowed: Vec<&String> = collections.iter().collect();
                let paths = match &value {
                    Value::Array(_) => self.checked_paths(&installed, &allowed, &value, info)?,
                    Value::Null if source_has(source, &info.field_name) => {
                        return Ok(Value::Null)
                    }
                    _ => {
                        let mut paths = Vec::new();
                        for name in collections {
                            paths.extend(self.resolve_collection(name).await?.documents);
                        }
                        paths
                    }
                };
                connection_value(self.resolve_collection_connections(&paths).await?)
            }
            ResolveType::UnionData { type_map } => {
                let tag = |item: Value| -> Result<Value> {
                    let mut map = match item {
                        Value::Object(map) => map,
                        other => return Ok(other),
                    };
                    if map.contains_key(TYPENAME_KEY) {
                        return Ok(Value::Object(map));
                    }
                    let discriminator = map
                        .get(DISCRIMINATOR_KEY)
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string();
                    let type_name = type_map.get(&discriminator).ok_or_else(|| {
                        ResolverError::TemplateForDataNotFound {
                            field: info.field(),
                            template: discriminator.clone(),
                        }
                    })?;
                    map.insert(TYPENAME_KEY.to_string(), Value::String(type_name.clone()));
                    Ok(Value::Object(map))
                };
                match value {
                    Value::Array(items) => Ok(Value::Array(
                        items.into_iter().map(tag).collect::<Result<Vec<_>>>()?,
                    )),
                    other => tag(other),
                }
            }
        }
    }

    async fn resolve_mutation(&self, args: &Value, info: &ResolveInfo) -> Result<Value> {
        let collection = required_str(args, "collection", info)?;
        let relative = required_str(args, "relativePath", info)?;
        let document = match info.field_name.as_str() {
            "deleteDocument" => self.delete_document(collection, relative).await?,
            "createDocument" | "updateDocument" => {
                let params = args
                    .get("params")
                    .cloned()
                    .ok_or_else(|| missing(info, "params"))?;
                let request = if info.field_name == "createDocument" {
                    ResolveDocumentRequest::create(collection, relative, params)
                } else {
                    ResolveDocumentRequest::update(collection, relative, params)
                };
                let request = match args.get("expectedVersion").and_then(Value::as_str) {
                    Some(version) => request.expect_version(version),
                    None => request,
                };
                self.resolve_document(&request).await?
            }
            other => {
                return Err(ResolverError::invalid_params(format!(
                    "unknown mutation '{other}'"
                )))
            }
        };
        Ok(serde_json::to_value(document)?)
    }

    async fn document_value(&self, installed: &Installed, path: &str) -> Result<Value> {
        Ok(serde_json::to_value(self.document_with(installed, path).await?)?)
    }

    async fn document_at(
        &self,
        installed: &Installed,
        collection: &str,
        relative_path: &str,
    ) -> Result<Value> {
        let collection = find_collection(&installed.schema, collection)?;
        let path = document_path(collection, relative_path)?;
        self.document_value(installed, &path).await
    }

    /// Resolve a stored reference path, which must fall under one of `allowed`.
    async fn document_in(
        &self,
        installed: &Installed,
        allowed: &[&String],
        path: &str,
        info: &ResolveInfo,
    ) -> Result<Value> {
        check_path(installed, allowed, path, info)?;
        self.document_value(installed, path).await
    }

    fn checked_paths(
        &self,
        installed: &Installed,
        allowed: &[&String],
        value: &Value,
        info: &ResolveInfo,
    ) -> Result<Vec<String>> {
        let items = value.as_array().map(Vec::as_slice).unwrap_or_default();
        items
            .iter()
            .map(|item| {
                let path = item.as_str().ok_or_else(|| {
                    ResolverError::invalid_data("", info.field(), "reference must be a path")
                })?;
                check_path(installed, allowed, path, info)?;
                Ok(path.to_string())
            })
            .collect()
    }
}

/// The owning collection of `path` must be one of `allowed`.
///
/// Ownership comes from the path prefix alone, so two collections holding
/// the same relative path never shadow each other.
fn check_path(
    installed: &Installed,
    allowed: &[&String],
    path: &str,
    info: &ResolveInfo,
) -> Result<()> {
    let owner = installed.schema.collection_for_path(path);
    match owner {
        Some(collection) if allowed.iter().any(|name| **name == collection.name) => Ok(()),
        _ => Err(ResolverError::invalid_data(
            path,
            info.field(),
            format!(
                "reference is not in {}",
                allowed
                    .iter()
                    .map(|s| s.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        )),
    }
}

fn property(source: &Value, name: &str) -> Value {
    source.get(name).cloned().unwrap_or(Value::Null)
}

fn source_has(source: &Value, name: &str) -> bool {
    source.get(name).is_some()
}

fn required_str<'a>(args: &'a Value, name: &str, info: &ResolveInfo) -> Result<&'a str> {
    args.get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| missing(info, name))
}

fn missing(info: &ResolveInfo, name: &str) -> ResolverError {
    ResolverError::MissingArgument {
        field: info.field(),
        name: name.to_string(),
    }
}

fn connection_value(connection: Connection) -> Result<Value> {
    Ok(serde_json::to_value(connection)?)
}
