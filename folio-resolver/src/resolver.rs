//! Document resolver and mutator

use std::sync::Arc;

use futures::future::try_join_all;
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tracing::{debug, info};

use folio_bridge::Bridge;
use folio_database::{content_version, parse_frontmatter, Database, DatabaseError, Installed};
use folio_fields::Format;
use folio_schema::naming::{BODY_KEY, DISCRIMINATOR_KEY};
use folio_schema::{Collectable, CollectionShape, CompiledSchema, Templateable};

use crate::dispatch::{
    mutate_template, resolve_template, tagged, template_params, FieldContext, TYPENAME_KEY,
};
use crate::document::{
    CollectionListing, Connection, Document, ResolveDocumentRequest, SystemInfo,
};
use crate::error::{ResolverError, Result};
use crate::form::build_form;

/// Reads and writes typed documents through a [`Database`].
///
/// Each call takes one schema snapshot and uses it throughout. Writes are
/// serialized so that existence and version checks see the state they guard.
pub struct Resolver {
    db: Arc<Database>,
    write_lock: Mutex<()>,
}

impl Resolver {
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            db,
            write_lock: Mutex::new(()),
        }
    }

    pub fn database(&self) -> &Arc<Database> {
        &self.db
    }

    /// Load and fully resolve the document at `path`.
    pub async fn get_document(&self, path: &str) -> Result<Document> {
        let installed = self.db.snapshot().await?;
        self.document_with(&installed, path).await
    }

    pub(crate) async fn document_with(&self, installed: &Installed, path: &str) -> Result<Document> {
        let schema = &installed.schema;
        let record = self.db.get_with(schema, path).await?;
        let collection = find_collection(schema, &record.collection)?;
        let template = template_named(schema, collection, &record.template)?;

        let body = record.data.get(BODY_KEY).and_then(Value::as_str);
        let cx = FieldContext::root(schema, path, body);
        let mut resolved = resolve_template(&cx, template, &record.data).await?;

        if matches!(collection.shape, CollectionShape::Templates { .. }) {
            resolved.data = tagged(TYPENAME_KEY, &template.type_name, resolved.data);
            resolved.values = tagged(DISCRIMINATOR_KEY, &template.name, resolved.values);
        }

        debug!(path, collection = %collection.name, template = %template.name, "resolved document");
        Ok(Document {
            id: record.path.clone(),
            sys: SystemInfo::new(
                &record.path,
                &record.relative_path,
                &collection.name,
                &template.name,
                &record.version,
            ),
            data: resolved.data,
            values: resolved.values,
            form: build_form(schema, template),
        })
    }

    /// Read, create or update one document addressed by collection and
    /// relative path.
    ///
    /// Mutations write and then read back, so the returned document is
    /// exactly what a later read produces. An update needs an existing
    /// document; a markdown body its template does not expose is carried over.
    pub async fn resolve_document(&self, request: &ResolveDocumentRequest) -> Result<Document> {
        let installed = self.db.snapshot().await?;
        let schema = &installed.schema;
        let collection = find_collection(schema, &request.collection)?;
        let path = document_path(collection, &request.relative_path)?;

        if !request.is_mutation {
            return self.document_with(&installed, &path).await;
        }

        let params = request
            .params
            .as_ref()
            .ok_or_else(|| ResolverError::invalid_params("mutation requires params"))?;
        let (template, mut payload) = build_payload(schema, collection, params)?;

        let guard = self.write_lock.lock().await;
        if request.is_creation {
            if self.db.exists(&path).await? {
                return Err(ResolverError::AlreadyExists { path });
            }
        } else {
            let current = self
                .db
                .bridge()
                .get(&path)
                .await
                .map_err(DatabaseError::from)?;
            if let Some(expected) = &request.expected_version {
                let actual = content_version(&current);
                if actual != *expected {
                    return Err(ResolverError::VersionConflict {
                        path,
                        expected: expected.clone(),
                        actual,
                    });
                }
            }
            // Without a body field the body is not editable, so keep it.
            if collection.format.is_markdown() && template.body_field().is_none() {
                let stored = parse_frontmatter(&path, &current)?;
                payload.insert(BODY_KEY.to_string(), Value::String(stored.body));
            }
        }
        let version = self.db.put_with(schema, &path, &payload).await?;
        drop(guard);

        info!(
            path = %path,
            collection = %collection.name,
            created = request.is_creation,
            version = %version,
            "wrote document"
        );
        self.document_with(&installed, &path).await
    }

    /// Delete a document, returning its last resolved state.
    pub async fn delete_document(&self, collection: &str, relative_path: &str) -> Result<Document> {
        let installed = self.db.snapshot().await?;
        let collection = find_collection(&installed.schema, collection)?;
        let path = document_path(collection, relative_path)?;

        let _guard = self.write_lock.lock().await;
        let document = self.document_with(&installed, &path).await?;
        self.db.delete(&path).await?;
        info!(path = %path, collection = %collection.name, "deleted document");
        Ok(document)
    }

    /// Collection metadata plus every document path, unresolved.
    pub async fn resolve_collection(&self, name: &str) -> Result<CollectionListing> {
        let installed = self.db.snapshot().await?;
        let schema = &installed.schema;
        let collection = find_collection(schema, name)?;
        let documents = self.db.list_documents(collection).await?;

        Ok(CollectionListing {
            name: collection.name.clone(),
            label: collection.label.clone(),
            path: collection.path.clone(),
            format: collection.format,
            templates: schema
                .collection_templates(collection)
                .into_iter()
                .map(|t| t.name.clone())
                .collect(),
            documents,
        })
    }

    /// Every document of a collection, resolved.
    pub async fn resolve_collection_connection(&self, name: &str) -> Result<Connection> {
        let listing = self.resolve_collection(name).await?;
        self.resolve_collection_connections(&listing.documents).await
    }

    /// Resolve a batch of document paths, preserving input order.
    pub async fn resolve_collection_connections(&self, paths: &[String]) -> Result<Connection> {
        let installed = self.db.snapshot().await?;
        let installed = &installed;
        let edges = try_join_all(
            paths
                .iter()
                .map(|path| async move { self.document_with(installed, path).await }),
        )
        .await?;
        Ok(Connection::from(edges))
    }

    /// Convert a document's editing view back into mutation params.
    ///
    /// Feeding the result to an update of the same document reproduces its
    /// stored keys.
    pub async fn params_from_values(&self, document: &Document) -> Result<Value> {
        let installed = self.db.snapshot().await?;
        let schema = &installed.schema;
        let collection = find_collection(schema, &document.sys.collection)?;
        let template = template_named(schema, collection, &document.sys.template)?;

        let values = document
            .values
            .as_object()
            .ok_or_else(|| ResolverError::invalid_params("document values must be an object"))?;
        let params = Value::Object(template_params(schema, template, values)?);

        if collection.is_polymorphic() {
            let mut wrapped = Map::new();
            wrapped.insert(template.name.clone(), params);
            Ok(Value::Object(wrapped))
        } else {
            Ok(params)
        }
    }
}

pub(crate) fn find_collection<'s>(schema: &'s CompiledSchema, name: &str) -> Result<&'s Collectable> {
    schema
        .collection(name)
        .ok_or_else(|| ResolverError::CollectionNotFound {
            name: name.to_string(),
        })
}

fn template_named<'s>(
    schema: &'s CompiledSchema,
    collection: &'s Collectable,
    name: &str,
) -> Result<&'s Templateable> {
    schema
        .collection_templates(collection)
        .into_iter()
        .find(|t| t.name == name)
        .ok_or_else(|| {
            ResolverError::invalid_schema(format!(
                "collection '{}' has no template '{name}'",
                collection.name
            ))
        })
}

/// Storage path for a relative path, defaulting the extension to the
/// collection's format.
///
/// A relative path ending in another format's extension is rejected, so every
/// stored document is one the collection lists and decodes.
pub(crate) fn document_path(collection: &Collectable, relative_path: &str) -> Result<String> {
    let relative = relative_path.trim().trim_start_matches("./").trim_start_matches('/');
    if relative.is_empty()
        || relative
            .split('/')
            .any(|seg| seg.is_empty() || seg == "." || seg == "..")
    {
        return Err(ResolverError::invalid_params(format!(
            "invalid relative path '{relative_path}'"
        )));
    }

    let file_name = relative.rsplit('/').next().unwrap_or(relative);
    match file_name.rsplit_once('.').map(|(_, ext)| ext) {
        Some(ext) if collection.format.accepts(ext) => Ok(collection.document_path(relative)),
        Some(ext) if Format::from_extension(ext).is_some() => {
            Err(ResolverError::invalid_params(format!(
                "'{relative_path}' is not a {} document of collection '{}'",
                collection.format.extension(),
                collection.name
            )))
        }
        _ => Ok(collection.document_path(&format!(
            "{relative}.{}",
            collection.format.extension()
        ))),
    }
}

/// Storage payload for a mutation.
///
/// Polymorphic collections take `{TemplateName: {...}}`; others take the
/// field params directly.
fn build_payload<'s>(
    schema: &'s CompiledSchema,
    collection: &'s Collectable,
    params: &Value,
) -> Result<(&'s Templateable, Map<String, Value>)> {
    let params = params
        .as_object()
        .ok_or_else(|| ResolverError::invalid_params("params must be an object"))?;
    let templates = schema.collection_templates(collection);

    if !collection.is_polymorphic() {
        let template = templates.first().ok_or_else(|| {
            ResolverError::invalid_schema(format!(
                "collection '{}' has no templates",
                collection.name
            ))
        })?;
        return Ok((*template, mutate_template(schema, template, params)?));
    }

    let mut entries = params.iter();
    let (name, body) = match (entries.next(), entries.next()) {
        (Some(entry), None) => entry,
        _ => {
            return Err(ResolverError::invalid_params(format!(
                "params for '{}' must name exactly one template",
                collection.name
            )))
        }
    };
    let template = templates
        .into_iter()
        .find(|t| t.name == *name)
        .ok_or_else(|| {
            ResolverError::invalid_params(format!(
                "collection '{}' has no template named '{name}'",
                collection.name
            ))
        })?;
    let body = body
        .as_object()
        .ok_or_else(|| ResolverError::invalid_params(format!("params for '{name}' must be an object")))?;

    let mut payload = Map::new();
    payload.insert(
        DISCRIMINATOR_KEY.to_string(),
        Value::String(template.discriminator.clone()),
    );
    payload.extend(mutate_template(schema, template, body)?);
    Ok((template, payload))
}
