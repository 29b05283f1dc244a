//! Keyed record store over a bridge
//!
//! The database owns the installed schema snapshot and the two classes of
//! paths: system records (see [`crate::system`]) and content documents. Every
//! content read is checked against the current snapshot: its path must fall
//! under a collection, and its discriminator must name one of that
//! collection's templates.

use std::sync::Arc;

use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tracing::{debug, info};
use xxhash_rust::xxh3::xxh3_64;

use folio_bridge::Bridge;
use folio_fields::{Format, RawSchema};
use folio_schema::naming::{
    BODY_KEY, COLLECTION_KEY, DISCRIMINATOR_KEY, ID_KEY, RELATIVE_PATH_KEY,
};
use folio_schema::{
    build_graph, build_lookup, compile, Collectable, CompiledSchema, LookupEntry, LookupMap,
    SchemaError, Templateable, TypeGraph,
};

use crate::error::{DatabaseError, Result};
use crate::frontmatter::{parse_frontmatter, serialize_frontmatter};
use crate::system::{SystemRecord, SystemStore, DEFAULT_SYSTEM_DIR};

/// One installed schema with everything derived from it.
///
/// Requests hold an `Arc<Installed>` for their whole lifetime, so a schema
/// installed mid-request never changes what that request sees.
#[derive(Debug, Clone, PartialEq)]
pub struct Installed {
    pub schema: CompiledSchema,
    pub graph: TypeGraph,
    pub lookup: LookupMap,
}

impl Installed {
    pub fn from_schema(schema: CompiledSchema) -> Self {
        Self {
            graph: build_graph(&schema),
            lookup: build_lookup(&schema),
            schema,
        }
    }
}

/// A loaded content document.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub path: String,
    pub collection: String,
    /// Name of the template the document follows.
    pub template: String,
    pub relative_path: String,
    /// Content hash of the stored text.
    pub version: String,
    /// Stored keys plus `_body` (markdown) and the identity keys.
    pub data: Map<String, Value>,
}

/// Content hash used as a document version token.
pub fn content_version(text: &str) -> String {
    format!("{:016x}", xxh3_64(text.as_bytes()))
}

/// Storage format implied by a document path's extension.
pub fn format_for_path(path: &str) -> Result<Format> {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    file_name
        .rsplit_once('.')
        .and_then(|(_, ext)| Format::from_extension(ext))
        .ok_or_else(|| DatabaseError::UnsupportedFormat {
            path: path.to_string(),
        })
}

pub struct Database {
    bridge: Arc<dyn Bridge>,
    system: SystemStore,
    state: RwLock<Option<Arc<Installed>>>,
}

impl Database {
    pub fn new(bridge: Arc<dyn Bridge>) -> Self {
        Self::with_system_dir(bridge, DEFAULT_SYSTEM_DIR)
    }

    pub fn with_system_dir(bridge: Arc<dyn Bridge>, system_dir: impl Into<String>) -> Self {
        Self {
            system: SystemStore::new(Arc::clone(&bridge), system_dir),
            bridge,
            state: RwLock::new(None),
        }
    }

    pub fn bridge(&self) -> &Arc<dyn Bridge> {
        &self.bridge
    }

    pub fn system(&self) -> &SystemStore {
        &self.system
    }

    // =========================================================================
    // System records
    // =========================================================================

    /// Compile, verify, persist and activate a schema.
    ///
    /// Nothing is activated unless every step succeeds; a failed install
    /// leaves the previous snapshot in place.
    pub async fn install_schema(&self, raw: &RawSchema) -> Result<Arc<Installed>> {
        let schema = compile(raw)?;
        self.verify_paths(&schema).await?;
        let installed = Arc::new(Installed::from_schema(schema));

        self.system
            .write(SystemRecord::Schema, &installed.schema)
            .await?;
        self.system
            .write(SystemRecord::Graph, &installed.graph)
            .await?;
        self.system
            .write(SystemRecord::Lookup, &installed.lookup)
            .await?;

        *self.state.write().await = Some(Arc::clone(&installed));
        info!(
            collections = installed.schema.collections.len(),
            types = installed.graph.len(),
            lookup_entries = installed.lookup.len(),
            "installed schema"
        );
        Ok(installed)
    }

    /// Check that every collection path exists in the backing store.
    pub async fn verify_paths(&self, schema: &CompiledSchema) -> Result<()> {
        for collection in &schema.collections {
            if !self.bridge.exists(&collection.path).await? {
                return Err(SchemaError::CollectionPathNotFound {
                    collection: collection.name.clone(),
                    path: collection.path.clone(),
                }
                .into());
            }
        }
        Ok(())
    }

    /// Activate the schema persisted by a previous install.
    pub async fn load_installed(&self) -> Result<Arc<Installed>> {
        let installed = Arc::new(Installed {
            schema: self.system.read(SystemRecord::Schema).await?,
            graph: self.system.read(SystemRecord::Graph).await?,
            lookup: self.system.read(SystemRecord::Lookup).await?,
        });
        *self.state.write().await = Some(Arc::clone(&installed));
        debug!(dir = %self.system.dir(), "loaded installed schema");
        Ok(installed)
    }

    /// The active snapshot.
    pub async fn snapshot(&self) -> Result<Arc<Installed>> {
        self.state
            .read()
            .await
            .clone()
            .ok_or(DatabaseError::NotInitialized)
    }

    pub async fn get_lookup(&self, type_name: &str) -> Result<Option<LookupEntry>> {
        Ok(self.snapshot().await?.lookup.get(type_name).cloned())
    }

    /// Add or overwrite one lookup entry, persist the map, and activate it.
    pub async fn put_lookup(&self, entry: LookupEntry) -> Result<()> {
        let mut state = self.state.write().await;
        let current = state.as_ref().ok_or(DatabaseError::NotInitialized)?;
        let mut next = Installed::clone(current);
        next.lookup.insert(entry);
        self.system.write(SystemRecord::Lookup, &next.lookup).await?;
        *state = Some(Arc::new(next));
        Ok(())
    }

    // =========================================================================
    // Content
    // =========================================================================

    pub async fn get(&self, path: &str) -> Result<Record> {
        let installed = self.snapshot().await?;
        self.get_with(&installed.schema, path).await
    }

    /// Load and decorate a document against `schema`.
    pub async fn get_with(&self, schema: &CompiledSchema, path: &str) -> Result<Record> {
        let format = format_for_path(path)?;
        let text = self.bridge.get(path).await?;

        let mut data = if format.is_markdown() {
            let parsed = parse_frontmatter(path, &text)?;
            let mut data = parsed.metadata;
            data.insert(BODY_KEY.to_string(), Value::String(parsed.body));
            data
        } else {
            match serde_json::from_str::<Value>(&text)? {
                Value::Object(map) => map,
                _ => return Err(DatabaseError::invalid_document(path, "expected a JSON object")),
            }
        };

        let collection = owning_collection(schema, path)?;
        let template = stored_template(schema, collection, path, &data)?;
        let relative_path = collection
            .relative_path(path)
            .unwrap_or_default()
            .to_string();

        data.insert(
            DISCRIMINATOR_KEY.to_string(),
            Value::String(template.name.clone()),
        );
        data.insert(
            COLLECTION_KEY.to_string(),
            Value::String(collection.name.clone()),
        );
        data.insert(
            RELATIVE_PATH_KEY.to_string(),
            Value::String(relative_path.clone()),
        );
        data.insert(ID_KEY.to_string(), Value::String(path.to_string()));

        debug!(path, collection = %collection.name, template = %template.name, "loaded document");
        Ok(Record {
            path: path.to_string(),
            collection: collection.name.clone(),
            template: template.name.clone(),
            relative_path,
            version: content_version(&text),
            data,
        })
    }

    pub async fn put(&self, path: &str, data: &Map<String, Value>) -> Result<String> {
        let installed = self.snapshot().await?;
        self.put_with(&installed.schema, path, data).await
    }

    /// Serialize and store a document; returns the new version token.
    ///
    /// The discriminator is kept only for polymorphic collections. Markdown
    /// documents take their body from the template's body field, falling back
    /// to `_body`.
    pub async fn put_with(
        &self,
        schema: &CompiledSchema,
        path: &str,
        data: &Map<String, Value>,
    ) -> Result<String> {
        let format = format_for_path(path)?;
        let collection = owning_collection(schema, path)?;
        let template = written_template(schema, collection, path, data)?;

        let mut payload = data.clone();
        for key in [COLLECTION_KEY, RELATIVE_PATH_KEY, ID_KEY] {
            payload.shift_remove(key);
        }
        if collection.is_polymorphic() {
            payload.insert(
                DISCRIMINATOR_KEY.to_string(),
                Value::String(template.discriminator.clone()),
            );
        } else {
            payload.shift_remove(DISCRIMINATOR_KEY);
        }

        let text = if format.is_markdown() {
            let from_field = template
                .body_field()
                .and_then(|field| payload.shift_remove(&field.name));
            let from_key = payload.shift_remove(BODY_KEY);
            let body = match from_field.or(from_key) {
                Some(Value::String(body)) => body,
                Some(Value::Null) | None => String::new(),
                Some(other) => other.to_string(),
            };
            serialize_frontmatter(&payload, &body)?
        } else {
            payload.shift_remove(BODY_KEY);
            let mut text = serde_json::to_string_pretty(&payload)?;
            text.push('\n');
            text
        };

        self.bridge.put(path, &text).await?;
        debug!(path, collection = %collection.name, bytes = text.len(), "stored document");
        Ok(content_version(&text))
    }

    pub async fn delete(&self, path: &str) -> Result<()> {
        self.bridge.delete(path).await?;
        debug!(path, "deleted document");
        Ok(())
    }

    pub async fn exists(&self, path: &str) -> Result<bool> {
        Ok(self.bridge.exists(path).await?)
    }

    /// Paths of every document in `collection`, sorted.
    ///
    /// Markdown collections list both `.md` and `.markdown` files.
    pub async fn list_documents(&self, collection: &Collectable) -> Result<Vec<String>> {
        let mut paths = Vec::new();
        for pattern in collection.glob_patterns() {
            paths.extend(self.bridge.glob(&pattern).await?);
        }
        paths.sort();
        paths.dedup();
        Ok(paths)
    }
}

fn owning_collection<'a>(schema: &'a CompiledSchema, path: &str) -> Result<&'a Collectable> {
    schema
        .collection_for_path(path)
        .ok_or_else(|| DatabaseError::CollectionNotFound {
            path: path.to_string(),
        })
}

/// Template of a stored document: exact discriminator match, or the
/// collection's only template when none is stored.
fn stored_template<'a>(
    schema: &'a CompiledSchema,
    collection: &'a Collectable,
    path: &str,
    data: &Map<String, Value>,
) -> Result<&'a Templateable> {
    let templates = schema.collection_templates(collection);
    match data.get(DISCRIMINATOR_KEY) {
        Some(Value::String(tag)) => templates
            .into_iter()
            .find(|t| t.discriminator == *tag)
            .ok_or_else(|| template_not_found(collection, path, tag)),
        Some(other) => Err(template_not_found(collection, path, &other.to_string())),
        None => single_template(&templates, collection, path),
    }
}

/// Template of data about to be written. Callers may tag with either the
/// discriminator or the template name.
fn written_template<'a>(
    schema: &'a CompiledSchema,
    collection: &'a Collectable,
    path: &str,
    data: &Map<String, Value>,
) -> Result<&'a Templateable> {
    let templates = schema.collection_templates(collection);
    match data.get(DISCRIMINATOR_KEY) {
        Some(Value::String(tag)) => templates
            .into_iter()
            .find(|t| t.discriminator == *tag || t.name == *tag)
            .ok_or_else(|| template_not_found(collection, path, tag)),
        Some(other) => Err(template_not_found(collection, path, &other.to_string())),
        None => single_template(&templates, collection, path),
    }
}

fn single_template<'a>(
    templates: &[&'a Templateable],
    collection: &Collectable,
    path: &str,
) -> Result<&'a Templateable> {
    match templates {
        [only] => Ok(*only),
        _ => Err(DatabaseError::MissingDiscriminator {
            path: path.to_string(),
            collection: collection.name.clone(),
        }),
    }
}

fn template_not_found(collection: &Collectable, path: &str, tag: &str) -> DatabaseError {
    DatabaseError::TemplateNotFound {
        path: path.to_string(),
        collection: collection.name.clone(),
        template: tag.to_string(),
    }
}
