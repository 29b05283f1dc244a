//! Lookup map: generated type name to resolution strategy.
//!
//! A generic query executor meeting a field whose declared return type is `T`
//! asks this table how to resolve `T`. It never needs to know the shape of
//! the user's schema.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::naming::{DOCUMENT_NODE_TYPE, NODE_TYPE};
use crate::types::{CollectionShape, CompiledSchema, FieldShape, TemplateHandle, Templateable};

/// How values of a type are fetched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "resolveType", rename_all = "camelCase")]
pub enum ResolveType {
    /// Any document, addressed by id.
    NodeDocument,
    /// The single document of a global collection.
    GlobalDocument { collection: String },
    CollectionDocument { collection: String },
    /// A document from any of several collections, picked by path.
    MultiCollectionDocument { collections: Vec<String> },
    CollectionDocumentList { collection: String },
    MultiCollectionDocumentList { collections: Vec<String> },
    /// Polymorphic record data; `type_map` maps stored discriminator to type name.
    UnionData {
        #[serde(rename = "typeMap")]
        type_map: IndexMap<String, String>,
    },
}

impl ResolveType {
    pub fn name(&self) -> &'static str {
        match self {
            ResolveType::NodeDocument => "nodeDocument",
            ResolveType::GlobalDocument { .. } => "globalDocument",
            ResolveType::CollectionDocument { .. } => "collectionDocument",
            ResolveType::MultiCollectionDocument { .. } => "multiCollectionDocument",
            ResolveType::CollectionDocumentList { .. } => "collectionDocumentList",
            ResolveType::MultiCollectionDocumentList { .. } => "multiCollectionDocumentList",
            ResolveType::UnionData { .. } => "unionData",
        }
    }
}

/// One row of the lookup map.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LookupEntry {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(flatten)]
    pub strategy: ResolveType,
}

impl LookupEntry {
    pub fn new(type_name: impl Into<String>, strategy: ResolveType) -> Self {
        Self {
            type_name: type_name.into(),
            strategy,
        }
    }
}

/// Accreting map of lookup entries keyed by type name.
///
/// Inserting an entry for a type that already has one replaces it, so a
/// rebuild after recompilation is idempotent.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct LookupMap {
    entries: IndexMap<String, LookupEntry>,
}

impl LookupMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite; returns the replaced entry.
    pub fn insert(&mut self, entry: LookupEntry) -> Option<LookupEntry> {
        self.entries.insert(entry.type_name.clone(), entry)
    }

    pub fn get(&self, type_name: &str) -> Option<&LookupEntry> {
        self.entries.get(type_name)
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.entries.contains_key(type_name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LookupEntry> {
        self.entries.values()
    }
}

impl FromIterator<LookupEntry> for LookupMap {
    fn from_iter<I: IntoIterator<Item = LookupEntry>>(iter: I) -> Self {
        let mut map = LookupMap::new();
        for entry in iter {
            map.insert(entry);
        }
        map
    }
}

/// Build the lookup map for a compiled schema.
pub fn build_lookup(schema: &CompiledSchema) -> LookupMap {
    let mut entries = vec![
        LookupEntry::new(NODE_TYPE, ResolveType::NodeDocument),
        LookupEntry::new(
            DOCUMENT_NODE_TYPE,
            ResolveType::MultiCollectionDocument {
                collections: schema.collections.iter().map(|c| c.name.clone()).collect(),
            },
        ),
    ];

    for template in schema.templates.values() {
        entries.extend(template_entries(schema, template));
    }

    for collection in &schema.collections {
        let document = if collection.global {
            ResolveType::GlobalDocument {
                collection: collection.name.clone(),
            }
        } else {
            ResolveType::CollectionDocument {
                collection: collection.name.clone(),
            }
        };
        entries.push(LookupEntry::new(&collection.document_type_name, document));
        entries.push(LookupEntry::new(
            &collection.connection_type_name,
            ResolveType::CollectionDocumentList {
                collection: collection.name.clone(),
            },
        ));

        match &collection.shape {
            CollectionShape::Fields { template } => {
                entries.extend(template_entries(schema, template));
            }
            CollectionShape::Templates { templates } => {
                entries.push(LookupEntry::new(
                    &collection.data_type_name,
                    union_data(schema, templates),
                ));
                entries.extend(handle_entries(schema, templates));
            }
        }
    }

    entries.into_iter().collect()
}

fn union_data(schema: &CompiledSchema, handles: &[TemplateHandle]) -> ResolveType {
    ResolveType::UnionData {
        type_map: handles
            .iter()
            .filter_map(|h| schema.resolve(h))
            .map(|t| (t.discriminator.clone(), t.type_name.clone()))
            .collect(),
    }
}

fn handle_entries(schema: &CompiledSchema, handles: &[TemplateHandle]) -> Vec<LookupEntry> {
    handles
        .iter()
        .filter_map(|handle| match handle {
            TemplateHandle::Inline { template } => Some(template_entries(schema, template)),
            // Globals contribute their entries once, from the top-level table.
            TemplateHandle::Global { .. } => None,
        })
        .flatten()
        .collect()
}

fn template_entries(schema: &CompiledSchema, template: &Templateable) -> Vec<LookupEntry> {
    let mut entries = Vec::new();
    for field in &template.fields {
        match &field.shape {
            FieldShape::Scalar { .. } => {}
            FieldShape::Object { template } => {
                if let TemplateHandle::Inline { template } = template {
                    entries.extend(template_entries(schema, template));
                }
            }
            FieldShape::Union {
                type_name,
                templates,
            } => {
                entries.push(LookupEntry::new(type_name, union_data(schema, templates)));
                entries.extend(handle_entries(schema, templates));
            }
            // Single-collection references reuse the collection's own entries.
            FieldShape::Reference {
                type_name,
                collections,
            } if collections.len() > 1 => {
                let strategy = if field.list {
                    ResolveType::MultiCollectionDocumentList {
                        collections: collections.clone(),
                    }
                } else {
                    ResolveType::MultiCollectionDocument {
                        collections: collections.clone(),
                    }
                };
                entries.push(LookupEntry::new(type_name, strategy));
            }
            FieldShape::Reference { .. } => {}
        }
    }
    entries
}
