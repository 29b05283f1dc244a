//! Compiled schema descriptors.
//!
//! A [`CompiledSchema`] is the fully resolved, namespaced form of a
//! [`folio_fields::RawSchema`]. Global templates are compiled once and stored
//! by name; every use site holds a [`TemplateHandle::Global`] naming them
//! rather than a copy.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use folio_fields::{Format, SelectOption};

/// Scalar field kinds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ScalarKind {
    String,
    Text,
    Number,
    Boolean,
    Datetime,
    Image,
}

impl ScalarKind {
    /// Builtin query type carrying values of this kind.
    pub fn graph_type(&self) -> &'static str {
        match self {
            ScalarKind::String | ScalarKind::Text | ScalarKind::Image => "String",
            ScalarKind::Number => "Float",
            ScalarKind::Boolean => "Boolean",
            ScalarKind::Datetime => "DateTime",
        }
    }
}

/// Where a template's definition lives.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "source", rename_all = "camelCase")]
pub enum TemplateHandle {
    /// A global template, compiled once and looked up by name.
    Global { name: String },
    /// A template declared at this position.
    Inline { template: Box<Templateable> },
}

impl TemplateHandle {
    pub fn global(name: impl Into<String>) -> Self {
        Self::Global { name: name.into() }
    }

    pub fn inline(template: Templateable) -> Self {
        Self::Inline {
            template: Box::new(template),
        }
    }
}

/// The compiled shape of a field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "shape", rename_all = "camelCase")]
pub enum FieldShape {
    Scalar {
        kind: ScalarKind,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        options: Option<Vec<SelectOption>>,
        #[serde(default, rename = "isBody")]
        is_body: bool,
    },
    /// Single-shape nested record.
    Object { template: TemplateHandle },
    /// Polymorphic nested record(s), discriminated by `_template`.
    Union {
        #[serde(rename = "typeName")]
        type_name: String,
        templates: Vec<TemplateHandle>,
    },
    Reference {
        #[serde(rename = "typeName")]
        type_name: String,
        collections: Vec<String>,
    },
}

/// A compiled field, annotated with its namespace.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompiledField {
    pub name: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub list: bool,
    pub namespace: Vec<String>,
    pub shape: FieldShape,
}

impl CompiledField {
    pub fn is_body(&self) -> bool {
        matches!(self.shape, FieldShape::Scalar { is_body: true, .. })
    }
}

/// A compiled template: one concrete record shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Templateable {
    pub name: String,
    pub label: String,
    pub namespace: Vec<String>,
    /// Generated data type name for records of this shape.
    #[serde(rename = "typeName")]
    pub type_name: String,
    /// Value stored under `_template` for records of this shape.
    pub discriminator: String,
    pub fields: Vec<CompiledField>,
}

impl Templateable {
    pub fn field(&self, name: &str) -> Option<&CompiledField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// The field mapped onto a markdown body, if any.
    pub fn body_field(&self) -> Option<&CompiledField> {
        self.fields.iter().find(|f| f.is_body())
    }
}

/// How a collection types its documents.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum CollectionShape {
    /// Every document has the same fields.
    Fields { template: Templateable },
    /// Documents pick one of several templates via `_template`.
    Templates { templates: Vec<TemplateHandle> },
}

/// A compiled collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Collectable {
    pub name: String,
    pub label: String,
    /// Normalized storage root: no leading `./`, no trailing `/`.
    pub path: String,
    pub format: Format,
    /// A global collection holds a single document.
    #[serde(default)]
    pub global: bool,
    pub namespace: Vec<String>,
    #[serde(rename = "documentTypeName")]
    pub document_type_name: String,
    #[serde(rename = "connectionTypeName")]
    pub connection_type_name: String,
    /// Object type for `Fields`, union type for `Templates`.
    #[serde(rename = "dataTypeName")]
    pub data_type_name: String,
    pub shape: CollectionShape,
}

impl Collectable {
    /// Whether documents must carry a discriminator.
    ///
    /// A templates collection with a single template is not polymorphic: its
    /// documents are written without `_template` and read back unambiguously.
    pub fn is_polymorphic(&self) -> bool {
        matches!(&self.shape, CollectionShape::Templates { templates } if templates.len() > 1)
    }

    /// Whether `path` lies under this collection's root.
    pub fn contains_path(&self, path: &str) -> bool {
        path.strip_prefix(self.path.as_str())
            .is_some_and(|rest| rest.starts_with('/') && rest.len() > 1)
    }

    /// `path` with the collection root stripped.
    pub fn relative_path<'a>(&self, path: &'a str) -> Option<&'a str> {
        path.strip_prefix(self.path.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
            .filter(|rest| !rest.is_empty())
    }

    /// Storage path for a document given its path relative to the root.
    pub fn document_path(&self, relative_path: &str) -> String {
        format!("{}/{}", self.path, relative_path.trim_start_matches('/'))
    }

    /// Glob patterns matching every document of this collection, one per
    /// extension of its format.
    pub fn glob_patterns(&self) -> Vec<String> {
        self.format
            .extensions()
            .iter()
            .map(|ext| format!("{}/**/*.{ext}", self.path))
            .collect()
    }
}

/// The output of [`crate::compile`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CompiledSchema {
    pub collections: Vec<Collectable>,
    /// Global templates keyed by name, each compiled exactly once.
    #[serde(default)]
    pub templates: IndexMap<String, Templateable>,
}

impl CompiledSchema {
    pub fn collection(&self, name: &str) -> Option<&Collectable> {
        self.collections.iter().find(|c| c.name == name)
    }

    /// The collection whose path prefixes `path`.
    pub fn collection_for_path(&self, path: &str) -> Option<&Collectable> {
        self.collections.iter().find(|c| c.contains_path(path))
    }

    pub fn global_template(&self, name: &str) -> Option<&Templateable> {
        self.templates.get(name)
    }

    /// Follow a handle to its template definition.
    pub fn resolve<'a>(&'a self, handle: &'a TemplateHandle) -> Option<&'a Templateable> {
        match handle {
            TemplateHandle::Global { name } => self.templates.get(name),
            TemplateHandle::Inline { template } => Some(template),
        }
    }

    /// Every template a document of `collection` may follow, in declared order.
    pub fn collection_templates<'a>(&'a self, collection: &'a Collectable) -> Vec<&'a Templateable> {
        match &collection.shape {
            CollectionShape::Fields { template } => vec![template],
            CollectionShape::Templates { templates } => {
                templates.iter().filter_map(|h| self.resolve(h)).collect()
            }
        }
    }

    /// Exact match of a stored discriminator among `handles`.
    pub fn template_for_discriminator<'a>(
        &'a self,
        handles: &'a [TemplateHandle],
        discriminator: &str,
    ) -> Option<&'a Templateable> {
        handles
            .iter()
            .filter_map(|h| self.resolve(h))
            .find(|t| t.discriminator == discriminator)
    }

    /// Match a template by its declared name among `handles`.
    pub fn template_by_name<'a>(
        &'a self,
        handles: &'a [TemplateHandle],
        name: &str,
    ) -> Option<&'a Templateable> {
        handles
            .iter()
            .filter_map(|h| self.resolve(h))
            .find(|t| t.name == name)
    }
}
