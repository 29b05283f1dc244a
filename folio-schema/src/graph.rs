//! Compiled query-type graph.
//!
//! The graph lists every type a query surface over the schema exposes. Fields
//! flagged `lookup` are resolved by asking the lookup map about their return
//! type; everything else is plain property access on the parent value.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::naming::{DOCUMENT_NODE_TYPE, NODE_TYPE};
use crate::types::{
    Collectable, CollectionShape, CompiledSchema, FieldShape, TemplateHandle, Templateable,
};

pub const QUERY_TYPE: &str = "Query";
pub const MUTATION_TYPE: &str = "Mutation";
pub const SYSTEM_INFO_TYPE: &str = "SystemInfo";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GraphArg {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub required: bool,
}

impl GraphArg {
    fn required(name: &str, type_name: &str) -> Self {
        Self {
            name: name.to_string(),
            type_name: type_name.to_string(),
            required: true,
        }
    }

    fn optional(name: &str, type_name: &str) -> Self {
        Self {
            required: false,
            ..Self::required(name, type_name)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GraphField {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub list: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<GraphArg>,
    /// Resolved through the lookup map rather than by property access.
    #[serde(default)]
    pub lookup: bool,
}

impl GraphField {
    fn plain(name: &str, type_name: &str) -> Self {
        Self {
            name: name.to_string(),
            type_name: type_name.to_string(),
            list: false,
            args: Vec::new(),
            lookup: false,
        }
    }

    fn looked_up(name: &str, type_name: &str, args: Vec<GraphArg>) -> Self {
        Self {
            args,
            lookup: true,
            ..Self::plain(name, type_name)
        }
    }

    fn list(mut self) -> Self {
        self.list = true;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum GraphType {
    Object { fields: Vec<GraphField> },
    Union { members: Vec<String> },
}

/// Every generated type, keyed by name, in emission order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct TypeGraph {
    types: IndexMap<String, GraphType>,
}

impl TypeGraph {
    pub fn get(&self, type_name: &str) -> Option<&GraphType> {
        self.types.get(type_name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &GraphType)> {
        self.types.iter()
    }

    /// Type names the executor must consult the lookup map for: every
    /// lookup-flagged field's return type and every union.
    pub fn lookup_type_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for (name, ty) in &self.types {
            match ty {
                GraphType::Union { .. } => names.push(name),
                GraphType::Object { fields } => names.extend(
                    fields
                        .iter()
                        .filter(|f| f.lookup)
                        .map(|f| f.type_name.as_str()),
                ),
            }
        }
        names.sort_unstable();
        names.dedup();
        names
    }
}

impl FromIterator<(String, GraphType)> for TypeGraph {
    fn from_iter<I: IntoIterator<Item = (String, GraphType)>>(iter: I) -> Self {
        Self {
            types: iter.into_iter().collect(),
        }
    }
}

/// Build the query-type graph for a compiled schema.
pub fn build_graph(schema: &CompiledSchema) -> TypeGraph {
    let documents: Vec<String> = schema
        .collections
        .iter()
        .map(|c| c.document_type_name.clone())
        .collect();

    let mut types = vec![
        (QUERY_TYPE.to_string(), query_type(schema)),
        (MUTATION_TYPE.to_string(), mutation_type()),
        (SYSTEM_INFO_TYPE.to_string(), system_info_type()),
        (
            NODE_TYPE.to_string(),
            GraphType::Union {
                members: documents.clone(),
            },
        ),
        (
            DOCUMENT_NODE_TYPE.to_string(),
            GraphType::Union { members: documents },
        ),
    ];

    for template in schema.templates.values() {
        types.extend(template_types(schema, template));
    }
    for collection in &schema.collections {
        types.extend(collection_types(schema, collection));
    }

    types.into_iter().collect()
}

fn query_type(schema: &CompiledSchema) -> GraphType {
    let mut fields = vec![
        GraphField::looked_up(
            "node",
            NODE_TYPE,
            vec![GraphArg::required("id", "ID")],
        ),
        GraphField::looked_up(
            "document",
            DOCUMENT_NODE_TYPE,
            vec![
                GraphArg::required("collection", "String"),
                GraphArg::required("relativePath", "String"),
            ],
        ),
    ];
    for collection in &schema.collections {
        let relative_path = if collection.global {
            GraphArg::optional("relativePath", "String")
        } else {
            GraphArg::required("relativePath", "String")
        };
        fields.push(GraphField::looked_up(
            &collection.name,
            &collection.document_type_name,
            vec![relative_path],
        ));
        fields.push(GraphField::looked_up(
            &format!("{}Connection", collection.name),
            &collection.connection_type_name,
            Vec::new(),
        ));
    }
    GraphType::Object { fields }
}

fn mutation_type() -> GraphType {
    let target = || {
        vec![
            GraphArg::required("collection", "String"),
            GraphArg::required("relativePath", "String"),
        ]
    };
    let mut create = target();
    create.push(GraphArg::required("params", "JSON"));
    let mut update = target();
    update.push(GraphArg::required("params", "JSON"));
    update.push(GraphArg::optional("expectedVersion", "String"));

    GraphType::Object {
        fields: vec![
            GraphField::looked_up("createDocument", DOCUMENT_NODE_TYPE, create),
            GraphField::looked_up("updateDocument", DOCUMENT_NODE_TYPE, update),
            GraphField::looked_up("deleteDocument", DOCUMENT_NODE_TYPE, target()),
        ],
    }
}

fn system_info_type() -> GraphType {
    let mut fields: Vec<GraphField> = [
        "filename",
        "basename",
        "extension",
        "path",
        "relativePath",
        "collection",
        "template",
        "version",
    ]
    .into_iter()
    .map(|name| GraphField::plain(name, "String"))
    .collect();
    fields.push(GraphField::plain("breadcrumbs", "String").list());
    GraphType::Object { fields }
}

fn connection_type(document_type: &str) -> GraphType {
    GraphType::Object {
        fields: vec![
            GraphField::plain("totalCount", "Int"),
            GraphField::plain("edges", document_type).list(),
        ],
    }
}

fn collection_types(schema: &CompiledSchema, collection: &Collectable) -> Vec<(String, GraphType)> {
    let data = match &collection.shape {
        CollectionShape::Fields { .. } => GraphField::plain("data", &collection.data_type_name),
        CollectionShape::Templates { .. } => {
            GraphField::looked_up("data", &collection.data_type_name, Vec::new())
        }
    };
    let mut types = vec![
        (
            collection.document_type_name.clone(),
            GraphType::Object {
                fields: vec![
                    GraphField::plain("id", "ID"),
                    GraphField::plain("sys", SYSTEM_INFO_TYPE),
                    data,
                    GraphField::plain("values", "JSON"),
                    GraphField::plain("form", "JSON"),
                ],
            },
        ),
        (
            collection.connection_type_name.clone(),
            connection_type(&collection.document_type_name),
        ),
    ];

    match &collection.shape {
        CollectionShape::Fields { template } => types.extend(template_types(schema, template)),
        CollectionShape::Templates { templates } => {
            types.push((
                collection.data_type_name.clone(),
                union_type(schema, templates),
            ));
            types.extend(handle_types(schema, templates));
        }
    }
    types
}

fn union_type(schema: &CompiledSchema, handles: &[TemplateHandle]) -> GraphType {
    GraphType::Union {
        members: handles
            .iter()
            .filter_map(|h| schema.resolve(h))
            .map(|t| t.type_name.clone())
            .collect(),
    }
}

fn handle_types(schema: &CompiledSchema, handles: &[TemplateHandle]) -> Vec<(String, GraphType)> {
    handles
        .iter()
        .filter_map(|handle| match handle {
            TemplateHandle::Inline { template } => Some(template_types(schema, template)),
            TemplateHandle::Global { .. } => None,
        })
        .flatten()
        .collect()
}

fn template_types(schema: &CompiledSchema, template: &Templateable) -> Vec<(String, GraphType)> {
    let mut fields = Vec::with_capacity(template.fields.len());
    let mut nested = Vec::new();

    for field in &template.fields {
        let graph_field = match &field.shape {
            FieldShape::Scalar { kind, .. } => GraphField::plain(&field.name, kind.graph_type()),
            FieldShape::Object { template: handle } => {
                if let TemplateHandle::Inline { template } = handle {
                    nested.extend(template_types(schema, template));
                }
                let type_name = schema
                    .resolve(handle)
                    .map(|t| t.type_name.as_str())
                    .unwrap_or("JSON");
                GraphField::plain(&field.name, type_name)
            }
            FieldShape::Union {
                type_name,
                templates,
            } => {
                nested.push((type_name.clone(), union_type(schema, templates)));
                nested.extend(handle_types(schema, templates));
                GraphField::looked_up(&field.name, type_name, Vec::new())
            }
            FieldShape::Reference {
                type_name,
                collections,
            } => {
                if collections.len() > 1 {
                    let members = collections
                        .iter()
                        .filter_map(|c| schema.collection(c))
                        .map(|c| c.document_type_name.clone())
                        .collect();
                    if field.list {
                        nested.push((type_name.clone(), connection_type(DOCUMENT_NODE_TYPE)));
                    } else {
                        nested.push((type_name.clone(), GraphType::Union { members }));
                    }
                }
                GraphField::looked_up(&field.name, type_name, Vec::new())
            }
        };
        // A reference list is one connection value, not a list of them.
        let is_list = field.list && !matches!(field.shape, FieldShape::Reference { .. });
        fields.push(if is_list { graph_field.list() } else { graph_field });
    }

    let mut types = vec![(template.type_name.clone(), GraphType::Object { fields })];
    types.extend(nested);
    types
}
