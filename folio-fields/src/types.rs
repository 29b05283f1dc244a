//! Core content model types.
//!
//! All types serialize to/from YAML or JSON via serde. A [`RawSchema`] lists
//! collections; each collection either declares its fields directly or a set
//! of templates (polymorphic documents). Object fields nest further fields or
//! templates, and any template position may name a global template instead of
//! declaring one inline.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::debug;

use crate::error::{FieldsError, Result};

fn is_false(value: &bool) -> bool {
    !*value
}

/// Storage format of a collection's documents.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    #[default]
    Md,
    Markdown,
    Json,
}

impl Format {
    /// File extension (without the dot) used for new documents.
    pub fn extension(&self) -> &'static str {
        match self {
            Format::Md => "md",
            Format::Markdown => "markdown",
            Format::Json => "json",
        }
    }

    /// Map a file extension to a format. Unknown extensions yield `None`.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "md" => Some(Format::Md),
            "markdown" => Some(Format::Markdown),
            "json" => Some(Format::Json),
            _ => None,
        }
    }

    /// Whether documents carry front matter plus a body.
    pub fn is_markdown(&self) -> bool {
        matches!(self, Format::Md | Format::Markdown)
    }

    /// Every extension read and written with this format's codec.
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Format::Md | Format::Markdown => &["md", "markdown"],
            Format::Json => &["json"],
        }
    }

    /// Whether a document with extension `ext` belongs to this format.
    pub fn accepts(&self, ext: &str) -> bool {
        self.extensions().contains(&ext)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OptionRepr {
    Value(String),
    Full {
        value: String,
        #[serde(default)]
        label: Option<String>,
    },
}

/// A single option in an enumerated string field.
///
/// Accepts either a bare string or `{ value, label }`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(from = "OptionRepr")]
pub struct SelectOption {
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl From<OptionRepr> for SelectOption {
    fn from(repr: OptionRepr) -> Self {
        match repr {
            OptionRepr::Value(value) => Self { value, label: None },
            OptionRepr::Full { value, label } => Self { value, label },
        }
    }
}

impl From<&str> for SelectOption {
    fn from(value: &str) -> Self {
        Self {
            value: value.to_string(),
            label: None,
        }
    }
}

/// The `fields` position of an object field: inline fields, or the bare name
/// of a global template whose fields are reused.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FieldsRef {
    Named(String),
    Inline(Vec<FieldDef>),
}

/// An entry in a `templates` position: an inline template, or the bare name
/// of a global template.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum TemplateRef {
    Named(String),
    Inline(TemplateDef),
}

impl TemplateRef {
    /// The template name this entry refers to or declares.
    pub fn name(&self) -> &str {
        match self {
            TemplateRef::Named(name) => name,
            TemplateRef::Inline(def) => &def.name,
        }
    }
}

/// The type of a field, which determines the shape of its stored value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FieldType {
    String {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        options: Option<Vec<SelectOption>>,
    },
    Text,
    Number,
    Boolean,
    Datetime,
    Image,
    /// Nested record: either a single shape (`fields`) or a polymorphic set
    /// (`templates`). Declaring both is a schema error caught at compile time.
    Object {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fields: Option<FieldsRef>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        templates: Option<Vec<TemplateRef>>,
    },
    /// Stores document paths pointing into one or more collections.
    Reference { collections: Vec<String> },
}

impl FieldType {
    /// The `type` tag as written in schema files.
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldType::String { .. } => "string",
            FieldType::Text => "text",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Datetime => "datetime",
            FieldType::Image => "image",
            FieldType::Object { .. } => "object",
            FieldType::Reference { .. } => "reference",
        }
    }

    /// Whether this type may be mapped onto a markdown body.
    pub fn is_textual(&self) -> bool {
        matches!(self, FieldType::String { options: None } | FieldType::Text)
    }
}

/// The complete schema for a single named attribute.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldDef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub list: bool,
    #[serde(default, rename = "isBody", skip_serializing_if = "is_false")]
    pub is_body: bool,
    #[serde(flatten)]
    pub type_: FieldType,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, type_: FieldType) -> Self {
        Self {
            name: name.into(),
            label: None,
            description: None,
            list: false,
            is_body: false,
            type_,
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::String { options: None })
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Text)
    }

    pub fn reference(name: impl Into<String>, collections: &[&str]) -> Self {
        Self::new(
            name,
            FieldType::Reference {
                collections: collections.iter().map(|c| c.to_string()).collect(),
            },
        )
    }

    /// Object field with a single inline shape.
    pub fn group(name: impl Into<String>, fields: Vec<FieldDef>) -> Self {
        Self::new(
            name,
            FieldType::Object {
                fields: Some(FieldsRef::Inline(fields)),
                templates: None,
            },
        )
    }

    /// Object field with a polymorphic set of templates.
    pub fn blocks(name: impl Into<String>, templates: Vec<TemplateRef>) -> Self {
        Self::new(
            name,
            FieldType::Object {
                fields: None,
                templates: Some(templates),
            },
        )
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn as_list(mut self) -> Self {
        self.list = true;
        self
    }

    pub fn as_body(mut self) -> Self {
        self.is_body = true;
        self
    }

    /// Label shown to editors, falling back to the field name.
    pub fn effective_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }
}

/// A named field schema describing one possible document shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TemplateDef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
}

impl TemplateDef {
    pub fn new(name: impl Into<String>, fields: Vec<FieldDef>) -> Self {
        Self {
            name: name.into(),
            label: None,
            fields,
        }
    }

    pub fn effective_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }
}

/// A named bucket of documents stored under one path.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CollectionDef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Storage root of the collection, relative to the content root.
    pub path: String,
    #[serde(default)]
    pub format: Format,
    /// A global collection holds exactly one document (site settings and the like).
    #[serde(default, skip_serializing_if = "is_false")]
    pub global: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<FieldDef>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub templates: Option<Vec<TemplateRef>>,
}

impl CollectionDef {
    /// A non-polymorphic collection declaring its fields directly.
    pub fn with_fields(name: impl Into<String>, path: impl Into<String>, fields: Vec<FieldDef>) -> Self {
        Self {
            name: name.into(),
            label: None,
            path: path.into(),
            format: Format::default(),
            global: false,
            fields: Some(fields),
            templates: None,
        }
    }

    /// A collection whose documents follow one of several templates.
    pub fn with_templates(
        name: impl Into<String>,
        path: impl Into<String>,
        templates: Vec<TemplateRef>,
    ) -> Self {
        Self {
            name: name.into(),
            label: None,
            path: path.into(),
            format: Format::default(),
            global: false,
            fields: None,
            templates: Some(templates),
        }
    }

    pub fn format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    pub fn as_global(mut self) -> Self {
        self.global = true;
        self
    }

    pub fn effective_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }
}

/// The root, user-authored schema.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RawSchema {
    #[serde(default)]
    pub collections: Vec<CollectionDef>,
    /// Global templates, referenced by name from any template position.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub templates: Vec<TemplateDef>,
}

impl RawSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn collection(mut self, def: CollectionDef) -> Self {
        self.collections.push(def);
        self
    }

    pub fn template(mut self, def: TemplateDef) -> Self {
        self.templates.push(def);
        self
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        Ok(serde_yaml_ng::from_str(content)?)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Read a schema file, choosing the parser by extension.
    pub async fn load(path: &Path) -> Result<Self> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let content = match ext {
            "yaml" | "yml" | "json" => fs::read_to_string(path).await?,
            _ => {
                return Err(FieldsError::UnsupportedSchemaFormat {
                    path: path.to_path_buf(),
                })
            }
        };
        let schema = if ext == "json" {
            Self::from_json_str(&content)?
        } else {
            Self::from_yaml_str(&content)?
        };
        debug!(
            path = %path.display(),
            collections = schema.collections.len(),
            templates = schema.templates.len(),
            "loaded raw schema"
        );
        Ok(schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    #[test]
    fn scalar_field_yaml_round_trip() {
        let field = FieldDef::string("title").with_label("Title");
        let yaml = serde_yaml_ng::to_string(&field).unwrap();
        assert!(yaml.contains("type: string"));
        let parsed: FieldDef = serde_yaml_ng::from_str(&yaml).unwrap();
        assert_eq!(field, parsed);
    }

    #[test]
    fn body_flag_uses_camel_case_key() {
        let field = FieldDef::text("body").as_body();
        let yaml = serde_yaml_ng::to_string(&field).unwrap();
        assert!(yaml.contains("isBody: true"));
        assert!(!yaml.contains("is_body"));
    }

    #[test]
    fn options_accept_bare_strings_and_records() {
        let yaml = r#"
name: status
type: string
options:
  - draft
  - value: published
    label: Published
"#;
        let field: FieldDef = serde_yaml_ng::from_str(yaml).unwrap();
        let FieldType::String { options: Some(options) } = field.type_ else {
            panic!("expected string with options");
        };
        assert_eq!(options[0], SelectOption::from("draft"));
        assert_eq!(options[1].label.as_deref(), Some("Published"));
    }

    #[test]
    fn object_field_templates_mix_named_and_inline() {
        let yaml = r#"
name: sections
type: object
list: true
templates:
  - hero
  - name: quote
    fields:
      - name: author
        type: string
"#;
        let field: FieldDef = serde_yaml_ng::from_str(yaml).unwrap();
        assert!(field.list);
        let FieldType::Object {
            fields: None,
            templates: Some(templates),
        } = &field.type_
        else {
            panic!("expected templates object");
        };
        assert_eq!(templates[0], TemplateRef::Named("hero".into()));
        assert_eq!(templates[1].name(), "quote");
    }

    #[test]
    fn object_field_fields_may_name_global_template() {
        let yaml = r#"
name: seo
type: object
fields: seoFields
"#;
        let field: FieldDef = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(
            field.type_,
            FieldType::Object {
                fields: Some(FieldsRef::Named("seoFields".into())),
                templates: None,
            }
        );
    }

    #[test]
    fn reference_field_parses_collections() {
        let yaml = r#"
name: author
type: reference
collections: [authors, posts]
"#;
        let field: FieldDef = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(field, FieldDef::reference("author", &["authors", "posts"]));
    }

    #[rstest]
    #[case("md", Some(Format::Md))]
    #[case("markdown", Some(Format::Markdown))]
    #[case("json", Some(Format::Json))]
    #[case("txt", None)]
    fn format_from_extension(#[case] ext: &str, #[case] expected: Option<Format>) {
        assert_eq!(Format::from_extension(ext), expected);
    }

    #[rstest]
    #[case(Format::Md, "markdown", true)]
    #[case(Format::Markdown, "md", true)]
    #[case(Format::Md, "json", false)]
    #[case(Format::Json, "md", false)]
    #[case(Format::Json, "json", true)]
    fn format_accepts_its_family(#[case] format: Format, #[case] ext: &str, #[case] accepted: bool) {
        assert_eq!(format.accepts(ext), accepted);
    }

    #[test]
    fn collection_defaults_to_markdown() {
        let yaml = r#"
name: posts
path: content/posts
fields:
  - name: title
    type: string
"#;
        let collection: CollectionDef = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(collection.format, Format::Md);
        assert_eq!(collection.effective_label(), "posts");
    }

    #[test]
    fn raw_schema_from_json() {
        let json = r#"{
            "collections": [
                {"name": "posts", "path": "content/posts", "format": "json",
                 "templates": ["article"]}
            ],
            "templates": [
                {"name": "article", "fields": [{"name": "title", "type": "string"}]}
            ]
        }"#;
        let schema = RawSchema::from_json_str(json).unwrap();
        assert_eq!(schema.collections[0].format, Format::Json);
        assert_eq!(schema.templates[0].fields[0].name, "title");
    }

    #[tokio::test]
    async fn load_dispatches_on_extension() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("schema.yaml");
        std::fs::write(
            &path,
            "collections:\n  - name: posts\n    path: content/posts\n    fields: []\n",
        )
        .unwrap();
        let schema = RawSchema::load(&path).await.unwrap();
        assert_eq!(schema.collections.len(), 1);

        let bad = tmp.path().join("schema.xml");
        std::fs::write(&bad, "<schema/>").unwrap();
        let err = RawSchema::load(&bad).await.unwrap_err();
        assert!(matches!(err, FieldsError::UnsupportedSchemaFormat { .. }));
    }
}
