//! Form descriptions: what an editing UI needs to render a template
//!
//! Forms are produced by each field kind's setter in the dispatch registry.
//! A recursive template is expanded once per branch; a nested occurrence of a
//! template already being expanded is emitted with `recursive: true` and no
//! fields.

use serde::{Deserialize, Serialize};

use folio_fields::SelectOption;
use folio_schema::{CompiledField, CompiledSchema, Templateable};

use crate::dispatch::{dispatch, FieldKind};

/// Editing widget for a field.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Component {
    Text,
    Textarea,
    Number,
    Toggle,
    Date,
    Image,
    Select,
    Tags,
    Reference,
    ReferenceList,
    Group,
    GroupList,
    Blocks,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FormField {
    pub name: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub component: Component,
    #[serde(default)]
    pub list: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_body: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<SelectOption>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub collections: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FormField>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub templates: Vec<FormTemplate>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub recursive: bool,
}

impl FormField {
    pub fn new(field: &CompiledField, component: Component) -> Self {
        Self {
            name: field.name.clone(),
            label: field.label.clone(),
            description: field.description.clone(),
            component,
            list: field.list,
            is_body: field.is_body(),
            options: Vec::new(),
            collections: Vec::new(),
            fields: Vec::new(),
            templates: Vec::new(),
            recursive: false,
        }
    }
}

/// One member of a blocks field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FormTemplate {
    pub name: String,
    pub label: String,
    #[serde(default)]
    pub fields: Vec<FormField>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub recursive: bool,
}

/// The full form for one document template.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Form {
    pub name: String,
    pub label: String,
    pub fields: Vec<FormField>,
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// Setter context: the schema plus the templates currently being expanded.
#[derive(Debug, Clone)]
pub struct FormContext<'a> {
    pub schema: &'a CompiledSchema,
    open: Vec<String>,
}

impl<'a> FormContext<'a> {
    pub fn new(schema: &'a CompiledSchema) -> Self {
        Self {
            schema,
            open: Vec::new(),
        }
    }

    /// Whether `template` is already being expanded higher up.
    pub fn is_open(&self, template: &Templateable) -> bool {
        self.open.contains(&template.type_name)
    }

    pub fn enter(&self, template: &Templateable) -> Self {
        let mut open = self.open.clone();
        open.push(template.type_name.clone());
        Self {
            schema: self.schema,
            open,
        }
    }

    /// Form fields of `template`, in declared order.
    pub fn fields(&self, template: &Templateable) -> Vec<FormField> {
        let inner = self.enter(template);
        template
            .fields
            .iter()
            .map(|field| dispatch(FieldKind::of(field)).form(&inner, field))
            .collect()
    }

    pub fn template(&self, template: &Templateable) -> FormTemplate {
        let recursive = self.is_open(template);
        FormTemplate {
            name: template.name.clone(),
            label: template.label.clone(),
            fields: if recursive {
                Vec::new()
            } else {
                self.fields(template)
            },
            recursive,
        }
    }
}

/// Build the form for a document template.
pub fn build_form(schema: &CompiledSchema, template: &Templateable) -> Form {
    Form {
        name: template.name.clone(),
        label: template.label.clone(),
        fields: FormContext::new(schema).fields(template),
    }
}
