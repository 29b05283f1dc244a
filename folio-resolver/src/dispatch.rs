//! Field-type dispatch registry
//!
//! Every field kind maps to one [`FieldHandler`] providing four symmetric
//! operations:
//!
//! - **get**: stored value to the `data` (query) and `values` (editing) views
//! - **form**: field descriptor to UI metadata
//! - **mutate**: mutation params to the stored value
//! - **params**: `values` view back to mutation params
//!
//! [`dispatch`] is an exhaustive match over [`FieldKind`]; no other code
//! branches on field kind.

use async_trait::async_trait;
use futures::future::try_join_all;
use serde_json::{Map, Value};

use folio_fields::SelectOption;
use folio_schema::naming::{display_namespace, DISCRIMINATOR_KEY};
use folio_schema::{
    CompiledField, CompiledSchema, FieldShape, ScalarKind, TemplateHandle, Templateable,
};

use crate::error::{ResolverError, Result};
use crate::form::{Component, FormContext, FormField};

/// Key naming a polymorphic entry's generated type in the `data` view.
pub const TYPENAME_KEY: &str = "__typename";

/// Closed set of field kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Text,
    Textarea,
    Number,
    Boolean,
    Datetime,
    Image,
    Select,
    Tags,
    Reference,
    ReferenceList,
    Group,
    GroupList,
    Blocks,
}

impl FieldKind {
    pub fn of(field: &CompiledField) -> Self {
        match &field.shape {
            FieldShape::Scalar { kind, options, .. } => match kind {
                ScalarKind::String if options.is_some() => FieldKind::Select,
                ScalarKind::String if field.list => FieldKind::Tags,
                ScalarKind::String => FieldKind::Text,
                ScalarKind::Text => FieldKind::Textarea,
                ScalarKind::Number => FieldKind::Number,
                ScalarKind::Boolean => FieldKind::Boolean,
                ScalarKind::Datetime => FieldKind::Datetime,
                ScalarKind::Image => FieldKind::Image,
            },
            FieldShape::Object { .. } if field.list => FieldKind::GroupList,
            FieldShape::Object { .. } => FieldKind::Group,
            FieldShape::Union { .. } => FieldKind::Blocks,
            FieldShape::Reference { .. } if field.list => FieldKind::ReferenceList,
            FieldShape::Reference { .. } => FieldKind::Reference,
        }
    }
}

/// The two read views of one value.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub data: Value,
    pub values: Value,
}

impl Resolved {
    fn same(value: Value) -> Self {
        Self {
            data: value.clone(),
            values: value,
        }
    }

    fn null() -> Self {
        Self::same(Value::Null)
    }

    fn list(items: Vec<Resolved>) -> Self {
        let (data, values) = items.into_iter().map(|r| (r.data, r.values)).unzip();
        Self {
            data: Value::Array(data),
            values: Value::Array(values),
        }
    }
}

/// Read-side context: the schema, the document being read, and its body.
#[derive(Debug, Clone, Copy)]
pub struct FieldContext<'a> {
    pub schema: &'a CompiledSchema,
    pub path: &'a str,
    body: Option<&'a str>,
}

impl<'a> FieldContext<'a> {
    /// Context for a document's top-level template.
    pub fn root(schema: &'a CompiledSchema, path: &'a str, body: Option<&'a str>) -> Self {
        Self { schema, path, body }
    }

    /// Context for a nested record; the body only maps onto top-level fields.
    pub fn nested(&self) -> Self {
        Self { body: None, ..*self }
    }

    fn invalid(&self, field: &CompiledField, message: impl Into<String>) -> ResolverError {
        ResolverError::invalid_data(self.path, display_namespace(&field.namespace), message)
    }
}

#[async_trait]
pub trait FieldHandler: Send + Sync {
    /// Stored value to both read views. `raw` is `None` when the key is absent.
    async fn get(
        &self,
        cx: &FieldContext<'_>,
        field: &CompiledField,
        raw: Option<&Value>,
    ) -> Result<Resolved>;

    /// UI metadata for the field.
    fn form(&self, cx: &FormContext<'_>, field: &CompiledField) -> FormField;

    /// Mutation params to the stored value.
    fn mutate(&self, schema: &CompiledSchema, field: &CompiledField, input: &Value) -> Result<Value>;

    /// `values` view back to mutation params.
    fn params(&self, schema: &CompiledSchema, field: &CompiledField, values: &Value) -> Result<Value>;
}

/// The handler for a field kind.
pub fn dispatch(kind: FieldKind) -> &'static dyn FieldHandler {
    match kind {
        FieldKind::Text => &TEXT,
        FieldKind::Textarea => &TEXTAREA,
        FieldKind::Number => &NUMBER,
        FieldKind::Boolean => &BOOLEAN,
        FieldKind::Datetime => &DATETIME,
        FieldKind::Image => &IMAGE,
        FieldKind::Select => &SELECT,
        FieldKind::Tags => &TAGS,
        FieldKind::Reference => &REFERENCE,
        FieldKind::ReferenceList => &REFERENCE_LIST,
        FieldKind::Group => &GROUP,
        FieldKind::GroupList => &GROUP_LIST,
        FieldKind::Blocks => &BLOCKS,
    }
}

static TEXT: ScalarHandler = ScalarHandler::new(Component::Text, JsonKind::String);
static TEXTAREA: ScalarHandler = ScalarHandler::new(Component::Textarea, JsonKind::String);
static NUMBER: ScalarHandler = ScalarHandler::new(Component::Number, JsonKind::Number);
static BOOLEAN: ScalarHandler = ScalarHandler::new(Component::Toggle, JsonKind::Boolean);
static DATETIME: ScalarHandler = ScalarHandler::new(Component::Date, JsonKind::String);
static IMAGE: ScalarHandler = ScalarHandler::new(Component::Image, JsonKind::String);
static SELECT: ScalarHandler = ScalarHandler::new(Component::Select, JsonKind::String);
static TAGS: ScalarHandler = ScalarHandler::new(Component::Tags, JsonKind::String);
static REFERENCE: ReferenceHandler = ReferenceHandler(Component::Reference);
static REFERENCE_LIST: ReferenceHandler = ReferenceHandler(Component::ReferenceList);
static GROUP: GroupHandler = GroupHandler(Component::Group);
static GROUP_LIST: GroupHandler = GroupHandler(Component::GroupList);
static BLOCKS: BlocksHandler = BlocksHandler;

// =============================================================================
// Template-level recursion
// =============================================================================

/// Resolve every field of `template` against a stored record.
///
/// Fields resolve concurrently; the output keeps declared field order.
pub async fn resolve_template(
    cx: &FieldContext<'_>,
    template: &Templateable,
    raw: &Map<String, Value>,
) -> Result<Resolved> {
    let resolved = try_join_all(template.fields.iter().map(|field| async move {
        dispatch(FieldKind::of(field))
            .get(cx, field, raw.get(&field.name))
            .await
    }))
    .await?;

    let mut data = Map::with_capacity(resolved.len());
    let mut values = Map::with_capacity(resolved.len());
    for (field, r) in template.fields.iter().zip(resolved) {
        data.insert(field.name.clone(), r.data);
        values.insert(field.name.clone(), r.values);
    }
    Ok(Resolved {
        data: Value::Object(data),
        values: Value::Object(values),
    })
}

/// Build the stored record for `template` from mutation params.
///
/// Keys come out in declared order; null or absent params are omitted.
pub fn mutate_template(
    schema: &CompiledSchema,
    template: &Templateable,
    input: &Map<String, Value>,
) -> Result<Map<String, Value>> {
    if let Some(unknown) = input.keys().find(|k| template.field(k).is_none()) {
        return Err(ResolverError::invalid_params(format!(
            "unknown field '{unknown}' for {}",
            display_namespace(&template.namespace)
        )));
    }

    let mut out = Map::with_capacity(input.len());
    for field in &template.fields {
        match input.get(&field.name) {
            None | Some(Value::Null) => {}
            Some(value) => {
                let stored = dispatch(FieldKind::of(field)).mutate(schema, field, value)?;
                out.insert(field.name.clone(), stored);
            }
        }
    }
    Ok(out)
}

/// Convert a `values` record for `template` back into mutation params.
pub fn template_params(
    schema: &CompiledSchema,
    template: &Templateable,
    values: &Map<String, Value>,
) -> Result<Map<String, Value>> {
    let mut out = Map::with_capacity(values.len());
    for field in &template.fields {
        match values.get(&field.name) {
            None | Some(Value::Null) => {}
            Some(value) => {
                let params = dispatch(FieldKind::of(field)).params(schema, field, value)?;
                out.insert(field.name.clone(), params);
            }
        }
    }
    Ok(out)
}

/// Apply `f` to each element of a list field's array, or to the value itself.
fn map_list(
    field: &CompiledField,
    input: &Value,
    mut f: impl FnMut(&Value) -> Result<Value>,
) -> Result<Value> {
    if !field.list {
        return f(input);
    }
    match input {
        Value::Array(items) => Ok(Value::Array(
            items.iter().map(&mut f).collect::<Result<Vec<_>>>()?,
        )),
        other => Err(ResolverError::invalid_params(format!(
            "{} expects a list, got {}",
            display_namespace(&field.namespace),
            json_kind(other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

fn resolve_handle<'s>(
    schema: &'s CompiledSchema,
    handle: &'s TemplateHandle,
) -> Result<&'s Templateable> {
    schema.resolve(handle).ok_or_else(|| match handle {
        TemplateHandle::Global { name } => {
            ResolverError::invalid_schema(format!("global template '{name}' is not installed"))
        }
        TemplateHandle::Inline { template } => {
            ResolverError::invalid_schema(format!("template '{}' is not resolvable", template.name))
        }
    })
}

// =============================================================================
// Scalars
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JsonKind {
    String,
    Number,
    Boolean,
}

impl JsonKind {
    fn accepts(&self, value: &Value) -> bool {
        match self {
            JsonKind::String => value.is_string(),
            JsonKind::Number => value.is_number(),
            JsonKind::Boolean => value.is_boolean(),
        }
    }
}

/// Stored value in, same value out. A body field reads the document body.
struct ScalarHandler {
    component: Component,
    expects: JsonKind,
}

impl ScalarHandler {
    const fn new(component: Component, expects: JsonKind) -> Self {
        Self { component, expects }
    }

    fn options(field: &CompiledField) -> &[SelectOption] {
        match &field.shape {
            FieldShape::Scalar {
                options: Some(options),
                ..
            } => options,
            _ => &[],
        }
    }
}

#[async_trait]
impl FieldHandler for ScalarHandler {
    async fn get(
        &self,
        cx: &FieldContext<'_>,
        field: &CompiledField,
        raw: Option<&Value>,
    ) -> Result<Resolved> {
        if field.is_body() {
            if let Some(body) = cx.body {
                return Ok(Resolved::same(Value::String(body.to_string())));
            }
        }
        Ok(Resolved::same(raw.cloned().unwrap_or(Value::Null)))
    }

    fn form(&self, _cx: &FormContext<'_>, field: &CompiledField) -> FormField {
        let mut form = FormField::new(field, self.component);
        form.options = Self::options(field).to_vec();
        form
    }

    fn mutate(&self, _schema: &CompiledSchema, field: &CompiledField, input: &Value) -> Result<Value> {
        let options = Self::options(field);
        map_list(field, input, |value| {
            if !self.expects.accepts(value) {
                return Err(ResolverError::invalid_params(format!(
                    "{} expects a {:?} value, got {}",
                    display_namespace(&field.namespace),
                    self.expects,
                    json_kind(value)
                )));
            }
            if !options.is_empty() && !options.iter().any(|o| value.as_str() == Some(o.value.as_str())) {
                return Err(ResolverError::invalid_params(format!(
                    "{} does not allow {value}",
                    display_namespace(&field.namespace)
                )));
            }
            Ok(value.clone())
        })
    }

    fn params(&self, _schema: &CompiledSchema, _field: &CompiledField, values: &Value) -> Result<Value> {
        Ok(values.clone())
    }
}

// =============================================================================
// References
// =============================================================================

/// Paths pass through unresolved; the lookup map drives resolution one level
/// up, so self-referencing collections never resolve eagerly.
struct ReferenceHandler(Component);

impl ReferenceHandler {
    fn collections(field: &CompiledField) -> &[String] {
        match &field.shape {
            FieldShape::Reference { collections, .. } => collections,
            _ => &[],
        }
    }
}

#[async_trait]
impl FieldHandler for ReferenceHandler {
    async fn get(
        &self,
        _cx: &FieldContext<'_>,
        _field: &CompiledField,
        raw: Option<&Value>,
    ) -> Result<Resolved> {
        Ok(Resolved::same(raw.cloned().unwrap_or(Value::Null)))
    }

    fn form(&self, _cx: &FormContext<'_>, field: &CompiledField) -> FormField {
        let mut form = FormField::new(field, self.0);
        form.collections = Self::collections(field).to_vec();
        form
    }

    fn mutate(&self, schema: &CompiledSchema, field: &CompiledField, input: &Value) -> Result<Value> {
        let allowed = Self::collections(field);
        map_list(field, input, |value| {
            let path = value.as_str().ok_or_else(|| {
                ResolverError::invalid_params(format!(
                    "{} expects a document path, got {}",
                    display_namespace(&field.namespace),
                    json_kind(value)
                ))
            })?;
            let owned = schema
                .collection_for_path(path)
                .is_some_and(|c| allowed.contains(&c.name));
            if !owned {
                return Err(ResolverError::invalid_params(format!(
                    "{} cannot reference '{path}': not in {}",
                    display_namespace(&field.namespace),
                    allowed.join(", ")
                )));
            }
            Ok(value.clone())
        })
    }

    fn params(&self, _schema: &CompiledSchema, _field: &CompiledField, values: &Value) -> Result<Value> {
        Ok(values.clone())
    }
}

// =============================================================================
// Groups
// =============================================================================

/// Single-shape nested records, one or a list.
struct GroupHandler(Component);

impl GroupHandler {
    fn template<'s>(schema: &'s CompiledSchema, field: &'s CompiledField) -> Result<&'s Templateable> {
        match &field.shape {
            FieldShape::Object { template } => resolve_handle(schema, template),
            _ => Err(ResolverError::invalid_schema(format!(
                "{} is not an object field",
                display_namespace(&field.namespace)
            ))),
        }
    }

    async fn get_one(
        cx: &FieldContext<'_>,
        field: &CompiledField,
        template: &Templateable,
        value: &Value,
    ) -> Result<Resolved> {
        match value {
            Value::Null => Ok(Resolved::null()),
            Value::Object(map) => resolve_template(&cx.nested(), template, map).await,
            other => Err(cx.invalid(field, format!("expected an object, got {}", json_kind(other)))),
        }
    }
}

#[async_trait]
impl FieldHandler for GroupHandler {
    async fn get(
        &self,
        cx: &FieldContext<'_>,
        field: &CompiledField,
        raw: Option<&Value>,
    ) -> Result<Resolved> {
        let template = Self::template(cx.schema, field)?;
        match raw {
            None | Some(Value::Null) => Ok(Resolved::null()),
            Some(Value::Array(items)) if field.list => {
                let items = try_join_all(
                    items
                        .iter()
                        .map(|item| Self::get_one(cx, field, template, item)),
                )
                .await?;
                Ok(Resolved::list(items))
            }
            Some(other) if field.list => {
                Err(cx.invalid(field, format!("expected a list, got {}", json_kind(other))))
            }
            Some(value) => Self::get_one(cx, field, template, value).await,
        }
    }

    fn form(&self, cx: &FormContext<'_>, field: &CompiledField) -> FormField {
        let mut form = FormField::new(field, self.0);
        if let Ok(template) = Self::template(cx.schema, field) {
            if cx.is_open(template) {
                form.recursive = true;
            } else {
                form.fields = cx.fields(template);
            }
        }
        form
    }

    fn mutate(&self, schema: &CompiledSchema, field: &CompiledField, input: &Value) -> Result<Value> {
        let template = Self::template(schema, field)?;
        map_list(field, input, |value| match value {
            Value::Object(map) => Ok(Value::Object(mutate_template(schema, template, map)?)),
            other => Err(ResolverError::invalid_params(format!(
                "{} expects an object, got {}",
                display_namespace(&field.namespace),
                json_kind(other)
            ))),
        })
    }

    fn params(&self, schema: &CompiledSchema, field: &CompiledField, values: &Value) -> Result<Value> {
        let template = Self::template(schema, field)?;
        map_list(field, values, |value| match value {
            Value::Object(map) => Ok(Value::Object(template_params(schema, template, map)?)),
            other => Err(ResolverError::invalid_params(format!(
                "{} expects an object, got {}",
                display_namespace(&field.namespace),
                json_kind(other)
            ))),
        })
    }
}

// =============================================================================
// Blocks
// =============================================================================

/// Polymorphic nested records discriminated by `_template`.
///
/// Stored entries carry the discriminator; reads match it exactly against the
/// declared templates and never fall back to another shape. Mutation params
/// are keyed by template name, exactly one key per entry.
struct BlocksHandler;

impl BlocksHandler {
    fn templates<'s>(field: &'s CompiledField) -> Result<&'s [TemplateHandle]> {
        match &field.shape {
            FieldShape::Union { templates, .. } => Ok(templates),
            _ => Err(ResolverError::invalid_schema(format!(
                "{} is not a blocks field",
                display_namespace(&field.namespace)
            ))),
        }
    }

    async fn get_one(
        cx: &FieldContext<'_>,
        field: &CompiledField,
        handles: &[TemplateHandle],
        value: &Value,
    ) -> Result<Resolved> {
        let map = match value {
            Value::Null => return Ok(Resolved::null()),
            Value::Object(map) => map,
            other => {
                return Err(cx.invalid(field, format!("expected an object, got {}", json_kind(other))))
            }
        };
        let tag = map
            .get(DISCRIMINATOR_KEY)
            .and_then(Value::as_str)
            .unwrap_or_default();
        let template = cx
            .schema
            .template_for_discriminator(handles, tag)
            .ok_or_else(|| ResolverError::TemplateForDataNotFound {
                field: display_namespace(&field.namespace),
                template: tag.to_string(),
            })?;

        let resolved = resolve_template(&cx.nested(), template, map).await?;
        Ok(Resolved {
            data: tagged(TYPENAME_KEY, &template.type_name, resolved.data),
            values: tagged(DISCRIMINATOR_KEY, &template.name, resolved.values),
        })
    }

    /// Split a `{TemplateName: {...}}` entry into its template and body.
    fn entry<'s, 'v>(
        schema: &'s CompiledSchema,
        field: &CompiledField,
        handles: &'s [TemplateHandle],
        value: &'v Value,
    ) -> Result<(&'s Templateable, &'v Map<String, Value>)> {
        let ns = display_namespace(&field.namespace);
        let map = value.as_object().ok_or_else(|| {
            ResolverError::invalid_params(format!("{ns} entries must be objects"))
        })?;
        let mut keys = map.iter();
        let (name, body) = match (keys.next(), keys.next()) {
            (Some(entry), None) => entry,
            (None, _) => {
                return Err(ResolverError::invalid_params(format!(
                    "{ns} entry names no template"
                )))
            }
            (Some(_), Some(_)) => {
                return Err(ResolverError::invalid_params(format!(
                    "{ns} entry names more than one template: {}",
                    map.keys().cloned().collect::<Vec<_>>().join(", ")
                )))
            }
        };
        let template = schema.template_by_name(handles, name).ok_or_else(|| {
            ResolverError::invalid_params(format!("{ns} has no template named '{name}'"))
        })?;
        let body = body.as_object().ok_or_else(|| {
            ResolverError::invalid_params(format!("{ns}.{name} expects an object"))
        })?;
        Ok((template, body))
    }
}

/// `value` (an object) with `key: tag` inserted first.
pub(crate) fn tagged(key: &str, tag: &str, value: Value) -> Value {
    let mut out = Map::new();
    out.insert(key.to_string(), Value::String(tag.to_string()));
    if let Value::Object(map) = value {
        out.extend(map);
    }
    Value::Object(out)
}

#[async_trait]
impl FieldHandler for BlocksHandler {
    async fn get(
        &self,
        cx: &FieldContext<'_>,
        field: &CompiledField,
        raw: Option<&Value>,
    ) -> Result<Resolved> {
        let handles = Self::templates(field)?;
        match raw {
            None | Some(Value::Null) => Ok(Resolved::null()),
            Some(Value::Array(items)) if field.list => {
                let items = try_join_all(
                    items
                        .iter()
                        .map(|item| Self::get_one(cx, field, handles, item)),
                )
                .await?;
                Ok(Resolved::list(items))
            }
            Some(other) if field.list => {
                Err(cx.invalid(field, format!("expected a list, got {}", json_kind(other))))
            }
            Some(value) => Self::get_one(cx, field, handles, value).await,
        }
    }

    fn form(&self, cx: &FormContext<'_>, field: &CompiledField) -> FormField {
        let mut form = FormField::new(field, Component::Blocks);
        if let Ok(handles) = Self::templates(field) {
            form.templates = handles
                .iter()
                .filter_map(|h| cx.schema.resolve(h))
                .map(|t| cx.template(t))
                .collect();
        }
        form
    }

    fn mutate(&self, schema: &CompiledSchema, field: &CompiledField, input: &Value) -> Result<Value> {
        let handles = Self::templates(field)?;
        map_list(field, input, |value| {
            let (template, body) = Self::entry(schema, field, handles, value)?;
            let stored = mutate_template(schema, template, body)?;
            Ok(tagged(
                DISCRIMINATOR_KEY,
                &template.discriminator,
                Value::Object(stored),
            ))
        })
    }

    fn params(&self, schema: &CompiledSchema, field: &CompiledField, values: &Value) -> Result<Value> {
        let handles = Self::templates(field)?;
        let ns = display_namespace(&field.namespace);
        map_list(field, values, |value| {
            let map = value
                .as_object()
                .ok_or_else(|| ResolverError::invalid_params(format!("{ns} entries must be objects")))?;
            let name = map
                .get(DISCRIMINATOR_KEY)
                .and_then(Value::as_str)
                .ok_or_else(|| ResolverError::invalid_params(format!("{ns} entry has no _template")))?;
            let template = schema.template_by_name(handles, name).ok_or_else(|| {
                ResolverError::TemplateForDataNotFound {
                    field: ns.clone(),
                    template: name.to_string(),
                }
            })?;
            let params = template_params(schema, template, map)?;
            let mut entry = Map::new();
            entry.insert(template.name.clone(), Value::Object(params));
            Ok(Value::Object(entry))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_fields::{CollectionDef, FieldDef, FieldType, RawSchema, TemplateDef, TemplateRef};
    use folio_schema::compile;
    use rstest::rstest;
    use serde_json::json;

    fn schema() -> CompiledSchema {
        let raw = RawSchema::new()
            .collection(CollectionDef::with_fields("authors", "content/authors", vec![]))
            .collection(CollectionDef::with_fields(
                "pages",
                "content/pages",
                vec![
                    FieldDef::string("title"),
                    FieldDef::new("count", FieldType::Number),
                    FieldDef::new(
                        "status",
                        FieldType::String {
                            options: Some(vec!["draft".into(), "live".into()]),
                        },
                    ),
                    FieldDef::string("tags").as_list(),
                    FieldDef::reference("author", &["authors"]),
                    FieldDef::group("seo", vec![FieldDef::string("title")]),
                    FieldDef::group("links", vec![FieldDef::string("href")]).as_list(),
                    FieldDef::blocks(
                        "sections",
                        vec![
                            TemplateRef::Inline(TemplateDef::new(
                                "Hero",
                                vec![FieldDef::string("title")],
                            )),
                            TemplateRef::Inline(TemplateDef::new(
                                "Quote",
                                vec![FieldDef::new("title", FieldType::Number)],
                            )),
                        ],
                    )
                    .as_list(),
                    FieldDef::text("body").as_body(),
                ],
            ));
        compile(&raw).unwrap()
    }

    fn page(schema: &CompiledSchema) -> &Templateable {
        schema.collection_templates(schema.collection("pages").unwrap())[0]
    }

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[rstest]
    #[case("title", FieldKind::Text)]
    #[case("count", FieldKind::Number)]
    #[case("status", FieldKind::Select)]
    #[case("tags", FieldKind::Tags)]
    #[case("author", FieldKind::Reference)]
    #[case("seo", FieldKind::Group)]
    #[case("links", FieldKind::GroupList)]
    #[case("sections", FieldKind::Blocks)]
    #[case("body", FieldKind::Textarea)]
    fn kind_of_field(#[case] name: &str, #[case] kind: FieldKind) {
        let schema = schema();
        assert_eq!(FieldKind::of(page(&schema).field(name).unwrap()), kind);
    }

    #[tokio::test]
    async fn test_resolve_keeps_declared_order() {
        let schema = schema();
        let raw = object(json!({
            "sections": [{"_template": "hero", "title": "X"}],
            "title": "T",
            "_body": "ignored key",
        }));
        let cx = FieldContext::root(&schema, "content/pages/a.md", Some("Body"));
        let resolved = resolve_template(&cx, page(&schema), &raw).await.unwrap();
        let keys: Vec<_> = resolved.values.as_object().unwrap().keys().cloned().collect();
        assert_eq!(
            keys,
            vec!["title", "count", "status", "tags", "author", "seo", "links", "sections", "body"]
        );
        assert_eq!(resolved.values["body"], json!("Body"));
        assert_eq!(resolved.values["count"], Value::Null);
    }

    #[tokio::test]
    async fn test_blocks_read_uses_matching_template() {
        let schema = schema();
        let raw = object(json!({
            "sections": [
                {"_template": "quote", "title": 5},
                {"_template": "hero", "title": "X"}
            ]
        }));
        let cx = FieldContext::root(&schema, "content/pages/a.md", None);
        let resolved = resolve_template(&cx, page(&schema), &raw).await.unwrap();
        assert_eq!(
            resolved.values["sections"],
            json!([
                {"_template": "Quote", "title": 5},
                {"_template": "Hero", "title": "X"}
            ])
        );
        assert_eq!(
            resolved.data["sections"],
            json!([
                {"__typename": "PagesSectionsQuote", "title": 5},
                {"__typename": "PagesSectionsHero", "title": "X"}
            ])
        );
    }

    #[tokio::test]
    async fn test_blocks_unmatched_discriminator_fails() {
        let schema = schema();
        let raw = object(json!({"sections": [{"_template": "banner"}]}));
        let cx = FieldContext::root(&schema, "content/pages/a.md", None);
        let err = resolve_template(&cx, page(&schema), &raw).await.unwrap_err();
        assert!(matches!(
            err,
            ResolverError::TemplateForDataNotFound { template, .. } if template == "banner"
        ));
    }

    #[tokio::test]
    async fn test_blocks_missing_discriminator_fails() {
        let schema = schema();
        let raw = object(json!({"sections": [{"title": "X"}]}));
        let cx = FieldContext::root(&schema, "content/pages/a.md", None);
        assert!(matches!(
            resolve_template(&cx, page(&schema), &raw).await,
            Err(ResolverError::TemplateForDataNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_group_with_wrong_shape_fails() {
        let schema = schema();
        let raw = object(json!({"seo": "not an object"}));
        let cx = FieldContext::root(&schema, "content/pages/a.md", None);
        assert!(matches!(
            resolve_template(&cx, page(&schema), &raw).await,
            Err(ResolverError::InvalidData { .. })
        ));
    }

    #[test]
    fn test_blocks_mutation_tags_entries() {
        let schema = schema();
        let stored = mutate_template(
            &schema,
            page(&schema),
            &object(json!({"sections": [{"Hero": {"title": "X"}}]})),
        )
        .unwrap();
        assert_eq!(
            Value::Object(stored),
            json!({"sections": [{"_template": "hero", "title": "X"}]})
        );
    }

    #[test]
    fn test_blocks_mutation_rejects_two_keys() {
        let schema = schema();
        let err = mutate_template(
            &schema,
            page(&schema),
            &object(json!({"sections": [{"Hero": {}, "Quote": {}}]})),
        )
        .unwrap_err();
        assert!(err.to_string().contains("more than one template"));
    }

    #[test]
    fn test_blocks_mutation_uses_named_template_fields() {
        let schema = schema();
        // Quote.title is a number; a string must be rejected even though
        // Hero.title would accept it.
        let err = mutate_template(
            &schema,
            page(&schema),
            &object(json!({"sections": [{"Quote": {"title": "X"}}]})),
        )
        .unwrap_err();
        assert!(matches!(err, ResolverError::InvalidParams { .. }));
    }

    #[rstest]
    #[case(json!({"count": "3"}))]
    #[case(json!({"status": "archived"}))]
    #[case(json!({"tags": "one"}))]
    #[case(json!({"author": "content/pages/other.md"}))]
    #[case(json!({"seo": ["x"]}))]
    #[case(json!({"nope": 1}))]
    fn test_invalid_params(#[case] params: Value) {
        let schema = schema();
        let result = mutate_template(&schema, page(&schema), &object(params));
        assert!(matches!(result, Err(ResolverError::InvalidParams { .. })));
    }

    #[test]
    fn test_mutation_orders_and_omits_nulls() {
        let schema = schema();
        let stored = mutate_template(
            &schema,
            page(&schema),
            &object(json!({
                "links": [{"href": "/a"}],
                "title": "T",
                "count": null,
                "author": "content/authors/jane.md",
            })),
        )
        .unwrap();
        let keys: Vec<_> = stored.keys().cloned().collect();
        assert_eq!(keys, vec!["title", "author", "links"]);
    }

    #[test]
    fn test_params_invert_values() {
        let schema = schema();
        let values = object(json!({
            "title": "T",
            "count": null,
            "seo": {"title": "S"},
            "sections": [{"_template": "Hero", "title": "X"}]
        }));
        let params = template_params(&schema, page(&schema), &values).unwrap();
        assert_eq!(
            Value::Object(params),
            json!({
                "title": "T",
                "seo": {"title": "S"},
                "sections": [{"Hero": {"title": "X"}}]
            })
        );
    }
}
