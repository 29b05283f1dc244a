//! Schema compiler.
//!
//! Turns a [`RawSchema`] into a [`CompiledSchema`]: global templates are
//! compiled once into a name-keyed table, bare-name references are checked
//! against it, and every nested shape gets a namespace
//! `[collection, ...field path]` that seeds its generated type name.
//!
//! Compilation is pure. Each step returns an immutable descriptor composed by
//! its caller; nothing is accumulated across recursive calls.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use tracing::debug;

use folio_fields::{CollectionDef, FieldDef, FieldType, FieldsRef, RawSchema, TemplateDef, TemplateRef};

use crate::error::{Result, SchemaError};
use crate::naming::{self, display_namespace};
use crate::types::{
    Collectable, CollectionShape, CompiledField, CompiledSchema, FieldShape, ScalarKind,
    TemplateHandle, Templateable,
};

const ROOT_NAMESPACE: &str = "schema";

/// Compile a raw schema.
///
/// Fails on the first malformed, ambiguous or duplicate declaration. Path
/// existence in the backing store is checked separately, by whoever owns the
/// store.
pub fn compile(raw: &RawSchema) -> Result<CompiledSchema> {
    let scope = Scope::new(raw);

    let mut templates = IndexMap::with_capacity(raw.templates.len());
    for def in &raw.templates {
        check_name(&def.name, &[ROOT_NAMESPACE])?;
        if templates.contains_key(&def.name) {
            return Err(SchemaError::DuplicateTemplate {
                namespace: ROOT_NAMESPACE.to_string(),
                name: def.name.clone(),
            });
        }
        let compiled = scope.compile_template(def, vec![def.name.clone()])?;
        templates.insert(def.name.clone(), compiled);
    }

    let mut names = HashSet::new();
    let mut collections = Vec::with_capacity(raw.collections.len());
    for def in &raw.collections {
        if !names.insert(def.name.as_str()) {
            return Err(SchemaError::DuplicateCollection {
                name: def.name.clone(),
            });
        }
        collections.push(scope.compile_collection(def)?);
    }
    check_overlapping_paths(&collections)?;

    let schema = CompiledSchema {
        collections,
        templates,
    };
    TypeNames::default().check(&schema)?;

    debug!(
        collections = schema.collections.len(),
        templates = schema.templates.len(),
        "compiled schema"
    );
    Ok(schema)
}

/// Read-only view of the names a raw schema declares.
struct Scope<'a> {
    globals: HashSet<&'a str>,
    collections: HashSet<&'a str>,
}

impl<'a> Scope<'a> {
    fn new(raw: &'a RawSchema) -> Self {
        Self {
            globals: raw.templates.iter().map(|t| t.name.as_str()).collect(),
            collections: raw.collections.iter().map(|c| c.name.as_str()).collect(),
        }
    }

    fn require_global(&self, name: &str, namespace: &[String]) -> Result<()> {
        if self.globals.contains(name) {
            Ok(())
        } else {
            Err(SchemaError::UnknownTemplate {
                name: name.to_string(),
                namespace: display_namespace(namespace),
            })
        }
    }

    fn compile_collection(&self, def: &CollectionDef) -> Result<Collectable> {
        check_name(&def.name, &[ROOT_NAMESPACE])?;
        let path = normalize_path(&def.path).ok_or_else(|| SchemaError::InvalidCollectionPath {
            collection: def.name.clone(),
            path: def.path.clone(),
        })?;
        let namespace = vec![def.name.clone()];

        let shape = match (&def.fields, &def.templates) {
            (Some(_), Some(_)) => {
                return Err(SchemaError::FieldsAndTemplates {
                    namespace: def.name.clone(),
                })
            }
            (Some(fields), None) => CollectionShape::Fields {
                template: self.compile_shape(
                    &def.name,
                    def.effective_label(),
                    fields,
                    namespace.clone(),
                )?,
            },
            (None, Some(refs)) => CollectionShape::Templates {
                templates: self.compile_refs(refs, &namespace)?,
            },
            (None, None) => {
                return Err(SchemaError::MissingFieldsOrTemplates {
                    namespace: def.name.clone(),
                })
            }
        };

        Ok(Collectable {
            name: def.name.clone(),
            label: def.effective_label().to_string(),
            path,
            format: def.format,
            global: def.global,
            document_type_name: naming::document_type_name(&def.name),
            connection_type_name: naming::connection_type_name(&def.name),
            data_type_name: naming::type_name(&namespace),
            namespace,
            shape,
        })
    }

    fn compile_template(&self, def: &TemplateDef, namespace: Vec<String>) -> Result<Templateable> {
        self.compile_shape(&def.name, def.effective_label(), &def.fields, namespace)
    }

    fn compile_shape(
        &self,
        name: &str,
        label: &str,
        fields: &[FieldDef],
        namespace: Vec<String>,
    ) -> Result<Templateable> {
        let mut seen = HashSet::new();
        let mut body: Option<&str> = None;
        let mut compiled = Vec::with_capacity(fields.len());

        for field in fields {
            if !seen.insert(field.name.as_str()) {
                return Err(SchemaError::DuplicateFieldName {
                    namespace: display_namespace(&namespace),
                    name: field.name.clone(),
                });
            }
            if field.is_body {
                if let Some(first) = body {
                    return Err(SchemaError::MultipleBodyFields {
                        namespace: display_namespace(&namespace),
                        first: first.to_string(),
                        second: field.name.clone(),
                    });
                }
                body = Some(&field.name);
            }
            compiled.push(self.compile_field(field, &namespace)?);
        }

        Ok(Templateable {
            name: name.to_string(),
            label: label.to_string(),
            type_name: naming::type_name(&namespace),
            discriminator: naming::discriminator(name),
            namespace,
            fields: compiled,
        })
    }

    fn compile_field(&self, def: &FieldDef, parent: &[String]) -> Result<CompiledField> {
        check_name(&def.name, parent)?;
        let mut namespace = parent.to_vec();
        namespace.push(def.name.clone());

        if def.is_body && (!def.type_.is_textual() || def.list) {
            let kind = if def.list {
                format!("{} list", def.type_.type_name())
            } else {
                def.type_.type_name().to_string()
            };
            return Err(SchemaError::InvalidBodyField {
                namespace: display_namespace(&namespace),
                kind,
            });
        }

        let scalar = |kind: ScalarKind| FieldShape::Scalar {
            kind,
            options: None,
            is_body: def.is_body,
        };

        let shape = match &def.type_ {
            FieldType::String { options } => FieldShape::Scalar {
                kind: ScalarKind::String,
                options: options.clone(),
                is_body: def.is_body,
            },
            FieldType::Text => scalar(ScalarKind::Text),
            FieldType::Number => scalar(ScalarKind::Number),
            FieldType::Boolean => scalar(ScalarKind::Boolean),
            FieldType::Datetime => scalar(ScalarKind::Datetime),
            FieldType::Image => scalar(ScalarKind::Image),
            FieldType::Object {
                fields: Some(_),
                templates: Some(_),
            } => {
                return Err(SchemaError::FieldsAndTemplates {
                    namespace: display_namespace(&namespace),
                })
            }
            FieldType::Object {
                fields: Some(FieldsRef::Named(name)),
                ..
            } => {
                self.require_global(name, &namespace)?;
                FieldShape::Object {
                    template: TemplateHandle::global(name.clone()),
                }
            }
            FieldType::Object {
                fields: Some(FieldsRef::Inline(fields)),
                ..
            } => FieldShape::Object {
                template: TemplateHandle::inline(self.compile_shape(
                    &def.name,
                    def.effective_label(),
                    fields,
                    namespace.clone(),
                )?),
            },
            FieldType::Object {
                templates: Some(refs),
                ..
            } => FieldShape::Union {
                type_name: naming::type_name(&namespace),
                templates: self.compile_refs(refs, &namespace)?,
            },
            FieldType::Object { .. } => {
                return Err(SchemaError::MissingFieldsOrTemplates {
                    namespace: display_namespace(&namespace),
                })
            }
            FieldType::Reference { collections } => {
                self.check_reference(collections, &namespace)?;
                let type_name = match collections.as_slice() {
                    [single] if def.list => naming::connection_type_name(single),
                    [single] => naming::document_type_name(single),
                    _ => naming::multi_reference_type_name(&namespace, def.list),
                };
                FieldShape::Reference {
                    type_name,
                    collections: collections.clone(),
                }
            }
        };

        Ok(CompiledField {
            name: def.name.clone(),
            label: def.effective_label().to_string(),
            description: def.description.clone(),
            list: def.list,
            namespace,
            shape,
        })
    }

    fn compile_refs(&self, refs: &[TemplateRef], namespace: &[String]) -> Result<Vec<TemplateHandle>> {
        if refs.is_empty() {
            return Err(SchemaError::MissingFieldsOrTemplates {
                namespace: display_namespace(namespace),
            });
        }

        let mut discriminators: HashMap<String, &str> = HashMap::new();
        let mut handles = Vec::with_capacity(refs.len());
        for template_ref in refs {
            let name = template_ref.name();
            check_name(name, namespace)?;
            if discriminators
                .insert(naming::discriminator(name), name)
                .is_some()
            {
                return Err(SchemaError::DuplicateTemplate {
                    namespace: display_namespace(namespace),
                    name: name.to_string(),
                });
            }

            let handle = match template_ref {
                TemplateRef::Named(name) => {
                    self.require_global(name, namespace)?;
                    TemplateHandle::global(name.clone())
                }
                TemplateRef::Inline(def) => {
                    let mut member_ns = namespace.to_vec();
                    member_ns.push(def.name.clone());
                    TemplateHandle::inline(self.compile_template(def, member_ns)?)
                }
            };
            handles.push(handle);
        }
        Ok(handles)
    }

    fn check_reference(&self, collections: &[String], namespace: &[String]) -> Result<()> {
        if collections.is_empty() {
            return Err(SchemaError::EmptyReference {
                namespace: display_namespace(namespace),
            });
        }
        for collection in collections {
            if !self.collections.contains(collection.as_str()) {
                return Err(SchemaError::UnknownCollection {
                    namespace: display_namespace(namespace),
                    collection: collection.clone(),
                });
            }
        }
        Ok(())
    }
}

fn check_name<S: AsRef<str>>(name: &str, namespace: &[S]) -> Result<()> {
    naming::validate_name(name)
        .map_err(|reason| SchemaError::invalid_name(display_namespace(namespace), name, reason))
}

/// Strip `./` and trailing slashes; reject empty, absolute or escaping paths.
fn normalize_path(path: &str) -> Option<String> {
    let trimmed = path.trim();
    let trimmed = trimmed.strip_prefix("./").unwrap_or(trimmed);
    let trimmed = trimmed.trim_end_matches('/');
    if trimmed.is_empty() || trimmed.starts_with('/') {
        return None;
    }
    if trimmed.split('/').any(|seg| seg.is_empty() || seg == "." || seg == "..") {
        return None;
    }
    Some(trimmed.to_string())
}

fn check_overlapping_paths(collections: &[Collectable]) -> Result<()> {
    for (i, a) in collections.iter().enumerate() {
        for b in &collections[i + 1..] {
            let overlaps = a.path == b.path
                || b.path.starts_with(&format!("{}/", a.path))
                || a.path.starts_with(&format!("{}/", b.path));
            if overlaps {
                return Err(SchemaError::OverlappingPaths {
                    first: a.path.clone(),
                    second: b.path.clone(),
                });
            }
        }
    }
    Ok(())
}

/// Claims every generated type name for exactly one owner.
#[derive(Default)]
struct TypeNames {
    owners: HashMap<String, String>,
}

impl TypeNames {
    fn check(mut self, schema: &CompiledSchema) -> Result<()> {
        for builtin in naming::BUILTIN_TYPES {
            self.owners
                .insert(builtin.to_string(), format!("builtin {builtin}"));
        }

        // Globals are visited here exactly once; use sites only name them.
        for template in schema.templates.values() {
            self.claim(
                &template.type_name,
                format!("template {}", display_namespace(&template.namespace)),
            )?;
            self.visit_fields(template)?;
        }

        for collection in &schema.collections {
            let owner = display_namespace(&collection.namespace);
            self.claim(
                &collection.document_type_name,
                format!("document {owner}"),
            )?;
            self.claim(
                &collection.connection_type_name,
                format!("connection {owner}"),
            )?;
            self.claim(&collection.data_type_name, format!("collection {owner}"))?;
            match &collection.shape {
                CollectionShape::Fields { template } => self.visit_fields(template)?,
                CollectionShape::Templates { templates } => self.visit_handles(templates)?,
            }
        }
        Ok(())
    }

    fn claim(&mut self, type_name: &str, owner: String) -> Result<()> {
        match self.owners.get(type_name) {
            Some(prev) if *prev != owner => Err(SchemaError::TypeNameCollision {
                type_name: type_name.to_string(),
                first: prev.clone(),
                second: owner,
            }),
            Some(_) => Ok(()),
            None => {
                self.owners.insert(type_name.to_string(), owner);
                Ok(())
            }
        }
    }

    fn visit_handles(&mut self, handles: &[TemplateHandle]) -> Result<()> {
        for handle in handles {
            if let TemplateHandle::Inline { template } = handle {
                self.claim(
                    &template.type_name,
                    format!("template {}", display_namespace(&template.namespace)),
                )?;
                self.visit_fields(template)?;
            }
        }
        Ok(())
    }

    fn visit_fields(&mut self, template: &Templateable) -> Result<()> {
        for field in &template.fields {
            let owner = display_namespace(&field.namespace);
            match &field.shape {
                FieldShape::Scalar { .. } => {}
                FieldShape::Object {
                    template: TemplateHandle::Inline { template },
                } => {
                    self.claim(&template.type_name, format!("object {owner}"))?;
                    self.visit_fields(template)?;
                }
                FieldShape::Object { .. } => {}
                FieldShape::Union {
                    type_name,
                    templates,
                } => {
                    self.claim(type_name, format!("union {owner}"))?;
                    self.visit_handles(templates)?;
                }
                FieldShape::Reference {
                    type_name,
                    collections,
                } => {
                    if collections.len() > 1 {
                        self.claim(type_name, format!("reference {owner}"))?;
                    }
                }
            }
        }
        Ok(())
    }
}
