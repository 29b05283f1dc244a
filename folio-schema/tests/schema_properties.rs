//! Property-based tests for schema compilation
//!
//! Names are drawn from a tiny alphabet so that generated schemas frequently
//! produce colliding type names; the compiler must either reject them or
//! guarantee every generated name belongs to exactly one shape.

use std::collections::HashMap;

use folio_fields::{CollectionDef, FieldDef, FieldType, RawSchema, TemplateDef, TemplateRef};
use folio_schema::{
    build_graph, build_lookup, compile, CollectionShape, CompiledSchema, FieldShape,
    TemplateHandle, Templateable,
};
use proptest::prelude::*;

// Generators for test data

fn name() -> impl Strategy<Value = String> {
    prop::string::string_regex(r"[a-c][a-cA-C_]{0,2}").expect("Valid regex for names")
}

fn field() -> impl Strategy<Value = FieldDef> {
    let leaf = (name(), 0..3u8).prop_map(|(name, kind)| match kind {
        0 => FieldDef::string(name),
        1 => FieldDef::text(name),
        _ => FieldDef::new(name, FieldType::Number),
    });
    leaf.prop_recursive(3, 16, 3, |inner| {
        prop_oneof![
            (name(), prop::collection::vec(inner.clone(), 0..3))
                .prop_map(|(name, fields)| FieldDef::group(name, fields)),
            (
                name(),
                prop::collection::vec((name(), prop::collection::vec(inner, 0..3)), 1..3)
            )
                .prop_map(|(name, templates)| {
                    let refs = templates
                        .into_iter()
                        .map(|(t, fields)| TemplateRef::Inline(TemplateDef::new(t, fields)))
                        .collect();
                    FieldDef::blocks(name, refs).as_list()
                }),
        ]
    })
}

fn raw_schema() -> impl Strategy<Value = RawSchema> {
    prop::collection::vec((name(), prop::collection::vec(field(), 0..4)), 1..4).prop_map(
        |collections| {
            collections
                .into_iter()
                .enumerate()
                .fold(RawSchema::new(), |raw, (i, (name, fields))| {
                    raw.collection(CollectionDef::with_fields(
                        name,
                        format!("content/c{i}"),
                        fields,
                    ))
                })
        },
    )
}

/// Record `type_name -> owning namespace` for every shape, failing on conflict.
fn claim(owners: &mut HashMap<String, String>, type_name: &str, owner: String) {
    if let Some(prev) = owners.get(type_name) {
        assert_eq!(prev, &owner, "type name {type_name} shared by two shapes");
    } else {
        owners.insert(type_name.to_string(), owner);
    }
}

fn walk_template(schema: &CompiledSchema, template: &Templateable, owners: &mut HashMap<String, String>) {
    claim(owners, &template.type_name, template.namespace.join("."));
    for field in &template.fields {
        match &field.shape {
            FieldShape::Object {
                template: TemplateHandle::Inline { template },
            } => walk_template(schema, template, owners),
            FieldShape::Union {
                type_name,
                templates,
            } => {
                claim(owners, type_name, field.namespace.join("."));
                for handle in templates {
                    if let TemplateHandle::Inline { template } = handle {
                        walk_template(schema, template, owners);
                    }
                }
            }
            _ => {}
        }
    }
}

proptest! {
    /// Property: accepted schemas never give two shapes the same type name
    #[test]
    fn prop_namespace_uniqueness(raw in raw_schema()) {
        if let Ok(schema) = compile(&raw) {
            let mut owners = HashMap::new();
            for collection in &schema.collections {
                let ns = collection.namespace.join(".");
                claim(&mut owners, &collection.document_type_name, format!("{ns}#document"));
                claim(&mut owners, &collection.connection_type_name, format!("{ns}#connection"));
                claim(&mut owners, &collection.data_type_name, ns);
                if let CollectionShape::Fields { template } = &collection.shape {
                    walk_template(&schema, template, &mut owners);
                }
            }
        }
    }

    /// Property: every type the graph resolves through the lookup map has an entry
    #[test]
    fn prop_lookup_completeness(raw in raw_schema()) {
        if let Ok(schema) = compile(&raw) {
            let graph = build_graph(&schema);
            let lookup = build_lookup(&schema);
            for name in graph.lookup_type_names() {
                prop_assert!(lookup.contains(name), "dangling type {}", name);
            }
        }
    }

    /// Property: compilation is deterministic
    #[test]
    fn prop_compile_is_deterministic(raw in raw_schema()) {
        let first = compile(&raw);
        let second = compile(&raw);
        prop_assert_eq!(first, second);
    }
}

#[test]
fn generator_produces_accepted_schemas() {
    // Guard against a generator that only ever yields rejected schemas.
    let raw = RawSchema::new().collection(CollectionDef::with_fields(
        "a",
        "content/a",
        vec![FieldDef::group("b", vec![FieldDef::string("c")])],
    ));
    assert!(compile(&raw).is_ok());
}
