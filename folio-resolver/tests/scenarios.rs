//! End-to-end resolution against an in-memory content store

use std::sync::Arc;

use folio_bridge::{Bridge, MemoryBridge};
use folio_database::{parse_frontmatter, Database};
use folio_fields::{
    CollectionDef, FieldDef, FieldType, Format, RawSchema, TemplateDef, TemplateRef,
};
use folio_resolver::{ResolveDocumentRequest, ResolveInfo, Resolver, ResolverError};
use folio_schema::graph::QUERY_TYPE;
use folio_schema::{FieldShape, ResolveType};
use serde_json::{json, Value};

fn schema() -> RawSchema {
    RawSchema::new()
        .collection(CollectionDef::with_templates(
            "posts",
            "content/posts",
            vec![TemplateRef::Inline(TemplateDef::new(
                "post",
                vec![
                    FieldDef::string("title"),
                    FieldDef::reference("related", &["authors", "posts"]),
                    FieldDef::text("body").as_body(),
                ],
            ))],
        ))
        .collection(CollectionDef::with_fields(
            "authors",
            "content/authors",
            vec![FieldDef::string("name")],
        ))
        .collection(CollectionDef::with_fields(
            "pages",
            "content/pages",
            vec![
                FieldDef::string("title"),
                FieldDef::blocks(
                    "sections",
                    vec![
                        TemplateRef::Inline(TemplateDef::new(
                            "Hero",
                            vec![FieldDef::string("title"), FieldDef::string("subtitle")],
                        )),
                        TemplateRef::Inline(TemplateDef::new(
                            "Quote",
                            vec![FieldDef::new("title", FieldType::Number)],
                        )),
                    ],
                )
                .as_list(),
            ],
        ))
        .collection(
            CollectionDef::with_fields(
                "settings",
                "content/settings",
                vec![
                    FieldDef::string("siteName"),
                    FieldDef::group("seo", vec![FieldDef::string("description")]),
                    FieldDef::reference("owners", &["authors"]).as_list(),
                ],
            )
            .format(Format::Json),
        )
}

async fn setup() -> (Arc<MemoryBridge>, Resolver) {
    let bridge = Arc::new(
        MemoryBridge::new()
            .with_dir("content/posts")
            .with_dir("content/authors")
            .with_dir("content/pages")
            .with_dir("content/settings"),
    );
    let db = Arc::new(Database::new(bridge.clone()));
    db.install_schema(&schema()).await.unwrap();
    (bridge, Resolver::new(db))
}

async fn create(resolver: &Resolver, collection: &str, relative: &str, params: Value) {
    resolver
        .resolve_document(&ResolveDocumentRequest::create(collection, relative, params))
        .await
        .unwrap();
}

#[test_log::test(tokio::test)]
async fn single_template_post_round_trips_through_front_matter() {
    let (bridge, resolver) = setup().await;
    let doc = resolver
        .resolve_document(&ResolveDocumentRequest::create(
            "posts",
            "a.md",
            json!({"title": "Hi", "body": "Hello"}),
        ))
        .await
        .unwrap();

    assert_eq!(
        bridge.get("content/posts/a.md").await.unwrap(),
        "---\ntitle: Hi\n---\nHello"
    );

    let record = resolver
        .database()
        .get("content/posts/a.md")
        .await
        .unwrap();
    assert_eq!(record.data["title"], "Hi");
    assert_eq!(record.data["_body"], "Hello");
    assert_eq!(record.data["_collection"], "posts");
    assert_eq!(record.data["_template"], "post");

    assert_eq!(doc.sys.basename, "a.md");
    assert_eq!(doc.sys.breadcrumbs, vec!["a"]);
    assert_eq!(doc.values["body"], "Hello");
}

#[tokio::test]
async fn blocks_store_discriminator_and_read_by_template_name() {
    let (bridge, resolver) = setup().await;
    let doc = resolver
        .resolve_document(&ResolveDocumentRequest::create(
            "pages",
            "home",
            json!({"sections": [{"Hero": {"title": "X"}}]}),
        ))
        .await
        .unwrap();

    let stored = bridge.get("content/pages/home.md").await.unwrap();
    let parsed = parse_frontmatter("content/pages/home.md", &stored).unwrap();
    assert_eq!(
        Value::Object(parsed.metadata),
        json!({"sections": [{"_template": "hero", "title": "X"}]})
    );

    assert_eq!(
        doc.values["sections"],
        json!([{"_template": "Hero", "title": "X", "subtitle": null}])
    );
    assert_eq!(doc.data["sections"][0]["__typename"], "PagesSectionsHero");
}

#[tokio::test]
async fn blocks_read_with_the_tagged_template_only() {
    let (bridge, resolver) = setup().await;
    bridge
        .put(
            "content/pages/mixed.md",
            "---\nsections:\n- _template: quote\n  title: 5\n  subtitle: stray\n- _template: hero\n  title: X\n---\n",
        )
        .await
        .unwrap();

    let doc = resolver
        .get_document("content/pages/mixed.md")
        .await
        .unwrap();
    assert_eq!(
        doc.values["sections"],
        json!([
            {"_template": "Quote", "title": 5},
            {"_template": "Hero", "title": "X", "subtitle": null}
        ])
    );
}

#[tokio::test]
async fn blocks_with_unknown_discriminator_fail_the_document() {
    let (bridge, resolver) = setup().await;
    bridge
        .put(
            "content/pages/bad.md",
            "---\nsections:\n- _template: banner\n  title: X\n---\n",
        )
        .await
        .unwrap();

    let err = resolver
        .get_document("content/pages/bad.md")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ResolverError::TemplateForDataNotFound { template, .. } if template == "banner"
    ));
}

#[tokio::test]
async fn creation_over_existing_document_is_rejected() {
    let (bridge, resolver) = setup().await;
    create(&resolver, "authors", "jane", json!({"name": "Jane"})).await;
    let before = bridge.get("content/authors/jane.md").await.unwrap();

    let err = resolver
        .resolve_document(&ResolveDocumentRequest::create(
            "authors",
            "jane.md",
            json!({"name": "Impostor"}),
        ))
        .await
        .unwrap_err();

    assert!(matches!(err, ResolverError::AlreadyExists { path } if path == "content/authors/jane.md"));
    assert_eq!(bridge.get("content/authors/jane.md").await.unwrap(), before);
}

#[tokio::test]
async fn multi_collection_reference_resolves_by_owning_path() {
    let (_, resolver) = setup().await;
    create(&resolver, "authors", "jane", json!({"name": "Jane"})).await;
    create(&resolver, "posts", "jane", json!({"title": "Also jane"})).await;
    let post = resolver
        .resolve_document(&ResolveDocumentRequest::create(
            "posts",
            "hello",
            json!({"title": "Hello", "related": "content/authors/jane.md"}),
        ))
        .await
        .unwrap();

    let installed = resolver.database().snapshot().await.unwrap();
    let posts = installed.schema.collection("posts").unwrap();
    let template = installed.schema.collection_templates(posts)[0];
    let FieldShape::Reference { type_name, .. } = &template.field("related").unwrap().shape else {
        panic!("related is a reference field");
    };
    assert!(matches!(
        installed.lookup.get(type_name).unwrap().strategy,
        ResolveType::MultiCollectionDocument { .. }
    ));

    let resolved = resolver
        .resolve_field(
            &post.data,
            &Value::Null,
            &ResolveInfo::new(&template.type_name, "related", type_name),
        )
        .await
        .unwrap();
    assert_eq!(resolved["id"], "content/authors/jane.md");
    assert_eq!(resolved["sys"]["collection"], "authors");
    assert_eq!(resolved["values"]["name"], "Jane");
}

#[tokio::test]
async fn reference_outside_declared_collections_is_rejected() {
    let (_, resolver) = setup().await;
    let err = resolver
        .resolve_document(&ResolveDocumentRequest::create(
            "settings",
            "site",
            json!({"owners": ["content/posts/a.md"]}),
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, ResolverError::InvalidParams { .. }));
}

#[tokio::test]
async fn editing_values_round_trip_to_identical_storage() {
    let (bridge, resolver) = setup().await;
    create(&resolver, "authors", "jane", json!({"name": "Jane"})).await;
    create(
        &resolver,
        "pages",
        "home",
        json!({
            "title": "Home",
            "sections": [
                {"Quote": {"title": 3}},
                {"Hero": {"title": "X", "subtitle": "Y"}}
            ]
        }),
    )
    .await;
    create(
        &resolver,
        "settings",
        "site",
        json!({
            "siteName": "Folio",
            "seo": {"description": "Docs"},
            "owners": ["content/authors/jane.md"]
        }),
    )
    .await;
    create(
        &resolver,
        "posts",
        "a",
        json!({"title": "Hi", "related": "content/authors/jane.md", "body": "Text\n"}),
    )
    .await;

    for path in [
        "content/pages/home.md",
        "content/settings/site.json",
        "content/posts/a.md",
    ] {
        let before = bridge.get(path).await.unwrap();
        let doc = resolver.get_document(path).await.unwrap();
        let params = resolver.params_from_values(&doc).await.unwrap();

        let rewritten = resolver
            .resolve_document(&ResolveDocumentRequest::update(
                &doc.sys.collection,
                &doc.sys.relative_path,
                params,
            ))
            .await
            .unwrap();

        assert_eq!(bridge.get(path).await.unwrap(), before, "{path}");
        assert_eq!(rewritten.values, doc.values, "{path}");
        assert_eq!(rewritten.sys.version, doc.sys.version, "{path}");
    }
}

#[tokio::test]
async fn query_root_fields_resolve_through_lookup() {
    let (_, resolver) = setup().await;
    create(&resolver, "authors", "jane", json!({"name": "Jane"})).await;
    create(&resolver, "authors", "abe", json!({"name": "Abe"})).await;

    let one = resolver
        .resolve_field(
            &Value::Null,
            &json!({"relativePath": "jane.md"}),
            &ResolveInfo::new(QUERY_TYPE, "authors", "AuthorsDocument"),
        )
        .await
        .unwrap();
    assert_eq!(one["values"]["name"], "Jane");

    let node = resolver
        .resolve_field(
            &Value::Null,
            &json!({"id": "content/authors/abe.md"}),
            &ResolveInfo::new(QUERY_TYPE, "node", "Node"),
        )
        .await
        .unwrap();
    assert_eq!(node["values"]["name"], "Abe");

    let all = resolver
        .resolve_field(
            &Value::Null,
            &Value::Null,
            &ResolveInfo::new(QUERY_TYPE, "authorsConnection", "AuthorsConnection"),
        )
        .await
        .unwrap();
    assert_eq!(all["totalCount"], 2);
    assert_eq!(all["edges"][0]["id"], "content/authors/abe.md");

    let missing = resolver
        .resolve_field(
            &Value::Null,
            &Value::Null,
            &ResolveInfo::new(QUERY_TYPE, "authors", "AuthorsDocument"),
        )
        .await
        .unwrap_err();
    assert!(matches!(missing, ResolverError::MissingArgument { .. }));
}

#[tokio::test]
async fn mutation_fields_create_update_and_delete() {
    let (bridge, resolver) = setup().await;
    let info = |field: &str| ResolveInfo::new("Mutation", field, "DocumentNode");

    let created = resolver
        .resolve_field(
            &Value::Null,
            &json!({"collection": "authors", "relativePath": "jane", "params": {"name": "Jane"}}),
            &info("createDocument"),
        )
        .await
        .unwrap();
    let version = created["sys"]["version"].as_str().unwrap().to_string();

    let updated = resolver
        .resolve_field(
            &Value::Null,
            &json!({
                "collection": "authors",
                "relativePath": "jane.md",
                "params": {"name": "Jane Doe"},
                "expectedVersion": version
            }),
            &info("updateDocument"),
        )
        .await
        .unwrap();
    assert_eq!(updated["values"]["name"], "Jane Doe");

    resolver
        .resolve_field(
            &Value::Null,
            &json!({"collection": "authors", "relativePath": "jane.md"}),
            &info("deleteDocument"),
        )
        .await
        .unwrap();
    assert!(!bridge.exists("content/authors/jane.md").await.unwrap());
}

#[tokio::test]
async fn collection_listing_is_lazy() {
    let (bridge, resolver) = setup().await;
    create(&resolver, "authors", "jane", json!({"name": "Jane"})).await;
    // Broken documents are listed, not parsed.
    bridge
        .put("content/authors/broken.md", "---\n: : :\n---\n")
        .await
        .unwrap();

    let listing = resolver.resolve_collection("authors").await.unwrap();
    assert_eq!(
        listing.documents,
        vec!["content/authors/broken.md", "content/authors/jane.md"]
    );
    assert_eq!(listing.templates, vec!["authors"]);
}

#[tokio::test]
async fn update_without_body_field_keeps_stored_body() {
    let (bridge, resolver) = setup().await;
    bridge
        .put("content/authors/a.md", "---\nname: A\n---\nImportant body\n")
        .await
        .unwrap();

    let doc = resolver
        .resolve_document(&ResolveDocumentRequest::update(
            "authors",
            "a.md",
            json!({"name": "B"}),
        ))
        .await
        .unwrap();
    assert_eq!(doc.values, json!({"name": "B"}));
    assert_eq!(
        bridge.get("content/authors/a.md").await.unwrap(),
        "---\nname: B\n---\nImportant body\n"
    );
}

#[tokio::test]
async fn crlf_front_matter_resolves() {
    let (bridge, resolver) = setup().await;
    bridge
        .put("content/authors/win.md", "---\r\nname: A\r\n---\r\nBody")
        .await
        .unwrap();
    bridge
        .put("content/authors/eof.md", "---\nname: E\n---")
        .await
        .unwrap();

    let win = resolver.get_document("content/authors/win.md").await.unwrap();
    assert_eq!(win.values["name"], "A");
    let eof = resolver.get_document("content/authors/eof.md").await.unwrap();
    assert_eq!(eof.values["name"], "E");
}

#[tokio::test]
async fn documents_follow_the_collection_format() {
    let (bridge, resolver) = setup().await;
    let err = resolver
        .resolve_document(&ResolveDocumentRequest::create(
            "authors",
            "x.json",
            json!({"name": "X"}),
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, ResolverError::InvalidParams { .. }));
    assert!(!bridge.exists("content/authors/x.json").await.unwrap());

    create(&resolver, "authors", "long.markdown", json!({"name": "L"})).await;
    create(&resolver, "authors", "short", json!({"name": "S"})).await;
    let listing = resolver.resolve_collection("authors").await.unwrap();
    assert_eq!(
        listing.documents,
        vec!["content/authors/long.markdown", "content/authors/short.md"]
    );
}

#[tokio::test]
async fn update_of_missing_document_fails() {
    let (bridge, resolver) = setup().await;
    let err = resolver
        .resolve_document(&ResolveDocumentRequest::update(
            "authors",
            "ghost.md",
            json!({"name": "G"}),
        ))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert!(!bridge.exists("content/authors/ghost.md").await.unwrap());
}
