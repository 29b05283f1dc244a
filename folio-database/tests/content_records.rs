//! Content records through the database, on both bridges

use std::sync::Arc;

use folio_bridge::{Bridge, FsBridge, MemoryBridge};
use folio_database::{Database, DatabaseError};
use folio_fields::{CollectionDef, FieldDef, RawSchema, TemplateDef, TemplateRef};
use serde_json::{json, Map, Value};
use tempfile::TempDir;

fn blog() -> RawSchema {
    RawSchema::new().collection(CollectionDef::with_templates(
        "posts",
        "content/posts",
        vec![TemplateRef::Inline(TemplateDef::new(
            "post",
            vec![FieldDef::string("title"), FieldDef::text("body").as_body()],
        ))],
    ))
}

fn object(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap()
}

async fn write_then_read(bridge: Arc<dyn Bridge>) {
    let db = Database::new(Arc::clone(&bridge));
    db.install_schema(&blog()).await.unwrap();

    db.put(
        "content/posts/a.md",
        &object(json!({"title": "Hi", "body": "Hello"})),
    )
    .await
    .unwrap();

    let stored = bridge.get("content/posts/a.md").await.unwrap();
    assert_eq!(stored, "---\ntitle: Hi\n---\nHello");

    let record = db.get("content/posts/a.md").await.unwrap();
    assert_eq!(record.data.get("title"), Some(&json!("Hi")));
    assert_eq!(record.data.get("_body"), Some(&json!("Hello")));
    assert_eq!(record.data.get("_collection"), Some(&json!("posts")));
    assert_eq!(record.data.get("_template"), Some(&json!("post")));

    // A record read back can be written back unchanged.
    db.put("content/posts/a.md", &record.data).await.unwrap();
    assert_eq!(bridge.get("content/posts/a.md").await.unwrap(), stored);
}

#[test_log::test(tokio::test)]
async fn markdown_round_trip_in_memory() {
    let bridge: Arc<dyn Bridge> = Arc::new(MemoryBridge::new().with_dir("content/posts"));
    write_then_read(bridge).await;
}

#[test_log::test(tokio::test)]
async fn markdown_round_trip_on_disk() {
    let temp = TempDir::new().unwrap();
    std::fs::create_dir_all(temp.path().join("content/posts")).unwrap();
    let bridge: Arc<dyn Bridge> = Arc::new(FsBridge::new(temp.path()));
    write_then_read(bridge).await;

    // System records land under the generated directory.
    assert!(temp
        .path()
        .join(".folio/__generated__/_lookup.json")
        .exists());
}

#[tokio::test]
async fn missing_document_is_not_found() {
    let bridge: Arc<dyn Bridge> = Arc::new(MemoryBridge::new().with_dir("content/posts"));
    let db = Database::new(bridge);
    db.install_schema(&blog()).await.unwrap();
    let err = db.get("content/posts/missing.md").await.unwrap_err();
    assert!(err.is_not_found());
    assert!(matches!(err, DatabaseError::Bridge(_)));
}
