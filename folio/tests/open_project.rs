//! Opening a project directory end to end

use std::fs;
use std::path::Path;

use folio::{Folio, FolioConfig, FolioError, ResolveDocumentRequest};
use serde_json::json;
use serial_test::serial;
use tempfile::TempDir;

const SCHEMA: &str = r#"
templates:
  - name: cta
    fields:
      - name: label
        type: string
collections:
  - name: posts
    path: content/posts
    fields:
      - name: title
        type: string
      - name: blocks
        type: object
        list: true
        templates:
          - cta
      - name: body
        type: text
        isBody: true
"#;

fn project() -> TempDir {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join("content/posts")).unwrap();
    fs::create_dir_all(temp.path().join(".folio")).unwrap();
    fs::write(temp.path().join(".folio/schema.yaml"), SCHEMA).unwrap();
    temp
}

fn clear_env() {
    for (key, _) in std::env::vars().filter(|(k, _)| k.starts_with("FOLIO_")) {
        std::env::remove_var(key);
    }
}

#[tokio::test]
#[serial]
async fn open_installs_schema_and_writes_documents() {
    clear_env();
    let temp = project();
    let folio = Folio::open(temp.path()).await.unwrap();

    for record in ["_schema.json", "_graph.json", "_lookup.json"] {
        assert!(temp
            .path()
            .join(".folio/__generated__")
            .join(record)
            .exists());
    }

    let doc = folio
        .resolver()
        .resolve_document(&ResolveDocumentRequest::create(
            "posts",
            "hello",
            json!({"title": "Hello", "blocks": [{"cta": {"label": "Go"}}], "body": "Text"}),
        ))
        .await
        .unwrap();
    assert_eq!(doc.values["blocks"], json!([{"_template": "cta", "label": "Go"}]));

    let on_disk = fs::read_to_string(temp.path().join("content/posts/hello.md")).unwrap();
    assert!(on_disk.starts_with("---\ntitle: Hello\n"));
    assert!(on_disk.ends_with("---\nText"));
}

#[tokio::test]
#[serial]
async fn config_file_moves_content_root() {
    clear_env();
    let temp = TempDir::new().unwrap();
    let site = temp.path().join("site");
    fs::create_dir_all(site.join("content/posts")).unwrap();
    fs::create_dir_all(site.join(".folio")).unwrap();
    fs::write(site.join(".folio/schema.yaml"), SCHEMA).unwrap();
    fs::write(temp.path().join("folio.toml"), "content_root = \"site\"\n").unwrap();

    let folio = Folio::open(temp.path()).await.unwrap();
    assert_eq!(folio.root(), temp.path().join("site"));
    assert!(site.join(".folio/__generated__/_lookup.json").exists());
}

#[tokio::test]
#[serial]
async fn missing_schema_file_is_reported() {
    clear_env();
    let temp = TempDir::new().unwrap();
    let err = Folio::open_with(temp.path(), FolioConfig::default())
        .await
        .err()
        .unwrap();
    assert!(matches!(err, FolioError::SchemaNotFound { .. }));
}

#[tokio::test]
#[serial]
async fn failed_reload_keeps_previous_schema() {
    clear_env();
    let temp = project();
    let folio = Folio::open(temp.path()).await.unwrap();

    // Points at a collection directory that does not exist.
    fs::write(
        temp.path().join(".folio/schema.yaml"),
        "collections:\n  - name: pages\n    path: content/pages\n    fields: []\n",
    )
    .unwrap();
    assert!(folio.reload_schema().await.is_err());

    let installed = folio.database().snapshot().await.unwrap();
    assert!(installed.schema.collection("posts").is_some());
    assert!(installed.schema.collection("pages").is_none());
    assert_schema_file(temp.path());
}

fn assert_schema_file(root: &Path) {
    let persisted = fs::read_to_string(root.join(".folio/__generated__/_schema.json")).unwrap();
    assert!(persisted.contains("\"posts\""));
    assert!(!persisted.contains("\"pages\""));
}
