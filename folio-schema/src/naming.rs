//! Deterministic type naming.
//!
//! Every generated type name derives from a namespace alone, so naming is pure
//! and stable run-to-run. Names seed the lookup map and the persisted type
//! graph; changing a rule here invalidates both.

use heck::{ToLowerCamelCase, ToUpperCamelCase};

/// Key storing which template produced a polymorphic record.
pub const DISCRIMINATOR_KEY: &str = "_template";

/// Key holding a markdown document's body on a loaded record.
pub const BODY_KEY: &str = "_body";

pub const COLLECTION_KEY: &str = "_collection";
pub const RELATIVE_PATH_KEY: &str = "_relativePath";
pub const ID_KEY: &str = "_id";

/// Keys added to every loaded document; never valid as user field names.
pub const RESERVED_KEYS: &[&str] = &[
    DISCRIMINATOR_KEY,
    BODY_KEY,
    COLLECTION_KEY,
    RELATIVE_PATH_KEY,
    ID_KEY,
];

/// Type names owned by the query surface itself.
pub const BUILTIN_TYPES: &[&str] = &[
    "Query",
    "Mutation",
    "Node",
    "DocumentNode",
    "SystemInfo",
    "ID",
    "Int",
    "String",
    "Float",
    "Boolean",
    "DateTime",
    "JSON",
];

pub const NODE_TYPE: &str = "Node";
pub const DOCUMENT_NODE_TYPE: &str = "DocumentNode";

pub const MAX_NAME_LEN: usize = 64;

/// Join namespace segments, upper-camel-casing each one.
pub fn type_name<S: AsRef<str>>(namespace: &[S]) -> String {
    namespace
        .iter()
        .map(|segment| segment.as_ref().to_upper_camel_case())
        .collect()
}

/// `PostsDocument` for the `posts` collection.
pub fn document_type_name(collection: &str) -> String {
    format!("{}Document", type_name(&[collection]))
}

/// `PostsConnection` for the `posts` collection.
pub fn connection_type_name(collection: &str) -> String {
    format!("{}Connection", type_name(&[collection]))
}

/// Type of a reference field spanning several collections.
pub fn multi_reference_type_name<S: AsRef<str>>(namespace: &[S], list: bool) -> String {
    let suffix = if list { "Connection" } else { "Document" };
    format!("{}{suffix}", type_name(namespace))
}

/// Stored discriminator for a template: its name in lowerCamelCase.
pub fn discriminator(template_name: &str) -> String {
    template_name.to_lower_camel_case()
}

/// Dotted rendering of a namespace for error messages.
pub fn display_namespace<S: AsRef<str>>(namespace: &[S]) -> String {
    namespace
        .iter()
        .map(|s| s.as_ref())
        .collect::<Vec<_>>()
        .join(".")
}

/// Ensure a user-declared name is an ASCII identifier and not reserved.
pub fn validate_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("name is empty".to_string());
    }
    if name.len() > MAX_NAME_LEN {
        return Err(format!("name exceeds max length {MAX_NAME_LEN}"));
    }
    if name.starts_with('_') || RESERVED_KEYS.contains(&name) {
        return Err("names starting with '_' are reserved".to_string());
    }
    let mut chars = name.chars();
    let first_ok = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
    if !first_ok || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err("must match [A-Za-z][A-Za-z0-9_]*".to_string());
    }
    Ok(())
}
