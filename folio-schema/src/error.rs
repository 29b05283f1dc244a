//! Error types for schema compilation

use thiserror::Error;

/// Result type for schema operations
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Errors raised while compiling a raw schema.
///
/// Every variant is fatal for the compilation that produced it; callers must
/// not install a partially compiled schema.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SchemaError {
    /// A bare template name does not match any global template
    #[error("unknown template '{name}' referenced from {namespace}")]
    UnknownTemplate { name: String, namespace: String },

    /// A collection path does not exist in the backing store
    #[error("collection '{collection}' path does not exist: {path}")]
    CollectionPathNotFound { collection: String, path: String },

    /// A collection path is empty or escapes the content root
    #[error("collection '{collection}' has an invalid path: '{path}'")]
    InvalidCollectionPath { collection: String, path: String },

    /// Two collection paths overlap, so a document could belong to both
    #[error("collection paths overlap: '{first}' and '{second}'")]
    OverlappingPaths { first: String, second: String },

    /// An object field or collection declares both `fields` and `templates`
    #[error("{namespace} declares both fields and templates")]
    FieldsAndTemplates { namespace: String },

    /// An object field or collection declares neither `fields` nor `templates`
    #[error("{namespace} declares neither fields nor templates")]
    MissingFieldsOrTemplates { namespace: String },

    /// More than one field in a template sets `isBody`
    #[error("template {namespace} has more than one body field: {first}, {second}")]
    MultipleBodyFields {
        namespace: String,
        first: String,
        second: String,
    },

    /// `isBody` set on a field that cannot hold markdown text
    #[error("field {namespace} cannot be a body field: type '{kind}'")]
    InvalidBodyField { namespace: String, kind: String },

    /// Duplicate field name within one template
    #[error("duplicate field name '{name}' in {namespace}")]
    DuplicateFieldName { namespace: String, name: String },

    /// Duplicate collection name
    #[error("duplicate collection name: {name}")]
    DuplicateCollection { name: String },

    /// Duplicate template name in one defining namespace
    #[error("duplicate template name '{name}' in {namespace}")]
    DuplicateTemplate { namespace: String, name: String },

    /// Name is not an identifier, or collides with a reserved key
    #[error("invalid name '{name}' in {namespace}: {reason}")]
    InvalidName {
        namespace: String,
        name: String,
        reason: String,
    },

    /// Reference field points at no collections
    #[error("reference field {namespace} names no collections")]
    EmptyReference { namespace: String },

    /// Reference field points at an undeclared collection
    #[error("reference field {namespace} names unknown collection '{collection}'")]
    UnknownCollection { namespace: String, collection: String },

    /// Two distinct shapes generate the same type name
    #[error("type name '{type_name}' generated by both {first} and {second}")]
    TypeNameCollision {
        type_name: String,
        first: String,
        second: String,
    },
}

impl SchemaError {
    pub fn invalid_name(
        namespace: impl Into<String>,
        name: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidName {
            namespace: namespace.into(),
            name: name.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SchemaError::UnknownTemplate {
            name: "hero".into(),
            namespace: "posts.sections".into(),
        };
        assert_eq!(
            err.to_string(),
            "unknown template 'hero' referenced from posts.sections"
        );
    }

    #[test]
    fn test_collision_display() {
        let err = SchemaError::TypeNameCollision {
            type_name: "PostsSeo".into(),
            first: "posts.seo".into(),
            second: "postsSeo".into(),
        };
        assert!(err.to_string().contains("PostsSeo"));
        assert!(err.to_string().contains("posts.seo"));
    }
}
