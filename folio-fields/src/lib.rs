//! Content model for folio
//!
//! `folio-fields` holds the user-authored, declarative description of a
//! content repository: collections of documents, the templates those documents
//! follow, and the fields each template declares. It is schema-only and has no
//! behavior beyond parsing and small inference helpers.
//!
//! # Architecture
//!
//! - **Declarative**: A [`RawSchema`] is read from YAML or JSON and never mutated
//! - **Global templates**: Templates declared once at the top level and referenced
//!   by bare name from collections or object fields
//! - **Tagged fields**: [`FieldType`] is a closed enum; compilation and dispatch
//!   match on it exhaustively

pub mod error;
pub mod types;

pub use error::{FieldsError, Result};
pub use types::{
    CollectionDef, FieldDef, FieldType, FieldsRef, Format, RawSchema, SelectOption, TemplateDef,
    TemplateRef,
};
