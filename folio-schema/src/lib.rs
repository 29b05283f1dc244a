//! Schema compiler and lookup map builder for folio
//!
//! `folio-schema` turns a user-authored [`folio_fields::RawSchema`] into the
//! structures the rest of the engine consults at request time.
//!
//! # Architecture
//!
//! - **Pure compilation**: [`compile`] returns immutable descriptors and never
//!   touches storage; path existence is verified by the database layer
//! - **Namespaces**: every nested shape is named by its path from the
//!   collection root, and [`naming::type_name`] derives its type name from it
//! - **Lookup map**: [`build_lookup`] maps each generated type name to one
//!   [`ResolveType`], the only schema knowledge a generic executor needs
//! - **Type graph**: [`build_graph`] lists the query surface the lookup map serves

pub mod compiler;
pub mod error;
pub mod graph;
pub mod lookup;
pub mod naming;
pub mod types;

pub use compiler::compile;
pub use error::{Result, SchemaError};
pub use graph::{build_graph, GraphArg, GraphField, GraphType, TypeGraph};
pub use lookup::{build_lookup, LookupEntry, LookupMap, ResolveType};
pub use types::{
    Collectable, CollectionShape, CompiledField, CompiledSchema, FieldShape, ScalarKind,
    TemplateHandle, Templateable,
};
