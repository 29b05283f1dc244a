//! Document resolution and mutation for folio
//!
//! `folio-resolver` turns stored records into typed documents and typed
//! mutation input back into stored records, using the schema snapshot
//! installed in a [`folio_database::Database`].
//!
//! # Architecture
//!
//! - **Dispatch registry**: [`dispatch`] maps every [`FieldKind`] to one
//!   [`FieldHandler`]; reads, writes, forms and params all go through it
//! - **Two read views**: `data` for querying (polymorphic entries carry
//!   `__typename`) and `values` for editing (polymorphic entries carry
//!   `_template`)
//! - **Write then read back**: every mutation re-reads the stored document,
//!   so the returned shape is what a later read produces
//! - **Executor callback**: [`Resolver::resolve_field`] answers a generic
//!   query executor through the lookup map alone

pub mod dispatch;
pub mod document;
pub mod error;
pub mod executor;
pub mod form;
pub mod resolver;

pub use dispatch::{dispatch, FieldContext, FieldHandler, FieldKind, Resolved, TYPENAME_KEY};
pub use document::{
    CollectionListing, Connection, Document, ResolveDocumentRequest, SystemInfo,
};
pub use error::{ResolverError, Result};
pub use executor::ResolveInfo;
pub use form::{build_form, Component, Form, FormField, FormTemplate};
pub use resolver::Resolver;
