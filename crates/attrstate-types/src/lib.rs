//! Foundation types for flat attribute-store migration.
//!
//! A managed resource's state is persisted as a flat map of dot-path keys to
//! string values. Nested set-like collections are flattened as
//! `<collection>.<elementKey>.<field>`, where the element key is a content
//! hash of the element's fields. Every other attrstate crate depends on
//! `attrstate-types`.
//!
//! # Key Types
//!
//! - [`AttributeStore`] — Flat dot-path key/value map
//! - [`InstanceState`] — A resource's stored state plus its schema version
//! - [`ElementKey`] — Token addressing one element of a collection
//! - [`CollectionPath`] — Key-path construction and splitting for one collection
//! - [`ElementSchema`] — Field-type descriptor for a collection's element type
//! - [`TypedValue`] — A coerced scalar used as hash input

pub mod error;
pub mod path;
pub mod schema;
pub mod store;
pub mod value;

pub use error::TypeError;
pub use path::{CollectionPath, ElementKey, COUNT_MARKER};
pub use schema::{AttributeSchema, ElementSchema, FieldType};
pub use store::{AttributeStore, InstanceState};
pub use value::{CoercedFields, ElementFields, TypedValue};
