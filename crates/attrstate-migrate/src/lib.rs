//! Versioned schema migration for content-addressed collections.
//!
//! When an element type of a set-like collection gains or loses fields,
//! every element's content hash changes. A migration step re-keys the
//! collection without ever materializing the resource's object model:
//!
//! 1. **Extract**: group `<collection>.<key>.<field>` entries by element ([`extract`])
//! 2. **Coerce**: weakly parse each raw value into its declared type ([`coerce`])
//! 3. **Hash**: derive the new element key ([`attrstate_hash::ElementHasher`])
//! 4. **Rewrite**: drop the old keys and write the raw values under the new ones ([`rewrite`])
//!
//! Steps are selected by schema version through a [`Migrator`], the only
//! entry point callers need.
//!
//! # Design Rules
//!
//! 1. Coerce to validate, persist as raw: stored strings are never replaced
//!    by their canonical typed form.
//! 2. A step computes every element's new key before it writes anything; a
//!    failure leaves the state unchanged.
//! 3. One step per [`Migrator::migrate`] call. [`Migrator::upgrade`] chains.
//! 4. Absent or empty state is valid state, never an error.

pub mod catalog;
pub mod coerce;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod extract;
pub mod rewrite;
pub mod step;

// Re-export primary types at crate root for ergonomic imports.
pub use config::{MigrationPlan, StepConfig};
pub use dispatch::{MigrationOutcome, Migrator};
pub use error::{ErrorKind, MigrateError, MigrateResult};
pub use extract::{extract_elements, ExtractedElements};
pub use rewrite::{rewrite_collection, rewrite_element, ElementRewrite, RewriteSummary};
pub use step::{FieldPatch, MigrationStep, SetRewriteStep, StepReport};
