//! Content hashing for set-like collection elements.
//!
//! Elements of a content-addressed collection are keyed by a hash of their
//! own field values. The key must be bit-for-bit identical to the one the
//! rest of the provider computes when it addresses the same element during
//! normal operation, so the serialization order and value formatting here
//! are a fixed, versioned scheme ([`SchemaHasher::SCHEME`]).
//!
//! Hosts with a different addressing scheme plug in their own
//! [`ElementHasher`].

pub mod error;
pub mod hasher;
pub mod serialize;

pub use error::HashError;
pub use hasher::{ElementHasher, SchemaHasher};
pub use serialize::{format_float, serialize_for_hash};
