use attrstate_types::{CoercedFields, ElementKey, ElementSchema};

use crate::error::HashError;
use crate::serialize::serialize_for_hash;

/// Derives the key that addresses an element inside a content-addressed
/// collection.
///
/// Implementations must be pure and deterministic: the same schema and
/// fields always produce the same key, independent of how the field map was
/// built.
pub trait ElementHasher: Send + Sync {
    /// Identifier of the hash scheme, for logs and diagnostics.
    fn scheme(&self) -> &str;

    /// Compute the element key for `fields` under `schema`.
    fn element_key(
        &self,
        schema: &ElementSchema,
        fields: &CoercedFields,
    ) -> Result<ElementKey, HashError>;
}

/// The provider-wide element addressing scheme.
///
/// The element is serialized with [`serialize_for_hash`] and the key is the
/// CRC-32 (IEEE) checksum of those bytes, rendered as a non-negative decimal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SchemaHasher;

impl SchemaHasher {
    /// Scheme identifier reported by [`ElementHasher::scheme`].
    pub const SCHEME: &'static str = "crc32-ieee/schema-serialize-v1";

    pub const fn new() -> Self {
        Self
    }

    /// The numeric hash code for an element.
    pub fn hash_code(
        &self,
        schema: &ElementSchema,
        fields: &CoercedFields,
    ) -> Result<u32, HashError> {
        let buf = serialize_for_hash(schema, fields)?;
        Ok(Self::hash_str(&buf))
    }

    /// Hash code of an already-serialized element.
    pub fn hash_str(serialized: &str) -> u32 {
        crc32fast::hash(serialized.as_bytes())
    }
}

impl ElementHasher for SchemaHasher {
    fn scheme(&self) -> &str {
        Self::SCHEME
    }

    fn element_key(
        &self,
        schema: &ElementSchema,
        fields: &CoercedFields,
    ) -> Result<ElementKey, HashError> {
        self.hash_code(schema, fields).map(ElementKey::from_hash_code)
    }
}
