use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Trailing path segment that holds a collection's cardinality (`<collection>.#`).
pub const COUNT_MARKER: &str = "#";

/// Token identifying one element within a collection's key paths.
///
/// For content-addressed collections the key is derived from the element's
/// own field values (see `attrstate-hash`), never assigned by the caller.
/// A key is a single path segment: non-empty and free of `.`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementKey(String);

impl ElementKey {
    /// Create a key from a raw path segment.
    pub fn new(raw: impl Into<String>) -> Result<Self, TypeError> {
        let raw = raw.into();
        if raw.is_empty() || raw.contains('.') || raw == COUNT_MARKER {
            return Err(TypeError::InvalidElementKey(raw));
        }
        Ok(Self(raw))
    }

    /// Key for a non-negative hash code, rendered in decimal.
    pub fn from_hash_code(code: u32) -> Self {
        Self(code.to_string())
    }

    /// The raw path segment.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ElementKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ElementKey({})", self.0)
    }
}

impl fmt::Display for ElementKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ElementKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Builds and splits the flat keys belonging to one collection.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollectionPath {
    name: String,
}

impl CollectionPath {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// The collection's attribute name (e.g. `ebs_block_device`).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Prefix shared by every key of this collection, including the trailing dot.
    pub fn prefix(&self) -> String {
        format!("{}.", self.name)
    }

    /// The cardinality key, `<collection>.#`.
    pub fn count_key(&self) -> String {
        format!("{}.{}", self.name, COUNT_MARKER)
    }

    /// Prefix shared by every field key of one element, including the trailing dot.
    pub fn element_prefix(&self, element: &ElementKey) -> String {
        format!("{}.{}.", self.name, element)
    }

    /// The key addressing `field` of element `element`.
    pub fn field_key(&self, element: &ElementKey, field: &str) -> String {
        format!("{}.{}.{}", self.name, element, field)
    }

    /// Split an element field key into `(element, field)`.
    ///
    /// Returns `None` for keys outside the collection, for the cardinality
    /// key, and for keys that lack either segment. The field part keeps any
    /// further dots verbatim.
    pub fn split_field_key<'k>(&self, key: &'k str) -> Option<(&'k str, &'k str)> {
        let rest = key.strip_prefix(self.name.as_str())?.strip_prefix('.')?;
        if rest == COUNT_MARKER {
            return None;
        }
        let (element, field) = rest.split_once('.')?;
        if element.is_empty() || field.is_empty() {
            return None;
        }
        Some((element, field))
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
