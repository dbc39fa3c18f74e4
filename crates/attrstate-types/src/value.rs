use std::collections::BTreeMap;

use crate::schema::FieldType;

/// One element's fields as stored: field name to raw string value.
pub type ElementFields = BTreeMap<String, String>;

/// One element's fields after coercion. Hash input only, never persisted.
pub type CoercedFields = BTreeMap<String, TypedValue>;

/// A scalar value coerced to its declared schema type.
#[derive(Clone, Debug, PartialEq)]
pub enum TypedValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl TypedValue {
    /// The schema tag this value satisfies.
    pub fn field_type(&self) -> FieldType {
        match self {
            Self::Bool(_) => FieldType::Bool,
            Self::Int(_) => FieldType::Int,
            Self::Float(_) => FieldType::Float,
            Self::String(_) => FieldType::String,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}
