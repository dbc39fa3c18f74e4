use attrstate_types::FieldType;

/// Errors from hashing operations.
///
/// Both variants mean the caller handed the hasher values that do not match
/// the schema's shape. They never originate from stored data.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum HashError {
    #[error("field {field}: schema declares {declared}, value is {actual}")]
    TypeMismatch {
        field: String,
        declared: FieldType,
        actual: FieldType,
    },

    #[error("field {field}: type {field_type} cannot be serialized as a scalar")]
    UnsupportedType { field: String, field_type: FieldType },
}
