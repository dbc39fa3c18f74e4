use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("unknown field type: {0}")]
    UnknownFieldType(String),

    #[error("invalid element key: {0:?}")]
    InvalidElementKey(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}
