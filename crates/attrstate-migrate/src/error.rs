use std::fmt;

use attrstate_hash::HashError;
use attrstate_types::FieldType;

/// Errors from migration operations.
#[derive(Debug, thiserror::Error)]
pub enum MigrateError {
    /// A stored value cannot be parsed as its declared type.
    #[error("{collection}.{element}.{field}: cannot parse {value:?} as {expected}: {reason}")]
    TypeCoercion {
        collection: String,
        element: String,
        field: String,
        expected: FieldType,
        value: String,
        reason: String,
    },

    /// No transition is defined from the declared schema version.
    #[error("unexpected schema version: {version} (current is {current})")]
    UnsupportedVersion { version: u32, current: u32 },

    /// The target schema declares a type the coercer cannot handle.
    #[error("internal: {collection}.{field} has non-scalar type {field_type}")]
    UnknownFieldType {
        collection: String,
        field: String,
        field_type: FieldType,
    },

    /// An element carries a field the target schema does not declare.
    #[error("internal: {collection}.{element}.{field} is not declared in the target schema")]
    UndeclaredField {
        collection: String,
        element: String,
        field: String,
    },

    /// The element hasher rejected coerced fields.
    #[error("internal: hashing {collection}.{element}: {source}")]
    Hash {
        collection: String,
        element: String,
        #[source]
        source: HashError,
    },

    /// A key under the collection prefix is not `<collection>.<element>.<field>`.
    #[error("malformed key in collection {collection}: {key:?}")]
    MalformedKey { collection: String, key: String },

    /// A migration plan or step registration is invalid.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Broad category of a [`MigrateError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad stored data; fixable upstream, then safe to re-run.
    Data,
    /// Version skew between the state and the tooling.
    UnsupportedVersion,
    /// A defect in a schema descriptor or hasher, never caused by data.
    Internal,
    /// A migration plan that cannot be loaded or registered.
    Config,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Data => "data",
            Self::UnsupportedVersion => "unsupported-version",
            Self::Internal => "internal",
            Self::Config => "config",
        };
        f.write_str(s)
    }
}

impl MigrateError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::TypeCoercion { .. } | Self::MalformedKey { .. } => ErrorKind::Data,
            Self::UnsupportedVersion { .. } => ErrorKind::UnsupportedVersion,
            Self::UnknownFieldType { .. } | Self::UndeclaredField { .. } | Self::Hash { .. } => {
                ErrorKind::Internal
            }
            Self::Config(_) => ErrorKind::Config,
        }
    }

    /// Returns `true` for contract violations in the caller's schema or hasher.
    pub fn is_internal(&self) -> bool {
        self.kind() == ErrorKind::Internal
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

/// Result alias for migration operations.
pub type MigrateResult<T> = Result<T, MigrateError>;
