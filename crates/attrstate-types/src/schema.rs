use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Semantic type tag of a schema attribute.
///
/// Only the scalar tags can be coerced from a flat string value. The
/// collection tags are carried so schemas can be described faithfully; a
/// coercer that meets one inside an element schema reports a contract
/// violation rather than a data error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Bool,
    Int,
    Float,
    String,
    List,
    Map,
    Set,
}

impl FieldType {
    /// Returns `true` for the four tags a flat string can be coerced into.
    pub fn is_scalar(&self) -> bool {
        matches!(self, Self::Bool | Self::Int | Self::Float | Self::String)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::String => "string",
            Self::List => "list",
            Self::Map => "map",
            Self::Set => "set",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bool" => Ok(Self::Bool),
            "int" => Ok(Self::Int),
            "float" => Ok(Self::Float),
            "string" => Ok(Self::String),
            "list" => Ok(Self::List),
            "map" => Ok(Self::Map),
            "set" => Ok(Self::Set),
            other => Err(TypeError::UnknownFieldType(other.to_string())),
        }
    }
}

/// Declaration of one attribute in an element schema.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeSchema {
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub computed: bool,
}

impl AttributeSchema {
    pub fn required(field_type: FieldType) -> Self {
        Self {
            field_type,
            required: true,
            optional: false,
            computed: false,
        }
    }

    pub fn optional(field_type: FieldType) -> Self {
        Self {
            field_type,
            required: false,
            optional: true,
            computed: false,
        }
    }

    /// Optional attribute whose value the provider fills in when unset.
    pub fn optional_computed(field_type: FieldType) -> Self {
        Self {
            computed: true,
            ..Self::optional(field_type)
        }
    }

    /// Attribute known only after apply.
    pub fn computed(field_type: FieldType) -> Self {
        Self {
            field_type,
            required: false,
            optional: false,
            computed: true,
        }
    }

    /// Whether the attribute is user-provided and therefore part of an
    /// element's content hash.
    pub fn contributes_to_hash(&self) -> bool {
        self.required || self.optional
    }
}

/// Field-type descriptor for a collection's element type.
///
/// Attributes are kept in a `BTreeMap` so iteration is in ascending byte
/// order of name, which is the order content hashes are computed in.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementSchema {
    attributes: BTreeMap<String, AttributeSchema>,
}

impl ElementSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style attribute registration.
    pub fn with_attribute(mut self, name: impl Into<String>, attribute: AttributeSchema) -> Self {
        self.attributes.insert(name.into(), attribute);
        self
    }

    pub fn field_type(&self, name: &str) -> Option<FieldType> {
        self.attributes.get(name).map(|a| a.field_type)
    }

    /// Attributes in ascending name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeSchema)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

impl FromIterator<(String, AttributeSchema)> for ElementSchema {
    fn from_iter<I: IntoIterator<Item = (String, AttributeSchema)>>(iter: I) -> Self {
        Self {
            attributes: iter.into_iter().collect(),
        }
    }
}
