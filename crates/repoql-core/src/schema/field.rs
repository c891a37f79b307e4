use crate::value::Value;
use serde::{Deserialize, Serialize};

///
/// DataType
///
/// Minimal type surface needed to pick a compilation rule.
/// This is a lossy projection of the content schema.
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    Bool,
    Int,
    Float,
    Text,
    DateTime,
    Reference,
}

impl DataType {
    /// Infer a data type from a literal, for fields the resolver does not know.
    #[must_use]
    pub const fn infer(value: &Value) -> Self {
        match value {
            Value::Bool(_) => Self::Bool,
            Value::Int(_) => Self::Int,
            Value::Float(_) => Self::Float,
            Value::Null | Value::Text(_) => Self::Text,
            Value::DateTime(_) => Self::DateTime,
            Value::Node(_) => Self::Reference,
        }
    }

    #[must_use]
    pub const fn is_orderable(self) -> bool {
        matches!(self, Self::Int | Self::Float | Self::Text | Self::DateTime)
    }
}

///
/// FieldInfo
/// Resolved field descriptor.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct FieldInfo {
    /// Name the search index knows the field by; this is what gets rendered.
    pub indexed_name: String,

    #[serde(rename = "type")]
    pub data_type: DataType,

    #[serde(default)]
    pub multivalued: bool,
}

impl FieldInfo {
    #[must_use]
    pub fn new(indexed_name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            indexed_name: indexed_name.into(),
            data_type,
            multivalued: false,
        }
    }

    #[must_use]
    pub const fn multivalued(mut self) -> Self {
        self.multivalued = true;
        self
    }
}

///
/// FieldResolver
///
/// Field-name lookup. Implementations are read-only from the compiler's
/// perspective and must tolerate concurrent readers.
///

pub trait FieldResolver: Send + Sync {
    fn resolve(&self, name: &str) -> Option<&FieldInfo>;
}
