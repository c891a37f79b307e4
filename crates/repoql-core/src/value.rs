use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use time::OffsetDateTime;

///
/// NodeRef
///
/// Reference to a content node by identity. Reference-field comparisons
/// render the id; tree scopes render the path.
///

#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct NodeRef {
    pub id: u64,
    pub path: String,
}

impl NodeRef {
    #[must_use]
    pub fn new(id: u64, path: impl Into<String>) -> Self {
        Self {
            id,
            path: path.into(),
        }
    }
}

///
/// Value
///
/// Compile-time literal. Every term literal in a compiled query is one of
/// these; there is no runtime-valued variant.
///

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    DateTime(OffsetDateTime),
    Node(NodeRef),
}

impl Value {
    /// Short label used in diagnostics.
    #[must_use]
    pub const fn kind_label(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::DateTime(_) => "datetime",
            Self::Node(_) => "node",
        }
    }

    /// Text form used by text-matching operators.
    /// `Null` reads as the empty string; structured values and non-finite
    /// floats have no text form.
    #[must_use]
    pub fn to_match_text(&self) -> Option<String> {
        match self {
            Self::Null => Some(String::new()),
            Self::Text(v) => Some(v.clone()),
            Self::Int(v) => Some(v.to_string()),
            Self::Float(v) if v.is_finite() => Some(v.to_string()),
            Self::Float(_) | Self::Bool(_) | Self::DateTime(_) | Self::Node(_) => None,
        }
    }

    /// Ordering between two literals of the same family.
    /// Ints and floats compare numerically; anything else mixed is unordered.
    #[must_use]
    #[expect(clippy::cast_precision_loss)]
    pub fn partial_order(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => Some(a.cmp(b)),
            (Self::Float(a), Self::Float(b)) => a.partial_cmp(b),
            (Self::Int(a), Self::Float(b)) => (*a as f64).partial_cmp(b),
            (Self::Float(a), Self::Int(b)) => a.partial_cmp(&(*b as f64)),
            (Self::Text(a), Self::Text(b)) => Some(a.cmp(b)),
            (Self::DateTime(a), Self::DateTime(b)) => Some(a.cmp(b)),
            (Self::Bool(a), Self::Bool(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

macro_rules! impl_value_from {
    ( $( $ty:ty => $variant:ident ),* $(,)? ) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Self::$variant(v.into())
                }
            }
        )*
    };
}

impl_value_from! {
    bool => Bool,
    i8 => Int,
    i16 => Int,
    i32 => Int,
    i64 => Int,
    u8 => Int,
    u16 => Int,
    u32 => Int,
    f32 => Float,
    f64 => Float,
    String => Text,
    OffsetDateTime => DateTime,
    NodeRef => Node,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<&NodeRef> for Value {
    fn from(v: &NodeRef) -> Self {
        Self::Node(v.clone())
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_none_is_null() {
        let v: Value = Option::<i32>::None.into();
        assert_eq!(v, Value::Null);

        let v: Value = Some("x").into();
        assert_eq!(v, Value::Text("x".to_string()));
    }

    #[test]
    fn mixed_numeric_ordering() {
        assert_eq!(
            Value::Int(2).partial_order(&Value::Float(2.5)),
            Some(Ordering::Less)
        );
        assert_eq!(Value::Int(2).partial_order(&Value::Text("2".into())), None);
    }

    #[test]
    fn null_matches_as_empty_text() {
        assert_eq!(Value::Null.to_match_text().as_deref(), Some(""));
        assert_eq!(Value::Bool(true).to_match_text(), None);
        assert_eq!(Value::Float(f64::NAN).to_match_text(), None);
        assert_eq!(Value::Float(1.5).to_match_text().as_deref(), Some("1.5"));
    }
}
