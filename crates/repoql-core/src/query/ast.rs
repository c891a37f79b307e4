use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::ops::{BitAnd, BitOr, Not};

///
/// Query AST
///
/// Canonical in-memory form of a compiled query. Terms are leaf facts with
/// literal values already folded; composites combine them. Every pass over
/// this tree produces a new tree, so the same AST always renders to the same
/// text.
///

///
/// RangeOp
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RangeOp {
    Lt,
    Lte,
    Gt,
    Gte,
}

impl RangeOp {
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Gt => ">",
            Self::Gte => ">=",
        }
    }

    /// Operator seen from the other side: `4 > Id` is `Id < 4`.
    #[must_use]
    pub const fn mirrored(self) -> Self {
        match self {
            Self::Lt => Self::Gt,
            Self::Lte => Self::Gte,
            Self::Gt => Self::Lt,
            Self::Gte => Self::Lte,
        }
    }
}

///
/// WildcardShape
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WildcardShape {
    /// `field:V*`
    Prefix,
    /// `field:*V`
    Suffix,
    /// `field:*V*`
    Infix,
}

///
/// ScopeKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ScopeKind {
    InFolder,
    InTree,
}

impl ScopeKind {
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::InFolder => "InFolder",
            Self::InTree => "InTree",
        }
    }
}

///
/// Term
///

#[derive(Clone, Debug, PartialEq)]
pub enum Term {
    Equality {
        field: String,
        value: Value,
    },
    Range {
        field: String,
        op: RangeOp,
        value: Value,
    },
    Wildcard {
        field: String,
        text: String,
        shape: WildcardShape,
    },
    /// `TypeIs:` when transitive, `Type:` when exact.
    TypeFilter {
        type_name: String,
        transitive: bool,
    },
    ReferenceMatch {
        field: String,
        target_id: u64,
    },
    BooleanLiteral {
        field: String,
        value: bool,
    },
    Scope {
        kind: ScopeKind,
        path: String,
    },
    /// Pre-rendered text injected by a caller; never inspected beyond
    /// deciding whether it needs grouping.
    RawFragment {
        text: String,
    },
}

impl Term {
    #[must_use]
    pub fn equality(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Equality {
            field: field.into(),
            value: value.into(),
        }
    }

    #[must_use]
    pub fn range(field: impl Into<String>, op: RangeOp, value: impl Into<Value>) -> Self {
        Self::Range {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    #[must_use]
    pub fn boolean(field: impl Into<String>, value: bool) -> Self {
        Self::BooleanLiteral {
            field: field.into(),
            value,
        }
    }

    #[must_use]
    pub fn raw(text: impl Into<String>) -> Self {
        Self::RawFragment { text: text.into() }
    }

    /// Raw text is composite when it holds more than one clause at its top
    /// level, or carries its own sign. Such fragments are parenthesized
    /// whenever they appear inside another composite.
    #[must_use]
    pub fn is_composite_fragment(&self) -> bool {
        let Self::RawFragment { text } = self else {
            return false;
        };
        let text = text.trim();
        if text.starts_with(['+', '-']) {
            return true;
        }

        let mut depth = 0usize;
        // quote character that opened the current quoted run
        let mut quote: Option<char> = None;
        let mut escaped = false;
        for ch in text.chars() {
            if escaped {
                escaped = false;
                continue;
            }
            match (ch, quote) {
                ('\\', _) => escaped = true,
                ('\'' | '"', None) => quote = Some(ch),
                (c, Some(open)) if c == open => quote = None,
                (_, Some(_)) => {}
                ('(', None) => depth += 1,
                (')', None) => depth = depth.saturating_sub(1),
                (c, None) if c.is_whitespace() && depth == 0 => return true,
                _ => {}
            }
        }

        false
    }
}

///
/// Node
///

#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    Term(Term),
    And(Vec<Self>),
    Or(Vec<Self>),
    Not(Box<Self>),
}

impl Node {
    #[must_use]
    pub const fn is_negated(&self) -> bool {
        matches!(self, Self::Not(_))
    }

    #[must_use]
    pub const fn is_composite(&self) -> bool {
        matches!(self, Self::And(_) | Self::Or(_))
    }

    /// Number of leaf terms in the tree.
    #[must_use]
    pub fn term_count(&self) -> usize {
        match self {
            Self::Term(_) => 1,
            Self::And(children) | Self::Or(children) => children.iter().map(Self::term_count).sum(),
            Self::Not(inner) => inner.term_count(),
        }
    }
}

impl From<Term> for Node {
    fn from(term: Term) -> Self {
        Self::Term(term)
    }
}

impl Not for Node {
    type Output = Self;

    fn not(self) -> Self::Output {
        Self::Not(Box::new(self))
    }
}

impl BitAnd for Node {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        Self::And(vec![self, rhs])
    }
}

impl BitOr for Node {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self::Or(vec![self, rhs])
    }
}

///
/// SortDirection
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SortDirection {
    Asc,
    Desc,
}

///
/// SortKey
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SortKey {
    pub field: String,
    pub direction: SortDirection,
}

///
/// SortSpec
/// Sort keys in declaration order.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SortSpec {
    pub keys: Vec<SortKey>,
}

impl SortSpec {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

///
/// PageSpec
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct PageSpec {
    pub skip: Option<u32>,
    pub top: Option<u32>,
}

///
/// AutofilterMode
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AutofilterMode {
    #[default]
    #[serde(alias = "enabled")]
    Default,
    Disabled,
}

///
/// LifespanMode
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LifespanMode {
    #[default]
    #[serde(alias = "disabled")]
    Default,
    Enabled,
}

///
/// ExecutionMode
///
/// Hint forwarded to the execution layer. Only `Quick` shows up in the
/// query text; the value itself travels next to the text.
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    #[default]
    Default,
    Strict,
    Quick,
}

///
/// QueryFlags
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct QueryFlags {
    pub autofilters: AutofilterMode,
    pub lifespan: LifespanMode,
    pub execution_mode: ExecutionMode,
}

///
/// CompiledQuery
///
/// Root artifact before serialization. `predicate` is `None` when the
/// caller supplied no filter at all.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CompiledQuery {
    pub predicate: Option<Node>,
    pub sort: SortSpec,
    pub page: PageSpec,
    pub flags: QueryFlags,
}

///
/// CompiledText
/// Query text plus the execution hint handed to the search engine.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CompiledText {
    pub text: String,
    pub execution_mode: ExecutionMode,
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_fragment_composite_detection() {
        assert!(!Term::raw("Id:>42").is_composite_fragment());
        assert!(!Term::raw("Name:'a b'").is_composite_fragment());
        assert!(!Term::raw("(Id:1 Id:2)").is_composite_fragment());
        assert!(!Term::raw("Name:\"it's here\"").is_composite_fragment());
        assert!(Term::raw("Name:\"it's\" Id:1").is_composite_fragment());
        assert!(Term::raw("Name:'say \"hi\"' Id:1").is_composite_fragment());
        assert!(Term::raw("Id:1 Id:2").is_composite_fragment());
        assert!(Term::raw("-Id:1").is_composite_fragment());
        assert!(Term::raw("+Id:1").is_composite_fragment());
        assert!(!Term::equality("Id", 1).is_composite_fragment());
    }

    #[test]
    fn mirrored_range_ops_round_trip() {
        for op in [RangeOp::Lt, RangeOp::Lte, RangeOp::Gt, RangeOp::Gte] {
            assert_eq!(op.mirrored().mirrored(), op);
        }
        assert_eq!(RangeOp::Gte.mirrored().symbol(), "<=");
    }

    #[test]
    fn term_count_walks_composites() {
        let node = Node::from(Term::equality("Id", 1))
            & !(Node::from(Term::boolean("IsFolder", true)) | Node::from(Term::raw("x:1")));
        assert_eq!(node.term_count(), 3);
        assert!(node.is_composite());
        assert!(!node.is_negated());
    }
}
