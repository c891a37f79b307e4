use crate::{
    schema::{ContentHandler, HandlerType},
    value::{NodeRef, Value},
};
use std::ops::{Add, BitAnd, BitOr, Mul, Neg, Not, Sub};
use time::OffsetDateTime;

///
/// Predicate expressions
///
/// A closed expression tree over a candidate content item. Callers build it
/// with the constructors below (`field("Id").eq(42)`), the way a LINQ
/// provider receives an expression tree. Nothing here is validated; the
/// compiler gives every node kind a rule or rejects it.
///

///
/// BinaryOp
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BinaryOp {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
    AndAlso,
    OrElse,
    Add,
    Sub,
    Mul,
}

impl BinaryOp {
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::AndAlso => "&&",
            Self::OrElse => "||",
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
        }
    }

    #[must_use]
    pub const fn is_comparison(self) -> bool {
        matches!(
            self,
            Self::Eq | Self::Ne | Self::Lt | Self::Lte | Self::Gt | Self::Gte
        )
    }
}

///
/// Method
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Method {
    // text matching on a field
    StartsWith,
    EndsWith,
    Contains,

    // candidate helpers
    Type,
    TypeIs,
    InFolder,
    InTree,

    // closed-form value helpers
    AddDays,
    AddHours,
    AddMinutes,
    AddSeconds,
    ToLower,
    ToUpper,
}

impl Method {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::StartsWith => "StartsWith",
            Self::EndsWith => "EndsWith",
            Self::Contains => "Contains",
            Self::Type => "Type",
            Self::TypeIs => "TypeIs",
            Self::InFolder => "InFolder",
            Self::InTree => "InTree",
            Self::AddDays => "AddDays",
            Self::AddHours => "AddHours",
            Self::AddMinutes => "AddMinutes",
            Self::AddSeconds => "AddSeconds",
            Self::ToLower => "ToLower",
            Self::ToUpper => "ToUpper",
        }
    }

    #[must_use]
    pub const fn arity(self) -> usize {
        match self {
            Self::ToLower | Self::ToUpper => 0,
            _ => 1,
        }
    }
}

///
/// Expr
///

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Constant(Value),
    /// `c.Field`
    Field(String),
    /// The candidate itself (`c`).
    Candidate,
    /// Current UTC time, sampled once per compilation.
    Now,
    /// Midnight UTC of `Now`.
    Today,
    Not(Box<Self>),
    Negate(Box<Self>),
    Binary {
        op: BinaryOp,
        lhs: Box<Self>,
        rhs: Box<Self>,
    },
    Conditional {
        test: Box<Self>,
        if_true: Box<Self>,
        if_false: Box<Self>,
    },
    Call {
        method: Method,
        target: Box<Self>,
        args: Vec<Self>,
    },
    /// `c.ContentHandler is T`
    HandlerIs(HandlerType),
}

impl Expr {
    #[must_use]
    pub fn binary(op: BinaryOp, lhs: impl Into<Self>, rhs: impl Into<Self>) -> Self {
        Self::Binary {
            op,
            lhs: Box::new(lhs.into()),
            rhs: Box::new(rhs.into()),
        }
    }

    #[must_use]
    pub fn call(method: Method, target: Self, args: Vec<Self>) -> Self {
        Self::Call {
            method,
            target: Box::new(target),
            args,
        }
    }

    /// True when the expression does not read the candidate anywhere and can
    /// be folded to a literal at compile time.
    #[must_use]
    pub fn is_constant(&self) -> bool {
        match self {
            Self::Constant(_) | Self::Now | Self::Today => true,
            Self::Field(_) | Self::Candidate | Self::HandlerIs(_) => false,
            Self::Not(inner) | Self::Negate(inner) => inner.is_constant(),
            Self::Binary { lhs, rhs, .. } => lhs.is_constant() && rhs.is_constant(),
            Self::Conditional {
                test,
                if_true,
                if_false,
            } => test.is_constant() && if_true.is_constant() && if_false.is_constant(),
            Self::Call { target, args, .. } => {
                target.is_constant() && args.iter().all(Self::is_constant)
            }
        }
    }

    /// Short description for diagnostics.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Constant(v) => format!("constant {}", v.kind_label()),
            Self::Field(name) => format!("field '{name}'"),
            Self::Candidate => "candidate".to_string(),
            Self::Now => "Now".to_string(),
            Self::Today => "Today".to_string(),
            Self::Not(_) => "logical not".to_string(),
            Self::Negate(_) => "negation".to_string(),
            Self::Binary { op, .. } => format!("binary '{}'", op.symbol()),
            Self::Conditional { .. } => "conditional".to_string(),
            Self::Call { method, .. } => format!("call '{}'", method.name()),
            Self::HandlerIs(handler) => format!("handler test '{}'", handler.rust_name()),
        }
    }

    #[must_use]
    pub fn eq(self, rhs: impl Into<Self>) -> Self {
        Self::binary(BinaryOp::Eq, self, rhs)
    }

    #[must_use]
    pub fn ne(self, rhs: impl Into<Self>) -> Self {
        Self::binary(BinaryOp::Ne, self, rhs)
    }

    #[must_use]
    pub fn lt(self, rhs: impl Into<Self>) -> Self {
        Self::binary(BinaryOp::Lt, self, rhs)
    }

    #[must_use]
    pub fn lte(self, rhs: impl Into<Self>) -> Self {
        Self::binary(BinaryOp::Lte, self, rhs)
    }

    #[must_use]
    pub fn gt(self, rhs: impl Into<Self>) -> Self {
        Self::binary(BinaryOp::Gt, self, rhs)
    }

    #[must_use]
    pub fn gte(self, rhs: impl Into<Self>) -> Self {
        Self::binary(BinaryOp::Gte, self, rhs)
    }

    /// `self && rhs`
    #[must_use]
    pub fn and(self, rhs: impl Into<Self>) -> Self {
        Self::binary(BinaryOp::AndAlso, self, rhs)
    }

    /// `self || rhs`
    #[must_use]
    pub fn or(self, rhs: impl Into<Self>) -> Self {
        Self::binary(BinaryOp::OrElse, self, rhs)
    }

    #[must_use]
    pub fn starts_with(self, arg: impl Into<Self>) -> Self {
        Self::call(Method::StartsWith, self, vec![arg.into()])
    }

    #[must_use]
    pub fn ends_with(self, arg: impl Into<Self>) -> Self {
        Self::call(Method::EndsWith, self, vec![arg.into()])
    }

    /// Substring match on text fields, membership on multi-valued fields.
    #[must_use]
    pub fn contains(self, arg: impl Into<Self>) -> Self {
        Self::call(Method::Contains, self, vec![arg.into()])
    }

    #[must_use]
    pub fn add_days(self, days: impl Into<Self>) -> Self {
        Self::call(Method::AddDays, self, vec![days.into()])
    }

    #[must_use]
    pub fn add_hours(self, hours: impl Into<Self>) -> Self {
        Self::call(Method::AddHours, self, vec![hours.into()])
    }

    #[must_use]
    pub fn add_minutes(self, minutes: impl Into<Self>) -> Self {
        Self::call(Method::AddMinutes, self, vec![minutes.into()])
    }

    #[must_use]
    pub fn add_seconds(self, seconds: impl Into<Self>) -> Self {
        Self::call(Method::AddSeconds, self, vec![seconds.into()])
    }

    #[must_use]
    pub fn to_lower(self) -> Self {
        Self::call(Method::ToLower, self, Vec::new())
    }

    #[must_use]
    pub fn to_upper(self) -> Self {
        Self::call(Method::ToUpper, self, Vec::new())
    }
}

macro_rules! impl_expr_from_value {
    ( $( $ty:ty ),* $(,)? ) => {
        $(
            impl From<$ty> for Expr {
                fn from(v: $ty) -> Self {
                    Self::Constant(v.into())
                }
            }
        )*
    };
}

impl_expr_from_value!(
    bool,
    i8,
    i16,
    i32,
    i64,
    u8,
    u16,
    u32,
    f32,
    f64,
    &str,
    String,
    OffsetDateTime,
    NodeRef,
    &NodeRef,
    Value,
);

impl<T: Into<Value>> From<Option<T>> for Expr {
    fn from(v: Option<T>) -> Self {
        Self::Constant(v.into())
    }
}

impl Not for Expr {
    type Output = Self;

    fn not(self) -> Self::Output {
        Self::Not(Box::new(self))
    }
}

impl Neg for Expr {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self::Negate(Box::new(self))
    }
}

impl BitAnd for Expr {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        self.and(rhs)
    }
}

impl BitOr for Expr {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.or(rhs)
    }
}

impl Add for Expr {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self::binary(BinaryOp::Add, self, rhs)
    }
}

impl Sub for Expr {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self::binary(BinaryOp::Sub, self, rhs)
    }
}

impl Mul for Expr {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        Self::binary(BinaryOp::Mul, self, rhs)
    }
}

/// `c.<name>`
#[must_use]
pub fn field(name: impl Into<String>) -> Expr {
    Expr::Field(name.into())
}

/// Literal operand.
#[must_use]
pub fn value(v: impl Into<Value>) -> Expr {
    Expr::Constant(v.into())
}

/// `DateTime.UtcNow`
#[must_use]
pub const fn now() -> Expr {
    Expr::Now
}

/// `DateTime.UtcNow.Date`
#[must_use]
pub const fn today() -> Expr {
    Expr::Today
}

/// `test ? if_true : if_false`
#[must_use]
pub fn cond(test: impl Into<Expr>, if_true: impl Into<Expr>, if_false: impl Into<Expr>) -> Expr {
    Expr::Conditional {
        test: Box::new(test.into()),
        if_true: Box::new(if_true.into()),
        if_false: Box::new(if_false.into()),
    }
}

/// `c.TypeIs(name)`: the content type or any type derived from it.
#[must_use]
pub fn type_is(name: impl Into<Expr>) -> Expr {
    Expr::call(Method::TypeIs, Expr::Candidate, vec![name.into()])
}

/// `c.Type(name)`: exactly this content type.
#[must_use]
pub fn type_exact(name: impl Into<Expr>) -> Expr {
    Expr::call(Method::Type, Expr::Candidate, vec![name.into()])
}

/// `c.InFolder(path)`
#[must_use]
pub fn in_folder(path: impl Into<Expr>) -> Expr {
    Expr::call(Method::InFolder, Expr::Candidate, vec![path.into()])
}

/// `c.InTree(path)` or `c.InTree(node)`
#[must_use]
pub fn in_tree(path_or_node: impl Into<Expr>) -> Expr {
    Expr::call(Method::InTree, Expr::Candidate, vec![path_or_node.into()])
}

/// `c.ContentHandler is T`
#[must_use]
pub fn handler_is<T: ContentHandler>() -> Expr {
    Expr::HandlerIs(HandlerType::of::<T>())
}

/// `typeof(T).IsAssignableFrom(c.ContentHandler.GetType())`; same filter as
/// [`handler_is`].
#[must_use]
pub fn assignable_to<T: ContentHandler>() -> Expr {
    handler_is::<T>()
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operators_build_binary_nodes() {
        let expr = field("Id").lt(4) & !field("IsFolder");
        let Expr::Binary { op, lhs, rhs } = expr else {
            panic!("expected binary node");
        };

        assert_eq!(op, BinaryOp::AndAlso);
        assert_eq!(*lhs, Expr::binary(BinaryOp::Lt, field("Id"), 4));
        assert_eq!(*rhs, Expr::Not(Box::new(field("IsFolder"))));
    }

    #[test]
    fn constant_detection_sees_through_calls() {
        assert!(now().add_days(-2).is_constant());
        assert!(value("a").to_upper().is_constant());
        assert!(!field("Name").to_lower().is_constant());
        assert!(!value("x").starts_with(field("Name")).is_constant());
        assert!(!type_is("Folder").is_constant());
    }

    #[test]
    fn method_arity() {
        assert_eq!(Method::ToLower.arity(), 0);
        assert_eq!(Method::InTree.arity(), 1);
    }
}
