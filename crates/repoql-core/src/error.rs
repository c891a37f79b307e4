use derive_more::Display;
use thiserror::Error as ThisError;

///
/// CompileError
///
/// Every failure the compiler can report. All of them are detected while
/// lowering the expression tree; nothing is deferred to execution and no
/// partial query text is ever produced alongside an error.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum CompileError {
    #[error("argument of '{operation}' must be a compile-time constant")]
    NonConstantArgument { operation: &'static str },

    #[error("unsupported expression node: {node}")]
    UnsupportedExpressionNode { node: String },

    #[error("unknown field '{field}'")]
    UnknownField { field: String },

    #[error("content handler '{handler}' has no registered content type")]
    UnknownContentType { handler: &'static str },

    #[error("invalid scope: {reason}")]
    InvalidScope { reason: String },

    #[error("invalid constant expression: {reason}")]
    InvalidConstant { reason: String },

    #[error("predicate folds to constant false and can never match")]
    ConstantPredicate,
}

impl CompileError {
    pub(crate) fn unsupported(node: impl Into<String>) -> Self {
        Self::UnsupportedExpressionNode { node: node.into() }
    }

    pub(crate) fn invalid_constant(reason: impl Into<String>) -> Self {
        Self::InvalidConstant {
            reason: reason.into(),
        }
    }

    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::NonConstantArgument { .. }
            | Self::UnsupportedExpressionNode { .. }
            | Self::ConstantPredicate => ErrorClass::Unsupported,
            Self::UnknownField { .. } | Self::UnknownContentType { .. } => ErrorClass::NotFound,
            Self::InvalidScope { .. } | Self::InvalidConstant { .. } => ErrorClass::InvalidInput,
        }
    }

    /// Stable label used for metrics and logs.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::NonConstantArgument { .. } => "non_constant_argument",
            Self::UnsupportedExpressionNode { .. } => "unsupported_expression_node",
            Self::UnknownField { .. } => "unknown_field",
            Self::UnknownContentType { .. } => "unknown_content_type",
            Self::InvalidScope { .. } => "invalid_scope",
            Self::InvalidConstant { .. } => "invalid_constant",
            Self::ConstantPredicate => "constant_predicate",
        }
    }

    #[must_use]
    pub fn display_with_class(&self) -> String {
        format!("{}: {self}", self.class())
    }
}

///
/// ErrorClass
/// Coarse classification of compile failures.
/// Callers treat every class as a programming error in the query.
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum ErrorClass {
    #[display("unsupported")]
    Unsupported,
    #[display("not_found")]
    NotFound,
    #[display("invalid_input")]
    InvalidInput,
}

///
/// TESTS
///
