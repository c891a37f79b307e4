use derive_more::Display;
use repoql_core::{
    config::ConfigError,
    error::{CompileError, ErrorClass},
    schema::CatalogError,
};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

///
/// Error
/// Public error type with a stable kind + origin taxonomy.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize, ThisError)]
#[error("{origin}: {message}")]
pub struct Error {
    pub kind: ErrorKind,
    pub origin: ErrorOrigin,
    pub message: String,
}

impl Error {
    #[must_use]
    pub fn new(kind: ErrorKind, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            kind,
            origin,
            message: message.into(),
        }
    }
}

impl From<CompileError> for Error {
    fn from(err: CompileError) -> Self {
        let origin = match err {
            CompileError::InvalidScope { .. } => ErrorOrigin::Scope,
            CompileError::UnknownField { .. } | CompileError::UnknownContentType { .. } => {
                ErrorOrigin::Schema
            }
            _ => ErrorOrigin::Compiler,
        };
        let kind = match err.class() {
            ErrorClass::Unsupported => QueryErrorKind::Unsupported,
            ErrorClass::NotFound => QueryErrorKind::NotFound,
            ErrorClass::InvalidInput => QueryErrorKind::Invalid,
        };

        Self::new(ErrorKind::Query(kind), origin, err.to_string())
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::new(ErrorKind::Config, ErrorOrigin::Config, err.to_string())
    }
}

impl From<CatalogError> for Error {
    fn from(err: CatalogError) -> Self {
        Self::new(ErrorKind::Config, ErrorOrigin::Schema, err.to_string())
    }
}

///
/// ErrorKind
/// Public error taxonomy for callers.
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum ErrorKind {
    Query(QueryErrorKind),

    /// Options or field catalog could not be loaded.
    Config,
}

///
/// QueryErrorKind
/// Every variant is a programming error in the query; retrying never helps.
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum QueryErrorKind {
    /// Predicate shape has no compilation rule.
    Unsupported,

    /// A field or content type could not be resolved.
    NotFound,

    /// Constant, scope or literal is malformed.
    Invalid,
}

///
/// ErrorOrigin
///

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
pub enum ErrorOrigin {
    Compiler,
    Config,
    Schema,
    Scope,
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compile_errors_map_to_query_kinds() {
        let err: Error = CompileError::NonConstantArgument {
            operation: "StartsWith",
        }
        .into();
        assert_eq!(err.kind, ErrorKind::Query(QueryErrorKind::Unsupported));
        assert_eq!(err.origin, ErrorOrigin::Compiler);

        let err: Error = CompileError::UnknownField {
            field: "Nope".to_string(),
        }
        .into();
        assert_eq!(err.kind, ErrorKind::Query(QueryErrorKind::NotFound));
        assert_eq!(err.to_string(), "Schema: unknown field 'Nope'");
    }

    #[test]
    fn config_errors_keep_their_message() {
        let err: Error = ConfigError::EmptyGuardField.into();

        assert_eq!(err.kind, ErrorKind::Config);
        assert!(err.message.contains("guard field"));
    }

    #[test]
    fn error_serializes_with_stable_shape() {
        let err = Error::new(
            ErrorKind::Query(QueryErrorKind::Invalid),
            ErrorOrigin::Scope,
            "invalid scope: raw query is empty",
        );
        let json = serde_json::to_value(&err).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "kind": { "Query": "Invalid" },
                "origin": "Scope",
                "message": "invalid scope: raw query is empty",
            })
        );
    }
}
