//! Compiler configuration.
//!
//! Options are plain data with serde defaults so hosts can embed them in
//! their own TOML settings or build them in code.

use crate::DEFAULT_GUARD_FIELD;
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

///
/// ConfigError
///

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("invalid compiler config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid compiler config: guard field must not be empty")]
    EmptyGuardField,
}

///
/// UnknownFieldPolicy
///
/// What the compiler does with a field the resolver does not know.
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownFieldPolicy {
    /// Fail with `CompileError::UnknownField`.
    #[default]
    Reject,

    /// Use the name verbatim and infer the data type from the literal.
    Infer,
}

///
/// CompilerOptions
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompilerOptions {
    /// Numeric identity field used by the presence guard (`+Id:>0`).
    pub guard_field: String,

    pub unknown_fields: UnknownFieldPolicy,

    /// Lower-case text literals in equality and range terms, matching the
    /// engine's keyword analyzer. Wildcard bodies are never folded.
    pub lowercase_terms: bool,

    /// Log every compiled query at info level instead of debug.
    pub trace_queries: bool,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            guard_field: DEFAULT_GUARD_FIELD.to_string(),
            unknown_fields: UnknownFieldPolicy::Reject,
            lowercase_terms: true,
            trace_queries: false,
        }
    }
}

impl CompilerOptions {
    /// Parse options from a TOML document; absent keys keep their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let options: Self = toml::from_str(source)?;
        options.validate()?;

        Ok(options)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.guard_field.trim().is_empty() {
            return Err(ConfigError::EmptyGuardField);
        }

        Ok(())
    }

    #[must_use]
    pub const fn with_unknown_fields(mut self, policy: UnknownFieldPolicy) -> Self {
        self.unknown_fields = policy;
        self
    }

    #[must_use]
    pub fn with_guard_field(mut self, field: impl Into<String>) -> Self {
        self.guard_field = field.into();
        self
    }

    #[must_use]
    pub const fn with_trace_queries(mut self, enabled: bool) -> Self {
        self.trace_queries = enabled;
        self
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let options = CompilerOptions::from_toml_str("").unwrap();
        assert_eq!(options, CompilerOptions::default());
        assert_eq!(options.guard_field, "Id");
    }

    #[test]
    fn partial_document_overrides_named_keys() {
        let options = CompilerOptions::from_toml_str(
            r#"
            unknown_fields = "infer"
            trace_queries = true
            "#,
        )
        .unwrap();

        assert_eq!(options.unknown_fields, UnknownFieldPolicy::Infer);
        assert!(options.trace_queries);
        assert!(options.lowercase_terms);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = CompilerOptions::from_toml_str("colour = 1").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn blank_guard_field_is_rejected() {
        let err = CompilerOptions::from_toml_str(r#"guard_field = " ""#).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyGuardField));
    }
}
