use crate::{
    error::CompileError,
    query::ast::{AutofilterMode, CompiledQuery, Node, ScopeKind, Term},
};
use serde::{Deserialize, Serialize};

///
/// PathUsage
///
/// How the scope's base path joins the compiled predicate.
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PathUsage {
    #[default]
    None,
    InFolderAnd,
    InFolderOr,
}

///
/// ScopeDescriptor
///
/// Caller-supplied restriction merged into every query compiled for one
/// container listing. Overrides, when present, beat the builder's own
/// paging and autofilter directives.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScopeDescriptor {
    pub path_usage: PathUsage,
    pub base_path: Option<String>,
    pub raw_query: Option<String>,
    pub skip_override: Option<u32>,
    pub top_override: Option<u32>,
    pub autofilter_override: Option<AutofilterMode>,
}

impl ScopeDescriptor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn in_folder_and(path: impl Into<String>) -> Self {
        Self {
            path_usage: PathUsage::InFolderAnd,
            base_path: Some(path.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn in_folder_or(path: impl Into<String>) -> Self {
        Self {
            path_usage: PathUsage::InFolderOr,
            base_path: Some(path.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_raw_query(mut self, raw: impl Into<String>) -> Self {
        self.raw_query = Some(raw.into());
        self
    }

    #[must_use]
    pub const fn with_skip(mut self, skip: u32) -> Self {
        self.skip_override = Some(skip);
        self
    }

    #[must_use]
    pub const fn with_top(mut self, top: u32) -> Self {
        self.top_override = Some(top);
        self
    }

    #[must_use]
    pub const fn with_autofilters(mut self, mode: AutofilterMode) -> Self {
        self.autofilter_override = Some(mode);
        self
    }

    /// True when this scope changes neither the predicate nor the directives.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self.path_usage, PathUsage::None)
            && self.raw_query.is_none()
            && self.skip_override.is_none()
            && self.top_override.is_none()
            && self.autofilter_override.is_none()
    }

    // Path term for the configured usage, if any.
    fn path_term(&self) -> Result<Option<Node>, CompileError> {
        if self.path_usage == PathUsage::None {
            return Ok(None);
        }

        let path = self
            .base_path
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .ok_or_else(|| CompileError::InvalidScope {
                reason: "path usage set without a base path".to_string(),
            })?;

        Ok(Some(
            Term::Scope {
                kind: ScopeKind::InFolder,
                path: path.to_lowercase(),
            }
            .into(),
        ))
    }
}

/// Merge a normalized query with a scope.
///
/// The raw query joins the predicate's top-level conjunction first; the
/// path term is applied to the result. The tree is not renormalized, so a
/// scoped predicate stays grouped as one member.
pub fn combine(
    mut query: CompiledQuery,
    scope: &ScopeDescriptor,
) -> Result<CompiledQuery, CompileError> {
    let mut predicate = query.predicate.take();

    if let Some(raw) = scope.raw_query.as_deref().map(str::trim) {
        if raw.is_empty() {
            return Err(CompileError::InvalidScope {
                reason: "raw query is empty".to_string(),
            });
        }
        let raw = Node::from(Term::raw(raw));

        predicate = Some(match predicate {
            None => raw,
            Some(Node::And(mut children)) => {
                children.push(raw);
                Node::And(children)
            }
            Some(other) => Node::And(vec![other, raw]),
        });
    }

    if let Some(path) = scope.path_term()? {
        predicate = Some(match (predicate, scope.path_usage) {
            (None, _) => path,
            (Some(pred), PathUsage::InFolderOr) => Node::Or(vec![pred, path]),
            (Some(pred), _) => Node::And(vec![pred, path]),
        });
    }

    query.predicate = predicate;
    query.page.skip = scope.skip_override.or(query.page.skip);
    query.page.top = scope.top_override.or(query.page.top);
    if let Some(mode) = scope.autofilter_override {
        query.flags.autofilters = mode;
    }

    Ok(query)
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::ast::PageSpec;

    fn query_with(predicate: Option<Node>) -> CompiledQuery {
        CompiledQuery {
            predicate,
            ..CompiledQuery::default()
        }
    }

    #[test]
    fn empty_scope_changes_nothing() {
        let query = query_with(Some(Term::boolean("IsFolder", true).into()));
        let scope = ScopeDescriptor::new();

        assert!(scope.is_empty());
        assert_eq!(combine(query.clone(), &scope).unwrap(), query);
    }

    #[test]
    fn path_without_predicate_is_the_whole_predicate() {
        let scope = ScopeDescriptor::in_folder_and("/Root/X");
        let combined = combine(query_with(None), &scope).unwrap();

        assert_eq!(
            combined.predicate,
            Some(
                Term::Scope {
                    kind: ScopeKind::InFolder,
                    path: "/root/x".to_string(),
                }
                .into()
            )
        );
    }

    #[test]
    fn raw_query_joins_the_top_level_conjunction() {
        let pred = Node::And(vec![
            Term::equality("A", 1).into(),
            Term::equality("B", 2).into(),
        ]);
        let scope = ScopeDescriptor::new().with_raw_query("Id:>42");
        let combined = combine(query_with(Some(pred)), &scope).unwrap();

        let Some(Node::And(children)) = combined.predicate else {
            panic!("expected conjunction");
        };
        assert_eq!(children.len(), 3);
        assert_eq!(children[2], Term::raw("Id:>42").into());
    }

    #[test]
    fn path_usage_requires_base_path() {
        let scope = ScopeDescriptor {
            path_usage: PathUsage::InFolderOr,
            ..ScopeDescriptor::default()
        };
        let err = combine(query_with(None), &scope).unwrap_err();

        assert!(matches!(err, CompileError::InvalidScope { .. }));
    }

    #[test]
    fn overrides_beat_builder_directives() {
        let mut query = query_with(None);
        query.page = PageSpec {
            skip: Some(8),
            top: Some(5),
        };
        let scope = ScopeDescriptor::new()
            .with_skip(18)
            .with_autofilters(AutofilterMode::Disabled);
        let combined = combine(query, &scope).unwrap();

        assert_eq!(combined.page.skip, Some(18));
        assert_eq!(combined.page.top, Some(5));
        assert_eq!(combined.flags.autofilters, AutofilterMode::Disabled);
    }

    #[test]
    fn descriptor_reads_from_json() {
        let scope: ScopeDescriptor = serde_json::from_str(
            r#"{"path_usage":"in_folder_or","base_path":"/Root/Docs","top_override":15}"#,
        )
        .unwrap();

        assert_eq!(scope.path_usage, PathUsage::InFolderOr);
        assert_eq!(scope.top_override, Some(15));
        assert_eq!(scope.raw_query, None);
    }
}
