use crate::{
    error::CompileError,
    query::{
        ast::{
            AutofilterMode, CompiledText, ExecutionMode, LifespanMode, PageSpec, QueryFlags,
            SortDirection, SortKey,
        },
        compile::compile,
        context::CompileContext,
        expr::{Expr, handler_is},
        scope::ScopeDescriptor,
    },
    schema::ContentHandler,
};

///
/// QueryBuilder
///
/// Fluent query chain: predicate, ordering, paging and engine flags.
/// Building never fails; every check happens at compile time.
///

#[derive(Clone, Debug, Default)]
pub struct QueryBuilder {
    predicate: Option<Expr>,
    sort: Vec<SortKey>,
    page: PageSpec,
    flags: QueryFlags,
}

///
/// QuerySpec
///
/// Builder output, not yet compiled. Field names in `sort` are the names
/// the caller wrote; they are resolved at compile time.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct QuerySpec {
    pub predicate: Option<Expr>,
    pub sort: Vec<SortKey>,
    pub page: PageSpec,
    pub flags: QueryFlags,
}

impl QueryBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `Where`: joins the running predicate with `&&`.
    #[must_use]
    pub fn filter(mut self, predicate: impl Into<Expr>) -> Self {
        let predicate = predicate.into();
        self.predicate = Some(match self.predicate.take() {
            Some(existing) => existing.and(predicate),
            None => predicate,
        });
        self
    }

    /// `OfType<T>()`: same as filtering on `handler_is::<T>()`.
    #[must_use]
    pub fn of_type<T: ContentHandler>(self) -> Self {
        self.filter(handler_is::<T>())
    }

    /// `OrderBy`: replaces any ordering declared so far.
    #[must_use]
    pub fn order_by(mut self, field: impl Into<String>) -> Self {
        self.sort.clear();
        self.push_sort(field, SortDirection::Asc)
    }

    #[must_use]
    pub fn order_by_desc(mut self, field: impl Into<String>) -> Self {
        self.sort.clear();
        self.push_sort(field, SortDirection::Desc)
    }

    /// `ThenBy`: appends a secondary key.
    #[must_use]
    pub fn then_by(self, field: impl Into<String>) -> Self {
        self.push_sort(field, SortDirection::Asc)
    }

    #[must_use]
    pub fn then_by_desc(self, field: impl Into<String>) -> Self {
        self.push_sort(field, SortDirection::Desc)
    }

    #[must_use]
    pub const fn skip(mut self, n: u32) -> Self {
        self.page.skip = Some(n);
        self
    }

    #[must_use]
    pub const fn take(mut self, n: u32) -> Self {
        self.page.top = Some(n);
        self
    }

    #[must_use]
    pub const fn enable_autofilters(mut self) -> Self {
        self.flags.autofilters = AutofilterMode::Default;
        self
    }

    #[must_use]
    pub const fn disable_autofilters(mut self) -> Self {
        self.flags.autofilters = AutofilterMode::Disabled;
        self
    }

    #[must_use]
    pub const fn enable_lifespan(mut self) -> Self {
        self.flags.lifespan = LifespanMode::Enabled;
        self
    }

    #[must_use]
    pub const fn disable_lifespan(mut self) -> Self {
        self.flags.lifespan = LifespanMode::Default;
        self
    }

    #[must_use]
    pub const fn execution_mode(mut self, mode: ExecutionMode) -> Self {
        self.flags.execution_mode = mode;
        self
    }

    #[must_use]
    pub fn build(self) -> QuerySpec {
        QuerySpec {
            predicate: self.predicate,
            sort: self.sort,
            page: self.page,
            flags: self.flags,
        }
    }

    fn push_sort(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.sort.push(SortKey {
            field: field.into(),
            direction,
        });
        self
    }
}

impl QuerySpec {
    /// Compile this query under `scope`.
    pub fn compile(
        &self,
        scope: &ScopeDescriptor,
        ctx: &CompileContext<'_>,
    ) -> Result<CompiledText, CompileError> {
        compile(self, scope, ctx)
    }
}

///
/// TESTS
///
