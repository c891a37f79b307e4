//! Core compiler for repoql: typed predicate expressions, the query AST,
//! boolean normalization, scope merging, and the query-text serializer.
#![warn(unreachable_pub)]

// public exports are one module level down
pub mod config;
pub mod error;
pub mod obs;
pub mod query;
pub mod schema;
pub mod value;

#[cfg(test)]
pub(crate) mod test_support;

///
/// CONSTANTS
///

/// Field used by the presence guard when no override is configured.
///
/// A purely negative query is not a legal root query for the search engine,
/// so the compiler appends `+Id:>0` to such predicates.
pub const DEFAULT_GUARD_FIELD: &str = "Id";

///
/// Prelude
///
/// Prelude contains only query vocabulary.
/// No catalogs, sinks, or error plumbing are re-exported here.
///

pub mod prelude {
    pub use crate::{
        query::{
            QueryBuilder,
            ast::{AutofilterMode, ExecutionMode, SortDirection},
            expr::{
                Expr, assignable_to, cond, field, handler_is, in_folder, in_tree, now, today,
                type_exact, type_is, value,
            },
            scope::{PathUsage, ScopeDescriptor},
        },
        schema::ContentHandler,
        value::{NodeRef, Value},
    };
}
