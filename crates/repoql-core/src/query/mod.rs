//! Predicate-to-query-text compiler.
//!
//! Stages run in a fixed order: `lower` maps expressions to the AST,
//! `normalize` canonicalizes it, `scope` merges caller restrictions and
//! `render` serializes the result.

pub mod ast;
pub mod builder;
pub mod compile;
pub mod context;
pub mod expr;
pub mod fold;
pub(crate) mod lower;
pub mod normalize;
pub mod render;
pub mod scope;


// re-exports
pub use builder::{QueryBuilder, QuerySpec};
pub use compile::{compile, compile_query};
pub use context::CompileContext;
pub use fold::Clock;
pub use normalize::normalize;
pub use render::render;
pub use scope::{PathUsage, ScopeDescriptor};
