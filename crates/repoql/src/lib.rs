//! ## Crate layout
//! - `core`: expression model, query AST, normalizer, scope merging and the
//!   query-text serializer.
//! - `compiler`: a thread-safe compiler handle over a published field catalog.
//! - `error`: the public error taxonomy.
//!
//! The `prelude` module carries everything needed to build and compile a
//! query.

pub use repoql_core as core;

pub mod compiler;
pub mod error;

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use compiler::QueryCompiler;
pub use error::Error;

///
/// Prelude
///

pub mod prelude {
    pub use crate::{Error, QueryCompiler};
    pub use repoql_core::prelude::*;
}
