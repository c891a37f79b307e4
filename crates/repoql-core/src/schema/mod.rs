//! Schema collaborators consumed by the compiler.
//!
//! The compiler never reaches for process-wide schema state; field metadata
//! and content type names arrive through the traits defined here.

mod catalog;
mod field;
mod types;

pub use catalog::{CatalogError, FieldCatalog, SharedFieldCatalog};
pub use field::{DataType, FieldInfo, FieldResolver};
pub use types::{ContentHandler, HandlerType, TypeCatalog, TypeRegistry};
