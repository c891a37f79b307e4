//! Shared fixtures for in-crate tests.

use crate::{
    config::CompilerOptions,
    error::CompileError,
    query::{CompileContext, QueryBuilder, ScopeDescriptor, ast::CompiledText},
    schema::{ContentHandler, DataType, FieldCatalog, FieldInfo, TypeCatalog},
};
use time::macros::datetime;

pub(crate) struct Car;
impl ContentHandler for Car {}

pub(crate) struct Folder;
impl ContentHandler for Folder {}

/// Handler with no registered content type.
pub(crate) struct Orphan;
impl ContentHandler for Orphan {}

///
/// Fixture
/// Standard catalogs plus options, borrowed by a fixed-clock context.
///

pub(crate) struct Fixture {
    pub(crate) fields: FieldCatalog,
    pub(crate) types: TypeCatalog,
    pub(crate) options: CompilerOptions,
}

impl Fixture {
    pub(crate) fn new() -> Self {
        Self {
            fields: FieldCatalog::standard()
                .with_info("Keywords", FieldInfo::new("Keywords", DataType::Text).multivalued())
                .with_info(
                    "Members",
                    FieldInfo::new("Members", DataType::Reference).multivalued(),
                )
                .with_info("Make", FieldInfo::new("Make", DataType::Text))
                .with_info("Price", FieldInfo::new("Price", DataType::Float)),
            types: TypeCatalog::new()
                .with::<Car>("Car")
                .with::<Folder>("Folder"),
            options: CompilerOptions::default(),
        }
    }

    pub(crate) fn ctx(&self) -> CompileContext<'_> {
        CompileContext::new(&self.fields, &self.types, &self.options)
            .with_clock_at(datetime!(2026-10-17 13:45:30 UTC))
    }

    pub(crate) fn compile(
        &self,
        query: QueryBuilder,
        scope: &ScopeDescriptor,
    ) -> Result<CompiledText, CompileError> {
        query.build().compile(scope, &self.ctx())
    }

    /// Compile without scope and return the text.
    pub(crate) fn text(&self, query: QueryBuilder) -> String {
        self.compile(query, &ScopeDescriptor::default())
            .map(|compiled| compiled.text)
            .unwrap_or_else(|err| panic!("compile failed: {err}"))
    }
}
