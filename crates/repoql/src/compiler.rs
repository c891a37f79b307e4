use crate::Error;
use repoql_core::{
    config::CompilerOptions,
    query::{Clock, CompileContext, QuerySpec, ScopeDescriptor, ast::CompiledText},
    schema::{ContentHandler, FieldCatalog, SharedFieldCatalog, TypeCatalog},
};
use std::sync::Arc;

///
/// QueryCompiler
///
/// Long-lived compiler handle shared across threads. Each compilation pins
/// the field catalog published when it starts, so a concurrent `publish`
/// never changes a query halfway through.
///

#[derive(Debug)]
pub struct QueryCompiler {
    fields: SharedFieldCatalog,
    types: TypeCatalog,
    options: CompilerOptions,
    clock: Clock,
}

impl Default for QueryCompiler {
    fn default() -> Self {
        Self::new(FieldCatalog::standard(), TypeCatalog::new(), CompilerOptions::default())
    }
}

impl QueryCompiler {
    #[must_use]
    pub fn new(fields: FieldCatalog, types: TypeCatalog, options: CompilerOptions) -> Self {
        Self {
            fields: SharedFieldCatalog::new(fields),
            types,
            options,
            clock: Clock::System,
        }
    }

    /// Build from TOML documents: compiler options, and extra fields merged
    /// over the standard catalog.
    pub fn from_toml(options: &str, fields: &str) -> Result<Self, Error> {
        let options = CompilerOptions::from_toml_str(options)?;
        let fields = FieldCatalog::standard().merged(FieldCatalog::from_toml_str(fields)?);

        Ok(Self::new(fields, TypeCatalog::new(), options))
    }

    /// Register the content type backing handler `T`.
    #[must_use]
    pub fn with_type<T: ContentHandler>(mut self, content_type: impl Into<String>) -> Self {
        self.types.register::<T>(content_type);
        self
    }

    /// Pin `Now` for every compilation, e.g. in tests.
    #[must_use]
    pub const fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub const fn options(&self) -> &CompilerOptions {
        &self.options
    }

    /// Publish a new field catalog; in-flight compilations keep the old one.
    pub fn publish_fields(&self, catalog: FieldCatalog) -> Arc<FieldCatalog> {
        tracing::info!(fields = catalog.len(), "publishing field catalog");
        self.fields.publish(catalog)
    }

    pub fn update_fields(&self, f: impl FnOnce(FieldCatalog) -> FieldCatalog) {
        self.fields.update(f);
    }

    pub fn compile(
        &self,
        spec: &QuerySpec,
        scope: &ScopeDescriptor,
    ) -> Result<CompiledText, Error> {
        let fields = self.fields.snapshot();
        let ctx = CompileContext::new(fields.as_ref(), &self.types, &self.options)
            .with_clock(self.clock);

        Ok(spec.compile(scope, &ctx)?)
    }

    /// Compile with no scope.
    pub fn compile_unscoped(&self, spec: &QuerySpec) -> Result<CompiledText, Error> {
        self.compile(spec, &ScopeDescriptor::default())
    }
}
