use crate::{
    config::CompilerOptions,
    query::fold::Clock,
    schema::{FieldResolver, TypeRegistry},
};
use time::OffsetDateTime;

///
/// CompileContext
///
/// Everything a compilation reads besides the query itself. Collaborators
/// are borrowed for the duration of one call; a context holds no mutable
/// state and can be shared between threads.
///

#[derive(Clone, Copy)]
pub struct CompileContext<'a> {
    fields: &'a dyn FieldResolver,
    types: &'a dyn TypeRegistry,
    options: &'a CompilerOptions,
    clock: Clock,
}

impl<'a> CompileContext<'a> {
    #[must_use]
    pub fn new(
        fields: &'a dyn FieldResolver,
        types: &'a dyn TypeRegistry,
        options: &'a CompilerOptions,
    ) -> Self {
        Self {
            fields,
            types,
            options,
            clock: Clock::System,
        }
    }

    /// Pin `Now` to a fixed instant.
    #[must_use]
    pub const fn with_clock_at(mut self, at: OffsetDateTime) -> Self {
        self.clock = Clock::Fixed(at);
        self
    }

    #[must_use]
    pub const fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub const fn fields(&self) -> &'a dyn FieldResolver {
        self.fields
    }

    #[must_use]
    pub const fn types(&self) -> &'a dyn TypeRegistry {
        self.types
    }

    #[must_use]
    pub const fn options(&self) -> &'a CompilerOptions {
        self.options
    }

    #[must_use]
    pub const fn clock(&self) -> Clock {
        self.clock
    }
}
