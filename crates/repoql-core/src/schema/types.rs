use std::{
    any::{TypeId, type_name},
    collections::BTreeMap,
};

///
/// ContentHandler
///
/// Marker for host types that back a content type. Type filters written
/// against a handler (`c.ContentHandler is T`, `OfType<T>()`) are resolved
/// to a content type name through a `TypeRegistry`.
///

pub trait ContentHandler: 'static {}

///
/// HandlerType
///

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct HandlerType {
    id: TypeId,
    name: &'static str,
}

impl HandlerType {
    #[must_use]
    pub fn of<T: ContentHandler>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    /// Rust type name of the handler, for diagnostics only.
    #[must_use]
    pub const fn rust_name(&self) -> &'static str {
        self.name
    }
}

///
/// TypeRegistry
///

pub trait TypeRegistry: Send + Sync {
    fn type_name_of(&self, handler: &HandlerType) -> Option<&str>;
}

///
/// TypeCatalog
/// Handler → content type name map.
///

#[derive(Clone, Debug, Default)]
pub struct TypeCatalog {
    names: BTreeMap<TypeId, String>,
}

impl TypeCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with<T: ContentHandler>(mut self, content_type: impl Into<String>) -> Self {
        self.register::<T>(content_type);
        self
    }

    pub fn register<T: ContentHandler>(&mut self, content_type: impl Into<String>) {
        self.names.insert(TypeId::of::<T>(), content_type.into());
    }
}

impl TypeRegistry for TypeCatalog {
    fn type_name_of(&self, handler: &HandlerType) -> Option<&str> {
        self.names.get(&handler.id).map(String::as_str)
    }
}

///
/// TESTS
///
