use super::field::{DataType, FieldInfo, FieldResolver};
use serde::Deserialize;
use std::{
    collections::BTreeMap,
    sync::{Arc, PoisonError, RwLock},
};
use thiserror::Error as ThisError;

///
/// CatalogError
///

#[derive(Debug, ThisError)]
pub enum CatalogError {
    #[error("invalid field catalog: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid field catalog: field name must not be empty")]
    EmptyFieldName,
}

///
/// FieldCatalog
///
/// Immutable field-name → descriptor map. A catalog is never mutated once
/// published; schema refreshes build a new one.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FieldCatalog {
    fields: BTreeMap<String, FieldInfo>,
}

impl FieldCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog with the fields every content item carries.
    #[must_use]
    pub fn standard() -> Self {
        Self::new()
            .with_field("Id", DataType::Int)
            .with_field("ParentId", DataType::Int)
            .with_field("Index", DataType::Int)
            .with_field("Depth", DataType::Int)
            .with_field("Name", DataType::Text)
            .with_field("DisplayName", DataType::Text)
            .with_field("Path", DataType::Text)
            .with_field("Description", DataType::Text)
            .with_field("Version", DataType::Text)
            .with_field("Icon", DataType::Text)
            .with_field("IsFolder", DataType::Bool)
            .with_field("Hidden", DataType::Bool)
            .with_field("CreationDate", DataType::DateTime)
            .with_field("ModificationDate", DataType::DateTime)
            .with_field("CreatedBy", DataType::Reference)
            .with_field("ModifiedBy", DataType::Reference)
            .with_field("Owner", DataType::Reference)
    }

    /// Register a single-valued field indexed under its own name.
    #[must_use]
    pub fn with_field(self, name: &str, data_type: DataType) -> Self {
        self.with_info(name, FieldInfo::new(name, data_type))
    }

    #[must_use]
    pub fn with_info(mut self, name: &str, info: FieldInfo) -> Self {
        self.fields.insert(name.to_string(), info);
        self
    }

    /// Parse a catalog from TOML, one `[fields.<Name>]` table per field.
    ///
    /// ```toml
    /// [fields.Tags]
    /// type = "text"
    /// multivalued = true
    /// indexed_name = "Tags"   # optional, defaults to the table key
    /// ```
    pub fn from_toml_str(source: &str) -> Result<Self, CatalogError> {
        let document: CatalogDocument = toml::from_str(source)?;
        let mut catalog = Self::new();

        for (name, def) in document.fields {
            if name.trim().is_empty() {
                return Err(CatalogError::EmptyFieldName);
            }

            let info = FieldInfo {
                indexed_name: def.indexed_name.unwrap_or_else(|| name.clone()),
                data_type: def.data_type,
                multivalued: def.multivalued,
            };
            catalog.fields.insert(name, info);
        }

        Ok(catalog)
    }

    /// Merge `other` over `self`; entries in `other` win.
    #[must_use]
    pub fn merged(mut self, other: Self) -> Self {
        self.fields.extend(other.fields);
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FieldResolver for FieldCatalog {
    fn resolve(&self, name: &str) -> Option<&FieldInfo> {
        self.fields.get(name)
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogDocument {
    #[serde(default)]
    fields: BTreeMap<String, FieldDef>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct FieldDef {
    #[serde(rename = "type")]
    data_type: DataType,
    #[serde(default)]
    multivalued: bool,
    indexed_name: Option<String>,
}

///
/// SharedFieldCatalog
///
/// Copy-on-write publication point for field metadata. Compilations pin the
/// snapshot they start with; `publish` swaps in a new catalog without
/// disturbing in-flight readers.
///

#[derive(Debug, Default)]
pub struct SharedFieldCatalog {
    current: RwLock<Arc<FieldCatalog>>,
}

impl SharedFieldCatalog {
    #[must_use]
    pub fn new(catalog: FieldCatalog) -> Self {
        Self {
            current: RwLock::new(Arc::new(catalog)),
        }
    }

    /// Pin the current catalog.
    #[must_use]
    pub fn snapshot(&self) -> Arc<FieldCatalog> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Replace the published catalog, returning the previous one.
    pub fn publish(&self, catalog: FieldCatalog) -> Arc<FieldCatalog> {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, Arc::new(catalog))
    }

    /// Derive a new catalog from the current one and publish it.
    pub fn update(&self, f: impl FnOnce(FieldCatalog) -> FieldCatalog) {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let next = f(FieldCatalog::clone(&guard));
        *guard = Arc::new(next);
    }
}

///
/// TESTS
///
