//! Read-only collaborator lookups used by concrete providers
//!
//! Some export formats carry auxiliary fields that are not part of the
//! record itself: translated names, the stores an entity is limited to, the
//! breadcrumb path of a category. Providers resolve them through these
//! narrow, synchronous, single-record lookups.
//!
//! The in-memory implementations back tests and the command-line host.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// A configured storefront language
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Language {
    /// Language identifier
    pub id: i64,
    /// Culture code, e.g. `de-DE`
    pub culture: String,
}

impl Language {
    /// Create a new language
    pub fn new(id: i64, culture: &str) -> Self {
        Self {
            id,
            culture: culture.to_string(),
        }
    }
}

/// Localized property lookup
pub trait LocalizationService: Send + Sync {
    /// Languages to export localized values for, in output order
    fn languages(&self) -> Vec<Language>;

    /// Localized value of an entity property
    ///
    /// # Arguments
    /// * `key_group` - Entity name, e.g. `Product`
    /// * `entity_id` - Entity identifier
    /// * `key` - Property name, e.g. `Name`
    /// * `language_id` - Target language
    fn localized_value(
        &self,
        key_group: &str,
        entity_id: i64,
        key: &str,
        language_id: i64,
    ) -> Option<String>;
}

/// Store mapping lookup
pub trait StoreMappingService: Send + Sync {
    /// Identifiers of the stores an entity is limited to, ascending
    fn store_ids(&self, entity_name: &str, entity_id: i64) -> Vec<i64>;
}

/// Catalog lookup
pub trait CatalogService: Send + Sync {
    /// Breadcrumb path of a category, e.g. `Furniture >> Desks`
    fn category_path(&self, category_id: i64) -> Option<String>;
}

/// Collaborator bundle handed to providers through the execution context
#[derive(Clone)]
pub struct ExportServices {
    pub localization: Arc<dyn LocalizationService>,
    pub store_mappings: Arc<dyn StoreMappingService>,
    pub catalog: Arc<dyn CatalogService>,
}

impl Default for ExportServices {
    fn default() -> Self {
        Self {
            localization: Arc::new(InMemoryLocalization::default()),
            store_mappings: Arc::new(InMemoryStoreMappings::default()),
            catalog: Arc::new(InMemoryCatalog::default()),
        }
    }
}

impl ExportServices {
    /// Replace the localization lookup
    pub fn with_localization(mut self, service: impl LocalizationService + 'static) -> Self {
        self.localization = Arc::new(service);
        self
    }

    /// Replace the store mapping lookup
    pub fn with_store_mappings(mut self, service: impl StoreMappingService + 'static) -> Self {
        self.store_mappings = Arc::new(service);
        self
    }

    /// Replace the catalog lookup
    pub fn with_catalog(mut self, service: impl CatalogService + 'static) -> Self {
        self.catalog = Arc::new(service);
        self
    }
}

/// Localization lookup backed by a map
#[derive(Debug, Clone, Default)]
pub struct InMemoryLocalization {
    languages: Vec<Language>,
    values: HashMap<(String, i64, String, i64), String>,
}

impl InMemoryLocalization {
    /// Create a lookup with the given languages
    pub fn new(languages: Vec<Language>) -> Self {
        Self {
            languages,
            values: HashMap::new(),
        }
    }

    /// Add a localized value
    pub fn with_value(
        mut self,
        key_group: &str,
        entity_id: i64,
        key: &str,
        language_id: i64,
        value: &str,
    ) -> Self {
        self.values.insert(
            (key_group.to_string(), entity_id, key.to_string(), language_id),
            value.to_string(),
        );
        self
    }
}

impl LocalizationService for InMemoryLocalization {
    fn languages(&self) -> Vec<Language> {
        self.languages.clone()
    }

    fn localized_value(
        &self,
        key_group: &str,
        entity_id: i64,
        key: &str,
        language_id: i64,
    ) -> Option<String> {
        self.values
            .get(&(key_group.to_string(), entity_id, key.to_string(), language_id))
            .cloned()
    }
}

/// Store mapping lookup backed by a map
#[derive(Debug, Clone, Default)]
pub struct InMemoryStoreMappings {
    mappings: HashMap<(String, i64), Vec<i64>>,
}

impl InMemoryStoreMappings {
    /// Create an empty lookup
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit an entity to a set of stores
    pub fn with_mapping(mut self, entity_name: &str, entity_id: i64, store_ids: &[i64]) -> Self {
        let mut ids = store_ids.to_vec();
        ids.sort_unstable();
        ids.dedup();
        self.mappings.insert((entity_name.to_string(), entity_id), ids);
        self
    }
}

impl StoreMappingService for InMemoryStoreMappings {
    fn store_ids(&self, entity_name: &str, entity_id: i64) -> Vec<i64> {
        self.mappings
            .get(&(entity_name.to_string(), entity_id))
            .cloned()
            .unwrap_or_default()
    }
}

/// Catalog lookup backed by a category tree
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    /// category id → (name, parent id)
    categories: HashMap<i64, (String, Option<i64>)>,
}

/// Separator between breadcrumb segments
const PATH_SEPARATOR: &str = " >> ";

impl InMemoryCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a category
    pub fn with_category(mut self, id: i64, name: &str, parent_id: Option<i64>) -> Self {
        self.categories.insert(id, (name.to_string(), parent_id));
        self
    }
}

impl CatalogService for InMemoryCatalog {
    fn category_path(&self, category_id: i64) -> Option<String> {
        let mut names = Vec::new();
        let mut next = Some(category_id);

        while let Some(id) = next {
            // Cycles in bad data must not hang the export
            if names.len() > self.categories.len() {
                break;
            }
            let (name, parent) = self.categories.get(&id)?;
            names.push(name.as_str());
            next = *parent;
        }

        names.reverse();
        Some(names.join(PATH_SEPARATOR))
    }
}
