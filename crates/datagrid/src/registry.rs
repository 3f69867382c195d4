//! Type registry and external services.
//!
//! The [`Registry`] maps type names to shared, stateless type instances for
//! the column, filter and table families and hands out their root-first
//! chains. It also carries the services types depend on: a [`Translator`],
//! an optional [`UrlGenerator`] and the bundle [`DatagridConfig`].

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::column::{BuiltinColumnType, ColumnType};
use crate::config::DatagridConfig;
use crate::error::Result;
use crate::filter::{BuiltinFilterType, FilterType};
use crate::hierarchy::TypeChain;
use crate::table::{BuiltinTableType, TableType};

/// Translates message ids.
pub trait Translator: Send + Sync {
    /// Translates `id` in the given domain.
    fn trans(&self, id: &str, domain: Option<&str>) -> String;
}

/// Returns message ids unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityTranslator;

impl Translator for IdentityTranslator {
    fn trans(&self, id: &str, _domain: Option<&str>) -> String {
        id.to_string()
    }
}

/// Generates URLs for named routes (used by array-form `route` options).
pub trait UrlGenerator: Send + Sync {
    fn generate(&self, route: &str, params: &Map<String, Value>) -> String;
}

/// Registered types and services.
#[derive(Clone)]
pub struct Registry {
    column_types: HashMap<String, Arc<dyn ColumnType>>,
    filter_types: HashMap<String, Arc<dyn FilterType>>,
    table_types: HashMap<String, Arc<dyn TableType>>,
    translator: Arc<dyn Translator>,
    url_generator: Option<Arc<dyn UrlGenerator>>,
    config: DatagridConfig,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut columns: Vec<_> = self.column_types.keys().collect();
        let mut filters: Vec<_> = self.filter_types.keys().collect();
        let mut tables: Vec<_> = self.table_types.keys().collect();
        columns.sort();
        filters.sort();
        tables.sort();
        f.debug_struct("Registry")
            .field("column_types", &columns)
            .field("filter_types", &filters)
            .field("table_types", &tables)
            .field("config", &self.config)
            .finish()
    }
}

impl Registry {
    /// A registry holding the built-in catalog.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        for ty in BuiltinColumnType::ALL {
            registry.register_column_type(ty);
        }
        for ty in BuiltinFilterType::ALL {
            registry.register_filter_type(ty);
        }
        for ty in BuiltinTableType::ALL {
            registry.register_table_type(ty);
        }
        registry
    }

    /// A registry without any types.
    pub fn empty() -> Self {
        Registry {
            column_types: HashMap::new(),
            filter_types: HashMap::new(),
            table_types: HashMap::new(),
            translator: Arc::new(IdentityTranslator),
            url_generator: None,
            config: DatagridConfig::default(),
        }
    }

    pub fn with_config(mut self, config: DatagridConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_translator(mut self, translator: impl Translator + 'static) -> Self {
        self.translator = Arc::new(translator);
        self
    }

    pub fn with_url_generator(mut self, generator: impl UrlGenerator + 'static) -> Self {
        self.url_generator = Some(Arc::new(generator));
        self
    }

    // ========================================================================
    // Registration
    // ========================================================================

    /// Registers a column type under its name, replacing any earlier one.
    pub fn register_column_type(&mut self, ty: impl ColumnType + 'static) -> &mut Self {
        let ty: Arc<dyn ColumnType> = Arc::new(ty);
        self.column_types.insert(ty.name().to_string(), ty);
        self
    }

    pub fn register_filter_type(&mut self, ty: impl FilterType + 'static) -> &mut Self {
        let ty: Arc<dyn FilterType> = Arc::new(ty);
        self.filter_types.insert(ty.name().to_string(), ty);
        self
    }

    pub fn register_table_type(&mut self, ty: impl TableType + 'static) -> &mut Self {
        let ty: Arc<dyn TableType> = Arc::new(ty);
        self.table_types.insert(ty.name().to_string(), ty);
        self
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    pub fn column_type(&self, name: &str) -> Option<Arc<dyn ColumnType>> {
        self.column_types.get(name).cloned()
    }

    pub fn filter_type(&self, name: &str) -> Option<Arc<dyn FilterType>> {
        self.filter_types.get(name).cloned()
    }

    pub fn table_type(&self, name: &str) -> Option<Arc<dyn TableType>> {
        self.table_types.get(name).cloned()
    }

    pub fn column_chain(&self, name: &str) -> Result<TypeChain<dyn ColumnType>> {
        TypeChain::build("column", name, |n| self.column_type(n))
    }

    pub fn filter_chain(&self, name: &str) -> Result<TypeChain<dyn FilterType>> {
        TypeChain::build("filter", name, |n| self.filter_type(n))
    }

    pub fn table_chain(&self, name: &str) -> Result<TypeChain<dyn TableType>> {
        TypeChain::build("table", name, |n| self.table_type(n))
    }

    pub fn translator(&self) -> &dyn Translator {
        self.translator.as_ref()
    }

    pub fn url_generator(&self) -> Option<&dyn UrlGenerator> {
        self.url_generator.as_deref()
    }

    /// Shared handle for delegates that outlive the borrow.
    pub fn shared_url_generator(&self) -> Option<Arc<dyn UrlGenerator>> {
        self.url_generator.clone()
    }

    pub fn config(&self) -> &DatagridConfig {
        &self.config
    }
}
