//! # Datagrid - Declarative Data Tables
//!
//! `datagrid` describes data tables for a browser grid widget: which columns
//! exist, how their cells are computed and formatted, how they are ordered,
//! searched and filtered, and how the widget's server-side requests are
//! answered.
//!
//! ## Core Concepts
//!
//! - Types: [`ColumnType`](column::ColumnType), [`FilterType`](filter::FilterType)
//!   and [`TableType`](table::TableType) are stateless strategies registered
//!   by name. Each names an optional parent; options, views and data
//!   transformers are contributed root first.
//! - [`OptionsSchema`]: the merged option declarations of a type chain,
//!   resolving caller [`Options`] into [`ResolvedOptions`].
//! - [`Registry`]: the type catalog plus the services types depend on.
//! - [`Table`](table::Table): columns, request handling, JSON data and views.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use datagrid::table::{DataSource, Table, TableRequest};
//! use datagrid::{Options, Registry};
//! use datagrid_query::{MemoryBackend, QueryBuilder};
//! use serde_json::json;
//!
//! let rows = vec![
//!     json!({"id": 1, "name": "Ada", "age": 36}),
//!     json!({"id": 2, "name": "Grace", "age": 85}),
//! ];
//! let source = DataSource::query(QueryBuilder::new("u"), MemoryBackend::new(rows));
//! let mut table = Table::new(
//!     "table",
//!     source,
//!     Options::new().set("ajax_url", "/people"),
//!     Arc::new(Registry::new()),
//! )
//! .unwrap();
//! table
//!     .add("name", "string", Options::new())
//!     .unwrap()
//!     .add("age", "integer", Options::new())
//!     .unwrap();
//!
//! let request = TableRequest::from_value(&json!({
//!     "draw": "1",
//!     "columns": [{"name": "name", "searchable": "true", "orderable": "true"}],
//!     "search": {"value": "gra"},
//! }));
//! table.handle_request(request);
//!
//! let data = table.create_json_data(None).unwrap();
//! assert_eq!(data["recordsTotal"], 2);
//! assert_eq!(data["recordsFiltered"], 1);
//! assert_eq!(data["data"][0]["name"]["display"], "Grace");
//! ```
//!
//! ## Capabilities
//!
//! A column's `orderable`, `searchable` and `filterable` options accept
//! `true`, `false`, `"server"` or `"client"`. On tables that are not
//! server-side a plain `true` means `"client"`.
//!
//! ## Logging
//!
//! Events are emitted with `tracing` at debug level. See [`logging`] for a
//! ready-made subscriber.

pub mod column;
pub mod config;
pub mod error;
pub mod filter;
pub mod hierarchy;
pub mod logging;
pub mod options;
pub mod orderer;
pub mod property;
pub mod registry;
pub mod table;
pub mod template;
pub mod transform;

/// Translation domain of the crate's own messages.
pub const TRANSLATION_DOMAIN: &str = "datagrid";

// Re-export public API
pub use config::DatagridConfig;
pub use error::{ConfigurationError, DatagridError, Result};
pub use hierarchy::{HierarchicalType, TypeChain};
pub use options::{Callback, OptionValue, Options, OptionsSchema, ResolvedOptions};
pub use orderer::{ColumnOrderer, Position};
pub use property::try_get_property;
pub use registry::{Registry, Translator, UrlGenerator};
