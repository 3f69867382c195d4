//! Tables: types, builder, request processing and views.
//!
//! A [`TableType`] declares table options and adds columns through a
//! [`TableBuilder`]. A [`Table`] resolves the type chain, builds its
//! columns and then serves two purposes:
//!
//! - [`Table::create_view`] orders the columns and produces the
//!   [`TableView`] a template renders.
//! - [`Table::handle_request`] followed by [`Table::create_json_data`]
//!   answers the grid widget's data requests, applying ordering, global
//!   search and column filters to a copy of the base query.
//!
//! ```
//! use std::sync::Arc;
//!
//! use datagrid::options::Options;
//! use datagrid::registry::Registry;
//! use datagrid::table::{DataSource, Table};
//! use serde_json::json;
//!
//! let rows = vec![json!({"id": 1, "name": "Ada"}), json!({"id": 2, "name": "Grace"})];
//! let mut table = Table::new(
//!     "client_side_table",
//!     DataSource::rows(rows),
//!     Options::new().set("data", false),
//!     Arc::new(Registry::new()),
//! )
//! .unwrap();
//! table.add("name", "string", Options::new()).unwrap();
//!
//! let data = table.create_json_data(None).unwrap();
//! assert_eq!(data["recordsTotal"], 2);
//! assert_eq!(data["data"][1]["name"]["display"], "Grace");
//! ```

mod builder;
mod builtin;
mod definition;
mod request;
mod view;

pub use builder::TableBuilder;
pub use builtin::BuiltinTableType;
pub use definition::{DataSource, Table};
pub use request::{ColumnRequest, OrderRequest, SearchRequest, TableRequest};
pub use view::{TableView, ToggleGroup};

use uuid::Uuid;

use crate::error::Result;
use crate::hierarchy::HierarchicalType;
use crate::options::{OptionsSchema, ResolvedOptions};
use crate::registry::Registry;

/// What a table type sees while declaring its options.
#[derive(Clone, Copy)]
pub struct TableContext<'a> {
    pub registry: &'a Registry,
}

/// A table type.
///
/// Application tables usually derive from `table` or `client_side_table`
/// and only add columns:
///
/// ```
/// use datagrid::error::Result;
/// use datagrid::hierarchy::HierarchicalType;
/// use datagrid::options::{Options, ResolvedOptions};
/// use datagrid::table::{TableBuilder, TableType};
///
/// struct UserTable;
///
/// impl HierarchicalType for UserTable {
///     fn name(&self) -> &str { "users" }
///     fn parent(&self) -> Option<&str> { Some("client_side_table") }
/// }
///
/// impl TableType for UserTable {
///     fn build_table(&self, builder: &mut TableBuilder, _options: &ResolvedOptions) -> Result<()> {
///         builder
///             .add("name", "string", Options::new())?
///             .add("email", "email", Options::new())?;
///         Ok(())
///     }
/// }
/// ```
pub trait TableType: HierarchicalType {
    /// Declares or adjusts options. Called root first.
    fn configure_options(&self, _schema: &mut OptionsSchema, _ctx: &TableContext<'_>) {}

    /// Adds columns. Called root first.
    fn build_table(&self, _builder: &mut TableBuilder, _options: &ResolvedOptions) -> Result<()> {
        Ok(())
    }

    /// Adds view variables. Called root first, after the column views
    /// exist.
    fn build_view(&self, _view: &mut TableView, _table: &Table, _options: &ResolvedOptions) {}

    /// DOM id of a rendered table. Only the leaf type is asked.
    fn id(&self, _options: &ResolvedOptions) -> String {
        format!("datatable_{}", Uuid::new_v4().simple())
    }
}
