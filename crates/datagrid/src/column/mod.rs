//! Columns: types, definitions and views.
//!
//! A [`ColumnType`] is a stateless strategy registered by name. Each type
//! names an optional parent; the chain from the `column` root down to the
//! leaf contributes option declarations, view variables and data
//! transformers, always root first.
//!
//! A [`Column`] binds a resolved chain to a path, the owning table's
//! options and an optional [`Filter`](crate::filter::Filter).

mod builtin;
mod capability;
mod definition;
mod view;

pub use builtin::BuiltinColumnType;
pub(crate) use builtin::is_css_length;
pub use capability::{resolve_capability, Capability};
pub use definition::{ClientDelegate, Column, ValueDelegate};
pub use view::ColumnView;

use crate::hierarchy::HierarchicalType;
use crate::options::{OptionsSchema, ResolvedOptions};
use crate::registry::Registry;
use crate::transform::TransformerChain;

/// What a column type sees while declaring its options.
#[derive(Clone, Copy)]
pub struct ColumnContext<'a> {
    /// Resolved options of the owning table.
    pub table_options: &'a ResolvedOptions,
    pub registry: &'a Registry,
}

/// A column type.
///
/// Every hook defaults to doing nothing, so a custom type only overrides
/// what it changes:
///
/// ```
/// use datagrid::column::{ColumnContext, ColumnType};
/// use datagrid::hierarchy::HierarchicalType;
/// use datagrid::options::OptionsSchema;
///
/// struct Shouting;
///
/// impl HierarchicalType for Shouting {
///     fn name(&self) -> &str { "shouting" }
///     fn parent(&self) -> Option<&str> { Some("string") }
/// }
///
/// impl ColumnType for Shouting {
///     fn configure_options(&self, schema: &mut OptionsSchema, _ctx: &ColumnContext<'_>) {
///         schema.set_default("class_name", "shout");
///     }
/// }
/// ```
pub trait ColumnType: HierarchicalType {
    /// Declares or adjusts options. Called root first.
    fn configure_options(&self, _schema: &mut OptionsSchema, _ctx: &ColumnContext<'_>) {}

    /// Adds view variables. Called root first.
    fn build_view(&self, _view: &mut ColumnView, _column: &Column, _options: &ResolvedOptions) {}

    /// Installs data transformers. Called root first, once per column.
    fn build_data(&self, _transformers: &mut TransformerChain, _options: &ResolvedOptions) {}
}
