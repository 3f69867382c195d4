//! Column filters.
//!
//! A [`FilterType`] declares the options of a filter widget, builds its
//! view and turns a submitted filter value into a query expression. A
//! [`Filter`] binds a resolved filter chain to its column.
//!
//! Filter types contribute expressions only; the table ANDs them into the
//! query.

mod builtin;
mod definition;
pub mod engine;
mod value;
mod view;

pub use builtin::BuiltinFilterType;
pub use definition::Filter;
pub use engine::MatchMode;
pub use value::{FilterValue, QuerySnapshot, RANGE_DELIMITER};
pub use view::FilterView;

use datagrid_query::{Expr, QueryBuilder};

use crate::error::Result;
use crate::hierarchy::HierarchicalType;
use crate::options::{OptionsSchema, ResolvedOptions};
use crate::registry::Registry;

/// What a filter type sees while declaring its options.
#[derive(Clone, Copy)]
pub struct FilterContext<'a> {
    pub column_options: &'a ResolvedOptions,
    pub table_options: &'a ResolvedOptions,
    pub registry: &'a Registry,
}

/// What a filter type sees while building its view.
#[derive(Clone, Copy)]
pub struct FilterViewContext<'a> {
    /// The table's base query, when the table has a backend.
    pub snapshot: Option<&'a QuerySnapshot>,
    /// Alias-qualified path the filter applies to.
    pub query_path: &'a str,
    pub root_alias: &'a str,
    pub column_options: &'a ResolvedOptions,
    pub registry: &'a Registry,
}

/// A filter type.
///
/// Only the leaf type of a chain applies filters. A custom type that wants
/// the behavior of a built-in ancestor delegates to it explicitly.
pub trait FilterType: HierarchicalType {
    /// Declares or adjusts options. Called root first.
    fn configure_options(&self, _schema: &mut OptionsSchema, _ctx: &FilterContext<'_>) {}

    /// Adds view variables. Called root first.
    fn build_view(&self, _view: &mut FilterView, _options: &ResolvedOptions, _ctx: &FilterViewContext<'_>) -> Result<()> {
        Ok(())
    }

    /// The expression for a submitted value, binding its parameters on
    /// `query`. Defaults to text matching.
    #[allow(clippy::too_many_arguments)]
    fn apply_filter(
        &self,
        query: &mut QueryBuilder,
        value: &FilterValue,
        multi: bool,
        binding: &str,
        query_path: &str,
        options: &ResolvedOptions,
        _root_alias: &str,
    ) -> Option<Expr> {
        engine::apply_match(query, value, multi, binding, query_path, options)
    }
}
