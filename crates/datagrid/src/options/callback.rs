//! Delegates carried as option values.
//!
//! Every pluggable behaviour (value access, client sort/search values,
//! server ordering, searching and filtering, row attributes, links, filter
//! data and labels) is a tagged [`Callback`]. All context is passed in
//! explicitly; callbacks never reach back into the table.

use std::fmt;
use std::sync::Arc;

use datagrid_query::{Dir, Expr, OrderBy, QueryBuilder};
use serde_json::Value;

use super::resolved::ResolvedOptions;
use crate::column::Column;
use crate::error::Result;
use crate::filter::{FilterValue, QuerySnapshot};

/// `(item, path, column options) -> value`
pub type ValueFn = dyn Fn(&Value, &str, &ResolvedOptions) -> Value + Send + Sync;
/// `(item, path, value, root alias, column options) -> value`
pub type ClientFn = dyn Fn(&Value, &str, &Value, &str, &ResolvedOptions) -> Value + Send + Sync;
/// `(direction, query, column, query path, root alias) -> orderings`
pub type OrderServerFn = dyn Fn(Dir, &QueryBuilder, &Column, &str, &str) -> Vec<OrderBy> + Send + Sync;
/// `(query, binding, term, column, query path) -> expressions`
pub type SearchServerFn = dyn Fn(&mut QueryBuilder, &str, &str, &Column, &str) -> Vec<Expr> + Send + Sync;
/// `(query, value, multi-value flag, binding, query path, filter options, root alias) -> expression`
pub type FilterServerFn = dyn Fn(&mut QueryBuilder, &FilterValue, bool, &str, &str, &ResolvedOptions, &str) -> Option<Expr>
    + Send
    + Sync;
/// `(value, multi-value flag, filter options) -> valid`
pub type FilterValidationFn = dyn Fn(&FilterValue, bool, &ResolvedOptions) -> bool + Send + Sync;
/// `(item, table options) -> value`
pub type RowFn = dyn Fn(&Value, &ResolvedOptions) -> Value + Send + Sync;
/// `(item, value) -> url`
pub type LinkFn = dyn Fn(&Value, &Value) -> Value + Send + Sync;
/// `(query snapshot, query path, root alias, filter options) -> raw values`
pub type FilterDataFn = dyn Fn(&QuerySnapshot, &str, &str, &ResolvedOptions) -> Result<Vec<Value>> + Send + Sync;
/// `(parsed value, raw value, filter options) -> label or value`
pub type FilterLabelFn = dyn Fn(&Value, &Value, &ResolvedOptions) -> Value + Send + Sync;
/// `(item, value, column options) -> mapped value`
pub type MappingFn = dyn Fn(&Value, &Value, &ResolvedOptions) -> Value + Send + Sync;

/// The signature family a callback belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallbackKind {
    Value,
    Client,
    OrderServer,
    SearchServer,
    FilterServer,
    FilterValidation,
    Row,
    Link,
    FilterData,
    FilterLabel,
    Mapping,
}

impl CallbackKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CallbackKind::Value => "value",
            CallbackKind::Client => "client",
            CallbackKind::OrderServer => "order_server",
            CallbackKind::SearchServer => "search_server",
            CallbackKind::FilterServer => "filter_server",
            CallbackKind::FilterValidation => "filter_validation",
            CallbackKind::Row => "row",
            CallbackKind::Link => "link",
            CallbackKind::FilterData => "filter_data",
            CallbackKind::FilterLabel => "filter_label",
            CallbackKind::Mapping => "mapping",
        }
    }
}

impl fmt::Display for CallbackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A delegate stored in an option.
#[derive(Clone)]
pub enum Callback {
    Value(Arc<ValueFn>),
    Client(Arc<ClientFn>),
    OrderServer(Arc<OrderServerFn>),
    SearchServer(Arc<SearchServerFn>),
    FilterServer(Arc<FilterServerFn>),
    FilterValidation(Arc<FilterValidationFn>),
    Row(Arc<RowFn>),
    Link(Arc<LinkFn>),
    FilterData(Arc<FilterDataFn>),
    FilterLabel(Arc<FilterLabelFn>),
    Mapping(Arc<MappingFn>),
}

impl Callback {
    pub fn value<F>(f: F) -> Self
    where
        F: Fn(&Value, &str, &ResolvedOptions) -> Value + Send + Sync + 'static,
    {
        Callback::Value(Arc::new(f))
    }

    pub fn client<F>(f: F) -> Self
    where
        F: Fn(&Value, &str, &Value, &str, &ResolvedOptions) -> Value + Send + Sync + 'static,
    {
        Callback::Client(Arc::new(f))
    }

    pub fn order_server<F>(f: F) -> Self
    where
        F: Fn(Dir, &QueryBuilder, &Column, &str, &str) -> Vec<OrderBy> + Send + Sync + 'static,
    {
        Callback::OrderServer(Arc::new(f))
    }

    pub fn search_server<F>(f: F) -> Self
    where
        F: Fn(&mut QueryBuilder, &str, &str, &Column, &str) -> Vec<Expr> + Send + Sync + 'static,
    {
        Callback::SearchServer(Arc::new(f))
    }

    pub fn filter_server<F>(f: F) -> Self
    where
        F: Fn(&mut QueryBuilder, &FilterValue, bool, &str, &str, &ResolvedOptions, &str) -> Option<Expr>
            + Send
            + Sync
            + 'static,
    {
        Callback::FilterServer(Arc::new(f))
    }

    pub fn filter_validation<F>(f: F) -> Self
    where
        F: Fn(&FilterValue, bool, &ResolvedOptions) -> bool + Send + Sync + 'static,
    {
        Callback::FilterValidation(Arc::new(f))
    }

    pub fn row<F>(f: F) -> Self
    where
        F: Fn(&Value, &ResolvedOptions) -> Value + Send + Sync + 'static,
    {
        Callback::Row(Arc::new(f))
    }

    pub fn link<F>(f: F) -> Self
    where
        F: Fn(&Value, &Value) -> Value + Send + Sync + 'static,
    {
        Callback::Link(Arc::new(f))
    }

    pub fn filter_data<F>(f: F) -> Self
    where
        F: Fn(&QuerySnapshot, &str, &str, &ResolvedOptions) -> Result<Vec<Value>> + Send + Sync + 'static,
    {
        Callback::FilterData(Arc::new(f))
    }

    pub fn filter_label<F>(f: F) -> Self
    where
        F: Fn(&Value, &Value, &ResolvedOptions) -> Value + Send + Sync + 'static,
    {
        Callback::FilterLabel(Arc::new(f))
    }

    pub fn mapping<F>(f: F) -> Self
    where
        F: Fn(&Value, &Value, &ResolvedOptions) -> Value + Send + Sync + 'static,
    {
        Callback::Mapping(Arc::new(f))
    }

    pub fn kind(&self) -> CallbackKind {
        match self {
            Callback::Value(_) => CallbackKind::Value,
            Callback::Client(_) => CallbackKind::Client,
            Callback::OrderServer(_) => CallbackKind::OrderServer,
            Callback::SearchServer(_) => CallbackKind::SearchServer,
            Callback::FilterServer(_) => CallbackKind::FilterServer,
            Callback::FilterValidation(_) => CallbackKind::FilterValidation,
            Callback::Row(_) => CallbackKind::Row,
            Callback::Link(_) => CallbackKind::Link,
            Callback::FilterData(_) => CallbackKind::FilterData,
            Callback::FilterLabel(_) => CallbackKind::FilterLabel,
            Callback::Mapping(_) => CallbackKind::Mapping,
        }
    }

    fn address(&self) -> *const () {
        match self {
            Callback::Value(f) => Arc::as_ptr(f).cast(),
            Callback::Client(f) => Arc::as_ptr(f).cast(),
            Callback::OrderServer(f) => Arc::as_ptr(f).cast(),
            Callback::SearchServer(f) => Arc::as_ptr(f).cast(),
            Callback::FilterServer(f) => Arc::as_ptr(f).cast(),
            Callback::FilterValidation(f) => Arc::as_ptr(f).cast(),
            Callback::Row(f) => Arc::as_ptr(f).cast(),
            Callback::Link(f) => Arc::as_ptr(f).cast(),
            Callback::FilterData(f) => Arc::as_ptr(f).cast(),
            Callback::FilterLabel(f) => Arc::as_ptr(f).cast(),
            Callback::Mapping(f) => Arc::as_ptr(f).cast(),
        }
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Callback({})", self.kind())
    }
}

/// Two callbacks are equal when they share the same closure.
impl PartialEq for Callback {
    fn eq(&self, other: &Self) -> bool {
        self.kind() == other.kind() && self.address() == other.address()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_is_identity() {
        let a = Callback::link(|_, v| v.clone());
        let b = a.clone();
        let c = Callback::link(|_, v| v.clone());
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn debug_shows_kind() {
        let cb = Callback::row(|_, _| Value::Null);
        assert_eq!(format!("{cb:?}"), "Callback(row)");
        assert_eq!(cb.kind().to_string(), "row");
    }
}
