use std::fmt;
use std::sync::Arc;

use datagrid_query::{Backend, QueryBuilder};
use serde::Serialize;

/// Separator the client widget puts between the bounds of a range filter.
pub const RANGE_DELIMITER: &str = "-yadcf_delim-";

/// A decoded per-column filter input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FilterValue {
    /// A plain value, or a pipe-delimited multi-value encoding.
    Single(String),
    /// The parts of a range input, normally `[from, to]`.
    Range(Vec<String>),
}

impl FilterValue {
    /// Decodes a raw column search value.
    ///
    /// Blank input yields `None`. Input containing [`RANGE_DELIMITER`] is
    /// split into its parts.
    pub fn decode(raw: &str) -> Option<Self> {
        if raw.trim().is_empty() {
            return None;
        }
        if raw.contains(RANGE_DELIMITER) {
            return Some(FilterValue::Range(raw.split(RANGE_DELIMITER).map(str::to_string).collect()));
        }
        Some(FilterValue::Single(raw.to_string()))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FilterValue::Single(value) => Some(value),
            FilterValue::Range(_) => None,
        }
    }

    /// Both bounds of a two-part range.
    pub fn as_pair(&self) -> Option<(&str, &str)> {
        match self {
            FilterValue::Range(parts) if parts.len() == 2 => Some((&parts[0], &parts[1])),
            _ => None,
        }
    }

    /// True for an empty string or a range without a single non-empty part.
    pub fn is_empty(&self) -> bool {
        match self {
            FilterValue::Single(value) => value.is_empty(),
            FilterValue::Range(parts) => parts.iter().all(String::is_empty),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Single(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::Single(value)
    }
}

impl<S: Into<String>> From<(S, S)> for FilterValue {
    fn from((from, to): (S, S)) -> Self {
        FilterValue::Range(vec![from.into(), to.into()])
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterValue::Single(value) => f.write_str(value),
            FilterValue::Range(parts) => f.write_str(&parts.join(RANGE_DELIMITER)),
        }
    }
}

/// A private copy of a table's base query together with the backend that
/// runs it.
///
/// Filter views read statistics through a snapshot. Every inspection works
/// on [`fork`](QuerySnapshot::fork), so the table's own query never sees
/// the extra selections.
#[derive(Clone)]
pub struct QuerySnapshot {
    query: QueryBuilder,
    backend: Arc<dyn Backend>,
}

impl QuerySnapshot {
    pub fn new(query: QueryBuilder, backend: Arc<dyn Backend>) -> Self {
        QuerySnapshot { query, backend }
    }

    pub fn query(&self) -> &QueryBuilder {
        &self.query
    }

    /// A fresh copy of the query to mutate.
    pub fn fork(&self) -> QueryBuilder {
        self.query.clone()
    }

    pub fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    pub fn root_alias(&self) -> &str {
        self.query.root_alias()
    }
}

impl fmt::Debug for QuerySnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuerySnapshot").field("query", &self.query).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_blank_is_none() {
        assert_eq!(FilterValue::decode(""), None);
        assert_eq!(FilterValue::decode("   "), None);
    }

    #[test]
    fn decode_range() {
        let value = FilterValue::decode("10-yadcf_delim-").unwrap();
        assert_eq!(value, FilterValue::Range(vec!["10".into(), "".into()]));
        assert_eq!(value.as_pair(), Some(("10", "")));
        assert!(!value.is_empty());
        assert_eq!(value.to_string(), "10-yadcf_delim-");
    }

    #[test]
    fn emptiness() {
        assert!(FilterValue::from("").is_empty());
        assert!(!FilterValue::from("0").is_empty());
        assert!(FilterValue::from(("", "")).is_empty());
        assert_eq!(FilterValue::Range(vec!["a".into()]).as_pair(), None);
    }
}
