//! Grid widget request payloads.
//!
//! Query strings deliver every scalar as a string, so parsing is lenient:
//! numbers may be strings, booleans may be `"true"`, `"1"`, `"on"` or
//! `"yes"`, and missing parts take the protocol defaults.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::filter::FilterValue;

/// Global or per-column search input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchRequest {
    pub value: String,
    pub regex: bool,
}

impl SearchRequest {
    fn from_value(value: &Value) -> Self {
        SearchRequest {
            value: search_text(value.get("value")),
            regex: value.get("regex").is_some_and(flag),
        }
    }
}

/// One entry of the request's `columns` list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ColumnRequest {
    /// Path of the table column.
    pub name: String,
    pub searchable: bool,
    pub orderable: bool,
    pub search: SearchRequest,
}

impl ColumnRequest {
    fn from_value(value: &Value) -> Self {
        ColumnRequest {
            name: value.get("name").map(scalar_text).unwrap_or_default(),
            searchable: value.get("searchable").is_some_and(flag),
            orderable: value.get("orderable").is_some_and(flag),
            search: value.get("search").map(SearchRequest::from_value).unwrap_or_default(),
        }
    }

    /// The decoded filter input, `None` when blank.
    pub fn filter_value(&self) -> Option<FilterValue> {
        FilterValue::decode(&self.search.value)
    }
}

/// One entry of the request's `order` list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OrderRequest {
    /// Index into the request's `columns`.
    pub column: Option<usize>,
    pub dir: Option<String>,
}

impl OrderRequest {
    fn from_value(value: &Value) -> Self {
        OrderRequest {
            column: value.get("column").and_then(integer).and_then(|n| usize::try_from(n).ok()),
            dir: value.get("dir").map(scalar_text).filter(|d| !d.is_empty()),
        }
    }
}

/// A server-side processing request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableRequest {
    /// Echoed back as `drawId`.
    pub draw: i64,
    pub start: usize,
    /// Page size; negative means all rows.
    pub length: i64,
    pub columns: Vec<ColumnRequest>,
    pub order: Vec<OrderRequest>,
    pub search: SearchRequest,
}

impl Default for TableRequest {
    fn default() -> Self {
        TableRequest {
            draw: 0,
            start: 0,
            length: 10,
            columns: Vec::new(),
            order: Vec::new(),
            search: SearchRequest::default(),
        }
    }
}

impl TableRequest {
    /// Reads a request from decoded parameters.
    ///
    /// Lists may arrive as arrays or as objects keyed by index (the shape
    /// bracketed query parameters decode to).
    pub fn from_value(value: &Value) -> Self {
        let defaults = TableRequest::default();
        TableRequest {
            draw: value.get("draw").and_then(integer).unwrap_or(defaults.draw),
            start: value
                .get("start")
                .and_then(integer)
                .and_then(|n| usize::try_from(n).ok())
                .unwrap_or(defaults.start),
            length: value.get("length").and_then(integer).unwrap_or(defaults.length),
            columns: entries(value.get("columns")).map(ColumnRequest::from_value).collect(),
            order: entries(value.get("order")).map(OrderRequest::from_value).collect(),
            search: value.get("search").map(SearchRequest::from_value).unwrap_or(defaults.search),
        }
    }

    /// Parses a JSON request body.
    pub fn from_json_str(body: &str) -> serde_json::Result<Self> {
        serde_json::from_str(body)
    }
}

impl<'de> Deserialize<'de> for TableRequest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(TableRequest::from_value(&value))
    }
}

fn entries(value: Option<&Value>) -> Box<dyn Iterator<Item = &Value> + '_> {
    match value {
        Some(Value::Array(items)) => Box::new(items.iter()),
        Some(Value::Object(map)) => {
            let mut items: Vec<(&String, &Value)> = map.iter().collect();
            items.sort_by_key(|(key, _)| key.parse::<usize>().unwrap_or(usize::MAX));
            Box::new(items.into_iter().map(|(_, v)| v))
        }
        _ => Box::new(std::iter::empty()),
    }
}

fn integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn flag(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_i64() == Some(1),
        Value::String(s) => matches!(s.trim().to_ascii_lowercase().as_str(), "1" | "true" | "on" | "yes"),
        _ => false,
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// A search value; for a list the last non-blank entry wins.
fn search_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .map(scalar_text)
            .filter(|s| !s.trim().is_empty())
            .last()
            .unwrap_or_default(),
        Some(value) => scalar_text(value),
        None => String::new(),
    }
}
