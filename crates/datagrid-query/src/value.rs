//! Path lookup and loose comparison of JSON row values.
//!
//! Rows are plain [`serde_json::Value`] trees. Query paths are expressed
//! relative to a root alias (`u.name`, `u.address.city`); [`lookup`] strips
//! the alias and walks the remaining segments.
//!
//! Comparison is deliberately loose, the way a SQL engine coerces operands:
//! numeric strings compare as numbers and date strings compare
//! chronologically.

use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use serde_json::Value;

use crate::error::Result;

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Resolves `path` inside `row`.
///
/// A leading `root_alias.` is stripped first. A path equal to the alias
/// resolves to the row itself. Array elements are addressed by index.
///
/// # Example
///
/// ```
/// use datagrid_query::lookup;
/// use serde_json::json;
///
/// let row = json!({"name": "Ada", "address": {"city": "London"}});
/// assert_eq!(lookup(&row, "u", "u.address.city"), Some(&json!("London")));
/// assert_eq!(lookup(&row, "u", "name"), Some(&json!("Ada")));
/// assert_eq!(lookup(&row, "u", "u.missing"), None);
/// ```
pub fn lookup<'a>(row: &'a Value, root_alias: &str, path: &str) -> Option<&'a Value> {
    let relative = strip_alias(path, root_alias)?;
    if relative.is_empty() {
        return Some(row);
    }

    let mut current = row;
    for segment in relative.split('.') {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

fn strip_alias<'p>(path: &'p str, root_alias: &str) -> Option<&'p str> {
    if root_alias.is_empty() {
        return Some(path);
    }
    if path == root_alias {
        return Some("");
    }
    Some(
        path.strip_prefix(root_alias)
            .and_then(|rest| rest.strip_prefix('.'))
            .unwrap_or(path),
    )
}

/// Numeric view of a value: numbers, numeric strings and booleans.
pub fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

/// Parses a date or datetime string.
///
/// Accepts `Y-m-d`, `Y-m-d H:i:s` (space or `T` separated, optional
/// fractional seconds) and RFC 3339 timestamps.
pub fn as_datetime(value: &Value) -> Option<NaiveDateTime> {
    let text = value.as_str()?.trim();
    for format in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(text, format) {
            return Some(parsed);
        }
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.naive_utc());
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// Compares two non-null values.
///
/// Returns `None` when either side is null or the values are not
/// comparable (e.g. an object against a number).
pub fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    if a.is_null() || b.is_null() {
        return None;
    }
    if let (Value::Bool(x), Value::Bool(y)) = (a, b) {
        return Some(x.cmp(y));
    }
    if let (Some(x), Some(y)) = (as_number(a), as_number(b)) {
        return x.partial_cmp(&y);
    }
    if let (Some(x), Some(y)) = (as_datetime(a), as_datetime(b)) {
        return Some(x.cmp(&y));
    }
    match (a, b) {
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// Ordering used for sorting rows: nulls sort last, incomparable values
/// compare equal.
pub fn sort_compare(a: &Value, b: &Value) -> Ordering {
    match (a.is_null(), b.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => compare(a, b).unwrap_or(Ordering::Equal),
    }
}

/// SQL-style equality. Null never equals anything, including null.
pub fn loose_eq(a: &Value, b: &Value) -> bool {
    if a.is_null() || b.is_null() {
        return false;
    }
    match (a, b) {
        (Value::Array(_), _) | (Value::Object(_), _) | (_, Value::Array(_)) | (_, Value::Object(_)) => {
            a == b
        }
        _ => compare(a, b) == Some(Ordering::Equal),
    }
}

/// Renders a scalar as the text a SQL engine would match a LIKE against.
pub fn to_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(if *b { "1".into() } else { "0".into() }),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

/// Case-insensitive SQL LIKE.
///
/// `%` matches any run of characters, `_` matches exactly one. A backslash
/// escapes a following `%`, `_` or backslash; any other backslash is
/// literal.
///
/// # Example
///
/// ```
/// use datagrid_query::like_match;
///
/// assert!(like_match("Grace Hopper", "%hop%").unwrap());
/// assert!(like_match("Grace", "Gr_ce").unwrap());
/// assert!(!like_match("Grace", "race%").unwrap());
/// assert!(like_match("100%", "100\\%").unwrap());
/// ```
pub fn like_match(text: &str, pattern: &str) -> Result<bool> {
    Ok(like_regex(pattern)?.is_match(text))
}

pub(crate) fn like_regex(pattern: &str) -> Result<Regex> {
    let mut source = String::with_capacity(pattern.len() + 8);
    source.push_str("(?is)^");

    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.peek() {
                Some(&next @ ('%' | '_' | '\\')) => {
                    chars.next();
                    source.push_str(&regex::escape(&next.to_string()));
                }
                _ => source.push_str(&regex::escape("\\")),
            },
            '%' => source.push_str(".*"),
            '_' => source.push('.'),
            other => source.push_str(&regex::escape(&other.to_string())),
        }
    }

    source.push('$');
    Ok(Regex::new(&source)?)
}
