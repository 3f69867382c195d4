//! Query contributions of the built-in filter types.
//!
//! Every function binds its parameters on the query and returns the
//! expression to combine, or `None` when the input does not apply. None of
//! them touches the WHERE clause.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use datagrid_query::{loose_eq, Expr, Operand, QueryBuilder};
use serde_json::Value;

use super::value::FilterValue;
use crate::options::{Callback, ResolvedOptions};

const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// How a text-like filter compares its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    Contains,
    Exact,
    StartsWith,
    Regex,
}

impl MatchMode {
    /// Reads `filter_match_mode`, defaulting to [`MatchMode::Contains`].
    pub fn from_options(options: &ResolvedOptions) -> Self {
        match options.str("filter_match_mode") {
            Some("exact") => MatchMode::Exact,
            Some("starts_with") => MatchMode::StartsWith,
            Some("regex") => MatchMode::Regex,
            _ => MatchMode::Contains,
        }
    }
}

/// Whether a filter input may contribute an expression.
///
/// A `filter_validation_delegate` decides on its own. Otherwise multi-value
/// input never passes and, unless `filter_validate_empty` is false, neither
/// does an empty value.
pub fn filter_is_valid(value: &FilterValue, multi: bool, options: &ResolvedOptions) -> bool {
    if let Some(Callback::FilterValidation(validate)) = options.callback("filter_validation_delegate") {
        return validate(value, multi, options);
    }
    match options.bool("filter_validate_empty") {
        Some(true) => !value.is_empty() && !multi,
        _ => !multi,
    }
}

/// Equality or LIKE on a single value, per the match mode.
pub fn apply_match(
    query: &mut QueryBuilder,
    value: &FilterValue,
    multi: bool,
    binding: &str,
    query_path: &str,
    options: &ResolvedOptions,
) -> Option<Expr> {
    if !filter_is_valid(value, multi, options) {
        return None;
    }
    let text = value.as_str()?;
    match MatchMode::from_options(options) {
        MatchMode::Exact => {
            query.set_parameter(binding, text);
            Some(Expr::eq(query_path, binding))
        }
        MatchMode::StartsWith => {
            query.set_parameter(binding, format!("{text}%"));
            Some(Expr::like(query_path, binding))
        }
        MatchMode::Contains | MatchMode::Regex => {
            query.set_parameter(binding, format!("%{text}%"));
            Some(Expr::like(query_path, binding))
        }
    }
}

// ============================================================================
// Multi-value encodings
// ============================================================================

/// Splits on `|` unless the pipe is escaped with a backslash.
pub fn split_multi_value(raw: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut previous = None;
    for c in raw.chars() {
        if c == '|' && previous != Some('\\') {
            parts.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
        previous = Some(c);
    }
    parts.push(current);
    parts
}

/// Undoes regex quoting the client applies to select values.
pub fn unquote(value: &str) -> String {
    const QUOTED: &str = ".\\+*?[^]$(){}=!<>|:-";
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        match chars.peek() {
            Some(&next) if c == '\\' && QUOTED.contains(next) => {
                out.push(next);
                chars.next();
            }
            _ => out.push(c),
        }
    }
    out
}

const CLASS_SEPARATOR_ESCAPE: &str = "-_-";

/// Replaces namespace separators so class names survive the pipe encoding.
pub fn escape_class_name(name: &str) -> String {
    name.replace('\\', CLASS_SEPARATOR_ESCAPE)
}

pub fn unescape_class_name(name: &str) -> String {
    name.replace(CLASS_SEPARATOR_ESCAPE, "\\")
}

fn is_null_sentinel(value: &str, options: &ResolvedOptions) -> bool {
    options.is_true("allow_null_value") && loose_eq(&Value::String(value.to_string()), options.json("null_value"))
}

/// OR of one comparison per encoded value.
///
/// A value equal to `null_value` becomes `IS NULL` when null values are
/// allowed. Each other value gets its own `{binding}_select_{n}` parameter.
fn apply_multi<F>(
    query: &mut QueryBuilder,
    raw: &str,
    binding: &str,
    query_path: &str,
    options: &ResolvedOptions,
    mut compare: F,
) -> Expr
where
    F: FnMut(&mut QueryBuilder, &str, &str) -> Expr,
{
    let mut counter = 0;
    let mut parts = Vec::new();
    for value in split_multi_value(raw) {
        if is_null_sentinel(&value, options) {
            parts.push(Expr::is_null(query_path));
        } else {
            counter += 1;
            let name = format!("{binding}_select_{counter}");
            parts.push(compare(query, &name, &value));
        }
    }
    Expr::or_x(parts)
}

/// Select filters: multi-value input becomes an OR of equalities.
pub fn apply_select(
    query: &mut QueryBuilder,
    value: &FilterValue,
    multi: bool,
    binding: &str,
    query_path: &str,
    options: &ResolvedOptions,
) -> Option<Expr> {
    match value {
        FilterValue::Single(raw) if multi => Some(apply_multi(query, raw, binding, query_path, options, |q, name, v| {
            q.set_parameter(name, unquote(v));
            Expr::eq(query_path, name)
        })),
        _ => apply_match(query, value, multi, binding, query_path, options),
    }
}

/// Class selects: like [`apply_select`], but values are escaped class names
/// matched as a suffix.
pub fn apply_class_select(
    query: &mut QueryBuilder,
    value: &FilterValue,
    multi: bool,
    binding: &str,
    query_path: &str,
    options: &ResolvedOptions,
) -> Option<Expr> {
    match value {
        FilterValue::Single(raw) if multi => {
            let raw = unescape_class_name(raw);
            Some(apply_multi(query, &raw, binding, query_path, options, |q, name, v| {
                q.set_parameter(name, format!("%{}", unquote(v)));
                Expr::like(query_path, name)
            }))
        }
        FilterValue::Single(raw) => {
            let value = FilterValue::Single(unescape_class_name(raw));
            apply_match(query, &value, multi, binding, query_path, options)
        }
        FilterValue::Range(_) => None,
    }
}

/// Date selects: multi-value input carries unix timestamps.
pub fn apply_date_select(
    query: &mut QueryBuilder,
    value: &FilterValue,
    multi: bool,
    binding: &str,
    query_path: &str,
    options: &ResolvedOptions,
) -> Option<Expr> {
    match value {
        FilterValue::Single(raw) if multi => {
            let mut parts = Vec::new();
            let mut counter = 0;
            for stamp in raw.split('|') {
                let Some(date) = stamp.trim().parse::<i64>().ok().and_then(|s| DateTime::<Utc>::from_timestamp(s, 0))
                else {
                    continue;
                };
                counter += 1;
                let name = format!("{binding}_select_{counter}");
                query.set_parameter(&name, date.format(DATE_TIME_FORMAT).to_string());
                parts.push(Expr::eq(query_path, name.as_str()));
            }
            // No valid stamp: an empty OR would match every row.
            (!parts.is_empty()).then(|| Expr::or_x(parts))
        }
        _ => apply_match(query, value, multi, binding, query_path, options),
    }
}

// ============================================================================
// Ranges
// ============================================================================

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Binds numeric input as a number so comparisons stay numeric.
fn numeric_param(value: &str) -> Value {
    let trimmed = value.trim();
    if let Ok(n) = trimmed.parse::<i64>() {
        return Value::from(n);
    }
    match trimmed.parse::<f64>().ok().and_then(serde_json::Number::from_f64) {
        Some(n) => Value::Number(n),
        None => Value::String(value.to_string()),
    }
}

/// Numeric `[from, to]` ranges.
///
/// Both bounds give a BETWEEN on `{binding}_from` and `{binding}_to`; a
/// single bound gives `>=` or `<=`. With `coalesce` the column is compared
/// as `COALESCE(path, 0)`.
pub fn apply_number_range(
    query: &mut QueryBuilder,
    value: &FilterValue,
    binding: &str,
    query_path: &str,
    coalesce: bool,
) -> Option<Expr> {
    let (from, to) = value.as_pair()?;
    let subject = if coalesce {
        Operand::coalesce(query_path, 0)
    } else {
        Operand::path(query_path)
    };
    let from_name = format!("{binding}_from");
    let to_name = format!("{binding}_to");
    match (is_blank(from), is_blank(to)) {
        (true, true) => None,
        (false, false) => {
            query.set_parameter(&from_name, numeric_param(from));
            query.set_parameter(&to_name, numeric_param(to));
            Some(Expr::between(subject, from_name.as_str(), to_name.as_str()))
        }
        (false, true) => {
            query.set_parameter(&from_name, numeric_param(from));
            Some(Expr::gte(subject, from_name.as_str()))
        }
        (true, false) => {
            query.set_parameter(&to_name, numeric_param(to));
            Some(Expr::lte(subject, to_name.as_str()))
        }
    }
}

/// Parses the date formats the client widgets submit.
pub fn parse_date_input(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    const DATE_TIMES: [&str; 4] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M", "%d.%m.%Y %H:%M"];
    const DATES: [&str; 3] = ["%Y-%m-%d", "%d.%m.%Y", "%m/%d/%Y"];

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }
    DATE_TIMES
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .or_else(|| {
            DATES
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

fn end_of_day(value: NaiveDateTime) -> NaiveDateTime {
    value.date().and_hms_opt(23, 59, 59).unwrap_or(value)
}

/// Date filters.
///
/// With `type` `range_date` the input is a `[from, to]` pair: `from` is
/// compared with `>=`, `to` with `<=` at the end of its day, both as
/// `Y-m-d H:i:s` text. Any other type matches a single date with LIKE.
pub fn apply_date_range(
    query: &mut QueryBuilder,
    value: &FilterValue,
    binding: &str,
    query_path: &str,
    options: &ResolvedOptions,
) -> Option<Expr> {
    if value.is_empty() {
        return None;
    }
    if options.str("type") != Some("range_date") {
        let date = parse_date_input(value.as_str()?)?;
        query.set_parameter(binding, format!("%{}%", date.format("%Y-%m-%d")));
        return Some(Expr::like(query_path, binding));
    }

    let (from, to) = value.as_pair()?;
    let from = (!is_blank(from)).then(|| parse_date_input(from)).flatten();
    let to = (!is_blank(to)).then(|| parse_date_input(to)).flatten().map(end_of_day);
    let format = |dt: NaiveDateTime| dt.format(DATE_TIME_FORMAT).to_string();
    match (from, to) {
        (Some(from), None) => {
            query.set_parameter(binding, format(from));
            Some(Expr::gte(query_path, binding))
        }
        (None, Some(to)) => {
            query.set_parameter(binding, format(to));
            Some(Expr::lte(query_path, binding))
        }
        (Some(from), Some(to)) => {
            let start = format!("{binding}_start");
            let end = format!("{binding}_end");
            query.set_parameter(&start, format(from));
            query.set_parameter(&end, format(to));
            Some(Expr::and_x([
                Expr::gte(query_path, start.as_str()),
                Expr::lte(query_path, end.as_str()),
            ]))
        }
        (None, None) => None,
    }
}
