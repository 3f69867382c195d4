//! Cell value transformers.
//!
//! After a column's value delegate has produced a raw value, the column's
//! [`TransformerChain`] threads it through each [`DataTransformer`] in
//! order. Column types install transformers while building data: a plain
//! add is prepended, a forced append goes to the end.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use datagrid_query::{as_datetime, as_number, to_text};
use serde_json::{json, Map, Value};

use crate::column::Column;
use crate::options::{truthy, Callback, OptionValue, Options, ResolvedOptions};
use crate::property::try_get_property;
use crate::registry::UrlGenerator;
use crate::template::{render_builtin, ABRIDGED_STRING};

/// Turns a cell value into its next shape.
pub trait DataTransformer: Send + Sync {
    /// Name shown in debug output.
    fn name(&self) -> &'static str;

    fn transform(&self, column: &Column, item: &Value, value: Value) -> Value;
}

/// Ordered transformers of one column.
#[derive(Clone, Default)]
pub struct TransformerChain {
    transformers: Vec<Arc<dyn DataTransformer>>,
}

impl fmt::Debug for TransformerChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl TransformerChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a transformer in front of the chain, or at its end when
    /// `force_append` is set.
    pub fn add(&mut self, transformer: impl DataTransformer + 'static, force_append: bool) -> &mut Self {
        self.add_shared(Arc::new(transformer), force_append)
    }

    pub fn add_shared(&mut self, transformer: Arc<dyn DataTransformer>, force_append: bool) -> &mut Self {
        if force_append {
            self.transformers.push(transformer);
        } else {
            self.transformers.insert(0, transformer);
        }
        self
    }

    /// Removes every transformer.
    pub fn reset(&mut self) -> &mut Self {
        self.transformers.clear();
        self
    }

    pub fn len(&self) -> usize {
        self.transformers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transformers.is_empty()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.transformers.iter().map(|t| t.name()).collect()
    }

    pub fn apply(&self, column: &Column, item: &Value, value: Value) -> Value {
        self.transformers
            .iter()
            .fold(value, |value, transformer| transformer.transform(column, item, value))
    }
}

pub(crate) fn text(value: &Value) -> String {
    to_text(value).unwrap_or_default()
}

/// Value of an option that may also be a value callback.
pub(crate) fn option_or_delegate(options: &ResolvedOptions, name: &str, item: &Value, path: &str) -> Value {
    match options.get(name) {
        Some(OptionValue::Callback(Callback::Value(f))) => f(item, path, options),
        Some(other) => other.to_json(),
        None => Value::Null,
    }
}

// ============================================================================
// Markup
// ============================================================================

/// Inserts `<br />` before every line break.
#[derive(Debug, Clone, Copy, Default)]
pub struct Nl2Br;

pub(crate) fn nl2br(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\r' if chars.peek() == Some(&'\n') => {
                chars.next();
                out.push_str("<br />\r\n");
            }
            '\r' | '\n' => {
                out.push_str("<br />");
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

impl DataTransformer for Nl2Br {
    fn name(&self) -> &'static str {
        "nl2br"
    }

    fn transform(&self, column: &Column, _item: &Value, value: Value) -> Value {
        if !column.options().is_true("nl2br") {
            return value;
        }
        match value {
            Value::String(s) => Value::String(nl2br(&s)),
            other => other,
        }
    }
}

/// Wraps the value in a link built from the `route` option.
#[derive(Debug, Clone, Copy, Default)]
pub struct Link;

impl Link {
    fn url(column: &Column, item: &Value, value: &Value) -> Option<String> {
        match column.options().get("route")? {
            OptionValue::Callback(Callback::Link(f)) => match f(item, value) {
                Value::Null => None,
                url => Some(text(&url)),
            },
            OptionValue::Data(Value::String(route)) => Some(route.clone()),
            other => route_url(&other.as_options()?, item, column.registry().url_generator()),
        }
    }
}

/// URL of a `{route, route_params}` option map.
///
/// String parameters naming a non-null item property are replaced by that
/// property's value; everything else is passed literally. Without a
/// generator the route name itself is returned.
pub(crate) fn route_url(definition: &Options, item: &Value, generator: Option<&dyn UrlGenerator>) -> Option<String> {
    let route = definition.get("route")?.as_str()?;
    let mut params = Map::new();
    if let Some(Value::Object(raw)) = definition.get("route_params").and_then(OptionValue::as_json) {
        for (key, param) in raw {
            let resolved = param
                .as_str()
                .and_then(|p| try_get_property(item, p))
                .filter(|v| !v.is_null())
                .unwrap_or_else(|| param.clone());
            params.insert(key.clone(), resolved);
        }
    }
    match generator {
        Some(generator) => Some(generator.generate(route, &params)),
        None => Some(route.to_string()),
    }
}

impl DataTransformer for Link {
    fn name(&self) -> &'static str {
        "link"
    }

    fn transform(&self, column: &Column, item: &Value, value: Value) -> Value {
        match Self::url(column, item, &value) {
            Some(url) if !url.is_empty() => {
                Value::String(format!("<a href=\"{}\">{}</a>", url, text(&value)))
            }
            _ => value,
        }
    }
}

/// Shortens long text and exposes the full text as a tooltip.
#[derive(Debug, Clone, Copy, Default)]
pub struct Abridged;

fn truncate_chars(text: &str, max: i64) -> String {
    if max <= 0 || text.chars().count() <= max as usize {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max as usize).collect();
    out.push('\u{2026}');
    out
}

impl DataTransformer for Abridged {
    fn name(&self) -> &'static str {
        "abridged"
    }

    fn transform(&self, column: &Column, item: &Value, value: Value) -> Value {
        let options = column.options();
        let value = if truthy(&value) {
            value
        } else {
            option_or_delegate(options, "empty_value", item, column.path())
        };
        if value.is_null() {
            return value;
        }
        let mut full = text(&value);
        if options.is_true("nl2space") {
            full = full.split_whitespace().collect::<Vec<_>>().join(" ");
        }
        let abridged = truncate_chars(&full, options.i64("max").unwrap_or(-1));
        let tooltip = truncate_chars(&full, options.i64("tooltipMax").unwrap_or(-1));
        let context = json!({
            "abridged": abridged,
            "full": full,
            "tooltip": tooltip,
            "container": options.str("container").unwrap_or("body"),
            "fullscreen": options.is_true("fullscreen"),
        });
        match render_builtin(ABRIDGED_STRING, context) {
            Ok(html) if options.is_true("nl2br") && !options.is_true("nl2space") => Value::String(nl2br(&html)),
            Ok(html) => Value::String(html),
            Err(err) => {
                tracing::warn!(path = column.path(), error = %err, "abridged string rendering failed");
                value
            }
        }
    }
}

// ============================================================================
// Lookup and text
// ============================================================================

/// Looks the value up in the `mapping` option.
#[derive(Debug, Clone, Copy, Default)]
pub struct Mapping;

impl DataTransformer for Mapping {
    fn name(&self) -> &'static str {
        "mapping"
    }

    fn transform(&self, column: &Column, item: &Value, value: Value) -> Value {
        let options = column.options();
        let mapped = match options.get("mapping") {
            Some(OptionValue::Callback(Callback::Mapping(f))) => return f(item, &value, options),
            Some(mapping) => match mapping.to_json() {
                Value::Object(map) => map.get(&text(&value)).cloned(),
                Value::Array(items) => as_number(&value)
                    .filter(|n| n.fract() == 0.0 && *n >= 0.0)
                    .and_then(|n| items.get(n as usize).cloned()),
                _ => None,
            },
            None => None,
        };
        mapped.unwrap_or_else(|| options.json("empty_value").clone())
    }
}

/// Translates the value through the registry's translator.
#[derive(Debug, Clone, Copy, Default)]
pub struct Translate;

impl DataTransformer for Translate {
    fn name(&self) -> &'static str {
        "translate"
    }

    fn transform(&self, column: &Column, _item: &Value, value: Value) -> Value {
        let options = column.options();
        let domain = match options.json("value_translation_domain") {
            Value::Bool(false) => return value,
            Value::String(domain) => Some(domain.clone()),
            _ => options
                .str("translation_domain")
                .or_else(|| column.table_options().str("translation_domain"))
                .map(str::to_string),
        };
        match value {
            Value::Null => Value::Null,
            other => {
                let id = text(&other);
                Value::String(column.registry().translator().trans(&id, domain.as_deref()))
            }
        }
    }
}

/// Substitutes `%s` placeholders of `string_format`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringFormat;

pub(crate) fn sprintf(format: &str, params: &[Value]) -> String {
    let mut out = String::with_capacity(format.len());
    let mut params = params.iter();
    let mut chars = format.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some('%') => {
                chars.next();
                out.push('%');
            }
            Some('s') => {
                chars.next();
                if let Some(param) = params.next() {
                    out.push_str(&text(param));
                }
            }
            _ => out.push('%'),
        }
    }
    out
}

impl DataTransformer for StringFormat {
    fn name(&self) -> &'static str {
        "string_format"
    }

    fn transform(&self, column: &Column, item: &Value, value: Value) -> Value {
        let options = column.options();
        let format = match option_or_delegate(options, "string_format", item, column.path()) {
            Value::String(format) => format,
            _ => return value,
        };
        let params = match options.get("string_format_parameters") {
            Some(OptionValue::Callback(Callback::Value(f))) => match f(item, column.path(), options) {
                Value::Array(params) => params,
                Value::Null => vec![value.clone()],
                single => vec![single],
            },
            Some(OptionValue::Data(Value::Array(paths))) => paths
                .iter()
                .map(|p| {
                    p.as_str()
                        .and_then(|p| try_get_property(item, p))
                        .unwrap_or(Value::Null)
                })
                .collect(),
            _ => vec![value.clone()],
        };
        Value::String(sprintf(&format, &params))
    }
}

// ============================================================================
// Numbers
// ============================================================================

/// Formats numbers with `number_formatter_*` options.
#[derive(Debug, Clone, Copy, Default)]
pub struct NumberFormat;

/// Formats currency amounts.
#[derive(Debug, Clone, Copy, Default)]
pub struct CurrencyFormat;

fn separators(locale: &str) -> (&'static str, char) {
    let lang = locale.split(['_', '-']).next().unwrap_or("").to_ascii_lowercase();
    match lang.as_str() {
        "de" | "es" | "it" | "nl" | "pt" | "da" | "id" | "tr" => (".", ','),
        "fr" | "ru" | "pl" | "cs" | "sv" | "fi" | "nb" | "uk" => ("\u{a0}", ','),
        _ => (",", '.'),
    }
}

fn symbol_suffixed(locale: &str) -> bool {
    separators(locale).1 == ','
}

/// Fixed-point rendering with grouping, trimming zeros past `min_frac`.
pub(crate) fn format_decimal(value: f64, min_frac: usize, max_frac: usize, grouping: bool, locale: &str) -> String {
    let (group, decimal) = separators(locale);
    let fixed = format!("{:.*}", max_frac, value.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i.to_string(), f.to_string()),
        None => (fixed.clone(), String::new()),
    };
    let mut frac = frac_part;
    while frac.len() > min_frac && frac.ends_with('0') {
        frac.pop();
    }
    let int_part = if grouping {
        let digits: Vec<char> = int_part.chars().collect();
        let mut grouped = String::new();
        for (i, d) in digits.iter().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push_str(group);
            }
            grouped.push(*d);
        }
        grouped
    } else {
        int_part
    };
    let negative = value < 0.0 && (int_part.chars().any(|c| c.is_ascii_digit() && c != '0') || frac.chars().any(|c| c != '0'));
    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&int_part);
    if !frac.is_empty() {
        out.push(decimal);
        out.push_str(&frac);
    }
    out
}

/// Fraction digits and grouping of a `#,##0.00` style pattern.
fn pattern_digits(pattern: &str) -> (usize, usize, bool) {
    let grouping = pattern.contains(',');
    match pattern.split_once('.') {
        Some((_, frac)) => {
            let min = frac.chars().filter(|c| *c == '0').count();
            let max = frac.chars().filter(|c| *c == '0' || *c == '#').count();
            (min, max.max(min), grouping)
        }
        None => (0, 0, grouping),
    }
}

fn currency_symbol(code: &str) -> Option<&'static str> {
    match code.to_ascii_uppercase().as_str() {
        "EUR" => Some("\u{20ac}"),
        "USD" => Some("$"),
        "GBP" => Some("\u{a3}"),
        "JPY" => Some("\u{a5}"),
        _ => None,
    }
}

pub(crate) fn format_currency(amount: f64, currency: &str, locale: &str) -> String {
    let number = format_decimal(amount.abs(), 2, 2, true, locale);
    let sign = if amount < 0.0 { "-" } else { "" };
    match (currency_symbol(currency), symbol_suffixed(locale)) {
        (Some(symbol), false) => format!("{sign}{symbol}{number}"),
        (Some(symbol), true) => format!("{sign}{number}\u{a0}{symbol}"),
        (None, false) => format!("{sign}{}\u{a0}{number}", currency.to_ascii_uppercase()),
        (None, true) => format!("{sign}{number}\u{a0}{}", currency.to_ascii_uppercase()),
    }
}

fn numeric_input(options: &ResolvedOptions, value: &Value) -> Option<f64> {
    match value {
        Value::Null if options.is_true("format_null") => Some(0.0),
        other => as_number(other),
    }
}

fn locale_of<'a>(column: &'a Column) -> &'a str {
    column
        .options()
        .str("number_formatter_locale")
        .or_else(|| column.options().str("locale"))
        .unwrap_or("en")
}

impl DataTransformer for NumberFormat {
    fn name(&self) -> &'static str {
        "number_format"
    }

    fn transform(&self, column: &Column, item: &Value, value: Value) -> Value {
        let options = column.options();
        let Some(number) = numeric_input(options, &value) else {
            return value;
        };
        let locale = locale_of(column);
        let formatted = match options.str("number_formatter_style").unwrap_or("decimal") {
            "percent" => format!("{}%", format_decimal(number * 100.0, 0, 0, true, locale)),
            "scientific" => format!("{number:E}"),
            "currency" => {
                let currency = option_or_delegate(options, "number_formatter_currency", item, column.path());
                format_currency(number, currency.as_str().unwrap_or("EUR"), locale)
            }
            _ => match options.str("number_formatter_pattern") {
                Some(pattern) => {
                    let (min, max, grouping) = pattern_digits(pattern);
                    format_decimal(number, min, max, grouping, locale)
                }
                None => format_decimal(number, 0, 3, true, locale),
            },
        };
        Value::String(formatted)
    }
}

impl DataTransformer for CurrencyFormat {
    fn name(&self) -> &'static str {
        "currency_format"
    }

    fn transform(&self, column: &Column, item: &Value, value: Value) -> Value {
        let options = column.options();
        let Some(amount) = numeric_input(options, &value) else {
            return value;
        };
        let currency = match option_or_delegate(options, "currency", item, column.path()) {
            Value::String(code) => code,
            _ => options.str("number_formatter_currency").unwrap_or("EUR").to_string(),
        };
        Value::String(format_currency(amount, &currency, locale_of(column)))
    }
}

// ============================================================================
// Dates
// ============================================================================

/// Formats dates with `date_format`, `time_format` or an explicit `format`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateTimeFormat;

/// Reads a timestamp, an RFC 3339 string or a plain date/datetime string.
pub(crate) fn parse_datetime(value: &Value) -> Option<DateTime<FixedOffset>> {
    match value {
        Value::Number(n) => {
            let secs = n.as_i64()?;
            Utc.timestamp_opt(secs, 0).single().map(|dt| dt.fixed_offset())
        }
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .or_else(|| as_datetime(value).map(|naive: NaiveDateTime| naive.and_utc().fixed_offset())),
        _ => None,
    }
}

fn date_pattern(style: &str) -> Option<&'static str> {
    match style {
        "short" => Some("%-m/%-d/%y"),
        "medium" => Some("%b %-d, %Y"),
        "long" => Some("%B %-d, %Y"),
        "full" => Some("%A, %B %-d, %Y"),
        _ => None,
    }
}

fn time_pattern(style: &str) -> Option<&'static str> {
    match style {
        "short" => Some("%-I:%M %p"),
        "medium" => Some("%-I:%M:%S %p"),
        "long" | "full" => Some("%-I:%M:%S %p %:z"),
        _ => None,
    }
}

/// The chrono format for the given date/time styles and explicit format.
pub(crate) fn datetime_pattern(options: &ResolvedOptions) -> String {
    if let Some(format) = options.str("format") {
        return format.to_string();
    }
    let date = date_pattern(options.str("date_format").unwrap_or("medium"));
    let time = time_pattern(options.str("time_format").unwrap_or("medium"));
    match (date, time) {
        (Some(d), Some(t)) => format!("{d}, {t}"),
        (Some(d), None) => d.to_string(),
        (None, Some(t)) => t.to_string(),
        (None, None) => "%Y%m%d %I:%M %p".to_string(),
    }
}

/// Formats a date value, leaving unparseable values untouched.
pub fn format_datetime(options: &ResolvedOptions, value: &Value) -> Value {
    match parse_datetime(value) {
        Some(dt) => Value::String(dt.format(&datetime_pattern(options)).to_string()),
        None => value.clone(),
    }
}

impl DataTransformer for DateTimeFormat {
    fn name(&self) -> &'static str {
        "datetime_format"
    }

    fn transform(&self, column: &Column, _item: &Value, value: Value) -> Value {
        format_datetime(column.options(), &value)
    }
}
