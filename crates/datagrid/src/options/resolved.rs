//! Resolved option maps.

use std::collections::BTreeMap;

use serde_json::Value;

use super::callback::Callback;
use super::value::{OptionValue, Options};

static NULL: Value = Value::Null;

/// The validated, defaulted and normalized options of one table, column
/// or filter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedOptions {
    values: BTreeMap<String, OptionValue>,
}

impl ResolvedOptions {
    pub(crate) fn from_map(values: BTreeMap<String, OptionValue>) -> Self {
        ResolvedOptions { values }
    }

    pub fn get(&self, name: &str) -> Option<&OptionValue> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// JSON value of an option. Missing options and callbacks read as null.
    pub fn json(&self, name: &str) -> &Value {
        self.get(name).and_then(OptionValue::as_json).unwrap_or(&NULL)
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(OptionValue::as_str)
    }

    pub fn bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(OptionValue::as_bool)
    }

    pub fn i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(OptionValue::as_i64)
    }

    pub fn f64(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(OptionValue::as_f64)
    }

    pub fn callback(&self, name: &str) -> Option<&Callback> {
        self.get(name).and_then(OptionValue::as_callback)
    }

    /// Nested option map, from either a nested value or a JSON object.
    pub fn options(&self, name: &str) -> Options {
        self.get(name)
            .and_then(OptionValue::as_options)
            .unwrap_or_default()
    }

    /// Missing or null.
    pub fn is_null(&self, name: &str) -> bool {
        self.get(name).map_or(true, OptionValue::is_null)
    }

    /// Loose truthiness of an option; missing options are false.
    pub fn is_truthy(&self, name: &str) -> bool {
        self.get(name).is_some_and(OptionValue::is_truthy)
    }

    /// Whether an option is exactly `true`.
    pub fn is_true(&self, name: &str) -> bool {
        self.bool(name) == Some(true)
    }

    /// Copy with one option replaced.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<OptionValue>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// All options as a JSON object. Callbacks render as null.
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.values
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        )
    }
}

impl From<Options> for ResolvedOptions {
    fn from(options: Options) -> Self {
        ResolvedOptions {
            values: options.into_iter().collect(),
        }
    }
}
