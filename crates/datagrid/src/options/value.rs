//! Option values and option input maps.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use super::callback::Callback;

/// A single option value.
///
/// Plain data is carried as JSON. Nested option maps keep callbacks
/// intact (used by `filter_options`), and callbacks carry delegates.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    Data(Value),
    Nested(Options),
    Callback(Callback),
}

impl Default for OptionValue {
    fn default() -> Self {
        OptionValue::Data(Value::Null)
    }
}

impl OptionValue {
    pub fn null() -> Self {
        OptionValue::Data(Value::Null)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, OptionValue::Data(Value::Null))
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            OptionValue::Data(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        self.as_json().and_then(Value::as_bool)
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_json().and_then(Value::as_str)
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.as_json().and_then(Value::as_i64)
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.as_json().and_then(Value::as_f64)
    }

    pub fn as_callback(&self) -> Option<&Callback> {
        match self {
            OptionValue::Callback(callback) => Some(callback),
            _ => None,
        }
    }

    /// The value as an option map, if it is a nested map or a JSON object.
    pub fn as_options(&self) -> Option<Options> {
        match self {
            OptionValue::Nested(options) => Some(options.clone()),
            OptionValue::Data(Value::Object(map)) => Some(Options::from(map.clone())),
            _ => None,
        }
    }

    /// Whether the value is a JSON array, a JSON object or a nested map.
    pub fn is_array(&self) -> bool {
        matches!(
            self,
            OptionValue::Nested(_) | OptionValue::Data(Value::Array(_)) | OptionValue::Data(Value::Object(_))
        )
    }

    /// Loose truthiness: null, false, zero, `""`, `"0"` and empty
    /// collections are false. Callbacks are true.
    pub fn is_truthy(&self) -> bool {
        match self {
            OptionValue::Data(value) => truthy(value),
            OptionValue::Nested(options) => !options.is_empty(),
            OptionValue::Callback(_) => true,
        }
    }

    /// JSON rendering for views. Callbacks render as null.
    pub fn to_json(&self) -> Value {
        match self {
            OptionValue::Data(value) => value.clone(),
            OptionValue::Nested(options) => options.to_json(),
            OptionValue::Callback(_) => Value::Null,
        }
    }

    /// Type name used in validation messages.
    pub fn type_name(&self) -> String {
        match self {
            OptionValue::Data(Value::Null) => "null".into(),
            OptionValue::Data(Value::Bool(_)) => "bool".into(),
            OptionValue::Data(Value::Number(n)) if n.is_f64() => "float".into(),
            OptionValue::Data(Value::Number(_)) => "int".into(),
            OptionValue::Data(Value::String(_)) => "string".into(),
            OptionValue::Data(Value::Array(_)) | OptionValue::Data(Value::Object(_)) => "array".into(),
            OptionValue::Nested(_) => "array".into(),
            OptionValue::Callback(callback) => format!("callable({})", callback.kind()),
        }
    }

    /// Short rendering used in validation messages.
    pub fn describe(&self) -> String {
        match self {
            OptionValue::Data(Value::String(s)) => format!("\"{s}\""),
            OptionValue::Data(Value::Array(_)) | OptionValue::Data(Value::Object(_)) => "array".into(),
            OptionValue::Data(other) => other.to_string(),
            OptionValue::Nested(_) => "array".into(),
            OptionValue::Callback(_) => "callable".into(),
        }
    }
}

/// Loose truthiness of a JSON value.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !(s.is_empty() || s == "0"),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

impl From<Value> for OptionValue {
    fn from(value: Value) -> Self {
        OptionValue::Data(value)
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        OptionValue::Data(Value::Bool(value))
    }
}

impl From<i32> for OptionValue {
    fn from(value: i32) -> Self {
        OptionValue::Data(Value::from(value))
    }
}

impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        OptionValue::Data(Value::from(value))
    }
}

impl From<u64> for OptionValue {
    fn from(value: u64) -> Self {
        OptionValue::Data(Value::from(value))
    }
}

impl From<usize> for OptionValue {
    fn from(value: usize) -> Self {
        OptionValue::Data(Value::from(value))
    }
}

impl From<f64> for OptionValue {
    fn from(value: f64) -> Self {
        OptionValue::Data(Value::from(value))
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        OptionValue::Data(Value::String(value.to_string()))
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        OptionValue::Data(Value::String(value))
    }
}

impl From<Vec<Value>> for OptionValue {
    fn from(value: Vec<Value>) -> Self {
        OptionValue::Data(Value::Array(value))
    }
}

impl From<Map<String, Value>> for OptionValue {
    fn from(value: Map<String, Value>) -> Self {
        OptionValue::Data(Value::Object(value))
    }
}

impl From<Options> for OptionValue {
    fn from(value: Options) -> Self {
        OptionValue::Nested(value)
    }
}

impl From<Callback> for OptionValue {
    fn from(value: Callback) -> Self {
        OptionValue::Callback(value)
    }
}

impl<T: Into<OptionValue>> From<Option<T>> for OptionValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or_default()
    }
}

/// Caller-supplied options, before resolution.
///
/// # Example
///
/// ```
/// use datagrid::Options;
///
/// let options = Options::new()
///     .set("label", "Name")
///     .set("orderable", false);
/// assert_eq!(options.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Options {
    values: BTreeMap<String, OptionValue>,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn set(mut self, name: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<OptionValue>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&OptionValue> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<OptionValue> {
        self.values.remove(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn to_json(&self) -> Value {
        Value::Object(
            self.values
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        )
    }
}

impl From<Map<String, Value>> for Options {
    fn from(map: Map<String, Value>) -> Self {
        Options {
            values: map
                .into_iter()
                .map(|(k, v)| (k, OptionValue::Data(v)))
                .collect(),
        }
    }
}

impl<K: Into<String>, V: Into<OptionValue>> FromIterator<(K, V)> for Options {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Options {
            values: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

impl IntoIterator for Options {
    type Item = (String, OptionValue);
    type IntoIter = std::collections::btree_map::IntoIter<String, OptionValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}
