//! Option schemas.
//!
//! An [`OptionsSchema`] collects option declarations from every type of a
//! chain, root first. Later declarations override earlier ones: a child's
//! default replaces its parent's, `set_*` replaces constraints and `add_*`
//! extends them.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use super::callback::CallbackKind;
use super::resolver::Resolution;
use super::value::OptionValue;
use crate::error::ConfigurationError;

/// Type constraint for an option value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionType {
    Null,
    Bool,
    Int,
    Float,
    String,
    /// A JSON array, a JSON object or a nested option map.
    Array,
    /// A callback of the given kind.
    Callback(CallbackKind),
    /// A callback of any kind.
    AnyCallback,
}

impl OptionType {
    pub fn matches(self, value: &OptionValue) -> bool {
        match (self, value) {
            (OptionType::Null, OptionValue::Data(Value::Null)) => true,
            (OptionType::Bool, OptionValue::Data(Value::Bool(_))) => true,
            (OptionType::Int, OptionValue::Data(Value::Number(n))) => !n.is_f64(),
            (OptionType::Float, OptionValue::Data(Value::Number(n))) => n.is_f64(),
            (OptionType::String, OptionValue::Data(Value::String(_))) => true,
            (OptionType::Array, value) => value.is_array(),
            (OptionType::Callback(kind), OptionValue::Callback(cb)) => cb.kind() == kind,
            (OptionType::AnyCallback, OptionValue::Callback(_)) => true,
            _ => false,
        }
    }
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionType::Null => f.write_str("null"),
            OptionType::Bool => f.write_str("bool"),
            OptionType::Int => f.write_str("int"),
            OptionType::Float => f.write_str("float"),
            OptionType::String => f.write_str("string"),
            OptionType::Array => f.write_str("array"),
            OptionType::Callback(kind) => write!(f, "callable({kind})"),
            OptionType::AnyCallback => f.write_str("callable"),
        }
    }
}

pub type ValuePredicate = dyn Fn(&OptionValue) -> bool + Send + Sync;
pub type LazyDefaultFn = dyn Fn(&mut Resolution<'_>) -> Result<OptionValue, ConfigurationError> + Send + Sync;
pub type ChainedDefaultFn =
    dyn Fn(&mut Resolution<'_>, OptionValue) -> Result<OptionValue, ConfigurationError> + Send + Sync;
pub type NormalizerFn =
    dyn Fn(&mut Resolution<'_>, OptionValue) -> Result<OptionValue, ConfigurationError> + Send + Sync;

/// One accepted value: an exact match or a predicate.
#[derive(Clone)]
pub enum AllowedValue {
    Exact(Value),
    Predicate(Arc<ValuePredicate>),
}

impl AllowedValue {
    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&OptionValue) -> bool + Send + Sync + 'static,
    {
        AllowedValue::Predicate(Arc::new(f))
    }

    pub fn null() -> Self {
        AllowedValue::Exact(Value::Null)
    }

    /// Exact string values.
    pub fn strings(values: &[&str]) -> Vec<AllowedValue> {
        values.iter().map(|v| AllowedValue::from(*v)).collect()
    }

    pub fn accepts(&self, value: &OptionValue) -> bool {
        match self {
            AllowedValue::Exact(expected) => value.as_json() == Some(expected),
            AllowedValue::Predicate(check) => check(value),
        }
    }
}

impl fmt::Debug for AllowedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AllowedValue::Exact(value) => write!(f, "Exact({value})"),
            AllowedValue::Predicate(_) => f.write_str("Predicate"),
        }
    }
}

impl From<Value> for AllowedValue {
    fn from(value: Value) -> Self {
        AllowedValue::Exact(value)
    }
}

impl From<&str> for AllowedValue {
    fn from(value: &str) -> Self {
        AllowedValue::Exact(Value::String(value.to_string()))
    }
}

impl From<bool> for AllowedValue {
    fn from(value: bool) -> Self {
        AllowedValue::Exact(Value::Bool(value))
    }
}

impl From<i64> for AllowedValue {
    fn from(value: i64) -> Self {
        AllowedValue::Exact(Value::from(value))
    }
}

#[derive(Clone)]
pub(crate) enum DefaultLayer {
    Static(OptionValue),
    Lazy(Arc<LazyDefaultFn>),
    Chained(Arc<ChainedDefaultFn>),
}

#[derive(Clone, Default)]
pub(crate) struct OptionDef {
    pub(crate) defaults: Vec<DefaultLayer>,
    pub(crate) required: bool,
    pub(crate) allowed_types: Vec<OptionType>,
    pub(crate) allowed_values: Vec<AllowedValue>,
    pub(crate) normalizers: Vec<Arc<NormalizerFn>>,
}

impl OptionDef {
    pub(crate) fn has_default(&self) -> bool {
        !self.defaults.is_empty()
    }
}

/// Declared options with their defaults and constraints.
#[derive(Clone, Default)]
pub struct OptionsSchema {
    order: Vec<String>,
    defs: HashMap<String, OptionDef>,
}

impl fmt::Debug for OptionsSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionsSchema")
            .field("options", &self.order)
            .finish()
    }
}

impl OptionsSchema {
    pub fn new() -> Self {
        Self::default()
    }

    fn def_mut(&mut self, name: &str) -> &mut OptionDef {
        if !self.defs.contains_key(name) {
            self.order.push(name.to_string());
        }
        self.defs.entry(name.to_string()).or_default()
    }

    pub(crate) fn def(&self, name: &str) -> Option<&OptionDef> {
        self.defs.get(name)
    }

    // ========================================================================
    // Declarations
    // ========================================================================

    /// Declares an option without a default.
    pub fn define(&mut self, name: &str) -> &mut Self {
        self.def_mut(name);
        self
    }

    /// Sets a static default, replacing any earlier default.
    pub fn set_default(&mut self, name: &str, value: impl Into<OptionValue>) -> &mut Self {
        self.def_mut(name).defaults = vec![DefaultLayer::Static(value.into())];
        self
    }

    /// Sets a default computed from other options, replacing any earlier
    /// default.
    pub fn set_lazy_default<F>(&mut self, name: &str, f: F) -> &mut Self
    where
        F: Fn(&mut Resolution<'_>) -> Result<OptionValue, ConfigurationError> + Send + Sync + 'static,
    {
        self.def_mut(name).defaults = vec![DefaultLayer::Lazy(Arc::new(f))];
        self
    }

    /// Sets a default computed from other options and the earlier default.
    ///
    /// The closure receives the value the earlier default would have
    /// produced (null if there was none).
    pub fn set_chained_default<F>(&mut self, name: &str, f: F) -> &mut Self
    where
        F: Fn(&mut Resolution<'_>, OptionValue) -> Result<OptionValue, ConfigurationError>
            + Send
            + Sync
            + 'static,
    {
        self.def_mut(name).defaults.push(DefaultLayer::Chained(Arc::new(f)));
        self
    }

    /// Marks options as required. Required options with a default are
    /// always satisfied.
    pub fn set_required(&mut self, names: &[&str]) -> &mut Self {
        for name in names {
            self.def_mut(name).required = true;
        }
        self
    }

    pub fn set_allowed_types(&mut self, name: &str, types: &[OptionType]) -> &mut Self {
        self.def_mut(name).allowed_types = types.to_vec();
        self
    }

    pub fn add_allowed_types(&mut self, name: &str, types: &[OptionType]) -> &mut Self {
        self.def_mut(name).allowed_types.extend_from_slice(types);
        self
    }

    pub fn set_allowed_values(
        &mut self,
        name: &str,
        values: impl IntoIterator<Item = AllowedValue>,
    ) -> &mut Self {
        self.def_mut(name).allowed_values = values.into_iter().collect();
        self
    }

    pub fn add_allowed_values(
        &mut self,
        name: &str,
        values: impl IntoIterator<Item = AllowedValue>,
    ) -> &mut Self {
        self.def_mut(name).allowed_values.extend(values);
        self
    }

    /// Replaces all normalizers of an option.
    pub fn set_normalizer<F>(&mut self, name: &str, f: F) -> &mut Self
    where
        F: Fn(&mut Resolution<'_>, OptionValue) -> Result<OptionValue, ConfigurationError>
            + Send
            + Sync
            + 'static,
    {
        self.def_mut(name).normalizers = vec![Arc::new(f)];
        self
    }

    /// Appends a normalizer, run after the existing ones.
    pub fn add_normalizer<F>(&mut self, name: &str, f: F) -> &mut Self
    where
        F: Fn(&mut Resolution<'_>, OptionValue) -> Result<OptionValue, ConfigurationError>
            + Send
            + Sync
            + 'static,
    {
        self.def_mut(name).normalizers.push(Arc::new(f));
        self
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    pub fn is_defined(&self, name: &str) -> bool {
        self.defs.contains_key(name)
    }

    pub fn is_required(&self, name: &str) -> bool {
        self.defs.get(name).is_some_and(|d| d.required)
    }

    pub fn has_default(&self, name: &str) -> bool {
        self.defs.get(name).is_some_and(OptionDef::has_default)
    }

    /// Declared names in declaration order.
    pub fn defined_names(&self) -> &[String] {
        &self.order
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn declaration_order_is_kept() {
        let mut schema = OptionsSchema::new();
        schema.set_default("b", 1).define("a").set_default("b", 2);
        assert_eq!(schema.defined_names(), &["b".to_string(), "a".to_string()]);
        assert!(schema.has_default("b"));
        assert!(!schema.has_default("a"));
    }

    #[test]
    fn type_matching() {
        assert!(OptionType::Int.matches(&OptionValue::from(3)));
        assert!(!OptionType::Int.matches(&OptionValue::from(3.5)));
        assert!(OptionType::Array.matches(&OptionValue::from(json!({"a": 1}))));
        assert!(OptionType::Null.matches(&OptionValue::null()));
        assert_eq!(OptionType::Callback(CallbackKind::Row).to_string(), "callable(row)");
    }

    #[test]
    fn allowed_exact_is_strict() {
        let allowed = AllowedValue::from(true);
        assert!(allowed.accepts(&OptionValue::from(true)));
        assert!(!allowed.accepts(&OptionValue::from(1)));
    }
}
