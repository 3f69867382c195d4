//! Option resolution.
//!
//! Options resolve on demand: reading an option through
//! [`Resolution::get`] computes its final value (input or default, then
//! type check, value check and normalizers) and caches it. Lazy defaults
//! and normalizers may therefore read any other option's final value.
//! Re-entering an option that is still being computed is a cycle.

use std::collections::{BTreeMap, BTreeSet};

use super::resolved::ResolvedOptions;
use super::schema::{AllowedValue, DefaultLayer, OptionDef, OptionsSchema};
use super::value::{OptionValue, Options};
use crate::error::ConfigurationError;

/// An in-progress resolution of input options against a schema.
pub struct Resolution<'s> {
    schema: &'s OptionsSchema,
    input: Options,
    resolved: BTreeMap<String, OptionValue>,
    computing: Vec<String>,
}

impl<'s> Resolution<'s> {
    fn new(schema: &'s OptionsSchema, input: Options) -> Self {
        Resolution {
            schema,
            input,
            resolved: BTreeMap::new(),
            computing: Vec::new(),
        }
    }

    /// Whether the option was supplied by the caller.
    pub fn is_set(&self, name: &str) -> bool {
        self.input.contains(name)
    }

    /// Whether the option will have a value (supplied or defaulted).
    pub fn has(&self, name: &str) -> bool {
        self.input.contains(name) || self.schema.has_default(name)
    }

    /// Final value of an option.
    pub fn get(&mut self, name: &str) -> Result<OptionValue, ConfigurationError> {
        if let Some(value) = self.resolved.get(name) {
            return Ok(value.clone());
        }
        let Some(def) = self.schema.def(name) else {
            return Err(self.undefined(name));
        };

        if let Some(position) = self.computing.iter().position(|n| n == name) {
            return Err(ConfigurationError::Cycle {
                names: self.computing[position..].to_vec(),
            });
        }

        let def = def.clone();
        self.computing.push(name.to_string());
        let outcome = self.compute(name, &def);
        self.computing.pop();

        let value = outcome?;
        self.resolved.insert(name.to_string(), value.clone());
        Ok(value)
    }

    fn compute(&mut self, name: &str, def: &OptionDef) -> Result<OptionValue, ConfigurationError> {
        let mut value = match self.input.get(name) {
            Some(value) => value.clone(),
            None => self.default_value(name, &def.defaults)?,
        };

        if !def.allowed_types.is_empty() && !def.allowed_types.iter().any(|t| t.matches(&value)) {
            return Err(ConfigurationError::InvalidType {
                name: name.to_string(),
                value: value.describe(),
                expected: def.allowed_types.iter().map(ToString::to_string).collect(),
                actual: value.type_name(),
            });
        }

        if !def.allowed_values.is_empty() && !def.allowed_values.iter().any(|a| a.accepts(&value)) {
            return Err(ConfigurationError::InvalidValue {
                name: name.to_string(),
                value: value.describe(),
                accepted: def
                    .allowed_values
                    .iter()
                    .filter_map(|allowed| match allowed {
                        AllowedValue::Exact(v) => Some(OptionValue::Data(v.clone()).describe()),
                        AllowedValue::Predicate(_) => None,
                    })
                    .collect(),
            });
        }

        for normalizer in &def.normalizers {
            value = normalizer(self, value)?;
        }
        Ok(value)
    }

    fn default_value(
        &mut self,
        name: &str,
        layers: &[DefaultLayer],
    ) -> Result<OptionValue, ConfigurationError> {
        if layers.is_empty() {
            return Err(ConfigurationError::NoValue {
                name: name.to_string(),
            });
        }
        let mut value = OptionValue::null();
        for layer in layers {
            value = match layer {
                DefaultLayer::Static(v) => v.clone(),
                DefaultLayer::Lazy(f) => f(self)?,
                DefaultLayer::Chained(f) => f(self, value)?,
            };
        }
        Ok(value)
    }

    fn undefined(&self, name: &str) -> ConfigurationError {
        let mut defined = self.schema.defined_names().to_vec();
        defined.sort();
        ConfigurationError::UndefinedOption {
            name: name.to_string(),
            defined,
        }
    }
}

impl OptionsSchema {
    /// Resolves caller input against this schema.
    ///
    /// Fails on unknown keys, on missing required options and on any
    /// type, value or normalizer violation. Declared options without a
    /// default that the caller did not supply are left out of the result.
    ///
    /// # Example
    ///
    /// ```
    /// use datagrid::{Options, OptionsSchema, OptionValue};
    ///
    /// let mut schema = OptionsSchema::new();
    /// schema.set_default("multiple", true);
    /// schema.set_lazy_default("type", |res| {
    ///     Ok(if res.get("multiple")?.as_bool() == Some(true) {
    ///         "multi_select".into()
    ///     } else {
    ///         "select".into()
    ///     })
    /// });
    ///
    /// let resolved = schema.resolve(Options::new().set("multiple", false)).unwrap();
    /// assert_eq!(resolved.str("type"), Some("select"));
    /// ```
    pub fn resolve(&self, input: Options) -> Result<ResolvedOptions, ConfigurationError> {
        if let Some(unknown) = input.names().find(|name| !self.is_defined(name)) {
            let mut defined = self.defined_names().to_vec();
            defined.sort();
            return Err(ConfigurationError::UndefinedOption {
                name: unknown.to_string(),
                defined,
            });
        }

        let missing: BTreeSet<&String> = self
            .defined_names()
            .iter()
            .filter(|name| self.is_required(name) && !input.contains(name) && !self.has_default(name))
            .collect();
        if !missing.is_empty() {
            return Err(ConfigurationError::MissingRequired {
                names: missing.into_iter().cloned().collect(),
            });
        }

        let mut resolution = Resolution::new(self, input);
        for name in self.defined_names() {
            if resolution.has(name) {
                resolution.get(name)?;
            }
        }
        Ok(ResolvedOptions::from_map(resolution.resolved))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::schema::OptionType;

    #[test]
    fn input_overrides_default() {
        let mut schema = OptionsSchema::new();
        schema.set_default("label", "");
        let resolved = schema.resolve(Options::new().set("label", "Name")).unwrap();
        assert_eq!(resolved.str("label"), Some("Name"));
    }

    #[test]
    fn unknown_option_is_rejected() {
        let mut schema = OptionsSchema::new();
        schema.set_default("b", 1).set_default("a", 1);
        let err = schema.resolve(Options::new().set("c", 1)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "The option \"c\" does not exist. Defined options are: \"a\", \"b\"."
        );
    }

    #[test]
    fn missing_required() {
        let mut schema = OptionsSchema::new();
        schema.set_required(&["yes_value"]);
        let err = schema.resolve(Options::new()).unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::MissingRequired {
                names: vec!["yes_value".into()]
            }
        );
    }

    #[test]
    fn required_with_default_is_satisfied() {
        let mut schema = OptionsSchema::new();
        schema.set_required(&["type"]).set_default("type", "text");
        assert_eq!(schema.resolve(Options::new()).unwrap().str("type"), Some("text"));
    }

    #[test]
    fn defined_without_default_is_absent() {
        let mut schema = OptionsSchema::new();
        schema.define("maybe");
        let resolved = schema.resolve(Options::new()).unwrap();
        assert!(!resolved.contains("maybe"));
    }

    #[test]
    fn type_violation() {
        let mut schema = OptionsSchema::new();
        schema
            .set_default("visible", true)
            .set_allowed_types("visible", &[OptionType::Bool]);
        let err = schema.resolve(Options::new().set("visible", "yes")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "The option \"visible\" with value \"yes\" is expected to be of type \"bool\", but is of type \"string\"."
        );
    }

    #[test]
    fn defaults_are_validated_too() {
        let mut schema = OptionsSchema::new();
        schema
            .set_default("step", "one")
            .set_allowed_types("step", &[OptionType::Int, OptionType::Float]);
        assert!(schema.resolve(Options::new()).is_err());
    }

    #[test]
    fn value_violation_lists_accepted() {
        let mut schema = OptionsSchema::new();
        schema
            .set_default("select_type", "select2")
            .set_allowed_values("select_type", [AllowedValue::null(), "select2".into(), "chosen".into()]);
        let err = schema.resolve(Options::new().set("select_type", "other")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "The option \"select_type\" with value \"other\" is invalid. Accepted values are: null, \"select2\", \"chosen\"."
        );
    }

    #[test]
    fn normalizer_sees_final_sibling_values() {
        let mut schema = OptionsSchema::new();
        schema.set_default("filterable", false);
        schema.set_default("filter_type", OptionValue::null());
        schema.set_normalizer("filter_type", |res, value| {
            if !value.is_null() && res.get("filterable")?.as_bool() != Some(true) {
                return Err(ConfigurationError::Constraint(
                    "filter_type requires filterable".into(),
                ));
            }
            Ok(value)
        });
        assert!(schema.resolve(Options::new().set("filter_type", "text")).is_err());
        assert!(schema
            .resolve(Options::new().set("filter_type", "text").set("filterable", true))
            .is_ok());
    }

    #[test]
    fn normalizers_run_in_order() {
        let mut schema = OptionsSchema::new();
        schema.set_default("v", "a");
        schema.add_normalizer("v", |_, v| Ok(format!("{}b", v.as_str().unwrap_or_default()).into()));
        schema.add_normalizer("v", |_, v| Ok(format!("{}c", v.as_str().unwrap_or_default()).into()));
        assert_eq!(schema.resolve(Options::new()).unwrap().str("v"), Some("abc"));
    }

    #[test]
    fn chained_default_receives_previous() {
        let mut schema = OptionsSchema::new();
        schema.set_default("label_function", OptionValue::null());
        schema.set_chained_default("label_function", |_, previous| {
            Ok(if previous.is_null() { "fallback".into() } else { previous })
        });
        let resolved = schema.resolve(Options::new()).unwrap();
        assert_eq!(resolved.str("label_function"), Some("fallback"));
    }

    #[test]
    fn static_default_replaces_chain() {
        let mut schema = OptionsSchema::new();
        schema.set_lazy_default("a", |_| Ok("lazy".into()));
        schema.set_default("a", "static");
        assert_eq!(schema.resolve(Options::new()).unwrap().str("a"), Some("static"));
    }

    #[test]
    fn cyclic_lazy_defaults_fail() {
        let mut schema = OptionsSchema::new();
        schema.set_lazy_default("a", |res| res.get("b"));
        schema.set_lazy_default("b", |res| res.get("a"));
        let err = schema.resolve(Options::new()).unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::Cycle {
                names: vec!["a".into(), "b".into()]
            }
        );
    }

    #[test]
    fn reading_option_without_value_fails() {
        let mut schema = OptionsSchema::new();
        schema.define("a");
        schema.set_lazy_default("b", |res| res.get("a"));
        let err = schema.resolve(Options::new()).unwrap_err();
        assert_eq!(err, ConfigurationError::NoValue { name: "a".into() });
    }
}
