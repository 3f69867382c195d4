use serde::Serialize;
use serde_json::{Map, Value};

static NULL: Value = Value::Null;

/// Presentation data of a column filter.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterView {
    /// Client-side filter template.
    pub template: String,
    pub vars: Map<String, Value>,
}

impl FilterView {
    pub fn var(&self, name: &str) -> &Value {
        self.vars.get(name).unwrap_or(&NULL)
    }

    pub fn set_var(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.vars.insert(name.into(), value.into());
    }

    /// Merges every key of an object into the vars.
    pub fn merge_vars(&mut self, values: Map<String, Value>) {
        self.vars.extend(values);
    }
}
