use serde::Serialize;
use serde_json::{Map, Value};

use crate::filter::FilterView;

static NULL: Value = Value::Null;

/// Presentation data of one column, consumed by the table template.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ColumnView {
    pub path: String,
    /// Client-side column template.
    pub template: Option<String>,
    pub vars: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<FilterView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<Box<ColumnView>>,
}

impl ColumnView {
    pub fn new(parent: Option<ColumnView>) -> Self {
        ColumnView {
            parent: parent.map(Box::new),
            ..Default::default()
        }
    }

    /// A view variable, null when unset.
    pub fn var(&self, name: &str) -> &Value {
        self.vars.get(name).unwrap_or(&NULL)
    }

    pub fn set_var(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.vars.insert(name.into(), value.into());
    }

    /// Sets a variable only when it is missing or null.
    pub fn default_var(&mut self, name: &str, value: Value) {
        if self.var(name).is_null() {
            self.vars.insert(name.to_string(), value);
        }
    }
}
