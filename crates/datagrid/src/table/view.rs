use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::column::ColumnView;
use crate::options::truthy;

static NULL: Value = Value::Null;

/// Presentation data of a table, consumed by the table template.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TableView {
    /// DOM id of the rendered table.
    pub id: String,
    pub vars: Map<String, Value>,
    /// Column views in display order.
    pub columns: Vec<ColumnView>,
    #[serde(skip)]
    column_groups: Map<String, Value>,
}

/// Toggleable columns sharing a column group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToggleGroup {
    /// Group label, or null for ungrouped columns.
    pub label: Value,
    pub translation_domain: Value,
    pub columns: Vec<ColumnView>,
}

impl TableView {
    /// Creates a view over ordered column views. `column_groups` is the
    /// normalized `column_groups` table option.
    pub fn new(id: impl Into<String>, columns: Vec<ColumnView>, column_groups: &Value) -> Self {
        TableView {
            id: id.into(),
            vars: Map::new(),
            columns,
            column_groups: column_groups.as_object().cloned().unwrap_or_default(),
        }
    }

    pub fn var(&self, name: &str) -> &Value {
        self.vars.get(name).unwrap_or(&NULL)
    }

    pub fn set_var(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.vars.insert(name.into(), value.into());
    }

    /// Columns carrying a filter view, with their display index.
    pub fn filterable_columns(&self) -> Vec<(usize, &ColumnView)> {
        self.columns
            .iter()
            .enumerate()
            .filter(|(_, column)| column.filter.is_some())
            .collect()
    }

    pub fn has_filterable_columns(&self) -> bool {
        self.columns.iter().any(|column| column.filter.is_some())
    }

    /// Columns offered in the visibility selector, grouped by
    /// `column_group`.
    ///
    /// Groups follow the order of the `column_groups` option; ungrouped
    /// columns come last.
    pub fn toggleable_columns(&self) -> Vec<ToggleGroup> {
        let mut groups: BTreeMap<usize, ToggleGroup> = BTreeMap::new();
        for column in &self.columns {
            if !truthy(column.var("toggle_visible")) {
                continue;
            }
            let alias = column.var("column_group").as_str();
            let index = alias
                .and_then(|alias| self.column_groups.keys().position(|key| key == alias))
                .unwrap_or(usize::MAX);
            groups
                .entry(index)
                .or_insert_with(|| ToggleGroup {
                    label: self.group_label(alias),
                    translation_domain: self.group_translation_domain(alias),
                    columns: Vec::new(),
                })
                .columns
                .push(column.clone());
        }
        groups.into_values().collect()
    }

    fn group_label(&self, alias: Option<&str>) -> Value {
        let Some(alias) = alias else {
            return Value::Null;
        };
        self.column_groups
            .get(alias)
            .and_then(|group| group.get("label"))
            .cloned()
            .unwrap_or_else(|| Value::String(alias.to_string()))
    }

    fn group_translation_domain(&self, alias: Option<&str>) -> Value {
        alias
            .and_then(|alias| self.column_groups.get(alias))
            .and_then(|group| group.get("translation_domain"))
            .cloned()
            .unwrap_or(Value::Bool(false))
    }
}
