//! The built-in table types.

use serde_json::{json, Map, Value};
use sha2::{Digest, Sha256};

use super::{Table, TableContext, TableType, TableView};
use crate::column::is_css_length;
use crate::error::ConfigurationError;
use crate::hierarchy::HierarchicalType;
use crate::options::{AllowedValue, CallbackKind, OptionType, OptionValue, OptionsSchema, ResolvedOptions};
use crate::TRANSLATION_DOMAIN;

use OptionType::{Array, Bool, Float, Int, Null, String as Str};

const DEFAULT_DOM: &str = "<'row'<'col-sm-12'tr>><'row datagrid-footer-tools'<'col-sm-4 paginate left'p><'col-sm-4 information center'i><'col-sm-4 tools right'>>";

const STATE_KEYS: [&str; 8] = [
    "state_save_key",
    "search_state_save_key",
    "filter_state_save_key",
    "visibility_state_save_key",
    "page_length_state_save_key",
    "order_state_save_key",
    "scroller_state_save_key",
    "start_state_save_key",
];

/// Table types shipped with the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinTableType {
    /// Root of the family; tables driven by server-side requests.
    Table,
    /// Tables rendered from rows fetched up front.
    ClientSideTable,
}

impl BuiltinTableType {
    pub const ALL: [BuiltinTableType; 2] = [BuiltinTableType::Table, BuiltinTableType::ClientSideTable];

    pub fn as_str(self) -> &'static str {
        match self {
            BuiltinTableType::Table => "table",
            BuiltinTableType::ClientSideTable => "client_side_table",
        }
    }
}

impl HierarchicalType for BuiltinTableType {
    fn name(&self) -> &str {
        self.as_str()
    }

    fn parent(&self) -> Option<&str> {
        match self {
            BuiltinTableType::Table => None,
            BuiltinTableType::ClientSideTable => Some("table"),
        }
    }
}

impl TableType for BuiltinTableType {
    fn configure_options(&self, schema: &mut OptionsSchema, _ctx: &TableContext<'_>) {
        match self {
            BuiltinTableType::Table => {
                configure_table_options(schema);
                configure_widget_options(schema);
            }
            BuiltinTableType::ClientSideTable => {
                schema
                    .set_default("serverSide", false)
                    .set_default("reload_enabled", false)
                    .set_default("processing", false);
            }
        }
    }

    fn build_view(&self, view: &mut TableView, table: &Table, options: &ResolvedOptions) {
        if *self != BuiltinTableType::Table {
            return;
        }

        let mut attr = options.json("attr").as_object().cloned().unwrap_or_default();
        let additional: Vec<String> = options
            .str("classes")
            .map(|c| c.split(' ').map(str::to_string).collect())
            .unwrap_or_default();
        let mut classes = additional.clone();
        if options.is_true("serverSide") {
            classes.push("serverSide".into());
        }
        if let Some(class) = attr.get("class").and_then(Value::as_str) {
            classes = class.split(' ').map(str::to_string).collect();
            for extra in additional {
                if !classes.contains(&extra) {
                    classes.push(extra);
                }
            }
        }
        let class = classes.join(" ");
        attr.insert("id".into(), json!(view.id));
        attr.insert("class".into(), json!(class));
        view.set_var("id", view.id.clone());
        view.set_var("class", class);
        view.set_var("attr", attr);

        for name in [
            "processing",
            "serverSide",
            "ajax_url",
            "ajax_method",
            "deferRender",
            "stateSave",
            "stateDuration",
            "dom",
            "lengthMenu",
            "paging",
            "pageLength",
            "pagingType",
            "scrollX",
            "scrollY",
            "scrollCollapse",
            "rowId",
            "rowClass",
            "rowData",
            "rowAttr",
            "order",
            "scroller",
            "allowResize",
            "allowReorder",
            "translation_domain",
            "data",
            "scrollerWrapperClass",
            "filter_external",
            "search_enabled",
            "search_placeholder",
            "search_delay",
            "reload_enabled",
            "reload_tooltip",
            "clear_enabled",
            "clear_tooltip",
            "column_selector_enabled",
            "column_selector_label",
            "column_selector_label_domain",
            "column_selector_tooltip",
            "sort_on_header_label",
            "footer_tool_container_selector",
            "events_namespace",
            "default_order_property",
            "default_order_direction",
            "version_hash_modifier",
            "rows_selectable",
            "row_selection_id",
            "column_groups",
            "filter_requesturl_column_key",
            "filter_requesturl_value_key",
        ]
        .into_iter()
        .chain(STATE_KEYS)
        {
            let value = options.get(name).map(OptionValue::to_json).unwrap_or(Value::Null);
            view.set_var(name, value);
        }

        let version = if options.is_true("version_hash") {
            json!(version_hash(table, options))
        } else {
            options.json("version_hash").clone()
        };
        view.set_var("version_hash", version);
    }
}

/// Hex SHA-256 over the column hash codes, the state save keys and the
/// optional modifier.
pub(crate) fn version_hash(table: &Table, options: &ResolvedOptions) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"datagrid");
    for column in table.columns() {
        hasher.update(column.hash_code().as_bytes());
    }
    let keys: Vec<Value> = STATE_KEYS.iter().map(|k| options.json(k).clone()).collect();
    hasher.update(Value::Array(keys).to_string().as_bytes());
    if let Some(modifier) = options.str("version_hash_modifier") {
        hasher.update(modifier.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}

fn constraint(message: &str) -> ConfigurationError {
    ConfigurationError::Constraint(message.to_string())
}

fn nullable_string_or_bool(schema: &mut OptionsSchema, name: &str, default: impl Into<OptionValue>) {
    schema.set_default(name, default).set_allowed_types(name, &[Null, Str, Bool]);
}

// ============================================================================
// Widget options
// ============================================================================

fn configure_widget_options(schema: &mut OptionsSchema) {
    schema
        .set_default("processing", true)
        .set_allowed_types("processing", &[Bool])
        .set_default("serverSide", true)
        .set_allowed_types("serverSide", &[Bool])
        .set_default("ajax_url", Value::Null)
        .set_allowed_types("ajax_url", &[Str, Null])
        .set_normalizer("ajax_url", |res, value| {
            if value.is_null() && res.get("serverSide")?.as_bool() == Some(true) {
                return Err(constraint("When using \"serverSide\" with a value of true you must set \"ajax_url\"!"));
            }
            if value.is_null() && res.get("processing")?.as_bool() == Some(true) {
                return Err(constraint("When using \"processing\" with a value of true you must set \"ajax_url\"!"));
            }
            Ok(value)
        })
        .set_default("ajax_method", "POST")
        .set_allowed_values("ajax_method", AllowedValue::strings(&["GET", "POST"]))
        .set_default("deferRender", true)
        .set_allowed_types("deferRender", &[Bool])
        .set_default("stateSave", true)
        .set_allowed_types("stateSave", &[Bool])
        .set_default("stateDuration", 0)
        .set_allowed_values(
            "stateDuration",
            [AllowedValue::predicate(|value| value.as_i64().is_some_and(|n| n >= -1))],
        )
        .set_default("dom", DEFAULT_DOM)
        .set_allowed_types("dom", &[Null, Str])
        .set_default("lengthMenu", Value::Null)
        .set_allowed_types("lengthMenu", &[Null, Array])
        .set_default("paging", true)
        .set_allowed_types("paging", &[Bool])
        .set_default("pageLength", 25)
        .set_allowed_types("pageLength", &[Int])
        .set_allowed_values(
            "pageLength",
            [AllowedValue::predicate(|value| value.as_i64().is_some_and(|n| n > 0))],
        )
        .set_default("pagingType", "simple_numbers")
        .set_allowed_values(
            "pagingType",
            AllowedValue::strings(&["numbers", "simple", "simple_numbers", "full", "full_numbers", "first_last_numbers"]),
        )
        .set_default("scrollX", true)
        .set_allowed_types("scrollX", &[Bool])
        .set_default("scrollCollapse", false)
        .set_allowed_types("scrollCollapse", &[Bool])
        .set_default("scrollY", Value::Null)
        .set_allowed_values("scrollY", [AllowedValue::predicate(is_css_length)])
        .set_normalizer("scrollY", |res, value| {
            if value.is_null() && res.get("scroller")?.as_bool() != Some(false) {
                return Ok(500.into());
            }
            Ok(value)
        })
        .set_default("rowId", Value::Null)
        .set_allowed_types("rowId", &[Null, Str, OptionType::Callback(CallbackKind::Row)])
        .set_default("rowClass", Value::Null)
        .set_allowed_types("rowClass", &[Null, Str, Array, OptionType::Callback(CallbackKind::Row)])
        .set_default("rowData", Value::Null)
        .set_allowed_types("rowData", &[Null, Array, OptionType::Callback(CallbackKind::Row)])
        .set_default("rowAttr", Value::Null)
        .set_allowed_types("rowAttr", &[Null, Array, OptionType::Callback(CallbackKind::Row)])
        .set_default("order", Value::Null)
        .set_allowed_types("order", &[Null, Array])
        .set_default("scroller", true)
        .set_allowed_types("scroller", &[Bool, Array])
        .set_normalizer("scroller", |res, value| {
            if value.as_bool() != Some(false) && res.get("paging")?.as_bool() == Some(false) {
                return Err(constraint("When using \"scroller\" with a value of true you must set \"paging\" to true!"));
            }
            match value.as_options() {
                Some(settings) => Ok(scroller_schema().resolve(settings)?.to_json().into()),
                None => Ok(value),
            }
        })
        .set_default("allowResize", false)
        .set_allowed_types("allowResize", &[Bool])
        .set_default("allowReorder", false)
        .set_allowed_types("allowReorder", &[Bool]);
}

fn scroller_schema() -> OptionsSchema {
    let mut schema = OptionsSchema::new();
    schema
        .set_default("boundaryScale", 0.5)
        .set_allowed_values(
            "boundaryScale",
            [AllowedValue::predicate(|value| value.as_f64().is_some_and(|n| n > 0.0 && n <= 1.0))],
        )
        .set_default("displayBuffer", 9)
        .set_allowed_types("displayBuffer", &[Int, Float])
        .set_default("loadingIndicator", false)
        .set_allowed_types("loadingIndicator", &[Bool])
        .set_default("rowHeight", "auto")
        .set_allowed_values(
            "rowHeight",
            [AllowedValue::predicate(|value| value.as_i64().is_some() || value.as_str() == Some("auto"))],
        )
        .set_default("serverWait", 200)
        .set_allowed_types("serverWait", &[Int, Float]);
    schema
}

// ============================================================================
// Table options
// ============================================================================

fn configure_table_options(schema: &mut OptionsSchema) {
    schema
        .set_default("translation_domain", "messages")
        .set_allowed_types("translation_domain", &[Str, Null, Bool])
        .set_default("data", Value::Null)
        .set_allowed_values(
            "data",
            [AllowedValue::predicate(|value| match value.as_json() {
                Some(Value::Null | Value::Bool(_) | Value::Array(_) | Value::Object(_)) => true,
                Some(Value::Number(n)) => n.as_i64().is_some_and(|n| n > 0),
                _ => value.is_array(),
            })],
        )
        .set_default("paginationOptions", Value::Null)
        .set_allowed_types("paginationOptions", &[Null, Array])
        .set_default("scrollerWrapperClass", Value::Null)
        .set_chained_default("scrollerWrapperClass", |res, previous| {
            if previous.is_null() && res.get("scroller")?.as_bool() != Some(false) {
                return Ok("scroller-content-wrapper".into());
            }
            Ok(previous)
        })
        .set_allowed_types("scrollerWrapperClass", &[Null, Str])
        .set_default("classes", Value::Null)
        .set_allowed_types("classes", &[Null, Str])
        .set_default(
            "attr",
            json!({
                "class": "table table-striped table-hover table-condensed expendable-table datagrid",
                "style": "width: 100%;",
            }),
        )
        .set_allowed_types("attr", &[Array])
        .set_default("filter_external", true)
        .set_allowed_types("filter_external", &[Bool])
        .set_default("search_enabled", true)
        .set_allowed_types("search_enabled", &[Bool])
        .set_default("search_placeholder", Value::Null)
        .set_allowed_types("search_placeholder", &[Null, Str])
        .set_default("search_delay", Value::Null)
        .set_allowed_types("search_delay", &[Null, Int])
        .set_default("reload_enabled", true)
        .set_allowed_types("reload_enabled", &[Bool])
        .set_default("reload_tooltip", Value::Null)
        .set_allowed_types("reload_tooltip", &[Null, Str])
        .set_default("clear_enabled", true)
        .set_allowed_types("clear_enabled", &[Bool])
        .set_default("clear_tooltip", Value::Null)
        .set_allowed_types("clear_tooltip", &[Null, Str])
        .set_default("column_selector_enabled", true)
        .set_allowed_types("column_selector_enabled", &[Bool])
        .set_default("column_selector_label", "datagrid.columns.label")
        .set_allowed_types("column_selector_label", &[Str])
        .set_default("column_selector_label_domain", TRANSLATION_DOMAIN)
        .set_allowed_types("column_selector_label_domain", &[Bool, Str])
        .set_default("column_selector_tooltip", Value::Null)
        .set_allowed_types("column_selector_tooltip", &[Null, Str])
        .set_default("state_save_key", true)
        .set_allowed_values(
            "state_save_key",
            [AllowedValue::predicate(|value| {
                value.is_null() || value.as_str().is_some() || value.as_bool() == Some(true)
            })],
        );

    for (name, default) in [
        ("search_state_save_key", Value::Bool(false)),
        ("filter_state_save_key", Value::Null),
        ("visibility_state_save_key", Value::Null),
        ("page_length_state_save_key", Value::Null),
        ("order_state_save_key", Value::Null),
        ("scroller_state_save_key", Value::Bool(false)),
        ("start_state_save_key", Value::Bool(false)),
    ] {
        nullable_string_or_bool(schema, name, default);
    }

    schema
        .set_default("sort_on_header_label", true)
        .set_allowed_types("sort_on_header_label", &[Bool])
        .set_default("footer_tool_container_selector", Value::Null)
        .set_allowed_types("footer_tool_container_selector", &[Null, Str])
        .set_default("events_namespace", "datagrid")
        .set_allowed_types("events_namespace", &[Str])
        .set_default("default_order_property", "id")
        .set_allowed_types("default_order_property", &[Str, Null])
        .set_default("default_order_direction", "asc")
        .set_allowed_values("default_order_direction", AllowedValue::strings(&["asc", "desc"]))
        .set_default("version_hash", true)
        .set_allowed_types("version_hash", &[Bool, Str])
        .set_default("version_hash_modifier", Value::Null)
        .set_allowed_types("version_hash_modifier", &[Null, Str])
        .set_default("filter_requesturl_column_key", "tableFilterColumn")
        .set_allowed_types("filter_requesturl_column_key", &[Str])
        .set_default("filter_requesturl_value_key", "tableFilterValue")
        .set_allowed_types("filter_requesturl_value_key", &[Str]);

    configure_selection(schema);
    configure_column_groups(schema);
}

fn configure_selection(schema: &mut OptionsSchema) {
    schema
        .set_default("rows_selectable", false)
        .set_allowed_types("rows_selectable", &[Bool])
        .set_default("row_selection_id", Value::Null)
        .set_allowed_types("row_selection_id", &[Null, Int, Str, OptionType::Callback(CallbackKind::Row)])
        .set_normalizer("row_selection_id", |res, value| {
            if value.is_null() && res.get("rows_selectable")?.as_bool() == Some(true) {
                return Err(constraint(
                    "When using \"rows_selectable\" with a value of true you must set \"row_selection_id\"!",
                ));
            }
            Ok(value)
        });
}

/// Whether every group is a label string or a `{label, translation_domain?}`
/// map.
fn valid_column_groups(groups: &Map<String, Value>) -> bool {
    !groups.is_empty()
        && groups.values().all(|group| match group {
            Value::String(_) => true,
            Value::Object(entry) => {
                entry.contains_key("label") && entry.keys().all(|k| k == "label" || k == "translation_domain")
            }
            _ => false,
        })
}

fn configure_column_groups(schema: &mut OptionsSchema) {
    schema
        .set_default("column_groups", Value::Null)
        .set_allowed_types("column_groups", &[Null, Array])
        .set_allowed_values(
            "column_groups",
            [AllowedValue::predicate(|value| match value.as_json() {
                Some(Value::Null) => true,
                Some(Value::Object(groups)) => valid_column_groups(groups),
                _ => false,
            })],
        )
        .set_normalizer("column_groups", |res, value| {
            let Some(Value::Object(groups)) = value.as_json() else {
                return Ok(value);
            };
            let domain = res.get("translation_domain")?.to_json();
            let normalized: Map<String, Value> = groups
                .iter()
                .map(|(key, group)| {
                    let entry = match group {
                        Value::String(label) => json!({"label": label, "translation_domain": domain}),
                        Value::Object(entry) if !entry.contains_key("translation_domain") => {
                            let mut entry = entry.clone();
                            entry.insert("translation_domain".into(), domain.clone());
                            Value::Object(entry)
                        }
                        other => other.clone(),
                    };
                    (key.clone(), entry)
                })
                .collect();
            Ok(normalized.into())
        });
}
