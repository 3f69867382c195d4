//! The built-in column type catalog.

use std::sync::Arc;

use datagrid_query::as_number;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Map, Value};

use super::{Capability, Column, ColumnContext, ColumnType, ColumnView};
use crate::error::ConfigurationError;
use crate::hierarchy::HierarchicalType;
use crate::options::{
    truthy, AllowedValue, Callback, CallbackKind, OptionType, OptionValue, OptionsSchema, ResolvedOptions,
};
use crate::property::try_get_property;
use crate::registry::UrlGenerator;
use crate::template::{self, ASYNC_CHILD_ROW, FONT_AWESOME_ICON, PROGRESS_BAR, SELECT_ROW};
use crate::transform::{
    option_or_delegate, parse_datetime, route_url, text, Abridged, CurrencyFormat, DateTimeFormat, Link, Mapping,
    Nl2Br, NumberFormat, StringFormat, TransformerChain, Translate,
};
use crate::TRANSLATION_DOMAIN;

use OptionType::{Array, Bool, Float, Int, Null, String as Str};

static CSS_WIDTH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(([-+]?([\d]*\.)?[\d]+)(px|em|ex|%|in|cm|mm|pt|pc|vh))")
        .expect("CSS_WIDTH: invalid regex pattern")
});

/// Null, a number (pixels) or a CSS length such as `12em` or `50%`.
pub(crate) fn is_css_length(value: &OptionValue) -> bool {
    match value.as_json() {
        Some(Value::Null) | Some(Value::Number(_)) => true,
        Some(Value::String(s)) => s.trim().parse::<f64>().is_ok() || CSS_WIDTH.is_match(s),
        _ => false,
    }
}

/// Column types shipped with the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinColumnType {
    /// Root of the family.
    Column,
    String,
    Integer,
    NumberFormatter,
    Currency,
    DateTime,
    MomentDateTime,
    YesNo,
    Mapping,
    Email,
    FormattedString,
    Count,
    AbridgedString,
    Templated,
    FontAwesome,
    ProgressBar,
    ChildRowTrigger,
    AsyncChildRowTrigger,
    SelectColumn,
}

impl BuiltinColumnType {
    pub const ALL: [BuiltinColumnType; 19] = [
        BuiltinColumnType::Column,
        BuiltinColumnType::String,
        BuiltinColumnType::Integer,
        BuiltinColumnType::NumberFormatter,
        BuiltinColumnType::Currency,
        BuiltinColumnType::DateTime,
        BuiltinColumnType::MomentDateTime,
        BuiltinColumnType::YesNo,
        BuiltinColumnType::Mapping,
        BuiltinColumnType::Email,
        BuiltinColumnType::FormattedString,
        BuiltinColumnType::Count,
        BuiltinColumnType::AbridgedString,
        BuiltinColumnType::Templated,
        BuiltinColumnType::FontAwesome,
        BuiltinColumnType::ProgressBar,
        BuiltinColumnType::ChildRowTrigger,
        BuiltinColumnType::AsyncChildRowTrigger,
        BuiltinColumnType::SelectColumn,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BuiltinColumnType::Column => "column",
            BuiltinColumnType::String => "string",
            BuiltinColumnType::Integer => "integer",
            BuiltinColumnType::NumberFormatter => "number_formatter",
            BuiltinColumnType::Currency => "currency",
            BuiltinColumnType::DateTime => "datetime",
            BuiltinColumnType::MomentDateTime => "moment_datetime",
            BuiltinColumnType::YesNo => "yes_no",
            BuiltinColumnType::Mapping => "mapping",
            BuiltinColumnType::Email => "email",
            BuiltinColumnType::FormattedString => "formatted_string",
            BuiltinColumnType::Count => "count",
            BuiltinColumnType::AbridgedString => "abridged_string",
            BuiltinColumnType::Templated => "templated",
            BuiltinColumnType::FontAwesome => "font_awesome",
            BuiltinColumnType::ProgressBar => "progress_bar",
            BuiltinColumnType::ChildRowTrigger => "child_row_trigger",
            BuiltinColumnType::AsyncChildRowTrigger => "async_child_row_trigger",
            BuiltinColumnType::SelectColumn => "select_column",
        }
    }
}

impl HierarchicalType for BuiltinColumnType {
    fn name(&self) -> &str {
        self.as_str()
    }

    fn parent(&self) -> Option<&str> {
        match self {
            BuiltinColumnType::Column => None,
            BuiltinColumnType::Currency => Some("number_formatter"),
            BuiltinColumnType::FormattedString => Some("string"),
            BuiltinColumnType::Count => Some("integer"),
            BuiltinColumnType::FontAwesome | BuiltinColumnType::SelectColumn => Some("templated"),
            BuiltinColumnType::AsyncChildRowTrigger => Some("child_row_trigger"),
            _ => Some("column"),
        }
    }
}

impl ColumnType for BuiltinColumnType {
    fn configure_options(&self, schema: &mut OptionsSchema, ctx: &ColumnContext<'_>) {
        match self {
            BuiltinColumnType::Column => configure_column(schema, ctx),
            BuiltinColumnType::String => {
                schema.set_default("nl2br", false).set_allowed_types("nl2br", &[Bool]);
            }
            BuiltinColumnType::Integer => {}
            BuiltinColumnType::NumberFormatter => configure_number_formatter(schema),
            BuiltinColumnType::Currency => {
                schema
                    .set_default("number_formatter_style", "currency")
                    .set_default("currency", "EUR")
                    .set_allowed_types("currency", &[Str, OptionType::Callback(CallbackKind::Value)])
                    .set_default("format_null", true);
            }
            BuiltinColumnType::DateTime => configure_datetime(schema),
            BuiltinColumnType::MomentDateTime => {
                schema
                    .set_default("date_format", "L LTS")
                    .set_allowed_types("date_format", &[Str])
                    .set_default("js_column_template", "datagrid/column/datetime_moment.js.twig");
            }
            BuiltinColumnType::YesNo => configure_yes_no(schema),
            BuiltinColumnType::Mapping => {
                schema
                    .define("mapping")
                    .set_required(&["mapping"])
                    .set_allowed_types("mapping", &[Array, OptionType::Callback(CallbackKind::Mapping)])
                    .set_default("value_translation_domain", Value::Null)
                    .set_allowed_types("value_translation_domain", &[Null, Str, Bool]);
            }
            BuiltinColumnType::Email => {
                schema.set_default(
                    "route",
                    Callback::link(|_, value| match text(value) {
                        address if address.is_empty() => Value::Null,
                        address => Value::String(format!("mailto:{address}")),
                    }),
                );
            }
            BuiltinColumnType::FormattedString => {
                schema
                    .set_default("string_format", "%s")
                    .set_allowed_types("string_format", &[Str, OptionType::Callback(CallbackKind::Value)])
                    .set_default("string_format_parameters", Value::Null)
                    .set_allowed_types(
                        "string_format_parameters",
                        &[Null, Array, OptionType::Callback(CallbackKind::Value)],
                    );
            }
            BuiltinColumnType::Count => {
                schema
                    .set_default("orderable", false)
                    .set_default("searchable", false)
                    .set_default("value_delegate", Callback::value(count_value));
            }
            BuiltinColumnType::AbridgedString => {
                for name in ["max", "wrap", "tooltipMax", "tooltip_wrap"] {
                    schema.set_default(name, -1).set_allowed_types(name, &[Int]);
                }
                schema
                    .set_default("container", "body")
                    .set_allowed_types("container", &[Str])
                    .set_default("fullscreen", false)
                    .set_allowed_types("fullscreen", &[Bool])
                    .set_default("nl2space", false)
                    .set_allowed_types("nl2space", &[Bool])
                    .set_default("nl2br", true)
                    .set_allowed_types("nl2br", &[Bool]);
            }
            BuiltinColumnType::Templated => configure_templated(schema, ctx),
            BuiltinColumnType::FontAwesome => {
                schema
                    .set_default("mapped", true)
                    .set_default("no_value_icon", Value::Null)
                    .set_allowed_types("no_value_icon", &[Null, Str])
                    .set_default("template", FONT_AWESOME_ICON);
            }
            BuiltinColumnType::ProgressBar => configure_progress_bar(schema),
            BuiltinColumnType::ChildRowTrigger => configure_child_row_trigger(schema),
            BuiltinColumnType::AsyncChildRowTrigger => configure_async_child_row_trigger(schema, ctx),
            BuiltinColumnType::SelectColumn => configure_select_column(schema, ctx),
        }
    }

    fn build_view(&self, view: &mut ColumnView, column: &Column, options: &ResolvedOptions) {
        match self {
            BuiltinColumnType::Column => build_column_view(view, column, options),
            BuiltinColumnType::NumberFormatter => copy_vars(
                view,
                options,
                &["number_formatter_locale", "number_formatter_style", "number_formatter_pattern"],
            ),
            BuiltinColumnType::MomentDateTime => copy_vars(view, options, &["date_format"]),
            BuiltinColumnType::YesNo => copy_vars(
                view,
                options,
                &["yes_label", "no_label", "yes_icon", "no_icon", "display_type", "label_translation_domain"],
            ),
            BuiltinColumnType::ChildRowTrigger => copy_vars(view, options, &["details_trigger_selector"]),
            BuiltinColumnType::SelectColumn => copy_vars(view, options, &["form_id"]),
            _ => {}
        }
    }

    fn build_data(&self, transformers: &mut TransformerChain, options: &ResolvedOptions) {
        match self {
            BuiltinColumnType::Column => {
                if options.is_truthy("route") {
                    transformers.add(Link, true);
                }
            }
            BuiltinColumnType::String => {
                if options.is_true("nl2br") {
                    transformers.add(Nl2Br, false);
                }
            }
            BuiltinColumnType::NumberFormatter => {
                transformers.add(NumberFormat, false);
            }
            BuiltinColumnType::Currency => {
                transformers.reset().add(CurrencyFormat, false);
            }
            BuiltinColumnType::DateTime => {
                transformers.add(DateTimeFormat, false);
            }
            BuiltinColumnType::Mapping => {
                transformers.add(Mapping, false);
                if options.json("value_translation_domain") != &Value::Bool(false) {
                    transformers.add(Translate, true);
                }
            }
            BuiltinColumnType::FormattedString => {
                transformers.add(StringFormat, false);
            }
            BuiltinColumnType::AbridgedString => {
                transformers.add(Abridged, false);
            }
            _ => {}
        }
    }
}

fn constraint(message: impl Into<String>) -> ConfigurationError {
    ConfigurationError::Constraint(message.into())
}

fn capability_values() -> Vec<AllowedValue> {
    vec![
        AllowedValue::from(true),
        AllowedValue::from(false),
        AllowedValue::from(Capability::CLIENT),
        AllowedValue::from(Capability::SERVER),
    ]
}

fn copy_vars(view: &mut ColumnView, options: &ResolvedOptions, names: &[&str]) {
    for name in names {
        let value = options.get(name).map(OptionValue::to_json).unwrap_or(Value::Null);
        view.set_var(*name, value);
    }
}

/// Adds `route_params: {}` to an array-form route, rejecting arrays
/// without a `route` key.
fn normalize_route_map(value: OptionValue, message: &'static str) -> Result<OptionValue, ConfigurationError> {
    match value {
        OptionValue::Data(Value::Object(mut map)) => {
            if !map.contains_key("route") {
                return Err(constraint(message));
            }
            map.entry("route_params").or_insert_with(|| json!({}));
            Ok(OptionValue::Data(Value::Object(map)))
        }
        OptionValue::Nested(mut options) => {
            if !options.contains("route") {
                return Err(constraint(message));
            }
            if !options.contains("route_params") {
                options.insert("route_params", json!({}));
            }
            Ok(OptionValue::Nested(options))
        }
        OptionValue::Data(Value::Array(_)) => Err(constraint(message)),
        other => Ok(other),
    }
}

// ============================================================================
// column
// ============================================================================

fn configure_column(schema: &mut OptionsSchema, ctx: &ColumnContext<'_>) {
    schema
        .set_default("path", Value::Null)
        .set_allowed_types("path", &[Null, Str])
        .set_default("label", "")
        .set_allowed_types("label", &[Null, Str])
        .set_default("translation_domain", Value::Null)
        .set_allowed_types("translation_domain", &[Null, Str, Bool]);

    for name in ["abbreviation_label", "tooltip_label"] {
        schema.set_default(name, Value::Null).set_allowed_types(name, &[Null, Str]);
    }
    for name in ["abbreviation_translation_domain", "tooltip_translation_domain"] {
        schema.set_default(name, Value::Null).set_allowed_types(name, &[Null, Str, Bool]);
    }

    schema
        .set_default("orderSequence", json!(["asc", "desc", ""]))
        .set_allowed_types("orderSequence", &[Array, Null])
        .set_default("empty_value", Value::Null)
        .set_allowed_types("empty_value", &[Null, Str]);

    for (name, default) in [("searchable", true), ("filterable", false), ("orderable", true)] {
        schema.set_default(name, default).set_allowed_values(name, capability_values());
    }

    schema
        .set_lazy_default("filter_type", |res| {
            let filterable = res.get("filterable")?;
            Ok(if filterable.as_bool() == Some(false) {
                OptionValue::null()
            } else {
                OptionValue::from("text")
            })
        })
        .set_allowed_types("filter_type", &[Null, Str])
        .set_normalizer("filter_type", |res, value| {
            if let Some(name) = value.as_str() {
                if !res.get("filterable")?.is_truthy() {
                    return Err(constraint(format!(
                        "When using \"filter_type\" with a value of \"{name}\" you must set \"filterable\" to true!"
                    )));
                }
            }
            Ok(value)
        })
        .set_default("filter_options", json!({}))
        .set_allowed_types("filter_options", &[Array]);

    schema
        .set_default("route", Value::Null)
        .set_allowed_types("route", &[Null, Str, Array, OptionType::Callback(CallbackKind::Link)])
        .set_normalizer("route", |_, value| {
            normalize_route_map(
                value,
                "When using \"route\" option with an array value, you must add a \"route\" key pointing to the route to be used!",
            )
        });

    for name in ["query_path", "filter_query_path", "class_name"] {
        schema.set_default(name, Value::Null).set_allowed_types(name, &[Null, Str]);
    }
    for name in ["visible", "toggleable", "toggle_visible"] {
        schema.set_default(name, true).set_allowed_types(name, &[Bool]);
    }

    let groups = ctx.table_options.json("column_groups").clone();
    schema
        .set_default("column_group", Value::Null)
        .set_allowed_values(
            "column_group",
            [AllowedValue::predicate(move |value| match value.as_json() {
                Some(Value::Null) => true,
                Some(key @ (Value::String(_) | Value::Number(_))) => {
                    groups.as_object().is_some_and(|groups| groups.contains_key(&text(key)))
                }
                _ => false,
            })],
        );

    let delegates = [
        ("search_server_delegate", vec![Null, OptionType::Callback(CallbackKind::SearchServer)]),
        ("filter_server_delegate", vec![Null, OptionType::Callback(CallbackKind::FilterServer)]),
        ("order_server_delegate", vec![Null, OptionType::Callback(CallbackKind::OrderServer)]),
        ("search_client_delegate", vec![Null, Str, OptionType::Callback(CallbackKind::Client)]),
        ("order_client_delegate", vec![Null, Str, OptionType::Callback(CallbackKind::Client)]),
        ("value_delegate", vec![Null, OptionType::Callback(CallbackKind::Value)]),
    ];
    for (name, types) in delegates {
        schema.set_default(name, Value::Null).set_allowed_types(name, &types);
    }

    schema
        .set_default("position", Value::Null)
        .set_allowed_types("position", &[Null, Str, Array])
        .set_allowed_values(
            "position",
            [AllowedValue::predicate(|value| match value.to_json() {
                Value::Null => true,
                Value::String(s) => s == "first" || s == "last",
                Value::Object(map) => map.contains_key("before") || map.contains_key("after"),
                _ => false,
            })],
        );

    schema.set_default("width", Value::Null).set_allowed_values(
        "width",
        [AllowedValue::predicate(|value| match value.as_json() {
            Some(Value::String(s)) if s.is_empty() => true,
            _ => is_css_length(value),
        })],
    );

    schema
        .set_default("js_column_template", "datagrid/column/column.js.twig")
        .set_allowed_types("js_column_template", &[Str]);
}

fn build_column_view(view: &mut ColumnView, column: &Column, options: &ResolvedOptions) {
    view.template = options.str("js_column_template").map(str::to_string);
    view.path = column.path().to_string();

    copy_vars(
        view,
        options,
        &[
            "label",
            "translation_domain",
            "abbreviation_label",
            "abbreviation_translation_domain",
            "tooltip_label",
            "tooltip_translation_domain",
            "orderSequence",
            "empty_value",
            "route",
            "class_name",
            "visible",
            "toggleable",
            "toggle_visible",
            "column_group",
            "width",
        ],
    );
    let domain = options.json("translation_domain").clone();
    view.default_var("abbreviation_translation_domain", domain.clone());
    view.default_var("tooltip_translation_domain", domain);

    view.set_var("searchable", column.is_searchable());
    view.set_var("filterable", column.is_filterable());
    view.set_var("orderable", column.is_orderable());
}

// ============================================================================
// Formatting types
// ============================================================================

fn configure_number_formatter(schema: &mut OptionsSchema) {
    schema
        .set_default("format_null", true)
        .set_allowed_types("format_null", &[Bool])
        .set_default("number_formatter_style", "decimal")
        .set_required(&["number_formatter_style"])
        .set_allowed_values(
            "number_formatter_style",
            AllowedValue::strings(&["decimal", "percent", "currency", "scientific", "pattern"]),
        )
        .set_default("number_formatter_pattern", Value::Null)
        .set_allowed_types("number_formatter_pattern", &[Null, Str])
        .set_normalizer("number_formatter_pattern", |res, value| {
            if value.is_null() && res.get("number_formatter_style")?.as_str() == Some("pattern") {
                return Err(constraint(
                    "When using \"number_formatter_style\" with a value of \"pattern\", you must provide a value for the \"number_formatter_pattern\" option!",
                ));
            }
            Ok(value)
        })
        .set_default("number_formatter_locale", Value::Null)
        .set_allowed_types("number_formatter_locale", &[Null, Str])
        .set_normalizer("number_formatter_locale", |_, value| {
            Ok(if value.is_null() { OptionValue::from("en") } else { value })
        })
        .set_default("number_formatter_currency", "EUR")
        .set_allowed_types(
            "number_formatter_currency",
            &[Null, Str, OptionType::Callback(CallbackKind::Value)],
        )
        .set_normalizer("number_formatter_currency", |res, value| {
            if value.is_null() && res.get("number_formatter_style")?.as_str() == Some("currency") {
                return Err(constraint(
                    "When using \"number_formatter_style\" with a value of \"currency\", you must provide a value for the \"number_formatter_currency\" option!",
                ));
            }
            Ok(value)
        });
}

const DATE_STYLES: [&str; 5] = ["none", "short", "medium", "long", "full"];

fn configure_datetime(schema: &mut OptionsSchema) {
    schema
        .set_default("locale", Value::Null)
        .set_allowed_types("locale", &[Null, Str])
        .set_default("date_format", "medium")
        .set_allowed_values("date_format", AllowedValue::strings(&DATE_STYLES))
        .set_default("time_format", "medium")
        .set_allowed_values("time_format", AllowedValue::strings(&DATE_STYLES))
        .set_default("format", Value::Null)
        .set_allowed_types("format", &[Null, Str])
        .set_default("calendar", "gregorian")
        .set_allowed_values("calendar", AllowedValue::strings(&["gregorian", "traditional"]))
        .set_default(
            "order_client_delegate",
            Callback::client(|_, _, value, _, _| {
                parse_datetime(value).map_or(Value::Null, |dt| Value::from(dt.timestamp()))
            }),
        )
        .set_default(
            "search_client_delegate",
            Callback::client(|_, _, value, _, _| {
                parse_datetime(value).map_or(Value::Null, |dt| Value::String(dt.format("%d.%m.%Y").to_string()))
            }),
        );
}

const YES_NO_DISPLAY_TYPES: [&str; 4] = ["icon-only", "label-only", "icon-with-label", "icon-with-tooltip"];

fn configure_yes_no(schema: &mut OptionsSchema) {
    schema
        .set_default("yes_label", "datagrid.column_types.yes_no.yes")
        .set_allowed_types("yes_label", &[Null, Str])
        .set_default("no_label", "datagrid.column_types.yes_no.no")
        .set_allowed_types("no_label", &[Null, Str])
        .set_default("yes_icon", "fa fa-fw fa-check")
        .set_allowed_types("yes_icon", &[Null, Str])
        .set_default("no_icon", "fa fa-fw fa-times")
        .set_allowed_types("no_icon", &[Null, Str])
        .set_default("display_type", "icon-with-tooltip")
        .set_allowed_values("display_type", AllowedValue::strings(&YES_NO_DISPLAY_TYPES))
        .set_normalizer("display_type", |res, value| {
            let display = value.as_str().unwrap_or_default().to_string();
            let needs_icons = display != "label-only";
            let needs_labels = display != "icon-only";
            if needs_icons && (res.get("yes_icon")?.is_null() || res.get("no_icon")?.is_null()) {
                return Err(constraint(format!(
                    "When using \"display_type\" with a value of \"{display}\" you must set \"yes_icon\" and \"no_icon\"!"
                )));
            }
            if needs_labels && (res.get("yes_label")?.is_null() || res.get("no_label")?.is_null()) {
                return Err(constraint(format!(
                    "When using \"display_type\" with a value of \"{display}\" you must set \"yes_label\" and \"no_label\"!"
                )));
            }
            Ok(value)
        })
        .set_default("label_translation_domain", TRANSLATION_DOMAIN)
        .set_allowed_types("label_translation_domain", &[Null, Str, Bool])
        .set_default("js_column_template", "datagrid/column/yesno.js.twig");
}

fn count_value(item: &Value, path: &str, _options: &ResolvedOptions) -> Value {
    let count = match try_get_property(item, path) {
        Some(Value::Array(items)) => items.len(),
        Some(Value::Object(map)) => map.len(),
        Some(Value::Null) | None => 0,
        Some(_) => 1,
    };
    Value::from(count)
}

// ============================================================================
// Rendered types
// ============================================================================

/// Base context of templated cells: `additionalContext` overlaid with the
/// item, path, mapped value and options.
fn templated_context(item: &Value, path: &str, options: &ResolvedOptions, table_options: &Value) -> Map<String, Value> {
    let mut context = match options.json("additionalContext") {
        Value::Object(extra) => extra.clone(),
        _ => Map::new(),
    };
    let value = if options.is_true("mapped") {
        try_get_property(item, path).unwrap_or(Value::Null)
    } else {
        Value::Null
    };
    context.insert("item".into(), item.clone());
    context.insert("path".into(), Value::String(path.to_string()));
    context.insert("value".into(), value);
    context.insert("options".into(), options.to_json());
    context.insert("tableOptions".into(), table_options.clone());
    context
}

fn render_cell(source: &str, path: &str, context: Map<String, Value>) -> Value {
    match template::render_str(source, Value::Object(context)) {
        Ok(html) => Value::String(html.trim().to_string()),
        Err(err) => {
            tracing::warn!(path, error = %err, "column template failed to render");
            Value::Null
        }
    }
}

fn configure_templated(schema: &mut OptionsSchema, ctx: &ColumnContext<'_>) {
    let table_options = Arc::new(ctx.table_options.to_json());
    schema
        .define("template")
        .set_required(&["template"])
        .set_allowed_types("template", &[Str])
        .set_default("mapped", false)
        .set_allowed_types("mapped", &[Bool])
        .set_default("additionalContext", json!({}))
        .set_allowed_types("additionalContext", &[Array])
        .set_default(
            "value_delegate",
            Callback::value(move |item, path, options| {
                let context = templated_context(item, path, options, &table_options);
                render_cell(options.str("template").unwrap_or_default(), path, context)
            }),
        );
}

fn configure_select_column(schema: &mut OptionsSchema, ctx: &ColumnContext<'_>) {
    let table_options = Arc::new(ctx.table_options.to_json());
    schema
        .set_default("multiple", true)
        .set_allowed_values("multiple", [AllowedValue::from(true), AllowedValue::from(false)])
        .set_default("id_value", Value::Null)
        .set_allowed_types("id_value", &[Null, Str, OptionType::Callback(CallbackKind::Value)])
        .set_default("disabled", false)
        .set_allowed_types("disabled", &[Bool, OptionType::Callback(CallbackKind::Value)])
        .set_default("checked", false)
        .set_allowed_types("checked", &[Bool, OptionType::Callback(CallbackKind::Value)])
        .set_default("mapped", true)
        .set_default("template", SELECT_ROW)
        .define("form_id")
        .set_required(&["form_id"])
        .set_allowed_types("form_id", &[Str])
        .set_default("js_column_template", "datagrid/column/select_column.js.twig")
        .set_default(
            "value_delegate",
            Callback::value(move |item, path, options| {
                let mut context = templated_context(item, path, options, &table_options);
                let id = match options.get("id_value") {
                    Some(OptionValue::Callback(Callback::Value(f))) => f(item, path, options),
                    Some(OptionValue::Data(Value::String(id_path))) => {
                        try_get_property(item, id_path).unwrap_or(Value::Null)
                    }
                    _ => context.get("value").cloned().unwrap_or(Value::Null),
                };
                context.insert("id".into(), id);
                context.insert("form_id".into(), options.json("form_id").clone());
                context.insert("multiple".into(), options.json("multiple").clone());
                for flag in ["disabled", "checked"] {
                    let on = truthy(&option_or_delegate(options, flag, item, path));
                    context.insert(flag.into(), Value::Bool(on));
                }
                render_cell(options.str("template").unwrap_or_default(), path, context)
            }),
        );
}

fn configure_progress_bar(schema: &mut OptionsSchema) {
    let computed = OptionType::Callback(CallbackKind::Value);
    schema
        .set_default("min", 0)
        .set_allowed_types("min", &[Int, Float, computed])
        .set_default("max", 100)
        .set_allowed_types("max", &[Int, Float, computed])
        .set_default("progress", Value::Null)
        .set_allowed_types("progress", &[Null, Int, Float, computed])
        .set_default("additional_classes", Value::Null)
        .set_allowed_types("additional_classes", &[Null, Str, computed]);
    for (flag, default) in [("striped", false), ("animated", false), ("show_progress", true)] {
        schema.set_default(flag, default).set_allowed_types(flag, &[Bool, computed]);
    }
    schema.set_default("value_delegate", Callback::value(progress_bar_value));
}

fn progress_bar_value(item: &Value, path: &str, options: &ResolvedOptions) -> Value {
    let progress = if options.is_null("progress") {
        try_get_property(item, path).unwrap_or(Value::Null)
    } else {
        option_or_delegate(options, "progress", item, path)
    };
    let Some(progress) = as_number(&progress) else {
        return Value::Null;
    };
    let min = as_number(&option_or_delegate(options, "min", item, path)).unwrap_or(0.0);
    let max = as_number(&option_or_delegate(options, "max", item, path)).unwrap_or(100.0);
    let percent = if max > min {
        ((progress - min) / (max - min) * 100.0).clamp(0.0, 100.0).round() as i64
    } else {
        0
    };
    let flag = |name: &str| truthy(&option_or_delegate(options, name, item, path));
    let context = json!({
        "progress": progress,
        "min": min,
        "max": max,
        "percent": percent,
        "striped": flag("striped"),
        "animated": flag("animated"),
        "show_progress": flag("show_progress"),
        "additional_classes": option_or_delegate(options, "additional_classes", item, path),
    });
    match template::render_builtin(PROGRESS_BAR, context) {
        Ok(html) => Value::String(html),
        Err(err) => {
            tracing::warn!(path, error = %err, "progress bar failed to render");
            Value::Null
        }
    }
}

fn configure_child_row_trigger(schema: &mut OptionsSchema) {
    schema
        .set_default("width", "16px")
        .set_default("details_trigger_selector", ".table-childrow-expander")
        .set_required(&["details_trigger_selector"])
        .set_allowed_types("details_trigger_selector", &[Str])
        .set_default("label", Value::Null)
        .set_default("toggleable", false)
        .set_default("toggle_visible", false);
    for name in ["searchable", "orderable", "filterable"] {
        schema.set_default(name, false).set_allowed_values(name, [AllowedValue::from(false)]);
    }
    for name in ["search_server_delegate", "order_server_delegate", "filter_server_delegate"] {
        schema.set_default(name, Value::Null).set_allowed_types(name, &[Null]);
    }
}

fn configure_async_child_row_trigger(schema: &mut OptionsSchema, ctx: &ColumnContext<'_>) {
    let generator = ctx.registry.shared_url_generator();
    schema
        .set_default("child_container_template", ASYNC_CHILD_ROW)
        .set_allowed_types("child_container_template", &[Str])
        .define("detail_route")
        .set_required(&["detail_route"])
        .set_allowed_types("detail_route", &[Str, Array, OptionType::Callback(CallbackKind::Value)])
        .set_normalizer("detail_route", |_, value| {
            normalize_route_map(
                value,
                "If an array is provided for the \"detail_route\" option, the key \"route\" must be present and not empty!",
            )
        })
        .set_default("refresh", false)
        .set_allowed_types("refresh", &[Bool, OptionType::Callback(CallbackKind::Value)])
        .set_default("trigger_visible", true)
        .set_allowed_types("trigger_visible", &[Bool, OptionType::Callback(CallbackKind::Value)])
        .set_default(
            "value_delegate",
            Callback::value(move |item, path, options| async_child_row_value(item, path, options, generator.as_deref())),
        );
}

fn async_child_row_value(
    item: &Value,
    path: &str,
    options: &ResolvedOptions,
    generator: Option<&dyn UrlGenerator>,
) -> Value {
    let url = match options.get("detail_route") {
        Some(OptionValue::Callback(Callback::Value(f))) => text(&f(item, path, options)),
        Some(OptionValue::Data(Value::String(url))) => url.clone(),
        Some(definition) => definition
            .as_options()
            .and_then(|definition| route_url(&definition, item, generator))
            .unwrap_or_default(),
        None => String::new(),
    };
    if url.is_empty() {
        return Value::Null;
    }
    let mut context = Map::new();
    context.insert("item".into(), item.clone());
    context.insert("path".into(), Value::String(path.to_string()));
    context.insert("url".into(), Value::String(url));
    context.insert("refresh".into(), Value::Bool(truthy(&option_or_delegate(options, "refresh", item, path))));
    context.insert(
        "visible".into(),
        Value::Bool(truthy(&option_or_delegate(options, "trigger_visible", item, path))),
    );
    render_cell(options.str("child_container_template").unwrap_or(ASYNC_CHILD_ROW), path, context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Options;
    use crate::registry::Registry;

    fn resolve(name: &str, input: Options) -> Result<ResolvedOptions, ConfigurationError> {
        let registry = Registry::new();
        let table = ResolvedOptions::default().with("column_groups", json!({"meta": {"label": "Meta"}}));
        let ctx = ColumnContext {
            table_options: &table,
            registry: &registry,
        };
        let chain = registry.column_chain(name).unwrap();
        chain.resolve_options(|ty, schema| ty.configure_options(schema, &ctx), input)
    }

    #[test]
    fn root_defaults() {
        let options = resolve("column", Options::new()).unwrap();
        assert_eq!(options.json("orderSequence"), &json!(["asc", "desc", ""]));
        assert!(options.is_null("filter_type"));
        assert_eq!(options.json("searchable"), &json!(true));
    }

    #[test]
    fn filterable_columns_default_to_text_filters() {
        let options = resolve("string", Options::new().set("filterable", true)).unwrap();
        assert_eq!(options.str("filter_type"), Some("text"));
    }

    #[test]
    fn filter_type_requires_filterable() {
        let err = resolve("column", Options::new().set("filter_type", "select")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "When using \"filter_type\" with a value of \"select\" you must set \"filterable\" to true!"
        );
    }

    #[test]
    fn route_arrays_need_a_route() {
        let err = resolve("column", Options::new().set("route", json!({"route_params": {}}))).unwrap_err();
        assert!(err.to_string().starts_with("When using \"route\" option with an array value"));

        let options = resolve("column", Options::new().set("route", json!({"route": "user_show"}))).unwrap();
        assert_eq!(options.json("route"), &json!({"route": "user_show", "route_params": {}}));
    }

    #[test]
    fn width_accepts_css_lengths() {
        assert!(resolve("column", Options::new().set("width", "12.5em")).is_ok());
        assert!(resolve("column", Options::new().set("width", 40)).is_ok());
        assert!(resolve("column", Options::new().set("width", "wide")).is_err());
    }

    #[test]
    fn column_group_must_exist() {
        assert!(resolve("column", Options::new().set("column_group", "meta")).is_ok());
        assert!(resolve("column", Options::new().set("column_group", "other")).is_err());
    }

    #[test]
    fn position_values() {
        assert!(resolve("column", Options::new().set("position", "first")).is_ok());
        assert!(resolve("column", Options::new().set("position", json!({"after": "id"}))).is_ok());
        assert!(resolve("column", Options::new().set("position", "middle")).is_err());
        assert!(resolve("column", Options::new().set("position", json!({"beside": "id"}))).is_err());
    }

    #[test]
    fn currency_style_needs_a_currency() {
        let options = resolve("currency", Options::new()).unwrap();
        assert_eq!(options.str("number_formatter_style"), Some("currency"));
        assert_eq!(options.str("number_formatter_locale"), Some("en"));

        let err = resolve(
            "number_formatter",
            Options::new()
                .set("number_formatter_style", "currency")
                .set("number_formatter_currency", Value::Null),
        )
        .unwrap_err();
        assert!(err.to_string().contains("\"number_formatter_currency\""));
    }

    #[test]
    fn yes_no_display_needs_icons() {
        let err = resolve("yes_no", Options::new().set("yes_icon", Value::Null)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "When using \"display_type\" with a value of \"icon-with-tooltip\" you must set \"yes_icon\" and \"no_icon\"!"
        );
        assert!(resolve(
            "yes_no",
            Options::new().set("yes_icon", Value::Null).set("display_type", "label-only")
        )
        .is_ok());
    }

    #[test]
    fn child_row_trigger_is_inert() {
        let err = resolve("child_row_trigger", Options::new().set("orderable", true)).unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidValue { .. }));
        let options = resolve("child_row_trigger", Options::new()).unwrap();
        assert_eq!(options.str("width"), Some("16px"));
        assert!(options.is_null("filter_type"));
    }

    #[test]
    fn templated_requires_template() {
        let err = resolve("templated", Options::new()).unwrap_err();
        assert_eq!(err.to_string(), "The required option \"template\" is missing.");
        assert!(resolve("font_awesome", Options::new()).is_ok());
    }

    #[test]
    fn select_column_requires_form() {
        let err = resolve("select_column", Options::new()).unwrap_err();
        assert_eq!(err.to_string(), "The required option \"form_id\" is missing.");
    }

    #[test]
    fn count_delegate_counts() {
        let item = json!({"tags": ["a", "b", "c"], "owner": null});
        let options = ResolvedOptions::default();
        assert_eq!(count_value(&item, "tags", &options), json!(3));
        assert_eq!(count_value(&item, "owner", &options), json!(0));
        assert_eq!(count_value(&item, "missing", &options), json!(0));
    }

    #[test]
    fn progress_bar_percent() {
        let options = resolve("progress_bar", Options::new().set("max", 200)).unwrap();
        let html = progress_bar_value(&json!({"done": 50}), "done", &options);
        assert!(html.as_str().unwrap().contains("width: 25%;"));
        assert_eq!(progress_bar_value(&json!({}), "done", &options), Value::Null);
    }

    #[test]
    fn async_child_row_without_url_renders_nothing() {
        let options = ResolvedOptions::default().with("detail_route", "");
        assert_eq!(async_child_row_value(&json!({}), "id", &options, None), Value::Null);

        let options = ResolvedOptions::default()
            .with("detail_route", json!({"route": "user_detail", "route_params": {"id": "id"}}))
            .with("refresh", false)
            .with("trigger_visible", true)
            .with("child_container_template", ASYNC_CHILD_ROW);
        let html = async_child_row_value(&json!({"id": 4}), "id", &options, None);
        assert_eq!(
            html,
            json!("<span class=\"table-childrow-expander async-childrow\" data-url=\"user_detail\" data-refresh=\"false\"></span>")
        );
    }

    #[test]
    fn async_child_row_renders_refresh_as_lowercase_flag() {
        let options = ResolvedOptions::default()
            .with("detail_route", "/users/4")
            .with("refresh", true)
            .with("trigger_visible", false)
            .with("child_container_template", ASYNC_CHILD_ROW);
        let html = async_child_row_value(&json!({"id": 4}), "id", &options, None);
        let html = html.as_str().unwrap();
        assert!(html.contains("data-refresh=\"true\""), "{html}");
        assert!(html.contains("style=\"display: none;\""), "{html}");
        assert!(!html.contains("True"), "{html}");
    }
}
