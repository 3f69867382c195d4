//! The built-in filter type catalog.

use datagrid_query::{loose_eq, Dir, Expr, QueryBuilder, Selection};
use serde_json::{json, Map, Value};

use super::engine::{self, escape_class_name, unescape_class_name};
use super::{FilterContext, FilterType, FilterValue, FilterView, FilterViewContext};
use crate::error::{ConfigurationError, Result};
use crate::hierarchy::HierarchicalType;
use crate::options::{AllowedValue, Callback, CallbackKind, OptionType, OptionValue, OptionsSchema, ResolvedOptions};
use crate::transform::{format_datetime, parse_datetime, text};
use crate::TRANSLATION_DOMAIN;

use OptionType::{Array, Bool, Float, Int, Null, String as Str};

const DATE_STYLES: [&str; 5] = ["none", "short", "medium", "long", "full"];

/// Filter types shipped with the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinFilterType {
    /// Root of the family.
    Filter,
    Text,
    AutoComplete,
    Select,
    ClassSelect,
    DateSelect,
    YesNoSelect,
    Range,
    NumberInputRange,
    DateRange,
}

impl BuiltinFilterType {
    pub const ALL: [BuiltinFilterType; 10] = [
        BuiltinFilterType::Filter,
        BuiltinFilterType::Text,
        BuiltinFilterType::AutoComplete,
        BuiltinFilterType::Select,
        BuiltinFilterType::ClassSelect,
        BuiltinFilterType::DateSelect,
        BuiltinFilterType::YesNoSelect,
        BuiltinFilterType::Range,
        BuiltinFilterType::NumberInputRange,
        BuiltinFilterType::DateRange,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BuiltinFilterType::Filter => "filter",
            BuiltinFilterType::Text => "text",
            BuiltinFilterType::AutoComplete => "auto_complete",
            BuiltinFilterType::Select => "select",
            BuiltinFilterType::ClassSelect => "class_select",
            BuiltinFilterType::DateSelect => "date_select",
            BuiltinFilterType::YesNoSelect => "yes_no_select",
            BuiltinFilterType::Range => "range",
            BuiltinFilterType::NumberInputRange => "number_input_range",
            BuiltinFilterType::DateRange => "date_range",
        }
    }
}

impl HierarchicalType for BuiltinFilterType {
    fn name(&self) -> &str {
        self.as_str()
    }

    fn parent(&self) -> Option<&str> {
        match self {
            BuiltinFilterType::Filter => None,
            BuiltinFilterType::Select | BuiltinFilterType::Range | BuiltinFilterType::NumberInputRange => {
                Some("auto_complete")
            }
            BuiltinFilterType::ClassSelect | BuiltinFilterType::DateSelect | BuiltinFilterType::YesNoSelect => {
                Some("select")
            }
            _ => Some("filter"),
        }
    }
}

impl FilterType for BuiltinFilterType {
    fn configure_options(&self, schema: &mut OptionsSchema, _ctx: &FilterContext<'_>) {
        match self {
            BuiltinFilterType::Filter => configure_filter(schema),
            BuiltinFilterType::Text => configure_text(schema),
            BuiltinFilterType::AutoComplete => configure_auto_complete(schema),
            BuiltinFilterType::Select => configure_select(schema),
            BuiltinFilterType::ClassSelect => configure_class_select(schema),
            BuiltinFilterType::DateSelect => configure_date_select(schema),
            BuiltinFilterType::YesNoSelect => configure_yes_no_select(schema),
            BuiltinFilterType::Range => configure_range(schema),
            BuiltinFilterType::NumberInputRange => configure_number_input_range(schema),
            BuiltinFilterType::DateRange => configure_date_range(schema),
        }
    }

    fn build_view(&self, view: &mut FilterView, options: &ResolvedOptions, ctx: &FilterViewContext<'_>) -> Result<()> {
        match self {
            BuiltinFilterType::Filter => {
                view.template = options.str("jsTemplate").unwrap_or_default().to_string();
                copy_vars(
                    view,
                    options,
                    &[
                        "type",
                        "translation_domain",
                        "filter_default_label",
                        "filter_reset_button_text",
                        "filter_container_selector",
                        "filter_container_class",
                        "filter_container_id",
                        "filter_plugin_options",
                        "column_data_type",
                        "text_data_delimiter",
                        "html_data_type",
                        "html_data_selector",
                        "html5_data",
                        "sort_as",
                        "sort_as_custom_func",
                        "sort_order",
                        "filter_match_mode",
                        "reset_button_style_class",
                        "pre_filtered_value",
                        "highlight_mode",
                        "auto_focus",
                    ],
                );
            }
            BuiltinFilterType::Text => copy_vars(
                view,
                options,
                &["exclude", "exclude_label", "case_insensitive", "filter_delay", "style_class"],
            ),
            BuiltinFilterType::AutoComplete => {
                let data = auto_complete_data(options, ctx)?;
                view.set_var("data", data);
            }
            BuiltinFilterType::Select => copy_vars(view, options, &["select_type", "style_class", "select_type_options"]),
            BuiltinFilterType::Range => {
                let stats = range_statistics(ctx, options.is_true("treat_null_as_zero"), true)?;
                let mut data = stats.unwrap_or_default();
                view.merge_vars(data.clone());
                data.insert("step".into(), options.json("step").clone());
                data.insert("options".into(), options.json("plugin_options").clone());
                view.set_var("data", data);
                view.set_var("style_class", options.json("style_class").clone());
                view.set_var("highlight_mode", "manual");
            }
            BuiltinFilterType::NumberInputRange => {
                let data = range_statistics(ctx, true, false)?.unwrap_or_default();
                view.merge_vars(data.clone());
                view.set_var("data", data);
                view.set_var("highlight_mode", "manual");
            }
            BuiltinFilterType::DateRange => {
                view.set_var("highlight_mode", "manual");
                view.set_var("date_format", options.json("date_format").clone());
            }
            BuiltinFilterType::ClassSelect | BuiltinFilterType::DateSelect | BuiltinFilterType::YesNoSelect => {}
        }
        Ok(())
    }

    fn apply_filter(
        &self,
        query: &mut QueryBuilder,
        value: &FilterValue,
        multi: bool,
        binding: &str,
        query_path: &str,
        options: &ResolvedOptions,
        _root_alias: &str,
    ) -> Option<Expr> {
        match self {
            BuiltinFilterType::Select | BuiltinFilterType::YesNoSelect => {
                engine::apply_select(query, value, multi, binding, query_path, options)
            }
            BuiltinFilterType::ClassSelect => engine::apply_class_select(query, value, multi, binding, query_path, options),
            BuiltinFilterType::DateSelect => engine::apply_date_select(query, value, multi, binding, query_path, options),
            BuiltinFilterType::Range => {
                let coalesce = options.is_true("treat_null_as_zero");
                engine::apply_number_range(query, value, binding, query_path, coalesce)
            }
            BuiltinFilterType::NumberInputRange => engine::apply_number_range(query, value, binding, query_path, true),
            BuiltinFilterType::DateRange => engine::apply_date_range(query, value, binding, query_path, options),
            BuiltinFilterType::Filter | BuiltinFilterType::Text | BuiltinFilterType::AutoComplete => {
                engine::apply_match(query, value, multi, binding, query_path, options)
            }
        }
    }
}

fn constraint(message: impl Into<String>) -> ConfigurationError {
    ConfigurationError::Constraint(message.into())
}

fn copy_vars(view: &mut FilterView, options: &ResolvedOptions, names: &[&str]) {
    for name in names {
        let value = options.get(name).map(OptionValue::to_json).unwrap_or(Value::Null);
        view.set_var(*name, value);
    }
}

fn nullable_strings(values: &[&str]) -> Vec<AllowedValue> {
    let mut allowed = vec![AllowedValue::null()];
    allowed.extend(AllowedValue::strings(values));
    allowed
}

fn false_or_string() -> AllowedValue {
    AllowedValue::predicate(|value| value.as_bool() == Some(false) || value.as_str().is_some())
}

// ============================================================================
// Root
// ============================================================================

fn configure_filter(schema: &mut OptionsSchema) {
    schema
        .set_default("type", "text")
        .set_required(&["type"])
        .set_allowed_values(
            "type",
            AllowedValue::strings(&[
                "text",
                "select",
                "multi_select",
                "auto_complete",
                "date",
                "range_number",
                "range_number_slider",
                "range_date",
                "custom_func",
                "multi_select_custom_func",
            ]),
        )
        .set_default("jsTemplate", "datagrid/filter/filter.json.twig")
        .set_required(&["jsTemplate"])
        .set_allowed_types("jsTemplate", &[Str])
        .set_default("filter_server_delegate", Value::Null)
        .set_allowed_types("filter_server_delegate", &[Null, OptionType::Callback(CallbackKind::FilterServer)])
        .set_default("translation_domain", TRANSLATION_DOMAIN)
        .set_allowed_types("translation_domain", &[Str, Null, Bool])
        .set_default("filter_default_label", "datagrid.filter.placeholder.input")
        .set_allowed_types("filter_default_label", &[Str, Null])
        .set_default("filter_reset_button_text", "datagrid.filter.reset")
        .set_allowed_values(
            "filter_reset_button_text",
            [AllowedValue::predicate(|value| {
                value.is_null() || value.as_str().is_some() || value.as_bool() == Some(false)
            })],
        );

    for name in ["filter_container_selector", "filter_container_class", "filter_container_id", "text_data_delimiter"] {
        schema.set_default(name, Value::Null).set_allowed_types(name, &[Null, Str]);
    }

    schema
        .set_default("filter_plugin_options", Value::Null)
        .set_allowed_types("filter_plugin_options", &[Null, Array])
        .set_default("column_data_type", Value::Null)
        .set_allowed_values("column_data_type", nullable_strings(&["text", "html", "rendered_html"]))
        .set_lazy_default("html_data_type", |res| {
            Ok(if res.get("column_data_type")?.as_str() == Some("html") {
                OptionValue::from("text")
            } else {
                OptionValue::null()
            })
        })
        .set_allowed_values("html_data_type", nullable_strings(&["text", "value", "id", "selector"]))
        .set_default("filter_validate_empty", true)
        .set_allowed_types("filter_validate_empty", &[Bool])
        .set_default("filter_validation_delegate", Value::Null)
        .set_allowed_types(
            "filter_validation_delegate",
            &[Null, OptionType::Callback(CallbackKind::FilterValidation)],
        )
        .set_default("html_data_selector", Value::Null)
        .set_allowed_types("html_data_selector", &[Str, Null])
        .set_normalizer("html_data_selector", |res, value| {
            if res.get("html_data_type")?.as_str() != Some("selector") {
                return Ok(OptionValue::null());
            }
            if value.as_str().map_or(true, str::is_empty) {
                return Err(constraint(
                    "When using \"html_data_type\" with a value of \"selector\" you must provide a string for \"html_data_selector\" option, but null / empty string given!",
                ));
            }
            Ok(value)
        })
        .set_default("html5_data", Value::Null)
        .set_allowed_values(
            "html5_data",
            nullable_strings(&["data-filter", "data-order", "data-search", "data-sort"]),
        )
        .set_default("sort_as", Value::Null)
        .set_allowed_values("sort_as", nullable_strings(&["alpha", "num", "alphaNum", "none", "custom"]))
        .set_default("sort_as_custom_func", Value::Null)
        .set_allowed_types("sort_as_custom_func", &[Str, Null])
        .set_normalizer("sort_as_custom_func", |res, value| {
            if res.get("sort_as")?.as_str() != Some("custom") {
                return Ok(OptionValue::null());
            }
            if value.as_str().map_or(true, str::is_empty) {
                return Err(constraint(
                    "When using \"sort_as\" with a value of \"custom\" you must provide a string for \"sort_as_custom_func\" option, but null / empty string given!",
                ));
            }
            Ok(value)
        })
        .set_default("sort_order", Value::Null)
        .set_allowed_values("sort_order", nullable_strings(&["asc", "desc"]))
        .set_default("filter_match_mode", Value::Null)
        .set_allowed_values(
            "filter_match_mode",
            nullable_strings(&["contains", "exact", "starts_with", "regex"]),
        )
        .set_default("reset_button_style_class", "btn btn-default")
        .set_allowed_types("reset_button_style_class", &[Null, Str])
        .set_default("pre_filtered_value", Value::Null)
        .set_default("auto_focus", true)
        .set_allowed_types("auto_focus", &[Bool])
        .set_default("highlight_mode", "auto")
        .set_allowed_values("highlight_mode", AllowedValue::strings(&["auto", "manual"]));
}

fn configure_text(schema: &mut OptionsSchema) {
    schema
        .set_default("jsTemplate", "datagrid/filter/text.json.twig")
        .set_default("exclude", false)
        .set_allowed_types("exclude", &[Bool])
        .set_default("exclude_label", Value::Null)
        .set_allowed_types("exclude_label", &[Null, Str])
        .set_default("case_insensitive", Value::Null)
        .set_allowed_types("case_insensitive", &[Null, Bool])
        .set_default("filter_delay", Value::Null)
        .set_allowed_types("filter_delay", &[Null, Int])
        .set_default("style_class", "form-control")
        .set_allowed_types("style_class", &[Null, Str]);
}

// ============================================================================
// Value lists
// ============================================================================

fn configure_auto_complete(schema: &mut OptionsSchema) {
    schema
        .set_default("jsTemplate", "datagrid/filter/autocomplete.json.twig")
        .set_default("type", "auto_complete")
        .set_default("data", true)
        .set_allowed_types("data", &[Null, Array, Bool, OptionType::Callback(CallbackKind::FilterData)])
        .set_default("allow_null_value", false)
        .set_allowed_types("allow_null_value", &[Bool])
        .set_default("null_value", Value::Null)
        .set_normalizer("null_value", |res, value| {
            if value.is_null() && res.get("allow_null_value")?.as_bool() == Some(true) {
                return Err(constraint(
                    "When setting \"allow_null_value\" to true, you must provide a non-null value for the \"null_value\" option!",
                ));
            }
            Ok(value)
        })
        .set_default("null_label", Value::Null)
        .set_allowed_types("null_label", &[Null, Str])
        .set_default("null_label_translation_domain", false)
        .set_allowed_values("null_label_translation_domain", [false_or_string()]);

    for name in ["label_function", "value_function"] {
        schema
            .set_default(name, Value::Null)
            .set_allowed_types(name, &[Null, OptionType::Callback(CallbackKind::FilterLabel)]);
    }

    schema.set_default("label_function_translation_domain", false).set_allowed_values(
        "label_function_translation_domain",
        [
            false_or_string(),
            AllowedValue::predicate(|value| {
                value.as_callback().is_some_and(|cb| cb.kind() == CallbackKind::FilterLabel)
            }),
        ],
    );
}

/// Distinct values of the filtered path, or the configured `data`.
///
/// Each raw value passes through `value_function`; labels come from
/// `null_label` or `label_function`, translated when a domain is set.
fn auto_complete_data(options: &ResolvedOptions, ctx: &FilterViewContext<'_>) -> Result<Value> {
    let raw: Value = match options.get("data") {
        Some(OptionValue::Data(Value::Bool(true))) => match ctx.snapshot {
            Some(snapshot) => {
                let mut query = snapshot.fork();
                query
                    .select(Selection::field(ctx.query_path))
                    .distinct(true)
                    .group_by(ctx.query_path)
                    .order_by(ctx.query_path, Dir::Asc);
                let rows = snapshot.backend().scalar(&query)?;
                let allow_null = options.is_true("allow_null_value");
                let null_value = options.json("null_value");
                let values = rows
                    .into_iter()
                    .filter_map(|row| {
                        let value = row.into_iter().next().map(|(_, v)| v).unwrap_or(Value::Null);
                        match (value.is_null(), allow_null) {
                            (true, true) => Some(null_value.clone()),
                            (true, false) => None,
                            _ => Some(value),
                        }
                    })
                    .collect();
                Value::Array(values)
            }
            None => Value::Bool(true),
        },
        Some(OptionValue::Callback(Callback::FilterData(data))) => match ctx.snapshot {
            Some(snapshot) => Value::Array(data(snapshot, ctx.query_path, ctx.root_alias, options)?),
            None => Value::Null,
        },
        Some(other) => other.to_json(),
        None => Value::Null,
    };

    let items: Vec<Value> = match &raw {
        Value::Array(items) => items.clone(),
        Value::Object(map) => map.values().cloned().collect(),
        _ => return Ok(raw),
    };
    if items.is_empty() {
        return Ok(raw);
    }

    let value_function = match options.callback("value_function") {
        Some(Callback::FilterLabel(f)) => Some(f.clone()),
        _ => None,
    };
    let label_function = match options.callback("label_function") {
        Some(Callback::FilterLabel(f)) => Some(f.clone()),
        _ => None,
    };
    let label_domain = options.get("label_function_translation_domain");
    let null_domain = options.json("null_label_translation_domain");
    let allow_null = options.is_true("allow_null_value");
    let null_value = options.json("null_value");
    let translator = ctx.registry.translator();

    let mut data = Vec::with_capacity(items.len());
    for raw_item in items {
        let parsed = value_function
            .as_ref()
            .map(|f| f(&raw_item, &raw_item, options))
            .filter(|v| !v.is_null())
            .unwrap_or_else(|| raw_item.clone());

        let label = match (options.str("null_label"), &label_function) {
            (Some(null_label), _) if allow_null && &parsed == null_value => match null_domain.as_str() {
                Some(domain) => Value::String(translator.trans(null_label, Some(domain))),
                _ => Value::String(null_label.to_string()),
            },
            (_, Some(label_fn)) => {
                let label = label_fn(&parsed, &raw_item, options);
                let domain = match label_domain {
                    Some(OptionValue::Callback(Callback::FilterLabel(f))) => f(&parsed, &raw_item, options),
                    Some(other) => other.to_json(),
                    None => Value::Bool(false),
                };
                match domain.as_str() {
                    Some(domain) => Value::String(translator.trans(&text(&label), Some(domain))),
                    _ => label,
                }
            }
            _ => parsed.clone(),
        };
        data.push(json!({"value": parsed, "label": label}));
    }
    Ok(Value::Array(data))
}

fn configure_select(schema: &mut OptionsSchema) {
    schema
        .set_default("jsTemplate", "datagrid/filter/select.json.twig")
        .set_default("select_type", "select2")
        .set_allowed_values("select_type", nullable_strings(&["select2", "chosen"]))
        .set_default("select_type_options", Value::Null)
        .set_chained_default("select_type_options", |res, previous| {
            if previous.is_null() && res.get("select_type")?.as_str() == Some("select2") {
                return Ok(json!({"dropdownAutoWidth": true, "width": "100%"}).into());
            }
            Ok(previous)
        })
        .set_default("multiple", true)
        .set_allowed_types("multiple", &[Bool])
        .set_lazy_default("type", |res| {
            Ok(if res.get("multiple")?.as_bool() == Some(true) {
                "multi_select".into()
            } else {
                "select".into()
            })
        })
        .set_default("style_class", Value::Null)
        .set_allowed_types("style_class", &[Null, Str])
        .set_lazy_default("filter_default_label", |res| {
            Ok(if res.get("multiple")?.as_bool() == Some(true) {
                "datagrid.filter.placeholder.select_multiple".into()
            } else {
                "datagrid.filter.placeholder.select".into()
            })
        });
}

/// Short name of a namespaced class, e.g. `User` for `App\Entity\User`.
fn short_class_name(name: &str) -> &str {
    name.rsplit('\\').next().unwrap_or(name)
}

fn configure_class_select(schema: &mut OptionsSchema) {
    schema
        .set_default(
            "data",
            Callback::filter_data(|snapshot, query_path, _, _| {
                let mut query = snapshot.fork();
                query.select(Selection::field(query_path)).distinct(true);
                let mut names: Vec<String> = snapshot
                    .backend()
                    .scalar(&query)?
                    .into_iter()
                    .filter_map(|row| row.into_iter().next().and_then(|(_, v)| v.as_str().map(escape_class_name)))
                    .collect();
                names.sort_by(|a, b| {
                    short_class_name(&unescape_class_name(a)).cmp(short_class_name(&unescape_class_name(b)))
                });
                names.dedup();
                Ok(names.into_iter().map(Value::String).collect())
            }),
        )
        .set_default(
            "label_function",
            Callback::filter_label(|parsed, _, _| {
                Value::String(short_class_name(&unescape_class_name(&text(parsed))).to_string())
            }),
        );
}

fn configure_date_select(schema: &mut OptionsSchema) {
    let date_style = AllowedValue::predicate(|value| value.as_str().is_some_and(|s| DATE_STYLES.contains(&s)));
    schema
        .set_default(
            "value_function",
            Callback::filter_label(|raw, _, _| {
                parse_datetime(raw).map(|dt| json!(dt.timestamp())).unwrap_or(Value::Null)
            }),
        )
        .set_chained_default("label_function", |_, previous| {
            if previous.is_null() {
                return Ok(Callback::filter_label(|parsed, _, options| format_datetime(options, parsed)).into());
            }
            Ok(previous)
        })
        .set_default("time_format", "none")
        .set_allowed_values("time_format", [date_style.clone()])
        .set_default("date_format", "medium")
        .set_allowed_values("date_format", [date_style])
        .set_default("format", Value::Null)
        .set_allowed_types("format", &[Null, Str])
        .set_default("calendar", "gregorian")
        .set_allowed_values("calendar", AllowedValue::strings(&["gregorian", "traditional"]))
        .set_default("locale", Value::Null);
}

fn configure_yes_no_select(schema: &mut OptionsSchema) {
    schema
        .set_required(&["yes_value"])
        .set_chained_default("label_function", |_, previous| {
            if previous.is_null() {
                return Ok(Callback::filter_label(|parsed, _, options| {
                    if loose_eq(parsed, options.json("yes_value")) {
                        json!(format!("{TRANSLATION_DOMAIN}.column_types.yes_no.yes"))
                    } else {
                        json!(format!("{TRANSLATION_DOMAIN}.column_types.yes_no.no"))
                    }
                })
                .into());
            }
            Ok(previous)
        })
        .set_default("label_function_translation_domain", TRANSLATION_DOMAIN);
}

// ============================================================================
// Ranges
// ============================================================================

fn configure_range(schema: &mut OptionsSchema) {
    schema
        .set_default("jsTemplate", "datagrid/filter/range.json.twig")
        .set_default("type", "text")
        .set_default("style_class", "range_number_single_text_field range_filter")
        .set_default("treat_null_as_zero", false)
        .set_allowed_types("treat_null_as_zero", &[Bool])
        .set_default("step", 1)
        .set_allowed_types("step", &[Float, Int])
        .set_default("plugin_options", json!({}))
        .set_allowed_types("plugin_options", &[Array]);
}

fn configure_number_input_range(schema: &mut OptionsSchema) {
    schema
        .set_default("jsTemplate", "datagrid/filter/number_range_input.json.twig")
        .set_default("type", "range_number")
        .set_default(
            "filter_default_label",
            json!(["datagrid.filter.placeholder.from", "datagrid.filter.placeholder.to"]),
        )
        .set_allowed_types("filter_default_label", &[Array, Null]);
}

/// `fromValue`/`toValue` bounds of the filtered path from a forked query.
fn range_statistics(
    ctx: &FilterViewContext<'_>,
    zero_for_null: bool,
    reset_order: bool,
) -> Result<Option<Map<String, Value>>> {
    let Some(snapshot) = ctx.snapshot else {
        return Ok(None);
    };
    let mut query = snapshot.fork();
    query
        .select(Selection::min(ctx.query_path).alias("fromValue"))
        .add_select(Selection::max(ctx.query_path).alias("toValue"))
        .reset_group_by();
    if reset_order {
        query.reset_order_by();
    }
    let mut row = snapshot.backend().scalar(&query)?.into_iter().next().unwrap_or_default();
    if zero_for_null {
        for key in ["fromValue", "toValue"] {
            let value = row.entry(key).or_insert(Value::Null);
            if value.is_null() {
                *value = json!(0);
            }
        }
    }
    Ok(Some(row))
}

fn configure_date_range(schema: &mut OptionsSchema) {
    schema
        .set_default("jsTemplate", "datagrid/filter/date_range.json.twig")
        .set_default("type", "range_date")
        .set_lazy_default("filter_default_label", |res| {
            Ok(if res.get("type")?.as_str() == Some("range_date") {
                json!(["datagrid.filter.placeholder.from", "datagrid.filter.placeholder.to"]).into()
            } else {
                "datagrid.filter.placeholder.select_date".into()
            })
        })
        .set_allowed_types("filter_default_label", &[Array, Str, Null])
        .set_default("auto_focus", false)
        .set_default("date_format", "dd.mm.yyyy")
        .set_allowed_types("date_format", &[Str, Null])
        .set_default(
            "filter_plugin_options",
            json!({
                "autoclose": true,
                "calendarWeeks": true,
                "todayHighlight": true,
                "todayBtn": true,
                "language": "en",
            }),
        );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::QuerySnapshot;
    use crate::options::Options;
    use crate::registry::Registry;
    use datagrid_query::MemoryBackend;
    use std::sync::Arc;

    fn resolve(name: &str, input: Options) -> std::result::Result<ResolvedOptions, ConfigurationError> {
        let registry = Registry::new();
        let column = ResolvedOptions::default();
        let table = ResolvedOptions::default();
        let ctx = FilterContext {
            column_options: &column,
            table_options: &table,
            registry: &registry,
        };
        let chain = registry.filter_chain(name).unwrap();
        chain.resolve_options(|ty, schema| ty.configure_options(schema, &ctx), input)
    }

    fn view(name: &str, input: Options, snapshot: Option<&QuerySnapshot>) -> FilterView {
        let registry = Registry::new();
        let options = resolve(name, input).unwrap();
        let column = ResolvedOptions::default();
        let ctx = FilterViewContext {
            snapshot,
            query_path: "u.tag",
            root_alias: "u",
            column_options: &column,
            registry: &registry,
        };
        let mut view = FilterView::default();
        for ty in registry.filter_chain(name).unwrap().iter() {
            ty.build_view(&mut view, &options, &ctx).unwrap();
        }
        view
    }

    fn snapshot(rows: Vec<Value>) -> QuerySnapshot {
        QuerySnapshot::new(QueryBuilder::new("u"), Arc::new(MemoryBackend::new(rows)))
    }

    #[test]
    fn chains() {
        let registry = Registry::new();
        assert_eq!(
            registry.filter_chain("yes_no_select").unwrap().names(),
            vec!["filter", "auto_complete", "select", "yes_no_select"]
        );
        assert_eq!(registry.filter_chain("date_range").unwrap().names(), vec!["filter", "date_range"]);
    }

    #[test]
    fn root_defaults() {
        let options = resolve("text", Options::new()).unwrap();
        assert_eq!(options.str("type"), Some("text"));
        assert_eq!(options.str("jsTemplate"), Some("datagrid/filter/text.json.twig"));
        assert_eq!(options.bool("filter_validate_empty"), Some(true));
        assert!(options.is_null("html_data_type"));
    }

    #[test]
    fn html_selector_requires_a_selector() {
        let err = resolve("text", Options::new().set("html_data_type", "selector")).unwrap_err();
        assert!(err.to_string().contains("\"html_data_selector\""));

        let options = resolve("text", Options::new().set("column_data_type", "html")).unwrap();
        assert_eq!(options.str("html_data_type"), Some("text"));
    }

    #[test]
    fn select_type_follows_multiple() {
        let options = resolve("select", Options::new()).unwrap();
        assert_eq!(options.str("type"), Some("multi_select"));
        assert_eq!(options.json("select_type_options"), &json!({"dropdownAutoWidth": true, "width": "100%"}));

        let options = resolve("select", Options::new().set("multiple", false)).unwrap();
        assert_eq!(options.str("type"), Some("select"));
        assert_eq!(options.str("filter_default_label"), Some("datagrid.filter.placeholder.select"));
    }

    #[test]
    fn null_values_need_a_sentinel() {
        let err = resolve("select", Options::new().set("allow_null_value", true)).unwrap_err();
        assert!(err.to_string().starts_with("When setting \"allow_null_value\" to true"));
    }

    #[test]
    fn yes_no_requires_yes_value() {
        let err = resolve("yes_no_select", Options::new()).unwrap_err();
        assert_eq!(err.to_string(), "The required option \"yes_value\" is missing.");
    }

    #[test]
    fn auto_complete_collects_distinct_values() {
        let snap = snapshot(vec![json!({"tag": "b"}), json!({"tag": "a"}), json!({"tag": "b"}), json!({"tag": null})]);
        let view = view("auto_complete", Options::new(), Some(&snap));
        assert_eq!(
            view.var("data"),
            &json!([{"value": "a", "label": "a"}, {"value": "b", "label": "b"}])
        );
        assert_eq!(view.template, "datagrid/filter/autocomplete.json.twig");
    }

    #[test]
    fn null_values_get_a_label() {
        let snap = snapshot(vec![json!({"tag": "a"}), json!({"tag": null})]);
        let options = Options::new()
            .set("allow_null_value", true)
            .set("null_value", "__null__")
            .set("null_label", "None");
        let view = view("select", options, Some(&snap));
        assert_eq!(
            view.var("data"),
            &json!([{"value": "a", "label": "a"}, {"value": "__null__", "label": "None"}])
        );
    }

    #[test]
    fn yes_no_labels_are_translated() {
        let options = Options::new().set("yes_value", 1).set("data", json!([1, 0]));
        let view = view("yes_no_select", options, None);
        assert_eq!(
            view.var("data"),
            &json!([
                {"value": 1, "label": "datagrid.column_types.yes_no.yes"},
                {"value": 0, "label": "datagrid.column_types.yes_no.no"},
            ])
        );
    }

    #[test]
    fn data_without_backend_passes_through() {
        let view = view("auto_complete", Options::new(), None);
        assert_eq!(view.var("data"), &json!(true));
    }

    #[test]
    fn range_statistics_from_forked_query() {
        let snap = snapshot(vec![json!({"tag": 4}), json!({"tag": 9}), json!({"tag": null})]);
        let view = view("range", Options::new(), Some(&snap));
        assert_eq!(view.var("fromValue"), &json!(4));
        assert_eq!(view.var("toValue"), &json!(9));
        assert_eq!(view.var("data")["step"], json!(1));
        assert_eq!(view.var("highlight_mode"), "manual");
        assert!(snap.query().selections().is_empty());
    }

    #[test]
    fn number_input_range_defaults_to_zero() {
        let snap = snapshot(vec![json!({"tag": null})]);
        let view = view("number_input_range", Options::new(), Some(&snap));
        assert_eq!(view.var("data"), &json!({"fromValue": 0, "toValue": 0}));
    }

    #[test]
    fn class_select_labels_use_short_names() {
        let snap = snapshot(vec![json!({"tag": "App\\Entity\\User"}), json!({"tag": "App\\Entity\\Group"})]);
        let view = view("class_select", Options::new(), Some(&snap));
        assert_eq!(
            view.var("data"),
            &json!([
                {"value": "App-_-Entity-_-Group", "label": "Group"},
                {"value": "App-_-Entity-_-User", "label": "User"},
            ])
        );
    }

    #[test]
    fn date_select_labels_format_timestamps() {
        let options = Options::new().set("data", json!(["2024-03-05 10:00:00"]));
        let view = view("date_select", options, None);
        let entry = &view.var("data")[0];
        assert_eq!(entry["value"], json!(1709632800));
        assert_eq!(entry["label"], json!("Mar 5, 2024"));
    }

    #[test]
    fn date_range_label_depends_on_type() {
        let options = resolve("date_range", Options::new()).unwrap();
        assert!(options.json("filter_default_label").is_array());
        let options = resolve("date_range", Options::new().set("type", "date")).unwrap();
        assert_eq!(options.str("filter_default_label"), Some("datagrid.filter.placeholder.select_date"));
    }

    #[test]
    fn leaf_type_decides_the_expression() {
        let options = resolve("number_input_range", Options::new()).unwrap();
        let mut query = QueryBuilder::new("u");
        let expr = BuiltinFilterType::NumberInputRange
            .apply_filter(&mut query, &("10", "").into(), false, ":f", "u.age", &options, "u")
            .unwrap();
        assert_eq!(expr.to_string(), "COALESCE(u.age, 0) >= :f_from");
    }
}
