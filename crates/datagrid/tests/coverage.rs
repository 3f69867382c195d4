//! End-to-end tests covering tables through the public API.

use std::sync::Arc;

use datagrid::column::{ColumnContext, ColumnType};
use datagrid::filter::{FilterType, FilterValue};
use datagrid::table::{DataSource, Table, TableBuilder, TableRequest, TableType};
use datagrid::{
    Callback, ConfigurationError, DatagridConfig, DatagridError, HierarchicalType, Options, OptionsSchema,
    Registry, ResolvedOptions,
};
use datagrid_query::{Expr, MemoryBackend, OrderBy, QueryBuilder};
use serde_json::{json, Map, Value};

fn people() -> Vec<Value> {
    vec![
        json!({"id": 1, "name": "Ada", "age": 36, "email": "ada@example.com", "team": {"name": "core"}}),
        json!({"id": 2, "name": "Grace", "age": 85, "email": "grace@example.com", "team": {"name": "ops"}}),
        json!({"id": 3, "name": "Linus", "age": null, "email": null, "team": {"name": "core"}}),
        json!({"id": 4, "name": "Barbara", "age": 52, "email": "barbara@example.com", "team": {"name": "infra"}}),
    ]
}

fn source() -> DataSource {
    DataSource::query(QueryBuilder::new("u"), MemoryBackend::new(people()))
}

fn server_options() -> Options {
    Options::new().set("ajax_url", "/people")
}

fn display(data: &Value, path: &str) -> Vec<Value> {
    data["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row[path]["display"].clone())
        .collect()
}

fn request(body: Value) -> TableRequest {
    TableRequest::from_value(&body)
}

// ============================================================================
// Custom types
// ============================================================================

struct PeopleTable;

impl HierarchicalType for PeopleTable {
    fn name(&self) -> &str {
        "people"
    }

    fn parent(&self) -> Option<&str> {
        Some("table")
    }
}

impl TableType for PeopleTable {
    fn configure_options(&self, schema: &mut OptionsSchema, _ctx: &datagrid::table::TableContext<'_>) {
        schema.set_default("ajax_url", "/people").set_default("pageLength", 2);
    }

    fn build_table(&self, builder: &mut TableBuilder, _options: &ResolvedOptions) -> datagrid::Result<()> {
        builder
            .add("name", "string", Options::new().set("filterable", true))?
            .add("email", "email", Options::new())?
            .add("team.name", "shouting", Options::new())?;
        Ok(())
    }
}

struct Shouting;

impl HierarchicalType for Shouting {
    fn name(&self) -> &str {
        "shouting"
    }

    fn parent(&self) -> Option<&str> {
        Some("string")
    }
}

impl ColumnType for Shouting {
    fn configure_options(&self, schema: &mut OptionsSchema, _ctx: &ColumnContext<'_>) {
        schema.set_default(
            "value_delegate",
            Callback::value(|item, path, _| {
                let text = datagrid::try_get_property(item, path)
                    .and_then(|v| v.as_str().map(str::to_uppercase))
                    .unwrap_or_default();
                json!(text)
            }),
        );
    }
}

struct Prefix;

impl HierarchicalType for Prefix {
    fn name(&self) -> &str {
        "prefix"
    }

    fn parent(&self) -> Option<&str> {
        Some("text")
    }
}

impl FilterType for Prefix {
    fn apply_filter(
        &self,
        query: &mut QueryBuilder,
        value: &FilterValue,
        _multi: bool,
        binding: &str,
        query_path: &str,
        _options: &ResolvedOptions,
        _root_alias: &str,
    ) -> Option<Expr> {
        query.set_parameter(binding, format!("{}%", value.as_str()?));
        Some(Expr::like(query_path, binding))
    }
}

fn registry() -> Arc<Registry> {
    let mut registry = Registry::new();
    registry
        .register_table_type(PeopleTable)
        .register_column_type(Shouting)
        .register_filter_type(Prefix);
    Arc::new(registry)
}

#[test]
fn custom_table_type_builds_its_columns() {
    let mut table = Table::new("people", source(), Options::new(), registry()).unwrap();
    assert_eq!(table.type_name(), "people");
    let paths: Vec<&str> = table.columns().iter().map(|c| c.path()).collect();
    assert_eq!(paths, vec!["name", "email", "team.name"]);
    assert_eq!(table.options().i64("pageLength"), Some(2));

    table.handle_request(request(json!({"draw": 1, "length": 2, "columns": [{"name": "name"}]})));
    let data = table.create_json_data(None).unwrap();
    assert_eq!(display(&data, "name"), vec![json!("Ada"), json!("Grace")]);
    assert_eq!(data["data"][0]["team"]["name"]["display"], "CORE");
}

#[test]
fn custom_filter_type_applies() {
    let mut table = Table::new("table", source(), server_options(), registry()).unwrap();
    table
        .add("name", "string", Options::new().set("filterable", true).set("filter_type", "prefix"))
        .unwrap();
    table.handle_request(request(json!({
        "columns": [{"name": "name", "search": {"value": "gr"}}],
    })));
    let data = table.create_json_data(None).unwrap();
    assert_eq!(display(&data, "name"), vec![json!("Grace")]);
}

#[test]
fn unknown_types_fail() {
    let err = Table::new("nope", source(), Options::new(), registry()).unwrap_err();
    assert_eq!(err.to_string(), "unknown table type 'nope'");

    let mut table = Table::new("table", source(), server_options(), registry()).unwrap();
    let err = table.add("x", "nope", Options::new()).unwrap_err();
    assert!(matches!(err, DatagridError::UnknownType { family: "column", .. }));
}

#[test]
fn invalid_table_options_fail() {
    let err = Table::new("table", source(), server_options().set("pagingType", "endless"), registry()).unwrap_err();
    assert!(matches!(err, DatagridError::Configuration(ConfigurationError::InvalidValue { .. })));

    let err = Table::new("table", source(), Options::new().set("nope", 1), registry()).unwrap_err();
    assert!(err.to_string().starts_with("The option \"nope\" does not exist."));
}

// ============================================================================
// Server-side delegates
// ============================================================================

#[test]
fn order_delegate_replaces_the_column_path() {
    let mut table = Table::new("table", source(), server_options(), registry()).unwrap();
    let by_age = Callback::order_server(|dir, _, _, _, alias| vec![OrderBy::new(format!("{alias}.age"), dir)]);
    table
        .add("name", "string", Options::new().set("order_server_delegate", by_age))
        .unwrap();
    table.handle_request(request(json!({
        "columns": [{"name": "name"}],
        "order": [{"column": 0, "dir": "asc"}],
    })));
    let data = table.create_json_data(None).unwrap();
    assert_eq!(
        display(&data, "name"),
        vec![json!("Ada"), json!("Barbara"), json!("Grace"), json!("Linus")]
    );
}

#[test]
fn unorderable_columns_are_ignored() {
    let options = server_options().set("default_order_property", "age");
    let mut table = Table::new("table", source(), options, registry()).unwrap();
    table.add("name", "string", Options::new().set("orderable", false)).unwrap();
    table.handle_request(request(json!({
        "columns": [{"name": "name"}],
        "order": [{"column": 0, "dir": "desc"}],
    })));
    let data = table.create_json_data(None).unwrap();
    // A directive was given, so the default order does not apply either.
    assert_eq!(
        display(&data, "name"),
        vec![json!("Ada"), json!("Grace"), json!("Linus"), json!("Barbara")]
    );

    table.handle_request(request(json!({"columns": [{"name": "name"}]})));
    let data = table.create_json_data(None).unwrap();
    assert_eq!(
        display(&data, "name"),
        vec![json!("Ada"), json!("Barbara"), json!("Grace"), json!("Linus")]
    );
}

#[test]
fn search_delegate_contributes_expressions() {
    let mut table = Table::new("table", source(), server_options(), registry()).unwrap();
    let exact = Callback::search_server(|query, binding, search, _, path| {
        query.set_parameter(binding, search.to_string());
        vec![Expr::eq(path, binding)]
    });
    table
        .add("name", "string", Options::new().set("search_server_delegate", exact))
        .unwrap()
        .add("email", "email", Options::new())
        .unwrap();
    table.handle_request(request(json!({
        "columns": [{"name": "name"}, {"name": "email"}],
        "search": {"value": "Ada"},
    })));
    let data = table.create_json_data(None).unwrap();
    assert_eq!(display(&data, "name"), vec![json!("Ada")]);

    table.handle_request(request(json!({
        "columns": [{"name": "name"}, {"name": "email"}],
        "search": {"value": "barbara@"},
    })));
    let data = table.create_json_data(None).unwrap();
    assert_eq!(display(&data, "name"), vec![json!("Barbara")]);
}

#[test]
fn filter_delegate_on_the_column() {
    let mut table = Table::new("table", source(), server_options(), registry()).unwrap();
    let missing = Callback::filter_server(|_, value, _, _, path, _, _| match value.as_str() {
        Some("none") => Some(Expr::is_null(path)),
        _ => None,
    });
    table
        .add(
            "name",
            "string",
            Options::new().set("filterable", true),
        )
        .unwrap()
        .add(
            "age",
            "integer",
            Options::new().set("filterable", true).set("filter_server_delegate", missing),
        )
        .unwrap();
    table.handle_request(request(json!({
        "columns": [{"name": "name"}, {"name": "age", "search": {"value": "none"}}],
    })));
    let data = table.create_json_data(None).unwrap();
    assert_eq!(display(&data, "name"), vec![json!("Linus")]);
}

#[test]
fn multi_value_select_filter() {
    let mut table = Table::new("table", source(), server_options(), registry()).unwrap();
    table
        .add(
            "team.name",
            "string",
            Options::new().set("filterable", true).set("filter_type", "select"),
        )
        .unwrap()
        .add("name", "string", Options::new())
        .unwrap();
    table.handle_request(request(json!({
        "columns": [{"name": "team.name", "search": {"value": "ops|infra", "regex": "true"}}],
    })));
    let data = table.create_json_data(None).unwrap();
    assert_eq!(display(&data, "name"), vec![json!("Grace"), json!("Barbara")]);
}

#[test]
fn requests_from_json_bodies() {
    let mut table = Table::new("people", source(), Options::new(), registry()).unwrap();
    let body = r#"{"draw": "4", "start": "2", "length": "2", "columns": [{"name": "name"}], "order": [{"column": "0", "dir": "desc"}]}"#;
    table.handle_request(TableRequest::from_json_str(body).unwrap());
    let data = table.create_json_data(None).unwrap();
    assert_eq!(data["drawId"], 4);
    assert_eq!(display(&data, "name"), vec![json!("Barbara"), json!("Ada")]);
}

// ============================================================================
// Views
// ============================================================================

#[test]
fn view_orders_columns_by_position() {
    let mut table = Table::new("table", source(), server_options(), registry()).unwrap();
    table
        .add("name", "string", Options::new())
        .unwrap()
        .add("email", "email", Options::new().set("position", json!({"before": "name"})))
        .unwrap()
        .add("age", "integer", Options::new().set("position", "last"))
        .unwrap()
        .add("id", "integer", Options::new())
        .unwrap();
    let view = table.create_view().unwrap();
    let paths: Vec<&str> = view.columns.iter().map(|c| c.path.as_str()).collect();
    assert_eq!(paths, vec!["email", "name", "id", "age"]);
    let table_paths: Vec<&str> = table.columns().iter().map(|c| c.path()).collect();
    assert_eq!(table_paths, paths);
}

#[test]
fn contradicting_positions_fail_the_view() {
    let mut table = Table::new("table", source(), server_options(), registry()).unwrap();
    table
        .add("a", "string", Options::new().set("position", json!({"before": "b"})))
        .unwrap()
        .add("b", "string", Options::new().set("position", json!({"before": "a"})))
        .unwrap();
    let err = table.create_view().unwrap_err();
    assert!(matches!(err, DatagridError::CircularOrdering { .. }));
}

#[test]
fn select_columns_enable_row_selection() {
    let mut table = Table::new("table", source(), server_options(), registry()).unwrap();
    table
        .add("id", "select_column", Options::new().set("form_id", "people"))
        .unwrap();
    let view = table.create_view().unwrap();
    assert_eq!(view.var("select"), &json!({"style": "api", "className": "selected"}));
}

#[test]
fn toggleable_columns_follow_groups() {
    let options = server_options().set("column_groups", json!({"contact": "Contact"}));
    let mut table = Table::new("table", source(), options, registry()).unwrap();
    table
        .add("name", "string", Options::new())
        .unwrap()
        .add("email", "email", Options::new().set("column_group", "contact"))
        .unwrap()
        .add("id", "integer", Options::new().set("toggle_visible", false))
        .unwrap();
    let view = table.create_view().unwrap();
    let groups = view.toggleable_columns();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].label, json!("Contact"));
    assert_eq!(groups[0].translation_domain, json!("messages"));
    assert_eq!(groups[0].columns[0].path, "email");
    assert_eq!(groups[1].label, Value::Null);
    assert_eq!(groups[1].columns.len(), 1);
}

#[test]
fn filter_containers_respect_explicit_targets() {
    let mut table = Table::new("table", source(), server_options(), registry()).unwrap();
    table
        .add("name", "string", Options::new().set("filterable", true))
        .unwrap()
        .add(
            "email",
            "email",
            Options::new()
                .set("filterable", true)
                .set("filter_options", json!({"filter_container_selector": "#mail"})),
        )
        .unwrap();
    let view = table.create_view().unwrap();
    let filters = view.filterable_columns();
    assert_eq!(filters.len(), 2);
    let first = filters[0].1.filter.as_ref().unwrap();
    assert_eq!(first.var("filter_container_id"), &json!(format!("{}_column_filter_0", view.id)));
    let second = filters[1].1.filter.as_ref().unwrap();
    assert!(second.var("filter_container_id").is_null());
    assert_eq!(second.var("filter_container_selector"), &json!("#mail"));
}

#[test]
fn version_hash_changes_with_columns() {
    let registry = registry();
    let hash = |paths: &[&str], modifier: Option<&str>| {
        let mut options = server_options();
        if let Some(modifier) = modifier {
            options = options.set("version_hash_modifier", modifier);
        }
        let mut table = Table::new("table", source(), options, registry.clone()).unwrap();
        for path in paths {
            table.add(path, "string", Options::new()).unwrap();
        }
        table.create_view().unwrap().var("version_hash").clone()
    };
    assert_eq!(hash(&["name"], None), hash(&["name"], None));
    assert_ne!(hash(&["name"], None), hash(&["name", "email"], None));
    assert_ne!(hash(&["name"], None), hash(&["name"], Some("v2")));

    let mut table = Table::new("table", source(), server_options().set("version_hash", "fixed"), registry).unwrap();
    assert_eq!(table.create_view().unwrap().var("version_hash"), &json!("fixed"));
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn search_delay_comes_from_configuration() {
    let config = DatagridConfig::from_yaml_str("search:\n  delay: 250\n").unwrap();
    let registry = Arc::new(Registry::new().with_config(config));
    let table = Table::new("table", source(), server_options(), registry.clone()).unwrap();
    assert_eq!(table.options().i64("search_delay"), Some(250));

    let table = Table::new("table", source(), server_options().set("search_delay", 10), registry).unwrap();
    assert_eq!(table.options().i64("search_delay"), Some(10));
}

#[test]
fn pre_populated_client_data() {
    let mut table = Table::new(
        "client_side_table",
        DataSource::rows(people()),
        Options::new().set("data", 3),
        registry(),
    )
    .unwrap();
    table.add("name", "string", Options::new()).unwrap();
    assert!(table.has_pre_populated_data());
    let data = table.pre_populated_data(None).unwrap().unwrap();
    assert_eq!(data["recordsTotal"], 4);
    assert_eq!(data["recordsFiltered"], 4);
    assert_eq!(display(&data, "name").len(), 3);

    let mut values = Map::new();
    values.insert("name".into(), json!("Ada"));
    table.add_filter(&values);
    assert!(table.column("name").unwrap().filter().is_none());
}
