use std::fmt;
use std::sync::Arc;

use datagrid_query::{Backend, Dir, Expr, MemoryBackend, OrderBy, QueryBuilder};
use serde_json::{json, Map, Value};

use super::{TableBuilder, TableContext, TableRequest, TableType, TableView};
use crate::column::Column;
use crate::error::{DatagridError, Result};
use crate::filter::{FilterValue, QuerySnapshot};
use crate::hierarchy::TypeChain;
use crate::options::{Callback, OptionValue, Options, ResolvedOptions};
use crate::orderer::ColumnOrderer;
use crate::property::{qualify, set_nested};
use crate::registry::Registry;

/// Where a table's rows come from.
#[derive(Clone, Default)]
pub enum DataSource {
    /// A base query and the backend that runs it.
    Query {
        query: QueryBuilder,
        backend: Arc<dyn Backend>,
    },
    /// No rows; data is supplied through the `data` option or not at all.
    #[default]
    None,
}

impl DataSource {
    pub fn query(query: QueryBuilder, backend: impl Backend + 'static) -> Self {
        DataSource::Query {
            query,
            backend: Arc::new(backend),
        }
    }

    /// Rows held in memory, queried without a root alias.
    pub fn rows(rows: Vec<Value>) -> Self {
        DataSource::query(QueryBuilder::new(""), MemoryBackend::new(rows))
    }

    fn into_snapshot(self) -> Option<QuerySnapshot> {
        match self {
            DataSource::Query { query, backend } => Some(QuerySnapshot::new(query, backend)),
            DataSource::None => None,
        }
    }
}

impl fmt::Debug for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Query { query, .. } => f.debug_struct("Query").field("query", query).finish_non_exhaustive(),
            DataSource::None => f.write_str("None"),
        }
    }
}

/// A table instance: resolved table options, its columns and the state of
/// one request.
pub struct Table {
    chain: TypeChain<dyn TableType>,
    options: Arc<ResolvedOptions>,
    builder: TableBuilder,
    snapshot: Option<QuerySnapshot>,
    request: Option<TableRequest>,
    total_results: Option<usize>,
}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("chain", &self.chain)
            .field("columns", &self.builder)
            .field("snapshot", &self.snapshot)
            .field("request", &self.request)
            .finish_non_exhaustive()
    }
}

impl Table {
    /// Resolves the options of `type_name` and lets every type of the chain
    /// add its columns, root first.
    ///
    /// An unset `search_delay` takes the configured default.
    pub fn new(type_name: &str, source: DataSource, options: Options, registry: Arc<Registry>) -> Result<Self> {
        let chain = registry.table_chain(type_name)?;
        let ctx = TableContext { registry: &registry };
        let mut resolved = chain.resolve_options(|ty, schema| ty.configure_options(schema, &ctx), options)?;
        if resolved.contains("search_delay") && resolved.is_null("search_delay") {
            resolved.set("search_delay", registry.config().search.delay);
        }
        let options = Arc::new(resolved);

        let snapshot = source.into_snapshot();
        let mut builder = TableBuilder::new(options.clone(), snapshot.clone(), registry.clone());
        for ty in chain.iter() {
            ty.build_table(&mut builder, &options)?;
        }

        tracing::debug!(table_type = type_name, columns = builder.len(), "table built");

        Ok(Table {
            chain,
            options,
            builder,
            snapshot,
            request: None,
            total_results: None,
        })
    }

    pub fn type_name(&self) -> &str {
        self.chain.leaf().name()
    }

    pub fn options(&self) -> &ResolvedOptions {
        &self.options
    }

    /// Root alias of the base query, empty without one.
    pub fn root_alias(&self) -> &str {
        self.snapshot.as_ref().map(QuerySnapshot::root_alias).unwrap_or("")
    }

    pub fn query(&self) -> Option<&QueryBuilder> {
        self.snapshot.as_ref().map(QuerySnapshot::query)
    }

    /// Adds a column after construction.
    pub fn add(&mut self, path: &str, type_name: &str, options: Options) -> Result<&mut Self> {
        self.builder.add(path, type_name, options)?;
        Ok(self)
    }

    pub fn builder_mut(&mut self) -> &mut TableBuilder {
        &mut self.builder
    }

    pub fn columns(&self) -> &[Column] {
        self.builder.columns()
    }

    pub fn column(&self, path: &str) -> Result<&Column> {
        self.builder.get(path)
    }

    /// Presets filter values by column path. Paths of columns without a
    /// filter are ignored.
    pub fn add_filter(&mut self, values: &Map<String, Value>) -> &mut Self {
        for column in self.builder.columns_mut() {
            if !column.is_filterable() {
                continue;
            }
            let Some(value) = values.get(column.path()).cloned() else {
                continue;
            };
            if let Some(filter) = column.filter_mut() {
                filter.set_pre_filtered_value(value);
            }
        }
        self
    }

    /// Captures a data request to answer with [`create_json_data`](Self::create_json_data).
    pub fn handle_request(&mut self, request: TableRequest) -> &mut Self {
        tracing::debug!(
            draw = request.draw,
            start = request.start,
            length = request.length,
            columns = request.columns.len(),
            "request handled"
        );
        self.request = Some(request);
        self
    }

    pub fn is_request_handled(&self) -> bool {
        self.request.is_some()
    }

    /// Number of rows of the unfiltered base query. Computed once.
    pub fn total_results(&mut self) -> Result<usize> {
        if let Some(total) = self.total_results {
            return Ok(total);
        }
        let total = match &self.snapshot {
            Some(snapshot) => {
                let mut count = snapshot.fork();
                count.reset_order_by();
                snapshot.backend().count(&count)?
            }
            None => 0,
        };
        self.total_results = Some(total);
        Ok(total)
    }

    /// Whether the view should embed initial rows.
    pub fn has_pre_populated_data(&self) -> bool {
        !self.options.is_null("data")
    }

    /// The initial rows embedded in the view, if the table has any.
    pub fn pre_populated_data(&mut self, server_side: Option<bool>) -> Result<Option<Value>> {
        if !self.has_pre_populated_data() {
            return Ok(None);
        }
        self.create_json_data(server_side).map(Some)
    }

    /// Builds the grid widget's data payload.
    ///
    /// `server_side` defaults to the `serverSide` option. Server-side
    /// payloads answer the handled request: ordering, global search,
    /// column filters and paging are applied to a copy of the base query.
    /// Client-side payloads carry the rows the `data` option asks for.
    pub fn create_json_data(&mut self, server_side: Option<bool>) -> Result<Value> {
        let server_side = server_side.unwrap_or_else(|| self.options.is_true("serverSide"));
        if server_side && self.request.is_none() {
            return Err(DatagridError::RequestNotHandled);
        }

        let total = self.total_results()?;
        let (items, filtered) = if server_side {
            self.server_items()?
        } else {
            (self.client_items()?, total)
        };

        let root_alias = self.root_alias().to_string();
        let options = self.options.clone();
        let data: Vec<Value> = items
            .iter()
            .map(|item| item_data(self.builder.columns_mut(), &options, item, &root_alias))
            .collect();
        let draw = self.request.as_ref().map(|r| r.draw).unwrap_or(0);

        tracing::debug!(server_side, total, filtered, rows = data.len(), "json data created");

        Ok(json!({
            "data": data,
            "serverSide": server_side,
            "recordsTotal": total,
            "recordsFiltered": filtered,
            "drawId": draw,
        }))
    }

    /// Orders the columns by their `position` and builds the view.
    ///
    /// Filters rendered outside the table get a container id derived from
    /// the table id and the column index unless they name a container.
    pub fn create_view(&mut self) -> Result<TableView> {
        let paths = ColumnOrderer::new().order(self.builder.columns().iter().map(|c| (c.path(), c.position())))?;
        self.builder.reorder(&paths);

        let id = self.chain.leaf().id(&self.options);
        if self.options.is_true("filter_external") {
            for (index, column) in self.builder.columns_mut().iter_mut().enumerate() {
                let Some(filter) = column.filter_mut() else {
                    continue;
                };
                let options = filter.options();
                if options.is_null("filter_container_id") && options.is_null("filter_container_selector") {
                    filter.set_option("filter_container_id", format!("{id}_column_filter_{index}"));
                }
            }
        }

        let columns = self
            .builder
            .columns()
            .iter()
            .map(Column::create_view)
            .collect::<Result<Vec<_>>>()?;
        let mut view = TableView::new(id, columns, self.options.json("column_groups"));

        let select = if self.columns().iter().any(|c| c.is_type("select_column")) {
            json!({"style": "api", "className": "selected"})
        } else {
            Value::Bool(false)
        };
        view.set_var("select", select);

        for ty in self.chain.iter() {
            ty.build_view(&mut view, self, &self.options);
        }
        Ok(view)
    }

    // ========================================================================
    // Server-side processing
    // ========================================================================

    fn server_items(&self) -> Result<(Vec<Value>, usize)> {
        let (Some(request), Some(snapshot)) = (&self.request, &self.snapshot) else {
            return Ok((Vec::new(), 0));
        };
        let mut query = snapshot.fork();
        self.apply_order_by(&mut query, request);
        self.apply_search(&mut query, request);
        self.apply_filters(&mut query, request);

        let filtered = snapshot.backend().count(&query)?;
        if self.options.is_true("paging") {
            if let Ok(length) = usize::try_from(request.length) {
                let offset = if length == 0 { 0 } else { request.start / length * length };
                query.set_first_result(Some(offset)).set_max_results(Some(length));
            }
        }

        tracing::debug!(query = %query, "server-side query");
        Ok((snapshot.backend().fetch(&query)?, filtered))
    }

    /// The table column named by a request column, when it exists.
    fn requested_column<'a>(&'a self, request: &'a TableRequest, index: usize) -> Option<&'a Column> {
        let name = &request.columns.get(index)?.name;
        self.builder.get(name).ok()
    }

    fn apply_order_by(&self, query: &mut QueryBuilder, request: &TableRequest) {
        let root_alias = self.root_alias();
        let entries: Vec<(usize, &str)> = request
            .order
            .iter()
            .filter_map(|order| Some((order.column?, order.dir.as_deref()?)))
            .collect();

        if entries.is_empty() {
            if let Some(path) = self.options.str("default_order_property") {
                let dir = self
                    .options
                    .str("default_order_direction")
                    .and_then(|d| d.parse().ok())
                    .unwrap_or(Dir::Asc);
                query.add_order_by(qualify(path, root_alias), dir);
            }
            return;
        }

        let mut orderings: Vec<OrderBy> = Vec::new();
        for (index, direction) in entries {
            let Some(column) = self.requested_column(request, index) else {
                continue;
            };
            if !column.is_orderable() {
                continue;
            }
            let Ok(dir) = direction.parse::<Dir>() else {
                tracing::debug!(column = column.path(), direction, "ignoring invalid order direction");
                continue;
            };
            let query_path = qualify(column.query_path(), root_alias);
            let parts = match column.order_server_delegate() {
                Some(delegate) => delegate(dir, &*query, column, &query_path, root_alias),
                None => vec![OrderBy::new(query_path, dir)],
            };
            for part in parts {
                match orderings.iter_mut().find(|o| o.path == part.path) {
                    Some(existing) => existing.dir = part.dir,
                    None => orderings.push(part),
                }
            }
        }
        for ordering in orderings {
            query.add_order_by(ordering.path, ordering.dir);
        }
    }

    fn apply_search(&self, query: &mut QueryBuilder, request: &TableRequest) {
        let search = request.search.value.as_str();
        if search.is_empty() {
            return;
        }
        let root_alias = self.root_alias();
        let mut expressions: Vec<Expr> = Vec::new();
        let mut counter = 0;
        for index in 0..request.columns.len() {
            let Some(column) = self.requested_column(request, index) else {
                continue;
            };
            if !column.is_searchable() {
                continue;
            }
            let binding = format!(":search_{counter}");
            let query_path = qualify(column.query_path(), root_alias);
            match column.search_server_delegate() {
                Some(delegate) => {
                    let parts = delegate(&mut *query, &binding, search, column, &query_path);
                    if !parts.is_empty() {
                        expressions.extend(parts);
                        counter += 1;
                    }
                }
                None => {
                    query.set_parameter(&binding, format!("%{search}%"));
                    expressions.push(Expr::like(query_path.as_str(), binding.as_str()));
                    counter += 1;
                }
            }
        }
        if !expressions.is_empty() {
            query.and_where(Expr::or_x(expressions));
        }
    }

    fn apply_filters(&self, query: &mut QueryBuilder, request: &TableRequest) {
        let root_alias = self.root_alias();

        // Later inputs for the same column replace earlier ones.
        let mut inputs: Vec<(&str, FilterValue, bool)> = Vec::new();
        for column in &request.columns {
            let Some(value) = column.filter_value() else {
                continue;
            };
            let regex = column.search.regex;
            match inputs.iter_mut().find(|(name, _, _)| *name == column.name) {
                Some(entry) => *entry = (column.name.as_str(), value, regex),
                None => inputs.push((column.name.as_str(), value, regex)),
            }
        }

        let mut expressions: Vec<Expr> = Vec::new();
        for (name, value, regex) in inputs {
            let Ok(column) = self.builder.get(name) else {
                continue;
            };
            let Some(filter) = column.filter().filter(|_| column.is_filterable()) else {
                continue;
            };
            let binding = format!(":filter_{}", expressions.len());
            let query_path = qualify(column.filter_query_path(), root_alias);
            if let Some(expr) = filter.apply_filter(query, &value, regex, &binding, &query_path, root_alias) {
                expressions.push(expr);
            }
        }
        if !expressions.is_empty() {
            query.and_where(Expr::and_x(expressions));
        }
    }

    // ========================================================================
    // Client-side data
    // ========================================================================

    fn client_items(&self) -> Result<Vec<Value>> {
        let data = self.options.get("data").cloned().unwrap_or_default();
        let limit = match &data {
            OptionValue::Data(Value::Number(n)) => n.as_u64().and_then(|n| usize::try_from(n).ok()),
            OptionValue::Data(Value::Bool(true)) if self.options.is_true("paging") => {
                let page = self.options.i64("pageLength").filter(|n| *n > 0).unwrap_or(10);
                usize::try_from(page).ok()
            }
            OptionValue::Data(Value::Bool(false)) => None,
            OptionValue::Data(Value::Array(rows)) => return Ok(rows.clone()),
            OptionValue::Data(Value::Object(rows)) => return Ok(rows.values().cloned().collect()),
            OptionValue::Nested(rows) => return Ok(rows.iter().map(|(_, v)| v.to_json()).collect()),
            _ => return Ok(Vec::new()),
        };

        let Some(snapshot) = &self.snapshot else {
            return Ok(Vec::new());
        };
        let mut query = snapshot.fork();
        if limit.is_some() {
            query.set_first_result(Some(0)).set_max_results(limit);
        }
        Ok(snapshot.backend().fetch(&query)?)
    }
}

/// One output row: cell data written at each column path plus the row
/// attributes.
fn item_data(columns: &mut [Column], options: &ResolvedOptions, item: &Value, root_alias: &str) -> Value {
    let mut row = Map::new();
    for column in columns.iter_mut() {
        let path = column.path().to_string();
        let data = column.create_data(item, root_alias);
        set_nested(&mut row, &path, data);
    }

    for (option, key, glue) in [
        ("rowId", "DT_RowId", None),
        ("rowClass", "DT_RowClass", Some(" ")),
        ("rowData", "DT_RowData", None),
        ("rowAttr", "DT_RowAttr", None),
    ] {
        if let Some(value) = options.get(option).filter(|v| v.is_truthy()) {
            row.insert(key.into(), row_value(value, item, options, glue));
        }
    }

    if options.is_true("rows_selectable") {
        let id = options
            .get("row_selection_id")
            .map(|value| row_value(value, item, options, None))
            .unwrap_or(Value::Null);
        let attr = row.entry("DT_RowAttr").or_insert_with(|| Value::Object(Map::new()));
        if !attr.is_object() {
            *attr = Value::Object(Map::new());
        }
        if let Value::Object(attr) = attr {
            attr.insert("data-selectable-id".into(), id);
        }
    }
    Value::Object(row)
}

/// Calls a row callback, joins a list with `glue`, or passes the value
/// through.
fn row_value(value: &OptionValue, item: &Value, options: &ResolvedOptions, glue: Option<&str>) -> Value {
    match (value, glue) {
        (OptionValue::Callback(Callback::Row(f)), _) => f(item, options),
        (OptionValue::Data(Value::Array(parts)), Some(glue)) => {
            let parts: Vec<String> = parts
                .iter()
                .map(|part| match part {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect();
            Value::String(parts.join(glue))
        }
        (other, _) => other.to_json(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{ColumnRequest, OrderRequest, SearchRequest};

    fn people() -> Vec<Value> {
        vec![
            json!({"id": 1, "name": "Ada", "age": 36, "team": {"name": "core"}}),
            json!({"id": 2, "name": "Grace", "age": 85, "team": {"name": "ops"}}),
            json!({"id": 3, "name": "Linus", "age": null, "team": {"name": "core"}}),
        ]
    }

    fn server_table() -> Table {
        let mut table = Table::new(
            "table",
            DataSource::query(QueryBuilder::new("u"), MemoryBackend::new(people())),
            Options::new().set("ajax_url", "/people"),
            Arc::new(Registry::new()),
        )
        .unwrap();
        table
            .add("name", "string", Options::new().set("filterable", true))
            .unwrap()
            .add("age", "integer", Options::new().set("filterable", true).set("filter_type", "range"))
            .unwrap()
            .add("team.name", "string", Options::new().set("searchable", false))
            .unwrap();
        table
    }

    fn column(name: &str, filter: &str) -> ColumnRequest {
        ColumnRequest {
            name: name.into(),
            searchable: true,
            orderable: true,
            search: SearchRequest {
                value: filter.into(),
                regex: false,
            },
        }
    }

    fn request(columns: Vec<ColumnRequest>, order: Vec<OrderRequest>, search: &str) -> TableRequest {
        TableRequest {
            draw: 7,
            start: 0,
            length: -1,
            columns,
            order,
            search: SearchRequest {
                value: search.into(),
                regex: false,
            },
        }
    }

    fn names(data: &Value) -> Vec<&str> {
        data["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|row| row["name"]["display"].as_str().unwrap())
            .collect()
    }

    #[test]
    fn server_side_requires_a_request() {
        let mut table = server_table();
        assert!(matches!(table.create_json_data(None), Err(DatagridError::RequestNotHandled)));
    }

    #[test]
    fn default_order_without_directives() {
        let mut table = server_table();
        table.handle_request(request(vec![column("name", "")], vec![], ""));
        let data = table.create_json_data(None).unwrap();
        assert_eq!(names(&data), vec!["Ada", "Grace", "Linus"]);
        assert_eq!(data["drawId"], 7);
        assert_eq!(data["recordsTotal"], 3);
        assert_eq!(data["serverSide"], true);
    }

    #[test]
    fn requested_order() {
        let mut table = server_table();
        let order = vec![OrderRequest {
            column: Some(1),
            dir: Some("desc".into()),
        }];
        table.handle_request(request(vec![column("name", ""), column("age", "")], order, ""));
        let data = table.create_json_data(None).unwrap();
        assert_eq!(names(&data), vec!["Grace", "Ada", "Linus"]);
    }

    #[test]
    fn global_search_skips_unsearchable_columns() {
        let mut table = server_table();
        let columns = vec![column("name", ""), column("team.name", "")];
        table.handle_request(request(columns.clone(), vec![], "ra"));
        let data = table.create_json_data(None).unwrap();
        assert_eq!(names(&data), vec!["Grace"]);
        assert_eq!(data["recordsFiltered"], 1);

        table.handle_request(request(columns, vec![], "ops"));
        assert_eq!(table.create_json_data(None).unwrap()["recordsFiltered"], 0);
    }

    #[test]
    fn column_filters_are_anded() {
        let mut table = server_table();
        let columns = vec![column("name", "a"), column("age", "30-yadcf_delim-90")];
        table.handle_request(request(columns, vec![], ""));
        let data = table.create_json_data(None).unwrap();
        assert_eq!(names(&data), vec!["Ada", "Grace"]);
        assert_eq!(data["recordsFiltered"], 2);
        assert_eq!(data["recordsTotal"], 3);
    }

    #[test]
    fn paging_uses_page_boundaries() {
        let mut table = server_table();
        let mut req = request(vec![column("name", "")], vec![], "");
        req.start = 3;
        req.length = 2;
        table.handle_request(req);
        let data = table.create_json_data(None).unwrap();
        assert_eq!(names(&data), vec!["Linus"]);
        assert_eq!(data["recordsFiltered"], 3);
    }

    #[test]
    fn nested_paths_and_row_attributes() {
        let mut table = Table::new(
            "client_side_table",
            DataSource::rows(people()),
            Options::new()
                .set("data", false)
                .set("rowId", Callback::row(|item, _| json!(format!("row_{}", item["id"]))))
                .set("rowClass", json!(["a", "b"]))
                .set("rows_selectable", true)
                .set("row_selection_id", Callback::row(|item, _| item["id"].clone())),
            Arc::new(Registry::new()),
        )
        .unwrap();
        table.add("team.name", "string", Options::new()).unwrap();
        let data = table.create_json_data(None).unwrap();
        let first = &data["data"][0];
        assert_eq!(first["team"]["name"]["display"], "core");
        assert_eq!(first["DT_RowId"], "row_1");
        assert_eq!(first["DT_RowClass"], "a b");
        assert_eq!(first["DT_RowAttr"]["data-selectable-id"], 1);
        assert_eq!(data["serverSide"], false);
    }

    #[test]
    fn client_data_option() {
        let registry = Arc::new(Registry::new());
        let table = |data: Value| {
            Table::new(
                "client_side_table",
                DataSource::rows(people()),
                Options::new().set("data", data),
                registry.clone(),
            )
            .unwrap()
        };
        assert_eq!(table(json!(2)).create_json_data(None).unwrap()["data"].as_array().unwrap().len(), 2);
        assert_eq!(table(json!(true)).create_json_data(None).unwrap()["data"].as_array().unwrap().len(), 3);
        assert_eq!(table(json!(null)).create_json_data(None).unwrap()["data"].as_array().unwrap().len(), 0);
        let inline = table(json!([{"name": "Inline"}])).create_json_data(None).unwrap();
        assert_eq!(inline["data"][0], json!({}));
        assert!(!table(json!(null)).has_pre_populated_data());
    }

    #[test]
    fn add_filter_presets_values() {
        let mut table = server_table();
        let mut values = Map::new();
        values.insert("name".into(), json!("Ada"));
        values.insert("team.name".into(), json!("core"));
        table.add_filter(&values);
        let filter = table.column("name").unwrap().filter().unwrap();
        assert_eq!(filter.options().json("pre_filtered_value"), &json!("Ada"));
        assert!(table.column("team.name").unwrap().filter().is_none());
    }

    #[test]
    fn search_delay_falls_back_to_configuration() {
        let table = server_table();
        assert_eq!(table.options().i64("search_delay"), Some(500));
    }

    #[test]
    fn view_assigns_filter_containers_and_orders_columns() {
        let mut table = server_table();
        table
            .add("id", "integer", Options::new().set("position", "first"))
            .unwrap();
        let view = table.create_view().unwrap();
        let paths: Vec<&str> = view.columns.iter().map(|c| c.path.as_str()).collect();
        assert_eq!(paths, vec!["id", "name", "age", "team.name"]);
        assert!(view.id.starts_with("datatable_"));
        let filter = view.columns[1].filter.as_ref().unwrap();
        assert_eq!(filter.var("filter_container_id"), &json!(format!("{}_column_filter_1", view.id)));
        assert_eq!(view.var("select"), &json!(false));
        assert_eq!(view.var("version_hash").as_str().map(str::len), Some(64));
        assert_eq!(view.var("attr")["id"], json!(view.id));
        assert!(view.var("class").as_str().unwrap().starts_with("table table-striped"));
    }
}
