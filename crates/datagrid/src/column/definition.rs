use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use super::{Capability, ColumnContext, ColumnType, ColumnView};
use crate::error::Result;
use crate::filter::{Filter, QuerySnapshot};
use crate::hierarchy::TypeChain;
use crate::options::{
    Callback, ClientFn, FilterServerFn, OptionValue, Options, OrderServerFn, ResolvedOptions, SearchServerFn, ValueFn,
};
use crate::property::{strip_root_alias, try_get_property};
use crate::registry::Registry;
use crate::transform::{DataTransformer, TransformerChain};

/// How a cell's raw value is read from an item.
#[derive(Clone)]
pub enum ValueDelegate {
    /// Read the column path from the item.
    Property,
    Computed(Arc<ValueFn>),
}

impl ValueDelegate {
    fn from_option(value: Option<&OptionValue>) -> Self {
        match value {
            Some(OptionValue::Callback(Callback::Value(f))) => ValueDelegate::Computed(f.clone()),
            _ => ValueDelegate::Property,
        }
    }

    pub fn value(&self, item: &Value, path: &str, options: &ResolvedOptions) -> Value {
        match self {
            ValueDelegate::Property => try_get_property(item, path).unwrap_or(Value::Null),
            ValueDelegate::Computed(f) => f(item, path, options),
        }
    }
}

impl fmt::Debug for ValueDelegate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueDelegate::Property => f.write_str("Property"),
            ValueDelegate::Computed(_) => f.write_str("Computed"),
        }
    }
}

/// Source of the client-side `sort` or `filter` value of a cell.
#[derive(Clone)]
pub enum ClientDelegate {
    /// An alternative property path.
    Path(String),
    Computed(Arc<ClientFn>),
}

impl ClientDelegate {
    fn from_option(value: Option<&OptionValue>) -> Option<Self> {
        match value? {
            OptionValue::Data(Value::String(path)) => Some(ClientDelegate::Path(path.clone())),
            OptionValue::Callback(Callback::Client(f)) => Some(ClientDelegate::Computed(f.clone())),
            _ => None,
        }
    }
}

impl fmt::Debug for ClientDelegate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientDelegate::Path(path) => f.debug_tuple("Path").field(path).finish(),
            ClientDelegate::Computed(_) => f.write_str("Computed"),
        }
    }
}

/// A column of a table: a resolved column type bound to a path.
pub struct Column {
    key: String,
    chain: TypeChain<dyn ColumnType>,
    options: ResolvedOptions,
    table_options: Arc<ResolvedOptions>,
    registry: Arc<Registry>,
    parent: Option<Arc<Column>>,
    transformers: TransformerChain,
    data_configured: bool,
    orderable: bool,
    searchable: bool,
    filterable: bool,
    value_delegate: ValueDelegate,
    order_client: Option<ClientDelegate>,
    search_client: Option<ClientDelegate>,
    order_server: Option<Arc<OrderServerFn>>,
    search_server: Option<Arc<SearchServerFn>>,
    filter_server: Option<Arc<FilterServerFn>>,
    filter: Option<Filter>,
}

impl fmt::Debug for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column")
            .field("path", &self.path())
            .field("type", &self.type_name())
            .field("orderable", &self.orderable)
            .field("searchable", &self.searchable)
            .field("filterable", &self.filterable)
            .field("transformers", &self.transformers)
            .field("filter", &self.filter)
            .finish()
    }
}

impl Column {
    /// Resolves `type_name` and its options and configures the column.
    ///
    /// On a table that is not server-side, a capability configured as a
    /// plain `true` is downgraded to client-only before it is resolved.
    /// A filter is created when the column resolves filterable and names a
    /// filter type.
    pub fn new(
        path: impl Into<String>,
        type_name: &str,
        options: Options,
        table_options: Arc<ResolvedOptions>,
        snapshot: Option<QuerySnapshot>,
        registry: Arc<Registry>,
    ) -> Result<Self> {
        let key = path.into();
        let chain = registry.column_chain(type_name)?;
        let ctx = ColumnContext {
            table_options: &table_options,
            registry: &registry,
        };
        let mut options = chain.resolve_options(|ty, schema| ty.configure_options(schema, &ctx), options)?;
        if options.is_null("path") {
            options.set("path", key.as_str());
        }

        let server_side = table_options.is_true("serverSide");
        let mut flags = [false; 3];
        for (flag, name) in flags.iter_mut().zip(["orderable", "searchable", "filterable"]) {
            let capability = Capability::from_value(options.json(name)).downgrade(server_side);
            options.set(name, capability.to_value());
            *flag = capability.resolve(server_side);
        }
        let [orderable, searchable, filterable] = flags;

        let value_delegate = ValueDelegate::from_option(options.get("value_delegate"));
        let order_client = ClientDelegate::from_option(options.get("order_client_delegate"));
        let search_client = ClientDelegate::from_option(options.get("search_client_delegate"));
        let order_server = match options.callback("order_server_delegate") {
            Some(Callback::OrderServer(f)) => Some(f.clone()),
            _ => None,
        };
        let search_server = match options.callback("search_server_delegate") {
            Some(Callback::SearchServer(f)) => Some(f.clone()),
            _ => None,
        };
        let filter_server = match options.callback("filter_server_delegate") {
            Some(Callback::FilterServer(f)) => Some(f.clone()),
            _ => None,
        };

        let filter = match options.str("filter_type") {
            Some(filter_type) if filterable => Some(Filter::new(
                filter_type,
                options.options("filter_options"),
                &options,
                table_options.clone(),
                snapshot,
                registry.clone(),
            )?),
            _ => None,
        };

        tracing::debug!(
            path = %key,
            column_type = type_name,
            orderable,
            searchable,
            filterable,
            "column configured"
        );

        Ok(Column {
            key,
            chain,
            options,
            table_options,
            registry,
            parent: None,
            transformers: TransformerChain::new(),
            data_configured: false,
            orderable,
            searchable,
            filterable,
            value_delegate,
            order_client,
            search_client,
            order_server,
            search_server,
            filter_server,
            filter,
        })
    }

    /// Sets the column whose view becomes this column's parent view.
    pub fn with_parent(mut self, parent: Arc<Column>) -> Self {
        self.parent = Some(parent);
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// The `path` option, defaulting to the key the column was added under.
    pub fn path(&self) -> &str {
        self.options.str("path").unwrap_or(&self.key)
    }

    /// The `query_path` option, defaulting to the path.
    pub fn query_path(&self) -> &str {
        self.options.str("query_path").unwrap_or_else(|| self.path())
    }

    /// The `filter_query_path` option, defaulting to the query path.
    pub fn filter_query_path(&self) -> &str {
        self.options.str("filter_query_path").unwrap_or_else(|| self.query_path())
    }

    pub fn type_name(&self) -> &str {
        self.chain.leaf().name()
    }

    pub fn chain(&self) -> &TypeChain<dyn ColumnType> {
        &self.chain
    }

    /// Whether the column's type is `name` or derives from it.
    pub fn is_type(&self, name: &str) -> bool {
        self.chain.contains(name)
    }

    pub fn options(&self) -> &ResolvedOptions {
        &self.options
    }

    pub fn table_options(&self) -> &ResolvedOptions {
        &self.table_options
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn is_orderable(&self) -> bool {
        self.orderable
    }

    pub fn is_searchable(&self) -> bool {
        self.searchable
    }

    pub fn is_filterable(&self) -> bool {
        self.filterable
    }

    pub fn is_server_side(&self) -> bool {
        self.table_options.is_true("serverSide")
    }

    /// The raw `position` directive.
    pub fn position(&self) -> &Value {
        self.options.json("position")
    }

    pub fn filter(&self) -> Option<&Filter> {
        self.filter.as_ref()
    }

    pub fn filter_mut(&mut self) -> Option<&mut Filter> {
        self.filter.as_mut()
    }

    pub fn value_delegate(&self) -> &ValueDelegate {
        &self.value_delegate
    }

    pub fn order_server_delegate(&self) -> Option<&Arc<OrderServerFn>> {
        self.order_server.as_ref()
    }

    pub fn search_server_delegate(&self) -> Option<&Arc<SearchServerFn>> {
        self.search_server.as_ref()
    }

    pub fn filter_server_delegate(&self) -> Option<&Arc<FilterServerFn>> {
        self.filter_server.as_ref()
    }

    // ========================================================================
    // Data
    // ========================================================================

    pub fn transformers(&self) -> &TransformerChain {
        &self.transformers
    }

    /// Adds a transformer in front, or at the end with `force_append`.
    pub fn add_transformer(&mut self, transformer: impl DataTransformer + 'static, force_append: bool) -> &mut Self {
        self.transformers.add(transformer, force_append);
        self
    }

    pub fn reset_transformers(&mut self) -> &mut Self {
        self.transformers.reset();
        self
    }

    /// Lets every type of the chain install its transformers, once.
    pub fn build_data(&mut self) {
        if self.data_configured {
            return;
        }
        for ty in self.chain.iter() {
            ty.build_data(&mut self.transformers, &self.options);
        }
        self.data_configured = true;
    }

    /// Cell data for one item: `{display}` plus, on client-side tables,
    /// `sort` and `filter` when their delegates produce a value.
    pub fn create_data(&mut self, item: &Value, root_alias: &str) -> Value {
        self.build_data();
        self.generate_data(item, root_alias)
    }

    fn generate_data(&self, item: &Value, root_alias: &str) -> Value {
        let path = strip_root_alias(self.path(), root_alias);
        let raw = self.value_delegate.value(item, path, &self.options);
        let display = self.transformers.apply(self, item, raw);

        let mut data = Map::new();
        data.insert("display".into(), display);
        if self.table_options.json("serverSide") == &Value::Bool(false) {
            for (key, delegate) in [("sort", &self.order_client), ("filter", &self.search_client)] {
                let value = self.client_value(delegate.as_ref(), item, path, root_alias);
                if !value.is_null() {
                    data.insert(key.into(), value);
                }
            }
        }
        Value::Object(data)
    }

    fn client_value(&self, delegate: Option<&ClientDelegate>, item: &Value, path: &str, root_alias: &str) -> Value {
        match delegate {
            Some(ClientDelegate::Path(other)) => {
                try_get_property(item, strip_root_alias(other, root_alias)).unwrap_or(Value::Null)
            }
            Some(ClientDelegate::Computed(f)) => {
                let raw = try_get_property(item, path).unwrap_or(Value::Null);
                f(item, path, &raw, root_alias, &self.options)
            }
            None => Value::Null,
        }
    }

    // ========================================================================
    // View
    // ========================================================================

    /// Identity of the column for state versioning.
    pub fn hash_code(&self) -> String {
        format!("{}:{}", self.path(), self.filterable)
    }

    /// Builds the column view root first, then fills translation domains
    /// from the table and attaches the filter view.
    pub fn create_view(&self) -> Result<ColumnView> {
        let parent = match &self.parent {
            Some(parent) => Some(parent.create_view()?),
            None => None,
        };
        let mut view = ColumnView::new(parent);
        for ty in self.chain.iter() {
            ty.build_view(&mut view, self, &self.options);
        }
        view.default_var("translation_domain", self.options.json("translation_domain").clone());

        let table_domain = self.table_options.json("translation_domain").clone();
        for name in ["translation_domain", "abbreviation_translation_domain", "tooltip_translation_domain"] {
            view.default_var(name, table_domain.clone());
        }

        if let Some(filter) = &self.filter {
            view.filter = Some(filter.create_view()?);
        }
        Ok(view)
    }
}
