use std::fmt;
use std::sync::Arc;

use datagrid_query::{Expr, QueryBuilder};
use serde_json::Value;

use super::engine::filter_is_valid;
use super::{FilterContext, FilterType, FilterValue, FilterView, FilterViewContext, QuerySnapshot};
use crate::error::Result;
use crate::hierarchy::TypeChain;
use crate::options::{Callback, FilterServerFn, OptionValue, Options, ResolvedOptions};
use crate::property::qualify;
use crate::registry::Registry;

/// A resolved filter type attached to a column.
pub struct Filter {
    chain: TypeChain<dyn FilterType>,
    options: ResolvedOptions,
    column_options: ResolvedOptions,
    table_options: Arc<ResolvedOptions>,
    registry: Arc<Registry>,
    snapshot: Option<QuerySnapshot>,
    delegate: Option<Arc<FilterServerFn>>,
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Filter")
            .field("chain", &self.chain)
            .field("options", &self.options)
            .field("has_delegate", &self.delegate.is_some())
            .finish_non_exhaustive()
    }
}

impl Filter {
    /// Resolves `type_name` with the column's `filter_options`.
    ///
    /// A `filter_server_delegate` on the column takes precedence over one
    /// given in the filter options.
    pub fn new(
        type_name: &str,
        options: Options,
        column_options: &ResolvedOptions,
        table_options: Arc<ResolvedOptions>,
        snapshot: Option<QuerySnapshot>,
        registry: Arc<Registry>,
    ) -> Result<Self> {
        let chain = registry.filter_chain(type_name)?;
        let ctx = FilterContext {
            column_options,
            table_options: &table_options,
            registry: &registry,
        };
        let options = chain.resolve_options(|ty, schema| ty.configure_options(schema, &ctx), options)?;

        let delegate = [column_options, &options]
            .into_iter()
            .find_map(|opts| match opts.callback("filter_server_delegate") {
                Some(Callback::FilterServer(f)) => Some(f.clone()),
                _ => None,
            });

        Ok(Filter {
            chain,
            options,
            column_options: column_options.clone(),
            table_options,
            registry,
            snapshot,
            delegate,
        })
    }

    pub fn type_name(&self) -> &str {
        self.chain.leaf().name()
    }

    pub fn chain(&self) -> &TypeChain<dyn FilterType> {
        &self.chain
    }

    pub fn is_type(&self, name: &str) -> bool {
        self.chain.contains(name)
    }

    pub fn options(&self) -> &ResolvedOptions {
        &self.options
    }

    pub fn column_options(&self) -> &ResolvedOptions {
        &self.column_options
    }

    /// Sets the value the client widget starts with.
    pub fn set_pre_filtered_value(&mut self, value: impl Into<Value>) {
        self.options.set("pre_filtered_value", value.into());
    }

    /// Overrides one resolved filter option.
    pub fn set_option(&mut self, name: &str, value: impl Into<OptionValue>) {
        self.options.set(name, value);
    }

    pub fn root_alias(&self) -> &str {
        self.snapshot.as_ref().map(QuerySnapshot::root_alias).unwrap_or("")
    }

    /// The alias-qualified path the filter compares against.
    pub fn query_path(&self) -> String {
        let path = ["filter_query_path", "query_path", "path"]
            .into_iter()
            .find_map(|name| self.column_options.str(name))
            .unwrap_or_default();
        qualify(path, self.root_alias())
    }

    /// Whether `value` may contribute an expression.
    pub fn is_valid(&self, value: &FilterValue, multi: bool) -> bool {
        filter_is_valid(value, multi, &self.options)
    }

    /// The expression for a submitted value.
    ///
    /// A server delegate replaces the type's own rule. Otherwise the leaf
    /// type decides.
    pub fn apply_filter(
        &self,
        query: &mut QueryBuilder,
        value: &FilterValue,
        multi: bool,
        binding: &str,
        query_path: &str,
        root_alias: &str,
    ) -> Option<Expr> {
        match &self.delegate {
            Some(delegate) => delegate(query, value, multi, binding, query_path, &self.options, root_alias),
            None => self
                .chain
                .leaf()
                .apply_filter(query, value, multi, binding, query_path, &self.options, root_alias),
        }
    }

    /// Builds the client widget view, root type first.
    pub fn create_view(&self) -> Result<FilterView> {
        let query_path = self.query_path();
        let ctx = FilterViewContext {
            snapshot: self.snapshot.as_ref(),
            query_path: &query_path,
            root_alias: self.root_alias(),
            column_options: &self.column_options,
            registry: &self.registry,
        };
        let mut view = FilterView::default();
        for ty in self.chain.iter() {
            ty.build_view(&mut view, &self.options, &ctx)?;
        }
        if view.var("translation_domain").is_null() {
            let fallback = match self.column_options.json("translation_domain") {
                Value::Null => self.table_options.json("translation_domain").clone(),
                domain => domain.clone(),
            };
            view.set_var("translation_domain", fallback);
        }
        Ok(view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use datagrid_query::MemoryBackend;
    use serde_json::json;

    fn filter(type_name: &str, options: Options, column: ResolvedOptions) -> Result<Filter> {
        let snapshot = QuerySnapshot::new(
            QueryBuilder::new("u"),
            Arc::new(MemoryBackend::new(vec![json!({"name": "b"}), json!({"name": "a"})])),
        );
        Filter::new(
            type_name,
            options,
            &column,
            Arc::new(ResolvedOptions::default().with("translation_domain", "messages")),
            Some(snapshot),
            Arc::new(Registry::new()),
        )
    }

    fn column() -> ResolvedOptions {
        ResolvedOptions::default().with("path", "name")
    }

    #[test]
    fn query_path_falls_back_to_the_column_path() {
        let f = filter("text", Options::new(), column()).unwrap();
        assert_eq!(f.query_path(), "u.name");
        assert_eq!(f.type_name(), "text");
        assert!(f.is_type("filter"));

        let f = filter("text", Options::new(), column().with("filter_query_path", "g.title")).unwrap();
        assert_eq!(f.query_path(), "g.title");
    }

    #[test]
    fn text_filter_applies_like() {
        let f = filter("text", Options::new(), column()).unwrap();
        let mut query = QueryBuilder::new("u");
        let expr = f.apply_filter(&mut query, &"ad".into(), false, ":filter_0", "u.name", "u").unwrap();
        assert_eq!(expr.to_string(), "u.name LIKE :filter_0");
        assert_eq!(query.parameter("filter_0"), Some(&json!("%ad%")));
    }

    #[test]
    fn column_delegate_wins() {
        let delegate = Callback::filter_server(|_, _, _, _, path, _, _| Some(Expr::is_null(path)));
        let own = Callback::filter_server(|_, _, _, _, path, _, _| Some(Expr::eq(path, "u.other")));
        let f = filter(
            "text",
            Options::new().set("filter_server_delegate", own),
            column().with("filter_server_delegate", delegate),
        )
        .unwrap();
        let mut query = QueryBuilder::new("u");
        let expr = f.apply_filter(&mut query, &"x".into(), false, ":filter_0", "u.name", "u").unwrap();
        assert_eq!(expr.to_string(), "u.name IS NULL");
    }

    #[test]
    fn validation_uses_filter_options() {
        let f = filter("text", Options::new(), column()).unwrap();
        assert!(f.is_valid(&"x".into(), false));
        assert!(!f.is_valid(&"".into(), false));
        assert!(!f.is_valid(&"x".into(), true));

        let f = filter("text", Options::new().set("filter_validate_empty", false), column()).unwrap();
        assert!(f.is_valid(&"".into(), false));
    }

    #[test]
    fn view_walks_the_chain() {
        let mut f = filter("select", Options::new(), column()).unwrap();
        f.set_pre_filtered_value("a");
        let view = f.create_view().unwrap();
        assert_eq!(view.template, "datagrid/filter/select.json.twig");
        assert_eq!(view.var("pre_filtered_value"), &json!("a"));
        assert_eq!(view.var("type"), &json!("multi_select"));
        assert_eq!(view.var("select_type"), &json!("select2"));
        assert_eq!(
            view.var("data"),
            &json!([{"value": "a", "label": "a"}, {"value": "b", "label": "b"}])
        );
        assert_eq!(view.var("translation_domain"), &json!("datagrid"));
    }

    #[test]
    fn null_translation_domain_inherits() {
        let f = filter("text", Options::new().set("translation_domain", Value::Null), column()).unwrap();
        let view = f.create_view().unwrap();
        assert_eq!(view.var("translation_domain"), &json!("messages"));
    }

    #[test]
    fn unknown_filter_type() {
        let err = filter("fuzzy", Options::new(), column()).unwrap_err();
        assert_eq!(err.to_string(), "unknown filter type 'fuzzy'");
    }
}
