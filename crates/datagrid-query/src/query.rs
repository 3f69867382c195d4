//! Query builder.
//!
//! The [`QueryBuilder`] is a plain value: cloning it yields an independent
//! copy whose conditions, parameters and orderings can be changed without
//! touching the original.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;

use crate::expr::{normalize_param, Expr, Operand};
use crate::ordering::{Dir, OrderBy};

/// What a `SELECT` part projects.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectKind {
    /// A plain field.
    Field(Operand),
    /// `MIN(operand)`
    Min(Operand),
    /// `MAX(operand)`
    Max(Operand),
}

/// One `SELECT` part with its result alias.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub kind: SelectKind,
    pub alias: Option<String>,
}

impl Selection {
    /// Selects a field.
    pub fn field(operand: impl Into<Operand>) -> Self {
        Selection {
            kind: SelectKind::Field(operand.into()),
            alias: None,
        }
    }

    /// Selects `MIN(operand)`.
    pub fn min(operand: impl Into<Operand>) -> Self {
        Selection {
            kind: SelectKind::Min(operand.into()),
            alias: None,
        }
    }

    /// Selects `MAX(operand)`.
    pub fn max(operand: impl Into<Operand>) -> Self {
        Selection {
            kind: SelectKind::Max(operand.into()),
            alias: None,
        }
    }

    /// Names the result column.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// The key this selection occupies in a scalar result row.
    ///
    /// Falls back to the rendered expression when no alias was given.
    pub fn result_key(&self) -> String {
        match &self.alias {
            Some(alias) => alias.clone(),
            None => match &self.kind {
                SelectKind::Field(op) => op.to_string(),
                other => SelectionDisplay(other).to_string(),
            },
        }
    }

    /// Whether this selection aggregates rows.
    pub fn is_aggregate(&self) -> bool {
        !matches!(self.kind, SelectKind::Field(_))
    }
}

struct SelectionDisplay<'a>(&'a SelectKind);

impl fmt::Display for SelectionDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            SelectKind::Field(op) => write!(f, "{op}"),
            SelectKind::Min(op) => write!(f, "MIN({op})"),
            SelectKind::Max(op) => write!(f, "MAX({op})"),
        }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", SelectionDisplay(&self.kind))?;
        if let Some(alias) = &self.alias {
            write!(f, " AS {alias}")?;
        }
        Ok(())
    }
}

/// A cloneable query under construction.
///
/// Conditions added with [`and_where`](Self::and_where) are combined with
/// AND. Parameters are stored without their `:` prefix.
///
/// # Example
///
/// ```
/// use datagrid_query::{Expr, QueryBuilder};
///
/// let mut base = QueryBuilder::new("u");
/// base.add_order_by("u.name", datagrid_query::Dir::Asc);
///
/// let mut filtered = base.clone();
/// filtered
///     .and_where(Expr::like("u.name", ":search_0"))
///     .set_parameter(":search_0", "%ada%");
///
/// assert!(base.conditions().is_empty());
/// assert_eq!(filtered.conditions().len(), 1);
/// assert_eq!(filtered.to_string(), "SELECT u WHERE u.name LIKE :search_0 ORDER BY u.name ASC");
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryBuilder {
    root_alias: String,
    selections: Vec<Selection>,
    conditions: Vec<Expr>,
    orderings: Vec<OrderBy>,
    group_by: Vec<String>,
    distinct: bool,
    params: BTreeMap<String, Value>,
    first_result: Option<usize>,
    max_results: Option<usize>,
}

impl QueryBuilder {
    /// Creates an empty query over rows aliased as `root_alias`.
    pub fn new(root_alias: impl Into<String>) -> Self {
        QueryBuilder {
            root_alias: root_alias.into(),
            ..QueryBuilder::default()
        }
    }

    /// The alias rows are addressed by.
    pub fn root_alias(&self) -> &str {
        &self.root_alias
    }

    // ========================================================================
    // Conditions
    // ========================================================================

    /// Adds a condition, combined with existing ones by AND.
    pub fn and_where(&mut self, expr: Expr) -> &mut Self {
        self.conditions.push(expr);
        self
    }

    /// Replaces all conditions with `expr`.
    pub fn where_(&mut self, expr: Expr) -> &mut Self {
        self.conditions = vec![expr];
        self
    }

    /// Current conditions.
    pub fn conditions(&self) -> &[Expr] {
        &self.conditions
    }

    /// Conditions folded into a single AND expression.
    pub fn condition(&self) -> Expr {
        Expr::And(self.conditions.clone())
    }

    // ========================================================================
    // Parameters
    // ========================================================================

    /// Binds a parameter. A leading `:` in `name` is ignored.
    pub fn set_parameter(&mut self, name: &str, value: impl Into<Value>) -> &mut Self {
        self.params.insert(normalize_param(name), value.into());
        self
    }

    /// Looks up a bound parameter.
    pub fn parameter(&self, name: &str) -> Option<&Value> {
        self.params.get(&normalize_param(name))
    }

    /// All bound parameters.
    pub fn parameters(&self) -> &BTreeMap<String, Value> {
        &self.params
    }

    // ========================================================================
    // Ordering
    // ========================================================================

    /// Appends an ORDER BY part.
    pub fn add_order_by(&mut self, path: impl Into<String>, dir: Dir) -> &mut Self {
        self.orderings.push(OrderBy::new(path, dir));
        self
    }

    /// Replaces all ORDER BY parts.
    pub fn order_by(&mut self, path: impl Into<String>, dir: Dir) -> &mut Self {
        self.orderings = vec![OrderBy::new(path, dir)];
        self
    }

    /// Removes all ORDER BY parts.
    pub fn reset_order_by(&mut self) -> &mut Self {
        self.orderings.clear();
        self
    }

    /// Current ORDER BY parts.
    pub fn orderings(&self) -> &[OrderBy] {
        &self.orderings
    }

    // ========================================================================
    // Projection
    // ========================================================================

    /// Replaces the SELECT parts.
    pub fn select(&mut self, selection: Selection) -> &mut Self {
        self.selections = vec![selection];
        self
    }

    /// Appends a SELECT part.
    pub fn add_select(&mut self, selection: Selection) -> &mut Self {
        self.selections.push(selection);
        self
    }

    /// Current SELECT parts. Empty means "the root entity".
    pub fn selections(&self) -> &[Selection] {
        &self.selections
    }

    /// Toggles `SELECT DISTINCT`.
    pub fn distinct(&mut self, distinct: bool) -> &mut Self {
        self.distinct = distinct;
        self
    }

    /// Whether results are de-duplicated.
    pub fn is_distinct(&self) -> bool {
        self.distinct
    }

    /// Replaces the GROUP BY paths.
    pub fn group_by(&mut self, path: impl Into<String>) -> &mut Self {
        self.group_by = vec![path.into()];
        self
    }

    /// Appends a GROUP BY path.
    pub fn add_group_by(&mut self, path: impl Into<String>) -> &mut Self {
        self.group_by.push(path.into());
        self
    }

    /// Removes all GROUP BY paths.
    pub fn reset_group_by(&mut self) -> &mut Self {
        self.group_by.clear();
        self
    }

    /// Current GROUP BY paths.
    pub fn group_by_paths(&self) -> &[String] {
        &self.group_by
    }

    // ========================================================================
    // Pagination
    // ========================================================================

    /// Sets the offset of the first row. `None` starts at the beginning.
    pub fn set_first_result(&mut self, offset: Option<usize>) -> &mut Self {
        self.first_result = offset;
        self
    }

    /// Caps the number of rows. `None` means unlimited.
    pub fn set_max_results(&mut self, limit: Option<usize>) -> &mut Self {
        self.max_results = limit;
        self
    }

    /// Current offset.
    pub fn first_result(&self) -> Option<usize> {
        self.first_result
    }

    /// Current limit.
    pub fn max_results(&self) -> Option<usize> {
        self.max_results
    }
}

impl fmt::Display for QueryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SELECT ")?;
        if self.distinct {
            write!(f, "DISTINCT ")?;
        }
        if self.selections.is_empty() {
            write!(f, "{}", self.root_alias)?;
        } else {
            let parts: Vec<String> = self.selections.iter().map(ToString::to_string).collect();
            write!(f, "{}", parts.join(", "))?;
        }

        if !self.conditions.is_empty() {
            write!(f, " WHERE {}", self.condition())?;
        }
        if !self.group_by.is_empty() {
            write!(f, " GROUP BY {}", self.group_by.join(", "))?;
        }
        if !self.orderings.is_empty() {
            let parts: Vec<String> = self.orderings.iter().map(ToString::to_string).collect();
            write!(f, " ORDER BY {}", parts.join(", "))?;
        }
        Ok(())
    }
}
