//! Query execution.
//!
//! A [`Backend`] turns a [`QueryBuilder`] into rows. [`MemoryBackend`]
//! evaluates queries against an owned `Vec` of JSON rows.

use std::cmp::Ordering;

use serde_json::{Map, Value};

use crate::error::Result;
use crate::ordering::compare_by_orderings;
use crate::query::{QueryBuilder, SelectKind, Selection};
use crate::value::{lookup, sort_compare};

/// Executes queries built with [`QueryBuilder`].
pub trait Backend: Send + Sync {
    /// Rows matching the query, ordered and paginated.
    fn fetch(&self, query: &QueryBuilder) -> Result<Vec<Value>>;

    /// Number of matching rows, ignoring ordering and pagination.
    ///
    /// With GROUP BY set, counts distinct groups.
    fn count(&self, query: &QueryBuilder) -> Result<usize>;

    /// Projected rows for the query's SELECT parts.
    ///
    /// Aggregate selections collapse the result to a single row.
    fn scalar(&self, query: &QueryBuilder) -> Result<Vec<Map<String, Value>>>;
}

/// Evaluates queries over rows held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    rows: Vec<Value>,
}

impl MemoryBackend {
    pub fn new(rows: Vec<Value>) -> Self {
        MemoryBackend { rows }
    }

    pub fn rows(&self) -> &[Value] {
        &self.rows
    }

    fn matching<'a>(&'a self, query: &QueryBuilder) -> Result<Vec<&'a Value>> {
        let condition = query.condition();
        let mut out = Vec::new();
        for row in &self.rows {
            if condition.matches(row, query.root_alias(), query.parameters())? {
                out.push(row);
            }
        }
        Ok(out)
    }

    fn ordered<'a>(&'a self, query: &QueryBuilder) -> Result<Vec<&'a Value>> {
        let mut rows = self.matching(query)?;
        if !query.orderings().is_empty() {
            rows.sort_by(|a, b| compare_by_orderings(a, b, query.orderings(), query.root_alias()));
        }
        Ok(rows)
    }

    fn group_key(row: &Value, query: &QueryBuilder) -> Vec<Value> {
        query
            .group_by_paths()
            .iter()
            .map(|path| lookup(row, query.root_alias(), path).cloned().unwrap_or(Value::Null))
            .collect()
    }
}

fn paginate<T>(rows: Vec<T>, query: &QueryBuilder) -> Vec<T> {
    let offset = query.first_result().unwrap_or(0);
    let iter = rows.into_iter().skip(offset);
    match query.max_results() {
        Some(limit) => iter.take(limit).collect(),
        None => iter.collect(),
    }
}

fn push_unique<T: PartialEq>(out: &mut Vec<T>, item: T) {
    if !out.contains(&item) {
        out.push(item);
    }
}

fn aggregate(rows: &[&Value], query: &QueryBuilder, selection: &Selection) -> Result<Value> {
    let (operand, wanted) = match &selection.kind {
        SelectKind::Min(op) => (op, Ordering::Less),
        SelectKind::Max(op) => (op, Ordering::Greater),
        SelectKind::Field(op) => {
            return match rows.first() {
                Some(row) => Ok(op
                    .value_in(row, query.root_alias(), query.parameters())?
                    .into_owned()),
                None => Ok(Value::Null),
            };
        }
    };

    let mut best = Value::Null;
    for row in rows {
        let value = operand.value_in(row, query.root_alias(), query.parameters())?;
        if value.is_null() {
            continue;
        }
        if best.is_null() || sort_compare(&value, &best) == wanted {
            best = value.into_owned();
        }
    }
    Ok(best)
}

impl Backend for MemoryBackend {
    fn fetch(&self, query: &QueryBuilder) -> Result<Vec<Value>> {
        let rows = self.ordered(query)?;
        let mut out: Vec<Value> = Vec::with_capacity(rows.len());
        if query.is_distinct() {
            for row in rows {
                push_unique(&mut out, row.clone());
            }
        } else {
            out.extend(rows.into_iter().cloned());
        }
        tracing::trace!(query = %query, rows = out.len(), "memory backend fetch");
        Ok(paginate(out, query))
    }

    fn count(&self, query: &QueryBuilder) -> Result<usize> {
        let rows = self.matching(query)?;
        if query.group_by_paths().is_empty() {
            return Ok(rows.len());
        }
        let mut keys = Vec::new();
        for row in rows {
            push_unique(&mut keys, Self::group_key(row, query));
        }
        Ok(keys.len())
    }

    fn scalar(&self, query: &QueryBuilder) -> Result<Vec<Map<String, Value>>> {
        let rows = self.ordered(query)?;
        let selections = query.selections();

        if selections.iter().any(Selection::is_aggregate) {
            let mut out = Map::new();
            for selection in selections {
                out.insert(selection.result_key(), aggregate(&rows, query, selection)?);
            }
            return Ok(vec![out]);
        }

        let mut projected: Vec<Map<String, Value>> = Vec::new();
        let mut seen_groups: Vec<Vec<Value>> = Vec::new();
        for row in rows {
            if !query.group_by_paths().is_empty() {
                let key = Self::group_key(row, query);
                if seen_groups.contains(&key) {
                    continue;
                }
                seen_groups.push(key);
            }

            let mut out = Map::new();
            if selections.is_empty() {
                out.insert(query.root_alias().to_string(), row.clone());
            }
            for selection in selections {
                if let SelectKind::Field(op) = &selection.kind {
                    let value = op.value_in(row, query.root_alias(), query.parameters())?;
                    out.insert(selection.result_key(), value.into_owned());
                }
            }

            if query.is_distinct() {
                push_unique(&mut projected, out);
            } else {
                projected.push(out);
            }
        }
        Ok(paginate(projected, query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Expr;
    use crate::ordering::Dir;
    use serde_json::json;

    fn people() -> MemoryBackend {
        MemoryBackend::new(vec![
            json!({"id": 1, "name": "Ada", "age": 36, "team": "a"}),
            json!({"id": 2, "name": "Grace", "age": 85, "team": "b"}),
            json!({"id": 3, "name": "Linus", "age": null, "team": "a"}),
        ])
    }

    #[test]
    fn fetch_orders_and_paginates() {
        let mut qb = QueryBuilder::new("u");
        qb.order_by("u.age", Dir::Desc)
            .set_first_result(Some(1))
            .set_max_results(Some(5));
        let rows = people().fetch(&qb).unwrap();
        let ids: Vec<_> = rows.iter().map(|r| r["id"].clone()).collect();
        assert_eq!(ids, vec![json!(1), json!(3)]);
    }

    #[test]
    fn count_ignores_pagination() {
        let mut qb = QueryBuilder::new("u");
        qb.and_where(Expr::eq("u.team", ":t"))
            .set_parameter("t", "a")
            .set_max_results(Some(1));
        assert_eq!(people().count(&qb).unwrap(), 2);
    }

    #[test]
    fn count_groups() {
        let mut qb = QueryBuilder::new("u");
        qb.group_by("u.team");
        assert_eq!(people().count(&qb).unwrap(), 2);
    }

    #[test]
    fn scalar_min_max() {
        let mut qb = QueryBuilder::new("u");
        qb.select(Selection::min("u.age").alias("min"))
            .add_select(Selection::max("u.age").alias("max"));
        let rows = people().scalar(&qb).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["min"], json!(36));
        assert_eq!(rows[0]["max"], json!(85));
    }

    #[test]
    fn scalar_min_max_empty_is_null() {
        let mut qb = QueryBuilder::new("u");
        qb.and_where(Expr::is_null("u.id"))
            .select(Selection::min("u.age").alias("min"));
        let rows = people().scalar(&qb).unwrap();
        assert_eq!(rows[0]["min"], Value::Null);
    }

    #[test]
    fn scalar_distinct_fields() {
        let mut qb = QueryBuilder::new("u");
        qb.select(Selection::field("u.team").alias("team"))
            .distinct(true)
            .order_by("u.team", Dir::Asc);
        let rows = people().scalar(&qb).unwrap();
        let teams: Vec<_> = rows.iter().map(|r| r["team"].clone()).collect();
        assert_eq!(teams, vec![json!("a"), json!("b")]);
    }
}
