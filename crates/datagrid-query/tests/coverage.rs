//! Additional tests covering query evaluation through the public API.

use datagrid_query::{
    Backend, Dir, Expr, MemoryBackend, Operand, OrderBy, QueryBuilder, QueryError, Selection,
};
use serde_json::{json, Value};

fn users() -> MemoryBackend {
    MemoryBackend::new(vec![
        json!({"id": 1, "name": "Ada", "age": 36, "created": "2024-03-01 08:00:00", "kind": "App\\Entity\\Admin", "profile": {"city": "London"}}),
        json!({"id": 2, "name": "Grace", "age": "85", "created": "2024-03-02 23:59:00", "kind": "App\\Entity\\User", "profile": {"city": "New York"}}),
        json!({"id": 3, "name": "Linus", "age": null, "created": "2024-03-03 00:00:00", "kind": "App\\Entity\\User", "profile": null}),
        json!({"id": 4, "name": "Barbara", "created": null, "kind": null}),
    ])
}

fn ids(rows: &[Value]) -> Vec<i64> {
    rows.iter().filter_map(|r| r["id"].as_i64()).collect()
}

// ============================================================================
// Expressions
// ============================================================================

#[test]
fn like_contains_is_case_insensitive() {
    let mut qb = QueryBuilder::new("u");
    qb.and_where(Expr::like("u.name", ":search_0"))
        .set_parameter("search_0", "%A%");
    assert_eq!(ids(&users().fetch(&qb).unwrap()), vec![1, 2, 4]);
}

#[test]
fn like_on_nested_path() {
    let mut qb = QueryBuilder::new("u");
    qb.and_where(Expr::like("u.profile.city", ":c"))
        .set_parameter("c", "new%");
    assert_eq!(ids(&users().fetch(&qb).unwrap()), vec![2]);
}

#[test]
fn like_with_literal_backslashes() {
    let mut qb = QueryBuilder::new("u");
    qb.and_where(Expr::like("u.kind", ":k"))
        .set_parameter("k", "%\\User");
    assert_eq!(ids(&users().fetch(&qb).unwrap()), vec![2, 3]);
}

#[test]
fn numeric_strings_compare_as_numbers() {
    let mut qb = QueryBuilder::new("u");
    qb.and_where(Expr::gte("u.age", ":min"))
        .set_parameter("min", 40);
    assert_eq!(ids(&users().fetch(&qb).unwrap()), vec![2]);
}

#[test]
fn date_range_between() {
    let mut qb = QueryBuilder::new("u");
    qb.and_where(Expr::and_x([
        Expr::gte("u.created", ":f_start"),
        Expr::lte("u.created", ":f_end"),
    ]))
    .set_parameter("f_start", "2024-03-02 00:00:00")
    .set_parameter("f_end", "2024-03-02 23:59:59");
    assert_eq!(ids(&users().fetch(&qb).unwrap()), vec![2]);
}

#[test]
fn or_with_is_null() {
    let mut qb = QueryBuilder::new("u");
    qb.and_where(Expr::or_x([
        Expr::eq("u.name", ":n"),
        Expr::is_null("u.kind"),
    ]))
    .set_parameter("n", "Ada");
    assert_eq!(ids(&users().fetch(&qb).unwrap()), vec![1, 4]);
}

#[test]
fn neq_excludes_nulls() {
    let mut qb = QueryBuilder::new("u");
    qb.and_where(Expr::neq("u.age", Operand::literal(36)));
    assert_eq!(ids(&users().fetch(&qb).unwrap()), vec![2]);
}

#[test]
fn unbound_parameter_surfaces() {
    let mut qb = QueryBuilder::new("u");
    qb.and_where(Expr::eq("u.name", ":nope"));
    let err = users().fetch(&qb).unwrap_err();
    assert!(matches!(err, QueryError::UnboundParameter(ref p) if p == "nope"));
    assert_eq!(err.to_string(), "parameter ':nope' is referenced but not bound");
}

#[test]
fn literal_display_quotes_strings() {
    let expr = Expr::eq("u.name", Operand::literal("O'Brien"));
    assert_eq!(expr.to_string(), "u.name = 'O''Brien'");
}

// ============================================================================
// Ordering and pagination
// ============================================================================

#[test]
fn multi_key_ordering() {
    let backend = MemoryBackend::new(vec![
        json!({"id": 1, "g": 2, "n": "b"}),
        json!({"id": 2, "g": 1, "n": "z"}),
        json!({"id": 3, "g": 2, "n": "a"}),
    ]);
    let mut qb = QueryBuilder::new("r");
    qb.add_order_by("r.g", Dir::Desc).add_order_by("r.n", Dir::Asc);
    assert_eq!(ids(&backend.fetch(&qb).unwrap()), vec![3, 1, 2]);
}

#[test]
fn nulls_sort_last_descending() {
    let mut qb = QueryBuilder::new("u");
    qb.order_by("u.age", Dir::Desc);
    assert_eq!(ids(&users().fetch(&qb).unwrap()), vec![2, 1, 3, 4]);
}

#[test]
fn offset_past_end_is_empty() {
    let mut qb = QueryBuilder::new("u");
    qb.set_first_result(Some(10));
    assert!(users().fetch(&qb).unwrap().is_empty());
}

#[test]
fn orderings_accessor_reflects_builder() {
    let mut qb = QueryBuilder::new("u");
    qb.add_order_by("u.a", Dir::Desc);
    assert_eq!(qb.orderings(), &[OrderBy::desc("u.a")]);
}

// ============================================================================
// Scalar projections
// ============================================================================

#[test]
fn scalar_projects_distinct_values() {
    let mut qb = QueryBuilder::new("u");
    qb.select(Selection::field("u.kind").alias("value"))
        .distinct(true)
        .order_by("u.kind", Dir::Asc);
    let rows = users().scalar(&qb).unwrap();
    let values: Vec<_> = rows.iter().map(|r| r["value"].clone()).collect();
    assert_eq!(
        values,
        vec![json!("App\\Entity\\Admin"), json!("App\\Entity\\User"), Value::Null]
    );
}

#[test]
fn scalar_without_selection_returns_root() {
    let qb = QueryBuilder::new("u");
    let rows = users().scalar(&qb).unwrap();
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[0]["u"]["name"], json!("Ada"));
}

#[test]
fn scalar_group_by_keeps_first_of_each_group() {
    let backend = MemoryBackend::new(vec![
        json!({"t": "x", "v": 1}),
        json!({"t": "y", "v": 2}),
        json!({"t": "x", "v": 3}),
    ]);
    let mut qb = QueryBuilder::new("r");
    qb.select(Selection::field("r.t").alias("t")).group_by("r.t");
    let rows = backend.scalar(&qb).unwrap();
    assert_eq!(rows.len(), 2);
}
