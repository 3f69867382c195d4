//! Property-based tests for the query crate using proptest.

use datagrid_query::{like_match, Backend, Dir, Expr, MemoryBackend, QueryBuilder};
use proptest::prelude::*;
use serde_json::{json, Value};

// ============================================================================
// Test helpers
// ============================================================================

fn rows_strategy() -> impl Strategy<Value = Vec<Value>> {
    prop::collection::vec(
        (any::<i32>(), "[a-z]{1,8}").prop_map(|(n, s)| json!({"n": n, "s": s})),
        0..40,
    )
}

// ============================================================================
// Property tests
// ============================================================================

proptest! {
    /// A literal string without wildcards always matches itself.
    #[test]
    fn like_matches_itself(text in "[a-zA-Z0-9 .()\\[\\]+*?]{0,20}") {
        prop_assert!(like_match(&text, &text).unwrap());
    }

    /// Wrapping any needle in `%` matches any haystack containing it.
    #[test]
    fn like_contains(prefix in "[a-z]{0,5}", needle in "[a-z]{0,5}", suffix in "[a-z]{0,5}") {
        let haystack = format!("{prefix}{needle}{suffix}");
        let pattern = format!("%{}%", needle.to_uppercase());
        prop_assert!(like_match(&haystack, &pattern).unwrap());
    }

    /// Filtering never returns more rows than the backend holds.
    #[test]
    fn fetch_never_grows(rows in rows_strategy(), threshold in any::<i32>()) {
        let backend = MemoryBackend::new(rows.clone());
        let mut qb = QueryBuilder::new("r");
        qb.and_where(Expr::gte("r.n", ":t")).set_parameter("t", threshold);
        let out = backend.fetch(&qb).unwrap();
        prop_assert!(out.len() <= rows.len());
        prop_assert_eq!(out.len(), backend.count(&qb).unwrap());
    }

    /// Ascending order yields non-decreasing values.
    #[test]
    fn ordering_is_sorted(rows in rows_strategy()) {
        let backend = MemoryBackend::new(rows);
        let mut qb = QueryBuilder::new("r");
        qb.order_by("r.n", Dir::Asc);
        let out = backend.fetch(&qb).unwrap();
        for pair in out.windows(2) {
            prop_assert!(pair[0]["n"].as_i64() <= pair[1]["n"].as_i64());
        }
    }

    /// Pagination returns at most `limit` rows and skips `offset` rows.
    #[test]
    fn pagination_bounds(rows in rows_strategy(), offset in 0usize..50, limit in 0usize..50) {
        let total = rows.len();
        let backend = MemoryBackend::new(rows);
        let mut qb = QueryBuilder::new("r");
        qb.set_first_result(Some(offset)).set_max_results(Some(limit));
        let out = backend.fetch(&qb).unwrap();
        prop_assert_eq!(out.len(), total.saturating_sub(offset).min(limit));
    }

    /// Mutating a clone never affects the original.
    #[test]
    fn clone_isolation(name in "[a-z]{1,8}", value in any::<i64>()) {
        let base = QueryBuilder::new("r");
        let mut copy = base.clone();
        copy.set_parameter(&name, value).and_where(Expr::is_null("r.x"));
        prop_assert!(base.parameters().is_empty());
        prop_assert!(base.conditions().is_empty());
        prop_assert_eq!(copy.parameters().len(), 1);
    }
}
