//! Datagrid Query - a cloneable query builder for table backends.
//!
//! The query crate models the query-construction object a data table
//! mutates while answering a request: WHERE expressions built from paths,
//! named parameters and literals, ORDER BY parts, projections with
//! aggregates, GROUP BY, DISTINCT and pagination.
//!
//! - [`QueryBuilder`] is a plain value; `clone()` is a full structural copy
//! - [`Expr`] trees render to DQL-like text and evaluate against JSON rows
//! - [`Backend`] executes a query; [`MemoryBackend`] does so in memory
//!
//! # Quick Start
//!
//! ```rust
//! use datagrid_query::{Backend, Dir, Expr, MemoryBackend, Operand, QueryBuilder};
//! use serde_json::json;
//!
//! let backend = MemoryBackend::new(vec![
//!     json!({"name": "Ada Lovelace", "age": 36}),
//!     json!({"name": "Grace Hopper", "age": 85}),
//!     json!({"name": "Alan Turing", "age": null}),
//! ]);
//!
//! let mut query = QueryBuilder::new("u");
//! query
//!     .and_where(Expr::between(Operand::coalesce("u.age", 0), ":lo", ":hi"))
//!     .set_parameter("lo", 0)
//!     .set_parameter("hi", 50)
//!     .order_by("u.name", Dir::Desc);
//!
//! let rows = backend.fetch(&query).unwrap();
//! assert_eq!(rows.len(), 2);
//! assert_eq!(rows[0]["name"], "Alan Turing");
//! ```
//!
//! # Evaluation Semantics
//!
//! Evaluation follows SQL rather than Rust equality:
//!
//! - Comparisons involving null are false; use [`Expr::IsNull`] or
//!   [`Operand::Coalesce`]
//! - Numeric strings compare as numbers, date strings chronologically
//! - `LIKE` is case-insensitive with `%` and `_` wildcards
//! - Nulls sort last in both directions
//! - Referencing an unbound parameter is an error

mod backend;
mod error;
mod expr;
mod ordering;
mod query;
mod value;

// Re-export public API
pub use backend::{Backend, MemoryBackend};
pub use error::{QueryError, Result};
pub use expr::{normalize_param, Expr, Operand};
pub use ordering::{compare_by_orderings, Dir, OrderBy};
pub use query::{QueryBuilder, SelectKind, Selection};
pub use value::{as_datetime, as_number, compare, like_match, lookup, loose_eq, sort_compare, to_text};
