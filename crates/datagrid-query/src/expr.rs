//! Expression trees for WHERE clauses.
//!
//! An [`Expr`] compares [`Operand`]s: row paths, named parameters, literal
//! values or a `COALESCE` of a path with a fallback. Expressions render to
//! DQL-like text through `Display` and evaluate against JSON rows.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;

use crate::error::{QueryError, Result};
use crate::value::{compare, like_regex, lookup, loose_eq, to_text};

static NULL: Value = Value::Null;

/// Strips the optional `:` prefix of a parameter name.
pub fn normalize_param(name: &str) -> String {
    name.trim_start_matches(':').to_string()
}

/// One side of a comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// A query path such as `u.name`.
    Path(String),
    /// A named parameter, stored without the `:` prefix.
    Param(String),
    /// An inline literal value.
    Literal(Value),
    /// `COALESCE(operand, fallback)`.
    Coalesce(Box<Operand>, Value),
}

impl Operand {
    /// A query path operand.
    pub fn path(path: impl Into<String>) -> Self {
        Operand::Path(path.into())
    }

    /// A parameter operand; a leading `:` is accepted and ignored.
    pub fn param(name: &str) -> Self {
        Operand::Param(normalize_param(name))
    }

    /// A literal operand.
    pub fn literal(value: impl Into<Value>) -> Self {
        Operand::Literal(value.into())
    }

    /// Wraps `inner` in `COALESCE(inner, fallback)`.
    pub fn coalesce(inner: impl Into<Operand>, fallback: impl Into<Value>) -> Self {
        Operand::Coalesce(Box::new(inner.into()), fallback.into())
    }

    fn evaluate<'a>(&'a self, ctx: &EvalContext<'a>) -> Result<Cow<'a, Value>> {
        match self {
            Operand::Path(path) => Ok(Cow::Borrowed(
                lookup(ctx.row, ctx.root_alias, path).unwrap_or(&NULL),
            )),
            Operand::Param(name) => ctx
                .params
                .get(name)
                .map(Cow::Borrowed)
                .ok_or_else(|| QueryError::UnboundParameter(name.clone())),
            Operand::Literal(value) => Ok(Cow::Borrowed(value)),
            Operand::Coalesce(inner, fallback) => {
                let value = inner.evaluate(ctx)?;
                if value.is_null() {
                    Ok(Cow::Borrowed(fallback))
                } else {
                    Ok(value)
                }
            }
        }
    }

    /// Evaluates this operand against a row.
    pub fn value_in<'a>(
        &'a self,
        row: &'a Value,
        root_alias: &'a str,
        params: &'a BTreeMap<String, Value>,
    ) -> Result<Cow<'a, Value>> {
        self.evaluate(&EvalContext {
            row,
            root_alias,
            params,
        })
    }
}

/// Strings starting with `:` are parameters, anything else is a path.
impl From<&str> for Operand {
    fn from(s: &str) -> Self {
        if s.starts_with(':') {
            Operand::param(s)
        } else {
            Operand::path(s)
        }
    }
}

impl From<String> for Operand {
    fn from(s: String) -> Self {
        Operand::from(s.as_str())
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Path(path) => write!(f, "{path}"),
            Operand::Param(name) => write!(f, ":{name}"),
            Operand::Literal(value) => write_literal(f, value),
            Operand::Coalesce(inner, fallback) => {
                write!(f, "COALESCE({inner}, ")?;
                write_literal(f, fallback)?;
                write!(f, ")")
            }
        }
    }
}

fn write_literal(f: &mut fmt::Formatter<'_>, value: &Value) -> fmt::Result {
    match value {
        Value::String(s) => write!(f, "'{}'", s.replace('\'', "''")),
        Value::Null => write!(f, "NULL"),
        other => write!(f, "{other}"),
    }
}

/// A boolean expression over operands.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// `a = b`
    Eq(Operand, Operand),
    /// `a <> b`
    Neq(Operand, Operand),
    /// `a LIKE b`
    Like(Operand, Operand),
    /// `a >= b`
    Gte(Operand, Operand),
    /// `a <= b`
    Lte(Operand, Operand),
    /// `a BETWEEN low AND high`
    Between(Operand, Operand, Operand),
    /// `a IS NULL`
    IsNull(Operand),
    /// Disjunction; empty matches everything.
    Or(Vec<Expr>),
    /// Conjunction; empty matches everything.
    And(Vec<Expr>),
}

impl Expr {
    /// `left = right`
    pub fn eq(left: impl Into<Operand>, right: impl Into<Operand>) -> Self {
        Expr::Eq(left.into(), right.into())
    }

    /// `left <> right`
    pub fn neq(left: impl Into<Operand>, right: impl Into<Operand>) -> Self {
        Expr::Neq(left.into(), right.into())
    }

    /// `left LIKE right`
    pub fn like(left: impl Into<Operand>, right: impl Into<Operand>) -> Self {
        Expr::Like(left.into(), right.into())
    }

    /// `left >= right`
    pub fn gte(left: impl Into<Operand>, right: impl Into<Operand>) -> Self {
        Expr::Gte(left.into(), right.into())
    }

    /// `left <= right`
    pub fn lte(left: impl Into<Operand>, right: impl Into<Operand>) -> Self {
        Expr::Lte(left.into(), right.into())
    }

    /// `value BETWEEN low AND high`
    pub fn between(
        value: impl Into<Operand>,
        low: impl Into<Operand>,
        high: impl Into<Operand>,
    ) -> Self {
        Expr::Between(value.into(), low.into(), high.into())
    }

    /// `operand IS NULL`
    pub fn is_null(operand: impl Into<Operand>) -> Self {
        Expr::IsNull(operand.into())
    }

    /// OR of all parts.
    pub fn or_x(parts: impl IntoIterator<Item = Expr>) -> Self {
        Expr::Or(parts.into_iter().collect())
    }

    /// AND of all parts.
    pub fn and_x(parts: impl IntoIterator<Item = Expr>) -> Self {
        Expr::And(parts.into_iter().collect())
    }

    /// Names of all parameters referenced by this expression.
    pub fn parameter_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_params(&mut names);
        names
    }

    fn collect_params<'a>(&'a self, out: &mut Vec<&'a str>) {
        fn operand<'a>(op: &'a Operand, out: &mut Vec<&'a str>) {
            match op {
                Operand::Param(name) => out.push(name),
                Operand::Coalesce(inner, _) => operand(inner, out),
                Operand::Path(_) | Operand::Literal(_) => {}
            }
        }
        match self {
            Expr::Eq(a, b) | Expr::Neq(a, b) | Expr::Like(a, b) | Expr::Gte(a, b) | Expr::Lte(a, b) => {
                operand(a, out);
                operand(b, out);
            }
            Expr::Between(a, low, high) => {
                operand(a, out);
                operand(low, out);
                operand(high, out);
            }
            Expr::IsNull(a) => operand(a, out),
            Expr::Or(parts) | Expr::And(parts) => parts.iter().for_each(|p| p.collect_params(out)),
        }
    }

    /// Tests this expression against a row.
    ///
    /// Comparisons involving null are false, as in SQL.
    pub fn matches(
        &self,
        row: &Value,
        root_alias: &str,
        params: &BTreeMap<String, Value>,
    ) -> Result<bool> {
        self.evaluate(&EvalContext {
            row,
            root_alias,
            params,
        })
    }

    fn evaluate(&self, ctx: &EvalContext<'_>) -> Result<bool> {
        match self {
            Expr::Eq(a, b) => {
                let (a, b) = (a.evaluate(ctx)?, b.evaluate(ctx)?);
                Ok(loose_eq(&a, &b))
            }
            Expr::Neq(a, b) => {
                let (a, b) = (a.evaluate(ctx)?, b.evaluate(ctx)?);
                Ok(!a.is_null() && !b.is_null() && !loose_eq(&a, &b))
            }
            Expr::Like(a, b) => {
                let (value, pattern) = (a.evaluate(ctx)?, b.evaluate(ctx)?);
                match (to_text(&value), to_text(&pattern)) {
                    (Some(text), Some(pattern)) => Ok(like_regex(&pattern)?.is_match(&text)),
                    _ => Ok(false),
                }
            }
            Expr::Gte(a, b) => {
                let (a, b) = (a.evaluate(ctx)?, b.evaluate(ctx)?);
                Ok(matches!(
                    compare(&a, &b),
                    Some(std::cmp::Ordering::Greater | std::cmp::Ordering::Equal)
                ))
            }
            Expr::Lte(a, b) => {
                let (a, b) = (a.evaluate(ctx)?, b.evaluate(ctx)?);
                Ok(matches!(
                    compare(&a, &b),
                    Some(std::cmp::Ordering::Less | std::cmp::Ordering::Equal)
                ))
            }
            Expr::Between(a, low, high) => {
                let (value, low, high) = (a.evaluate(ctx)?, low.evaluate(ctx)?, high.evaluate(ctx)?);
                let above = matches!(
                    compare(&value, &low),
                    Some(std::cmp::Ordering::Greater | std::cmp::Ordering::Equal)
                );
                let below = matches!(
                    compare(&value, &high),
                    Some(std::cmp::Ordering::Less | std::cmp::Ordering::Equal)
                );
                Ok(above && below)
            }
            Expr::IsNull(a) => Ok(a.evaluate(ctx)?.is_null()),
            Expr::Or(parts) => {
                if parts.is_empty() {
                    return Ok(true);
                }
                for part in parts {
                    if part.evaluate(ctx)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Expr::And(parts) => {
                for part in parts {
                    if !part.evaluate(ctx)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Eq(a, b) => write!(f, "{a} = {b}"),
            Expr::Neq(a, b) => write!(f, "{a} <> {b}"),
            Expr::Like(a, b) => write!(f, "{a} LIKE {b}"),
            Expr::Gte(a, b) => write!(f, "{a} >= {b}"),
            Expr::Lte(a, b) => write!(f, "{a} <= {b}"),
            Expr::Between(a, low, high) => write!(f, "{a} BETWEEN {low} AND {high}"),
            Expr::IsNull(a) => write!(f, "{a} IS NULL"),
            Expr::Or(parts) => write_composite(f, parts, "OR"),
            Expr::And(parts) => write_composite(f, parts, "AND"),
        }
    }
}

// A single part renders bare; several parts are parenthesized.
fn write_composite(f: &mut fmt::Formatter<'_>, parts: &[Expr], separator: &str) -> fmt::Result {
    match parts {
        [] => Ok(()),
        [single] => write!(f, "{single}"),
        many => {
            for (idx, part) in many.iter().enumerate() {
                if idx > 0 {
                    write!(f, " {separator} ")?;
                }
                write!(f, "({part})")?;
            }
            Ok(())
        }
    }
}

struct EvalContext<'a> {
    row: &'a Value,
    root_alias: &'a str,
    params: &'a BTreeMap<String, Value>,
}
