//! Sort directions and order-by clauses.
//!
//! Request payloads carry directions as `"asc"`/`"desc"` strings; [`Dir`]
//! parses them. An [`OrderBy`] compares rows on one path with nulls last.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::error::QueryError;
use crate::value::{lookup, sort_compare};

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Dir {
    #[default]
    Asc,
    Desc,
}

impl Dir {
    /// Reverses `ordering` for [`Dir::Desc`].
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Dir::Asc => ordering,
            Dir::Desc => ordering.reverse(),
        }
    }

    /// The lowercase request spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            Dir::Asc => "asc",
            Dir::Desc => "desc",
        }
    }
}

impl fmt::Display for Dir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dir {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(Dir::Asc),
            "desc" => Ok(Dir::Desc),
            _ => Err(QueryError::InvalidDirection(s.to_string())),
        }
    }
}

/// One `ORDER BY` part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    /// Alias-qualified path, e.g. `u.name`.
    pub path: String,
    pub dir: Dir,
}

impl OrderBy {
    pub fn asc(path: impl Into<String>) -> Self {
        OrderBy {
            path: path.into(),
            dir: Dir::Asc,
        }
    }

    pub fn desc(path: impl Into<String>) -> Self {
        OrderBy {
            path: path.into(),
            dir: Dir::Desc,
        }
    }

    pub fn new(path: impl Into<String>, dir: Dir) -> Self {
        OrderBy {
            path: path.into(),
            dir,
        }
    }

    /// Compares two rows on this ordering's path.
    ///
    /// Nulls sort last regardless of direction.
    pub fn compare(&self, a: &Value, b: &Value, root_alias: &str) -> Ordering {
        let left = lookup(a, root_alias, &self.path).unwrap_or(&Value::Null);
        let right = lookup(b, root_alias, &self.path).unwrap_or(&Value::Null);
        match (left.is_null(), right.is_null()) {
            (false, false) => self.dir.apply(sort_compare(left, right)),
            _ => sort_compare(left, right),
        }
    }
}

impl fmt::Display for OrderBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.path, self.dir.as_str().to_uppercase())
    }
}

/// Compares two rows clause by clause; later clauses only break ties.
pub fn compare_by_orderings(a: &Value, b: &Value, orderings: &[OrderBy], root_alias: &str) -> Ordering {
    orderings
        .iter()
        .map(|order_by| order_by.compare(a, b, root_alias))
        .find(|ordering| ordering.is_ne())
        .unwrap_or(Ordering::Equal)
}
