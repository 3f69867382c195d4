//! Error types for the query crate.

use thiserror::Error;

/// Errors that can occur while building or executing a query.
#[derive(Debug, Error)]
pub enum QueryError {
    /// An expression references a parameter that was never bound.
    #[error("parameter ':{0}' is referenced but not bound")]
    UnboundParameter(String),

    /// A sort direction string was neither `asc` nor `desc`.
    #[error("invalid sort direction '{0}', expected 'asc' or 'desc'")]
    InvalidDirection(String),

    /// A LIKE pattern could not be compiled.
    #[error("invalid LIKE pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// Result type alias for query operations.
pub type Result<T> = std::result::Result<T, QueryError>;
