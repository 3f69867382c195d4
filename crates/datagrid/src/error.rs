//! Error types for the datagrid crate.
//!
//! [`ConfigurationError`] covers option resolution failures. Everything else
//! surfaces as a [`DatagridError`].

use thiserror::Error;

fn quoted(names: &[String]) -> String {
    names
        .iter()
        .map(|name| format!("\"{name}\""))
        .collect::<Vec<_>>()
        .join(", ")
}

fn chain(names: &[String], separator: &str) -> String {
    names
        .iter()
        .map(|name| format!("\"{name}\""))
        .collect::<Vec<_>>()
        .join(separator)
}

/// Errors raised while resolving options against a schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// An input key is not part of the schema.
    #[error("The option \"{name}\" does not exist. Defined options are: {}.", quoted(.defined))]
    UndefinedOption { name: String, defined: Vec<String> },

    /// One or more required options were not supplied.
    #[error("{}", missing_message(.names))]
    MissingRequired { names: Vec<String> },

    /// A value does not match any allowed type.
    #[error(
        "The option \"{name}\" with value {value} is expected to be of type {}, but is of type \"{actual}\".",
        chain(.expected, " or ")
    )]
    InvalidType {
        name: String,
        value: String,
        expected: Vec<String>,
        actual: String,
    },

    /// A value is not one of the allowed values.
    #[error("The option \"{name}\" with value {value} is invalid.{}", accepted_suffix(.accepted))]
    InvalidValue {
        name: String,
        value: String,
        accepted: Vec<String>,
    },

    /// An option was read during resolution but has no value.
    #[error("The option \"{name}\" has no value.")]
    NoValue { name: String },

    /// Lazy defaults or normalizers depend on each other.
    #[error("The options {} have a cyclic dependency.", quoted(.names))]
    Cycle { names: Vec<String> },

    /// A normalizer rejected a combination of options.
    #[error("{0}")]
    Constraint(String),
}

fn missing_message(names: &[String]) -> String {
    if names.len() == 1 {
        format!("The required option \"{}\" is missing.", names[0])
    } else {
        format!("The required options {} are missing.", quoted(names))
    }
}

fn accepted_suffix(accepted: &[String]) -> String {
    if accepted.is_empty() {
        String::new()
    } else {
        format!(" Accepted values are: {}.", accepted.join(", "))
    }
}

/// Errors that can occur while building or querying a table.
#[derive(Debug, Error)]
pub enum DatagridError {
    /// Options failed to resolve.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// A type name is not registered.
    #[error("unknown {family} type '{name}'")]
    UnknownType { family: &'static str, name: String },

    /// A type's parent chain loops back on itself.
    #[error("cycle detected in {family} type hierarchy: {}", .path.join(" -> "))]
    TypeCycle {
        family: &'static str,
        path: Vec<String>,
    },

    /// Deferred before/after positions form a loop.
    #[error(
        "The column ordering cannot be resolved due to conflict in {position} positions ({}).",
        chain(.path, " => ")
    )]
    CircularOrdering { position: String, path: Vec<String> },

    /// Two columns are placed before and after each other.
    #[error("The column ordering does not support symmetrical before/after option (\"{a}\" <=> \"{b}\").")]
    SymmetricOrdering { a: String, b: String },

    /// Server-side data was requested before a request was handled.
    #[error("you must call handle_request before creating JSON data for a server-side table")]
    RequestNotHandled,

    /// A column path is not part of the table.
    #[error("column '{0}' does not exist")]
    UnknownColumn(String),

    /// The query backend failed.
    #[error(transparent)]
    Query(#[from] datagrid_query::QueryError),

    /// A column template failed to render.
    #[error("template error: {0}")]
    Template(String),

    /// Bundle configuration could not be loaded.
    #[error("configuration file error: {0}")]
    Config(String),

    /// A global `tracing` subscriber could not be installed.
    #[error("logging initialization failed: {0}")]
    Logging(String),
}

impl From<minijinja::Error> for DatagridError {
    fn from(err: minijinja::Error) -> Self {
        DatagridError::Template(err.to_string())
    }
}

/// Result type for datagrid operations.
pub type Result<T> = std::result::Result<T, DatagridError>;
