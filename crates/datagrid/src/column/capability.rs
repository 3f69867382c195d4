//! Orderable, searchable and filterable capability values.

use serde_json::Value;

/// The configured value of a column capability.
///
/// Besides plain `true`/`false` a capability may be restricted to one
/// execution mode, written as `"server"` or `"client"` in options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Enabled,
    Disabled,
    /// Enabled only when the table runs server-side.
    ServerOnly,
    /// Enabled only when the table runs client-side.
    ClientOnly,
}

impl Capability {
    pub const SERVER: &'static str = "server";
    pub const CLIENT: &'static str = "client";

    /// Parses an option value. Anything unrecognised counts as disabled.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Bool(true) => Capability::Enabled,
            Value::String(s) if s == Self::SERVER => Capability::ServerOnly,
            Value::String(s) if s == Self::CLIENT => Capability::ClientOnly,
            _ => Capability::Disabled,
        }
    }

    pub fn to_value(self) -> Value {
        match self {
            Capability::Enabled => Value::Bool(true),
            Capability::Disabled => Value::Bool(false),
            Capability::ServerOnly => Value::from(Self::SERVER),
            Capability::ClientOnly => Value::from(Self::CLIENT),
        }
    }

    /// Whether the capability holds in the given execution mode.
    pub fn resolve(self, server_side: bool) -> bool {
        match self {
            Capability::Enabled => true,
            Capability::Disabled => false,
            Capability::ServerOnly => server_side,
            Capability::ClientOnly => !server_side,
        }
    }

    /// An unqualified `true` on a table that is not server-side means
    /// client-side only.
    pub fn downgrade(self, server_side: bool) -> Self {
        if !server_side && self == Capability::Enabled {
            Capability::ClientOnly
        } else {
            self
        }
    }
}

/// Resolves a raw option value in the given execution mode.
pub fn resolve_capability(value: &Value, server_side: bool) -> bool {
    Capability::from_value(value).resolve(server_side)
}
