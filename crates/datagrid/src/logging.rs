//! Logging initialization.
//!
//! The crate emits `tracing` events under the `datagrid` target. Binaries
//! that do not install their own subscriber can call [`init`] at startup.

use tracing_subscriber::{util::SubscriberInitExt, EnvFilter};

use crate::error::{DatagridError, Result};

/// Logging profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    /// Human-readable output, debug level.
    Development,
    /// JSON structured output, info level.
    Production,
    /// No output; installs an empty registry.
    Test,
}

impl Profile {
    /// Filter used when `RUST_LOG` is unset or unparsable.
    fn default_directive(self) -> &'static str {
        match self {
            Profile::Development => "datagrid=debug",
            Profile::Production => "datagrid=info",
            Profile::Test => "off",
        }
    }

    fn filter(self) -> Result<EnvFilter> {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(self.default_directive()))
            .map_err(|err| DatagridError::Logging(err.to_string()))
    }
}

/// Installs the global subscriber for `profile`.
///
/// Fails with [`DatagridError::Logging`] when a global subscriber is
/// already set, so a second call reports the first one instead of
/// silently replacing nothing.
///
/// ```
/// use datagrid::logging::{init, Profile};
///
/// init(Profile::Test).unwrap();
/// assert!(init(Profile::Development).is_err());
/// ```
pub fn init(profile: Profile) -> Result<()> {
    let installed = match profile {
        Profile::Development => tracing_subscriber::fmt().with_env_filter(profile.filter()?).try_init(),
        Profile::Production => tracing_subscriber::fmt()
            .json()
            .with_env_filter(profile.filter()?)
            .try_init(),
        Profile::Test => tracing_subscriber::registry()
            .try_init()
            .map_err(Into::<Box<dyn std::error::Error + Send + Sync>>::into),
    };
    installed.map_err(|err| DatagridError::Logging(err.to_string()))?;
    tracing::debug!(?profile, "logging initialized");
    Ok(())
}
