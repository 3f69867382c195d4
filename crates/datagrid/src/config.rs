//! Bundle-level configuration.
//!
//! Settings shared by every table, loaded from YAML:
//!
//! ```yaml
//! search:
//!   delay: 300
//! ```
//!
//! Missing keys fall back to their defaults. A table consults this
//! configuration only for options it leaves unset (currently
//! `search_delay`).

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{DatagridError, Result};

const DEFAULT_SEARCH_DELAY: i64 = 500;

/// Global search behaviour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Milliseconds to wait after the last keystroke before searching.
    pub delay: i64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            delay: DEFAULT_SEARCH_DELAY,
        }
    }
}

/// Settings applied to all tables.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatagridConfig {
    pub search: SearchConfig,
}

impl DatagridConfig {
    /// Parses configuration from a YAML document.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(DatagridConfig::default());
        }
        let config: DatagridConfig =
            serde_yaml::from_str(content).map_err(|e| DatagridError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads configuration from a YAML file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| DatagridError::Config(format!("{}: {}", path.display(), e)))?;
        tracing::debug!(path = %path.display(), "loading datagrid configuration");
        Self::from_yaml_str(&content)
    }

    fn validate(&self) -> Result<()> {
        if self.search.delay < 0 {
            return Err(DatagridError::Config(
                "Please provide a positive value as the delay in milliseconds or 0 for no delay"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults() {
        assert_eq!(DatagridConfig::default().search.delay, 500);
        assert_eq!(DatagridConfig::from_yaml_str("").unwrap().search.delay, 500);
    }

    #[test]
    fn partial_document_keeps_defaults() {
        let config = DatagridConfig::from_yaml_str("search: {}").unwrap();
        assert_eq!(config.search.delay, 500);
    }

    #[test]
    fn reads_delay() {
        let config = DatagridConfig::from_yaml_str("search:\n  delay: 0\n").unwrap();
        assert_eq!(config.search.delay, 0);
    }

    #[test]
    fn negative_delay_rejected() {
        let err = DatagridConfig::from_yaml_str("search:\n  delay: -1\n").unwrap_err();
        assert!(err.to_string().contains("positive value"));
    }

    #[test]
    fn malformed_yaml_rejected() {
        assert!(DatagridConfig::from_yaml_str("search: [").is_err());
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "search:\n  delay: 250").unwrap();
        let config = DatagridConfig::from_path(file.path()).unwrap();
        assert_eq!(config.search.delay, 250);
    }

    #[test]
    fn missing_file_is_config_error() {
        let err = DatagridConfig::from_path("/nonexistent/datagrid.yaml").unwrap_err();
        assert!(matches!(err, DatagridError::Config(_)));
    }
}
