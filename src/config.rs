//! Graph handle configuration
//!
//! ```yaml
//! graph_name: http://example.org/people
//! options:
//!   rule_set: urn:example:rules
//!   same_as: true
//! resources:
//!   fetch_size: 500
//!   query_timeout_secs: 30
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid value: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Graph name that stands for the store's unnamed default graph
pub const DEFAULT_GRAPH: &str = "virt:DEFAULT";

/// Rows per round trip unless configured otherwise
pub const DEFAULT_FETCH_SIZE: u32 = 200;

/// Per-handle query options
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryOptions {
    /// Inference rule set applied to reads
    pub rule_set: Option<String>,
    /// Expand owl:sameAs during reads
    pub same_as: bool,
    /// Ignore the graph name and read from every graph
    pub read_all_graphs: bool,
}

/// Per-statement resource settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceSettings {
    pub fetch_size: u32,
    /// 0 = no limit
    pub query_timeout_secs: u64,
}

impl Default for ResourceSettings {
    fn default() -> Self {
        Self {
            fetch_size: DEFAULT_FETCH_SIZE,
            query_timeout_secs: 0,
        }
    }
}

impl ResourceSettings {
    /// The timeout to hand to the store, if any
    pub fn query_timeout(&self) -> Option<Duration> {
        (self.query_timeout_secs > 0).then(|| Duration::from_secs(self.query_timeout_secs))
    }
}

/// Everything a graph handle is configured with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    pub graph_name: String,
    pub options: QueryOptions,
    pub resources: ResourceSettings,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            graph_name: DEFAULT_GRAPH.to_string(),
            options: QueryOptions::default(),
            resources: ResourceSettings::default(),
        }
    }
}

impl GraphConfig {
    pub fn from_yaml_str(text: &str) -> ConfigResult<Self> {
        let config: GraphConfig = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    pub fn to_yaml(&self) -> ConfigResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.graph_name.is_empty() {
            return Err(ConfigError::Invalid("graph_name must not be empty".to_string()));
        }
        if self.resources.fetch_size == 0 {
            return Err(ConfigError::Invalid("fetch_size must be positive".to_string()));
        }
        if matches!(&self.options.rule_set, Some(rs) if rs.contains('\'')) {
            return Err(ConfigError::Invalid("rule_set must not contain quotes".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GraphConfig::default();
        assert_eq!(config.graph_name, DEFAULT_GRAPH);
        assert_eq!(config.resources.fetch_size, 200);
        assert_eq!(config.resources.query_timeout(), None);
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let config = GraphConfig::from_yaml_str("options:\n  same_as: true\n").unwrap();
        assert!(config.options.same_as);
        assert_eq!(config.options.rule_set, None);
        assert_eq!(config.graph_name, DEFAULT_GRAPH);
    }

    #[test]
    fn test_timeout_only_when_positive() {
        let settings = ResourceSettings {
            fetch_size: 10,
            query_timeout_secs: 30,
        };
        assert_eq!(settings.query_timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            GraphConfig::from_yaml_str("resources:\n  fetch_size: 0\n"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            GraphConfig::from_yaml_str("graph_name: [1, 2"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_yaml_round_trip() {
        let mut config = GraphConfig::default();
        config.options.rule_set = Some("urn:rules".into());
        let text = config.to_yaml().unwrap();
        assert_eq!(GraphConfig::from_yaml_str(&text).unwrap(), config);
    }
}
