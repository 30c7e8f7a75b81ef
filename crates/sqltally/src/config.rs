//! Inspector configuration.
//!
//! Settings can be built in code, loaded from JSON, or read from the
//! environment:
//!
//! - `SQLTALLY_DISABLED=1` - pass statements through without recording them
//! - `SQLTALLY_LOG_STATEMENTS=1` - log every inspected statement at `info`
//! - `SQLTALLY_RESIDUAL_CHECK=0` - skip the end-of-test "no unasserted
//!   statements" check

use std::env;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Error, Result};

/// Environment variable that disables recording.
pub const ENV_DISABLED: &str = "SQLTALLY_DISABLED";
/// Environment variable that enables statement logging.
pub const ENV_LOG_STATEMENTS: &str = "SQLTALLY_LOG_STATEMENTS";
/// Environment variable that toggles the residual-interaction check.
pub const ENV_RESIDUAL_CHECK: &str = "SQLTALLY_RESIDUAL_CHECK";

/// Configuration for a [`StatisticsCollector`](crate::StatisticsCollector)
/// and the [`DbAssertions`](crate::DbAssertions) built around it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InspectorConfig {
    /// Record classified statements (default: true)
    pub enabled: bool,
    /// Log every inspected SQL text at `info` (default: false)
    pub log_statements: bool,
    /// Fail a test that leaves recorded statements unasserted (default: true)
    pub residual_check: bool,
}

impl Default for InspectorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            log_statements: false,
            residual_check: true,
        }
    }
}

impl InspectorConfig {
    /// Default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable recording.
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Enable or disable statement logging.
    pub fn log_statements(mut self, log: bool) -> Self {
        self.log_statements = log;
        self
    }

    /// Enable or disable the residual-interaction check.
    pub fn residual_check(mut self, check: bool) -> Self {
        self.residual_check = check;
        self
    }

    /// Read the configuration from the process environment.
    ///
    /// Invalid values are logged and replaced by defaults. Use
    /// [`try_from_env`](Self::try_from_env) to surface them instead.
    #[must_use]
    pub fn from_env() -> Self {
        match Self::try_from_env() {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(target: "sqltally::config", error = %e, "ignoring invalid environment configuration");
                Self::default()
            }
        }
    }

    /// Read the configuration from the process environment, failing on
    /// values that are not recognizable booleans.
    pub fn try_from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read the configuration through `lookup`, which maps a variable name to
    /// its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            enabled: !flag(&lookup, ENV_DISABLED)?.unwrap_or(!defaults.enabled),
            log_statements: flag(&lookup, ENV_LOG_STATEMENTS)?.unwrap_or(defaults.log_statements),
            residual_check: flag(&lookup, ENV_RESIDUAL_CHECK)?.unwrap_or(defaults.residual_check),
        })
    }

    /// Parse a JSON object. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(Error::from)
    }
}

fn flag(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<bool>> {
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(Some(true)),
        "0" | "false" | "no" | "off" => Ok(Some(false)),
        _ => Err(ConfigError {
            key: key.to_string(),
            message: format!("expected a boolean, got '{raw}'"),
        }
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = InspectorConfig::default();
        assert!(config.enabled);
        assert!(!config.log_statements);
        assert!(config.residual_check);
    }

    #[test]
    fn test_builder() {
        let config = InspectorConfig::new()
            .enabled(false)
            .log_statements(true)
            .residual_check(false);
        assert!(!config.enabled);
        assert!(config.log_statements);
        assert!(!config.residual_check);
    }

    #[test]
    fn test_lookup_empty_is_default() {
        let config = InspectorConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, InspectorConfig::default());
    }

    #[test]
    fn test_lookup_values() {
        let config = InspectorConfig::from_lookup(lookup(&[
            (ENV_DISABLED, "yes"),
            (ENV_LOG_STATEMENTS, "TRUE"),
            (ENV_RESIDUAL_CHECK, "off"),
        ]))
        .unwrap();
        assert!(!config.enabled);
        assert!(config.log_statements);
        assert!(!config.residual_check);
    }

    #[test]
    fn test_lookup_invalid_value() {
        let err = InspectorConfig::from_lookup(lookup(&[(ENV_DISABLED, "maybe")])).unwrap_err();
        match err {
            Error::Config(e) => {
                assert_eq!(e.key, ENV_DISABLED);
                assert!(e.message.contains("maybe"));
            }
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn test_from_json_partial() {
        let config = InspectorConfig::from_json(r#"{"log_statements": true}"#).unwrap();
        assert!(config.enabled);
        assert!(config.log_statements);
        assert!(config.residual_check);
    }

    #[test]
    fn test_from_json_invalid() {
        assert!(matches!(
            InspectorConfig::from_json("{not json"),
            Err(Error::Serde(_))
        ));
    }
}
