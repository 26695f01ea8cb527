//! Runtime configuration for one composition host.
//!
//! # Responsibility
//! - Collect execution context, composition strategy, duplicate policy and
//!   logging settings in one value.
//! - Load that value from environment variables or JSON.
//!
//! # Invariants
//! - Values are trimmed and matched case-insensitively.
//! - Unknown values are rejected with a message naming the accepted set.

use crate::context::ExecutionContext;
use crate::logging::default_log_level;
use crate::plugin::registry::DuplicatePolicy;
use crate::rpc::injector::CompositionStrategy;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const ENV_CONTEXT: &str = "PLUGRPC_CONTEXT";
pub const ENV_STRATEGY: &str = "PLUGRPC_STRATEGY";
pub const ENV_DUPLICATE_POLICY: &str = "PLUGRPC_DUPLICATE_POLICY";
pub const ENV_LOG_LEVEL: &str = "PLUGRPC_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "PLUGRPC_LOG_DIR";

/// Host configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub execution_context: ExecutionContext,
    pub strategy: CompositionStrategy,
    pub duplicate_policy: DuplicatePolicy,
    pub log_level: String,
    /// Absolute directory for rolling log files; `None` disables file logging.
    pub log_dir: Option<String>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            execution_context: ExecutionContext::Trusted,
            strategy: CompositionStrategy::default(),
            duplicate_policy: DuplicatePolicy::default(),
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl RuntimeConfig {
    /// Client-side configuration; never sees collaborator services.
    pub fn untrusted() -> Self {
        Self {
            execution_context: ExecutionContext::Untrusted,
            ..Self::default()
        }
    }

    /// Reads configuration from `PLUGRPC_*` environment variables, falling
    /// back to defaults for unset ones.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Parses configuration from a JSON document; missing fields default.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(raw).map_err(|err| ConfigError::InvalidJson(err.to_string()))
    }

    pub(crate) fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(value) = lookup(ENV_CONTEXT) {
            config.execution_context = parse_execution_context(&value)?;
        }
        if let Some(value) = lookup(ENV_STRATEGY) {
            config.strategy = parse_strategy(&value)?;
        }
        if let Some(value) = lookup(ENV_DUPLICATE_POLICY) {
            config.duplicate_policy = parse_duplicate_policy(&value)?;
        }
        if let Some(value) = lookup(ENV_LOG_LEVEL) {
            config.log_level = value.trim().to_ascii_lowercase();
        }
        if let Some(value) = lookup(ENV_LOG_DIR) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                config.log_dir = Some(trimmed.to_string());
            }
        }
        Ok(config)
    }
}

pub fn parse_execution_context(value: &str) -> Result<ExecutionContext, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "trusted" | "server" => Ok(ExecutionContext::Trusted),
        "untrusted" | "client" => Ok(ExecutionContext::Untrusted),
        other => Err(ConfigError::UnsupportedValue {
            key: ENV_CONTEXT,
            value: other.to_string(),
            expected: "trusted|server|untrusted|client",
        }),
    }
}

pub fn parse_strategy(value: &str) -> Result<CompositionStrategy, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "registry" => Ok(CompositionStrategy::Registry),
        "embedded" => Ok(CompositionStrategy::Embedded),
        other => Err(ConfigError::UnsupportedValue {
            key: ENV_STRATEGY,
            value: other.to_string(),
            expected: "registry|embedded",
        }),
    }
}

pub fn parse_duplicate_policy(value: &str) -> Result<DuplicatePolicy, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "overwrite" => Ok(DuplicatePolicy::Overwrite),
        "keep_existing" | "keep-existing" => Ok(DuplicatePolicy::KeepExisting),
        "reject" => Ok(DuplicatePolicy::Reject),
        other => Err(ConfigError::UnsupportedValue {
            key: ENV_DUPLICATE_POLICY,
            value: other.to_string(),
            expected: "overwrite|keep_existing|reject",
        }),
    }
}

/// Configuration load errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    UnsupportedValue {
        key: &'static str,
        value: String,
        expected: &'static str,
    },
    InvalidJson(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedValue {
                key,
                value,
                expected,
            } => write!(f, "unsupported {key} value `{value}`; expected {expected}"),
            Self::InvalidJson(message) => write!(f, "invalid runtime config json: {message}"),
        }
    }
}

impl Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::{ConfigError, RuntimeConfig, ENV_CONTEXT, ENV_DUPLICATE_POLICY, ENV_LOG_DIR};
    use crate::context::ExecutionContext;
    use crate::plugin::registry::DuplicatePolicy;
    use crate::rpc::injector::CompositionStrategy;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_are_trusted_registry_overwrite() {
        let config = RuntimeConfig::from_lookup(lookup(&[])).expect("defaults");
        assert_eq!(config, RuntimeConfig::default());
        assert_eq!(config.execution_context, ExecutionContext::Trusted);
        assert_eq!(config.strategy, CompositionStrategy::Registry);
        assert_eq!(config.duplicate_policy, DuplicatePolicy::Overwrite);
    }

    #[test]
    fn lookup_values_are_normalized() {
        let config = RuntimeConfig::from_lookup(lookup(&[
            (ENV_CONTEXT, " Client "),
            (ENV_DUPLICATE_POLICY, "KEEP-EXISTING"),
            (ENV_LOG_DIR, "   "),
        ]))
        .expect("normalized config");
        assert_eq!(config.execution_context, ExecutionContext::Untrusted);
        assert_eq!(config.duplicate_policy, DuplicatePolicy::KeepExisting);
        assert!(config.log_dir.is_none());
    }

    #[test]
    fn rejects_unknown_values() {
        let err = RuntimeConfig::from_lookup(lookup(&[(ENV_CONTEXT, "browser")]))
            .expect_err("unknown context must fail");
        assert!(matches!(err, ConfigError::UnsupportedValue { key: ENV_CONTEXT, .. }));
        assert!(err.to_string().contains("browser"));
    }

    #[test]
    fn json_config_fills_missing_fields_with_defaults() {
        let config = RuntimeConfig::from_json_str(
            r#"{"execution_context": "untrusted", "strategy": "embedded"}"#,
        )
        .expect("json config");
        assert_eq!(config.execution_context, ExecutionContext::Untrusted);
        assert_eq!(config.strategy, CompositionStrategy::Embedded);
        assert_eq!(config.duplicate_policy, DuplicatePolicy::Overwrite);

        let err = RuntimeConfig::from_json_str("{").expect_err("broken json must fail");
        assert!(matches!(err, ConfigError::InvalidJson(_)));
    }
}
