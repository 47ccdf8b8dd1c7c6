//! Service configuration, read from the environment at startup.

use thiserror::Error;

pub const MAX_RETRIES_VAR: &str = "BOC_MAX_RETRIES";
pub const AGGREGATE_TYPE_VAR: &str = "BOC_AGGREGATE_TYPE";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Extra attempts after an optimistic concurrency conflict.
    pub max_retries: u32,
    /// Stream type recorded on every stored account event.
    pub aggregate_type: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            aggregate_type: "bank.account".to_string(),
        }
    }
}

impl ServiceConfig {
    /// Read overrides from the process environment; unset variables keep defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(raw) = lookup(MAX_RETRIES_VAR) {
            config.max_retries = raw.trim().parse().map_err(|e| ConfigError::Invalid {
                key: MAX_RETRIES_VAR,
                reason: format!("'{raw}': {e}"),
            })?;
        }

        if let Some(raw) = lookup(AGGREGATE_TYPE_VAR) {
            let value = raw.trim();
            if value.is_empty() {
                return Err(ConfigError::Invalid {
                    key: AGGREGATE_TYPE_VAR,
                    reason: "must not be empty".to_string(),
                });
            }
            config.aggregate_type = value.to_string();
        }

        Ok(config)
    }
}
