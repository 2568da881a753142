//! Runtime configuration.

use thiserror::Error;

const TRACE_CAPACITY_ENV: &str = "WARDEN_TRACE_CAPACITY";
const COOP_THREAD_NAME_ENV: &str = "WARDEN_COOP_THREAD_NAME";

/// Configuration for a [`crate::runtime::Runtime`].
///
/// Governance limits (pool capacity, registry capacity, hierarchy depth,
/// child limit, yield period) are compile-time constants and not
/// configurable here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Capacity of the default telemetry ring buffer.
    pub trace_capacity: usize,
    /// Name of the cooperative scheduler's driver thread.
    pub coop_thread_name: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            trace_capacity: 4096,
            coop_thread_name: "warden-coop".to_string(),
        }
    }
}

impl RuntimeConfig {
    /// Builds a configuration from environment variables, falling back to
    /// defaults for unset variables.
    ///
    /// Recognized variables: `WARDEN_TRACE_CAPACITY` (positive integer),
    /// `WARDEN_COOP_THREAD_NAME` (non-empty string).
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Ok(value) = std::env::var(TRACE_CAPACITY_ENV) {
            config.trace_capacity = value
                .parse::<usize>()
                .ok()
                .filter(|&n| n > 0)
                .ok_or_else(|| ConfigError::InvalidValue {
                    var: TRACE_CAPACITY_ENV,
                    value: value.clone(),
                })?;
        }
        if let Ok(value) = std::env::var(COOP_THREAD_NAME_ENV) {
            if value.is_empty() {
                return Err(ConfigError::InvalidValue {
                    var: COOP_THREAD_NAME_ENV,
                    value,
                });
            }
            config.coop_thread_name = value;
        }
        Ok(config)
    }
}

/// Error building a [`RuntimeConfig`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// An environment variable held a malformed value.
    #[error("invalid value for {var}: {value:?}")]
    InvalidValue {
        /// The offending variable name.
        var: &'static str,
        /// The rejected value.
        value: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = RuntimeConfig::default();
        assert_eq!(config.trace_capacity, 4096);
        assert_eq!(config.coop_thread_name, "warden-coop");
    }
}
