//! Configuration validation rules.
//!
//! Validation logic for `AppConfig` values after they have been loaded
//! from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `user_agent` is empty
    /// - `max_attempts` is 0
    /// - backoff bounds are inverted or the multiplier is not positive
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_ms < 100 {
            return Err(ConfigError::Invalid { field: "timeout_ms".into(), reason: "must be at least 100ms".into() });
        }
        if self.timeout_ms > 300_000 {
            return Err(ConfigError::Invalid {
                field: "timeout_ms".into(),
                reason: "must not exceed 5 minutes (300000ms)".into(),
            });
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        if self.max_attempts == 0 {
            return Err(ConfigError::Invalid { field: "max_attempts".into(), reason: "must be at least 1".into() });
        }

        if self.backoff_min_ms > self.backoff_max_ms {
            return Err(ConfigError::Invalid {
                field: "backoff_min_ms".into(),
                reason: "must not exceed backoff_max_ms".into(),
            });
        }

        if self.backoff_multiplier <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "backoff_multiplier".into(),
                reason: "must be greater than 0".into(),
            });
        }

        if self.min_delay_ms > 60_000 {
            tracing::warn!(min_delay_ms = self.min_delay_ms, "politeness delay exceeds one minute");
        }

        Ok(())
    }
}
