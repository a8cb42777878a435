//! `data_access` configuration section.
//!
//! ```yaml
//! data_access:
//!   retry:
//!     retries: 3
//!     timeout: 30s
//!     base_delay: 1s
//!     max_delay: 10s
//!   circuit_breaker:
//!     failure_threshold: 5
//!     reset_timeout: 60s
//!   pagination:
//!     default_limit: 20
//!     max_limit: 100
//! ```

use std::sync::Arc;

use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::pagination::Paginator;
use crate::resilience::{CircuitBreaker, CircuitBreakerConfig, OperationWrapper, RetryPolicy};

/// Errors raised while loading configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Figment(Box<figment::Error>),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        ConfigError::Figment(Box::new(err))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DataAccessConfig {
    pub retry: RetryPolicy,
    /// Absent means no circuit breaking.
    pub circuit_breaker: Option<CircuitBreakerConfig>,
    pub pagination: Paginator,
}

impl DataAccessConfig {
    pub const SECTION: &'static str = "data_access";

    /// Read the [`Self::SECTION`] key; defaults when the key is absent.
    ///
    /// # Errors
    /// Returns [`ConfigError`] if the section cannot be deserialized or fails validation.
    pub fn from_figment(figment: &Figment) -> Result<Self, ConfigError> {
        Self::from_figment_at(figment, Self::SECTION)
    }

    /// Read the section stored under `key`.
    ///
    /// # Errors
    /// Returns [`ConfigError`] if the section cannot be deserialized or fails validation.
    pub fn from_figment_at(figment: &Figment, key: &str) -> Result<Self, ConfigError> {
        let cfg: Self = if figment.contains(key) {
            figment.extract_inner(key)?
        } else {
            Self::default()
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// # Errors
    /// Returns [`ConfigError::Invalid`] describing the first inconsistent value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pagination.max_limit == 0 {
            return Err(ConfigError::Invalid(
                "pagination.max_limit must be at least 1".to_owned(),
            ));
        }
        if self.pagination.default_limit == 0 {
            return Err(ConfigError::Invalid(
                "pagination.default_limit must be at least 1".to_owned(),
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "retry.max_attempts must be at least 1".to_owned(),
            ));
        }
        if self.retry.base_delay > self.retry.max_delay {
            return Err(ConfigError::Invalid(
                "retry.base_delay must not exceed retry.max_delay".to_owned(),
            ));
        }
        Ok(())
    }

    /// Wrapper for one operation family, with its own breaker when configured.
    pub fn wrapper(&self, family: &str) -> OperationWrapper {
        let wrapper = OperationWrapper::new(self.retry.clone());
        match &self.circuit_breaker {
            Some(cb) => {
                wrapper.with_circuit_breaker(Arc::new(CircuitBreaker::new(family, cb.clone())))
            }
            None => wrapper,
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use figment::providers::Serialized;
    use serde_json::json;
    use std::time::Duration;

    #[test]
    fn absent_section_yields_defaults() {
        let cfg = DataAccessConfig::from_figment(&Figment::new()).unwrap();
        assert_eq!(cfg, DataAccessConfig::default());
        assert!(cfg.wrapper("profiles").circuit_state().is_none());
    }

    #[test]
    fn partial_section_is_merged_with_defaults() {
        let figment = Figment::new().merge(Serialized::defaults(json!({
            "data_access": {
                "retry": { "retries": 5, "base_delay": "200ms" },
                "circuit_breaker": { "failure_threshold": 2 },
                "pagination": { "max_limit": 50 }
            }
        })));

        let cfg = DataAccessConfig::from_figment(&figment).unwrap();
        assert_eq!(cfg.retry.max_attempts, 5);
        assert_eq!(cfg.retry.base_delay, Duration::from_millis(200));
        assert_eq!(cfg.retry.timeout, Duration::from_secs(30));
        assert_eq!(cfg.pagination.max_limit, 50);
        assert_eq!(cfg.pagination.default_limit, 20);

        let cb = cfg.circuit_breaker.clone().unwrap();
        assert_eq!(cb.failure_threshold, 2);
        assert_eq!(cb.reset_timeout, Duration::from_secs(60));
        assert!(cfg.wrapper("profiles").circuit_state().is_some());
    }

    #[test]
    fn rejects_zero_max_limit() {
        let figment = Figment::new().merge(Serialized::defaults(json!({
            "data_access": { "pagination": { "max_limit": 0 } }
        })));
        let err = DataAccessConfig::from_figment(&figment).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn malformed_duration_is_a_figment_error() {
        let figment = Figment::new().merge(Serialized::defaults(json!({
            "data_access": { "retry": { "timeout": "soon" } }
        })));
        let err = DataAccessConfig::from_figment(&figment).unwrap_err();
        assert!(matches!(err, ConfigError::Figment(_)));
    }
}
