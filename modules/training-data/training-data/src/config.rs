//! Configuration for the training data module.
//!
//! Read from `modules.training_data.config`:
//!
//! ```yaml
//! modules:
//!   training_data:
//!     config:
//!       data_access:
//!         retry: { retries: 3, timeout: 30s }
//!         circuit_breaker: { failure_threshold: 5, reset_timeout: 60s }
//!       migration:
//!         use_new_implementation: true
//!       journal_capacity: 256
//! ```

use anyhow::Context;
use datakit_db::DataAccessConfig;
use datakit_migration::{MigrationConfig, RoutingJournal};
use figment::Figment;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct TrainingDataConfig {
    pub data_access: DataAccessConfig,
    pub migration: MigrationConfig,
    /// Routing decisions kept for inspection.
    pub journal_capacity: usize,
}

impl Default for TrainingDataConfig {
    fn default() -> Self {
        Self {
            data_access: DataAccessConfig::default(),
            migration: MigrationConfig::default(),
            journal_capacity: RoutingJournal::DEFAULT_CAPACITY,
        }
    }
}

impl TrainingDataConfig {
    pub const SECTION: &'static str = "modules.training_data.config";

    /// Load and validate the module section; defaults when it is absent.
    ///
    /// # Errors
    /// Fails if the section cannot be deserialized or the data-access part is inconsistent.
    pub fn from_figment(figment: &Figment) -> anyhow::Result<Self> {
        let cfg: Self = if figment.contains(Self::SECTION) {
            figment
                .extract_inner(Self::SECTION)
                .with_context(|| format!("invalid `{}` section", Self::SECTION))?
        } else {
            Self::default()
        };
        cfg.data_access
            .validate()
            .context("invalid training_data data_access settings")?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::providers::{Format, Serialized, Yaml};
    use serde_json::json;
    use std::time::Duration;

    #[test]
    fn test_default_config() {
        let cfg = TrainingDataConfig::from_figment(&Figment::new()).unwrap();
        assert_eq!(cfg, TrainingDataConfig::default());
        assert!(!cfg.migration.use_new_implementation);
        assert!(cfg.data_access.circuit_breaker.is_none());
    }

    #[test]
    fn test_yaml_section() {
        let figment = Figment::new().merge(Yaml::string(
            r"
modules:
  training_data:
    config:
      data_access:
        retry:
          retries: 2
          timeout: 5s
        circuit_breaker:
          failure_threshold: 3
      migration:
        use_new_implementation: true
        fallback_to_legacy_enabled: false
      journal_capacity: 10
",
        ));
        let cfg = TrainingDataConfig::from_figment(&figment).unwrap();
        assert_eq!(cfg.data_access.retry.max_attempts, 2);
        assert_eq!(cfg.data_access.retry.timeout, Duration::from_secs(5));
        assert_eq!(cfg.data_access.circuit_breaker.unwrap().failure_threshold, 3);
        assert!(cfg.migration.use_new_implementation);
        assert!(!cfg.migration.fallback_to_legacy_enabled);
        assert!(cfg.migration.logging_enabled);
        assert_eq!(cfg.journal_capacity, 10);
    }

    #[test]
    fn test_rejects_unknown_and_invalid_values() {
        let unknown = Figment::new().merge(Serialized::defaults(json!({
            "modules": { "training_data": { "config": { "retries": 3 } } }
        })));
        assert!(TrainingDataConfig::from_figment(&unknown).is_err());

        let invalid = Figment::new().merge(Serialized::defaults(json!({
            "modules": { "training_data": { "config": {
                "data_access": { "pagination": { "default_limit": 0 } }
            } } }
        })));
        let err = TrainingDataConfig::from_figment(&invalid).unwrap_err();
        assert!(format!("{err:#}").contains("default_limit"));
    }
}
