use figment::Figment;
use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to read migration configuration: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        ConfigError::Figment(Box::new(err))
    }
}

/// Live migration flags.
///
/// ```yaml
/// migration:
///   use_new_implementation: true
///   logging_enabled: true
///   fallback_to_legacy_enabled: true
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationConfig {
    /// Route to the new implementation when the caller context allows it.
    pub use_new_implementation: bool,
    /// Emit a log event for every routing decision.
    pub logging_enabled: bool,
    /// Retry a failed new-path call on the legacy implementation.
    pub fallback_to_legacy_enabled: bool,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            use_new_implementation: false,
            logging_enabled: true,
            fallback_to_legacy_enabled: true,
        }
    }
}

impl MigrationConfig {
    pub const SECTION: &'static str = "migration";

    /// Read the [`Self::SECTION`] key; defaults when the key is absent.
    ///
    /// # Errors
    /// Returns [`ConfigError`] if the section cannot be deserialized.
    pub fn from_figment(figment: &Figment) -> Result<Self, ConfigError> {
        Self::from_figment_at(figment, Self::SECTION)
    }

    /// # Errors
    /// Returns [`ConfigError`] if the section stored under `key` cannot be deserialized.
    pub fn from_figment_at(figment: &Figment, key: &str) -> Result<Self, ConfigError> {
        if figment.contains(key) {
            Ok(figment.extract_inner(key)?)
        } else {
            Ok(Self::default())
        }
    }
}
