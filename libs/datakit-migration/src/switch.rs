use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::MigrationConfig;

/// Owner of the live [`MigrationConfig`].
///
/// Readers get an immutable snapshot; writers publish a whole new value.
/// Clones share the same cell, so an operator handle and the routers it
/// controls observe the same configuration.
#[derive(Debug, Clone, Default)]
pub struct MigrationSwitch {
    current: Arc<ArcSwap<MigrationConfig>>,
}

impl MigrationSwitch {
    #[must_use]
    pub fn new(config: MigrationConfig) -> Self {
        Self {
            current: Arc::new(ArcSwap::from_pointee(config)),
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> Arc<MigrationConfig> {
        self.current.load_full()
    }

    /// Replace the configuration wholesale; last writer wins.
    pub fn publish(&self, config: MigrationConfig) {
        self.current.store(Arc::new(config));
        tracing::info!(
            use_new_implementation = config.use_new_implementation,
            logging_enabled = config.logging_enabled,
            fallback_to_legacy_enabled = config.fallback_to_legacy_enabled,
            "migration configuration published"
        );
    }

    /// Derive the next configuration from the current one.
    pub fn update(&self, mut change: impl FnMut(&mut MigrationConfig)) {
        let mut published = MigrationConfig::default();
        self.current.rcu(|current| {
            let mut next = **current;
            change(&mut next);
            published = next;
            next
        });
        tracing::info!(
            use_new_implementation = published.use_new_implementation,
            logging_enabled = published.logging_enabled,
            fallback_to_legacy_enabled = published.fallback_to_legacy_enabled,
            "migration configuration updated"
        );
    }

    pub fn set_use_new_implementation(&self, enabled: bool) {
        self.update(|cfg| cfg.use_new_implementation = enabled);
    }

    pub fn set_fallback_to_legacy(&self, enabled: bool) {
        self.update(|cfg| cfg.fallback_to_legacy_enabled = enabled);
    }

    pub fn set_logging_enabled(&self, enabled: bool) {
        self.update(|cfg| cfg.logging_enabled = enabled);
    }
}
