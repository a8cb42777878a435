//! Module declaration for the training data module.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use datakit_db::Store;
use figment::Figment;
use tracing::{debug, info};
use training_data_sdk::TrainingDataApi;

use crate::config::TrainingDataConfig;
use crate::facade::TrainingDataService;

/// Training data module.
///
/// `init` loads the module section, wires the unified and legacy
/// implementations over the given store and publishes the routing facade.
#[derive(Default)]
pub struct TrainingDataModule {
    service: ArcSwapOption<TrainingDataService>,
}

impl TrainingDataModule {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// # Errors
    /// Fails if the module configuration is invalid.
    pub fn init(&self, figment: &Figment, store: Arc<dyn Store>) -> anyhow::Result<()> {
        info!("Initializing training_data module");

        let cfg = TrainingDataConfig::from_figment(figment)?;
        debug!(
            use_new_implementation = cfg.migration.use_new_implementation,
            fallback_to_legacy_enabled = cfg.migration.fallback_to_legacy_enabled,
            max_attempts = cfg.data_access.retry.max_attempts,
            circuit_breaker = cfg.data_access.circuit_breaker.is_some(),
            "Loaded training_data config"
        );

        let service = Arc::new(TrainingDataService::from_config(store, &cfg));
        self.service.store(Some(service));

        info!("Training data module initialized");
        Ok(())
    }

    /// # Errors
    /// Fails if [`Self::init`] has not completed.
    pub fn service(&self) -> anyhow::Result<Arc<TrainingDataService>> {
        self.service
            .load_full()
            .ok_or_else(|| anyhow::anyhow!("training_data service not initialized"))
    }

    /// The facade as a trait object for other modules.
    ///
    /// # Errors
    /// Fails if [`Self::init`] has not completed.
    pub fn client(&self) -> anyhow::Result<Arc<dyn TrainingDataApi>> {
        let service: Arc<dyn TrainingDataApi> = self.service()?;
        Ok(service)
    }
}
