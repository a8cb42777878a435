use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;

use datakit_security::TenantContext;

use crate::{Implementation, MigrationConfig, MigrationSwitch, RoutingDecision, RoutingJournal};

/// Chooses between the new and legacy implementation of an operation.
///
/// The new path is taken only when the switch enables it and the caller
/// context is present with a primary tenant. A failed new-path call is
/// replayed on legacy when fallback is enabled; the new path is never
/// retried and legacy failures are returned as-is.
#[derive(Debug, Clone, Default)]
pub struct MigrationRouter {
    switch: MigrationSwitch,
    journal: Option<Arc<RoutingJournal>>,
}

impl MigrationRouter {
    #[must_use]
    pub fn new(switch: MigrationSwitch) -> Self {
        Self {
            switch,
            journal: None,
        }
    }

    #[must_use]
    pub fn with_journal(mut self, journal: Arc<RoutingJournal>) -> Self {
        self.journal = Some(journal);
        self
    }

    #[must_use]
    pub fn switch(&self) -> &MigrationSwitch {
        &self.switch
    }

    #[must_use]
    pub fn journal(&self) -> Option<&Arc<RoutingJournal>> {
        self.journal.as_ref()
    }

    /// Run `operation` on the implementation selected by the current
    /// configuration snapshot.
    ///
    /// # Errors
    /// Returns the error of the implementation that served the call last:
    /// legacy after a fallback, otherwise whichever path was selected.
    pub async fn route<T, E, N, NFut, L, LFut>(
        &self,
        operation: &str,
        ctx: Option<&TenantContext>,
        new_impl: N,
        legacy_impl: L,
    ) -> Result<T, E>
    where
        E: Display,
        N: FnOnce() -> NFut,
        NFut: Future<Output = Result<T, E>>,
        L: FnOnce() -> LFut,
        LFut: Future<Output = Result<T, E>>,
    {
        let cfg = self.switch.snapshot();
        let context_valid = ctx.is_some_and(TenantContext::has_primary_tenant);

        if !(cfg.use_new_implementation && context_valid) {
            if cfg.use_new_implementation && cfg.logging_enabled {
                tracing::debug!(op = operation, "no usable tenant context, routing to legacy");
            }
            let result = legacy_impl().await;
            self.record(&cfg, RoutingDecision::new(operation, Implementation::Legacy, false));
            return result;
        }

        match new_impl().await {
            Ok(value) => {
                self.record(&cfg, RoutingDecision::new(operation, Implementation::New, false));
                Ok(value)
            }
            Err(err) if cfg.fallback_to_legacy_enabled => {
                if cfg.logging_enabled {
                    tracing::warn!(
                        op = operation,
                        error = %err,
                        "new implementation failed, falling back to legacy"
                    );
                }
                let result = legacy_impl().await;
                self.record(&cfg, RoutingDecision::new(operation, Implementation::Legacy, true));
                result
            }
            Err(err) => {
                if cfg.logging_enabled {
                    tracing::warn!(
                        op = operation,
                        error = %err,
                        "new implementation failed, fallback disabled"
                    );
                }
                self.record(&cfg, RoutingDecision::new(operation, Implementation::New, false));
                Err(err)
            }
        }
    }

    fn record(&self, cfg: &MigrationConfig, decision: RoutingDecision) {
        if cfg.logging_enabled {
            tracing::info!(
                op = %decision.operation_name,
                implementation = %decision.implementation,
                fell_back = decision.fell_back,
                timestamp = %decision.timestamp.to_rfc3339(),
                "routing decision"
            );
        }
        if let Some(journal) = &self.journal {
            journal.record(&decision);
        }
    }
}
