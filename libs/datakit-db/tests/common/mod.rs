#![allow(clippy::unwrap_used, clippy::expect_used, dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use datakit_db::filter::FilterExpr;
use datakit_db::query::QueryPlan;
use datakit_db::store::{MemoryStore, Row, Store, StoreError};
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::time::Instant;
use uuid::Uuid;

/// [`MemoryStore`] with scripted failures, optional latency and call tracking.
#[derive(Default)]
pub struct FlakyStore {
    pub inner: MemoryStore,
    failures: Mutex<VecDeque<StoreError>>,
    latency: Mutex<Option<Duration>>,
    calls: AtomicU32,
    call_times: Mutex<Vec<Instant>>,
}

impl FlakyStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            ..Self::default()
        }
    }

    /// Fail the next calls, in order, with `errors`.
    pub fn fail_next(&self, errors: impl IntoIterator<Item = StoreError>) {
        self.failures.lock().extend(errors);
    }

    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock() = Some(latency);
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn call_times(&self) -> Vec<Instant> {
        self.call_times.lock().clone()
    }

    async fn before_call(&self) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.call_times.lock().push(Instant::now());
        let latency = *self.latency.lock();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        let failure = self.failures.lock().pop_front();
        match failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Store for FlakyStore {
    async fn select(&self, plan: &QueryPlan) -> Result<Vec<Row>, StoreError> {
        self.before_call().await?;
        self.inner.select(plan).await
    }

    async fn count(&self, plan: &QueryPlan) -> Result<u64, StoreError> {
        self.before_call().await?;
        self.inner.count(plan).await
    }

    async fn insert(&self, table: &str, row: Row) -> Result<Row, StoreError> {
        self.before_call().await?;
        self.inner.insert(table, row).await
    }

    async fn update(
        &self,
        table: &str,
        filter: &FilterExpr,
        changes: &Row,
    ) -> Result<u64, StoreError> {
        self.before_call().await?;
        self.inner.update(table, filter, changes).await
    }

    async fn delete(&self, table: &str, filter: &FilterExpr) -> Result<u64, StoreError> {
        self.before_call().await?;
        self.inner.delete(table, filter).await
    }
}

pub fn row(value: Value) -> Row {
    value.as_object().cloned().unwrap()
}

/// `count` profile rows for `tenant`, named `"{prefix} {i}"`.
pub fn profile_rows(tenant: Uuid, prefix: &str, status: &str, count: usize) -> Vec<Row> {
    (0..count)
        .map(|i| {
            row(json!({
                "id": Uuid::new_v4().to_string(),
                "tenant_id": tenant.to_string(),
                "display_name": format!("{prefix} {i:02}"),
                "email": format!("{}.{i}@example.com", prefix.to_lowercase().replace(' ', ".")),
                "status": status,
                "created_at": format!("2024-01-{:02}T00:00:00Z", i % 28 + 1),
            }))
        })
        .collect()
}
