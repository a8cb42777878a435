#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use datakit_db::filter::FilterExpr;
use datakit_db::{
    DataAccessConfig, MemoryStore, QueryPlan, RetryPolicy, Row, Store, StoreError, StoreErrorCode,
};
use datakit_security::TenantContext;
use training_data_sdk::{
    Course, NewCourse, NewProfile, Profile, ProfileStatus, TrainingDataApi,
};
use uuid::Uuid;

/// Store whose every call fails with the configured code.
pub struct FailingStore {
    code: StoreErrorCode,
    calls: AtomicU32,
}

impl FailingStore {
    pub fn new(code: StoreErrorCode) -> Self {
        Self {
            code,
            calls: AtomicU32::new(0),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    fn fail<T>(&self) -> Result<T, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(StoreError::new(self.code, "injected failure at 10.1.2.3"))
    }
}

#[async_trait]
impl Store for FailingStore {
    async fn select(&self, _plan: &QueryPlan) -> Result<Vec<Row>, StoreError> {
        self.fail()
    }

    async fn count(&self, _plan: &QueryPlan) -> Result<u64, StoreError> {
        self.fail()
    }

    async fn insert(&self, _table: &str, _row: Row) -> Result<Row, StoreError> {
        self.fail()
    }

    async fn update(
        &self,
        _table: &str,
        _filter: &FilterExpr,
        _changes: &Row,
    ) -> Result<u64, StoreError> {
        self.fail()
    }

    async fn delete(&self, _table: &str, _filter: &FilterExpr) -> Result<u64, StoreError> {
        self.fail()
    }
}

pub fn memory_store() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::new().with_unique_key("profiles", "email"))
}

/// Single attempt, no breaker: failures surface immediately.
pub fn single_attempt() -> DataAccessConfig {
    DataAccessConfig {
        retry: RetryPolicy::no_retry(),
        ..DataAccessConfig::default()
    }
}

pub fn tenant_ctx(primary: Uuid, others: &[Uuid]) -> TenantContext {
    TenantContext::for_tenants(Uuid::new_v4(), primary, others.iter().copied())
}

pub fn new_profile(name: &str, email: &str, status: ProfileStatus) -> NewProfile {
    NewProfile {
        tenant_id: None,
        email: email.to_owned(),
        display_name: name.to_owned(),
        role: "learner".to_owned(),
        status: Some(status),
    }
}

pub fn new_course(title: &str, category: &str) -> NewCourse {
    NewCourse {
        tenant_id: None,
        title: title.to_owned(),
        description: None,
        category: Some(category.to_owned()),
        status: None,
        duration_minutes: 30,
    }
}

/// Create `count` profiles named `{name} {i}` in `tenant`.
pub async fn create_profiles(
    api: &dyn TrainingDataApi,
    ctx: &TenantContext,
    tenant: Uuid,
    name: &str,
    status: ProfileStatus,
    count: usize,
) -> Vec<Profile> {
    let slug = name.to_lowercase().replace(' ', ".");
    let mut created = Vec::with_capacity(count);
    for i in 0..count {
        let mut input = new_profile(
            &format!("{name} {i}"),
            &format!("{slug}.{i}.{}@example.com", &tenant.simple().to_string()[..8]),
            status,
        );
        input.tenant_id = Some(tenant);
        created.push(api.create_profile(ctx, input).await.unwrap());
    }
    created
}

pub async fn create_course(
    api: &dyn TrainingDataApi,
    ctx: &TenantContext,
    title: &str,
    category: &str,
) -> Course {
    api.create_course(ctx, new_course(title, category))
        .await
        .unwrap()
}
