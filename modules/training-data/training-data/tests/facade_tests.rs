//! Routing through the compatibility facade.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{FailingStore, create_profiles, memory_store, new_course, single_attempt, tenant_ctx};
use datakit_db::{CircuitBreakerConfig, DataAccessConfig, Paginator, RetryPolicy, StoreErrorCode};
use datakit_migration::{
    Implementation, MigrationConfig, MigrationRouter, MigrationSwitch, RoutingJournal,
};
use training_data::{
    LegacyTrainingData, TrainingDataConfig, TrainingDataService, UnifiedTrainingData,
};
use training_data_sdk::{
    CourseFilter, ErrorKind, PageRequest, ProfileFilter, ProfileStatus, TrainingDataApi,
};
use uuid::Uuid;

fn migration(use_new: bool, fallback: bool) -> MigrationConfig {
    MigrationConfig {
        use_new_implementation: use_new,
        logging_enabled: true,
        fallback_to_legacy_enabled: fallback,
    }
}

/// Facade whose unified side always fails with a connection error.
fn broken_unified(
    fallback: bool,
    data_access: &DataAccessConfig,
) -> (TrainingDataService, Arc<UnifiedTrainingData>, Arc<FailingStore>) {
    let failing = Arc::new(FailingStore::new(StoreErrorCode::Connection));
    let unified = Arc::new(UnifiedTrainingData::new(failing.clone(), data_access));
    let legacy = Arc::new(LegacyTrainingData::new(
        memory_store(),
        Paginator::default(),
        Duration::from_secs(5),
    ));
    let router = MigrationRouter::new(MigrationSwitch::new(migration(true, fallback)))
        .with_journal(Arc::new(RoutingJournal::default()));
    let service = TrainingDataService::new(router, unified.clone(), legacy);
    (service, unified, failing)
}

#[tokio::test]
async fn end_to_end_through_the_new_path() {
    let cfg = TrainingDataConfig {
        migration: migration(true, true),
        ..TrainingDataConfig::default()
    };
    let service = TrainingDataService::from_config(memory_store(), &cfg);

    let home = Uuid::new_v4();
    let partner = Uuid::new_v4();
    let ctx = tenant_ctx(home, &[partner]);
    create_profiles(&service, &ctx, home, "Jane Home", ProfileStatus::Active, 12).await;
    create_profiles(&service, &ctx, partner, "Mary Jane", ProfileStatus::Active, 11).await;
    create_profiles(&service, &ctx, partner, "Jane Gone", ProfileStatus::Suspended, 4).await;

    let filter = ProfileFilter {
        status: Some(ProfileStatus::Active),
        search: Some("jane".to_owned()),
        ..ProfileFilter::default()
    };
    let page = service
        .list_profiles(&ctx, filter, PageRequest::new(2, 10))
        .await
        .unwrap();

    assert!(page.items.len() <= 10);
    assert_eq!(page.page_info.total, 23);
    assert_eq!(page.page_info.total_pages, 3);
    assert!(page.page_info.has_next);
    assert!(page.page_info.has_prev);

    let journal = service.journal().unwrap();
    let tally = journal.tally("profiles.list");
    assert_eq!((tally.new, tally.legacy, tally.fallbacks), (1, 0, 0));
    assert_eq!(journal.tally("profiles.create").new, 27);
}

#[tokio::test]
async fn legacy_serves_until_the_switch_flips() {
    let service = TrainingDataService::from_config(memory_store(), &TrainingDataConfig::default());
    let ctx = tenant_ctx(Uuid::new_v4(), &[]);

    service
        .create_course(&ctx, new_course("Fire Safety", "safety"))
        .await
        .unwrap();
    service.switch().set_use_new_implementation(true);
    let page = service
        .list_courses(&ctx, CourseFilter::default(), PageRequest::default())
        .await
        .unwrap();
    assert_eq!(page.page_info.total, 1);

    let recent = service.journal().unwrap().recent();
    let served: Vec<_> = recent
        .iter()
        .map(|d| (d.operation_name.as_str(), d.implementation))
        .collect();
    assert_eq!(
        served,
        vec![
            ("courses.create", Implementation::Legacy),
            ("courses.list", Implementation::New),
        ]
    );
}

#[tokio::test]
async fn failed_new_path_falls_back_to_legacy() {
    let (service, _, failing) = broken_unified(true, &single_attempt());
    let ctx = tenant_ctx(Uuid::new_v4(), &[]);

    let course = service
        .create_course(&ctx, new_course("Forklift", "safety"))
        .await
        .unwrap();
    let fetched = service.get_course(&ctx, course.id).await.unwrap();
    assert_eq!(fetched, course);

    assert_eq!(failing.calls(), 2);
    let journal = service.journal().unwrap();
    assert_eq!(journal.tally("courses.create").fallbacks, 1);
    let last = journal.recent().pop().unwrap();
    assert_eq!(last.implementation, Implementation::Legacy);
    assert!(last.fell_back);
}

#[tokio::test]
async fn without_fallback_the_classified_error_surfaces() {
    let (service, _, _) = broken_unified(false, &single_attempt());
    let ctx = tenant_ctx(Uuid::new_v4(), &[]);

    let err = service
        .list_courses(&ctx, CourseFilter::default(), PageRequest::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Connection);
    assert!(err.retryable);
    assert!(!err.message.contains("10.1.2.3"));
    assert!(err.message.starts_with("courses.list"));
}

#[tokio::test(start_paused = true)]
async fn retries_then_opens_the_circuit() {
    let data_access = DataAccessConfig {
        retry: RetryPolicy::default()
            .with_max_attempts(3)
            .with_base_delay(Duration::from_millis(100)),
        circuit_breaker: Some(CircuitBreakerConfig {
            failure_threshold: 2,
            reset_timeout: Duration::from_secs(60),
        }),
        ..DataAccessConfig::default()
    };
    let (service, unified, failing) = broken_unified(false, &data_access);
    let ctx = tenant_ctx(Uuid::new_v4(), &[]);

    for _ in 0..2 {
        let err = service
            .list_courses(&ctx, CourseFilter::default(), PageRequest::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Connection);
    }
    // each logical call: three attempts, select and count both issued per attempt
    let calls_before = failing.calls();
    assert!(calls_before >= 6);

    let err = service
        .list_courses(&ctx, CourseFilter::default(), PageRequest::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::CircuitOpen);
    assert_eq!(failing.calls(), calls_before);

    let states = unified.circuit_states();
    assert!(states.contains(&("courses", datakit_db::CircuitState::Open)));
    assert!(states.contains(&("profiles", datakit_db::CircuitState::Closed)));
}
