#![cfg(feature = "sqlite")]
#![allow(clippy::unwrap_used, clippy::expect_used)]

use chrono::{TimeZone, Utc};
use datakit_db::filter::{DateRange, FilterCondition, FilterExpr, FilterSetBuilder};
use datakit_db::query::{QueryBuilder, SortDirection};
use datakit_db::secure::TenantFilter;
use datakit_db::store::{MemoryStore, Row, SeaOrmStore, Store, StoreErrorCode};
use datakit_security::TenantContext;
use sea_orm::{ConnectOptions, ConnectionTrait, Database};
use serde_json::{Value, json};
use uuid::Uuid;

fn row(value: Value) -> Row {
    value.as_object().cloned().unwrap()
}

async fn setup() -> SeaOrmStore {
    let mut opts = ConnectOptions::new("sqlite::memory:");
    opts.max_connections(1).min_connections(1).sqlx_logging(false);
    let conn = Database::connect(opts).await.unwrap();

    conn.execute_unprepared(
        "CREATE TABLE courses (
id TEXT PRIMARY KEY NOT NULL,
tenant_id TEXT NOT NULL,
title TEXT NOT NULL,
category TEXT,
duration_minutes INTEGER NOT NULL
)",
    )
    .await
    .unwrap();
    conn.execute_unprepared(
        "CREATE TABLE enrollments (
id TEXT PRIMARY KEY NOT NULL,
tenant_id TEXT NOT NULL,
course_id TEXT NOT NULL REFERENCES courses(id),
progress INTEGER NOT NULL
)",
    )
    .await
    .unwrap();
    conn.execute_unprepared(
        "CREATE TABLE sessions (
id TEXT PRIMARY KEY NOT NULL,
tenant_id TEXT NOT NULL,
started_at TEXT NOT NULL
)",
    )
    .await
    .unwrap();
    conn.execute_unprepared("CREATE UNIQUE INDEX courses_title ON courses(tenant_id, title)")
        .await
        .unwrap();

    SeaOrmStore::new(conn)
}

async fn seed_courses(store: &SeaOrmStore, tenant: Uuid) {
    for (i, (title, category, minutes)) in [
        ("Fire Safety 100%", Some("safety"), 30),
        ("Forklift_Basics", Some("safety"), 90),
        ("Budgeting", Some("finance"), 45),
        ("Onboarding", None, 15),
    ]
    .into_iter()
    .enumerate()
    {
        store
            .insert(
                "courses",
                row(json!({
                    "id": format!("c{i}"),
                    "tenant_id": tenant.to_string(),
                    "title": title,
                    "category": category,
                    "duration_minutes": minutes,
                })),
            )
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn filters_sorts_and_windows_in_sql() {
    let store = setup().await;
    let tenant = Uuid::new_v4();
    seed_courses(&store, tenant).await;
    seed_courses(&store, Uuid::new_v4())
        .await;

    let ctx = TenantContext::for_tenant(Uuid::new_v4(), tenant);
    let query = QueryBuilder::new("courses")
        .where_condition(FilterCondition::gte("duration_minutes", 30))
        .order_by("duration_minutes", SortDirection::Desc)
        .paginate(1, 2, 100);
    let page = TenantFilter::apply_to_query(query, &ctx, "tenant_id")
        .execute(&store)
        .await
        .unwrap();

    assert_eq!(page.page_info.total, 3);
    assert_eq!(page.page_info.total_pages, 2);
    let titles: Vec<_> = page.items.iter().map(|r| r["title"].clone()).collect();
    assert_eq!(titles, vec![json!("Forklift_Basics"), json!("Budgeting")]);
}

#[tokio::test]
async fn like_is_case_insensitive_and_escapes_wildcards() {
    let store = setup().await;
    let tenant = Uuid::new_v4();
    seed_courses(&store, tenant).await;
    let ctx = TenantContext::for_tenant(Uuid::new_v4(), tenant);

    let count = |pattern: &'static str| {
        let query = TenantFilter::apply_to_query(
            QueryBuilder::new("courses").where_condition(FilterCondition::like("title", pattern)),
            &ctx,
            "tenant_id",
        );
        let store = &store;
        async move { query.count(store).await.unwrap() }
    };

    assert_eq!(count("FIRE").await, 1);
    assert_eq!(count("100%").await, 1);
    assert_eq!(count("_").await, 1);
    assert_eq!(count("%").await, 1);
}

#[tokio::test]
async fn joins_filter_on_joined_columns() {
    let store = setup().await;
    let tenant = Uuid::new_v4();
    seed_courses(&store, tenant).await;
    for (i, course) in ["c0", "c1", "c2"].into_iter().enumerate() {
        store
            .insert(
                "enrollments",
                row(json!({
                    "id": format!("e{i}"),
                    "tenant_id": tenant.to_string(),
                    "course_id": course,
                    "progress": 50,
                })),
            )
            .await
            .unwrap();
    }

    let ctx = TenantContext::for_tenant(Uuid::new_v4(), tenant);
    let query = QueryBuilder::new("enrollments")
        .join("courses", "course_id", "id")
        .where_condition(FilterCondition::eq("courses.category", "safety"))
        .order_by("id", SortDirection::Asc);
    let rows = TenantFilter::apply_to_query(query, &ctx, "tenant_id")
        .execute_simple(&store)
        .await
        .unwrap();

    let ids: Vec<_> = rows.iter().map(|r| r["id"].clone()).collect();
    assert_eq!(ids, vec![json!("e0"), json!("e1")]);
    assert!(!rows[0].contains_key("category"));
}

#[tokio::test]
async fn in_between_and_null_semantics() {
    let store = setup().await;
    let tenant = Uuid::new_v4();
    seed_courses(&store, tenant).await;
    let plan = |expr: FilterExpr| {
        let mut plan = QueryBuilder::new("courses").plan();
        plan.filter = expr;
        plan
    };

    let n = store
        .count(&plan(FilterCondition::in_list("id", ["c0", "c3", "zz"]).into()))
        .await
        .unwrap();
    assert_eq!(n, 2);

    let n = store
        .count(&plan(FilterCondition::between("duration_minutes", 30, 45).into()))
        .await
        .unwrap();
    assert_eq!(n, 2);

    // NULL category matches neither side of a comparison
    let n = store
        .count(&plan(FilterCondition::ne("category", "safety").into()))
        .await
        .unwrap();
    assert_eq!(n, 1);

    assert_eq!(store.count(&plan(FilterExpr::never())).await.unwrap(), 0);
}

#[tokio::test]
async fn constraint_errors_carry_structured_codes() {
    let store = setup().await;
    let tenant = Uuid::new_v4();
    seed_courses(&store, tenant).await;

    let err = store
        .insert(
            "courses",
            row(json!({
                "id": "dup",
                "tenant_id": tenant.to_string(),
                "title": "Budgeting",
                "duration_minutes": 10,
            })),
        )
        .await
        .unwrap_err();
    assert_eq!(err.code, StoreErrorCode::UniqueViolation);

    let err = store
        .insert(
            "courses",
            row(json!({
                "id": "no-title",
                "tenant_id": tenant.to_string(),
                "title": null,
                "duration_minutes": 10,
            })),
        )
        .await
        .unwrap_err();
    assert_eq!(err.code, StoreErrorCode::InvalidInput);
}

#[tokio::test]
async fn update_and_delete_are_scoped() {
    let store = setup().await;
    let tenant = Uuid::new_v4();
    let other = Uuid::new_v4();
    seed_courses(&store, tenant).await;
    seed_courses(&store, other).await;

    let ctx = TenantContext::for_tenant(Uuid::new_v4(), tenant);
    let touched = TenantFilter::apply_to_query(
        QueryBuilder::new("courses").where_condition(FilterCondition::eq("category", "safety")),
        &ctx,
        "tenant_id",
    )
    .update(&store, &row(json!({"duration_minutes": 120})))
    .await
    .unwrap();
    assert_eq!(touched, 2);

    let removed = TenantFilter::apply_to_query(QueryBuilder::new("courses"), &ctx, "tenant_id")
        .delete(&store)
        .await
        .unwrap();
    assert_eq!(removed, 4);

    let left = store.count(&QueryBuilder::new("courses").plan()).await.unwrap();
    assert_eq!(left, 4);
}

/// Session start times as chrono serializes them: fractional digits only when non-zero.
async fn seed_sessions(store: &dyn Store, tenant: Uuid) {
    for (id, started_at) in [
        ("s0", "2024-01-01T09:59:59Z"),
        ("s1", "2024-01-01T10:00:00.500Z"),
        ("s2", "2024-01-01T10:00:00Z"),
        ("s3", "2024-01-01T10:00:01Z"),
    ] {
        store
            .insert(
                "sessions",
                row(json!({"id": id, "tenant_id": tenant.to_string(), "started_at": started_at})),
            )
            .await
            .unwrap();
    }
}

async fn sessions_from_ten(store: &dyn Store, ctx: &TenantContext) -> (u64, Vec<Value>) {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
    let conditions = FilterSetBuilder::new()
        .date_range("started_at", Some(&DateRange::new(Some(start), None)))
        .build();
    let query = TenantFilter::apply_to_query(
        QueryBuilder::new("sessions")
            .where_many(&conditions)
            .order_by("started_at", SortDirection::Asc),
        ctx,
        "tenant_id",
    );
    let page = query.execute(store).await.unwrap();
    let ids = page.items.iter().map(|r| r["id"].clone()).collect();
    (page.page_info.total, ids)
}

#[tokio::test]
async fn timestamps_compare_and_sort_chronologically() {
    let sqlite = setup().await;
    let memory = MemoryStore::new();
    let tenant = Uuid::new_v4();
    let ctx = TenantContext::for_tenant(Uuid::new_v4(), tenant);
    seed_sessions(&sqlite, tenant).await;
    seed_sessions(&memory, tenant).await;

    let expected = (3, vec![json!("s2"), json!("s1"), json!("s3")]);
    assert_eq!(sessions_from_ten(&sqlite, &ctx).await, expected);
    assert_eq!(sessions_from_ten(&memory, &ctx).await, expected);
}
