#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use std::collections::HashSet;

use common::{FlakyStore, profile_rows};
use datakit_db::filter::{FilterCondition, FilterSetBuilder};
use datakit_db::query::{QueryBuilder, SortDirection};
use datakit_db::resilience::{OperationWrapper, RetryPolicy};
use datakit_db::secure::TenantFilter;
use datakit_db::store::MemoryStore;
use datakit_security::TenantContext;
use serde_json::json;
use uuid::Uuid;

fn seeded() -> (MemoryStore, Uuid, Uuid, Uuid) {
    let store = MemoryStore::new();
    let home = Uuid::new_v4();
    let partner = Uuid::new_v4();
    let foreign = Uuid::new_v4();

    store.seed("profiles", profile_rows(home, "Jane Home", "active", 12));
    store.seed("profiles", profile_rows(partner, "Mary Jane", "active", 11));
    store.seed("profiles", profile_rows(home, "Jane Archived", "inactive", 5));
    store.seed("profiles", profile_rows(partner, "Bob", "active", 7));
    store.seed("profiles", profile_rows(foreign, "Jane Foreign", "active", 9));

    (store, home, partner, foreign)
}

#[tokio::test]
async fn filtered_search_across_two_tenants_page_two() {
    let (store, home, partner, _) = seeded();
    let ctx = TenantContext::for_tenants(Uuid::new_v4(), home, [partner]);

    let conditions = FilterSetBuilder::new()
        .eq_opt("status", Some("active"))
        .search(Some("jane"), &["display_name", "email"])
        .build();
    let query = QueryBuilder::new("profiles")
        .where_many(&conditions)
        .order_by("display_name", SortDirection::Asc)
        .paginate(2, 10, 100);
    let query = TenantFilter::apply_to_query(query, &ctx, "tenant_id");

    let wrapper = OperationWrapper::new(RetryPolicy::default());
    let page = wrapper
        .execute_result("profiles.list", || query.clone().execute(&store))
        .await
        .unwrap();

    assert_eq!(page.items.len(), 10);
    assert_eq!(page.page_info.total, 23);
    assert_eq!(page.page_info.page, 2);
    assert_eq!(page.page_info.total_pages, 3);
    assert!(page.page_info.has_next);
    assert!(page.page_info.has_prev);

    let allowed: HashSet<String> = [home.to_string(), partner.to_string()].into();
    for item in &page.items {
        assert!(allowed.contains(item["tenant_id"].as_str().unwrap()));
        assert_eq!(item["status"], json!("active"));
    }
}

#[tokio::test]
async fn caller_without_tenants_sees_nothing() {
    let (store, ..) = seeded();
    let ctx = TenantContext::deny_all(Uuid::new_v4());

    let page = TenantFilter::apply_to_query(QueryBuilder::new("profiles"), &ctx, "tenant_id")
        .execute(&store)
        .await
        .unwrap();

    assert!(page.items.is_empty());
    assert_eq!(page.page_info.total, 0);
    assert_eq!(page.page_info.total_pages, 0);
}

#[tokio::test]
async fn scoped_mutations_never_touch_other_tenants() {
    let (store, home, _, foreign) = seeded();
    let ctx = TenantContext::for_tenant(Uuid::new_v4(), home);

    let changes = common::row(json!({"status": "suspended"}));
    let touched = TenantFilter::apply_to_query(
        QueryBuilder::new("profiles").where_condition(FilterCondition::eq("status", "active")),
        &ctx,
        "tenant_id",
    )
    .update(&store, &changes)
    .await
    .unwrap();
    assert_eq!(touched, 12);

    let removed = TenantFilter::apply_to_query(QueryBuilder::new("profiles"), &ctx, "tenant_id")
        .delete(&store)
        .await
        .unwrap();
    assert_eq!(removed, 17);

    let foreign_ctx = TenantContext::for_tenant(Uuid::new_v4(), foreign);
    let remaining = TenantFilter::apply_to_query(QueryBuilder::new("profiles"), &foreign_ctx, "tenant_id")
        .count(&store)
        .await
        .unwrap();
    assert_eq!(remaining, 9);
}

#[tokio::test]
async fn count_failure_surfaces_unmodified() {
    let (inner, home, ..) = seeded();
    let store = FlakyStore::new(inner);
    store.fail_next([datakit_db::store::StoreError::connection("socket closed")]);
    let ctx = TenantContext::for_tenant(Uuid::new_v4(), home);

    let err = TenantFilter::apply_to_query(QueryBuilder::new("profiles"), &ctx, "tenant_id")
        .execute(&store)
        .await
        .unwrap_err();
    assert_eq!(err.message, "socket closed");
    assert!(store.calls() >= 1);
}
