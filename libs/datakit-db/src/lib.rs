#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Tenant-aware data access.
//!
//! Building blocks, leaves first:
//!
//! - [`filter`]: typed filter objects turned into sanitized [`FilterCondition`]s
//! - [`pagination`]: clamped page/limit input and page metadata
//! - [`query`]: [`QueryBuilder`] producing a [`QueryPlan`] for a [`Store`]
//! - [`secure`]: [`TenantFilter`], the fail-closed tenant predicate
//! - [`store`]: the [`Store`] seam with in-memory and `SeaORM` adapters
//! - [`resilience`]: [`OperationWrapper`] with timeout, retry and circuit breaking
//! - [`config`]: the `data_access` configuration section
//!
//! A typical read:
//!
//! ```
//! # tokio_test_block(async {
//! use datakit_db::filter::FilterCondition;
//! use datakit_db::query::QueryBuilder;
//! use datakit_db::resilience::{OperationWrapper, RetryPolicy};
//! use datakit_db::secure::TenantFilter;
//! use datakit_db::store::MemoryStore;
//! use datakit_security::TenantContext;
//! use uuid::Uuid;
//!
//! let store = MemoryStore::new();
//! let ctx = TenantContext::for_tenant(Uuid::new_v4(), Uuid::new_v4());
//! let query = TenantFilter::apply_to_query(
//!     QueryBuilder::new("courses").where_condition(FilterCondition::eq("status", "published")),
//!     &ctx,
//!     "tenant_id",
//! );
//!
//! let wrapper = OperationWrapper::new(RetryPolicy::default());
//! let page = wrapper
//!     .execute_result("courses.list", || query.clone().execute(&store))
//!     .await
//!     .unwrap();
//! assert!(page.items.is_empty());
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(f)
//! # }
//! ```

pub mod config;
pub mod filter;
pub mod pagination;
pub mod query;
pub mod resilience;
pub mod secure;
pub mod store;

pub use config::{ConfigError, DataAccessConfig};
pub use filter::{FilterCondition, FilterExpr, FilterOperator, FilterSet, JoinOperator};
pub use pagination::{Page, PageInfo, PageRequest, PaginationParams, Paginator};
pub use query::{QueryBuilder, QueryPlan, Scoped, SortDirection, Unscoped};
pub use resilience::{
    CircuitBreaker, CircuitBreakerConfig, CircuitState, ErrorKind, OperationFailure,
    OperationOutcome, OperationWrapper, RetryPolicy,
};
pub use secure::{ScopableTable, ScopeError, TenantFilter};
pub use store::{MemoryStore, Row, Store, StoreError, StoreErrorCode};
