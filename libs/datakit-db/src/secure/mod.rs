//! Tenant isolation for every query.
//!
//! [`TenantFilter`] is the only way to move a
//! [`QueryBuilder`](crate::query::QueryBuilder) into the executable
//! [`Scoped`](crate::query::Scoped) state. The rule is fail-closed:
//!
//! | accessible tenants | predicate added                     |
//! |--------------------|-------------------------------------|
//! | one                | `tenant_col = id`                   |
//! | several            | `tenant_col IN (ids...)`            |
//! | none               | `tenant_col = <nil uuid>` (no rows) |
//!
//! ```
//! use datakit_db::secure::TenantFilter;
//! use datakit_db::query::QueryBuilder;
//! use datakit_security::TenantContext;
//! use uuid::Uuid;
//!
//! let ctx = TenantContext::deny_all(Uuid::new_v4());
//! let query = TenantFilter::apply_to_query(QueryBuilder::new("courses"), &ctx, "tenant_id");
//! assert_eq!(query.filter_expr().leaves().len(), 1);
//! ```

mod entity;
mod error;
mod tenant_filter;

pub use entity::{ScopableTable, find, find_by_id};
pub use error::ScopeError;
pub use tenant_filter::TenantFilter;
