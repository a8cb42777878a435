#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Caller identity and tenant reach for the data-access core.
//!
//! A [`TenantContext`] travels with every request into the data layer. It is
//! the only source of truth for which tenants a caller may read or mutate;
//! the query layer turns it into row filters and mutation guards.

pub mod constants;
pub mod context;

pub use constants::NO_TENANT_ID;
pub use context::{TenantAccessError, TenantContext};
