use datakit_security::{NO_TENANT_ID, TenantContext};
use uuid::Uuid;

use super::ScopeError;
use crate::filter::{FilterCondition, id_value};
use crate::query::{QueryBuilder, Scoped};

/// Builds the tenant predicate every read and write must carry.
#[derive(Debug, Clone, Copy, Default)]
pub struct TenantFilter;

impl TenantFilter {
    /// Tenant predicate for `ctx` on `tenant_column`.
    ///
    /// Never returns an unconstrained condition: a caller without accessible
    /// tenants gets an equality against the nil id, which no row carries.
    #[must_use]
    pub fn condition_for(ctx: &TenantContext, tenant_column: &str) -> FilterCondition {
        let ids = ctx.accessible_tenant_ids();
        match ids.len() {
            0 => FilterCondition::eq(tenant_column, id_value(NO_TENANT_ID)),
            1 => FilterCondition::eq(
                tenant_column,
                id_value(ids.iter().next().copied().unwrap_or(NO_TENANT_ID)),
            ),
            _ => FilterCondition::in_list(tenant_column, ids.iter().copied().map(id_value)),
        }
    }

    /// Restrict `query` to the caller's tenants and make it executable.
    pub fn apply_to_query<S>(
        query: QueryBuilder<S>,
        ctx: &TenantContext,
        tenant_column: &str,
    ) -> QueryBuilder<Scoped> {
        query.scoped(Self::condition_for(ctx, tenant_column))
    }

    /// Whether `target_tenant` is in the caller's accessible set.
    #[must_use]
    pub fn validate_access(ctx: &TenantContext, target_tenant: Uuid) -> bool {
        ctx.has_access(target_tenant)
    }

    /// [`TenantFilter::validate_access`] as a `Result`, for gating mutations.
    ///
    /// # Errors
    /// [`ScopeError::NoTenants`] if the caller reaches no tenant at all,
    /// [`ScopeError::Denied`] if `target_tenant` is not accessible.
    pub fn require_access(ctx: &TenantContext, target_tenant: Uuid) -> Result<(), ScopeError> {
        if ctx.is_denied() {
            return Err(ScopeError::NoTenants);
        }
        ctx.require_access(target_tenant)?;
        Ok(())
    }
}
