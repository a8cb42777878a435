use uuid::Uuid;

/// Sentinel tenant id that is never assigned to a real tenant.
///
/// Generated tenant ids (v4/v7) can never be nil, and [`crate::TenantContext`]
/// drops nil ids on construction, so filtering on this value matches nothing.
pub const NO_TENANT_ID: Uuid = Uuid::nil();
