use datakit_security::TenantAccessError;

/// Errors raised by tenant scoping helpers.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ScopeError {
    /// The target tenant is outside the caller's accessible set.
    #[error("access denied: {0}")]
    Denied(#[from] TenantAccessError),

    /// The caller has no accessible tenant at all.
    #[error("access denied: caller has no accessible tenants")]
    NoTenants,
}
