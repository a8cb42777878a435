use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::NO_TENANT_ID;

/// Raised when a caller targets a tenant outside its accessible set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("tenant {tenant_id} is not accessible to caller {caller_id}")]
pub struct TenantAccessError {
    pub caller_id: Uuid,
    pub tenant_id: Uuid,
}

/// Per-request tenant reach of a caller.
///
/// An empty accessible set is a valid state: it means "deny everything" and
/// yields empty result sets rather than errors.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "TenantContextRepr")]
pub struct TenantContext {
    caller_id: Uuid,
    primary_tenant_id: Uuid,
    accessible_tenant_ids: BTreeSet<Uuid>,
}

/// Deserialized form; converted through [`TenantContext::new`].
#[derive(Deserialize)]
struct TenantContextRepr {
    caller_id: Uuid,
    primary_tenant_id: Uuid,
    #[serde(default)]
    accessible_tenant_ids: Vec<Uuid>,
}

impl From<TenantContextRepr> for TenantContext {
    fn from(repr: TenantContextRepr) -> Self {
        Self::new(
            repr.caller_id,
            repr.primary_tenant_id,
            repr.accessible_tenant_ids,
        )
    }
}

impl TenantContext {
    /// Build a context from an explicit accessible set.
    ///
    /// The primary tenant is not implicitly added to the accessible set.
    /// Nil ids are dropped.
    #[must_use]
    pub fn new(
        caller_id: Uuid,
        primary_tenant_id: Uuid,
        accessible_tenant_ids: impl IntoIterator<Item = Uuid>,
    ) -> Self {
        Self {
            caller_id,
            primary_tenant_id,
            accessible_tenant_ids: accessible_tenant_ids
                .into_iter()
                .filter(|id| *id != NO_TENANT_ID)
                .collect(),
        }
    }

    /// Caller that can reach exactly its own tenant.
    #[must_use]
    pub fn for_tenant(caller_id: Uuid, tenant_id: Uuid) -> Self {
        Self::new(caller_id, tenant_id, [tenant_id])
    }

    /// Caller homed in `primary_tenant_id` that can also reach `others`.
    #[must_use]
    pub fn for_tenants(
        caller_id: Uuid,
        primary_tenant_id: Uuid,
        others: impl IntoIterator<Item = Uuid>,
    ) -> Self {
        Self::new(
            caller_id,
            primary_tenant_id,
            std::iter::once(primary_tenant_id).chain(others),
        )
    }

    /// Caller with no tenant reach at all.
    #[must_use]
    pub fn deny_all(caller_id: Uuid) -> Self {
        Self::new(caller_id, NO_TENANT_ID, [])
    }

    /// Return a copy that can additionally reach `tenant_id`.
    #[must_use]
    pub fn with_accessible_tenant(mut self, tenant_id: Uuid) -> Self {
        if tenant_id != NO_TENANT_ID {
            self.accessible_tenant_ids.insert(tenant_id);
        }
        self
    }

    #[inline]
    #[must_use]
    pub fn caller_id(&self) -> Uuid {
        self.caller_id
    }

    #[inline]
    #[must_use]
    pub fn primary_tenant_id(&self) -> Uuid {
        self.primary_tenant_id
    }

    /// Accessible tenants in ascending order.
    #[inline]
    #[must_use]
    pub fn accessible_tenant_ids(&self) -> &BTreeSet<Uuid> {
        &self.accessible_tenant_ids
    }

    #[must_use]
    pub fn tenant_count(&self) -> usize {
        self.accessible_tenant_ids.len()
    }

    /// True when the caller cannot reach any tenant.
    #[must_use]
    pub fn is_denied(&self) -> bool {
        self.accessible_tenant_ids.is_empty()
    }

    /// True when the primary tenant is a real tenant id.
    #[must_use]
    pub fn has_primary_tenant(&self) -> bool {
        self.primary_tenant_id != NO_TENANT_ID
    }

    #[must_use]
    pub fn has_access(&self, tenant_id: Uuid) -> bool {
        self.accessible_tenant_ids.contains(&tenant_id)
    }

    /// Membership check returning a typed error.
    ///
    /// # Errors
    /// Returns [`TenantAccessError`] if `tenant_id` is not accessible.
    pub fn require_access(&self, tenant_id: Uuid) -> Result<(), TenantAccessError> {
        if self.has_access(tenant_id) {
            Ok(())
        } else {
            Err(TenantAccessError {
                caller_id: self.caller_id,
                tenant_id,
            })
        }
    }
}
