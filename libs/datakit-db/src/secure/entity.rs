use datakit_security::TenantContext;
use uuid::Uuid;

use super::TenantFilter;
use crate::filter::{FilterCondition, id_value};
use crate::query::{QueryBuilder, Scoped};

/// A tenant-owned table addressed by the generic repositories.
pub trait ScopableTable {
    /// Table name.
    const TABLE: &'static str;

    /// Column holding the owning tenant id.
    const TENANT_COLUMN: &'static str = "tenant_id";

    /// Primary key column.
    const ID_COLUMN: &'static str = "id";
}

/// Scoped query over every row of `T` the caller can see.
pub fn find<T: ScopableTable>(ctx: &TenantContext) -> QueryBuilder<Scoped> {
    TenantFilter::apply_to_query(QueryBuilder::new(T::TABLE), ctx, T::TENANT_COLUMN)
}

/// Scoped query for a single row of `T` by primary key.
///
/// An id owned by an inaccessible tenant simply matches nothing.
pub fn find_by_id<T: ScopableTable>(ctx: &TenantContext, id: Uuid) -> QueryBuilder<Scoped> {
    find::<T>(ctx).where_condition(FilterCondition::eq(T::ID_COLUMN, id_value(id)))
}
