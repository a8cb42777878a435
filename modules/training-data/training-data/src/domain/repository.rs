use std::marker::PhantomData;
use std::sync::Arc;

use datakit_db::filter::{FilterCondition, FilterSet, id_value};
use datakit_db::pagination::{Page, PageRequest};
use datakit_db::secure::{find, find_by_id};
use datakit_db::{
    CircuitState, DataAccessConfig, OperationWrapper, Paginator, QueryBuilder, Row, Scoped,
    SortDirection, Store,
};
use datakit_security::TenantContext;
use training_data_sdk::DataError;
use uuid::Uuid;

use super::mapping::{from_row, to_row};
use super::tables::EntityKind;

/// Tenant-scoped CRUD for one entity kind.
///
/// Every store call goes through the repository's [`OperationWrapper`]; the
/// wrapper's circuit breaker (when configured) is shared by all operations
/// on this table.
pub struct EntityRepository<E: EntityKind> {
    store: Arc<dyn Store>,
    wrapper: OperationWrapper,
    paginator: Paginator,
    _entity: PhantomData<fn() -> E>,
}

impl<E: EntityKind> EntityRepository<E> {
    #[must_use]
    pub fn new(store: Arc<dyn Store>, config: &DataAccessConfig) -> Self {
        Self {
            store,
            wrapper: config.wrapper(E::TABLE),
            paginator: config.pagination,
            _entity: PhantomData,
        }
    }

    #[must_use]
    pub fn circuit_state(&self) -> Option<CircuitState> {
        self.wrapper.circuit_state()
    }

    fn op(action: &str) -> String {
        format!("{}.{action}", E::TABLE)
    }

    /// # Errors
    /// Classified store failure, or `unknown` for an undecodable row.
    pub async fn list<F>(
        &self,
        ctx: &TenantContext,
        filter: &F,
        page: PageRequest,
    ) -> Result<Page<E::Model>, DataError>
    where
        F: FilterSet + Sync,
    {
        let query = find::<E>(ctx).where_many(&filter.to_conditions());
        self.list_query(query, page).await
    }

    /// Page through an already scoped query, newest first.
    ///
    /// # Errors
    /// Classified store failure, or `unknown` for an undecodable row.
    pub async fn list_query(
        &self,
        query: QueryBuilder<Scoped>,
        page: PageRequest,
    ) -> Result<Page<E::Model>, DataError> {
        let query = query
            .order_by(E::SORT_COLUMN, SortDirection::Desc)
            .order_by(E::ID_COLUMN, SortDirection::Asc)
            .paginate_with(&self.paginator, page);
        let store = &*self.store;

        let rows = self
            .wrapper
            .execute_result(&Self::op("list"), || query.clone().execute(store))
            .await?;
        rows.try_map(|row| from_row(E::NAME, row))
    }

    /// # Errors
    /// Classified store failure, or `unknown` for an undecodable row.
    pub async fn find(&self, ctx: &TenantContext, id: Uuid) -> Result<Option<E::Model>, DataError> {
        let store = &*self.store;
        let row = self
            .wrapper
            .execute_result(&Self::op("get"), || find_by_id::<E>(ctx, id).first(store))
            .await?;
        row.map(|r| from_row(E::NAME, r)).transpose()
    }

    /// # Errors
    /// `not-found` when the id is absent or owned by an inaccessible tenant.
    pub async fn get(&self, ctx: &TenantContext, id: Uuid) -> Result<E::Model, DataError> {
        self.find(ctx, id)
            .await?
            .ok_or_else(|| DataError::not_found(E::NAME, id))
    }

    /// Number of visible rows matching `conditions`.
    ///
    /// # Errors
    /// Classified store failure.
    pub async fn count(
        &self,
        ctx: &TenantContext,
        conditions: &[FilterCondition],
    ) -> Result<u64, DataError> {
        let query = find::<E>(ctx).where_many(conditions);
        let store = &*self.store;
        Ok(self
            .wrapper
            .execute_result(&Self::op("count"), || query.clone().count(store))
            .await?)
    }

    /// # Errors
    /// Classified store failure.
    pub async fn exists(&self, ctx: &TenantContext, id: Uuid) -> Result<bool, DataError> {
        let by_id = FilterCondition::eq(E::ID_COLUMN, id_value(id));
        Ok(self.count(ctx, &[by_id]).await? > 0)
    }

    /// Insert a fully built model; tenant access is checked by the caller.
    ///
    /// # Errors
    /// Classified store failure (`duplicate` for unique violations).
    pub async fn insert(&self, model: &E::Model) -> Result<E::Model, DataError> {
        let row = to_row(E::NAME, model)?;
        let store = &*self.store;
        let stored = self
            .wrapper
            .execute_result(&Self::op("create"), || store.insert(E::TABLE, row.clone()))
            .await?;
        from_row(E::NAME, stored)
    }

    /// Apply `changes` to a visible row and return its new state.
    ///
    /// # Errors
    /// `not-found` when no visible row has this id.
    pub async fn update(
        &self,
        ctx: &TenantContext,
        id: Uuid,
        changes: &Row,
    ) -> Result<E::Model, DataError> {
        let store = &*self.store;
        let touched = self
            .wrapper
            .execute_result(&Self::op("update"), || {
                find_by_id::<E>(ctx, id).update(store, changes)
            })
            .await?;
        if touched == 0 {
            return Err(DataError::not_found(E::NAME, id));
        }
        self.get(ctx, id).await
    }

    /// # Errors
    /// `not-found` when no visible row has this id.
    pub async fn delete(&self, ctx: &TenantContext, id: Uuid) -> Result<(), DataError> {
        let store = &*self.store;
        let removed = self
            .wrapper
            .execute_result(&Self::op("delete"), || find_by_id::<E>(ctx, id).delete(store))
            .await?;
        if removed == 0 {
            return Err(DataError::not_found(E::NAME, id));
        }
        Ok(())
    }
}
