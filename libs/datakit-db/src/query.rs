//! Store-agnostic query construction.
//!
//! [`QueryBuilder`] collects conditions, joins, sort order and pagination into
//! a [`QueryPlan`]. It uses the typestate pattern: a builder starts
//! [`Unscoped`] and only becomes executable once
//! [`TenantFilter::apply_to_query`](crate::secure::TenantFilter::apply_to_query)
//! has moved it to [`Scoped`].
//!
//! ```
//! use datakit_db::filter::FilterCondition;
//! use datakit_db::query::{QueryBuilder, SortDirection};
//!
//! let plan = QueryBuilder::new("profiles")
//!     .where_condition(FilterCondition::eq("status", "active"))
//!     .order_by("created_at", SortDirection::Desc)
//!     .paginate(2, 10, 100)
//!     .plan();
//!
//! assert_eq!(plan.limit, Some(10));
//! assert_eq!(plan.offset, Some(10));
//! ```

use std::marker::PhantomData;

use serde::{Deserialize, Serialize};

use crate::filter::{FilterCondition, FilterExpr, sanitize};
use crate::pagination::{
    DEFAULT_LIMIT, Page, PageRequest, PaginationParams, Paginator, build_page_info,
};
use crate::store::{Row, Store, StoreError};

/// Typestate marker: tenant scoping has not been applied yet.
#[derive(Debug, Clone, Copy)]
pub struct Unscoped;

/// Typestate marker: tenant scoping has been applied; the query can run.
#[derive(Debug, Clone, Copy)]
pub struct Scoped;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: String,
    pub direction: SortDirection,
}

/// Inner join on `base.local_field = table.foreign_field`.
///
/// Conditions and sorts may address joined columns as `table.column`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinSpec {
    pub table: String,
    pub local_field: String,
    pub foreign_field: String,
}

/// Everything a [`Store`] needs to run one read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryPlan {
    pub table: String,
    pub filter: FilterExpr,
    pub joins: Vec<JoinSpec>,
    pub sorts: Vec<SortSpec>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl QueryPlan {
    /// Unfiltered, unordered, unbounded read of `table`.
    #[must_use]
    pub fn table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            filter: FilterExpr::always(),
            joins: Vec::new(),
            sorts: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    /// Same predicates and joins, no order and no window.
    #[must_use]
    pub fn for_count(&self) -> Self {
        Self {
            table: self.table.clone(),
            filter: self.filter.clone(),
            joins: self.joins.clone(),
            sorts: Vec::new(),
            limit: None,
            offset: None,
        }
    }
}

/// Fluent query builder over a single base table.
#[must_use]
#[derive(Debug, Clone)]
pub struct QueryBuilder<S = Unscoped> {
    table: String,
    conditions: Vec<FilterCondition>,
    exprs: Vec<FilterExpr>,
    scope: Vec<FilterCondition>,
    joins: Vec<JoinSpec>,
    sorts: Vec<SortSpec>,
    pagination: Option<PaginationParams>,
    _state: PhantomData<S>,
}

impl QueryBuilder<Unscoped> {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            conditions: Vec::new(),
            exprs: Vec::new(),
            scope: Vec::new(),
            joins: Vec::new(),
            sorts: Vec::new(),
            pagination: None,
            _state: PhantomData,
        }
    }
}

impl<S> QueryBuilder<S> {
    /// Add one condition. Conditions that cannot constrain anything are ignored.
    pub fn where_condition(mut self, condition: FilterCondition) -> Self {
        if condition.is_retainable() {
            self.conditions.push(condition);
        }
        self
    }

    /// Add a list of conditions after sanitizing it.
    pub fn where_many(mut self, conditions: &[FilterCondition]) -> Self {
        self.conditions.extend(sanitize(conditions));
        self
    }

    /// Conjoin an arbitrary expression tree with the two-level condition list.
    pub fn where_expr(mut self, expr: FilterExpr) -> Self {
        self.exprs.push(expr);
        self
    }

    pub fn join(
        mut self,
        table: impl Into<String>,
        local_field: impl Into<String>,
        foreign_field: impl Into<String>,
    ) -> Self {
        self.joins.push(JoinSpec {
            table: table.into(),
            local_field: local_field.into(),
            foreign_field: foreign_field.into(),
        });
        self
    }

    /// Append a sort key; earlier keys take precedence.
    pub fn order_by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.sorts.push(SortSpec {
            field: field.into(),
            direction,
        });
        self
    }

    /// Window the result, clamping `page` and `limit` against `max_limit`.
    pub fn paginate(mut self, page: i64, limit: i64, max_limit: u64) -> Self {
        self.pagination = Some(Paginator::new(DEFAULT_LIMIT, max_limit).validate(page, limit));
        self
    }

    pub fn paginate_with(mut self, paginator: &Paginator, request: PageRequest) -> Self {
        self.pagination = Some(paginator.resolve(request));
        self
    }

    pub fn paginate_params(mut self, params: PaginationParams) -> Self {
        self.pagination = Some(params);
        self
    }

    #[must_use]
    pub fn table_name(&self) -> &str {
        &self.table
    }

    #[must_use]
    pub fn conditions(&self) -> &[FilterCondition] {
        &self.conditions
    }

    #[must_use]
    pub fn pagination(&self) -> Option<PaginationParams> {
        self.pagination
    }

    /// Combined predicate: two-level conditions, extra trees, tenant scope.
    #[must_use]
    pub fn filter_expr(&self) -> FilterExpr {
        let mut expr = FilterExpr::from_conditions(&self.conditions);
        for extra in &self.exprs {
            expr = expr.and(extra.clone());
        }
        for scope in &self.scope {
            expr = expr.and(FilterExpr::Leaf(scope.clone()));
        }
        expr
    }

    #[must_use]
    pub fn plan(&self) -> QueryPlan {
        QueryPlan {
            table: self.table.clone(),
            filter: self.filter_expr(),
            joins: self.joins.clone(),
            sorts: self.sorts.clone(),
            limit: self.pagination.map(|p| p.limit),
            offset: self.pagination.map(|p| p.offset()),
        }
    }

    #[must_use]
    pub fn count_plan(&self) -> QueryPlan {
        self.plan().for_count()
    }

    /// Attach a tenant scope predicate and move to the executable state.
    pub(crate) fn scoped(mut self, scope: FilterCondition) -> QueryBuilder<Scoped> {
        self.scope.push(scope);
        QueryBuilder {
            table: self.table,
            conditions: self.conditions,
            exprs: self.exprs,
            scope: self.scope,
            joins: self.joins,
            sorts: self.sorts,
            pagination: self.pagination,
            _state: PhantomData,
        }
    }
}

impl QueryBuilder<Scoped> {
    /// Run the item query and the count query concurrently.
    ///
    /// Without explicit pagination the default window (page 1, 20 rows) applies.
    ///
    /// # Errors
    /// Returns the first [`StoreError`] raised by either query, unmodified.
    pub async fn execute<T>(self, store: &T) -> Result<Page<Row>, StoreError>
    where
        T: Store + ?Sized,
    {
        let params = self
            .pagination
            .unwrap_or_else(|| Paginator::default().resolve(PageRequest::default()));
        let query = self.paginate_params(params);
        let plan = query.plan();
        let count_plan = plan.for_count();

        let (items, total) = futures::try_join!(store.select(&plan), store.count(&count_plan))?;
        Ok(Page::new(
            items,
            build_page_info(params.page, params.limit, total),
        ))
    }

    /// Run only the item query.
    ///
    /// # Errors
    /// Returns the [`StoreError`] raised by the store, unmodified.
    pub async fn execute_simple<T>(self, store: &T) -> Result<Vec<Row>, StoreError>
    where
        T: Store + ?Sized,
    {
        store.select(&self.plan()).await
    }

    /// First matching row, if any.
    ///
    /// # Errors
    /// Returns the [`StoreError`] raised by the store, unmodified.
    pub async fn first<T>(self, store: &T) -> Result<Option<Row>, StoreError>
    where
        T: Store + ?Sized,
    {
        let mut plan = self.plan();
        plan.limit = Some(1);
        Ok(store.select(&plan).await?.into_iter().next())
    }

    /// Number of matching rows.
    ///
    /// # Errors
    /// Returns the [`StoreError`] raised by the store, unmodified.
    pub async fn count<T>(self, store: &T) -> Result<u64, StoreError>
    where
        T: Store + ?Sized,
    {
        store.count(&self.count_plan()).await
    }

    /// Apply `changes` to every matching row of the base table.
    ///
    /// Joins, order and window are ignored for mutations.
    ///
    /// # Errors
    /// Returns the [`StoreError`] raised by the store, unmodified.
    pub async fn update<T>(self, store: &T, changes: &Row) -> Result<u64, StoreError>
    where
        T: Store + ?Sized,
    {
        store.update(&self.table, &self.filter_expr(), changes).await
    }

    /// Delete every matching row of the base table.
    ///
    /// # Errors
    /// Returns the [`StoreError`] raised by the store, unmodified.
    pub async fn delete<T>(self, store: &T) -> Result<u64, StoreError>
    where
        T: Store + ?Sized,
    {
        store.delete(&self.table, &self.filter_expr()).await
    }
}
