//! The storage seam.
//!
//! A [`Store`] executes [`QueryPlan`]s and simple mutations against some
//! relational backend and reports failures as [`StoreError`]s carrying a
//! structured [`StoreErrorCode`]. Two adapters ship with the crate:
//! [`MemoryStore`] for tests and embedded use, and
//! [`SeaOrmStore`] over a `SeaORM` connection.

mod error;
mod memory;
#[cfg(any(feature = "sqlite", feature = "pg"))]
mod sea;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::filter::FilterExpr;
use crate::query::QueryPlan;

pub use error::{StoreError, StoreErrorCode};
pub use memory::MemoryStore;
#[cfg(any(feature = "sqlite", feature = "pg"))]
pub use sea::SeaOrmStore;

/// One record, keyed by column name.
pub type Row = Map<String, Value>;

#[async_trait]
pub trait Store: Send + Sync {
    /// Rows matching the plan, ordered and windowed as requested.
    async fn select(&self, plan: &QueryPlan) -> Result<Vec<Row>, StoreError>;

    /// Number of rows matching the plan's predicate and joins.
    async fn count(&self, plan: &QueryPlan) -> Result<u64, StoreError>;

    /// Insert one row and return it as stored.
    async fn insert(&self, table: &str, row: Row) -> Result<Row, StoreError>;

    /// Apply `changes` to matching rows; returns the number of rows touched.
    async fn update(&self, table: &str, filter: &FilterExpr, changes: &Row)
    -> Result<u64, StoreError>;

    /// Delete matching rows; returns the number of rows removed.
    async fn delete(&self, table: &str, filter: &FilterExpr) -> Result<u64, StoreError>;
}
