use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;

use super::{Row, Store, StoreError};
use crate::filter::{FilterExpr, compare_values, values_equal};
use crate::query::{QueryPlan, SortDirection};

/// In-process [`Store`] keeping every table as a vector of JSON rows.
///
/// Evaluates plans with the same semantics the SQL adapter compiles to:
/// inner joins on equality, null-never-matches predicates, stable multi-key
/// sort with missing values last, then offset and limit. Declared unique
/// columns reject duplicates with a `unique-violation`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<String, Vec<Row>>>,
    unique_keys: HashMap<String, Vec<String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare `column` of `table` unique.
    #[must_use]
    pub fn with_unique_key(mut self, table: &str, column: &str) -> Self {
        self.unique_keys
            .entry(table.to_owned())
            .or_default()
            .push(column.to_owned());
        self
    }

    /// Append rows without any constraint checks.
    pub fn seed(&self, table: &str, rows: impl IntoIterator<Item = Row>) {
        self.tables
            .write()
            .entry(table.to_owned())
            .or_default()
            .extend(rows);
    }

    /// Snapshot of a table's rows in insertion order.
    #[must_use]
    pub fn rows(&self, table: &str) -> Vec<Row> {
        self.tables.read().get(table).cloned().unwrap_or_default()
    }

    #[must_use]
    pub fn len(&self, table: &str) -> usize {
        self.tables.read().get(table).map_or(0, Vec::len)
    }

    #[must_use]
    pub fn is_empty(&self, table: &str) -> bool {
        self.len(table) == 0
    }

    fn unique_columns(&self, table: &str) -> &[String] {
        self.unique_keys.get(table).map_or(&[][..], Vec::as_slice)
    }

    /// Base rows joined with every [`JoinSpec`](crate::query::JoinSpec), each
    /// paired with a view exposing `col` and `table.col` names.
    fn joined(tables: &HashMap<String, Vec<Row>>, plan: &QueryPlan) -> Vec<(Row, Row)> {
        let Some(base) = tables.get(&plan.table) else {
            return Vec::new();
        };

        let mut out: Vec<(Row, Row)> = base
            .iter()
            .map(|row| (row.clone(), view_of(&plan.table, row)))
            .collect();

        for join in &plan.joins {
            let foreign = tables.get(&join.table).map_or(&[][..], Vec::as_slice);
            out = out
                .into_iter()
                .flat_map(|(row, view)| {
                    let local = view.get(&join.local_field).cloned();
                    foreign
                        .iter()
                        .filter(|candidate| match (&local, candidate.get(&join.foreign_field)) {
                            (Some(l), Some(f)) if !l.is_null() && !f.is_null() => values_equal(l, f),
                            _ => false,
                        })
                        .map(|matched| {
                            let mut view = view.clone();
                            for (col, value) in matched {
                                view.insert(format!("{}.{col}", join.table), value.clone());
                            }
                            (row.clone(), view)
                        })
                        .collect::<Vec<_>>()
                })
                .collect();
        }
        out
    }

    fn matching(tables: &HashMap<String, Vec<Row>>, plan: &QueryPlan) -> Vec<(Row, Row)> {
        Self::joined(tables, plan)
            .into_iter()
            .filter(|(_, view)| plan.filter.matches(&|field: &str| view.get(field)))
            .collect()
    }

    fn check_unique(&self, table: &str, existing: &[Row], candidate: &Row) -> Result<(), StoreError> {
        for column in self.unique_columns(table) {
            let Some(value) = candidate.get(column).filter(|v| !v.is_null()) else {
                continue;
            };
            if existing
                .iter()
                .any(|row| row.get(column).is_some_and(|v| values_equal(v, value)))
            {
                return Err(StoreError::unique_violation(format!(
                    "duplicate value for {table}.{column}"
                )));
            }
        }
        Ok(())
    }
}

fn view_of(table: &str, row: &Row) -> Row {
    let mut view = row.clone();
    for (col, value) in row {
        view.insert(format!("{table}.{col}"), value.clone());
    }
    view
}

fn compare_for_sort(a: Option<&Value>, b: Option<&Value>, direction: SortDirection) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => {
            let ord = compare_values(a, b).unwrap_or(Ordering::Equal);
            match direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            }
        }
    }
}

fn to_usize(n: u64) -> usize {
    usize::try_from(n).unwrap_or(usize::MAX)
}

#[async_trait]
impl Store for MemoryStore {
    async fn select(&self, plan: &QueryPlan) -> Result<Vec<Row>, StoreError> {
        let mut rows = {
            let tables = self.tables.read();
            Self::matching(&tables, plan)
        };

        rows.sort_by(|(_, a), (_, b)| {
            plan.sorts
                .iter()
                .map(|s| compare_for_sort(a.get(&s.field), b.get(&s.field), s.direction))
                .find(|o| *o != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        });

        let offset = plan.offset.map_or(0, to_usize);
        let limit = plan.limit.map_or(usize::MAX, to_usize);
        Ok(rows
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|(row, _)| row)
            .collect())
    }

    async fn count(&self, plan: &QueryPlan) -> Result<u64, StoreError> {
        let tables = self.tables.read();
        let n = Self::matching(&tables, plan).len();
        Ok(u64::try_from(n).unwrap_or(u64::MAX))
    }

    async fn insert(&self, table: &str, row: Row) -> Result<Row, StoreError> {
        let mut tables = self.tables.write();
        let rows = tables.entry(table.to_owned()).or_default();
        self.check_unique(table, rows, &row)?;
        rows.push(row.clone());
        Ok(row)
    }

    async fn update(
        &self,
        table: &str,
        filter: &FilterExpr,
        changes: &Row,
    ) -> Result<u64, StoreError> {
        let mut tables = self.tables.write();
        let Some(rows) = tables.get_mut(table) else {
            return Ok(0);
        };

        let hits: Vec<usize> = rows
            .iter()
            .enumerate()
            .filter(|(_, row)| {
                let view = view_of(table, row);
                filter.matches(&|field: &str| view.get(field))
            })
            .map(|(i, _)| i)
            .collect();
        if hits.is_empty() {
            return Ok(0);
        }

        if hits.len() > 1 && self.unique_columns(table).iter().any(|c| changes.contains_key(c)) {
            return Err(StoreError::unique_violation(format!(
                "update would duplicate a unique column of {table}"
            )));
        }
        let others: Vec<Row> = rows
            .iter()
            .enumerate()
            .filter(|(i, _)| !hits.contains(i))
            .map(|(_, row)| row.clone())
            .collect();
        self.check_unique(table, &others, changes)?;

        for i in &hits {
            for (col, value) in changes {
                rows[*i].insert(col.clone(), value.clone());
            }
        }
        Ok(u64::try_from(hits.len()).unwrap_or(u64::MAX))
    }

    async fn delete(&self, table: &str, filter: &FilterExpr) -> Result<u64, StoreError> {
        let mut tables = self.tables.write();
        let Some(rows) = tables.get_mut(table) else {
            return Ok(0);
        };
        let before = rows.len();
        rows.retain(|row| {
            let view = view_of(table, row);
            !filter.matches(&|field: &str| view.get(field))
        });
        Ok(u64::try_from(before - rows.len()).unwrap_or(u64::MAX))
    }
}
