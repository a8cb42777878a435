use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sea_orm::sea_query::{
    Alias, Asterisk, Condition, ConditionalStatement, Expr, Func, JoinType, Keyword, LikeExpr,
    Order, Query, SimpleExpr, Value as SqlValue,
};
use sea_orm::sqlx;
use sea_orm::{
    ConnAcquireErr, ConnectionTrait, DatabaseBackend, DatabaseConnection, DbErr,
    FromQueryResult, JsonValue, RuntimeErr,
};
use serde_json::Value;
use uuid::Uuid;

use super::{Row, Store, StoreError, StoreErrorCode};
use crate::filter::{FilterCondition, FilterExpr, FilterOperator};
use crate::query::{QueryPlan, SortDirection};

const COUNT_ALIAS: &str = "num_items";

/// [`Store`] over a `SeaORM` connection.
///
/// Plans are compiled to `sea_query` statements for the connection's backend.
/// Rows travel as JSON objects. Driver failures are mapped to
/// [`StoreErrorCode`]s from the sqlx error variant and the database error code.
#[derive(Debug, Clone)]
pub struct SeaOrmStore {
    conn: DatabaseConnection,
}

impl SeaOrmStore {
    #[must_use]
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    #[must_use]
    pub fn conn(&self) -> &DatabaseConnection {
        &self.conn
    }

    fn backend(&self) -> DatabaseBackend {
        self.conn.get_database_backend()
    }

    fn map_err(&self, err: &DbErr) -> StoreError {
        StoreError::new(classify_db_err(self.backend(), err), err.to_string())
    }
}

fn column(base: &str, field: &str) -> (Alias, Alias) {
    match field.split_once('.') {
        Some((table, col)) => (Alias::new(table), Alias::new(col)),
        None => (Alias::new(base), Alias::new(field)),
    }
}

/// Fixed-width UTC text for an RFC 3339 string, so text order is time order.
fn canonical_timestamp(s: &str) -> Option<String> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|ts| ts.with_timezone(&Utc).to_rfc3339_opts(SecondsFormat::Nanos, true))
}

/// Bind a JSON scalar; Postgres gets typed uuids and timestamps, other
/// backends get timestamps as fixed-width text.
fn sql_value(backend: DatabaseBackend, value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::String(None),
        Value::Bool(b) => SqlValue::from(*b),
        Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => SqlValue::from(i),
            (None, Some(f)) => SqlValue::from(f),
            (None, None) => SqlValue::from(n.to_string()),
        },
        Value::String(s) if backend == DatabaseBackend::Postgres => {
            if let Ok(id) = Uuid::parse_str(s) {
                SqlValue::from(id)
            } else if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
                SqlValue::from(ts.with_timezone(&Utc))
            } else {
                SqlValue::from(s.clone())
            }
        }
        Value::String(s) => SqlValue::from(canonical_timestamp(s).unwrap_or_else(|| s.clone())),
        Value::Array(_) | Value::Object(_) => SqlValue::from(value.clone()),
    }
}

fn sql_expr(backend: DatabaseBackend, value: &Value) -> SimpleExpr {
    if value.is_null() {
        SimpleExpr::Keyword(Keyword::Null)
    } else {
        SimpleExpr::Value(sql_value(backend, value))
    }
}

fn like_pattern(value: &Value) -> String {
    let raw = match value {
        Value::String(s) => s.to_lowercase(),
        other => other.to_string().to_lowercase(),
    };
    let mut escaped = String::with_capacity(raw.len() + 2);
    escaped.push('%');
    for ch in raw.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

fn always(truth: bool) -> SimpleExpr {
    Expr::val(1).eq(i32::from(truth))
}

fn leaf(backend: DatabaseBackend, base: &str, c: &FilterCondition) -> SimpleExpr {
    let col = || Expr::col(column(base, &c.field));
    let value = || sql_value(backend, &c.value);
    let list = || -> Vec<SqlValue> {
        match &c.value {
            Value::Array(items) => items.iter().map(|v| sql_value(backend, v)).collect(),
            other => vec![sql_value(backend, other)],
        }
    };

    match c.operator {
        FilterOperator::Eq => col().eq(value()),
        FilterOperator::Ne => col().ne(value()),
        FilterOperator::Gt => col().gt(value()),
        FilterOperator::Gte => col().gte(value()),
        FilterOperator::Lt => col().lt(value()),
        FilterOperator::Lte => col().lte(value()),
        FilterOperator::Like => Expr::expr(Func::lower(col()))
            .like(LikeExpr::new(like_pattern(&c.value)).escape('\\')),
        FilterOperator::In => col().is_in(list()),
        FilterOperator::NotIn => col().is_not_in(list()),
        FilterOperator::Between => match &c.value {
            Value::Array(bounds) if bounds.len() == 2 => col().between(
                sql_value(backend, &bounds[0]),
                sql_value(backend, &bounds[1]),
            ),
            _ => always(false),
        },
    }
}

fn condition(backend: DatabaseBackend, base: &str, expr: &FilterExpr) -> Condition {
    match expr {
        FilterExpr::And(children) if children.is_empty() => Condition::all().add(always(true)),
        FilterExpr::Or(children) if children.is_empty() => Condition::all().add(always(false)),
        FilterExpr::And(children) => children
            .iter()
            .fold(Condition::all(), |acc, c| acc.add(condition(backend, base, c))),
        FilterExpr::Or(children) => children
            .iter()
            .fold(Condition::any(), |acc, c| acc.add(condition(backend, base, c))),
        FilterExpr::Leaf(c) => Condition::all().add(leaf(backend, base, c)),
    }
}

fn object(value: JsonValue) -> Row {
    match value {
        Value::Object(map) => map,
        _ => Row::new(),
    }
}

pub(crate) fn classify_db_err(backend: DatabaseBackend, err: &DbErr) -> StoreErrorCode {
    match err {
        DbErr::ConnectionAcquire(ConnAcquireErr::Timeout) => StoreErrorCode::Timeout,
        DbErr::ConnectionAcquire(_) | DbErr::Conn(RuntimeErr::Internal(_)) => {
            StoreErrorCode::Connection
        }
        DbErr::Conn(RuntimeErr::SqlxError(e))
        | DbErr::Exec(RuntimeErr::SqlxError(e))
        | DbErr::Query(RuntimeErr::SqlxError(e)) => classify_sqlx(backend, e),
        DbErr::RecordNotFound(_) => StoreErrorCode::NotFound,
        _ => StoreErrorCode::Other,
    }
}

fn classify_sqlx(backend: DatabaseBackend, err: &sqlx::Error) -> StoreErrorCode {
    match err {
        sqlx::Error::PoolTimedOut => StoreErrorCode::Timeout,
        sqlx::Error::PoolClosed | sqlx::Error::WorkerCrashed => StoreErrorCode::Connection,
        sqlx::Error::Io(_) | sqlx::Error::Tls(_) => StoreErrorCode::Network,
        sqlx::Error::RowNotFound => StoreErrorCode::NotFound,
        sqlx::Error::Database(db) => match (backend, db.code()) {
            (DatabaseBackend::Sqlite, Some(code)) => code
                .parse::<i32>()
                .map_or(StoreErrorCode::Other, StoreErrorCode::from_sqlite_code),
            (DatabaseBackend::Postgres, Some(code)) => StoreErrorCode::from_sqlstate(&code),
            _ => StoreErrorCode::Other,
        },
        _ => StoreErrorCode::Other,
    }
}

#[async_trait]
impl Store for SeaOrmStore {
    async fn select(&self, plan: &QueryPlan) -> Result<Vec<Row>, StoreError> {
        let backend = self.backend();
        let mut query = Query::select();
        query
            .column((Alias::new(&plan.table), Asterisk))
            .from(Alias::new(&plan.table));
        for join in &plan.joins {
            query.join(
                JoinType::InnerJoin,
                Alias::new(&join.table),
                Expr::col(column(&plan.table, &join.local_field))
                    .equals((Alias::new(&join.table), Alias::new(&join.foreign_field))),
            );
        }
        query.cond_where(condition(backend, &plan.table, &plan.filter));
        for sort in &plan.sorts {
            let order = match sort.direction {
                SortDirection::Asc => Order::Asc,
                SortDirection::Desc => Order::Desc,
            };
            query.order_by(column(&plan.table, &sort.field), order);
        }
        if let Some(limit) = plan.limit {
            query.limit(limit);
        }
        if let Some(offset) = plan.offset {
            query.offset(offset);
        }

        let stmt = backend.build(&query);
        tracing::trace!(sql = %stmt, "select");
        let rows = JsonValue::find_by_statement(stmt)
            .all(&self.conn)
            .await
            .map_err(|e| self.map_err(&e))?;
        Ok(rows.into_iter().map(object).collect())
    }

    async fn count(&self, plan: &QueryPlan) -> Result<u64, StoreError> {
        let backend = self.backend();
        let mut query = Query::select();
        query
            .expr_as(Expr::col(Asterisk).count(), Alias::new(COUNT_ALIAS))
            .from(Alias::new(&plan.table));
        for join in &plan.joins {
            query.join(
                JoinType::InnerJoin,
                Alias::new(&join.table),
                Expr::col(column(&plan.table, &join.local_field))
                    .equals((Alias::new(&join.table), Alias::new(&join.foreign_field))),
            );
        }
        query.cond_where(condition(backend, &plan.table, &plan.filter));

        let stmt = backend.build(&query);
        tracing::trace!(sql = %stmt, "count");
        let row = self
            .conn
            .query_one(stmt)
            .await
            .map_err(|e| self.map_err(&e))?;
        let total = row
            .map(|r| r.try_get_by_index::<i64>(0))
            .transpose()
            .map_err(|e| self.map_err(&e))?
            .unwrap_or(0);
        Ok(u64::try_from(total).unwrap_or(0))
    }

    async fn insert(&self, table: &str, row: Row) -> Result<Row, StoreError> {
        let backend = self.backend();
        let mut insert = Query::insert();
        insert
            .into_table(Alias::new(table))
            .columns(row.keys().map(Alias::new));
        insert
            .values(row.values().map(|v| sql_expr(backend, v)))
            .map_err(|e| StoreError::invalid_input(e.to_string()))?;

        let stmt = backend.build(&insert);
        tracing::trace!(sql = %stmt, "insert");
        self.conn
            .execute(stmt)
            .await
            .map_err(|e| self.map_err(&e))?;
        Ok(row)
    }

    async fn update(
        &self,
        table: &str,
        filter: &FilterExpr,
        changes: &Row,
    ) -> Result<u64, StoreError> {
        if changes.is_empty() {
            return Ok(0);
        }
        let backend = self.backend();
        let mut update = Query::update();
        update
            .table(Alias::new(table))
            .values(
                changes
                    .iter()
                    .map(|(col, v)| (Alias::new(col), sql_expr(backend, v))),
            )
            .cond_where(condition(backend, table, filter));

        let stmt = backend.build(&update);
        tracing::trace!(sql = %stmt, "update");
        let res = self
            .conn
            .execute(stmt)
            .await
            .map_err(|e| self.map_err(&e))?;
        Ok(res.rows_affected())
    }

    async fn delete(&self, table: &str, filter: &FilterExpr) -> Result<u64, StoreError> {
        let backend = self.backend();
        let mut delete = Query::delete();
        delete
            .from_table(Alias::new(table))
            .cond_where(condition(backend, table, filter));

        let stmt = backend.build(&delete);
        tracing::trace!(sql = %stmt, "delete");
        let res = self
            .conn
            .execute(stmt)
            .await
            .map_err(|e| self.map_err(&e))?;
        Ok(res.rows_affected())
    }
}
