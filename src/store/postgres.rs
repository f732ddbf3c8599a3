//! Generic record operations against PostgreSQL.

use super::{check_patch, check_query, EntityStore, Record, RecordId, UpdateResult};
use crate::error::AppError;
use crate::migration;
use crate::query::QueryRequest;
use crate::registry::{EntityKind, ID_COLUMN};
use crate::sql::{self, PgBindValue, QueryBuf};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::error::ErrorKind;
use sqlx::PgPool;

/// Constraint violations are caused by the request (missing required value, dangling or
/// still-referenced id), so they map to a bad request instead of a database error.
fn constraint_error(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db) = &e {
        if matches!(
            db.kind(),
            ErrorKind::ForeignKeyViolation | ErrorKind::NotNullViolation | ErrorKind::UniqueViolation
        ) {
            return AppError::BadRequest(db.message().to_string());
        }
    }
    AppError::Db(e)
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        PgStore { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn query_many(&self, q: &QueryBuf) -> Result<Vec<Value>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(PgBindValue::from_json(p));
        }
        let rows = query.fetch_all(&self.pool).await.map_err(constraint_error)?;
        Ok(rows.iter().map(row_to_json).collect())
    }

    async fn query_optional(&self, q: &QueryBuf) -> Result<Option<Value>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(PgBindValue::from_json(p));
        }
        let row = query.fetch_optional(&self.pool).await.map_err(constraint_error)?;
        Ok(row.map(|r| row_to_json(&r)))
    }

    async fn execute(&self, q: &QueryBuf) -> Result<u64, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "execute");
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(PgBindValue::from_json(p));
        }
        let result = query.execute(&self.pool).await.map_err(constraint_error)?;
        Ok(result.rows_affected())
    }

    async fn count(&self, q: &QueryBuf) -> Result<u64, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "count");
        let mut query = sqlx::query_scalar::<_, i64>(&q.sql);
        for p in &q.params {
            query = query.bind(PgBindValue::from_json(p));
        }
        let n = query.fetch_one(&self.pool).await.map_err(constraint_error)?;
        Ok(n.max(0) as u64)
    }
}

#[async_trait]
impl EntityStore for PgStore {
    async fn find_and_count(&self, kind: EntityKind, query: &QueryRequest) -> Result<(Vec<Value>, u64), AppError> {
        check_query(kind, query)?;
        let schema = kind.schema();
        let items = self.query_many(&sql::select_page(schema, query)).await?;
        let total = self.count(&sql::count(schema, query)).await?;
        Ok((items, total))
    }

    async fn find_one_by_id(&self, kind: EntityKind, id: RecordId) -> Result<Option<Value>, AppError> {
        let q = sql::select_by_id(kind.schema(), id.get()?);
        self.query_optional(&q).await
    }

    async fn save(&self, kind: EntityKind, record: &Record) -> Result<Value, AppError> {
        let schema = kind.schema();
        let q = sql::insert(schema, record);
        let row = self
            .query_optional(&q)
            .await?
            .ok_or(AppError::Db(sqlx::Error::RowNotFound))?;
        if record.contains_key(ID_COLUMN) {
            let setval = sql::sync_id_sequence(schema);
            tracing::debug!(sql = %setval, "sync id sequence");
            sqlx::query(&setval).execute(&self.pool).await?;
        }
        Ok(row)
    }

    async fn update_by_id(&self, kind: EntityKind, id: RecordId, patch: &Record) -> Result<UpdateResult, AppError> {
        check_patch(kind, patch)?;
        let q = sql::update(kind.schema(), id.get()?, patch);
        let affected = self.execute(&q).await?;
        Ok(UpdateResult::affected(affected))
    }

    async fn delete_by_id(&self, kind: EntityKind, id: RecordId) -> Result<(), AppError> {
        let q = sql::delete(kind.schema(), id.get()?);
        self.execute(&q).await?;
        Ok(())
    }

    async fn synchronize(&self) -> Result<(), AppError> {
        migration::synchronize(&self.pool).await
    }

    async fn reset(&self) -> Result<(), AppError> {
        migration::drop_all(&self.pool).await?;
        migration::synchronize(&self.pool).await
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").fetch_optional(&self.pool).await?;
        Ok(())
    }
}

pub(crate) fn row_to_json(row: &sqlx::postgres::PgRow) -> Value {
    use sqlx::Column;
    use sqlx::Row;
    let mut map = serde_json::Map::new();
    for col in row.columns() {
        let name = col.name();
        let v = cell_to_value(row, name);
        map.insert(name.to_string(), v);
    }
    Value::Object(map)
}

fn cell_to_value(row: &sqlx::postgres::PgRow, name: &str) -> Value {
    use sqlx::Row;
    if let Ok(Some(n)) = row.try_get::<Option<i64>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<i32>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<f64>, _>(name) {
        if let Some(n) = serde_json::Number::from_f64(n) {
            return Value::Number(n);
        }
    }
    if let Ok(Some(b)) = row.try_get::<Option<bool>, _>(name) {
        return Value::Bool(b);
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(name) {
        return Value::String(d.to_rfc3339_opts(chrono::SecondsFormat::Millis, true));
    }
    if let Ok(Some(s)) = row.try_get::<Option<String>, _>(name) {
        return Value::String(s);
    }
    if let Ok(Some(j)) = row.try_get::<Option<Value>, _>(name) {
        return j;
    }
    Value::Null
}
