//! Query execution.
//!
//! Runs one statement on the session's pool. Statements classified as
//! data-modifying run inside an explicit transaction and are committed on
//! success; a driver error triggers a rollback attempt and is reported,
//! leaving the connection open for the next try. There are no retries.

use std::time::Instant;

use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use common::errors::{AppError, AppResult};
use common::models::query::QueryResult;
use common::utils::SqlClassifier;
use serde_json::Value;
use sqlx::mysql::MySqlRow;
use sqlx::postgres::PgRow;
use sqlx::{Column, MySqlPool, PgPool, Row};

use crate::connection::DatabasePool;

/// Executes a single SQL statement and shapes the outcome for display.
pub async fn execute(pool: &DatabasePool, sql: &str) -> AppResult<QueryResult> {
    let sql = SqlClassifier::strip_trailing_semicolon(sql);
    if sql.is_empty() {
        return Err(AppError::Validation("no SQL query to execute".to_string()));
    }

    tracing::info!(sql = %sql, "executing statement");
    let start = Instant::now();

    let mut result = match pool {
        DatabasePool::MySQL(pool) => execute_mysql(pool, sql).await?,
        DatabasePool::Postgres(pool) => execute_postgres(pool, sql).await?,
    };
    result.execution_time_ms = start.elapsed().as_millis() as u64;
    Ok(result)
}

async fn execute_mysql(pool: &MySqlPool, sql: &str) -> AppResult<QueryResult> {
    if SqlClassifier::returns_rows(sql) {
        let rows = sqlx::query(sql)
            .fetch_all(pool)
            .await
            .map_err(|e| AppError::DatabaseQuery(e.to_string()))?;
        return Ok(mysql_rows_to_result(&rows));
    }

    if SqlClassifier::is_modifying(sql) {
        let mut tx = pool
            .begin()
            .await
            .map_err(|e| AppError::DatabaseQuery(e.to_string()))?;
        return match sqlx::query(sql).execute(&mut *tx).await {
            Ok(done) => {
                tx.commit()
                    .await
                    .map_err(|e| AppError::DatabaseQuery(format!("commit failed: {}", e)))?;
                Ok(QueryResult::affected(done.rows_affected(), 0).mark_committed())
            }
            Err(e) => {
                if let Err(rb_err) = tx.rollback().await {
                    tracing::error!(error = %rb_err, "rollback failed");
                }
                Err(AppError::DatabaseQuery(e.to_string()))
            }
        };
    }

    let done = sqlx::query(sql)
        .execute(pool)
        .await
        .map_err(|e| AppError::DatabaseQuery(e.to_string()))?;
    Ok(QueryResult::affected(done.rows_affected(), 0))
}

async fn execute_postgres(pool: &PgPool, sql: &str) -> AppResult<QueryResult> {
    if SqlClassifier::returns_rows(sql) {
        let rows = sqlx::query(sql)
            .fetch_all(pool)
            .await
            .map_err(|e| AppError::DatabaseQuery(e.to_string()))?;
        return Ok(postgres_rows_to_result(&rows));
    }

    if SqlClassifier::is_modifying(sql) {
        let mut tx = pool
            .begin()
            .await
            .map_err(|e| AppError::DatabaseQuery(e.to_string()))?;
        return match sqlx::query(sql).execute(&mut *tx).await {
            Ok(done) => {
                tx.commit()
                    .await
                    .map_err(|e| AppError::DatabaseQuery(format!("commit failed: {}", e)))?;
                Ok(QueryResult::affected(done.rows_affected(), 0).mark_committed())
            }
            Err(e) => {
                if let Err(rb_err) = tx.rollback().await {
                    tracing::error!(error = %rb_err, "rollback failed");
                }
                Err(AppError::DatabaseQuery(e.to_string()))
            }
        };
    }

    let done = sqlx::query(sql)
        .execute(pool)
        .await
        .map_err(|e| AppError::DatabaseQuery(e.to_string()))?;
    Ok(QueryResult::affected(done.rows_affected(), 0))
}

fn mysql_rows_to_result(rows: &[MySqlRow]) -> QueryResult {
    let columns: Vec<String> = rows
        .first()
        .map(|row| row.columns().iter().map(|c| c.name().to_string()).collect())
        .unwrap_or_default();
    let data = rows
        .iter()
        .map(|row| {
            (0..row.columns().len())
                .map(|idx| mysql_cell_to_json(row, idx))
                .collect()
        })
        .collect();
    QueryResult::with_rows(columns, data, 0)
}

fn postgres_rows_to_result(rows: &[PgRow]) -> QueryResult {
    let columns: Vec<String> = rows
        .first()
        .map(|row| row.columns().iter().map(|c| c.name().to_string()).collect())
        .unwrap_or_default();
    let data = rows
        .iter()
        .map(|row| {
            (0..row.columns().len())
                .map(|idx| postgres_cell_to_json(row, idx))
                .collect()
        })
        .collect();
    QueryResult::with_rows(columns, data, 0)
}

/// Decodes one MySQL cell into a JSON value.
///
/// Tries the common decodes in order; a type nothing in the chain can
/// handle renders as null rather than failing the whole result set.
pub(crate) fn mysql_cell_to_json(row: &MySqlRow, idx: usize) -> Value {
    if let Ok(v) = row.try_get::<Option<i64>, _>(idx) {
        return v.map(Value::from).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<i32>, _>(idx) {
        return v.map(Value::from).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<i16>, _>(idx) {
        return v.map(Value::from).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<i8>, _>(idx) {
        return v.map(Value::from).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<u64>, _>(idx) {
        return v.map(Value::from).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<f64>, _>(idx) {
        return float_to_json(v);
    }
    if let Ok(v) = row.try_get::<Option<f32>, _>(idx) {
        return float_to_json(v.map(f64::from));
    }
    if let Ok(v) = row.try_get::<Option<BigDecimal>, _>(idx) {
        return v
            .map(|bd| Value::String(bd.to_string()))
            .unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<bool>, _>(idx) {
        return v.map(Value::from).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<String>, _>(idx) {
        return v.map(Value::from).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<DateTime<Utc>>, _>(idx) {
        return v
            .map(|dt| Value::String(dt.to_rfc3339()))
            .unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<NaiveDateTime>, _>(idx) {
        return v.map(|dt| Value::String(dt.to_string())).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<NaiveDate>, _>(idx) {
        return v.map(|d| Value::String(d.to_string())).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<NaiveTime>, _>(idx) {
        return v.map(|t| Value::String(t.to_string())).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<Vec<u8>>, _>(idx) {
        return v
            .map(|bytes| Value::String(format!("<{} bytes>", bytes.len())))
            .unwrap_or(Value::Null);
    }
    Value::Null
}

/// Decodes one PostgreSQL cell into a JSON value.
pub(crate) fn postgres_cell_to_json(row: &PgRow, idx: usize) -> Value {
    if let Ok(v) = row.try_get::<Option<i64>, _>(idx) {
        return v.map(Value::from).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<i32>, _>(idx) {
        return v.map(Value::from).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<i16>, _>(idx) {
        return v.map(Value::from).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<f64>, _>(idx) {
        return float_to_json(v);
    }
    if let Ok(v) = row.try_get::<Option<f32>, _>(idx) {
        return float_to_json(v.map(f64::from));
    }
    // SUM/AVG on integer columns come back as NUMERIC.
    if let Ok(v) = row.try_get::<Option<BigDecimal>, _>(idx) {
        return v
            .map(|bd| Value::String(bd.to_string()))
            .unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<bool>, _>(idx) {
        return v.map(Value::from).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<String>, _>(idx) {
        return v.map(Value::from).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<DateTime<Utc>>, _>(idx) {
        return v
            .map(|dt| Value::String(dt.to_rfc3339()))
            .unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<NaiveDateTime>, _>(idx) {
        return v.map(|dt| Value::String(dt.to_string())).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<NaiveDate>, _>(idx) {
        return v.map(|d| Value::String(d.to_string())).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<NaiveTime>, _>(idx) {
        return v.map(|t| Value::String(t.to_string())).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<Vec<u8>>, _>(idx) {
        return v
            .map(|bytes| Value::String(format!("<{} bytes>", bytes.len())))
            .unwrap_or(Value::Null);
    }
    Value::Null
}

fn float_to_json(v: Option<f64>) -> Value {
    v.and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

/// Renders a JSON cell as plain text for the schema sample-row context.
pub(crate) fn cell_to_text(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
