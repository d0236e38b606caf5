//! Schema introspection for prompting context.
//!
//! Builds the usable-table list and the `{table_info}` prompt variable from
//! `information_schema`: per table, the column list plus a handful of sample
//! rows so the model can see what the data looks like.

use common::errors::{AppError, AppResult};
use sqlx::{MySqlPool, PgPool, Row};

use crate::connection::DatabasePool;
use crate::executor::{cell_to_text, mysql_cell_to_json, postgres_cell_to_json};

/// Sample rows included per table in the prompt context.
const SAMPLE_ROWS_PER_TABLE: usize = 5;

/// Snapshot of the connected schema, captured once per translator init.
#[derive(Debug, Clone)]
pub struct SchemaSnapshot {
    /// Base-table names the model may reference.
    pub usable_tables: Vec<String>,
    /// Rendered schema text for the `{table_info}` prompt variable.
    pub table_info: String,
}

/// Introspects the connected database.
pub async fn introspect(pool: &DatabasePool) -> AppResult<SchemaSnapshot> {
    match pool {
        DatabasePool::MySQL(pool) => introspect_mysql(pool).await,
        DatabasePool::Postgres(pool) => introspect_postgres(pool).await,
    }
}

async fn introspect_mysql(pool: &MySqlPool) -> AppResult<SchemaSnapshot> {
    let rows = sqlx::query(
        "SELECT TABLE_NAME FROM information_schema.TABLES
         WHERE TABLE_SCHEMA = DATABASE() AND TABLE_TYPE = 'BASE TABLE'
         ORDER BY TABLE_NAME",
    )
    .fetch_all(pool)
    .await
    .map_err(|e| AppError::DatabaseQuery(format!("failed to list tables: {}", e)))?;

    let tables: Vec<String> = rows
        .iter()
        .filter_map(|row| row.try_get::<String, _>("TABLE_NAME").ok())
        .collect();

    let mut table_info = String::new();
    for table in &tables {
        let columns = sqlx::query(
            "SELECT COLUMN_NAME, COLUMN_TYPE FROM information_schema.COLUMNS
             WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ?
             ORDER BY ORDINAL_POSITION",
        )
        .bind(table)
        .fetch_all(pool)
        .await
        .map_err(|e| AppError::DatabaseQuery(format!("failed to describe {}: {}", table, e)))?;

        let column_list: Vec<String> = columns
            .iter()
            .filter_map(|row| {
                let name = row.try_get::<String, _>("COLUMN_NAME").ok()?;
                let ty = row.try_get::<String, _>("COLUMN_TYPE").ok()?;
                Some(format!("{} ({})", name, ty))
            })
            .collect();

        append_table_header(&mut table_info, table, &column_list);

        // Table names come from information_schema, not user input.
        let sample_sql = format!("SELECT * FROM `{}` LIMIT {}", table, SAMPLE_ROWS_PER_TABLE);
        match sqlx::query(&sample_sql).fetch_all(pool).await {
            Ok(sample) => {
                for row in &sample {
                    let cells: Vec<String> = (0..row.columns().len())
                        .map(|idx| cell_to_text(&mysql_cell_to_json(row, idx)))
                        .collect();
                    table_info.push_str(&cells.join("\t"));
                    table_info.push('\n');
                }
            }
            Err(e) => {
                tracing::warn!(table = %table, error = %e, "sample rows unavailable");
            }
        }
        table_info.push('\n');
    }

    Ok(SchemaSnapshot {
        usable_tables: tables,
        table_info,
    })
}

async fn introspect_postgres(pool: &PgPool) -> AppResult<SchemaSnapshot> {
    let rows = sqlx::query(
        "SELECT table_name FROM information_schema.tables
         WHERE table_schema = 'public' AND table_type = 'BASE TABLE'
         ORDER BY table_name",
    )
    .fetch_all(pool)
    .await
    .map_err(|e| AppError::DatabaseQuery(format!("failed to list tables: {}", e)))?;

    let tables: Vec<String> = rows
        .iter()
        .filter_map(|row| row.try_get::<String, _>("table_name").ok())
        .collect();

    let mut table_info = String::new();
    for table in &tables {
        let columns = sqlx::query(
            "SELECT column_name, data_type FROM information_schema.columns
             WHERE table_schema = 'public' AND table_name = $1
             ORDER BY ordinal_position",
        )
        .bind(table)
        .fetch_all(pool)
        .await
        .map_err(|e| AppError::DatabaseQuery(format!("failed to describe {}: {}", table, e)))?;

        let column_list: Vec<String> = columns
            .iter()
            .filter_map(|row| {
                let name = row.try_get::<String, _>("column_name").ok()?;
                let ty = row.try_get::<String, _>("data_type").ok()?;
                Some(format!("{} ({})", name, ty))
            })
            .collect();

        append_table_header(&mut table_info, table, &column_list);

        let sample_sql = format!(
            "SELECT * FROM \"{}\" LIMIT {}",
            table, SAMPLE_ROWS_PER_TABLE
        );
        match sqlx::query(&sample_sql).fetch_all(pool).await {
            Ok(sample) => {
                for row in &sample {
                    let cells: Vec<String> = (0..row.columns().len())
                        .map(|idx| cell_to_text(&postgres_cell_to_json(row, idx)))
                        .collect();
                    table_info.push_str(&cells.join("\t"));
                    table_info.push('\n');
                }
            }
            Err(e) => {
                tracing::warn!(table = %table, error = %e, "sample rows unavailable");
            }
        }
        table_info.push('\n');
    }

    Ok(SchemaSnapshot {
        usable_tables: tables,
        table_info,
    })
}

fn append_table_header(out: &mut String, table: &str, columns: &[String]) {
    out.push_str(&format!("Table: {}\n", table));
    out.push_str(&format!("Columns: {}\n", columns.join(", ")));
    out.push_str("Sample rows:\n");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_header_layout() {
        let mut out = String::new();
        append_table_header(
            &mut out,
            "users",
            &["id (int)".to_string(), "name (varchar(100))".to_string()],
        );
        assert!(out.starts_with("Table: users\n"));
        assert!(out.contains("Columns: id (int), name (varchar(100))\n"));
        assert!(out.ends_with("Sample rows:\n"));
    }
}
