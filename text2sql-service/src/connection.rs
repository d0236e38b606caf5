//! Database connection handling.
//!
//! Opens and closes the session's connection pool for the supported
//! database types (MySQL, PostgreSQL).

use std::time::Duration;

use common::errors::{AppError, AppResult};
use common::models::connection::{ConnectionProfile, DbType};
use sqlx::mysql::MySqlPoolOptions;
use sqlx::postgres::PgPoolOptions;
use sqlx::{MySqlPool, PgPool};

/// Connection pool wrapper for the supported database types.
#[derive(Clone)]
pub enum DatabasePool {
    /// MySQL connection pool.
    MySQL(MySqlPool),
    /// PostgreSQL connection pool.
    Postgres(PgPool),
}

impl DatabasePool {
    /// Opens a connection pool for the given profile.
    ///
    /// Any driver error aborts the connect action; the caller reports it and
    /// the session stays disconnected.
    pub async fn connect(
        profile: &ConnectionProfile,
        max_connections: u32,
        connect_timeout_secs: u64,
    ) -> AppResult<Self> {
        let url = profile.connection_url();
        let timeout = Duration::from_secs(connect_timeout_secs);

        match profile.db_type {
            DbType::MySQL => {
                let pool = MySqlPoolOptions::new()
                    .max_connections(max_connections)
                    .acquire_timeout(timeout)
                    .connect(&url)
                    .await
                    .map_err(|e| AppError::DatabaseConnection(e.to_string()))?;
                Ok(DatabasePool::MySQL(pool))
            }
            DbType::Postgres => {
                let pool = PgPoolOptions::new()
                    .max_connections(max_connections)
                    .acquire_timeout(timeout)
                    .connect(&url)
                    .await
                    .map_err(|e| AppError::DatabaseConnection(e.to_string()))?;
                Ok(DatabasePool::Postgres(pool))
            }
        }
    }

    /// Database type behind this pool.
    pub fn db_type(&self) -> DbType {
        match self {
            DatabasePool::MySQL(_) => DbType::MySQL,
            DatabasePool::Postgres(_) => DbType::Postgres,
        }
    }

    /// Round-trip check, run right after connect.
    pub async fn ping(&self) -> AppResult<()> {
        match self {
            DatabasePool::MySQL(pool) => {
                sqlx::query("SELECT 1")
                    .execute(pool)
                    .await
                    .map_err(|e| AppError::DatabaseConnection(e.to_string()))?;
            }
            DatabasePool::Postgres(pool) => {
                sqlx::query("SELECT 1")
                    .execute(pool)
                    .await
                    .map_err(|e| AppError::DatabaseConnection(e.to_string()))?;
            }
        }
        Ok(())
    }

    /// Closes the pool. Used by session reset; never fails.
    pub async fn close(&self) {
        match self {
            DatabasePool::MySQL(pool) => pool.close().await,
            DatabasePool::Postgres(pool) => pool.close().await,
        }
    }
}
