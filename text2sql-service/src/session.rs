//! Session state and translation-engine memoization.
//!
//! One logical session per running service: the connection, its
//! credentials, the latest generated SQL and the detected table list live
//! here. Translation engines are memoized per (connection URL, API key,
//! dialect) so reconnecting with the same parameters skips
//! re-introspection; the memo is invalidated wholesale on reset.

use std::collections::HashMap;
use std::sync::Arc;

use common::config::AppConfig;
use common::errors::{AppError, AppResult};
use common::models::connection::ConnectionProfile;
use tokio::sync::RwLock;

use crate::connection::DatabasePool;
use crate::schema;
use crate::translator::{GeminiBackend, SqlTranslator};

/// Key identifying a memoized translation engine.
#[derive(Clone, PartialEq, Eq, Hash)]
struct EngineKey {
    db_uri: String,
    api_key: String,
    dialect: String,
}

/// Mutable per-session fields, cleared as a unit on reset.
#[derive(Default)]
struct SessionFields {
    profile: Option<ConnectionProfile>,
    pool: Option<DatabasePool>,
    api_key: Option<String>,
    generated_sql: String,
    usable_tables: Vec<String>,
}

/// Read-only view of the session for status responses.
pub struct SessionSnapshot {
    pub connected: bool,
    pub db_type: Option<String>,
    pub database: Option<String>,
    pub usable_tables: Vec<String>,
    pub generated_sql: String,
}

/// Owns the single logical session and the engine memo.
pub struct SessionManager {
    config: AppConfig,
    http_client: reqwest::Client,
    fields: RwLock<SessionFields>,
    engines: RwLock<HashMap<EngineKey, Arc<SqlTranslator>>>,
}

impl SessionManager {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
            fields: RwLock::new(SessionFields::default()),
            engines: RwLock::new(HashMap::new()),
        }
    }

    /// Opens a connection and initializes (or reuses) the translation
    /// engine for it. Returns the detected table list.
    ///
    /// A previous connection is fully torn down first. When engine init
    /// fails the fresh connection is closed again, leaving the session
    /// disconnected.
    pub async fn connect(
        &self,
        profile: ConnectionProfile,
        api_key: Option<&str>,
    ) -> AppResult<Vec<String>> {
        let api_key = self.resolve_api_key(api_key)?;

        if self.fields.read().await.pool.is_some() {
            tracing::info!("closing previous connection before reconnect");
            self.reset().await;
        }

        let pool = DatabasePool::connect(
            &profile,
            self.config.max_connections,
            self.config.connect_timeout_secs,
        )
        .await?;
        if let Err(e) = pool.ping().await {
            pool.close().await;
            return Err(e);
        }

        let key = self.engine_key(&profile, &api_key);
        let cached = self.engines.read().await.get(&key).cloned();
        let engine = match cached {
            Some(engine) => engine,
            None => {
                let snapshot = match schema::introspect(&pool).await {
                    Ok(snapshot) => snapshot,
                    Err(e) => {
                        pool.close().await;
                        return Err(e);
                    }
                };
                let backend = GeminiBackend::new(
                    self.http_client.clone(),
                    api_key.clone(),
                    self.config.gemini_model.clone(),
                );
                let engine = Arc::new(SqlTranslator::new(
                    Box::new(backend),
                    profile.db_type,
                    snapshot,
                ));
                self.engines.write().await.insert(key, engine.clone());
                engine
            }
        };

        let usable_tables = engine.usable_tables().to_vec();
        tracing::info!(
            db_type = %profile.db_type,
            database = %profile.database,
            tables = usable_tables.len(),
            "connected"
        );

        let mut fields = self.fields.write().await;
        fields.profile = Some(profile);
        fields.pool = Some(pool);
        fields.api_key = Some(api_key);
        fields.generated_sql.clear();
        fields.usable_tables = usable_tables.clone();
        Ok(usable_tables)
    }

    /// The translation engine for the current connection.
    pub async fn translator(&self) -> AppResult<Arc<SqlTranslator>> {
        let fields = self.fields.read().await;
        let profile = fields.profile.as_ref().ok_or(AppError::NotConnected)?;
        let api_key = fields.api_key.as_deref().ok_or(AppError::NotConnected)?;
        let key = self.engine_key(profile, api_key);
        self.engines
            .read()
            .await
            .get(&key)
            .cloned()
            .ok_or(AppError::NotConnected)
    }

    /// The current connection pool.
    pub async fn pool(&self) -> AppResult<DatabasePool> {
        self.fields
            .read()
            .await
            .pool
            .clone()
            .ok_or(AppError::NotConnected)
    }

    /// Stores the latest generated SQL.
    pub async fn set_generated_sql(&self, sql: &str) {
        self.fields.write().await.generated_sql = sql.to_string();
    }

    /// The latest generated SQL, empty when none was produced.
    pub async fn generated_sql(&self) -> String {
        self.fields.read().await.generated_sql.clone()
    }

    /// Read-only view for status responses.
    pub async fn snapshot(&self) -> SessionSnapshot {
        let fields = self.fields.read().await;
        SessionSnapshot {
            connected: fields.pool.is_some(),
            db_type: fields.profile.as_ref().map(|p| p.db_type.to_string()),
            database: fields.profile.as_ref().map(|p| p.database.clone()),
            usable_tables: fields.usable_tables.clone(),
            generated_sql: fields.generated_sql.clone(),
        }
    }

    /// Full reset: closes the connection best-effort, clears every session
    /// field and evicts all memoized translation engines. The next connect
    /// re-initializes from scratch.
    pub async fn reset(&self) {
        let pool = self.fields.write().await.pool.take();
        if let Some(pool) = pool {
            pool.close().await;
        }
        *self.fields.write().await = SessionFields::default();
        self.engines.write().await.clear();
        tracing::info!("session reset");
    }

    fn engine_key(&self, profile: &ConnectionProfile, api_key: &str) -> EngineKey {
        EngineKey {
            db_uri: profile.connection_url(),
            api_key: api_key.to_string(),
            dialect: profile.db_type.to_string(),
        }
    }

    /// UI-supplied key wins over the environment.
    fn resolve_api_key(&self, override_key: Option<&str>) -> AppResult<String> {
        override_key
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(String::from)
            .or_else(|| self.config.google_api_key.clone())
            .ok_or(AppError::MissingApiKey)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaSnapshot;
    use crate::translator::LlmBackend;
    use async_trait::async_trait;
    use common::models::connection::DbType;
    use serde_json::Value;

    struct StubBackend;

    #[async_trait]
    impl LlmBackend for StubBackend {
        async fn generate(&self, _prompt: &str) -> AppResult<Value> {
            Ok(Value::String("SELECT 1".to_string()))
        }
    }

    fn manager() -> SessionManager {
        let mut config = AppConfig::load_with_service("text2sql-service");
        config.google_api_key = Some("env-key".to_string());
        SessionManager::new(config)
    }

    fn profile() -> ConnectionProfile {
        ConnectionProfile {
            db_type: DbType::MySQL,
            host: "localhost".into(),
            port: 3306,
            username: "root".into(),
            password: "pw".into(),
            database: "shop".into(),
        }
    }

    fn stub_engine() -> Arc<SqlTranslator> {
        Arc::new(SqlTranslator::new(
            Box::new(StubBackend),
            DbType::MySQL,
            SchemaSnapshot {
                usable_tables: vec!["users".to_string()],
                table_info: String::new(),
            },
        ))
    }

    #[test]
    fn test_api_key_override_wins_over_env() {
        let mgr = manager();
        assert_eq!(mgr.resolve_api_key(Some("ui-key")).unwrap(), "ui-key");
        assert_eq!(mgr.resolve_api_key(Some("  ")).unwrap(), "env-key");
        assert_eq!(mgr.resolve_api_key(None).unwrap(), "env-key");
    }

    #[test]
    fn test_missing_api_key_is_an_error() {
        let mut config = AppConfig::load_with_service("text2sql-service");
        config.google_api_key = None;
        let mgr = SessionManager::new(config);
        assert_eq!(mgr.resolve_api_key(None).unwrap_err().code(), "MISSING_API_KEY");
    }

    #[tokio::test]
    async fn test_reset_clears_session_and_engine_memo() {
        let mgr = manager();
        let profile = profile();
        let key = mgr.engine_key(&profile, "env-key");

        {
            let mut fields = mgr.fields.write().await;
            fields.profile = Some(profile);
            fields.api_key = Some("env-key".to_string());
            fields.generated_sql = "SELECT 1".to_string();
            fields.usable_tables = vec!["users".to_string()];
        }
        mgr.engines.write().await.insert(key, stub_engine());

        mgr.reset().await;

        let snapshot = mgr.snapshot().await;
        assert!(!snapshot.connected);
        assert!(snapshot.db_type.is_none());
        assert!(snapshot.usable_tables.is_empty());
        assert!(snapshot.generated_sql.is_empty());
        assert!(mgr.engines.read().await.is_empty());
        let err = mgr.translator().await.err().expect("session should be disconnected");
        assert_eq!(err.code(), "NOT_CONNECTED");
    }

    #[tokio::test]
    async fn test_translator_requires_connection() {
        let mgr = manager();
        let err = mgr.translator().await.err().expect("session starts disconnected");
        assert_eq!(err.code(), "NOT_CONNECTED");
    }

    #[tokio::test]
    async fn test_generated_sql_round_trip() {
        let mgr = manager();
        mgr.set_generated_sql("SELECT a\nFROM t").await;
        assert_eq!(mgr.generated_sql().await, "SELECT a\nFROM t");
    }
}
