//! 自然语言转 SQL 查询服务
//!
//! 提供 Text-to-SQL 功能，包括：
//! - MySQL / PostgreSQL 连接管理
//! - 基于 Gemini 的 SQL 生成（零温度采样）
//! - 查询执行与结果展示
//! - 内嵌单页 UI

mod connection;
mod executor;
mod handlers;
mod routes;
mod schema;
mod session;
mod state;
mod translator;

use anyhow::Context;
use axum::{middleware, routing::get, Json, Router};
use common::config::AppConfig;
use common::middleware::request_id::request_id_middleware;
use state::AppState;
use tokio::net::TcpListener;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;

const SERVICE_NAME: &str = "text2sql-service";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Text-to-SQL 服务 API",
        version = "0.1.0",
        description = "自然语言转 SQL 查询服务"
    ),
    paths(
        handlers::connect,
        handlers::disconnect,
        handlers::session_status,
        handlers::translate,
        handlers::execute,
        handlers::health_check,
    ),
    components(schemas(
        common::models::ConnectRequest,
        common::models::DbType,
        common::models::TranslateRequest,
        common::models::GeneratedSql,
        common::models::ExecuteRequest,
        common::models::QueryResult,
        handlers::ConnectResponse,
        handlers::SessionStatus,
        handlers::HealthResponse,
    )),
    tags(
        (name = "session", description = "会话与连接管理端点"),
        (name = "translate", description = "SQL 生成端点"),
        (name = "query", description = "查询执行端点"),
        (name = "health", description = "健康检查端点")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file (if present) before anything else
    load_dotenv();

    // 初始化日志追踪
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // 加载配置
    let config = AppConfig::load_with_service(SERVICE_NAME);

    // 创建应用状态
    let state = AppState::new(config.clone());

    // 创建路由
    let app = create_router(state);

    // 启动服务
    let addr = format!("{}:{}", config.host, config.port);
    info!(service = SERVICE_NAME, address = %addr, "启动服务");

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("server exited")?;
    Ok(())
}

fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(routes::router())
        .route("/api-docs/openapi.json", get(openapi_json))
        .layer(CompressionLayer::new())
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Load .env file from the working directory (best-effort, no error if missing).
fn load_dotenv() {
    let env_path = std::path::Path::new(".env");
    if env_path.exists() {
        if let Ok(content) = std::fs::read_to_string(env_path) {
            for line in content.lines() {
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }
                if let Some((key, value)) = line.split_once('=') {
                    let key = key.trim();
                    let value = value.trim();
                    // Only set if not already set by the environment
                    if std::env::var(key).is_err() {
                        std::env::set_var(key, value);
                    }
                }
            }
        }
    }
}
