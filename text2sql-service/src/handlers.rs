//! Handler模块

use axum::{extract::State, response::Html, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use validator::Validate;

use common::errors::AppError;
use common::models::connection::{ConnectRequest, ConnectionProfile};
use common::models::query::{ExecuteRequest, QueryResult};
use common::models::translation::{GeneratedSql, TranslateRequest};
use common::response::ApiResponse;

use crate::executor;
use crate::state::AppState;

const SERVICE_NAME: &str = "text2sql-service";

/// 内嵌的单页 UI
pub async fn index() -> Html<&'static str> {
    Html(include_str!("../static/index.html"))
}

/// 连接数据库并初始化翻译引擎
#[utoipa::path(
    post,
    path = "/api/session/connect",
    tag = "session",
    request_body = ConnectRequest,
    responses(
        (status = 200, description = "连接成功", body = ApiResponse<ConnectResponse>),
        (status = 400, description = "参数无效或缺少 API Key"),
        (status = 502, description = "数据库连接失败")
    )
)]
pub async fn connect(
    State(state): State<AppState>,
    Json(req): Json<ConnectRequest>,
) -> Result<Json<ApiResponse<ConnectResponse>>, AppError> {
    req.validate()?;

    let profile = ConnectionProfile::from_request(&req);
    let db_type = profile.db_type;
    let database = profile.database.clone();
    let usable_tables = state
        .session
        .connect(profile, req.api_key.as_deref())
        .await?;

    Ok(Json(ApiResponse::ok_with_service(
        ConnectResponse {
            db_type: db_type.to_string(),
            database,
            usable_tables,
        },
        SERVICE_NAME,
    )))
}

/// 断开连接并重置会话
#[utoipa::path(
    post,
    path = "/api/session/disconnect",
    tag = "session",
    responses(
        (status = 200, description = "会话已重置", body = ApiResponse<bool>)
    )
)]
pub async fn disconnect(State(state): State<AppState>) -> Json<ApiResponse<bool>> {
    state.session.reset().await;
    Json(ApiResponse::ok_with_service(true, SERVICE_NAME))
}

/// 查询会话状态
#[utoipa::path(
    get,
    path = "/api/session",
    tag = "session",
    responses(
        (status = 200, description = "会话状态", body = ApiResponse<SessionStatus>)
    )
)]
pub async fn session_status(State(state): State<AppState>) -> Json<ApiResponse<SessionStatus>> {
    let snapshot = state.session.snapshot().await;
    Json(ApiResponse::ok_with_service(
        SessionStatus {
            connected: snapshot.connected,
            db_type: snapshot.db_type,
            database: snapshot.database,
            usable_tables: snapshot.usable_tables,
            generated_sql: snapshot.generated_sql,
        },
        SERVICE_NAME,
    ))
}

/// 将自然语言问题翻译为 SQL
#[utoipa::path(
    post,
    path = "/api/translate",
    tag = "translate",
    request_body = TranslateRequest,
    responses(
        (status = 200, description = "SQL 生成成功", body = ApiResponse<GeneratedSql>),
        (status = 409, description = "未连接数据库"),
        (status = 502, description = "LLM 调用失败或响应异常")
    )
)]
pub async fn translate(
    State(state): State<AppState>,
    Json(req): Json<TranslateRequest>,
) -> Result<Json<ApiResponse<GeneratedSql>>, AppError> {
    req.validate()?;

    let translator = state.session.translator().await?;
    match translator.translate(&req.question).await {
        Ok(generated) => {
            state.session.set_generated_sql(&generated.sql).await;
            Ok(Json(ApiResponse::ok_with_service(generated, SERVICE_NAME)))
        }
        Err(e) => {
            // 生成失败时清空已生成的 SQL
            state.session.set_generated_sql("").await;
            Err(e)
        }
    }
}

/// 执行 SQL 查询
#[utoipa::path(
    post,
    path = "/api/execute",
    tag = "query",
    request_body = ExecuteRequest,
    responses(
        (status = 200, description = "执行成功", body = ApiResponse<QueryResult>),
        (status = 400, description = "没有可执行的 SQL"),
        (status = 409, description = "未连接数据库"),
        (status = 422, description = "SQL 执行失败")
    )
)]
pub async fn execute(
    State(state): State<AppState>,
    Json(req): Json<ExecuteRequest>,
) -> Result<Json<ApiResponse<QueryResult>>, AppError> {
    let sql = match req.sql {
        Some(sql) => sql,
        None => state.session.generated_sql().await,
    };

    let pool = state.session.pool().await?;
    let result = executor::execute(&pool, &sql).await?;
    Ok(Json(ApiResponse::ok_with_service(result, SERVICE_NAME)))
}

/// 健康检查端点
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "health",
    responses(
        (status = 200, description = "服务运行正常", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let snapshot = state.session.snapshot().await;
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: SERVICE_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
        connected: snapshot.connected,
    })
}

/// 连接结果
#[derive(Serialize, ToSchema)]
pub struct ConnectResponse {
    /// 数据库类型
    pub db_type: String,
    /// 数据库名称
    pub database: String,
    /// 检测到的表
    pub usable_tables: Vec<String>,
}

/// 会话状态
#[derive(Serialize, ToSchema)]
pub struct SessionStatus {
    /// 是否已连接
    pub connected: bool,
    /// 数据库类型
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db_type: Option<String>,
    /// 数据库名称
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    /// 检测到的表
    pub usable_tables: Vec<String>,
    /// 当前已生成的 SQL
    pub generated_sql: String,
}

/// 健康检查响应
#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    /// 服务状态
    pub status: String,
    /// 服务名称
    pub service: String,
    /// 服务版本
    pub version: String,
    /// 当前时间戳
    pub timestamp: DateTime<Utc>,
    /// 是否存在活跃连接
    pub connected: bool,
}
