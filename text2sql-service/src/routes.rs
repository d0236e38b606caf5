//! 路由模块

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::index))
        .route("/api/session", get(handlers::session_status))
        .route("/api/session/connect", post(handlers::connect))
        .route("/api/session/disconnect", post(handlers::disconnect))
        .route("/api/translate", post(handlers::translate))
        .route("/api/execute", post(handlers::execute))
        .route("/api/health", get(handlers::health_check))
}
