//! Error types shared across the workspace.
//!
//! Every failure surfaced to the client maps to an [`AppError`] variant with
//! a stable error code; none of them abort the process.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::response::ApiResponse;

/// Convenience alias for results carrying [`AppError`].
pub type AppResult<T> = Result<T, AppError>;

/// Application error variants.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid request parameters.
    #[error("validation error: {0}")]
    Validation(String),

    /// Driver-level failure while opening a database connection.
    #[error("database connection failed: {0}")]
    DatabaseConnection(String),

    /// Driver-level failure while executing a statement.
    #[error("database query failed: {0}")]
    DatabaseQuery(String),

    /// An operation required an active connection but the session has none.
    #[error("no active database connection")]
    NotConnected,

    /// Dialect tag outside the supported set.
    #[error("unsupported database type: {0}")]
    UnsupportedDatabaseType(String),

    /// Neither the environment nor the session supplied a Gemini API key.
    #[error("missing Gemini API key")]
    MissingApiKey,

    /// The LLM request itself failed (network, HTTP status).
    #[error("LLM request failed: {0}")]
    LlmService(String),

    /// The LLM replied with a shape the pipeline does not recognize.
    #[error("unexpected LLM response shape: {0}")]
    LlmResponse(String),
}

impl AppError {
    /// Stable machine-readable error code for clients.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::DatabaseConnection(_) => "DATABASE_CONNECTION_ERROR",
            AppError::DatabaseQuery(_) => "DATABASE_QUERY_ERROR",
            AppError::NotConnected => "NOT_CONNECTED",
            AppError::UnsupportedDatabaseType(_) => "UNSUPPORTED_DATABASE_TYPE",
            AppError::MissingApiKey => "MISSING_API_KEY",
            AppError::LlmService(_) => "LLM_SERVICE_ERROR",
            AppError::LlmResponse(_) => "LLM_RESPONSE_ERROR",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_)
            | AppError::UnsupportedDatabaseType(_)
            | AppError::MissingApiKey => StatusCode::BAD_REQUEST,
            AppError::NotConnected => StatusCode::CONFLICT,
            AppError::DatabaseQuery(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::DatabaseConnection(_)
            | AppError::LlmService(_)
            | AppError::LlmResponse(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        tracing::warn!(code = self.code(), error = %self, "request failed");
        (status, Json(ApiResponse::err(self.code(), self.to_string()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_stable() {
        assert_eq!(AppError::NotConnected.code(), "NOT_CONNECTED");
        assert_eq!(
            AppError::DatabaseConnection("refused".into()).code(),
            "DATABASE_CONNECTION_ERROR"
        );
        assert_eq!(
            AppError::LlmResponse("no candidates".into()).code(),
            "LLM_RESPONSE_ERROR"
        );
    }
}
