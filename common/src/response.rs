//! API response envelope.
//!
//! Every JSON endpoint wraps its payload in [`ApiResponse`] so clients can
//! branch on `success` without inspecting status codes.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

/// Unified response wrapper.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request succeeded.
    pub success: bool,

    /// Payload, present on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    /// Error details, present on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,

    /// Response metadata.
    pub meta: ResponseMeta,
}

/// Error payload carried by failed responses.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiError {
    /// Machine-readable code (e.g. "NOT_CONNECTED").
    pub code: String,

    /// Human-readable message.
    pub message: String,
}

/// Metadata attached to every response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ResponseMeta {
    /// Request ID propagated from the request-id middleware, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,

    /// Timestamp at which the response was produced.
    pub timestamp: DateTime<Utc>,

    /// Name of the service that handled the request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
}

impl Default for ResponseMeta {
    fn default() -> Self {
        Self {
            request_id: None,
            timestamp: Utc::now(),
            service: None,
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    /// Successful response carrying `data`.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            meta: ResponseMeta::default(),
        }
    }

    /// Successful response tagged with the handling service's name.
    pub fn ok_with_service(data: T, service: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            meta: ResponseMeta {
                service: Some(service.into()),
                ..Default::default()
            },
        }
    }
}

impl ApiResponse<()> {
    /// Failed response with an error code and message.
    pub fn err(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ApiError {
                code: code.into(),
                message: message.into(),
            }),
            meta: ResponseMeta::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_sets_success() {
        let resp = ApiResponse::ok("payload");
        assert!(resp.success);
        assert_eq!(resp.data, Some("payload"));
        assert!(resp.error.is_none());
    }

    #[test]
    fn test_err_carries_code() {
        let resp = ApiResponse::err("VALIDATION_ERROR", "bad input");
        assert!(!resp.success);
        assert_eq!(resp.error.unwrap().code, "VALIDATION_ERROR");
    }
}
