//! HTTP error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

/// Error returned by API handlers, rendered as `{"error": message}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    BadGateway(String),
    #[error("{0}")]
    Internal(String),
}

impl From<notekeep_core::Error> for ApiError {
    fn from(err: notekeep_core::Error) -> Self {
        use notekeep_core::Error;

        match err {
            Error::Unauthenticated => ApiError::Unauthorized(err.to_string()),
            Error::NotFoundOrForbidden(_) => ApiError::NotFound(err.to_string()),
            Error::Validation(msg) => ApiError::BadRequest(msg),
            Error::Identity(_) | Error::Request(_) => ApiError::BadGateway(err.to_string()),
            Error::Database(_)
            | Error::Serialization(_)
            | Error::Config(_)
            | Error::Internal(_) => {
                tracing::error!(
                    subsystem = "api",
                    error = %err,
                    "Request failed with internal error"
                );
                ApiError::Internal(err.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(serde_json::json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}
