use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use scriptgate_core::error::CoreError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Covers rejections that happen before a request reaches the gateway.
/// Gateway outcomes are classified results, not errors, and are rendered by
/// the invocation handler itself.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `scriptgate_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::Authorization(msg) => {
                    (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone())
                }
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::NotFound { .. } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    "Script not found".to_string(),
                ),
                CoreError::Timeout { .. } => (
                    StatusCode::GATEWAY_TIMEOUT,
                    "TIMEOUT",
                    core.to_string(),
                ),
                CoreError::Execution { .. } => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "SCRIPT_ERROR",
                    core.to_string(),
                ),
                CoreError::Infrastructure(msg) => {
                    tracing::error!(error = %msg, "Infrastructure error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        "An internal error occurred".to_string(),
                    )
                }
            },

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}
