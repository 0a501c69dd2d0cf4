use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::shared::types::ApiResponse;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("External service error: {0}")]
    ExternalServiceError(String),

    /// Webhook signature rejection. Carries no detail on purpose: the
    /// response body must not reveal which verification step failed.
    #[error("Invalid signature")]
    InvalidSignature,
}

impl AppError {
    /// Whether the retry policy may re-run the failed operation.
    ///
    /// Only transient upstream failures qualify. Definitive rejections
    /// (validation, auth, signatures) always fail fast.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::ExternalServiceError(_))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, errors) = match self {
            AppError::Database(ref e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error occurred".to_string(),
                    None,
                )
            }
            AppError::NotFound(ref msg) => (StatusCode::NOT_FOUND, msg.clone(), None),
            AppError::Validation(ref msg) => (
                StatusCode::BAD_REQUEST,
                msg.clone(),
                Some(vec![msg.clone()]),
            ),
            AppError::BadRequest(ref msg) => (StatusCode::BAD_REQUEST, msg.clone(), None),
            AppError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    None,
                )
            }
            AppError::Unauthorized(ref msg) => (StatusCode::UNAUTHORIZED, msg.clone(), None),
            AppError::ExternalServiceError(ref msg) => {
                tracing::error!("External service error: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    "Upstream service unavailable".to_string(),
                    None,
                )
            }
            AppError::InvalidSignature => {
                (StatusCode::BAD_REQUEST, "Invalid signature".to_string(), None)
            }
        };

        let body = Json(ApiResponse::<()>::error(Some(message), errors));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_external_service_errors_are_retryable() {
        assert!(AppError::ExternalServiceError("timeout".into()).is_retryable());

        assert!(!AppError::NotFound("x".into()).is_retryable());
        assert!(!AppError::Validation("x".into()).is_retryable());
        assert!(!AppError::BadRequest("x".into()).is_retryable());
        assert!(!AppError::Unauthorized("x".into()).is_retryable());
        assert!(!AppError::InvalidSignature.is_retryable());
        assert!(!AppError::Internal("x".into()).is_retryable());
    }

    #[test]
    fn test_signature_error_message_is_generic() {
        assert_eq!(AppError::InvalidSignature.to_string(), "Invalid signature");
    }
}
