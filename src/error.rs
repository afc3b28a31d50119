use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::models::delivery::DeliveryStatus;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid credentials")]
    InvalidCredential,

    #[error("validation failed on field: {field}")]
    Validation { field: &'static str },

    #[error("not authenticated")]
    NotAuthenticated,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("illegal transition from {from} to {attempted}")]
    InvalidTransition {
        from: DeliveryStatus,
        attempted: DeliveryStatus,
    },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::InvalidCredential | AppError::NotAuthenticated => StatusCode::UNAUTHORIZED,
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::InvalidTransition { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = match &self {
            AppError::Validation { field } => Json(json!({
                "error": self.to_string(),
                "field": field,
            })),
            AppError::InvalidTransition { from, attempted } => Json(json!({
                "error": self.to_string(),
                "from": from.to_string(),
                "attempted": attempted.to_string(),
            })),
            other => Json(json!({
                "error": other.to_string()
            })),
        };

        (status, body).into_response()
    }
}
