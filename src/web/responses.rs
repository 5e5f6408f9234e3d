//! HTTP response types and utilities
//!
//! Management errors map to `{"error": "..."}` bodies. The Xtream endpoints
//! have fixed failure payloads that clients parse, so those are built here
//! too and never carry internal detail.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use tracing::error;

use crate::errors::AppError;

#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Json<Self> {
        Json(Self { success: true })
    }
}

/// Convert AppError to appropriate HTTP response
pub fn handle_error(error: AppError) -> Response {
    let (status, message) = match &error {
        AppError::Validation { message } => (StatusCode::BAD_REQUEST, message.clone()),
        AppError::Unauthorized { message } => (StatusCode::UNAUTHORIZED, message.clone()),
        AppError::NotFound { resource, id } => (
            StatusCode::NOT_FOUND,
            format!("{resource} with id '{id}' not found"),
        ),
        AppError::Conflict { message } => (StatusCode::CONFLICT, message.clone()),
        AppError::Repository(_) | AppError::Internal { .. } => {
            error!("Management request failed: {}", error);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            )
        }
    };

    (status, Json(ErrorResponse { error: message })).into_response()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        handle_error(self)
    }
}

/// `player_api.php` 401; `reason` is "Invalid credentials" or "Missing credentials"
pub fn player_api_unauthorized(reason: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "user_info": {
                "auth": 0,
                "status": "Active",
                "error": reason,
            }
        })),
    )
        .into_response()
}

pub fn player_api_upstream_failure() -> Response {
    (
        StatusCode::BAD_GATEWAY,
        Json(json!({
            "error": "Failed to fetch content",
            "status": "error",
        })),
    )
        .into_response()
}

pub fn xmltv_unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse {
            error: "Invalid credentials".to_string(),
        }),
    )
        .into_response()
}

pub fn xmltv_upstream_failure() -> Response {
    (
        StatusCode::BAD_GATEWAY,
        Json(ErrorResponse {
            error: "Failed to fetch XMLTV data".to_string(),
        }),
    )
        .into_response()
}
