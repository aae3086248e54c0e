//! Unified error handling for the server.

use crate::directory::DirectoryError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rolodex_engine::Error as EngineError;
use serde::Serialize;

/// Application error type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Directory error: {0}")]
    Directory(#[from] DirectoryError),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// The engine error carried by this error, if any.
    pub fn engine(&self) -> Option<&EngineError> {
        match self {
            AppError::Engine(e) => Some(e),
            _ => None,
        }
    }
}

/// Error response body.
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

fn engine_status(error: &EngineError) -> StatusCode {
    match error {
        EngineError::SyncInProgress
        | EngineError::Cancelled
        | EngineError::DuplicatePhone(_)
        | EngineError::ContactAlreadyExists(_) => StatusCode::CONFLICT,
        EngineError::IncompleteResolution { .. } | EngineError::UnmatchedRecord(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        EngineError::RemoteUnavailable(_) | EngineError::ExportFailed { .. } => {
            StatusCode::BAD_GATEWAY
        }
        EngineError::ContactNotFound(_) => StatusCode::NOT_FOUND,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message, details) = match &self {
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error".to_string(),
                    None,
                )
            }
            AppError::Engine(e) => {
                tracing::warn!("Engine error: {:?}", e);
                let details = match e {
                    EngineError::IncompleteResolution { missing } => Some(missing.join(",")),
                    _ => None,
                };
                (engine_status(e), e.to_string(), details)
            }
            AppError::Directory(e) => {
                tracing::warn!("Directory error: {}", e);
                (
                    StatusCode::BAD_GATEWAY,
                    "Remote directory error".to_string(),
                    Some(e.to_string()),
                )
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone(), None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone(), None),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    Some(msg.clone()),
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_message,
            details,
        });

        (status, body).into_response()
    }
}

/// Result type alias for handlers.
pub type Result<T> = std::result::Result<T, AppError>;
