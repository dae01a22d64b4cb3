use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::jobseekers::validation::ValidationErrors;
use crate::resumes::ResumeError;
use crate::storage::StorageError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(ValidationErrors),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unsupported file: {0}")]
    UnsupportedFile(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        AppError::Validation(errors)
    }
}

impl From<ResumeError> for AppError {
    fn from(e: ResumeError) -> Self {
        match e {
            ResumeError::NotPdf | ResumeError::TooLarge { .. } => {
                AppError::UnsupportedFile(e.to_string())
            }
            ResumeError::Missing => AppError::NotFound(e.to_string()),
            ResumeError::Io(io) => AppError::Io(io),
        }
    }
}

impl From<MultipartError> for AppError {
    fn from(e: MultipartError) -> Self {
        AppError::BadRequest(format!("Malformed multipart body: {}", e.body_text()))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(_) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                "Validation failed".to_string(),
            ),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::UnsupportedFile(msg) => {
                (StatusCode::BAD_REQUEST, "UNSUPPORTED_FILE", msg.clone())
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            AppError::Storage(e) => {
                tracing::error!("Storage error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORAGE_ERROR",
                    "A storage error occurred".to_string(),
                )
            }
            AppError::Io(e) => {
                tracing::error!("I/O error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "IO_ERROR",
                    "A file storage error occurred".to_string(),
                )
            }
        };

        let mut error = json!({
            "code": code,
            "message": message
        });
        if let AppError::Validation(errors) = &self {
            error["fields"] = json!(errors);
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}
