use axum::{http::StatusCode, response::IntoResponse};
use serde_json::json;
use thiserror::Error;

use crate::media::MediaError;
use crate::pipeline::PipelineError;

pub type AppResult<T> = Result<T, AppError>;

/// HTTP boundary error
///
/// Every handler error ends up here and is rendered as
/// `{"error": ..., "error_code": ..., "status": ...}`.
#[derive(Error, Debug)]
pub enum AppError {
    // ===== Request Errors =====
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Attachment error: {0}")]
    Attachment(String),

    // ===== Storage Errors =====
    /// Message store failure on a request path
    #[error("Persistence error: {0}")]
    Persistence(#[source] anyhow::Error),

    // ===== Media Errors =====
    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    // ===== Internal Server Errors =====
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // Store failures are reported as 400 on the message routes
            AppError::Validation(_) | AppError::Attachment(_) | AppError::Persistence(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get a user-friendly error message (without sensitive details)
    pub fn user_message(&self) -> String {
        match self {
            AppError::Validation(msg) => format!("Validation error: {}", msg),
            AppError::Attachment(msg) => format!("Attachment upload failed: {}", msg),
            AppError::Persistence(_) => "Failed to store message".to_string(),
            AppError::Forbidden(msg) => format!("Forbidden: {}", msg),
            AppError::NotFound(msg) => format!("Not found: {}", msg),
            _ => "Internal server error".to_string(),
        }
    }

    /// Get error code for programmatic error handling
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Attachment(_) => "ATTACHMENT_ERROR",
            AppError::Persistence(_) => "PERSISTENCE_ERROR",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Unavailable(_) => "SERVICE_UNAVAILABLE",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Log this error with appropriate level and context
    pub fn log(&self) {
        let status = self.status_code();
        let code = self.error_code();

        match self {
            AppError::Persistence(source) => tracing::error!(
                error = ?source,
                error_code = %code,
                status = %status.as_u16(),
                "Message store error"
            ),
            _ if status.is_server_error() => tracing::error!(
                error = %self,
                error_code = %code,
                status = %status.as_u16(),
                "Server error occurred"
            ),
            _ => tracing::debug!(
                error = %self,
                error_code = %code,
                "Client error occurred"
            ),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        self.log();

        let status = self.status_code();
        let error_code = self.error_code();

        // For server errors, don't expose internal details to client
        let message = if status.is_server_error() {
            "Internal server error".to_string()
        } else {
            self.user_message()
        };

        let body = json!({
            "error": message,
            "error_code": error_code,
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}

// ============================================================================
// Conversion from library errors
// ============================================================================

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Validation(msg) => AppError::Validation(msg),
            PipelineError::AttachmentUpload { filename, .. } if filename.is_empty() => {
                AppError::Attachment("no attachment could be stored".to_string())
            }
            PipelineError::AttachmentUpload { filename, .. } => {
                AppError::Attachment(format!("'{}' could not be stored", filename))
            }
            PipelineError::Persistence(source) => AppError::Persistence(source),
        }
    }
}

impl From<MediaError> for AppError {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::InvalidObjectName => AppError::Validation(err.to_string()),
            MediaError::Expired | MediaError::InvalidSignature => {
                AppError::Forbidden(err.to_string())
            }
            MediaError::NotFound => AppError::NotFound(err.to_string()),
        }
    }
}
