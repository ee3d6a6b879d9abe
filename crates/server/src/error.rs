//! Mapping of service errors to HTTP responses.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use notes_core::AppError;
use serde::Serialize;

/// Error returned by handlers.
///
/// Client mistakes are echoed back; upstream and internal failures are
/// logged in full and reported with a generic message.
#[derive(Debug)]
pub struct ApiError(pub AppError);

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match &self.0 {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::EmbeddingFailed(_) | AppError::GenerationUnavailable(_) => {
                StatusCode::BAD_GATEWAY
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn public_message(&self) -> String {
        match &self.0 {
            AppError::InvalidInput(msg) => msg.clone(),
            AppError::EmbeddingFailed(_) => "The embedding service is unavailable".to_string(),
            AppError::GenerationUnavailable(_) => {
                "The language model is unavailable".to_string()
            }
            _ => "Internal server error".to_string(),
        }
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError(AppError::InvalidInput(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.0.code(), "Request failed: {}", self.0);
        } else {
            tracing::debug!(code = self.0.code(), "Rejected request: {}", self.0);
        }

        let body = ErrorBody {
            error: self.0.code(),
            message: self.public_message(),
        };
        (status, Json(body)).into_response()
    }
}
