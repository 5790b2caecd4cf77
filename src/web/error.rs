//! API error handling.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::DspaceError;

/// API error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Bad request (400).
    BadRequest,
    /// Not found (404).
    NotFound,
    /// Conflict (409).
    Conflict,
    /// Unprocessable entity (422).
    UnprocessableEntity,
    /// Internal server error (500).
    InternalError,
    /// Backend failure (502).
    BadGateway,
    /// Storage not ready (503).
    ServiceUnavailable,
}

impl ErrorCode {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::BadRequest => StatusCode::BAD_REQUEST,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::UnprocessableEntity => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::BadGateway => StatusCode::BAD_GATEWAY,
            ErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Human-readable message.
    pub message: String,
    /// Always false.
    pub success: bool,
    /// Error details.
    pub error: ErrorDetail,
}

/// Error detail.
#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    /// Error code.
    pub code: ErrorCode,
    /// Cause of the failure.
    pub message: String,
}

/// API error type.
#[derive(Debug)]
pub struct ApiError {
    code: ErrorCode,
    message: String,
    detail: String,
}

impl ApiError {
    /// Create a new API error whose detail repeats the message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            code,
            detail: message.clone(),
            message,
        }
    }

    /// Replace the detail text.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = detail.into();
        self
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadRequest, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::UnprocessableEntity, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// The error code.
    pub fn code(&self) -> ErrorCode {
        self.code
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.code.status_code();
        let body = ErrorBody {
            message: self.message,
            success: false,
            error: ErrorDetail {
                code: self.code,
                message: self.detail,
            },
        };
        (status, Json(body)).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

impl From<DspaceError> for ApiError {
    fn from(err: DspaceError) -> Self {
        let detail = err.to_string();
        let error = match &err {
            DspaceError::JobNotFound(_) => ApiError::not_found("Job not found"),
            DspaceError::RecordNotFound(_) => ApiError::not_found("Record not found"),
            DspaceError::NotInitialized(_) => ApiError::new(
                ErrorCode::ServiceUnavailable,
                "Virtual directory not initialized",
            ),
            DspaceError::InvalidPath(_) => ApiError::unprocessable("Invalid path"),
            DspaceError::Validation(_) => ApiError::unprocessable("Invalid request"),
            DspaceError::PathConflict(_) => ApiError::new(ErrorCode::Conflict, "Path already exists"),
            DspaceError::Transfer(_) | DspaceError::Backend(_) => {
                tracing::error!(error = %err, "Transfer failed");
                ApiError::new(ErrorCode::BadGateway, "Transfer failed")
            }
            _ => {
                tracing::error!(error = %err, "Internal error");
                return ApiError::internal("An internal error occurred");
            }
        };
        error.with_detail(detail)
    }
}
