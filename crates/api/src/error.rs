//! API error types

use axum::{
    extract::multipart::{MultipartError, MultipartRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use inference_engine::InferenceError;
use serde::Serialize;
use thiserror::Error;

/// Per-request failures, each mapped to one status code and a JSON
/// `{"detail": ...}` body
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("File must be an image")]
    NotAnImage,

    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Prediction error: {0}")]
    Internal(String),

    #[error("Missing file field 'file'")]
    MissingFile,

    #[error("Invalid multipart body: {0}")]
    Multipart(String),

    #[error("Upload too large: {0}")]
    TooLarge(String),

    #[error("Metrics not enabled")]
    MetricsDisabled,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotAnImage | ApiError::InvalidImage(_) | ApiError::Multipart(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::MissingFile => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::TooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::MetricsDisabled => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Label used for the error counter
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Internal(_) => "internal",
            ApiError::MetricsDisabled => "not_found",
            _ => "invalid_input",
        }
    }
}

/// JSON error body
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            detail: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

impl From<InferenceError> for ApiError {
    fn from(err: InferenceError) -> Self {
        match err {
            InferenceError::InvalidImage(reason) => ApiError::InvalidImage(reason),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(err: MultipartRejection) -> Self {
        ApiError::Multipart(err.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::TooLarge(err.body_text())
        } else {
            ApiError::Multipart(err.body_text())
        }
    }
}

/// Errors that stop the server from starting or keep running
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),

    #[error("Failed to load model: {0}")]
    Model(#[from] InferenceError),

    #[error("Metrics setup failed: {0}")]
    Metrics(String),

    #[error("Logging setup failed: {0}")]
    Logging(String),

    #[error("Server I/O error: {0}")]
    Io(#[from] std::io::Error),
}
