//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps pipeline errors to HTTP status codes and JSON error bodies.
//! Internal and upstream messages are logged, never returned to clients.

use axum::extract::multipart::MultipartError;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use notebox_core::ValidationError;
use notebox_pipeline::PipelineError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g. "NOT_FOUND", "INVALID_FORMAT").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// Upload is not an accepted PDF (422).
    #[error("invalid format: {0}")]
    InvalidFormat(String),

    /// Request field failed validation (422).
    #[error("validation error: {0}")]
    Validation(String),

    /// Missing session, or requester may not access the content (401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Unknown content (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Request conflicts with existing state (409).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Request body exceeds the configured limit (413).
    #[error("payload too large: {0}")]
    PayloadTooLarge(String),

    /// Content store or chain failed (502).
    #[error("upstream error: {0}")]
    Upstream(String),

    /// Content store did not answer in time (504).
    #[error("upstream timeout: {0}")]
    Timeout(String),

    /// Internal server error (500).
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Return the HTTP status code and machine-readable error code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::InvalidFormat(_) => (StatusCode::UNPROCESSABLE_ENTITY, "INVALID_FORMAT"),
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            Self::PayloadTooLarge(_) => (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE"),
            Self::Upstream(_) => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR"),
            Self::Timeout(_) => (StatusCode::GATEWAY_TIMEOUT, "UPSTREAM_TIMEOUT"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            Self::Upstream(_) => "An upstream service error occurred".to_string(),
            Self::Timeout(_) => "An upstream service timed out".to_string(),
            other => other.to_string(),
        };

        match &self {
            Self::Internal(_) => tracing::error!(error = %self, "internal server error"),
            Self::Upstream(_) => tracing::error!(error = %self, "upstream error"),
            Self::Timeout(_) => tracing::warn!(error = %self, "upstream timeout"),
            _ => {}
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::InvalidFormat(msg) => Self::InvalidFormat(msg),
            PipelineError::Validation(e) => Self::Validation(e.to_string()),
            PipelineError::Unauthorized => {
                Self::Unauthorized("requester may not access this content".into())
            }
            PipelineError::NotFound(id) => Self::NotFound(format!("content {id}")),
            e @ PipelineError::AlreadyOwned(_) => Self::Conflict(e.to_string()),
            e @ (PipelineError::Chain(_) | PipelineError::Storage(_)) => {
                Self::Upstream(e.to_string())
            }
            PipelineError::Timeout(msg) => Self::Timeout(msg),
            e @ (PipelineError::Decryption(_)
            | PipelineError::Metadata(_)
            | PipelineError::Internal(_)) => Self::Internal(e.to_string()),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::PayloadTooLarge(err.body_text())
        } else {
            Self::Validation(err.body_text())
        }
    }
}
