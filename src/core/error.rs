//! Error type system for authgate
//!
//! This module provides the crate-wide error type with:
//! - A closed classification of client and server failures
//! - HTTP status code mapping
//! - Stable, machine-readable reason strings for API responses
//!
//! Library errors (rusqlite, r2d2, bcrypt, jsonwebtoken) are converted into
//! one of these variants at the component boundary. Their text is logged but
//! never returned to the caller.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Main error type for the authentication service
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    // System-level errors
    #[error("System initialization failed: {0}")]
    InitializationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Internal error: {0}")]
    Internal(String),

    // Storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Storage operation timed out after {0:?}")]
    StorageTimeout(std::time::Duration),

    // Client errors
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Username already exists")]
    DuplicateUsername,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid token")]
    InvalidToken,
}

impl From<rusqlite::Error> for GateError {
    fn from(err: rusqlite::Error) -> Self {
        GateError::Storage(err.to_string())
    }
}

impl From<r2d2::Error> for GateError {
    fn from(err: r2d2::Error) -> Self {
        GateError::Storage(format!("connection pool: {}", err))
    }
}

// Request bodies that fail to parse get one stable reason; serde's text stays in the logs
impl From<JsonRejection> for GateError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(reason = %rejection.body_text(), "Malformed request body");
        GateError::ValidationError("invalid request body".to_string())
    }
}

impl GateError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            GateError::ValidationError(_) | GateError::DuplicateUsername => StatusCode::BAD_REQUEST,

            // 401 Unauthorized
            GateError::InvalidCredentials | GateError::InvalidToken => StatusCode::UNAUTHORIZED,

            // 503 Service Unavailable
            GateError::Storage(_) | GateError::StorageTimeout(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }

            // 500 Internal Server Error
            GateError::InitializationError(_)
            | GateError::ConfigError(_)
            | GateError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error type name used in logs
    pub fn error_type(&self) -> &'static str {
        match self {
            GateError::InitializationError(_) => "InitializationError",
            GateError::ConfigError(_) => "ConfigError",
            GateError::Internal(_) => "Internal",
            GateError::Storage(_) => "Storage",
            GateError::StorageTimeout(_) => "StorageTimeout",
            GateError::ValidationError(_) => "ValidationError",
            GateError::DuplicateUsername => "DuplicateUsername",
            GateError::InvalidCredentials => "InvalidCredentials",
            GateError::InvalidToken => "InvalidToken",
        }
    }

    /// Short reason string returned to the client.
    ///
    /// Server-side variants all collapse to a fixed string so that internal
    /// detail never leaks into a response body.
    pub fn detail(&self) -> String {
        match self {
            GateError::ValidationError(msg) => msg.clone(),
            GateError::DuplicateUsername => "username already exists".to_string(),
            GateError::InvalidCredentials => "invalid credentials".to_string(),
            GateError::InvalidToken => "invalid token".to_string(),
            GateError::Storage(_) | GateError::StorageTimeout(_) => {
                "storage unavailable".to_string()
            }
            GateError::InitializationError(_)
            | GateError::ConfigError(_)
            | GateError::Internal(_) => "internal error".to_string(),
        }
    }

    /// Check if this error is retryable by the caller
    pub fn is_retryable(&self) -> bool {
        matches!(self, GateError::Storage(_) | GateError::StorageTimeout(_))
    }
}

/// Error response body for API endpoints
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}

impl ErrorResponse {
    /// Create an error response from a GateError
    pub fn from_error(error: &GateError) -> Self {
        Self {
            detail: error.detail(),
        }
    }
}

/// Implement IntoResponse for GateError to enable automatic error handling in Axum
impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();

        if status_code.is_server_error() {
            tracing::error!(
                error_type = self.error_type(),
                status_code = %status_code,
                retryable = self.is_retryable(),
                "Request failed: {}",
                self
            );
        } else {
            tracing::debug!(
                error_type = self.error_type(),
                status_code = %status_code,
                "Request rejected"
            );
        }

        (status_code, Json(ErrorResponse::from_error(&self))).into_response()
    }
}

/// Result type alias for operations that can fail with GateError
pub type Result<T> = std::result::Result<T, GateError>;
