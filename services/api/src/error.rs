//! services/api/src/error.rs
//!
//! Defines the primary error type for the entire API service, plus the
//! mapping from core session errors to HTTP status codes.

use crate::config::ConfigError;
use axum::http::StatusCode;
use socratic_core::ports::SessionError;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from the session core.
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

/// Maps a core session error to the HTTP response the handlers return.
///
/// Gateway timeouts and remote failures get distinct 5xx codes so the
/// client can render different messaging for "slow" vs. "broken".
pub fn session_error_response(err: SessionError) -> (StatusCode, String) {
    let status = match &err {
        SessionError::NotFound => StatusCode::NOT_FOUND,
        SessionError::Validation(_) => StatusCode::BAD_REQUEST,
        SessionError::GatewayTimeout => StatusCode::GATEWAY_TIMEOUT,
        SessionError::GatewayError(_) | SessionError::GatewayMalformed(_) => {
            StatusCode::BAD_GATEWAY
        }
        SessionError::Persistence(_) | SessionError::WriteConflict => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, err.to_string())
}
