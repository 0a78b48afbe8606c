//! Common error types for the gateway

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// A single backend call failed and its outcome is relayed to the caller.
    #[error("{message}")]
    Upstream {
        status: StatusCode,
        message: String,
        error: String,
    },

    /// A path id that cannot be forwarded as a single path segment.
    #[error("Invalid record id '{0}'")]
    InvalidId(String),

    /// The request body could not be read or decoded.
    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    /// A join could not be composed from its sub-calls.
    #[error("{message}")]
    Aggregation {
        status: StatusCode,
        message: String,
        error: String,
    },
}

/// Error envelope returned by every gateway endpoint
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
    pub error: String,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Upstream { status, .. } | AppError::Aggregation { status, .. } => *status,
            AppError::InvalidId(_) | AppError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            AppError::HttpClient(_) => StatusCode::BAD_GATEWAY,
            AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            AppError::Upstream { message, error, .. }
            | AppError::Aggregation { message, error, .. } => ErrorResponse {
                success: false,
                message,
                error,
            },
            AppError::InvalidId(id) => ErrorResponse {
                success: false,
                message: "Invalid record id".to_string(),
                error: format!("'{}' cannot be used as a record id", id),
            },
            AppError::InvalidBody(detail) => ErrorResponse {
                success: false,
                message: "Invalid request body".to_string(),
                error: detail,
            },
            other => ErrorResponse {
                success: false,
                message: "Internal server error".to_string(),
                error: other.to_string(),
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;
