//! Common types shared by the backend client and the gateway handlers

use axum::http::StatusCode;
use serde_json::Value;
use thiserror::Error;

use crate::config::BackendConfig;

/// Immutable description of one downstream record service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendDescriptor {
    /// Key used in the services health map (e.g. `userService`)
    pub name: String,
    /// Name used in error messages (e.g. `User Service`)
    pub display_name: String,
    pub base_url: String,
    pub health_check_path: String,
}

impl BackendDescriptor {
    pub fn new(name: impl Into<String>, base_url: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            display_name: name.clone(),
            name,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            health_check_path: "/health".to_string(),
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    /// Full URL for `path`, with the raw query string appended verbatim
    pub fn url(&self, path: &str, query: Option<&str>) -> String {
        match query {
            Some(q) if !q.is_empty() => format!("{}{}?{}", self.base_url, path, q),
            _ => format!("{}{}", self.base_url, path),
        }
    }
}

impl From<&BackendConfig> for BackendDescriptor {
    fn from(config: &BackendConfig) -> Self {
        let mut descriptor = BackendDescriptor::new(&config.name, &config.base_url)
            .with_display_name(&config.display_name);
        descriptor.health_check_path = config.health_check_path.clone();
        descriptor
    }
}

/// Successful (2xx) backend reply
#[derive(Debug, Clone, PartialEq)]
pub struct BackendReply {
    pub status: StatusCode,
    pub body: Value,
}

impl BackendReply {
    /// The `data` field of the standard `{success, data}` envelope
    pub fn data(&self) -> Option<&Value> {
        self.body.get("data")
    }

    /// The `count` field of the list envelope
    pub fn count(&self) -> Option<&Value> {
        self.body.get("count")
    }
}

/// Why a backend call did not produce a successful reply
#[derive(Debug, Clone, Error, PartialEq)]
pub enum BackendFailure {
    /// The backend could not be reached (refused, DNS, timeout)
    #[error("{message}")]
    Transport { message: String },

    /// The backend answered with a non-2xx status
    #[error("{message}")]
    Status {
        status: StatusCode,
        message: String,
        body: Value,
    },

    /// The backend answered 2xx but the body was not JSON
    #[error("{message}")]
    InvalidBody { message: String },
}

impl BackendFailure {
    /// Backend status code, if the backend answered at all
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            BackendFailure::Status { status, .. } => Some(*status),
            BackendFailure::Transport { .. } | BackendFailure::InvalidBody { .. } => None,
        }
    }

    /// Status to report outward; 500 when the backend gave none
    pub fn status_or_default(&self) -> StatusCode {
        self.status().unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn message(&self) -> &str {
        match self {
            BackendFailure::Transport { message }
            | BackendFailure::Status { message, .. }
            | BackendFailure::InvalidBody { message } => message,
        }
    }

    /// Build a status failure, preferring the backend's own `message` field
    pub fn from_status(status: StatusCode, body: Value) -> Self {
        let message = body
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| {
                format!("Request failed with status code {}", status.as_u16())
            });
        BackendFailure::Status {
            status,
            message,
            body,
        }
    }
}

/// Outcome of a single backend call
pub type ProxyResult = std::result::Result<BackendReply, BackendFailure>;
