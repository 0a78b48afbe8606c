//! HTTP client for the record services

use axum::body::Bytes;
use axum::http::StatusCode;
use reqwest::{header::CONTENT_TYPE, Client, Method, RequestBuilder};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use crate::backend::types::{BackendDescriptor, BackendFailure, BackendReply, ProxyResult};
use crate::config::TimeoutConfig;
use crate::error::Result;

/// Issues single outbound calls and normalizes their outcome into a [`ProxyResult`]
#[derive(Debug, Clone)]
pub struct BackendClient {
    client: Client,
    request_timeout: Duration,
    health_check_timeout: Duration,
}

impl BackendClient {
    /// Create a new client from the configured timeouts
    pub fn new(timeouts: &TimeoutConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("service-gateway/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            request_timeout: Duration::from_millis(timeouts.request_ms),
            health_check_timeout: Duration::from_millis(timeouts.health_check_ms),
        })
    }

    /// Call `backend` at `path`; the query string is forwarded untouched
    pub async fn call(
        &self,
        backend: &BackendDescriptor,
        method: Method,
        path: &str,
        query: Option<&str>,
        body: Option<Bytes>,
    ) -> ProxyResult {
        let url = backend.url(path, query);
        let mut request = self
            .client
            .request(method.clone(), &url)
            .timeout(self.request_timeout);

        if let Some(body) = body.filter(|b| !b.is_empty()) {
            request = request.header(CONTENT_TYPE, "application/json").body(body);
        }

        debug!(backend = %backend.name, method = %method, url = %url, "Calling backend");
        self.execute(backend, &url, request, self.request_timeout).await
    }

    /// Shorthand for a GET without query or body
    pub async fn get(&self, backend: &BackendDescriptor, path: &str) -> ProxyResult {
        self.call(backend, Method::GET, path, None, None).await
    }

    /// Probe the backend's health endpoint with the short health-check timeout
    pub async fn probe(&self, backend: &BackendDescriptor) -> ProxyResult {
        let url = backend.url(&backend.health_check_path, None);
        let request = self.client.get(&url).timeout(self.health_check_timeout);

        debug!(backend = %backend.name, url = %url, "Probing backend health");
        self.execute(backend, &url, request, self.health_check_timeout)
            .await
    }

    async fn execute(
        &self,
        backend: &BackendDescriptor,
        url: &str,
        request: RequestBuilder,
        timeout: Duration,
    ) -> ProxyResult {
        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                let failure = transport_failure(&e, timeout);
                warn!(
                    backend = %backend.name,
                    url = %url,
                    error = %failure,
                    "Backend unreachable"
                );
                return Err(failure);
            }
        };

        let status = StatusCode::from_u16(response.status().as_u16())
            .unwrap_or(StatusCode::BAD_GATEWAY);

        let bytes = match response.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => return Err(transport_failure(&e, timeout)),
        };

        if status.is_success() {
            let body = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice::<Value>(&bytes).map_err(|e| BackendFailure::InvalidBody {
                    message: format!("Invalid JSON from {}: {}", backend.display_name, e),
                })?
            };
            debug!(backend = %backend.name, status = %status, "Backend call succeeded");
            return Ok(BackendReply { status, body });
        }

        let body = serde_json::from_slice::<Value>(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
        let failure = BackendFailure::from_status(status, body);
        warn!(
            backend = %backend.name,
            url = %url,
            status = %status,
            error = %failure,
            "Backend returned an error status"
        );
        Err(failure)
    }
}

fn transport_failure(e: &reqwest::Error, timeout: Duration) -> BackendFailure {
    let message = if e.is_timeout() {
        format!("timeout of {}ms exceeded", timeout.as_millis())
    } else {
        e.to_string()
    };
    BackendFailure::Transport { message }
}
