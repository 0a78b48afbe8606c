//! Single-resource proxy: one inbound request, one backend call

use axum::{
    body::Bytes,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use reqwest::Method;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use crate::backend::{BackendClient, BackendDescriptor, BackendFailure, BackendRegistry};
use crate::error::{AppError, Result};

/// Bytes escaped inside a single path segment; `/`, `\` and `%` included so an
/// id can never add segments to the backend path
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'\\')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// Record collections served by the backends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Users,
    Products,
}

impl Resource {
    pub fn collection_path(&self) -> &'static str {
        match self {
            Resource::Users => "/api/users",
            Resource::Products => "/api/products",
        }
    }

    /// Path of one record; the id is escaped as exactly one segment
    ///
    /// Dot segments are refused since URL normalization would resolve them
    /// even when escaped.
    pub fn item_path(&self, id: &str) -> Result<String> {
        if matches!(id, "" | "." | "..") {
            return Err(AppError::InvalidId(id.to_string()));
        }
        Ok(format!(
            "{}/{}",
            self.collection_path(),
            utf8_percent_encode(id, SEGMENT)
        ))
    }

    pub fn backend<'a>(&self, registry: &'a BackendRegistry) -> &'a BackendDescriptor {
        match self {
            Resource::Users => registry.users(),
            Resource::Products => registry.products(),
        }
    }
}

/// Backend status and body, relayed as-is
#[derive(Debug, Clone, PartialEq)]
pub struct ProxyReply {
    pub status: StatusCode,
    pub body: Value,
}

impl IntoResponse for ProxyReply {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Forwards list/get/create/update/delete calls to the owning backend
#[derive(Clone)]
pub struct ResourceProxy {
    client: BackendClient,
    registry: Arc<BackendRegistry>,
}

impl ResourceProxy {
    pub fn new(client: BackendClient, registry: Arc<BackendRegistry>) -> Self {
        Self { client, registry }
    }

    pub async fn list(&self, resource: Resource, query: Option<&str>) -> Result<ProxyReply> {
        self.forward(resource, Method::GET, resource.collection_path(), query, None)
            .await
    }

    pub async fn get(&self, resource: Resource, id: &str) -> Result<ProxyReply> {
        let path = resource.item_path(id)?;
        self.forward(resource, Method::GET, &path, None, None).await
    }

    pub async fn create(&self, resource: Resource, body: Bytes) -> Result<ProxyReply> {
        self.forward(
            resource,
            Method::POST,
            resource.collection_path(),
            None,
            Some(body),
        )
        .await
    }

    pub async fn update(&self, resource: Resource, id: &str, body: Bytes) -> Result<ProxyReply> {
        let path = resource.item_path(id)?;
        self.forward(resource, Method::PUT, &path, None, Some(body))
            .await
    }

    pub async fn delete(&self, resource: Resource, id: &str) -> Result<ProxyReply> {
        let path = resource.item_path(id)?;
        self.forward(resource, Method::DELETE, &path, None, None)
            .await
    }

    async fn forward(
        &self,
        resource: Resource,
        method: Method,
        path: &str,
        query: Option<&str>,
        body: Option<Bytes>,
    ) -> Result<ProxyReply> {
        let backend = resource.backend(&self.registry);

        match self.client.call(backend, method, path, query, body).await {
            Ok(reply) => Ok(ProxyReply {
                status: reply.status,
                body: reply.body,
            }),
            Err(BackendFailure::Status { status, body, .. }) => {
                debug!(backend = %backend.name, status = %status, "Relaying backend error");
                Ok(ProxyReply { status, body })
            }
            Err(failure) => Err(AppError::Upstream {
                status: failure.status_or_default(),
                message: format!("Error communicating with {}", backend.display_name),
                error: failure.message().to_string(),
            }),
        }
    }
}
