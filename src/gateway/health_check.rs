//! Health aggregation across the record services

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use futures::future::join_all;
use serde::{ser::SerializeMap, Serialize, Serializer};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{info, warn};

use crate::backend::{BackendClient, BackendDescriptor, BackendRegistry};
use crate::gateway::iso_timestamp;

/// Probe outcome of a single backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ServiceStatus {
    Up,
    Down,
}

/// Combined status across every backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OverallStatus {
    Healthy,
    Degraded,
}

/// Health of one backend
///
/// An UP entry carries the backend's own health payload; a DOWN entry carries
/// an `error` message.
#[derive(Debug, Clone, Serialize)]
pub struct HealthEntry {
    #[serde(skip)]
    pub service_name: String,
    pub status: ServiceStatus,
    #[serde(flatten)]
    pub detail: Map<String, Value>,
}

impl HealthEntry {
    pub fn up(service_name: impl Into<String>, payload: Value) -> Self {
        let mut detail = match payload {
            Value::Object(fields) => fields,
            _ => Map::new(),
        };
        // the gateway's verdict replaces whatever the backend reported
        detail.remove("status");
        Self {
            service_name: service_name.into(),
            status: ServiceStatus::Up,
            detail,
        }
    }

    pub fn down(service_name: impl Into<String>, error: impl Into<String>) -> Self {
        let mut detail = Map::new();
        detail.insert("error".to_string(), Value::String(error.into()));
        Self {
            service_name: service_name.into(),
            status: ServiceStatus::Down,
            detail,
        }
    }

    pub fn is_up(&self) -> bool {
        self.status == ServiceStatus::Up
    }
}

/// Entries keyed by service name, serialized in backend declaration order
#[derive(Debug, Clone, Default)]
pub struct HealthMap(Vec<HealthEntry>);

impl HealthMap {
    pub fn new(entries: Vec<HealthEntry>) -> Self {
        Self(entries)
    }

    pub fn get(&self, service_name: &str) -> Option<&HealthEntry> {
        self.0.iter().find(|e| e.service_name == service_name)
    }

    pub fn entries(&self) -> &[HealthEntry] {
        &self.0
    }

    pub fn overall_status(&self) -> OverallStatus {
        if self.0.iter().all(HealthEntry::is_up) {
            OverallStatus::Healthy
        } else {
            OverallStatus::Degraded
        }
    }
}

impl Serialize for HealthMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for entry in &self.0 {
            map.serialize_entry(&entry.service_name, entry)?;
        }
        map.end()
    }
}

/// Body of `GET /api/services/health`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub gateway: ServiceStatus,
    pub services: HealthMap,
    pub overall_status: OverallStatus,
    pub timestamp: String,
}

impl HealthReport {
    pub fn new(services: HealthMap) -> Self {
        Self {
            gateway: ServiceStatus::Up,
            overall_status: services.overall_status(),
            services,
            timestamp: iso_timestamp(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self.overall_status {
            OverallStatus::Healthy => StatusCode::OK,
            OverallStatus::Degraded => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for HealthReport {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self)).into_response()
    }
}

/// Probes every backend concurrently and folds the outcomes into a report
#[derive(Clone)]
pub struct HealthAggregator {
    client: BackendClient,
    registry: Arc<BackendRegistry>,
}

impl HealthAggregator {
    pub fn new(client: BackendClient, registry: Arc<BackendRegistry>) -> Self {
        Self { client, registry }
    }

    /// Probe all backends; a failed probe becomes a DOWN entry, never an error
    pub async fn check_all(&self) -> HealthReport {
        let entries = join_all(self.registry.all().into_iter().map(|b| self.check(b))).await;
        let report = HealthReport::new(HealthMap::new(entries));

        match report.overall_status {
            OverallStatus::Healthy => info!("All backend services healthy"),
            OverallStatus::Degraded => {
                let down: Vec<&str> = report
                    .services
                    .entries()
                    .iter()
                    .filter(|e| !e.is_up())
                    .map(|e| e.service_name.as_str())
                    .collect();
                warn!(down = ?down, "Backend services degraded");
            }
        }

        report
    }

    async fn check(&self, backend: &BackendDescriptor) -> HealthEntry {
        match self.client.probe(backend).await {
            Ok(reply) => HealthEntry::up(&backend.name, reply.body),
            Err(failure) => HealthEntry::down(&backend.name, failure.message()),
        }
    }
}
