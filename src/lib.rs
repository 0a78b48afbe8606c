//! Service Gateway
//!
//! A unified HTTP surface in front of the user and product record services:
//! single-resource proxying, cross-service joins and aggregated health.

pub mod api;
pub mod backend;
pub mod config;
pub mod error;
pub mod gateway;

pub use error::{AppError, Result};

use std::sync::Arc;

use backend::{BackendClient, BackendRegistry};
use gateway::{aggregator::Aggregator, health_check::HealthAggregator, proxy::ResourceProxy};

/// Application state shared across all handlers
pub struct AppState {
    pub settings: Arc<config::Settings>,
    pub registry: Arc<BackendRegistry>,
    pub proxy: ResourceProxy,
    pub aggregator: Aggregator,
    pub health: HealthAggregator,
}

impl AppState {
    /// Wire the gateway components from validated settings
    pub fn new(settings: config::Settings) -> Result<Self> {
        let client = BackendClient::new(&settings.timeouts)?;
        let registry = Arc::new(BackendRegistry::from_config(&settings.services));

        Ok(Self {
            proxy: ResourceProxy::new(client.clone(), registry.clone()),
            aggregator: Aggregator::new(client.clone(), registry.clone()),
            health: HealthAggregator::new(client, registry.clone()),
            registry,
            settings: Arc::new(settings),
        })
    }
}
