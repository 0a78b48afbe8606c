//! Request handlers for the gateway surface

use axum::{
    extract::{Path, RawQuery, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::{json, Map, Value};
use std::sync::Arc;

use crate::api::payload::ForwardBody;
use crate::error::Result;
use crate::gateway::{
    aggregator::{Aggregate, Dashboard, UserProducts},
    health_check::HealthReport,
    iso_timestamp,
    proxy::{ProxyReply, Resource},
};
use crate::AppState;

/// Routes advertised by the 404 handler
pub const AVAILABLE_ENDPOINTS: &[&str] = &[
    "GET /",
    "GET /health",
    "GET /api/services/health",
    "GET /api/dashboard",
    "GET /api/users",
    "GET /api/users/:id",
    "GET /api/users/:id/products",
    "POST /api/users",
    "PUT /api/users/:id",
    "DELETE /api/users/:id",
    "GET /api/products",
    "GET /api/products/:id",
    "GET /api/products/:id/with-owner",
    "POST /api/products",
    "PUT /api/products/:id",
    "DELETE /api/products/:id",
];

pub async fn root() -> Json<Value> {
    Json(json!({
        "message": "Welcome to Microservice API Gateway",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "users": "/api/users",
            "products": "/api/products",
            "dashboard": "/api/dashboard",
        },
        "documentation": "See README.md for API documentation",
    }))
}

/// Gateway liveness; does not touch the backends
pub async fn gateway_health(State(state): State<Arc<AppState>>) -> Json<Value> {
    let services: Map<String, Value> = state
        .registry
        .all()
        .into_iter()
        .map(|b| (b.name.clone(), Value::String(b.base_url.clone())))
        .collect();

    Json(json!({
        "status": "UP",
        "service": "API Gateway",
        "timestamp": iso_timestamp(),
        "services": services,
    }))
}

pub async fn services_health(State(state): State<Arc<AppState>>) -> HealthReport {
    state.health.check_all().await
}

pub async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "success": false,
            "message": "Endpoint not found",
            "availableEndpoints": AVAILABLE_ENDPOINTS,
        })),
    )
}

// Users

pub async fn list_users(
    State(state): State<Arc<AppState>>,
    RawQuery(query): RawQuery,
) -> Result<ProxyReply> {
    state.proxy.list(Resource::Users, query.as_deref()).await
}

pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<ProxyReply> {
    state.proxy.get(Resource::Users, &id).await
}

pub async fn create_user(
    State(state): State<Arc<AppState>>,
    ForwardBody(body): ForwardBody,
) -> Result<ProxyReply> {
    state.proxy.create(Resource::Users, body).await
}

pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ForwardBody(body): ForwardBody,
) -> Result<ProxyReply> {
    state.proxy.update(Resource::Users, &id, body).await
}

pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<ProxyReply> {
    state.proxy.delete(Resource::Users, &id).await
}

// Products

pub async fn list_products(
    State(state): State<Arc<AppState>>,
    RawQuery(query): RawQuery,
) -> Result<ProxyReply> {
    state.proxy.list(Resource::Products, query.as_deref()).await
}

pub async fn get_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<ProxyReply> {
    state.proxy.get(Resource::Products, &id).await
}

pub async fn create_product(
    State(state): State<Arc<AppState>>,
    ForwardBody(body): ForwardBody,
) -> Result<ProxyReply> {
    state.proxy.create(Resource::Products, body).await
}

pub async fn update_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ForwardBody(body): ForwardBody,
) -> Result<ProxyReply> {
    state.proxy.update(Resource::Products, &id, body).await
}

pub async fn delete_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<ProxyReply> {
    state.proxy.delete(Resource::Products, &id).await
}

// Aggregations

pub async fn dashboard(State(state): State<Arc<AppState>>) -> Result<Json<Aggregate<Dashboard>>> {
    state.aggregator.dashboard().await.map(Json)
}

pub async fn product_with_owner(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Aggregate<Value>>> {
    state.aggregator.product_with_owner(&id).await.map(Json)
}

pub async fn user_with_products(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Aggregate<UserProducts>>> {
    state.aggregator.user_with_products(&id).await.map(Json)
}
