//! Router construction

use axum::{routing::get, Router};
use std::sync::Arc;
use tower::Layer;
use tower_http::{
    cors::CorsLayer,
    normalize_path::{NormalizePath, NormalizePathLayer},
    trace::TraceLayer,
};

use crate::api::handlers;
use crate::AppState;

/// The gateway service: the router behind trailing-slash normalization
pub type GatewayApp = NormalizePath<Router>;

/// Build the gateway router
///
/// Unknown paths and unsupported methods on known paths both get the JSON 404.
/// `/api/users/` is routed as `/api/users`; the slash is trimmed before routing.
pub fn create_router(state: Arc<AppState>) -> GatewayApp {
    let router = Router::new()
        .route(
            "/",
            get(handlers::root).fallback(handlers::not_found),
        )
        .route(
            "/health",
            get(handlers::gateway_health).fallback(handlers::not_found),
        )
        .route(
            "/api/services/health",
            get(handlers::services_health).fallback(handlers::not_found),
        )
        .route(
            "/api/dashboard",
            get(handlers::dashboard).fallback(handlers::not_found),
        )
        .route(
            "/api/users",
            get(handlers::list_users)
                .post(handlers::create_user)
                .fallback(handlers::not_found),
        )
        .route(
            "/api/users/:id",
            get(handlers::get_user)
                .put(handlers::update_user)
                .delete(handlers::delete_user)
                .fallback(handlers::not_found),
        )
        .route(
            "/api/users/:id/products",
            get(handlers::user_with_products).fallback(handlers::not_found),
        )
        .route(
            "/api/products",
            get(handlers::list_products)
                .post(handlers::create_product)
                .fallback(handlers::not_found),
        )
        .route(
            "/api/products/:id",
            get(handlers::get_product)
                .put(handlers::update_product)
                .delete(handlers::delete_product)
                .fallback(handlers::not_found),
        )
        .route(
            "/api/products/:id/with-owner",
            get(handlers::product_with_owner).fallback(handlers::not_found),
        )
        .fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    NormalizePathLayer::trim_trailing_slash().layer(router)
}
