//! Functional tests for the cross-service joins

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use service_gateway::{
    api::routes::{create_router, GatewayApp},
    config::Settings,
    AppState,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn create_test_app(users_url: &str, products_url: &str) -> GatewayApp {
    let mut settings = Settings::default();
    settings.services.users.base_url = users_url.to_string();
    settings.services.products.base_url = products_url.to_string();
    create_router(Arc::new(AppState::new(settings).unwrap()))
}

async fn get(app: GatewayApp, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn users_list() -> Value {
    json!({
        "success": true,
        "count": 2,
        "data": [
            {"id": 1, "name": "Alice Johnson", "email": "alice@example.com", "role": "Admin"},
            {"id": 2, "name": "Bob Smith", "email": "bob@example.com", "role": "User"}
        ]
    })
}

fn products_list() -> Value {
    json!({
        "success": true,
        "count": 3,
        "data": [
            {"id": 1, "name": "Laptop", "price": 999.99, "category": "Electronics", "stock": 50, "ownerId": 1},
            {"id": 2, "name": "Smartphone", "price": 699.99, "category": "Electronics", "stock": 100, "ownerId": 2},
            {"id": 3, "name": "Coffee Maker", "price": 89.99, "category": "Home", "stock": 30, "ownerId": 1}
        ]
    })
}

async fn mount_get(server: &MockServer, route: &str, status: u16, body: Value) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_dashboard_combines_both_services() {
    let users = MockServer::start().await;
    let products = MockServer::start().await;
    mount_get(&users, "/api/users", 200, users_list()).await;
    mount_get(&products, "/api/products", 200, products_list()).await;

    let (status, body) = get(create_test_app(&users.uri(), &products.uri()), "/api/dashboard").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["users"]["total"], json!(2));
    assert_eq!(body["data"]["products"]["total"], json!(3));
    assert_eq!(body["data"]["products"]["data"], products_list()["data"]);
    assert_eq!(body["data"]["summary"]["totalUsers"], json!(2));
    assert_eq!(body["data"]["summary"]["totalProducts"], json!(3));
    assert!(body["data"]["summary"]["timestamp"].is_string());
}

#[tokio::test]
async fn test_dashboard_calls_backends_concurrently() {
    let users = MockServer::start().await;
    let products = MockServer::start().await;
    let delay = Duration::from_millis(600);
    for (server, route, body) in [
        (&users, "/api/users", users_list()),
        (&products, "/api/products", products_list()),
    ] {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_json(body).set_delay(delay))
            .expect(1)
            .mount(server)
            .await;
    }

    let app = create_test_app(&users.uri(), &products.uri());
    let started = Instant::now();
    let (status, body) = get(app, "/api/dashboard").await;
    let elapsed = started.elapsed();

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["summary"]["totalUsers"], json!(2));
    assert!(elapsed >= delay, "finished in {elapsed:?}");
    assert!(elapsed < delay * 2, "sequential calls: {elapsed:?}");
}

#[tokio::test]
async fn test_dashboard_fails_when_user_service_unreachable() {
    let products = MockServer::start().await;
    mount_get(&products, "/api/products", 200, products_list()).await;

    let (status, body) = get(create_test_app("http://127.0.0.1:1", &products.uri()), "/api/dashboard").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["message"], json!("Error aggregating data from services"));
    assert!(body["error"].as_str().unwrap().starts_with("User Service: "));
    assert!(body.get("data").is_none());
}

#[tokio::test]
async fn test_dashboard_reports_every_failed_backend() {
    let products = MockServer::start().await;
    mount_get(
        &products,
        "/api/products",
        503,
        json!({"success": false, "message": "Product store offline"}),
    )
    .await;

    let (status, body) = get(create_test_app("http://127.0.0.1:1", &products.uri()), "/api/dashboard").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let error = body["error"].as_str().unwrap();
    assert!(error.contains("User Service: "));
    assert!(error.contains("Product Service: Product store offline"));
}

#[tokio::test]
async fn test_product_with_owner_merges_owner() {
    let users = MockServer::start().await;
    let products = MockServer::start().await;
    mount_get(
        &products,
        "/api/products/2",
        200,
        json!({"success": true, "data": products_list()["data"][1].clone()}),
    )
    .await;
    mount_get(
        &users,
        "/api/users/2",
        200,
        json!({"success": true, "data": users_list()["data"][1].clone()}),
    )
    .await;

    let (status, body) = get(
        create_test_app(&users.uri(), &products.uri()),
        "/api/products/2/with-owner",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["name"], json!("Smartphone"));
    assert_eq!(body["data"]["owner"]["id"], body["data"]["ownerId"]);
    assert_eq!(body["data"]["owner"]["name"], json!("Bob Smith"));
}

#[tokio::test]
async fn test_product_with_owner_missing_product_skips_owner_call() {
    let users = MockServer::start().await;
    let products = MockServer::start().await;
    mount_get(
        &products,
        "/api/products/999",
        404,
        json!({"success": false, "message": "Product with ID 999 not found"}),
    )
    .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&users)
        .await;

    let (status, body) = get(
        create_test_app(&users.uri(), &products.uri()),
        "/api/products/999/with-owner",
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["message"], json!("Product with ID 999 not found"));
    users.verify().await;
}

#[tokio::test]
async fn test_product_with_owner_propagates_owner_failure() {
    let users = MockServer::start().await;
    let products = MockServer::start().await;
    mount_get(
        &products,
        "/api/products/5",
        200,
        json!({"success": true, "data": {"id": 5, "name": "Lamp", "ownerId": 9}}),
    )
    .await;
    mount_get(
        &users,
        "/api/users/9",
        404,
        json!({"success": false, "message": "User with ID 9 not found"}),
    )
    .await;

    let (status, body) = get(
        create_test_app(&users.uri(), &products.uri()),
        "/api/products/5/with-owner",
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], json!("User with ID 9 not found"));
}

#[tokio::test]
async fn test_product_without_owner_id_is_bad_gateway() {
    let users = MockServer::start().await;
    let products = MockServer::start().await;
    mount_get(
        &products,
        "/api/products/6",
        200,
        json!({"success": true, "data": {"id": 6, "name": "Orphan"}}),
    )
    .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&users)
        .await;

    let (status, body) = get(
        create_test_app(&users.uri(), &products.uri()),
        "/api/products/6/with-owner",
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["success"], json!(false));
    users.verify().await;
}

#[tokio::test]
async fn test_product_with_dot_segment_owner_is_bad_gateway() {
    let users = MockServer::start().await;
    let products = MockServer::start().await;
    mount_get(
        &products,
        "/api/products/8",
        200,
        json!({"success": true, "data": {"id": 8, "name": "Odd", "ownerId": ".."}}),
    )
    .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&users)
        .await;

    let (status, body) = get(
        create_test_app(&users.uri(), &products.uri()),
        "/api/products/8/with-owner",
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], json!("Error aggregating product with owner information"));
    users.verify().await;
}

#[tokio::test]
async fn test_user_with_products_filters_by_owner() {
    let users = MockServer::start().await;
    let products = MockServer::start().await;
    mount_get(
        &users,
        "/api/users/1",
        200,
        json!({"success": true, "data": users_list()["data"][0].clone()}),
    )
    .await;
    mount_get(
        &products,
        "/api/products",
        200,
        json!({
            "success": true,
            "count": 3,
            "data": [
                {"id": 1, "ownerId": 1},
                {"id": 2, "ownerId": 2},
                {"id": 3, "name": "No owner"}
            ]
        }),
    )
    .await;

    let (status, body) = get(
        create_test_app(&users.uri(), &products.uri()),
        "/api/users/1/products",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["user"]["name"], json!("Alice Johnson"));
    assert_eq!(body["data"]["products"], json!([{"id": 1, "ownerId": 1}]));
    assert_eq!(body["data"]["productCount"], json!(1));
}

#[tokio::test]
async fn test_user_with_products_count_matches_list() {
    let users = MockServer::start().await;
    let products = MockServer::start().await;
    mount_get(
        &users,
        "/api/users/1",
        200,
        json!({"success": true, "data": users_list()["data"][0].clone()}),
    )
    .await;
    mount_get(&products, "/api/products", 200, products_list()).await;

    let (_, body) = get(
        create_test_app(&users.uri(), &products.uri()),
        "/api/users/1/products",
    )
    .await;

    let listed = body["data"]["products"].as_array().unwrap().len();
    assert_eq!(listed, 2);
    assert_eq!(body["data"]["productCount"], json!(listed));
}

#[tokio::test]
async fn test_user_with_products_missing_user() {
    let users = MockServer::start().await;
    let products = MockServer::start().await;
    mount_get(
        &users,
        "/api/users/77",
        404,
        json!({"success": false, "message": "User with ID 77 not found"}),
    )
    .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&products)
        .await;

    let (status, body) = get(
        create_test_app(&users.uri(), &products.uri()),
        "/api/users/77/products",
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], json!("User with ID 77 not found"));
    products.verify().await;
}
