//! Cross-service joins
//!
//! The dashboard issues its two list calls concurrently and waits for both.
//! The product-with-owner and user-with-products joins are sequential since
//! the second call depends on the first call's result. A failed prerequisite
//! stops the chain and its status/message is propagated.

use axum::http::StatusCode;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::backend::{BackendClient, BackendDescriptor, BackendFailure, BackendRegistry, BackendReply};
use crate::error::{AppError, Result};
use crate::gateway::{iso_timestamp, proxy::Resource};

const DASHBOARD_FAILED: &str = "Error aggregating data from services";
const PRODUCT_WITH_OWNER_FAILED: &str = "Error aggregating product with owner information";
const USER_PRODUCTS_FAILED: &str = "Error aggregating user products";

/// Success envelope for aggregate endpoints
#[derive(Debug, Serialize)]
pub struct Aggregate<T> {
    pub success: bool,
    pub message: &'static str,
    pub data: T,
}

impl<T> Aggregate<T> {
    fn new(message: &'static str, data: T) -> Self {
        Self {
            success: true,
            message,
            data,
        }
    }
}

/// One record set on the dashboard
#[derive(Debug, Serialize)]
pub struct Collection {
    pub total: u64,
    pub data: Value,
}

impl From<BackendReply> for Collection {
    fn from(reply: BackendReply) -> Self {
        let data = reply.data().cloned().unwrap_or(Value::Array(Vec::new()));
        let total = reply
            .count()
            .and_then(Value::as_u64)
            .or_else(|| data.as_array().map(|a| a.len() as u64))
            .unwrap_or(0);
        Self { total, data }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_users: u64,
    pub total_products: u64,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct Dashboard {
    pub users: Collection,
    pub products: Collection,
    pub summary: DashboardSummary,
}

/// A user with the products they own
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProducts {
    pub user: Value,
    pub products: Vec<Value>,
    pub product_count: usize,
}

impl UserProducts {
    pub fn new(user: Value, products: Vec<Value>) -> Self {
        Self {
            product_count: products.len(),
            user,
            products,
        }
    }
}

/// Joins results from the user and product services
#[derive(Clone)]
pub struct Aggregator {
    client: BackendClient,
    registry: Arc<BackendRegistry>,
}

impl Aggregator {
    pub fn new(client: BackendClient, registry: Arc<BackendRegistry>) -> Self {
        Self { client, registry }
    }

    /// Users and products lists fetched concurrently; fails if either fails
    pub async fn dashboard(&self) -> Result<Aggregate<Dashboard>> {
        let users_backend = self.registry.users();
        let products_backend = self.registry.products();

        let (users, products) = tokio::join!(
            self.client.get(users_backend, Resource::Users.collection_path()),
            self.client.get(products_backend, Resource::Products.collection_path())
        );

        let (users, products) = match (users, products) {
            (Ok(users), Ok(products)) => (Collection::from(users), Collection::from(products)),
            (users, products) => {
                let failures: Vec<String> = [
                    (users_backend, users.err()),
                    (products_backend, products.err()),
                ]
                .into_iter()
                .filter_map(|(backend, failure)| {
                    failure.map(|f| format!("{}: {}", backend.display_name, f))
                })
                .collect();
                warn!(failures = ?failures, "Dashboard aggregation failed");
                return Err(AppError::Aggregation {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    message: DASHBOARD_FAILED.to_string(),
                    error: failures.join("; "),
                });
            }
        };

        let summary = DashboardSummary {
            total_users: users.total,
            total_products: products.total,
            timestamp: iso_timestamp(),
        };

        Ok(Aggregate::new(
            "Dashboard data aggregated from User and Product services",
            Dashboard {
                users,
                products,
                summary,
            },
        ))
    }

    /// Product merged with an `owner` field holding the owning user
    pub async fn product_with_owner(&self, product_id: &str) -> Result<Aggregate<Value>> {
        let products_backend = self.registry.products();
        let product_path = Resource::Products.item_path(product_id)?;
        let product = self
            .client
            .get(products_backend, &product_path)
            .await
            .map_err(|f| propagate(f, PRODUCT_WITH_OWNER_FAILED))?;

        let mut product = match product.data() {
            Some(Value::Object(fields)) => fields.clone(),
            _ => {
                return Err(malformed(
                    products_backend,
                    format!("product {} has no data object", product_id),
                    PRODUCT_WITH_OWNER_FAILED,
                ))
            }
        };

        let owner_id = product.get("ownerId").and_then(id_segment).ok_or_else(|| {
            malformed(
                products_backend,
                format!("product {} has no ownerId", product_id),
                PRODUCT_WITH_OWNER_FAILED,
            )
        })?;

        let owner_path = Resource::Users.item_path(&owner_id).map_err(|_| {
            malformed(
                products_backend,
                format!("product {} has an unusable ownerId '{}'", product_id, owner_id),
                PRODUCT_WITH_OWNER_FAILED,
            )
        })?;

        debug!(product_id = %product_id, owner_id = %owner_id, "Fetching product owner");
        let owner = self
            .client
            .get(self.registry.users(), &owner_path)
            .await
            .map_err(|f| propagate(f, PRODUCT_WITH_OWNER_FAILED))?;

        product.insert(
            "owner".to_string(),
            owner.data().cloned().unwrap_or(Value::Null),
        );

        Ok(Aggregate::new(
            "Product with owner information aggregated at gateway",
            Value::Object(product),
        ))
    }

    /// User with the subset of all products whose `ownerId` matches
    pub async fn user_with_products(&self, user_id: &str) -> Result<Aggregate<UserProducts>> {
        let user_path = Resource::Users.item_path(user_id)?;
        let user = self
            .client
            .get(self.registry.users(), &user_path)
            .await
            .map_err(|f| propagate(f, USER_PRODUCTS_FAILED))?;
        let user = user.data().cloned().unwrap_or(Value::Null);

        let products_backend = self.registry.products();
        let products = self
            .client
            .get(products_backend, Resource::Products.collection_path())
            .await
            .map_err(|f| propagate(f, USER_PRODUCTS_FAILED))?;

        let products = match products.data().cloned() {
            Some(Value::Array(products)) => products,
            _ => {
                return Err(malformed(
                    products_backend,
                    "product list has no data array".to_string(),
                    USER_PRODUCTS_FAILED,
                ))
            }
        };

        let owner_id = user
            .get("id")
            .cloned()
            .or_else(|| user_id.parse::<i64>().ok().map(Value::from))
            .unwrap_or(Value::Null);

        Ok(Aggregate::new(
            "User data aggregated with their products",
            UserProducts::new(user, owned_by(products, &owner_id)),
        ))
    }
}

/// Products whose `ownerId` equals `owner_id`; products without one never match
pub fn owned_by(products: Vec<Value>, owner_id: &Value) -> Vec<Value> {
    products
        .into_iter()
        .filter(|p| p.get("ownerId").is_some_and(|id| same_id(id, owner_id)))
        .collect()
}

fn same_id(a: &Value, b: &Value) -> bool {
    match (a.as_i64(), b.as_i64()) {
        (Some(a), Some(b)) => a == b,
        _ => !a.is_null() && a == b,
    }
}

/// Render an id value as a path segment
fn id_segment(id: &Value) -> Option<String> {
    match id {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

fn propagate(failure: BackendFailure, context: &str) -> AppError {
    AppError::Aggregation {
        status: failure.status_or_default(),
        message: failure.message().to_string(),
        error: context.to_string(),
    }
}

fn malformed(backend: &BackendDescriptor, detail: String, context: &str) -> AppError {
    warn!(backend = %backend.name, detail = %detail, "Unexpected backend response shape");
    AppError::Aggregation {
        status: StatusCode::BAD_GATEWAY,
        message: format!("{} returned an unexpected response: {}", backend.display_name, detail),
        error: context.to_string(),
    }
}
