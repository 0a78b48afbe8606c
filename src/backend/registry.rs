//! Registry of the record services the gateway fronts

use crate::backend::types::BackendDescriptor;
use crate::config::ServicesConfig;

/// Read-only set of backend descriptors, built once at start-up
#[derive(Debug, Clone)]
pub struct BackendRegistry {
    users: BackendDescriptor,
    products: BackendDescriptor,
}

impl BackendRegistry {
    pub fn new(users: BackendDescriptor, products: BackendDescriptor) -> Self {
        Self { users, products }
    }

    /// Build the registry from the `services` configuration section
    pub fn from_config(config: &ServicesConfig) -> Self {
        Self::new((&config.users).into(), (&config.products).into())
    }

    pub fn users(&self) -> &BackendDescriptor {
        &self.users
    }

    pub fn products(&self) -> &BackendDescriptor {
        &self.products
    }

    /// All backends in declaration order
    pub fn all(&self) -> Vec<&BackendDescriptor> {
        vec![&self.users, &self.products]
    }
}
