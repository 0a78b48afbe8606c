//! Backend module - descriptors, result types, HTTP client and registry

pub mod http_client;
pub mod registry;
pub mod types;

pub use http_client::BackendClient;
pub use registry::BackendRegistry;
pub use types::{BackendDescriptor, BackendFailure, BackendReply, ProxyResult};
