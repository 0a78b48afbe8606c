//! Configuration module

pub mod settings;

pub use settings::{BackendConfig, LoggingConfig, ServicesConfig, Settings, TimeoutConfig};
