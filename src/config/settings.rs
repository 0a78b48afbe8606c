//! Application settings and configuration management

use crate::error::{AppError, Result};
use config::{builder::DefaultState, Config, ConfigBuilder, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub timeouts: TimeoutConfig,
    pub services: ServicesConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

/// Outbound call timeouts, in milliseconds
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TimeoutConfig {
    #[serde(default = "default_request_timeout")]
    pub request_ms: u64,
    #[serde(default = "default_health_check_timeout")]
    pub health_check_ms: u64,
}

fn default_request_timeout() -> u64 {
    10_000
}

fn default_health_check_timeout() -> u64 {
    3_000
}

/// The two record services behind the gateway, in declaration order
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServicesConfig {
    pub users: BackendConfig,
    pub products: BackendConfig,
}

/// Backend configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackendConfig {
    /// Key used in the services health map
    pub name: String,
    /// Human readable name used in error messages
    pub display_name: String,
    pub base_url: String,
    #[serde(default = "default_health_check_path")]
    pub health_check_path: String,
}

fn default_health_check_path() -> String {
    "/health".to_string()
}

impl BackendConfig {
    fn users() -> Self {
        Self {
            name: "userService".to_string(),
            display_name: "User Service".to_string(),
            base_url: "http://localhost:3001".to_string(),
            health_check_path: default_health_check_path(),
        }
    }

    fn products() -> Self {
        Self {
            name: "productService".to_string(),
            display_name: "Product Service".to_string(),
            base_url: "http://localhost:3002".to_string(),
            health_check_path: default_health_check_path(),
        }
    }
}

impl Settings {
    /// Load settings from `config/default.toml`, `GATEWAY__*` variables and
    /// the `PORT` / `USER_SERVICE_URL` / `PRODUCT_SERVICE_URL` variables
    pub fn load() -> Result<Self> {
        let config = Self::builder("config/default.toml")?
            .set_override_option("server.port", std::env::var("PORT").ok())?
            .set_override_option(
                "services.users.base_url",
                std::env::var("USER_SERVICE_URL").ok(),
            )?
            .set_override_option(
                "services.products.base_url",
                std::env::var("PRODUCT_SERVICE_URL").ok(),
            )?
            .build()?;

        let settings: Settings = config.try_deserialize()?;
        Ok(settings)
    }

    /// Load settings from a specific configuration file path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Self::builder(path)?.build()?;
        let settings: Settings = config.try_deserialize()?;
        Ok(settings)
    }

    fn builder<P: AsRef<Path>>(path: P) -> Result<ConfigBuilder<DefaultState>> {
        let users = BackendConfig::users();
        let products = BackendConfig::products();

        let builder = Config::builder()
            // Start with default values
            .set_default("server.host", default_host())?
            .set_default("server.port", i64::from(default_port()))?
            .set_default("logging.level", default_log_level())?
            .set_default("logging.format", default_log_format())?
            .set_default("timeouts.request_ms", default_request_timeout() as i64)?
            .set_default(
                "timeouts.health_check_ms",
                default_health_check_timeout() as i64,
            )?
            .set_default("services.users.name", users.name)?
            .set_default("services.users.display_name", users.display_name)?
            .set_default("services.users.base_url", users.base_url)?
            .set_default("services.users.health_check_path", users.health_check_path)?
            .set_default("services.products.name", products.name)?
            .set_default("services.products.display_name", products.display_name)?
            .set_default("services.products.base_url", products.base_url)?
            .set_default(
                "services.products.health_check_path",
                products.health_check_path,
            )?
            // Load from configuration file
            .add_source(File::from(path.as_ref()).required(false))
            // Override with environment variables (GATEWAY__SERVER__PORT, ...)
            .add_source(
                Environment::with_prefix("GATEWAY")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );

        Ok(builder)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(invalid("Server port cannot be 0".to_string()));
        }

        if self.timeouts.request_ms == 0 || self.timeouts.health_check_ms == 0 {
            return Err(invalid("Timeouts must be greater than 0".to_string()));
        }

        let mut names = HashSet::new();
        for backend in self.services.all() {
            if backend.name.is_empty() {
                return Err(invalid("Backend name cannot be empty".to_string()));
            }
            if !names.insert(backend.name.as_str()) {
                return Err(invalid(format!(
                    "Backend name '{}' is declared more than once",
                    backend.name
                )));
            }
            if reqwest::Url::parse(&backend.base_url).is_err() {
                return Err(invalid(format!(
                    "Backend '{}' has invalid base_url '{}'",
                    backend.name, backend.base_url
                )));
            }
            if !backend.health_check_path.starts_with('/') {
                return Err(invalid(format!(
                    "Backend '{}' health_check_path must start with '/'",
                    backend.name
                )));
            }
        }

        Ok(())
    }
}

impl ServicesConfig {
    /// Backends in declaration order
    pub fn all(&self) -> [&BackendConfig; 2] {
        [&self.users, &self.products]
    }
}

fn invalid(message: String) -> AppError {
    AppError::Config(config::ConfigError::Message(message))
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: default_host(),
                port: default_port(),
            },
            logging: LoggingConfig {
                level: default_log_level(),
                format: default_log_format(),
            },
            timeouts: TimeoutConfig {
                request_ms: default_request_timeout(),
                health_check_ms: default_health_check_timeout(),
            },
            services: ServicesConfig {
                users: BackendConfig::users(),
                products: BackendConfig::products(),
            },
        }
    }
}
