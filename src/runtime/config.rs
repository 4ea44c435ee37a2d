//! Gateway configuration.

use crate::cors::CorsConfig;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::warn;

/// Configuration for the adapter and the local development gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Path prefix the platform mounts the function under.
    pub mount_prefix: String,
    /// Whether to answer `/_health` locally.
    pub enable_health: bool,
    /// Maximum request body size in bytes.
    pub max_body_size: usize,
    /// CORS policy settings.
    pub cors: CorsConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            mount_prefix: "/api".to_string(),
            enable_health: true,
            max_body_size: 10 * 1024 * 1024, // 10MB
            cors: CorsConfig::default(),
        }
    }
}

impl GatewayConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overlaid with `GATEWAY_*` and `CORS_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`GatewayConfig::from_env`], reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(host) = lookup("GATEWAY_HOST") {
            config.host = host;
        }
        if let Some(port) = parsed(&lookup, "GATEWAY_PORT") {
            config.port = port;
        }
        if let Some(prefix) = lookup("GATEWAY_MOUNT_PREFIX") {
            config.mount_prefix = prefix;
        }
        if let Some(size) = parsed(&lookup, "GATEWAY_MAX_BODY_SIZE") {
            config.max_body_size = size;
        }
        if let Some(suffix) = lookup("CORS_PLATFORM_SUFFIX") {
            config.cors.platform_suffix = suffix;
        }
        config
    }

    /// Set the host address.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the mount prefix. An empty prefix disables stripping.
    pub fn mount_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.mount_prefix = prefix.into();
        self
    }

    /// Set the maximum request body size.
    pub fn max_body_size(mut self, size: usize) -> Self {
        self.max_body_size = size;
        self
    }

    /// Set the CORS policy settings.
    pub fn cors(mut self, cors: CorsConfig) -> Self {
        self.cors = cors;
        self
    }

    /// Get the bind address.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parsed<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "ignoring unparseable environment variable");
            None
        }
    }
}
