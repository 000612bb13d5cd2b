//! Typed configuration for services and their endpoints.
//!
//! The harness configuration is a map of service type to [`ServiceConfig`].
//! Fields recognized by the core are explicit; everything service-specific
//! lands in `params` and is validated by the owning provider's factory at
//! load time - there is no attribute probing at call time.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

fn default_true() -> bool {
    true
}

fn default_name() -> String {
    "default".to_string()
}

/// One configured endpoint of a service type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Connection id, unique within the service type
    #[serde(default = "default_name")]
    pub name: String,
    /// Disabled endpoints are skipped at load time
    #[serde(default = "default_true")]
    pub enable: bool,
    /// Service-specific parameters (host, port, credentials, ...)
    #[serde(flatten)]
    pub params: serde_json::Map<String, serde_json::Value>,
}

impl EndpointConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enable: true,
            params: serde_json::Map::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.params.insert(key.into(), value);
        self
    }

    pub fn param(&self, key: &str) -> Option<&serde_json::Value> {
        self.params.get(key)
    }

    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.params.get(key).and_then(|v| v.as_str())
    }

    /// Fetch a field the factory declared as required.
    pub fn require(&self, key: &str) -> Result<&serde_json::Value, ConfigError> {
        self.params.get(key).ok_or_else(|| ConfigError::MissingField {
            connection_id: self.name.clone(),
            field: key.to_string(),
        })
    }
}

/// Configuration for one service type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// `false` disables the whole service type: zero enabled endpoints
    #[serde(default = "default_true")]
    pub enable: bool,
    /// Ordered endpoint list; the first enabled entry is the default
    #[serde(default)]
    pub connections: Vec<EndpointConfig>,
}

impl ServiceConfig {
    pub fn new(connections: Vec<EndpointConfig>) -> Self {
        Self {
            enable: true,
            connections,
        }
    }

    pub fn disabled() -> Self {
        Self {
            enable: false,
            connections: Vec::new(),
        }
    }
}

/// A full harness configuration document: service type -> service config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HarnessConfig {
    #[serde(flatten)]
    pub services: HashMap<String, ServiceConfig>,
}

impl HarnessConfig {
    pub fn service(&self, service_type: &str) -> Option<&ServiceConfig> {
        self.services.get(service_type)
    }

    pub fn require_service(&self, service_type: &str) -> Result<&ServiceConfig, ConfigError> {
        self.services
            .get(service_type)
            .ok_or_else(|| ConfigError::UnknownService(service_type.to_string()))
    }
}
