//! Provider contract and the generic service provider.
//!
//! A provider owns the configuration and the connection cache for one
//! service type. The service-specific part is reduced to a
//! [`ConnectionFactory`]: validate an endpoint's fields and build a
//! not-yet-connected handle. Everything else - id resolution, caching,
//! connect with retry and deadline, best-effort bulk connect - lives once
//! in [`ServiceProvider`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use switchboard_core::{
    connect_with_retry, Connection, ConnectionError, EndpointConfig, PoolError, PoolResult,
    RetryPolicy, ServiceConfig,
};

/// Default deadline for one connect call (retries included)
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(60);

/// Per-service construction seam.
///
/// `build` must return a new, not-yet-connected handle and must not mutate
/// any shared state.
#[async_trait]
pub trait ConnectionFactory: Send + Sync + std::fmt::Debug {
    /// Service type tag of the connections this factory builds
    fn service_type(&self) -> &str;

    /// Endpoint fields that must be present at load time
    fn required_fields(&self) -> &[&str] {
        &[]
    }

    async fn build(&self, endpoint: &EndpointConfig) -> Result<Arc<dyn Connection>, ConnectionError>;
}

/// Factory and connection-cache contract for one service type.
#[async_trait]
pub trait ConnectionProvider: Send + Sync {
    fn service_type(&self) -> &str;

    /// Configured ids that are enabled, in configuration order
    fn enabled_connections(&self) -> Vec<String>;

    /// Build a new, not-yet-connected handle for `connection_id`.
    /// Does not touch the provider's cache.
    async fn create_connection(&self, connection_id: &str) -> PoolResult<Arc<dyn Connection>>;

    /// Resolve `connection_id` (first enabled id when `None`), create the
    /// handle if absent, connect it, and cache it for reuse.
    async fn connect(&self, connection_id: Option<&str>) -> PoolResult<Arc<dyn Connection>>;

    /// Connect every enabled id, best-effort; returns the successes.
    async fn connect_all(&self) -> HashMap<String, Arc<dyn Connection>>;

    /// Cached handle for `connection_id`, created (not connected) if absent.
    async fn get_connection(&self, connection_id: &str) -> PoolResult<Arc<dyn Connection>>;

    /// Disconnect and drop the cached handle. Idempotent.
    async fn close_connection(&self, connection_id: &str);

    /// Close every cached connection. Idempotent.
    async fn close_all_connections(&self);

    /// Connectivity of the cached handle, `None` when not cached.
    async fn connection_status(&self, connection_id: &str) -> Option<bool>;
}

/// The one concrete provider implementation, parameterized by a factory.
#[derive(Debug)]
pub struct ServiceProvider {
    service_type: String,
    factory: Arc<dyn ConnectionFactory>,
    configs: HashMap<String, EndpointConfig>,
    enabled: Vec<String>,
    connections: Mutex<HashMap<String, Arc<dyn Connection>>>,
    retry_policy: RetryPolicy,
    connect_timeout: Duration,
}

impl ServiceProvider {
    /// Build a provider from an already-parsed service configuration.
    ///
    /// Load-time validation, fail fast:
    /// - service-level `enable = false` yields zero enabled ids
    /// - an endpoint with `enable = false` is skipped
    /// - a missing required field is a [`ConfigError::MissingField`] and
    ///   aborts the load; required fields are never defaulted
    ///
    /// [`ConfigError::MissingField`]: switchboard_core::ConfigError::MissingField
    pub fn from_config(
        factory: Arc<dyn ConnectionFactory>,
        config: &ServiceConfig,
    ) -> PoolResult<Self> {
        let service_type = factory.service_type().to_string();
        let mut configs = HashMap::new();
        let mut enabled = Vec::new();

        if config.enable {
            for endpoint in &config.connections {
                if !endpoint.enable {
                    debug!(
                        service_type = %service_type,
                        connection_id = %endpoint.name,
                        "[Provider] Endpoint disabled, skipping"
                    );
                    continue;
                }
                for field in factory.required_fields() {
                    endpoint.require(field)?;
                }
                enabled.push(endpoint.name.clone());
                configs.insert(endpoint.name.clone(), endpoint.clone());
            }
        } else {
            info!(service_type = %service_type, "[Provider] Service type disabled in configuration");
        }

        info!(
            service_type = %service_type,
            enabled = enabled.len(),
            "[Provider] Configuration loaded"
        );

        Ok(Self {
            service_type,
            factory,
            configs,
            enabled,
            connections: Mutex::new(HashMap::new()),
            retry_policy: RetryPolicy::default(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        })
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    fn resolve_id(&self, connection_id: Option<&str>) -> PoolResult<String> {
        match connection_id {
            Some(id) => Ok(id.to_string()),
            None => self
                .enabled
                .first()
                .cloned()
                .ok_or_else(|| PoolError::NotFound("no enabled connections".to_string())),
        }
    }

    /// Connect with the provider's deadline and retry budget.
    /// I/O happens with no cache lock held.
    async fn establish(&self, conn: &Arc<dyn Connection>) -> Result<(), ConnectionError> {
        match tokio::time::timeout(
            self.connect_timeout,
            connect_with_retry(conn.as_ref(), &self.retry_policy),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(ConnectionError::Timeout(self.connect_timeout)),
        }
    }
}

#[async_trait]
impl ConnectionProvider for ServiceProvider {
    fn service_type(&self) -> &str {
        &self.service_type
    }

    fn enabled_connections(&self) -> Vec<String> {
        self.enabled.clone()
    }

    async fn create_connection(&self, connection_id: &str) -> PoolResult<Arc<dyn Connection>> {
        let endpoint = self
            .configs
            .get(connection_id)
            .ok_or_else(|| PoolError::NotFound(connection_id.to_string()))?;
        let conn = self.factory.build(endpoint).await?;
        debug!(
            service_type = %self.service_type,
            connection_id = %connection_id,
            "[Provider] Created connection handle"
        );
        Ok(conn)
    }

    async fn connect(&self, connection_id: Option<&str>) -> PoolResult<Arc<dyn Connection>> {
        let id = self.resolve_id(connection_id)?;
        if !self.enabled.contains(&id) {
            return Err(PoolError::NotFound(id));
        }

        let conn = {
            let mut cache = self.connections.lock().await;
            match cache.get(&id) {
                Some(existing) => existing.clone(),
                None => {
                    let created = self.create_connection(&id).await?;
                    cache.insert(id.clone(), created.clone());
                    created
                }
            }
        };

        if let Err(e) = self.establish(&conn).await {
            // Leave no half-initialized entry so the next attempt is clean.
            self.connections.lock().await.remove(&id);
            warn!(
                service_type = %self.service_type,
                connection_id = %id,
                error = %e,
                "[Provider] Connect failed"
            );
            return Err(e.into());
        }

        info!(
            service_type = %self.service_type,
            connection_id = %id,
            "[Provider] Connected"
        );
        Ok(conn)
    }

    async fn connect_all(&self) -> HashMap<String, Arc<dyn Connection>> {
        let mut connected = HashMap::new();
        for id in &self.enabled {
            match self.connect(Some(id)).await {
                Ok(conn) => {
                    connected.insert(id.clone(), conn);
                }
                Err(e) => {
                    warn!(
                        service_type = %self.service_type,
                        connection_id = %id,
                        error = %e,
                        "[Provider] connect_all: skipping failed connection"
                    );
                }
            }
        }
        connected
    }

    async fn get_connection(&self, connection_id: &str) -> PoolResult<Arc<dyn Connection>> {
        let mut cache = self.connections.lock().await;
        if let Some(existing) = cache.get(connection_id) {
            return Ok(existing.clone());
        }
        let created = self.create_connection(connection_id).await?;
        cache.insert(connection_id.to_string(), created.clone());
        Ok(created)
    }

    async fn close_connection(&self, connection_id: &str) {
        let removed = self.connections.lock().await.remove(connection_id);
        if let Some(conn) = removed {
            conn.disconnect().await;
            debug!(
                service_type = %self.service_type,
                connection_id = %connection_id,
                "[Provider] Closed connection"
            );
        }
    }

    async fn close_all_connections(&self) {
        let drained: Vec<(String, Arc<dyn Connection>)> =
            self.connections.lock().await.drain().collect();
        for (id, conn) in drained {
            conn.disconnect().await;
            debug!(
                service_type = %self.service_type,
                connection_id = %id,
                "[Provider] Closed connection"
            );
        }
    }

    async fn connection_status(&self, connection_id: &str) -> Option<bool> {
        self.connections
            .lock()
            .await
            .get(connection_id)
            .map(|c| c.is_connected())
    }
}
