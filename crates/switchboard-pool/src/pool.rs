//! Connection pool - the single authoritative store of live connections.
//!
//! Entries are keyed by (service type, connection id). Creation is
//! mediated through the registered provider and every state change the
//! pool makes publishes a lifecycle event. Bookkeeping maps are guarded
//! independently of connection I/O: only insert/remove is serialized, the
//! connect/disconnect calls themselves run with no map guard held.
//!
//! Concurrent first-callers for the same absent key are serialized by a
//! per-key creation lock, so creation is at-most-once per key.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;
use tokio::sync::Mutex;
use tracing::{debug, info};

use switchboard_core::{Connection, ConnectionEvent, EventKind, PoolError, PoolResult};

use crate::observer::ObserverRegistry;
use crate::provider::ConnectionProvider;

type PoolKey = (String, String);

pub struct ConnectionPool {
    providers: RwLock<HashMap<String, Arc<dyn ConnectionProvider>>>,
    connections: DashMap<PoolKey, Arc<dyn Connection>>,
    creation_locks: DashMap<PoolKey, Arc<Mutex<()>>>,
    observers: Arc<ObserverRegistry>,
}

impl ConnectionPool {
    pub fn new(observers: Arc<ObserverRegistry>) -> Self {
        Self {
            providers: RwLock::new(HashMap::new()),
            connections: DashMap::new(),
            creation_locks: DashMap::new(),
            observers,
        }
    }

    fn provider(&self, service_type: &str) -> PoolResult<Arc<dyn ConnectionProvider>> {
        self.providers
            .read()
            .get(service_type)
            .cloned()
            .ok_or_else(|| PoolError::ProviderNotRegistered(service_type.to_string()))
    }

    /// Store a provider for a service type. Last registration wins.
    pub fn register_provider(
        &self,
        service_type: impl Into<String>,
        provider: Arc<dyn ConnectionProvider>,
    ) {
        let service_type = service_type.into();
        let replaced = self
            .providers
            .write()
            .insert(service_type.clone(), provider)
            .is_some();
        if replaced {
            debug!(service_type = %service_type, "[Pool] Provider replaced");
        } else {
            debug!(service_type = %service_type, "[Pool] Provider registered");
        }
    }

    /// Return the pooled connection for (service type, id), creating it
    /// through the provider when absent and publishing a `created` event.
    ///
    /// An unknown service type is a programmer error and surfaces as
    /// [`PoolError::ProviderNotRegistered`].
    pub async fn get_connection(
        &self,
        service_type: &str,
        connection_id: &str,
    ) -> PoolResult<Arc<dyn Connection>> {
        let key = (service_type.to_string(), connection_id.to_string());

        // Fast path: second callers get the cached instance without
        // touching the provider's create path.
        if let Some(existing) = self.connections.get(&key) {
            return Ok(existing.clone());
        }

        let provider = self.provider(service_type)?;

        // At-most-once creation per key: losers of the race find the
        // winner's entry on the re-check.
        let creation_lock = self
            .creation_locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = creation_lock.lock().await;

        if let Some(existing) = self.connections.get(&key) {
            return Ok(existing.clone());
        }

        let conn = provider.get_connection(connection_id).await?;
        self.connections.insert(key, conn.clone());

        info!(
            service_type = %service_type,
            connection_id = %connection_id,
            "[Pool] Connection created"
        );
        self.publish(
            ConnectionEvent::new(connection_id, service_type, EventKind::Created)
                .with_detail("service_type", serde_json::Value::String(service_type.into())),
        )
        .await;

        Ok(conn)
    }

    /// Adopt a connection created outside the pool's own create path
    /// (manager `create_connection`), publishing a `created` event.
    pub async fn adopt_connection(
        &self,
        service_type: &str,
        connection_id: &str,
        conn: Arc<dyn Connection>,
    ) {
        let key = (service_type.to_string(), connection_id.to_string());
        self.connections.insert(key, conn);

        self.publish(
            ConnectionEvent::new(connection_id, service_type, EventKind::Created)
                .with_detail("service_type", serde_json::Value::String(service_type.into())),
        )
        .await;
    }

    /// Close one connection: provider disconnect, entry removal, one
    /// `closed` event. A close on a nonexistent key is a no-op with zero
    /// events.
    pub async fn close_connection(&self, service_type: &str, connection_id: &str) {
        let key = (service_type.to_string(), connection_id.to_string());

        let removed = self.connections.remove(&key);
        let Some((_, conn)) = removed else {
            debug!(
                service_type = %service_type,
                connection_id = %connection_id,
                "[Pool] Close on unknown connection, ignoring"
            );
            return;
        };

        // Provider clears its own cache and disconnects; fall back to a
        // direct disconnect when the provider is already gone.
        match self.provider(service_type) {
            Ok(provider) => provider.close_connection(connection_id).await,
            Err(_) => conn.disconnect().await,
        }
        self.creation_locks.remove(&key);

        info!(
            service_type = %service_type,
            connection_id = %connection_id,
            "[Pool] Connection closed"
        );
        self.publish(
            ConnectionEvent::new(connection_id, service_type, EventKind::Closed)
                .with_detail("service_type", serde_json::Value::String(service_type.into())),
        )
        .await;
    }

    /// Close every provider's connections and clear the pool map.
    /// Full-shutdown path only.
    pub async fn close_all_connections(&self) {
        let providers: Vec<Arc<dyn ConnectionProvider>> =
            self.providers.read().values().cloned().collect();
        for provider in providers {
            provider.close_all_connections().await;
        }
        self.connections.clear();
        self.creation_locks.clear();
        info!("[Pool] All connections closed");
    }

    /// Connectivity of a pooled connection; `None` when not found.
    pub async fn connection_status(
        &self,
        service_type: &str,
        connection_id: &str,
    ) -> Option<bool> {
        let provider = self.providers.read().get(service_type).cloned()?;
        provider.connection_status(connection_id).await
    }

    /// Defensive snapshot of the live-connection map.
    pub fn all_connections(&self) -> HashMap<PoolKey, Arc<dyn Connection>> {
        self.connections
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    /// Defensive snapshot of the provider table.
    pub fn all_providers(&self) -> HashMap<String, Arc<dyn ConnectionProvider>> {
        self.providers.read().clone()
    }

    /// Drop all registered providers (shutdown).
    pub fn clear_providers(&self) {
        self.providers.write().clear();
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    async fn publish(&self, event: ConnectionEvent) {
        self.observers.notify(&event).await;
    }
}
