//! Connection manager - the orchestration boundary other subsystems call.
//!
//! Thin layer above the pool that also owns provider registration and the
//! observer list used by the rest of the harness. Provider failures are
//! absorbed here: callers get `None` rather than a raw error, and the
//! manager never holds its own guards across a pool call.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{error, info, warn};

use switchboard_core::{Connection, ConnectionEvent};

use crate::observer::{ConnectionObserver, ObserverRegistry};
use crate::pool::ConnectionPool;
use crate::provider::ConnectionProvider;

pub struct ConnectionManager {
    pool: Arc<ConnectionPool>,
    providers: RwLock<HashMap<String, Arc<dyn ConnectionProvider>>>,
    observers: Arc<ObserverRegistry>,
    initialized: AtomicBool,
}

impl ConnectionManager {
    /// The pool must have been built with the same observer registry so
    /// pool-published and manager-published events reach the same list.
    pub fn new(pool: Arc<ConnectionPool>, observers: Arc<ObserverRegistry>) -> Self {
        Self {
            pool,
            providers: RwLock::new(HashMap::new()),
            observers,
            initialized: AtomicBool::new(false),
        }
    }

    /// Idempotent; a second call is a warned no-op.
    pub fn initialize(&self) {
        if self.initialized.swap(true, Ordering::SeqCst) {
            warn!("[Manager] Already initialized");
            return;
        }
        info!("[Manager] Initialized");
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    /// Register a provider with the manager and forward to the pool.
    /// The two maps must always agree; a discrepancy is a bug.
    pub fn register_provider(
        &self,
        service_type: impl Into<String>,
        provider: Arc<dyn ConnectionProvider>,
    ) {
        let service_type = service_type.into();
        self.providers
            .write()
            .insert(service_type.clone(), provider.clone());
        // Guard dropped above; the pool takes its own lock.
        self.pool.register_provider(service_type.clone(), provider);
        info!(service_type = %service_type, "[Manager] Provider registered");
    }

    pub fn get_provider(&self, service_type: &str) -> Option<Arc<dyn ConnectionProvider>> {
        self.providers.read().get(service_type).cloned()
    }

    /// Connect via the provider (first enabled id when `connection_id` is
    /// `None`), adopt the result into the pool, and publish `created`.
    ///
    /// Any provider failure is logged and absorbed as `None`; callers must
    /// check for the sentinel. No residual pool entry is left behind.
    pub async fn create_connection(
        &self,
        service_type: &str,
        connection_id: Option<&str>,
    ) -> Option<Arc<dyn Connection>> {
        let provider = match self.get_provider(service_type) {
            Some(p) => p,
            None => {
                warn!(service_type = %service_type, "[Manager] No provider for service type");
                return None;
            }
        };

        match provider.connect(connection_id).await {
            Ok(conn) => {
                let id = conn.connection_id().to_string();
                self.pool.adopt_connection(service_type, &id, conn.clone()).await;
                info!(
                    service_type = %service_type,
                    connection_id = %id,
                    "[Manager] Connection created"
                );
                Some(conn)
            }
            Err(e) => {
                error!(
                    service_type = %service_type,
                    connection_id = connection_id.unwrap_or("<default>"),
                    error = %e,
                    "[Manager] Failed to create connection"
                );
                None
            }
        }
    }

    /// Pooled lookup/create; pool errors are logged and absorbed as `None`.
    pub async fn get_connection(
        &self,
        service_type: &str,
        connection_id: &str,
    ) -> Option<Arc<dyn Connection>> {
        match self.pool.get_connection(service_type, connection_id).await {
            Ok(conn) => Some(conn),
            Err(e) => {
                error!(
                    service_type = %service_type,
                    connection_id = %connection_id,
                    error = %e,
                    "[Manager] Failed to retrieve connection"
                );
                None
            }
        }
    }

    pub async fn close_connection(&self, service_type: &str, connection_id: &str) {
        self.pool.close_connection(service_type, connection_id).await;
    }

    pub async fn close_all_connections(&self) {
        self.pool.close_all_connections().await;
    }

    pub async fn connection_status(
        &self,
        service_type: &str,
        connection_id: &str,
    ) -> Option<bool> {
        self.pool.connection_status(service_type, connection_id).await
    }

    pub fn pool(&self) -> Arc<ConnectionPool> {
        self.pool.clone()
    }

    /// Attach an observer for subsequent notification rounds.
    pub async fn attach_observer(&self, observer: Arc<dyn ConnectionObserver>) {
        self.observers.attach(observer).await;
    }

    /// Deliver an event to every attached observer, best-effort.
    pub async fn notify_observers(&self, event: &ConnectionEvent) {
        self.observers.notify(event).await;
    }

    /// Close every pooled connection (publishing one `closed` event per
    /// close), then clear providers and observers and drop the
    /// initialized flag. A second call finds empty maps and is a no-op.
    pub async fn shutdown(&self) {
        info!("[Manager] Shutdown starting");

        let connections = self.pool.all_connections();
        for (service_type, connection_id) in connections.keys() {
            self.pool.close_connection(service_type, connection_id).await;
        }

        self.providers.write().clear();
        self.pool.clear_providers();
        self.observers.clear().await;
        self.initialized.store(false, Ordering::SeqCst);
        info!("[Manager] Shutdown complete");
    }
}
