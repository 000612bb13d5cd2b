//! Facade composing registry, manager, and the fixed observer set into
//! one initialization/shutdown unit for the harness.
//!
//! Operations auto-initialize on first use; `initialize`/`shutdown` form
//! the lifecycle bracket called once per test run. The facade also bridges
//! every lifecycle event onto a broadcast bus so scenario code can tail
//! events without registering an observer.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{info, warn};

use switchboard_core::{
    Connection, ConnectionEvent, EventBus, EventKind, EventReceiver, EventSender, PoolResult,
};

use crate::manager::ConnectionManager;
use crate::observer::{ConnectionObserver, ObserverRegistry};
use crate::observers::{HealthObserver, LoggingObserver, MetricsObserver, MetricsSnapshot};
use crate::pool::ConnectionPool;
use crate::provider::ConnectionProvider;
use crate::registry::{ProviderCatalog, ServiceRegistry};

/// Forwards lifecycle events from the observer list onto the event bus.
struct EventBusBridge {
    sender: EventSender,
}

#[async_trait]
impl ConnectionObserver for EventBusBridge {
    fn name(&self) -> &str {
        "event_bus"
    }

    async fn on_connection_event(&self, event: &ConnectionEvent) -> anyhow::Result<()> {
        self.sender.emit(event.clone());
        Ok(())
    }
}

pub struct ConnectionFacade {
    registry: ServiceRegistry,
    manager: ConnectionManager,
    health: Arc<HealthObserver>,
    metrics: Arc<MetricsObserver>,
    logging: Arc<LoggingObserver>,
    event_bus: EventBus,
    initialized: Mutex<bool>,
}

impl ConnectionFacade {
    pub fn new(catalog: ProviderCatalog) -> Self {
        let observers = Arc::new(ObserverRegistry::new());
        let pool = Arc::new(ConnectionPool::new(observers.clone()));
        let manager = ConnectionManager::new(pool, observers);

        Self {
            registry: ServiceRegistry::new(catalog),
            manager,
            health: Arc::new(HealthObserver::new()),
            metrics: Arc::new(MetricsObserver::new()),
            logging: Arc::new(LoggingObserver::new()),
            event_bus: EventBus::new(),
            initialized: Mutex::new(false),
        }
    }

    /// Populate the registry and wire the fixed observers. Idempotent.
    pub async fn initialize(&self) -> PoolResult<()> {
        let mut initialized = self.initialized.lock().await;
        if *initialized {
            return Ok(());
        }

        self.manager.initialize();
        self.registry.initialize()?;

        self.manager.attach_observer(self.logging.clone()).await;
        self.manager.attach_observer(self.metrics.clone()).await;
        self.manager.attach_observer(self.health.clone()).await;
        self.manager
            .attach_observer(Arc::new(EventBusBridge {
                sender: self.event_bus.sender(),
            }))
            .await;

        *initialized = true;
        info!("[Facade] Initialized");
        Ok(())
    }

    /// Close everything and reset the registry. Safe to call again: the
    /// second call finds nothing initialized and returns.
    pub async fn shutdown(&self) {
        let mut initialized = self.initialized.lock().await;
        if !*initialized {
            return;
        }

        self.manager.shutdown().await;
        self.registry.reset();
        *initialized = false;
        info!("[Facade] Shutdown complete");
    }

    async fn ensure_initialized(&self) -> PoolResult<()> {
        self.initialize().await
    }

    /// Register a provider with both the registry and the manager.
    pub async fn register_provider(
        &self,
        service_type: impl Into<String>,
        provider: Arc<dyn ConnectionProvider>,
    ) -> PoolResult<()> {
        self.ensure_initialized().await?;
        let service_type = service_type.into();
        self.registry.register(service_type.clone(), provider.clone());
        self.manager.register_provider(service_type, provider);
        Ok(())
    }

    pub async fn get_provider(&self, service_type: &str) -> Option<Arc<dyn ConnectionProvider>> {
        if self.ensure_initialized().await.is_err() {
            return None;
        }
        self.registry.get_provider(service_type)
    }

    pub async fn get_all_providers(&self) -> HashMap<String, Arc<dyn ConnectionProvider>> {
        if self.ensure_initialized().await.is_err() {
            return HashMap::new();
        }
        self.registry.get_all_providers()
    }

    /// Connect a configured endpoint (the provider's first enabled id when
    /// `connection_id` is `None`). Returns `None` when the service type is
    /// unknown or the provider failed; the failure is logged.
    pub async fn create_connection(
        &self,
        service_type: &str,
        connection_id: Option<&str>,
    ) -> Option<Arc<dyn Connection>> {
        if self.ensure_initialized().await.is_err() {
            return None;
        }
        self.sync_provider_from_registry(service_type);
        self.manager.create_connection(service_type, connection_id).await
    }

    /// Pooled lookup/create without connecting.
    pub async fn get_connection(
        &self,
        service_type: &str,
        connection_id: &str,
    ) -> Option<Arc<dyn Connection>> {
        if self.ensure_initialized().await.is_err() {
            return None;
        }
        self.sync_provider_from_registry(service_type);
        self.manager.get_connection(service_type, connection_id).await
    }

    pub async fn close_connection(&self, service_type: &str, connection_id: &str) {
        if self.ensure_initialized().await.is_err() {
            return;
        }
        self.manager.close_connection(service_type, connection_id).await;
    }

    pub async fn close_all_connections(&self) {
        if self.ensure_initialized().await.is_err() {
            return;
        }
        self.manager.close_all_connections().await;
    }

    pub async fn connection_status(
        &self,
        service_type: &str,
        connection_id: &str,
    ) -> Option<bool> {
        if self.ensure_initialized().await.is_err() {
            return None;
        }
        self.manager.connection_status(service_type, connection_id).await
    }

    /// Health of all connections as last observed by the health observer.
    pub async fn connection_health(&self) -> HashMap<String, bool> {
        if self.ensure_initialized().await.is_err() {
            return HashMap::new();
        }
        self.health.health_status()
    }

    /// Counters accumulated by the metrics observer.
    pub async fn connection_metrics(&self) -> MetricsSnapshot {
        if self.ensure_initialized().await.is_err() {
            return MetricsSnapshot::default();
        }
        self.metrics.snapshot()
    }

    pub async fn attach_observer(&self, observer: Arc<dyn ConnectionObserver>) -> PoolResult<()> {
        self.ensure_initialized().await?;
        self.manager.attach_observer(observer).await;
        Ok(())
    }

    /// Publish an externally-observed lifecycle event (e.g. a health probe
    /// run by scenario code). The service type is read from
    /// `details["service_type"]` when present.
    pub async fn notify_connection_event(
        &self,
        connection_id: &str,
        kind: EventKind,
        details: Option<serde_json::Map<String, serde_json::Value>>,
    ) -> PoolResult<()> {
        self.ensure_initialized().await?;

        let details = details.unwrap_or_default();
        let service_type = details
            .get("service_type")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();

        let event = ConnectionEvent::new(connection_id, service_type, kind).with_details(details);
        self.manager.notify_observers(&event).await;
        Ok(())
    }

    /// Subscribe to the event bus; receives every event published after
    /// this call.
    pub fn subscribe(&self) -> EventReceiver {
        self.event_bus.subscribe()
    }

    pub fn manager(&self) -> &ConnectionManager {
        &self.manager
    }

    pub fn registry(&self) -> &ServiceRegistry {
        &self.registry
    }

    /// The registry owns catalog-built providers; the manager/pool only
    /// know the ones that have been used. Bring them in sync lazily.
    fn sync_provider_from_registry(&self, service_type: &str) {
        if self.manager.get_provider(service_type).is_some() {
            return;
        }
        match self.registry.get_provider(service_type) {
            Some(provider) => self.manager.register_provider(service_type, provider),
            None => {
                warn!(service_type = %service_type, "[Facade] Unknown service type");
            }
        }
    }
}
