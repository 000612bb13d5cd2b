//! Service registry - one provider instance per service type.
//!
//! Explicitly constructed (no process global): each harness owns its own
//! registry, built from a catalog of provider builders, so scenarios can
//! run isolated instances in parallel. The registry answers "which provider
//! exists for this type"; the pool answers "which connections are live".

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use switchboard_core::PoolResult;

use crate::provider::ConnectionProvider;

/// Builds one provider instance at registry initialization.
pub type ProviderBuilder = Box<dyn Fn() -> PoolResult<Arc<dyn ConnectionProvider>> + Send + Sync>;

/// The set of service types a harness knows how to construct providers for.
#[derive(Default)]
pub struct ProviderCatalog {
    builders: Vec<(String, ProviderBuilder)>,
}

impl ProviderCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builder<F>(mut self, service_type: impl Into<String>, builder: F) -> Self
    where
        F: Fn() -> PoolResult<Arc<dyn ConnectionProvider>> + Send + Sync + 'static,
    {
        self.builders.push((service_type.into(), Box::new(builder)));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.builders.is_empty()
    }
}

struct RegistryState {
    providers: HashMap<String, Arc<dyn ConnectionProvider>>,
    initialized: bool,
}

/// Lazily-initialized provider table.
pub struct ServiceRegistry {
    catalog: ProviderCatalog,
    state: Mutex<RegistryState>,
}

impl ServiceRegistry {
    pub fn new(catalog: ProviderCatalog) -> Self {
        Self {
            catalog,
            state: Mutex::new(RegistryState {
                providers: HashMap::new(),
                initialized: false,
            }),
        }
    }

    /// Instantiate every catalog builder once. Idempotent.
    pub fn initialize(&self) -> PoolResult<()> {
        let mut state = self.state.lock();
        if state.initialized {
            return Ok(());
        }

        for (service_type, builder) in &self.catalog.builders {
            let provider = builder()?;
            debug!(service_type = %service_type, "[Registry] Provider constructed");
            state.providers.insert(service_type.clone(), provider);
        }
        state.initialized = true;

        info!(
            providers = state.providers.len(),
            "[Registry] Initialized"
        );
        Ok(())
    }

    /// Look up a provider, lazily initializing the registry on first use.
    pub fn get_provider(&self, service_type: &str) -> Option<Arc<dyn ConnectionProvider>> {
        if let Err(e) = self.initialize() {
            warn!(error = %e, "[Registry] Lazy initialization failed");
            return None;
        }
        self.state.lock().providers.get(service_type).cloned()
    }

    /// Defensive snapshot of the provider table.
    pub fn get_all_providers(&self) -> HashMap<String, Arc<dyn ConnectionProvider>> {
        if let Err(e) = self.initialize() {
            warn!(error = %e, "[Registry] Lazy initialization failed");
            return HashMap::new();
        }
        self.state.lock().providers.clone()
    }

    /// Register or replace a provider for a service type.
    pub fn register(&self, service_type: impl Into<String>, provider: Arc<dyn ConnectionProvider>) {
        let service_type = service_type.into();
        let mut state = self.state.lock();
        if state.providers.insert(service_type.clone(), provider).is_some() {
            debug!(service_type = %service_type, "[Registry] Provider replaced");
        }
    }

    pub fn unregister(&self, service_type: &str) {
        self.state.lock().providers.remove(service_type);
    }

    /// Clear the table and the initialized flag. For scenario isolation,
    /// not for use during live traffic.
    pub fn reset(&self) {
        let mut state = self.state.lock();
        state.providers.clear();
        state.initialized = false;
        info!("[Registry] Reset");
    }

    pub fn is_initialized(&self) -> bool {
        self.state.lock().initialized
    }
}
