//! # Switchboard Pool
//!
//! Connection orchestration for the test harness:
//!
//! - **ConnectionFactory / ConnectionProvider**: per-service creation seam
//!   and the provider contract (configuration + connection cache)
//! - **ServiceRegistry**: lazily-initialized table of one provider per
//!   service type, resettable for scenario isolation
//! - **ConnectionPool**: single authoritative store of live connections,
//!   keyed by (service type, connection id), with per-key creation locks
//! - **ConnectionManager**: orchestration boundary - provider registration,
//!   pool access, observer fan-out
//! - **Observers**: health, metrics, and logging read models derived from
//!   lifecycle events
//! - **ConnectionFacade**: one initialization/shutdown unit composing all
//!   of the above

mod facade;
mod manager;
mod observer;
mod observers;
mod pool;
mod provider;
mod registry;

pub use facade::ConnectionFacade;
pub use manager::ConnectionManager;
pub use observer::{ConnectionObserver, ObserverRegistry};
pub use observers::{
    ConnectionCounters, EventCounters, HealthObserver, LoggingObserver, MetricsObserver,
    MetricsSnapshot,
};
pub use pool::ConnectionPool;
pub use provider::{ConnectionFactory, ConnectionProvider, ServiceProvider};
pub use registry::{ProviderBuilder, ProviderCatalog, ServiceRegistry};
