//! # Switchboard Core Library
//!
//! Connection contract, lifecycle events, and configuration model for the
//! Switchboard test harness.
//!
//! ## Modules
//!
//! - `connection` - The `Connection` capability trait and lifecycle states
//! - `domain` - Event model and typed configuration
//! - `error` - Error taxonomy (connection, configuration, pool)
//! - `event_bus` - Broadcast distribution of connection events
//! - `loader` - Configuration document loader
//! - `retry` - Bounded exponential backoff for connect attempts

pub mod connection;
pub mod domain;
pub mod error;
pub mod event_bus;
pub mod loader;
pub mod retry;

// Re-export commonly used types
pub use connection::Connection;
pub use domain::*;
pub use error::{ConfigError, ConnectionError, PoolError, PoolResult};
pub use event_bus::{EventBus, EventReceiver, EventSender, SharedEventBus};
pub use loader::ConfigLoader;
pub use retry::{connect_with_retry, RetryPolicy};
