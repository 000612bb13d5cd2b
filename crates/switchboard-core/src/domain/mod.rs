//! Domain model: lifecycle events and typed configuration.

pub mod config;
pub mod event;

pub use config::{EndpointConfig, HarnessConfig, ServiceConfig};
pub use event::{ConnectionEvent, ConnectionState, EventKind};
