//! Error taxonomy for the orchestration core.
//!
//! Three families, matching how far the error travels:
//! - [`ConnectionError`] - scoped to a single endpoint, surfaced to the
//!   immediate caller and never thrown across the pool/manager boundary
//! - [`ConfigError`] - load-time failures, always fail fast
//! - [`PoolError`] - pool/provider surface; `ProviderNotRegistered` marks
//!   a programmer error rather than a transient condition

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors raised by a single connection attempt or probe.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// Connect or health probe exceeded its deadline
    #[error("connection attempt timed out after {0:?}")]
    Timeout(Duration),

    /// Endpoint rejected the credentials
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Endpoint could not be reached
    #[error("endpoint unreachable: {0}")]
    Unreachable(String),

    /// Bounded retry gave up
    #[error("connect failed after {attempts} attempts")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: Box<ConnectionError>,
    },

    /// Underlying transport failure
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),

    /// Service-specific failure that does not fit the categories above
    #[error("{0}")]
    Other(String),
}

/// Load-time configuration failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required per-endpoint field is absent. Never silently defaulted.
    #[error("missing required field '{field}' for connection '{connection_id}'")]
    MissingField {
        connection_id: String,
        field: String,
    },

    /// Service type has no configuration section
    #[error("unknown service type: {0}")]
    UnknownService(String),

    /// Document did not parse as a configuration
    #[error("failed to parse configuration '{name}'")]
    Parse {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    /// Document could not be read
    #[error("failed to read configuration at {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors surfaced by the pool and provider operations.
#[derive(Debug, Error)]
pub enum PoolError {
    /// No provider was registered for the service type. This indicates a
    /// misuse of the API, not a transient condition.
    #[error("no provider registered for service type: {0}")]
    ProviderNotRegistered(String),

    /// Connection id is not in the provider's configured set
    #[error("no connection configured with id: {0}")]
    NotFound(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Connection(#[from] ConnectionError),
}

pub type PoolResult<T> = Result<T, PoolError>;
