//! The connection capability contract.
//!
//! Each external service implements [`Connection`] once; everything above
//! this trait (provider, pool, manager) is service-agnostic. Connect and
//! disconnect are the only core operations permitted to block on real I/O.

use async_trait::async_trait;

use crate::domain::ConnectionState;
use crate::error::ConnectionError;

/// A capability-typed handle to one external endpoint.
///
/// Contract:
/// - `connect` is a no-op when already `Connected`; on failure it leaves
///   the state `Failed` and surfaces a [`ConnectionError`]
/// - `disconnect` is safe from any state, always ends `Disconnected`, and
///   never errors on a connection that was never established
/// - `health_check` is a non-mutating probe and never errors; internal
///   failures are reported as `false`
#[async_trait]
pub trait Connection: Send + Sync + std::fmt::Debug {
    /// Service type tag this connection belongs to
    fn service_type(&self) -> &str;

    /// Connection id, unique within the service type
    fn connection_id(&self) -> &str;

    /// Current lifecycle state
    fn state(&self) -> ConnectionState;

    fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    /// Establish the underlying link.
    async fn connect(&self) -> Result<(), ConnectionError>;

    /// Release underlying resources.
    async fn disconnect(&self);

    /// Probe the endpoint; `false` on any internal error.
    async fn health_check(&self) -> bool;
}
