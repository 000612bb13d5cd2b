//! Connection lifecycle events.
//!
//! Every state change the pool makes is represented as a [`ConnectionEvent`].
//! Events are facts that happened: immutable once constructed, cloned to
//! every observer, never mutated after publish.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Process-wide monotonic stamp so a notification round can be ordered
/// even when two events share a wall-clock timestamp.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

fn next_seq() -> u64 {
    EVENT_SEQ.fetch_add(1, Ordering::Relaxed)
}

/// Lifecycle state of a single connection handle.
///
/// `Disconnected -> Connecting -> Connected`, back to `Disconnected` on
/// close. Any state may fall to `Failed` on an unrecoverable connect error;
/// `Failed` is terminal for that instance - callers discard and recreate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Failed,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Failed => "failed",
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }

    /// Terminal for the instance: the handle must be recreated, not retried.
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed)
    }
}

/// Kind of lifecycle transition an event records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Connection was created and entered the pool
    Created,
    /// Connection was closed and left the pool
    Closed,
    /// Connection hit an unrecoverable error
    Error,
    /// Health probe completed (outcome in `details["healthy"]`)
    HealthCheck,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Closed => "closed",
            Self::Error => "error",
            Self::HealthCheck => "health_check",
        }
    }
}

/// One lifecycle transition, delivered by value to every observer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionEvent {
    pub connection_id: String,
    pub service_type: String,
    pub kind: EventKind,
    /// Free-form payload (error text, probe outcome, ...)
    #[serde(default)]
    pub details: serde_json::Map<String, serde_json::Value>,
    pub timestamp: DateTime<Utc>,
    /// Monotonically increasing publication stamp
    pub seq: u64,
}

impl ConnectionEvent {
    pub fn new(
        connection_id: impl Into<String>,
        service_type: impl Into<String>,
        kind: EventKind,
    ) -> Self {
        Self {
            connection_id: connection_id.into(),
            service_type: service_type.into(),
            kind,
            details: serde_json::Map::new(),
            timestamp: Utc::now(),
            seq: next_seq(),
        }
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.details.insert(key.into(), value);
        self
    }

    pub fn with_details(mut self, details: serde_json::Map<String, serde_json::Value>) -> Self {
        self.details = details;
        self
    }

    pub fn detail(&self, key: &str) -> Option<&serde_json::Value> {
        self.details.get(key)
    }
}
