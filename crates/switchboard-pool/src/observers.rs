//! Reference observers: health, metrics, and logging.
//!
//! Each observer keeps its own process-wide read model, mutated only
//! inside its event handler and readable by any caller at any time as an
//! eventually-consistent snapshot.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tracing::{debug, info};

use switchboard_core::{ConnectionEvent, EventKind};

use crate::observer::ConnectionObserver;

// ============================================================================
// HealthObserver
// ============================================================================

/// Tracks the last known health of each connection id.
///
/// `created` -> healthy, `closed`/`error` -> unhealthy, `health_check` ->
/// the probe outcome from `details["healthy"]`.
#[derive(Default)]
pub struct HealthObserver {
    status: RwLock<HashMap<String, bool>>,
}

impl HealthObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of connection id -> healthy flag
    pub fn health_status(&self) -> HashMap<String, bool> {
        self.status.read().clone()
    }

    pub fn is_healthy(&self, connection_id: &str) -> Option<bool> {
        self.status.read().get(connection_id).copied()
    }
}

#[async_trait]
impl ConnectionObserver for HealthObserver {
    fn name(&self) -> &str {
        "health"
    }

    async fn on_connection_event(&self, event: &ConnectionEvent) -> anyhow::Result<()> {
        let healthy = match event.kind {
            EventKind::Created => true,
            EventKind::Closed | EventKind::Error => false,
            EventKind::HealthCheck => event
                .detail("healthy")
                .and_then(|v| v.as_bool())
                .unwrap_or(false),
        };
        self.status
            .write()
            .insert(event.connection_id.clone(), healthy);
        Ok(())
    }
}

// ============================================================================
// MetricsObserver
// ============================================================================

/// Connection-level counters.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct ConnectionCounters {
    pub total: u64,
    pub active: u64,
    pub failed: u64,
}

/// Event-level counters.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct EventCounters {
    pub created: u64,
    pub closed: u64,
    pub error: u64,
    pub health_check: u64,
}

/// Point-in-time copy of everything the metrics observer has counted.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MetricsSnapshot {
    pub connections: ConnectionCounters,
    pub events: EventCounters,
    /// Per-connection event kind counts, lazily initialized per id
    pub per_connection: HashMap<String, HashMap<&'static str, u64>>,
}

/// Counts lifecycle events.
///
/// Invariants: after N `created` and M `closed` events for distinct ids,
/// `active == N - M` and `total == N`.
#[derive(Default)]
pub struct MetricsObserver {
    state: Mutex<MetricsSnapshot>,
}

impl MetricsObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        self.state.lock().clone()
    }
}

#[async_trait]
impl ConnectionObserver for MetricsObserver {
    fn name(&self) -> &str {
        "metrics"
    }

    async fn on_connection_event(&self, event: &ConnectionEvent) -> anyhow::Result<()> {
        let mut state = self.state.lock();

        match event.kind {
            EventKind::Created => {
                state.connections.total += 1;
                state.connections.active += 1;
                state.events.created += 1;
            }
            EventKind::Closed => {
                state.connections.active = state.connections.active.saturating_sub(1);
                state.events.closed += 1;
            }
            EventKind::Error => {
                state.connections.failed += 1;
                state.events.error += 1;
            }
            EventKind::HealthCheck => {
                state.events.health_check += 1;
            }
        }

        let counts = state
            .per_connection
            .entry(event.connection_id.clone())
            .or_default();
        *counts.entry(event.kind.as_str()).or_insert(0) += 1;

        Ok(())
    }
}

// ============================================================================
// LoggingObserver
// ============================================================================

/// Writes one structured log line per lifecycle event.
#[derive(Default)]
pub struct LoggingObserver;

impl LoggingObserver {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ConnectionObserver for LoggingObserver {
    fn name(&self) -> &str {
        "logging"
    }

    async fn on_connection_event(&self, event: &ConnectionEvent) -> anyhow::Result<()> {
        info!(
            connection_id = %event.connection_id,
            service_type = %event.service_type,
            kind = event.kind.as_str(),
            seq = event.seq,
            timestamp = %event.timestamp,
            "[LoggingObserver] Connection event"
        );
        if !event.details.is_empty() {
            debug!(
                connection_id = %event.connection_id,
                details = %serde_json::Value::Object(event.details.clone()),
                "[LoggingObserver] Event details"
            );
        }
        Ok(())
    }
}
