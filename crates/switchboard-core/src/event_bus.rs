//! Event Bus - broadcast distribution of connection events
//!
//! The trait-based observers owned by the manager are the authoritative
//! delivery path for lifecycle events; the bus is the decoupled surface for
//! consumers that want to tail events without registering an observer
//! (scenario assertions, ad-hoc diagnostics). Each subscriber gets its own
//! copy of every event emitted after subscription.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::domain::ConnectionEvent;

/// Default channel capacity for the event bus
const DEFAULT_CAPACITY: usize = 256;

/// Central hub for connection event distribution.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<ConnectionEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Get a sender for emitting events. Cheaply cloneable.
    pub fn sender(&self) -> EventSender {
        EventSender::new(self.sender.clone())
    }

    /// Subscribe to receive events emitted after this call.
    pub fn subscribe(&self) -> EventReceiver {
        EventReceiver::new(self.sender.subscribe())
    }

    /// Number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Used by the facade to emit connection events onto the bus.
#[derive(Clone)]
pub struct EventSender {
    sender: broadcast::Sender<ConnectionEvent>,
}

impl EventSender {
    fn new(sender: broadcast::Sender<ConnectionEvent>) -> Self {
        Self { sender }
    }

    /// Emit an event. Returns the number of receivers that got it;
    /// zero subscribers is not an error.
    pub fn emit(&self, event: ConnectionEvent) -> usize {
        let kind = event.kind;
        match self.sender.send(event) {
            Ok(count) => {
                debug!(kind = kind.as_str(), receivers = count, "[EventBus] Emitted event");
                count
            }
            Err(_) => {
                debug!(kind = kind.as_str(), "[EventBus] No receivers for event");
                0
            }
        }
    }

    pub fn has_subscribers(&self) -> bool {
        self.sender.receiver_count() > 0
    }
}

/// Receiving end of the bus. Handles lag by logging and continuing.
pub struct EventReceiver {
    receiver: broadcast::Receiver<ConnectionEvent>,
}

impl EventReceiver {
    fn new(receiver: broadcast::Receiver<ConnectionEvent>) -> Self {
        Self { receiver }
    }

    /// Receive the next event; `None` once the channel is closed.
    pub async fn recv(&mut self) -> Option<ConnectionEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(
                        skipped_events = skipped,
                        "[EventBus] Receiver lagged, skipped {} events", skipped
                    );
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("[EventBus] Channel closed");
                    return None;
                }
            }
        }
    }

    /// Receive without blocking.
    pub fn try_recv(&mut self) -> Option<ConnectionEvent> {
        match self.receiver.try_recv() {
            Ok(event) => Some(event),
            Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                warn!(skipped_events = skipped, "[EventBus] Receiver lagged on try_recv");
                self.receiver.try_recv().ok()
            }
            Err(_) => None,
        }
    }
}

/// Shared event bus for harness-wide use.
pub type SharedEventBus = Arc<EventBus>;
