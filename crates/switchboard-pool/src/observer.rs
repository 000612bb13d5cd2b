//! Observer contract and fan-out.
//!
//! Delivery is best-effort: the observer list snapshot is taken under the
//! registry lock, the fan-out happens outside it, and one observer's error
//! is logged without aborting the round or failing the publisher.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use tokio::sync::Mutex;
use tracing::{debug, error};

use switchboard_core::ConnectionEvent;

/// A component subscribed to connection lifecycle events.
///
/// Handlers own their derived state and must tolerate events for
/// connection ids they have never seen before.
#[async_trait]
pub trait ConnectionObserver: Send + Sync {
    /// Stable name for logging
    fn name(&self) -> &str;

    async fn on_connection_event(&self, event: &ConnectionEvent) -> anyhow::Result<()>;
}

/// The subject side of the observer pattern, shared by the pool and the
/// manager so both publish through the same list.
#[derive(Default)]
pub struct ObserverRegistry {
    observers: Mutex<Vec<Arc<dyn ConnectionObserver>>>,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach an observer for subsequent notification rounds.
    /// Re-attaching the same instance is a no-op.
    pub async fn attach(&self, observer: Arc<dyn ConnectionObserver>) {
        let mut observers = self.observers.lock().await;
        if !observers.iter().any(|o| Arc::ptr_eq(o, &observer)) {
            debug!(observer = observer.name(), "[Observers] Attached");
            observers.push(observer);
        }
    }

    pub async fn detach(&self, observer: &Arc<dyn ConnectionObserver>) {
        let mut observers = self.observers.lock().await;
        observers.retain(|o| !Arc::ptr_eq(o, observer));
    }

    pub async fn len(&self) -> usize {
        self.observers.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.observers.lock().await.is_empty()
    }

    /// Drop every observer (shutdown).
    pub async fn clear(&self) {
        self.observers.lock().await.clear();
    }

    /// Deliver an event to every observer attached at the start of the
    /// round. Observers attached concurrently see the next round.
    pub async fn notify(&self, event: &ConnectionEvent) {
        let snapshot = self.observers.lock().await.clone();
        debug!(
            observers = snapshot.len(),
            connection_id = %event.connection_id,
            kind = event.kind.as_str(),
            "[Observers] Notifying"
        );

        join_all(snapshot.iter().map(|observer| async move {
            if let Err(e) = observer.on_connection_event(event).await {
                error!(
                    observer = observer.name(),
                    connection_id = %event.connection_id,
                    error = %e,
                    "[Observers] Observer failed to handle event"
                );
            }
        }))
        .await;
    }
}
