//! Observer tests: registry fan-out, health and metrics read models.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use tests::init_tracing;
use tests::mocks::{FailingObserver, RecordingObserver};

use switchboard_core::{ConnectionEvent, EventKind};
use switchboard_pool::{
    ConnectionObserver, HealthObserver, MetricsObserver, ObserverRegistry,
};

fn event(connection_id: &str, kind: EventKind) -> ConnectionEvent {
    ConnectionEvent::new(connection_id, "db", kind)
}

// ============================================================================
// ObserverRegistry
// ============================================================================

#[tokio::test]
async fn attach_is_idempotent_per_instance() {
    let registry = ObserverRegistry::new();
    let observer = Arc::new(RecordingObserver::new());

    registry.attach(observer.clone()).await;
    registry.attach(observer.clone()).await;
    assert_eq!(registry.len().await, 1);

    registry.notify(&event("primary", EventKind::Created)).await;
    assert_eq!(observer.events().len(), 1);
}

#[tokio::test]
async fn detach_stops_delivery() {
    let registry = ObserverRegistry::new();
    let observer = Arc::new(RecordingObserver::new());
    let handle: Arc<dyn ConnectionObserver> = observer.clone();

    registry.attach(handle.clone()).await;
    registry.detach(&handle).await;
    assert!(registry.is_empty().await);

    registry.notify(&event("primary", EventKind::Created)).await;
    assert!(observer.events().is_empty());
}

#[tokio::test]
async fn failing_observer_does_not_starve_the_others() {
    init_tracing();
    let registry = ObserverRegistry::new();
    let recording = Arc::new(RecordingObserver::new());

    registry.attach(Arc::new(FailingObserver)).await;
    registry.attach(recording.clone()).await;

    registry.notify(&event("primary", EventKind::Created)).await;
    registry.notify(&event("primary", EventKind::Closed)).await;

    assert_eq!(
        recording.kinds(),
        vec![EventKind::Created, EventKind::Closed]
    );
}

// ============================================================================
// HealthObserver
// ============================================================================

#[tokio::test]
async fn health_follows_the_lifecycle() {
    let health = HealthObserver::new();

    health
        .on_connection_event(&event("primary", EventKind::Created))
        .await
        .unwrap();
    assert_eq!(health.is_healthy("primary"), Some(true));

    health
        .on_connection_event(&event("primary", EventKind::Error))
        .await
        .unwrap();
    assert_eq!(health.is_healthy("primary"), Some(false));

    health
        .on_connection_event(&event("primary", EventKind::Closed))
        .await
        .unwrap();
    assert_eq!(health.is_healthy("primary"), Some(false));

    assert_eq!(health.is_healthy("never-seen"), None);
}

#[tokio::test]
async fn health_check_events_report_the_probe_outcome() {
    let health = HealthObserver::new();

    let probe_up = event("primary", EventKind::HealthCheck)
        .with_detail("healthy", serde_json::Value::Bool(true));
    health.on_connection_event(&probe_up).await.unwrap();
    assert_eq!(health.is_healthy("primary"), Some(true));

    let probe_down = event("primary", EventKind::HealthCheck)
        .with_detail("healthy", serde_json::Value::Bool(false));
    health.on_connection_event(&probe_down).await.unwrap();
    assert_eq!(health.is_healthy("primary"), Some(false));

    // Probe without an outcome counts as unhealthy
    let probe_silent = event("replica", EventKind::HealthCheck);
    health.on_connection_event(&probe_silent).await.unwrap();
    assert_eq!(health.is_healthy("replica"), Some(false));
}

#[tokio::test]
async fn health_status_tracks_each_connection_independently() {
    let health = HealthObserver::new();

    health
        .on_connection_event(&event("primary", EventKind::Created))
        .await
        .unwrap();
    health
        .on_connection_event(&event("replica", EventKind::Created))
        .await
        .unwrap();
    health
        .on_connection_event(&event("replica", EventKind::Error))
        .await
        .unwrap();

    let status = health.health_status();
    assert_eq!(status.get("primary"), Some(&true));
    assert_eq!(status.get("replica"), Some(&false));
}

// ============================================================================
// MetricsObserver
// ============================================================================

#[tokio::test]
async fn created_minus_closed_equals_active() {
    let metrics = MetricsObserver::new();

    for id in ["a", "b", "c"] {
        metrics
            .on_connection_event(&event(id, EventKind::Created))
            .await
            .unwrap();
    }
    metrics
        .on_connection_event(&event("a", EventKind::Closed))
        .await
        .unwrap();

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.connections.total, 3);
    assert_eq!(snapshot.connections.active, 2);
    assert_eq!(snapshot.events.created, 3);
    assert_eq!(snapshot.events.closed, 1);
}

#[tokio::test]
async fn active_never_goes_negative() {
    let metrics = MetricsObserver::new();

    metrics
        .on_connection_event(&event("a", EventKind::Closed))
        .await
        .unwrap();

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.connections.active, 0);
    assert_eq!(snapshot.events.closed, 1);
}

#[tokio::test]
async fn errors_and_probes_are_counted_separately() {
    let metrics = MetricsObserver::new();

    metrics
        .on_connection_event(&event("a", EventKind::Created))
        .await
        .unwrap();
    metrics
        .on_connection_event(&event("a", EventKind::Error))
        .await
        .unwrap();
    metrics
        .on_connection_event(&event("a", EventKind::HealthCheck))
        .await
        .unwrap();

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.connections.failed, 1);
    assert_eq!(snapshot.events.error, 1);
    assert_eq!(snapshot.events.health_check, 1);
    // Errors do not retire the connection
    assert_eq!(snapshot.connections.active, 1);
}

#[tokio::test]
async fn per_connection_counts_are_keyed_by_id_and_kind() {
    let metrics = MetricsObserver::new();

    metrics
        .on_connection_event(&event("a", EventKind::Created))
        .await
        .unwrap();
    metrics
        .on_connection_event(&event("a", EventKind::Closed))
        .await
        .unwrap();
    metrics
        .on_connection_event(&event("b", EventKind::Created))
        .await
        .unwrap();

    let snapshot = metrics.snapshot();
    let a = &snapshot.per_connection["a"];
    assert_eq!(a.get("created"), Some(&1));
    assert_eq!(a.get("closed"), Some(&1));
    let b = &snapshot.per_connection["b"];
    assert_eq!(b.get("created"), Some(&1));
    assert_eq!(b.get("closed"), None);
}
