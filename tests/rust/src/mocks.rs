//! Mock connections, factories, and observers for fast, isolated tests.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};

use switchboard_core::{
    Connection, ConnectionError, ConnectionEvent, ConnectionState, EndpointConfig, EventKind,
    RetryPolicy, ServiceConfig,
};
use switchboard_pool::{ConnectionFactory, ConnectionObserver, ServiceProvider};

// ============================================================================
// MockConnection
// ============================================================================

/// In-memory connection with scriptable connect behavior.
#[derive(Debug)]
pub struct MockConnection {
    service_type: String,
    connection_id: String,
    state: RwLock<ConnectionState>,
    connect_calls: AtomicU32,
    fail_connect: bool,
    connect_delay: Option<Duration>,
}

impl MockConnection {
    pub fn new(service_type: impl Into<String>, connection_id: impl Into<String>) -> Self {
        Self {
            service_type: service_type.into(),
            connection_id: connection_id.into(),
            state: RwLock::new(ConnectionState::Disconnected),
            connect_calls: AtomicU32::new(0),
            fail_connect: false,
            connect_delay: None,
        }
    }

    pub fn failing(mut self) -> Self {
        self.fail_connect = true;
        self
    }

    pub fn with_connect_delay(mut self, delay: Duration) -> Self {
        self.connect_delay = Some(delay);
        self
    }

    pub fn connect_calls(&self) -> u32 {
        self.connect_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connection for MockConnection {
    fn service_type(&self) -> &str {
        &self.service_type
    }

    fn connection_id(&self) -> &str {
        &self.connection_id
    }

    fn state(&self) -> ConnectionState {
        *self.state.read()
    }

    async fn connect(&self) -> Result<(), ConnectionError> {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);

        if self.is_connected() {
            return Ok(());
        }
        *self.state.write() = ConnectionState::Connecting;

        if let Some(delay) = self.connect_delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail_connect {
            *self.state.write() = ConnectionState::Failed;
            return Err(ConnectionError::Unreachable("mock endpoint down".into()));
        }

        *self.state.write() = ConnectionState::Connected;
        Ok(())
    }

    async fn disconnect(&self) {
        *self.state.write() = ConnectionState::Disconnected;
    }

    async fn health_check(&self) -> bool {
        self.is_connected()
    }
}

// ============================================================================
// MockFactory
// ============================================================================

/// Factory producing [`MockConnection`]s, recording every build.
#[derive(Debug)]
pub struct MockFactory {
    service_type: String,
    required: Vec<&'static str>,
    fail_build: bool,
    fail_connect_ids: Vec<String>,
    connect_delay: Option<Duration>,
    built: Mutex<Vec<String>>,
}

impl MockFactory {
    pub fn new(service_type: impl Into<String>) -> Self {
        Self {
            service_type: service_type.into(),
            required: Vec::new(),
            fail_build: false,
            fail_connect_ids: Vec::new(),
            connect_delay: None,
            built: Mutex::new(Vec::new()),
        }
    }

    pub fn with_required(mut self, fields: &[&'static str]) -> Self {
        self.required = fields.to_vec();
        self
    }

    pub fn failing_build(mut self) -> Self {
        self.fail_build = true;
        self
    }

    /// Connections for these ids will fail to connect.
    pub fn failing_connect(mut self, ids: &[&str]) -> Self {
        self.fail_connect_ids = ids.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_connect_delay(mut self, delay: Duration) -> Self {
        self.connect_delay = Some(delay);
        self
    }

    /// Ids built so far, in order.
    pub fn built(&self) -> Vec<String> {
        self.built.lock().clone()
    }

    pub fn build_count(&self) -> usize {
        self.built.lock().len()
    }
}

#[async_trait]
impl ConnectionFactory for MockFactory {
    fn service_type(&self) -> &str {
        &self.service_type
    }

    fn required_fields(&self) -> &[&str] {
        &self.required
    }

    async fn build(
        &self,
        endpoint: &EndpointConfig,
    ) -> Result<Arc<dyn Connection>, ConnectionError> {
        if self.fail_build {
            return Err(ConnectionError::Other("factory refused".into()));
        }
        self.built.lock().push(endpoint.name.clone());

        let mut conn = MockConnection::new(&self.service_type, &endpoint.name);
        if self.fail_connect_ids.contains(&endpoint.name) {
            conn = conn.failing();
        }
        if let Some(delay) = self.connect_delay {
            conn = conn.with_connect_delay(delay);
        }
        Ok(Arc::new(conn))
    }
}

// ============================================================================
// Observers
// ============================================================================

/// Records every delivered event for later assertions.
#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<ConnectionEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ConnectionEvent> {
        self.events.lock().clone()
    }

    pub fn kinds(&self) -> Vec<EventKind> {
        self.events.lock().iter().map(|e| e.kind).collect()
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.events.lock().iter().filter(|e| e.kind == kind).count()
    }
}

#[async_trait]
impl ConnectionObserver for RecordingObserver {
    fn name(&self) -> &str {
        "recording"
    }

    async fn on_connection_event(&self, event: &ConnectionEvent) -> anyhow::Result<()> {
        self.events.lock().push(event.clone());
        Ok(())
    }
}

/// Always errors; used to prove fan-out isolation.
pub struct FailingObserver;

#[async_trait]
impl ConnectionObserver for FailingObserver {
    fn name(&self) -> &str {
        "failing"
    }

    async fn on_connection_event(&self, _event: &ConnectionEvent) -> anyhow::Result<()> {
        anyhow::bail!("observer blew up")
    }
}

// ============================================================================
// Fixtures
// ============================================================================

/// Service config with one enabled endpoint per name, each carrying a
/// `host` parameter.
pub fn service_config(names: &[&str]) -> ServiceConfig {
    ServiceConfig::new(
        names
            .iter()
            .map(|name| {
                EndpointConfig::new(*name).with_param(
                    "host",
                    serde_json::Value::String(format!("{}.example.com", name)),
                )
            })
            .collect(),
    )
}

/// Provider over `factory` with test-friendly retry/timeout settings.
pub fn provider(factory: Arc<MockFactory>, names: &[&str]) -> ServiceProvider {
    ServiceProvider::from_config(factory, &service_config(names))
        .expect("provider config should load")
        .with_retry_policy(RetryPolicy::no_retry())
        .with_connect_timeout(Duration::from_secs(5))
}
