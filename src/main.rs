//! PULSSI demo - stream a simulated circuit's health over SSE
//!
//! Runs a toy circuit breaker that produces one snapshot per second and
//! serves its telemetry stream on HTTP.
//!
//! ```bash
//! cargo run
//! curl -N http://localhost:9090/circuit.stream
//! ```
//!
//! ## Environment Variables
//!
//! - `PULSSI_HTTP_PORT`: HTTP port for the stream server (default: 9090)
//! - `PULSSI_QUEUE_CAPACITY`: source queue capacity (default: 10000)
//! - `PULSSI_OVERFLOW_POLICY`: `drop-oldest` or `unbounded`

use parking_lot::Mutex;
use pulssi::http::StreamServer;
use pulssi::{
    Circuit, CircuitIdentity, DashboardFormatter, Snapshot, SnapshotCallback, StreamConfig,
    SubscriptionId, TelemetryStream,
};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Toy circuit breaker that records simulated call outcomes
struct DemoBreaker {
    identity: Mutex<CircuitIdentity>,
    successes: AtomicU64,
    failures: AtomicU64,
    callbacks: Mutex<HashMap<u64, SnapshotCallback>>,
    next_id: AtomicU64,
}

impl DemoBreaker {
    fn new(name: &str, group: &str) -> Self {
        Self {
            identity: Mutex::new(CircuitIdentity {
                name: name.to_string(),
                closed: true,
                group: group.to_string(),
                options: Map::new(),
            }),
            successes: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            callbacks: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(0),
        }
    }

    fn record(&self, success: bool) {
        if success {
            self.successes.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Produce one snapshot window and deliver it to subscribers
    fn publish_snapshot(&self) {
        let snapshot = Snapshot::new()
            .with("successes", self.successes.swap(0, Ordering::Relaxed))
            .with("failures", self.failures.swap(0, Ordering::Relaxed));

        let callbacks = self.callbacks.lock();
        for cb in callbacks.values() {
            cb(&snapshot);
        }
    }

    fn set_closed(&self, closed: bool) {
        self.identity.lock().closed = closed;
    }
}

impl Circuit for DemoBreaker {
    fn name(&self) -> String {
        self.identity.lock().name.clone()
    }

    fn is_closed(&self) -> bool {
        self.identity.lock().closed
    }

    fn group(&self) -> String {
        self.identity.lock().group.clone()
    }

    fn options(&self) -> Map<String, Value> {
        self.identity.lock().options.clone()
    }

    fn subscribe(&self, callback: SnapshotCallback) -> SubscriptionId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.callbacks.lock().insert(id, callback);
        SubscriptionId(id)
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.callbacks.lock().remove(&id.0);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = StreamConfig::from_env()?;
    let port = std::env::var("PULSSI_HTTP_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(9090);

    let circuit = Arc::new(DemoBreaker::new("demo-service", "demo"));
    let telemetry =
        TelemetryStream::with_config(&circuit, Arc::new(DashboardFormatter), config.clone());

    let server = StreamServer::start(port, telemetry.stream()?);
    info!(
        port = port,
        capacity = config.capacity,
        "PULSSI demo started, stream at /circuit.stream"
    );

    let mut interval = tokio::time::interval(Duration::from_secs(1));
    let mut tick: u64 = 0;

    loop {
        tokio::select! {
            _ = interval.tick() => {
                tick += 1;
                // Simulated traffic: mostly healthy, a bad patch every so often.
                let failing = tick % 20 >= 15;
                circuit.set_closed(!failing);
                for call in 0..10u64 {
                    circuit.record(!failing || call % 3 == 0);
                }
                circuit.publish_snapshot();
            }
            _ = signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down");
                break;
            }
        }
    }

    telemetry.detach();
    server.abort();
    info!("PULSSI demo shutdown complete");
    Ok(())
}
