//! Public stream handle
//!
//! [`TelemetryStream`] wires the whole pipeline together: it subscribes to
//! the circuit at construction and hands out the outbound chunk sequence
//! through [`stream`]. One instance per monitored circuit, living as long
//! as the circuit does.
//!
//! ```text
//! Circuit ──snapshot──► Listener ──► SourceQueue ──► FormatStage ──► chunks
//!            (push)      (merge)      (FIFO)          (SSE frame)
//! ```
//!
//! [`stream`]: TelemetryStream::stream

use crate::circuit::Circuit;
use crate::config::StreamConfig;
use crate::error::{FormatError, Result, TelemetryError};
use crate::format::{DashboardFormatter, FormatStage, Formatter};
use crate::listener::SnapshotListener;
use crate::source::{self, RecordStream, SourceHandle};
use bytes::Bytes;
use futures::stream::Stream;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::info;

/// One circuit's telemetry stream
///
/// Created with [`attach`], which registers exactly one snapshot
/// subscription on the circuit. The subscription is never torn down
/// implicitly; hosts with a teardown point should call [`detach`], others
/// accept the subscription outliving the stream (it holds only a weak
/// circuit reference, so it cannot keep the circuit alive).
///
/// # Example
///
/// ```ignore
/// let circuit = Arc::new(MyBreaker::new("payments"));
/// let telemetry = TelemetryStream::attach(&circuit);
///
/// let chunks = telemetry.stream()?;
/// // pipe `chunks` into an HTTP response body, see `http::sse_response`
/// ```
///
/// [`attach`]: TelemetryStream::attach
/// [`detach`]: TelemetryStream::detach
pub struct TelemetryStream {
    records: Mutex<Option<RecordStream>>,
    intake: SourceHandle,
    stage: FormatStage,
    unsubscribe: Box<dyn Fn() + Send + Sync>,
}

impl TelemetryStream {
    /// Attach to a circuit with the dashboard formatter and default config
    pub fn attach<C: Circuit>(circuit: &Arc<C>) -> Self {
        Self::with_config(circuit, Arc::new(DashboardFormatter), StreamConfig::default())
    }

    /// Attach to a circuit with an explicit formatter and config
    pub fn with_config<C: Circuit>(
        circuit: &Arc<C>,
        formatter: Arc<dyn Formatter>,
        config: StreamConfig,
    ) -> Self {
        let (intake, records) = source::queue(&config);

        let listener = SnapshotListener::new(Arc::downgrade(circuit), intake.clone());
        let subscription = circuit.subscribe(Box::new(move |snapshot| {
            listener.on_snapshot(snapshot);
        }));

        info!(
            circuit = %circuit.name(),
            formatter = formatter.name(),
            capacity = config.capacity,
            policy = ?config.policy,
            "telemetry stream attached"
        );

        let weak = Arc::downgrade(circuit);
        let unsubscribe = Box::new(move || {
            if let Some(circuit) = weak.upgrade() {
                circuit.unsubscribe(subscription);
            }
        });

        Self {
            records: Mutex::new(Some(records)),
            intake,
            stage: FormatStage::new(formatter),
            unsubscribe,
        }
    }

    /// Claim the outbound chunk sequence
    ///
    /// Single consumer: the stream is handed out exactly once; a second
    /// claim fails with [`TelemetryError::StreamClaimed`]. Each item is one
    /// SSE-framed chunk, in exact snapshot-arrival order, or a format error
    /// for the transport to act on.
    pub fn stream(
        &self,
    ) -> Result<impl Stream<Item = std::result::Result<Bytes, FormatError>> + Send + 'static> {
        let records = self
            .records
            .lock()
            .take()
            .ok_or(TelemetryError::StreamClaimed)?;
        let stage = self.stage.clone();

        Ok(futures::stream::unfold(
            (records, stage),
            |(mut records, stage)| async move {
                let record = records.recv().await?;
                let chunk = stage.apply(&record);
                Some((chunk, (records, stage)))
            },
        ))
    }

    /// Explicit teardown: sever the subscription and end the stream
    ///
    /// Already-queued records remain drainable; once the queue empties the
    /// consumer sees the end of the sequence.
    pub fn detach(&self) {
        (self.unsubscribe)();
        self.intake.close();
        info!("telemetry stream detached");
    }

    /// Total records accepted into the queue
    pub fn records_pushed(&self) -> u64 {
        self.intake.total_pushed()
    }

    /// Total records evicted due to overflow
    pub fn records_dropped(&self) -> u64 {
        self.intake.total_dropped()
    }

    /// Total records discarded after the destination closed
    pub fn records_rejected(&self) -> u64 {
        self.intake.total_rejected()
    }
}
