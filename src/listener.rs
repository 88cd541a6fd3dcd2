//! Snapshot listener - the pipeline's inbound boundary
//!
//! Invoked synchronously by the circuit's event mechanism for every
//! snapshot. Reads identity metadata live at invocation time, merges it
//! with the snapshot, and pushes the result into the source queue. Must not
//! block and must never let a dead destination propagate back onto the
//! circuit's emission path.

use crate::circuit::{Circuit, Snapshot};
use crate::record::MergedRecord;
use crate::source::{PushOutcome, SourceHandle};
use std::sync::Weak;
use tracing::{debug, trace};

/// Bridges circuit snapshot events into the source queue
///
/// Identity fields are read from the live circuit each time the listener
/// runs, not captured at snapshot-production time. If the circuit's state
/// changes in between, the emitted record reflects the current state; the
/// staleness window is part of the contract.
pub(crate) struct SnapshotListener<C: Circuit> {
    circuit: Weak<C>,
    intake: SourceHandle,
}

impl<C: Circuit> SnapshotListener<C> {
    pub fn new(circuit: Weak<C>, intake: SourceHandle) -> Self {
        Self { circuit, intake }
    }

    /// Handle one snapshot event
    ///
    /// One push per call, in event order. Merge construction never fails;
    /// a closed destination is swallowed here so the circuit's emission
    /// path never sees it.
    pub fn on_snapshot(&self, snapshot: &Snapshot) {
        let Some(circuit) = self.circuit.upgrade() else {
            trace!("circuit gone, snapshot ignored");
            return;
        };

        let record = MergedRecord::merge(&circuit.identity(), snapshot);

        match self.intake.push(record) {
            PushOutcome::Queued => {}
            PushOutcome::ReplacedOldest => {
                debug!(queued = self.intake.len(), "queue full, oldest record evicted");
            }
            PushOutcome::Closed => {
                trace!("stream closed downstream, snapshot discarded");
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::circuit::testing::TestCircuit;
    use crate::config::StreamConfig;
    use crate::source;
    use std::sync::Arc;

    fn wired(circuit: &Arc<TestCircuit>) -> (SnapshotListener<TestCircuit>, source::RecordStream) {
        let (tx, rx) = source::queue(&StreamConfig::default());
        (SnapshotListener::new(Arc::downgrade(circuit), tx), rx)
    }

    #[tokio::test]
    async fn test_merges_identity_with_snapshot() {
        let circuit = Arc::new(TestCircuit::new("svc", "g"));
        let (listener, mut rx) = wired(&circuit);

        listener.on_snapshot(&Snapshot::new().with("successes", 1).with("failures", 0));

        let record = rx.recv().await.unwrap();
        assert_eq!(record.get_str("name"), Some("svc"));
        assert_eq!(record.get_bool("closed"), Some(true));
        assert_eq!(record.get_str("group"), Some("g"));
        assert_eq!(record.get_u64("successes"), Some(1));
        assert_eq!(record.get_u64("failures"), Some(0));
    }

    #[tokio::test]
    async fn test_identity_read_at_invocation_time() {
        let circuit = Arc::new(TestCircuit::new("svc", "g"));
        let (listener, mut rx) = wired(&circuit);

        let snapshot = Snapshot::new().with("successes", 1);
        listener.on_snapshot(&snapshot);
        circuit.set_closed(false);
        listener.on_snapshot(&snapshot);

        // Identical snapshots, different identity per invocation.
        assert_eq!(rx.recv().await.unwrap().get_bool("closed"), Some(true));
        assert_eq!(rx.recv().await.unwrap().get_bool("closed"), Some(false));
    }

    #[tokio::test]
    async fn test_closed_destination_is_swallowed() {
        let circuit = Arc::new(TestCircuit::new("svc", "g"));
        let (listener, rx) = wired(&circuit);
        drop(rx);

        // Must not panic or surface anything to the caller.
        listener.on_snapshot(&Snapshot::new());
        listener.on_snapshot(&Snapshot::new());
    }

    #[tokio::test]
    async fn test_dead_circuit_pushes_nothing() {
        let circuit = Arc::new(TestCircuit::new("svc", "g"));
        let (tx, mut rx) = source::queue(&StreamConfig::default());
        let listener = SnapshotListener::new(Arc::downgrade(&circuit), tx.clone());
        drop(circuit);

        listener.on_snapshot(&Snapshot::new());
        assert_eq!(tx.total_pushed(), 0);

        tx.close();
        assert!(rx.recv().await.is_none());
    }
}
