//! Source stage - push intake, pull output
//!
//! Adapts the circuit's synchronous push into an async pull sequence with
//! no transformation. Records come out in exact push order. The queue never
//! signals end-of-sequence while the pipeline is alive; the stream ends only
//! when the producer side is explicitly closed.
//!
//! Overflow is an explicit, configured choice (see [`OverflowPolicy`]):
//! drop-oldest with FIFO eviction, or unbounded growth for hosts that want
//! the producer never to lose a record even with a stalled consumer.

use crate::config::{OverflowPolicy, StreamConfig};
use crate::record::MergedRecord;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// Outcome of one push into the source queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PushOutcome {
    /// Record queued
    Queued,
    /// Record queued, oldest record evicted to make room
    ReplacedOldest,
    /// Destination gone (consumer dropped or queue closed); record discarded
    Closed,
}

/// Counters for queue monitoring
#[derive(Default)]
pub(crate) struct QueueMetrics {
    /// Total records accepted into the queue
    pub pushed: AtomicU64,
    /// Total records evicted due to overflow
    pub dropped: AtomicU64,
    /// Total records discarded because the destination was gone
    pub rejected: AtomicU64,
}

struct Inner {
    records: VecDeque<MergedRecord>,
    /// Producer side torn down; the consumer drains and then sees the end
    closed: bool,
    /// Consumer dropped; pushes are discarded from now on
    consumer_gone: bool,
}

struct Shared {
    inner: Mutex<Inner>,
    notify: Notify,
    policy: OverflowPolicy,
    capacity: usize,
    metrics: QueueMetrics,
}

/// Create a connected push handle / pull stream pair
pub(crate) fn queue(config: &StreamConfig) -> (SourceHandle, RecordStream) {
    let shared = Arc::new(Shared {
        inner: Mutex::new(Inner {
            records: VecDeque::new(),
            closed: false,
            consumer_gone: false,
        }),
        notify: Notify::new(),
        policy: config.policy,
        capacity: config.capacity,
        metrics: QueueMetrics::default(),
    });

    (
        SourceHandle {
            shared: Arc::clone(&shared),
        },
        RecordStream { shared },
    )
}

/// Push side of the source queue
///
/// `push` never blocks and never fails loudly: the listener runs on the
/// circuit's emission path and a dead consumer must not destabilize it.
#[derive(Clone)]
pub(crate) struct SourceHandle {
    shared: Arc<Shared>,
}

impl SourceHandle {
    /// Push one record, waking the consumer if it is waiting
    pub fn push(&self, record: MergedRecord) -> PushOutcome {
        let outcome = {
            let mut inner = self.shared.inner.lock();
            if inner.closed || inner.consumer_gone {
                self.shared.metrics.rejected.fetch_add(1, Ordering::Relaxed);
                return PushOutcome::Closed;
            }

            let evicted = match self.shared.policy {
                OverflowPolicy::DropOldest if inner.records.len() >= self.shared.capacity => {
                    inner.records.pop_front();
                    self.shared.metrics.dropped.fetch_add(1, Ordering::Relaxed);
                    true
                }
                _ => false,
            };

            inner.records.push_back(record);
            self.shared.metrics.pushed.fetch_add(1, Ordering::Relaxed);

            if evicted {
                PushOutcome::ReplacedOldest
            } else {
                PushOutcome::Queued
            }
        };

        self.shared.notify.notify_one();
        outcome
    }

    /// Close the producer side
    ///
    /// Queued records remain drainable; once the queue is empty the
    /// consumer sees the end of the sequence.
    pub fn close(&self) {
        self.shared.inner.lock().closed = true;
        self.shared.notify.notify_one();
    }

    pub fn total_pushed(&self) -> u64 {
        self.shared.metrics.pushed.load(Ordering::Relaxed)
    }

    pub fn total_dropped(&self) -> u64 {
        self.shared.metrics.dropped.load(Ordering::Relaxed)
    }

    pub fn total_rejected(&self) -> u64 {
        self.shared.metrics.rejected.load(Ordering::Relaxed)
    }

    /// Current number of queued records
    pub fn len(&self) -> usize {
        self.shared.inner.lock().records.len()
    }
}

/// Pull side of the source queue - the sole consumer
pub(crate) struct RecordStream {
    shared: Arc<Shared>,
}

impl RecordStream {
    /// Receive the next record in push order
    ///
    /// Waits while the queue is empty; returns `None` only after the
    /// producer side has been closed and the queue drained.
    pub async fn recv(&mut self) -> Option<MergedRecord> {
        loop {
            // Register for notification before checking, so a push between
            // the check and the await is not lost.
            let notified = self.shared.notify.notified();
            {
                let mut inner = self.shared.inner.lock();
                if let Some(record) = inner.records.pop_front() {
                    return Some(record);
                }
                if inner.closed {
                    return None;
                }
            }
            notified.await;
        }
    }
}

impl Drop for RecordStream {
    fn drop(&mut self) {
        // Destination gone: later pushes are discarded silently.
        self.shared.inner.lock().consumer_gone = true;
    }
}
