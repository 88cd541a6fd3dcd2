//! Collaborator contract - the monitored circuit
//!
//! PULSSI does not own a circuit breaker. It observes one through the
//! [`Circuit`] trait: synchronously readable identity fields plus an
//! explicit subscribe/unsubscribe capability for snapshot notifications.
//! Snapshot production cadence and content are entirely the circuit's
//! responsibility.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One aggregated statistics record for a circuit, produced periodically
/// by the collaborator.
///
/// PULSSI treats the snapshot as opaque: a mapping of named scalar fields
/// (counters, timings, flags). It is never interpreted beyond being merged
/// with identity metadata and handed to the formatter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot(Map<String, Value>);

impl Snapshot {
    /// Create an empty snapshot
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Builder-style field insertion
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Borrow the underlying field map
    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Number of fields in the snapshot
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the snapshot has no fields
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for Snapshot {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

/// Identity metadata read from the live circuit at listener-invocation time.
///
/// Not point-in-time consistent with the snapshot: if the circuit's state
/// changes between snapshot production and listener execution, these fields
/// reflect the current state. That staleness window is part of the contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitIdentity {
    /// Circuit name
    pub name: String,

    /// Whether the circuit is currently closed (passing traffic)
    pub closed: bool,

    /// Circuit group for dashboard aggregation
    pub group: String,

    /// Circuit options as configured by the host
    pub options: Map<String, Value>,
}

/// Callback invoked synchronously with each new snapshot
pub type SnapshotCallback = Box<dyn Fn(&Snapshot) + Send + Sync>;

/// Opaque handle identifying one snapshot subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// The monitored circuit - PULSSI's single collaborator
///
/// Implementations must invoke subscribed callbacks synchronously, in
/// snapshot-production order, and must expose identity fields that are
/// readable at the moment a callback runs.
///
/// # Example
///
/// ```ignore
/// struct MyBreaker { /* ... */ }
///
/// impl Circuit for MyBreaker {
///     fn name(&self) -> String { "payments".into() }
///     fn is_closed(&self) -> bool { self.state() == State::Closed }
///     fn group(&self) -> String { "checkout".into() }
///     fn options(&self) -> Map<String, Value> { self.opts.clone() }
///     fn subscribe(&self, cb: SnapshotCallback) -> SubscriptionId { /* ... */ }
///     fn unsubscribe(&self, id: SubscriptionId) { /* ... */ }
/// }
/// ```
pub trait Circuit: Send + Sync + 'static {
    /// Circuit name, read live
    fn name(&self) -> String;

    /// Whether the circuit is currently closed, read live
    fn is_closed(&self) -> bool;

    /// Circuit group, read live
    fn group(&self) -> String;

    /// Circuit options, read live
    fn options(&self) -> Map<String, Value>;

    /// Register a snapshot callback
    ///
    /// The callback is invoked synchronously for every snapshot the circuit
    /// produces, until the returned id is passed to [`unsubscribe`].
    ///
    /// [`unsubscribe`]: Circuit::unsubscribe
    fn subscribe(&self, callback: SnapshotCallback) -> SubscriptionId;

    /// Remove a previously registered callback
    ///
    /// Unknown ids are ignored.
    fn unsubscribe(&self, id: SubscriptionId);

    /// Read all identity fields at once
    ///
    /// Infallible: identity getters have no failure mode.
    fn identity(&self) -> CircuitIdentity {
        CircuitIdentity {
            name: self.name(),
            closed: self.is_closed(),
            group: self.group(),
            options: self.options(),
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-crate fake circuit for unit tests

    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU64, Ordering};

    /// Fake circuit with mutable identity and manual snapshot emission
    pub struct TestCircuit {
        pub identity: Mutex<CircuitIdentity>,
        callbacks: Mutex<HashMap<u64, SnapshotCallback>>,
        next_id: AtomicU64,
    }

    impl TestCircuit {
        pub fn new(name: &str, group: &str) -> Self {
            Self {
                identity: Mutex::new(CircuitIdentity {
                    name: name.to_string(),
                    closed: true,
                    group: group.to_string(),
                    options: Map::new(),
                }),
                callbacks: Mutex::new(HashMap::new()),
                next_id: AtomicU64::new(0),
            }
        }

        /// Deliver a snapshot to every subscribed callback, in id order
        pub fn emit(&self, snapshot: &Snapshot) {
            let callbacks = self.callbacks.lock();
            let mut ids: Vec<_> = callbacks.keys().copied().collect();
            ids.sort_unstable();
            for id in ids {
                if let Some(cb) = callbacks.get(&id) {
                    cb(snapshot);
                }
            }
        }

        pub fn set_closed(&self, closed: bool) {
            self.identity.lock().closed = closed;
        }

        pub fn subscriber_count(&self) -> usize {
            self.callbacks.lock().len()
        }
    }

    impl Circuit for TestCircuit {
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
}
