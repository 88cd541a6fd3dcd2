//! Merged record - the envelope that flows through the pipeline
//!
//! A [`MergedRecord`] is the shallow union of circuit identity metadata and
//! one snapshot's fields. It is created fresh per snapshot event, immutable
//! after creation, and owned by the pipeline for exactly one transform cycle.

use crate::circuit::{CircuitIdentity, Snapshot};
use serde::Serialize;
use serde_json::{Map, Value};

/// Identity metadata merged with one snapshot
///
/// Snapshot fields win on key collision: a snapshot that carries its own
/// `name` field overrides the identity `name`. Construction never fails,
/// whatever shape the snapshot has.
///
/// # Example
///
/// ```
/// use pulssi::{CircuitIdentity, MergedRecord, Snapshot};
/// use serde_json::Map;
///
/// let identity = CircuitIdentity {
///     name: "svc".into(),
///     closed: true,
///     group: "g".into(),
///     options: Map::new(),
/// };
/// let snapshot = Snapshot::new().with("successes", 1).with("failures", 0);
///
/// let record = MergedRecord::merge(&identity, &snapshot);
/// assert_eq!(record.get("name"), Some(&"svc".into()));
/// assert_eq!(record.get("successes"), Some(&1.into()));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct MergedRecord(Map<String, Value>);

impl MergedRecord {
    /// Build the merged record from identity and snapshot
    pub fn merge(identity: &CircuitIdentity, snapshot: &Snapshot) -> Self {
        let mut fields = Map::with_capacity(4 + snapshot.len());
        fields.insert("name".to_string(), Value::String(identity.name.clone()));
        fields.insert("closed".to_string(), Value::Bool(identity.closed));
        fields.insert("group".to_string(), Value::String(identity.group.clone()));
        fields.insert(
            "options".to_string(),
            Value::Object(identity.options.clone()),
        );

        // Later insert wins, so snapshot fields take precedence.
        for (key, value) in snapshot.fields() {
            fields.insert(key.clone(), value.clone());
        }

        Self(fields)
    }

    /// Look up a field
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Field as string, if present and a string
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Field as u64, if present and numeric
    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.0.get(key).and_then(Value::as_u64)
    }

    /// Field as bool, if present and a bool
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.0.get(key).and_then(Value::as_bool)
    }

    /// Borrow the underlying field map
    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }
}
