//! Format stage - record in, framed SSE chunk out
//!
//! A pure 1:1 transform: each merged record is handed to the [`Formatter`],
//! the result is JSON-encoded and wrapped in the Server-Sent-Events message
//! envelope (`data: <json>\n\n`). Exactly one chunk per record, produced
//! synchronously, never batched. A formatter failure becomes an `Err` item
//! on the stream; no chunk is ever skipped silently.

use crate::error::FormatError;
use crate::record::MergedRecord;
use bytes::{BufMut, Bytes, BytesMut};
use serde_json::{json, Value};
use std::sync::Arc;

/// Maps a merged record to the target wire schema
///
/// Implementations must be total over any well-formed merged record and
/// must return a JSON object; the format stage rejects anything else as an
/// invalid shape.
pub trait Formatter: Send + Sync {
    /// Formatter name for identification and logging
    fn name(&self) -> &'static str;

    /// Produce the wire-schema record for one merged record
    fn format(&self, record: &MergedRecord) -> Result<Value, FormatError>;
}

/// Emits the merged record unchanged
///
/// Useful when the merged shape already is the wire schema, and for
/// verifying the framing byte-for-byte.
pub struct PassthroughFormatter;

impl Formatter for PassthroughFormatter {
    fn name(&self) -> &'static str {
        "passthrough"
    }

    fn format(&self, record: &MergedRecord) -> Result<Value, FormatError> {
        Ok(Value::Object(record.fields().clone()))
    }
}

/// Hystrix-dashboard-style formatter
///
/// Renames and derives fields the dashboard expects: counters default to 0
/// when absent, `isCircuitBreakerOpen` is the negation of the merged
/// `closed` flag, and `errorPercentage` is derived from the counters.
pub struct DashboardFormatter;

impl DashboardFormatter {
    fn counter(record: &MergedRecord, key: &str) -> u64 {
        record.get_u64(key).unwrap_or(0)
    }
}

impl Formatter for DashboardFormatter {
    fn name(&self) -> &'static str {
        "dashboard"
    }

    fn format(&self, record: &MergedRecord) -> Result<Value, FormatError> {
        let successes = Self::counter(record, "successes");
        let failures = Self::counter(record, "failures");
        let timeouts = Self::counter(record, "timeouts");
        let short_circuits = Self::counter(record, "shortCircuits");

        let request_count = successes + failures + timeouts + short_circuits;
        let error_count = failures + timeouts;
        let error_percentage = if request_count > 0 {
            (error_count as f64 / request_count as f64 * 100.0).round() as u64
        } else {
            0
        };

        Ok(json!({
            "type": "HystrixCommand",
            "name": record.get_str("name").unwrap_or(""),
            "group": record.get_str("group").unwrap_or(""),
            "currentTime": chrono::Utc::now().timestamp_millis(),
            "isCircuitBreakerOpen": !record.get_bool("closed").unwrap_or(true),
            "requestCount": request_count,
            "errorCount": error_count,
            "errorPercentage": error_percentage,
            "rollingCountSuccess": successes,
            "rollingCountFailure": failures,
            "rollingCountTimeout": timeouts,
            "rollingCountShortCircuited": short_circuits,
            "reportingHosts": 1,
        }))
    }
}

/// The format stage: formatter plus SSE framing
#[derive(Clone)]
pub(crate) struct FormatStage {
    formatter: Arc<dyn Formatter>,
}

impl FormatStage {
    pub fn new(formatter: Arc<dyn Formatter>) -> Self {
        Self { formatter }
    }

    /// Transform one record into one framed chunk
    pub fn apply(&self, record: &MergedRecord) -> Result<Bytes, FormatError> {
        let formatted = self.formatter.format(record)?;
        if !formatted.is_object() {
            return Err(FormatError::InvalidShape(format!(
                "formatter '{}' returned {formatted}",
                self.formatter.name()
            )));
        }

        let encoded = serde_json::to_string(&formatted)?;
        let mut chunk = BytesMut::with_capacity(encoded.len() + 8);
        chunk.put_slice(b"data: ");
        chunk.put_slice(encoded.as_bytes());
        chunk.put_slice(b"\n\n");
        Ok(chunk.freeze())
    }
}
