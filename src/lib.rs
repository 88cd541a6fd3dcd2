//! PULSSI - Circuit Health Telemetry Stream
//!
//! A push-based telemetry adapter: it subscribes to periodic health
//! snapshots from a monitored circuit breaker, enriches each snapshot with
//! identity metadata read live from the circuit, formats the result for a
//! dashboard, and exposes it as a long-lived Server-Sent-Events stream.
//!
//! # Architecture
//!
//! ```text
//! Circuit ──snapshot──► Listener ──► Source Queue ──► Format Stage ──► SSE chunks
//! ```
//!
//! The circuit is a collaborator behind the [`Circuit`] trait; PULSSI owns
//! one subscription per stream and exactly one framed chunk leaves the
//! pipeline per snapshot that enters it, in arrival order.

#![deny(unsafe_code)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::panic)]

pub mod circuit;
pub mod config;
pub mod error;
pub mod format;
pub mod http;
pub mod record;
pub mod stream;

mod listener;
mod source;

pub use circuit::{Circuit, CircuitIdentity, Snapshot, SnapshotCallback, SubscriptionId};
pub use config::{OverflowPolicy, StreamConfig};
pub use error::{FormatError, Result, TelemetryError};
pub use format::{DashboardFormatter, Formatter, PassthroughFormatter};
pub use record::MergedRecord;
pub use stream::TelemetryStream;
