//! Error types for PULSSI

use thiserror::Error;

/// Result type alias for PULSSI operations
pub type Result<T> = std::result::Result<T, TelemetryError>;

/// Main error type for PULSSI
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// The single-consumer output stream was already handed out
    #[error("telemetry stream already claimed")]
    StreamClaimed,
}

/// Error type for the format stage
///
/// A format failure is a processing error and travels on the outbound
/// stream as an `Err` item, so the consuming transport can decide how to
/// react. It is distinct from a closed destination, which is swallowed at
/// the listener boundary and never surfaces anywhere.
#[derive(Error, Debug)]
pub enum FormatError {
    /// JSON encoding of the formatted record failed
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The formatter could not produce a record from the given input
    #[error("formatter failed: {0}")]
    Formatter(String),

    /// The formatter returned something other than a JSON object
    #[error("formatter returned a non-object value: {0}")]
    InvalidShape(String),
}
