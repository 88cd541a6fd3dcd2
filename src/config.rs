//! Configuration for PULSSI

use crate::error::{Result, TelemetryError};
use std::env;
use std::str::FromStr;

/// What to do when the source queue is full and the consumer is behind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverflowPolicy {
    /// Evict the oldest queued record (FIFO eviction)
    DropOldest,
    /// Grow without bound - the original adapter's behavior; a consumer
    /// that stops pulling entirely accumulates records indefinitely
    Unbounded,
}

impl FromStr for OverflowPolicy {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "drop-oldest" | "drop_oldest" => Ok(Self::DropOldest),
            "unbounded" => Ok(Self::Unbounded),
            other => Err(TelemetryError::Config(format!(
                "invalid overflow policy: {other} (expected 'drop-oldest' or 'unbounded')"
            ))),
        }
    }
}

/// Configuration for one telemetry stream
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Queue capacity in records (ignored under `Unbounded`)
    pub capacity: usize,

    /// Overflow policy when the consumer falls behind
    pub policy: OverflowPolicy,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            capacity: 10_000,
            policy: OverflowPolicy::DropOldest,
        }
    }
}

impl StreamConfig {
    /// Load configuration from environment variables
    ///
    /// - `PULSSI_QUEUE_CAPACITY`: queue capacity in records
    /// - `PULSSI_OVERFLOW_POLICY`: `drop-oldest` or `unbounded`
    pub fn from_env() -> Result<Self> {
        let mut config = StreamConfig::default();

        if let Ok(cap) = env::var("PULSSI_QUEUE_CAPACITY") {
            config.capacity = cap
                .parse()
                .map_err(|e| TelemetryError::Config(format!("invalid PULSSI_QUEUE_CAPACITY: {e}")))?;
        }

        if let Ok(policy) = env::var("PULSSI_OVERFLOW_POLICY") {
            config.policy = policy.parse()?;
        }

        Ok(config)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = StreamConfig::default();
        assert_eq!(config.capacity, 10_000);
        assert_eq!(config.policy, OverflowPolicy::DropOldest);
    }

    #[test]
    fn test_config_from_env() {
        // Uses default values since env vars aren't set
        let config = StreamConfig::from_env().unwrap();
        assert!(config.capacity > 0);
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!(
            "drop-oldest".parse::<OverflowPolicy>().unwrap(),
            OverflowPolicy::DropOldest
        );
        assert_eq!(
            "drop_oldest".parse::<OverflowPolicy>().unwrap(),
            OverflowPolicy::DropOldest
        );
        assert_eq!(
            "Unbounded".parse::<OverflowPolicy>().unwrap(),
            OverflowPolicy::Unbounded
        );
        assert!("grow-forever".parse::<OverflowPolicy>().is_err());
    }
}
