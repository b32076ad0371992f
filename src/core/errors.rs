/*!
 * Error Types
 * Centralized error handling with thiserror and miette
 */

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Monitor errors
///
/// Blocking forever on a type no producer emits is not an error: the
/// monitor does not reason about liveness, callers choose the demands.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum MonitorError {
    #[error("Invalid buffer capacity: {0}")]
    #[diagnostic(
        code(monitor::invalid_capacity),
        help("Capacity must be at least one slot.")
    )]
    InvalidCapacity(usize),

    #[error("Operation timed out after {elapsed_ms}ms (timeout: {timeout_ms}ms)")]
    #[diagnostic(
        code(monitor::timeout),
        help("No matching state was reached before the deadline. Check that producers emit the requested type.")
    )]
    Timeout { elapsed_ms: u64, timeout_ms: u64 },

    #[error("Invariant violation: {0}")]
    #[diagnostic(
        code(monitor::invariant_violation),
        help("Internal monitor state is inconsistent. This is a bug, not a recoverable condition.")
    )]
    InvariantViolation(String),

    #[error("Unknown producer {source_id} (rotation has {producers} producers)")]
    #[diagnostic(
        code(monitor::unknown_producer),
        help("Round-robin sources must be numbered 0..producers.")
    )]
    UnknownProducer { source_id: u32, producers: u32 },

    #[error("Buffer closed")]
    #[diagnostic(
        code(monitor::closed),
        help("The buffer was shut down while this call was waiting or before it started.")
    )]
    Closed,

    #[error("Actor thread panicked: {0}")]
    #[diagnostic(code(monitor::actor_panicked))]
    ActorPanicked(String),

    #[error("Failed to spawn actor {actor}: {reason}")]
    #[diagnostic(
        code(monitor::spawn_failed),
        help("The OS refused a new thread. Reduce the number of actors.")
    )]
    SpawnFailed { actor: String, reason: String },
}

impl MonitorError {
    /// Build a timeout error from measured durations
    pub(crate) fn timeout(elapsed: std::time::Duration, timeout: std::time::Duration) -> Self {
        MonitorError::Timeout {
            elapsed_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        }
    }

    #[inline]
    pub fn is_timeout(&self) -> bool {
        matches!(self, MonitorError::Timeout { .. })
    }
}

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum ConfigError {
    #[error("{name} must be positive")]
    #[diagnostic(code(config::zero))]
    Zero { name: &'static str },

    #[error("{name} = {value} exceeds the maximum of {max}")]
    #[diagnostic(
        code(config::out_of_range),
        help("Producer, consumer and slot counts are limited to 20.")
    )]
    OutOfRange {
        name: &'static str,
        value: usize,
        max: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_timeout_display() {
        let err = MonitorError::timeout(Duration::from_millis(120), Duration::from_millis(100));
        assert!(err.is_timeout());
        assert_eq!(
            err.to_string(),
            "Operation timed out after 120ms (timeout: 100ms)"
        );
    }

    #[test]
    fn test_error_serialization() {
        let err = MonitorError::InvariantViolation("count 4 > capacity 3".into());
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("invariant_violation"));
    }
}
