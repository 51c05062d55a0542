//! Single probe result.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of one probe attempt.
///
/// `taken_at` is the dispatch time of the probe, not its completion time, so
/// samples keep their scheduling order even when completions race.
/// A `latency_ms` of `None` means the probe got no answer (timeout, unreachable).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Probe dispatch timestamp (UTC).
    pub taken_at: DateTime<Utc>,
    /// Round-trip latency in milliseconds, `None` when unanswered.
    pub latency_ms: Option<f64>,
}

impl Sample {
    /// Create a sample from a probe outcome.
    pub fn new(taken_at: DateTime<Utc>, latency_ms: Option<f64>) -> Self {
        Self {
            taken_at,
            latency_ms,
        }
    }

    /// Create an answered sample.
    pub fn answered(taken_at: DateTime<Utc>, latency_ms: f64) -> Self {
        Self::new(taken_at, Some(latency_ms))
    }

    /// Create an unanswered sample.
    pub fn unanswered(taken_at: DateTime<Utc>) -> Self {
        Self::new(taken_at, None)
    }

    /// Whether the probe went unanswered.
    pub fn is_lost(&self) -> bool {
        self.latency_ms.is_none()
    }
}
