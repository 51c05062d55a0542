//! Summary statistics over a history window.
//!
//! All functions are pure; [`Statistics`] is a derived view recomputed from a
//! snapshot on every cycle and never stored on its own.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::history::Snapshot;
use super::sample::Sample;

/// Mean latency of answered samples, rounded to the nearest millisecond.
///
/// Returns `None` when no sample was answered, which is distinct from a 0 ms mean.
pub fn mean_latency<'a, I>(samples: I) -> Option<u64>
where
    I: IntoIterator<Item = &'a Sample>,
{
    let (sum, count) = samples
        .into_iter()
        .filter_map(|s| s.latency_ms)
        .fold((0.0_f64, 0_usize), |(sum, count), ms| (sum + ms, count + 1));

    if count == 0 {
        return None;
    }
    Some(round_ms(sum / count as f64))
}

/// Latency of the most recent answered sample.
///
/// Trailing timeouts are skipped: they must not hide the last good measurement.
pub fn last_latency<'a, I>(samples: I) -> Option<u64>
where
    I: IntoIterator<Item = &'a Sample>,
    I::IntoIter: DoubleEndedIterator,
{
    samples
        .into_iter()
        .rev()
        .find_map(|s| s.latency_ms)
        .map(round_ms)
}

/// Percentage of unanswered samples, rounded to the nearest integer.
///
/// An empty window has zero loss.
pub fn loss_pct<'a, I>(samples: I) -> u8
where
    I: IntoIterator<Item = &'a Sample>,
{
    let (lost, total) = samples
        .into_iter()
        .fold((0_usize, 0_usize), |(lost, total), s| {
            (lost + usize::from(s.is_lost()), total + 1)
        });

    if total == 0 {
        return 0;
    }
    let pct = (lost as f64 * 100.0 / total as f64).round();
    pct.clamp(0.0, 100.0) as u8
}

fn round_ms(ms: f64) -> u64 {
    ms.max(0.0).round() as u64
}

/// Derived figures for one history window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    /// Mean latency of answered probes (ms).
    pub mean_latency_ms: Option<u64>,
    /// Latency of the most recent answered probe (ms).
    pub last_latency_ms: Option<u64>,
    /// Unanswered probes as a percentage of the window, 0..=100.
    pub loss_pct: u8,
    /// Number of samples the figures were derived from.
    pub samples: usize,
}

impl Statistics {
    /// Compute all figures from a history snapshot.
    pub fn compute(snapshot: Snapshot<'_>) -> Self {
        Self {
            mean_latency_ms: mean_latency(snapshot),
            last_latency_ms: last_latency(snapshot),
            loss_pct: loss_pct(snapshot),
            samples: snapshot.len(),
        }
    }
}

impl fmt::Display for Statistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn ms(value: Option<u64>) -> String {
            value.map_or_else(|| "--".to_string(), |v| format!("{v}ms"))
        }
        write!(
            f,
            "Mean {} | Last {} | Loss {}%",
            ms(self.mean_latency_ms),
            ms(self.last_latency_ms),
            self.loss_pct
        )
    }
}
