//! Fixed-capacity sample history.
//!
//! Strict FIFO: once the buffer is full, recording a sample evicts the oldest
//! one. Samples are ordered by dispatch time; a completion that arrives late is
//! slotted back into its dispatch position.

use std::collections::VecDeque;
use std::collections::vec_deque;
use std::num::NonZeroUsize;
use std::time::Duration;

use super::sample::Sample;

/// Samples allocated up front; larger windows grow as samples arrive.
const PREALLOC_LIMIT: usize = 4096;

/// Compute history capacity from a time window and the sampling interval.
///
/// Returns `None` when the window holds less than half an interval, i.e. the
/// capacity would round to zero.
pub fn capacity_for(history: Duration, interval: Duration) -> Option<NonZeroUsize> {
    if interval.is_zero() {
        return None;
    }
    let slots = (history.as_secs_f64() / interval.as_secs_f64()).round();
    NonZeroUsize::new(slots as usize)
}

/// Ring buffer of the most recent samples.
#[derive(Debug, Clone)]
pub struct History {
    samples: VecDeque<Sample>,
    capacity: NonZeroUsize,
}

impl History {
    /// Create an empty history holding at most `capacity` samples.
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity.get().min(PREALLOC_LIMIT)),
            capacity,
        }
    }

    /// Record a sample, evicting the oldest one if the buffer is full.
    pub fn record(&mut self, sample: Sample) {
        // Fast path: in-order completion.
        let in_order = self
            .samples
            .back()
            .is_none_or(|last| last.taken_at <= sample.taken_at);

        if in_order {
            if self.is_full() {
                self.samples.pop_front();
            }
            self.samples.push_back(sample);
        } else {
            let pos = self
                .samples
                .iter()
                .rposition(|s| s.taken_at <= sample.taken_at)
                .map_or(0, |i| i + 1);

            if self.is_full() {
                if pos == 0 {
                    // Older than everything retained: it is the one to evict.
                    tracing::trace!(taken_at = %sample.taken_at, "Dropping stale late sample");
                    return;
                }
                self.samples.pop_front();
                self.samples.insert(pos - 1, sample);
            } else {
                self.samples.insert(pos, sample);
            }
        }

        debug_assert!(self.samples.len() <= self.capacity.get());
    }

    /// Read-only ordered view, oldest first.
    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            samples: &self.samples,
        }
    }

    /// Maximum number of retained samples.
    pub fn capacity(&self) -> NonZeroUsize {
        self.capacity
    }

    /// Number of retained samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether no sample has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Whether the next in-order record evicts a sample.
    pub fn is_full(&self) -> bool {
        self.samples.len() >= self.capacity.get()
    }
}

/// Borrowed, immutable view of a [`History`], oldest sample first.
#[derive(Debug, Clone, Copy)]
pub struct Snapshot<'a> {
    samples: &'a VecDeque<Sample>,
}

impl<'a> Snapshot<'a> {
    /// Iterate samples oldest first.
    pub fn iter(&self) -> vec_deque::Iter<'a, Sample> {
        self.samples.iter()
    }

    /// Number of samples in the view.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the view is empty.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl<'a> IntoIterator for Snapshot<'a> {
    type Item = &'a Sample;
    type IntoIter = vec_deque::Iter<'a, Sample>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples.iter()
    }
}
