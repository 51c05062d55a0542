//! Single consumer serializing every probe completion.
//!
//! The recorder exclusively owns the history and the classifier. Probe tasks
//! never touch either; they send their sample down one channel and the
//! recorder applies record, recompute, classify and notify in arrival order.

use std::num::NonZeroUsize;

use tokio::sync::mpsc;

use super::history::History;
use super::observer::ObserverSet;
use super::sample::Sample;
use super::stats::Statistics;
use super::status::{Classification, HealthState, StatusClassifier, Thresholds};

/// History, classifier and observers for one monitored host.
#[derive(Debug)]
pub struct Recorder {
    history: History,
    classifier: StatusClassifier,
    observers: ObserverSet,
}

impl Recorder {
    /// Create a recorder with an empty history.
    pub fn new(capacity: NonZeroUsize, thresholds: Thresholds, observers: ObserverSet) -> Self {
        Self {
            history: History::new(capacity),
            classifier: StatusClassifier::new(thresholds),
            observers,
        }
    }

    /// Apply one probe completion.
    ///
    /// Records the sample, recomputes statistics, notifies observers and fires
    /// the transition hook if the health state changed.
    pub fn ingest(&mut self, sample: Sample) -> (Statistics, Classification) {
        self.history.record(sample);
        let stats = Statistics::compute(self.history.snapshot());
        self.observers.notify_statistics(&stats);

        let classification = self.classifier.classify(&stats);
        if let Some(transition) = classification.transition() {
            self.observers.notify_status_change(&transition);
        }
        (stats, classification)
    }

    /// Drain completions until every sender is gone.
    pub async fn run(mut self, mut rx: mpsc::Receiver<Sample>) -> Self {
        tracing::debug!(capacity = self.history.capacity().get(), "Recorder started");
        while let Some(sample) = rx.recv().await {
            self.ingest(sample);
        }
        tracing::debug!(samples = self.history.len(), "Recorder stopped");
        self
    }

    /// Recorded history.
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Statistics for the current window.
    pub fn statistics(&self) -> Statistics {
        Statistics::compute(self.history.snapshot())
    }

    /// Last reported health state.
    pub fn status(&self) -> HealthState {
        self.classifier.current()
    }
}
