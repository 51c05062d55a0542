//! Observer hooks for display and side-effect consumers.
//!
//! Observers are called from the monitor's single consumer task, in
//! registration order. They must not block: a tray icon swap, a sound or a
//! notification should be handed off to the consumer's own executor.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use super::stats::Statistics;
use super::status::{HealthState, StatusTransition};

/// Consumer of monitor output.
///
/// Both hooks default to no-ops so an observer only implements what it needs.
pub trait MonitorObserver: Send + Sync + 'static {
    /// Called after every recorded sample with freshly computed statistics.
    fn on_statistics(&self, _stats: &Statistics) {}

    /// Called once per distinct health transition.
    fn on_status_change(&self, _transition: &StatusTransition) {}
}

/// Ordered collection of observers.
#[derive(Clone, Default)]
pub struct ObserverSet {
    observers: Vec<Arc<dyn MonitorObserver>>,
}

impl ObserverSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer.
    pub fn push(&mut self, observer: Arc<dyn MonitorObserver>) {
        self.observers.push(observer);
    }

    /// Number of registered observers.
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    /// Whether no observer is registered.
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    pub(crate) fn notify_statistics(&self, stats: &Statistics) {
        for observer in &self.observers {
            observer.on_statistics(stats);
        }
    }

    pub(crate) fn notify_status_change(&self, transition: &StatusTransition) {
        for observer in &self.observers {
            observer.on_status_change(transition);
        }
    }
}

impl std::fmt::Debug for ObserverSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverSet")
            .field("len", &self.len())
            .finish()
    }
}

/// Logs statistics and transitions through `tracing`.
///
/// Recoveries are logged at info. Degradations are logged at warn, or at
/// error when the link is lost.
#[derive(Debug, Clone)]
pub struct TracingObserver {
    host: String,
}

impl TracingObserver {
    /// Create a logging observer for `host`.
    pub fn new(host: impl Into<String>) -> Self {
        Self { host: host.into() }
    }
}

fn transition_level(transition: &StatusTransition) -> tracing::Level {
    if !transition.is_degradation() {
        tracing::Level::INFO
    } else if transition.to == HealthState::Lost {
        tracing::Level::ERROR
    } else {
        tracing::Level::WARN
    }
}

impl MonitorObserver for TracingObserver {
    fn on_statistics(&self, stats: &Statistics) {
        tracing::debug!(
            host = %self.host,
            mean_ms = ?stats.mean_latency_ms,
            last_ms = ?stats.last_latency_ms,
            loss_pct = stats.loss_pct,
            samples = stats.samples,
            "{stats}"
        );
    }

    fn on_status_change(&self, transition: &StatusTransition) {
        let (host, from, to) = (&self.host, transition.from, transition.to);
        let level = transition_level(transition);
        if level == tracing::Level::ERROR {
            tracing::error!(host = %host, from = %from, to = %to, "Connection lost");
        } else if level == tracing::Level::WARN {
            tracing::warn!(host = %host, from = %from, to = %to, "Connection degraded");
        } else {
            tracing::info!(host = %host, from = %from, to = %to, "Connection recovered");
        }
    }
}

/// Event forwarded by [`ChannelObserver`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum MonitorEvent {
    /// Statistics recomputed after a sample.
    Statistics(Statistics),
    /// Health state changed.
    StatusChanged(StatusTransition),
}

/// Forwards monitor output over a broadcast channel.
///
/// Lagging or absent receivers never slow the monitor down: sends that find
/// no receiver are dropped.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    tx: broadcast::Sender<MonitorEvent>,
}

impl ChannelObserver {
    /// Create an observer and its first receiver.
    pub fn new(capacity: usize) -> (Self, broadcast::Receiver<MonitorEvent>) {
        let (tx, rx) = broadcast::channel(capacity);
        (Self { tx }, rx)
    }

    /// Add another receiver.
    pub fn subscribe(&self) -> broadcast::Receiver<MonitorEvent> {
        self.tx.subscribe()
    }

    fn send(&self, event: MonitorEvent) {
        if self.tx.send(event).is_err() {
            tracing::trace!("No monitor event receivers");
        }
    }
}

impl MonitorObserver for ChannelObserver {
    fn on_statistics(&self, stats: &Statistics) {
        self.send(MonitorEvent::Statistics(*stats));
    }

    fn on_status_change(&self, transition: &StatusTransition) {
        self.send(MonitorEvent::StatusChanged(*transition));
    }
}
