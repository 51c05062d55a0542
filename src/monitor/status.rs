//! Connection health classification.
//!
//! Two independent rules (latency and loss) each yield a [`HealthState`]; the
//! worse of the two wins. The rules themselves are stateless per tick. The
//! [`StatusClassifier`] only remembers the last reported state so that
//! side effects fire on transitions instead of every cycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

use super::stats::Statistics;

/// Default mean latency above which the link is `Bad` (ms).
pub const DEFAULT_LATENCY_BAD_MS: u64 = 100;

/// Default loss above which the link is `Bad` (%).
pub const DEFAULT_LOSS_BAD_PCT: u8 = 10;

/// Default loss above which the link is `Lost` (%).
pub const DEFAULT_LOSS_LOST_PCT: u8 = 50;

fn default_latency_bad_ms() -> u64 {
    DEFAULT_LATENCY_BAD_MS
}

fn default_loss_bad_pct() -> u8 {
    DEFAULT_LOSS_BAD_PCT
}

fn default_loss_lost_pct() -> u8 {
    DEFAULT_LOSS_LOST_PCT
}

/// Connection health, ordered from best to worst.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum HealthState {
    /// Latency and loss within thresholds.
    Good,
    /// Latency or loss above the `bad` threshold.
    Bad,
    /// No answered probe in the window, or loss above the `lost` threshold.
    Lost,
}

/// Classification thresholds, loaded once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Mean latency above this is `Bad` (ms).
    #[serde(default = "default_latency_bad_ms")]
    pub latency_bad_ms: u64,
    /// Loss above this is `Bad` (%).
    #[serde(default = "default_loss_bad_pct")]
    pub loss_bad_pct: u8,
    /// Loss above this is `Lost` (%).
    #[serde(default = "default_loss_lost_pct")]
    pub loss_lost_pct: u8,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            latency_bad_ms: DEFAULT_LATENCY_BAD_MS,
            loss_bad_pct: DEFAULT_LOSS_BAD_PCT,
            loss_lost_pct: DEFAULT_LOSS_LOST_PCT,
        }
    }
}

impl Thresholds {
    /// Create thresholds.
    pub fn new(latency_bad_ms: u64, loss_bad_pct: u8, loss_lost_pct: u8) -> Self {
        Self {
            latency_bad_ms,
            loss_bad_pct,
            loss_lost_pct,
        }
    }

    /// Latency rule: no answered probe is `Lost`.
    pub fn ping_status(&self, stats: &Statistics) -> HealthState {
        match stats.mean_latency_ms {
            None => HealthState::Lost,
            Some(mean) if mean > self.latency_bad_ms => HealthState::Bad,
            Some(_) => HealthState::Good,
        }
    }

    /// Loss rule (two-tier).
    pub fn loss_status(&self, stats: &Statistics) -> HealthState {
        if stats.loss_pct > self.loss_lost_pct {
            HealthState::Lost
        } else if stats.loss_pct > self.loss_bad_pct {
            HealthState::Bad
        } else {
            HealthState::Good
        }
    }

    /// Worst of the latency and loss rules.
    ///
    /// Both rules are always evaluated: on an empty window the loss rule says
    /// `Good` while the latency rule says `Lost`, and `Lost` must win.
    pub fn overall_status(&self, stats: &Statistics) -> HealthState {
        let ping = self.ping_status(stats);
        let loss = self.loss_status(stats);
        ping.max(loss)
    }
}

/// Result of one classification tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    /// State for this tick.
    pub status: HealthState,
    /// State reported on the previous tick.
    pub previous: HealthState,
    /// `status != previous`.
    pub changed: bool,
}

impl Classification {
    /// Transition to report, if the state changed.
    pub fn transition(&self) -> Option<StatusTransition> {
        self.changed.then(|| StatusTransition {
            from: self.previous,
            to: self.status,
            at: Utc::now(),
        })
    }
}

/// A change of reported health.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusTransition {
    /// State before the change.
    pub from: HealthState,
    /// State after the change.
    pub to: HealthState,
    /// When the change was detected.
    pub at: DateTime<Utc>,
}

impl StatusTransition {
    /// Whether the link got worse.
    pub fn is_degradation(&self) -> bool {
        self.to > self.from
    }
}

/// Stateful wrapper remembering the last reported [`HealthState`].
#[derive(Debug, Clone)]
pub struct StatusClassifier {
    thresholds: Thresholds,
    current: HealthState,
}

impl StatusClassifier {
    /// Create a classifier.
    ///
    /// The initial state is what an empty history classifies as (`Lost`), so
    /// the first answered probe reports a transition and a dead link at startup
    /// reports none.
    pub fn new(thresholds: Thresholds) -> Self {
        let current = thresholds.overall_status(&Statistics::default());
        Self {
            thresholds,
            current,
        }
    }

    /// Classify the current statistics against the last reported state.
    pub fn classify(&mut self, stats: &Statistics) -> Classification {
        let status = self.thresholds.overall_status(stats);
        let previous = std::mem::replace(&mut self.current, status);
        Classification {
            status,
            previous,
            changed: status != previous,
        }
    }

    /// Last reported state.
    pub fn current(&self) -> HealthState {
        self.current
    }

    /// Configured thresholds.
    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }
}
