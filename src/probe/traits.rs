//! Core probe trait and types.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Probe transport.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ProbeKind {
    /// ICMP echo request.
    #[default]
    Icmp,
    /// TCP connect to a port.
    Tcp,
}

/// Reachability and latency probe.
///
/// # Contract
///
/// - Returns `Some(latency_ms)` when the host answered.
/// - Returns `None` when it did not (timeout, unreachable, refused, DNS
///   failure). These are valid observations and must not panic or block past
///   `timeout`.
///
/// The scheduler additionally bounds every call with `timeout`, so a probe
/// that overruns is recorded as unanswered.
#[async_trait::async_trait]
pub trait Probe: Send + Sync + 'static {
    /// Probe `host` once and report the round-trip latency in milliseconds.
    async fn probe(&self, host: &str, timeout: Duration) -> Option<f64>;
}

#[async_trait::async_trait]
impl Probe for Box<dyn Probe> {
    async fn probe(&self, host: &str, timeout: Duration) -> Option<f64> {
        (**self).probe(host, timeout).await
    }
}
