//! ICMP ping probe.
//!
//! Measures ICMP echo round-trip time to a target host. Raw ICMP sockets may
//! need elevated privileges (or `net.ipv4.ping_group_range` on Linux); socket
//! creation failures are reported as unanswered probes.

use std::net::IpAddr;
use std::sync::atomic::{AtomicU16, Ordering};
use std::time::Duration;

use surge_ping::{Client, Config, ICMP, PingIdentifier, PingSequence};

use super::traits::Probe;

/// Resolve hostname to IP address.
pub async fn resolve_host(host: &str) -> Result<IpAddr, std::io::Error> {
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok(ip);
    }

    let addrs = tokio::net::lookup_host(format!("{host}:0")).await?;
    addrs
        .into_iter()
        .next()
        .map(|addr| addr.ip())
        .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::NotFound, "no addresses found"))
}

/// ICMP echo probe.
///
/// Each probe uses a fresh random identifier and the next sequence number,
/// so replies to overlapping probes are not confused.
#[derive(Debug, Default)]
pub struct PingProbe {
    sequence: AtomicU16,
}

impl PingProbe {
    /// Create a ping probe.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl Probe for PingProbe {
    async fn probe(&self, host: &str, timeout: Duration) -> Option<f64> {
        let ip_addr = match resolve_host(host).await {
            Ok(ip) => ip,
            Err(e) => {
                tracing::warn!(host = %host, error = %e, "Failed to resolve hostname");
                return None;
            }
        };

        let client = match ip_addr {
            IpAddr::V4(_) => Client::new(&Config::default()),
            IpAddr::V6(_) => Client::new(&Config::builder().kind(ICMP::V6).build()),
        };
        let client = match client {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(host = %host, error = %e, "Failed to create ICMP client");
                return None;
            }
        };

        let mut pinger = client.pinger(ip_addr, PingIdentifier(rand::random())).await;
        pinger.timeout(timeout);

        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        match pinger.ping(PingSequence(sequence), &[]).await {
            Ok((_, rtt)) => {
                let ms = rtt.as_secs_f64() * 1000.0;
                tracing::trace!(host = %host, latency_ms = ms, "Ping answered");
                Some(ms)
            }
            Err(e) => {
                tracing::debug!(host = %host, error = %e, "Ping unanswered");
                None
            }
        }
    }
}
