//! TCP connect probe.
//!
//! Measures TCP connection latency to `host:port`. Useful where ICMP is
//! filtered or raw sockets are not permitted.

use std::time::{Duration, Instant};

use tokio::net::TcpStream;

use super::traits::Probe;

/// TCP connect-time probe against a fixed port.
#[derive(Debug, Clone, Copy)]
pub struct TcpProbe {
    port: u16,
}

impl TcpProbe {
    /// Create a probe connecting to `port`.
    pub fn new(port: u16) -> Self {
        Self { port }
    }

    /// Target port.
    pub fn port(&self) -> u16 {
        self.port
    }
}

#[async_trait::async_trait]
impl Probe for TcpProbe {
    async fn probe(&self, host: &str, timeout: Duration) -> Option<f64> {
        let start = Instant::now();
        let result = tokio::time::timeout(timeout, TcpStream::connect((host, self.port))).await;
        let elapsed = start.elapsed();

        match result {
            Ok(Ok(_stream)) => {
                let ms = elapsed.as_secs_f64() * 1000.0;
                tracing::trace!(host = %host, port = self.port, latency_ms = ms, "TCP probe successful");
                Some(ms)
            }
            Ok(Err(e)) => {
                tracing::debug!(host = %host, port = self.port, error = %e, "TCP probe failed");
                None
            }
            Err(_) => {
                tracing::debug!(host = %host, port = self.port, timeout_ms = timeout.as_millis(), "TCP probe timed out");
                None
            }
        }
    }
}
