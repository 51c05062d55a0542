//! Probe primitives.
//!
//! A probe measures one round trip to a host and reports the latency, or
//! `None` when no answer arrived. Unreachability is an observation, not an
//! error: probes never fail, they log the cause and report `None`.
//!
//! - [`PingProbe`]: ICMP echo
//! - [`TcpProbe`]: TCP connect time to a fixed port

mod ping;
mod tcp;
mod traits;

pub use ping::{PingProbe, resolve_host};
pub use tcp::TcpProbe;
pub use traits::{Probe, ProbeKind};
