//! Conntester - Connection Quality Monitor
//!
//! Continuously probes a remote host, keeps a bounded rolling history of
//! samples, derives mean latency, last latency and packet loss, and
//! classifies the connection as good, bad or lost. Observers are told about
//! every recomputation and about each health transition, so a tray icon,
//! a sound or a notification can follow the link state without polling.
//!
//! # Architecture
//!
//! - **Probe**: Pluggable reachability primitive (ICMP echo, TCP connect)
//! - **Monitor**: Scheduler, bounded history, statistics, classification
//! - **Config**: YAML configuration loaded once at startup
//!
//! # Example
//!
//! ```rust,no_run
//! use conntester::{AppConfig, Monitor, TracingObserver};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load("configs/config.yaml")?;
//!     let mut monitor = Monitor::new(config.to_monitor_config()?, config.build_probe()?)
//!         .with_observer(TracingObserver::new(&config.monitor.host));
//!
//!     monitor.start()?;
//!     tokio::signal::ctrl_c().await?;
//!     monitor.shutdown().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod monitor;
pub mod probe;

pub use config::{AppConfig, ConfigError, MonitorSettings};
pub use monitor::{
    ChannelObserver, Classification, HealthState, History, Monitor, MonitorConfig, MonitorError,
    MonitorEvent, MonitorObserver, ObserverSet, Recorder, Sample, SchedulerState, Statistics,
    StatusClassifier, StatusTransition, Thresholds, TracingObserver,
};
pub use probe::{PingProbe, Probe, ProbeKind, TcpProbe};
