//! Monitoring Engine
//!
//! Sampling and classification core: probes are dispatched on a fixed
//! interval, their samples land in a bounded history, statistics are
//! recomputed from it and the connection health is classified on every
//! completion.
//!
//! # Architecture
//!
//! - [`Sample`]: One probe outcome (dispatch time, optional latency)
//! - [`History`]: Fixed-capacity FIFO of samples
//! - [`Statistics`]: Mean latency, last latency and loss over the history
//! - [`StatusClassifier`]: Maps statistics to a [`HealthState`], reporting transitions
//! - [`Monitor`]: Scheduler driving probes and funneling results to the [`Recorder`]
//! - [`MonitorObserver`]: Hook for display and side-effect consumers
//!
//! # Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use conntester::{Monitor, MonitorConfig, PingProbe, TracingObserver};
//!
//! # async fn run() -> Result<(), conntester::MonitorError> {
//! let config = MonitorConfig::new("8.8.8.8").with_interval(Duration::from_secs(1));
//! let mut monitor = Monitor::new(config, PingProbe::new())
//!     .with_observer(TracingObserver::new("8.8.8.8"));
//! monitor.start()?;
//! // ...
//! monitor.shutdown().await?;
//! # Ok(())
//! # }
//! ```

mod error;
mod history;
mod observer;
mod recorder;
mod sample;
mod scheduler;
mod stats;
mod status;

pub use error::MonitorError;
pub use history::{History, Snapshot, capacity_for};
pub use observer::{ChannelObserver, MonitorEvent, MonitorObserver, ObserverSet, TracingObserver};
pub use recorder::Recorder;
pub use sample::Sample;
pub use scheduler::{
    DEFAULT_CAPACITY, DEFAULT_CHANNEL_CAPACITY, DEFAULT_INTERVAL, DEFAULT_SHUTDOWN_TIMEOUT,
    DEFAULT_TIMEOUT, Monitor, MonitorConfig, SchedulerState,
};
pub use stats::{Statistics, last_latency, loss_pct, mean_latency};
pub use status::{
    Classification, DEFAULT_LATENCY_BAD_MS, DEFAULT_LOSS_BAD_PCT, DEFAULT_LOSS_LOST_PCT,
    HealthState, StatusClassifier, StatusTransition, Thresholds,
};
