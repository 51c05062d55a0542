//! Periodic probe scheduler.
//!
//! One driver task ticks at the configured interval and spawns one probe task
//! per tick. Probe tasks run concurrently with each other and with the driver;
//! a slow probe never delays the next tick. Every completion goes through a
//! single mpsc channel to the [`Recorder`], which owns the history.
//!
//! ```text
//! driver ──tick──► probe task ─┐
//!        ──tick──► probe task ─┼──mpsc──► Recorder ──► observers
//!        ──tick──► probe task ─┘
//! ```

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::error::MonitorError;
use super::observer::{MonitorObserver, ObserverSet};
use super::recorder::Recorder;
use super::sample::Sample;
use super::status::Thresholds;
use crate::probe::Probe;

/// Default probe interval (1 second).
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

/// Default probe timeout (1 second).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

/// Default history capacity (one minute at the default interval).
pub const DEFAULT_CAPACITY: NonZeroUsize = NonZeroUsize::new(60).unwrap();

/// Default completion channel capacity.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// Minimum time allowed for the recorder to drain on shutdown.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Runtime settings for one [`Monitor`].
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Target host (hostname or IP address).
    pub host: String,
    /// Time between probe dispatches.
    pub interval: Duration,
    /// Per-probe timeout.
    pub timeout: Duration,
    /// Number of samples kept in the history.
    pub capacity: NonZeroUsize,
    /// Classification thresholds.
    pub thresholds: Thresholds,
    /// Capacity of the completion channel.
    pub channel_capacity: usize,
}

impl MonitorConfig {
    /// Create a configuration with defaults for everything but the host.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            interval: DEFAULT_INTERVAL,
            timeout: DEFAULT_TIMEOUT,
            capacity: DEFAULT_CAPACITY,
            thresholds: Thresholds::default(),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }

    /// Set the probe interval.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Set the probe timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the history capacity.
    pub fn with_capacity(mut self, capacity: NonZeroUsize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Set classification thresholds.
    pub fn with_thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Set the completion channel capacity.
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }

    /// Check the values the driver loop relies on.
    ///
    /// # Errors
    /// Returns `MonitorError::InvalidConfig` for a zero interval or timeout.
    pub fn validate(&self) -> Result<(), MonitorError> {
        if self.interval.is_zero() {
            return Err(MonitorError::InvalidConfig(
                "interval must be greater than zero".to_string(),
            ));
        }
        if self.timeout.is_zero() {
            return Err(MonitorError::InvalidConfig(
                "timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Scheduler lifecycle state.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SchedulerState {
    /// Created, not started yet.
    Idle,
    /// Probing periodically.
    Running,
    /// Terminal; no further probes are dispatched.
    Stopped,
}

/// Connection monitor: probe scheduler plus its recorder.
pub struct Monitor {
    config: MonitorConfig,
    probe: Arc<dyn Probe>,
    observers: ObserverSet,
    state: SchedulerState,
    stop_tx: Option<watch::Sender<bool>>,
    driver: Option<JoinHandle<()>>,
    recorder: Option<JoinHandle<Recorder>>,
}

impl Monitor {
    /// Create an idle monitor.
    pub fn new(config: MonitorConfig, probe: impl Probe) -> Self {
        Self {
            config,
            probe: Arc::new(probe),
            observers: ObserverSet::new(),
            state: SchedulerState::Idle,
            stop_tx: None,
            driver: None,
            recorder: None,
        }
    }

    /// Register an observer while building the monitor.
    pub fn with_observer(mut self, observer: impl MonitorObserver) -> Self {
        self.observers.push(Arc::new(observer));
        self
    }

    /// Register a shared observer.
    ///
    /// # Errors
    /// Returns `MonitorError::InvalidState` once the monitor has been started.
    pub fn add_observer(&mut self, observer: Arc<dyn MonitorObserver>) -> Result<(), MonitorError> {
        if self.state != SchedulerState::Idle {
            return Err(MonitorError::InvalidState {
                operation: "add observer to",
                state: self.state,
            });
        }
        self.observers.push(observer);
        Ok(())
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Monitor configuration.
    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Start probing. Must be called from within a Tokio runtime.
    ///
    /// # Errors
    /// Returns `MonitorError::InvalidState` unless the monitor is idle.
    pub fn start(&mut self) -> Result<(), MonitorError> {
        if self.state != SchedulerState::Idle {
            return Err(MonitorError::InvalidState {
                operation: "start",
                state: self.state,
            });
        }
        self.config.validate()?;
        if self.observers.is_empty() {
            tracing::warn!(host = %self.config.host, "Monitor has no observers");
        }

        let (tx, rx) = mpsc::channel(self.config.channel_capacity.max(1));
        let (stop_tx, stop_rx) = watch::channel(false);

        let recorder = Recorder::new(
            self.config.capacity,
            self.config.thresholds,
            self.observers.clone(),
        );
        self.recorder = Some(tokio::spawn(recorder.run(rx)));
        self.driver = Some(tokio::spawn(drive(
            self.config.clone(),
            Arc::clone(&self.probe),
            tx,
            stop_rx,
        )));
        self.stop_tx = Some(stop_tx);
        self.state = SchedulerState::Running;

        tracing::info!(
            host = %self.config.host,
            interval = ?self.config.interval,
            timeout = ?self.config.timeout,
            capacity = self.config.capacity.get(),
            observers = self.observers.len(),
            "Monitor started"
        );
        Ok(())
    }

    /// Stop dispatching probes.
    ///
    /// Idempotent. Waits for the driver loop only, never for in-flight probes;
    /// their results may still be recorded afterwards.
    pub async fn stop(&mut self) -> Result<(), MonitorError> {
        match self.state {
            SchedulerState::Stopped => return Ok(()),
            SchedulerState::Idle => {
                self.state = SchedulerState::Stopped;
                return Ok(());
            }
            SchedulerState::Running => {}
        }
        self.state = SchedulerState::Stopped;

        if let Some(stop_tx) = self.stop_tx.take() {
            // The driver may already be gone; nothing to signal then.
            let _ = stop_tx.send(true);
        }
        if let Some(driver) = self.driver.take() {
            driver.await?;
        }

        tracing::info!(host = %self.config.host, "Monitor stopped");
        Ok(())
    }

    /// Stop and wait for in-flight probes to be recorded, with default timeout.
    pub async fn shutdown(self) -> Result<Option<Recorder>, MonitorError> {
        let timeout = DEFAULT_SHUTDOWN_TIMEOUT.max(self.config.timeout.saturating_mul(2));
        self.shutdown_with_timeout(timeout).await
    }

    /// Stop and wait up to `timeout` for the recorder to drain.
    ///
    /// Returns the final recorder, or `None` if the monitor never started.
    pub async fn shutdown_with_timeout(
        mut self,
        timeout: Duration,
    ) -> Result<Option<Recorder>, MonitorError> {
        self.stop().await?;

        let Some(handle) = self.recorder.take() else {
            return Ok(None);
        };
        match tokio::time::timeout(timeout, handle).await {
            Ok(joined) => Ok(Some(joined?)),
            Err(_) => {
                tracing::warn!(host = %self.config.host, ?timeout, "Recorder drain timed out");
                Err(MonitorError::ShutdownTimeout(timeout))
            }
        }
    }
}

impl std::fmt::Debug for Monitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Monitor")
            .field("config", &self.config)
            .field("state", &self.state)
            .field("observers", &self.observers)
            .finish_non_exhaustive()
    }
}

/// Driver loop: one probe dispatch per tick until stopped.
///
/// Also exits when the stop sender is dropped, so dropping a running
/// [`Monitor`] stops it.
async fn drive(
    config: MonitorConfig,
    probe: Arc<dyn Probe>,
    tx: mpsc::Sender<Sample>,
    mut stop_rx: watch::Receiver<bool>,
) {
    let host: Arc<str> = Arc::from(config.host.as_str());
    let mut ticker = tokio::time::interval(config.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut last_dispatch = None;
    let mut dispatched: u64 = 0;

    loop {
        tokio::select! {
            biased;
            _ = stop_rx.changed() => break,
            _ = ticker.tick() => {
                let taken_at = dispatch_time(last_dispatch);
                last_dispatch = Some(taken_at);
                dispatched += 1;
                dispatch(
                    Arc::clone(&probe),
                    Arc::clone(&host),
                    config.timeout,
                    taken_at,
                    tx.clone(),
                );
            }
        }
    }

    tracing::debug!(host = %host, dispatched, "Driver stopped");
}

/// Dispatch timestamp, strictly increasing across ticks even if the wall
/// clock stalls or steps back.
fn dispatch_time(last: Option<DateTime<Utc>>) -> DateTime<Utc> {
    let now = Utc::now();
    match last {
        Some(prev) if now <= prev => prev + TimeDelta::microseconds(1),
        _ => now,
    }
}

/// Run one probe in its own task and send the sample to the recorder.
fn dispatch(
    probe: Arc<dyn Probe>,
    host: Arc<str>,
    timeout: Duration,
    taken_at: DateTime<Utc>,
    tx: mpsc::Sender<Sample>,
) {
    tokio::spawn(async move {
        let latency_ms = match tokio::time::timeout(timeout, probe.probe(&host, timeout)).await {
            Ok(latency) => latency,
            Err(_) => {
                tracing::debug!(host = %host, timeout_ms = timeout.as_millis(), "Probe timed out");
                None
            }
        };

        if tx.send(Sample::new(taken_at, latency_ms)).await.is_err() {
            tracing::debug!(host = %host, "Recorder gone, dropping sample");
        }
    });
}
