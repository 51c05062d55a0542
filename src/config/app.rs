//! Application configuration structures.

use std::num::NonZeroUsize;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::monitor::{MonitorConfig, Thresholds, capacity_for};
use crate::probe::{PingProbe, Probe, ProbeKind, TcpProbe};

use super::validation::{ConfigError, expand_env_vars, require_non_zero, require_percent};

// =============================================================================
// Constants
// =============================================================================

/// Default probe interval (1 second).
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

/// Default probe timeout (1 second).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

/// Default history window (60 seconds).
pub const DEFAULT_HISTORY: Duration = Duration::from_secs(60);

/// Largest history, in samples, a configuration may ask for.
pub const MAX_HISTORY_SAMPLES: usize = 1_000_000;

fn default_interval() -> Duration {
    DEFAULT_INTERVAL
}

fn default_timeout() -> Duration {
    DEFAULT_TIMEOUT
}

fn default_history() -> Duration {
    DEFAULT_HISTORY
}

// =============================================================================
// Monitor Settings
// =============================================================================

/// Probe target and sampling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MonitorSettings {
    /// Target host (hostname or IP address).
    pub host: String,

    /// Probe transport (default: icmp).
    #[serde(default)]
    pub probe: ProbeKind,

    /// Target port, required for the tcp probe.
    #[serde(default)]
    pub port: Option<u16>,

    /// Per-probe timeout (default: 1s).
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,

    /// Time between probes (default: 1s).
    #[serde(default = "default_interval", with = "humantime_serde")]
    pub interval: Duration,

    /// Span of the rolling history (default: 60s).
    #[serde(default = "default_history", with = "humantime_serde")]
    pub history: Duration,
}

impl MonitorSettings {
    /// Create settings with defaults for everything but the host.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            probe: ProbeKind::default(),
            port: None,
            timeout: DEFAULT_TIMEOUT,
            interval: DEFAULT_INTERVAL,
            history: DEFAULT_HISTORY,
        }
    }

    /// Number of samples the history holds.
    ///
    /// # Errors
    /// Returns `ConfigError::ValidationError` if the window is shorter than
    /// half an interval or holds more than [`MAX_HISTORY_SAMPLES`].
    pub fn capacity(&self) -> Result<NonZeroUsize, ConfigError> {
        let capacity = capacity_for(self.history, self.interval).ok_or_else(|| {
            ConfigError::ValidationError(format!(
                "history ({:?}) must span at least one interval ({:?})",
                self.history, self.interval
            ))
        })?;

        if capacity.get() > MAX_HISTORY_SAMPLES {
            return Err(ConfigError::ValidationError(format!(
                "history ({:?}) at interval ({:?}) holds {} samples, more than {}",
                self.history, self.interval, capacity, MAX_HISTORY_SAMPLES
            )));
        }
        Ok(capacity)
    }
}

// =============================================================================
// Application Configuration
// =============================================================================

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Probe target and sampling settings.
    pub monitor: MonitorSettings,

    /// Health classification thresholds.
    #[serde(default)]
    pub thresholds: Thresholds,
}

impl AppConfig {
    /// Load configuration from a YAML file.
    ///
    /// `${VAR}` and `${VAR:-default}` references are expanded before parsing.
    ///
    /// # Errors
    /// Returns `ConfigError` if the file cannot be read, parsed, or validated.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse and validate configuration from YAML text.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(&expand_env_vars(content))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    /// Returns `ConfigError::ValidationError` if any field is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let monitor = &self.monitor;

        if monitor.host.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "monitor host cannot be empty".to_string(),
            ));
        }

        require_non_zero("monitor timeout", monitor.timeout)?;
        require_non_zero("monitor interval", monitor.interval)?;
        monitor.capacity()?;

        match (monitor.probe, monitor.port) {
            (ProbeKind::Tcp, None | Some(0)) => {
                return Err(ConfigError::ValidationError(
                    "tcp probe requires a non-zero port".to_string(),
                ));
            }
            (ProbeKind::Icmp, Some(port)) => {
                tracing::warn!(port, "Port is ignored by the icmp probe");
            }
            _ => {}
        }

        if monitor.timeout > monitor.interval {
            tracing::warn!(
                timeout = ?monitor.timeout,
                interval = ?monitor.interval,
                "Probe timeout exceeds interval; probes will overlap"
            );
        }

        let t = &self.thresholds;
        require_percent("thresholds loss_bad_pct", t.loss_bad_pct)?;
        require_percent("thresholds loss_lost_pct", t.loss_lost_pct)?;
        if t.loss_bad_pct > t.loss_lost_pct {
            return Err(ConfigError::ValidationError(format!(
                "thresholds loss_bad_pct ({}) must not exceed loss_lost_pct ({})",
                t.loss_bad_pct, t.loss_lost_pct
            )));
        }

        Ok(())
    }

    /// Build the runtime monitor configuration.
    pub fn to_monitor_config(&self) -> Result<MonitorConfig, ConfigError> {
        Ok(MonitorConfig::new(self.monitor.host.trim())
            .with_interval(self.monitor.interval)
            .with_timeout(self.monitor.timeout)
            .with_capacity(self.monitor.capacity()?)
            .with_thresholds(self.thresholds))
    }

    /// Build the configured probe.
    pub fn build_probe(&self) -> Result<Box<dyn Probe>, ConfigError> {
        match (self.monitor.probe, self.monitor.port) {
            (ProbeKind::Icmp, _) => Ok(Box::new(PingProbe::new())),
            (ProbeKind::Tcp, Some(port)) if port != 0 => Ok(Box::new(TcpProbe::new(port))),
            (ProbeKind::Tcp, _) => Err(ConfigError::ValidationError(
                "tcp probe requires a non-zero port".to_string(),
            )),
        }
    }
}
