//! Configuration module for the connection tester.
//!
//! Provides YAML-based configuration loading and validation for:
//! - Probe target and transport (host, icmp/tcp, port)
//! - Sampling (timeout, interval, history window)
//! - Health thresholds (latency, loss)
//!
//! Configuration is loaded once before the monitor starts; any invalid value
//! aborts startup.

mod app;
mod validation;

pub use app::{
    AppConfig, DEFAULT_HISTORY, DEFAULT_INTERVAL, DEFAULT_TIMEOUT, MAX_HISTORY_SAMPLES,
    MonitorSettings,
};
pub use validation::{ConfigError, expand_env_vars, parse_duration};
