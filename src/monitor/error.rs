//! Monitor error types.

use thiserror::Error;

use super::scheduler::SchedulerState;

/// Errors returned by [`Monitor`](super::Monitor) lifecycle calls.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// Operation not allowed in the current scheduler state.
    #[error("cannot {operation} monitor in state {state}")]
    InvalidState {
        /// Attempted operation.
        operation: &'static str,
        /// State at the time of the call.
        state: SchedulerState,
    },

    /// Monitor configuration cannot be run.
    #[error("invalid monitor config: {0}")]
    InvalidConfig(String),

    /// Consumer task did not drain in time during shutdown.
    #[error("shutdown timed out after {0:?}")]
    ShutdownTimeout(std::time::Duration),

    /// A monitor task panicked or was cancelled.
    #[error("task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
