//! Error types used by the scriptvisor runtime.
//!
//! This module defines two enums:
//!
//! - [`ConfigError`]: a [`SupervisorConfig`](crate::SupervisorConfig) that cannot be supervised.
//! - [`RuntimeError`]: failures of the supervisor itself.
//!
//! Child failures are **not** errors: they are handled by the restart policy
//! and end, at worst, in a terminal [`Outcome`](crate::Outcome).

use std::time::Duration;
use thiserror::Error;

/// # Invalid supervisor configuration.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// No script was configured.
    #[error("script path is empty")]
    EmptyScript,

    /// Growth must be finite and in `[0, 1)`.
    #[error("restart delay growth {growth} is outside [0, 1)")]
    InvalidGrowth {
        /// Rejected value.
        growth: f64,
    },

    /// Signed retry count below `-1`.
    #[error("max retries {value} is invalid (use -1 for unlimited)")]
    InvalidMaxRetries {
        /// Rejected value.
        value: i64,
    },

    /// Restart delay given in seconds was negative or not finite.
    #[error("restart delay {secs}s is invalid")]
    InvalidDelay {
        /// Rejected value.
        secs: f64,
    },

    /// The rolling window must be longer than zero.
    #[error("restart window {window:?} must be greater than zero")]
    ZeroWindow {
        /// Rejected value.
        window: Duration,
    },

    /// Environment entry without `=`.
    #[error("environment entry {entry:?} is not KEY=VALUE")]
    InvalidEnv {
        /// Rejected entry.
        entry: String,
    },
}

impl ConfigError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::EmptyScript => "config_empty_script",
            ConfigError::InvalidGrowth { .. } => "config_invalid_growth",
            ConfigError::InvalidMaxRetries { .. } => "config_invalid_max_retries",
            ConfigError::InvalidDelay { .. } => "config_invalid_delay",
            ConfigError::ZeroWindow { .. } => "config_zero_window",
            ConfigError::InvalidEnv { .. } => "config_invalid_env",
        }
    }
}

/// # Errors produced by the supervisor runtime.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Configuration rejected at build time.
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    /// OS signal handlers could not be installed.
    #[error("failed to subscribe to shutdown signals: {0}")]
    SignalSubscription(#[source] std::io::Error),
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use scriptvisor::{ConfigError, RuntimeError};
    ///
    /// let err = RuntimeError::from(ConfigError::EmptyScript);
    /// assert_eq!(err.as_label(), "runtime_invalid_config");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::InvalidConfig(_) => "runtime_invalid_config",
            RuntimeError::SignalSubscription(_) => "runtime_signal_subscription",
        }
    }
}
