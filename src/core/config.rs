//! # Supervisor configuration.
//!
//! Provides [`SupervisorConfig`]: everything a supervisor needs, fixed for its
//! lifetime. The policy objects the monitor works with ([`RestartPolicy`],
//! [`BackoffPolicy`], [`RateLimiter`]) and the [`LaunchSpec`] are derived from it.
//!
//! ## Sentinel values
//! - `max_retries = None` → unlimited (the CLI accepts `-1`)
//! - `shutdown_grace = None` → never force-kill after a graceful request
//! - `log_source = None` → the script's file stem

use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;
use crate::policies::{BackoffPolicy, JitterPolicy, RateLimiter, RestartPolicy};
use crate::process::LaunchSpec;
use crate::subscribers::LogChannel;

/// Configuration for one supervised script.
///
/// ## Field semantics
/// - `max_retries`: restarts allowed since the last stable run (`None` = unlimited)
/// - `max_restarts`: restarts allowed inside one `restart_window`
/// - `restart_delay`: wait before the first restart
/// - `restart_delay_growth`: fractional growth per consecutive failure, in `[0, 1)`
/// - `restart_window`: rolling window for the rate limit and the stability reset
/// - `abort_on_error`: stop supervising on a non-zero exit
/// - `stop_parent_first`: on shutdown, ask the child to exit instead of killing it
#[derive(Clone, Debug)]
pub struct SupervisorConfig {
    /// Script to keep alive.
    pub script: PathBuf,
    /// Optional interpreter the script is run with (e.g. `python3`).
    pub interpreter: Option<PathBuf>,
    /// Arguments passed to the script.
    pub args: Vec<OsString>,
    /// Working directory of the child (`None` = inherit).
    pub cwd: Option<PathBuf>,
    /// Extra environment for the child.
    pub env: Vec<(OsString, OsString)>,

    /// Total restart budget (`None` = unlimited).
    pub max_retries: Option<u32>,
    /// Restarts allowed per rolling window.
    pub max_restarts: u32,
    /// Base wait before a restart.
    pub restart_delay: Duration,
    /// Growth of the wait per consecutive failure.
    pub restart_delay_growth: f64,
    /// Jitter applied to each wait.
    pub jitter: JitterPolicy,
    /// Rolling window length.
    pub restart_window: Duration,
    /// Stop supervising when the child exits with an error.
    pub abort_on_error: bool,

    /// Ask the child to stop (message) instead of killing it on shutdown.
    pub stop_parent_first: bool,
    /// Line written to the child's stdin on a graceful shutdown.
    pub shutdown_message: String,
    /// Force-kill after this long if the child ignores the shutdown message.
    pub shutdown_grace: Option<Duration>,

    /// Log source identifier (`None` = script file stem).
    pub log_source: Option<String>,
    /// Log channel selector.
    pub log_channel: LogChannel,
    /// Capacity of the event bus ring buffer (min 1).
    pub bus_capacity: usize,
}

impl SupervisorConfig {
    /// Default rolling window.
    pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

    /// Creates a configuration for `script` with all defaults:
    ///
    /// - `max_retries = None` (unlimited)
    /// - `max_restarts = 5`
    /// - `restart_delay = 1s`, `restart_delay_growth = 0.25`, no jitter
    /// - `restart_window = 60s`
    /// - `abort_on_error = false`, `stop_parent_first = false`
    /// - `shutdown_message = "shutdown"`, `shutdown_grace = None`
    /// - `log_channel = Application`, `bus_capacity = 1024`
    pub fn new(script: impl Into<PathBuf>) -> Self {
        Self {
            script: script.into(),
            interpreter: None,
            args: Vec::new(),
            cwd: None,
            env: Vec::new(),
            max_retries: None,
            max_restarts: 5,
            restart_delay: Duration::from_secs(1),
            restart_delay_growth: 0.25,
            jitter: JitterPolicy::None,
            restart_window: Self::DEFAULT_WINDOW,
            abort_on_error: false,
            stop_parent_first: false,
            shutdown_message: "shutdown".to_string(),
            shutdown_grace: None,
            log_source: None,
            log_channel: LogChannel::Application,
            bus_capacity: 1024,
        }
    }

    /// Checks the values the monitor cannot sanity-check itself.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.script.as_os_str().is_empty() {
            return Err(ConfigError::EmptyScript);
        }
        let growth = self.restart_delay_growth;
        if !growth.is_finite() || !(0.0..1.0).contains(&growth) {
            return Err(ConfigError::InvalidGrowth { growth });
        }
        if self.restart_window.is_zero() {
            return Err(ConfigError::ZeroWindow {
                window: self.restart_window,
            });
        }
        Ok(())
    }

    /// Maps the signed retry count used on the command line (`-1` = unlimited).
    pub fn max_retries_from_signed(value: i64) -> Result<Option<u32>, ConfigError> {
        match value {
            -1 => Ok(None),
            v if v < -1 => Err(ConfigError::InvalidMaxRetries { value }),
            v => Ok(Some(u32::try_from(v).unwrap_or(u32::MAX))),
        }
    }

    /// Converts fractional seconds into a [`Duration`].
    pub fn duration_from_secs(secs: f64) -> Result<Duration, ConfigError> {
        if !secs.is_finite() || secs < 0.0 {
            return Err(ConfigError::InvalidDelay { secs });
        }
        Duration::try_from_secs_f64(secs).map_err(|_| ConfigError::InvalidDelay { secs })
    }

    /// Parses a `KEY=VALUE` environment entry.
    pub fn parse_env(entry: &str) -> Result<(OsString, OsString), ConfigError> {
        match entry.split_once('=') {
            Some((key, value)) if !key.is_empty() => Ok((key.into(), value.into())),
            _ => Err(ConfigError::InvalidEnv {
                entry: entry.to_string(),
            }),
        }
    }

    /// Restart budget and abort rule.
    #[inline]
    pub fn restart_policy(&self) -> RestartPolicy {
        RestartPolicy {
            max_retries: self.max_retries,
            abort_on_error: self.abort_on_error,
        }
    }

    /// Backoff built from `restart_delay`, `restart_delay_growth` and `jitter`.
    #[inline]
    pub fn backoff(&self) -> BackoffPolicy {
        BackoffPolicy {
            base: self.restart_delay,
            growth: self.restart_delay_growth,
            jitter: self.jitter,
        }
    }

    /// A fresh rate limiter for `max_restarts` per `restart_window`.
    #[inline]
    pub fn rate_limiter(&self) -> RateLimiter {
        RateLimiter::new(self.max_restarts, self.restart_window)
    }

    /// The command line used for every launch.
    pub fn launch_spec(&self) -> LaunchSpec {
        LaunchSpec {
            script: self.script.clone(),
            interpreter: self.interpreter.clone(),
            args: self.args.clone(),
            cwd: self.cwd.clone(),
            env: self.env.clone(),
        }
    }

    /// Log source, falling back to the script's file stem.
    pub fn log_source(&self) -> String {
        if let Some(source) = &self.log_source {
            return source.clone();
        }
        self.script
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "scriptvisor".to_string())
    }

    /// Bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}
