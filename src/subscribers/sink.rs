//! # Leveled log sink.
//!
//! [`LogSink`] is the supervisor's view of the host's log: three leveled write
//! operations, each taking a message and a numeric event code. Writes are
//! best-effort; a sink swallows its own failures.
//!
//! [`TracingSink`] is the default implementation and forwards every write to
//! [`tracing`] with the configured log source and channel attached as fields:
//! ```text
//! WARN scriptvisor: restarted after 1250 ms; attempts = 2 source="worker" channel=application code=1004
//! ```

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Destination log selected for supervisor entries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LogChannel {
    /// Application log (default).
    #[default]
    Application,
    /// System log.
    System,
}

impl LogChannel {
    /// Lower-case channel name.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogChannel::Application => "application",
            LogChannel::System => "system",
        }
    }
}

impl fmt::Display for LogChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogChannel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "application" | "app" => Ok(LogChannel::Application),
            "system" | "sys" => Ok(LogChannel::System),
            other => Err(format!("unknown log channel {other:?}")),
        }
    }
}

/// Leveled write operations consumed by the supervisor.
pub trait LogSink: Send + Sync + 'static {
    fn info(&self, message: &str, code: u32);
    fn warn(&self, message: &str, code: u32);
    fn error(&self, message: &str, code: u32);
}

/// [`LogSink`] writing through `tracing`.
#[derive(Clone, Debug)]
pub struct TracingSink {
    source: Arc<str>,
    channel: LogChannel,
}

impl TracingSink {
    /// Creates a sink tagging every entry with `source` and `channel`.
    pub fn new(source: impl Into<Arc<str>>, channel: LogChannel) -> Self {
        Self {
            source: source.into(),
            channel,
        }
    }

    /// Log source identifier.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Selected channel.
    pub fn channel(&self) -> LogChannel {
        self.channel
    }
}

impl LogSink for TracingSink {
    fn info(&self, message: &str, code: u32) {
        tracing::info!(source = %self.source, channel = %self.channel, code, "{message}");
    }

    fn warn(&self, message: &str, code: u32) {
        tracing::warn!(source = %self.source, channel = %self.channel, code, "{message}");
    }

    fn error(&self, message: &str, code: u32) {
        tracing::error!(source = %self.source, channel = %self.channel, code, "{message}");
    }
}
