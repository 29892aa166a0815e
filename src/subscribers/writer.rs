//! # SinkWriter: events to log sink
//!
//! A subscriber that renders supervisor [`Event`]s as log lines and writes
//! them to a [`LogSink`] at the event's level. Debug-level events are not
//! forwarded.
//!
//! ## Example output
//! ```text
//! [info]  starting worker.sh
//! [warn]  worker.sh stopped running (exit code 1)
//! [info]  restart of worker.sh scheduled in 1000 ms
//! [warn]  restarted after 1000 ms; attempts = 1
//! [error] too many restarts within the last 60 seconds
//! [info]  process killed
//! ```

use std::sync::Arc;

use async_trait::async_trait;

use crate::events::{Event, EventKind, Level};
use crate::subscribers::{LogSink, Subscribe};

/// Subscriber forwarding events to a [`LogSink`].
pub struct SinkWriter {
    sink: Arc<dyn LogSink>,
}

impl SinkWriter {
    /// Construct a new [`SinkWriter`] over `sink`.
    #[must_use]
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self { sink }
    }
}

#[async_trait]
impl Subscribe for SinkWriter {
    async fn on_event(&self, e: &Event) {
        let Some(message) = render(e) else {
            return;
        };
        let code = e.code_id();
        match e.level() {
            Level::Debug => {}
            Level::Info => self.sink.info(&message, code),
            Level::Warn => self.sink.warn(&message, code),
            Level::Error => self.sink.error(&message, code),
        }
    }

    fn name(&self) -> &'static str {
        "sink-writer"
    }
}

/// Renders the log line for an event; `None` for events that are not logged.
pub fn render(e: &Event) -> Option<String> {
    let script = e.script.as_deref().unwrap_or("<script>");
    let reason = e.reason.as_deref().unwrap_or("unknown");

    let line = match e.kind {
        EventKind::ProcessStarted => return None,

        EventKind::ProcessStarting => format!("starting {script}"),
        EventKind::SpawnFailed => format!("failed to start {script}: {reason}"),
        EventKind::ProcessExited => format!("{script} stopped running ({})", status(e)),
        EventKind::RestartScheduled => format!(
            "restart of {script} scheduled in {} ms",
            e.delay_ms.unwrap_or(0)
        ),
        EventKind::ProcessRestarted => format!(
            "restarted after {} ms; attempts = {}",
            e.delay_ms.unwrap_or(0),
            e.attempt.unwrap_or(0)
        ),
        EventKind::StableWindowReached => format!(
            "{script} ran for {} seconds without exiting; restart counters reset",
            e.delay_ms.unwrap_or(0) / 1000
        ),

        EventKind::ShutdownRequested => format!("shutdown requested ({reason})"),
        EventKind::GracefulStopSent => format!("sent shutdown message to {script}"),
        EventKind::ForceKillSent => format!("force-terminating {script} ({reason})"),
        EventKind::NoChildToStop => {
            "shutdown requested but no child process is running".to_string()
        }
        EventKind::StopFailed => format!("failed to stop {script}: {reason}"),

        EventKind::ProcessKilled => "process killed".to_string(),
        EventKind::AbortedOnError => match e.code {
            Some(code) => format!("{script} exited with error code {code}"),
            None => format!("{script} exited with error code unknown ({})", status(e)),
        },
        EventKind::TooManyRestarts => format!(
            "too many restarts within the last {} seconds",
            e.delay_ms.unwrap_or(0) / 1000
        ),
        EventKind::RetriesExhausted => format!(
            "maximum total restarts exceeded; {script} will not be restarted (attempts = {})",
            e.attempt.unwrap_or(0)
        ),

        EventKind::SubscriberPanicked => format!("subscriber {script} panicked: {reason}"),
        EventKind::SubscriberOverflow => format!("subscriber dropped an event: {reason}"),
    };
    Some(line)
}

fn status(e: &Event) -> String {
    match (e.code, e.signal) {
        (Some(code), _) => format!("exit code {code}"),
        (None, Some(sig)) => format!("signal {sig}"),
        (None, None) => "no exit code".to_string(),
    }
}
