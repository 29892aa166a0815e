//! # Events emitted by the supervisor.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Lifecycle events**: child launch and exit, restart scheduling
//! - **Shutdown events**: external termination requests and how they were served
//! - **Terminal events**: why supervision ended
//! - **Subscriber events**: delivery problems inside the fan-out
//!
//! Every kind carries a severity ([`Level`]) and a stable numeric code
//! ([`EventKind::code`]) so log sinks can file entries without parsing text.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically. Use `seq` to restore the order across subscribers.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use scriptvisor::{Event, EventKind, Level};
//!
//! let ev = Event::new(EventKind::ProcessRestarted)
//!     .with_script("worker.sh")
//!     .with_attempt(3)
//!     .with_delay(Duration::from_millis(1250));
//!
//! assert_eq!(ev.kind.level(), Level::Warn);
//! assert_eq!(ev.attempt, Some(3));
//! assert_eq!(ev.delay_ms, Some(1250));
//! ```

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Severity of an event, as understood by a [`LogSink`](crate::LogSink).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
        })
    }
}

/// Classification of supervisor events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    // === Lifecycle events ===
    /// First launch of the supervisor's lifetime is about to happen.
    ///
    /// Sets: `script`
    ProcessStarting,

    /// Child was spawned.
    ///
    /// Sets: `script`, `pid` (if known), `attempt` (0 for the initial launch)
    ProcessStarted,

    /// Child could not be spawned at all.
    ///
    /// Sets: `script`, `reason`
    SpawnFailed,

    /// Child terminated.
    ///
    /// Sets: `script`, `code` and/or `signal` (both absent for unknown status)
    ProcessExited,

    /// Restart timer armed.
    ///
    /// Sets: `script`, `delay_ms`, `attempt` (the attempt that will run)
    RestartScheduled,

    /// Restart timer fired and the child is being relaunched.
    ///
    /// Sets: `script`, `delay_ms` (the wait that elapsed), `attempt`
    ProcessRestarted,

    /// Child stayed up for a whole window; attempts, window and wait were reset.
    ///
    /// Sets: `script`, `delay_ms` (window length)
    StableWindowReached,

    // === Shutdown events ===
    /// External termination request observed.
    ///
    /// Sets: `reason` (signal or request name)
    ShutdownRequested,

    /// Cooperative shutdown message written to the child.
    ///
    /// Sets: `script`, `pid`
    GracefulStopSent,

    /// Child is being force-terminated.
    ///
    /// Sets: `script`, `pid`, `reason` (why the kill was needed)
    ForceKillSent,

    /// Shutdown requested while no child was alive.
    NoChildToStop,

    /// Delivering the shutdown message or kill failed.
    ///
    /// Sets: `script`, `reason`
    StopFailed,

    // === Terminal events ===
    /// Child exited after a shutdown request; supervision ends.
    ///
    /// Sets: `script`
    ProcessKilled,

    /// Child exited with an error while `abort_on_error` is set.
    ///
    /// Sets: `script`, `code`
    AbortedOnError,

    /// More than `max_restarts` restarts were needed inside one window.
    ///
    /// Sets: `script`, `delay_ms` (window length)
    TooManyRestarts,

    /// The total retry budget is exhausted.
    ///
    /// Sets: `script`, `attempt`
    RetriesExhausted,

    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets: `script` (subscriber name), `reason`
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets: `script` (subscriber name), `reason`
    SubscriberOverflow,
}

impl EventKind {
    /// Default severity.
    pub fn level(&self) -> Level {
        match self {
            EventKind::ProcessStarted => Level::Debug,

            EventKind::ProcessStarting
            | EventKind::RestartScheduled
            | EventKind::StableWindowReached
            | EventKind::ShutdownRequested
            | EventKind::GracefulStopSent
            | EventKind::ForceKillSent
            | EventKind::ProcessKilled => Level::Info,

            EventKind::ProcessExited
            | EventKind::ProcessRestarted
            | EventKind::NoChildToStop
            | EventKind::StopFailed
            | EventKind::SubscriberPanicked
            | EventKind::SubscriberOverflow => Level::Warn,

            EventKind::SpawnFailed
            | EventKind::AbortedOnError
            | EventKind::TooManyRestarts
            | EventKind::RetriesExhausted => Level::Error,
        }
    }

    /// Stable numeric code handed to log sinks (event-log "event id").
    pub fn code(&self) -> u32 {
        match self {
            EventKind::ProcessStarting => 1000,
            EventKind::ProcessStarted => 1001,
            EventKind::ProcessExited => 1002,
            EventKind::RestartScheduled => 1003,
            EventKind::ProcessRestarted => 1004,
            EventKind::StableWindowReached => 1005,
            EventKind::ShutdownRequested => 1100,
            EventKind::GracefulStopSent => 1101,
            EventKind::ForceKillSent => 1102,
            EventKind::NoChildToStop => 1103,
            EventKind::StopFailed => 1104,
            EventKind::ProcessKilled => 1105,
            EventKind::SpawnFailed => 1200,
            EventKind::AbortedOnError => 1201,
            EventKind::TooManyRestarts => 1202,
            EventKind::RetriesExhausted => 1203,
            EventKind::SubscriberOverflow => 1300,
            EventKind::SubscriberPanicked => 1301,
        }
    }

    /// Returns `true` for the kinds that end supervision.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            EventKind::ProcessKilled
                | EventKind::AbortedOnError
                | EventKind::TooManyRestarts
                | EventKind::RetriesExhausted
        )
    }
}

/// Supervisor event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Supervised script (or subscriber name for subscriber events).
    pub script: Option<Arc<str>>,
    /// OS process id of the child.
    pub pid: Option<u32>,
    /// Child exit code.
    pub code: Option<i32>,
    /// Signal that terminated the child.
    pub signal: Option<i32>,
    /// Restart attempt (1-based; 0 for the initial launch).
    pub attempt: Option<u32>,
    /// Wait or window length in milliseconds.
    pub delay_ms: Option<u64>,
    /// Human-readable reason (errors, signal names, overflow details).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            script: None,
            pid: None,
            code: None,
            signal: None,
            attempt: None,
            delay_ms: None,
            reason: None,
        }
    }

    /// Attaches the script name.
    #[inline]
    pub fn with_script(mut self, script: impl Into<Arc<str>>) -> Self {
        self.script = Some(script.into());
        self
    }

    /// Attaches a process id (no-op for `None`).
    #[inline]
    pub fn with_pid(mut self, pid: Option<u32>) -> Self {
        self.pid = pid;
        self
    }

    /// Attaches an exit code.
    #[inline]
    pub fn with_code(mut self, code: Option<i32>) -> Self {
        self.code = code;
        self
    }

    /// Attaches a terminating signal.
    #[inline]
    pub fn with_signal(mut self, signal: Option<i32>) -> Self {
        self.signal = signal;
        self
    }

    /// Attaches an attempt count.
    #[inline]
    pub fn with_attempt(mut self, n: u32) -> Self {
        self.attempt = Some(n);
        self
    }

    /// Attaches a delay (stored as milliseconds, saturating).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        self.delay_ms = Some(d.as_millis().min(u128::from(u64::MAX)) as u64);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_script(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_script(subscriber)
            .with_reason(info)
    }

    /// Severity of this event.
    #[inline]
    pub fn level(&self) -> Level {
        self.kind.level()
    }

    /// Numeric code of this event.
    #[inline]
    pub fn code_id(&self) -> u32 {
        self.kind.code()
    }

    #[inline]
    pub fn is_subscriber_event(&self) -> bool {
        matches!(
            self.kind,
            EventKind::SubscriberOverflow | EventKind::SubscriberPanicked
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seq_is_monotonic() {
        let a = Event::new(EventKind::ProcessStarted);
        let b = Event::new(EventKind::ProcessExited);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn test_codes_are_unique() {
        let kinds = [
            EventKind::ProcessStarting,
            EventKind::ProcessStarted,
            EventKind::SpawnFailed,
            EventKind::ProcessExited,
            EventKind::RestartScheduled,
            EventKind::ProcessRestarted,
            EventKind::StableWindowReached,
            EventKind::ShutdownRequested,
            EventKind::GracefulStopSent,
            EventKind::ForceKillSent,
            EventKind::NoChildToStop,
            EventKind::StopFailed,
            EventKind::ProcessKilled,
            EventKind::AbortedOnError,
            EventKind::TooManyRestarts,
            EventKind::RetriesExhausted,
            EventKind::SubscriberPanicked,
            EventKind::SubscriberOverflow,
        ];
        let mut codes: Vec<u32> = kinds.iter().map(EventKind::code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), kinds.len());
    }

    #[test]
    fn test_kind_levels() {
        assert_eq!(EventKind::ProcessKilled.level(), Level::Info);
        assert_eq!(EventKind::RestartScheduled.level(), Level::Info);
        assert_eq!(EventKind::AbortedOnError.level(), Level::Error);
        assert_eq!(EventKind::TooManyRestarts.level(), Level::Error);
        assert_eq!(EventKind::RetriesExhausted.level(), Level::Error);
        assert!(!EventKind::ProcessExited.is_terminal());
    }

    #[test]
    fn test_delay_saturates() {
        let ev = Event::new(EventKind::RestartScheduled).with_delay(Duration::MAX);
        assert_eq!(ev.delay_ms, Some(u64::MAX));
    }
}
