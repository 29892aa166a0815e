use std::fmt;
use std::time::Duration;

/// Why supervision ended.
///
/// Returned by [`Supervisor::start`](crate::Supervisor::start). None of these
/// are errors of the supervisor itself; a daemon maps them to an exit code
/// with [`Outcome::exit_code`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// A shutdown was requested and the child is gone.
    Shutdown,
    /// The child exited with an error while `abort_on_error` was set.
    AbortedOnError {
        /// Exit code (`None` if killed by a signal or never started).
        code: Option<i32>,
    },
    /// The rate limit was hit.
    TooManyRestarts {
        /// Restarts already made inside the window.
        restarts: u32,
        /// Window length.
        window: Duration,
    },
    /// The total retry budget was exhausted.
    RetriesExhausted {
        /// The attempt that was refused.
        attempts: u32,
    },
}

impl Outcome {
    /// `true` for [`Outcome::Shutdown`].
    pub fn is_shutdown(&self) -> bool {
        matches!(self, Outcome::Shutdown)
    }

    /// Process exit code for the daemon form: 0 for a requested shutdown, 1 otherwise.
    pub fn exit_code(&self) -> u8 {
        if self.is_shutdown() { 0 } else { 1 }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            Outcome::Shutdown => "shutdown",
            Outcome::AbortedOnError { .. } => "aborted_on_error",
            Outcome::TooManyRestarts { .. } => "too_many_restarts",
            Outcome::RetriesExhausted { .. } => "retries_exhausted",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Shutdown => f.write_str("stopped on request"),
            Outcome::AbortedOnError { code: Some(code) } => {
                write!(f, "aborted: child exited with error code {code}")
            }
            Outcome::AbortedOnError { code: None } => {
                f.write_str("aborted: child exited without an exit code")
            }
            Outcome::TooManyRestarts { restarts, window } => write!(
                f,
                "gave up: {restarts} restarts within {}s",
                window.as_secs()
            ),
            Outcome::RetriesExhausted { attempts } => {
                write!(f, "gave up: attempt {attempts} exceeds the retry budget")
            }
        }
    }
}
