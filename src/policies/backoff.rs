//! # Growth-factor backoff between restarts.
//!
//! [`BackoffPolicy`] controls how the wait before a restart grows while the
//! child keeps failing. It is parameterized by:
//! - [`BackoffPolicy::base`] the wait before the first restart;
//! - [`BackoffPolicy::growth`] the fractional growth per consecutive failure;
//! - [`BackoffPolicy::jitter`] optional randomization of the final wait.
//!
//! The wait before restart `n` (0-indexed since the last stable run) is
//! `base × (1 + growth)^n`. There is no cap: bounding growth is the job of the
//! configuration layer. Because the base wait is derived purely from the
//! restart count, jitter output never feeds back into later waits.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use scriptvisor::{BackoffPolicy, JitterPolicy};
//!
//! let backoff = BackoffPolicy {
//!     base: Duration::from_secs(1),
//!     growth: 0.25,
//!     jitter: JitterPolicy::None,
//! };
//!
//! assert_eq!(backoff.next(0), Duration::from_secs(1));
//! assert_eq!(backoff.next(1), Duration::from_millis(1250));
//! assert_eq!(backoff.next(2), Duration::from_micros(1_562_500));
//! ```

use std::time::Duration;

use crate::policies::jitter::JitterPolicy;

/// Restart backoff policy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BackoffPolicy {
    /// Wait before the first restart after a stable run.
    pub base: Duration,
    /// Fractional growth applied per consecutive failure (`0.25` = +25%).
    pub growth: f64,
    /// Jitter applied on top of the computed wait.
    pub jitter: JitterPolicy,
}

impl Default for BackoffPolicy {
    /// Returns a policy with:
    /// - `base = 1s`;
    /// - `growth = 0.25`;
    /// - `jitter = None`.
    fn default() -> Self {
        Self {
            base: Duration::from_secs(1),
            growth: 0.25,
            jitter: JitterPolicy::None,
        }
    }
}

impl BackoffPolicy {
    /// Multiplier applied per consecutive failure.
    #[inline]
    pub fn factor(&self) -> f64 {
        1.0 + self.growth
    }

    /// Computes the wait before the restart that follows `failures` earlier
    /// restarts since the last reset.
    ///
    /// # Notes
    /// - `growth == 0` keeps the wait constant at `base`.
    /// - A negative growth shrinks the wait; the result never goes below zero.
    /// - Results that do not fit into a [`Duration`] saturate at [`Duration::MAX`].
    pub fn next(&self, failures: u32) -> Duration {
        self.jitter.apply(self.unjittered(failures))
    }

    /// Same as [`next`](Self::next) without jitter.
    pub fn unjittered(&self, failures: u32) -> Duration {
        let exp = failures.min(i32::MAX as u32) as i32;
        let secs = self.base.as_secs_f64() * self.factor().powi(exp);

        if secs.is_nan() || secs <= 0.0 {
            return Duration::ZERO;
        }
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
    }
}
