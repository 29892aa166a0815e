//! # Jitter policy for restart waits.
//!
//! [`JitterPolicy`] adds randomness to a restart wait. A single supervisor only
//! ever restarts one child, so jitter matters when many supervisors share a
//! host and their children crash together (e.g. a shared dependency goes away).
//!
//! - [`JitterPolicy::None`]: no randomization, predictable waits (default)
//! - [`JitterPolicy::Full`]: random wait in [0, wait]
//! - [`JitterPolicy::Equal`]: wait/2 + random[0, wait/2]

use rand::Rng;
use std::time::Duration;

/// Policy controlling randomization of restart waits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum JitterPolicy {
    /// No jitter: use the exact backoff wait.
    #[default]
    None,

    /// Full jitter: random wait in [0, wait].
    ///
    /// Can restart almost immediately; use only when spreading load matters
    /// more than giving the child's dependencies time to recover.
    Full,

    /// Equal jitter: wait/2 + random[0, wait/2].
    ///
    /// Preserves ~75% of the backoff wait on average.
    Equal,
}

impl JitterPolicy {
    /// Applies jitter to the given wait.
    pub fn apply(&self, wait: Duration) -> Duration {
        match self {
            JitterPolicy::None => wait,
            JitterPolicy::Full => full_jitter(wait),
            JitterPolicy::Equal => equal_jitter(wait),
        }
    }
}

/// random[0, wait]
fn full_jitter(wait: Duration) -> Duration {
    let ms = saturating_millis(wait);
    if ms == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rand::rng().random_range(0..=ms))
}

/// wait/2 + random[0, wait/2]
fn equal_jitter(wait: Duration) -> Duration {
    let ms = saturating_millis(wait);
    if ms == 0 {
        return Duration::ZERO;
    }
    let half = ms / 2;
    let jitter = if half == 0 {
        0
    } else {
        rand::rng().random_range(0..=half)
    };
    Duration::from_millis(half + jitter)
}

fn saturating_millis(d: Duration) -> u64 {
    d.as_millis().min(u128::from(u64::MAX)) as u64
}
