//! Restart, backoff and rate-limit policies.
//!
//! This module groups the knobs that control **if/when** the child is
//! restarted and **how long** to wait between attempts.
//!
//! ## Contents
//! - [`RestartPolicy`] abort-on-error and total retry budget
//! - [`BackoffPolicy`] how restart waits grow (base × (1 + growth)^n + jitter)
//! - [`JitterPolicy`]  optional randomization of the wait
//! - [`RateLimiter`]   restarts allowed per rolling window
//!
//! ## Quick wiring
//! ```text
//! SupervisorConfig
//!      └─► core::monitor::Monitor uses:
//!           - restart to decide abort / budget
//!           - limiter to refuse crash loops inside one window
//!           - backoff.next(attempts) to schedule the next launch
//! ```
//!
//! ## Defaults
//! - `RestartPolicy::default()` → unlimited retries, no abort on error.
//! - `BackoffPolicy::default()` → base=1s, growth=0.25, jitter=None.
//! - `RateLimiter` → 5 restarts per 60s (built from config).

mod backoff;
mod jitter;
mod rate;
mod restart;

pub use backoff::BackoffPolicy;
pub use jitter::JitterPolicy;
pub use rate::RateLimiter;
pub use restart::RestartPolicy;
