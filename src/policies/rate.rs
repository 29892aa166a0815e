//! # Rolling-window restart limiter.
//!
//! [`RateLimiter`] caps how many restarts may happen inside any window of
//! `window` length, independently of the backoff wait and of the total retry
//! budget.
//!
//! ## Window semantics
//! ```text
//! restart at t               ─► log.push(t)
//! check at now               ─► drop every t with now - t >= window
//! log.len() >= max_restarts  ─► limit exceeded
//! ```
//!
//! The window slides with `now`: it always covers the last `window` of
//! restarts, so a crash loop cannot double its budget by straddling a
//! boundary. The initial launch is not a restart and is never recorded.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::time::Instant;

/// Restarts-per-window limiter.
#[derive(Clone, Debug)]
pub struct RateLimiter {
    max_restarts: u32,
    window: Duration,
    restarts: VecDeque<Instant>,
}

impl RateLimiter {
    /// Creates a limiter allowing `max_restarts` restarts per `window`.
    pub fn new(max_restarts: u32, window: Duration) -> Self {
        Self {
            max_restarts,
            window,
            restarts: VecDeque::new(),
        }
    }

    /// Records a restart at `now`.
    pub fn record_restart(&mut self, now: Instant) {
        self.expire(now);
        self.restarts.push_back(now);
        // Only the newest `max_restarts` entries can decide `exceeded`.
        while self.restarts.len() > self.cap() {
            self.restarts.pop_front();
        }
    }

    /// Returns `true` if another restart at `now` would break the limit.
    pub fn exceeded(&mut self, now: Instant) -> bool {
        self.expire(now);
        self.restarts.len() >= self.cap()
    }

    /// Forgets every recorded restart.
    pub fn reset(&mut self) {
        self.restarts.clear();
    }

    /// Restarts recorded inside the window as of the last update.
    pub fn starts_in_window(&self) -> u32 {
        u32::try_from(self.restarts.len()).unwrap_or(u32::MAX)
    }

    /// Oldest restart still inside the window.
    pub fn window_start(&self) -> Option<Instant> {
        self.restarts.front().copied()
    }

    /// Configured window length.
    pub fn window(&self) -> Duration {
        self.window
    }

    fn cap(&self) -> usize {
        usize::try_from(self.max_restarts).unwrap_or(usize::MAX)
    }

    fn expire(&mut self, now: Instant) {
        while let Some(&oldest) = self.restarts.front() {
            if now.saturating_duration_since(oldest) < self.window {
                break;
            }
            self.restarts.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_secs(60);

    fn at(t0: Instant, ms: u64) -> Instant {
        t0 + Duration::from_millis(ms)
    }

    #[test]
    fn test_empty_limiter_allows_restart() {
        let t0 = Instant::now();
        let mut rl = RateLimiter::new(5, WINDOW);
        assert!(!rl.exceeded(t0));
        assert_eq!(rl.starts_in_window(), 0);
        assert_eq!(rl.window_start(), None);
    }

    #[test]
    fn test_exceeded_after_max_restarts_inside_window() {
        let t0 = Instant::now();
        let mut rl = RateLimiter::new(3, WINDOW);
        for i in 1..=3u64 {
            assert!(!rl.exceeded(at(t0, i * 1000)));
            rl.record_restart(at(t0, i * 1000));
        }
        assert!(rl.exceeded(at(t0, 10_000)));
        assert_eq!(rl.window_start(), Some(at(t0, 1000)));
    }

    #[test]
    fn test_old_restarts_slide_out() {
        let t0 = Instant::now();
        let mut rl = RateLimiter::new(2, WINDOW);
        rl.record_restart(at(t0, 1000));
        rl.record_restart(at(t0, 30_000));
        assert!(rl.exceeded(at(t0, 60_999)));

        // The first restart leaves the window; the second is still inside.
        assert!(!rl.exceeded(at(t0, 61_000)));
        assert_eq!(rl.starts_in_window(), 1);
        assert_eq!(rl.window_start(), Some(at(t0, 30_000)));
    }

    #[test]
    fn test_restarts_straddling_a_minute_mark_are_counted_together() {
        // A long first run, then a burst of crashes around t = 60s.
        let t0 = Instant::now();
        let mut rl = RateLimiter::new(2, WINDOW);
        assert!(!rl.exceeded(at(t0, 58_000)));
        rl.record_restart(at(t0, 58_100));
        assert!(!rl.exceeded(at(t0, 58_900)));
        rl.record_restart(at(t0, 59_000));
        assert!(rl.exceeded(at(t0, 60_500)));
        assert!(rl.exceeded(at(t0, 118_099)));
        assert!(!rl.exceeded(at(t0, 118_100)));
    }

    #[test]
    fn test_zero_max_restarts_blocks_first_restart() {
        let t0 = Instant::now();
        let mut rl = RateLimiter::new(0, WINDOW);
        assert!(rl.exceeded(t0));
    }

    #[test]
    fn test_log_is_bounded_by_max_restarts() {
        let t0 = Instant::now();
        let mut rl = RateLimiter::new(2, WINDOW);
        for i in 0..10u64 {
            rl.record_restart(at(t0, i));
        }
        assert_eq!(rl.starts_in_window(), 2);
        assert_eq!(rl.window_start(), Some(at(t0, 8)));
    }

    #[test]
    fn test_reset() {
        let t0 = Instant::now();
        let mut rl = RateLimiter::new(1, WINDOW);
        rl.record_restart(t0);
        assert!(rl.exceeded(t0));
        rl.reset();
        assert!(!rl.exceeded(t0));
        assert_eq!(rl.window_start(), None);
    }
}
