//! # Restart state machine for one supervised child.
//!
//! [`Monitor`] owns every piece of mutable supervision state and decides what
//! happens after each lifecycle input. It performs no I/O and never sleeps: the
//! supervisor loop feeds it timestamps and acts on the decisions it returns.
//!
//! ## States
//! ```text
//!            launch                exit
//!   Idle ─────────────► Running ──────────► Exited
//!                          ▲                  │ rules 1-3 ─► Terminal
//!                          │ launch           │ rule 4
//!                          └──── RestartScheduled
//!                                     │ attempts > max_retries
//!                                     └──────────────────────► Terminal
//! ```
//!
//! ## Exit rules (first match wins)
//! 1. a shutdown was requested → `Terminal(Shutdown)`
//! 2. `abort_on_error` and the exit was an error → `Terminal(AbortedOnError)`
//! 3. restarts inside the last window reached `max_restarts` → `Terminal(TooManyRestarts)`
//! 4. otherwise schedule a restart after `base × (1 + growth)^attempts`
//!
//! When the restart timer fires, `attempts` is incremented and checked against
//! `max_retries`. A child that stays up for the whole window resets `attempts`,
//! the rate limiter and the wait.

use std::time::Duration;

use tokio::time::Instant;

use super::config::SupervisorConfig;
use super::outcome::Outcome;
use super::shutdown::ShutdownAction;
use crate::policies::{BackoffPolicy, RateLimiter, RestartPolicy};

/// Lifecycle state of the supervised child.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum MonitorState {
    /// Nothing launched yet.
    Idle,
    /// A child is alive.
    Running,
    /// The child is gone and the exit is being evaluated.
    Exited,
    /// Waiting for the restart timer.
    RestartScheduled,
    /// Supervision is over.
    Terminal,
}

/// Decision taken after the child exits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ExitDecision {
    Terminate(Outcome),
    Restart {
        /// Wait before the relaunch.
        delay: Duration,
    },
}

/// Decision taken when the restart timer fires.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum RestartDecision {
    Launch {
        /// Restarts since the last reset, including this one.
        attempt: u32,
        /// How long the supervisor waited.
        waited: Duration,
    },
    Terminate(Outcome),
}

#[derive(Clone, Copy, Debug)]
struct PendingRestart {
    at: Instant,
    wait: Duration,
}

/// Restart state machine.
#[derive(Debug)]
pub(crate) struct Monitor {
    restart: RestartPolicy,
    backoff: BackoffPolicy,
    limiter: RateLimiter,
    window: Duration,
    stop_parent_first: bool,

    state: MonitorState,
    launches: u64,
    attempts: u32,
    force_kill: bool,
    running_since: Option<Instant>,
    stable: bool,
    pending: Option<PendingRestart>,
    outcome: Option<Outcome>,
}

impl Monitor {
    pub(crate) fn new(cfg: &SupervisorConfig) -> Self {
        Self {
            restart: cfg.restart_policy(),
            backoff: cfg.backoff(),
            limiter: cfg.rate_limiter(),
            window: cfg.restart_window,
            stop_parent_first: cfg.stop_parent_first,
            state: MonitorState::Idle,
            launches: 0,
            attempts: 0,
            force_kill: false,
            running_since: None,
            stable: false,
            pending: None,
            outcome: None,
        }
    }

    #[cfg(test)]
    pub(crate) fn state(&self) -> MonitorState {
        self.state
    }

    /// Restarts since the last stable run.
    pub(crate) fn attempts(&self) -> u32 {
        self.attempts
    }

    #[cfg(test)]
    pub(crate) fn starts_in_window(&self) -> u32 {
        self.limiter.starts_in_window()
    }

    /// Wait the next restart would use, before jitter.
    #[cfg(test)]
    pub(crate) fn current_wait(&self) -> Duration {
        self.backoff.unjittered(self.attempts)
    }

    pub(crate) fn force_kill_requested(&self) -> bool {
        self.force_kill
    }

    pub(crate) fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    /// `true` if a new child may be launched now.
    ///
    /// Never true while a child is alive.
    pub(crate) fn can_launch(&self) -> bool {
        matches!(self.state, MonitorState::Idle | MonitorState::RestartScheduled)
            && self.pending.is_none()
    }

    /// Records a successful launch at `now`. Returns `true` for the first
    /// launch of this supervisor.
    pub(crate) fn on_launched(&mut self, now: Instant) -> bool {
        debug_assert!(self.can_launch(), "launch from {:?}", self.state);
        let first = self.launches == 0;
        if !first {
            self.limiter.record_restart(now);
        }
        self.launches += 1;
        self.state = MonitorState::Running;
        self.running_since = Some(now);
        self.stable = false;
        self.pending = None;
        first
    }

    /// Records a launch that failed to spawn. It counts as a launch and as an
    /// immediate exit without a code.
    pub(crate) fn on_spawn_failed(&mut self, now: Instant) -> ExitDecision {
        self.on_launched(now);
        self.on_exit(None, now)
    }

    /// When the running child will have been up for a whole window.
    pub(crate) fn stable_deadline(&self) -> Option<Instant> {
        match (self.state, self.running_since) {
            (MonitorState::Running, Some(since)) if !self.stable => since.checked_add(self.window),
            _ => None,
        }
    }

    /// Applies the stability reset if the child has been up for a whole
    /// window. Returns `true` if the reset happened now.
    pub(crate) fn on_stable(&mut self, now: Instant) -> bool {
        match self.stable_deadline() {
            Some(deadline) if now >= deadline => {
                self.attempts = 0;
                self.limiter.reset();
                self.stable = true;
                true
            }
            _ => false,
        }
    }

    /// Evaluates the exit rules for a child that exited with `code`.
    pub(crate) fn on_exit(&mut self, code: Option<i32>, now: Instant) -> ExitDecision {
        debug_assert_eq!(self.state, MonitorState::Running);
        // An exit racing the stability timer still gets the reset first.
        self.on_stable(now);
        self.state = MonitorState::Exited;
        self.running_since = None;

        if self.force_kill {
            return ExitDecision::Terminate(self.terminate(Outcome::Shutdown));
        }
        if self.restart.aborts_on(code) {
            return ExitDecision::Terminate(self.terminate(Outcome::AbortedOnError { code }));
        }
        if self.limiter.exceeded(now) {
            let outcome = Outcome::TooManyRestarts {
                restarts: self.limiter.starts_in_window(),
                window: self.limiter.window(),
            };
            return ExitDecision::Terminate(self.terminate(outcome));
        }

        let wait = self.backoff.next(self.attempts);
        self.pending = Some(PendingRestart {
            at: now.checked_add(wait).unwrap_or_else(|| far_future(now)),
            wait,
        });
        self.state = MonitorState::RestartScheduled;
        ExitDecision::Restart { delay: wait }
    }

    /// When the scheduled restart is due.
    pub(crate) fn restart_deadline(&self) -> Option<Instant> {
        self.pending.map(|p| p.at)
    }

    /// Fires the scheduled restart: counts the attempt and checks the budget.
    pub(crate) fn on_restart_due(&mut self) -> RestartDecision {
        let Some(pending) = self.pending.take() else {
            debug_assert!(false, "restart fired without a schedule");
            return RestartDecision::Terminate(self.terminate(Outcome::Shutdown));
        };
        self.attempts = self.attempts.saturating_add(1);
        if !self.restart.allows(self.attempts) {
            let outcome = Outcome::RetriesExhausted {
                attempts: self.attempts,
            };
            return RestartDecision::Terminate(self.terminate(outcome));
        }
        RestartDecision::Launch {
            attempt: self.attempts,
            waited: pending.wait,
        }
    }

    /// Handles a shutdown request.
    ///
    /// Returns `None` for repeated requests. With no live child, any pending
    /// restart is cancelled and the monitor goes terminal.
    pub(crate) fn request_shutdown(&mut self) -> Option<ShutdownAction> {
        if self.force_kill || self.state == MonitorState::Terminal {
            return None;
        }
        self.force_kill = true;
        match self.state {
            MonitorState::Running if self.stop_parent_first => Some(ShutdownAction::SendMessage),
            MonitorState::Running => Some(ShutdownAction::ForceKill),
            _ => {
                self.terminate(Outcome::Shutdown);
                Some(ShutdownAction::NoChild)
            }
        }
    }

    fn terminate(&mut self, outcome: Outcome) -> Outcome {
        self.state = MonitorState::Terminal;
        self.pending = None;
        self.running_since = None;
        self.outcome = Some(outcome);
        outcome
    }
}

/// Deadline used when a wait does not fit into an [`Instant`].
fn far_future(now: Instant) -> Instant {
    // About 30 years, the same horizon tokio uses for "never".
    now + Duration::from_secs(86_400 * 365 * 30)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(max_retries: Option<u32>, max_restarts: u32, delay_ms: u64, growth: f64) -> SupervisorConfig {
        let mut cfg = SupervisorConfig::new("worker.sh");
        cfg.max_retries = max_retries;
        cfg.max_restarts = max_restarts;
        cfg.restart_delay = Duration::from_millis(delay_ms);
        cfg.restart_delay_growth = growth;
        cfg
    }

    /// Exit at `now`, fire the timer, relaunch. Returns the wait used.
    fn crash_and_restart(m: &mut Monitor, now: &mut Instant) -> Duration {
        let ExitDecision::Restart { delay } = m.on_exit(Some(1), *now) else {
            panic!("expected restart, state {:?}", m.state());
        };
        *now += delay;
        assert_eq!(m.restart_deadline(), Some(*now));
        match m.on_restart_due() {
            RestartDecision::Launch { waited, .. } => assert_eq!(waited, delay),
            other => panic!("expected launch, got {other:?}"),
        }
        m.on_launched(*now);
        delay
    }

    #[test]
    fn test_first_launch_is_reported_once() {
        let mut m = Monitor::new(&cfg(None, 5, 1000, 0.25));
        let mut now = Instant::now();
        assert_eq!(m.state(), MonitorState::Idle);
        assert!(m.on_launched(now));
        assert_eq!(m.state(), MonitorState::Running);
        assert!(!m.can_launch());

        crash_and_restart(&mut m, &mut now);
        assert_eq!(m.state(), MonitorState::Running);
        assert_eq!(m.attempts(), 1);
        assert_eq!(m.starts_in_window(), 1);
    }

    #[test]
    fn test_wait_grows_by_factor() {
        let mut m = Monitor::new(&cfg(None, 100, 1000, 0.25));
        let mut now = Instant::now();
        m.on_launched(now);

        let mut expected = 1.0_f64;
        for _ in 0..6 {
            let wait = crash_and_restart(&mut m, &mut now);
            assert!((wait.as_secs_f64() - expected).abs() < 1e-6, "{wait:?} vs {expected}");
            expected *= 1.25;
        }
    }

    #[test]
    fn test_scenario_retries_exhausted() {
        // max_retries 2, growth 0: two restarts of 1s, the third is refused.
        let mut m = Monitor::new(&cfg(Some(2), 5, 1000, 0.0));
        let mut now = Instant::now();
        m.on_launched(now);

        assert_eq!(crash_and_restart(&mut m, &mut now), Duration::from_secs(1));
        assert_eq!(crash_and_restart(&mut m, &mut now), Duration::from_secs(1));

        assert!(matches!(m.on_exit(Some(1), now), ExitDecision::Restart { .. }));
        assert_eq!(
            m.on_restart_due(),
            RestartDecision::Terminate(Outcome::RetriesExhausted { attempts: 3 })
        );
        assert_eq!(m.state(), MonitorState::Terminal);
        assert!(!m.can_launch());
    }

    #[test]
    fn test_zero_retries_never_restarts() {
        let mut m = Monitor::new(&cfg(Some(0), 5, 10, 0.0));
        let now = Instant::now();
        m.on_launched(now);
        assert!(matches!(m.on_exit(Some(1), now), ExitDecision::Restart { .. }));
        assert_eq!(
            m.on_restart_due(),
            RestartDecision::Terminate(Outcome::RetriesExhausted { attempts: 1 })
        );
    }

    #[test]
    fn test_rate_limit_terminates() {
        let mut m = Monitor::new(&cfg(None, 2, 100, 0.0));
        let mut now = Instant::now();
        m.on_launched(now);
        crash_and_restart(&mut m, &mut now);
        crash_and_restart(&mut m, &mut now);

        let window = Duration::from_secs(60);
        assert_eq!(
            m.on_exit(Some(1), now),
            ExitDecision::Terminate(Outcome::TooManyRestarts { restarts: 2, window })
        );
        assert_eq!(m.outcome(), Some(Outcome::TooManyRestarts { restarts: 2, window }));
    }

    #[test]
    fn test_rate_limit_window_expires() {
        let mut m = Monitor::new(&cfg(None, 1, 100, 0.0));
        let mut now = Instant::now();
        m.on_launched(now);
        crash_and_restart(&mut m, &mut now);

        // The run outlived the window, so the limit no longer applies.
        now += Duration::from_secs(61);
        assert!(matches!(m.on_exit(Some(1), now), ExitDecision::Restart { .. }));
    }

    #[test]
    fn test_stability_resets_counters() {
        let mut m = Monitor::new(&cfg(None, 5, 1000, 0.5));
        let mut now = Instant::now();
        m.on_launched(now);
        crash_and_restart(&mut m, &mut now);
        crash_and_restart(&mut m, &mut now);
        assert_eq!(m.attempts(), 2);
        assert_eq!(m.current_wait(), Duration::from_millis(2250));

        let deadline = m.stable_deadline().unwrap();
        assert_eq!(deadline, now + Duration::from_secs(60));
        assert!(!m.on_stable(deadline - Duration::from_millis(1)));
        assert!(m.on_stable(deadline));
        assert_eq!(m.attempts(), 0);
        assert_eq!(m.starts_in_window(), 0);
        assert_eq!(m.current_wait(), Duration::from_secs(1));
        assert_eq!(m.stable_deadline(), None);

        now = deadline + Duration::from_secs(5);
        assert_eq!(
            m.on_exit(Some(1), now),
            ExitDecision::Restart {
                delay: Duration::from_secs(1)
            }
        );
    }

    #[test]
    fn test_late_exit_still_gets_reset() {
        let mut m = Monitor::new(&cfg(None, 5, 1000, 0.5));
        let mut now = Instant::now();
        m.on_launched(now);
        crash_and_restart(&mut m, &mut now);

        now += Duration::from_secs(60);
        assert_eq!(
            m.on_exit(Some(1), now),
            ExitDecision::Restart {
                delay: Duration::from_secs(1)
            }
        );
    }

    #[test]
    fn test_abort_on_error() {
        let mut c = cfg(None, 5, 1000, 0.0);
        c.abort_on_error = true;

        let mut m = Monitor::new(&c);
        let now = Instant::now();
        m.on_launched(now);
        assert_eq!(
            m.on_exit(Some(2), now),
            ExitDecision::Terminate(Outcome::AbortedOnError { code: Some(2) })
        );

        // A clean exit is restarted even with abort_on_error.
        let mut m = Monitor::new(&c);
        m.on_launched(now);
        assert!(matches!(m.on_exit(Some(0), now), ExitDecision::Restart { .. }));

        // Killed by a signal: no code, treated as an error.
        let mut m = Monitor::new(&c);
        m.on_launched(now);
        assert_eq!(
            m.on_exit(None, now),
            ExitDecision::Terminate(Outcome::AbortedOnError { code: None })
        );
    }

    #[test]
    fn test_spawn_failure_counts_as_exit() {
        let mut m = Monitor::new(&cfg(Some(1), 5, 500, 0.0));
        let now = Instant::now();
        assert_eq!(
            m.on_spawn_failed(now),
            ExitDecision::Restart {
                delay: Duration::from_millis(500)
            }
        );
        assert_eq!(m.state(), MonitorState::RestartScheduled);
        assert!(matches!(m.on_restart_due(), RestartDecision::Launch { attempt: 1, .. }));
    }

    #[test]
    fn test_shutdown_while_running() {
        let mut c = cfg(None, 5, 1000, 0.0);
        let now = Instant::now();

        let mut m = Monitor::new(&c);
        m.on_launched(now);
        assert_eq!(m.request_shutdown(), Some(ShutdownAction::ForceKill));
        assert!(m.force_kill_requested());
        assert_eq!(m.request_shutdown(), None);
        assert_eq!(
            m.on_exit(None, now),
            ExitDecision::Terminate(Outcome::Shutdown)
        );

        c.stop_parent_first = true;
        let mut m = Monitor::new(&c);
        m.on_launched(now);
        assert_eq!(m.request_shutdown(), Some(ShutdownAction::SendMessage));
        // Exit after a graceful request is not restarted either.
        assert_eq!(
            m.on_exit(Some(0), now),
            ExitDecision::Terminate(Outcome::Shutdown)
        );
    }

    #[test]
    fn test_shutdown_cancels_pending_restart() {
        let mut m = Monitor::new(&cfg(None, 5, 1000, 0.0));
        let now = Instant::now();
        m.on_launched(now);
        m.on_exit(Some(1), now);
        assert!(m.restart_deadline().is_some());

        assert_eq!(m.request_shutdown(), Some(ShutdownAction::NoChild));
        assert_eq!(m.state(), MonitorState::Terminal);
        assert_eq!(m.restart_deadline(), None);
        assert_eq!(m.outcome(), Some(Outcome::Shutdown));
        assert_eq!(m.request_shutdown(), None);
    }

    #[test]
    fn test_shutdown_before_launch() {
        let mut m = Monitor::new(&cfg(None, 5, 1000, 0.0));
        assert_eq!(m.request_shutdown(), Some(ShutdownAction::NoChild));
        assert!(!m.can_launch());
    }
}
