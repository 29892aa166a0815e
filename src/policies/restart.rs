//! # Restart budget for the supervised child.
//!
//! [`RestartPolicy`] answers two questions the monitor asks on every exit:
//! - does this exit code end supervision outright ([`RestartPolicy::abort_on_error`])?
//! - is there budget left for another restart ([`RestartPolicy::max_retries`])?
//!
//! ```text
//! exit(code) ──► abort_on_error && code != 0 ─► terminal
//!            └─► schedule restart ─► attempts += 1 ─► attempts > max_retries ─► terminal
//!                                                └─► relaunch
//! ```

/// Policy controlling whether the child is restarted after it exits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RestartPolicy {
    /// Total restarts allowed since the last stable run (`None` = unlimited).
    pub max_retries: Option<u32>,
    /// Stop supervising when the child exits with a non-zero (or missing) code.
    pub abort_on_error: bool,
}

impl RestartPolicy {
    /// Returns `true` if an exit with `code` must end supervision.
    ///
    /// A missing code (killed by a signal, or never started) counts as an error.
    pub fn aborts_on(&self, code: Option<i32>) -> bool {
        self.abort_on_error && code != Some(0)
    }

    /// Returns `true` if restart number `attempt` (1-based) is within budget.
    pub fn allows(&self, attempt: u32) -> bool {
        match self.max_retries {
            None => true,
            Some(max) => attempt <= max,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_exit_never_aborts() {
        let p = RestartPolicy {
            max_retries: None,
            abort_on_error: true,
        };
        assert!(!p.aborts_on(Some(0)));
        assert!(p.aborts_on(Some(1)));
        assert!(p.aborts_on(Some(-1)));
        assert!(p.aborts_on(None));
    }

    #[test]
    fn test_abort_disabled() {
        let p = RestartPolicy::default();
        assert!(!p.aborts_on(Some(3)));
        assert!(!p.aborts_on(None));
    }

    #[test]
    fn test_budget() {
        let p = RestartPolicy {
            max_retries: Some(2),
            abort_on_error: false,
        };
        assert!(p.allows(1));
        assert!(p.allows(2));
        assert!(!p.allows(3));

        let none = RestartPolicy {
            max_retries: Some(0),
            abort_on_error: false,
        };
        assert!(!none.allows(1));

        assert!(RestartPolicy::default().allows(u32::MAX));
    }
}
