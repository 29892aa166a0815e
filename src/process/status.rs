use std::fmt;

/// Termination status of a supervised child.
///
/// Mirrors [`std::process::ExitStatus`] without tying the supervisor to a real
/// OS process, so alternative [`Spawner`](crate::Spawner)s can report exits too.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExitStatus {
    code: Option<i32>,
    signal: Option<i32>,
}

impl ExitStatus {
    /// A child that exited on its own with `code`.
    pub fn from_code(code: i32) -> Self {
        Self {
            code: Some(code),
            signal: None,
        }
    }

    /// A child terminated by `signal` (no exit code).
    pub fn from_signal(signal: i32) -> Self {
        Self {
            code: None,
            signal: Some(signal),
        }
    }

    /// An exit whose cause could not be determined.
    pub fn unknown() -> Self {
        Self::default()
    }

    /// Exit code, if the child exited on its own.
    pub fn code(&self) -> Option<i32> {
        self.code
    }

    /// Terminating signal, if any.
    pub fn signal(&self) -> Option<i32> {
        self.signal
    }

    /// `true` only for exit code 0.
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

impl From<std::process::ExitStatus> for ExitStatus {
    fn from(status: std::process::ExitStatus) -> Self {
        #[cfg(unix)]
        let signal = {
            use std::os::unix::process::ExitStatusExt;
            status.signal()
        };
        #[cfg(not(unix))]
        let signal = None;

        Self {
            code: status.code(),
            signal,
        }
    }
}

impl fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.code, self.signal) {
            (Some(code), _) => write!(f, "exit code {code}"),
            (None, Some(sig)) => write!(f, "signal {sig}"),
            (None, None) => f.write_str("unknown status"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(ExitStatus::from_code(3).to_string(), "exit code 3");
        assert_eq!(ExitStatus::from_signal(9).to_string(), "signal 9");
        assert_eq!(ExitStatus::unknown().to_string(), "unknown status");
    }

    #[test]
    fn test_success_only_for_zero() {
        assert!(ExitStatus::from_code(0).success());
        assert!(!ExitStatus::from_code(1).success());
        assert!(!ExitStatus::from_signal(15).success());
    }
}
