use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Everything needed to start the supervised child.
///
/// Built once from [`SupervisorConfig`](crate::SupervisorConfig) and reused for
/// every launch, so restarts always get the same command line.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LaunchSpec {
    /// Script to keep alive.
    pub script: PathBuf,
    /// Optional interpreter; when set the command is `interpreter script args...`.
    pub interpreter: Option<PathBuf>,
    /// Arguments passed after the script.
    pub args: Vec<OsString>,
    /// Working directory (`None` = inherit).
    pub cwd: Option<PathBuf>,
    /// Extra environment variables, applied on top of the inherited environment.
    pub env: Vec<(OsString, OsString)>,
}

impl LaunchSpec {
    /// Creates a spec that runs `script` directly.
    pub fn new(script: impl Into<PathBuf>) -> Self {
        Self {
            script: script.into(),
            ..Self::default()
        }
    }

    /// Program actually executed (interpreter or script).
    pub fn program(&self) -> &Path {
        self.interpreter.as_deref().unwrap_or(&self.script)
    }

    /// Full argument vector passed to [`program`](Self::program).
    pub fn argv(&self) -> Vec<OsString> {
        let mut argv = Vec::with_capacity(self.args.len() + 1);
        if self.interpreter.is_some() {
            argv.push(self.script.clone().into_os_string());
        }
        argv.extend(self.args.iter().cloned());
        argv
    }

    /// Human-readable script name used in log lines.
    pub fn display_name(&self) -> String {
        self.script.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_script() {
        let mut spec = LaunchSpec::new("/srv/app.sh");
        spec.args = vec!["--port".into(), "80".into()];
        assert_eq!(spec.program(), Path::new("/srv/app.sh"));
        assert_eq!(spec.argv(), vec![OsString::from("--port"), OsString::from("80")]);
    }

    #[test]
    fn test_interpreter_prepends_script() {
        let mut spec = LaunchSpec::new("app.py");
        spec.interpreter = Some("python3".into());
        spec.args = vec!["-v".into()];
        assert_eq!(spec.program(), Path::new("python3"));
        assert_eq!(spec.argv(), vec![OsString::from("app.py"), OsString::from("-v")]);
    }
}
