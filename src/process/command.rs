//! # `tokio::process` backed spawner.
//!
//! [`CommandSpawner`] runs the [`LaunchSpec`] as a real OS process:
//! - stdin is piped so the cooperative shutdown message can be written to it;
//! - stdout/stderr are inherited (the service manager captures them);
//! - the child is killed if its handle is dropped.

use std::io;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStdin, Command};

use crate::process::{ChildHandle, ExitStatus, LaunchSpec, Spawner};

/// Default [`Spawner`] using [`tokio::process::Command`].
#[derive(Clone, Copy, Debug, Default)]
pub struct CommandSpawner;

impl CommandSpawner {
    /// Construct a new [`CommandSpawner`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn command(spec: &LaunchSpec) -> Command {
        let mut cmd = Command::new(spec.program());
        cmd.args(spec.argv())
            .envs(spec.env.iter().map(|(k, v)| (k, v)))
            .stdin(Stdio::piped())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        if let Some(cwd) = &spec.cwd {
            cmd.current_dir(cwd);
        }
        cmd
    }
}

impl Spawner for CommandSpawner {
    fn spawn(&self, spec: &LaunchSpec) -> io::Result<Box<dyn ChildHandle>> {
        let mut child = Self::command(spec).spawn()?;
        let stdin = child.stdin.take();
        Ok(Box::new(CommandChild { child, stdin }))
    }
}

/// A child started by [`CommandSpawner`].
struct CommandChild {
    child: Child,
    stdin: Option<ChildStdin>,
}

#[async_trait]
impl ChildHandle for CommandChild {
    fn id(&self) -> Option<u32> {
        self.child.id()
    }

    async fn wait(&mut self) -> io::Result<ExitStatus> {
        self.child.wait().await.map(ExitStatus::from)
    }

    fn kill(&mut self) -> io::Result<()> {
        self.child.start_kill()
    }

    async fn send_message(&mut self, message: &str) -> io::Result<()> {
        let stdin = self.stdin.as_mut().ok_or_else(|| {
            io::Error::new(io::ErrorKind::BrokenPipe, "child stdin is not available")
        })?;
        stdin.write_all(message.as_bytes()).await?;
        stdin.write_all(b"\n").await?;
        stdin.flush().await
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> LaunchSpec {
        let mut spec = LaunchSpec::new("-c");
        spec.interpreter = Some("sh".into());
        spec.args = vec![script.into()];
        spec
    }

    #[tokio::test]
    async fn test_reports_exit_code() {
        let mut child = CommandSpawner::new().spawn(&sh("exit 3")).unwrap();
        assert!(child.id().is_some());
        let status = child.wait().await.unwrap();
        assert_eq!(status.code(), Some(3));
    }

    #[tokio::test]
    async fn test_message_reaches_stdin() {
        let script = r#"read line; if [ "$line" = "shutdown" ]; then exit 7; fi; exit 1"#;
        let mut child = CommandSpawner::new().spawn(&sh(script)).unwrap();
        child.send_message("shutdown").await.unwrap();
        let status = child.wait().await.unwrap();
        assert_eq!(status.code(), Some(7));
    }

    #[tokio::test]
    async fn test_kill_reports_signal() {
        let mut child = CommandSpawner::new().spawn(&sh("sleep 30")).unwrap();
        child.kill().unwrap();
        let status = child.wait().await.unwrap();
        assert_eq!(status.code(), None);
        assert_eq!(status.signal(), Some(9));
    }

    #[tokio::test]
    async fn test_env_and_cwd() {
        let dir = std::env::temp_dir();
        let mut spec = sh(r#"[ "$SV_TEST" = "on" ] && [ "$(pwd -P)" = "$SV_DIR" ]"#);
        let canonical = std::fs::canonicalize(&dir).unwrap();
        spec.cwd = Some(dir);
        spec.env = vec![
            ("SV_TEST".into(), "on".into()),
            ("SV_DIR".into(), canonical.into_os_string()),
        ];
        let mut child = CommandSpawner::new().spawn(&spec).unwrap();
        assert!(child.wait().await.unwrap().success());
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let _guard = rt.enter();
        let spec = LaunchSpec::new("/definitely/not/here/scriptvisor-test");
        assert!(CommandSpawner::new().spawn(&spec).is_err());
    }
}
