//! Test doubles: a scripted spawner and a recording log sink.

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::events::Level;
use crate::process::{ChildHandle, ExitStatus, LaunchSpec, Spawner};
use crate::subscribers::LogSink;

/// One line written to a [`RecordingSink`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Line {
    pub level: Level,
    pub message: String,
    pub code: u32,
}

/// Log sink keeping every line in memory.
#[derive(Default)]
pub(crate) struct RecordingSink {
    lines: Mutex<Vec<Line>>,
}

impl RecordingSink {
    pub(crate) fn lines(&self) -> Vec<Line> {
        self.lines.lock().unwrap().clone()
    }

    pub(crate) fn messages(&self) -> Vec<String> {
        self.lines().into_iter().map(|l| l.message).collect()
    }

    fn push(&self, level: Level, message: &str, code: u32) {
        self.lines.lock().unwrap().push(Line {
            level,
            message: message.to_string(),
            code,
        });
    }
}

impl LogSink for RecordingSink {
    fn info(&self, message: &str, code: u32) {
        self.push(Level::Info, message, code);
    }

    fn warn(&self, message: &str, code: u32) {
        self.push(Level::Warn, message, code);
    }

    fn error(&self, message: &str, code: u32) {
        self.push(Level::Error, message, code);
    }
}

/// Behaviour of one planned child.
#[derive(Clone, Copy, Debug)]
pub(crate) enum FakeRun {
    /// Exits with `code` after the given (tokio) time.
    ExitAfter(Duration, i32),
    /// Runs until killed; exits with 0 on the shutdown message if asked to.
    RunUntilStopped { exit_on_message: bool },
    /// The spawn itself fails.
    FailSpawn,
}

/// Interaction recorded by the [`FakeSpawner`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Call {
    Spawn,
    Kill,
    Message(String),
}

/// Spawner replaying a fixed plan of [`FakeRun`]s.
///
/// Spawning past the end of the plan fails.
pub(crate) struct FakeSpawner {
    plan: Mutex<VecDeque<FakeRun>>,
    calls: Arc<Mutex<Vec<Call>>>,
}

impl FakeSpawner {
    pub(crate) fn new(plan: impl IntoIterator<Item = FakeRun>) -> Self {
        Self {
            plan: Mutex::new(plan.into_iter().collect()),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn spawn_count(&self) -> usize {
        self.calls().iter().filter(|c| **c == Call::Spawn).count()
    }
}

impl Spawner for FakeSpawner {
    fn spawn(&self, _spec: &LaunchSpec) -> io::Result<Box<dyn ChildHandle>> {
        let run = self.plan.lock().unwrap().pop_front();
        let (exit_at, exit_on_message) = match run {
            Some(FakeRun::ExitAfter(after, code)) => (Some((Instant::now() + after, code)), false),
            Some(FakeRun::RunUntilStopped { exit_on_message }) => (None, exit_on_message),
            Some(FakeRun::FailSpawn) | None => {
                return Err(io::Error::new(io::ErrorKind::NotFound, "no such script"));
            }
        };
        let mut calls = self.calls.lock().unwrap();
        calls.push(Call::Spawn);
        let pid = 1000 + calls.len() as u32;
        Ok(Box::new(FakeChild {
            pid,
            exit_at,
            exit_on_message,
            killed: false,
            stopped: false,
            calls: Arc::clone(&self.calls),
        }))
    }
}

struct FakeChild {
    pid: u32,
    exit_at: Option<(Instant, i32)>,
    exit_on_message: bool,
    killed: bool,
    stopped: bool,
    calls: Arc<Mutex<Vec<Call>>>,
}

#[async_trait]
impl ChildHandle for FakeChild {
    fn id(&self) -> Option<u32> {
        Some(self.pid)
    }

    async fn wait(&mut self) -> io::Result<ExitStatus> {
        if self.killed {
            return Ok(ExitStatus::from_signal(9));
        }
        if self.stopped {
            return Ok(ExitStatus::from_code(0));
        }
        match self.exit_at {
            Some((at, code)) => {
                tokio::time::sleep_until(at).await;
                Ok(ExitStatus::from_code(code))
            }
            None => std::future::pending().await,
        }
    }

    fn kill(&mut self) -> io::Result<()> {
        self.calls.lock().unwrap().push(Call::Kill);
        self.killed = true;
        Ok(())
    }

    async fn send_message(&mut self, message: &str) -> io::Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Message(message.to_string()));
        if self.exit_on_message {
            self.stopped = true;
        }
        Ok(())
    }
}
