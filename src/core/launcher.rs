//! # Launch one child process.
//!
//! Spawns the configured script through a [`Spawner`] and publishes the
//! launch events to the [`Bus`].
//!
//! ## Event flow
//! ```text
//! first launch:   publish ProcessStarting ─► spawn ─┬─ Ok  ─► publish ProcessStarted (pid, attempt 0)
//!                                                    └─ Err ─► publish SpawnFailed (reason)
//! relaunch:       spawn ─┬─ Ok  ─► publish ProcessStarted (pid, attempt n)
//!                        └─ Err ─► publish SpawnFailed (reason)
//! ```
//!
//! ## Rules
//! - `ProcessStarting` is published **once** per launcher, before the first spawn
//! - exactly one of `ProcessStarted` / `SpawnFailed` per call
//! - no waiting happens here; the caller owns the returned handle

use std::io;
use std::sync::Arc;

use crate::events::{Bus, Event, EventKind};
use crate::process::{ChildHandle, LaunchSpec, Spawner};

pub(crate) struct Launcher {
    spawner: Arc<dyn Spawner>,
    spec: LaunchSpec,
    script: Arc<str>,
    bus: Bus,
    started_once: bool,
}

impl Launcher {
    pub(crate) fn new(spawner: Arc<dyn Spawner>, spec: LaunchSpec, bus: Bus) -> Self {
        let script: Arc<str> = spec.display_name().into();
        Self {
            spawner,
            spec,
            script,
            bus,
            started_once: false,
        }
    }

    /// Display name of the supervised script, shared with every event.
    pub(crate) fn script(&self) -> &Arc<str> {
        &self.script
    }

    /// Spawns the child for `attempt` (0 for the initial launch).
    pub(crate) fn launch(&mut self, attempt: u32) -> io::Result<Box<dyn ChildHandle>> {
        if !self.started_once {
            self.started_once = true;
            self.bus
                .publish(Event::new(EventKind::ProcessStarting).with_script(Arc::clone(&self.script)));
        }

        match self.spawner.spawn(&self.spec) {
            Ok(child) => {
                self.publish_started(child.id(), attempt);
                Ok(child)
            }
            Err(err) => {
                self.publish_spawn_failed(&err);
                Err(err)
            }
        }
    }

    fn publish_started(&self, pid: Option<u32>, attempt: u32) {
        self.bus.publish(
            Event::new(EventKind::ProcessStarted)
                .with_script(Arc::clone(&self.script))
                .with_pid(pid)
                .with_attempt(attempt),
        );
    }

    fn publish_spawn_failed(&self, err: &io::Error) {
        self.bus.publish(
            Event::new(EventKind::SpawnFailed)
                .with_script(Arc::clone(&self.script))
                .with_reason(err.to_string()),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeRun, FakeSpawner};
    use std::time::Duration;

    #[tokio::test]
    async fn test_starting_is_published_once() {
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let spawner = Arc::new(FakeSpawner::new([
            FakeRun::ExitAfter(Duration::from_millis(1), 0),
            FakeRun::ExitAfter(Duration::from_millis(1), 0),
        ]));
        let mut launcher = Launcher::new(spawner.clone(), LaunchSpec::new("job.sh"), bus);

        launcher.launch(0).unwrap();
        launcher.launch(1).unwrap();

        let kinds: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|e| (e.kind, e.attempt))
            .collect();
        assert_eq!(
            kinds,
            vec![
                (EventKind::ProcessStarting, None),
                (EventKind::ProcessStarted, Some(0)),
                (EventKind::ProcessStarted, Some(1)),
            ]
        );
        assert_eq!(spawner.spawn_count(), 2);
    }

    #[tokio::test]
    async fn test_spawn_failure_is_published() {
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let spawner = Arc::new(FakeSpawner::new([FakeRun::FailSpawn]));
        let mut launcher = Launcher::new(spawner, LaunchSpec::new("missing.sh"), bus);

        assert!(launcher.launch(0).is_err());

        assert_eq!(rx.try_recv().unwrap().kind, EventKind::ProcessStarting);
        let failed = rx.try_recv().unwrap();
        assert_eq!(failed.kind, EventKind::SpawnFailed);
        assert_eq!(failed.script.as_deref(), Some("missing.sh"));
        assert!(failed.reason.is_some());
    }
}
