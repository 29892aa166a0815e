//! # Supervisor: keeps one script alive.
//!
//! The [`Supervisor`] owns the event bus, the subscribers and the spawn
//! primitive. [`Supervisor::start`] runs a single control loop that blocks on
//! the next thing that can happen and feeds it to the restart state machine.
//!
//! ## High-level architecture
//! ```text
//! start():
//!   ShutdownSignals::subscribe()          (SIGINT/SIGTERM/SIGQUIT, token)
//!   subscriber_listener(): Bus ─► SubscriberSet::emit(&Event) ─► SinkWriter ─► LogSink
//!   Launcher::launch(0)
//!
//! loop (one select!, biased in this order):
//!   ├─ shutdown request      ─► Monitor::request_shutdown()
//!   │                              ├─ SendMessage ─► child.send_message(); arm grace timer
//!   │                              ├─ ForceKill   ─► child.kill()
//!   │                              └─ NoChild     ─► warn; terminal
//!   ├─ child exit            ─► Monitor::on_exit()   ─► terminal | restart timer
//!   ├─ stability deadline    ─► Monitor::on_stable() ─► counters reset
//!   ├─ grace deadline        ─► child.kill()
//!   └─ restart deadline      ─► Monitor::on_restart_due() ─► relaunch | terminal
//!
//! end:
//!   drop signal listeners ─► stop listener ─► drain subscribers ─► Ok(Outcome)
//! ```
//!
//! ## Rules
//! - at most one child is alive at any time
//! - repeated shutdown requests are ignored
//! - every transition is published on the bus before the next one happens
//! - all events are delivered to subscribers before [`start`](Supervisor::start) returns
//!
//! ## Example
//! ```no_run
//! use scriptvisor::{Supervisor, SupervisorConfig};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut cfg = SupervisorConfig::new("./worker.sh");
//!     cfg.max_retries = Some(10);
//!     cfg.stop_parent_first = true;
//!
//!     let outcome = Supervisor::builder(cfg).build()?.start().await?;
//!     println!("supervision ended: {outcome}");
//!     Ok(())
//! }
//! ```

use std::io;
use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::builder::SupervisorBuilder;
use super::config::SupervisorConfig;
use super::launcher::Launcher;
use super::monitor::{ExitDecision, Monitor, RestartDecision};
use super::outcome::Outcome;
use super::shutdown::{ShutdownAction, ShutdownCause, ShutdownSignals};
use crate::error::RuntimeError;
use crate::events::{Bus, Event, EventKind};
use crate::process::{ChildHandle, ExitStatus, Spawner};
use crate::subscribers::{Subscribe, SubscriberSet};

type Child = Option<Box<dyn ChildHandle>>;

/// Supervises one script: launch, restart with backoff, shutdown.
pub struct Supervisor {
    cfg: SupervisorConfig,
    bus: Bus,
    subscribers: Vec<Arc<dyn Subscribe>>,
    spawner: Arc<dyn Spawner>,
    token: Option<CancellationToken>,
    os_signals: bool,
}

impl Supervisor {
    /// Starts building a supervisor for `cfg`.
    pub fn builder(cfg: SupervisorConfig) -> SupervisorBuilder {
        SupervisorBuilder::new(cfg)
    }

    pub(crate) fn new_internal(
        cfg: SupervisorConfig,
        bus: Bus,
        subscribers: Vec<Arc<dyn Subscribe>>,
        spawner: Arc<dyn Spawner>,
        token: Option<CancellationToken>,
        os_signals: bool,
    ) -> Self {
        Self {
            cfg,
            bus,
            subscribers,
            spawner,
            token,
            os_signals,
        }
    }

    /// Configuration this supervisor runs with.
    pub fn config(&self) -> &SupervisorConfig {
        &self.cfg
    }

    /// Event bus; subscribe before [`start`](Self::start) to see every event.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Runs supervision until a terminal outcome is reached.
    ///
    /// Child failures are not errors: they end in an [`Outcome`]. `Err` is
    /// returned only if the shutdown signal listeners cannot be installed.
    pub async fn start(self) -> Result<Outcome, RuntimeError> {
        let mut signals = ShutdownSignals::subscribe(self.os_signals, self.token.clone())
            .map_err(RuntimeError::SignalSubscription)?;

        let stop = CancellationToken::new();
        let listener = self.subscriber_listener(stop.clone());

        let outcome = self.drive(&mut signals).await;
        drop(signals);

        stop.cancel();
        let _ = listener.await;
        Ok(outcome)
    }

    /// Forwards bus events to the subscriber set until `stop`, then drains
    /// what is left and waits for the subscribers to finish.
    fn subscriber_listener(&self, stop: CancellationToken) -> JoinHandle<()> {
        let mut rx = self.bus.subscribe();
        let set = SubscriberSet::new(self.subscribers.clone(), self.bus.clone());
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    ev = rx.recv() => match ev {
                        Ok(ev) => set.emit(&ev),
                        Err(RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "event listener lagged behind the bus");
                            continue;
                        }
                        Err(RecvError::Closed) => break,
                    },
                    _ = stop.cancelled() => {
                        drain_pending(&mut rx, &set);
                        break;
                    }
                }
            }
            set.shutdown().await;
        })
    }

    async fn drive(&self, signals: &mut ShutdownSignals) -> Outcome {
        let mut monitor = Monitor::new(&self.cfg);
        let mut launcher = Launcher::new(
            Arc::clone(&self.spawner),
            self.cfg.launch_spec(),
            self.bus.clone(),
        );
        let mut child: Child = None;
        let mut kill_at: Option<Instant> = None;

        self.launch(&mut monitor, &mut launcher, &mut child, 0);

        loop {
            if let Some(outcome) = monitor.outcome() {
                return outcome;
            }

            tokio::select! {
                biased;

                cause = signals.recv(), if !monitor.force_kill_requested() => {
                    self.on_shutdown(cause, &mut monitor, &mut child, &mut kill_at, &launcher)
                        .await;
                }
                status = wait_child(&mut child) => {
                    let pid = child.as_ref().and_then(|c| c.id());
                    child = None;
                    kill_at = None;
                    self.on_exit(status, pid, &mut monitor, &launcher);
                }
                _ = sleep_until_opt(monitor.stable_deadline()) => {
                    if monitor.on_stable(Instant::now()) {
                        self.publish_stable(&launcher);
                    }
                }
                _ = sleep_until_opt(kill_at) => {
                    kill_at = None;
                    self.force_kill(&mut child, "shutdown grace period elapsed", &launcher);
                }
                _ = sleep_until_opt(monitor.restart_deadline()) => {
                    match monitor.on_restart_due() {
                        RestartDecision::Launch { attempt, waited } => {
                            self.bus.publish(
                                Event::new(EventKind::ProcessRestarted)
                                    .with_script(Arc::clone(launcher.script()))
                                    .with_delay(waited)
                                    .with_attempt(attempt),
                            );
                            self.launch(&mut monitor, &mut launcher, &mut child, attempt);
                        }
                        RestartDecision::Terminate(outcome) => {
                            self.publish_terminal(outcome, &launcher);
                        }
                    }
                }
            }
        }
    }

    fn launch(&self, monitor: &mut Monitor, launcher: &mut Launcher, child: &mut Child, attempt: u32) {
        let now = Instant::now();
        match launcher.launch(attempt) {
            Ok(handle) => {
                monitor.on_launched(now);
                *child = Some(handle);
            }
            Err(_) => {
                let decision = monitor.on_spawn_failed(now);
                self.apply_exit_decision(decision, monitor, launcher);
            }
        }
    }

    fn on_exit(
        &self,
        status: io::Result<ExitStatus>,
        pid: Option<u32>,
        monitor: &mut Monitor,
        launcher: &Launcher,
    ) {
        let now = Instant::now();
        let mut ev = Event::new(EventKind::ProcessExited)
            .with_script(Arc::clone(launcher.script()))
            .with_pid(pid);
        let status = match status {
            Ok(status) => status,
            Err(err) => {
                ev = ev.with_reason(err.to_string());
                ExitStatus::unknown()
            }
        };
        self.bus
            .publish(ev.with_code(status.code()).with_signal(status.signal()));

        if monitor.on_stable(now) {
            self.publish_stable(launcher);
        }
        let decision = monitor.on_exit(status.code(), now);
        self.apply_exit_decision(decision, monitor, launcher);
    }

    fn apply_exit_decision(&self, decision: ExitDecision, monitor: &Monitor, launcher: &Launcher) {
        match decision {
            ExitDecision::Terminate(outcome) => self.publish_terminal(outcome, launcher),
            ExitDecision::Restart { delay } => self.bus.publish(
                Event::new(EventKind::RestartScheduled)
                    .with_script(Arc::clone(launcher.script()))
                    .with_delay(delay)
                    .with_attempt(monitor.attempts().saturating_add(1)),
            ),
        }
    }

    async fn on_shutdown(
        &self,
        cause: ShutdownCause,
        monitor: &mut Monitor,
        child: &mut Child,
        kill_at: &mut Option<Instant>,
        launcher: &Launcher,
    ) {
        self.bus
            .publish(Event::new(EventKind::ShutdownRequested).with_reason(cause.to_string()));

        match monitor.request_shutdown() {
            None => {}
            Some(ShutdownAction::SendMessage) => {
                let Some(handle) = child.as_mut() else {
                    return;
                };
                let pid = handle.id();
                let sent = handle.send_message(&self.cfg.shutdown_message).await;
                match sent {
                    Ok(()) => {
                        self.bus.publish(
                            Event::new(EventKind::GracefulStopSent)
                                .with_script(Arc::clone(launcher.script()))
                                .with_pid(pid),
                        );
                        *kill_at = self
                            .cfg
                            .shutdown_grace
                            .and_then(|grace| Instant::now().checked_add(grace));
                    }
                    Err(err) => {
                        self.publish_stop_failed(&err, launcher);
                        self.force_kill(child, "shutdown message could not be delivered", launcher);
                    }
                }
            }
            Some(ShutdownAction::ForceKill) => {
                self.force_kill(child, &format!("shutdown: {cause}"), launcher);
            }
            Some(ShutdownAction::NoChild) => {
                self.bus.publish(Event::new(EventKind::NoChildToStop));
            }
        }
    }

    fn force_kill(&self, child: &mut Child, reason: &str, launcher: &Launcher) {
        let Some(handle) = child.as_mut() else {
            return;
        };
        self.bus.publish(
            Event::new(EventKind::ForceKillSent)
                .with_script(Arc::clone(launcher.script()))
                .with_pid(handle.id())
                .with_reason(reason),
        );
        if let Err(err) = handle.kill() {
            self.publish_stop_failed(&err, launcher);
        }
    }

    fn publish_stop_failed(&self, err: &io::Error, launcher: &Launcher) {
        self.bus.publish(
            Event::new(EventKind::StopFailed)
                .with_script(Arc::clone(launcher.script()))
                .with_reason(err.to_string()),
        );
    }

    fn publish_stable(&self, launcher: &Launcher) {
        self.bus.publish(
            Event::new(EventKind::StableWindowReached)
                .with_script(Arc::clone(launcher.script()))
                .with_delay(self.cfg.restart_window),
        );
    }

    fn publish_terminal(&self, outcome: Outcome, launcher: &Launcher) {
        let script = Arc::clone(launcher.script());
        let ev = match outcome {
            Outcome::Shutdown => Event::new(EventKind::ProcessKilled).with_script(script),
            Outcome::AbortedOnError { code } => Event::new(EventKind::AbortedOnError)
                .with_script(script)
                .with_code(code),
            Outcome::TooManyRestarts { restarts, window } => Event::new(EventKind::TooManyRestarts)
                .with_script(script)
                .with_attempt(restarts)
                .with_delay(window),
            Outcome::RetriesExhausted { attempts } => Event::new(EventKind::RetriesExhausted)
                .with_script(script)
                .with_attempt(attempts),
        };
        self.bus.publish(ev);
    }
}

/// Waits for the child to exit; pending forever when there is none.
async fn wait_child(child: &mut Child) -> io::Result<ExitStatus> {
    match child.as_mut() {
        Some(handle) => handle.wait().await,
        None => std::future::pending().await,
    }
}

/// Emits every event still buffered in `rx`. A lag skips the lost events
/// and keeps draining.
fn drain_pending(rx: &mut broadcast::Receiver<Event>, set: &SubscriberSet) {
    loop {
        match rx.try_recv() {
            Ok(ev) => set.emit(&ev),
            Err(TryRecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "event listener lagged behind the bus");
            }
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }
}

/// Sleeps until `deadline`; pending forever for `None`.
async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}
