use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::{config::SupervisorConfig, supervisor::Supervisor};
use crate::{
    error::RuntimeError,
    events::Bus,
    process::{CommandSpawner, Spawner},
    subscribers::{LogSink, SinkWriter, Subscribe, TracingSink},
};

/// Builder for constructing a [`Supervisor`] with optional features.
///
/// Defaults: real processes via [`CommandSpawner`], log lines via
/// [`TracingSink`], OS signals enabled.
pub struct SupervisorBuilder {
    cfg: SupervisorConfig,
    subscribers: Vec<Arc<dyn Subscribe>>,
    sink: Option<Arc<dyn LogSink>>,
    spawner: Option<Arc<dyn Spawner>>,
    token: Option<CancellationToken>,
    os_signals: bool,
}

impl SupervisorBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: SupervisorConfig) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
            sink: None,
            spawner: None,
            token: None,
            os_signals: true,
        }
    }

    /// Replaces the spawn primitive (tests, containers, remote runners).
    pub fn with_spawner(mut self, spawner: Arc<dyn Spawner>) -> Self {
        self.spawner = Some(spawner);
        self
    }

    /// Replaces the log sink the supervisor writes its log lines to.
    pub fn with_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Adds event subscribers for observability.
    ///
    /// Subscribers receive runtime events (launches, exits, restarts, shutdown)
    /// through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers.extend(subscribers);
        self
    }

    /// Treats cancellation of `token` as a shutdown request.
    pub fn with_shutdown_token(mut self, token: CancellationToken) -> Self {
        self.token = Some(token);
        self
    }

    /// Enables or disables the SIGINT/SIGTERM/SIGQUIT (Ctrl-C) listeners.
    ///
    /// Once installed, tokio keeps these signals captured for the rest of the
    /// process, even after [`Supervisor::start`] returns and the listeners are
    /// dropped: the default action (terminating the process) does not come
    /// back. Hosts that embed the supervisor and rely on the default handling
    /// should pass `false` and stop the supervisor through
    /// [`with_shutdown_token`](Self::with_shutdown_token) instead.
    pub fn with_os_signals(mut self, enabled: bool) -> Self {
        self.os_signals = enabled;
        self
    }

    /// Validates the configuration and returns the Supervisor instance.
    ///
    /// Does not spawn anything; the runtime is only needed by
    /// [`Supervisor::start`].
    pub fn build(self) -> Result<Supervisor, RuntimeError> {
        self.cfg.validate()?;

        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let sink = self.sink.unwrap_or_else(|| {
            Arc::new(TracingSink::new(self.cfg.log_source(), self.cfg.log_channel))
        });

        let mut subscribers: Vec<Arc<dyn Subscribe>> = Vec::with_capacity(self.subscribers.len() + 1);
        subscribers.push(Arc::new(SinkWriter::new(sink)));
        subscribers.extend(self.subscribers);

        let spawner = self
            .spawner
            .unwrap_or_else(|| Arc::new(CommandSpawner::new()));

        Ok(Supervisor::new_internal(
            self.cfg,
            bus,
            subscribers,
            spawner,
            self.token,
            self.os_signals,
        ))
    }
}
