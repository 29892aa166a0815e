//! # Shutdown requests: OS signals and explicit cancellation.
//!
//! [`ShutdownSignals`] is the supervisor's subscription to termination
//! requests. It is created when supervision starts and dropped when it ends,
//! so the OS signal listeners live exactly as long as one supervisor.
//!
//! ## Sources
//! **Unix platforms:**
//! - `SIGINT` (Ctrl-C in terminal)
//! - `SIGTERM` (default kill signal, used by systemd/launchd)
//! - `SIGQUIT` (quit signal)
//!
//! **Windows platforms:**
//! - `Ctrl-C` via [`tokio::signal::ctrl_c`]
//!
//! **Everywhere:** cancellation of a [`CancellationToken`] handed to the builder.
//!
//! ## Coordination
//! ```text
//! request ──► Monitor::request_shutdown()
//!               ├─ already requested       ─► None (ignored)
//!               ├─ child alive + stop_parent_first ─► SendMessage
//!               ├─ child alive             ─► ForceKill
//!               └─ no child                ─► NoChild (warn, go terminal)
//! ```

use std::fmt;
use std::io;

use tokio_util::sync::CancellationToken;

/// What the coordinator does with the live child on a shutdown request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShutdownAction {
    /// Write the shutdown message and let the child exit on its own.
    SendMessage,
    /// Force-terminate the child.
    ForceKill,
    /// No child is alive; nothing to stop.
    NoChild,
}

/// Where a shutdown request came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShutdownCause {
    Interrupt,
    Terminate,
    Quit,
    Requested,
}

impl fmt::Display for ShutdownCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ShutdownCause::Interrupt => "interrupt",
            ShutdownCause::Terminate => "terminate",
            ShutdownCause::Quit => "quit",
            ShutdownCause::Requested => "requested",
        })
    }
}

/// Per-supervisor subscription to termination requests.
pub(crate) struct ShutdownSignals {
    #[cfg(unix)]
    os: Option<UnixSignals>,
    #[cfg(not(unix))]
    os: bool,
    token: Option<CancellationToken>,
}

#[cfg(unix)]
struct UnixSignals {
    interrupt: tokio::signal::unix::Signal,
    terminate: tokio::signal::unix::Signal,
    quit: tokio::signal::unix::Signal,
}

impl ShutdownSignals {
    /// Installs the listeners.
    ///
    /// Dropping the subscription stops delivery to this supervisor, but tokio
    /// never restores the OS default disposition of a signal it has captured.
    ///
    /// Returns `Err` if OS signal registration fails.
    pub(crate) fn subscribe(os_signals: bool, token: Option<CancellationToken>) -> io::Result<Self> {
        #[cfg(unix)]
        let os = if os_signals {
            use tokio::signal::unix::{SignalKind, signal};
            Some(UnixSignals {
                interrupt: signal(SignalKind::interrupt())?,
                terminate: signal(SignalKind::terminate())?,
                quit: signal(SignalKind::quit())?,
            })
        } else {
            None
        };
        #[cfg(not(unix))]
        let os = os_signals;

        Ok(Self { os, token })
    }

    /// Completes on the next termination request.
    ///
    /// Never completes if no source is configured. Cancel-safe.
    pub(crate) async fn recv(&mut self) -> ShutdownCause {
        let token = self.token.clone();
        let requested = async move {
            match token {
                Some(t) => t.cancelled_owned().await,
                None => std::future::pending().await,
            }
        };

        #[cfg(unix)]
        {
            match self.os.as_mut() {
                Some(os) => tokio::select! {
                    _ = os.interrupt.recv() => ShutdownCause::Interrupt,
                    _ = os.terminate.recv() => ShutdownCause::Terminate,
                    _ = os.quit.recv() => ShutdownCause::Quit,
                    _ = requested => ShutdownCause::Requested,
                },
                None => {
                    requested.await;
                    ShutdownCause::Requested
                }
            }
        }

        #[cfg(not(unix))]
        {
            if self.os {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => ShutdownCause::Interrupt,
                    _ = requested => ShutdownCause::Requested,
                }
            } else {
                requested.await;
                ShutdownCause::Requested
            }
        }
    }
}
