//! # scriptvisor
//!
//! **Scriptvisor** keeps a single script alive.
//!
//! It launches the script as a child process, restarts it when it exits with
//! a growing delay, refuses to restart a crash loop faster than a rolling rate
//! limit allows, and stops the child cleanly when the host asks it to. Every
//! transition is published as an [`Event`] and written to a [`LogSink`].
//!
//! ## Architecture
//! ### Overview
//! ```text
//!                    ┌──────────────────────────┐
//!                    │     SupervisorConfig     │
//!                    │ (script, policies, sink) │
//!                    └────────────┬─────────────┘
//!                                 ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Supervisor (single control loop)                                 │
//! │  - Monitor   (restart state machine, backoff, rate limit)         │
//! │  - Launcher  (Spawner ─► ChildHandle, at most one alive)          │
//! │  - ShutdownSignals (SIGINT/SIGTERM/SIGQUIT, CancellationToken)    │
//! └──────┬──────────────────────────────────────────────────┬─────────┘
//!        │ spawn / wait / kill / send_message               │ publish
//!        ▼                                                  ▼
//!  ┌──────────────┐                  ┌───────────────────────────────┐
//!  │ child process│                  │     Bus (broadcast channel)   │
//!  └──────────────┘                  └───────────────┬───────────────┘
//!                                                    ▼
//!                                       ┌────────────────────────┐
//!                                       │  subscriber_listener   │
//!                                       └───────────┬────────────┘
//!                                                   ▼
//!                                             SubscriberSet
//!                                           ┌───────┴────────┐
//!                                           ▼                ▼
//!                                      SinkWriter       user subscribers
//!                                           ▼
//!                                   LogSink (TracingSink)
//! ```
//!
//! ### Lifecycle
//! ```text
//! Idle ──launch──► Running ──exit──► Exited
//!                    ▲                 ├─ shutdown requested        ─► Terminal (Shutdown)
//!                    │                 ├─ abort_on_error && error   ─► Terminal (AbortedOnError)
//!                    │                 ├─ max_restarts in window    ─► Terminal (TooManyRestarts)
//!                    │                 └─ wait base×(1+growth)^n    ─► RestartScheduled
//!                    │                                                   │ attempts += 1
//!                    └──────────────── launch ◄── attempts <= max_retries┘
//!                                                 otherwise ─► Terminal (RetriesExhausted)
//!
//! up for a whole window ─► attempts, rate limit and wait reset
//! ```
//!
//! ## Features
//! | Area              | Description                                               | Key types / traits                                    |
//! |-------------------|-----------------------------------------------------------|-------------------------------------------------------|
//! | **Supervision**   | Launch, restart and stop one script.                      | [`Supervisor`], [`SupervisorBuilder`], [`Outcome`]    |
//! | **Policies**      | Retry budget, backoff growth, jitter, rolling rate limit. | [`RestartPolicy`], [`BackoffPolicy`], [`RateLimiter`] |
//! | **Processes**     | Pluggable spawn primitive, real processes by default.     | [`Spawner`], [`ChildHandle`], [`CommandSpawner`]      |
//! | **Events**        | Typed lifecycle events over a broadcast bus.              | [`Event`], [`EventKind`], [`Bus`]                     |
//! | **Subscriber API**| Hook into events (logging, metrics, alerting).            | [`Subscribe`], [`SubscriberSet`]                      |
//! | **Logging**       | Log lines with severity and event code.                   | [`LogSink`], [`TracingSink`], [`SinkWriter`]          |
//! | **Errors**        | Typed configuration and runtime errors.                   | [`ConfigError`], [`RuntimeError`]                     |
//!
//! ## Optional features
//! - `cli` (default): builds the `scriptvisor` daemon binary (`clap`, `tracing-subscriber`).
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use scriptvisor::{Outcome, Supervisor, SupervisorConfig};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut cfg = SupervisorConfig::new("sh");
//!     cfg.args = vec!["-c".into(), "exit 3".into()];
//!     cfg.abort_on_error = true;
//!     cfg.restart_delay = Duration::from_millis(10);
//!
//!     let token = CancellationToken::new();
//!     let sup = Supervisor::builder(cfg)
//!         .with_shutdown_token(token.clone())
//!         .with_os_signals(false)
//!         .build()?;
//!
//!     # #[cfg(unix)]
//!     assert_eq!(sup.start().await?, Outcome::AbortedOnError { code: Some(3) });
//!     Ok(())
//! }
//! ```
mod core;
mod error;
mod events;
mod policies;
mod process;
mod subscribers;

#[cfg(test)]
mod testing;

// ---- Public re-exports ----

pub use crate::core::{
    Outcome, ShutdownAction, ShutdownCause, Supervisor, SupervisorBuilder, SupervisorConfig,
};
pub use error::{ConfigError, RuntimeError};
pub use events::{Bus, Event, EventKind, Level};
pub use policies::{BackoffPolicy, JitterPolicy, RateLimiter, RestartPolicy};
pub use process::{ChildHandle, CommandSpawner, ExitStatus, LaunchSpec, Spawner};
pub use subscribers::{
    LogChannel, LogSink, SinkWriter, Subscribe, SubscriberSet, TracingSink, render,
};
