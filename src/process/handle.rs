//! # Spawn primitive and child handle.
//!
//! The supervisor never touches `tokio::process` directly. It asks a
//! [`Spawner`] for a [`ChildHandle`] and drives it through three capabilities:
//! - [`ChildHandle::wait`] the exit notification;
//! - [`ChildHandle::kill`] forceful termination;
//! - [`ChildHandle::send_message`] cooperative shutdown request.
//!
//! # Example
//! ```
//! use std::io;
//! use async_trait::async_trait;
//! use scriptvisor::{ChildHandle, ExitStatus, LaunchSpec, Spawner};
//!
//! /// A "process" that exits immediately with code 0.
//! struct Noop;
//!
//! #[async_trait]
//! impl ChildHandle for Noop {
//!     fn id(&self) -> Option<u32> { None }
//!     async fn wait(&mut self) -> io::Result<ExitStatus> { Ok(ExitStatus::from_code(0)) }
//!     fn kill(&mut self) -> io::Result<()> { Ok(()) }
//!     async fn send_message(&mut self, _msg: &str) -> io::Result<()> { Ok(()) }
//! }
//!
//! struct NoopSpawner;
//!
//! impl Spawner for NoopSpawner {
//!     fn spawn(&self, _spec: &LaunchSpec) -> io::Result<Box<dyn ChildHandle>> {
//!         Ok(Box::new(Noop))
//!     }
//! }
//! ```

use std::io;

use async_trait::async_trait;

use crate::process::{ExitStatus, LaunchSpec};

/// # A running child process.
///
/// Owned exclusively by the supervisor; at most one exists at any time.
/// All methods are called from the supervisor's single control loop, never
/// concurrently.
#[async_trait]
pub trait ChildHandle: Send + 'static {
    /// OS process id, if the child has one.
    fn id(&self) -> Option<u32>;

    /// Waits for the child to terminate.
    ///
    /// Must be cancel-safe: the supervisor drops this future when a shutdown
    /// request or timer wins the race, then calls it again later.
    async fn wait(&mut self) -> io::Result<ExitStatus>;

    /// Starts forceful termination without waiting for it to finish.
    fn kill(&mut self) -> io::Result<()>;

    /// Delivers a cooperative shutdown message to the child.
    async fn send_message(&mut self, message: &str) -> io::Result<()>;
}

/// Starts children from a [`LaunchSpec`].
pub trait Spawner: Send + Sync + 'static {
    /// Spawns a new child. An error means the child never started.
    fn spawn(&self, spec: &LaunchSpec) -> io::Result<Box<dyn ChildHandle>>;
}
