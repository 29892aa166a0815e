//! # Child process abstractions.
//!
//! This module provides the process-side seams of the supervisor:
//! - [`Spawner`] - starts a child from a [`LaunchSpec`]
//! - [`ChildHandle`] - the single live child (exit notification, kill, message)
//! - [`ExitStatus`] - how a child ended (code and/or signal)
//! - [`CommandSpawner`] - default spawner backed by `tokio::process`

mod command;
mod handle;
mod spec;
mod status;

pub use command::CommandSpawner;
pub use handle::{ChildHandle, Spawner};
pub use spec::LaunchSpec;
pub use status::ExitStatus;
