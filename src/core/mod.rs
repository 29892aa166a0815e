//! Runtime core: configuration, the restart state machine and the supervisor loop.
//!
//! Public API from this module: [`Supervisor`], [`SupervisorBuilder`],
//! [`SupervisorConfig`], [`Outcome`] and the shutdown enums.
//!
//! Internal modules:
//! - [`monitor`]: restart state machine (rules, backoff, rate limit, stability reset);
//! - [`launcher`]: spawns one child and publishes launch events;
//! - [`shutdown`]: OS signal / token subscription and the shutdown action;
//! - [`supervisor`]: the control loop tying everything together.

mod builder;
mod config;
mod launcher;
mod monitor;
mod outcome;
mod shutdown;
mod supervisor;

pub use builder::SupervisorBuilder;
pub use config::SupervisorConfig;
pub use outcome::Outcome;
pub use shutdown::{ShutdownAction, ShutdownCause};
pub use supervisor::Supervisor;
