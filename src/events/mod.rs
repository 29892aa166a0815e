//! Supervisor events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to events emitted by the supervisor loop and the
//! subscriber workers.
//!
//! ## Contents
//! - [`EventKind`], [`Event`], [`Level`] classification, payload and severity
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Supervisor` (every state transition), `SubscriberSet`
//!   workers (overflow/panic).
//! - **Consumers**: the supervisor's listener task, which fans out to the
//!   `SubscriberSet` (and from there to the log sink).

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind, Level};
