//! # Event subscribers and the log sink.
//!
//! This module provides the [`Subscribe`] trait, the fan-out [`SubscriberSet`],
//! and the logging path that every supervisor transition takes.
//!
//! ## Architecture
//! ```text
//! Supervisor ── publish(Event) ──► Bus ──► listener ──► SubscriberSet::emit(&Event)
//!                                                          │
//!                                                ┌─────────┴─────────┐
//!                                                ▼                   ▼
//!                                           SinkWriter         user subscribers
//!                                                │
//!                                                ▼
//!                                      LogSink::{info,warn,error}(message, code)
//!                                      (TracingSink by default)
//! ```

mod sink;
mod subscriber;
mod subscriber_set;
mod writer;

pub use sink::{LogChannel, LogSink, TracingSink};
pub use subscriber::Subscribe;
pub use subscriber_set::SubscriberSet;
pub use writer::{SinkWriter, render};
