//! # Lifecycle listeners.
//!
//! This module provides the [`ServiceListener`] trait and built-in
//! implementations for observing [`ServiceEvent`](crate::ServiceEvent)s.
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   scheduler commit ── dispatch(&ServiceEvent) ──► controller listeners
//!                                                        │
//!                                                   ┌────┴──────┬─────────┐
//!                                                   ▼           ▼         ▼
//!                                              FnListener  LoggingL.  custom
//! ```
//!
//! ## Rules
//! - Dispatch is **synchronous** within the transition that produced the
//!   event; a listener must not block indefinitely.
//! - A listener may safely control other services from a callback through
//!   the non-blocking handle operations (`set_mode`, `add_listener`) or by
//!   spawning a task that holds a `Container` clone.
//! - Panics in a listener are caught and dropped; the scheduler keeps going.
//!
//! ## Implementing custom listeners
//! ```rust
//! use servisor::{ServiceEvent, ServiceEventKind, ServiceListener, State};
//!
//! struct RemovalWatch;
//!
//! impl ServiceListener for RemovalWatch {
//!     fn on_event(&self, event: &ServiceEvent) {
//!         if let ServiceEventKind::Transition(t) = &event.kind {
//!             if t.enters(State::Removed) {
//!                 // react to the removal...
//!             }
//!         }
//!     }
//! }
//! ```

mod listener;
#[cfg(feature = "logging")]
mod log;

pub use listener::{FnListener, ServiceListener};
#[cfg(feature = "logging")]
pub use log::LoggingListener;
