//! Lifecycle events: the data model delivered to listeners.
//!
//! One [`ServiceEvent`] is dispatched per committed transition or per change
//! in a controller's dependency outlook. Dispatch is synchronous within the
//! transition that produced the event, so a listener observes a consistent
//! (possibly mid-flight) view of the graph.
//!
//! ## Contents
//! - [`ServiceEventKind`], [`ServiceEvent`] event classification and payload
//!
//! ## Quick reference
//! - **Publisher**: the scheduler, at each state-machine commit.
//! - **Consumers**: listeners registered per controller plus container-level
//!   listeners copied onto every controller at install time.

mod event;

pub use event::{ServiceEvent, ServiceEventKind};
