//! # Core listener trait
//!
//! `ServiceListener` is the extension point for observing controller
//! lifecycle events. Listeners are registered per controller
//! ([`ServiceBuilder::listener`](crate::ServiceBuilder::listener),
//! [`ServiceHandle::add_listener`](crate::ServiceHandle::add_listener)) or
//! container-wide ([`Container::add_listener`](crate::Container::add_listener),
//! applied to every controller installed afterwards).
//!
//! ## Contract
//! - Callbacks run on the scheduler task, synchronously within the transition
//!   that produced the event — keep them short and never block indefinitely.
//! - Mutating the graph from a callback is safe only through non-blocking
//!   operations (`ServiceHandle::set_mode`, `ServiceHandle::add_listener`) or
//!   a spawned task holding a `Container` clone.

use std::sync::Arc;

use crate::events::ServiceEvent;

/// Contract for lifecycle event listeners.
pub trait ServiceListener: Send + Sync + 'static {
    /// Handle a single event for this listener.
    fn on_event(&self, event: &ServiceEvent);

    /// Human-readable name (for logs).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Closure-backed listener.
///
/// ## Example
/// ```rust
/// use servisor::{FnListener, ServiceEventKind, State};
///
/// let removals = FnListener::arc(|ev| {
///     if let ServiceEventKind::Transition(t) = &ev.kind {
///         if t.enters(State::Removed) {
///             println!("{} removed", ev.name());
///         }
///     }
/// });
/// ```
pub struct FnListener<F> {
    f: F,
}

impl<F> FnListener<F>
where
    F: Fn(&ServiceEvent) + Send + Sync + 'static,
{
    /// Creates a new closure-backed listener.
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Creates the listener and returns it as a shared handle.
    #[must_use]
    pub fn arc(f: F) -> Arc<dyn ServiceListener> {
        Arc::new(Self::new(f))
    }
}

impl<F> ServiceListener for FnListener<F>
where
    F: Fn(&ServiceEvent) + Send + Sync + 'static,
{
    fn on_event(&self, event: &ServiceEvent) {
        (self.f)(event)
    }

    fn name(&self) -> &'static str {
        "FnListener"
    }
}
