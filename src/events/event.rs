//! # Lifecycle events emitted by the container.
//!
//! The [`ServiceEventKind`] enum covers three categories:
//! - **Transitions**: one committed `from → to` state change.
//! - **Dependency outlook**: availability and failure notifications fired on
//!   the *dependent* controller when a dependency's prospects change.
//! - **Administrative**: remove requests and listener registration.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically, and all events for a given transition are dispatched before
//! that transition is considered complete.

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::SystemTime;

use crate::core::ServiceHandle;
use crate::lifecycle::Transition;
use crate::name::ServiceName;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of lifecycle events.
#[non_exhaustive]
#[derive(Clone, Debug)]
pub enum ServiceEventKind {
    /// A state transition committed on this controller.
    Transition(Transition),

    /// This controller's start body failed; carries the failure description.
    ///
    /// Always followed by a `Transition` into `Down` (substate `StartFailed`).
    Failed {
        /// Failure description from the start body.
        reason: Arc<str>,
    },

    /// A listener was added to this controller (delivered to that listener only).
    ListenerAdded,

    /// The controller's mode was set to `Remove`.
    RemoveRequested,
    /// The controller's mode left `Remove` before removal completed.
    RemoveRequestCleared,

    /// Every immediate required dependency of this controller is available again.
    ImmediateDependencyAvailable,
    /// An immediate required dependency of this controller became unavailable
    /// (uninstalled, or administratively down).
    ImmediateDependencyUnavailable,
    /// No transitive dependency of this controller is unavailable any more.
    TransitiveDependencyAvailable,
    /// Some transitive (non-immediate) dependency became unavailable.
    TransitiveDependencyUnavailable,

    /// A required dependency (possibly transitive) failed to start.
    DependencyFailed,
    /// The last dependency start failure cleared.
    DependencyFailureCleared,
}

/// Lifecycle event with its originating controller.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - `controller`: handle of the controller the event concerns; safe to use
///   for non-blocking control (`set_mode`, `add_listener`) from inside a
///   listener callback.
#[derive(Clone)]
pub struct ServiceEvent {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Controller this event concerns.
    pub controller: ServiceHandle,
    /// Event classification.
    pub kind: ServiceEventKind,
}

impl ServiceEvent {
    /// Creates a new event with the current timestamp and next sequence number.
    pub(crate) fn new(controller: ServiceHandle, kind: ServiceEventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            controller,
            kind,
        }
    }

    /// Convenience: name of the controller this event concerns.
    pub fn name(&self) -> &ServiceName {
        self.controller.name()
    }

    /// Returns the transition if this is a transition event.
    pub fn transition(&self) -> Option<Transition> {
        match self.kind {
            ServiceEventKind::Transition(t) => Some(t),
            _ => None,
        }
    }
}
