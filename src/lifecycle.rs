//! # Controller lifecycle model.
//!
//! The small vocabulary the whole container is built on:
//!
//! - [`Mode`] — caller-set policy: should this service be up?
//! - [`State`] — where the controller currently is in its lifecycle.
//! - [`Substate`] — for a `Down` controller, *why* it is not up.
//! - [`Transition`] — one committed `from → to` state change.
//!
//! ## State machine
//! ```text
//!            ┌──────────────────────────────┐
//!            ▼                              │
//!  DOWN ─► STARTING ─► UP ─► STOPPING ──────┘
//!   │         │
//!   │         └─(start failed)─► DOWN (substate START_FAILED)
//!   │
//!   └─(mode = REMOVE)─► REMOVING ─► REMOVED   (terminal)
//! ```
//!
//! ## Choosing the right mode
//! ```text
//! Mode::Active     → up whenever its required dependencies allow
//! Mode::OnDemand   → up only while at least one dependent wants it up
//! Mode::Never      → administratively down (kept installed)
//! Mode::Remove     → stop, then unregister permanently
//! ```

use std::fmt;

/// Caller-set policy governing whether a controller *should* be up.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    /// Start as soon as required dependencies are up (default).
    #[default]
    Active,
    /// Start only while at least one dependent demands it.
    OnDemand,
    /// Stay down, but remain installed.
    Never,
    /// Stop and remove the service from the container.
    Remove,
}

/// Current lifecycle state of a controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    /// Not running. See [`Substate`] for the reason.
    Down,
    /// The start body is executing.
    Starting,
    /// Running; all required dependencies are up.
    Up,
    /// The stop body is executing.
    Stopping,
    /// Being unregistered from the container.
    Removing,
    /// Unregistered. Terminal; the name may be reused by a fresh install.
    Removed,
}

/// Refinement of [`State::Down`] explaining why a controller is not up.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Substate {
    /// No refinement applies.
    #[default]
    None,
    /// On-demand with no dependent demanding it.
    Waiting,
    /// A required dependency is unavailable or failed.
    Problem,
    /// The last start attempt failed; no automatic retry.
    StartFailed,
}

/// One committed state change of a controller.
///
/// ## Example
/// ```rust
/// use servisor::{State, Transition};
///
/// let t = Transition { from: State::Starting, to: State::Up };
/// assert!(t.enters(State::Up));
/// assert!(t.leaves(State::Starting));
/// assert!(!t.enters(State::Starting));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transition {
    /// State before the transition committed.
    pub from: State,
    /// State after the transition committed.
    pub to: State,
}

impl Transition {
    /// True if this transition entered `state`.
    pub fn enters(&self, state: State) -> bool {
        self.to == state && self.from != state
    }

    /// True if this transition left `state`.
    pub fn leaves(&self, state: State) -> bool {
        self.from == state && self.to != state
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} -> {:?}", self.from, self.to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enters_and_leaves() {
        let t = Transition {
            from: State::Removing,
            to: State::Removed,
        };
        assert!(t.enters(State::Removed));
        assert!(t.leaves(State::Removing));
        assert!(!t.enters(State::Removing));
        assert!(!t.leaves(State::Removed));
    }

    #[test]
    fn test_self_transition_enters_nothing() {
        let t = Transition {
            from: State::Down,
            to: State::Down,
        };
        assert!(!t.enters(State::Down));
        assert!(!t.leaves(State::Down));
    }
}
