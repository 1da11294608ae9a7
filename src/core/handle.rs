//! # Controller handle.
//!
//! [`ServiceHandle`] is the caller-facing side of one controller: cheap to
//! clone, readable from any thread, and able to steer the controller with
//! non-blocking control messages.
//!
//! ## Rules
//! - `state()` / `substate()` / `mode()` read a snapshot cell the scheduler
//!   updates at every commit; they never touch the graph and never block.
//! - `set_mode()` / `add_listener()` are fire-and-forget sends, so they are
//!   safe to call from inside a listener callback.
//! - A handle outlives its controller: after removal it keeps reporting
//!   `State::Removed` even if the name has been reused by a fresh install.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc;

use crate::core::scheduler::Msg;
use crate::lifecycle::{Mode, State, Substate};
use crate::listeners::ServiceListener;
use crate::name::ServiceName;

pub(crate) type ControllerId = usize;

/// Snapshot of the externally visible controller state.
#[derive(Clone, Copy)]
struct Snapshot {
    state: State,
    substate: Substate,
    mode: Mode,
}

/// Scheduler-updated cell behind every handle clone.
pub(crate) struct StateCell {
    inner: Mutex<Snapshot>,
}

impl StateCell {
    fn new(mode: Mode) -> Self {
        Self {
            inner: Mutex::new(Snapshot {
                state: State::Down,
                substate: Substate::None,
                mode,
            }),
        }
    }

    fn read(&self) -> Snapshot {
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn set_state(&self, state: State, substate: Substate) {
        let mut g = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        g.state = state;
        g.substate = substate;
    }

    pub(crate) fn set_mode(&self, mode: Mode) {
        let mut g = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        g.mode = mode;
    }
}

/// Handle to one installed service's controller.
///
/// Returned by [`ServiceBuilder::install`](crate::ServiceBuilder::install)
/// and carried by every [`ServiceEvent`](crate::ServiceEvent).
#[derive(Clone)]
pub struct ServiceHandle {
    pub(crate) id: ControllerId,
    name: ServiceName,
    cell: Arc<StateCell>,
    tx: mpsc::UnboundedSender<Msg>,
}

impl ServiceHandle {
    pub(crate) fn new(
        id: ControllerId,
        name: ServiceName,
        mode: Mode,
        tx: mpsc::UnboundedSender<Msg>,
    ) -> Self {
        Self {
            id,
            name,
            cell: Arc::new(StateCell::new(mode)),
            tx,
        }
    }

    /// Name of the service this controller manages.
    pub fn name(&self) -> &ServiceName {
        &self.name
    }

    /// Current lifecycle state.
    pub fn state(&self) -> State {
        self.cell.read().state
    }

    /// Current substate (why a `Down` controller is not up).
    pub fn substate(&self) -> Substate {
        self.cell.read().substate
    }

    /// Current mode.
    pub fn mode(&self) -> Mode {
        self.cell.read().mode
    }

    /// Requests a mode change.
    ///
    /// Non-blocking; honored once any in-flight transition settles. Setting
    /// the current mode again is a no-op. Ignored once the controller is
    /// `Removing`/`Removed` or the container is gone.
    pub fn set_mode(&self, mode: Mode) {
        let _ = self.tx.send(Msg::SetMode { id: self.id, mode });
    }

    /// Registers a listener on this controller.
    ///
    /// Non-blocking; the listener receives `ListenerAdded` once registered,
    /// then every subsequent event of this controller.
    pub fn add_listener(&self, listener: Arc<dyn ServiceListener>) {
        let _ = self.tx.send(Msg::AddListener {
            id: self.id,
            listener,
        });
    }

    pub(crate) fn cell(&self) -> &Arc<StateCell> {
        &self.cell
    }
}

impl fmt::Debug for ServiceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let snap = self.cell.read();
        f.debug_struct("ServiceHandle")
            .field("name", &self.name)
            .field("state", &snap.state)
            .field("substate", &snap.substate)
            .field("mode", &snap.mode)
            .finish()
    }
}
