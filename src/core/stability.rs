//! # Stability barrier.
//!
//! The container is *stable* when no controller has an in-flight or queued
//! transition: a fixed point. Callers park on
//! [`Container::await_stability`](crate::Container::await_stability) and are
//! released with a [`StabilityReport`] collected atomically at the moment the
//! fixed point is reached, so end-state assertions cannot race further
//! transitions.

use tokio::sync::oneshot;

use crate::name::ServiceName;

/// Snapshot of the services left in a failed or problem substate at the
/// moment stability was reached.
///
/// Both lists are sorted by name.
#[derive(Clone, Debug, Default)]
pub struct StabilityReport {
    /// Services parked in substate `StartFailed`.
    pub failed: Vec<ServiceName>,
    /// Services parked in substate `Problem`.
    pub problem: Vec<ServiceName>,
}

impl StabilityReport {
    /// True if no service is parked in a failed or problem substate.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.problem.is_empty()
    }
}

/// Parked stability waiters, flushed by the scheduler at each fixed point.
#[derive(Default)]
pub(crate) struct StabilityWaiters {
    waiters: Vec<oneshot::Sender<StabilityReport>>,
}

impl StabilityWaiters {
    /// Parks one waiter until the next fixed point.
    pub fn park(&mut self, reply: oneshot::Sender<StabilityReport>) {
        self.waiters.push(reply);
    }

    pub fn is_empty(&self) -> bool {
        self.waiters.is_empty()
    }

    /// Releases every parked waiter with a clone of `report`.
    pub fn flush(&mut self, report: &StabilityReport) {
        for reply in self.waiters.drain(..) {
            let _ = reply.send(report.clone());
        }
    }
}
