//! # Container — the public entry point.
//!
//! Owns the scheduler task. Clones share the same container; the scheduler
//! shuts down when `shutdown()` is called or the last clone is dropped, and
//! `await_termination()` resolves once every controller reached `Removed`.
//!
//! ## Example
//! ```ignore
//! let container = Container::new();
//! container
//!     .add_service(ServiceName::of("db"), DbService::arc())
//!     .install()
//!     .await?;
//! container.await_stability().await;
//! container.shutdown();
//! container.await_termination().await;
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use crate::core::builder::{ServiceBuilder, ServiceTarget};
use crate::core::scheduler::{Msg, Scheduler};
use crate::core::stability::StabilityReport;
use crate::listeners::ServiceListener;
use crate::name::ServiceName;
use crate::service::ServiceRef;

struct Inner {
    tx: mpsc::UnboundedSender<Msg>,
    terminated: CancellationToken,
}

impl Drop for Inner {
    fn drop(&mut self) {
        // last clone gone: no handle can install anymore, drain and stop
        let _ = self.tx.send(Msg::Shutdown);
    }
}

/// A service container: a named graph of controllers driven by one scheduler
/// task.
///
/// Cheap to clone; all clones address the same graph. Must be created inside
/// a Tokio runtime.
#[derive(Clone)]
pub struct Container {
    inner: Arc<Inner>,
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl Container {
    /// Creates a container and spawns its scheduler task.
    pub fn new() -> Self {
        let (tx, terminated) = Scheduler::spawn();
        Self {
            inner: Arc::new(Inner { tx, terminated }),
        }
    }

    /// Begins building a top-level service installation.
    pub fn add_service(&self, name: ServiceName, service: ServiceRef) -> ServiceBuilder {
        ServiceTarget::root(self.inner.tx.clone()).add_service(name, service)
    }

    /// Registers a container-wide listener: it is attached to every service
    /// installed *after* this call.
    pub fn add_listener(&self, listener: Arc<dyn ServiceListener>) {
        let _ = self.inner.tx.send(Msg::AddContainerListener { listener });
    }

    /// Waits until no controller has an in-flight or queued transition.
    ///
    /// Stability is a fixed point, not success: services may be parked in
    /// `Problem` or `StartFailed`. Use [`await_stability_report`]
    /// (Self::await_stability_report) to see which.
    pub async fn await_stability(&self) {
        let _ = self.stability().await;
    }

    /// Waits for stability and reports the services left failed or in
    /// problem, collected atomically at the fixed point.
    pub async fn await_stability_report(&self) -> StabilityReport {
        self.stability().await
    }

    /// [`await_stability`](Self::await_stability) with a deadline. Returns
    /// `false` if the container was still settling when time ran out.
    pub async fn await_stability_timeout(&self, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, self.stability()).await.is_ok()
    }

    async fn stability(&self) -> StabilityReport {
        let (reply, rx) = oneshot::channel();
        if self.inner.tx.send(Msg::AwaitStability { reply }).is_err() {
            // scheduler already terminated: trivially stable
            return StabilityReport::default();
        }
        rx.await.unwrap_or_default()
    }

    /// Requests shutdown: every root service is marked for removal (children
    /// follow their parents) and no further installs are accepted.
    ///
    /// Non-blocking; pair with [`await_termination`](Self::await_termination).
    pub fn shutdown(&self) {
        let _ = self.inner.tx.send(Msg::Shutdown);
    }

    /// Resolves once shutdown has completed and every controller reached
    /// `Removed`.
    pub async fn await_termination(&self) {
        self.inner.terminated.cancelled().await;
    }

    /// [`await_termination`](Self::await_termination) with a deadline.
    /// Returns `false` on timeout.
    pub async fn await_termination_timeout(&self, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, self.await_termination())
            .await
            .is_ok()
    }
}
