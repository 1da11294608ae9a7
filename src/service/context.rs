//! # Contexts passed into service bodies.
//!
//! [`StartContext`] and [`StopContext`] are the body's window back into the
//! container: the controller handle for the service being started/stopped,
//! and (for starts) a child target for installing services that live and die
//! with this one.
//!
//! ## Rules
//! - Child installs are accepted only while the parent is `Starting` or `Up`.
//! - A child is force-removed whenever its parent leaves `Up`, regardless of
//!   the child's own dependents.

use crate::core::{ServiceHandle, ServiceTarget};
use crate::name::ServiceName;

/// Context handed to [`Service::start`](crate::Service::start).
///
/// ## Example
/// ```rust,no_run
/// use servisor::{NullService, ServiceFn, ServiceName, ServiceRef, StartContext, StartError};
///
/// let parent: ServiceRef = ServiceFn::arc(|ctx: StartContext| async move {
///     ctx.child_target()
///         .add_service(ServiceName::of("worker"), NullService::arc())
///         .install()
///         .await?;
///     Ok::<_, StartError>(())
/// });
/// ```
pub struct StartContext {
    handle: ServiceHandle,
    child_target: ServiceTarget,
}

impl StartContext {
    pub(crate) fn new(handle: ServiceHandle, child_target: ServiceTarget) -> Self {
        Self {
            handle,
            child_target,
        }
    }

    /// Name of the service being started.
    pub fn name(&self) -> &ServiceName {
        self.handle.name()
    }

    /// Controller handle for the service being started.
    pub fn controller(&self) -> &ServiceHandle {
        &self.handle
    }

    /// Target for installing child services.
    ///
    /// Children installed here are implicitly dependent on this service
    /// staying `Up`; they are force-removed when it leaves `Up`.
    pub fn child_target(&self) -> &ServiceTarget {
        &self.child_target
    }
}

/// Context handed to [`Service::stop`](crate::Service::stop).
pub struct StopContext {
    handle: ServiceHandle,
}

impl StopContext {
    pub(crate) fn new(handle: ServiceHandle) -> Self {
        Self { handle }
    }

    /// Name of the service being stopped.
    pub fn name(&self) -> &ServiceName {
        self.handle.name()
    }

    /// Controller handle for the service being stopped.
    pub fn controller(&self) -> &ServiceHandle {
        &self.handle
    }
}
