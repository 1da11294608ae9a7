//! # The service body contract.
//!
//! A [`Service`] owns the business logic behind one installed name: an async
//! [`start`](Service::start) that brings it up and an async
//! [`stop`](Service::stop) that tears it down. The container drives both at
//! the right points of the lifecycle; the body never sequences itself.
//!
//! The common handle type is [`ServiceRef`], an `Arc<dyn Service>` suitable
//! for sharing across the runtime.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::StartError;
use crate::service::context::{StartContext, StopContext};

/// Shared reference to a service body.
pub type ServiceRef = Arc<dyn Service>;

/// # Async start/stop body of one service.
///
/// The container calls [`start`](Service::start) once the controller's
/// required dependencies are up, and [`stop`](Service::stop) when the
/// controller must leave `Up`. Both run on their own task, so a slow body
/// only delays its own controller.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use servisor::{Service, StartContext, StartError};
///
/// struct Demo;
///
/// #[async_trait]
/// impl Service for Demo {
///     async fn start(&self, _ctx: StartContext) -> Result<(), StartError> {
///         // acquire resources...
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Service: Send + Sync + 'static {
    /// Brings the service up.
    ///
    /// Returning an error (or panicking) parks the controller in `Down` with
    /// substate `StartFailed` and notifies dependents; it does not crash the
    /// container. Child services may be installed through
    /// [`StartContext::child_target`].
    async fn start(&self, ctx: StartContext) -> Result<(), StartError>;

    /// Tears the service down. Best-effort; the default does nothing.
    async fn stop(&self, _ctx: StopContext) {}
}

/// A service whose start and stop bodies do nothing.
///
/// The stand-in body for services that only exist as dependency targets.
///
/// # Example
/// ```
/// use servisor::NullService;
///
/// let body = NullService::arc();
/// ```
#[derive(Debug, Default)]
pub struct NullService;

impl NullService {
    /// Returns a shared handle to a null service.
    #[must_use]
    pub fn arc() -> ServiceRef {
        Arc::new(NullService)
    }
}

#[async_trait]
impl Service for NullService {
    async fn start(&self, _ctx: StartContext) -> Result<(), StartError> {
        Ok(())
    }
}
