//! # Closure-backed service (`ServiceFn`)
//!
//! [`ServiceFn`] wraps a closure `F: Fn(StartContext) -> Fut`, producing a
//! fresh future per start attempt. This avoids shared mutable state between
//! restarts; if shared state is needed, move an `Arc<...>` into the closure
//! explicitly.
//!
//! ## Example
//! ```rust
//! use servisor::{ServiceFn, ServiceRef, StartContext, StartError};
//!
//! let body: ServiceRef = ServiceFn::arc(|_ctx: StartContext| async move {
//!     // acquire resources...
//!     Ok::<_, StartError>(())
//! });
//! ```

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::StartError;
use crate::service::context::StartContext;
use crate::service::service::{Service, ServiceRef};

/// Closure-backed service implementation.
///
/// Wraps a start closure that *creates* a new future per attempt; the stop
/// body is the trait default (no-op).
#[derive(Debug)]
pub struct ServiceFn<F> {
    f: F,
}

impl<F> ServiceFn<F> {
    /// Creates a new closure-backed service.
    ///
    /// Prefer [`ServiceFn::arc`] when you immediately need a [`ServiceRef`].
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Creates the service and returns it as a shared handle.
    #[must_use]
    pub fn arc(f: F) -> ServiceRef
    where
        Self: Service,
    {
        Arc::new(Self::new(f))
    }
}

#[async_trait]
impl<F, Fut> Service for ServiceFn<F>
where
    F: Fn(StartContext) -> Fut + Send + Sync + 'static, // Fn, not FnMut
    Fut: Future<Output = Result<(), StartError>> + Send + 'static,
{
    async fn start(&self, ctx: StartContext) -> Result<(), StartError> {
        (self.f)(ctx).await
    }
}
