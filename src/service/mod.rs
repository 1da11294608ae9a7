//! # Service abstractions.
//!
//! This module provides the types a caller implements or supplies:
//! - [`Service`] - trait for the async start/stop body of a service
//! - [`ServiceFn`] - closure-backed service implementation
//! - [`ServiceRef`] - shared reference to a service (`Arc<dyn Service>`)
//! - [`NullService`] - a service whose start/stop bodies do nothing
//! - [`StartContext`] / [`StopContext`] - handles passed into the bodies

mod context;
mod service;
mod service_fn;

pub use context::{StartContext, StopContext};
pub use service::{NullService, Service, ServiceRef};
pub use service_fn::ServiceFn;
