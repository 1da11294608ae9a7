//! # LoggingListener — simple event printer
//!
//! A minimal listener that prints incoming [`ServiceEvent`]s to stdout.
//! Use it for tests or demos.
//!
//! ## Example output
//! ```text
//! [transition] service=db Down -> Starting
//! [transition] service=db Starting -> Up
//! [failed] service=web reason="port in use"
//! [dependency-failed] service=api
//! [remove-requested] service=db
//! ```

use crate::events::{ServiceEvent, ServiceEventKind};
use crate::listeners::ServiceListener;

/// Event printer listener.
#[derive(Default)]
pub struct LoggingListener;

impl LoggingListener {
    /// Construct a new [`LoggingListener`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl ServiceListener for LoggingListener {
    fn on_event(&self, e: &ServiceEvent) {
        match &e.kind {
            ServiceEventKind::Transition(t) => {
                println!("[transition] service={} {}", e.name(), t);
            }
            ServiceEventKind::Failed { reason } => {
                println!("[failed] service={} reason={reason:?}", e.name());
            }
            ServiceEventKind::ListenerAdded => {
                println!("[listener-added] service={}", e.name());
            }
            ServiceEventKind::RemoveRequested => {
                println!("[remove-requested] service={}", e.name());
            }
            ServiceEventKind::RemoveRequestCleared => {
                println!("[remove-request-cleared] service={}", e.name());
            }
            ServiceEventKind::ImmediateDependencyAvailable => {
                println!("[immediate-dependency-available] service={}", e.name());
            }
            ServiceEventKind::ImmediateDependencyUnavailable => {
                println!("[immediate-dependency-unavailable] service={}", e.name());
            }
            ServiceEventKind::TransitiveDependencyAvailable => {
                println!("[transitive-dependency-available] service={}", e.name());
            }
            ServiceEventKind::TransitiveDependencyUnavailable => {
                println!("[transitive-dependency-unavailable] service={}", e.name());
            }
            ServiceEventKind::DependencyFailed => {
                println!("[dependency-failed] service={}", e.name());
            }
            ServiceEventKind::DependencyFailureCleared => {
                println!("[dependency-failure-cleared] service={}", e.name());
            }
        }
    }

    fn name(&self) -> &'static str {
        "LoggingListener"
    }
}
