//! Error types used by the container and by service bodies.
//!
//! Two error enums, mirroring the split between structural install-time
//! violations and contained runtime failures:
//!
//! - [`InstallError`] — raised synchronously by `install()`; the graph is
//!   left untouched.
//! - [`StartError`] — raised by a service's start body; recorded as the
//!   START_FAILED substate and propagated to dependents as dependency-failure
//!   notifications, never out of the scheduler.
//!
//! Both provide `as_label()` for stable snake_case identifiers in logs.

use thiserror::Error;

use crate::name::ServiceName;

/// # Errors raised when installing a service.
///
/// These are the only failures surfaced synchronously to the caller; anything
/// that happens after a successful install is reported through substates and
/// listener events instead.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InstallError {
    /// The declared dependencies would close a cycle through `name`.
    /// The registry is left unmodified.
    #[error("installing {name} would create a dependency cycle")]
    Circular {
        /// Name of the rejected service.
        name: ServiceName,
    },

    /// A non-removed service with the same name is already installed.
    #[error("duplicate service name {name}")]
    Duplicate {
        /// The conflicting name.
        name: ServiceName,
    },

    /// A child install was attempted while the parent is no longer running.
    #[error("parent service {parent} is not starting or up")]
    ParentDown {
        /// Name of the parent service.
        parent: ServiceName,
    },

    /// The container has been shut down and accepts no further installs.
    #[error("container is shut down")]
    ContainerDown,
}

impl InstallError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use servisor::{InstallError, ServiceName};
    ///
    /// let err = InstallError::Duplicate { name: ServiceName::of("db") };
    /// assert_eq!(err.as_label(), "install_duplicate");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            InstallError::Circular { .. } => "install_circular_dependency",
            InstallError::Duplicate { .. } => "install_duplicate",
            InstallError::ParentDown { .. } => "install_parent_down",
            InstallError::ContainerDown => "install_container_down",
        }
    }
}

/// # Errors raised by a service start body.
///
/// A start error never crashes the scheduler: the controller lands in
/// `Down` with substate `StartFailed`, and dependents observe
/// `DependencyFailed` notifications.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum StartError {
    /// The start body reported a failure.
    #[error("service start failed: {reason}")]
    Failed {
        /// Human-readable failure description.
        reason: String,
    },

    /// The start body panicked; the panic was caught and contained.
    #[error("service start panicked: {reason}")]
    Panicked {
        /// Extracted panic payload, if printable.
        reason: String,
    },

    /// A child install performed during start was rejected.
    #[error("child install rejected: {0}")]
    Install(#[from] InstallError),
}

impl StartError {
    /// Shorthand for [`StartError::Failed`].
    pub fn failed(reason: impl Into<String>) -> Self {
        StartError::Failed {
            reason: reason.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            StartError::Failed { .. } => "start_failed",
            StartError::Panicked { .. } => "start_panicked",
            StartError::Install(_) => "start_child_install",
        }
    }
}
