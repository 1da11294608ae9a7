//! # Service builder and install targets.
//!
//! A [`ServiceTarget`] is somewhere services can be installed into: the
//! [`Container`](crate::Container) itself, or the child target a start body
//! obtains from its [`StartContext`](crate::StartContext). Both hand out
//! [`ServiceBuilder`]s; `install()` submits the finished definition to the
//! scheduler and waits for the atomic accept/reject decision.
//!
//! ## Example
//! ```ignore
//! let db = container
//!     .add_service(ServiceName::of("db"), DbService::arc())
//!     .install()
//!     .await?;
//!
//! let web = container
//!     .add_service(ServiceName::of("web"), WebService::arc())
//!     .dependency(ServiceName::of("db"))
//!     .optional_dependency(ServiceName::of("metrics"))
//!     .initial_mode(Mode::OnDemand)
//!     .install()
//!     .await?;
//! ```

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};

use crate::core::graph::DependencySpec;
use crate::core::handle::{ControllerId, ServiceHandle};
use crate::core::scheduler::{Msg, ServiceDefinition};
use crate::error::InstallError;
use crate::lifecycle::Mode;
use crate::listeners::ServiceListener;
use crate::name::ServiceName;
use crate::service::ServiceRef;

/// An installation point for services.
///
/// Cloning is cheap; a target created from a start body installs *children*
/// of that service, removed with their parent.
#[derive(Clone)]
pub struct ServiceTarget {
    tx: mpsc::UnboundedSender<Msg>,
    parent: Option<ControllerId>,
}

impl ServiceTarget {
    pub(crate) fn root(tx: mpsc::UnboundedSender<Msg>) -> Self {
        Self { tx, parent: None }
    }

    pub(crate) fn child_of(tx: mpsc::UnboundedSender<Msg>, parent: ControllerId) -> Self {
        Self {
            tx,
            parent: Some(parent),
        }
    }

    /// Begins building a service installation under `name`.
    pub fn add_service(&self, name: ServiceName, service: ServiceRef) -> ServiceBuilder {
        ServiceBuilder {
            tx: self.tx.clone(),
            name,
            service,
            deps: Vec::new(),
            mode: Mode::Active,
            listeners: Vec::new(),
            parent: self.parent,
        }
    }
}

/// Accumulates one service installation; consumed by [`install`](Self::install).
pub struct ServiceBuilder {
    tx: mpsc::UnboundedSender<Msg>,
    name: ServiceName,
    service: ServiceRef,
    deps: Vec<DependencySpec>,
    mode: Mode,
    listeners: Vec<Arc<dyn ServiceListener>>,
    parent: Option<ControllerId>,
}

impl ServiceBuilder {
    /// Declares a required dependency: this service starts only after the
    /// named service is `Up`, and stops before it goes down.
    ///
    /// The name does not need to be installed yet.
    #[must_use]
    pub fn dependency(mut self, name: ServiceName) -> Self {
        self.deps.push(DependencySpec::required(name));
        self
    }

    /// Declares an optional dependency: awaited while the named service is
    /// on its way up, ignored while it is missing or blocked. If it was up
    /// at start time, losing it bounces this service.
    #[must_use]
    pub fn optional_dependency(mut self, name: ServiceName) -> Self {
        self.deps.push(DependencySpec::optional(name));
        self
    }

    /// Initial mode; defaults to [`Mode::Active`].
    #[must_use]
    pub fn initial_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Attaches a listener that will see every event of this controller,
    /// starting with `ListenerAdded` during the install itself.
    #[must_use]
    pub fn listener(mut self, listener: Arc<dyn ServiceListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    /// Submits the installation.
    ///
    /// Atomic: on any error the container is left exactly as it was. Errors:
    /// [`InstallError::Duplicate`] if the name is taken,
    /// [`InstallError::Circular`] if the declared dependencies close a cycle,
    /// [`InstallError::ParentDown`] if the installing parent already left
    /// `Starting`/`Up`, and [`InstallError::ContainerDown`] after shutdown.
    pub async fn install(self) -> Result<ServiceHandle, InstallError> {
        let (reply, rx) = oneshot::channel();
        let def = ServiceDefinition {
            name: self.name,
            service: self.service,
            deps: self.deps,
            mode: self.mode,
            listeners: self.listeners,
            parent: self.parent,
        };
        self.tx
            .send(Msg::Install { def, reply })
            .map_err(|_| InstallError::ContainerDown)?;
        rx.await.map_err(|_| InstallError::ContainerDown)?
    }
}
