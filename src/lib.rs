//! # servisor
//!
//! **Servisor** is a dependency-driven service lifecycle container for Rust.
//!
//! It provides primitives to define named async services, wire them together
//! with required and optional dependencies, and let a container start and
//! stop them in dependency order. The crate is designed as a building block
//! for modular runtimes that assemble themselves from installable services.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │   Service    │   │   Service    │   │   Service    │
//!     │  (user #1)   │   │  (user #2)   │   │  (user #3)   │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//!     ServiceBuilder     ServiceBuilder     ServiceBuilder
//!       .dependency()      .optional_        .initial_mode(
//!                           dependency()      OnDemand)
//!            │                  │                  │
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Container (one scheduler task owns the whole graph)              │
//! │  - Graph (arena of controllers, name registry, watcher index)     │
//! │  - cycle check at install time (atomic accept/reject)             │
//! │  - fixed-point evaluation after every message                     │
//! │  - StabilityWaiters (parked await_stability callers)              │
//! └──────┬──────────────────┬──────────────────┬──────────────────────┘
//!        ▼                  ▼                  ▼
//!   start/stop body    start/stop body    start/stop body
//!   (spawned task)     (spawned task)     (spawned task)
//!        │                  │                  │
//!        └──────────────────┴──────────────────┘
//!                           │ Msg::{StartOutcome, StopDone}
//!                           ▼
//!                  commit transition
//!                  ├─► update ServiceHandle snapshot
//!                  ├─► fire ServiceEvent to listeners (synchronous)
//!                  └─► re-evaluate dependents / providers / children
//! ```
//!
//! ### Controller lifecycle
//! ```text
//!            install (Duplicate / Circular / ParentDown rejected atomically)
//!               │
//!               ▼
//!  ┌─────────► Down ── wanted up && deps ready ──► Starting
//!  │            │                                     │
//!  │            │ parked:                   Ok ──► Up │ Err/panic
//!  │            │  - Waiting   (OnDemand,             │    │
//!  │            │     nobody demands it)              │    ▼
//!  │            │  - Problem   (dependency            │  Down (StartFailed)
//!  │            │     missing / failed)               │
//!  │            │  - StartFailed                      │
//!  │            ▼                                     ▼
//!  │         Removing ◄── mode Remove     dependents stop first,
//!  │            │         (children       children force-removed,
//!  │            ▼          forced too)    then Stopping
//!  │         Removed                                  │
//!  │         (name freed)                             │
//!  └──────────────────────────────────────────────────┘
//! ```
//!
//! ## Features
//! | Area              | Description                                                           | Key types / traits                        |
//! |-------------------|-----------------------------------------------------------------------|-------------------------------------------|
//! | **Container**     | Install services, await stability, shut down in dependency order.     | [`Container`], [`StabilityReport`]        |
//! | **Services**      | Define services as trait impls or closures, easy to compose.          | [`Service`], [`ServiceFn`], [`ServiceRef`]|
//! | **Dependencies**  | Required/optional edges by name; install order never matters.         | [`ServiceBuilder`], [`ServiceName`]       |
//! | **Control**       | Steer controllers at runtime: `Active`, `OnDemand`, `Never`, `Remove`.| [`ServiceHandle`], [`Mode`]               |
//! | **Listener API**  | Observe transitions, failures, and dependency outlook changes.        | [`ServiceListener`], [`ServiceEvent`]     |
//! | **Children**      | Start bodies install child services that die with their parent.       | [`StartContext`], [`ServiceTarget`]       |
//! | **Errors**        | Typed errors for installation and start bodies.                       | [`InstallError`], [`StartError`]          |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LoggingListener`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use servisor::{Container, Mode, ServiceFn, ServiceName, ServiceRef, StartContext, State};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let container = Container::new();
//!
//!     let db: ServiceRef = ServiceFn::arc(|ctx: StartContext| async move {
//!         println!("{} is starting", ctx.name());
//!         Ok(())
//!     });
//!     let web: ServiceRef = ServiceFn::arc(|ctx: StartContext| async move {
//!         println!("{} is starting", ctx.name());
//!         Ok(())
//!     });
//!
//!     // Install order never matters: web waits until db is up.
//!     let web = container
//!         .add_service(ServiceName::of("web"), web)
//!         .dependency(ServiceName::of("db"))
//!         .install()
//!         .await?;
//!     container
//!         .add_service(ServiceName::of("db"), db)
//!         .install()
//!         .await?;
//!
//!     container.await_stability().await;
//!     assert_eq!(web.state(), State::Up);
//!
//!     // Remove db: web is stopped first, then db.
//!     web.set_mode(Mode::Remove);
//!     container.shutdown();
//!     container.await_termination().await;
//!     Ok(())
//! }
//! ```
mod core;
mod error;
mod events;
mod lifecycle;
mod listeners;
mod name;
mod service;

// ---- Public re-exports ----

pub use core::{Container, ServiceBuilder, ServiceHandle, ServiceTarget, StabilityReport};
pub use error::{InstallError, StartError};
pub use events::{ServiceEvent, ServiceEventKind};
pub use lifecycle::{Mode, State, Substate, Transition};
pub use listeners::{FnListener, ServiceListener};
pub use name::ServiceName;
pub use service::{NullService, Service, ServiceFn, ServiceRef, StartContext, StopContext};

// Optional: expose a simple built-in logging listener (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use listeners::LoggingListener;
