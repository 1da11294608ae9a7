//! # Core runtime: container, scheduler, graph.
//!
//! ```text
//! Container ──► ServiceTarget ──► ServiceBuilder ──► Msg::Install
//!                                                        │
//!                    Scheduler task ◄────────────────────┘
//!                     ├── Graph (arena + registry + watchers)
//!                     ├── StabilityWaiters
//!                     └── spawned start/stop bodies ──► Msg::{StartOutcome, StopDone}
//!
//! ServiceHandle ──► StateCell snapshot (reads) / Msg (control)
//! ```

mod builder;
mod container;
mod graph;
mod handle;
mod scheduler;
mod stability;

pub use builder::{ServiceBuilder, ServiceTarget};
pub use container::Container;
pub use handle::ServiceHandle;
pub use stability::StabilityReport;
