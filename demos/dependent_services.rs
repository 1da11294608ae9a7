//! # Example: dependent_services
//!
//! A three-service stack (config -> db -> web) wired by name, with a
//! [`LoggingListener`] printing every lifecycle event.
//!
//! Demonstrates how to:
//! - Define services with [`ServiceFn`] and install them in any order.
//! - Declare required dependencies with [`ServiceBuilder::dependency`].
//! - Watch transitions with a container-wide listener.
//! - Remove a dependency and watch its dependents come down first.
//!
//! Run with:
//! ```bash
//! cargo run --example dependent_services --features logging
//! ```

use std::sync::Arc;
use std::time::Duration;

use servisor::{Container, LoggingListener, Mode, ServiceFn, ServiceName, ServiceRef, StartContext};

fn noisy(work_ms: u64) -> ServiceRef {
    ServiceFn::arc(move |ctx: StartContext| async move {
        println!("[{}] starting ({work_ms}ms)", ctx.name());
        tokio::time::sleep(Duration::from_millis(work_ms)).await;
        println!("[{}] up", ctx.name());
        Ok(())
    })
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let container = Container::new();
    container.add_listener(Arc::new(LoggingListener::new()));

    // Install the dependent first: it simply waits for its dependencies.
    let web = container
        .add_service(ServiceName::of("web"), noisy(30))
        .dependency(ServiceName::of("db"))
        .install()
        .await?;
    let db = container
        .add_service(ServiceName::of("db"), noisy(50))
        .dependency(ServiceName::of("config"))
        .install()
        .await?;
    container
        .add_service(ServiceName::of("config"), noisy(10))
        .install()
        .await?;

    container.await_stability().await;
    println!("--- stack is up: web={:?} db={:?} ---", web.state(), db.state());

    // Removing db forces web down first, in dependency order.
    db.set_mode(Mode::Remove);
    let report = container.await_stability_report().await;
    println!(
        "--- db removed: web={:?}/{:?} problems={:?} ---",
        web.state(),
        web.substate(),
        report.problem
    );

    container.shutdown();
    container.await_termination().await;
    Ok(())
}
