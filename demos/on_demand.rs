//! # Example: on_demand
//!
//! An on-demand cache service that runs only while some consumer wants it.
//!
//! Demonstrates how to:
//! - Install a service with [`Mode::OnDemand`].
//! - Watch it start when an active dependent appears.
//! - Watch it stop again once the last demand goes away.
//!
//! Run with:
//! ```bash
//! cargo run --example on_demand
//! ```

use servisor::{Container, Mode, NullService, ServiceFn, ServiceName, StartContext};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let container = Container::new();

    let cache = container
        .add_service(
            ServiceName::of("cache"),
            ServiceFn::arc(|ctx: StartContext| async move {
                println!("[{}] warming up", ctx.name());
                Ok(())
            }),
        )
        .initial_mode(Mode::OnDemand)
        .install()
        .await?;

    container.await_stability().await;
    println!("no consumers: cache is {:?}/{:?}", cache.state(), cache.substate());

    let consumer = container
        .add_service(ServiceName::of("consumer"), NullService::arc())
        .dependency(ServiceName::of("cache"))
        .install()
        .await?;
    container.await_stability().await;
    println!("consumer installed: cache is {:?}", cache.state());

    consumer.set_mode(Mode::Never);
    container.await_stability().await;
    println!("consumer disabled: cache is {:?}/{:?}", cache.state(), cache.substate());

    container.shutdown();
    container.await_termination().await;
    Ok(())
}
