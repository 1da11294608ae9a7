//! Container-level behavior: stability barriers, container-wide listeners,
//! shutdown, and termination.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;

use servisor::{
    Container, FnListener, InstallError, NullService, Service, ServiceFn, ServiceName, ServiceRef,
    StartContext, StartError, State, StopContext,
};

#[tokio::test]
async fn an_empty_container_is_stable() {
    let container = Container::new();
    assert!(container.await_stability_timeout(Duration::from_secs(1)).await);
    let report = container.await_stability_report().await;
    assert!(report.is_clean());
}

#[tokio::test]
async fn stability_waits_for_slow_starts() {
    let container = Container::new();
    let release = Arc::new(Notify::new());
    let gate = release.clone();

    let slow: ServiceRef = ServiceFn::arc(move |_ctx: StartContext| {
        let gate = gate.clone();
        async move {
            gate.notified().await;
            Ok(())
        }
    });
    let service = container
        .add_service(ServiceName::of("slow"), slow)
        .install()
        .await
        .unwrap();

    assert!(!container.await_stability_timeout(Duration::from_millis(50)).await);
    assert_eq!(service.state(), State::Starting);

    release.notify_one();
    assert!(container.await_stability_timeout(Duration::from_secs(1)).await);
    assert_eq!(service.state(), State::Up);
}

#[tokio::test]
async fn container_listeners_apply_to_later_installs() {
    let container = Container::new();
    let ups = Arc::new(AtomicUsize::new(0));
    let count = ups.clone();
    container.add_listener(FnListener::arc(move |ev| {
        if ev.transition().is_some_and(|t| t.enters(State::Up)) {
            count.fetch_add(1, Ordering::SeqCst);
        }
    }));

    container
        .add_service(ServiceName::of("a"), NullService::arc())
        .install()
        .await
        .unwrap();
    container
        .add_service(ServiceName::of("b"), NullService::arc())
        .install()
        .await
        .unwrap();
    container.await_stability().await;
    assert_eq!(ups.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn stability_covers_listener_enqueued_control() {
    let container = Container::new();

    let b = container
        .add_service(ServiceName::of("b"), NullService::arc())
        .install()
        .await
        .unwrap();

    // reacting to a's transition enqueues a control message mid-settle; the
    // stability barrier must not release before it is honored
    let b_handle = b.clone();
    container
        .add_service(ServiceName::of("a"), NullService::arc())
        .listener(FnListener::arc(move |ev| {
            if ev.transition().is_some_and(|t| t.enters(State::Up)) {
                b_handle.set_mode(servisor::Mode::Never);
            }
        }))
        .install()
        .await
        .unwrap();

    container.await_stability().await;
    assert_eq!(b.state(), State::Down);
}

#[tokio::test]
async fn shutdown_removes_everything_in_dependency_order() {
    struct Recorder {
        log: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Service for Recorder {
        async fn start(&self, _ctx: StartContext) -> Result<(), StartError> {
            Ok(())
        }
        async fn stop(&self, ctx: StopContext) {
            self.log.lock().unwrap().push(ctx.name().to_string());
        }
    }

    let container = Container::new();
    let stops = Arc::new(Mutex::new(Vec::new()));

    let a = container
        .add_service(
            ServiceName::of("a"),
            Arc::new(Recorder { log: stops.clone() }),
        )
        .install()
        .await
        .unwrap();
    let b = container
        .add_service(
            ServiceName::of("b"),
            Arc::new(Recorder { log: stops.clone() }),
        )
        .dependency(ServiceName::of("a"))
        .install()
        .await
        .unwrap();
    container.await_stability().await;

    container.shutdown();
    container.await_termination().await;

    assert_eq!(a.state(), State::Removed);
    assert_eq!(b.state(), State::Removed);
    assert_eq!(*stops.lock().unwrap(), vec!["b", "a"]);
}

#[tokio::test]
async fn installs_are_rejected_after_shutdown() {
    let container = Container::new();
    container.shutdown();
    container.await_termination().await;

    let err = container
        .add_service(ServiceName::of("late"), NullService::arc())
        .install()
        .await
        .unwrap_err();
    assert_eq!(err, InstallError::ContainerDown);
}

#[tokio::test]
async fn termination_waits_for_slow_stops() {
    let container = Container::new();
    let release = Arc::new(Notify::new());
    let gate = release.clone();

    struct SlowStop {
        gate: Arc<Notify>,
    }

    #[async_trait]
    impl Service for SlowStop {
        async fn start(&self, _ctx: StartContext) -> Result<(), StartError> {
            Ok(())
        }
        async fn stop(&self, _ctx: StopContext) {
            self.gate.notified().await;
        }
    }

    container
        .add_service(ServiceName::of("slow"), Arc::new(SlowStop { gate }))
        .install()
        .await
        .unwrap();
    container.await_stability().await;

    container.shutdown();
    assert!(
        !container
            .await_termination_timeout(Duration::from_millis(50))
            .await
    );

    release.notify_one();
    assert!(
        container
            .await_termination_timeout(Duration::from_secs(1))
            .await
    );
}

#[tokio::test]
async fn handles_survive_termination() {
    let container = Container::new();
    let service = container
        .add_service(ServiceName::of("a"), NullService::arc())
        .install()
        .await
        .unwrap();
    container.await_stability().await;

    container.shutdown();
    container.await_termination().await;

    assert_eq!(service.state(), State::Removed);
    // control messages to a dead container are silently dropped
    service.set_mode(servisor::Mode::Active);
    assert_eq!(service.state(), State::Removed);
}
