//! Start failures and panics: containment, dependent notification, and the
//! recovery paths out of `StartFailed`.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use servisor::{
    Container, FnListener, Mode, NullService, ServiceEventKind, ServiceFn, ServiceName, ServiceRef,
    StartContext, StartError, State, Substate,
};

fn failing(reason: &'static str) -> ServiceRef {
    ServiceFn::arc(move |_ctx: StartContext| async move { Err(StartError::failed(reason)) })
}

#[tokio::test]
async fn start_failure_parks_the_controller() {
    let container = Container::new();
    let failures = Arc::new(AtomicUsize::new(0));
    let seen = failures.clone();

    let broken = container
        .add_service(ServiceName::of("broken"), failing("port in use"))
        .listener(FnListener::arc(move |ev| {
            if let ServiceEventKind::Failed { reason } = &ev.kind {
                assert!(reason.contains("port in use"));
                seen.fetch_add(1, Ordering::SeqCst);
            }
        }))
        .install()
        .await
        .unwrap();

    let report = container.await_stability_report().await;
    assert_eq!(broken.state(), State::Down);
    assert_eq!(broken.substate(), Substate::StartFailed);
    assert_eq!(report.failed, vec![ServiceName::of("broken")]);
    assert!(report.problem.is_empty());
    // no automatic retry: exactly one attempt
    assert_eq!(failures.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn dependents_of_a_failed_service_are_notified() {
    let container = Container::new();
    let dep_failed = Arc::new(AtomicUsize::new(0));
    let seen = dep_failed.clone();

    container
        .add_service(ServiceName::of("broken"), failing("boom"))
        .install()
        .await
        .unwrap();
    let dependent = container
        .add_service(ServiceName::of("dependent"), NullService::arc())
        .dependency(ServiceName::of("broken"))
        .listener(FnListener::arc(move |ev| {
            if matches!(ev.kind, ServiceEventKind::DependencyFailed) {
                seen.fetch_add(1, Ordering::SeqCst);
            }
        }))
        .install()
        .await
        .unwrap();

    let report = container.await_stability_report().await;
    assert_eq!(dependent.state(), State::Down);
    assert_eq!(dependent.substate(), Substate::Problem);
    assert_eq!(report.failed, vec![ServiceName::of("broken")]);
    assert_eq!(report.problem, vec![ServiceName::of("dependent")]);
    assert_eq!(dep_failed.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn a_panicking_start_body_is_contained() {
    let container = Container::new();

    let panicking: ServiceRef = ServiceFn::arc(|_ctx: StartContext| async move {
        if true {
            panic!("wired wrong");
        }
        Ok(())
    });
    let broken = container
        .add_service(ServiceName::of("broken"), panicking)
        .install()
        .await
        .unwrap();

    let report = container.await_stability_report().await;
    assert_eq!(broken.state(), State::Down);
    assert_eq!(broken.substate(), Substate::StartFailed);
    assert_eq!(report.failed, vec![ServiceName::of("broken")]);

    // the scheduler survived: unrelated services still work
    let ok = container
        .add_service(ServiceName::of("ok"), NullService::arc())
        .install()
        .await
        .unwrap();
    container.await_stability().await;
    assert_eq!(ok.state(), State::Up);
}

#[tokio::test]
async fn a_mode_change_retries_a_failed_start() {
    let container = Container::new();

    let healthy = Arc::new(AtomicBool::new(false));
    let gate = healthy.clone();
    let flaky: ServiceRef = ServiceFn::arc(move |_ctx: StartContext| {
        let gate = gate.clone();
        async move {
            if gate.load(Ordering::SeqCst) {
                Ok(())
            } else {
                Err(StartError::failed("not ready yet"))
            }
        }
    });

    let service = container
        .add_service(ServiceName::of("flaky"), flaky)
        .install()
        .await
        .unwrap();
    let dependent = container
        .add_service(ServiceName::of("dependent"), NullService::arc())
        .dependency(ServiceName::of("flaky"))
        .install()
        .await
        .unwrap();

    container.await_stability().await;
    assert_eq!(service.substate(), Substate::StartFailed);
    assert_eq!(dependent.substate(), Substate::Problem);

    healthy.store(true, Ordering::SeqCst);
    service.set_mode(Mode::Never);
    service.set_mode(Mode::Active);
    let report = container.await_stability_report().await;

    assert!(report.is_clean());
    assert_eq!(service.state(), State::Up);
    assert_eq!(dependent.state(), State::Up);
}

#[tokio::test]
async fn a_dependency_coming_up_retries_a_failed_start() {
    let container = Container::new();

    let healthy = Arc::new(AtomicBool::new(false));
    let gate = healthy.clone();
    let needy: ServiceRef = ServiceFn::arc(move |_ctx: StartContext| {
        let gate = gate.clone();
        async move {
            if gate.load(Ordering::SeqCst) {
                Ok(())
            } else {
                Err(StartError::failed("config not readable"))
            }
        }
    });

    let config = container
        .add_service(ServiceName::of("config"), NullService::arc())
        .install()
        .await
        .unwrap();
    let needy = container
        .add_service(ServiceName::of("needy"), needy)
        .dependency(ServiceName::of("config"))
        .install()
        .await
        .unwrap();
    container.await_stability().await;
    assert_eq!(needy.substate(), Substate::StartFailed);

    // bounce the dependency; a live dependency problem outranks the stale
    // start failure while it lasts
    config.set_mode(Mode::Never);
    container.await_stability().await;
    assert_eq!(needy.substate(), Substate::Problem);

    // the dependency coming back up clears the failure and retries
    healthy.store(true, Ordering::SeqCst);
    config.set_mode(Mode::Active);
    let report = container.await_stability_report().await;
    assert!(report.is_clean());
    assert_eq!(needy.state(), State::Up);
    assert_eq!(config.state(), State::Up);
}

#[tokio::test]
async fn setting_the_current_mode_is_a_no_op() {
    let container = Container::new();
    let transitions = Arc::new(AtomicUsize::new(0));
    let count = transitions.clone();

    let service = container
        .add_service(ServiceName::of("steady"), NullService::arc())
        .listener(FnListener::arc(move |ev| {
            if ev.transition().is_some() {
                count.fetch_add(1, Ordering::SeqCst);
            }
        }))
        .install()
        .await
        .unwrap();
    container.await_stability().await;
    assert_eq!(service.state(), State::Up);
    let settled = transitions.load(Ordering::SeqCst);

    service.set_mode(Mode::Active);
    service.set_mode(Mode::Active);
    container.await_stability().await;
    assert_eq!(service.state(), State::Up);
    assert_eq!(transitions.load(Ordering::SeqCst), settled);
}

#[tokio::test]
async fn a_panicking_listener_does_not_stop_the_container() {
    let container = Container::new();

    let service = container
        .add_service(ServiceName::of("watched"), NullService::arc())
        .listener(FnListener::arc(|_ev| panic!("bad listener")))
        .install()
        .await
        .unwrap();

    container.await_stability().await;
    assert_eq!(service.state(), State::Up);
}
