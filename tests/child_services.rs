//! Child services installed from start bodies: lifetime bound to the parent,
//! removal on parent stop, and re-creation when the parent restarts.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use servisor::{
    Container, Mode, NullService, ServiceFn, ServiceHandle, ServiceName, ServiceRef, StartContext,
    StartError, State, Substate,
};

/// Start body that installs one `NullService` child and publishes its handle.
fn parent_of(child: &str, slot: &Arc<Mutex<Vec<ServiceHandle>>>) -> ServiceRef {
    let child = ServiceName::of(child);
    let slot = slot.clone();
    ServiceFn::arc(move |ctx: StartContext| {
        let child = child.clone();
        let slot = slot.clone();
        async move {
            let handle = ctx
                .child_target()
                .add_service(child, NullService::arc())
                .install()
                .await?;
            slot.lock().unwrap().push(handle);
            Ok(())
        }
    })
}

#[tokio::test]
async fn children_start_after_their_parent() {
    let container = Container::new();
    let children = Arc::new(Mutex::new(Vec::new()));

    let parent = container
        .add_service(ServiceName::of("parent"), parent_of("child", &children))
        .install()
        .await
        .unwrap();

    let report = container.await_stability_report().await;
    assert!(report.is_clean());
    assert_eq!(parent.state(), State::Up);

    let children = children.lock().unwrap();
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].state(), State::Up);
    assert_eq!(children[0].name(), &ServiceName::of("child"));
}

#[tokio::test]
async fn children_are_removed_when_the_parent_stops() {
    let container = Container::new();
    let children = Arc::new(Mutex::new(Vec::new()));

    let parent = container
        .add_service(ServiceName::of("parent"), parent_of("child", &children))
        .install()
        .await
        .unwrap();
    container.await_stability().await;

    parent.set_mode(Mode::Never);
    container.await_stability().await;

    // stopping the parent is enough; nobody asked to remove the child
    assert_eq!(parent.state(), State::Down);
    assert_eq!(children.lock().unwrap()[0].state(), State::Removed);
}

#[tokio::test]
async fn restarting_the_parent_recreates_the_child() {
    let container = Container::new();
    let children = Arc::new(Mutex::new(Vec::new()));

    let parent = container
        .add_service(ServiceName::of("parent"), parent_of("child", &children))
        .install()
        .await
        .unwrap();
    container.await_stability().await;

    parent.set_mode(Mode::Never);
    container.await_stability().await;
    parent.set_mode(Mode::Active);
    let report = container.await_stability_report().await;

    assert!(report.is_clean());
    assert_eq!(parent.state(), State::Up);
    let children = children.lock().unwrap();
    assert_eq!(children.len(), 2);
    // old incarnation stays removed; the name was free for the new one
    assert_eq!(children[0].state(), State::Removed);
    assert_eq!(children[1].state(), State::Up);
}

#[tokio::test]
async fn removing_the_parent_removes_the_child() {
    let container = Container::new();
    let children = Arc::new(Mutex::new(Vec::new()));

    let parent = container
        .add_service(ServiceName::of("parent"), parent_of("child", &children))
        .install()
        .await
        .unwrap();
    container.await_stability().await;

    parent.set_mode(Mode::Remove);
    container.await_stability().await;

    assert_eq!(parent.state(), State::Removed);
    assert_eq!(children.lock().unwrap()[0].state(), State::Removed);
}

#[tokio::test]
async fn a_parent_cannot_depend_on_its_own_child() {
    let container = Container::new();
    let children = Arc::new(Mutex::new(Vec::new()));

    // the dependency name only ever appears once the start body runs, and the
    // start body only runs once the dependency is up: parked as a problem
    let parent = container
        .add_service(ServiceName::of("parent"), parent_of("child", &children))
        .dependency(ServiceName::of("child"))
        .install()
        .await
        .unwrap();

    let report = container.await_stability_report().await;
    assert_eq!(parent.state(), State::Down);
    assert_eq!(parent.substate(), Substate::Problem);
    assert_eq!(report.problem, vec![ServiceName::of("parent")]);
    assert!(children.lock().unwrap().is_empty());
}

#[tokio::test]
async fn children_of_a_failed_start_are_removed() {
    let container = Container::new();
    let children = Arc::new(Mutex::new(Vec::new()));
    let healthy = Arc::new(AtomicBool::new(false));

    // installs its child, then fails; the child must not outlive the attempt
    let slot = children.clone();
    let gate = healthy.clone();
    let flaky: ServiceRef = ServiceFn::arc(move |ctx: StartContext| {
        let slot = slot.clone();
        let gate = gate.clone();
        async move {
            let handle = ctx
                .child_target()
                .add_service(ServiceName::of("child"), NullService::arc())
                .install()
                .await?;
            slot.lock().unwrap().push(handle);
            if gate.load(Ordering::SeqCst) {
                Ok(())
            } else {
                Err(StartError::failed("exchange refused the connection"))
            }
        }
    });

    let parent = container
        .add_service(ServiceName::of("parent"), flaky)
        .install()
        .await
        .unwrap();
    container.await_stability().await;
    assert_eq!(parent.state(), State::Down);
    assert_eq!(parent.substate(), Substate::StartFailed);
    assert_eq!(children.lock().unwrap()[0].state(), State::Removed);

    // the child's name is free again, so the retry can install it afresh
    healthy.store(true, Ordering::SeqCst);
    parent.set_mode(Mode::Never);
    parent.set_mode(Mode::Active);
    let report = container.await_stability_report().await;

    assert!(report.is_clean());
    assert_eq!(parent.state(), State::Up);
    let children = children.lock().unwrap();
    assert_eq!(children.len(), 2);
    assert_eq!(children[0].state(), State::Removed);
    assert_eq!(children[1].state(), State::Up);
}

#[tokio::test]
async fn grandchildren_follow_their_grandparent() {
    let container = Container::new();
    let grandchildren = Arc::new(Mutex::new(Vec::new()));
    let children = Arc::new(Mutex::new(Vec::new()));

    let mid_body = parent_of("grandchild", &grandchildren);
    let children_slot = children.clone();
    let root_body: ServiceRef = ServiceFn::arc(move |ctx: StartContext| {
        let mid_body = mid_body.clone();
        let children_slot = children_slot.clone();
        async move {
            let handle = ctx
                .child_target()
                .add_service(ServiceName::of("mid"), mid_body)
                .install()
                .await?;
            children_slot.lock().unwrap().push(handle);
            Ok(())
        }
    });

    let root = container
        .add_service(ServiceName::of("root"), root_body)
        .install()
        .await
        .unwrap();
    container.await_stability().await;
    assert_eq!(root.state(), State::Up);
    assert_eq!(children.lock().unwrap()[0].state(), State::Up);
    assert_eq!(grandchildren.lock().unwrap()[0].state(), State::Up);

    root.set_mode(Mode::Remove);
    container.await_stability().await;
    assert_eq!(root.state(), State::Removed);
    assert_eq!(children.lock().unwrap()[0].state(), State::Removed);
    assert_eq!(grandchildren.lock().unwrap()[0].state(), State::Removed);
}
