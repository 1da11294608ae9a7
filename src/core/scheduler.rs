//! # Scheduler: the transition engine.
//!
//! One task owns the whole dependency graph. Every mutation — install, mode
//! change, listener registration, body completion — arrives as a [`Msg`] on a
//! single unbounded channel; after each message the scheduler drives the
//! graph to a fixed point and only then looks at the next message. Start and
//! stop bodies run on their own spawned tasks and report back through the
//! same channel, so a blocking body occupies nothing but its own controller.
//!
//! ## Architecture
//! ```text
//! Container / ServiceHandle / ServiceTarget
//!        │  (mpsc, FIFO)
//!        ▼
//!   Scheduler::run()
//!        ├─► handle_msg()        Install / SetMode / AddListener /
//!        │                       StartOutcome / StopDone / AwaitStability /
//!        │                       Shutdown
//!        ├─► settle()            evaluate dirty controllers to fixed point,
//!        │                       refresh dependency flags, fire events
//!        └─► flush waiters       when in-flight == 0 and queue is empty
//!
//! evaluate(controller):
//!   Down ─► remove (mode REMOVE, children first)
//!        └► start  (wanted up, not start-failed, dependencies ready)
//!        └► park   (substate Waiting / Problem / StartFailed)
//!   Up   ─► leave  (not wanted, dependency leaving, captured optional lost)
//!             ├─ force-remove children
//!             ├─ wait for holding dependents to go down
//!             └─ commit STOPPING, spawn stop body
//! ```
//!
//! ## Rules
//! - At most one in-flight transition per controller; independent subgraphs
//!   progress concurrently through their spawned bodies.
//! - Listener dispatch is synchronous at each commit, before the next message
//!   is taken: events happen-before the transition is complete.
//! - A dependent is told "dependency available" only after the dependency's
//!   transition to `Up` has committed.
//! - Failures never escape: a start error or panic becomes `StartFailed` on
//!   the controller and `DependencyFailed` on its dependents.
//! - Mode changes during an in-flight transition are honored once it settles.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use crate::core::builder::ServiceTarget;
use crate::core::graph::{DependencySpec, Graph, Node};
use crate::core::handle::{ControllerId, ServiceHandle};
use crate::core::stability::{StabilityReport, StabilityWaiters};
use crate::error::{InstallError, StartError};
use crate::events::{ServiceEvent, ServiceEventKind};
use crate::lifecycle::{Mode, State, Substate, Transition};
use crate::listeners::ServiceListener;
use crate::name::ServiceName;
use crate::service::{ServiceRef, StartContext, StopContext};

/// Everything needed to register one controller.
pub(crate) struct ServiceDefinition {
    pub name: ServiceName,
    pub service: ServiceRef,
    pub deps: Vec<DependencySpec>,
    pub mode: Mode,
    pub listeners: Vec<Arc<dyn ServiceListener>>,
    pub parent: Option<ControllerId>,
}

/// Scheduler mailbox messages.
pub(crate) enum Msg {
    Install {
        def: ServiceDefinition,
        reply: oneshot::Sender<Result<ServiceHandle, InstallError>>,
    },
    SetMode {
        id: ControllerId,
        mode: Mode,
    },
    AddListener {
        id: ControllerId,
        listener: Arc<dyn ServiceListener>,
    },
    AddContainerListener {
        listener: Arc<dyn ServiceListener>,
    },
    StartOutcome {
        id: ControllerId,
        result: Result<(), StartError>,
    },
    StopDone {
        id: ControllerId,
    },
    AwaitStability {
        reply: oneshot::Sender<StabilityReport>,
    },
    Shutdown,
}

/// Per-controller dependency outlook, recomputed at each fixed point.
#[derive(Clone, Copy, Default, PartialEq, Eq)]
struct DepFlags {
    imm_unavailable: bool,
    trans_unavailable: bool,
    failed: bool,
}

pub(crate) struct Scheduler {
    graph: Graph,
    tx: mpsc::UnboundedSender<Msg>,
    rx: mpsc::UnboundedReceiver<Msg>,
    container_listeners: Vec<Arc<dyn ServiceListener>>,
    in_flight: usize,
    dirty: VecDeque<ControllerId>,
    queued: HashSet<ControllerId>,
    waiters: StabilityWaiters,
    shutting_down: bool,
    terminated: CancellationToken,
}

impl Scheduler {
    /// Spawns the scheduler task; returns its mailbox and termination token.
    pub(crate) fn spawn() -> (mpsc::UnboundedSender<Msg>, CancellationToken) {
        let (tx, rx) = mpsc::unbounded_channel();
        let terminated = CancellationToken::new();
        let scheduler = Scheduler {
            graph: Graph::new(),
            tx: tx.clone(),
            rx,
            container_listeners: Vec::new(),
            in_flight: 0,
            dirty: VecDeque::new(),
            queued: HashSet::new(),
            waiters: StabilityWaiters::default(),
            shutting_down: false,
            terminated: terminated.clone(),
        };
        tokio::spawn(scheduler.run());
        (tx, terminated)
    }

    async fn run(mut self) {
        while let Some(msg) = self.rx.recv().await {
            self.handle_msg(msg);
            self.settle();
            if self.shutting_down && self.in_flight == 0 && self.graph.is_drained() {
                break;
            }
        }
        // release anyone still parked before announcing termination
        let report = self.stability_report();
        self.waiters.flush(&report);
        self.terminated.cancel();
    }

    fn handle_msg(&mut self, msg: Msg) {
        match msg {
            Msg::Install { def, reply } => {
                let _ = reply.send(self.install(def));
            }
            Msg::SetMode { id, mode } => self.set_mode(id, mode),
            Msg::AddListener { id, listener } => self.add_listener(id, listener),
            Msg::AddContainerListener { listener } => self.container_listeners.push(listener),
            Msg::StartOutcome { id, result } => self.start_outcome(id, result),
            Msg::StopDone { id } => self.stop_done(id),
            Msg::AwaitStability { reply } => self.waiters.park(reply),
            Msg::Shutdown => self.begin_shutdown(),
        }
    }

    // ---------------------------
    // Installation & removal
    // ---------------------------

    /// Registers a new controller, or rejects it atomically: a failed install
    /// leaves the graph untouched.
    fn install(&mut self, def: ServiceDefinition) -> Result<ServiceHandle, InstallError> {
        if self.shutting_down {
            return Err(InstallError::ContainerDown);
        }
        if self.graph.resolve(&def.name).is_some() {
            return Err(InstallError::Duplicate { name: def.name });
        }
        if self.graph.creates_cycle(&def.name, &def.deps) {
            return Err(InstallError::Circular { name: def.name });
        }
        if let Some(pid) = def.parent {
            let parent = self.graph.node(pid);
            if parent.leaving || !matches!(parent.state, State::Starting | State::Up) {
                return Err(InstallError::ParentDown {
                    parent: parent.name.clone(),
                });
            }
        }

        let id = self.graph.next_id();
        let handle = ServiceHandle::new(id, def.name.clone(), def.mode, self.tx.clone());
        let mut listeners = self.container_listeners.clone();
        listeners.extend(def.listeners);
        self.graph.insert(Node {
            name: def.name.clone(),
            service: def.service,
            mode: def.mode,
            state: State::Down,
            substate: Substate::None,
            deps: def.deps,
            parent: def.parent,
            children: BTreeSet::new(),
            listeners,
            handle: handle.clone(),
            leaving: false,
            start_failed: false,
            captured: BTreeSet::new(),
            imm_unavailable: false,
            trans_unavailable: false,
            dep_failed: false,
        });

        // listenerAdded is delivered to each listener individually
        for listener in self.graph.node(id).listeners.clone() {
            let ev = ServiceEvent::new(handle.clone(), ServiceEventKind::ListenerAdded);
            Self::dispatch(&*listener, &ev);
        }

        self.mark_dirty(id);
        self.mark_dirty_neighborhood(id);
        // wake controllers that were parked on this name before it existed
        for w in self.graph.watchers_of(&def.name) {
            self.mark_dirty(w);
        }
        Ok(handle)
    }

    /// Unregisters a node that just committed `Removed`.
    fn finish_removal(&mut self, id: ControllerId) {
        let watchers = self.graph.dependents(id);
        self.graph.unregister(id);
        for w in watchers {
            self.mark_dirty(w);
        }
    }

    // ---------------------------
    // Control messages
    // ---------------------------

    fn set_mode(&mut self, id: ControllerId, mode: Mode) {
        {
            let node = self.graph.node(id);
            if matches!(node.state, State::Removing | State::Removed) {
                return;
            }
            if node.mode == mode {
                return; // idempotent
            }
        }
        let was_remove = {
            let node = self.graph.node_mut(id);
            let was_remove = node.mode == Mode::Remove;
            node.mode = mode;
            // an explicit mode change is the recovery path out of StartFailed
            node.start_failed = false;
            node.handle.cell().set_mode(mode);
            was_remove
        };
        if mode == Mode::Remove {
            self.fire(id, ServiceEventKind::RemoveRequested);
        } else if was_remove {
            self.fire(id, ServiceEventKind::RemoveRequestCleared);
        }
        self.mark_dirty(id);
        self.mark_dirty_neighborhood(id);
    }

    fn add_listener(&mut self, id: ControllerId, listener: Arc<dyn ServiceListener>) {
        let handle = self.graph.node(id).handle.clone();
        let ev = ServiceEvent::new(handle, ServiceEventKind::ListenerAdded);
        Self::dispatch(&*listener, &ev);
        self.graph.node_mut(id).listeners.push(listener);
    }

    fn begin_shutdown(&mut self) {
        if self.shutting_down {
            return;
        }
        self.shutting_down = true;
        for id in self.graph.live_ids() {
            if self.graph.node(id).parent.is_none() {
                self.set_mode(id, Mode::Remove);
            }
        }
    }

    // ---------------------------
    // Body completions
    // ---------------------------

    fn start_outcome(&mut self, id: ControllerId, result: Result<(), StartError>) {
        self.in_flight -= 1;
        match result {
            Ok(()) => self.commit(id, State::Up),
            Err(err) => {
                let reason: Arc<str> = Arc::from(err.to_string());
                self.graph.node_mut(id).start_failed = true;
                self.fire(id, ServiceEventKind::Failed { reason });
                // children installed by the failed attempt die with it; their
                // names must be free again before any retry
                self.force_remove_children(id);
                self.commit(id, State::Down);
            }
        }
    }

    fn stop_done(&mut self, id: ControllerId) {
        self.in_flight -= 1;
        self.commit(id, State::Down);
    }

    // ---------------------------
    // Fixed-point evaluation
    // ---------------------------

    fn settle(&mut self) {
        loop {
            while let Some(id) = self.dirty.pop_front() {
                self.queued.remove(&id);
                self.evaluate(id);
            }
            if !self.refresh_dependency_flags() {
                break;
            }
        }
        // a fixed point also means no queued control messages: a listener may
        // have enqueued a set_mode during the final transition's dispatch
        if self.in_flight == 0
            && self.dirty.is_empty()
            && self.rx.is_empty()
            && !self.waiters.is_empty()
        {
            let report = self.stability_report();
            self.waiters.flush(&report);
        }
    }

    fn evaluate(&mut self, id: ControllerId) {
        match self.graph.node(id).state {
            State::Down => self.evaluate_down(id),
            State::Up => self.evaluate_up(id),
            // in-flight or terminal; revisited when the body reports back
            State::Starting | State::Stopping | State::Removing | State::Removed => {}
        }
    }

    fn evaluate_down(&mut self, id: ControllerId) {
        let (mode, has_children, start_failed) = {
            let node = self.graph.node(id);
            (node.mode, !node.children.is_empty(), node.start_failed)
        };
        if mode == Mode::Remove {
            if has_children {
                self.force_remove_children(id);
                return;
            }
            self.commit(id, State::Removing);
            self.commit(id, State::Removed);
            self.finish_removal(id);
            return;
        }
        if !start_failed && self.wants_up(id) && self.deps_ready(id) {
            self.commit(id, State::Starting);
            self.in_flight += 1;
            self.spawn_start(id);
            return;
        }
        self.update_down_substate(id);
    }

    fn evaluate_up(&mut self, id: ControllerId) {
        if !self.must_leave_up(id) {
            self.graph.node_mut(id).leaving = false;
            return;
        }
        self.graph.node_mut(id).leaving = true;
        // children die with their parent, regardless of their own dependents
        self.force_remove_children(id);
        // dependents must stop before this controller may
        for w in self.graph.dependents(id) {
            self.mark_dirty(w);
        }
        if self.has_blocking_dependents(id) {
            return;
        }
        if !self.graph.node(id).children.is_empty() {
            return;
        }
        self.commit(id, State::Stopping);
        self.in_flight += 1;
        self.spawn_stop(id);
    }

    fn update_down_substate(&mut self, id: ControllerId) {
        let substate = {
            let node = self.graph.node(id);
            if node.mode == Mode::OnDemand && self.demand(id) == 0 {
                Substate::Waiting
            } else if self.wants_up(id)
                && (node.imm_unavailable || node.trans_unavailable || node.dep_failed)
            {
                // a live dependency problem outranks a stale start failure
                Substate::Problem
            } else if node.start_failed {
                Substate::StartFailed
            } else {
                Substate::None
            }
        };
        let node = self.graph.node_mut(id);
        if node.substate != substate {
            node.substate = substate;
            node.handle.cell().set_state(node.state, substate);
        }
    }

    /// Commits one state change: updates the node and its snapshot cell,
    /// fires the transition event, and re-queues the neighborhood.
    fn commit(&mut self, id: ControllerId, to: State) {
        let kind = {
            let node = self.graph.node_mut(id);
            let from = node.state;
            node.state = to;
            node.leaving = false;
            node.substate = Substate::None;
            if to == State::Up {
                node.start_failed = false;
            }
            node.handle.cell().set_state(to, Substate::None);
            ServiceEventKind::Transition(Transition { from, to })
        };
        if to == State::Up {
            self.capture_optionals(id);
            self.clear_dependent_start_failures(id);
        }
        self.fire(id, kind);
        self.mark_dirty(id);
        self.mark_dirty_neighborhood(id);
    }

    /// Records which optional dependencies were up when this controller
    /// started; losing one of them later bounces the controller.
    fn capture_optionals(&mut self, id: ControllerId) {
        let captured: BTreeSet<ServiceName> = {
            let node = self.graph.node(id);
            node.deps
                .iter()
                .filter(|d| !d.required)
                .filter(|d| {
                    self.graph.resolve(&d.name).is_some_and(|pid| {
                        let p = self.graph.node(pid);
                        p.state == State::Up && !p.leaving
                    })
                })
                .map(|d| d.name.clone())
                .collect()
        };
        self.graph.node_mut(id).captured = captured;
    }

    /// A required dependency coming up is the other recovery path out of
    /// StartFailed.
    fn clear_dependent_start_failures(&mut self, id: ControllerId) {
        let name = self.graph.node(id).name.clone();
        for w in self.graph.dependents(id) {
            let holds = {
                let wn = self.graph.node(w);
                wn.start_failed && wn.deps.iter().any(|d| d.required && d.name == name)
            };
            if holds {
                self.graph.node_mut(w).start_failed = false;
                self.mark_dirty(w);
            }
        }
    }

    fn force_remove_children(&mut self, id: ControllerId) {
        let children: Vec<ControllerId> = self.graph.node(id).children.iter().copied().collect();
        for c in children {
            let skip = {
                let child = self.graph.node(c);
                child.state == State::Removed || child.mode == Mode::Remove
            };
            if !skip {
                self.set_mode(c, Mode::Remove);
            }
        }
    }

    // ---------------------------
    // Desired-state predicates
    // ---------------------------

    /// Should this controller be up? Mode Active: always. OnDemand: only
    /// while demanded. Readiness is a separate question ([`Self::deps_ready`]).
    fn wants_up(&self, id: ControllerId) -> bool {
        let mut visiting = HashSet::new();
        self.wants_up_guarded(id, &mut visiting)
    }

    fn wants_up_guarded(&self, id: ControllerId, visiting: &mut HashSet<ControllerId>) -> bool {
        match self.graph.node(id).mode {
            Mode::Active => true,
            Mode::Never | Mode::Remove => false,
            Mode::OnDemand => {
                if !visiting.insert(id) {
                    // a demand cycle counts as no demand
                    return false;
                }
                let demanded = self.demand_guarded(id, visiting) > 0;
                visiting.remove(&id);
                demanded
            }
        }
    }

    /// Number of demanders: registered dependents that want up, plus live
    /// children that want up (a child keeps its parent up).
    fn demand(&self, id: ControllerId) -> usize {
        let mut visiting = HashSet::new();
        visiting.insert(id);
        self.demand_guarded(id, &mut visiting)
    }

    fn demand_guarded(&self, id: ControllerId, visiting: &mut HashSet<ControllerId>) -> usize {
        let mut count = 0;
        for w in self.graph.dependents(id) {
            if self.graph.node(w).state == State::Removed {
                continue;
            }
            if self.wants_up_guarded(w, visiting) {
                count += 1;
            }
        }
        let children: Vec<ControllerId> = self.graph.node(id).children.iter().copied().collect();
        for c in children {
            if self.graph.node(c).state == State::Removed {
                continue;
            }
            if self.wants_up_guarded(c, visiting) {
                count += 1;
            }
        }
        count
    }

    /// May this controller start now?
    ///
    /// Required dependencies must be up and staying. An optional dependency
    /// blocks only while it is present and expected to come up; a missing or
    /// permanently-blocked optional is skipped. A child additionally needs
    /// its parent up.
    fn deps_ready(&self, id: ControllerId) -> bool {
        let node = self.graph.node(id);
        for dep in &node.deps {
            match self.graph.resolve(&dep.name) {
                Some(pid) => {
                    let provider = self.graph.node(pid);
                    let up = provider.state == State::Up && !provider.leaving;
                    if dep.required {
                        if !up {
                            return false;
                        }
                    } else if !up && self.optional_blocks(pid) {
                        return false;
                    }
                }
                None => {
                    if dep.required {
                        return false;
                    }
                }
            }
        }
        if let Some(pid) = node.parent {
            let parent = self.graph.node(pid);
            if parent.state != State::Up || parent.leaving {
                return false;
            }
        }
        true
    }

    /// True while a present optional dependency should be awaited: it is on
    /// its way up (or bouncing) rather than parked for good.
    fn optional_blocks(&self, pid: ControllerId) -> bool {
        let provider = self.graph.node(pid);
        if provider.leaving || provider.start_failed {
            return false;
        }
        if provider.imm_unavailable || provider.trans_unavailable || provider.dep_failed {
            return false;
        }
        if !matches!(
            provider.state,
            State::Down | State::Starting | State::Stopping
        ) {
            return false;
        }
        self.wants_up(pid)
    }

    /// Must this `Up` controller come down?
    fn must_leave_up(&self, id: ControllerId) -> bool {
        if !self.wants_up(id) {
            return true;
        }
        let node = self.graph.node(id);
        for dep in &node.deps {
            if !dep.required && !node.captured.contains(&dep.name) {
                continue;
            }
            let satisfied = self.graph.resolve(&dep.name).is_some_and(|pid| {
                let p = self.graph.node(pid);
                p.state == State::Up && !p.leaving
            });
            if !satisfied {
                return true;
            }
        }
        if let Some(pid) = node.parent {
            let parent = self.graph.node(pid);
            if parent.state != State::Up || parent.leaving {
                return true;
            }
        }
        false
    }

    /// True while some dependent still holds this controller up: a required
    /// dependent, or an optional dependent that captured it, in
    /// Up/Starting/Stopping.
    fn has_blocking_dependents(&self, id: ControllerId) -> bool {
        let name = self.graph.node(id).name.clone();
        for w in self.graph.dependents(id) {
            let wn = self.graph.node(w);
            if !matches!(wn.state, State::Up | State::Starting | State::Stopping) {
                continue;
            }
            let holds = wn
                .deps
                .iter()
                .any(|d| d.name == name && (d.required || wn.captured.contains(&d.name)));
            if holds {
                return true;
            }
        }
        false
    }

    // ---------------------------
    // Dependency outlook flags
    // ---------------------------

    /// Recomputes availability/failure flags for every live controller and
    /// fires the corresponding events on flips. Returns true if anything
    /// changed (the caller then re-runs the evaluation drain).
    fn refresh_dependency_flags(&mut self) -> bool {
        let live = self.graph.live_ids();
        let mut memo: HashMap<ControllerId, DepFlags> = HashMap::new();
        for &id in &live {
            self.dep_flags(id, &mut memo);
        }
        let mut changed = false;
        for &id in &live {
            let flags = memo[&id];
            let (imm, trans, failed) = {
                let node = self.graph.node(id);
                (node.imm_unavailable, node.trans_unavailable, node.dep_failed)
            };
            if flags.imm_unavailable != imm {
                self.graph.node_mut(id).imm_unavailable = flags.imm_unavailable;
                self.fire(
                    id,
                    if flags.imm_unavailable {
                        ServiceEventKind::ImmediateDependencyUnavailable
                    } else {
                        ServiceEventKind::ImmediateDependencyAvailable
                    },
                );
                self.mark_dirty(id);
                changed = true;
            }
            if flags.trans_unavailable != trans {
                self.graph.node_mut(id).trans_unavailable = flags.trans_unavailable;
                self.fire(
                    id,
                    if flags.trans_unavailable {
                        ServiceEventKind::TransitiveDependencyUnavailable
                    } else {
                        ServiceEventKind::TransitiveDependencyAvailable
                    },
                );
                self.mark_dirty(id);
                changed = true;
            }
            if flags.failed != failed {
                self.graph.node_mut(id).dep_failed = flags.failed;
                self.fire(
                    id,
                    if flags.failed {
                        ServiceEventKind::DependencyFailed
                    } else {
                        ServiceEventKind::DependencyFailureCleared
                    },
                );
                self.mark_dirty(id);
                changed = true;
            }
        }
        changed
    }

    fn dep_flags(&self, id: ControllerId, memo: &mut HashMap<ControllerId, DepFlags>) -> DepFlags {
        if let Some(flags) = memo.get(&id) {
            return *flags;
        }
        memo.insert(id, DepFlags::default());
        let mut flags = DepFlags::default();
        let deps = self.graph.node(id).deps.clone();
        for dep in deps.iter().filter(|d| d.required) {
            match self.graph.resolve(&dep.name) {
                None => flags.imm_unavailable = true,
                Some(pid) => {
                    let (p_mode, p_failed) = {
                        let p = self.graph.node(pid);
                        (p.mode, p.start_failed)
                    };
                    if matches!(p_mode, Mode::Never | Mode::Remove) {
                        flags.imm_unavailable = true;
                    }
                    if p_failed {
                        flags.failed = true;
                    }
                    let pf = self.dep_flags(pid, memo);
                    if pf.imm_unavailable || pf.trans_unavailable {
                        flags.trans_unavailable = true;
                    }
                    if pf.failed {
                        flags.failed = true;
                    }
                }
            }
        }
        memo.insert(id, flags);
        flags
    }

    // ---------------------------
    // Body spawning
    // ---------------------------

    fn spawn_start(&mut self, id: ControllerId) {
        let (service, handle) = {
            let node = self.graph.node(id);
            (node.service.clone(), node.handle.clone())
        };
        let ctx = StartContext::new(handle, ServiceTarget::child_of(self.tx.clone(), id));
        let tx = self.tx.clone();
        tokio::spawn(async move {
            // a panicking body is a start failure, not a dead scheduler
            let result = match AssertUnwindSafe(service.start(ctx)).catch_unwind().await {
                Ok(result) => result,
                Err(panic) => Err(StartError::Panicked {
                    reason: panic_reason(panic.as_ref()),
                }),
            };
            let _ = tx.send(Msg::StartOutcome { id, result });
        });
    }

    fn spawn_stop(&mut self, id: ControllerId) {
        let (service, handle) = {
            let node = self.graph.node(id);
            (node.service.clone(), node.handle.clone())
        };
        let ctx = StopContext::new(handle);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            // stop is best-effort; panics are contained and the transition completes
            let _ = AssertUnwindSafe(service.stop(ctx)).catch_unwind().await;
            let _ = tx.send(Msg::StopDone { id });
        });
    }

    // ---------------------------
    // Events & bookkeeping
    // ---------------------------

    fn fire(&self, id: ControllerId, kind: ServiceEventKind) {
        let node = self.graph.node(id);
        if node.listeners.is_empty() {
            return;
        }
        let ev = ServiceEvent::new(node.handle.clone(), kind);
        for listener in node.listeners.clone() {
            Self::dispatch(&*listener, &ev);
        }
    }

    fn dispatch(listener: &dyn ServiceListener, ev: &ServiceEvent) {
        // a panicking listener must not take the scheduler down with it
        let _ = std::panic::catch_unwind(AssertUnwindSafe(|| listener.on_event(ev)));
    }

    fn mark_dirty(&mut self, id: ControllerId) {
        if self.queued.insert(id) {
            self.dirty.push_back(id);
        }
    }

    /// Re-queues everything whose desired state may depend on `id`:
    /// dependents, providers, parent, and children.
    fn mark_dirty_neighborhood(&mut self, id: ControllerId) {
        let mut ids: Vec<ControllerId> = self.graph.dependents(id);
        {
            let node = self.graph.node(id);
            ids.extend(node.deps.iter().filter_map(|d| self.graph.resolve(&d.name)));
            ids.extend(node.parent);
            ids.extend(node.children.iter().copied());
        }
        for i in ids {
            self.mark_dirty(i);
        }
    }

    fn stability_report(&self) -> StabilityReport {
        let mut failed = Vec::new();
        let mut problem = Vec::new();
        for id in self.graph.live_ids() {
            let node = self.graph.node(id);
            match node.substate {
                Substate::StartFailed => failed.push(node.name.clone()),
                Substate::Problem => problem.push(node.name.clone()),
                _ => {}
            }
        }
        failed.sort_unstable();
        problem.sort_unstable();
        StabilityReport { failed, problem }
    }
}

/// Extracts a printable reason from a panic payload.
fn panic_reason(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
