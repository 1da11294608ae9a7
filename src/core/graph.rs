//! # Dependency graph - arena of controller nodes.
//!
//! Owns every controller node the container has ever created, the live-name
//! registry, and the watcher index (dependency name → ids of controllers
//! that declared it). All of it is private to the scheduler task, so there is
//! no locking here at all.
//!
//! ## Rules
//! - Nodes are arena slots addressed by [`ControllerId`]; removed nodes stay
//!   in the arena (their handles keep reporting `Removed`) but leave the
//!   registry, freeing the name for a fresh install.
//! - Dependency edges are *names*, resolved through the registry on every
//!   evaluation; a dependency on a not-yet-installed name is legal and is
//!   picked up when the name appears.
//! - Parent/child edges are ids, created only while the parent starts; they
//!   are excluded from the cycle check.
//! - The cycle check runs before anything is registered, so a rejected
//!   install leaves the graph byte-identical.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use crate::core::handle::{ControllerId, ServiceHandle};
use crate::lifecycle::{Mode, State, Substate};
use crate::listeners::ServiceListener;
use crate::name::ServiceName;
use crate::service::ServiceRef;

/// One declared dependency edge: dependent → dependency name.
#[derive(Clone)]
pub(crate) struct DependencySpec {
    pub name: ServiceName,
    pub required: bool,
}

impl DependencySpec {
    pub fn required(name: ServiceName) -> Self {
        Self {
            name,
            required: true,
        }
    }

    pub fn optional(name: ServiceName) -> Self {
        Self {
            name,
            required: false,
        }
    }
}

/// Scheduler-side state of one controller.
pub(crate) struct Node {
    pub name: ServiceName,
    pub service: ServiceRef,
    pub mode: Mode,
    pub state: State,
    pub substate: Substate,
    pub deps: Vec<DependencySpec>,
    pub parent: Option<ControllerId>,
    pub children: BTreeSet<ControllerId>,
    pub listeners: Vec<Arc<dyn ServiceListener>>,
    pub handle: ServiceHandle,
    /// Set while an `Up` controller is waiting for dependents/children to let
    /// go before it may stop.
    pub leaving: bool,
    /// Last start attempt failed; cleared by a mode change or a dependency
    /// coming up.
    pub start_failed: bool,
    /// Optional dependency names that were `Up` when this controller started.
    /// Losing any of them bounces the controller.
    pub captured: BTreeSet<ServiceName>,
    /// An immediate required dependency is missing or administratively down.
    pub imm_unavailable: bool,
    /// Some transitive dependency is unavailable.
    pub trans_unavailable: bool,
    /// A required dependency (possibly transitive) failed to start.
    pub dep_failed: bool,
}

/// Arena + registry + watcher index.
pub(crate) struct Graph {
    nodes: Vec<Node>,
    registry: HashMap<ServiceName, ControllerId>,
    watchers: HashMap<ServiceName, BTreeSet<ControllerId>>,
}

impl Graph {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            registry: HashMap::new(),
            watchers: HashMap::new(),
        }
    }

    /// Id the next inserted node will get.
    pub fn next_id(&self) -> ControllerId {
        self.nodes.len()
    }

    pub fn node(&self, id: ControllerId) -> &Node {
        &self.nodes[id]
    }

    pub fn node_mut(&mut self, id: ControllerId) -> &mut Node {
        &mut self.nodes[id]
    }

    /// Resolves a name to the currently registered controller, if any.
    pub fn resolve(&self, name: &ServiceName) -> Option<ControllerId> {
        self.registry.get(name).copied()
    }

    /// True if the declared dependencies of a new service named `name` would
    /// close a cycle through the registered graph.
    ///
    /// Walks dependency *names* depth-first; parent/child edges do not
    /// participate. Unregistered names are still compared against `name`, so
    /// `a → b` followed by `b → a` is rejected even while `b` was declared
    /// before it existed.
    pub fn creates_cycle(&self, name: &ServiceName, deps: &[DependencySpec]) -> bool {
        let mut stack: Vec<&ServiceName> = deps.iter().map(|d| &d.name).collect();
        let mut seen: HashSet<&ServiceName> = HashSet::new();
        while let Some(n) = stack.pop() {
            if n == name {
                return true;
            }
            if !seen.insert(n) {
                continue;
            }
            if let Some(&id) = self.registry.get(n) {
                stack.extend(self.nodes[id].deps.iter().map(|d| &d.name));
            }
        }
        false
    }

    /// Registers a new node; the caller has already checked duplicates and
    /// cycles. Returns the node's id.
    pub fn insert(&mut self, node: Node) -> ControllerId {
        let id = self.nodes.len();
        debug_assert_eq!(id, node.handle.id);
        self.registry.insert(node.name.clone(), id);
        for dep in &node.deps {
            self.watchers.entry(dep.name.clone()).or_default().insert(id);
        }
        if let Some(pid) = node.parent {
            self.nodes[pid].children.insert(id);
        }
        self.nodes.push(node);
        id
    }

    /// Ids of registered controllers that declared a dependency on `id`'s
    /// name. Empty once the node has been unregistered.
    pub fn dependents(&self, id: ControllerId) -> Vec<ControllerId> {
        let name = &self.nodes[id].name;
        if self.registry.get(name) != Some(&id) {
            return Vec::new();
        }
        match self.watchers.get(name) {
            Some(ws) => ws.iter().copied().collect(),
            None => Vec::new(),
        }
    }

    /// Ids of registered controllers waiting on `name` (scenario: installing
    /// a name someone already depends on).
    pub fn watchers_of(&self, name: &ServiceName) -> Vec<ControllerId> {
        match self.watchers.get(name) {
            Some(ws) => ws.iter().copied().collect(),
            None => Vec::new(),
        }
    }

    /// Unregisters a `Removed` node: frees its name, drops its watcher
    /// entries, and detaches it from its parent.
    pub fn unregister(&mut self, id: ControllerId) {
        let (name, deps, parent) = {
            let node = &self.nodes[id];
            (node.name.clone(), node.deps.clone(), node.parent)
        };
        if self.registry.get(&name) == Some(&id) {
            self.registry.remove(&name);
        }
        for dep in &deps {
            if let Some(ws) = self.watchers.get_mut(&dep.name) {
                ws.remove(&id);
                if ws.is_empty() {
                    self.watchers.remove(&dep.name);
                }
            }
        }
        if let Some(pid) = parent {
            self.nodes[pid].children.remove(&id);
        }
    }

    /// Ids of all nodes that have not reached `Removed`.
    pub fn live_ids(&self) -> Vec<ControllerId> {
        (0..self.nodes.len())
            .filter(|&id| self.nodes[id].state != State::Removed)
            .collect()
    }

    /// True once every node has reached `Removed`.
    pub fn is_drained(&self) -> bool {
        self.nodes.iter().all(|n| n.state == State::Removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::NullService;
    use tokio::sync::mpsc;

    fn test_node(graph: &Graph, name: &str, deps: Vec<DependencySpec>) -> Node {
        let name = ServiceName::parse(name);
        let (tx, _rx) = mpsc::unbounded_channel();
        let handle = ServiceHandle::new(graph.next_id(), name.clone(), Mode::Active, tx);
        Node {
            name,
            service: NullService::arc(),
            mode: Mode::Active,
            state: State::Down,
            substate: Substate::None,
            deps,
            parent: None,
            children: BTreeSet::new(),
            listeners: Vec::new(),
            handle,
            leaving: false,
            start_failed: false,
            captured: BTreeSet::new(),
            imm_unavailable: false,
            trans_unavailable: false,
            dep_failed: false,
        }
    }

    #[test]
    fn test_direct_cycle_detected() {
        let mut graph = Graph::new();
        let a = test_node(
            &graph,
            "a",
            vec![DependencySpec::required(ServiceName::of("b"))],
        );
        graph.insert(a);
        // b -> a closes the cycle even though b was only a declared name so far
        assert!(graph.creates_cycle(
            &ServiceName::of("b"),
            &[DependencySpec::required(ServiceName::of("a"))],
        ));
    }

    #[test]
    fn test_transitive_cycle_detected() {
        let mut graph = Graph::new();
        graph.insert(test_node(
            &graph,
            "a",
            vec![DependencySpec::required(ServiceName::of("b"))],
        ));
        graph.insert(test_node(
            &graph,
            "b",
            vec![DependencySpec::required(ServiceName::of("c"))],
        ));
        assert!(graph.creates_cycle(
            &ServiceName::of("c"),
            &[DependencySpec::required(ServiceName::of("a"))],
        ));
        assert!(!graph.creates_cycle(
            &ServiceName::of("d"),
            &[DependencySpec::required(ServiceName::of("a"))],
        ));
    }

    #[test]
    fn test_optional_edges_participate_in_cycle_check() {
        let mut graph = Graph::new();
        graph.insert(test_node(
            &graph,
            "a",
            vec![DependencySpec::optional(ServiceName::of("b"))],
        ));
        assert!(graph.creates_cycle(
            &ServiceName::of("b"),
            &[DependencySpec::optional(ServiceName::of("a"))],
        ));
    }

    #[test]
    fn test_self_cycle_detected() {
        let graph = Graph::new();
        assert!(graph.creates_cycle(
            &ServiceName::of("a"),
            &[DependencySpec::required(ServiceName::of("a"))],
        ));
    }

    #[test]
    fn test_unregister_frees_name() {
        let mut graph = Graph::new();
        let id = graph.insert(test_node(&graph, "a", Vec::new()));
        assert_eq!(graph.resolve(&ServiceName::of("a")), Some(id));
        graph.node_mut(id).state = State::Removed;
        graph.unregister(id);
        assert_eq!(graph.resolve(&ServiceName::of("a")), None);
        // the arena slot survives for old handles
        assert_eq!(graph.node(id).state, State::Removed);
    }
}
