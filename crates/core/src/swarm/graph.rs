//! # Execution Graph
//!
//! Static topology of the learning graph: the node registry, the entry node,
//! the router consulted after the entry node, and the fixed edges every
//! content node follows towards `END`.
//!
//! ```text
//! intent_classifier ──router──▶ {content nodes} ──▶ evaluator ──▶ feedback ──▶ END
//! ```
//!
//! [`GraphBuilder::build`] rejects topologies the scheduler cannot run:
//! duplicate or unregistered nodes, nodes without outgoing edges, cycles, and
//! active sets whose members write the same non-append field.
//! [`ExecutionGraph::route`] applies the same write check to caller-supplied
//! activation lists before they run.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use crate::agents::{self, intent::activation_for, Agent};
use crate::error::{GraphError, Result};
use crate::gateway::ModelGateway;
use crate::state::{AgentId, Intent, LearningState, StateField};

use super::router::Router;

/// Edge target marking the end of the run.
pub const END: AgentId = AgentId::from_static("__end__");

/// Collects nodes and edges, then validates them into an [`ExecutionGraph`].
pub struct GraphBuilder {
    nodes: Vec<Arc<dyn Agent>>,
    edges: Vec<(AgentId, AgentId)>,
    entry: Option<AgentId>,
    router: Router,
    gateway: Arc<ModelGateway>,
}

impl GraphBuilder {
    pub fn new(gateway: Arc<ModelGateway>) -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            entry: None,
            router: Router::default(),
            gateway,
        }
    }

    pub fn node(mut self, agent: Arc<dyn Agent>) -> Self {
        self.nodes.push(agent);
        self
    }

    pub fn nodes(mut self, agents: impl IntoIterator<Item = Arc<dyn Agent>>) -> Self {
        self.nodes.extend(agents);
        self
    }

    /// The node that runs alone before the router is consulted.
    pub fn entry(mut self, id: AgentId) -> Self {
        self.entry = Some(id);
        self
    }

    pub fn edge(mut self, from: AgentId, to: AgentId) -> Self {
        self.edges.push((from, to));
        self
    }

    pub fn router(mut self, router: Router) -> Self {
        self.router = router;
        self
    }

    pub fn build(self) -> Result<ExecutionGraph> {
        let GraphBuilder {
            nodes,
            edges,
            entry,
            router,
            gateway,
        } = self;

        let mut order = Vec::with_capacity(nodes.len());
        let mut registry = HashMap::with_capacity(nodes.len());
        for agent in nodes {
            let id = agent.id();
            if registry.insert(id.clone(), agent).is_some() {
                return Err(GraphError::DuplicateNode(id));
            }
            order.push(id);
        }

        let entry = entry
            .filter(|id| registry.contains_key(id))
            .ok_or(GraphError::MissingEntry)?;

        let mut successors: BTreeMap<AgentId, Vec<AgentId>> = BTreeMap::new();
        for (from, to) in edges {
            let known = |id: &AgentId| registry.contains_key(id);
            if !known(&from) || (to != END && !known(&to)) {
                return Err(GraphError::DanglingEdge { from, to });
            }
            let targets = successors.entry(from).or_default();
            if !targets.contains(&to) {
                targets.push(to);
            }
        }

        for id in &order {
            if *id != entry && !successors.contains_key(id) {
                return Err(GraphError::MissingEdge(id.clone()));
            }
        }

        let graph = ExecutionGraph {
            registry,
            order,
            entry,
            successors,
            router,
            gateway,
        };
        graph.check_acyclic()?;
        graph.check_routes()?;
        graph.check_disjoint_writes()?;
        Ok(graph)
    }
}

/// A validated graph, ready to run
pub struct ExecutionGraph {
    registry: HashMap<AgentId, Arc<dyn Agent>>,
    /// Registration order, used to order every active set
    order: Vec<AgentId>,
    entry: AgentId,
    successors: BTreeMap<AgentId, Vec<AgentId>>,
    router: Router,
    pub(crate) gateway: Arc<ModelGateway>,
}

impl std::fmt::Debug for ExecutionGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionGraph")
            .field("nodes", &self.order)
            .field("entry", &self.entry)
            .field("successors", &self.successors)
            .finish()
    }
}

impl ExecutionGraph {
    pub fn entry(&self) -> &AgentId {
        &self.entry
    }

    pub fn node_ids(&self) -> &[AgentId] {
        &self.order
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub(crate) fn agent(&self, id: &AgentId) -> Result<Arc<dyn Agent>> {
        self.registry
            .get(id)
            .cloned()
            .ok_or_else(|| GraphError::UnknownNode(id.clone()))
    }

    /// Union of the static successors of `active`, in registration order.
    /// `END` is dropped; an empty result means the run is over.
    pub fn successors(&self, active: &[AgentId]) -> Vec<AgentId> {
        let next: HashSet<&AgentId> = active
            .iter()
            .filter_map(|id| self.successors.get(id))
            .flatten()
            .filter(|id| **id != END)
            .collect();
        self.order
            .iter()
            .filter(|id| next.contains(id))
            .cloned()
            .collect()
    }

    /// Consult the router and validate its answer, including every set the
    /// answer leads to along static edges.
    pub fn route(&self, state: &LearningState) -> Result<Vec<AgentId>> {
        let decided = self.router.decide(state);
        self.check_active_set(&decided)?;
        let active = self.in_order(&decided);
        self.check_schedule(active.clone(), &mut Vec::new())?;
        Ok(active)
    }

    fn in_order(&self, ids: &[AgentId]) -> Vec<AgentId> {
        self.order
            .iter()
            .filter(|id| ids.contains(id))
            .cloned()
            .collect()
    }

    fn check_active_set(&self, ids: &[AgentId]) -> Result<()> {
        if ids.is_empty() {
            return Err(GraphError::EmptyRouting);
        }
        match ids
            .iter()
            .find(|id| **id == self.entry || !self.registry.contains_key(id))
        {
            Some(unknown) => Err(GraphError::UnknownNode(unknown.clone())),
            None => Ok(()),
        }
    }

    fn check_acyclic(&self) -> Result<()> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Visiting,
            Done,
        }

        fn visit<'a>(
            id: &'a AgentId,
            edges: &'a BTreeMap<AgentId, Vec<AgentId>>,
            marks: &mut HashMap<&'a AgentId, Mark>,
        ) -> Result<()> {
            match marks.get(id) {
                Some(Mark::Done) => return Ok(()),
                Some(Mark::Visiting) => return Err(GraphError::Cycle(id.clone())),
                None => {}
            }
            marks.insert(id, Mark::Visiting);
            for next in edges.get(id).into_iter().flatten() {
                visit(next, edges, marks)?;
            }
            marks.insert(id, Mark::Done);
            Ok(())
        }

        let mut marks = HashMap::new();
        for id in &self.order {
            visit(id, &self.successors, &mut marks)?;
        }
        Ok(())
    }

    /// Every id the fallback table can emit must be a routable node. Empty
    /// routes are left to the scheduler, which reports them at run time.
    fn check_routes(&self) -> Result<()> {
        for route in self.router.fallback_routes() {
            if route.is_empty() {
                continue;
            }
            self.check_active_set(route)?;
        }
        Ok(())
    }

    /// Check every active set the graph can schedule: each router answer and
    /// every set reached from it by following static edges.
    fn check_disjoint_writes(&self) -> Result<()> {
        let mut seeds: Vec<Vec<AgentId>> = self
            .router
            .fallback_routes()
            .map(<[AgentId]>::to_vec)
            .collect();
        for intent in Intent::RECOGNIZED {
            let state = LearningState {
                activated_agents: activation_for(intent),
                ..Default::default()
            };
            seeds.push(self.router.decide(&state));
        }

        let mut seen = Vec::new();
        for seed in seeds {
            self.check_schedule(self.in_order(&seed), &mut seen)?;
        }
        Ok(())
    }

    /// Walk from `active` along static edges, checking each superstep once.
    fn check_schedule(
        &self,
        mut active: Vec<AgentId>,
        seen: &mut Vec<Vec<AgentId>>,
    ) -> Result<()> {
        while !active.is_empty() && !seen.contains(&active) {
            self.check_writes(&active)?;
            let next = self.successors(&active);
            seen.push(active);
            active = next;
        }
        Ok(())
    }

    /// Members of one superstep must not share a non-append field.
    fn check_writes(&self, active: &[AgentId]) -> Result<()> {
        let mut owners: HashMap<StateField, &AgentId> = HashMap::new();
        for id in active {
            let Some(agent) = self.registry.get(id) else {
                continue;
            };
            for field in agent.writes() {
                if !field.requires_exclusive_writer() {
                    continue;
                }
                if let Some(first) = owners.insert(*field, id) {
                    return Err(GraphError::OverlappingWrites {
                        first: first.clone(),
                        second: id.clone(),
                        field: *field,
                    });
                }
            }
        }
        Ok(())
    }
}

/// The standard learning graph over the agent registry.
pub fn learning_graph(gateway: Arc<ModelGateway>) -> Result<ExecutionGraph> {
    let registry = agents::registry();
    let mut builder = GraphBuilder::new(gateway).entry(AgentId::INTENT_CLASSIFIER);
    for agent in &registry {
        let id = agent.id();
        if id == AgentId::INTENT_CLASSIFIER || id.is_terminal_stage() {
            continue;
        }
        builder = builder.edge(id, AgentId::EVALUATOR);
    }
    builder
        .edge(AgentId::EVALUATOR, AgentId::FEEDBACK)
        .edge(AgentId::FEEDBACK, END)
        .nodes(registry)
        .build()
}
