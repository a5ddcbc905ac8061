use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use pathway_core::agents::{Agent, AgentOutput, Evaluator, NodeStatus};
use pathway_core::gateway::backends::ModelBackend;
use pathway_core::state::{AgentId, Intent, LearningState, StateField, StateUpdate};
use pathway_core::swarm::{learning_graph, GraphBuilder, Router, END};
use pathway_core::{
    GraphError, InvocationRequest, LearningEngine, ModelCallSpec, ModelGateway, ProgressEvent,
    ScriptedBackend,
};
use tokio_stream::StreamExt;

fn offline_graph() -> Arc<pathway_core::ExecutionGraph> {
    Arc::new(learning_graph(Arc::new(ModelGateway::offline())).unwrap())
}

fn audit_agents(state: &LearningState) -> Vec<AgentId> {
    state.routing_log.iter().map(|e| e.agent.clone()).collect()
}

#[tokio::test]
async fn evaluate_intent_with_failing_backend_uses_default_assessment() {
    let gateway = ModelGateway::new(vec![Arc::new(ScriptedBackend::failing("down"))]);
    let graph = learning_graph(Arc::new(gateway)).unwrap();
    let initial = LearningState {
        learner_input: "Binary search".to_string(),
        detected_intent: Some(Intent::Evaluate),
        ..Default::default()
    };

    let final_state = graph.invoke(initial).await.unwrap();

    assert_eq!(
        final_state.competency_assessment,
        Some(Evaluator::default_assessment())
    );
    assert!(final_state.feedback_guidance.is_some());
    assert!(final_state.final_output.is_some());
    assert_eq!(
        audit_agents(&final_state),
        vec![AgentId::EVALUATOR, AgentId::FEEDBACK]
    );
}

#[tokio::test]
async fn feedback_only_activation_streams_one_node_then_finishes() {
    let initial = LearningState {
        learner_input: "Thanks!".to_string(),
        activated_agents: vec![AgentId::FEEDBACK],
        ..Default::default()
    };

    let events: Vec<ProgressEvent> = offline_graph().stream(initial).collect().await;

    assert_eq!(events.len(), 2);
    match &events[0] {
        ProgressEvent::NodeCompleted { agent, status, .. } => {
            assert_eq!(agent, &AgentId::FEEDBACK);
            assert_eq!(*status, NodeStatus::Completed);
        }
        other => panic!("expected NodeCompleted, got {other:?}"),
    }
    match &events[1] {
        ProgressEvent::Finished { final_state } => {
            assert!(final_state.final_output.is_some());
            assert_eq!(audit_agents(final_state), vec![AgentId::FEEDBACK]);
        }
        other => panic!("expected Finished, got {other:?}"),
    }
}

#[tokio::test]
async fn secondary_backend_answers_when_primary_fails() {
    let primary = Arc::new(ScriptedBackend::failing("primary"));
    let secondary = Arc::new(ScriptedBackend::always(
        "secondary",
        "Here you go:\n```json\n{\"nodes\": [{\"id\": \"a\", \"data\": {\"label\": \"Heap\"}}, \
         {\"id\": \"b\", \"data\": {\"label\": \"Stack\"}}], \
         \"edges\": [{\"source\": \"a\", \"target\": \"b\"}]}\n```",
    ));
    let backends: Vec<Arc<dyn ModelBackend>> = vec![primary.clone(), secondary.clone()];
    let graph = learning_graph(Arc::new(ModelGateway::new(backends))).unwrap();

    let initial = LearningState {
        learner_input: "Memory layout".to_string(),
        activated_agents: vec![AgentId::VISUALIZER],
        ..Default::default()
    };
    let final_state = graph.invoke(initial).await.unwrap();

    let diagram = final_state.diagram_json.unwrap();
    let labels: Vec<&str> = diagram.nodes.iter().map(|n| n.data.label.as_str()).collect();
    assert_eq!(labels, vec!["Heap", "Stack"]);
    assert_eq!(diagram.edges.len(), 1);

    // visualizer, evaluator and feedback each try the primary once
    assert_eq!(primary.calls(), 3);
    assert_eq!(secondary.calls(), 3);
}

#[tokio::test]
async fn understand_turn_runs_every_content_node_once() {
    let engine = LearningEngine::new(ModelGateway::offline()).unwrap();
    let final_state = engine
        .invoke(InvocationRequest::new("Explain the borrow checker"))
        .await
        .unwrap();

    let agents = audit_agents(&final_state);
    assert_eq!(agents.first(), Some(&AgentId::INTENT_CLASSIFIER));
    assert_eq!(agents.last(), Some(&AgentId::FEEDBACK));
    // classifier + 10 content nodes + evaluator + feedback
    assert_eq!(agents.len(), 13);
    for id in &agents {
        assert_eq!(agents.iter().filter(|a| *a == id).count(), 1, "{id} ran twice");
    }

    assert!(final_state.diagram_json.is_some());
    assert!(final_state.concept_prerequisites.is_some());
    assert!(!final_state.retrieved_knowledge.is_empty());
    assert!(!final_state.flashcards.is_empty());
    assert!(final_state.mnemonics.is_empty());
    assert_eq!(final_state.messages.len(), 2);
}

#[tokio::test]
async fn deepen_turn_reaches_every_study_aid() {
    let initial = LearningState {
        learner_input: "More on lifetimes".to_string(),
        detected_intent: Some(Intent::Deepen),
        ..Default::default()
    };
    let final_state = offline_graph().invoke(initial).await.unwrap();

    assert!(final_state.analogy_content.is_some());
    assert!(!final_state.cheat_sheet.is_empty());
    assert!(!final_state.external_resources.is_empty());
    assert!(final_state.pareto_digest.is_some());
    assert!(!final_state.practice_quiz.is_empty());
    assert!(!final_state.mnemonics.is_empty());
    assert!(final_state.diagram_json.is_none());
}

#[tokio::test]
async fn nodes_of_one_superstep_finish_before_the_next_starts() {
    let initial = LearningState {
        learner_input: "Tries".to_string(),
        detected_intent: Some(Intent::Dissect),
        ..Default::default()
    };
    let events: Vec<ProgressEvent> = offline_graph().stream(initial).collect().await;
    let agents: Vec<AgentId> = events.iter().filter_map(|e| e.agent().cloned()).collect();

    assert_eq!(agents.len(), 5);
    let mut first_three = agents[..3].to_vec();
    first_three.sort();
    let mut expected = vec![AgentId::KNOWLEDGE_MANAGER, AgentId::VISUALIZER, AgentId::PARETO];
    expected.sort();
    assert_eq!(first_three, expected);
    assert_eq!(agents[3], AgentId::EVALUATOR);
    assert_eq!(agents[4], AgentId::FEEDBACK);
}

#[tokio::test]
async fn unknown_activation_ends_the_stream_with_failed() {
    let initial = LearningState {
        activated_agents: vec![AgentId::from("h7_infographic")],
        ..Default::default()
    };
    let events: Vec<ProgressEvent> = offline_graph().stream(initial).collect().await;

    assert_eq!(events.len(), 1);
    match &events[0] {
        ProgressEvent::Failed { error } => {
            assert_eq!(error, &GraphError::UnknownNode(AgentId::from("h7_infographic")));
        }
        other => panic!("expected Failed, got {other:?}"),
    }
}

fn route_every_intent_to(id: &AgentId) -> Router {
    Intent::RECOGNIZED
        .iter()
        .fold(Router::new(), |router, intent| {
            router.with_fallback(*intent, vec![id.clone()])
        })
}

struct Exploder;

#[async_trait]
impl Agent for Exploder {
    fn id(&self) -> AgentId {
        AgentId::from_static("exploder")
    }

    fn label(&self) -> &'static str {
        "Exploder"
    }

    fn writes(&self) -> &'static [StateField] {
        &[StateField::CheatSheet]
    }

    async fn execute(
        &self,
        _state: &LearningState,
        _gateway: &ModelGateway,
    ) -> anyhow::Result<AgentOutput> {
        panic!("boom")
    }

    fn fallback(&self, _state: &LearningState) -> StateUpdate {
        StateUpdate {
            cheat_sheet: Some(vec!["safe".to_string()]),
            ..Default::default()
        }
    }
}

#[tokio::test]
async fn panicking_node_contributes_its_fallback() {
    let exploder = AgentId::from_static("exploder");
    let router = route_every_intent_to(&exploder);
    let graph = GraphBuilder::new(Arc::new(ModelGateway::offline()))
        .node(Arc::new(Exploder))
        .node(Arc::new(Evaluator))
        .entry(AgentId::EVALUATOR)
        .edge(exploder.clone(), END)
        .router(router)
        .build()
        .unwrap();

    let final_state = graph
        .invoke(LearningState {
            detected_intent: Some(Intent::Visualize),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(final_state.cheat_sheet, vec!["safe"]);
    let entry = &final_state.routing_log[0];
    assert_eq!(entry.agent, exploder);
    assert_eq!(entry.decision, "Failed (Fallback)");
}

/// Node that sleeps, optionally asks the model once, and writes nothing.
struct Timed {
    id: &'static str,
    delay: Duration,
    writes: &'static [StateField],
    asks_model: bool,
}

impl Timed {
    fn new(id: &'static str, delay_ms: u64, writes: &'static [StateField]) -> Self {
        Self {
            id,
            delay: Duration::from_millis(delay_ms),
            writes,
            asks_model: false,
        }
    }

    fn asking_model(mut self) -> Self {
        self.asks_model = true;
        self
    }
}

#[async_trait]
impl Agent for Timed {
    fn id(&self) -> AgentId {
        AgentId::from_static(self.id)
    }

    fn label(&self) -> &'static str {
        self.id
    }

    fn writes(&self) -> &'static [StateField] {
        self.writes
    }

    async fn execute(
        &self,
        _state: &LearningState,
        gateway: &ModelGateway,
    ) -> anyhow::Result<AgentOutput> {
        tokio::time::sleep(self.delay).await;
        if self.asks_model {
            let spec =
                ModelCallSpec::new(self.id, "Reply with JSON.", "ping", serde_json::json!({}));
            gateway.call(&spec).await;
        }
        Ok(AgentOutput::new(StateUpdate::new(), "Done"))
    }

    fn fallback(&self, _state: &LearningState) -> StateUpdate {
        StateUpdate::new()
    }
}

fn timed_graph(
    nodes: Vec<Timed>,
    edges: &[(&'static str, AgentId)],
    backend: Arc<ScriptedBackend>,
) -> Arc<pathway_core::ExecutionGraph> {
    let first = AgentId::from_static(nodes[0].id);
    let backends: Vec<Arc<dyn ModelBackend>> = vec![backend];
    let mut builder = GraphBuilder::new(Arc::new(ModelGateway::new(backends)))
        .node(Arc::new(Evaluator))
        .entry(AgentId::EVALUATOR)
        .router(route_every_intent_to(&first));
    for node in nodes {
        builder = builder.node(Arc::new(node));
    }
    for (from, to) in edges {
        builder = builder.edge(AgentId::from_static(*from), to.clone());
    }
    Arc::new(builder.build().unwrap())
}

fn activating(ids: &[&'static str]) -> LearningState {
    LearningState {
        learner_input: "Heaps".to_string(),
        activated_agents: ids.iter().copied().map(AgentId::from_static).collect(),
        ..Default::default()
    }
}

#[tokio::test]
async fn events_and_audit_follow_completion_order() {
    let graph = timed_graph(
        vec![
            Timed::new("slow", 80, &[StateField::CheatSheet]),
            Timed::new("fast", 0, &[StateField::Mnemonics]),
        ],
        &[("slow", END), ("fast", END)],
        Arc::new(ScriptedBackend::always("model", "{}")),
    );

    let mut stream = graph.stream(activating(&["slow", "fast"]));
    let mut completed = Vec::new();
    let mut final_state = None;
    while let Some(event) = stream.next().await {
        tokio::time::sleep(Duration::from_millis(30)).await;
        match event {
            ProgressEvent::NodeCompleted { agent, .. } => completed.push(agent),
            ProgressEvent::Finished { final_state: state } => final_state = Some(state),
            ProgressEvent::Failed { error } => panic!("run failed: {error}"),
        }
    }

    let expected = vec![AgentId::from_static("fast"), AgentId::from_static("slow")];
    assert_eq!(completed, expected);
    assert_eq!(audit_agents(&final_state.unwrap()), expected);
}

#[tokio::test]
async fn scheduler_runs_ahead_of_an_idle_consumer() {
    let backend = Arc::new(ScriptedBackend::always("model", "{}"));
    let graph = timed_graph(
        vec![
            Timed::new("first", 0, &[StateField::CheatSheet]),
            Timed::new("second", 0, &[StateField::Mnemonics]).asking_model(),
        ],
        &[("first", AgentId::from_static("second")), ("second", END)],
        backend.clone(),
    );

    let stream = graph.stream(activating(&["first"]));
    // Nothing is read while both supersteps run.
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(backend.calls(), 1);

    let events: Vec<ProgressEvent> = stream.collect().await;
    let agents: Vec<AgentId> = events.iter().filter_map(|e| e.agent().cloned()).collect();
    assert_eq!(
        agents,
        vec![AgentId::from_static("first"), AgentId::from_static("second")]
    );
    assert!(matches!(events.last(), Some(ProgressEvent::Finished { .. })));
}

#[tokio::test]
async fn dropped_stream_lets_running_nodes_finish() {
    let backend = Arc::new(ScriptedBackend::always("model", "{}"));
    let graph = timed_graph(
        vec![Timed::new("worker", 50, &[StateField::CheatSheet]).asking_model()],
        &[("worker", END)],
        backend.clone(),
    );

    let stream = graph.stream(activating(&["worker"]));
    tokio::time::sleep(Duration::from_millis(10)).await;
    drop(stream);
    assert_eq!(backend.calls(), 0);

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(backend.calls(), 1);
}
