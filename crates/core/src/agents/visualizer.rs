//! # Visualizer
//!
//! Produces a node/edge diagram of the topic.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashSet;

use super::{coerce, prompts, Agent, AgentOutput};
use crate::gateway::{ModelCallSpec, ModelGateway};
use crate::state::{
    AgentId, Diagram, DiagramEdge, DiagramLabel, DiagramNode, DiagramPosition, LearningState,
    StateField, StateUpdate,
};

const ROW_HEIGHT: f64 = 100.0;
const CENTER_X: f64 = 250.0;

pub struct Visualizer;

impl Visualizer {
    fn two_node(topic: &str, child: &str, edge_label: Option<&str>) -> Diagram {
        Diagram {
            nodes: vec![
                DiagramNode {
                    id: "1".to_string(),
                    node_type: Some("input".to_string()),
                    data: DiagramLabel {
                        label: topic.to_string(),
                    },
                    position: DiagramPosition { x: CENTER_X, y: 0.0 },
                },
                DiagramNode {
                    id: "2".to_string(),
                    node_type: None,
                    data: DiagramLabel {
                        label: child.to_string(),
                    },
                    position: DiagramPosition {
                        x: CENTER_X,
                        y: ROW_HEIGHT,
                    },
                },
            ],
            edges: vec![DiagramEdge {
                id: "e1-2".to_string(),
                source: "1".to_string(),
                target: "2".to_string(),
                animated: true,
                label: edge_label.map(str::to_string),
            }],
        }
    }

    /// Static diagram used when no model answers.
    pub fn default_diagram(topic: &str) -> Diagram {
        Self::two_node(topic, "Concept Overview", Some("explains"))
    }

    fn node(value: &Value, index: usize) -> DiagramNode {
        let id = coerce::string(value, "id", &(index + 1).to_string());
        let label = value
            .get("data")
            .and_then(|data| coerce::optional_string(data, "label"))
            .or_else(|| coerce::optional_string(value, "label"))
            .unwrap_or_else(|| id.clone());
        let position = value.get("position").unwrap_or(&Value::Null);

        DiagramNode {
            node_type: coerce::optional_string(value, "type"),
            data: DiagramLabel { label },
            position: DiagramPosition {
                x: coerce::number(position, "x", CENTER_X),
                y: coerce::number(position, "y", index as f64 * ROW_HEIGHT),
            },
            id,
        }
    }

    /// Coerce a model payload into a diagram. Edges pointing at unknown
    /// nodes are dropped; a diagram without nodes becomes the default.
    pub fn coerce_diagram(value: &Value, topic: &str) -> Diagram {
        let nodes: Vec<DiagramNode> = coerce::objects(value, "nodes")
            .enumerate()
            .map(|(index, node)| Self::node(node, index))
            .collect();
        if nodes.is_empty() {
            return Self::default_diagram(topic);
        }

        let known: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
        let edges = coerce::objects(value, "edges")
            .filter_map(|edge| {
                let source = coerce::optional_string(edge, "source")?;
                let target = coerce::optional_string(edge, "target")?;
                if !known.contains(source.as_str()) || !known.contains(target.as_str()) {
                    return None;
                }
                Some(DiagramEdge {
                    id: coerce::string(edge, "id", &format!("e{source}-{target}")),
                    animated: coerce::boolean(edge, "animated", false),
                    label: coerce::optional_string(edge, "label"),
                    source,
                    target,
                })
            })
            .collect();

        Diagram { nodes, edges }
    }

    fn update(diagram: Diagram) -> StateUpdate {
        StateUpdate {
            diagram_json: Some(Some(diagram)),
            ..Default::default()
        }
    }
}

#[async_trait]
impl Agent for Visualizer {
    fn id(&self) -> AgentId {
        AgentId::VISUALIZER
    }

    fn label(&self) -> &'static str {
        "Visualizer"
    }

    fn writes(&self) -> &'static [StateField] {
        &[StateField::DiagramJson]
    }

    async fn execute(
        &self,
        state: &LearningState,
        gateway: &ModelGateway,
    ) -> anyhow::Result<AgentOutput> {
        let topic = state.topic();
        let spec = ModelCallSpec::new(
            self.label(),
            prompts::with_schema::<Diagram>(prompts::VISUALIZER),
            format!(
                "Visualize this concept for a {} learner: \"{}\"",
                state.learner_profile.learning_style.as_str(),
                topic
            ),
            serde_json::to_value(Self::default_diagram(topic))?,
        );

        let value = gateway.call(&spec).await.value;
        let diagram = Self::coerce_diagram(&value, topic);
        let details = format!("{} nodes, {} edges", diagram.nodes.len(), diagram.edges.len());

        Ok(AgentOutput::new(Self::update(diagram), "Diagram Generated").with_details(details))
    }

    fn fallback(&self, state: &LearningState) -> StateUpdate {
        Self::update(Self::two_node(state.topic(), "Error generating detail", None))
    }
}
