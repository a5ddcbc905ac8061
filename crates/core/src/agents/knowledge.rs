//! # Knowledge Manager
//!
//! Synthesizes one knowledge object from the attached source (or a built-in
//! pool) and surfaces relevant long-term memories as `memory_context`.

use async_trait::async_trait;
use chrono::Utc;
use schemars::JsonSchema;
use serde_json::{json, Value};

use super::{coerce, prompts, Agent, AgentOutput};
use crate::gateway::{ModelCallSpec, ModelGateway};
use crate::memory::{format_context, LearnerMemory};
use crate::state::{AgentId, LearningState, RetrievedKnowledge, StateField, StateUpdate};

/// Retrieval pool used when no source is attached
const BUILTIN_POOL: &[&str] = &[
    "Pathway decomposes a learning goal across specialised agents that run in parallel.",
    "Concepts are easier to retain when introduced after their prerequisites.",
    "Active recall and spaced repetition outperform re-reading for long-term retention.",
];

const WRITES: &[StateField] = &[StateField::RetrievedKnowledge, StateField::MemoryContext];

#[derive(JsonSchema)]
#[allow(dead_code)]
struct Synthesis {
    concept: String,
    explanation: String,
    source: String,
    /// 0-1
    credibility: f64,
}

#[derive(Default)]
pub struct KnowledgeManager {
    memory: LearnerMemory,
}

impl KnowledgeManager {
    pub fn new(memory: LearnerMemory) -> Self {
        Self { memory }
    }

    fn pool(state: &LearningState, memories: &[String]) -> Vec<String> {
        let mut pool: Vec<String> = if state.source_context.trim().is_empty() {
            BUILTIN_POOL.iter().map(|s| s.to_string()).collect()
        } else {
            vec![state.source_context.clone()]
        };
        pool.extend(memories.iter().cloned());
        pool
    }

    fn default_source(state: &LearningState) -> String {
        state
            .source_metadata
            .as_ref()
            .filter(|_| !state.source_context.trim().is_empty())
            .map(|m| m.title.clone())
            .unwrap_or_else(|| "Pathway Knowledge Base".to_string())
    }

    fn knowledge(value: &Value, topic: &str, default_source: &str) -> RetrievedKnowledge {
        RetrievedKnowledge {
            concept: coerce::string(value, "concept", topic),
            explanation: coerce::string(value, "explanation", "No explanation provided."),
            source: coerce::string(value, "source", default_source),
            credibility: coerce::bounded(value, "credibility", 0.5, 0.0, 1.0),
            last_updated: Utc::now(),
        }
    }
}

#[async_trait]
impl Agent for KnowledgeManager {
    fn id(&self) -> AgentId {
        AgentId::KNOWLEDGE_MANAGER
    }

    fn label(&self) -> &'static str {
        "Knowledge Manager"
    }

    fn writes(&self) -> &'static [StateField] {
        WRITES
    }

    async fn execute(
        &self,
        state: &LearningState,
        gateway: &ModelGateway,
    ) -> anyhow::Result<AgentOutput> {
        let topic = state.topic();
        let memories = self.memory.retrieve_context(state, topic);
        let pool = Self::pool(state, &memories);
        let default_source = Self::default_source(state);

        let spec = ModelCallSpec::new(
            self.label(),
            prompts::with_schema::<Synthesis>(prompts::KNOWLEDGE_MANAGER),
            format!(
                "Synthesize knowledge for: \"{}\"\nRaw Context:\n{}",
                topic,
                pool.join("\n")
            ),
            json!({
                "concept": topic,
                "explanation": "Knowledge synthesized from the available sources.",
                "source": default_source,
                "credibility": 0.9
            }),
        );

        let value = gateway.call(&spec).await.value;
        let knowledge = Self::knowledge(&value, topic, &default_source);

        let update = StateUpdate {
            retrieved_knowledge: Some(vec![knowledge]),
            memory_context: Some(format_context(&memories)),
            ..Default::default()
        };
        Ok(AgentOutput::new(update, "Knowledge Synthesized").with_details(format!(
            "Used {} raw sources ({} from memory)",
            pool.len(),
            memories.len()
        )))
    }

    fn fallback(&self, state: &LearningState) -> StateUpdate {
        StateUpdate {
            retrieved_knowledge: Some(vec![RetrievedKnowledge {
                concept: state.topic().to_string(),
                explanation: "Fallback knowledge provided due to synthesis error.".to_string(),
                source: "System Cache".to_string(),
                credibility: 0.5,
                last_updated: Utc::now(),
            }]),
            memory_context: Some(String::new()),
            ..Default::default()
        }
    }
}
