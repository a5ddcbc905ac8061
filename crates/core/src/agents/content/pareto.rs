use async_trait::async_trait;
use schemars::JsonSchema;
use serde_json::json;

use super::topic_line;
use crate::agents::{coerce, prompts, Agent, AgentOutput};
use crate::gateway::{ModelCallSpec, ModelGateway};
use crate::state::{AgentId, LearningState, ParetoDigest, StateField, StateUpdate};

#[derive(JsonSchema)]
#[allow(dead_code)]
struct ParetoOutput {
    pareto_digest: ParetoDigest,
}

/// The 20% of the topic that yields 80% of the value (h5).
pub struct ParetoDigester;

impl ParetoDigester {
    fn default_digest() -> ParetoDigest {
        ParetoDigest {
            principle: "Focus on the basics.".to_string(),
            crucial_20_percent: vec!["Core Vocabulary".to_string(), "Data Flow".to_string()],
            outcome_80_percent: "Handle most everyday problems in the topic.".to_string(),
        }
    }

    fn update(digest: ParetoDigest) -> StateUpdate {
        StateUpdate {
            pareto_digest: Some(Some(digest)),
            ..Default::default()
        }
    }
}

#[async_trait]
impl Agent for ParetoDigester {
    fn id(&self) -> AgentId {
        AgentId::PARETO
    }

    fn label(&self) -> &'static str {
        "H5 (Pareto)"
    }

    fn writes(&self) -> &'static [StateField] {
        &[StateField::ParetoDigest]
    }

    async fn execute(
        &self,
        state: &LearningState,
        gateway: &ModelGateway,
    ) -> anyhow::Result<AgentOutput> {
        let default = Self::default_digest();
        let mut prompt = topic_line(state);
        prompt.push_str(" Minimize effort, maximize outcome.");
        if !state.source_context.trim().is_empty() {
            prompt.push_str(&format!("\nSource:\n{}", state.source_context));
        }

        let spec = ModelCallSpec::new(
            self.label(),
            prompts::with_schema::<ParetoOutput>(prompts::PARETO),
            prompt,
            json!({ "pareto_digest": default }),
        );
        let value = gateway.call(&spec).await.value;
        let inner = coerce::envelope(&value, "pareto_digest");

        let crucial = coerce::string_list(inner, "crucial_20_percent");
        let digest = ParetoDigest {
            principle: coerce::string(inner, "principle", &default.principle),
            crucial_20_percent: if crucial.is_empty() {
                default.crucial_20_percent.clone()
            } else {
                crucial
            },
            outcome_80_percent: coerce::string(
                inner,
                "outcome_80_percent",
                &default.outcome_80_percent,
            ),
        };
        let details = digest.principle.clone();
        Ok(AgentOutput::new(Self::update(digest), "Pareto Digest Generated").with_details(details))
    }

    fn fallback(&self, _state: &LearningState) -> StateUpdate {
        Self::update(Self::default_digest())
    }
}
