use async_trait::async_trait;
use schemars::JsonSchema;
use serde_json::json;

use super::topic_line;
use crate::agents::{coerce, prompts, Agent, AgentOutput};
use crate::gateway::{ModelCallSpec, ModelGateway};
use crate::state::{AgentId, AnalogyContent, LearningState, StateField, StateUpdate};

#[derive(JsonSchema)]
#[allow(dead_code)]
struct AnalogyOutput {
    analogy_content: AnalogyContent,
}

/// Finds one vivid analogy for the topic (h1).
pub struct AnalogyGenerator;

impl AnalogyGenerator {
    fn default_analogy(topic: &str) -> AnalogyContent {
        AnalogyContent {
            analogy: format!("{topic} is like a bridge."),
            explanation: "It connects what you already know to what you are learning.".to_string(),
        }
    }

    fn update(analogy: AnalogyContent) -> StateUpdate {
        StateUpdate {
            analogy_content: Some(Some(analogy)),
            ..Default::default()
        }
    }
}

#[async_trait]
impl Agent for AnalogyGenerator {
    fn id(&self) -> AgentId {
        AgentId::ANALOGY
    }

    fn label(&self) -> &'static str {
        "H1 (Analogy)"
    }

    fn writes(&self) -> &'static [StateField] {
        &[StateField::AnalogyContent]
    }

    async fn execute(
        &self,
        state: &LearningState,
        gateway: &ModelGateway,
    ) -> anyhow::Result<AgentOutput> {
        let topic = state.topic();
        let default = Self::default_analogy(topic);

        let mut prompt = topic_line(state);
        if let Some(intent) = state.detected_intent {
            prompt.push_str(&format!(" Intent: {intent}."));
        }
        if !state.learner_profile.preferred_analogies.is_empty() {
            prompt.push_str(&format!(
                " Preferred analogy domains: {}.",
                state.learner_profile.preferred_analogies.join(", ")
            ));
        }

        let spec = ModelCallSpec::new(
            self.label(),
            prompts::with_schema::<AnalogyOutput>(prompts::ANALOGY),
            prompt,
            json!({ "analogy_content": default }),
        );
        let value = gateway.call(&spec).await.value;
        let inner = coerce::envelope(&value, "analogy_content");

        let analogy = AnalogyContent {
            analogy: coerce::string(inner, "analogy", &default.analogy),
            explanation: coerce::string(inner, "explanation", &default.explanation),
        };
        Ok(AgentOutput::new(Self::update(analogy), "Analogy Generated"))
    }

    fn fallback(&self, state: &LearningState) -> StateUpdate {
        Self::update(Self::default_analogy(state.topic()))
    }
}
