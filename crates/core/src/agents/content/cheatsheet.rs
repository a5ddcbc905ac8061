use async_trait::async_trait;
use schemars::JsonSchema;
use serde_json::{json, Value};

use super::topic_line;
use crate::agents::{coerce, prompts, Agent, AgentOutput};
use crate::gateway::{ModelCallSpec, ModelGateway};
use crate::state::{AgentId, LearningState, StateField, StateUpdate};

#[derive(JsonSchema)]
#[allow(dead_code)]
struct CheatSheetOutput {
    cheat_sheet: Vec<String>,
}

/// Condenses the topic into scan-able takeaways (h3).
pub struct CheatSheetGenerator;

impl CheatSheetGenerator {
    fn default_sheet() -> Vec<String> {
        vec!["Key Concept 1".to_string(), "Key Concept 2".to_string()]
    }

    fn update(points: Vec<String>) -> StateUpdate {
        StateUpdate {
            cheat_sheet: Some(points),
            ..Default::default()
        }
    }
}

#[async_trait]
impl Agent for CheatSheetGenerator {
    fn id(&self) -> AgentId {
        AgentId::CHEAT_SHEET
    }

    fn label(&self) -> &'static str {
        "H3 (Cheat Sheet)"
    }

    fn writes(&self) -> &'static [StateField] {
        &[StateField::CheatSheet]
    }

    async fn execute(
        &self,
        state: &LearningState,
        gateway: &ModelGateway,
    ) -> anyhow::Result<AgentOutput> {
        let spec = ModelCallSpec::new(
            self.label(),
            prompts::with_schema::<CheatSheetOutput>(prompts::CHEAT_SHEET),
            topic_line(state),
            json!({ "cheat_sheet": Self::default_sheet() }),
        );
        let value = gateway.call(&spec).await.value;

        let points = match &value {
            Value::Array(_) => coerce::string_list(&json!({ "cheat_sheet": value }), "cheat_sheet"),
            _ => coerce::string_list(&value, "cheat_sheet"),
        };
        let points = if points.is_empty() {
            Self::default_sheet()
        } else {
            points
        };

        let details = format!("{} points", points.len());
        Ok(AgentOutput::new(Self::update(points), "Cheat Sheet Generated").with_details(details))
    }

    fn fallback(&self, _state: &LearningState) -> StateUpdate {
        Self::update(Self::default_sheet())
    }
}
