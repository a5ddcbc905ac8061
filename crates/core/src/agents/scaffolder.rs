//! # Concept Scaffolder
//!
//! Breaks the topic into a prerequisite tree.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;

use super::{coerce, prompts, Agent, AgentOutput};
use crate::gateway::{ModelCallSpec, ModelGateway};
use crate::state::{AgentId, ConceptPrerequisites, LearningState, StateField, StateUpdate};

pub struct ConceptScaffolder;

impl ConceptScaffolder {
    pub fn default_prerequisites(topic: &str) -> ConceptPrerequisites {
        ConceptPrerequisites {
            primary_concept: topic.to_string(),
            prerequisites: vec![
                "Core Foundations".to_string(),
                "Implementation Details".to_string(),
            ],
            dependency_tree: BTreeMap::from([(
                "Core Foundations".to_string(),
                vec!["Basic Terminology".to_string(), "Environment Setup".to_string()],
            )]),
        }
    }

    fn coerce_prerequisites(value: &Value, topic: &str) -> ConceptPrerequisites {
        let dependency_tree = match value.get("dependency_tree") {
            Some(tree @ Value::Object(children)) => children
                .keys()
                .map(|concept| (concept.clone(), coerce::string_list(tree, concept)))
                .collect(),
            _ => BTreeMap::new(),
        };

        ConceptPrerequisites {
            primary_concept: coerce::string(value, "primary_concept", topic),
            prerequisites: coerce::string_list(value, "prerequisites"),
            dependency_tree,
        }
    }

    fn update(prerequisites: ConceptPrerequisites) -> StateUpdate {
        StateUpdate {
            concept_prerequisites: Some(Some(prerequisites)),
            ..Default::default()
        }
    }
}

#[async_trait]
impl Agent for ConceptScaffolder {
    fn id(&self) -> AgentId {
        AgentId::SCAFFOLDER
    }

    fn label(&self) -> &'static str {
        "Scaffolder"
    }

    fn writes(&self) -> &'static [StateField] {
        &[StateField::ConceptPrerequisites]
    }

    async fn execute(
        &self,
        state: &LearningState,
        gateway: &ModelGateway,
    ) -> anyhow::Result<AgentOutput> {
        let topic = state.topic();
        let spec = ModelCallSpec::new(
            self.label(),
            prompts::with_schema::<ConceptPrerequisites>(prompts::SCAFFOLDER),
            format!(
                "Learner Input: {}\nTopic to Scaffold: {}\nLearner Level: {}\n\n\
                 Break this down into manageable scaffolding.",
                state.learner_input, topic, state.learner_profile.skill_level
            ),
            serde_json::to_value(Self::default_prerequisites(topic))?,
        )
        .with_extended_reasoning();

        let value = gateway.call(&spec).await.value;
        let prerequisites = Self::coerce_prerequisites(&value, topic);
        let details = format!("{} prerequisites found", prerequisites.prerequisites.len());

        Ok(AgentOutput::new(Self::update(prerequisites), "Scaffolding Generated")
            .with_details(details))
    }

    fn fallback(&self, state: &LearningState) -> StateUpdate {
        Self::update(Self::default_prerequisites(state.topic()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::test_support::failing_gateway;
    use serde_json::json;

    #[test]
    fn test_coerce_tree_drops_non_list_children() {
        let value = json!({
            "primary_concept": "Compilers",
            "prerequisites": ["Parsing", "Types"],
            "dependency_tree": {"Parsing": ["Grammars", 3], "Types": null}
        });
        let prerequisites = ConceptScaffolder::coerce_prerequisites(&value, "fallback");
        assert_eq!(prerequisites.primary_concept, "Compilers");
        assert_eq!(prerequisites.dependency_tree["Parsing"], vec!["Grammars", "3"]);
        assert!(prerequisites.dependency_tree["Types"].is_empty());
    }

    #[tokio::test]
    async fn test_failing_backend_yields_default_tree() {
        let state = LearningState {
            learner_input: "Compilers".to_string(),
            ..Default::default()
        };
        let output = ConceptScaffolder
            .execute(&state, &failing_gateway())
            .await
            .unwrap();
        assert_eq!(
            output.update.concept_prerequisites.flatten(),
            Some(ConceptScaffolder::default_prerequisites("Compilers"))
        );
        assert_eq!(output.details, "2 prerequisites found");
    }
}
