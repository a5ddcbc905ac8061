//! # Intent Classifier
//!
//! Entry node. Classifies the learner input and computes the activation list
//! the router turns into the first content superstep.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde_json::json;

use super::{coerce, prompts, Agent, AgentOutput};
use crate::gateway::{ModelCallSpec, ModelGateway};
use crate::state::{AgentId, Intent, LearningState, StateField, StateUpdate};

const WRITES: &[StateField] = &[
    StateField::DetectedIntent,
    StateField::IntentConfidence,
    StateField::ActivatedAgents,
];

/// Output shape requested from the model
#[derive(JsonSchema)]
#[allow(dead_code)]
struct Classification {
    /// One of VISUALIZE, UNDERSTAND, EVALUATE, SCAFFOLD, FIND_GAP, DISSECT, DEEPEN
    intent: String,
    /// 0-1
    confidence: f64,
    reasoning: String,
}

/// Agents activated for each intent, terminal stages included.
///
/// The router strips `evaluator`/`feedback` from these lists; they run through
/// the fixed convergence edges instead.
pub fn activation_for(intent: Intent) -> Vec<AgentId> {
    match intent {
        Intent::Visualize => vec![AgentId::VISUALIZER, AgentId::EVALUATOR, AgentId::FEEDBACK],
        Intent::Understand => vec![
            AgentId::SCAFFOLDER,
            AgentId::KNOWLEDGE_MANAGER,
            AgentId::PERSONALIZATION,
            AgentId::VISUALIZER,
            AgentId::ANALOGY,
            AgentId::FLASHCARDS,
            AgentId::CHEAT_SHEET,
            AgentId::RESOURCES,
            AgentId::PARETO,
            AgentId::QUIZ,
            AgentId::FEEDBACK,
        ],
        Intent::Evaluate => vec![AgentId::EVALUATOR, AgentId::FEEDBACK],
        Intent::Scaffold => vec![
            AgentId::SCAFFOLDER,
            AgentId::PERSONALIZATION,
            AgentId::FEEDBACK,
        ],
        Intent::FindGap => vec![
            AgentId::EVALUATOR,
            AgentId::PERSONALIZATION,
            AgentId::FEEDBACK,
        ],
        Intent::Dissect => vec![
            AgentId::KNOWLEDGE_MANAGER,
            AgentId::VISUALIZER,
            AgentId::EVALUATOR,
            AgentId::PARETO,
            AgentId::FEEDBACK,
        ],
        Intent::Deepen => vec![
            AgentId::ANALOGY,
            AgentId::FLASHCARDS,
            AgentId::CHEAT_SHEET,
            AgentId::RESOURCES,
            AgentId::PARETO,
            AgentId::QUIZ,
            AgentId::MNEMONIC,
            AgentId::FEEDBACK,
        ],
        Intent::Unrecognized => vec![AgentId::FEEDBACK],
    }
}

pub struct IntentClassifier;

impl IntentClassifier {
    fn user_prompt(state: &LearningState) -> String {
        let profile = serde_json::to_string(&state.learner_profile).unwrap_or_default();
        let mut prompt = format!(
            "Analysis needed for input: \"{}\"\nLearner Profile: {}",
            state.learner_input, profile
        );
        if let Some(source) = &state.source_metadata {
            if !state.source_context.is_empty() {
                prompt.push_str(&format!("\nAttached source: \"{}\"", source.title));
            }
        }
        prompt
    }

    fn update(intent: Intent, confidence: f64, activated: Vec<AgentId>) -> StateUpdate {
        StateUpdate {
            detected_intent: Some(Some(intent)),
            intent_confidence: Some(confidence),
            activated_agents: Some(activated),
            ..Default::default()
        }
    }
}

#[async_trait]
impl Agent for IntentClassifier {
    fn id(&self) -> AgentId {
        AgentId::INTENT_CLASSIFIER
    }

    fn label(&self) -> &'static str {
        "Intent Classifier"
    }

    fn writes(&self) -> &'static [StateField] {
        WRITES
    }

    async fn execute(
        &self,
        state: &LearningState,
        gateway: &ModelGateway,
    ) -> anyhow::Result<AgentOutput> {
        let spec = ModelCallSpec::new(
            self.label(),
            prompts::with_schema::<Classification>(prompts::INTENT_CLASSIFIER),
            Self::user_prompt(state),
            json!({
                "intent": "UNDERSTAND",
                "confidence": 0.8,
                "reasoning": "Default classification; no model response."
            }),
        )
        .with_extended_reasoning();

        let value = gateway.call(&spec).await.value;

        let intent = match Intent::parse(&coerce::string(&value, "intent", "UNDERSTAND")) {
            Intent::Unrecognized => Intent::Understand,
            known => known,
        };
        let confidence = coerce::bounded(&value, "confidence", 0.5, 0.0, 1.0);
        let reasoning = coerce::string(&value, "reasoning", "No reasoning");

        Ok(AgentOutput::new(
            Self::update(intent, confidence, activation_for(intent)),
            format!("Intent: {intent}"),
        )
        .with_details(reasoning))
    }

    fn fallback(&self, _state: &LearningState) -> StateUpdate {
        Self::update(
            Intent::Understand,
            0.5,
            vec![AgentId::SCAFFOLDER, AgentId::FEEDBACK],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::test_support::{assert_writes_declared, replying_gateway};

    fn state(input: &str) -> LearningState {
        LearningState {
            learner_input: input.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_classifies_from_fenced_reply() {
        let gateway = replying_gateway(
            "Let me think.\n```json\n{\"intent\": \"EVALUATE\", \"confidence\": 0.93, \"reasoning\": \"asks for a quiz\"}\n```",
        );
        let output = IntentClassifier
            .execute(&state("Quiz me on Rust lifetimes"), &gateway)
            .await
            .unwrap();

        assert_eq!(output.update.detected_intent, Some(Some(Intent::Evaluate)));
        assert_eq!(output.update.intent_confidence, Some(0.93));
        assert_eq!(
            output.update.activated_agents,
            Some(vec![AgentId::EVALUATOR, AgentId::FEEDBACK])
        );
        assert_eq!(output.decision, "Intent: EVALUATE");
        assert_eq!(output.details, "asks for a quiz");
    }

    #[tokio::test]
    async fn test_unknown_intent_coerces_to_understand() {
        let gateway = replying_gateway("{\"intent\": \"DANCE\", \"confidence\": 7}");
        let output = IntentClassifier
            .execute(&state("?"), &gateway)
            .await
            .unwrap();

        assert_eq!(output.update.detected_intent, Some(Some(Intent::Understand)));
        assert_eq!(output.update.intent_confidence, Some(1.0));
        assert_eq!(
            output.update.activated_agents,
            Some(activation_for(Intent::Understand))
        );
    }

    #[tokio::test]
    async fn test_offline_default_is_understand() {
        let output = IntentClassifier
            .execute(&state("Explain DNS"), &ModelGateway::offline())
            .await
            .unwrap();
        assert_eq!(output.update.detected_intent, Some(Some(Intent::Understand)));
        assert_eq!(output.update.intent_confidence, Some(0.8));
        assert_writes_declared(&IntentClassifier, &output.update);
    }

    #[test]
    fn test_activation_lists_have_no_duplicates() {
        for intent in Intent::RECOGNIZED {
            let list = activation_for(intent);
            let mut sorted = list.clone();
            sorted.sort();
            sorted.dedup();
            assert_eq!(sorted.len(), list.len(), "{intent} has duplicates");
            assert!(list.contains(&AgentId::FEEDBACK));
        }
    }
}
