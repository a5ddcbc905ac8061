use async_trait::async_trait;
use schemars::JsonSchema;
use serde_json::{json, Value};

use super::{is_deepen, topic_line};
use crate::agents::{coerce, prompts, Agent, AgentOutput};
use crate::gateway::{ModelCallSpec, ModelGateway};
use crate::state::{AgentId, Flashcard, LearningState, StateField, StateUpdate};

#[derive(JsonSchema)]
#[allow(dead_code)]
struct FlashcardsOutput {
    flashcards: Vec<Flashcard>,
}

/// Writes three to five study cards (h2). On `DEEPEN` the cards skip the
/// basics.
pub struct FlashcardsGenerator;

impl FlashcardsGenerator {
    fn default_cards(topic: &str) -> Vec<Flashcard> {
        vec![Flashcard {
            front: format!("What problem does {topic} solve?"),
            back: "Summarize it in one sentence, then check against your notes.".to_string(),
        }]
    }

    fn coerce_cards(value: &Value) -> Vec<Flashcard> {
        let cards = match value {
            Value::Array(_) => json!({ "flashcards": value }),
            _ => value.clone(),
        };
        coerce::objects(&cards, "flashcards")
            .filter_map(|card| {
                Some(Flashcard {
                    front: coerce::optional_string(card, "front")?,
                    back: coerce::string(card, "back", ""),
                })
            })
            .collect()
    }

    fn update(cards: Vec<Flashcard>) -> StateUpdate {
        StateUpdate {
            flashcards: Some(cards),
            ..Default::default()
        }
    }
}

#[async_trait]
impl Agent for FlashcardsGenerator {
    fn id(&self) -> AgentId {
        AgentId::FLASHCARDS
    }

    fn label(&self) -> &'static str {
        "H2 (Flashcards)"
    }

    fn writes(&self) -> &'static [StateField] {
        &[StateField::Flashcards]
    }

    async fn execute(
        &self,
        state: &LearningState,
        gateway: &ModelGateway,
    ) -> anyhow::Result<AgentOutput> {
        let topic = state.topic();
        let mut system = prompts::with_schema::<FlashcardsOutput>(prompts::FLASHCARDS);
        if is_deepen(state) {
            system.push_str("\nCreate ADVANCED, NEW cards.\n");
        }

        let spec = ModelCallSpec::new(
            self.label(),
            system,
            topic_line(state),
            json!({ "flashcards": Self::default_cards(topic) }),
        );
        let value = gateway.call(&spec).await.value;

        let mut cards = Self::coerce_cards(&value);
        if cards.is_empty() {
            cards = Self::default_cards(topic);
        }
        let details = format!("{} cards", cards.len());
        Ok(AgentOutput::new(Self::update(cards), "Flashcards Generated").with_details(details))
    }

    fn fallback(&self, state: &LearningState) -> StateUpdate {
        Self::update(Self::default_cards(state.topic()))
    }
}
