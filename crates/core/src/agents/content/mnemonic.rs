use async_trait::async_trait;
use schemars::JsonSchema;
use serde_json::{json, Value};

use super::topic_line;
use crate::agents::{coerce, prompts, Agent, AgentOutput};
use crate::gateway::{ModelCallSpec, ModelGateway};
use crate::state::{AgentId, LearningState, Mnemonic, StateField, StateUpdate};

#[derive(JsonSchema)]
#[allow(dead_code)]
struct MnemonicOutput {
    mnemonics: Vec<Mnemonic>,
}

/// Memory hooks for the topic (h8). Acronym phrases are upper-cased.
pub struct MnemonicMaestro;

impl MnemonicMaestro {
    fn mnemonic(value: &Value) -> Option<Mnemonic> {
        let phrase = coerce::optional_string(value, "phrase")?;
        let expansion = coerce::string(value, "expansion", "");
        let phrase = if is_acronym(&phrase, &expansion) {
            phrase.to_uppercase()
        } else {
            phrase
        };
        Some(Mnemonic {
            phrase,
            expansion,
            tip: coerce::optional_string(value, "tip"),
        })
    }

    fn update(mnemonics: Vec<Mnemonic>) -> StateUpdate {
        StateUpdate {
            mnemonics: Some(mnemonics),
            ..Default::default()
        }
    }
}

/// A single word whose letters start the words of the expansion.
fn is_acronym(phrase: &str, expansion: &str) -> bool {
    if phrase.contains(char::is_whitespace) {
        return false;
    }
    let initials: String = expansion
        .split_whitespace()
        .filter_map(|word| word.chars().next())
        .collect();
    initials.len() > 1 && initials.eq_ignore_ascii_case(phrase)
}

#[async_trait]
impl Agent for MnemonicMaestro {
    fn id(&self) -> AgentId {
        AgentId::MNEMONIC
    }

    fn label(&self) -> &'static str {
        "H8 (Mnemonic)"
    }

    fn writes(&self) -> &'static [StateField] {
        &[StateField::Mnemonics]
    }

    async fn execute(
        &self,
        state: &LearningState,
        gateway: &ModelGateway,
    ) -> anyhow::Result<AgentOutput> {
        let mut prompt = topic_line(state);
        if !state.memory_context.trim().is_empty() {
            prompt.push_str(&format!("\nContext: {}", state.memory_context));
        }

        let spec = ModelCallSpec::new(
            self.label(),
            prompts::with_schema::<MnemonicOutput>(prompts::MNEMONIC),
            prompt,
            json!({
                "mnemonics": [{
                    "phrase": "MOCK",
                    "expansion": "Memory Optimized Creative Knowledge",
                    "tip": "Think of this as a default fallback."
                }]
            }),
        );
        let value = gateway.call(&spec).await.value;

        let mnemonics: Vec<Mnemonic> = coerce::objects(&value, "mnemonics")
            .filter_map(Self::mnemonic)
            .collect();
        let details = format!("{} mnemonics", mnemonics.len());
        Ok(AgentOutput::new(Self::update(mnemonics), "Mnemonics Generated").with_details(details))
    }

    fn fallback(&self, _state: &LearningState) -> StateUpdate {
        Self::update(Vec::new())
    }
}
