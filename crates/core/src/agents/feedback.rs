//! # Feedback Engine
//!
//! Terminal stage. Writes the closing guidance (also exposed as
//! `final_output`), remembers what was studied and answers in the transcript.

use async_trait::async_trait;
use serde_json::Value;

use super::{coerce, prompts, Agent, AgentOutput};
use crate::gateway::{ModelCallSpec, ModelGateway};
use crate::memory::LearnerMemory;
use crate::state::{AgentId, FeedbackGuidance, LearningState, Message, StateField, StateUpdate};

const WRITES: &[StateField] = &[
    StateField::FeedbackGuidance,
    StateField::FinalOutput,
    StateField::LongTermMemory,
    StateField::Messages,
];

const DIFFICULTY_LABELS: [&str; 3] = ["Beginner", "Intermediate", "Advanced"];

#[derive(Default)]
pub struct FeedbackEngine {
    memory: LearnerMemory,
}

impl FeedbackEngine {
    pub fn new(memory: LearnerMemory) -> Self {
        Self { memory }
    }

    pub fn default_guidance() -> FeedbackGuidance {
        FeedbackGuidance {
            encouragement: "Great work! You've shown strong progress.".to_string(),
            next_topic: "Advanced Architectural Patterns".to_string(),
            time_estimate: 15,
            misconceptions_corrected: Vec::new(),
            summary_bullets: vec![
                "Continuous integration".to_string(),
                "System decomposition".to_string(),
            ],
            difficulty_label: "Intermediate".to_string(),
        }
    }

    fn user_prompt(state: &LearningState) -> String {
        let mut prompt = format!(
            "Learner Input: {}\nLearner Profile: {}\nCompetency Assessment: {}\nSource Context Present: {}",
            state.learner_input,
            serde_json::to_string(&state.learner_profile).unwrap_or_default(),
            serde_json::to_string(&state.competency_assessment).unwrap_or_default(),
            !state.source_context.trim().is_empty(),
        );
        if !state.source_context.trim().is_empty() {
            prompt.push_str(&format!("\nSource Context:\n{}", state.source_context));
        }
        if !state.cheat_sheet.is_empty() {
            prompt.push_str(&format!("\nKey Takeaways So Far: {}", state.cheat_sheet.join("; ")));
        }
        prompt
    }

    fn difficulty_label(value: &Value) -> String {
        let label = coerce::string(value, "difficulty_label", "Intermediate");
        DIFFICULTY_LABELS
            .iter()
            .find(|known| known.eq_ignore_ascii_case(label.trim()))
            .unwrap_or(&"Intermediate")
            .to_string()
    }

    fn coerce_guidance(value: &Value, default: &FeedbackGuidance) -> FeedbackGuidance {
        FeedbackGuidance {
            encouragement: coerce::string(value, "encouragement", &default.encouragement),
            next_topic: coerce::string(value, "next_topic", &default.next_topic),
            time_estimate: coerce::whole(value, "time_estimate", default.time_estimate),
            misconceptions_corrected: coerce::string_list(value, "misconceptions_corrected"),
            summary_bullets: coerce::string_list(value, "summary_bullets"),
            difficulty_label: Self::difficulty_label(value),
        }
    }

    fn reply(guidance: &FeedbackGuidance) -> Message {
        let mut text = guidance.encouragement.clone();
        for bullet in &guidance.summary_bullets {
            text.push_str(&format!("\n- {bullet}"));
        }
        if !guidance.next_topic.is_empty() {
            text.push_str(&format!(
                "\nNext up: {} (~{} min)",
                guidance.next_topic, guidance.time_estimate
            ));
        }
        Message::assistant(text)
    }

    fn insight_tags(state: &LearningState, guidance: &FeedbackGuidance) -> Vec<String> {
        let mut tags = Vec::new();
        let topic = state.topic().trim().to_lowercase();
        if !topic.is_empty() {
            tags.push(topic);
        }
        if !state.domain.trim().is_empty() {
            tags.push(state.domain.trim().to_lowercase());
        }
        tags.push(guidance.difficulty_label.to_lowercase());
        tags
    }

    fn guidance_update(guidance: FeedbackGuidance) -> StateUpdate {
        StateUpdate {
            feedback_guidance: Some(Some(guidance.clone())),
            final_output: Some(Some(guidance)),
            ..Default::default()
        }
    }
}

#[async_trait]
impl Agent for FeedbackEngine {
    fn id(&self) -> AgentId {
        AgentId::FEEDBACK
    }

    fn label(&self) -> &'static str {
        "Feedback"
    }

    fn writes(&self) -> &'static [StateField] {
        WRITES
    }

    async fn execute(
        &self,
        state: &LearningState,
        gateway: &ModelGateway,
    ) -> anyhow::Result<AgentOutput> {
        let default = Self::default_guidance();
        let spec = ModelCallSpec::new(
            self.label(),
            prompts::with_schema::<FeedbackGuidance>(prompts::FEEDBACK),
            Self::user_prompt(state),
            serde_json::to_value(&default)?,
        )
        .with_extended_reasoning();

        let value = gateway.call(&spec).await.value;
        let guidance = Self::coerce_guidance(&value, &default);

        let insight = format!(
            "Studied \"{}\" at {} level; suggested next topic: {}",
            state.topic(),
            guidance.difficulty_label,
            guidance.next_topic
        );
        let remembered = self
            .memory
            .store_insight(&insight, &Self::insight_tags(state, &guidance));

        let reply = Self::reply(&guidance);
        let details = format!("Next topic: {}", guidance.next_topic);
        let update = StateUpdate {
            messages: Some(vec![reply]),
            long_term_memory: remembered.long_term_memory,
            ..Self::guidance_update(guidance)
        };

        Ok(AgentOutput::new(update, "Feedback Generated").with_details(details))
    }

    fn fallback(&self, _state: &LearningState) -> StateUpdate {
        Self::guidance_update(Self::default_guidance())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::test_support::replying_gateway;
    use crate::memory::MemoryEntry;

    #[tokio::test]
    async fn test_offline_writes_guidance_and_final_output() {
        let state = LearningState {
            learner_input: "Explain closures".to_string(),
            ..Default::default()
        };
        let output = FeedbackEngine::default()
            .execute(&state, &ModelGateway::offline())
            .await
            .unwrap();

        let guidance = output.update.feedback_guidance.clone().flatten().unwrap();
        assert_eq!(guidance, FeedbackEngine::default_guidance());
        assert_eq!(output.update.final_output.clone().flatten(), Some(guidance));
        assert_eq!(output.update.messages.as_ref().unwrap()[0].role, "assistant");
    }

    #[tokio::test]
    async fn test_insight_is_remembered_with_topic_tag() {
        let state = LearningState {
            learner_input: "Closures".to_string(),
            ..Default::default()
        };
        let output = FeedbackEngine::default()
            .execute(&state, &ModelGateway::offline())
            .await
            .unwrap();

        let mut next = LearningState::default();
        next.apply(output.update);
        let entries: Vec<MemoryEntry> = LearnerMemory::entries(&next);
        assert_eq!(entries.len(), 1);
        assert!(entries[0].tags.contains(&"closures".to_string()));
        assert!(entries[0].text.contains("Closures"));
    }

    #[tokio::test]
    async fn test_unknown_difficulty_label_is_normalized() {
        let gateway = replying_gateway(
            "{\"encouragement\": \"Nice\", \"difficulty_label\": \"advanced\", \"time_estimate\": 12.6}",
        );
        let output = FeedbackEngine::default()
            .execute(&LearningState::default(), &gateway)
            .await
            .unwrap();
        let guidance = output.update.final_output.flatten().unwrap();
        assert_eq!(guidance.difficulty_label, "Advanced");
        assert_eq!(guidance.time_estimate, 13);
        assert_eq!(guidance.next_topic, "Advanced Architectural Patterns");

        let gateway = replying_gateway("{\"difficulty_label\": \"Wizard\"}");
        let output = FeedbackEngine::default()
            .execute(&LearningState::default(), &gateway)
            .await
            .unwrap();
        assert_eq!(
            output.update.final_output.flatten().unwrap().difficulty_label,
            "Intermediate"
        );
    }
}
