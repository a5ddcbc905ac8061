//! # Personalization Engine
//!
//! Recommends a learning path tailored to the learner profile.

use async_trait::async_trait;
use serde_json::Value;

use super::{coerce, prompts, Agent, AgentOutput};
use crate::gateway::{ModelCallSpec, ModelGateway};
use crate::state::{AgentId, LearningState, PersonalizedPath, StateField, StateUpdate};

pub struct PersonalizationEngine;

impl PersonalizationEngine {
    pub fn default_path(state: &LearningState) -> PersonalizedPath {
        PersonalizedPath {
            recommended_topic: state.learner_input.clone(),
            difficulty_level: 5,
            estimated_duration: 30,
            traditional_duration_estimate: 90,
            learning_sequence: vec!["Basics".to_string(), "Advanced".to_string()],
            time_saved_rationale: "Focuses on the core ideas first and skips review of known material."
                .to_string(),
            personalization_rationale: "Default path; no model response.".to_string(),
        }
    }

    fn user_prompt(state: &LearningState) -> String {
        let profile = &state.learner_profile;
        format!(
            "Learner Profile:\n\
             - Skill Level: {}/100\n\
             - Learning Style: {}\n\
             - Available Time: {} minutes\n\
             - Domain: {}\n\
             - Learning History: {}\n\
             - Knowledge Gaps: {}\n\n\
             Current Learner Input: {}\n\n\
             Recommend a personalized learning path.",
            profile.skill_level,
            profile.learning_style.as_str(),
            profile.time_budget,
            state.domain,
            serde_json::to_string(&profile.learning_history).unwrap_or_default(),
            profile.knowledge_gaps.join(", "),
            state.learner_input,
        )
    }

    fn coerce_path(value: &Value, default: &PersonalizedPath) -> PersonalizedPath {
        let estimated = coerce::whole(value, "estimated_duration", default.estimated_duration);
        let sequence = coerce::string_list(value, "learning_sequence");

        PersonalizedPath {
            recommended_topic: coerce::string(value, "recommended_topic", &default.recommended_topic),
            difficulty_level: coerce::whole(value, "difficulty_level", default.difficulty_level)
                .clamp(1, 10),
            estimated_duration: estimated,
            traditional_duration_estimate: coerce::whole(
                value,
                "traditional_duration_estimate",
                estimated.saturating_mul(3),
            ),
            learning_sequence: if sequence.is_empty() {
                default.learning_sequence.clone()
            } else {
                sequence
            },
            time_saved_rationale: coerce::string(
                value,
                "time_saved_rationale",
                &default.time_saved_rationale,
            ),
            personalization_rationale: coerce::string(
                value,
                "personalization_rationale",
                &default.personalization_rationale,
            ),
        }
    }

    fn update(path: PersonalizedPath) -> StateUpdate {
        StateUpdate {
            personalized_path: Some(Some(path)),
            ..Default::default()
        }
    }
}

#[async_trait]
impl Agent for PersonalizationEngine {
    fn id(&self) -> AgentId {
        AgentId::PERSONALIZATION
    }

    fn label(&self) -> &'static str {
        "Personalization"
    }

    fn writes(&self) -> &'static [StateField] {
        &[StateField::PersonalizedPath]
    }

    async fn execute(
        &self,
        state: &LearningState,
        gateway: &ModelGateway,
    ) -> anyhow::Result<AgentOutput> {
        let default = Self::default_path(state);
        let spec = ModelCallSpec::new(
            self.label(),
            prompts::with_schema::<PersonalizedPath>(prompts::PERSONALIZATION),
            Self::user_prompt(state),
            serde_json::to_value(&default)?,
        )
        .with_extended_reasoning();

        let value = gateway.call(&spec).await.value;
        let path = Self::coerce_path(&value, &default);
        let details = path.personalization_rationale.clone();

        Ok(AgentOutput::new(Self::update(path), "Path Generated").with_details(details))
    }

    fn fallback(&self, state: &LearningState) -> StateUpdate {
        Self::update(PersonalizedPath {
            learning_sequence: vec!["Error: Could not personalize".to_string()],
            personalization_rationale: "Failed to generate personalized path.".to_string(),
            ..Self::default_path(state)
        })
    }
}
