//! # Evaluator
//!
//! Estimates competency from the learner's input and the content produced so
//! far, and attaches a micro-quiz.

use async_trait::async_trait;
use serde_json::Value;

use super::{coerce, prompts, Agent, AgentOutput};
use crate::gateway::{ModelCallSpec, ModelGateway};
use crate::state::{
    AgentId, CompetencyAssessment, LearningState, QuizKind, QuizQuestion, StateField, StateUpdate,
};

pub struct Evaluator;

impl Evaluator {
    /// Static assessment used when no model answers.
    pub fn default_assessment() -> CompetencyAssessment {
        CompetencyAssessment {
            current_score: 75.0,
            confidence_level: 0.7,
            mastery_indicators: vec!["Engaged with topic".to_string()],
            gaps_detected: vec!["Further depth needed".to_string()],
            micro_quiz: vec![QuizQuestion {
                question: "Explain the main component.".to_string(),
                options: vec!["A".to_string(), "B".to_string()],
                answer: "A".to_string(),
                explanation: "Default explanation.".to_string(),
                kind: QuizKind::Mcq,
            }],
        }
    }

    fn user_prompt(state: &LearningState) -> String {
        let concepts: Vec<&str> = state
            .retrieved_knowledge
            .iter()
            .map(|k| k.concept.as_str())
            .collect();
        let context = state
            .personalized_path
            .as_ref()
            .map(|p| p.recommended_topic.as_str())
            .filter(|t| !t.is_empty())
            .unwrap_or("General");

        let mut prompt = format!(
            "Learner Input: {}\nCurrent Context: {}\nRetrieved Knowledge Used: {}\n",
            state.learner_input,
            context,
            if concepts.is_empty() {
                "None".to_string()
            } else {
                concepts.join(", ")
            }
        );
        if !state.learner_profile.knowledge_gaps.is_empty() {
            prompt.push_str(&format!(
                "Known Gaps: {}\n",
                state.learner_profile.knowledge_gaps.join(", ")
            ));
        }
        prompt.push_str("\nAssess competency and generate a micro-quiz.");
        prompt
    }

    fn coerce_assessment(value: &Value) -> CompetencyAssessment {
        CompetencyAssessment {
            current_score: coerce::bounded(value, "current_score", 0.0, 0.0, 100.0),
            confidence_level: coerce::bounded(value, "confidence_level", 0.0, 0.0, 1.0),
            mastery_indicators: coerce::string_list(value, "mastery_indicators"),
            gaps_detected: coerce::string_list(value, "gaps_detected"),
            micro_quiz: coerce::quiz(value, "micro_quiz"),
        }
    }

    fn update(assessment: CompetencyAssessment) -> StateUpdate {
        StateUpdate {
            competency_assessment: Some(Some(assessment)),
            ..Default::default()
        }
    }
}

#[async_trait]
impl Agent for Evaluator {
    fn id(&self) -> AgentId {
        AgentId::EVALUATOR
    }

    fn label(&self) -> &'static str {
        "Evaluator"
    }

    fn writes(&self) -> &'static [StateField] {
        &[StateField::CompetencyAssessment]
    }

    async fn execute(
        &self,
        state: &LearningState,
        gateway: &ModelGateway,
    ) -> anyhow::Result<AgentOutput> {
        let spec = ModelCallSpec::new(
            self.label(),
            prompts::with_schema::<CompetencyAssessment>(prompts::EVALUATOR),
            Self::user_prompt(state),
            serde_json::to_value(Self::default_assessment())?,
        )
        .with_extended_reasoning();

        let value = gateway.call(&spec).await.value;
        let assessment = Self::coerce_assessment(&value);
        let details = format!("Score: {}", assessment.current_score);

        Ok(AgentOutput::new(Self::update(assessment), "Competency Evaluated").with_details(details))
    }

    fn fallback(&self, _state: &LearningState) -> StateUpdate {
        Self::update(Self::default_assessment())
    }
}
