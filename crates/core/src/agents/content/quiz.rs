use async_trait::async_trait;
use schemars::JsonSchema;
use serde_json::{json, Value};

use super::topic_line;
use crate::agents::{coerce, prompts, Agent, AgentOutput};
use crate::gateway::{ModelCallSpec, ModelGateway};
use crate::state::{AgentId, LearningState, QuizKind, QuizQuestion, StateField, StateUpdate};

#[derive(JsonSchema)]
#[allow(dead_code)]
struct QuizOutput {
    practice_quiz: Vec<QuizQuestion>,
}

/// Practice questions, including at least one trap (h6).
pub struct QuizGenerator;

impl QuizGenerator {
    fn default_quiz(topic: &str) -> Vec<QuizQuestion> {
        vec![QuizQuestion {
            question: format!("Can you explain {topic} in your own words?"),
            options: vec!["Yes".to_string(), "Not yet".to_string()],
            answer: "Yes".to_string(),
            explanation: "Explaining a concept is the quickest check of understanding.".to_string(),
            kind: QuizKind::Mcq,
        }]
    }

    fn update(questions: Vec<QuizQuestion>) -> StateUpdate {
        StateUpdate {
            practice_quiz: Some(questions),
            ..Default::default()
        }
    }
}

#[async_trait]
impl Agent for QuizGenerator {
    fn id(&self) -> AgentId {
        AgentId::QUIZ
    }

    fn label(&self) -> &'static str {
        "H6 (Quiz)"
    }

    fn writes(&self) -> &'static [StateField] {
        &[StateField::PracticeQuiz]
    }

    async fn execute(
        &self,
        state: &LearningState,
        gateway: &ModelGateway,
    ) -> anyhow::Result<AgentOutput> {
        let topic = state.topic();
        let spec = ModelCallSpec::new(
            self.label(),
            prompts::with_schema::<QuizOutput>(prompts::QUIZ),
            topic_line(state),
            json!({ "practice_quiz": Self::default_quiz(topic) }),
        );
        let value = gateway.call(&spec).await.value;

        let mut questions = match &value {
            Value::Array(_) => coerce::quiz(&json!({ "practice_quiz": value }), "practice_quiz"),
            _ => coerce::quiz(&value, "practice_quiz"),
        };
        if questions.is_empty() {
            questions = Self::default_quiz(topic);
        }

        let traps = questions.iter().filter(|q| q.kind == QuizKind::Trap).count();
        let details = format!("{} questions, {} traps", questions.len(), traps);
        Ok(AgentOutput::new(Self::update(questions), "Practice Quiz Generated").with_details(details))
    }

    fn fallback(&self, state: &LearningState) -> StateUpdate {
        Self::update(Self::default_quiz(state.topic()))
    }
}
