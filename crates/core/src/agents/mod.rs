//! # Agents
//!
//! Each agent reads the shared state, makes at most one gateway call and
//! returns a partial update. Agents never fail outward: [`harness::run_agent`]
//! turns any error or panic into the agent's own fallback update.
//!
//! ## Registry
//!
//! | Id | Agent | Writes |
//! |----|-------|--------|
//! | `intent_classifier` | [`IntentClassifier`] | intent, confidence, activated agents |
//! | `visualizer` | [`Visualizer`] | diagram |
//! | `personalization` | [`PersonalizationEngine`] | learning path |
//! | `scaffolder` | [`ConceptScaffolder`] | prerequisite tree |
//! | `knowledge_manager` | [`KnowledgeManager`] | retrieved knowledge, memory context |
//! | `evaluator` | [`Evaluator`] | competency assessment |
//! | `feedback` | [`FeedbackEngine`] | guidance, final output, memory, transcript |
//! | `h1`..`h8` | [`content`] | one study aid each |

pub mod coerce;
pub mod content;
pub mod evaluator;
pub mod feedback;
pub mod harness;
pub mod intent;
pub mod knowledge;
pub mod personalization;
pub mod prompts;
pub mod scaffolder;
pub mod visualizer;

use async_trait::async_trait;
use std::sync::Arc;

use crate::gateway::ModelGateway;
use crate::state::{AgentId, LearningState, StateField, StateUpdate};

pub use content::{
    AnalogyGenerator, CheatSheetGenerator, FlashcardsGenerator, MnemonicMaestro, ParetoDigester,
    QuizGenerator, ResourceCurator,
};
pub use evaluator::Evaluator;
pub use feedback::FeedbackEngine;
pub use harness::{run_agent, NodeOutcome, NodeStatus};
pub use intent::IntentClassifier;
pub use knowledge::KnowledgeManager;
pub use personalization::PersonalizationEngine;
pub use scaffolder::ConceptScaffolder;
pub use visualizer::Visualizer;

/// What an agent body produced on its success path
#[derive(Debug, Clone, Default)]
pub struct AgentOutput {
    pub update: StateUpdate,
    /// Short audit decision, e.g. "Diagram Generated"
    pub decision: String,
    pub details: String,
}

impl AgentOutput {
    pub fn new(update: StateUpdate, decision: impl Into<String>) -> Self {
        Self {
            update,
            decision: decision.into(),
            details: String::new(),
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = details.into();
        self
    }
}

/// A graph node
#[async_trait]
pub trait Agent: Send + Sync {
    fn id(&self) -> AgentId;

    /// Human-readable label used in logs
    fn label(&self) -> &'static str;

    /// Fields this agent may write. Append-family fields (`messages`,
    /// `routing_log`) are listed only when the agent writes more than its
    /// audit entry.
    fn writes(&self) -> &'static [StateField];

    async fn execute(
        &self,
        state: &LearningState,
        gateway: &ModelGateway,
    ) -> anyhow::Result<AgentOutput>;

    /// Locally constructed safe update. Must not fail.
    fn fallback(&self, state: &LearningState) -> StateUpdate;
}

/// Every agent, in registry order.
pub fn registry() -> Vec<Arc<dyn Agent>> {
    vec![
        Arc::new(IntentClassifier),
        Arc::new(Visualizer),
        Arc::new(PersonalizationEngine),
        Arc::new(ConceptScaffolder),
        Arc::new(KnowledgeManager::default()),
        Arc::new(Evaluator),
        Arc::new(FeedbackEngine::default()),
        Arc::new(AnalogyGenerator),
        Arc::new(FlashcardsGenerator),
        Arc::new(CheatSheetGenerator),
        Arc::new(ResourceCurator),
        Arc::new(ParetoDigester),
        Arc::new(QuizGenerator),
        Arc::new(MnemonicMaestro),
    ]
}
