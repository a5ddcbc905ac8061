//! # Learning Engine
//!
//! The invocation surface: seeds the initial state from a learner request,
//! then runs the learning graph in batch or streaming mode.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::Result;
use crate::gateway::ModelGateway;
use crate::models::GatewayConfig;
use crate::state::{LearnerProfile, LearningState, Message};
use crate::swarm::{learning_graph, ExecutionGraph, ProgressStream};
use crate::tools::{ExtractedSource, PatternSourceExtractor, SourceExtractor};

/// One learner turn
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InvocationRequest {
    pub input: String,
    /// Replaces the carried-over profile when set
    pub profile: Option<LearnerProfile>,
    /// Final state of the previous turn, for follow-ups
    pub previous_state: Option<LearningState>,
}

impl InvocationRequest {
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            ..Default::default()
        }
    }

    pub fn with_profile(mut self, profile: LearnerProfile) -> Self {
        self.profile = Some(profile);
        self
    }

    pub fn with_previous_state(mut self, state: LearningState) -> Self {
        self.previous_state = Some(state);
        self
    }
}

pub struct LearningEngine {
    graph: Arc<ExecutionGraph>,
    extractor: Arc<dyn SourceExtractor>,
    default_domain: String,
}

impl LearningEngine {
    pub fn new(gateway: ModelGateway) -> Result<Self> {
        Ok(Self {
            graph: Arc::new(learning_graph(Arc::new(gateway))?),
            extractor: Arc::new(PatternSourceExtractor),
            default_domain: "General".to_string(),
        })
    }

    /// Engine over the backend stack configured in the environment.
    pub fn from_env() -> Result<Self> {
        Self::new(ModelGateway::from_config(&GatewayConfig::from_env()))
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn SourceExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_default_domain(mut self, domain: impl Into<String>) -> Self {
        self.default_domain = domain.into();
        self
    }

    pub fn graph(&self) -> &Arc<ExecutionGraph> {
        &self.graph
    }

    /// Run one turn to completion.
    #[tracing::instrument(skip_all, fields(input_preview = %request.input.chars().take(50).collect::<String>()))]
    pub async fn invoke(&self, request: InvocationRequest) -> Result<LearningState> {
        let initial = self.seed(request).await;
        self.graph.invoke(initial).await
    }

    /// Run one turn, yielding progress as nodes finish.
    pub async fn stream(&self, request: InvocationRequest) -> ProgressStream {
        let initial = self.seed(request).await;
        self.graph.stream(initial)
    }

    /// Build the initial state of a turn. Classification and content fields
    /// always start empty; the profile, transcript, memory and learner id
    /// carry over from `previous_state`.
    pub async fn seed(&self, request: InvocationRequest) -> LearningState {
        let InvocationRequest {
            input,
            profile,
            previous_state,
        } = request;

        let source = match self.extractor.extract(&input).await {
            Ok(source) => source,
            Err(e) => {
                tracing::warn!(error = %e, "Source extraction failed; continuing without a source");
                ExtractedSource::none()
            }
        };

        let previous = previous_state.unwrap_or_default();
        let learner_id = if previous.learner_id.is_empty() {
            uuid::Uuid::new_v4().to_string()
        } else {
            previous.learner_id
        };

        let (domain, source_context, source_metadata) = if source.is_empty() {
            (self.default_domain.clone(), String::new(), None)
        } else {
            tracing::info!(
                kind = ?source.metadata.kind,
                title = %source.metadata.title,
                "Source attached"
            );
            (source.metadata.title.clone(), source.text, Some(source.metadata))
        };

        let mut messages = previous.messages;
        messages.push(Message::user(input.clone()));

        LearningState {
            learner_input: input,
            learner_id,
            domain,
            learner_profile: profile.unwrap_or(previous.learner_profile),
            source_context,
            source_metadata,
            messages,
            long_term_memory: previous.long_term_memory,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Intent, LearningStyle, SourceKind};
    use async_trait::async_trait;

    struct BrokenExtractor;

    #[async_trait]
    impl SourceExtractor for BrokenExtractor {
        async fn extract(&self, _input: &str) -> anyhow::Result<ExtractedSource> {
            anyhow::bail!("network down")
        }
    }

    fn engine() -> LearningEngine {
        LearningEngine::new(ModelGateway::offline()).unwrap()
    }

    #[tokio::test]
    async fn test_seed_uses_default_domain_without_source() {
        let state = engine()
            .with_default_domain("Computer Science")
            .seed(InvocationRequest::new("What is a closure?"))
            .await;
        assert_eq!(state.domain, "Computer Science");
        assert!(state.source_metadata.is_none());
        assert_eq!(state.messages, vec![Message::user("What is a closure?")]);
        assert!(!state.learner_id.is_empty());
        assert!(!state.is_classified());
    }

    #[tokio::test]
    async fn test_seed_takes_domain_from_source_title() {
        let state = engine()
            .seed(InvocationRequest::new("book: Godel, Escher, Bach"))
            .await;
        let metadata = state.source_metadata.unwrap();
        assert_eq!(metadata.kind, SourceKind::Book);
        assert_eq!(state.domain, metadata.title);
        assert!(!state.source_context.is_empty());
    }

    #[tokio::test]
    async fn test_extraction_failure_means_no_source() {
        let state = engine()
            .with_extractor(Arc::new(BrokenExtractor))
            .seed(InvocationRequest::new("book: anything"))
            .await;
        assert!(state.source_metadata.is_none());
        assert_eq!(state.domain, "General");
    }

    #[tokio::test]
    async fn test_follow_up_carries_learner_context() {
        let engine = engine();
        let first = engine
            .invoke(InvocationRequest::new("Explain ownership"))
            .await
            .unwrap();
        assert!(!first.long_term_memory.is_empty());

        let second = engine
            .seed(InvocationRequest::new("Go deeper").with_previous_state(first.clone()))
            .await;
        assert_eq!(second.learner_id, first.learner_id);
        assert_eq!(second.long_term_memory, first.long_term_memory);
        assert_eq!(second.messages.len(), first.messages.len() + 1);
        assert!(second.detected_intent.is_none());
        assert!(second.routing_log.is_empty());
    }

    #[tokio::test]
    async fn test_new_profile_replaces_carried_profile() {
        let profile = LearnerProfile {
            learning_style: LearningStyle::Visual,
            ..Default::default()
        };
        let previous = LearningState {
            detected_intent: Some(Intent::Deepen),
            ..Default::default()
        };
        let state = engine()
            .seed(
                InvocationRequest::new("Draw it")
                    .with_profile(profile.clone())
                    .with_previous_state(previous),
            )
            .await;
        assert_eq!(state.learner_profile, profile);
        assert!(state.detected_intent.is_none());
    }
}
