//! # Learning State
//!
//! The shared state of one invocation, and the partial update agents return.
//! [`LearningState::apply`] is the only mutation path; it destructures the
//! update exhaustively so a new field cannot be added without a reducer.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::ids::{AgentId, Intent};
use super::reducers::{append, merge_map, replace, StateField};
use super::types::*;

/// Shared state for one graph invocation
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LearningState {
    pub learner_input: String,
    pub learner_id: String,
    pub domain: String,
    pub learner_profile: LearnerProfile,

    pub detected_intent: Option<Intent>,
    pub intent_confidence: f64,
    pub activated_agents: Vec<AgentId>,

    pub diagram_json: Option<Diagram>,
    pub personalized_path: Option<PersonalizedPath>,
    pub concept_prerequisites: Option<ConceptPrerequisites>,
    pub retrieved_knowledge: Vec<RetrievedKnowledge>,
    pub competency_assessment: Option<CompetencyAssessment>,
    pub feedback_guidance: Option<FeedbackGuidance>,

    pub analogy_content: Option<AnalogyContent>,
    pub flashcards: Vec<Flashcard>,
    pub cheat_sheet: Vec<String>,
    pub external_resources: Vec<ExternalResource>,
    pub pareto_digest: Option<ParetoDigest>,
    pub practice_quiz: Vec<QuizQuestion>,
    pub mnemonics: Vec<Mnemonic>,

    pub memory_context: String,
    pub source_context: String,
    pub source_metadata: Option<SourceMetadata>,
    pub final_output: Option<FeedbackGuidance>,

    pub messages: Vec<Message>,
    pub routing_log: Vec<AuditEntry>,
    pub long_term_memory: Map<String, Value>,
}

/// Partial state returned by a node. `None` means "not written".
///
/// For fields that are themselves optional in the state, `Some(None)` clears
/// the value. In JSON a missing key is "not written" and an explicit `null`
/// clears.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StateUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub learner_input: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub learner_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub learner_profile: Option<LearnerProfile>,

    #[serde(default, deserialize_with = "clearable", skip_serializing_if = "Option::is_none")]
    pub detected_intent: Option<Option<Intent>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent_confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activated_agents: Option<Vec<AgentId>>,

    #[serde(default, deserialize_with = "clearable", skip_serializing_if = "Option::is_none")]
    pub diagram_json: Option<Option<Diagram>>,
    #[serde(default, deserialize_with = "clearable", skip_serializing_if = "Option::is_none")]
    pub personalized_path: Option<Option<PersonalizedPath>>,
    #[serde(default, deserialize_with = "clearable", skip_serializing_if = "Option::is_none")]
    pub concept_prerequisites: Option<Option<ConceptPrerequisites>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retrieved_knowledge: Option<Vec<RetrievedKnowledge>>,
    #[serde(default, deserialize_with = "clearable", skip_serializing_if = "Option::is_none")]
    pub competency_assessment: Option<Option<CompetencyAssessment>>,
    #[serde(default, deserialize_with = "clearable", skip_serializing_if = "Option::is_none")]
    pub feedback_guidance: Option<Option<FeedbackGuidance>>,

    #[serde(default, deserialize_with = "clearable", skip_serializing_if = "Option::is_none")]
    pub analogy_content: Option<Option<AnalogyContent>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flashcards: Option<Vec<Flashcard>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cheat_sheet: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_resources: Option<Vec<ExternalResource>>,
    #[serde(default, deserialize_with = "clearable", skip_serializing_if = "Option::is_none")]
    pub pareto_digest: Option<Option<ParetoDigest>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub practice_quiz: Option<Vec<QuizQuestion>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mnemonics: Option<Vec<Mnemonic>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_context: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_context: Option<String>,
    #[serde(default, deserialize_with = "clearable", skip_serializing_if = "Option::is_none")]
    pub source_metadata: Option<Option<SourceMetadata>>,
    #[serde(default, deserialize_with = "clearable", skip_serializing_if = "Option::is_none")]
    pub final_output: Option<Option<FeedbackGuidance>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<Message>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routing_log: Option<Vec<AuditEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub long_term_memory: Option<Map<String, Value>>,
}

/// Keeps an explicit `null` apart from a missing key.
fn clearable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl StateUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one audit entry to this update.
    pub fn with_audit(mut self, entry: AuditEntry) -> Self {
        self.routing_log.get_or_insert_with(Vec::new).push(entry);
        self
    }

    /// Fields this update writes, in declaration order.
    pub fn written_fields(&self) -> Vec<StateField> {
        let StateUpdate {
            learner_input,
            learner_id,
            domain,
            learner_profile,
            detected_intent,
            intent_confidence,
            activated_agents,
            diagram_json,
            personalized_path,
            concept_prerequisites,
            retrieved_knowledge,
            competency_assessment,
            feedback_guidance,
            analogy_content,
            flashcards,
            cheat_sheet,
            external_resources,
            pareto_digest,
            practice_quiz,
            mnemonics,
            memory_context,
            source_context,
            source_metadata,
            final_output,
            messages,
            routing_log,
            long_term_memory,
        } = self;

        let slots = [
            (learner_input.is_some(), StateField::LearnerInput),
            (learner_id.is_some(), StateField::LearnerId),
            (domain.is_some(), StateField::Domain),
            (learner_profile.is_some(), StateField::LearnerProfile),
            (detected_intent.is_some(), StateField::DetectedIntent),
            (intent_confidence.is_some(), StateField::IntentConfidence),
            (activated_agents.is_some(), StateField::ActivatedAgents),
            (diagram_json.is_some(), StateField::DiagramJson),
            (personalized_path.is_some(), StateField::PersonalizedPath),
            (concept_prerequisites.is_some(), StateField::ConceptPrerequisites),
            (retrieved_knowledge.is_some(), StateField::RetrievedKnowledge),
            (competency_assessment.is_some(), StateField::CompetencyAssessment),
            (feedback_guidance.is_some(), StateField::FeedbackGuidance),
            (analogy_content.is_some(), StateField::AnalogyContent),
            (flashcards.is_some(), StateField::Flashcards),
            (cheat_sheet.is_some(), StateField::CheatSheet),
            (external_resources.is_some(), StateField::ExternalResources),
            (pareto_digest.is_some(), StateField::ParetoDigest),
            (practice_quiz.is_some(), StateField::PracticeQuiz),
            (mnemonics.is_some(), StateField::Mnemonics),
            (memory_context.is_some(), StateField::MemoryContext),
            (source_context.is_some(), StateField::SourceContext),
            (source_metadata.is_some(), StateField::SourceMetadata),
            (final_output.is_some(), StateField::FinalOutput),
            (messages.is_some(), StateField::Messages),
            (routing_log.is_some(), StateField::RoutingLog),
            (long_term_memory.is_some(), StateField::LongTermMemory),
        ];

        slots
            .into_iter()
            .filter_map(|(written, field)| written.then_some(field))
            .collect()
    }
}

impl LearningState {
    /// Merge a partial update through each field's registered reducer.
    pub fn apply(&mut self, update: StateUpdate) {
        let StateUpdate {
            learner_input,
            learner_id,
            domain,
            learner_profile,
            detected_intent,
            intent_confidence,
            activated_agents,
            diagram_json,
            personalized_path,
            concept_prerequisites,
            retrieved_knowledge,
            competency_assessment,
            feedback_guidance,
            analogy_content,
            flashcards,
            cheat_sheet,
            external_resources,
            pareto_digest,
            practice_quiz,
            mnemonics,
            memory_context,
            source_context,
            source_metadata,
            final_output,
            messages,
            routing_log,
            long_term_memory,
        } = update;

        replace(&mut self.learner_input, learner_input);
        replace(&mut self.learner_id, learner_id);
        replace(&mut self.domain, domain);
        replace(&mut self.learner_profile, learner_profile);
        replace(&mut self.detected_intent, detected_intent);
        replace(&mut self.intent_confidence, intent_confidence);
        replace(&mut self.activated_agents, activated_agents);
        replace(&mut self.diagram_json, diagram_json);
        replace(&mut self.personalized_path, personalized_path);
        replace(&mut self.concept_prerequisites, concept_prerequisites);
        replace(&mut self.retrieved_knowledge, retrieved_knowledge);
        replace(&mut self.competency_assessment, competency_assessment);
        replace(&mut self.feedback_guidance, feedback_guidance);
        replace(&mut self.analogy_content, analogy_content);
        replace(&mut self.flashcards, flashcards);
        replace(&mut self.cheat_sheet, cheat_sheet);
        replace(&mut self.external_resources, external_resources);
        replace(&mut self.pareto_digest, pareto_digest);
        replace(&mut self.practice_quiz, practice_quiz);
        replace(&mut self.mnemonics, mnemonics);
        replace(&mut self.memory_context, memory_context);
        replace(&mut self.source_context, source_context);
        replace(&mut self.source_metadata, source_metadata);
        replace(&mut self.final_output, final_output);

        append(&mut self.messages, messages);
        append(&mut self.routing_log, routing_log);

        merge_map(&mut self.long_term_memory, long_term_memory);
    }

    /// The topic agents work on: the recommended topic when a path exists,
    /// else the raw learner input.
    pub fn topic(&self) -> &str {
        self.personalized_path
            .as_ref()
            .map(|p| p.recommended_topic.as_str())
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(&self.learner_input)
    }

    /// Whether an upstream classification already decided the routing.
    pub fn is_classified(&self) -> bool {
        !self.activated_agents.is_empty() || self.detected_intent.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(agent: AgentId, decision: &str) -> AuditEntry {
        AuditEntry::new(agent, decision, "")
    }

    #[test]
    fn test_defaults_match_registry() {
        let state = LearningState::default();
        assert_eq!(state.learner_input, "");
        assert_eq!(state.intent_confidence, 0.0);
        assert!(state.detected_intent.is_none());
        assert!(state.routing_log.is_empty());
        assert!(state.long_term_memory.is_empty());
        assert_eq!(state.learner_profile.time_budget, 0);
    }

    #[test]
    fn test_apply_empty_update_is_identity() {
        let mut state = LearningState {
            learner_input: "Explain DNS".to_string(),
            intent_confidence: 0.9,
            ..Default::default()
        };
        let before = state.clone();
        state.apply(StateUpdate::new());
        assert_eq!(state, before);
    }

    #[test]
    fn test_apply_replaces_present_scalars() {
        let mut state = LearningState {
            detected_intent: Some(Intent::Understand),
            ..Default::default()
        };
        state.apply(StateUpdate {
            detected_intent: Some(Some(Intent::Evaluate)),
            intent_confidence: Some(0.4),
            ..Default::default()
        });
        assert_eq!(state.detected_intent, Some(Intent::Evaluate));
        assert_eq!(state.intent_confidence, 0.4);
    }

    #[test]
    fn test_apply_appends_routing_log_in_call_order() {
        let mut state = LearningState {
            routing_log: vec![entry(AgentId::INTENT_CLASSIFIER, "old")],
            ..Default::default()
        };
        state.apply(StateUpdate::new().with_audit(entry(AgentId::VISUALIZER, "first")));
        state.apply(StateUpdate::new().with_audit(entry(AgentId::SCAFFOLDER, "second")));

        let decisions: Vec<_> = state.routing_log.iter().map(|e| e.decision.as_str()).collect();
        assert_eq!(decisions, vec!["old", "first", "second"]);
    }

    #[test]
    fn test_apply_merges_long_term_memory() {
        let mut state = LearningState::default();
        state.long_term_memory.insert("a".to_string(), json!(1));
        state.apply(StateUpdate {
            long_term_memory: json!({"a": 2, "b": 3}).as_object().cloned(),
            ..Default::default()
        });
        assert_eq!(state.long_term_memory["a"], json!(2));
        assert_eq!(state.long_term_memory["b"], json!(3));
    }

    #[test]
    fn test_written_fields_lists_only_present_slots() {
        let update = StateUpdate {
            diagram_json: Some(None),
            cheat_sheet: Some(vec![]),
            ..Default::default()
        }
        .with_audit(entry(AgentId::VISUALIZER, "x"));

        assert_eq!(
            update.written_fields(),
            vec![
                StateField::DiagramJson,
                StateField::CheatSheet,
                StateField::RoutingLog
            ]
        );
    }

    #[test]
    fn test_topic_prefers_recommended_topic() {
        let mut state = LearningState {
            learner_input: "raw".to_string(),
            ..Default::default()
        };
        assert_eq!(state.topic(), "raw");

        state.personalized_path = Some(PersonalizedPath {
            recommended_topic: "Refined".to_string(),
            ..Default::default()
        });
        assert_eq!(state.topic(), "Refined");
    }

    #[test]
    fn test_update_serializes_without_absent_fields() {
        let update = StateUpdate {
            intent_confidence: Some(0.5),
            ..Default::default()
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json, json!({"intent_confidence": 0.5}));
    }

    #[test]
    fn test_explicit_null_clears_after_round_trip() {
        let update: StateUpdate =
            serde_json::from_value(json!({"diagram_json": null, "cheat_sheet": ["a"]})).unwrap();
        assert_eq!(update.diagram_json, Some(None));
        assert_eq!(update.pareto_digest, None);

        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json, json!({"diagram_json": null, "cheat_sheet": ["a"]}));
        let back: StateUpdate = serde_json::from_value(json).unwrap();
        assert_eq!(back, update);

        let mut state = LearningState {
            diagram_json: Some(Diagram::default()),
            ..Default::default()
        };
        state.apply(back);
        assert!(state.diagram_json.is_none());
        assert_eq!(state.cheat_sheet, vec!["a"]);
    }
}
