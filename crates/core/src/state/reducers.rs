//! # Reducer Registry
//!
//! Every state field has exactly one merge function, chosen statically by
//! [`StateField::reducer`]. The three families are:
//!
//! - **replace**: `merge(old, new) = new` if present, else `old`
//! - **append**: `merge(old, new) = old ++ new`, in merge-call order
//! - **map-merge**: shallow union, incoming keys overwrite existing ones

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Merge family of a state field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReducerKind {
    Replace,
    Append,
    MergeMap,
}

/// Closed enumeration of the learning-state fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateField {
    LearnerInput,
    LearnerId,
    Domain,
    LearnerProfile,
    DetectedIntent,
    IntentConfidence,
    ActivatedAgents,
    DiagramJson,
    PersonalizedPath,
    ConceptPrerequisites,
    RetrievedKnowledge,
    CompetencyAssessment,
    FeedbackGuidance,
    AnalogyContent,
    Flashcards,
    CheatSheet,
    ExternalResources,
    ParetoDigest,
    PracticeQuiz,
    Mnemonics,
    MemoryContext,
    SourceContext,
    SourceMetadata,
    FinalOutput,
    Messages,
    RoutingLog,
    LongTermMemory,
}

impl StateField {
    pub const ALL: [StateField; 27] = [
        StateField::LearnerInput,
        StateField::LearnerId,
        StateField::Domain,
        StateField::LearnerProfile,
        StateField::DetectedIntent,
        StateField::IntentConfidence,
        StateField::ActivatedAgents,
        StateField::DiagramJson,
        StateField::PersonalizedPath,
        StateField::ConceptPrerequisites,
        StateField::RetrievedKnowledge,
        StateField::CompetencyAssessment,
        StateField::FeedbackGuidance,
        StateField::AnalogyContent,
        StateField::Flashcards,
        StateField::CheatSheet,
        StateField::ExternalResources,
        StateField::ParetoDigest,
        StateField::PracticeQuiz,
        StateField::Mnemonics,
        StateField::MemoryContext,
        StateField::SourceContext,
        StateField::SourceMetadata,
        StateField::FinalOutput,
        StateField::Messages,
        StateField::RoutingLog,
        StateField::LongTermMemory,
    ];

    /// The registered reducer for this field.
    pub fn reducer(&self) -> ReducerKind {
        match self {
            StateField::Messages | StateField::RoutingLog => ReducerKind::Append,
            StateField::LongTermMemory => ReducerKind::MergeMap,
            StateField::LearnerInput
            | StateField::LearnerId
            | StateField::Domain
            | StateField::LearnerProfile
            | StateField::DetectedIntent
            | StateField::IntentConfidence
            | StateField::ActivatedAgents
            | StateField::DiagramJson
            | StateField::PersonalizedPath
            | StateField::ConceptPrerequisites
            | StateField::RetrievedKnowledge
            | StateField::CompetencyAssessment
            | StateField::FeedbackGuidance
            | StateField::AnalogyContent
            | StateField::Flashcards
            | StateField::CheatSheet
            | StateField::ExternalResources
            | StateField::ParetoDigest
            | StateField::PracticeQuiz
            | StateField::Mnemonics
            | StateField::MemoryContext
            | StateField::SourceContext
            | StateField::SourceMetadata
            | StateField::FinalOutput => ReducerKind::Replace,
        }
    }

    /// Whether concurrent writers must be disjoint on this field.
    ///
    /// Append fields tolerate arbitrary completion order; every other family
    /// would produce an order-dependent result.
    pub fn requires_exclusive_writer(&self) -> bool {
        self.reducer() != ReducerKind::Append
    }

    pub fn name(&self) -> &'static str {
        match self {
            StateField::LearnerInput => "learner_input",
            StateField::LearnerId => "learner_id",
            StateField::Domain => "domain",
            StateField::LearnerProfile => "learner_profile",
            StateField::DetectedIntent => "detected_intent",
            StateField::IntentConfidence => "intent_confidence",
            StateField::ActivatedAgents => "activated_agents",
            StateField::DiagramJson => "diagram_json",
            StateField::PersonalizedPath => "personalized_path",
            StateField::ConceptPrerequisites => "concept_prerequisites",
            StateField::RetrievedKnowledge => "retrieved_knowledge",
            StateField::CompetencyAssessment => "competency_assessment",
            StateField::FeedbackGuidance => "feedback_guidance",
            StateField::AnalogyContent => "analogy_content",
            StateField::Flashcards => "flashcards",
            StateField::CheatSheet => "cheat_sheet",
            StateField::ExternalResources => "external_resources",
            StateField::ParetoDigest => "pareto_digest",
            StateField::PracticeQuiz => "practice_quiz",
            StateField::Mnemonics => "mnemonics",
            StateField::MemoryContext => "memory_context",
            StateField::SourceContext => "source_context",
            StateField::SourceMetadata => "source_metadata",
            StateField::FinalOutput => "final_output",
            StateField::Messages => "messages",
            StateField::RoutingLog => "routing_log",
            StateField::LongTermMemory => "long_term_memory",
        }
    }
}

impl fmt::Display for StateField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Last writer wins; an absent update keeps the current value.
pub fn replace<T>(current: &mut T, incoming: Option<T>) {
    if let Some(value) = incoming {
        *current = value;
    }
}

/// Concatenate, preserving arrival order.
pub fn append<T>(current: &mut Vec<T>, incoming: Option<Vec<T>>) {
    if let Some(values) = incoming {
        current.extend(values);
    }
}

/// Shallow union with incoming keys overwriting existing ones.
pub fn merge_map(current: &mut Map<String, Value>, incoming: Option<Map<String, Value>>) {
    if let Some(values) = incoming {
        for (key, value) in values {
            current.insert(key, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashSet;

    #[test]
    fn test_replace_keeps_old_on_none() {
        let mut value = "old".to_string();
        replace(&mut value, None);
        assert_eq!(value, "old");
    }

    #[test]
    fn test_replace_takes_new_when_present() {
        let mut value = 1.5;
        replace(&mut value, Some(0.0));
        assert_eq!(value, 0.0);

        let mut maybe: Option<u32> = Some(3);
        replace(&mut maybe, Some(None));
        assert_eq!(maybe, None);
    }

    #[test]
    fn test_append_preserves_merge_call_order() {
        let mut log = vec![1, 2];
        append(&mut log, Some(vec![3, 4]));
        append(&mut log, None);
        append(&mut log, Some(vec![5]));
        assert_eq!(log, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_merge_map_overwrites_shallowly() {
        let mut memory = json!({"a": {"deep": 1}, "b": 2})
            .as_object()
            .cloned()
            .unwrap();
        let incoming = json!({"a": {"other": 3}, "c": 4})
            .as_object()
            .cloned()
            .unwrap();
        merge_map(&mut memory, Some(incoming));

        assert_eq!(memory["a"], json!({"other": 3}));
        assert_eq!(memory["b"], json!(2));
        assert_eq!(memory["c"], json!(4));
    }

    #[test]
    fn test_every_field_has_one_unique_name() {
        let names: HashSet<_> = StateField::ALL.iter().map(|f| f.name()).collect();
        assert_eq!(names.len(), StateField::ALL.len());
    }

    #[test]
    fn test_only_transcript_and_log_append() {
        let appended: Vec<_> = StateField::ALL
            .iter()
            .filter(|f| f.reducer() == ReducerKind::Append)
            .collect();
        assert_eq!(appended, vec![&StateField::Messages, &StateField::RoutingLog]);
        assert_eq!(StateField::LongTermMemory.reducer(), ReducerKind::MergeMap);
        assert!(!StateField::RoutingLog.requires_exclusive_writer());
        assert!(StateField::LongTermMemory.requires_exclusive_writer());
    }
}
