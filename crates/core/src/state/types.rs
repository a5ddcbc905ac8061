//! Record types stored in the learning state.
//!
//! Every record deserializes with `#[serde(default)]` so a state written by an
//! older build (or a partially filled `previous_state`) still loads.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::ids::AgentId;

/// Preferred modality of the learner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum LearningStyle {
    Visual,
    Verbal,
    Kinesthetic,
    #[default]
    Mixed,
}

impl LearningStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            LearningStyle::Visual => "visual",
            LearningStyle::Verbal => "verbal",
            LearningStyle::Kinesthetic => "kinesthetic",
            LearningStyle::Mixed => "mixed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Pace {
    Fast,
    #[default]
    Standard,
    Slow,
}

/// Learner profile supplied by the caller
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LearnerProfile {
    /// 0-100
    pub skill_level: u32,
    pub learning_style: LearningStyle,
    pub pace: Pace,
    /// Previous sessions, opaque to the core
    pub learning_history: Vec<serde_json::Value>,
    pub knowledge_gaps: Vec<String>,
    pub preferred_analogies: Vec<String>,
    /// Minutes available
    pub time_budget: u32,
    pub goal: Option<String>,
}

/// Kind of an external source the learner pointed at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Book,
    Video,
    Audio,
    #[default]
    Article,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceMetadata {
    #[serde(rename = "type")]
    pub kind: SourceKind,
    pub title: String,
    pub url: Option<String>,
}

/// A node of the concept diagram
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct DiagramNode {
    pub id: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,
    pub data: DiagramLabel,
    pub position: DiagramPosition,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct DiagramLabel {
    pub label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct DiagramPosition {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct DiagramEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub animated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Node/edge diagram explaining a concept
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Diagram {
    pub nodes: Vec<DiagramNode>,
    pub edges: Vec<DiagramEdge>,
}

/// Recommended learning path
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct PersonalizedPath {
    pub recommended_topic: String,
    /// 1-10
    pub difficulty_level: u32,
    /// Minutes, assisted
    pub estimated_duration: u32,
    /// Minutes, traditional study
    pub traditional_duration_estimate: u32,
    pub learning_sequence: Vec<String>,
    pub time_saved_rationale: String,
    pub personalization_rationale: String,
}

/// Prerequisite tree for a concept
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ConceptPrerequisites {
    pub primary_concept: String,
    pub prerequisites: Vec<String>,
    pub dependency_tree: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedKnowledge {
    pub concept: String,
    pub explanation: String,
    pub source: String,
    /// 0-1
    pub credibility: f64,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum QuizKind {
    #[default]
    Mcq,
    Trap,
    Scenario,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub answer: String,
    pub explanation: String,
    #[serde(rename = "type")]
    pub kind: QuizKind,
}

/// Competency estimate produced by the evaluator
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct CompetencyAssessment {
    /// 0-100
    pub current_score: f64,
    /// 0-1
    pub confidence_level: f64,
    pub mastery_indicators: Vec<String>,
    pub gaps_detected: Vec<String>,
    pub micro_quiz: Vec<QuizQuestion>,
}

/// Closing guidance produced by the feedback engine
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct FeedbackGuidance {
    pub encouragement: String,
    pub next_topic: String,
    /// Minutes
    pub time_estimate: u32,
    pub misconceptions_corrected: Vec<String>,
    pub summary_bullets: Vec<String>,
    /// Beginner, Intermediate or Advanced
    pub difficulty_label: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct AnalogyContent {
    pub analogy: String,
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Flashcard {
    pub front: String,
    pub back: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ParetoDigest {
    pub principle: String,
    pub crucial_20_percent: Vec<String>,
    pub outcome_80_percent: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Mnemonic {
    pub phrase: String,
    pub expansion: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tip: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Course,
    Video,
    Book,
    #[default]
    Link,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ExternalResource {
    #[serde(rename = "type")]
    pub kind: ResourceKind,
    pub title: String,
    pub url: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

/// One transcript turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Routing/audit record. Observability only, never read for control flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub agent: AgentId,
    pub decision: String,
    pub details: String,
    pub timestamp: DateTime<Utc>,
}

impl AuditEntry {
    pub fn new(agent: AgentId, decision: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            agent,
            decision: decision.into(),
            details: details.into(),
            timestamp: Utc::now(),
        }
    }
}
