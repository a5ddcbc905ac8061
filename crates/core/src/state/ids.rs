//! Node identifiers and learner intents.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// Identifier of a graph node.
///
/// Used as the key into the node registry and as the token the router emits.
/// Ids read back from a previous state may name nodes that no longer exist;
/// the router reports those as configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(Cow<'static, str>);

impl AgentId {
    pub const INTENT_CLASSIFIER: AgentId = AgentId::from_static("intent_classifier");
    pub const VISUALIZER: AgentId = AgentId::from_static("visualizer");
    pub const PERSONALIZATION: AgentId = AgentId::from_static("personalization");
    pub const SCAFFOLDER: AgentId = AgentId::from_static("scaffolder");
    pub const KNOWLEDGE_MANAGER: AgentId = AgentId::from_static("knowledge_manager");
    pub const EVALUATOR: AgentId = AgentId::from_static("evaluator");
    pub const FEEDBACK: AgentId = AgentId::from_static("feedback");
    pub const ANALOGY: AgentId = AgentId::from_static("h1_analogy");
    pub const FLASHCARDS: AgentId = AgentId::from_static("h2_flashcards");
    pub const CHEAT_SHEET: AgentId = AgentId::from_static("h3_cheatsheet");
    pub const RESOURCES: AgentId = AgentId::from_static("h4_resources");
    pub const PARETO: AgentId = AgentId::from_static("h5_pareto");
    pub const QUIZ: AgentId = AgentId::from_static("h6_quiz");
    pub const MNEMONIC: AgentId = AgentId::from_static("h8_mnemonic");

    pub const fn from_static(id: &'static str) -> Self {
        Self(Cow::Borrowed(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Aggregation stages that must never run alongside the content nodes
    /// feeding them.
    pub fn is_terminal_stage(&self) -> bool {
        *self == Self::EVALUATOR || *self == Self::FEEDBACK
    }
}

impl From<&str> for AgentId {
    fn from(id: &str) -> Self {
        Self(Cow::Owned(id.to_string()))
    }
}

impl From<String> for AgentId {
    fn from(id: String) -> Self {
        Self(Cow::Owned(id))
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What kind of help the learner asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Intent {
    Visualize,
    Understand,
    Evaluate,
    Scaffold,
    FindGap,
    Dissect,
    Deepen,
    /// Any value the classifier table does not know.
    #[serde(other)]
    Unrecognized,
}

impl Intent {
    /// Every intent with an entry in the routing tables.
    pub const RECOGNIZED: [Intent; 7] = [
        Intent::Visualize,
        Intent::Understand,
        Intent::Evaluate,
        Intent::Scaffold,
        Intent::FindGap,
        Intent::Dissect,
        Intent::Deepen,
    ];

    /// Parse a free-form label, case-insensitively.
    pub fn parse(label: &str) -> Intent {
        match label.trim().to_ascii_uppercase().as_str() {
            "VISUALIZE" => Intent::Visualize,
            "UNDERSTAND" => Intent::Understand,
            "EVALUATE" => Intent::Evaluate,
            "SCAFFOLD" => Intent::Scaffold,
            "FIND_GAP" => Intent::FindGap,
            "DISSECT" => Intent::Dissect,
            "DEEPEN" => Intent::Deepen,
            _ => Intent::Unrecognized,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Visualize => "VISUALIZE",
            Intent::Understand => "UNDERSTAND",
            Intent::Evaluate => "EVALUATE",
            Intent::Scaffold => "SCAFFOLD",
            Intent::FindGap => "FIND_GAP",
            Intent::Dissect => "DISSECT",
            Intent::Deepen => "DEEPEN",
            Intent::Unrecognized => "UNRECOGNIZED",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
