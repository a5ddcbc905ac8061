//! # Learner Memory
//!
//! Long-term insights about a learner, kept in the state's `long_term_memory`
//! map. Each entry lives under its own id key so the map-merge reducer never
//! drops entries written by earlier turns.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::state::{LearningState, StateUpdate};

/// One remembered insight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryEntry {
    pub id: String,
    /// Unix millis
    pub timestamp: i64,
    pub text: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// 0-1
    #[serde(default)]
    pub importance: f64,
}

/// Configuration for memory retrieval and storage
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryConfig {
    /// Maximum entries returned by a retrieval
    pub max_results: usize,
    /// Importance assigned to explicitly stored insights
    pub insight_importance: f64,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            max_results: 5,
            insight_importance: 0.8,
        }
    }
}

/// Keyword/tag memory over the learner's long-term map
#[derive(Debug, Clone, Default)]
pub struct LearnerMemory {
    config: MemoryConfig,
}

impl LearnerMemory {
    pub fn new(config: MemoryConfig) -> Self {
        Self { config }
    }

    /// Entries stored in the state. Values that are not memory entries are
    /// ignored.
    pub fn entries(state: &LearningState) -> Vec<MemoryEntry> {
        state
            .long_term_memory
            .values()
            .filter(|value| is_entry(value))
            .filter_map(|value| serde_json::from_value(value.clone()).ok())
            .collect()
    }

    /// Texts of the entries relevant to `query`, most important first.
    ///
    /// An entry matches when its text contains the query or the query
    /// contains one of its tags (case-insensitive).
    pub fn retrieve_context(&self, state: &LearningState, query: &str) -> Vec<String> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Vec::new();
        }

        let mut relevant: Vec<MemoryEntry> = Self::entries(state)
            .into_iter()
            .filter(|entry| {
                entry.text.to_lowercase().contains(&query)
                    || entry
                        .tags
                        .iter()
                        .map(|t| t.trim().to_lowercase())
                        .any(|t| !t.is_empty() && query.contains(&t))
            })
            .collect();

        relevant.sort_by(|a, b| {
            b.importance
                .total_cmp(&a.importance)
                .then(b.timestamp.cmp(&a.timestamp))
        });

        relevant
            .into_iter()
            .take(self.config.max_results)
            .map(|entry| entry.text)
            .collect()
    }

    /// A map-merge contribution holding one new entry.
    pub fn store_insight(&self, text: &str, tags: &[String]) -> StateUpdate {
        let entry = MemoryEntry {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now().timestamp_millis(),
            text: text.to_string(),
            tags: tags.to_vec(),
            importance: self.config.insight_importance,
        };
        tracing::debug!(id = %entry.id, tags = ?entry.tags, "Storing insight");

        let mut contribution = Map::new();
        if let Ok(value) = serde_json::to_value(&entry) {
            contribution.insert(entry.id, value);
        }

        StateUpdate {
            long_term_memory: Some(contribution),
            ..Default::default()
        }
    }
}

/// Collapse retrieved texts into the `memory_context` string.
pub fn format_context(texts: &[String]) -> String {
    texts.join("\n")
}

/// Whether a long-term map value looks like a memory entry.
pub fn is_entry(value: &Value) -> bool {
    value.get("text").is_some_and(Value::is_string) && value.get("id").is_some()
}
