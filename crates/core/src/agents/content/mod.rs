//! # Study-Aid Agents
//!
//! Focused generators that each produce one study aid for the current topic.
//! They run side by side in the content superstep, and again on `DEEPEN`
//! requests, when they are asked for new, more advanced material.

pub mod analogy;
pub mod cheatsheet;
pub mod flashcards;
pub mod mnemonic;
pub mod pareto;
pub mod quiz;
pub mod resources;

pub use analogy::AnalogyGenerator;
pub use cheatsheet::CheatSheetGenerator;
pub use flashcards::FlashcardsGenerator;
pub use mnemonic::MnemonicMaestro;
pub use pareto::ParetoDigester;
pub use quiz::QuizGenerator;
pub use resources::ResourceCurator;

use crate::state::{Intent, LearningState};

/// Whether the learner asked for more of the same.
pub(crate) fn is_deepen(state: &LearningState) -> bool {
    state.detected_intent == Some(Intent::Deepen)
}

/// "Topic: … Level: …" preamble shared by the study-aid prompts.
pub(crate) fn topic_line(state: &LearningState) -> String {
    let mut line = format!(
        "Topic: {}. Learner Level: {}/100.",
        state.topic(),
        state.learner_profile.skill_level
    );
    if is_deepen(state) {
        line.push_str(
            " The learner already has the basics from an earlier turn: go deeper and do not repeat earlier material.",
        );
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_line_mentions_deepen() {
        let mut state = LearningState {
            learner_input: "Ownership".to_string(),
            ..Default::default()
        };
        assert!(!topic_line(&state).contains("go deeper"));

        state.detected_intent = Some(Intent::Deepen);
        assert!(topic_line(&state).contains("go deeper"));
        assert!(topic_line(&state).starts_with("Topic: Ownership."));
    }
}
