//! # Router
//!
//! Decides which nodes run after classification. Pure and synchronous: the
//! decision depends only on `activated_agents` and `detected_intent`.
//!
//! ## Decision
//!
//! 1. A non-empty `activated_agents` list wins. Terminal stages (`evaluator`,
//!    `feedback`) are removed because the graph reaches them through its
//!    static edges. A list holding only terminal stages is not returned as
//!    given: it collapses to `evaluator` when listed, else `feedback`, and the
//!    static edges run whatever follows. `[evaluator, feedback]` therefore
//!    routes to `[evaluator]`, so `feedback` runs once.
//! 2. Otherwise the intent is looked up in the fallback table.
//! 3. No intent, or one the table does not know, routes to `feedback`.

use std::collections::HashMap;

use crate::state::{AgentId, Intent, LearningState};

/// Routing tables plus the decision function
#[derive(Debug, Clone)]
pub struct Router {
    fallback: HashMap<Intent, Vec<AgentId>>,
}

impl Default for Router {
    fn default() -> Self {
        let fallback = Intent::RECOGNIZED
            .iter()
            .map(|intent| (*intent, default_route(*intent)))
            .collect();
        Self { fallback }
    }
}

fn default_route(intent: Intent) -> Vec<AgentId> {
    match intent {
        Intent::Visualize => vec![AgentId::VISUALIZER],
        Intent::Understand => vec![
            AgentId::SCAFFOLDER,
            AgentId::KNOWLEDGE_MANAGER,
            AgentId::PERSONALIZATION,
        ],
        Intent::Evaluate => vec![AgentId::EVALUATOR],
        Intent::Scaffold => vec![AgentId::SCAFFOLDER, AgentId::PERSONALIZATION],
        Intent::FindGap => vec![AgentId::PERSONALIZATION],
        Intent::Dissect => vec![
            AgentId::KNOWLEDGE_MANAGER,
            AgentId::VISUALIZER,
            AgentId::PARETO,
        ],
        Intent::Deepen => vec![
            AgentId::ANALOGY,
            AgentId::FLASHCARDS,
            AgentId::CHEAT_SHEET,
            AgentId::RESOURCES,
            AgentId::PARETO,
            AgentId::QUIZ,
            AgentId::MNEMONIC,
        ],
        Intent::Unrecognized => vec![AgentId::FEEDBACK],
    }
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the fallback route of one intent.
    pub fn with_fallback(mut self, intent: Intent, agents: Vec<AgentId>) -> Self {
        self.fallback.insert(intent, agents);
        self
    }

    /// Every fallback route, for build-time validation.
    pub fn fallback_routes(&self) -> impl Iterator<Item = &[AgentId]> {
        self.fallback.values().map(Vec::as_slice)
    }

    /// Next active set for `state`.
    pub fn decide(&self, state: &LearningState) -> Vec<AgentId> {
        if !state.activated_agents.is_empty() {
            return Self::filter_activated(&state.activated_agents);
        }

        match state.detected_intent {
            Some(intent) => self
                .fallback
                .get(&intent)
                .cloned()
                .unwrap_or_else(|| vec![AgentId::FEEDBACK]),
            None => vec![AgentId::FEEDBACK],
        }
    }

    fn filter_activated(activated: &[AgentId]) -> Vec<AgentId> {
        let mut unique: Vec<AgentId> = Vec::with_capacity(activated.len());
        for id in activated {
            if !unique.contains(id) {
                unique.push(id.clone());
            }
        }

        let content: Vec<AgentId> = unique
            .iter()
            .filter(|id| !id.is_terminal_stage())
            .cloned()
            .collect();
        if !content.is_empty() {
            return content;
        }

        if unique.contains(&AgentId::EVALUATOR) {
            vec![AgentId::EVALUATOR]
        } else {
            vec![AgentId::FEEDBACK]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::intent::activation_for;

    fn with_intent(intent: Option<Intent>) -> LearningState {
        LearningState {
            detected_intent: intent,
            ..Default::default()
        }
    }

    fn with_activated(ids: &[AgentId]) -> LearningState {
        LearningState {
            activated_agents: ids.to_vec(),
            ..Default::default()
        }
    }

    #[test]
    fn test_activated_list_drops_terminal_stages() {
        let state = with_activated(&[
            AgentId::VISUALIZER,
            AgentId::EVALUATOR,
            AgentId::FEEDBACK,
        ]);
        assert_eq!(Router::new().decide(&state), vec![AgentId::VISUALIZER]);
    }

    #[test]
    fn test_activated_list_is_deduplicated_in_order() {
        let state = with_activated(&[
            AgentId::PARETO,
            AgentId::VISUALIZER,
            AgentId::PARETO,
        ]);
        assert_eq!(
            Router::new().decide(&state),
            vec![AgentId::PARETO, AgentId::VISUALIZER]
        );
    }

    #[test]
    fn test_only_terminal_stages_collapse_to_earliest() {
        let router = Router::new();
        assert_eq!(
            router.decide(&with_activated(&[AgentId::FEEDBACK])),
            vec![AgentId::FEEDBACK]
        );
        assert_eq!(
            router.decide(&with_activated(&[AgentId::FEEDBACK, AgentId::EVALUATOR])),
            vec![AgentId::EVALUATOR]
        );
    }

    #[test]
    fn test_activated_list_wins_over_intent() {
        let mut state = with_activated(&[AgentId::QUIZ]);
        state.detected_intent = Some(Intent::Visualize);
        assert_eq!(Router::new().decide(&state), vec![AgentId::QUIZ]);
    }

    #[test]
    fn test_fallback_table_by_intent() {
        let router = Router::new();
        assert_eq!(
            router.decide(&with_intent(Some(Intent::Evaluate))),
            vec![AgentId::EVALUATOR]
        );
        assert_eq!(
            router.decide(&with_intent(Some(Intent::Visualize))),
            vec![AgentId::VISUALIZER]
        );
        assert_eq!(router.decide(&with_intent(Some(Intent::Deepen))).len(), 7);
    }

    #[test]
    fn test_missing_or_unknown_intent_routes_to_feedback() {
        let router = Router::new();
        assert_eq!(router.decide(&with_intent(None)), vec![AgentId::FEEDBACK]);
        assert_eq!(
            router.decide(&with_intent(Some(Intent::Unrecognized))),
            vec![AgentId::FEEDBACK]
        );
    }

    #[test]
    fn test_decision_is_deterministic() {
        let router = Router::new();
        for intent in Intent::RECOGNIZED {
            let state = with_activated(&activation_for(intent));
            let first = router.decide(&state);
            assert!(!first.is_empty(), "{intent} routed nowhere");
            for _ in 0..5 {
                assert_eq!(router.decide(&state), first);
            }
        }
    }

    #[test]
    fn test_with_fallback_overrides_one_route() {
        let router = Router::new().with_fallback(Intent::Visualize, Vec::new());
        assert!(router.decide(&with_intent(Some(Intent::Visualize))).is_empty());
        assert_eq!(
            router.decide(&with_intent(Some(Intent::Evaluate))),
            vec![AgentId::EVALUATOR]
        );
    }
}
