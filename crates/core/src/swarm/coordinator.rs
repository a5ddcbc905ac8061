//! # Superstep Scheduler
//!
//! Runs an [`ExecutionGraph`] over one initial state.
//!
//! Each superstep snapshots the state, fans the active set out over a
//! `JoinSet`, and gathers node outcomes in completion order. Updates are
//! merged only after the whole superstep has finished, so nodes in the same
//! superstep never observe each other.

use std::sync::Arc;

use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::task::JoinSet;

use super::events::ProgressEvent;
use super::graph::ExecutionGraph;
use super::pipeline::{Phase, Pipeline};
use super::stream::ProgressStream;
use crate::agents::{run_agent, NodeOutcome};
use crate::error::{GraphError, Result};
use crate::state::{AgentId, LearningState};

impl ExecutionGraph {
    /// Run to completion and return the final state.
    pub async fn invoke(&self, initial: LearningState) -> Result<LearningState> {
        self.execute(initial, None).await
    }

    /// Run in the background, reporting each finished node.
    ///
    /// Must be called from within a tokio runtime.
    pub fn stream(self: &Arc<Self>, initial: LearningState) -> ProgressStream {
        let (tx, rx) = mpsc::unbounded_channel();

        let graph = Arc::clone(self);
        let worker_tx = tx.clone();
        let worker =
            tokio::spawn(async move { graph.execute(initial, Some(&worker_tx)).await });

        tokio::spawn(async move {
            let terminal = match worker.await {
                Ok(Ok(final_state)) => ProgressEvent::Finished {
                    final_state: Box::new(final_state),
                },
                Ok(Err(error)) => ProgressEvent::Failed { error },
                Err(e) => ProgressEvent::Failed {
                    error: GraphError::Scheduler(e.to_string()),
                },
            };
            // The consumer may already be gone.
            let _ = tx.send(terminal);
        });

        ProgressStream::new(rx)
    }

    #[tracing::instrument(skip_all, fields(learner = %initial.learner_id))]
    pub(crate) async fn execute(
        &self,
        initial: LearningState,
        events: Option<&UnboundedSender<ProgressEvent>>,
    ) -> Result<LearningState> {
        let mut state = initial;
        let mut pipeline = Pipeline::new(state.is_classified());
        let mut active: Vec<AgentId> = Vec::new();
        let mut outcomes: Vec<NodeOutcome> = Vec::new();

        if pipeline.phase == Phase::Routing {
            tracing::debug!("State already classified; skipping entry node");
        }

        while !pipeline.is_complete() {
            match pipeline.phase {
                Phase::Entry => {
                    active = vec![self.entry().clone()];
                    pipeline.advance();
                }
                Phase::Routing => {
                    active = if pipeline.needs_router() {
                        match self.route(&state) {
                            Ok(ids) => ids,
                            Err(error) => {
                                tracing::error!(%error, "Routing failed");
                                pipeline.fail();
                                return Err(error);
                            }
                        }
                    } else {
                        self.successors(&active)
                    };
                    pipeline.schedule(active.len());
                }
                Phase::Running => {
                    tracing::info!(
                        superstep = pipeline.superstep,
                        nodes = ?active.iter().map(AgentId::as_str).collect::<Vec<_>>(),
                        "Superstep started"
                    );
                    outcomes = match self.run_superstep(&active, &state, events).await {
                        Ok(outcomes) => outcomes,
                        Err(error) => {
                            pipeline.fail();
                            return Err(error);
                        }
                    };
                    pipeline.advance();
                }
                Phase::Merging => {
                    for outcome in outcomes.drain(..) {
                        state.apply(outcome.update);
                    }
                    pipeline.advance();
                }
                Phase::Terminal | Phase::Failed => break,
            }
        }

        tracing::info!(supersteps = pipeline.superstep, "Run finished");
        Ok(state)
    }

    /// SCATTER the active set, GATHER outcomes as they complete.
    async fn run_superstep(
        &self,
        active: &[AgentId],
        state: &LearningState,
        events: Option<&UnboundedSender<ProgressEvent>>,
    ) -> Result<Vec<NodeOutcome>> {
        let snapshot = Arc::new(state.clone());
        let mut join_set = JoinSet::new();
        for id in active {
            let agent = self.agent(id)?;
            join_set.spawn(run_agent(
                agent,
                Arc::clone(&snapshot),
                Arc::clone(&self.gateway),
            ));
        }

        let mut outcomes = Vec::with_capacity(active.len());
        while let Some(joined) = join_set.join_next().await {
            let outcome = joined.map_err(|e| GraphError::Scheduler(e.to_string()))?;
            tracing::debug!(agent = %outcome.agent, status = ?outcome.status, "Node finished");
            if let Some(tx) = events {
                // An unbounded send only fails once the consumer has left.
                let _ = tx.send(ProgressEvent::NodeCompleted {
                    agent: outcome.agent.clone(),
                    status: outcome.status,
                    update: outcome.update.clone(),
                });
            }
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::NodeStatus;
    use crate::gateway::{ModelGateway, ScriptedBackend};
    use crate::state::Intent;
    use crate::swarm::graph::learning_graph;
    use tokio_stream::StreamExt;

    fn offline_graph() -> Arc<ExecutionGraph> {
        Arc::new(learning_graph(Arc::new(ModelGateway::offline())).unwrap())
    }

    #[tokio::test]
    async fn test_unclassified_run_starts_at_entry() {
        let state = LearningState {
            learner_input: "Explain recursion".to_string(),
            ..Default::default()
        };
        let final_state = offline_graph().invoke(state).await.unwrap();

        assert_eq!(final_state.routing_log[0].agent, AgentId::INTENT_CLASSIFIER);
        assert_eq!(final_state.detected_intent, Some(Intent::Understand));
        assert_eq!(
            final_state.routing_log.last().map(|e| e.agent.clone()),
            Some(AgentId::FEEDBACK)
        );
        assert!(final_state.final_output.is_some());
    }

    #[tokio::test]
    async fn test_one_audit_entry_per_node_run() {
        let state = LearningState {
            learner_input: "Sorting".to_string(),
            detected_intent: Some(Intent::Scaffold),
            ..Default::default()
        };
        let final_state = offline_graph().invoke(state).await.unwrap();

        // scaffolder + personalization, then evaluator, then feedback
        assert_eq!(final_state.routing_log.len(), 4);
        let agents: Vec<_> = final_state.routing_log.iter().map(|e| e.agent.clone()).collect();
        assert_eq!(agents[2], AgentId::EVALUATOR);
        assert_eq!(agents[3], AgentId::FEEDBACK);
    }

    #[tokio::test]
    async fn test_unknown_activation_fails_the_run() {
        let state = LearningState {
            activated_agents: vec![AgentId::from("ghost")],
            ..Default::default()
        };
        let err = offline_graph().invoke(state).await.unwrap_err();
        assert_eq!(err, GraphError::UnknownNode(AgentId::from("ghost")));
    }

    #[tokio::test]
    async fn test_stream_reports_nodes_then_one_terminal_event() {
        let state = LearningState {
            learner_input: "Graphs".to_string(),
            detected_intent: Some(Intent::Visualize),
            ..Default::default()
        };
        let events: Vec<ProgressEvent> = offline_graph().stream(state).collect().await;

        let agents: Vec<_> = events.iter().filter_map(|e| e.agent().cloned()).collect();
        assert_eq!(
            agents,
            vec![AgentId::VISUALIZER, AgentId::EVALUATOR, AgentId::FEEDBACK]
        );
        assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);
        assert!(matches!(events.last(), Some(ProgressEvent::Finished { .. })));
    }

    #[tokio::test]
    async fn test_failing_backend_still_finishes_with_fallbacks() {
        let gateway = ModelGateway::new(vec![Arc::new(ScriptedBackend::failing("down"))]);
        let graph = Arc::new(learning_graph(Arc::new(gateway)).unwrap());
        let state = LearningState {
            learner_input: "Monads".to_string(),
            detected_intent: Some(Intent::Evaluate),
            ..Default::default()
        };

        let mut stream = graph.stream(state);
        let mut statuses = Vec::new();
        while let Some(event) = stream.next().await {
            if let ProgressEvent::NodeCompleted { status, .. } = event {
                statuses.push(status);
            }
        }
        // Failed calls resolve to gateway defaults, so agents still complete.
        assert_eq!(statuses, vec![NodeStatus::Completed, NodeStatus::Completed]);
    }
}
