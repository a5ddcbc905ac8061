//! # Agent Harness
//!
//! Runs one agent inside its own task so that errors and panics both end in
//! the agent's fallback. Every path appends exactly one audit entry.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::Agent;
use crate::gateway::ModelGateway;
use crate::state::{AgentId, AuditEntry, LearningState, StateField, StateUpdate};

/// How a node's update was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    /// The agent body returned normally
    Completed,
    /// The body failed or panicked; the update is the agent's fallback
    Fallback,
}

/// The update a node contributes to its superstep
#[derive(Debug, Clone)]
pub struct NodeOutcome {
    pub agent: AgentId,
    pub status: NodeStatus,
    pub update: StateUpdate,
}

fn undeclared_write(agent: &dyn Agent, update: &StateUpdate) -> Option<StateField> {
    update
        .written_fields()
        .into_iter()
        .find(|field| *field != StateField::RoutingLog && !agent.writes().contains(field))
}

fn fallback_outcome(agent: &dyn Agent, state: &LearningState, reason: String) -> NodeOutcome {
    let update = agent
        .fallback(state)
        .with_audit(AuditEntry::new(agent.id(), "Failed (Fallback)", reason));
    NodeOutcome {
        agent: agent.id(),
        status: NodeStatus::Fallback,
        update,
    }
}

/// Run `agent` against a superstep snapshot. Never fails.
#[tracing::instrument(skip_all, fields(agent = %agent.id()))]
pub async fn run_agent(
    agent: Arc<dyn Agent>,
    state: Arc<LearningState>,
    gateway: Arc<ModelGateway>,
) -> NodeOutcome {
    let body = {
        let agent = Arc::clone(&agent);
        let state = Arc::clone(&state);
        tokio::spawn(async move { agent.execute(&state, &gateway).await })
    };

    match body.await {
        Ok(Ok(output)) => {
            if let Some(field) = undeclared_write(agent.as_ref(), &output.update) {
                tracing::error!(%field, "Agent wrote an undeclared field; using fallback");
                return fallback_outcome(
                    agent.as_ref(),
                    &state,
                    format!("undeclared write to {field}"),
                );
            }
            tracing::debug!(decision = %output.decision, "Agent completed");
            let update = output.update.with_audit(AuditEntry::new(
                agent.id(),
                output.decision,
                output.details,
            ));
            NodeOutcome {
                agent: agent.id(),
                status: NodeStatus::Completed,
                update,
            }
        }
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "Agent failed; using fallback");
            fallback_outcome(agent.as_ref(), &state, e.to_string())
        }
        Err(e) => {
            tracing::error!(error = %e, "Agent task panicked; using fallback");
            fallback_outcome(agent.as_ref(), &state, format!("task panicked: {e}"))
        }
    }
}
