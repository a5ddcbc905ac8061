//! # Progress Events
//!
//! What a streaming invocation yields: one `NodeCompleted` per finished node,
//! in completion order, then exactly one terminal event.

use crate::agents::NodeStatus;
use crate::error::GraphError;
use crate::state::{AgentId, LearningState, StateUpdate};

#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// A node finished and its update will be merged
    NodeCompleted {
        agent: AgentId,
        status: NodeStatus,
        update: StateUpdate,
    },
    /// The run reached `END`
    Finished { final_state: Box<LearningState> },
    /// The run stopped on a configuration error
    Failed { error: GraphError },
}

impl ProgressEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished { .. } | Self::Failed { .. })
    }

    /// The node this event reports on, if any.
    pub fn agent(&self) -> Option<&AgentId> {
        match self {
            Self::NodeCompleted { agent, .. } => Some(agent),
            _ => None,
        }
    }
}
