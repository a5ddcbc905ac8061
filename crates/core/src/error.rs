//! # Errors
//!
//! Only configuration-class failures leave the core. Everything else is
//! absorbed by the model gateway or by the agent harness.

use thiserror::Error;

use crate::state::{AgentId, StateField};

pub type Result<T> = std::result::Result<T, GraphError>;

/// Fatal graph-configuration error.
///
/// Indicates a defect in the static graph or routing tables rather than a
/// runtime condition.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("router returned an empty node set")]
    EmptyRouting,

    #[error("router returned unknown node '{0}'")]
    UnknownNode(AgentId),

    #[error("node '{0}' is registered twice")]
    DuplicateNode(AgentId),

    #[error("graph has no entry node")]
    MissingEntry,

    #[error("edge {from} -> {to} references an unregistered node")]
    DanglingEdge { from: AgentId, to: AgentId },

    #[error("node '{0}' has no outgoing edge")]
    MissingEdge(AgentId),

    #[error("cycle detected through node '{0}'")]
    Cycle(AgentId),

    #[error("nodes '{first}' and '{second}' both write '{field}' in the same active set")]
    OverlappingWrites {
        first: AgentId,
        second: AgentId,
        field: StateField,
    },

    #[error("scheduler task failed: {0}")]
    Scheduler(String),
}

/// Failure of a single model backend attempt. Never surfaced past the gateway.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("backend returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("attempt timed out after {0} ms")]
    Timeout(u64),

    #[error("response had no text content")]
    EmptyResponse,

    #[error("no structured payload could be extracted")]
    Unparseable,

    #[error("missing credential: {0}")]
    MissingCredential(String),

    #[error("{0}")]
    Scripted(String),
}
