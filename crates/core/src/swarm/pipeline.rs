//! # Scheduler Phases
//!
//! The state machine driving one invocation:
//!
//! ```text
//! Entry → Running → Merging → Routing → Running → Merging → Routing … → Terminal
//! ```
//!
//! The first `Routing` consults the router; later ones follow static edges.
//! A pre-classified state starts directly at `Routing`.

use serde::{Deserialize, Serialize};

/// Phase of the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// The entry node is about to run alone
    Entry,
    /// Choosing the next active set
    Routing,
    /// An active set is running
    Running,
    /// Folding the superstep's updates into the state
    Merging,
    /// No successors left
    Terminal,
    /// A configuration error stopped the run
    Failed,
}

/// The scheduler state machine
#[derive(Debug, Clone)]
pub struct Pipeline {
    pub phase: Phase,
    /// Supersteps started so far, the entry node included
    pub superstep: u32,
    routed: bool,
}

impl Pipeline {
    /// A fresh run. `classified` skips the entry node.
    pub fn new(classified: bool) -> Self {
        Self {
            phase: if classified { Phase::Routing } else { Phase::Entry },
            superstep: 0,
            routed: false,
        }
    }

    /// Whether the next `Routing` phase must ask the router.
    pub fn needs_router(&self) -> bool {
        !self.routed
    }

    /// Leave `Routing` with the chosen active set.
    pub fn schedule(&mut self, active: usize) {
        if self.phase != Phase::Routing {
            return;
        }
        self.routed = true;
        if active == 0 {
            self.phase = Phase::Terminal;
        } else {
            self.superstep += 1;
            self.phase = Phase::Running;
        }
    }

    /// Advance past `Entry`, `Running` or `Merging`.
    pub fn advance(&mut self) {
        self.phase = match self.phase {
            Phase::Entry => {
                self.superstep += 1;
                Phase::Running
            }
            Phase::Running => Phase::Merging,
            Phase::Merging => Phase::Routing,
            other => other,
        };
    }

    pub fn fail(&mut self) {
        self.phase = Phase::Failed;
    }

    pub fn is_complete(&self) -> bool {
        matches!(self.phase, Phase::Terminal | Phase::Failed)
    }

    pub fn is_success(&self) -> bool {
        self.phase == Phase::Terminal
    }
}
