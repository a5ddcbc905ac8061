//! # Swarm Orchestration
//!
//! Schedules the learning graph in supersteps.
//!
//! ## Flow
//!
//! ```text
//! Entry (intent_classifier) → Router → content nodes ∥ → evaluator → feedback → END
//! ```

pub mod coordinator;
pub mod events;
pub mod graph;
pub mod pipeline;
pub mod router;
pub mod stream;

pub use events::ProgressEvent;
pub use graph::{learning_graph, ExecutionGraph, GraphBuilder, END};
pub use pipeline::{Phase, Pipeline};
pub use router::Router;
pub use stream::ProgressStream;
