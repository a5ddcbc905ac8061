//! # Pathway Core
//!
//! The learning graph behind Pathway: a classifier routes each learner turn
//! to a set of specialist agents that run side by side, merge their results
//! through per-field reducers, and converge on an evaluator and a feedback
//! stage.
//!
//! ## Architecture
//!
//! - `state/` - shared state, partial updates and the reducers merging them
//! - `gateway/` - resilient model calls over an ordered backend stack
//! - `agents/` - the graph nodes and the harness that isolates their failures
//! - `swarm/` - router, graph topology and the superstep scheduler
//! - `memory/` - long-term learner memory
//! - `tools/` - source extraction
//! - `models` - provider and gateway configuration
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pathway_core::{InvocationRequest, LearningEngine};
//!
//! let engine = LearningEngine::from_env()?;
//! let state = engine.invoke(InvocationRequest::new("Explain closures")).await?;
//! println!("{:?}", state.final_output);
//! ```

pub mod agents;
pub mod engine;
pub mod error;
pub mod gateway;
pub mod memory;
pub mod models;
pub mod state;
pub mod swarm;
pub mod tools;

pub use engine::{InvocationRequest, LearningEngine};
pub use error::{GraphError, Result};
pub use gateway::{ModelCallSpec, ModelGateway, ScriptedBackend};
pub use models::{GatewayConfig, LlmProvider, ModelConfig};
pub use state::{AgentId, Intent, LearningState, StateUpdate};
pub use swarm::{ExecutionGraph, ProgressEvent, ProgressStream};
