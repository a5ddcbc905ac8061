//! # Memory Module
//!
//! Long-term learner memory carried across invocations.
//!
//! ## Architecture
//!
//! ```text
//! feedback agent ── store_insight ──▶ StateUpdate.long_term_memory (map-merge)
//!                                              ↓
//! knowledge manager ◀── retrieve_context ── LearningState.long_term_memory
//! ```
//!
//! Persisting the map between sessions belongs to the embedding application;
//! it round-trips through `InvocationRequest::previous_state`.

pub mod learner_memory;

pub use learner_memory::{format_context, LearnerMemory, MemoryConfig, MemoryEntry};
