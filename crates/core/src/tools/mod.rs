//! # Tools
//!
//! Deterministic collaborators the graph consumes around the agents.
//!
//! - `source_extractor` - turns a link or book reference into source text

pub mod source_extractor;

pub use source_extractor::{
    ExtractedSource, NoSourceExtractor, PatternSourceExtractor, SourceExtractor,
};
