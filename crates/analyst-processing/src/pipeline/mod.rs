//! Pipeline module.
//!
//! Runs profiling and cleaning end to end: profile the input, clean it
//! against the detected issues, then profile the result again.

mod builder;

pub use builder::{Pipeline, PipelineBuilder};
