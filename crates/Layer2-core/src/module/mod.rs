//! Module system - plugin traits and execution context
//!
//! Every analysis module implements one of the group traits and receives an
//! [`ExecutionContext`] assembled by its pipeline for the duration of one
//! execution.

mod context;
mod traits;

pub use context::ExecutionContext;
pub use traits::{Auxiliary, Machinery, Processor, Reporter};

/// The shared results container accumulated across the processing pipeline
/// and consumed by signatures and reporting ("the fat map").
pub type ResultsMap = serde_json::Map<String, serde_json::Value>;
