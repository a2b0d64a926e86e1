//! Pipeline module.
//!
//! Runs a batch in a fixed order: normalize -> filter -> price -> dedupe ->
//! order. Filtering precedes pricing so blocked rows are never priced, and
//! deduplication follows pricing so duplicates compare on every field.

mod assembler;
mod builder;
pub mod progress;

pub use assembler::{AssembledTable, TableAssembler, deduplicate, order_missing_weight_last};
pub use builder::{Pipeline, PipelineBuilder};
pub use progress::{ClosureProgressReporter, ProcessingStage, ProgressReporter, ProgressUpdate};
