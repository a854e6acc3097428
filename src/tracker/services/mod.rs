//! Orchestration services for the tracker.

mod pipeline;

pub use pipeline::{OperationError, OperationPipeline, OperationResult, PipelineConfig};
