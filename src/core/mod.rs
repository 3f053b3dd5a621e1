//! Core configuration and error types for the pipeline.

pub mod config;
pub mod errors;

pub use config::{ParallelPolicy, PipelineConfig};
pub use errors::{DetectionError, DocumentError, OcrError, PipelineError};
