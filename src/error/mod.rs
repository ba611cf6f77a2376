//! # Error Module
//!
//! Error types for pipeline construction and collection.
//!
//! ## Design Principles
//! - **Per-element outcomes are not errors** - an element either passes the
//!   chain or is filtered out
//! - **Faults carry context** - which chunk failed and the panic message
//! - **Reserved vocabulary** - `StageError` names richer failure kinds that
//!   stages may grow into; no executor path produces them yet

use thiserror::Error;

/// Top-level pipeline error
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Stage panicked during sequential collection: {message}")]
    StagePanicked { message: String },

    #[error("Worker for chunk {chunk} panicked: {message}")]
    WorkerPanicked { chunk: usize, message: String },

    #[error("Stage error: {0}")]
    Stage(#[from] StageError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Failure kinds a stage could report.
///
/// Kept for callers that build richer stages on top of the pipeline. The
/// executors never construct these.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StageError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Processing failed: {0}")]
    ProcessingFailed(String),

    #[error("Backpressure exceeded (capacity {capacity})")]
    BackpressureExceeded { capacity: usize },
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Extract a readable message from a panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worker_error_includes_chunk_and_message() {
        let error = PipelineError::WorkerPanicked {
            chunk: 3,
            message: "index out of bounds".to_string(),
        };
        let message = error.to_string();
        assert!(message.contains("chunk 3"));
        assert!(message.contains("index out of bounds"));
    }

    #[test]
    fn stage_error_converts_into_pipeline_error() {
        let error: PipelineError = StageError::BackpressureExceeded { capacity: 64 }.into();
        assert!(matches!(error, PipelineError::Stage(_)));
        assert!(error.to_string().contains("capacity 64"));
    }

    #[test]
    fn panic_message_reads_str_and_string_payloads() {
        let boxed: Box<dyn std::any::Any + Send> = Box::new("static message");
        assert_eq!(panic_message(boxed.as_ref()), "static message");

        let boxed: Box<dyn std::any::Any + Send> = Box::new(String::from("owned message"));
        assert_eq!(panic_message(boxed.as_ref()), "owned message");

        let boxed: Box<dyn std::any::Any + Send> = Box::new(42_u32);
        assert_eq!(panic_message(boxed.as_ref()), "non-string panic payload");
    }
}
