//! # Fused Pipeline
//!
//! Composable filter/transform pipelines over in-memory sequences.
//!
//! ## Core Ideas
//! - **Fuse, don't buffer** - stages compose into one function per element,
//!   so a run makes a single pass with no intermediate containers
//! - **Count locally, publish once** - executors keep counters in locals and
//!   touch shared atomics once per run (or once per worker batch)
//! - **Fork/join on demand** - parallel runs spawn one scoped thread per
//!   contiguous chunk and join them all before returning
//!
//! ## Architecture
//! - `core` - chain fusion, executors, stats, profiler, pipeline builder
//! - `events` - Progress events over channels
//! - `error` - Error types

pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use crate::core::{
    Chain, ExecutionPolicy, Pipeline, PipelineConfig, PipelineStats, Profiler, ResultSet,
    StatsSnapshot,
};
pub use error::{PipelineError, Result, StageError};

/// Initialize tracing for the library
///
/// Reads the filter from `RUST_LOG`. Should be called once by the
/// application entry point; later calls leave the first subscriber in place.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
}
