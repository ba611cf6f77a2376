//! # Core Module
//!
//! The pipeline engine.
//!
//! ## Modules
//! - `chain` - Fuses filter/transform stages into one per-element function
//! - `config` - Execution policy and pipeline settings
//! - `executor` - Sequential and fork/join collection engines
//! - `pipeline` - The builder surface and `ResultSet`
//! - `stats` - Shared atomic counters and snapshots
//! - `profiler` - Name-keyed timing table for manual instrumentation

pub mod chain;
pub mod config;
pub mod executor;
pub mod pipeline;
pub mod profiler;
pub mod stats;

// Re-export commonly used types
pub use chain::{Chain, Identity};
pub use config::{ExecutionPolicy, PipelineConfig};
pub use pipeline::{Pipeline, ResultSet};
pub use profiler::{Profiler, StageProfile};
pub use stats::{PipelineStats, StatsSnapshot};
