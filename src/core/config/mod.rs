//! # Config Module
//!
//! Execution settings fixed when the pipeline is built and read-only while
//! it runs.

use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::thread;

/// How the terminal collection call runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ExecutionPolicy {
    /// Single pass on the calling thread (default)
    #[default]
    Sequential,
    /// Fork-join over contiguous chunks, output in input order
    ParallelPreserveOrder,
    /// Fork-join over contiguous chunks, output is some permutation of the
    /// ordered result
    ParallelUnordered,
}

impl ExecutionPolicy {
    /// Whether this policy asks for worker threads
    pub fn is_parallel(self) -> bool {
        !matches!(self, ExecutionPolicy::Sequential)
    }
}

impl std::fmt::Display for ExecutionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionPolicy::Sequential => write!(f, "sequential"),
            ExecutionPolicy::ParallelPreserveOrder => write!(f, "parallel (preserve order)"),
            ExecutionPolicy::ParallelUnordered => write!(f, "parallel (unordered)"),
        }
    }
}

/// Configuration carried by a pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Execution policy for `collect`
    pub policy: ExecutionPolicy,
    /// Requested worker count; 0 is treated as 1
    pub parallelism: usize,
    /// Publish counters to a shared `PipelineStats`
    pub collect_stats: bool,
    /// Record executor timings into a `Profiler`
    pub profile: bool,
}

impl PipelineConfig {
    /// Worker count after normalizing 0 to 1.
    pub fn effective_parallelism(&self) -> usize {
        self.parallelism.max(1)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            policy: ExecutionPolicy::Sequential,
            parallelism: default_parallelism(),
            collect_stats: false,
            profile: false,
        }
    }
}

/// Number of hardware threads, or 1 when it cannot be determined.
pub fn default_parallelism() -> usize {
    thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_to_sequential() {
        let config = PipelineConfig::default();

        assert_eq!(config.policy, ExecutionPolicy::Sequential);
        assert!(config.parallelism >= 1);
        assert!(!config.collect_stats);
        assert!(!config.profile);
    }

    #[test]
    fn zero_parallelism_is_normalized() {
        let config = PipelineConfig {
            parallelism: 0,
            ..PipelineConfig::default()
        };

        assert_eq!(config.effective_parallelism(), 1);
    }

    #[test]
    fn only_parallel_policies_are_parallel() {
        assert!(!ExecutionPolicy::Sequential.is_parallel());
        assert!(ExecutionPolicy::ParallelPreserveOrder.is_parallel());
        assert!(ExecutionPolicy::ParallelUnordered.is_parallel());
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = PipelineConfig {
            policy: ExecutionPolicy::ParallelUnordered,
            parallelism: 8,
            collect_stats: true,
            profile: false,
        };

        let json = serde_json::to_string(&config).unwrap();
        let restored: PipelineConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(restored, config);
    }
}
