//! Event type definitions for progress reporting.

use crate::core::config::ExecutionPolicy;
use serde::{Deserialize, Serialize};

/// All events emitted by a collection run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Run-level events
    Run(RunEvent),
    /// Per-worker events (parallel runs only)
    Worker(WorkerEvent),
}

/// Events for one terminal collection call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RunEvent {
    /// Collection has started
    Started {
        /// Number of input items, when the input reports an exact length
        total_items: Option<usize>,
        /// Policy the run actually executes under
        policy: ExecutionPolicy,
        /// Number of workers that will be launched (1 for sequential)
        workers: usize,
    },
    /// Collection completed
    Completed { summary: RunSummary },
}

/// Events for one parallel worker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum WorkerEvent {
    /// A worker was launched on its chunk
    Started { chunk: usize, len: usize },
    /// A worker finished its chunk
    Completed {
        chunk: usize,
        passed: usize,
        filtered: usize,
    },
    /// A stage panicked inside the worker
    Panicked { chunk: usize, message: String },
}

/// Summary of one collection run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// Items that produced an output value
    pub items_processed: usize,
    /// Items rejected by some stage
    pub items_filtered: usize,
    /// Total input items
    pub total_items: usize,
    /// Wall-clock duration in nanoseconds
    pub duration_ns: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_are_serializable() {
        let event = Event::Worker(WorkerEvent::Completed {
            chunk: 2,
            passed: 40,
            filtered: 10,
        });

        let json = serde_json::to_string(&event).unwrap();
        let deserialized: Event = serde_json::from_str(&json).unwrap();

        match deserialized {
            Event::Worker(WorkerEvent::Completed { chunk, passed, .. }) => {
                assert_eq!(chunk, 2);
                assert_eq!(passed, 40);
            }
            _ => panic!("Wrong event type"),
        }
    }

    #[test]
    fn run_summary_is_serializable() {
        let summary = RunSummary {
            items_processed: 5000,
            items_filtered: 5000,
            total_items: 10000,
            duration_ns: 123_456_789,
        };

        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("123456789"));
    }
}
