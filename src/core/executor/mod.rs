//! # Executor Module
//!
//! The two collection engines behind `Pipeline::collect`.
//!
//! ## Engines
//! - `sequential` - one pass on the calling thread
//! - `parallel` - one-shot fork/join over contiguous chunks, one scoped
//!   thread per chunk, merged in chunk order
//!
//! Both keep counters in locals and touch the shared `PipelineStats` once
//! per run.

pub(crate) mod parallel;
pub(crate) mod sequential;

pub use parallel::chunk_sizes;

use crate::core::profiler::Profiler;
use crate::core::stats::{PipelineStats, RunCounters};
use crate::error::panic_message;
use crate::events::{Event, EventSender};
use std::any::Any;
use std::fmt;
use std::time::Duration;

/// Borrowed view of the optional collaborators attached to a pipeline.
///
/// Shared by reference with every worker, so everything in it is `Sync`.
#[derive(Clone, Copy, Default)]
pub(crate) struct RunContext<'a> {
    pub stats: Option<&'a PipelineStats>,
    pub profiler: Option<&'a Profiler>,
    pub events: Option<&'a EventSender>,
}

impl RunContext<'_> {
    pub fn emit(&self, event: Event) {
        if let Some(events) = self.events {
            events.send(event);
        }
    }

    pub fn record(&self, stage: &str, elapsed: Duration) {
        if let Some(profiler) = self.profiler {
            profiler.record(stage, elapsed);
        }
    }

    /// Publish a finished run's counters; no-op when stats are disabled.
    pub fn publish(&self, counters: &RunCounters, elapsed: Duration) {
        if let Some(stats) = self.stats {
            stats.publish(counters, elapsed);
        }
    }
}

/// A panic captured from a parallel worker after every worker was joined.
pub(crate) struct WorkerFault {
    pub chunk: usize,
    pub payload: Box<dyn Any + Send + 'static>,
}

impl fmt::Debug for WorkerFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerFault")
            .field("chunk", &self.chunk)
            .field("message", &panic_message(self.payload.as_ref()))
            .finish()
    }
}

/// Input length when the iterator reports an exact size hint.
pub(crate) fn exact_len<I: Iterator>(iter: &I) -> Option<usize> {
    match iter.size_hint() {
        (lower, Some(upper)) if lower == upper => Some(lower),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_len_requires_matching_bounds() {
        let vec = vec![1, 2, 3];
        assert_eq!(exact_len(&vec.iter()), Some(3));
        assert_eq!(exact_len(&(0..10)), Some(10));
        assert_eq!(exact_len(&vec.iter().filter(|x| **x > 1)), None);
    }

    #[test]
    fn empty_context_is_inert() {
        let context = RunContext::default();

        context.publish(
            &RunCounters {
                passed: 1,
                filtered: 1,
            },
            Duration::from_millis(1),
        );
        context.record("stage", Duration::from_millis(1));
    }
}
