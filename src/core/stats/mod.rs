//! # Stats Module
//!
//! Counters for collection runs.
//!
//! ## Layout
//! - `PipelineStats` - shared atomic tallies, accumulated across runs until
//!   `reset`
//! - `StatsSnapshot` - plain copy of the tallies for one point in time, with
//!   derived metrics and a console report
//! - `RunCounters` - the local pass/filter counts an executor keeps while it
//!   runs, published in one batch at the end
//!
//! Counters are independent and never used to order other memory, so every
//! update is `Relaxed`. `total_items == items_processed + items_filtered`
//! holds after every publish because each publish adds both halves and
//! their sum.

use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

fn serialize_duration<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_f64(duration.as_secs_f64())
}

/// Pass/filter counts kept locally by one executor or worker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunCounters {
    /// Elements the chain produced a value for
    pub passed: usize,
    /// Elements some stage rejected
    pub filtered: usize,
}

impl RunCounters {
    /// Elements seen
    pub fn total(&self) -> usize {
        self.passed + self.filtered
    }

    /// Count one chain outcome
    #[inline]
    pub fn record(&mut self, passed: bool) {
        self.passed += usize::from(passed);
        self.filtered += usize::from(!passed);
    }

    /// Add another worker's counts to these
    pub fn merge(&mut self, other: RunCounters) {
        self.passed += other.passed;
        self.filtered += other.filtered;
    }
}

/// Shared statistics for a pipeline, safe for concurrent update.
#[derive(Debug, Default)]
pub struct PipelineStats {
    items_processed: AtomicUsize,
    items_filtered: AtomicUsize,
    errors: AtomicUsize,
    total_items: AtomicUsize,
    total_duration_ns: AtomicU64,
}

impl PipelineStats {
    /// Create zeroed stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one run's counters and elapsed time in a single batch.
    pub fn publish(&self, counters: &RunCounters, elapsed: Duration) {
        self.items_processed
            .fetch_add(counters.passed, Ordering::Relaxed);
        self.items_filtered
            .fetch_add(counters.filtered, Ordering::Relaxed);
        self.total_items
            .fetch_add(counters.total(), Ordering::Relaxed);
        self.add_duration(elapsed);
    }

    /// Add to the error tally.
    ///
    /// The executors never call this; it exists for stages that track their
    /// own failures against the pipeline's stats.
    pub fn record_errors(&self, count: usize) {
        self.errors.fetch_add(count, Ordering::Relaxed);
    }

    /// Add elapsed time to the accumulated duration
    pub fn add_duration(&self, elapsed: Duration) {
        let nanos = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);
        self.total_duration_ns.fetch_add(nanos, Ordering::Relaxed);
    }

    /// Items that produced an output value
    pub fn items_processed(&self) -> usize {
        self.items_processed.load(Ordering::Relaxed)
    }

    /// Items rejected by some stage
    pub fn items_filtered(&self) -> usize {
        self.items_filtered.load(Ordering::Relaxed)
    }

    /// Errors recorded via `record_errors`
    pub fn errors(&self) -> usize {
        self.errors.load(Ordering::Relaxed)
    }

    /// Input items seen
    pub fn total_items(&self) -> usize {
        self.total_items.load(Ordering::Relaxed)
    }

    /// Accumulated wall-clock time
    pub fn duration(&self) -> Duration {
        Duration::from_nanos(self.total_duration_ns.load(Ordering::Relaxed))
    }

    /// Copy the current tallies.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            items_processed: self.items_processed(),
            items_filtered: self.items_filtered(),
            errors: self.errors(),
            total_items: self.total_items(),
            duration: self.duration(),
        }
    }

    /// Zero every field in place so the collector can be reused.
    pub fn reset(&self) {
        self.items_processed.store(0, Ordering::Relaxed);
        self.items_filtered.store(0, Ordering::Relaxed);
        self.errors.store(0, Ordering::Relaxed);
        self.total_items.store(0, Ordering::Relaxed);
        self.total_duration_ns.store(0, Ordering::Relaxed);
    }
}

/// Point-in-time copy of pipeline statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub items_processed: usize,
    pub items_filtered: usize,
    pub errors: usize,
    pub total_items: usize,
    #[serde(serialize_with = "serialize_duration")]
    pub duration: Duration,
}

impl StatsSnapshot {
    /// Snapshot for a single run
    pub fn from_run(counters: &RunCounters, duration: Duration) -> Self {
        Self {
            items_processed: counters.passed,
            items_filtered: counters.filtered,
            errors: 0,
            total_items: counters.total(),
            duration,
        }
    }

    /// Fraction of input items that passed, in `0.0..=1.0`
    pub fn pass_rate(&self) -> Option<f64> {
        if self.total_items == 0 {
            return None;
        }
        Some(self.items_processed as f64 / self.total_items as f64)
    }

    /// Mean wall-clock time per input item
    pub fn average_latency(&self) -> Option<Duration> {
        if self.total_items == 0 {
            return None;
        }
        let per_item = self.duration.as_nanos() / self.total_items as u128;
        Some(Duration::from_nanos(u64::try_from(per_item).unwrap_or(u64::MAX)))
    }

    /// Input items per second
    pub fn throughput(&self) -> Option<f64> {
        let seconds = self.duration.as_secs_f64();
        if self.total_items == 0 || seconds <= 0.0 {
            return None;
        }
        Some(self.total_items as f64 / seconds)
    }
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Pipeline Statistics ===")?;
        writeln!(f, "Items processed: {}", self.items_processed)?;
        writeln!(f, "Items filtered: {}", self.items_filtered)?;
        writeln!(f, "Errors: {}", self.errors)?;

        if let Some(rate) = self.pass_rate() {
            writeln!(f, "Total input items: {}", self.total_items)?;
            writeln!(f, "Pass rate: {:.2}%", rate * 100.0)?;
        }

        writeln!(
            f,
            "Total duration: {:.4} ms",
            self.duration.as_secs_f64() * 1000.0
        )?;

        match (self.average_latency(), self.throughput()) {
            (Some(latency), Some(throughput)) => {
                writeln!(
                    f,
                    "Average latency: {} ns/item (per input)",
                    latency.as_nanos()
                )?;
                writeln!(f, "Throughput: {:.2} items/sec", throughput)?;
            }
            (Some(_), None) => {
                writeln!(f, "Average latency: < 1 ns/item (too fast to measure)")?;
                writeln!(f, "Throughput: > 1 billion items/sec")?;
            }
            _ => {}
        }

        Ok(())
    }
}
