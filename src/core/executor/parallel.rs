//! Fork/join collection over contiguous chunks.
//!
//! The input is copied into a buffer, split into `threads` contiguous chunks
//! whose lengths differ by at most one, and each chunk is handed to its own
//! scoped thread. Workers share only the chain (by reference) and nothing
//! mutable; their counters are summed after the join. Outputs are merged in
//! chunk order for both parallel policies.

use super::{sequential, RunContext, WorkerFault};
use crate::core::chain::Chain;
use crate::core::config::ExecutionPolicy;
use crate::core::pipeline::ResultSet;
use crate::core::stats::{RunCounters, StatsSnapshot};
use crate::error::panic_message;
use crate::events::{Event, WorkerEvent};
use std::thread;
use std::time::Instant;

/// Output and counts produced by one worker
struct ChunkOutput<T> {
    values: Vec<T>,
    counters: RunCounters,
}

/// Lengths of the chunks `total` items split into across `threads` workers.
///
/// Yields `min(threads, total)` chunks, never fewer than one, so no chunk is
/// empty unless the input is. The first `total % n` chunks carry one extra
/// element.
pub fn chunk_sizes(total: usize, threads: usize) -> Vec<usize> {
    let workers = threads.min(total).max(1);
    let base = total / workers;
    let remainder = total % workers;
    (0..workers)
        .map(|index| base + usize::from(index < remainder))
        .collect()
}

/// Split `buffer` into owned contiguous chunks of the given lengths.
fn partition<T>(mut buffer: Vec<T>, sizes: &[usize]) -> Vec<Vec<T>> {
    let mut chunks = Vec::with_capacity(sizes.len());
    // Peel chunks off the back so each element is moved once.
    for &size in sizes.iter().skip(1).rev() {
        let at = buffer.len() - size;
        chunks.push(buffer.split_off(at));
    }
    chunks.push(buffer);
    chunks.reverse();
    chunks
}

fn run_chunk<In, C>(
    chain: &C,
    index: usize,
    chunk: Vec<In>,
    context: &RunContext<'_>,
) -> ChunkOutput<C::Output>
where
    C: Chain<In>,
{
    context.emit(Event::Worker(WorkerEvent::Started {
        chunk: index,
        len: chunk.len(),
    }));

    let started = Instant::now();
    let mut values = Vec::with_capacity(chunk.len());
    let mut counters = RunCounters::default();

    for item in chunk {
        let value = chain.apply(item);
        counters.record(value.is_some());
        values.extend(value);
    }

    context.record("parallel.worker", started.elapsed());
    context.emit(Event::Worker(WorkerEvent::Completed {
        chunk: index,
        passed: counters.passed,
        filtered: counters.filtered,
    }));
    tracing::trace!(chunk = index, passed = counters.passed, filtered = counters.filtered, "worker finished");

    ChunkOutput { values, counters }
}

/// Run `chain` over `input` on up to `parallelism` scoped worker threads.
///
/// Falls back to the sequential engine when the input is empty or only one
/// worker would be launched. A panicking stage fails the whole run: every
/// worker is still joined, then the fault of the lowest-indexed failed chunk
/// is returned for the caller to re-raise.
pub(crate) fn execute<In, C, I>(
    chain: &C,
    input: I,
    parallelism: usize,
    policy: ExecutionPolicy,
    context: &RunContext<'_>,
) -> Result<ResultSet<C::Output>, WorkerFault>
where
    C: Chain<In> + Sync,
    C::Output: Send,
    In: Send,
    I: Iterator<Item = In>,
{
    let buffer: Vec<In> = input.collect();
    let total = buffer.len();
    let sizes = chunk_sizes(total, parallelism);

    if total == 0 || sizes.len() == 1 {
        tracing::debug!(total, parallelism, "single worker, running sequentially");
        return Ok(sequential::execute(chain, buffer.into_iter(), context));
    }

    tracing::debug!(total, workers = sizes.len(), %policy, "launching parallel workers");
    let chunks = partition(buffer, &sizes);

    let started = Instant::now();
    let joined: Vec<thread::Result<ChunkOutput<C::Output>>> = thread::scope(|scope| {
        let handles: Vec<_> = chunks
            .into_iter()
            .enumerate()
            .map(|(index, chunk)| scope.spawn(move || run_chunk(chain, index, chunk, context)))
            .collect();

        handles.into_iter().map(|handle| handle.join()).collect()
    });
    let elapsed = started.elapsed();

    let mut outputs = Vec::with_capacity(joined.len());
    let mut first_fault: Option<WorkerFault> = None;

    for (index, outcome) in joined.into_iter().enumerate() {
        match outcome {
            Ok(output) => outputs.push(output),
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::warn!(chunk = index, %message, "pipeline worker panicked");
                context.emit(Event::Worker(WorkerEvent::Panicked {
                    chunk: index,
                    message,
                }));
                if first_fault.is_none() {
                    first_fault = Some(WorkerFault {
                        chunk: index,
                        payload,
                    });
                }
            }
        }
    }

    if let Some(fault) = first_fault {
        return Err(fault);
    }

    let merge_started = Instant::now();
    let mut counters = RunCounters::default();
    let capacity = outputs.iter().map(|output| output.values.len()).sum();
    let mut merged = Vec::with_capacity(capacity);

    // ParallelUnordered only promises a permutation of the ordered result,
    // so both policies share the deterministic chunk-order merge.
    for output in outputs {
        counters.merge(output.counters);
        merged.extend(output.values);
    }
    context.record("parallel.merge", merge_started.elapsed());

    context.publish(&counters, elapsed);
    context.record("parallel", elapsed);

    Ok(ResultSet::new(merged, StatsSnapshot::from_run(&counters, elapsed)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::chain::{compose_filter, compose_transform, Identity};
    use crate::core::stats::PipelineStats;
    use crate::events::EventChannel;
    use std::panic::{catch_unwind, AssertUnwindSafe};

    #[test]
    fn chunk_sizes_spread_remainder_over_first_chunks() {
        assert_eq!(chunk_sizes(10, 3), vec![4, 3, 3]);
        assert_eq!(chunk_sizes(11, 3), vec![4, 4, 3]);
        assert_eq!(chunk_sizes(9, 3), vec![3, 3, 3]);
    }

    #[test]
    fn chunk_sizes_clamp_to_item_count() {
        assert_eq!(chunk_sizes(3, 8), vec![1, 1, 1]);
        assert_eq!(chunk_sizes(0, 4), vec![0]);
        assert_eq!(chunk_sizes(5, 0), vec![5]);
    }

    #[test]
    fn partition_keeps_contiguous_order() {
        let chunks = partition((0..10).collect::<Vec<_>>(), &chunk_sizes(10, 3));

        assert_eq!(
            chunks,
            vec![vec![0, 1, 2, 3], vec![4, 5, 6], vec![7, 8, 9]]
        );
    }

    #[test]
    fn matches_sequential_order() {
        let chain = compose_transform(compose_filter(Identity, |x: &i32| *x % 2 == 0), |x: i32| x * 2);

        let sequential = sequential::execute(&chain, 0..1000, &RunContext::default());
        let parallel = execute(
            &chain,
            0..1000,
            4,
            ExecutionPolicy::ParallelPreserveOrder,
            &RunContext::default(),
        )
        .unwrap();

        assert_eq!(parallel.len(), 500);
        assert_eq!(parallel.as_slice(), sequential.as_slice());
        assert_eq!(parallel.stats().items_processed, 500);
        assert_eq!(parallel.stats().items_filtered, 500);
    }

    #[test]
    fn publishes_summed_counters_after_join() {
        let chain = compose_filter(Identity, |x: &u64| *x % 4 == 0);
        let stats = PipelineStats::new();
        let context = RunContext {
            stats: Some(&stats),
            ..RunContext::default()
        };

        let result = execute(&chain, 0..10_000_u64, 7, ExecutionPolicy::ParallelUnordered, &context)
            .unwrap();

        assert_eq!(result.len(), 2500);
        assert_eq!(stats.items_processed(), 2500);
        assert_eq!(stats.items_filtered(), 7500);
        assert_eq!(stats.total_items(), 10_000);
    }

    #[test]
    fn emits_one_start_and_completion_per_chunk() {
        let chain = Identity;
        let (sender, receiver) = EventChannel::new();
        let context = RunContext {
            events: Some(&sender),
            ..RunContext::default()
        };

        let _ = execute(&chain, 0..100_i32, 4, ExecutionPolicy::ParallelPreserveOrder, &context);

        let events = receiver.drain();
        let started = events
            .iter()
            .filter(|e| matches!(e, Event::Worker(WorkerEvent::Started { .. })))
            .count();
        let completed = events
            .iter()
            .filter(|e| matches!(e, Event::Worker(WorkerEvent::Completed { .. })))
            .count();

        assert_eq!(started, 4);
        assert_eq!(completed, 4);
    }

    #[test]
    fn worker_panic_is_captured_after_join() {
        let chain = compose_transform(Identity, |x: i32| {
            if x == 75 {
                panic!("bad element {}", x);
            }
            x
        });
        let stats = PipelineStats::new();
        let context = RunContext {
            stats: Some(&stats),
            ..RunContext::default()
        };

        let outcome = catch_unwind(AssertUnwindSafe(|| {
            execute(&chain, 0..100, 4, ExecutionPolicy::ParallelPreserveOrder, &context)
        }));

        let fault = match outcome {
            Ok(Err(fault)) => fault,
            _ => panic!("expected a captured worker fault"),
        };
        assert_eq!(fault.chunk, 3);
        assert_eq!(panic_message(fault.payload.as_ref()), "bad element 75");
        assert_eq!(stats.total_items(), 0);
    }
}
