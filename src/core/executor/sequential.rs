//! Single-pass sequential collection.

use super::{exact_len, RunContext};
use crate::core::chain::Chain;
use crate::core::pipeline::ResultSet;
use crate::core::stats::{RunCounters, StatsSnapshot};
use std::time::Instant;

/// Apply `chain` to every element of `input` in order.
///
/// Reserves half the input length up front when the length is known. The
/// shared stats (if any) see one batched update and one duration sample for
/// the whole pass.
pub(crate) fn execute<In, C, I>(chain: &C, input: I, context: &RunContext<'_>) -> ResultSet<C::Output>
where
    C: Chain<In>,
    I: Iterator<Item = In>,
{
    let capacity = exact_len(&input).map_or(0, |len| len / 2);
    let mut output = Vec::with_capacity(capacity);
    let mut counters = RunCounters::default();

    let started = Instant::now();
    for item in input {
        let value = chain.apply(item);
        counters.record(value.is_some());
        output.extend(value);
    }
    let elapsed = started.elapsed();

    context.publish(&counters, elapsed);
    context.record("sequential", elapsed);

    tracing::trace!(
        passed = counters.passed,
        filtered = counters.filtered,
        elapsed_ns = elapsed.as_nanos() as u64,
        "sequential pass complete"
    );

    ResultSet::new(output, StatsSnapshot::from_run(&counters, elapsed))
}
