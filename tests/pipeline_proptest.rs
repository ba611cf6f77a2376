//! Property-based tests for pipeline collection
//!
//! These tests check that every execution policy agrees with a naive
//! per-element evaluation of the same stages:
//! - Counters always add up
//! - Ordered parallel runs equal sequential runs exactly
//! - Unordered parallel runs produce the same multiset

use fused_pipeline::{ExecutionPolicy, Pipeline};
use proptest::prelude::*;

fn keep(x: &i64) -> bool {
    x.rem_euclid(3) != 0
}

fn square_minus(x: i64) -> i64 {
    x * x - 7
}

fn small(x: &i64) -> bool {
    *x < 2_000
}

/// Apply the stages one at a time without fusion
fn naive(input: &[i64]) -> Vec<i64> {
    input
        .iter()
        .filter_map(|&x| {
            if keep(&x) {
                let y = square_minus(x);
                if small(&y) {
                    Some(y)
                } else {
                    None
                }
            } else {
                None
            }
        })
        .collect()
}

fn input_strategy() -> impl Strategy<Value = Vec<i64>> {
    prop::collection::vec(-1_000i64..1_000, 0..400)
}

fn policy_strategy() -> impl Strategy<Value = ExecutionPolicy> {
    prop_oneof![
        Just(ExecutionPolicy::Sequential),
        Just(ExecutionPolicy::ParallelPreserveOrder),
        Just(ExecutionPolicy::ParallelUnordered),
    ]
}

proptest! {
    #[test]
    fn counters_add_up(input in input_strategy(), threads in 0usize..9, policy in policy_strategy()) {
        let pipeline = Pipeline::<i64>::new()
            .with_stats()
            .filter(keep)
            .transform(square_minus)
            .filter(small)
            .parallel(threads, policy);
        let stats = pipeline.stats().cloned().unwrap();

        let result = pipeline.collect(input.clone());

        prop_assert_eq!(stats.items_processed() + stats.items_filtered(), stats.total_items());
        prop_assert_eq!(stats.total_items(), input.len());
        prop_assert_eq!(result.stats().items_processed, result.len());
        prop_assert_eq!(result.stats().total_items, input.len());
    }

    #[test]
    fn fused_chain_matches_naive(input in input_strategy()) {
        let result = Pipeline::<i64>::new()
            .filter(keep)
            .transform(square_minus)
            .filter(small)
            .collect(input.clone());

        prop_assert_eq!(result.into_vec(), naive(&input));
    }

    #[test]
    fn ordered_parallel_equals_sequential(input in input_strategy(), threads in 1usize..9) {
        let sequential = Pipeline::<i64>::new()
            .filter(keep)
            .transform(square_minus)
            .collect(input.clone());

        let parallel = Pipeline::<i64>::new()
            .filter(keep)
            .transform(square_minus)
            .parallel(threads, ExecutionPolicy::ParallelPreserveOrder)
            .collect(input);

        prop_assert_eq!(parallel.stats().items_processed, sequential.stats().items_processed);
        prop_assert_eq!(parallel.stats().items_filtered, sequential.stats().items_filtered);
        prop_assert_eq!(parallel.into_vec(), sequential.into_vec());
    }

    #[test]
    fn unordered_parallel_is_a_permutation(input in input_strategy(), threads in 1usize..9) {
        let mut sequential = Pipeline::<i64>::new()
            .transform(square_minus)
            .filter(small)
            .collect(input.clone())
            .into_vec();

        let mut unordered = Pipeline::<i64>::new()
            .transform(square_minus)
            .filter(small)
            .parallel(threads, ExecutionPolicy::ParallelUnordered)
            .collect(input)
            .into_vec();

        sequential.sort_unstable();
        unordered.sort_unstable();
        prop_assert_eq!(unordered, sequential);
    }

    #[test]
    fn single_thread_matches_sequential(input in input_strategy(), policy in policy_strategy()) {
        let sequential = Pipeline::<i64>::new()
            .filter(keep)
            .collect(input.clone());

        let single = Pipeline::<i64>::new()
            .filter(keep)
            .parallel(1, policy)
            .collect(input);

        prop_assert_eq!(single.stats().items_processed, sequential.stats().items_processed);
        prop_assert_eq!(single.stats().items_filtered, sequential.stats().items_filtered);
        prop_assert_eq!(single.into_vec(), sequential.into_vec());
    }
}
