//! # Pipeline Module
//!
//! The public surface: build a pipeline, chain stages, collect.
//!
//! ## Lifecycle
//! 1. **Construct** - `Pipeline::new()` or `Pipeline::from_source(&data)`
//! 2. **Chain** - `filter` and `transform` fuse stages into the chain
//! 3. **Configure** - stats, profiling, events, execution policy
//! 4. **Collect** - `collect(input)` consumes the pipeline and returns a
//!    `ResultSet`
//!
//! ## Parallelism
//! Parallel policies fork one scoped thread per chunk and join them all
//! before returning. Inputs without an exact length, a single effective
//! worker, or empty inputs run sequentially.
//!
//! ## Example
//! ```rust,ignore
//! let data: Vec<i32> = (0..10_000).collect();
//!
//! let result = Pipeline::from_source(&data)
//!     .with_stats()
//!     .filter(|x| x % 2 == 0)
//!     .transform(|x| x * 2)
//!     .parallel(4, ExecutionPolicy::ParallelPreserveOrder)
//!     .collect(data.iter().copied());
//!
//! println!("{}", result.stats_report());
//! ```

mod builder;
mod result;

pub use builder::Pipeline;
pub use result::ResultSet;
