//! Pipeline construction and the terminal collection call.

use super::ResultSet;
use crate::core::chain::{compose_filter, compose_transform, Chain, Filtered, Identity, Mapped};
use crate::core::config::{ExecutionPolicy, PipelineConfig};
use crate::core::executor::{self, parallel, sequential, RunContext, WorkerFault};
use crate::core::profiler::Profiler;
use crate::core::stats::PipelineStats;
use crate::error::{panic_message, PipelineError, Result};
use crate::events::{Event, EventSender, RunEvent, RunSummary};
use std::marker::PhantomData;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// A chain of stages plus the settings for collecting it.
///
/// `In` is the input element type and `C` the fused chain. Every stage and
/// setting call consumes the pipeline and returns a new one; nothing touches
/// data until `collect`.
pub struct Pipeline<In, C = Identity> {
    chain: C,
    config: PipelineConfig,
    stats: Option<Arc<PipelineStats>>,
    profiler: Option<Arc<Profiler>>,
    events: Option<EventSender>,
    _input: PhantomData<fn(In)>,
}

impl<In> Pipeline<In, Identity> {
    /// Create an empty pipeline over elements of type `In`
    pub fn new() -> Self {
        Self {
            chain: Identity,
            config: PipelineConfig::default(),
            stats: None,
            profiler: None,
            events: None,
            _input: PhantomData,
        }
    }

    /// Create an empty pipeline whose element type matches `source`.
    ///
    /// The source is only used for type inference; pass the data itself to
    /// `collect`.
    pub fn from_source<S>(_source: &S) -> Self
    where
        S: IntoIterator<Item = In>,
    {
        Self::new()
    }
}

impl<In> Default for Pipeline<In, Identity> {
    fn default() -> Self {
        Self::new()
    }
}

impl<In, C> Pipeline<In, C>
where
    C: Chain<In>,
{
    fn map_chain<D>(self, extend: impl FnOnce(C) -> D) -> Pipeline<In, D> {
        let Pipeline {
            chain,
            config,
            stats,
            profiler,
            events,
            ..
        } = self;

        Pipeline {
            chain: extend(chain),
            config,
            stats,
            profiler,
            events,
            _input: PhantomData,
        }
    }

    /// Keep only elements the predicate accepts
    pub fn filter<P>(self, predicate: P) -> Pipeline<In, Filtered<C, P>>
    where
        P: Fn(&C::Output) -> bool,
    {
        self.map_chain(|chain| compose_filter(chain, predicate))
    }

    /// Transform each element, possibly into a new type
    pub fn transform<F, U>(self, mapping: F) -> Pipeline<In, Mapped<C, F>>
    where
        F: Fn(C::Output) -> U,
    {
        self.map_chain(|chain| compose_transform(chain, mapping))
    }

    /// Collect statistics into a fresh `PipelineStats`
    pub fn with_stats(self) -> Self {
        self.with_shared_stats(Arc::new(PipelineStats::new()))
    }

    /// Collect statistics into a caller-owned `PipelineStats`.
    ///
    /// Runs accumulate into it until the caller calls `reset`.
    pub fn with_shared_stats(mut self, stats: Arc<PipelineStats>) -> Self {
        self.config.collect_stats = true;
        self.stats = Some(stats);
        self
    }

    /// Record executor timings into a fresh `Profiler`
    pub fn with_profiler(self) -> Self {
        self.with_shared_profiler(Arc::new(Profiler::new()))
    }

    /// Record executor timings into a caller-owned `Profiler`
    pub fn with_shared_profiler(mut self, profiler: Arc<Profiler>) -> Self {
        self.config.profile = true;
        self.profiler = Some(profiler);
        self
    }

    /// Report run and worker progress through `sender`
    pub fn with_events(mut self, sender: EventSender) -> Self {
        self.events = Some(sender);
        self
    }

    /// Run on up to `threads` workers; 0 is treated as 1
    pub fn parallel(mut self, threads: usize, policy: ExecutionPolicy) -> Self {
        self.config.parallelism = threads.max(1);
        self.config.policy = policy;
        self
    }

    /// Run on the calling thread
    pub fn sequential(mut self) -> Self {
        self.config.policy = ExecutionPolicy::Sequential;
        self
    }

    /// Replace every setting at once.
    ///
    /// `collect_stats` and `profile` attach fresh collectors if none are
    /// attached yet and detach them when false.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        if config.collect_stats {
            self.stats.get_or_insert_with(|| Arc::new(PipelineStats::new()));
        } else {
            self.stats = None;
        }
        if config.profile {
            self.profiler.get_or_insert_with(|| Arc::new(Profiler::new()));
        } else {
            self.profiler = None;
        }
        self.config = config;
        self
    }

    /// Current settings
    pub fn configuration(&self) -> &PipelineConfig {
        &self.config
    }

    /// Shared stats handle, when statistics are enabled
    pub fn stats(&self) -> Option<&Arc<PipelineStats>> {
        self.stats.as_ref()
    }

    /// Shared profiler handle, when profiling is enabled
    pub fn profiler(&self) -> Option<&Arc<Profiler>> {
        self.profiler.as_ref()
    }

    /// Whether the policy asks for worker threads
    pub fn is_parallel(&self) -> bool {
        self.config.policy.is_parallel()
    }

    /// Configured worker count
    pub fn parallelism(&self) -> usize {
        self.config.effective_parallelism()
    }

    /// Configured execution policy
    pub fn execution_policy(&self) -> ExecutionPolicy {
        self.config.policy
    }

    /// Run the pipeline on the calling thread, whatever the configured policy.
    ///
    /// Nothing crosses a thread here, so unlike `collect` the stages may
    /// capture `Cell`s and the elements may be `Rc`s.
    pub fn collect_sequential<I>(self, input: I) -> ResultSet<C::Output>
    where
        I: IntoIterator<Item = In>,
    {
        let Pipeline {
            chain,
            stats,
            profiler,
            events,
            ..
        } = self;

        let context = RunContext {
            stats: stats.as_deref(),
            profiler: profiler.as_deref(),
            events: events.as_ref(),
        };

        let input = input.into_iter();
        announce_start(&context, executor::exact_len(&input), ExecutionPolicy::Sequential, 1);
        let result = sequential::execute(&chain, input, &context);
        announce_completion(&context, &result);

        result
    }
}

fn announce_start(
    context: &RunContext<'_>,
    total_items: Option<usize>,
    policy: ExecutionPolicy,
    workers: usize,
) {
    tracing::debug!(?total_items, %policy, workers, "collecting pipeline");
    context.emit(Event::Run(RunEvent::Started {
        total_items,
        policy,
        workers,
    }));
}

fn announce_completion<T>(context: &RunContext<'_>, result: &ResultSet<T>) {
    let snapshot = result.stats();
    context.emit(Event::Run(RunEvent::Completed {
        summary: RunSummary {
            items_processed: snapshot.items_processed,
            items_filtered: snapshot.items_filtered,
            total_items: snapshot.total_items,
            duration_ns: u64::try_from(snapshot.duration.as_nanos()).unwrap_or(u64::MAX),
        },
    }));
}

impl<In, C> Pipeline<In, C>
where
    C: Chain<In> + Sync,
    C::Output: Send,
    In: Send,
{
    /// Run the pipeline over `input` and collect the output.
    ///
    /// Dispatches on the configured policy, so the chain must be shareable
    /// across workers; see `collect_sequential` for single-threaded data.
    /// A panic raised by a stage propagates to the caller. In parallel mode
    /// every worker is joined first, then the panic of the lowest-indexed
    /// failing chunk is resumed on this thread.
    pub fn collect<I>(self, input: I) -> ResultSet<C::Output>
    where
        I: IntoIterator<Item = In>,
    {
        match self.run(input) {
            Ok(result) => result,
            Err(fault) => panic::resume_unwind(fault.payload),
        }
    }

    /// Like `collect`, but stage panics become errors.
    pub fn try_collect<I>(self, input: I) -> Result<ResultSet<C::Output>>
    where
        I: IntoIterator<Item = In>,
    {
        match panic::catch_unwind(AssertUnwindSafe(|| self.run(input))) {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(fault)) => Err(PipelineError::WorkerPanicked {
                chunk: fault.chunk,
                message: panic_message(fault.payload.as_ref()),
            }),
            Err(payload) => Err(PipelineError::StagePanicked {
                message: panic_message(payload.as_ref()),
            }),
        }
    }

    fn run<I>(self, input: I) -> std::result::Result<ResultSet<C::Output>, WorkerFault>
    where
        I: IntoIterator<Item = In>,
    {
        let Pipeline {
            chain,
            config,
            stats,
            profiler,
            events,
            ..
        } = self;

        let context = RunContext {
            stats: stats.as_deref(),
            profiler: profiler.as_deref(),
            events: events.as_ref(),
        };

        let input = input.into_iter();
        let total_items = executor::exact_len(&input);
        let parallelism = config.effective_parallelism();
        let workers = match total_items {
            Some(total) if config.policy.is_parallel() && parallelism > 1 && total > 0 => {
                parallel::chunk_sizes(total, parallelism).len()
            }
            _ => 1,
        };
        let policy = if workers > 1 {
            config.policy
        } else {
            ExecutionPolicy::Sequential
        };

        announce_start(&context, total_items, policy, workers);

        let result = if workers > 1 {
            parallel::execute(&chain, input, parallelism, policy, &context)?
        } else {
            sequential::execute(&chain, input, &context)
        };

        announce_completion(&context, &result);
        Ok(result)
    }
}
