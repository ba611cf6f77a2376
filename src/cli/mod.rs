//! # CLI Module
//!
//! Command-line front end for timing pipelines.
//!
//! ## Usage
//! ```bash
//! # Default sizes (1k, 10k, 100k, 1M), sequential
//! pipeline-bench bench
//!
//! # Custom sizes on 4 workers
//! pipeline-bench bench 5000 50000 --threads 4 --policy preserve-order
//!
//! # Sequential vs parallel on one size
//! pipeline-bench compare 1000000 --threads 8
//!
//! # JSON output
//! pipeline-bench bench --output json
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use console::{style, Term};
use fused_pipeline::core::config::default_parallelism;
use fused_pipeline::error::{PipelineError, Result};
use fused_pipeline::events::{Event, EventChannel, EventReceiver, RunEvent, WorkerEvent};
use fused_pipeline::{ExecutionPolicy, Pipeline, ResultSet};
use indicatif::{ProgressBar, ProgressStyle};
use std::thread;
use std::time::Instant;

const DEFAULT_SIZES: [usize; 4] = [1_000, 10_000, 100_000, 1_000_000];

/// Pipeline Bench - time fused filter/transform pipelines
#[derive(Parser, Debug)]
#[command(name = "pipeline-bench")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run filter(even) -> transform(x*x) -> filter(< 100000) at several sizes
    Bench {
        /// Input sizes to run (defaults to 1000 10000 100000 1000000)
        sizes: Vec<usize>,

        /// Worker threads for parallel policies
        #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
        threads: Option<u32>,

        /// Execution policy
        #[arg(short, long, default_value = "sequential")]
        policy: Policy,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,

        /// Show per-worker progress and the executor profile
        #[arg(short, long)]
        verbose: bool,
    },
    /// Compare sequential and parallel runs of filter(even) -> transform(x*2)
    Compare {
        /// Input size
        #[arg(default_value = "10000")]
        size: usize,

        /// Worker threads for the parallel run
        #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
        threads: Option<u32>,

        /// Policy for the parallel run
        #[arg(short, long, default_value = "preserve-order")]
        policy: Policy,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Policy {
    /// Single pass on the calling thread
    Sequential,
    /// Parallel, output in input order
    PreserveOrder,
    /// Parallel, output order unspecified
    Unordered,
}

impl From<Policy> for ExecutionPolicy {
    fn from(policy: Policy) -> Self {
        match policy {
            Policy::Sequential => ExecutionPolicy::Sequential,
            Policy::PreserveOrder => ExecutionPolicy::ParallelPreserveOrder,
            Policy::Unordered => ExecutionPolicy::ParallelUnordered,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable report with colors
    Pretty,
    /// JSON for scripting
    Json,
}

/// Run the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Bench {
            sizes,
            threads,
            policy,
            output,
            verbose,
        } => {
            let sizes = if sizes.is_empty() {
                DEFAULT_SIZES.to_vec()
            } else {
                sizes
            };
            run_bench(&sizes, resolve_threads(threads), policy.into(), output, verbose)
        }
        Commands::Compare {
            size,
            threads,
            policy,
            output,
        } => run_compare(size, resolve_threads(threads), policy.into(), output),
    }
}

fn resolve_threads(threads: Option<u32>) -> usize {
    threads.map_or_else(default_parallelism, |t| t as usize)
}

/// End of the `0..size` input range, rejecting sizes whose largest element
/// would overflow the widening `stage` of the benchmark pipeline.
fn input_bound(size: usize, stage: fn(i64) -> Option<i64>) -> Result<i64> {
    let upper = i64::try_from(size)
        .map_err(|_| PipelineError::Config(format!("size {} does not fit in i64", size)))?;
    if upper > 0 && stage(upper - 1).is_none() {
        return Err(PipelineError::Config(format!(
            "size {} overflows i64 in the benchmark stages",
            size
        )));
    }
    Ok(upper)
}

fn bench_pipeline(
    size: usize,
    threads: usize,
    policy: ExecutionPolicy,
    events: Option<fused_pipeline::events::EventSender>,
    verbose: bool,
) -> Result<(ResultSet<i64>, Option<String>)> {
    let mut pipeline = Pipeline::<i64>::new()
        .with_stats()
        .filter(|x| x % 2 == 0)
        .transform(|x| x * x)
        .filter(|x| *x < 100_000)
        .parallel(threads, policy);

    if verbose {
        pipeline = pipeline.with_profiler();
    }
    if let Some(sender) = events {
        pipeline = pipeline.with_events(sender);
    }

    let profiler = pipeline.profiler().cloned();
    let upper = input_bound(size, |x| x.checked_mul(x))?;
    let result = pipeline.try_collect(0..upper)?;

    Ok((result, profiler.map(|p| p.to_string())))
}

fn run_bench(
    sizes: &[usize],
    threads: usize,
    policy: ExecutionPolicy,
    output: OutputFormat,
    verbose: bool,
) -> Result<()> {
    let term = Term::stderr();
    let pretty = matches!(output, OutputFormat::Pretty);

    if pretty {
        term.write_line(&format!(
            "{} {}",
            style("Pipeline Benchmark").bold().cyan(),
            style(format!("({}, {} threads)", policy, threads)).dim()
        ))
        .ok();
    }

    let progress = if pretty {
        let pb = ProgressBar::new(sizes.iter().map(|s| *s as u64).sum());
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▓░"),
        );
        Some(pb)
    } else {
        None
    };

    let mut reports = Vec::with_capacity(sizes.len());

    for &size in sizes {
        let (sender, receiver) = EventChannel::new();
        let listener = progress
            .clone()
            .map(|pb| spawn_progress_listener(receiver, pb, verbose));

        if let Some(pb) = &progress {
            pb.set_message(format!("{} items", size));
        }

        let outcome = bench_pipeline(size, threads, policy, Some(sender), verbose);

        if let Some(handle) = listener {
            handle.join().ok();
        }
        let (result, profile) = outcome?;

        if let Some(pb) = &progress {
            pb.suspend(|| print_pretty_report(&term, size, &result, profile.as_deref()));
        }
        reports.push((size, result));
    }

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    if let OutputFormat::Json = output {
        let runs: Vec<_> = reports
            .iter()
            .map(|(size, result)| {
                serde_json::json!({
                    "size": size,
                    "result_size": result.len(),
                    "stats": result.stats(),
                    "pass_rate": result.stats().pass_rate(),
                    "average_latency_ns": result.stats().average_latency().map(|d| d.as_nanos() as u64),
                    "throughput": result.stats().throughput(),
                })
            })
            .collect();

        let document = serde_json::json!({
            "policy": policy,
            "threads": threads,
            "runs": runs,
        });
        println!("{:#}", document);
    }

    Ok(())
}

/// Advance the progress bar from run and worker events until the run's
/// sender is dropped.
fn spawn_progress_listener(
    receiver: EventReceiver,
    pb: ProgressBar,
    verbose: bool,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let mut workers = 1;
        for event in receiver.iter() {
            match event {
                Event::Run(RunEvent::Started { workers: count, .. }) => workers = count,
                Event::Worker(WorkerEvent::Completed {
                    chunk,
                    passed,
                    filtered,
                }) => {
                    pb.inc((passed + filtered) as u64);
                    if verbose {
                        pb.println(format!(
                            "    chunk {}: {} passed, {} filtered",
                            chunk, passed, filtered
                        ));
                    }
                }
                Event::Worker(WorkerEvent::Panicked { chunk, message }) => {
                    pb.println(format!("    chunk {} failed: {}", chunk, message));
                }
                Event::Run(RunEvent::Completed { summary }) if workers == 1 => {
                    pb.inc(summary.total_items as u64);
                }
                _ => {}
            }
        }
    })
}

fn print_pretty_report(term: &Term, size: usize, result: &ResultSet<i64>, profile: Option<&str>) {
    term.write_line("").ok();
    term.write_line(&format!(
        "{} {} items",
        style("===").dim(),
        style(size).bold()
    ))
    .ok();
    for line in result.stats_report().lines() {
        term.write_line(&format!("  {}", line)).ok();
    }
    term.write_line(&format!(
        "  Result size: {}",
        style(result.len()).cyan()
    ))
    .ok();

    if let Some(profile) = profile {
        for line in profile.lines() {
            term.write_line(&format!("  {}", style(line).dim())).ok();
        }
    }
}

fn run_compare(
    size: usize,
    threads: usize,
    policy: ExecutionPolicy,
    output: OutputFormat,
) -> Result<()> {
    if !policy.is_parallel() {
        return Err(PipelineError::Config(
            "compare needs a parallel policy (preserve-order or unordered)".to_string(),
        ));
    }

    let upper = input_bound(size, |x| x.checked_mul(2))?;

    let started = Instant::now();
    let sequential = Pipeline::<i64>::new()
        .filter(|x| x % 2 == 0)
        .transform(|x| x * 2)
        .try_collect(0..upper)?;
    let sequential_time = started.elapsed();

    let started = Instant::now();
    let parallel = Pipeline::<i64>::new()
        .filter(|x| x % 2 == 0)
        .transform(|x| x * 2)
        .parallel(threads, policy)
        .try_collect(0..upper)?;
    let parallel_time = started.elapsed();

    let matches = match policy {
        ExecutionPolicy::ParallelUnordered => {
            let mut left = sequential.as_slice().to_vec();
            let mut right = parallel.as_slice().to_vec();
            left.sort_unstable();
            right.sort_unstable();
            left == right
        }
        _ => sequential == parallel,
    };

    let speedup = if parallel_time.as_secs_f64() > 0.0 {
        sequential_time.as_secs_f64() / parallel_time.as_secs_f64()
    } else {
        f64::INFINITY
    };

    match output {
        OutputFormat::Pretty => {
            let term = Term::stdout();
            term.write_line(&format!(
                "{} {} items, {} threads",
                style("Sequential vs parallel:").bold().cyan(),
                size,
                threads
            ))
            .ok();
            term.write_line(&format!(
                "  Sequential: {:.3} ms",
                sequential_time.as_secs_f64() * 1000.0
            ))
            .ok();
            term.write_line(&format!(
                "  Parallel:   {:.3} ms ({})",
                parallel_time.as_secs_f64() * 1000.0,
                policy
            ))
            .ok();
            term.write_line(&format!("  Speedup:    {:.2}x", speedup)).ok();
            let verdict = if matches {
                style("identical").green().to_string()
            } else {
                style("MISMATCH").red().bold().to_string()
            };
            term.write_line(&format!("  Results:    {} ({} items)", verdict, parallel.len()))
                .ok();
        }
        OutputFormat::Json => {
            let document = serde_json::json!({
                "size": size,
                "threads": threads,
                "policy": policy,
                "sequential_ms": sequential_time.as_secs_f64() * 1000.0,
                "parallel_ms": parallel_time.as_secs_f64() * 1000.0,
                "speedup": speedup,
                "results_match": matches,
                "result_size": parallel.len(),
            });
            println!("{:#}", document);
        }
    }

    Ok(())
}
