//! # Events Module
//!
//! Progress reporting for collection runs.
//!
//! ## Design
//! Executors emit a handful of events per run through a channel: one when
//! the run starts, one per parallel worker launch and completion, and one
//! summary at the end. Nothing is emitted per element, so an attached
//! sender never touches the fused hot loop.
//!
//! ## Example
//! ```rust,ignore
//! let (sender, receiver) = EventChannel::new();
//!
//! std::thread::spawn(move || {
//!     for event in receiver.iter() {
//!         if let Event::Worker(WorkerEvent::Completed { chunk, passed, .. }) = event {
//!             println!("chunk {} produced {} items", chunk, passed);
//!         }
//!     }
//! });
//!
//! let result = Pipeline::<u32>::new()
//!     .filter(|x| x % 2 == 0)
//!     .parallel(4, ExecutionPolicy::ParallelPreserveOrder)
//!     .with_events(sender)
//!     .collect(0..10_000);
//! ```

mod channel;
mod types;

pub use channel::{EventChannel, EventReceiver, EventSender};
pub use types::*;
