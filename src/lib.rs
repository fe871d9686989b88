//! # jobpool
//!
//! A fixed-size worker pool draining a bounded job queue into a bounded
//! result queue, with a finalizer-driven shutdown protocol.
//!
//! ## Features
//!
//! - **Fixed worker set**: N threads race to drain a shared bounded job queue
//! - **Result stream**: every accepted job yields exactly one result, matched
//!   by caller-assigned identifier
//! - **Backpressure**: both queues are bounded; submission and publication
//!   block at capacity
//! - **Deadlock-resistant shutdown**: a dedicated finalizer closes the result
//!   queue only after the last worker exits, so callers may drain results
//!   concurrently with submission
//! - **Loud misuse faults**: double start, submit-after-close, and double
//!   close fail with errors instead of corrupting state
//!
//! ## Quick Start
//!
//! ```rust
//! use jobpool::prelude::*;
//!
//! # fn main() -> Result<()> {
//! // Two workers, queues bounded at 8 entries each
//! let pool = WorkerPool::new(2, 8, |_worker: usize, job: Job<u64>| {
//!     JobResult::success(job.id, format!("data {}", job.data))
//! })?;
//! pool.start()?;
//!
//! for id in 1..=5 {
//!     pool.submit(Job::new(id, id))?;
//! }
//!
//! // No further submissions; wait for the workers to drain out
//! pool.close()?;
//! pool.wait()?;
//!
//! for result in pool.results()? {
//!     println!("job {} -> {:?}", result.job_id, result.data);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Draining concurrently
//!
//! When the number of submitted jobs exceeds the queue capacity, results
//! MUST be drained concurrently with submission: workers block publishing
//! once the result queue fills, the job queue backs up behind them, and
//! submission stalls permanently. Take the stream before submitting and
//! consume it from another thread:
//!
//! ```rust
//! use jobpool::prelude::*;
//! use std::thread;
//!
//! # fn main() -> Result<()> {
//! let pool = std::sync::Arc::new(WorkerPool::new(2, 4, |_worker: usize, job: Job<u64>| {
//!     JobResult::success(job.id, job.data * 2)
//! })?);
//! pool.start()?;
//!
//! let results = pool.results()?;
//! let drain = thread::spawn(move || results.collect::<Vec<_>>());
//!
//! for id in 1..=32 {
//!     pool.submit(Job::new(id, id))?;
//! }
//! pool.close()?;
//! pool.wait()?;
//!
//! let collected = drain.join().expect("drain thread panicked");
//! assert_eq!(collected.len(), 32);
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration
//!
//! ```rust
//! use jobpool::prelude::*;
//! use std::time::Duration;
//!
//! # fn main() -> Result<()> {
//! let config = PoolConfig::new(4)
//!     .with_queue_capacity(256)
//!     .with_thread_name_prefix("ingest")
//!     .with_poll_interval(Duration::from_millis(20));
//!
//! let pool = WorkerPool::with_config(config, |_worker: usize, job: Job<String>| {
//!     JobResult::success(job.id, job.data.len())
//! })?;
//! pool.start()?;
//! # pool.shutdown()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Worker Statistics
//!
//! ```rust
//! use jobpool::prelude::*;
//!
//! # fn main() -> Result<()> {
//! # let pool = WorkerPool::new(2, 16, |_worker: usize, job: Job<u64>| {
//! #     JobResult::success(job.id, job.data)
//! # })?;
//! # pool.start()?;
//! # for id in 1..=10 {
//! #     pool.submit(Job::new(id, id))?;
//! # }
//! # pool.shutdown()?;
//! for (i, stat) in pool.get_stats().iter().enumerate() {
//!     println!("Worker {}: {} jobs processed", i, stat.get_jobs_processed());
//! }
//!
//! println!("Total jobs: {}", pool.total_jobs_processed());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod core;
pub mod pool;
pub mod prelude;
pub mod queue;

pub use crate::core::{Job, JobResult, PoolError, Processor, Result};
pub use pool::{PoolConfig, PoolState, ResultIter, WorkerPool, WorkerStats};
