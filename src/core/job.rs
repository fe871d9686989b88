//! Job and result types plus the processing seam

use crate::core::error::PoolError;
use std::fmt;

/// A unit of work submitted to the pool.
///
/// The identifier is caller-assigned and expected to be unique per
/// submission; the pool echoes it back on the matching [`JobResult`] but
/// never validates it. The payload is opaque to the pool and immutable
/// once submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job<T> {
    /// Caller-assigned identifier, unique per submission
    pub id: u64,
    /// Opaque payload handed to the processor
    pub data: T,
}

impl<T> Job<T> {
    /// Create a new job with the given identifier and payload
    pub fn new(id: u64, data: T) -> Self {
        Self { id, data }
    }
}

/// The outcome of processing a single job.
///
/// Exactly one result is published per accepted job. `job_id` echoes the
/// originating [`Job`]; `data` and `error` are produced by the caller's
/// processor and passed through the pool unchanged.
#[derive(Debug)]
pub struct JobResult<R> {
    /// Identifier of the job this result belongs to
    pub job_id: u64,
    /// Payload produced by the processor, if any
    pub data: Option<R>,
    /// Error reported by the processor, if any
    pub error: Option<PoolError>,
}

impl<R> JobResult<R> {
    /// Create a successful result carrying a payload
    pub fn success(job_id: u64, data: R) -> Self {
        Self {
            job_id,
            data: Some(data),
            error: None,
        }
    }

    /// Create a failed result carrying an error
    pub fn failure(job_id: u64, error: PoolError) -> Self {
        Self {
            job_id,
            data: None,
            error: Some(error),
        }
    }

    /// Returns `true` if no error was reported
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Returns `true` if an error was reported
    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}

/// The processing function invoked by workers, one call per job.
///
/// Implementations map `(worker_id, job)` to a [`JobResult`]. The pool
/// makes no assumptions beyond the call eventually returning: it never
/// inspects, retries, or logs the produced result, and it applies no
/// timeout, so a call that never returns hangs its worker forever.
///
/// Any `Fn(usize, Job<T>) -> JobResult<R> + Send + Sync` is a processor,
/// so plain closures work:
///
/// ```rust
/// use jobpool::prelude::*;
///
/// # fn main() -> Result<()> {
/// let pool = WorkerPool::new(2, 8, |_worker: usize, job: Job<u32>| {
///     JobResult::success(job.id, job.data * 2)
/// })?;
/// # Ok(())
/// # }
/// ```
pub trait Processor<T, R>: Send + Sync {
    /// Process one job on the given worker
    fn process(&self, worker_id: usize, job: Job<T>) -> JobResult<R>;
}

impl<T, R, F> Processor<T, R> for F
where
    F: Fn(usize, Job<T>) -> JobResult<R> + Send + Sync,
{
    fn process(&self, worker_id: usize, job: Job<T>) -> JobResult<R> {
        self(worker_id, job)
    }
}

impl<T, R> fmt::Debug for dyn Processor<T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Processor")
    }
}
