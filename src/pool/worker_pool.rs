//! Worker pool implementation

use crate::core::{Job, JobResult, PoolError, Processor, Result};
use crate::pool::worker::{Worker, WorkerStats};
use crate::queue::{BoundedQueue, QueueError, DEFAULT_POLL_INTERVAL};
use crossbeam_utils::sync::WaitGroup;
use parking_lot::{Condvar, Mutex, RwLock};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Configuration for a worker pool
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Number of worker threads.
    ///
    /// Used verbatim and deliberately not validated: a pool with zero
    /// workers has no consumers, so submissions stall permanently once the
    /// job queue fills. That is a caller error, not a pool fault.
    pub workers: usize,
    /// Capacity of the job queue and of the result queue (same bound for
    /// each). Callers submitting more jobs than this before draining
    /// results must drain concurrently or the pool stalls (see
    /// [`WorkerPool::results`]).
    pub queue_capacity: usize,
    /// Thread name prefix
    pub thread_name_prefix: String,
    /// Interval at which workers and result consumers re-check a quiet
    /// queue for the close signal. Default: 100ms
    ///
    /// Shorter intervals improve shutdown latency but increase wakeups.
    pub poll_interval: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: thread::available_parallelism().map(|n| n.get()).unwrap_or(1),
            queue_capacity: 1024,
            thread_name_prefix: "worker".to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl PoolConfig {
    /// Create a new configuration with the specified number of workers
    #[must_use]
    pub fn new(workers: usize) -> Self {
        Self {
            workers,
            ..Default::default()
        }
    }

    /// Set the shared capacity of the job and result queues
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Set thread name prefix
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_thread_name_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    /// Set the queue poll interval.
    ///
    /// # Panics
    ///
    /// Panics if interval is zero.
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        assert!(!interval.is_zero(), "poll interval must be non-zero");
        self.poll_interval = interval;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.queue_capacity == 0 {
            return Err(PoolError::invalid_config(
                "queue_capacity",
                "Queue capacity must be greater than 0",
            ));
        }
        if self.poll_interval.is_zero() {
            return Err(PoolError::invalid_config(
                "poll_interval",
                "Poll interval must be non-zero",
            ));
        }
        Ok(())
    }
}

/// Lifecycle state of a [`WorkerPool`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolState {
    /// Constructed but not yet started
    Unstarted,
    /// Workers running, submissions accepted
    Running,
    /// Submissions closed, workers draining the job queue
    Draining,
    /// All workers exited and the result queue is closed
    Closed,
}

/// Single-fire completion signal.
///
/// Fired exactly once by the finalizer after the last worker has exited
/// and the result queue has been closed.
#[derive(Debug, Default)]
struct Completion {
    fired: Mutex<bool>,
    cond: Condvar,
}

impl Completion {
    fn fire(&self) {
        let mut fired = self.fired.lock();
        *fired = true;
        self.cond.notify_all();
    }

    fn wait(&self) {
        let mut fired = self.fired.lock();
        while !*fired {
            self.cond.wait(&mut fired);
        }
    }

    fn is_fired(&self) -> bool {
        *self.fired.lock()
    }
}

/// A fixed-size pool of worker threads draining a bounded job queue into a
/// bounded result queue.
///
/// The pool is the sole owner of both queues; workers and callers interact
/// with them only through pool operations. For every job accepted by
/// [`submit`](WorkerPool::submit), exactly one [`JobResult`] with the
/// matching identifier eventually appears on the result stream, provided
/// the caller drains it.
///
/// # Shutdown protocol
///
/// [`close`](WorkerPool::close) closes the job queue, which is the sole
/// worker termination signal. Workers drain the remaining jobs and exit.
/// A dedicated finalizer thread waits for the last worker, then closes the
/// result queue and fires the completion signal observed by
/// [`wait`](WorkerPool::wait). Because the finalizer performs the close
/// rather than the waiting caller, a caller may drain
/// [`results`](WorkerPool::results) from another thread before ever
/// calling `wait()` without racing the close.
///
/// # Ordering
///
/// Workers race for jobs: results need not arrive in submission order.
/// The only cross-job guarantee is the one-to-one job/result
/// correspondence by identifier.
///
/// # Example
///
/// ```rust
/// use jobpool::prelude::*;
///
/// # fn main() -> Result<()> {
/// let pool = WorkerPool::new(2, 8, |_worker: usize, job: Job<u64>| {
///     JobResult::success(job.id, format!("data {}", job.data))
/// })?;
/// pool.start()?;
///
/// for id in 1..=5 {
///     pool.submit(Job::new(id, id))?;
/// }
///
/// pool.close()?;
/// pool.wait()?;
///
/// let results: Vec<_> = pool.results()?.collect();
/// assert_eq!(results.len(), 5);
/// # Ok(())
/// # }
/// ```
pub struct WorkerPool<T, R> {
    config: PoolConfig,
    processor: Arc<dyn Processor<T, R>>,
    jobs: Arc<BoundedQueue<Job<T>>>,
    results: Arc<BoundedQueue<JobResult<R>>>,
    workers: RwLock<Vec<Worker>>,
    worker_stats: RwLock<Vec<Arc<WorkerStats>>>,
    finalizer: Mutex<Option<thread::JoinHandle<()>>>,
    completion: Arc<Completion>,
    running: AtomicBool,
    results_taken: AtomicBool,
    jobs_submitted: AtomicU64,
}

impl<T, R> std::fmt::Debug for WorkerPool<T, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("config", &self.config)
            .field("running", &self.running.load(Ordering::Relaxed))
            .field("jobs_closed", &self.jobs.is_closed())
            .field("completed", &self.completion.is_fired())
            .field(
                "jobs_submitted",
                &self.jobs_submitted.load(Ordering::Relaxed),
            )
            .finish()
    }
}

impl<T, R> WorkerPool<T, R>
where
    T: Send + 'static,
    R: Send + 'static,
{
    /// Create a pool with the given worker count, queue capacity, and
    /// processing function.
    ///
    /// Both the job queue and the result queue are bounded by
    /// `queue_capacity`. The worker count is not validated (see
    /// [`PoolConfig::workers`]).
    pub fn new<P>(workers: usize, queue_capacity: usize, processor: P) -> Result<Self>
    where
        P: Processor<T, R> + 'static,
    {
        Self::with_config(
            PoolConfig::new(workers).with_queue_capacity(queue_capacity),
            processor,
        )
    }

    /// Create a pool with a custom configuration
    pub fn with_config<P>(config: PoolConfig, processor: P) -> Result<Self>
    where
        P: Processor<T, R> + 'static,
    {
        config.validate()?;

        Ok(Self {
            jobs: Arc::new(BoundedQueue::new(config.queue_capacity)),
            results: Arc::new(BoundedQueue::new(config.queue_capacity)),
            config,
            processor: Arc::new(processor),
            workers: RwLock::new(Vec::new()),
            worker_stats: RwLock::new(Vec::new()),
            finalizer: Mutex::new(None),
            completion: Arc::new(Completion::default()),
            running: AtomicBool::new(false),
            results_taken: AtomicBool::new(false),
            jobs_submitted: AtomicU64::new(0),
        })
    }

    /// Start the pool: launch the workers and the finalizer.
    ///
    /// Must be called exactly once, before any submission. Not
    /// idempotent: a second call fails with
    /// [`PoolError::AlreadyRunning`] instead of launching an overlapping
    /// worker set against the same queues.
    pub fn start(&self) -> Result<()> {
        // Atomically check and set running flag to prevent race condition
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(PoolError::already_running(
                &self.config.thread_name_prefix,
                self.config.workers,
            ));
        }

        let wg = WaitGroup::new();
        let mut workers = Vec::with_capacity(self.config.workers);
        for id in 0..self.config.workers {
            let name = format!("{}-{}", self.config.thread_name_prefix, id);
            match Worker::spawn(
                id,
                name,
                Arc::clone(&self.jobs),
                Arc::clone(&self.results),
                Arc::clone(&self.processor),
                wg.clone(),
                self.config.poll_interval,
            ) {
                Ok(worker) => workers.push(worker),
                Err(e) => {
                    // Let the already-spawned workers drain out and exit
                    self.jobs.close();
                    return Err(e);
                }
            }
        }

        let results = Arc::clone(&self.results);
        let completion = Arc::clone(&self.completion);
        let finalizer_name = format!("{}-finalizer", self.config.thread_name_prefix);
        let finalizer = thread::Builder::new()
            .name(finalizer_name.clone())
            .spawn(move || {
                // Blocks until every worker has dropped its guard
                wg.wait();
                results.close();
                completion.fire();
                log::debug!("all workers exited, result queue closed");
            })
            .map_err(|e| {
                self.jobs.close();
                let msg = e.to_string();
                PoolError::spawn_with_source(finalizer_name, msg, e)
            })?;

        *self.worker_stats.write() = workers.iter().map(|w| w.stats()).collect();
        *self.workers.write() = workers;
        *self.finalizer.lock() = Some(finalizer);

        log::debug!(
            "pool '{}' started with {} workers",
            self.config.thread_name_prefix,
            self.config.workers
        );
        Ok(())
    }

    /// Submit a job, blocking while the job queue is at capacity.
    ///
    /// # Errors
    ///
    /// - [`PoolError::NotStarted`] if [`start`](WorkerPool::start) has not
    ///   been called
    /// - [`PoolError::SubmitAfterClose`] if [`close`](WorkerPool::close)
    ///   has already been called
    pub fn submit(&self, job: Job<T>) -> Result<()> {
        if !self.running.load(Ordering::Acquire) {
            return Err(PoolError::not_started(&self.config.thread_name_prefix));
        }

        self.jobs.send(job).map_err(|e| match e {
            QueueError::Closed(job) => PoolError::submit_after_close(job.id),
            _ => PoolError::other("job queue rejected submission"),
        })?;

        self.jobs_submitted.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Signal that no further jobs will be submitted.
    ///
    /// Closes the job queue; workers drain the remaining jobs and exit.
    /// Never blocks.
    ///
    /// # Errors
    ///
    /// - [`PoolError::NotStarted`] if the pool was never started
    /// - [`PoolError::AlreadyClosed`] on a second call; double-closing is
    ///   a caller error that must fail loudly
    pub fn close(&self) -> Result<()> {
        if !self.running.load(Ordering::Acquire) {
            return Err(PoolError::not_started(&self.config.thread_name_prefix));
        }
        if self.jobs.close() {
            log::debug!(
                "pool '{}' closed to submissions",
                self.config.thread_name_prefix
            );
            Ok(())
        } else {
            Err(PoolError::already_closed(&self.config.thread_name_prefix))
        }
    }

    /// Block until every worker has exited and the result queue is closed,
    /// then reap the pool threads.
    ///
    /// After this returns, draining [`results`](WorkerPool::results)
    /// yields all remaining buffered results and then terminates.
    ///
    /// # Errors
    ///
    /// - [`PoolError::NotStarted`] if the pool was never started
    /// - [`PoolError::JoinError`] if a pool thread panicked
    pub fn wait(&self) -> Result<()> {
        if !self.running.load(Ordering::Acquire) {
            return Err(PoolError::not_started(&self.config.thread_name_prefix));
        }

        self.completion.wait();

        // Reap threads; later callers find the lists already empty.
        let workers = std::mem::take(&mut *self.workers.write());
        for worker in workers {
            worker.join()?;
        }
        if let Some(handle) = self.finalizer.lock().take() {
            handle.join().map_err(|_| {
                PoolError::join(
                    format!("{}-finalizer", self.config.thread_name_prefix),
                    "Finalizer panicked",
                )
            })?;
        }
        Ok(())
    }

    /// Close the pool to submissions and wait for completion.
    ///
    /// Convenience for [`close`](WorkerPool::close) followed by
    /// [`wait`](WorkerPool::wait).
    pub fn shutdown(&self) -> Result<()> {
        self.close()?;
        self.wait()
    }

    /// Take the result stream: a blocking, finite, once-through iterator.
    ///
    /// The iterator yields results as workers publish them and terminates
    /// once the result queue is closed and drained (i.e. after the
    /// finalizer has run and all buffered results are consumed). It may be
    /// consumed concurrently with submission from another thread, and for
    /// workloads whose job count exceeds the queue capacity it must be.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::ResultsAlreadyTaken`] on a second call; the
    /// stream is consumable exactly once and is not restartable.
    pub fn results(&self) -> Result<ResultIter<R>> {
        if self.results_taken.swap(true, Ordering::SeqCst) {
            return Err(PoolError::ResultsAlreadyTaken);
        }
        Ok(ResultIter {
            queue: Arc::clone(&self.results),
            poll_interval: self.config.poll_interval,
        })
    }

    /// Current lifecycle state
    pub fn state(&self) -> PoolState {
        if self.completion.is_fired() {
            PoolState::Closed
        } else if !self.running.load(Ordering::Acquire) {
            PoolState::Unstarted
        } else if self.jobs.is_closed() {
            PoolState::Draining
        } else {
            PoolState::Running
        }
    }

    /// Returns `true` while workers are running or draining
    pub fn is_running(&self) -> bool {
        matches!(self.state(), PoolState::Running | PoolState::Draining)
    }

    /// Get the number of worker threads
    pub fn worker_count(&self) -> usize {
        self.config.workers
    }

    /// Get the shared capacity of the job and result queues
    pub fn queue_capacity(&self) -> usize {
        self.config.queue_capacity
    }

    /// Get total number of jobs submitted
    pub fn jobs_submitted(&self) -> u64 {
        self.jobs_submitted.load(Ordering::Relaxed)
    }

    /// Get current job queue depth (approximate)
    pub fn jobs_pending(&self) -> usize {
        self.jobs.len()
    }

    /// Get current result queue depth (approximate)
    pub fn results_pending(&self) -> usize {
        self.results.len()
    }

    /// Get statistics for all workers
    pub fn get_stats(&self) -> Vec<Arc<WorkerStats>> {
        self.worker_stats.read().clone()
    }

    /// Get total jobs processed across all workers
    pub fn total_jobs_processed(&self) -> u64 {
        self.worker_stats
            .read()
            .iter()
            .map(|s| s.get_jobs_processed())
            .sum()
    }

    /// Get total jobs panicked across all workers
    pub fn total_jobs_panicked(&self) -> u64 {
        self.worker_stats
            .read()
            .iter()
            .map(|s| s.get_jobs_panicked())
            .sum()
    }
}

impl<T, R> Drop for WorkerPool<T, R> {
    fn drop(&mut self) {
        // Close the job queue so workers can exit; Worker::drop joins each
        // thread with a timeout. A worker stuck publishing to a full,
        // never-drained result queue cannot be reaped; that is the
        // documented caller-responsibility stall.
        if self.running.load(Ordering::Acquire) && !self.completion.is_fired() {
            self.jobs.close();
        }
    }
}

/// Blocking, finite, once-through iterator over a pool's results.
///
/// Obtained from [`WorkerPool::results`]. Each call to `next` blocks until
/// a result is available or the result queue is closed and drained, at
/// which point the iterator terminates.
pub struct ResultIter<R> {
    queue: Arc<BoundedQueue<JobResult<R>>>,
    poll_interval: Duration,
}

impl<R> std::fmt::Debug for ResultIter<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultIter")
            .field("pending", &self.queue.len())
            .field("closed", &self.queue.is_closed())
            .finish()
    }
}

impl<R> Iterator for ResultIter<R> {
    type Item = JobResult<R>;

    fn next(&mut self) -> Option<JobResult<R>> {
        loop {
            match self.queue.recv_timeout(self.poll_interval) {
                Ok(result) => return Some(result),
                Err(QueueError::Empty) => continue,
                Err(_) => return None,
            }
        }
    }
}
