//! Worker thread implementation

use crate::core::{Job, JobResult, PoolError, Processor, Result};
use crate::queue::{BoundedQueue, QueueError};
use crossbeam_utils::sync::WaitGroup;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[cfg(feature = "tracing")]
use tracing::{span, Level};

/// Statistics for a worker thread
#[derive(Debug, Default)]
pub struct WorkerStats {
    /// Total number of jobs processed
    pub jobs_processed: AtomicU64,
    /// Total number of jobs whose processor panicked
    pub jobs_panicked: AtomicU64,
    /// Total time spent processing jobs (microseconds)
    pub total_processing_time_us: AtomicU64,
}

impl WorkerStats {
    /// Create new worker statistics
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment jobs processed counter
    pub fn increment_processed(&self) {
        self.jobs_processed.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment jobs panicked counter
    pub fn increment_panicked(&self) {
        self.jobs_panicked.fetch_add(1, Ordering::Relaxed);
    }

    /// Add processing time
    pub fn add_processing_time(&self, microseconds: u64) {
        self.total_processing_time_us
            .fetch_add(microseconds, Ordering::Relaxed);
    }

    /// Get total jobs processed
    pub fn get_jobs_processed(&self) -> u64 {
        self.jobs_processed.load(Ordering::Relaxed)
    }

    /// Get total jobs panicked
    pub fn get_jobs_panicked(&self) -> u64 {
        self.jobs_panicked.load(Ordering::Relaxed)
    }

    /// Get average processing time per job in microseconds
    pub fn get_average_processing_time_us(&self) -> f64 {
        let total = self.total_processing_time_us.load(Ordering::Relaxed);
        let count = self.jobs_processed.load(Ordering::Relaxed);
        if count > 0 {
            total as f64 / count as f64
        } else {
            0.0
        }
    }
}

/// A worker thread that drains the job queue and publishes results
///
/// Each worker repeats fetch, process, publish until the job queue is
/// observed closed and drained, then exits without error; closing the job
/// queue is the sole termination signal. The worker's [`WaitGroup`] guard
/// drops on exit, decrementing the active-worker count exactly once.
#[derive(Debug)]
pub struct Worker {
    id: usize,
    name: String,
    thread: Option<thread::JoinHandle<()>>,
    stats: Arc<WorkerStats>,
}

impl Worker {
    /// Create and start a new worker
    ///
    /// # Arguments
    ///
    /// * `id` - Identifier passed to every processor invocation
    /// * `name` - Thread name
    /// * `jobs` - Shared job queue the worker drains
    /// * `results` - Shared result queue the worker publishes to
    /// * `processor` - The caller-supplied processing function
    /// * `wg` - Active-worker guard, dropped when the worker exits
    /// * `poll_interval` - Duration between poll attempts for new jobs
    pub(crate) fn spawn<T, R>(
        id: usize,
        name: String,
        jobs: Arc<BoundedQueue<Job<T>>>,
        results: Arc<BoundedQueue<JobResult<R>>>,
        processor: Arc<dyn Processor<T, R>>,
        wg: WaitGroup,
        poll_interval: Duration,
    ) -> Result<Self>
    where
        T: Send + 'static,
        R: Send + 'static,
    {
        let stats = Arc::new(WorkerStats::new());
        let stats_clone = Arc::clone(&stats);

        let thread = thread::Builder::new()
            .name(name.clone())
            .spawn(move || {
                Self::run(id, jobs, results, processor, stats_clone, poll_interval);
                drop(wg);
            })
            .map_err(|e| {
                let msg = e.to_string();
                PoolError::spawn_with_source(name.clone(), msg, e)
            })?;

        Ok(Self {
            id,
            name,
            thread: Some(thread),
            stats,
        })
    }

    /// Get worker ID
    pub fn id(&self) -> usize {
        self.id
    }

    /// Get worker statistics
    pub fn stats(&self) -> Arc<WorkerStats> {
        Arc::clone(&self.stats)
    }

    /// Join the worker thread
    pub fn join(mut self) -> Result<()> {
        if let Some(thread) = self.thread.take() {
            thread
                .join()
                .map_err(|_| PoolError::join(self.name.clone(), "Worker panicked"))?;
        }
        Ok(())
    }

    /// Main worker loop
    ///
    /// Fetches until the job queue is closed and drained, so every
    /// accepted job is answered before the worker exits.
    fn run<T, R>(
        id: usize,
        jobs: Arc<BoundedQueue<Job<T>>>,
        results: Arc<BoundedQueue<JobResult<R>>>,
        processor: Arc<dyn Processor<T, R>>,
        stats: Arc<WorkerStats>,
        poll_interval: Duration,
    ) where
        T: Send + 'static,
        R: Send + 'static,
    {
        #[cfg(feature = "tracing")]
        let worker_span = span!(Level::DEBUG, "worker", id = id);
        #[cfg(feature = "tracing")]
        let _guard = worker_span.enter();

        log::debug!("worker {} started", id);

        loop {
            match jobs.recv_timeout(poll_interval) {
                Ok(job) => {
                    let result = Self::execute_job(id, job, &*processor, &stats);
                    // Blocking publish: backpressure when the result queue
                    // is at capacity.
                    if results.send(result).is_err() {
                        log::warn!(
                            "worker {}: result queue closed before publish, exiting",
                            id
                        );
                        break;
                    }
                }
                Err(QueueError::Empty) => {
                    // No job available within the window, keep polling
                    continue;
                }
                Err(_) => {
                    // Job queue closed and drained: normal shutdown
                    log::debug!(
                        "worker {} exiting after {} jobs",
                        id,
                        stats.get_jobs_processed()
                    );
                    break;
                }
            }
        }
    }

    /// Execute a single job with panic protection
    ///
    /// A panicking processor must not cost the job its result, so the
    /// panic is converted into a failure result for the same job id.
    fn execute_job<T, R>(
        id: usize,
        job: Job<T>,
        processor: &dyn Processor<T, R>,
        stats: &WorkerStats,
    ) -> JobResult<R> {
        let job_id = job.id;

        #[cfg(feature = "tracing")]
        let job_span = span!(Level::DEBUG, "job_execution", job_id = job_id);
        #[cfg(feature = "tracing")]
        let _job_guard = job_span.enter();

        let start = std::time::Instant::now();
        let panic_result = catch_unwind(AssertUnwindSafe(|| processor.process(id, job)));
        let elapsed = start.elapsed();
        stats.add_processing_time(elapsed.as_micros() as u64);

        match panic_result {
            Ok(result) => {
                stats.increment_processed();
                #[cfg(feature = "tracing")]
                tracing::debug!(
                    job_id = job_id,
                    duration_us = elapsed.as_micros() as u64,
                    "job processed"
                );
                result
            }
            Err(panic_info) => {
                let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                    s.to_string()
                } else if let Some(s) = panic_info.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "Unknown panic".to_string()
                };
                stats.increment_panicked();
                log::warn!("worker {}: job {} panicked: {}", id, job_id, panic_msg);
                JobResult::failure(job_id, PoolError::task_panicked(job_id, panic_msg))
            }
        }
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        if let Some(thread) = self.thread.take() {
            // Use a timeout to prevent Drop from hanging indefinitely
            const JOIN_TIMEOUT: Duration = Duration::from_secs(5);

            let start = std::time::Instant::now();
            loop {
                if thread.is_finished() {
                    // Thread finished, join to check for panics
                    if thread.join().is_err() {
                        log::error!("worker {} panicked during shutdown", self.id);
                    }
                    break;
                }

                if start.elapsed() >= JOIN_TIMEOUT {
                    log::warn!(
                        "worker {} did not finish within {}s timeout during drop, thread may be leaked",
                        self.id,
                        JOIN_TIMEOUT.as_secs()
                    );
                    break;
                }

                // Small sleep to avoid busy-waiting
                thread::sleep(Duration::from_millis(10));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spawn_test_worker(
        jobs: &Arc<BoundedQueue<Job<u32>>>,
        results: &Arc<BoundedQueue<JobResult<u32>>>,
        processor: impl Processor<u32, u32> + 'static,
    ) -> Worker {
        Worker::spawn(
            0,
            "worker-0".to_string(),
            Arc::clone(jobs),
            Arc::clone(results),
            Arc::new(processor),
            WaitGroup::new(),
            Duration::from_millis(10),
        )
        .expect("Failed to spawn worker")
    }

    #[test]
    fn test_worker_processes_and_publishes() {
        let jobs = Arc::new(BoundedQueue::new(4));
        let results = Arc::new(BoundedQueue::new(4));

        let worker = spawn_test_worker(&jobs, &results, |_worker: usize, job: Job<u32>| {
            JobResult::success(job.id, job.data * 2)
        });
        let stats = worker.stats();

        jobs.send(Job::new(1, 21)).unwrap();

        let result = results.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(result.job_id, 1);
        assert_eq!(result.data, Some(42));
        assert!(result.is_success());
        assert_eq!(stats.get_jobs_processed(), 1);

        jobs.close();
        worker.join().expect("Failed to join worker");
    }

    #[test]
    fn test_worker_exits_on_close_and_drain() {
        let jobs: Arc<BoundedQueue<Job<u32>>> = Arc::new(BoundedQueue::new(4));
        let results: Arc<BoundedQueue<JobResult<u32>>> = Arc::new(BoundedQueue::new(4));

        let worker = spawn_test_worker(&jobs, &results, |_worker: usize, job: Job<u32>| {
            JobResult::success(job.id, job.data)
        });

        // Jobs queued before the close are still drained
        jobs.send(Job::new(1, 10)).unwrap();
        jobs.send(Job::new(2, 20)).unwrap();
        jobs.close();

        worker.join().expect("Failed to join worker");
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_worker_wait_group_released_on_exit() {
        let jobs: Arc<BoundedQueue<Job<u32>>> = Arc::new(BoundedQueue::new(4));
        let results: Arc<BoundedQueue<JobResult<u32>>> = Arc::new(BoundedQueue::new(4));

        let wg = WaitGroup::new();
        let worker = Worker::spawn(
            0,
            "worker-0".to_string(),
            Arc::clone(&jobs),
            Arc::clone(&results),
            Arc::new(|_worker: usize, job: Job<u32>| JobResult::success(job.id, job.data)),
            wg.clone(),
            Duration::from_millis(10),
        )
        .expect("Failed to spawn worker");

        jobs.close();
        // Blocks until the worker drops its guard
        wg.wait();
        worker.join().expect("Failed to join worker");
    }

    #[test]
    fn test_worker_panic_becomes_failure_result() {
        let jobs = Arc::new(BoundedQueue::new(4));
        let results = Arc::new(BoundedQueue::new(4));

        let worker = spawn_test_worker(&jobs, &results, |_worker: usize, job: Job<u32>| {
            if job.id == 2 {
                panic!("intentional panic for testing");
            }
            JobResult::success(job.id, job.data)
        });
        let stats = worker.stats();

        jobs.send(Job::new(2, 0)).unwrap();

        // The panic surfaces as a failure result for the same job id
        let result = results.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(result.job_id, 2);
        assert!(matches!(
            result.error,
            Some(PoolError::TaskPanicked { job_id: 2, .. })
        ));
        assert_eq!(stats.get_jobs_panicked(), 1);
        assert_eq!(stats.get_jobs_processed(), 0);

        // Worker survives the panic and keeps processing
        jobs.send(Job::new(3, 30)).unwrap();
        let result = results.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(result.job_id, 3);
        assert!(result.is_success());

        jobs.close();
        worker.join().expect("Failed to join worker");
    }
}
