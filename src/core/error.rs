//! Error types for the worker pool

/// Result type for worker pool operations
pub type Result<T> = std::result::Result<T, PoolError>;

/// Errors that can occur in the worker pool
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum PoolError {
    /// Pool is already running with details
    #[error("Worker pool '{pool_name}' is already running with {worker_count} workers")]
    AlreadyRunning {
        /// Name of the worker pool
        pool_name: String,
        /// Number of worker threads
        worker_count: usize,
    },

    /// Pool has not been started
    #[error("Worker pool '{pool_name}' has not been started")]
    NotStarted {
        /// Name of the worker pool
        pool_name: String,
    },

    /// Job submitted after the job queue was closed
    #[error("Job {job_id} submitted after the job queue was closed")]
    SubmitAfterClose {
        /// ID of the rejected job
        job_id: u64,
    },

    /// Job queue closed more than once
    #[error("Worker pool '{pool_name}' was already closed to submissions")]
    AlreadyClosed {
        /// Name of the worker pool
        pool_name: String,
    },

    /// The result stream was already consumed
    #[error("Result stream was already taken; results are consumable exactly once")]
    ResultsAlreadyTaken,

    /// Failed to spawn a pool thread with details
    #[error("Failed to spawn pool thread '{thread_name}': {message}")]
    SpawnError {
        /// Name of the thread that failed to spawn
        thread_name: String,
        /// Error message
        message: String,
        /// Source IO error
        #[source]
        source: Option<std::io::Error>,
    },

    /// Failed to join a pool thread
    #[error("Failed to join pool thread '{thread_name}': {message}")]
    JoinError {
        /// Name of the thread that failed to join
        thread_name: String,
        /// Error message
        message: String,
    },

    /// Invalid configuration with parameter
    #[error("Invalid configuration for '{parameter}': {message}")]
    InvalidConfig {
        /// Configuration parameter name
        parameter: String,
        /// Error message
        message: String,
    },

    /// Processing failure reported by a caller's processor
    ///
    /// The pool never produces this variant itself; it exists for callers
    /// to carry inside [`JobResult::failure`](crate::core::JobResult::failure).
    #[error("Job {job_id} failed: {message}")]
    TaskFailed {
        /// ID of the failed job
        job_id: u64,
        /// Error message
        message: String,
    },

    /// The processor panicked while handling a job
    #[error("Job {job_id} panicked during processing: {message}")]
    TaskPanicked {
        /// ID of the job being processed when the panic occurred
        job_id: u64,
        /// Panic payload rendered as text
        message: String,
    },

    /// General error
    #[error("{0}")]
    Other(String),
}

impl PoolError {
    /// Create an already running error
    pub fn already_running(pool_name: impl Into<String>, worker_count: usize) -> Self {
        PoolError::AlreadyRunning {
            pool_name: pool_name.into(),
            worker_count,
        }
    }

    /// Create a not started error
    pub fn not_started(pool_name: impl Into<String>) -> Self {
        PoolError::NotStarted {
            pool_name: pool_name.into(),
        }
    }

    /// Create a submit-after-close error
    pub fn submit_after_close(job_id: u64) -> Self {
        PoolError::SubmitAfterClose { job_id }
    }

    /// Create an already closed error
    pub fn already_closed(pool_name: impl Into<String>) -> Self {
        PoolError::AlreadyClosed {
            pool_name: pool_name.into(),
        }
    }

    /// Create a spawn error
    pub fn spawn(thread_name: impl Into<String>, message: impl Into<String>) -> Self {
        PoolError::SpawnError {
            thread_name: thread_name.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Create a spawn error with source
    pub fn spawn_with_source(
        thread_name: impl Into<String>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        PoolError::SpawnError {
            thread_name: thread_name.into(),
            message: message.into(),
            source: Some(source),
        }
    }

    /// Create a join error
    pub fn join(thread_name: impl Into<String>, message: impl Into<String>) -> Self {
        PoolError::JoinError {
            thread_name: thread_name.into(),
            message: message.into(),
        }
    }

    /// Create an invalid config error
    pub fn invalid_config(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        PoolError::InvalidConfig {
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    /// Create a task failure error
    pub fn task_failed(job_id: u64, message: impl Into<String>) -> Self {
        PoolError::TaskFailed {
            job_id,
            message: message.into(),
        }
    }

    /// Create a task panic error
    pub fn task_panicked(job_id: u64, message: impl Into<String>) -> Self {
        PoolError::TaskPanicked {
            job_id,
            message: message.into(),
        }
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        PoolError::Other(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = PoolError::already_running("main_pool", 8);
        assert!(matches!(err, PoolError::AlreadyRunning { .. }));

        let err = PoolError::submit_after_close(42);
        assert!(matches!(err, PoolError::SubmitAfterClose { job_id: 42 }));

        let err = PoolError::task_failed(7, "checksum mismatch");
        assert!(matches!(err, PoolError::TaskFailed { .. }));
    }

    #[test]
    fn test_error_display() {
        let err = PoolError::already_running("worker_pool", 4);
        assert_eq!(
            err.to_string(),
            "Worker pool 'worker_pool' is already running with 4 workers"
        );

        let err = PoolError::submit_after_close(3);
        assert_eq!(
            err.to_string(),
            "Job 3 submitted after the job queue was closed"
        );

        let err = PoolError::task_panicked(9, "index out of bounds");
        assert_eq!(
            err.to_string(),
            "Job 9 panicked during processing: index out of bounds"
        );
    }

    #[test]
    fn test_spawn_error_with_source() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = PoolError::spawn_with_source("worker-5", "Cannot create thread", io_err);

        assert!(matches!(err, PoolError::SpawnError { .. }));
        assert!(err.to_string().contains("worker-5"));
    }
}
