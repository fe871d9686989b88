//! Convenient re-exports for common types and traits

pub use crate::core::{Job, JobResult, PoolError, Processor, Result};
pub use crate::pool::{PoolConfig, PoolState, ResultIter, WorkerPool, WorkerStats};
