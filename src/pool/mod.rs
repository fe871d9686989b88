//! Worker pool, worker threads, and the result stream

pub mod worker;
pub mod worker_pool;

pub use worker::{Worker, WorkerStats};
pub use worker_pool::{PoolConfig, PoolState, ResultIter, WorkerPool};
