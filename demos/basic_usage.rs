//! Basic worker pool usage example
//!
//! Demonstrates pool creation, job submission, concurrent result draining,
//! and statistics tracking.
//!
//! Run with: cargo run --example basic_usage

use jobpool::prelude::*;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn main() -> Result<()> {
    env_logger::init();

    println!("=== jobpool - Basic Usage Example ===\n");

    // Create a pool with 4 workers and queues bounded at 8 entries each
    let pool = Arc::new(WorkerPool::new(4, 8, |worker: usize, job: Job<u64>| {
        thread::sleep(Duration::from_millis(20));
        JobResult::success(job.id, format!("job {} handled by worker {}", job.id, worker))
    })?);

    println!("1. Starting pool with {} workers", pool.worker_count());
    pool.start()?;

    // The job count exceeds the queue capacity, so results are drained
    // concurrently from a separate thread.
    println!("\n2. Draining results from a separate thread");
    let results = pool.results()?;
    let drain = thread::spawn(move || {
        let mut collected = Vec::new();
        for result in results {
            println!("   {}", result.data.as_deref().unwrap_or("<no payload>"));
            collected.push(result);
        }
        collected
    });

    println!("\n3. Submitting 20 jobs");
    for id in 1..=20 {
        pool.submit(Job::new(id, id))?;
    }

    // No further submissions; wait until every worker has exited and the
    // result queue is closed
    pool.close()?;
    pool.wait()?;

    let collected = drain.join().expect("drain thread panicked");
    println!("\n4. Collected {} results", collected.len());

    println!("\n5. Per-worker statistics:");
    for (i, stat) in pool.get_stats().iter().enumerate() {
        println!(
            "   Worker {}: {} processed, avg time: {:.2}us",
            i,
            stat.get_jobs_processed(),
            stat.get_average_processing_time_us()
        );
    }
    println!("   Total jobs processed: {}", pool.total_jobs_processed());

    Ok(())
}
