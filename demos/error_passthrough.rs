//! Error passthrough example
//!
//! The pool never interprets a processor's error: it travels unchanged on
//! the matching job's result, and the caller sorts successes from failures
//! while draining.
//!
//! Run with: cargo run --example error_passthrough

use jobpool::prelude::*;

fn main() -> Result<()> {
    env_logger::init();

    let pool = WorkerPool::new(2, 16, |_worker: usize, job: Job<String>| {
        match job.data.parse::<i64>() {
            Ok(value) => JobResult::success(job.id, value * 2),
            Err(e) => JobResult::failure(
                job.id,
                PoolError::task_failed(job.id, format!("unparsable payload: {}", e)),
            ),
        }
    })?;
    pool.start()?;

    let payloads = ["21", "three", "1024", "-7", "NaN"];
    for (id, payload) in payloads.iter().enumerate() {
        pool.submit(Job::new(id as u64 + 1, payload.to_string()))?;
    }

    pool.close()?;
    pool.wait()?;

    let mut ok = 0;
    let mut failed = 0;
    for result in pool.results()? {
        match (&result.data, &result.error) {
            (Some(doubled), None) => {
                ok += 1;
                println!("job {}: doubled to {}", result.job_id, doubled);
            }
            (None, Some(error)) => {
                failed += 1;
                println!("job {}: {}", result.job_id, error);
            }
            _ => unreachable!("a result carries either a payload or an error"),
        }
    }

    println!("{} succeeded, {} failed", ok, failed);
    Ok(())
}
