//! Bounded queue primitive shared by the job and result sides of the pool.
//!
//! Both pool queues are instances of [`BoundedQueue`], a blocking bounded
//! FIFO with a one-shot close. The contract is the classic
//! bounded-buffer-as-backpressure idiom: producers block when the queue is
//! full, consumers block when it is empty, and closing unblocks consumers
//! once the remaining items have been drained.

mod bounded;

pub use bounded::BoundedQueue;

use std::fmt;
use std::time::Duration;

/// Errors that can occur during queue operations.
///
/// Send-side variants hand the rejected item back to the caller so it can
/// be retried or reported without being lost.
#[derive(Debug, PartialEq, Eq)]
pub enum QueueError<T> {
    /// Queue is at capacity (non-blocking send only)
    Full(T),
    /// Queue is closed and not accepting new items
    Closed(T),
    /// Send timed out waiting for capacity
    Timeout(T),
    /// Queue held no item within the given window (receive side)
    Empty,
    /// Queue is closed and fully drained (receive side)
    Disconnected,
}

impl<T> fmt::Display for QueueError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueueError::Full(_) => write!(f, "queue is full"),
            QueueError::Closed(_) => write!(f, "queue is closed"),
            QueueError::Timeout(_) => write!(f, "send timed out"),
            QueueError::Empty => write!(f, "queue is empty"),
            QueueError::Disconnected => write!(f, "queue is closed and drained"),
        }
    }
}

impl<T: fmt::Debug> std::error::Error for QueueError<T> {}

impl<T> QueueError<T> {
    /// Recover the rejected item from a send-side error, if it carries one
    pub fn into_item(self) -> Option<T> {
        match self {
            QueueError::Full(item) | QueueError::Closed(item) | QueueError::Timeout(item) => {
                Some(item)
            }
            QueueError::Empty | QueueError::Disconnected => None,
        }
    }
}

/// Default window used when polling a queue for the next item.
///
/// Shorter intervals improve close-detection latency but increase wakeups;
/// longer intervals do the opposite.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);
