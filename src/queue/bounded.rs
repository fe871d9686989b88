//! Bounded FIFO queue with capacity limit and one-shot close.

use super::QueueError;
use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender, TryRecvError, TrySendError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// A bounded FIFO queue with configurable capacity.
///
/// Blocking sends provide backpressure when the queue is full. The queue
/// supports a one-shot [`close`](BoundedQueue::close): once closed, new
/// sends are rejected while already-queued items remain receivable;
/// receivers observe [`QueueError::Disconnected`] only after the queue is
/// both closed and drained.
///
/// The close flag lives outside the channel because the queue owns both
/// channel endpoints for its whole lifetime; consumers observe the flag
/// through timeout-based receives rather than sender disconnection.
///
/// # Example
///
/// ```rust
/// use jobpool::queue::{BoundedQueue, QueueError};
///
/// let queue = BoundedQueue::new(2);
///
/// queue.send(1).unwrap();
/// queue.send(2).unwrap();
///
/// // Queue is now full - try_send hands the item back
/// match queue.try_send(3) {
///     Err(QueueError::Full(item)) => assert_eq!(item, 3),
///     _ => panic!("expected Full error"),
/// }
/// ```
pub struct BoundedQueue<T> {
    sender: Sender<T>,
    receiver: Receiver<T>,
    capacity: usize,
    closed: AtomicBool,
}

impl<T> BoundedQueue<T> {
    /// Creates a new bounded queue with the specified capacity.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is 0.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "capacity must be greater than 0");
        let (sender, receiver) = channel::bounded(capacity);
        Self {
            sender,
            receiver,
            capacity,
            closed: AtomicBool::new(false),
        }
    }

    /// Returns the maximum capacity of this queue.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Sends an item, blocking while the queue is at capacity.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Closed`] with the item if the queue has been
    /// closed.
    pub fn send(&self, item: T) -> Result<(), QueueError<T>> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(QueueError::Closed(item));
        }
        self.sender.send(item).map_err(|e| QueueError::Closed(e.0))
    }

    /// Attempts to send an item without blocking.
    ///
    /// # Errors
    ///
    /// - [`QueueError::Full`] with the item if the queue is at capacity
    /// - [`QueueError::Closed`] with the item if the queue has been closed
    pub fn try_send(&self, item: T) -> Result<(), QueueError<T>> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(QueueError::Closed(item));
        }
        self.sender.try_send(item).map_err(|e| match e {
            TrySendError::Full(item) => QueueError::Full(item),
            TrySendError::Disconnected(item) => QueueError::Closed(item),
        })
    }

    /// Sends an item, waiting up to `timeout` for capacity.
    ///
    /// # Errors
    ///
    /// - [`QueueError::Timeout`] with the item if the queue stayed full
    /// - [`QueueError::Closed`] with the item if the queue has been closed
    pub fn send_timeout(&self, item: T, timeout: Duration) -> Result<(), QueueError<T>> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(QueueError::Closed(item));
        }
        self.sender.send_timeout(item, timeout).map_err(|e| match e {
            channel::SendTimeoutError::Timeout(item) => QueueError::Timeout(item),
            channel::SendTimeoutError::Disconnected(item) => QueueError::Closed(item),
        })
    }

    /// Attempts to receive an item without blocking.
    ///
    /// # Errors
    ///
    /// - [`QueueError::Empty`] if no item is currently queued
    /// - [`QueueError::Disconnected`] if the queue is closed and drained
    pub fn try_recv(&self) -> Result<T, QueueError<T>> {
        match self.receiver.try_recv() {
            Ok(item) => Ok(item),
            Err(TryRecvError::Empty) => {
                if self.closed.load(Ordering::SeqCst) && self.receiver.is_empty() {
                    Err(QueueError::Disconnected)
                } else {
                    Err(QueueError::Empty)
                }
            }
            Err(TryRecvError::Disconnected) => Err(QueueError::Disconnected),
        }
    }

    /// Receives an item, waiting up to `timeout` for one to arrive.
    ///
    /// # Errors
    ///
    /// - [`QueueError::Empty`] if no item arrived within the timeout
    /// - [`QueueError::Disconnected`] if the queue is closed and drained
    pub fn recv_timeout(&self, timeout: Duration) -> Result<T, QueueError<T>> {
        // Check if closed first
        if self.closed.load(Ordering::SeqCst) && self.receiver.is_empty() {
            return Err(QueueError::Disconnected);
        }

        match self.receiver.recv_timeout(timeout) {
            Ok(item) => Ok(item),
            Err(RecvTimeoutError::Timeout) => {
                // On timeout, check if closed
                if self.closed.load(Ordering::SeqCst) && self.receiver.is_empty() {
                    Err(QueueError::Disconnected)
                } else {
                    Err(QueueError::Empty)
                }
            }
            Err(RecvTimeoutError::Disconnected) => Err(QueueError::Disconnected),
        }
    }

    /// Closes the queue, preventing new items from being sent.
    ///
    /// Items already in the queue can still be received. Returns `true`
    /// for the call that performed the close and `false` for every later
    /// call, which is what makes double-close detection race-free.
    pub fn close(&self) -> bool {
        !self.closed.swap(true, Ordering::SeqCst)
    }

    /// Returns `true` if the queue has been closed.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Returns the current number of queued items.
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    /// Returns `true` if the queue holds no items.
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}

impl<T> std::fmt::Debug for BoundedQueue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundedQueue")
            .field("capacity", &self.capacity)
            .field("len", &self.len())
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_bounded_send_recv() {
        let queue = BoundedQueue::new(10);
        queue.send(41).unwrap();
        let item = queue.recv_timeout(Duration::from_millis(10)).unwrap();
        assert_eq!(item, 41);
    }

    #[test]
    fn test_capacity() {
        let queue = BoundedQueue::<u32>::new(5);
        assert_eq!(queue.capacity(), 5);
    }

    #[test]
    #[should_panic(expected = "capacity must be greater than 0")]
    fn test_zero_capacity_panics() {
        let _ = BoundedQueue::<u32>::new(0);
    }

    #[test]
    fn test_try_send_full() {
        let queue = BoundedQueue::new(2);
        queue.try_send(1).unwrap();
        queue.try_send(2).unwrap();

        // Queue is now full; the item comes back
        match queue.try_send(3) {
            Err(QueueError::Full(item)) => assert_eq!(item, 3),
            _ => panic!("expected Full error"),
        }
    }

    #[test]
    fn test_send_blocks_when_full() {
        let queue = Arc::new(BoundedQueue::new(1));
        queue.send(1).unwrap();

        let q = Arc::clone(&queue);
        let handle = thread::spawn(move || {
            // This should block until the queue has space
            q.send(2).unwrap();
        });

        // Give the sender a chance to block
        thread::sleep(Duration::from_millis(10));

        // Receive to make space
        queue.recv_timeout(Duration::from_millis(100)).unwrap();

        // Now the sender should unblock
        handle.join().unwrap();
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_send_timeout_when_full() {
        let queue = BoundedQueue::new(1);
        queue.send(1).unwrap();

        match queue.send_timeout(2, Duration::from_millis(10)) {
            Err(QueueError::Timeout(item)) => assert_eq!(item, 2),
            _ => panic!("expected Timeout error"),
        }
    }

    #[test]
    fn test_try_recv_empty() {
        let queue = BoundedQueue::<u32>::new(10);
        match queue.try_recv() {
            Err(QueueError::Empty) => {}
            _ => panic!("expected Empty error"),
        }
    }

    #[test]
    fn test_recv_timeout_empty() {
        let queue = BoundedQueue::<u32>::new(10);
        match queue.recv_timeout(Duration::from_millis(10)) {
            Err(QueueError::Empty) => {}
            _ => panic!("expected Empty error on timeout"),
        }
    }

    #[test]
    fn test_close_rejects_sends() {
        let queue = BoundedQueue::new(10);
        assert!(!queue.is_closed());
        assert!(queue.close());
        assert!(queue.is_closed());

        match queue.send(1) {
            Err(QueueError::Closed(item)) => assert_eq!(item, 1),
            _ => panic!("expected Closed error"),
        }
    }

    #[test]
    fn test_close_returns_true_exactly_once() {
        let queue = BoundedQueue::<u32>::new(4);
        assert!(queue.close());
        assert!(!queue.close());
        assert!(!queue.close());
    }

    #[test]
    fn test_recv_drains_after_close() {
        let queue = BoundedQueue::new(4);
        queue.send(1).unwrap();
        queue.send(2).unwrap();
        queue.close();

        // Queued items survive the close
        assert_eq!(queue.recv_timeout(Duration::from_millis(10)).unwrap(), 1);
        assert_eq!(queue.recv_timeout(Duration::from_millis(10)).unwrap(), 2);

        // Closed and drained: receivers unblock with Disconnected
        match queue.recv_timeout(Duration::from_millis(10)) {
            Err(QueueError::Disconnected) => {}
            other => panic!("expected Disconnected, got {:?}", other.err()),
        }
        match queue.try_recv() {
            Err(QueueError::Disconnected) => {}
            other => panic!("expected Disconnected, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_len_and_is_empty() {
        let queue = BoundedQueue::new(10);
        assert!(queue.is_empty());
        assert_eq!(queue.len(), 0);

        queue.send(1).unwrap();
        assert!(!queue.is_empty());
        assert_eq!(queue.len(), 1);

        queue.recv_timeout(Duration::from_millis(10)).unwrap();
        assert!(queue.is_empty());
        assert_eq!(queue.len(), 0);
    }

    #[test]
    fn test_concurrent_bounded() {
        let queue = Arc::new(BoundedQueue::new(10));
        let num_items = 100;

        // Spawn sender thread
        let q_send = Arc::clone(&queue);
        let sender = thread::spawn(move || {
            for i in 0..num_items {
                q_send.send(i).unwrap();
            }
        });

        // Spawn receiver thread
        let q_recv = Arc::clone(&queue);
        let receiver = thread::spawn(move || {
            let mut received = 0;
            for _ in 0..num_items {
                q_recv.recv_timeout(Duration::from_secs(5)).unwrap();
                received += 1;
            }
            received
        });

        sender.join().unwrap();
        let received = receiver.join().unwrap();
        assert_eq!(received, num_items);
    }
}
