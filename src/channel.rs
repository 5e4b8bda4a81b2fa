//! Blocking channel connecting the consensus driver to its collaborators.
//!
//! An unbounded multi-producer handoff with explicit close semantics:
//! `receive` blocks while the queue is empty and the channel is open, and
//! returns `None` only once the channel is both closed and drained. Closing
//! is idempotent and wakes every blocked receiver. Values sent after close
//! are accepted but unreachable once the queue drains.
//!
//! Handles are shared by wrapping the channel in an [`std::sync::Arc`]; the
//! driver keeps one consumer per stream.

use std::collections::VecDeque;

use parking_lot::{Condvar, Mutex};

/// An unbounded MPSC-style channel with a close flag.
pub struct Channel<T> {
    inner: Mutex<Inner<T>>,
    available: Condvar,
}

struct Inner<T> {
    queue: VecDeque<T>,
    closed: bool,
}

impl<T> Channel<T> {
    pub fn new() -> Self {
        Channel {
            inner: Mutex::new(Inner {
                queue: VecDeque::new(),
                closed: false,
            }),
            available: Condvar::new(),
        }
    }

    /// Enqueue a value and wake one blocked receiver.
    pub fn send(&self, value: T) {
        let mut inner = self.inner.lock();
        inner.queue.push_back(value);
        drop(inner);
        self.available.notify_one();
    }

    /// Dequeue the next value, blocking while the channel is empty and open.
    ///
    /// Returns `None` iff the channel is closed and fully drained.
    pub fn receive(&self) -> Option<T> {
        let mut inner = self.inner.lock();
        while inner.queue.is_empty() && !inner.closed {
            self.available.wait(&mut inner);
        }
        inner.queue.pop_front()
    }

    /// Close the channel and wake all blocked receivers. Idempotent.
    pub fn close(&self) {
        let mut inner = self.inner.lock();
        inner.closed = true;
        drop(inner);
        self.available.notify_all();
    }

    /// Whether `close` has been called.
    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }

    /// Number of values currently queued.
    pub fn len(&self) -> usize {
        self.inner.lock().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().queue.is_empty()
    }
}

impl<T> Default for Channel<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn send_then_receive() {
        let channel = Channel::new();
        channel.send(1u64);
        channel.send(2u64);
        assert_eq!(channel.receive(), Some(1));
        assert_eq!(channel.receive(), Some(2));
    }

    #[test]
    fn receive_blocks_until_send() {
        let channel = Arc::new(Channel::new());
        let producer = channel.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            producer.send(42u64);
        });
        // Blocks until the producer thread delivers.
        assert_eq!(channel.receive(), Some(42));
        handle.join().unwrap();
    }

    #[test]
    fn close_drains_then_none() {
        let channel = Channel::new();
        channel.send(1u64);
        assert_eq!(channel.len(), 1);
        assert!(!channel.is_closed());
        channel.close();
        channel.close(); // idempotent
        assert!(channel.is_closed());
        assert_eq!(channel.receive(), Some(1));
        assert_eq!(channel.receive(), None);
        assert_eq!(channel.receive(), None);
        assert!(channel.is_empty());
    }

    #[test]
    fn close_wakes_blocked_receivers() {
        let channel = Arc::new(Channel::<u64>::new());
        let receiver = channel.clone();
        let handle = thread::spawn(move || receiver.receive());
        thread::sleep(Duration::from_millis(50));
        channel.close();
        assert_eq!(handle.join().unwrap(), None);
    }

    #[test]
    fn send_after_close_is_unreachable_after_drain() {
        let channel = Channel::new();
        channel.send(1u64);
        channel.close();
        channel.send(2u64);
        // Queued values (including post-close sends still in the queue) drain
        // in order, then the channel reports end-of-stream.
        assert_eq!(channel.receive(), Some(1));
        assert_eq!(channel.receive(), Some(2));
        assert_eq!(channel.receive(), None);
    }

    #[test]
    fn multiple_producers() {
        let channel = Arc::new(Channel::new());
        let mut handles = Vec::new();
        for i in 0..4u64 {
            let producer = channel.clone();
            handles.push(thread::spawn(move || {
                for j in 0..100u64 {
                    producer.send(i * 100 + j);
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        channel.close();
        let mut received = Vec::new();
        while let Some(v) = channel.receive() {
            received.push(v);
        }
        assert_eq!(received.len(), 400);
        received.sort_unstable();
        received.dedup();
        assert_eq!(received.len(), 400, "no value lost or duplicated");
    }
}
