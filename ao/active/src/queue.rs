//! Event queue implementation for active objects

use ao_core::{AoError, AoResult};
use heapless::Deque;
use parking_lot::{Condvar, Mutex};

/// Producer side of an event queue.
///
/// Lets handlers and external producers post without knowing the queue's
/// compile-time capacity.
pub trait EventSink<E>: Send + Sync {
    /// Post an event to the back of the queue (FIFO)
    fn post(&self, event: E) -> AoResult<()>;

    /// Post an event ahead of all normal events (urgent)
    fn post_urgent(&self, event: E) -> AoResult<()>;

    /// Get the number of events in the queue
    fn count(&self) -> usize;

    /// Close the queue; the consumer sees no further events
    fn close(&self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lane {
    Normal,
    Urgent,
}

struct Lanes<E, const N: usize> {
    urgent: Deque<E, N>,
    normal: Deque<E, N>,
    closed: bool,
}

impl<E, const N: usize> Lanes<E, N> {
    fn len(&self) -> usize {
        self.urgent.len() + self.normal.len()
    }

    fn pop(&mut self) -> Option<E> {
        self.urgent.pop_front().or_else(|| self.normal.pop_front())
    }
}

/// Bounded, thread-safe event queue for active objects.
///
/// Holds at most `N` events. Normal posts go to the back; urgent posts go
/// ahead of every queued normal event but behind urgent events posted
/// earlier. Any number of producers may post concurrently; a single consumer
/// takes events from the front.
pub struct EventQueue<E, const N: usize> {
    lanes: Mutex<Lanes<E, N>>,
    not_empty: Condvar,
}

impl<E, const N: usize> EventQueue<E, N> {
    /// Create a new empty event queue
    pub fn new() -> Self {
        Self {
            lanes: Mutex::new(Lanes {
                urgent: Deque::new(),
                normal: Deque::new(),
                closed: false,
            }),
            not_empty: Condvar::new(),
        }
    }

    /// Post an event to the back of the queue (FIFO).
    ///
    /// Fails with [`AoError::QueueFull`] instead of blocking or overwriting.
    pub fn post(&self, event: E) -> AoResult<()> {
        self.insert(event, Lane::Normal)
    }

    /// Post an event to the front of the queue (urgent).
    pub fn post_urgent(&self, event: E) -> AoResult<()> {
        self.insert(event, Lane::Urgent)
    }

    fn insert(&self, event: E, lane: Lane) -> AoResult<()> {
        let mut lanes = self.lanes.lock();
        if lanes.closed {
            return Err(AoError::QueueClosed);
        }

        let len = lanes.len();
        if len >= N {
            return Err(AoError::QueueFull { capacity: N });
        }

        let pushed = match lane {
            Lane::Normal => lanes.normal.push_back(event),
            Lane::Urgent => lanes.urgent.push_back(event),
        };
        pushed.map_err(|_| AoError::QueueFull { capacity: N })?;
        drop(lanes);

        // Only the empty -> non-empty edge can have a sleeping consumer.
        if len == 0 {
            self.not_empty.notify_one();
        }
        Ok(())
    }

    /// Take the next event, blocking until one is available.
    ///
    /// Returns `None` once the queue has been closed, even if events are
    /// still pending.
    pub fn take(&self) -> Option<E> {
        let mut lanes = self.lanes.lock();
        loop {
            if lanes.closed {
                return None;
            }
            if let Some(event) = lanes.pop() {
                return Some(event);
            }
            self.not_empty.wait(&mut lanes);
        }
    }

    /// Take the next event without blocking
    pub fn try_take(&self) -> Option<E> {
        let mut lanes = self.lanes.lock();
        if lanes.closed {
            return None;
        }
        lanes.pop()
    }

    /// Close the queue and wake the consumer.
    ///
    /// Later posts fail with [`AoError::QueueClosed`].
    pub fn close(&self) {
        self.lanes.lock().closed = true;
        self.not_empty.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.lanes.lock().closed
    }

    /// Get the number of events in the queue
    pub fn count(&self) -> usize {
        self.lanes.lock().len()
    }

    /// Check if the queue is empty
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Get the maximum capacity of the queue
    pub const fn capacity(&self) -> usize {
        N
    }
}

impl<E, const N: usize> Default for EventQueue<E, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Send, const N: usize> EventSink<E> for EventQueue<E, N> {
    fn post(&self, event: E) -> AoResult<()> {
        EventQueue::post(self, event)
    }

    fn post_urgent(&self, event: E) -> AoResult<()> {
        EventQueue::post_urgent(self, event)
    }

    fn count(&self) -> usize {
        EventQueue::count(self)
    }

    fn close(&self) {
        EventQueue::close(self)
    }
}
