//! Per-object context handed to state handlers.

use std::fmt;
use std::sync::Arc;

use ao_core::AoResult;

use crate::queue::EventSink;

/// Producer handle bound to one active object's queue.
///
/// Passed to every state handler call so handlers can post follow-up events
/// to their own object, and returned by `ActiveObject::poster` for external
/// producers on other threads.
pub struct ActiveContext<E> {
    name: Arc<str>,
    sink: Arc<dyn EventSink<E>>,
}

impl<E> ActiveContext<E> {
    pub fn new(name: impl Into<Arc<str>>, sink: Arc<dyn EventSink<E>>) -> Self {
        Self {
            name: name.into(),
            sink,
        }
    }

    /// Name of the owning active object
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Post an event to the back of the owning object's queue
    pub fn post(&self, event: E) -> AoResult<()> {
        self.sink.post(event)
    }

    /// Post an event ahead of every queued normal event
    pub fn post_urgent(&self, event: E) -> AoResult<()> {
        self.sink.post_urgent(event)
    }

    /// Number of events waiting in the owning object's queue
    pub fn pending(&self) -> usize {
        self.sink.count()
    }

    /// Close the owning object's queue.
    ///
    /// Its event loop exits after the in-flight event and later posts fail
    /// with `AoError::QueueClosed`. The owner still has to `stop` to join
    /// its thread.
    pub fn close_queue(&self) {
        self.sink.close();
    }
}

impl<E> Clone for ActiveContext<E> {
    fn clone(&self) -> Self {
        Self {
            name: Arc::clone(&self.name),
            sink: Arc::clone(&self.sink),
        }
    }
}

impl<E> fmt::Debug for ActiveContext<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActiveContext")
            .field("name", &self.name)
            .field("pending", &self.sink.count())
            .finish()
    }
}
