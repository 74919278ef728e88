//! Active object: a flat state machine, its event queue and an execution
//! context.

use std::fmt;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use ao_core::{AoError, AoResult, Event};
use ao_fsm::{FlatStateMachine, StateHandlers};
use parking_lot::Mutex;

use crate::config::{ActiveConfig, ExecutionMode, ThreadPriority};
use crate::context::ActiveContext;
use crate::queue::{EventQueue, EventSink};

/// Active object lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveState {
    /// Constructed, not started yet
    Idle,
    /// Running in the given execution mode
    Running(ExecutionMode),
    /// Stopped; cannot be started again
    Stopped,
}

impl fmt::Display for ActiveState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActiveState::Idle => write!(f, "Idle"),
            ActiveState::Running(mode) => write!(f, "Running({mode})"),
            ActiveState::Stopped => write!(f, "Stopped"),
        }
    }
}

enum Execution {
    Idle,
    Background(JoinHandle<()>),
    Manual,
    Stopped,
}

impl Execution {
    fn state(&self) -> ActiveState {
        match self {
            Execution::Idle => ActiveState::Idle,
            Execution::Background(_) => ActiveState::Running(ExecutionMode::Background),
            Execution::Manual => ActiveState::Running(ExecutionMode::Manual),
            Execution::Stopped => ActiveState::Stopped,
        }
    }
}

/// Encapsulated, event-driven object with its own queue and thread of
/// control.
///
/// Events posted from any thread are queued and dispatched one at a time to
/// the state machine, so handlers never run concurrently with each other.
/// With [`ExecutionMode::Manual`] no thread exists and the caller steps the
/// object through [`ActiveObject::process_one_event`], which makes the
/// state machine's side effects deterministic under test.
pub struct ActiveObject<H: StateHandlers, E, const N: usize> {
    config: ActiveConfig,
    queue: Arc<EventQueue<E, N>>,
    context: ActiveContext<E>,
    machine: Arc<Mutex<FlatStateMachine<H>>>,
    execution: Execution,
}

impl<H, E, const N: usize> ActiveObject<H, E, N>
where
    H: StateHandlers<Event = E, Context = ActiveContext<E>> + Send + 'static,
    E: Event,
{
    /// Create a new idle active object with the default configuration
    pub fn new(handlers: H) -> Self {
        Self::with_config(handlers, ActiveConfig::default())
    }

    /// Create a new idle active object
    pub fn with_config(handlers: H, config: ActiveConfig) -> Self {
        let queue: Arc<EventQueue<E, N>> = Arc::new(EventQueue::new());
        let sink: Arc<dyn EventSink<E>> = queue.clone();
        let context = ActiveContext::new(config.name.as_str(), sink);
        Self {
            config,
            queue,
            context,
            machine: Arc::new(Mutex::new(FlatStateMachine::new(handlers))),
            execution: Execution::Idle,
        }
    }

    /// Start the active object.
    ///
    /// `Background` spawns a thread that initializes the state machine and
    /// then dispatches events until [`ActiveObject::stop`]. `Manual`
    /// initializes the state machine on the calling thread and spawns
    /// nothing.
    pub fn start(&mut self, mode: ExecutionMode) -> AoResult<()> {
        match self.execution {
            Execution::Idle => {}
            Execution::Stopped => return Err(AoError::Stopped),
            Execution::Background(_) | Execution::Manual => return Err(AoError::AlreadyStarted),
        }

        self.execution = match mode {
            ExecutionMode::Background => Execution::Background(self.spawn_background()?),
            ExecutionMode::Manual => {
                let mut ctx = self.context.clone();
                self.machine.lock().initialize(&mut ctx);
                Execution::Manual
            }
        };
        log::debug!("{}: started ({})", self.config.name, mode);
        Ok(())
    }

    fn spawn_background(&self) -> AoResult<JoinHandle<()>> {
        let machine = Arc::clone(&self.machine);
        let queue = Arc::clone(&self.queue);
        let mut ctx = self.context.clone();

        let mut builder = thread::Builder::new().name(self.config.name.clone());
        if let Some(size) = self.config.stack_size {
            builder = builder.stack_size(size);
        }

        builder
            .spawn(move || run_task(&machine, &queue, &mut ctx))
            .map_err(|err| AoError::Spawn(err.kind()))
    }

    /// Post an event, FIFO, to the active object's event queue
    pub fn post(&self, event: E) -> AoResult<()> {
        self.queue.post(event)
    }

    /// Post an event, LIFO, ahead of all queued normal events
    pub fn post_urgent(&self, event: E) -> AoResult<()> {
        self.queue.post_urgent(event)
    }

    /// Dequeue and dispatch a single event.
    ///
    /// In `Manual` mode this never blocks and returns `false` when the queue
    /// is empty. In `Background` mode it blocks until an event arrives and
    /// returns `false` only once the queue is closed.
    pub fn process_one_event(&self, mode: ExecutionMode) -> bool {
        if matches!(self.execution, Execution::Idle) {
            log::warn!("{}: process_one_event before start", self.config.name);
            return false;
        }

        let event = match mode {
            ExecutionMode::Manual => self.queue.try_take(),
            ExecutionMode::Background => self.queue.take(),
        };

        match event {
            Some(event) => {
                let mut ctx = self.context.clone();
                self.machine.lock().process_event(&event, &mut ctx);
                true
            }
            None => false,
        }
    }

    /// Stop the active object and join its thread, if any.
    ///
    /// Calling `stop` before `start` or more than once is a no-op.
    pub fn stop(&mut self) {
        match std::mem::replace(&mut self.execution, Execution::Stopped) {
            Execution::Idle => {
                log::debug!("{}: stop before start ignored", self.config.name);
                self.execution = Execution::Idle;
            }
            Execution::Stopped => {
                log::debug!("{}: already stopped", self.config.name);
            }
            Execution::Manual => {
                self.queue.close();
                log::debug!("{}: stopped", self.config.name);
            }
            Execution::Background(handle) => {
                self.queue.close();
                join_task(&self.config.name, handle);
                log::debug!("{}: stopped", self.config.name);
            }
        }
    }

    /// Record the requested thread priority.
    ///
    /// The value is kept for diagnostics; no OS scheduling change is made.
    pub fn set_priority(&mut self, priority: ThreadPriority) {
        log::debug!(
            "{}: priority {} -> {} (advisory)",
            self.config.name,
            self.config.priority,
            priority
        );
        self.config.priority = priority;
    }

    pub fn priority(&self) -> ThreadPriority {
        self.config.priority
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &ActiveConfig {
        &self.config
    }

    /// Get the current lifecycle state
    pub fn state(&self) -> ActiveState {
        self.execution.state()
    }

    /// Cloneable producer handle for posting from other threads
    pub fn poster(&self) -> ActiveContext<E> {
        self.context.clone()
    }

    /// Get the number of events waiting in the queue
    pub fn pending(&self) -> usize {
        self.queue.count()
    }

    /// Get the maximum queue capacity
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Snapshot of the state machine's current state
    pub fn current_state(&self) -> Option<H::State> {
        self.machine.lock().current_state()
    }

    /// Run `f` against the state handlers.
    ///
    /// Takes the machine lock, so it waits for an in-flight event to finish.
    pub fn with_handlers<R>(&self, f: impl FnOnce(&H) -> R) -> R {
        f(self.machine.lock().handlers())
    }
}

impl<H: StateHandlers, E, const N: usize> Drop for ActiveObject<H, E, N> {
    fn drop(&mut self) {
        if let Execution::Background(handle) =
            std::mem::replace(&mut self.execution, Execution::Stopped)
        {
            log::warn!("{}: dropped while running, stopping", self.config.name);
            self.queue.close();
            join_task(&self.config.name, handle);
        }
    }
}

impl<H: StateHandlers, E, const N: usize> fmt::Debug for ActiveObject<H, E, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActiveObject")
            .field("name", &self.config.name)
            .field("state", &self.execution.state())
            .field("pending", &self.queue.count())
            .field("capacity", &N)
            .finish()
    }
}

/// Background event loop: initialize, then dispatch until the queue closes.
fn run_task<H, E, const N: usize>(
    machine: &Mutex<FlatStateMachine<H>>,
    queue: &EventQueue<E, N>,
    ctx: &mut ActiveContext<E>,
) where
    H: StateHandlers<Event = E, Context = ActiveContext<E>>,
    E: Event,
{
    machine.lock().initialize(ctx);

    while let Some(event) = queue.take() {
        log::trace!("{}: dispatch {:?}", ctx.name(), event.signal());
        machine.lock().process_event(&event, ctx);
    }

    log::trace!("{}: event loop exited", ctx.name());
}

fn join_task(name: &str, handle: JoinHandle<()>) {
    if handle.join().is_err() {
        log::error!("{name}: event loop panicked");
    }
}
