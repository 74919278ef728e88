#![forbid(unsafe_code)]

//! # AO Flat State Machine
//!
//! Flat (non-hierarchical) state machine engine. Provides:
//! - a one-shot initial pseudo-state that selects the first real state
//! - ENTER and EXIT events synthesized around every transition
//! - event dispatch to the handler of the current state
//!
//! States are identified by value. A concrete machine normally uses a
//! fieldless enum for its states and matches on it inside
//! [`StateHandlers::on_event`]. Whether a transition happened is decided by
//! comparing state values, so `TransitionTo(current)` behaves exactly like
//! `Handled` and fires neither EXIT nor ENTER.

use core::fmt;

use ao_core::Event;


/// State handler return codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateRtn<S> {
    /// Event was handled, stay in the current state
    Handled,
    /// Transition to the given state
    TransitionTo(S),
}

impl<S> StateRtn<S> {
    /// Check if this requests a transition
    pub fn is_transition(&self) -> bool {
        matches!(self, StateRtn::TransitionTo(_))
    }
}

/// Convenient return value for state handlers
pub const fn handled<S>() -> StateRtn<S> {
    StateRtn::Handled
}

/// Create a transition return value
pub const fn transition_to<S>(target: S) -> StateRtn<S> {
    StateRtn::TransitionTo(target)
}

/// The state handlers of a concrete flat state machine.
///
/// `Context` is whatever the handlers need besides their own fields, for
/// example a handle for posting follow-up events to their own queue.
pub trait StateHandlers {
    /// Event type processed by this machine
    type Event: Event;
    /// State identifier
    type State: Copy + Eq + fmt::Debug + Send + 'static;
    /// Extra context handed to every handler call
    type Context;

    /// One-time initialization.
    ///
    /// Invoked exactly once with an ENTER event. Must return
    /// `TransitionTo(first_state)`.
    fn initial_pseudo_state(
        &mut self,
        event: &Self::Event,
        ctx: &mut Self::Context,
    ) -> StateRtn<Self::State>;

    /// Handle `event` while in `state`.
    ///
    /// Unrecognized signals should return `Handled`.
    fn on_event(
        &mut self,
        state: Self::State,
        event: &Self::Event,
        ctx: &mut Self::Context,
    ) -> StateRtn<Self::State>;
}

/// Flat state machine execution context
pub struct FlatStateMachine<H: StateHandlers> {
    handlers: H,
    current: Option<H::State>,
    initialized: bool,
}

impl<H: StateHandlers> FlatStateMachine<H> {
    /// Create a new, uninitialized state machine
    pub const fn new(handlers: H) -> Self {
        Self {
            handlers,
            current: None,
            initialized: false,
        }
    }

    /// Get the current state, `None` before initialization
    pub fn current_state(&self) -> Option<H::State> {
        self.current
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn handlers(&self) -> &H {
        &self.handlers
    }

    pub fn handlers_mut(&mut self) -> &mut H {
        &mut self.handlers
    }

    pub fn into_handlers(self) -> H {
        self.handlers
    }

    /// Run the initial transition.
    ///
    /// # Panics
    ///
    /// Panics if the machine was already initialized, or if the initial
    /// pseudo-state returns `Handled` instead of a target state.
    pub fn initialize(&mut self, ctx: &mut H::Context) {
        assert!(
            !self.initialized && self.current.is_none(),
            "flat state machine initialized twice"
        );
        self.initialized = true;

        let enter = H::Event::enter();
        let first = match self.handlers.initial_pseudo_state(&enter, ctx) {
            StateRtn::TransitionTo(first) => first,
            StateRtn::Handled => {
                panic!("initial pseudo-state must return a transition to the first state")
            }
        };

        log::trace!("initial transition -> {:?}", first);
        self.current = Some(first);
        let _ = self.handlers.on_event(first, &enter, ctx);
    }

    /// Dispatch one event to the current state.
    ///
    /// # Panics
    ///
    /// Panics if called before [`FlatStateMachine::initialize`].
    pub fn process_event(&mut self, event: &H::Event, ctx: &mut H::Context) {
        let current = match self.current {
            Some(state) => state,
            None => panic!("event dispatched before the state machine was initialized"),
        };

        let target = match self.handlers.on_event(current, event, ctx) {
            StateRtn::TransitionTo(target) if target != current => target,
            _ => return,
        };

        self.transition(current, target, ctx);
    }

    /// Execute a state transition with exit/entry actions
    fn transition(&mut self, source: H::State, target: H::State, ctx: &mut H::Context) {
        log::trace!("transition {:?} -> {:?}", source, target);

        let _ = self.handlers.on_event(source, &H::Event::exit(), ctx);
        self.current = Some(target);
        let _ = self.handlers.on_event(target, &H::Event::enter(), ctx);
    }
}

impl<H> fmt::Debug for FlatStateMachine<H>
where
    H: StateHandlers,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlatStateMachine")
            .field("current", &self.current)
            .field("initialized", &self.initialized)
            .finish()
    }
}
