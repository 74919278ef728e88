//! Lock controller service.
//!
//! Higher level lock behavior on top of a [`LockDriver`]. After a self-test
//! the lock automatically returns to whichever of Locked/Unlocked it was in
//! before the test started.

use core::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use ao_active::{ActiveConfig, ActiveContext, ActiveObject, ExecutionMode, ThreadPriority};
use ao_core::{AoResult, BaseEvent};
use ao_fsm::{handled, transition_to, StateHandlers, StateRtn};

use crate::driver::LockDriver;

/// Event queue depth for service active objects
pub const SERVICES_EVENT_QUEUE_DEPTH: usize = 10;

/// Event type processed by services
pub type ServiceEvent = BaseEvent<u32>;

/// Lock controller signals
pub mod signals {
    pub use ao_core::signals::{ENTER, EXIT};

    pub const REQUEST_LOCKED: u32 = ao_core::signals::USER;
    pub const REQUEST_UNLOCKED: u32 = ao_core::signals::USER + 1;
    pub const REQUEST_SELF_TEST: u32 = ao_core::signals::USER + 2;
}

/// Externally visible lock position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum LockState {
    #[default]
    Unknown = 0,
    Locked = 1,
    Unlocked = 2,
}

impl LockState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => LockState::Locked,
            2 => LockState::Unlocked,
            _ => LockState::Unknown,
        }
    }
}

impl fmt::Display for LockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockState::Unknown => write!(f, "Unknown"),
            LockState::Locked => write!(f, "Locked"),
            LockState::Unlocked => write!(f, "Unlocked"),
        }
    }
}

/// Published result of a self-test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SelfTestResult {
    Pass,
    Fail,
}

impl fmt::Display for SelfTestResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelfTestResult::Pass => write!(f, "Pass"),
            SelfTestResult::Fail => write!(f, "Fail"),
        }
    }
}

/// Invoked on the service's execution context whenever the lock state changes
pub type ChangeStateCallback = Box<dyn Fn(LockState) + Send>;

/// Invoked on the service's execution context when a self-test completes
pub type SelfTestResultCallback = Box<dyn Fn(SelfTestResult) + Send>;

/// Lock-free mirror of the current [`LockState`]
#[derive(Debug, Default)]
struct SharedLockState(AtomicU8);

impl SharedLockState {
    fn load(&self) -> LockState {
        LockState::from_u8(self.0.load(Ordering::Acquire))
    }

    fn store(&self, state: LockState) {
        self.0.store(state as u8, Ordering::Release);
    }
}

/// States of the lock controller machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockCtrlState {
    Locked,
    Unlocked,
    SelfTest,
}

/// State handlers of the lock controller
pub struct LockCtrlMachine<D> {
    driver: D,
    history: LockCtrlState,
    state: Arc<SharedLockState>,
    on_state_change: Option<ChangeStateCallback>,
    on_self_test_result: Option<SelfTestResultCallback>,
}

impl<D: LockDriver> LockCtrlMachine<D> {
    /// Driver owned by the machine
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Locked/Unlocked state the machine returns to after a self-test
    pub fn history(&self) -> LockCtrlState {
        self.history
    }

    fn locked(&mut self, event: &ServiceEvent) -> StateRtn<LockCtrlState> {
        match event.signal() {
            signals::ENTER => {
                if let Err(err) = self.driver.lock() {
                    log::warn!("lock request failed: {err}");
                }
                self.notify_changed_state(LockState::Locked);
                handled()
            }
            signals::EXIT => {
                self.history = LockCtrlState::Locked;
                handled()
            }
            signals::REQUEST_UNLOCKED => transition_to(LockCtrlState::Unlocked),
            signals::REQUEST_SELF_TEST => transition_to(LockCtrlState::SelfTest),
            _ => handled(),
        }
    }

    fn unlocked(&mut self, event: &ServiceEvent) -> StateRtn<LockCtrlState> {
        match event.signal() {
            signals::ENTER => {
                if let Err(err) = self.driver.unlock() {
                    log::warn!("unlock request failed: {err}");
                }
                self.notify_changed_state(LockState::Unlocked);
                handled()
            }
            signals::EXIT => {
                self.history = LockCtrlState::Unlocked;
                handled()
            }
            signals::REQUEST_LOCKED => transition_to(LockCtrlState::Locked),
            signals::REQUEST_SELF_TEST => transition_to(LockCtrlState::SelfTest),
            _ => handled(),
        }
    }

    fn self_test(
        &mut self,
        event: &ServiceEvent,
        ctx: &mut ActiveContext<ServiceEvent>,
    ) -> StateRtn<LockCtrlState> {
        match event.signal() {
            signals::ENTER => {
                let result = match self.driver.self_test() {
                    Ok(outcome) if outcome.is_pass() => SelfTestResult::Pass,
                    Ok(outcome) => {
                        log::warn!("self-test {outcome}");
                        SelfTestResult::Fail
                    }
                    Err(err) => {
                        log::warn!("self-test did not run: {err}");
                        SelfTestResult::Fail
                    }
                };
                self.notify_self_test_result(result);

                // Leave SelfTest via the queue, ahead of anything already waiting.
                let restore = match self.history {
                    LockCtrlState::Unlocked => signals::REQUEST_UNLOCKED,
                    _ => signals::REQUEST_LOCKED,
                };
                if let Err(err) = ctx.post_urgent(ServiceEvent::new(restore)) {
                    log::error!("{}: failed to restore state after self-test: {err}", ctx.name());
                }
                handled()
            }
            signals::REQUEST_LOCKED => transition_to(LockCtrlState::Locked),
            signals::REQUEST_UNLOCKED => transition_to(LockCtrlState::Unlocked),
            _ => handled(),
        }
    }

    fn notify_changed_state(&self, state: LockState) {
        self.state.store(state);
        if let Some(callback) = &self.on_state_change {
            callback(state);
        }
    }

    fn notify_self_test_result(&self, result: SelfTestResult) {
        if let Some(callback) = &self.on_self_test_result {
            callback(result);
        }
    }
}

impl<D: LockDriver> StateHandlers for LockCtrlMachine<D> {
    type Event = ServiceEvent;
    type State = LockCtrlState;
    type Context = ActiveContext<ServiceEvent>;

    fn initial_pseudo_state(
        &mut self,
        _event: &ServiceEvent,
        _ctx: &mut ActiveContext<ServiceEvent>,
    ) -> StateRtn<LockCtrlState> {
        if let Err(err) = self.driver.init() {
            log::warn!("lock driver init failed: {err}");
        }
        transition_to(LockCtrlState::Locked)
    }

    fn on_event(
        &mut self,
        state: LockCtrlState,
        event: &ServiceEvent,
        ctx: &mut ActiveContext<ServiceEvent>,
    ) -> StateRtn<LockCtrlState> {
        match state {
            LockCtrlState::Locked => self.locked(event),
            LockCtrlState::Unlocked => self.unlocked(event),
            LockCtrlState::SelfTest => self.self_test(event, ctx),
        }
    }
}

impl<D> fmt::Debug for LockCtrlMachine<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockCtrlMachine")
            .field("history", &self.history)
            .field("state", &self.state.load())
            .field("on_state_change", &self.on_state_change.is_some())
            .field("on_self_test_result", &self.on_self_test_result.is_some())
            .finish()
    }
}

type LockCtrlActive<D> = ActiveObject<LockCtrlMachine<D>, ServiceEvent, SERVICES_EVENT_QUEUE_DEPTH>;

/// Lock controller service.
///
/// An active object whose requests are asynchronous: they are queued and
/// take effect on the service's execution context. Results are reported
/// through the callbacks given to [`LockCtrlServiceBuilder`] and through
/// [`LockCtrlService::get_state`].
#[derive(Debug)]
pub struct LockCtrlService<D: LockDriver> {
    active: LockCtrlActive<D>,
    state: Arc<SharedLockState>,
}

impl<D: LockDriver> LockCtrlService<D> {
    /// Creates a new service builder.
    pub fn builder(driver: D) -> LockCtrlServiceBuilder<D> {
        LockCtrlServiceBuilder::new(driver)
    }

    /// Service without callbacks and with the default configuration
    pub fn new(driver: D) -> Self {
        Self::builder(driver).build()
    }

    /// Start the service. The driver is initialized and the lock locked.
    pub fn start(&mut self, mode: ExecutionMode) -> AoResult<()> {
        self.active.start(mode)
    }

    pub fn stop(&mut self) {
        self.active.stop();
    }

    pub fn post(&self, event: ServiceEvent) -> AoResult<()> {
        self.active.post(event)
    }

    pub fn post_urgent(&self, event: ServiceEvent) -> AoResult<()> {
        self.active.post_urgent(event)
    }

    /// Current lock state, readable from any thread
    pub fn get_state(&self) -> LockState {
        self.state.load()
    }

    pub fn request_locked_async(&self) -> AoResult<()> {
        self.request(signals::REQUEST_LOCKED)
    }

    pub fn request_unlocked_async(&self) -> AoResult<()> {
        self.request(signals::REQUEST_UNLOCKED)
    }

    pub fn request_self_test_async(&self) -> AoResult<()> {
        self.request(signals::REQUEST_SELF_TEST)
    }

    fn request(&self, signal: u32) -> AoResult<()> {
        let result = self.active.post(ServiceEvent::new(signal));
        if let Err(err) = &result {
            log::warn!("{}: request {signal} dropped: {err}", self.active.name());
        }
        result
    }

    /// Dispatch a single queued event, see [`ActiveObject::process_one_event`]
    pub fn process_one_event(&self, mode: ExecutionMode) -> bool {
        self.active.process_one_event(mode)
    }

    pub fn set_priority(&mut self, priority: ThreadPriority) {
        self.active.set_priority(priority);
    }

    pub fn name(&self) -> &str {
        self.active.name()
    }

    /// Get the number of requests waiting to be processed
    pub fn pending(&self) -> usize {
        self.active.pending()
    }

    /// Current state machine state, `None` before start
    pub fn current_state(&self) -> Option<LockCtrlState> {
        self.active.current_state()
    }

    /// Locked/Unlocked state a self-test returns to
    pub fn history(&self) -> LockCtrlState {
        self.active.with_handlers(|machine| machine.history())
    }

    /// Run `f` against the driver owned by the service
    pub fn with_driver<R>(&self, f: impl FnOnce(&D) -> R) -> R {
        self.active.with_handlers(|machine| f(machine.driver()))
    }
}

/// Builder for [`LockCtrlService`].
pub struct LockCtrlServiceBuilder<D> {
    driver: D,
    config: ActiveConfig,
    on_state_change: Option<ChangeStateCallback>,
    on_self_test_result: Option<SelfTestResultCallback>,
}

impl<D: LockDriver> LockCtrlServiceBuilder<D> {
    fn new(driver: D) -> Self {
        Self {
            driver,
            config: ActiveConfig::builder().name("lock-ctrl").build(),
            on_state_change: None,
            on_self_test_result: None,
        }
    }

    /// Sets the active object configuration.
    pub fn config(mut self, config: ActiveConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the lock state change callback.
    pub fn on_state_change(mut self, callback: impl Fn(LockState) + Send + 'static) -> Self {
        self.on_state_change = Some(Box::new(callback));
        self
    }

    /// Sets the self-test result callback.
    pub fn on_self_test_result(
        mut self,
        callback: impl Fn(SelfTestResult) + Send + 'static,
    ) -> Self {
        self.on_self_test_result = Some(Box::new(callback));
        self
    }

    /// Builds the service. It stays idle until started.
    pub fn build(self) -> LockCtrlService<D> {
        let state = Arc::new(SharedLockState::default());
        let machine = LockCtrlMachine {
            driver: self.driver,
            history: LockCtrlState::Locked,
            state: Arc::clone(&state),
            on_state_change: self.on_state_change,
            on_self_test_result: self.on_self_test_result,
        };

        LockCtrlService {
            active: ActiveObject::with_config(machine, self.config),
            state,
        }
    }
}

impl<D> fmt::Debug for LockCtrlServiceBuilder<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockCtrlServiceBuilder")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
