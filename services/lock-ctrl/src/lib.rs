#![forbid(unsafe_code)]

//! # Lock Controller Service
//!
//! A lock controller implemented as an active object. Requests are queued
//! and handled by a flat state machine with `Locked`, `Unlocked` and
//! `SelfTest` states:
//!
//! - starting the service initializes the driver and locks the lock
//! - a self-test publishes its result and then restores the lock to the
//!   position it had before the test
//! - repeated lock or unlock requests are silent
//!
//! ```no_run
//! use ao_active::ExecutionMode;
//! use lock_ctrl_service::{LockCtrlService, SimulatedLockDriver};
//!
//! let mut service = LockCtrlService::builder(SimulatedLockDriver::new())
//!     .on_state_change(|state| println!("lock is now {state}"))
//!     .build();
//! service.start(ExecutionMode::Background)?;
//! service.request_unlocked_async()?;
//! service.stop();
//! # Ok::<(), ao_core::AoError>(())
//! ```

pub mod driver;
pub mod service;

pub use driver::{DriverError, LockDriver, SelfTestOutcome, SimulatedLockDriver};
pub use service::{
    signals, ChangeStateCallback, LockCtrlMachine, LockCtrlService, LockCtrlServiceBuilder,
    LockCtrlState, LockState, SelfTestResult, SelfTestResultCallback, ServiceEvent,
    SERVICES_EVENT_QUEUE_DEPTH,
};
