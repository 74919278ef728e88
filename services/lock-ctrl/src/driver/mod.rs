//! Lock hardware driver interface.

mod sim;

pub use sim::SimulatedLockDriver;

use core::fmt;

use thiserror::Error;

/// Outcome of a completed driver self-test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SelfTestOutcome {
    Passed,
    FailedPower,
    FailedMotor,
}

impl SelfTestOutcome {
    pub fn is_pass(self) -> bool {
        self == SelfTestOutcome::Passed
    }
}

impl fmt::Display for SelfTestOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelfTestOutcome::Passed => write!(f, "passed"),
            SelfTestOutcome::FailedPower => write!(f, "failed (power)"),
            SelfTestOutcome::FailedMotor => write!(f, "failed (motor)"),
        }
    }
}

/// Driver-level failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DriverError {
    #[error("lock driver is not initialized")]
    NotInitialized,
    #[error("lock hardware did not respond")]
    NoResponse,
    #[error("self-test could not be executed: {0}")]
    SelfTestUnavailable(String),
}

/// Low-level lock hardware.
///
/// Owned by the lock controller's state machine and only ever called from
/// its execution context.
pub trait LockDriver: Send + 'static {
    /// Initialize the hardware. Lock position is undefined afterwards.
    fn init(&mut self) -> Result<(), DriverError>;

    fn lock(&mut self) -> Result<(), DriverError>;

    fn unlock(&mut self) -> Result<(), DriverError>;

    /// Run a self-test. The lock is left locked when it completes.
    fn self_test(&mut self) -> Result<SelfTestOutcome, DriverError>;
}

impl<D: LockDriver + ?Sized> LockDriver for Box<D> {
    fn init(&mut self) -> Result<(), DriverError> {
        (**self).init()
    }

    fn lock(&mut self) -> Result<(), DriverError> {
        (**self).lock()
    }

    fn unlock(&mut self) -> Result<(), DriverError> {
        (**self).unlock()
    }

    fn self_test(&mut self) -> Result<SelfTestOutcome, DriverError> {
        (**self).self_test()
    }
}
