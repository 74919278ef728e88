use super::{DriverError, LockDriver, SelfTestOutcome};

/// Stand-in for real lock hardware.
///
/// Logs every call and reports a fixed self-test outcome.
#[derive(Debug, Clone)]
pub struct SimulatedLockDriver {
    outcome: SelfTestOutcome,
    initialized: bool,
}

impl SimulatedLockDriver {
    pub fn new() -> Self {
        Self::with_outcome(SelfTestOutcome::Passed)
    }

    /// Simulated driver whose self-test reports `outcome`
    pub fn with_outcome(outcome: SelfTestOutcome) -> Self {
        Self {
            outcome,
            initialized: false,
        }
    }

    pub fn outcome(&self) -> SelfTestOutcome {
        self.outcome
    }

    fn ensure_initialized(&self) -> Result<(), DriverError> {
        if self.initialized {
            Ok(())
        } else {
            Err(DriverError::NotInitialized)
        }
    }
}

impl Default for SimulatedLockDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl LockDriver for SimulatedLockDriver {
    fn init(&mut self) -> Result<(), DriverError> {
        log::info!("lock driver init() executed");
        self.initialized = true;
        Ok(())
    }

    fn lock(&mut self) -> Result<(), DriverError> {
        self.ensure_initialized()?;
        log::info!("lock driver lock() executed");
        Ok(())
    }

    fn unlock(&mut self) -> Result<(), DriverError> {
        self.ensure_initialized()?;
        log::info!("lock driver unlock() executed");
        Ok(())
    }

    fn self_test(&mut self) -> Result<SelfTestOutcome, DriverError> {
        self.ensure_initialized()?;
        log::info!("lock driver self_test() executed: {}", self.outcome);
        Ok(self.outcome)
    }
}
