//! Shared test doubles for lock controller tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use lock_ctrl_service::{
    DriverError, LockCtrlService, LockDriver, LockState, SelfTestOutcome, SelfTestResult,
};

/// Everything observable from outside the service, in call order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    Init,
    Lock,
    Unlock,
    SelfTest,
    StateChanged(LockState),
    SelfTestResult(SelfTestResult),
}

/// Shared, ordered log of driver calls and callback invocations
#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<Record>>>);

impl Journal {
    pub fn push(&self, record: Record) {
        self.0.lock().unwrap().push(record);
    }

    pub fn take(&self) -> Vec<Record> {
        std::mem::take(&mut *self.0.lock().unwrap())
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }
}

/// Driver double recording every call into a [`Journal`].
///
/// Self-test results are consumed from a script; an empty script passes.
#[derive(Debug)]
pub struct MockLockDriver {
    journal: Journal,
    self_test_script: Arc<Mutex<VecDeque<Result<SelfTestOutcome, DriverError>>>>,
}

impl MockLockDriver {
    pub fn new(journal: Journal) -> Self {
        Self {
            journal,
            self_test_script: Arc::default(),
        }
    }

    /// Handle for scripting self-test results after the driver moved into a service
    pub fn script(&self) -> SelfTestScript {
        SelfTestScript(Arc::clone(&self.self_test_script))
    }
}

#[derive(Debug, Clone)]
pub struct SelfTestScript(Arc<Mutex<VecDeque<Result<SelfTestOutcome, DriverError>>>>);

impl SelfTestScript {
    pub fn expect(&self, result: Result<SelfTestOutcome, DriverError>) {
        self.0.lock().unwrap().push_back(result);
    }
}

impl LockDriver for MockLockDriver {
    fn init(&mut self) -> Result<(), DriverError> {
        self.journal.push(Record::Init);
        Ok(())
    }

    fn lock(&mut self) -> Result<(), DriverError> {
        self.journal.push(Record::Lock);
        Ok(())
    }

    fn unlock(&mut self) -> Result<(), DriverError> {
        self.journal.push(Record::Unlock);
        Ok(())
    }

    fn self_test(&mut self) -> Result<SelfTestOutcome, DriverError> {
        self.journal.push(Record::SelfTest);
        self.self_test_script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(SelfTestOutcome::Passed))
    }
}

/// Service wired to a recording driver and recording callbacks
pub struct Harness {
    pub service: LockCtrlService<MockLockDriver>,
    pub journal: Journal,
    pub script: SelfTestScript,
}

impl Harness {
    pub fn new() -> Self {
        let journal = Journal::default();
        let driver = MockLockDriver::new(journal.clone());
        let script = driver.script();

        let on_state = journal.clone();
        let on_result = journal.clone();
        let service = LockCtrlService::builder(driver)
            .on_state_change(move |state| on_state.push(Record::StateChanged(state)))
            .on_self_test_result(move |result| on_result.push(Record::SelfTestResult(result)))
            .build();

        Self {
            service,
            journal,
            script,
        }
    }

    /// Drain the queue on the calling thread
    pub fn give_processing_time(&self) {
        while self
            .service
            .process_one_event(ao_active::ExecutionMode::Manual)
        {}
    }
}
