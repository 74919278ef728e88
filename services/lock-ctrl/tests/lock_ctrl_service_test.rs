//! Behavior of the lock controller observed only through its driver calls,
//! callbacks and published state.

mod common;

use std::sync::mpsc;
use std::time::Duration;

use ao_active::{ActiveConfig, ExecutionMode, ThreadPriority};
use ao_core::AoError;
use common::{Harness, Record};
use lock_ctrl_service::{
    signals, DriverError, LockCtrlService, LockCtrlState, LockState, SelfTestOutcome,
    SelfTestResult, ServiceEvent, SimulatedLockDriver, SERVICES_EVENT_QUEUE_DEPTH,
};

fn start_service_to_locked(h: &mut Harness) {
    h.service.start(ExecutionMode::Manual).unwrap();
    h.give_processing_time();

    assert_eq!(
        h.journal.take(),
        vec![
            Record::Init,
            Record::Lock,
            Record::StateChanged(LockState::Locked)
        ]
    );
    assert_eq!(h.service.get_state(), LockState::Locked);
}

fn unlock(h: &mut Harness) {
    h.service.request_unlocked_async().unwrap();
    h.give_processing_time();

    assert_eq!(
        h.journal.take(),
        vec![Record::Unlock, Record::StateChanged(LockState::Unlocked)]
    );
    assert_eq!(h.service.get_state(), LockState::Unlocked);
}

fn start_service_to_unlocked(h: &mut Harness) {
    start_service_to_locked(h);
    unlock(h);
}

#[test]
fn create_does_not_touch_the_driver() {
    let h = Harness::new();

    assert_eq!(h.service.get_state(), LockState::Unknown);
    assert_eq!(h.service.current_state(), None);
    assert!(h.journal.take().is_empty());
}

#[test]
fn start_locks_the_lock() {
    let mut h = Harness::new();
    start_service_to_locked(&mut h);
    assert_eq!(h.service.current_state(), Some(LockCtrlState::Locked));
}

#[test]
fn when_already_locked_another_lock_request_is_silent() {
    let mut h = Harness::new();
    start_service_to_locked(&mut h);

    h.service.request_locked_async().unwrap();
    h.give_processing_time();

    assert!(h.journal.take().is_empty());
    assert_eq!(h.service.get_state(), LockState::Locked);
}

#[test]
fn when_locked_unlock_is_processed_as_expected() {
    let mut h = Harness::new();
    start_service_to_locked(&mut h);
    unlock(&mut h);
}

#[test]
fn when_already_unlocked_another_unlock_request_is_silent() {
    let mut h = Harness::new();
    start_service_to_unlocked(&mut h);

    h.service.request_unlocked_async().unwrap();
    h.give_processing_time();

    assert!(h.journal.take().is_empty());
    assert_eq!(h.service.get_state(), LockState::Unlocked);
}

#[test]
fn when_unlocked_lock_is_processed_as_expected() {
    let mut h = Harness::new();
    start_service_to_unlocked(&mut h);

    h.service.request_locked_async().unwrap();
    h.give_processing_time();

    assert_eq!(
        h.journal.take(),
        vec![Record::Lock, Record::StateChanged(LockState::Locked)]
    );
    assert_eq!(h.service.get_state(), LockState::Locked);
}

#[test]
fn when_locked_self_test_operates_and_returns_to_locked() {
    let mut h = Harness::new();
    start_service_to_locked(&mut h);

    h.script.expect(Ok(SelfTestOutcome::Passed));
    h.service.request_self_test_async().unwrap();
    h.give_processing_time();

    assert_eq!(
        h.journal.take(),
        vec![
            Record::SelfTest,
            Record::SelfTestResult(SelfTestResult::Pass),
            Record::Lock,
            Record::StateChanged(LockState::Locked),
        ]
    );
    assert_eq!(h.service.current_state(), Some(LockCtrlState::Locked));
}

#[test]
fn when_unlocked_self_test_operates_and_returns_to_unlocked() {
    let mut h = Harness::new();
    start_service_to_unlocked(&mut h);

    h.script.expect(Ok(SelfTestOutcome::Passed));
    h.service.request_self_test_async().unwrap();
    h.give_processing_time();

    assert_eq!(
        h.journal.take(),
        vec![
            Record::SelfTest,
            Record::SelfTestResult(SelfTestResult::Pass),
            Record::Unlock,
            Record::StateChanged(LockState::Unlocked),
        ]
    );
    assert_eq!(h.service.get_state(), LockState::Unlocked);
}

#[test]
fn when_locked_a_failed_self_test_operates_and_still_returns_to_locked() {
    let mut h = Harness::new();
    start_service_to_locked(&mut h);

    h.script.expect(Ok(SelfTestOutcome::FailedPower));
    h.service.request_self_test_async().unwrap();
    h.give_processing_time();

    assert_eq!(
        h.journal.take(),
        vec![
            Record::SelfTest,
            Record::SelfTestResult(SelfTestResult::Fail),
            Record::Lock,
            Record::StateChanged(LockState::Locked),
        ]
    );
}

#[test]
fn when_unlocked_a_failed_self_test_operates_and_still_returns_to_unlocked() {
    let mut h = Harness::new();
    start_service_to_unlocked(&mut h);

    h.script.expect(Ok(SelfTestOutcome::FailedMotor));
    h.service.request_self_test_async().unwrap();
    h.give_processing_time();

    assert_eq!(
        h.journal.take(),
        vec![
            Record::SelfTest,
            Record::SelfTestResult(SelfTestResult::Fail),
            Record::Unlock,
            Record::StateChanged(LockState::Unlocked),
        ]
    );
}

#[test]
fn a_self_test_that_cannot_run_reports_fail() {
    let mut h = Harness::new();
    start_service_to_unlocked(&mut h);

    h.script.expect(Err(DriverError::NoResponse));
    h.service.request_self_test_async().unwrap();
    h.give_processing_time();

    assert_eq!(
        h.journal.take(),
        vec![
            Record::SelfTest,
            Record::SelfTestResult(SelfTestResult::Fail),
            Record::Unlock,
            Record::StateChanged(LockState::Unlocked),
        ]
    );
}

#[test]
fn restore_runs_ahead_of_requests_queued_during_self_test() {
    let mut h = Harness::new();
    start_service_to_unlocked(&mut h);

    h.service.request_self_test_async().unwrap();
    h.service.request_locked_async().unwrap();
    h.give_processing_time();

    assert_eq!(
        h.journal.take(),
        vec![
            Record::SelfTest,
            Record::SelfTestResult(SelfTestResult::Pass),
            Record::Unlock,
            Record::StateChanged(LockState::Unlocked),
            Record::Lock,
            Record::StateChanged(LockState::Locked),
        ]
    );
}

#[test]
fn self_test_requested_during_self_test_runs_after_restore() {
    let mut h = Harness::new();
    start_service_to_locked(&mut h);

    h.service.request_self_test_async().unwrap();
    assert!(h.service.process_one_event(ExecutionMode::Manual));
    assert_eq!(h.service.current_state(), Some(LockCtrlState::SelfTest));
    assert_eq!(
        h.journal.take(),
        vec![Record::SelfTest, Record::SelfTestResult(SelfTestResult::Pass)]
    );

    // The restore request is already queued ahead of this one.
    h.service
        .post(ServiceEvent::new(signals::REQUEST_SELF_TEST))
        .unwrap();
    h.give_processing_time();

    assert_eq!(
        h.journal.take(),
        vec![
            Record::Lock,
            Record::StateChanged(LockState::Locked),
            Record::SelfTest,
            Record::SelfTestResult(SelfTestResult::Pass),
            Record::Lock,
            Record::StateChanged(LockState::Locked),
        ]
    );
    assert_eq!(h.service.current_state(), Some(LockCtrlState::Locked));
}

#[test]
fn end_to_end_unlock_self_test_lock() {
    let mut h = Harness::new();
    h.service.start(ExecutionMode::Manual).unwrap();
    h.give_processing_time();

    h.service.request_unlocked_async().unwrap();
    h.give_processing_time();
    h.service.request_self_test_async().unwrap();
    h.give_processing_time();
    h.service.request_locked_async().unwrap();
    h.give_processing_time();

    assert_eq!(
        h.journal.take(),
        vec![
            Record::Init,
            Record::Lock,
            Record::StateChanged(LockState::Locked),
            Record::Unlock,
            Record::StateChanged(LockState::Unlocked),
            Record::SelfTest,
            Record::SelfTestResult(SelfTestResult::Pass),
            Record::Unlock,
            Record::StateChanged(LockState::Unlocked),
            Record::Lock,
            Record::StateChanged(LockState::Locked),
        ]
    );
    assert_eq!(h.service.get_state(), LockState::Locked);
}

#[test]
fn full_queue_rejects_requests() {
    let mut h = Harness::new();
    start_service_to_locked(&mut h);

    for _ in 0..SERVICES_EVENT_QUEUE_DEPTH {
        h.service.request_locked_async().unwrap();
    }
    assert_eq!(h.service.pending(), SERVICES_EVENT_QUEUE_DEPTH);
    assert_eq!(
        h.service.request_unlocked_async(),
        Err(AoError::QueueFull {
            capacity: SERVICES_EVENT_QUEUE_DEPTH
        })
    );

    h.give_processing_time();
    assert!(h.journal.take().is_empty());
}

#[test]
fn requests_after_stop_are_rejected() {
    let mut h = Harness::new();
    start_service_to_locked(&mut h);

    h.service.stop();
    assert_eq!(h.service.request_unlocked_async(), Err(AoError::QueueClosed));
    assert_eq!(h.service.start(ExecutionMode::Manual), Err(AoError::Stopped));
}

#[test]
fn background_service_processes_requests() {
    let (tx, rx) = mpsc::channel();
    let result_tx = tx.clone();
    let config = ActiveConfig::builder()
        .name("lock-ctrl-bg")
        .priority(ThreadPriority::High)
        .build();

    let mut service = LockCtrlService::builder(SimulatedLockDriver::new())
        .config(config)
        .on_state_change(move |state| {
            let _ = tx.send(format!("state {state}"));
        })
        .on_self_test_result(move |result| {
            let _ = result_tx.send(format!("self-test {result}"));
        })
        .build();

    service.start(ExecutionMode::Background).unwrap();
    let timeout = Duration::from_secs(2);
    assert_eq!(rx.recv_timeout(timeout).unwrap(), "state Locked");

    service.request_unlocked_async().unwrap();
    assert_eq!(rx.recv_timeout(timeout).unwrap(), "state Unlocked");

    service.request_self_test_async().unwrap();
    assert_eq!(rx.recv_timeout(timeout).unwrap(), "self-test Pass");
    assert_eq!(rx.recv_timeout(timeout).unwrap(), "state Unlocked");

    assert_eq!(service.get_state(), LockState::Unlocked);
    assert_eq!(service.name(), "lock-ctrl-bg");
    assert!(service.with_driver(|driver| driver.outcome().is_pass()));

    service.stop();
}

#[test]
fn history_follows_the_last_exited_lock_state() {
    let mut h = Harness::new();
    start_service_to_locked(&mut h);
    assert_eq!(h.service.history(), LockCtrlState::Locked);

    unlock(&mut h);
    assert_eq!(h.service.history(), LockCtrlState::Locked);

    h.service.request_self_test_async().unwrap();
    h.give_processing_time();
    assert_eq!(h.service.history(), LockCtrlState::Unlocked);
    assert_eq!(h.service.current_state(), Some(LockCtrlState::Unlocked));
}

#[test]
fn urgent_post_runs_ahead_of_queued_requests() {
    let mut h = Harness::new();
    start_service_to_locked(&mut h);

    h.service.request_unlocked_async().unwrap();
    h.service
        .post_urgent(ServiceEvent::new(signals::REQUEST_SELF_TEST))
        .unwrap();
    assert_eq!(h.service.pending(), 2);
    h.give_processing_time();

    assert_eq!(
        h.journal.take(),
        vec![
            Record::SelfTest,
            Record::SelfTestResult(SelfTestResult::Pass),
            Record::Lock,
            Record::StateChanged(LockState::Locked),
            Record::Unlock,
            Record::StateChanged(LockState::Unlocked),
        ]
    );
    assert_eq!(h.service.get_state(), LockState::Unlocked);
}
