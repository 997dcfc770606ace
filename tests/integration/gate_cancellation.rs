//! Gate settlement: exactly-once delivery, rejection fallbacks and cancellation by reset.

use super::test_utils::{Script, Trace};
use turnstile::error::{GateError, SchedulerError};
use turnstile::gate::{ExternalFailure, GateState, GateValue};
use turnstile::scheduler::{Delivery, Progress, Scheduler};

#[test]
fn test_resolve_resumes_owner_then_advances() {
    let mut scheduler = Scheduler::default();
    let mut trace = Trace::default();
    scheduler.push(Script::Wait("wait"));
    scheduler.push(Script::Note("next"));
    scheduler.advance(&mut trace).unwrap();
    let gate = trace.gates[0];
    assert_eq!(scheduler.gate_state(gate), Some(GateState::Open));

    let delivery = scheduler
        .resolve(gate, GateValue::Choice(1), &mut trace)
        .unwrap();
    assert_eq!(delivery, Delivery::Resumed(Progress::Idle));
    assert_eq!(
        trace.log,
        vec![
            "start wait",
            "resume wait Choice(1)",
            "end wait",
            "start next",
            "end next"
        ]
    );
    assert_eq!(scheduler.gate_state(gate), Some(GateState::Resolved));
}

#[test]
fn test_second_settlement_is_an_error() {
    let mut scheduler = Scheduler::default();
    let mut trace = Trace::default();
    scheduler.push(Script::Wait("wait"));
    scheduler.advance(&mut trace).unwrap();
    let gate = trace.gates[0];

    scheduler.resolve(gate, GateValue::Ack, &mut trace).unwrap();
    let err = scheduler
        .reject(gate, ExternalFailure("late".to_string()), &mut trace)
        .unwrap_err();
    assert!(matches!(
        err,
        SchedulerError::Gate(GateError::AlreadySettled(id)) if id == gate.id()
    ));
    assert_eq!(trace.log.iter().filter(|line| line.starts_with("resume")).count(), 1);
}

#[test]
fn test_rejection_reaches_the_routine() {
    let mut scheduler = Scheduler::default();
    let mut trace = Trace::default();
    scheduler.push(Script::Wait("wait"));
    scheduler.advance(&mut trace).unwrap();
    let gate = trace.gates[0];

    scheduler
        .reject(gate, ExternalFailure("offline".to_string()), &mut trace)
        .unwrap();
    assert!(trace.log.contains(&"resume wait rejected offline".to_string()));
    assert_eq!(scheduler.gate_state(gate), Some(GateState::Rejected));
}

#[test]
fn test_clear_cancels_pending_gates() {
    let mut scheduler = Scheduler::default();
    let mut trace = Trace::default();
    scheduler.push(Script::Wait("wait"));
    scheduler.push(Script::Note("discarded"));
    scheduler.advance(&mut trace).unwrap();
    let gate = trace.gates[0];
    let before = scheduler.generation();

    assert_eq!(scheduler.clear(), 2);
    assert_ne!(scheduler.generation(), before);
    assert!(scheduler.is_idle());
    assert_eq!(scheduler.gate_state(gate), Some(GateState::Cancelled));

    let delivery = scheduler.resolve(gate, GateValue::Ack, &mut trace).unwrap();
    assert_eq!(delivery, Delivery::Ignored);
    assert_eq!(trace.started(), vec!["wait"]);
    assert_eq!(scheduler.stats().gates_ignored, 1);
}

#[test]
fn test_detached_continuation_runs_once_without_an_owner() {
    let mut scheduler = Scheduler::default();
    let mut trace = Trace::default();
    scheduler.push(Script::Fire("fire", "late"));
    assert_eq!(scheduler.advance(&mut trace).unwrap(), Progress::Idle);
    let gate = trace.gates[0];

    let delivery = scheduler.resolve(gate, GateValue::Ack, &mut trace).unwrap();
    assert_eq!(delivery, Delivery::Detached);
    assert!(trace.log.contains(&"detached late rejected=false".to_string()));
    assert_eq!(scheduler.len(), 1);

    scheduler.advance(&mut trace).unwrap();
    assert_eq!(trace.started(), vec!["fire", "late"]);
}

#[test]
fn test_detached_continuation_is_inert_after_reset() {
    let mut scheduler = Scheduler::default();
    let mut trace = Trace::default();
    scheduler.push(Script::Fire("fire", "late"));
    scheduler.advance(&mut trace).unwrap();
    let gate = trace.gates[0];

    scheduler.clear();
    let delivery = scheduler
        .reject(gate, ExternalFailure("gone".to_string()), &mut trace)
        .unwrap();
    assert_eq!(delivery, Delivery::Ignored);
    assert!(!trace.log.iter().any(|line| line.starts_with("detached")));
    assert!(scheduler.is_empty());
}

#[test]
fn test_ending_the_owner_cancels_its_gate() {
    let mut scheduler = Scheduler::default();
    let mut trace = Trace::default();
    let waiting = scheduler.push(Script::Wait("wait"));
    scheduler.advance(&mut trace).unwrap();
    let gate = trace.gates[0];

    scheduler.end(waiting, &mut trace).unwrap();
    assert_eq!(scheduler.gate_state(gate), Some(GateState::Cancelled));
    assert_eq!(
        scheduler.resolve(gate, GateValue::Ack, &mut trace).unwrap(),
        Delivery::Ignored
    );
    assert_eq!(scheduler.open_gates(), 0);
}
