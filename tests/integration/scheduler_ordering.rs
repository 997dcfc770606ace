//! Queue ordering: push, unshift, validation skips and resets from end routines.

use super::test_utils::{Script, Trace};
use turnstile::error::SchedulerError;
use turnstile::phase::PhaseState;
use turnstile::scheduler::{Progress, Scheduler, SchedulerEvent};

#[test]
fn test_pushed_phases_run_in_fifo_order() {
    let mut scheduler = Scheduler::default();
    let mut trace = Trace::default();
    scheduler.push(Script::Note("a"));
    scheduler.push(Script::Note("b"));
    scheduler.push(Script::Note("c"));

    assert_eq!(scheduler.advance(&mut trace).unwrap(), Progress::Idle);
    assert_eq!(trace.started(), vec!["a", "b", "c"]);
    assert_eq!(
        trace.log,
        vec!["start a", "end a", "start b", "end b", "start c", "end c"]
    );
    assert!(scheduler.is_idle());
}

#[test]
fn test_unshifted_children_run_before_queued_siblings() {
    let mut scheduler = Scheduler::default();
    let mut trace = Trace::default();
    scheduler.push(Script::Spawn("parent", vec!["x", "y"]));
    scheduler.push(Script::Note("sibling"));

    scheduler.advance(&mut trace).unwrap();
    assert_eq!(trace.started(), vec!["parent", "x", "y", "sibling"]);
}

#[test]
fn test_pushed_children_run_after_queued_siblings() {
    let mut scheduler = Scheduler::default();
    let mut trace = Trace::default();
    scheduler.push(Script::Append("parent", vec!["x"]));
    scheduler.push(Script::Note("sibling"));

    scheduler.advance(&mut trace).unwrap();
    assert_eq!(trace.started(), vec!["parent", "sibling", "x"]);
}

#[test]
fn test_host_unshift_jumps_the_queue() {
    let mut scheduler = Scheduler::default();
    let mut trace = Trace::default();
    scheduler.push(Script::Note("a"));
    scheduler.unshift(Script::Note("first"));

    scheduler.advance(&mut trace).unwrap();
    assert_eq!(trace.started(), vec!["first", "a"]);
}

#[test]
fn test_invalid_phase_is_skipped_without_side_effects() {
    let mut scheduler = Scheduler::default();
    let mut trace = Trace::default();
    let skipped = scheduler.push(Script::Skip("nope"));
    scheduler.push(Script::Note("after"));

    scheduler.advance(&mut trace).unwrap();
    assert_eq!(trace.log, vec!["start after", "end after"]);
    assert_eq!(scheduler.status(skipped), Some(PhaseState::Ended));
    assert_eq!(scheduler.stats().skipped, 1);
    assert_eq!(scheduler.stats().started, 1);
}

#[test]
fn test_clear_in_end_routine_halts_instead_of_advancing() {
    let mut scheduler = Scheduler::default();
    let mut trace = Trace::default();
    let reset = scheduler.push(Script::ResetOnEnd("reset", "fresh"));
    scheduler.push(Script::Note("stale"));

    let progress = scheduler.advance(&mut trace).unwrap();
    assert_eq!(progress, Progress::Halted { after: reset });
    assert_eq!(trace.started(), vec!["reset"]);
    assert_eq!(scheduler.queued().cloned().collect::<Vec<_>>(), vec![Script::Note("fresh")]);
    assert_eq!(scheduler.stats().discarded, 1);

    assert_eq!(scheduler.advance(&mut trace).unwrap(), Progress::Idle);
    assert_eq!(trace.started(), vec!["reset", "fresh"]);
}

#[test]
fn test_advance_while_suspended_is_rejected() {
    let mut scheduler = Scheduler::default();
    let mut trace = Trace::default();
    let waiting = scheduler.push(Script::Wait("wait"));
    scheduler.push(Script::Note("later"));

    let progress = scheduler.advance(&mut trace).unwrap();
    assert!(matches!(progress, Progress::Suspended { phase, .. } if phase == waiting));

    let err = scheduler.advance(&mut trace).unwrap_err();
    assert!(matches!(err, SchedulerError::PhaseInProgress { id, .. } if id == waiting));
    assert_eq!(trace.started(), vec!["wait"]);
}

#[test]
fn test_ending_a_phase_twice_is_rejected() {
    let mut scheduler = Scheduler::default();
    let mut trace = Trace::default();
    let waiting = scheduler.push(Script::Wait("wait"));
    let queued = scheduler.push(Script::Wait("queued"));
    scheduler.advance(&mut trace).unwrap();

    assert!(matches!(
        scheduler.end(queued, &mut trace),
        Err(SchedulerError::NotStarted(id)) if id == queued
    ));

    let progress = scheduler.end(waiting, &mut trace).unwrap();
    assert!(matches!(progress, Progress::Suspended { phase, .. } if phase == queued));
    assert!(matches!(
        scheduler.end(waiting, &mut trace),
        Err(SchedulerError::AlreadyEnded(id)) if id == waiting
    ));
    assert_eq!(trace.log.iter().filter(|line| *line == "end wait").count(), 1);
}

#[test]
fn test_failing_routine_faults_the_phase() {
    let mut scheduler = Scheduler::default();
    let mut trace = Trace::default();
    let broken = scheduler.push(Script::Broken("broken"));
    scheduler.push(Script::Note("after"));

    let err = scheduler.advance(&mut trace).unwrap_err();
    assert!(matches!(err, SchedulerError::PhaseFailed { id, .. } if id == broken));
    let current = scheduler.current().unwrap();
    assert!(current.faulted);
    assert_eq!(current.id, broken);

    // The host decides: end the faulted phase and carry on.
    assert_eq!(scheduler.end(broken, &mut trace).unwrap(), Progress::Idle);
    assert_eq!(trace.started(), vec!["broken", "after"]);
}

#[test]
fn test_journal_records_lifecycle() {
    let mut scheduler = Scheduler::default();
    let mut trace = Trace::default();
    scheduler.push(Script::Spawn("parent", vec!["child"]));
    scheduler.advance(&mut trace).unwrap();

    assert_eq!(scheduler.journal().started_names(), vec!["parent", "child"]);
    let enqueued_at_head = scheduler
        .journal()
        .events()
        .iter()
        .filter(|event| {
            matches!(
                event,
                SchedulerEvent::Enqueued {
                    placement: turnstile::scheduler::Placement::Head,
                    ..
                }
            )
        })
        .count();
    assert_eq!(enqueued_at_head, 1);

    let events = scheduler.take_journal();
    assert!(!events.is_empty());
    assert!(scheduler.journal().events().is_empty());
}
