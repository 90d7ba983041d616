use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::*;
use crate::release::scheduler::{ReleaseScheduler, ReleaseSchedulerOpts, ReleaseState};

fn schedule_counting(
    scheduler: &ReleaseScheduler,
    state: &ReleaseState,
    runs: &Arc<AtomicUsize>,
) -> bool {
    let r = Arc::clone(runs);
    scheduler.schedule_deferred_release(
        state,
        Box::new(move || {
            r.fetch_add(1, Ordering::SeqCst);
        }),
    )
}

#[test]
fn frame_trigger_clamps_zero_frames() {
    assert_eq!(FrameTrigger::new(0).frames_in_flight(), 1);
}

#[test]
fn frame_trigger_fires_each_ticket_when_due() {
    let trigger = Arc::new(FrameTrigger::new(1));
    let scheduler = ReleaseScheduler::with_trigger(ReleaseSchedulerOpts::default(), trigger.clone());
    let runs = Arc::new(AtomicUsize::new(0));
    let a = scheduler.create_release_state();
    let b = scheduler.create_release_state();

    schedule_counting(&scheduler, &a, &runs);
    assert_eq!(trigger.on_frame_completed(), 1);
    schedule_counting(&scheduler, &b, &runs);
    assert_eq!(trigger.armed_len(), 1);
    assert_eq!(trigger.on_frame_completed(), 1);
    assert_eq!(trigger.current_frame(), 2);
    assert_eq!(runs.load(Ordering::SeqCst), 2);
}

#[test]
fn frame_trigger_flush_fires_everything() {
    let trigger = Arc::new(FrameTrigger::new(10));
    let scheduler = ReleaseScheduler::with_trigger(ReleaseSchedulerOpts::default(), trigger.clone());
    let runs = Arc::new(AtomicUsize::new(0));
    let a = scheduler.create_release_state();
    let b = scheduler.create_release_state();

    schedule_counting(&scheduler, &a, &runs);
    schedule_counting(&scheduler, &b, &runs);
    scheduler.cancel_all_releasing(&b);

    assert_eq!(scheduler.flush(), 1);
    assert_eq!(trigger.armed_len(), 0);
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

#[test]
fn manual_trigger_only_fires_on_request() {
    let trigger = Arc::new(ManualTrigger::new());
    let scheduler = ReleaseScheduler::with_trigger(ReleaseSchedulerOpts::default(), trigger.clone());
    let runs = Arc::new(AtomicUsize::new(0));
    let state = scheduler.create_release_state();

    schedule_counting(&scheduler, &state, &runs);
    assert_eq!(scheduler.signal_frame_completed(), 0);
    assert_eq!(runs.load(Ordering::SeqCst), 0);
    assert_eq!(trigger.fire_all(), 1);
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

#[test]
fn frame_trigger_saturates_huge_frame_counts() {
    let trigger = Arc::new(FrameTrigger::new(u64::MAX));
    let scheduler = ReleaseScheduler::with_trigger(ReleaseSchedulerOpts::default(), trigger.clone());
    let runs = Arc::new(AtomicUsize::new(0));
    let state = scheduler.create_release_state();

    assert_eq!(trigger.on_frame_completed(), 0);
    assert!(schedule_counting(&scheduler, &state, &runs));
    for _ in 0..3 {
        assert_eq!(trigger.on_frame_completed(), 0);
    }
    assert_eq!(runs.load(Ordering::SeqCst), 0);
    assert_eq!(trigger.armed_len(), 1);

    assert_eq!(scheduler.flush(), 1);
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

#[test]
fn cancelled_deferrals_are_disarmed() {
    let manual = Arc::new(ManualTrigger::new());
    let scheduler = ReleaseScheduler::with_trigger(ReleaseSchedulerOpts::default(), manual.clone());
    let runs = Arc::new(AtomicUsize::new(0));
    let state = scheduler.create_release_state();

    for _ in 0..1000 {
        assert!(schedule_counting(&scheduler, &state, &runs));
        assert!(scheduler.cancel_all_releasing(&state));
    }
    assert_eq!(manual.armed_len(), 0);

    assert!(schedule_counting(&scheduler, &state, &runs));
    assert_eq!(manual.armed_len(), 1);
    assert_eq!(manual.fire_all(), 1);
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

#[test]
fn frame_trigger_drops_cancelled_tickets_before_they_are_due() {
    let trigger = Arc::new(FrameTrigger::new(3));
    let scheduler = ReleaseScheduler::with_trigger(ReleaseSchedulerOpts::default(), trigger.clone());
    let runs = Arc::new(AtomicUsize::new(0));
    let a = scheduler.create_release_state();
    let b = scheduler.create_release_state();

    schedule_counting(&scheduler, &a, &runs);
    schedule_counting(&scheduler, &b, &runs);
    scheduler.cancel_all_releasing(&a);
    assert_eq!(trigger.armed_len(), 1);

    drop(b);
    assert_eq!(trigger.armed_len(), 0);
    assert_eq!(scheduler.flush(), 0);
    assert_eq!(runs.load(Ordering::SeqCst), 0);
}
