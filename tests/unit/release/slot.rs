use std::sync::Barrier;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::*;
use crate::foundation::error::{VitrineError, VitrineResult};
use crate::release::scheduler::{ReleaseScheduler, ReleaseSchedulerOpts, TriggerKind};

#[derive(Debug)]
struct Tracked {
    id: u32,
    log: Arc<Mutex<Vec<u32>>>,
}

impl Closeable for Tracked {
    fn close(&mut self) -> VitrineResult<()> {
        self.log.lock().unwrap().push(self.id);
        Ok(())
    }
}

fn tracked(id: u32, log: &Arc<Mutex<Vec<u32>>>) -> Tracked {
    Tracked {
        id,
        log: Arc::clone(log),
    }
}

fn manual_scheduler() -> ReleaseScheduler {
    ReleaseScheduler::new(ReleaseSchedulerOpts {
        trigger: TriggerKind::Manual,
        frames_in_flight: 1,
    })
}

#[test]
fn overwrite_and_clear_close_each_value_once() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut slot = DeferredSlot::closing("test");

    slot.set(Some(tracked(1, &log)));
    slot.set(Some(tracked(2, &log)));
    assert_eq!(*log.lock().unwrap(), vec![1]);

    slot.clear();
    slot.clear();
    assert_eq!(*log.lock().unwrap(), vec![1, 2]);
    assert!(!slot.is_set());
}

#[test]
fn empty_slot_never_runs_cleanup() {
    let runs = Arc::new(AtomicUsize::new(0));
    let r = Arc::clone(&runs);
    let mut slot = DeferredSlot::<u32>::new("ints", move |_| {
        r.fetch_add(1, Ordering::SeqCst);
    });
    slot.clear();
    slot.set(None);
    drop(slot);
    assert_eq!(runs.load(Ordering::SeqCst), 0);
}

#[test]
fn drop_cleans_up_held_value() {
    let log = Arc::new(Mutex::new(Vec::new()));
    {
        let mut slot = DeferredSlot::closing("test");
        slot.set(Some(tracked(9, &log)));
    }
    assert_eq!(*log.lock().unwrap(), vec![9]);
}

#[test]
fn take_transfers_ownership_without_cleanup() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut slot = DeferredSlot::closing("test");
    slot.set(Some(tracked(3, &log)));

    let taken = slot.take().expect("value present");
    drop(slot);
    assert!(log.lock().unwrap().is_empty());
    assert_eq!(taken.id, 3);
}

#[test]
fn close_failures_are_swallowed() {
    struct Failing(Arc<AtomicUsize>);
    impl Closeable for Failing {
        fn close(&mut self) -> VitrineResult<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Err(VitrineError::Io(std::io::Error::other("broken pipe")))
        }
    }

    let attempts = Arc::new(AtomicUsize::new(0));
    let mut slot = DeferredSlot::closing("failing");
    slot.set(Some(Failing(Arc::clone(&attempts))));
    slot.set(Some(Failing(Arc::clone(&attempts))));
    slot.clear();
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

#[test]
fn deferred_action_runs_once_for_its_value() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut slot = DeferredSlot::closing("test");
    slot.set(Some(tracked(1, &log)));

    let action = slot.deferred_release();
    action();
    assert_eq!(*log.lock().unwrap(), vec![1]);
    assert!(!slot.is_set());

    slot.clear();
    assert_eq!(*log.lock().unwrap(), vec![1]);
}

#[test]
fn stale_deferred_action_leaves_new_value_alone() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut slot = DeferredSlot::closing("test");
    slot.set(Some(tracked(1, &log)));

    let action = slot.deferred_release();
    slot.set(Some(tracked(2, &log)));
    action();

    assert_eq!(*log.lock().unwrap(), vec![1]);
    assert!(slot.is_set());
    drop(slot);
    assert_eq!(*log.lock().unwrap(), vec![1, 2]);
}

#[test]
fn overwrite_cancels_owner_pending_release() {
    let scheduler = manual_scheduler();
    let state = scheduler.create_release_state();
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut slot = DeferredSlot::closing("test").bound_to(state.clone());
    slot.set(Some(tracked(1, &log)));

    assert!(scheduler.schedule_deferred_release(&state, slot.deferred_release()));
    assert!(scheduler.is_release_pending(&state));

    slot.set(Some(tracked(2, &log)));
    assert!(!scheduler.is_release_pending(&state));
    assert_eq!(scheduler.flush(), 0);
    assert_eq!(*log.lock().unwrap(), vec![1]);
}

#[test]
fn overwrite_racing_deferred_cleanup_closes_old_value_once() {
    for _ in 0..200 {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut slot = DeferredSlot::closing("race");
        slot.set(Some(tracked(1, &log)));
        let action = slot.deferred_release();
        let barrier = Arc::new(Barrier::new(2));

        let b = Arc::clone(&barrier);
        let worker = std::thread::spawn(move || {
            b.wait();
            action();
        });
        barrier.wait();
        slot.set(Some(tracked(2, &log)));
        worker.join().unwrap();

        assert_eq!(*log.lock().unwrap(), vec![1]);
        assert!(slot.is_set());
    }
}
