use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use crate::foundation::error::{VitrineError, VitrineResult};
use crate::release::trigger::{FrameTrigger, ImmediateTrigger, ManualTrigger, ReleaseTrigger};

/// Cleanup work handed to the scheduler; runs at most once.
pub type DeferredRelease = Box<dyn FnOnce() + Send>;

/// Which built-in trigger decides when a deferred release is safe to run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    /// Run deferred releases as soon as they are scheduled.
    Immediate,
    /// Run deferred releases after `frames_in_flight` frame completions.
    #[default]
    FrameBoundary,
    /// Hold deferred releases until the host fires their tickets.
    Manual,
}

/// Options for [`ReleaseScheduler`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReleaseSchedulerOpts {
    /// Trigger built by [`ReleaseScheduler::new`].
    pub trigger: TriggerKind,
    /// Frame completions to wait for with [`TriggerKind::FrameBoundary`].
    pub frames_in_flight: u64,
}

impl Default for ReleaseSchedulerOpts {
    fn default() -> Self {
        Self {
            trigger: TriggerKind::FrameBoundary,
            frames_in_flight: 2,
        }
    }
}

impl ReleaseSchedulerOpts {
    /// Reject option combinations the scheduler cannot honor.
    pub fn validate(&self) -> VitrineResult<()> {
        if self.trigger == TriggerKind::FrameBoundary && self.frames_in_flight == 0 {
            return Err(VitrineError::config(
                "scheduler.frames_in_flight must be >= 1 for frame_boundary trigger",
            ));
        }
        Ok(())
    }
}

/// Key under which a handle's release state is registered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReleaseKey(u64);

impl ReleaseKey {
    /// Raw key value.
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Counters describing scheduler activity since construction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReleaseStats {
    /// Deferrals accepted.
    pub scheduled: u64,
    /// Pending deferrals cancelled before they ran.
    pub cancelled: u64,
    /// Deferred releases that ran.
    pub fired: u64,
    /// Deferral requests for states not registered with this scheduler.
    pub ignored: u64,
}

struct PendingRelease {
    generation: u64,
    action: DeferredRelease,
}

#[derive(Default)]
struct ReleaseEntry {
    generation: u64,
    pending: Option<PendingRelease>,
}

#[derive(Default)]
struct Registry {
    entries: HashMap<ReleaseKey, ReleaseEntry>,
    stats: ReleaseStats,
}

struct SchedulerShared {
    opts: ReleaseSchedulerOpts,
    trigger: Arc<dyn ReleaseTrigger>,
    next_key: AtomicU64,
    registry: Mutex<Registry>,
}

impl SchedulerShared {
    fn lock(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn register(&self) -> ReleaseKey {
        let key = ReleaseKey(self.next_key.fetch_add(1, Ordering::Relaxed) + 1);
        self.lock().entries.insert(key, ReleaseEntry::default());
        key
    }

    fn unregister(&self, key: ReleaseKey) {
        let removed = self.lock().entries.remove(&key);
        if let Some(pending) = removed.and_then(|e| e.pending) {
            tracing::trace!(key = key.0, "release state dropped with a pending deferral");
            self.trigger.disarm(key, pending.generation);
        }
    }

    fn schedule(self: &Arc<Self>, key: ReleaseKey, action: DeferredRelease) -> bool {
        let generation = {
            let mut reg = self.lock();
            let Registry { entries, stats } = &mut *reg;
            let Some(entry) = entries.get_mut(&key) else {
                stats.ignored += 1;
                tracing::trace!(key = key.0, "deferral for unregistered release state ignored");
                return false;
            };
            if entry.pending.is_some() {
                tracing::trace!(key = key.0, "deferral already pending");
                return false;
            }
            entry.generation += 1;
            entry.pending = Some(PendingRelease {
                generation: entry.generation,
                action,
            });
            stats.scheduled += 1;
            entry.generation
        };

        tracing::debug!(key = key.0, generation, "deferred release scheduled");
        // Arm outside the registry lock: triggers may fire synchronously.
        self.trigger.arm(ReleaseTicket {
            key,
            generation,
            scheduler: Arc::downgrade(self),
        });
        true
    }

    fn cancel(&self, key: ReleaseKey) -> bool {
        let cancelled = {
            let mut reg = self.lock();
            let Registry { entries, stats } = &mut *reg;
            let pending = entries.get_mut(&key).and_then(|e| e.pending.take());
            if pending.is_some() {
                stats.cancelled += 1;
            }
            pending
        };
        match cancelled {
            Some(p) => {
                tracing::debug!(key = key.0, generation = p.generation, "deferred release cancelled");
                self.trigger.disarm(key, p.generation);
                true
            }
            None => {
                tracing::trace!(key = key.0, "nothing to cancel");
                false
            }
        }
    }

    /// Take the pending action if it matches `generation` (or any generation when `None`).
    fn take_pending(&self, key: ReleaseKey, generation: Option<u64>) -> Option<PendingRelease> {
        let mut reg = self.lock();
        let Registry { entries, stats } = &mut *reg;
        let entry = entries.get_mut(&key)?;
        let matches = entry
            .pending
            .as_ref()
            .is_some_and(|p| generation.is_none_or(|g| p.generation == g));
        if !matches {
            return None;
        }
        stats.fired += 1;
        entry.pending.take()
    }

    fn fire(&self, key: ReleaseKey, generation: Option<u64>) -> bool {
        let Some(pending) = self.take_pending(key, generation) else {
            return false;
        };
        tracing::debug!(
            key = key.0,
            generation = pending.generation,
            "running deferred release"
        );
        (pending.action)();
        true
    }

    fn is_pending(&self, key: ReleaseKey) -> bool {
        self.lock()
            .entries
            .get(&key)
            .is_some_and(|e| e.pending.is_some())
    }
}

/// Per-handle token addressing the handle's entry in a [`ReleaseScheduler`].
///
/// Clones share the registration; dropping the last clone unregisters it and discards any
/// pending deferral without running it.
#[derive(Clone)]
pub struct ReleaseState {
    inner: Arc<ReleaseStateInner>,
}

struct ReleaseStateInner {
    key: ReleaseKey,
    scheduler: Weak<SchedulerShared>,
}

impl Drop for ReleaseStateInner {
    fn drop(&mut self) {
        if let Some(shared) = self.scheduler.upgrade() {
            shared.unregister(self.key);
        }
    }
}

impl ReleaseState {
    /// Registration key.
    pub fn key(&self) -> ReleaseKey {
        self.inner.key
    }

    /// Cancel any pending deferred release for this state. Safe when nothing is pending.
    pub fn cancel_all_releasing(&self) -> bool {
        self.inner
            .scheduler
            .upgrade()
            .is_some_and(|s| s.cancel(self.inner.key))
    }
}

impl fmt::Debug for ReleaseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReleaseState")
            .field("key", &self.inner.key)
            .finish()
    }
}

/// Handle to one armed deferral. Firing runs the deferral if it is still the pending one.
#[derive(Clone)]
pub struct ReleaseTicket {
    key: ReleaseKey,
    generation: u64,
    scheduler: Weak<SchedulerShared>,
}

impl ReleaseTicket {
    /// Key of the release state this ticket belongs to.
    pub fn key(&self) -> ReleaseKey {
        self.key
    }

    /// Deferral generation this ticket was armed for.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Return `true` if this ticket was armed for `generation` of `key`.
    pub fn is_for(&self, key: ReleaseKey, generation: u64) -> bool {
        self.key == key && self.generation == generation
    }

    /// Signal "safe to release". Returns `true` if this call ran the cleanup.
    ///
    /// Tickets whose deferral was cancelled, already ran, or was superseded do nothing.
    pub fn fire(&self) -> bool {
        self.scheduler
            .upgrade()
            .is_some_and(|s| s.fire(self.key, Some(self.generation)))
    }
}

impl fmt::Debug for ReleaseTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReleaseTicket")
            .field("key", &self.key)
            .field("generation", &self.generation)
            .finish()
    }
}

/// Coordinator deferring resource release until a trigger signals it is safe.
///
/// Cheap to clone; clones share state. Registration, cancellation, and firing are
/// synchronized internally, and a cancel racing a fire runs the cleanup at most once.
#[derive(Clone)]
pub struct ReleaseScheduler {
    shared: Arc<SchedulerShared>,
}

impl Default for ReleaseScheduler {
    fn default() -> Self {
        Self::new(ReleaseSchedulerOpts::default())
    }
}

impl ReleaseScheduler {
    /// Build a scheduler with the trigger named by `opts.trigger`.
    pub fn new(opts: ReleaseSchedulerOpts) -> Self {
        let trigger: Arc<dyn ReleaseTrigger> = match opts.trigger {
            TriggerKind::Immediate => Arc::new(ImmediateTrigger),
            TriggerKind::FrameBoundary => Arc::new(FrameTrigger::new(opts.frames_in_flight)),
            TriggerKind::Manual => Arc::new(ManualTrigger::new()),
        };
        Self::with_trigger(opts, trigger)
    }

    /// Build a scheduler with a host-supplied trigger.
    pub fn with_trigger(opts: ReleaseSchedulerOpts, trigger: Arc<dyn ReleaseTrigger>) -> Self {
        Self {
            shared: Arc::new(SchedulerShared {
                opts,
                trigger,
                next_key: AtomicU64::new(0),
                registry: Mutex::new(Registry::default()),
            }),
        }
    }

    /// Options this scheduler was built with.
    pub fn opts(&self) -> ReleaseSchedulerOpts {
        self.shared.opts
    }

    /// Trigger deciding when deferrals run.
    pub fn trigger(&self) -> &Arc<dyn ReleaseTrigger> {
        &self.shared.trigger
    }

    /// Register a new handle and return its release-state token.
    pub fn create_release_state(&self) -> ReleaseState {
        let key = self.shared.register();
        ReleaseState {
            inner: Arc::new(ReleaseStateInner {
                key,
                scheduler: Arc::downgrade(&self.shared),
            }),
        }
    }

    fn owns(&self, state: &ReleaseState) -> bool {
        std::ptr::eq(state.inner.scheduler.as_ptr(), Arc::as_ptr(&self.shared))
    }

    /// Defer `action` until the trigger fires for it.
    ///
    /// Returns `false` without running `action` when the state is not registered here or a
    /// deferral is already pending for it.
    pub fn schedule_deferred_release(&self, state: &ReleaseState, action: DeferredRelease) -> bool {
        if !self.owns(state) {
            self.shared.lock().stats.ignored += 1;
            tracing::trace!(key = state.key().0, "release state belongs to another scheduler");
            return false;
        }
        self.shared.schedule(state.key(), action)
    }

    /// Cancel any pending deferral for `state`. Idempotent.
    pub fn cancel_all_releasing(&self, state: &ReleaseState) -> bool {
        self.owns(state) && self.shared.cancel(state.key())
    }

    /// Run the pending deferral for `state` now, bypassing the trigger.
    pub fn release_now(&self, state: &ReleaseState) -> bool {
        self.owns(state) && self.shared.fire(state.key(), None)
    }

    /// Return `true` while a deferral is pending for `state`.
    pub fn is_release_pending(&self, state: &ReleaseState) -> bool {
        self.owns(state) && self.shared.is_pending(state.key())
    }

    /// Forward a frame-completion signal to the trigger. Returns the number of releases run.
    pub fn signal_frame_completed(&self) -> usize {
        self.shared.trigger.on_frame_completed()
    }

    /// Fire everything the trigger holds, regardless of policy. Returns the number run.
    pub fn flush(&self) -> usize {
        self.shared.trigger.flush()
    }

    /// Number of live release states.
    pub fn registered_states(&self) -> usize {
        self.shared.lock().entries.len()
    }

    /// Activity counters.
    pub fn stats(&self) -> ReleaseStats {
        self.shared.lock().stats
    }
}

impl fmt::Debug for ReleaseScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReleaseScheduler")
            .field("opts", &self.shared.opts)
            .field("trigger", &self.shared.trigger)
            .finish()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/release/scheduler.rs"]
mod tests;
