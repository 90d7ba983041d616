use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::release::closeable::{Closeable, close_quietly};
use crate::release::scheduler::{DeferredRelease, ReleaseState};

struct SlotCell<T> {
    value: Option<T>,
    // Bumped on every overwrite, take, or deferred cleanup.
    generation: u64,
}

fn lock_cell<T>(cell: &Mutex<SlotCell<T>>) -> MutexGuard<'_, SlotCell<T>> {
    cell.lock().unwrap_or_else(PoisonError::into_inner)
}

type Cleanup<T> = Arc<dyn Fn(T) + Send + Sync>;

/// Single-resource ownership cell whose cleanup runs exactly once per assigned value.
///
/// Cleanup runs synchronously when the value is overwritten, cleared, or the slot is dropped,
/// or later from a [`DeferredRelease`] built by [`DeferredSlot::deferred_release`]. A slot bound
/// to an owner's [`ReleaseState`] cancels the owner's pending deferral before every overwrite,
/// so the scheduler and the caller never both clean up the same value.
pub struct DeferredSlot<T: Send + 'static> {
    name: &'static str,
    cell: Arc<Mutex<SlotCell<T>>>,
    cleanup: Cleanup<T>,
    owner: Option<ReleaseState>,
}

impl<T: Send + 'static> DeferredSlot<T> {
    /// Empty slot with an injected cleanup action.
    pub fn new(name: &'static str, cleanup: impl Fn(T) + Send + Sync + 'static) -> Self {
        Self {
            name,
            cell: Arc::new(Mutex::new(SlotCell {
                value: None,
                generation: 0,
            })),
            cleanup: Arc::new(cleanup),
            owner: None,
        }
    }

    /// Bind the slot to its owner's release state.
    pub fn bound_to(mut self, owner: ReleaseState) -> Self {
        self.owner = Some(owner);
        self
    }

    /// Name used in log records.
    pub fn name(&self) -> &'static str {
        self.name
    }

    fn lock(&self) -> MutexGuard<'_, SlotCell<T>> {
        lock_cell(&self.cell)
    }

    fn cancel_owner_release(&self) {
        if let Some(owner) = &self.owner {
            owner.cancel_all_releasing();
        }
    }

    /// Assign `value`, cleaning up the previous value if there was one.
    pub fn set(&mut self, value: Option<T>) {
        self.cancel_owner_release();
        let previous = {
            let mut cell = self.lock();
            cell.generation = cell.generation.wrapping_add(1);
            std::mem::replace(&mut cell.value, value)
        };
        if let Some(previous) = previous {
            tracing::trace!(slot = self.name, "cleaning up replaced value");
            (self.cleanup)(previous);
        }
    }

    /// Clear the slot, cleaning up the current value.
    pub fn clear(&mut self) {
        self.set(None);
    }

    /// Move the value out without running cleanup; the caller becomes its owner.
    pub fn take(&mut self) -> Option<T> {
        self.cancel_owner_release();
        let mut cell = self.lock();
        cell.generation = cell.generation.wrapping_add(1);
        cell.value.take()
    }

    /// Return `true` while the slot holds a value.
    pub fn is_set(&self) -> bool {
        self.lock().value.is_some()
    }

    /// Borrow the current value for the duration of `f`.
    pub fn with_value<R>(&self, f: impl FnOnce(Option<&T>) -> R) -> R {
        let cell = self.lock();
        f(cell.value.as_ref())
    }

    /// Build a cleanup action for the value held right now.
    ///
    /// The action cleans up that value at most once, and does nothing if the slot was
    /// overwritten, cleared, or taken in the meantime.
    pub fn deferred_release(&self) -> DeferredRelease {
        let cell = Arc::clone(&self.cell);
        let cleanup = Arc::clone(&self.cleanup);
        let name = self.name;
        let generation = self.lock().generation;
        Box::new(move || {
            let value = {
                let mut cell = lock_cell(&cell);
                if cell.generation != generation {
                    return;
                }
                cell.generation = cell.generation.wrapping_add(1);
                cell.value.take()
            };
            if let Some(value) = value {
                tracing::debug!(slot = name, "deferred cleanup");
                cleanup(value);
            }
        })
    }
}

impl<T: Closeable + 'static> DeferredSlot<T> {
    /// Slot whose cleanup closes the value, logging and discarding close failures.
    pub fn closing(name: &'static str) -> Self {
        Self::new(name, move |mut value: T| close_quietly(name, &mut value))
    }
}

impl<T: Send + 'static> Drop for DeferredSlot<T> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<T: Send + 'static> fmt::Debug for DeferredSlot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cell = self.lock();
        f.debug_struct("DeferredSlot")
            .field("name", &self.name)
            .field("set", &cell.value.is_some())
            .field("generation", &cell.generation)
            .finish()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/release/slot.rs"]
mod tests;
