use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::release::scheduler::{ReleaseKey, ReleaseTicket};

/// Policy deciding when a deferred release is safe to run.
///
/// The scheduler arms one ticket per accepted deferral; the trigger fires it later, from any
/// thread. Stale tickets are harmless to fire.
pub trait ReleaseTrigger: Send + Sync + fmt::Debug {
    /// Take ownership of a newly scheduled deferral.
    fn arm(&self, ticket: ReleaseTicket);

    /// The deferral armed as `(key, generation)` was cancelled; drop its ticket.
    fn disarm(&self, _key: ReleaseKey, _generation: u64) {}

    /// Frame-boundary signal from the host. Returns the number of releases run.
    fn on_frame_completed(&self) -> usize {
        0
    }

    /// Fire every armed ticket now. Returns the number of releases run.
    fn flush(&self) -> usize {
        0
    }
}

fn fire_all(tickets: Vec<ReleaseTicket>) -> usize {
    tickets.into_iter().filter(|t| t.fire()).count()
}

/// Runs deferrals as soon as they are scheduled.
#[derive(Clone, Copy, Debug, Default)]
pub struct ImmediateTrigger;

impl ReleaseTrigger for ImmediateTrigger {
    fn arm(&self, ticket: ReleaseTicket) {
        ticket.fire();
    }
}

#[derive(Debug, Default)]
struct FrameQueue {
    frame: u64,
    // (ticket, frame at which it becomes due)
    armed: Vec<(ReleaseTicket, u64)>,
}

/// Runs deferrals once a fixed number of frames have completed since they were armed.
#[derive(Debug)]
pub struct FrameTrigger {
    frames_in_flight: u64,
    queue: Mutex<FrameQueue>,
}

impl FrameTrigger {
    /// `frames_in_flight` is clamped to at least one frame.
    pub fn new(frames_in_flight: u64) -> Self {
        Self {
            frames_in_flight: frames_in_flight.max(1),
            queue: Mutex::new(FrameQueue::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, FrameQueue> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Frames a deferral waits before running.
    pub fn frames_in_flight(&self) -> u64 {
        self.frames_in_flight
    }

    /// Completed frames observed so far.
    pub fn current_frame(&self) -> u64 {
        self.lock().frame
    }

    /// Tickets armed and not yet due.
    pub fn armed_len(&self) -> usize {
        self.lock().armed.len()
    }
}

impl ReleaseTrigger for FrameTrigger {
    fn arm(&self, ticket: ReleaseTicket) {
        let mut q = self.lock();
        let due = q.frame.saturating_add(self.frames_in_flight);
        q.armed.push((ticket, due));
    }

    fn disarm(&self, key: ReleaseKey, generation: u64) {
        self.lock()
            .armed
            .retain(|(t, _)| !t.is_for(key, generation));
    }

    fn on_frame_completed(&self) -> usize {
        let due = {
            let mut q = self.lock();
            q.frame += 1;
            let frame = q.frame;
            let mut due = Vec::new();
            q.armed.retain(|(ticket, due_frame)| {
                if *due_frame <= frame {
                    due.push(ticket.clone());
                    false
                } else {
                    true
                }
            });
            due
        };
        fire_all(due)
    }

    fn flush(&self) -> usize {
        let armed = std::mem::take(&mut self.lock().armed);
        fire_all(armed.into_iter().map(|(t, _)| t).collect())
    }
}

/// Holds deferrals until the host fires them (e.g. from an animation-end callback).
#[derive(Debug, Default)]
pub struct ManualTrigger {
    armed: Mutex<Vec<ReleaseTicket>>,
}

impl ManualTrigger {
    /// Empty trigger.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<ReleaseTicket>> {
        self.armed.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Remove and return every armed ticket, leaving firing to the caller.
    pub fn take_armed(&self) -> Vec<ReleaseTicket> {
        std::mem::take(&mut *self.lock())
    }

    /// Tickets armed and not yet taken.
    pub fn armed_len(&self) -> usize {
        self.lock().len()
    }

    /// Fire every armed ticket. Returns the number of releases run.
    pub fn fire_all(&self) -> usize {
        fire_all(self.take_armed())
    }
}

impl ReleaseTrigger for ManualTrigger {
    fn arm(&self, ticket: ReleaseTicket) {
        self.lock().push(ticket);
    }

    fn disarm(&self, key: ReleaseKey, generation: u64) {
        self.lock().retain(|t| !t.is_for(key, generation));
    }

    fn flush(&self) -> usize {
        self.fire_all()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/release/trigger.rs"]
mod tests;
