use std::sync::Arc;

use crate::handle::image_handle::{HandleOpts, ImageHandle};
use crate::handle::listener::{ImagePerfListener, NopPerfListener};
use crate::release::scheduler::ReleaseScheduler;

/// Pool configuration for recycled handles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HandlePoolOpts {
    /// Maximum number of reset handles kept for reuse. `0` disables retention.
    pub max_retained: usize,
}

impl Default for HandlePoolOpts {
    fn default() -> Self {
        Self { max_retained: 32 }
    }
}

/// Counters for [`HandlePool`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HandlePoolStats {
    /// Handles currently held for reuse.
    pub retained: usize,
    /// Handles built because the pool was empty.
    pub created: u64,
    /// Acquisitions served from the pool.
    pub reused: u64,
    /// Released handles dropped because the pool was full.
    pub dropped_on_release: u64,
}

/// Bounded free list of [`ImageHandle`]s sharing one scheduler.
///
/// Every handle is reset on release, so an acquired handle is indistinguishable from a new one.
pub struct HandlePool {
    opts: HandlePoolOpts,
    handle_opts: HandleOpts,
    scheduler: ReleaseScheduler,
    perf_listener: Arc<dyn ImagePerfListener>,
    stats: HandlePoolStats,
    free: Vec<ImageHandle>,
}

impl HandlePool {
    /// Empty pool whose handles share `scheduler`.
    pub fn new(scheduler: ReleaseScheduler, handle_opts: HandleOpts, opts: HandlePoolOpts) -> Self {
        Self {
            opts,
            handle_opts,
            scheduler,
            perf_listener: Arc::new(NopPerfListener),
            stats: HandlePoolStats::default(),
            free: Vec::new(),
        }
    }

    /// Perf listener given to handles this pool creates.
    pub fn with_perf_listener(mut self, perf_listener: Arc<dyn ImagePerfListener>) -> Self {
        self.perf_listener = perf_listener;
        self
    }

    /// Scheduler shared by every handle from this pool.
    pub fn scheduler(&self) -> &ReleaseScheduler {
        &self.scheduler
    }

    /// Activity counters.
    pub fn stats(&self) -> HandlePoolStats {
        self.stats
    }

    /// Reuse a retained handle or build a new one.
    pub fn acquire(&mut self) -> ImageHandle {
        if let Some(handle) = self.free.pop() {
            self.stats.retained = self.stats.retained.saturating_sub(1);
            self.stats.reused = self.stats.reused.saturating_add(1);
            return handle;
        }

        self.stats.created = self.stats.created.saturating_add(1);
        ImageHandle::with_perf_listener(
            &self.scheduler,
            self.handle_opts,
            Arc::clone(&self.perf_listener),
        )
    }

    /// Reset `handle` and keep it for reuse if there is room; drop it otherwise.
    pub fn release(&mut self, mut handle: ImageHandle) {
        handle.reset();

        if self.free.len() >= self.opts.max_retained {
            self.stats.dropped_on_release = self.stats.dropped_on_release.saturating_add(1);
            tracing::trace!(max_retained = self.opts.max_retained, "pool full, dropping handle");
            return;
        }

        self.free.push(handle);
        self.stats.retained = self.stats.retained.saturating_add(1);
    }
}

impl std::fmt::Debug for HandlePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlePool")
            .field("opts", &self.opts)
            .field("handle_opts", &self.handle_opts)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/handle/pool.rs"]
mod tests;
