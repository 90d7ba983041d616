use std::path::Path;

use crate::foundation::error::{VitrineError, VitrineResult};
use crate::handle::image_handle::HandleOpts;
use crate::handle::pool::{HandlePool, HandlePoolOpts};
use crate::release::scheduler::{ReleaseScheduler, ReleaseSchedulerOpts};

/// Top-level configuration, usually loaded from JSON.
///
/// Every section is optional; missing sections and fields take their defaults.
///
/// ```json
/// {
///   "scheduler": { "trigger": "frame_boundary", "frames_in_flight": 3 },
///   "handle": { "progress_layer": true },
///   "pool": { "max_retained": 64 }
/// }
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VitrineConfig {
    /// Release scheduler options.
    pub scheduler: ReleaseSchedulerOpts,
    /// Options for every handle built from this config.
    pub handle: HandleOpts,
    /// Handle pool options.
    pub pool: HandlePoolOpts,
}

impl VitrineConfig {
    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> VitrineResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| VitrineError::serde(format!("invalid config json: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse, and validate a JSON file.
    pub fn from_json_path(path: impl AsRef<Path>) -> VitrineResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        tracing::debug!(path = %path.display(), "loading config");
        Self::from_json_str(&json)
    }

    /// Serialize to pretty JSON.
    pub fn to_json_string(&self) -> VitrineResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| VitrineError::serde(e.to_string()))
    }

    /// Reject values the components cannot honor.
    pub fn validate(&self) -> VitrineResult<()> {
        self.scheduler.validate()
    }

    /// Scheduler built from the `scheduler` section.
    pub fn build_scheduler(&self) -> ReleaseScheduler {
        ReleaseScheduler::new(self.scheduler)
    }

    /// Pool over a fresh scheduler, using the `handle` and `pool` sections.
    pub fn build_pool(&self) -> HandlePool {
        HandlePool::new(self.build_scheduler(), self.handle, self.pool)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/config.rs"]
mod tests;
