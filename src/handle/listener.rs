use std::fmt;
use std::sync::Arc;

use crate::foundation::core::ImageId;
use crate::handle::image_handle::ImageHandle;
use crate::handle::request::{Extras, ImageRequest};

/// Lifecycle events for the request a handle is bound to.
pub trait ImageListener: Send + Sync {
    /// The handle is about to drop `request`. Runs before any of its resources are released.
    fn on_release(&self, _image_id: ImageId, _request: &ImageRequest, _extras: Option<&Extras>) {}

    /// The handle finished resetting.
    fn on_reset(&self) {}
}

/// Performance hook notified when a handle releases its image.
pub trait ImagePerfListener: Send + Sync {
    /// Called during reset, before resources are released.
    fn on_image_release(&self, handle: &ImageHandle);
}

/// Perf listener that ignores every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NopPerfListener;

impl ImagePerfListener for NopPerfListener {
    fn on_image_release(&self, _handle: &ImageHandle) {}
}

/// Receives the host's visibility changes for a handle.
pub trait VisibilityCallback: Send + Sync {
    /// Visibility became `visible`.
    fn on_visibility_change(&self, visible: bool);
}

/// Listener aggregate owned by a handle: forwards events to the current image listener.
#[derive(Clone, Default)]
pub struct CombinedImageListener {
    image_listener: Option<Arc<dyn ImageListener>>,
}

impl CombinedImageListener {
    /// Current image listener.
    pub fn image_listener(&self) -> Option<&Arc<dyn ImageListener>> {
        self.image_listener.as_ref()
    }

    /// Replace the current image listener.
    pub fn set_image_listener(&mut self, listener: Option<Arc<dyn ImageListener>>) {
        self.image_listener = listener;
    }
}

impl ImageListener for CombinedImageListener {
    fn on_release(&self, image_id: ImageId, request: &ImageRequest, extras: Option<&Extras>) {
        if let Some(l) = &self.image_listener {
            l.on_release(image_id, request, extras);
        }
    }

    fn on_reset(&self) {
        if let Some(l) = &self.image_listener {
            l.on_reset();
        }
    }
}

impl fmt::Debug for CombinedImageListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CombinedImageListener")
            .field("has_image_listener", &self.image_listener.is_some())
            .finish()
    }
}
