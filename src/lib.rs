//! Vitrine is a poolable image display handle with deferred resource release.
//!
//! An [`ImageHandle`] coordinates one image request at a time:
//!
//! - Bind a request, take ownership of the fetch result, and configure up to five ordered
//!   layers (placeholder, actual image, progress, overlay, debug overlay)
//! - Paint the layers onto a host [`Surface`] in a fixed order
//! - [`ImageHandle::reset`] to release everything and return the handle to a [`HandlePool`]
//!
//! Resources that may still be on screen are handed to a [`ReleaseScheduler`], which runs
//! their cleanup exactly once when its [`ReleaseTrigger`] decides it is safe, unless the handle
//! is reused first.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

pub(crate) mod handle;
pub(crate) mod layer;
pub(crate) mod release;
pub(crate) mod render;

pub use crate::foundation::config::VitrineConfig;
pub use crate::foundation::core::{ColorFilter, ImageId, Point, Rect, Rgba8Premul, Size};
pub use crate::foundation::error::{VitrineError, VitrineResult};

pub use crate::handle::image_handle::{HandleOpts, HandleState, ImageHandle, RefetchFn};
pub use crate::handle::listener::{
    CombinedImageListener, ImageListener, ImagePerfListener, NopPerfListener, VisibilityCallback,
};
pub use crate::handle::pool::{HandlePool, HandlePoolOpts, HandlePoolStats};
pub use crate::handle::request::{CallerContext, Extras, ImageRequest};

pub use crate::layer::image_layer::{ImageLayer, LayerKind, LayerUpdate};
pub use crate::layer::model::{BorderOptions, Drawable, ImageDataModel, RoundingOptions};
pub use crate::layer::stack::LayerStack;

pub use crate::release::closeable::{BoxCloseable, CloseFn, Closeable};
pub use crate::release::scheduler::{
    DeferredRelease, ReleaseKey, ReleaseScheduler, ReleaseSchedulerOpts, ReleaseState,
    ReleaseStats, ReleaseTicket, TriggerKind,
};
pub use crate::release::slot::DeferredSlot;
pub use crate::release::trigger::{FrameTrigger, ImmediateTrigger, ManualTrigger, ReleaseTrigger};

pub use crate::render::surface::{PixmapSurface, Surface};
