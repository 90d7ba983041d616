use std::fmt;
use std::sync::Arc;

use crate::foundation::core::{ColorFilter, ImageId, Rect};
use crate::handle::listener::{
    CombinedImageListener, ImageListener, ImagePerfListener, NopPerfListener, VisibilityCallback,
};
use crate::handle::request::{CallerContext, Extras, ImageRequest};
use crate::layer::image_layer::{LayerKind, LayerUpdate};
use crate::layer::model::{Drawable, ImageDataModel};
use crate::layer::stack::LayerStack;
use crate::release::closeable::BoxCloseable;
use crate::release::scheduler::{ReleaseScheduler, ReleaseState};
use crate::release::slot::DeferredSlot;
use crate::render::surface::Surface;

/// Options fixed at handle construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HandleOpts {
    /// Create the progress layer up front.
    pub progress_layer: bool,
    /// Create the debug overlay layer up front.
    pub debug_overlay_layer: bool,
    /// Paint alpha before the host sets one.
    pub initial_alpha: u8,
}

impl Default for HandleOpts {
    fn default() -> Self {
        Self {
            progress_layer: false,
            debug_overlay_layer: false,
            initial_alpha: 255,
        }
    }
}

/// Coarse lifecycle state of a handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandleState {
    /// No request bound.
    Unbound,
    /// Request bound, result not yet assigned.
    Loading,
    /// Result assigned.
    Loaded,
    /// Inside [`ImageHandle::reset`]; observable from listeners.
    Resetting,
}

/// Callback re-running the fetch for the handle's current request.
pub type RefetchFn = Arc<dyn Fn() + Send + Sync>;

/// Reusable image display handle.
///
/// Coordinates one image request at a time: its identity, the resources the fetch produced,
/// and the five-layer composition painted on every draw. [`ImageHandle::reset`] returns the
/// handle to its freshly constructed state so a pool can hand it out again.
///
/// The handle is single-writer; only the [`ReleaseScheduler`] it was built with is touched
/// from other threads.
pub struct ImageHandle {
    opts: HandleOpts,
    scheduler: ReleaseScheduler,
    release_state: ReleaseState,

    image_id: ImageId,
    request: Option<ImageRequest>,
    caller_context: Option<CallerContext>,
    extras: Option<Extras>,
    is_loading: bool,
    // Survives a fired deferral; only bind and reset clear it.
    result_assigned: bool,
    fetch_submitted: bool,
    resetting: bool,

    // Cleared generic resource first, then the fetch result.
    closeable: DeferredSlot<BoxCloseable>,
    data_source: DeferredSlot<BoxCloseable>,

    layers: LayerStack,
    listeners: CombinedImageListener,
    perf_listener: Arc<dyn ImagePerfListener>,
    visibility_callback: Option<Arc<dyn VisibilityCallback>>,
    refetch: Option<RefetchFn>,

    bounds: Rect,
    viewport_dimensions: Option<Rect>,
    visible: bool,
    alpha: u8,
    color_filter: Option<ColorFilter>,
}

impl ImageHandle {
    /// Unbound handle registered with `scheduler`.
    pub fn new(scheduler: &ReleaseScheduler, opts: HandleOpts) -> Self {
        Self::with_perf_listener(scheduler, opts, Arc::new(NopPerfListener))
    }

    /// Unbound handle reporting releases to `perf_listener`.
    pub fn with_perf_listener(
        scheduler: &ReleaseScheduler,
        opts: HandleOpts,
        perf_listener: Arc<dyn ImagePerfListener>,
    ) -> Self {
        let release_state = scheduler.create_release_state();
        let mut layers = LayerStack::new();
        if opts.progress_layer {
            layers.enable_progress_layer();
        }
        if opts.debug_overlay_layer {
            layers.enable_debug_overlay_layer();
        }

        Self {
            opts,
            scheduler: scheduler.clone(),
            closeable: DeferredSlot::closing("closeable").bound_to(release_state.clone()),
            data_source: DeferredSlot::closing("data_source").bound_to(release_state.clone()),
            release_state,
            image_id: ImageId::UNBOUND,
            request: None,
            caller_context: None,
            extras: None,
            is_loading: false,
            result_assigned: false,
            fetch_submitted: false,
            resetting: false,
            layers,
            listeners: CombinedImageListener::default(),
            perf_listener,
            visibility_callback: None,
            refetch: None,
            bounds: Rect::ZERO,
            viewport_dimensions: None,
            visible: true,
            alpha: opts.initial_alpha,
            color_filter: None,
        }
    }

    /// Options the handle was built with.
    pub fn opts(&self) -> HandleOpts {
        self.opts
    }

    /// Scheduler this handle defers releases to.
    pub fn scheduler(&self) -> &ReleaseScheduler {
        &self.scheduler
    }

    /// This handle's release-state token.
    pub fn release_state(&self) -> &ReleaseState {
        &self.release_state
    }

    /// Bind the handle to a new request and mark it loading.
    ///
    /// A pending deferred release is cancelled: the handle is in use again.
    pub fn bind(
        &mut self,
        image_id: ImageId,
        request: ImageRequest,
        caller_context: Option<CallerContext>,
    ) {
        self.scheduler.cancel_all_releasing(&self.release_state);
        tracing::debug!(image_id = image_id.0, source = %request.source, "binding handle");
        self.image_id = image_id;
        self.request = Some(request);
        self.caller_context = caller_context;
        self.is_loading = true;
        self.result_assigned = false;
    }

    /// Record whether the fetch has been submitted.
    pub fn set_fetch_submitted(&mut self, fetch_submitted: bool) {
        self.fetch_submitted = fetch_submitted;
    }

    /// Return `true` once the fetch has been submitted.
    pub fn is_fetch_submitted(&self) -> bool {
        self.fetch_submitted
    }

    /// Record whether a fetch is in progress.
    pub fn set_loading(&mut self, is_loading: bool) {
        self.is_loading = is_loading;
    }

    /// Return `true` while a fetch is in progress.
    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    /// Take ownership of the fetch result, closing any previous one.
    pub fn assign_result(&mut self, result: BoxCloseable) {
        tracing::debug!(image_id = self.image_id.0, "fetch result assigned");
        self.data_source.set(Some(result));
        self.is_loading = false;
        self.result_assigned = true;
    }

    /// Return `true` while a fetch result is held.
    pub fn has_result(&self) -> bool {
        self.data_source.is_set()
    }

    /// Replace the generic closeable resource, closing any previous one.
    pub fn set_closeable(&mut self, closeable: Option<BoxCloseable>) {
        self.closeable.set(closeable);
    }

    /// Return `true` while a generic closeable is held.
    pub fn has_closeable(&self) -> bool {
        self.closeable.is_set()
    }

    /// Set the per-request metadata handed to listeners on release.
    pub fn set_extras(&mut self, extras: Option<Extras>) {
        self.extras = extras;
    }

    /// Per-request metadata.
    pub fn extras(&self) -> Option<&Extras> {
        self.extras.as_ref()
    }

    /// Install the callback used by [`ImageHandle::refetch`].
    pub fn set_refetch(&mut self, refetch: Option<RefetchFn>) {
        self.refetch = refetch;
    }

    /// Re-run the fetch for the current request. Returns `false` without a callback.
    pub fn refetch(&self) -> bool {
        match &self.refetch {
            Some(f) => {
                f();
                true
            }
            None => false,
        }
    }

    /// Bound image identity; [`ImageId::UNBOUND`] when unbound.
    pub fn image_id(&self) -> ImageId {
        self.image_id
    }

    /// Current request descriptor.
    pub fn request(&self) -> Option<&ImageRequest> {
        self.request.as_ref()
    }

    /// Caller context supplied with the current request.
    pub fn caller_context(&self) -> Option<&CallerContext> {
        self.caller_context.as_ref()
    }

    /// Lifecycle state.
    ///
    /// A handle stays [`HandleState::Loaded`] after a deferred release frees its result.
    pub fn state(&self) -> HandleState {
        if self.resetting {
            HandleState::Resetting
        } else if self.image_id.is_unbound() && self.request.is_none() {
            HandleState::Unbound
        } else if self.is_loading || !self.result_assigned {
            HandleState::Loading
        } else {
            HandleState::Loaded
        }
    }

    /// Current image listener.
    pub fn image_listener(&self) -> Option<&Arc<dyn ImageListener>> {
        self.listeners.image_listener()
    }

    /// Replace the image listener.
    pub fn set_image_listener(&mut self, listener: Option<Arc<dyn ImageListener>>) {
        self.listeners.set_image_listener(listener);
    }

    /// Perf listener notified on release.
    pub fn perf_listener(&self) -> &Arc<dyn ImagePerfListener> {
        &self.perf_listener
    }

    /// Replace the visibility callback.
    pub fn set_visibility_callback(&mut self, callback: Option<Arc<dyn VisibilityCallback>>) {
        self.visibility_callback = callback;
    }

    /// The layer stack.
    pub fn layers(&self) -> &LayerStack {
        &self.layers
    }

    fn configure_layer(&mut self, kind: LayerKind, content: Option<ImageDataModel>) {
        let layer = match kind {
            LayerKind::Progress => Some(self.layers.enable_progress_layer()),
            LayerKind::DebugOverlay => Some(self.layers.enable_debug_overlay_layer()),
            _ => self.layers.layer_mut(kind),
        };
        if let Some(layer) = layer {
            layer.configure(LayerUpdate::new().content(content));
        }
    }

    /// Set the placeholder content.
    pub fn set_placeholder_content(&mut self, content: Option<ImageDataModel>) {
        self.configure_layer(LayerKind::Placeholder, content);
    }

    /// Set the actual-image content.
    pub fn set_actual_content(&mut self, content: Option<ImageDataModel>) {
        self.configure_layer(LayerKind::Actual, content);
    }

    /// Set the progress content, creating the progress layer if needed.
    pub fn set_progress_content(&mut self, content: Option<ImageDataModel>) {
        self.configure_layer(LayerKind::Progress, content);
    }

    /// Set the debug overlay content, creating the layer if needed.
    pub fn set_debug_overlay_content(&mut self, content: Option<ImageDataModel>) {
        self.configure_layer(LayerKind::DebugOverlay, content);
    }

    /// Set the overlay drawable, dropping rounding and border. Returns `drawable`.
    ///
    /// The previous overlay drawable is closed exactly once.
    pub fn set_overlay_content(
        &mut self,
        drawable: Option<Arc<dyn Drawable>>,
    ) -> Option<Arc<dyn Drawable>> {
        if let Some(layer) = self.layers.layer_mut(LayerKind::Overlay) {
            layer.configure(
                LayerUpdate::new()
                    .content(drawable.clone().map(ImageDataModel::Drawable))
                    .rounding(None)
                    .border(None),
            );
        }
        drawable
    }

    /// Return `true` while the actual-image layer holds content.
    pub fn has_image(&self) -> bool {
        self.layers
            .layer(LayerKind::Actual)
            .is_some_and(|l| l.has_content())
    }

    /// Drawable backing the actual-image layer, if its content is drawable-backed.
    pub fn actual_image_content(&self) -> Option<Arc<dyn Drawable>> {
        self.layers
            .layer(LayerKind::Actual)
            .and_then(|l| l.drawable())
    }

    /// Paint all layers. Pushes the current bounds first if they were never pushed.
    pub fn draw(&mut self, surface: &mut dyn Surface) {
        if !self.layers.bounds_initialized() {
            self.layers.set_bounds(Some(self.bounds));
        }
        self.layers.draw(surface);
    }

    /// The on-screen region changed; push it to every layer.
    pub fn on_bounds_change(&mut self, bounds: Rect) {
        self.bounds = bounds;
        self.layers.set_bounds(Some(bounds));
    }

    /// Current on-screen region; empty until the host reports one.
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Return `true` once bounds reached the layers since construction or the last reset.
    pub fn bounds_initialized(&self) -> bool {
        self.layers.bounds_initialized()
    }

    /// Forward a visibility change to the visibility callback. Returns `true` if it changed.
    ///
    /// Visibility never releases resources by itself.
    pub fn set_visible(&mut self, visible: bool, restart: bool) -> bool {
        if let Some(cb) = &self.visibility_callback {
            cb.on_visibility_change(visible);
        }
        tracing::trace!(image_id = self.image_id.0, visible, restart, "visibility changed");
        let changed = self.visible != visible;
        self.visible = visible;
        changed
    }

    /// Last visibility set by the host.
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Store the paint alpha.
    pub fn set_alpha(&mut self, alpha: u8) {
        self.alpha = alpha;
    }

    /// Paint alpha.
    pub fn alpha(&self) -> u8 {
        self.alpha
    }

    /// Store the paint color filter.
    pub fn set_color_filter(&mut self, color_filter: Option<ColorFilter>) {
        self.color_filter = color_filter;
    }

    /// Paint color filter.
    pub fn color_filter(&self) -> Option<&ColorFilter> {
        self.color_filter.as_ref()
    }

    /// Store the viewport the image is displayed in.
    pub fn set_viewport_dimensions(&mut self, viewport: Option<Rect>) {
        self.viewport_dimensions = viewport;
    }

    /// Viewport the image is displayed in.
    pub fn viewport_dimensions(&self) -> Option<Rect> {
        self.viewport_dimensions
    }

    /// Hand the current resources to the scheduler for release once it is safe.
    ///
    /// Returns `false` if a deferral is already pending.
    pub fn schedule_deferred_release(&self) -> bool {
        let closeable = self.closeable.deferred_release();
        let data_source = self.data_source.deferred_release();
        self.scheduler.schedule_deferred_release(
            &self.release_state,
            Box::new(move || {
                closeable();
                data_source();
            }),
        )
    }

    /// Return `true` while a deferred release is pending.
    pub fn is_release_pending(&self) -> bool {
        self.scheduler.is_release_pending(&self.release_state)
    }

    /// Release everything and return to the unbound state.
    ///
    /// Listeners see the release before any resource is closed; the image listener is
    /// detached last.
    #[tracing::instrument(level = "debug", skip_all, fields(image_id = self.image_id.0))]
    pub fn reset(&mut self) {
        self.resetting = true;

        if let Some(request) = &self.request {
            self.listeners
                .on_release(self.image_id, request, self.extras.as_ref());
        }
        let perf_listener = Arc::clone(&self.perf_listener);
        perf_listener.on_image_release(self);

        self.scheduler.cancel_all_releasing(&self.release_state);
        self.closeable.clear();
        self.data_source.clear();

        self.request = None;
        self.image_id = ImageId::UNBOUND;
        self.is_loading = false;
        self.result_assigned = false;
        self.fetch_submitted = false;
        self.caller_context = None;
        self.extras = None;
        self.refetch = None;
        self.viewport_dimensions = None;

        self.layers.reset();
        // Layers created on demand go; the stack matches a fresh handle's.
        self.layers
            .retain_optional_layers(self.opts.progress_layer, self.opts.debug_overlay_layer);

        self.listeners.on_reset();
        self.listeners.set_image_listener(None);
        self.resetting = false;
        tracing::debug!("handle reset");
    }
}

impl fmt::Debug for ImageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageHandle")
            .field("image_id", &self.image_id)
            .field("request", &self.request)
            .field("state", &self.state())
            .field("fetch_submitted", &self.fetch_submitted)
            .field("release_state", &self.release_state)
            .field("layers", &self.layers)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/handle/image_handle.rs"]
mod tests;
