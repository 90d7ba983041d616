use smallvec::SmallVec;

use crate::foundation::core::Rect;
use crate::layer::image_layer::{ImageLayer, LayerKind, LayerUpdate};
use crate::render::surface::Surface;

/// The handle's five ordered layers.
///
/// Placeholder, actual, and overlay always exist; progress and debug overlay are created on
/// demand. Bounds are pushed to every present layer at once.
#[derive(Debug)]
pub struct LayerStack {
    placeholder: ImageLayer,
    actual: ImageLayer,
    progress: Option<ImageLayer>,
    overlay: ImageLayer,
    debug_overlay: Option<ImageLayer>,

    bounds: Option<Rect>,
    bounds_initialized: bool,
    bounds_propagations: u64,
}

impl Default for LayerStack {
    fn default() -> Self {
        Self::new()
    }
}

impl LayerStack {
    /// Stack with the three mandatory layers.
    pub fn new() -> Self {
        Self {
            placeholder: ImageLayer::new(LayerKind::Placeholder),
            actual: ImageLayer::new(LayerKind::Actual),
            progress: None,
            overlay: ImageLayer::new(LayerKind::Overlay),
            debug_overlay: None,
            bounds: None,
            bounds_initialized: false,
            bounds_propagations: 0,
        }
    }

    /// Layer of the given kind, if present.
    pub fn layer(&self, kind: LayerKind) -> Option<&ImageLayer> {
        match kind {
            LayerKind::Placeholder => Some(&self.placeholder),
            LayerKind::Actual => Some(&self.actual),
            LayerKind::Progress => self.progress.as_ref(),
            LayerKind::Overlay => Some(&self.overlay),
            LayerKind::DebugOverlay => self.debug_overlay.as_ref(),
        }
    }

    /// Mutable layer of the given kind, if present.
    pub fn layer_mut(&mut self, kind: LayerKind) -> Option<&mut ImageLayer> {
        match kind {
            LayerKind::Placeholder => Some(&mut self.placeholder),
            LayerKind::Actual => Some(&mut self.actual),
            LayerKind::Progress => self.progress.as_mut(),
            LayerKind::Overlay => Some(&mut self.overlay),
            LayerKind::DebugOverlay => self.debug_overlay.as_mut(),
        }
    }

    fn pushed_bounds(&self) -> Option<Rect> {
        self.bounds.filter(|_| self.bounds_initialized)
    }

    /// Create the progress layer if it does not exist yet.
    pub fn enable_progress_layer(&mut self) -> &mut ImageLayer {
        let bounds = self.pushed_bounds();
        ensure_layer(&mut self.progress, LayerKind::Progress, bounds)
    }

    /// Create the debug overlay layer if it does not exist yet.
    pub fn enable_debug_overlay_layer(&mut self) -> &mut ImageLayer {
        let bounds = self.pushed_bounds();
        ensure_layer(&mut self.debug_overlay, LayerKind::DebugOverlay, bounds)
    }

    /// Present layers, bottom to top.
    pub fn paint_order(&self) -> SmallVec<[&ImageLayer; 5]> {
        LayerKind::PAINT_ORDER
            .iter()
            .filter_map(|&k| self.layer(k))
            .collect()
    }

    /// Push `bounds` to every present layer. `None` leaves everything untouched.
    pub fn set_bounds(&mut self, bounds: Option<Rect>) {
        let Some(bounds) = bounds else {
            return;
        };
        for kind in LayerKind::PAINT_ORDER {
            if let Some(layer) = self.layer_mut(kind) {
                layer.configure(LayerUpdate::new().bounds(bounds));
            }
        }
        self.bounds = Some(bounds);
        self.bounds_initialized = true;
        self.bounds_propagations += 1;
    }

    /// Return `true` once bounds have been pushed since construction or the last reset.
    pub fn bounds_initialized(&self) -> bool {
        self.bounds_initialized
    }

    /// Number of times bounds were pushed to the layers.
    pub fn bounds_propagations(&self) -> u64 {
        self.bounds_propagations
    }

    /// Paint present layers in order.
    pub fn draw(&self, surface: &mut dyn Surface) {
        for layer in self.paint_order() {
            layer.draw(surface);
        }
    }

    /// Reset every present layer and forget that bounds were pushed.
    pub fn reset(&mut self) {
        for kind in LayerKind::PAINT_ORDER {
            if let Some(layer) = self.layer_mut(kind) {
                layer.reset();
            }
        }
        self.bounds_initialized = false;
    }

    /// Drop the progress or debug overlay layer unless `progress` or `debug_overlay` keeps it.
    pub fn retain_optional_layers(&mut self, progress: bool, debug_overlay: bool) {
        if !progress {
            self.progress = None;
        }
        if !debug_overlay {
            self.debug_overlay = None;
        }
    }
}

// New layers inherit already-pushed bounds so bounds stay all-or-none.
fn ensure_layer(
    slot: &mut Option<ImageLayer>,
    kind: LayerKind,
    bounds: Option<Rect>,
) -> &mut ImageLayer {
    slot.get_or_insert_with(|| {
        let mut layer = ImageLayer::new(kind);
        if let Some(b) = bounds {
            layer.configure(LayerUpdate::new().bounds(b));
        }
        layer
    })
}

#[cfg(test)]
#[path = "../../tests/unit/layer/stack.rs"]
mod tests;
