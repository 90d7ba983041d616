use std::sync::Arc;

use crate::foundation::core::Rect;
use crate::layer::model::{BorderOptions, Drawable, ImageDataModel, RoundingOptions};
use crate::release::slot::DeferredSlot;
use crate::render::surface::Surface;

/// Position of a layer in the handle's fixed paint order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LayerKind {
    /// Shown while the actual image is loading.
    Placeholder,
    /// The fetched image.
    Actual,
    /// Optional progress indicator.
    Progress,
    /// Host overlay.
    Overlay,
    /// Optional debug overlay.
    DebugOverlay,
}

impl LayerKind {
    /// All layers, bottom to top.
    pub const PAINT_ORDER: [LayerKind; 5] = [
        LayerKind::Placeholder,
        LayerKind::Actual,
        LayerKind::Progress,
        LayerKind::Overlay,
        LayerKind::DebugOverlay,
    ];

    /// Short name used in log records.
    pub fn name(self) -> &'static str {
        match self {
            LayerKind::Placeholder => "placeholder",
            LayerKind::Actual => "actual",
            LayerKind::Progress => "progress",
            LayerKind::Overlay => "overlay",
            LayerKind::DebugOverlay => "debug_overlay",
        }
    }
}

/// Partial update for [`ImageLayer::configure`]. Fields left untouched keep their value.
#[derive(Clone, Debug, Default)]
pub struct LayerUpdate {
    content: Option<Option<ImageDataModel>>,
    rounding: Option<Option<RoundingOptions>>,
    border: Option<Option<BorderOptions>>,
    bounds: Option<Rect>,
}

impl LayerUpdate {
    /// Empty update.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the content (`None` clears it).
    pub fn content(mut self, content: Option<ImageDataModel>) -> Self {
        self.content = Some(content);
        self
    }

    /// Replace the rounding (`None` removes it).
    pub fn rounding(mut self, rounding: Option<RoundingOptions>) -> Self {
        self.rounding = Some(rounding);
        self
    }

    /// Replace the border (`None` removes it).
    pub fn border(mut self, border: Option<BorderOptions>) -> Self {
        self.border = Some(border);
        self
    }

    /// Set the bounds.
    pub fn bounds(mut self, bounds: Rect) -> Self {
        self.bounds = Some(bounds);
        self
    }
}

/// One compositing slot: content plus decoration, painted into its bounds.
///
/// Content is owned through a [`DeferredSlot`]; replacing or resetting it closes the previous
/// model exactly once. Re-assigning the content already held is a no-op.
#[derive(Debug)]
pub struct ImageLayer {
    kind: LayerKind,
    content: DeferredSlot<ImageDataModel>,
    rounding: Option<RoundingOptions>,
    border: Option<BorderOptions>,
    bounds: Option<Rect>,
}

impl ImageLayer {
    /// Empty layer without bounds.
    pub fn new(kind: LayerKind) -> Self {
        Self {
            kind,
            content: DeferredSlot::closing(kind.name()),
            rounding: None,
            border: None,
            bounds: None,
        }
    }

    /// Which layer this is.
    pub fn kind(&self) -> LayerKind {
        self.kind
    }

    /// Apply a partial update.
    pub fn configure(&mut self, update: LayerUpdate) {
        let LayerUpdate {
            content,
            rounding,
            border,
            bounds,
        } = update;
        if let Some(content) = content {
            let unchanged = self.content.with_value(|current| match (current, &content) {
                (Some(current), Some(new)) => current.same_content(new),
                _ => false,
            });
            // Re-assigning displayed content must not close it.
            if !unchanged {
                self.content.set(content);
            }
        }
        if let Some(rounding) = rounding {
            self.rounding = rounding;
        }
        if let Some(border) = border {
            self.border = border;
        }
        if let Some(bounds) = bounds {
            self.bounds = Some(bounds);
        }
    }

    /// Return `true` while the layer holds content.
    pub fn has_content(&self) -> bool {
        self.content.is_set()
    }

    /// Clone of the current content.
    pub fn content(&self) -> Option<ImageDataModel> {
        self.content.with_value(|m| m.cloned())
    }

    /// Drawable backing the content, if the content is drawable-backed.
    pub fn drawable(&self) -> Option<Arc<dyn Drawable>> {
        self.content
            .with_value(|m| m.and_then(ImageDataModel::as_drawable).cloned())
    }

    /// Current rounding.
    pub fn rounding(&self) -> Option<RoundingOptions> {
        self.rounding
    }

    /// Current border.
    pub fn border(&self) -> Option<BorderOptions> {
        self.border
    }

    /// Current bounds; `None` until first set.
    pub fn bounds(&self) -> Option<Rect> {
        self.bounds
    }

    /// Paint content then border. No-op without content or bounds.
    pub fn draw(&self, surface: &mut dyn Surface) {
        let Some(bounds) = self.bounds else {
            return;
        };
        let rounding = self.rounding.as_ref();
        let painted = self.content.with_value(|m| match m {
            Some(model) => {
                model.draw(surface, bounds, rounding);
                true
            }
            None => false,
        });
        if painted && let Some(border) = &self.border {
            surface.stroke_border(bounds, border, rounding);
        }
    }

    /// Drop content and decoration. Bounds are kept.
    pub fn reset(&mut self) {
        self.content.clear();
        self.rounding = None;
        self.border = None;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layer/image_layer.rs"]
mod tests;
