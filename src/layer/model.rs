use std::fmt;
use std::sync::Arc;

use image::RgbaImage;

use crate::foundation::core::{Rect, Rgba8Premul, Size};
use crate::foundation::error::VitrineResult;
use crate::release::closeable::Closeable;
use crate::render::surface::Surface;

/// Opaque drawable unit supplied by the host or the fetch pipeline.
pub trait Drawable: Send + Sync + fmt::Debug {
    /// Paint into `bounds` on `surface`.
    fn draw(&self, surface: &mut dyn Surface, bounds: Rect, rounding: Option<&RoundingOptions>);

    /// Natural size of the content, if it has one.
    fn intrinsic_size(&self) -> Option<Size> {
        None
    }

    /// Release resources the drawable owns. Called once when a layer drops its content.
    ///
    /// Drawables that merely view pixels owned elsewhere keep the default no-op.
    fn close(&self) -> VitrineResult<()> {
        Ok(())
    }
}

/// Corner rounding applied when painting layer content.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RoundingOptions {
    /// Corner radius in pixels; ignored when `as_circle` is set.
    pub corner_radius: f64,
    /// Clip to the largest circle centered in the bounds.
    pub as_circle: bool,
}

impl RoundingOptions {
    /// Rounded corners with a uniform radius.
    pub fn radius(corner_radius: f64) -> Self {
        Self {
            corner_radius,
            as_circle: false,
        }
    }

    /// Circular clip.
    pub fn circle() -> Self {
        Self {
            corner_radius: 0.0,
            as_circle: true,
        }
    }
}

/// Border stroked inside the layer bounds.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct BorderOptions {
    /// Border color.
    pub color: Rgba8Premul,
    /// Stroke width in pixels.
    pub width: f64,
    /// Inset from the layer bounds in pixels.
    pub padding: f64,
}

/// Content of a layer slot. Absence is expressed as `Option::None` by the owner.
#[derive(Clone, Debug)]
pub enum ImageDataModel {
    /// Host drawable.
    Drawable(Arc<dyn Drawable>),
    /// Decoded straight-alpha RGBA8 pixels, scaled into the bounds.
    Bitmap(Arc<RgbaImage>),
    /// Solid color fill.
    Color(Rgba8Premul),
}

impl ImageDataModel {
    /// Wrap a drawable.
    pub fn drawable(drawable: impl Drawable + 'static) -> Self {
        Self::Drawable(Arc::new(drawable))
    }

    /// Wrap decoded pixels.
    pub fn bitmap(image: RgbaImage) -> Self {
        Self::Bitmap(Arc::new(image))
    }

    /// Underlying drawable for [`ImageDataModel::Drawable`], `None` otherwise.
    pub fn as_drawable(&self) -> Option<&Arc<dyn Drawable>> {
        match self {
            Self::Drawable(d) => Some(d),
            _ => None,
        }
    }

    /// Return `true` if both models share the same underlying content.
    ///
    /// Drawables and bitmaps compare by allocation, colors by value.
    pub fn same_content(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Drawable(a), Self::Drawable(b)) => {
                std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
            }
            (Self::Bitmap(a), Self::Bitmap(b)) => Arc::ptr_eq(a, b),
            (Self::Color(a), Self::Color(b)) => a == b,
            _ => false,
        }
    }

    /// Natural size of the content.
    pub fn intrinsic_size(&self) -> Option<Size> {
        match self {
            Self::Drawable(d) => d.intrinsic_size(),
            Self::Bitmap(img) => Some(Size::new(f64::from(img.width()), f64::from(img.height()))),
            Self::Color(_) => None,
        }
    }

    pub(crate) fn draw(
        &self,
        surface: &mut dyn Surface,
        bounds: Rect,
        rounding: Option<&RoundingOptions>,
    ) {
        match self {
            Self::Drawable(d) => d.draw(surface, bounds, rounding),
            Self::Bitmap(img) => surface.draw_bitmap(img, bounds, rounding),
            Self::Color(c) => surface.fill_rect(bounds, *c, rounding),
        }
    }
}

impl Closeable for ImageDataModel {
    fn close(&mut self) -> VitrineResult<()> {
        match self {
            Self::Drawable(d) => d.close(),
            Self::Bitmap(_) | Self::Color(_) => Ok(()),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layer/model.rs"]
mod tests;
