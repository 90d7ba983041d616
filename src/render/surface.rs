use image::RgbaImage;
use kurbo::{Circle, RoundedRect, Shape};

use crate::foundation::core::{Point, Rect, Rgba8Premul};
use crate::layer::model::{BorderOptions, RoundingOptions};
use crate::render::composite::{PremulRgba8, blend_over, premultiply};

/// Rendering target handed to [`crate::ImageHandle::draw`] by the host.
///
/// This is the compositing primitive layers paint through; hosts with their own renderer
/// implement it over their canvas type.
pub trait Surface {
    /// Fill `rect` with a solid color, clipped by `rounding`.
    fn fill_rect(&mut self, rect: Rect, color: Rgba8Premul, rounding: Option<&RoundingOptions>);

    /// Scale straight-alpha `image` into `dst`, clipped by `rounding`.
    fn draw_bitmap(&mut self, image: &RgbaImage, dst: Rect, rounding: Option<&RoundingOptions>);

    /// Stroke a border inside `rect`.
    fn stroke_border(
        &mut self,
        rect: Rect,
        border: &BorderOptions,
        rounding: Option<&RoundingOptions>,
    );
}

/// Clip test for a pixel center against `rect` and optional rounding.
fn covers(rect: Rect, rounding: Option<&RoundingOptions>, p: Point) -> bool {
    if !rect.contains(p) {
        return false;
    }
    match rounding {
        None => true,
        Some(r) if r.as_circle => {
            let radius = rect.width().min(rect.height()) / 2.0;
            Circle::new(rect.center(), radius).contains(p)
        }
        Some(r) if r.corner_radius > 0.0 => {
            RoundedRect::from_rect(rect, r.corner_radius).contains(p)
        }
        Some(_) => true,
    }
}

/// CPU surface over a premultiplied RGBA8 buffer.
///
/// Pixels are sampled at their centers; bitmaps use nearest-neighbor scaling.
#[derive(Clone, Debug)]
pub struct PixmapSurface {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixmapSurface {
    /// Transparent surface of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        let len = (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4);
        Self {
            width,
            height,
            data: vec![0; len],
        }
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row-major premultiplied RGBA8 bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Pixel at `(x, y)`; transparent when out of range.
    pub fn pixel(&self, x: u32, y: u32) -> Rgba8Premul {
        if x >= self.width || y >= self.height {
            return Rgba8Premul::transparent();
        }
        let i = self.index(x, y);
        Rgba8Premul {
            r: self.data[i],
            g: self.data[i + 1],
            b: self.data[i + 2],
            a: self.data[i + 3],
        }
    }

    /// Overwrite every pixel with `color`.
    pub fn clear(&mut self, color: Rgba8Premul) {
        let px = color.to_array();
        for chunk in self.data.chunks_exact_mut(4) {
            chunk.copy_from_slice(&px);
        }
    }

    fn index(&self, x: u32, y: u32) -> usize {
        ((y as usize) * (self.width as usize) + (x as usize)) * 4
    }

    fn blend(&mut self, x: u32, y: u32, src: PremulRgba8) {
        let i = self.index(x, y);
        let dst = [
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ];
        self.data[i..i + 4].copy_from_slice(&blend_over(dst, src));
    }

    /// Pixel index range whose centers may fall inside `rect`, clamped to the surface.
    fn span(&self, rect: Rect) -> (u32, u32, u32, u32) {
        let clamp = |v: f64, max: u32| -> u32 { v.clamp(0.0, f64::from(max)) as u32 };
        let x0 = clamp((rect.x0 - 0.5).ceil(), self.width);
        let x1 = clamp((rect.x1 - 0.5).ceil(), self.width);
        let y0 = clamp((rect.y0 - 0.5).ceil(), self.height);
        let y1 = clamp((rect.y1 - 0.5).ceil(), self.height);
        (x0, x1, y0, y1)
    }

    fn for_each_covered(
        &mut self,
        rect: Rect,
        rounding: Option<&RoundingOptions>,
        mut shade: impl FnMut(Point) -> Option<PremulRgba8>,
    ) {
        let (x0, x1, y0, y1) = self.span(rect);
        for y in y0..y1 {
            for x in x0..x1 {
                let p = Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
                if !covers(rect, rounding, p) {
                    continue;
                }
                if let Some(src) = shade(p) {
                    self.blend(x, y, src);
                }
            }
        }
    }
}

impl Surface for PixmapSurface {
    fn fill_rect(&mut self, rect: Rect, color: Rgba8Premul, rounding: Option<&RoundingOptions>) {
        let src = color.to_array();
        self.for_each_covered(rect, rounding, |_| Some(src));
    }

    fn draw_bitmap(&mut self, image: &RgbaImage, dst: Rect, rounding: Option<&RoundingOptions>) {
        let (iw, ih) = image.dimensions();
        if iw == 0 || ih == 0 || dst.width() <= 0.0 || dst.height() <= 0.0 {
            return;
        }
        self.for_each_covered(dst, rounding, |p| {
            let u = ((p.x - dst.x0) / dst.width() * f64::from(iw)).floor();
            let v = ((p.y - dst.y0) / dst.height() * f64::from(ih)).floor();
            let sx = (u.max(0.0) as u32).min(iw - 1);
            let sy = (v.max(0.0) as u32).min(ih - 1);
            Some(premultiply(image.get_pixel(sx, sy).0))
        });
    }

    fn stroke_border(
        &mut self,
        rect: Rect,
        border: &BorderOptions,
        rounding: Option<&RoundingOptions>,
    ) {
        if border.width <= 0.0 {
            return;
        }
        let outer = rect.inset(-border.padding);
        let inner = outer.inset(-border.width);
        let src = border.color.to_array();
        self.for_each_covered(outer, rounding, |p| {
            if covers(inner, rounding, p) {
                None
            } else {
                Some(src)
            }
        });
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/surface.rs"]
mod tests;
