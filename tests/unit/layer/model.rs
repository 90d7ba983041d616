use std::sync::atomic::{AtomicUsize, Ordering};

use super::*;
use crate::render::surface::PixmapSurface;

#[derive(Debug, Default)]
struct Owning {
    closes: AtomicUsize,
}

impl Drawable for Owning {
    fn draw(&self, surface: &mut dyn Surface, bounds: Rect, rounding: Option<&RoundingOptions>) {
        surface.fill_rect(bounds, Rgba8Premul::opaque(0, 255, 0), rounding);
    }

    fn intrinsic_size(&self) -> Option<Size> {
        Some(Size::new(16.0, 9.0))
    }

    fn close(&self) -> VitrineResult<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[test]
fn only_drawable_models_forward_close() {
    let owning = Arc::new(Owning::default());
    let mut model = ImageDataModel::Drawable(owning.clone());
    model.close().unwrap();
    assert_eq!(owning.closes.load(Ordering::SeqCst), 1);

    let mut color = ImageDataModel::Color(Rgba8Premul::opaque(1, 2, 3));
    assert!(color.close().is_ok());
    let mut bitmap = ImageDataModel::bitmap(RgbaImage::new(1, 1));
    assert!(bitmap.close().is_ok());
}

#[test]
fn intrinsic_size_per_variant() {
    let bitmap = ImageDataModel::bitmap(RgbaImage::new(4, 3));
    assert_eq!(bitmap.intrinsic_size(), Some(Size::new(4.0, 3.0)));
    assert_eq!(
        ImageDataModel::drawable(Owning::default()).intrinsic_size(),
        Some(Size::new(16.0, 9.0))
    );
    assert_eq!(ImageDataModel::Color(Rgba8Premul::transparent()).intrinsic_size(), None);
}

#[test]
fn as_drawable_only_for_drawable_variant() {
    assert!(ImageDataModel::drawable(Owning::default()).as_drawable().is_some());
    assert!(ImageDataModel::Color(Rgba8Premul::transparent()).as_drawable().is_none());
}

#[test]
fn draw_dispatches_by_variant() {
    let mut s = PixmapSurface::new(2, 2);
    let bounds = Rect::new(0.0, 0.0, 2.0, 2.0);
    ImageDataModel::drawable(Owning::default()).draw(&mut s, bounds, None);
    assert_eq!(s.pixel(1, 1), Rgba8Premul::opaque(0, 255, 0));

    ImageDataModel::Color(Rgba8Premul::opaque(0, 0, 255)).draw(&mut s, bounds, None);
    assert_eq!(s.pixel(0, 0), Rgba8Premul::opaque(0, 0, 255));
}

#[test]
fn same_content_compares_allocations() {
    let owning: Arc<dyn Drawable> = Arc::new(Owning::default());
    let a = ImageDataModel::Drawable(Arc::clone(&owning));
    let b = ImageDataModel::Drawable(Arc::clone(&owning));
    let other = ImageDataModel::drawable(Owning::default());
    assert!(a.same_content(&b));
    assert!(!a.same_content(&other));

    let pixels = ImageDataModel::bitmap(RgbaImage::new(2, 2));
    assert!(pixels.same_content(&pixels.clone()));
    assert!(!pixels.same_content(&ImageDataModel::bitmap(RgbaImage::new(2, 2))));

    let red = ImageDataModel::Color(Rgba8Premul::opaque(255, 0, 0));
    assert!(red.same_content(&ImageDataModel::Color(Rgba8Premul::opaque(255, 0, 0))));
    assert!(!red.same_content(&a));
}
