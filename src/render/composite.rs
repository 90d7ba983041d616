use crate::foundation::core::Rgba8Premul;
use crate::foundation::math::mul_div255;

/// Premultiplied RGBA8 pixel, `[r, g, b, a]`.
pub type PremulRgba8 = [u8; 4];

/// Paint `src` over `dst`. Every channel becomes `src + dst * (255 - src_alpha) / 255`.
pub fn blend_over(dst: PremulRgba8, src: PremulRgba8) -> PremulRgba8 {
    match src[3] {
        0 => dst,
        255 => src,
        sa => {
            let keep = 255 - sa;
            std::array::from_fn(|i| src[i].saturating_add(mul_div255(dst[i], keep)))
        }
    }
}

/// Premultiply a straight-alpha pixel.
pub fn premultiply([r, g, b, a]: [u8; 4]) -> PremulRgba8 {
    Rgba8Premul::from_straight_rgba(r, g, b, a).to_array()
}

#[cfg(test)]
#[path = "../../tests/unit/render/composite.rs"]
mod tests;
