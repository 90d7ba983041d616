pub use kurbo::{Point, Rect, Size};

use crate::foundation::math::mul_div255;

/// Opaque numeric identity of the image a handle is bound to.
///
/// `ImageId(0)` means "unbound".
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Serialize,
    serde::Deserialize,
)]
pub struct ImageId(pub u64);

impl ImageId {
    /// Identity of a handle that is not bound to any request.
    pub const UNBOUND: Self = Self(0);

    /// Return `true` for [`ImageId::UNBOUND`].
    pub fn is_unbound(self) -> bool {
        self.0 == 0
    }
}

/// Premultiplied RGBA8 (r,g,b already multiplied by a).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgba8Premul {
    /// Red channel premultiplied by alpha.
    pub r: u8,
    /// Green channel premultiplied by alpha.
    pub g: u8,
    /// Blue channel premultiplied by alpha.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Rgba8Premul {
    /// Fully transparent black.
    pub fn transparent() -> Self {
        Self::default()
    }

    /// Opaque color from straight channels.
    pub fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Convert straight-alpha RGBA8 into premultiplied RGBA8.
    pub fn from_straight_rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self {
            r: mul_div255(r, a),
            g: mul_div255(g, a),
            b: mul_div255(b, a),
            a,
        }
    }

    /// Channels as `[r, g, b, a]`.
    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Paint-parameter color filter set by the rendering host.
///
/// Stored on the handle; compositing does not apply it yet.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum ColorFilter {
    /// Multiply every painted pixel by a color.
    Tint(Rgba8Premul),
    /// Row-major 4x5 color matrix.
    Matrix([f32; 20]),
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
