//! Pixel containers.
//!
//! `PixelRGB` and `PixelRGBA8` are plain byte tuples: sRGB vs. linear light is
//! a convention carried by the code that touches them, not something the type
//! system tracks. Both are `#[repr(C)]` and `bytemuck::Pod` so codecs can
//! reinterpret raw scanline bytes as pixel slices without a copy.

use bytemuck::{Pod, Zeroable};

/// Three 8-bit channels, no alpha. Used by BMP/PNG/GIF/JPEG, which are all
/// opaque-only formats at the byte level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Zeroable, Pod)]
#[repr(C)]
pub struct PixelRGB {
  pub r: u8,
  pub g: u8,
  pub b: u8,
}

impl PixelRGB {
  pub const BLACK: Self = Self { r: 0, g: 0, b: 0 };
  pub const WHITE: Self = Self { r: 255, g: 255, b: 255 };

  #[inline]
  #[must_use]
  pub const fn new(r: u8, g: u8, b: u8) -> Self {
    Self { r, g, b }
  }

  /// ITU-R BT.601 luma, the same coefficients used throughout the effects
  /// pipeline for grayscale/threshold/Sobel/Canny.
  #[inline]
  #[must_use]
  pub fn luma(self) -> f32 {
    0.299 * f32::from(self.r) + 0.587 * f32::from(self.g) + 0.114 * f32::from(self.b)
  }
}

impl From<PixelRGBA8> for PixelRGB {
  #[inline]
  fn from(p: PixelRGBA8) -> Self {
    Self { r: p.r, g: p.g, b: p.b }
  }
}

/// Four 8-bit channels. Alpha is **straight** (non-premultiplied): `(r, g, b)`
/// is always the unmodulated color, never scaled by `a`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Zeroable, Pod)]
#[repr(C)]
pub struct PixelRGBA8 {
  pub r: u8,
  pub g: u8,
  pub b: u8,
  pub a: u8,
}

impl PixelRGBA8 {
  pub const TRANSPARENT: Self = Self { r: 0, g: 0, b: 0, a: 0 };
  pub const OPAQUE_WHITE: Self = Self { r: 255, g: 255, b: 255, a: 255 };
  pub const OPAQUE_BLACK: Self = Self { r: 0, g: 0, b: 0, a: 255 };

  #[inline]
  #[must_use]
  pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
    Self { r, g, b, a }
  }

  #[inline]
  #[must_use]
  pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
    Self { r, g, b, a: 255 }
  }

  #[inline]
  #[must_use]
  pub fn luma(self) -> f32 {
    0.299 * f32::from(self.r) + 0.587 * f32::from(self.g) + 0.114 * f32::from(self.b)
  }

  /// Channel-wise L-infinity distance, used by flood fill's tolerance test.
  #[inline]
  #[must_use]
  pub fn chebyshev_distance(self, other: Self) -> u8 {
    let dr = self.r.abs_diff(other.r);
    let dg = self.g.abs_diff(other.g);
    let db = self.b.abs_diff(other.b);
    let da = self.a.abs_diff(other.a);
    dr.max(dg).max(db).max(da)
  }

  /// Euclidean distance in RGB space, used by replace-color's tolerance/softness
  /// falloff.
  #[inline]
  #[must_use]
  pub fn rgb_distance(self, other: Self) -> f64 {
    let dr = f64::from(self.r) - f64::from(other.r);
    let dg = f64::from(self.g) - f64::from(other.g);
    let db = f64::from(self.b) - f64::from(other.b);
    (dr * dr + dg * dg + db * db).sqrt()
  }
}

impl From<PixelRGB> for PixelRGBA8 {
  #[inline]
  fn from(p: PixelRGB) -> Self {
    Self { r: p.r, g: p.g, b: p.b, a: 255 }
  }
}

#[inline]
#[must_use]
pub(crate) fn clamp_to_u8(value: f32) -> u8 {
  value.round().clamp(0.0, 255.0) as u8
}
