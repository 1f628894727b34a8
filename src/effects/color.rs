//! Per-pixel color remaps: grayscale, sepia, invert, threshold, gamma,
//! levels, curves, channel mix, and color replacement. Grounded on
//! `original_source/src/effects.cpp` (grayscale/sepia) and the matching
//! handlers in `original_source/src/cli_ops_effects.cpp`.

use super::{clamp01, clamp_byte, lerp_pixel};
use crate::pixel::PixelRGBA8;
use crate::surface::ImageBuffer;

/// ITU-R BT.601 luma lerped toward the identity by `strength` is how
/// `original_source`'s `applySepia`/grayscale-strength knobs generalize;
/// grayscale itself has no strength parameter in spec.md, so it always
/// fully replaces the channel.
pub fn grayscale(image: &mut ImageBuffer) {
  for p in image.pixels_mut() {
    let gray = clamp_byte(p.luma());
    *p = PixelRGBA8::new(gray, gray, gray, p.a);
  }
}

/// Standard sepia 3x3 matrix, lerped between identity and the full effect
/// by `strength` in `[0, 1]`.
pub fn apply_sepia(image: &mut ImageBuffer, strength: f32) {
  let s = clamp01(strength);
  for p in image.pixels_mut() {
    let (r, g, b) = (f32::from(p.r), f32::from(p.g), f32::from(p.b));
    let sepia_r = 0.393 * r + 0.769 * g + 0.189 * b;
    let sepia_g = 0.349 * r + 0.686 * g + 0.168 * b;
    let sepia_b = 0.272 * r + 0.534 * g + 0.131 * b;
    *p = PixelRGBA8::new(
      clamp_byte((1.0 - s) * r + s * sepia_r),
      clamp_byte((1.0 - s) * g + s * sepia_g),
      clamp_byte((1.0 - s) * b + s * sepia_b),
      p.a,
    );
  }
}

/// `255 - c` on each color channel; `preserve_alpha` keeps `a` untouched
/// rather than also inverting it.
pub fn apply_invert(image: &mut ImageBuffer, preserve_alpha: bool) {
  for p in image.pixels_mut() {
    *p = PixelRGBA8::new(255 - p.r, 255 - p.g, 255 - p.b, if preserve_alpha { p.a } else { 255 - p.a });
  }
}

/// Per-pixel luma threshold, emitting `lo` below `threshold` and `hi` at or
/// above it.
pub fn apply_threshold(image: &mut ImageBuffer, threshold: i32, lo: PixelRGBA8, hi: PixelRGBA8) {
  let t = threshold.clamp(0, 255);
  for p in image.pixels_mut() {
    let luma = p.luma().round() as i32;
    *p = if luma >= t { hi } else { lo };
  }
}

/// `out = 255 * (v/255)^(1/gamma)` per channel; alpha untouched. `gamma`
/// must be `> 0` (spec.md §4.9).
pub fn apply_gamma(image: &mut ImageBuffer, gamma: f64) {
  assert!(gamma > 0.0, "gamma must be > 0");
  let inv_gamma = 1.0 / gamma;
  let map = |v: u8| -> u8 {
    let n = f64::from(v) / 255.0;
    clamp_byte((255.0 * n.powf(inv_gamma)) as f32)
  };
  for p in image.pixels_mut() {
    *p = PixelRGBA8::new(map(p.r), map(p.g), map(p.b), p.a);
  }
}

/// Linear remap `[in_black, in_white] -> [out_black, out_white]` with a
/// midtone gamma applied to the normalized `t`. `in_white` must be strictly
/// greater than `in_black` and `mid_gamma` must be `> 0` (spec.md §4.9).
pub fn apply_levels(image: &mut ImageBuffer, in_black: i32, in_white: i32, mid_gamma: f64, out_black: i32, out_white: i32) {
  let in_b = f64::from(in_black.clamp(0, 255));
  let in_w = f64::from(in_white.clamp(0, 255));
  assert!(in_w > in_b, "levels requires in_white > in_black");
  assert!(mid_gamma > 0.0, "levels gamma must be > 0");
  let out_b = f64::from(out_black.clamp(0, 255));
  let out_w = f64::from(out_white.clamp(0, 255));

  let map = |v: u8| -> u8 {
    let t = ((f64::from(v) - in_b) / (in_w - in_b)).clamp(0.0, 1.0);
    let t = t.powf(1.0 / mid_gamma);
    clamp_byte((out_b + (out_w - out_b) * t) as f32)
  };
  for p in image.pixels_mut() {
    *p = PixelRGBA8::new(map(p.r), map(p.g), map(p.b), p.a);
  }
}

/// One `(x_in, y_out)` control point of a curves LUT; both components are
/// clamped to `[0, 255]` by the caller before sorting.
pub type CurvePoint = (u8, u8);

/// Builds a 256-entry piecewise-linear LUT from a sorted-by-`x_in` point
/// list. At least two points are required (spec.md §4.9); the list must
/// already be sorted ascending by `x_in`.
pub fn build_curve_lut(points: &[CurvePoint]) -> [u8; 256] {
  assert!(points.len() >= 2, "curve requires at least 2 points");
  let mut lut = [0u8; 256];
  let mut seg = 0usize;
  for x in 0..=255i32 {
    while seg + 1 < points.len() && x > i32::from(points[seg + 1].0) {
      seg += 1;
    }
    if seg + 1 >= points.len() {
      lut[x as usize] = points[points.len() - 1].1;
      continue;
    }
    let (x0, y0) = (i32::from(points[seg].0), i32::from(points[seg].1));
    let (x1, y1) = (i32::from(points[seg + 1].0), i32::from(points[seg + 1].1));
    if x1 == x0 {
      lut[x as usize] = y1 as u8;
      continue;
    }
    let t = f64::from(x - x0) / f64::from(x1 - x0);
    let y = f64::from(y0) + f64::from(y1 - y0) * t;
    lut[x as usize] = clamp_byte(y as f32);
  }
  lut
}

/// Applies a master RGB LUT to every channel, then optionally a
/// per-channel LUT on top of the result (spec.md §4.9's "master RGB curve,
/// optionally followed by per-channel LUTs").
pub fn apply_curves(image: &mut ImageBuffer, rgb_lut: &[u8; 256], r_lut: Option<&[u8; 256]>, g_lut: Option<&[u8; 256]>, b_lut: Option<&[u8; 256]>) {
  for p in image.pixels_mut() {
    let mut r = rgb_lut[p.r as usize];
    let mut g = rgb_lut[p.g as usize];
    let mut b = rgb_lut[p.b as usize];
    if let Some(lut) = r_lut {
      r = lut[r as usize];
    }
    if let Some(lut) = g_lut {
      g = lut[g as usize];
    }
    if let Some(lut) = b_lut {
      b = lut[b as usize];
    }
    *p = PixelRGBA8::new(r, g, b, p.a);
  }
}

/// Row-major 3x3 RGB mix matrix: `out = M * (r, g, b)`, clamped to
/// `[clamp_min, clamp_max]` before rounding to a byte.
pub type ChannelMixMatrix = [f32; 9];

pub fn apply_channel_mix(image: &mut ImageBuffer, matrix: ChannelMixMatrix, clamp_min: f32, clamp_max: f32) {
  let min_v = clamp_min.min(clamp_max);
  let max_v = clamp_min.max(clamp_max);
  for p in image.pixels_mut() {
    let (r, g, b) = (f32::from(p.r), f32::from(p.g), f32::from(p.b));
    let out_r = (matrix[0] * r + matrix[1] * g + matrix[2] * b).clamp(min_v, max_v);
    let out_g = (matrix[3] * r + matrix[4] * g + matrix[5] * b).clamp(min_v, max_v);
    let out_b = (matrix[6] * r + matrix[7] * g + matrix[8] * b).clamp(min_v, max_v);
    *p = PixelRGBA8::new(clamp_byte(out_r), clamp_byte(out_g), clamp_byte(out_b), p.a);
  }
}

/// Lerps pixels within `tolerance` Euclidean RGB distance of `from_color`
/// fully toward `to_color`, with a linear falloff over the next `softness`
/// of distance; `preserve_luma` rescales `to_color` so the replaced pixel
/// keeps the source's BT.601 luma.
pub fn apply_replace_color(image: &mut ImageBuffer, from_color: PixelRGBA8, to_color: PixelRGBA8, tolerance: f64, softness: f64, preserve_luma: bool) {
  let tolerance = tolerance.max(0.0);
  let softness = softness.max(0.0);
  let soft_end = tolerance + softness;

  for p in image.pixels_mut() {
    let src = *p;
    let dist = src.rgb_distance(from_color);

    let mix = if dist <= tolerance {
      1.0
    } else if soft_end > tolerance && dist < soft_end {
      (1.0 - (dist - tolerance) / (soft_end - tolerance)) as f32
    } else {
      0.0
    };
    if mix <= 0.0 {
      continue;
    }

    let mut adjusted = PixelRGBA8::new(to_color.r, to_color.g, to_color.b, src.a);
    if preserve_luma {
      let src_luma = src.luma();
      let dst_luma = adjusted.luma();
      if dst_luma > 0.0 {
        let scale = src_luma / dst_luma;
        adjusted = PixelRGBA8::new(clamp_byte(scale * f32::from(adjusted.r)), clamp_byte(scale * f32::from(adjusted.g)), clamp_byte(scale * f32::from(adjusted.b)), src.a);
      }
    }
    *p = lerp_pixel(src, adjusted, mix);
  }
}
