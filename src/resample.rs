//! Nearest/bilinear/box-area resizing (spec.md §4.6).
//!
//! Every filter shares the same half-pixel-center source-coordinate mapping;
//! only the sampling kernel differs. Grounded on
//! `original_source/src/resize.h`'s three-branch `resizeImage`, generalized
//! from opaque RGB to straight-alpha [`ImageBuffer`] since layers carry
//! alpha and resizing is exposed through `resize-layer` on layer buffers.

use crate::pixel::PixelRGBA8;
use crate::surface::ImageBuffer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeFilter {
  Nearest,
  Bilinear,
  BoxArea,
}

fn to_byte(value: f32) -> u8 {
  value.clamp(0.0, 255.0).round() as u8
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
  a + (b - a) * t
}

fn lerp_pixel(c0: PixelRGBA8, c1: PixelRGBA8, t: f32) -> PixelRGBA8 {
  PixelRGBA8::new(
    to_byte(lerp(f32::from(c0.r), f32::from(c1.r), t)),
    to_byte(lerp(f32::from(c0.g), f32::from(c1.g), t)),
    to_byte(lerp(f32::from(c0.b), f32::from(c1.b), t)),
    to_byte(lerp(f32::from(c0.a), f32::from(c1.a), t)),
  )
}

/// Resizes `source` to `new_width x new_height`. Returns a pixel-identical
/// copy when the dimensions already match, regardless of `filter`.
pub fn resize(source: &ImageBuffer, new_width: u32, new_height: u32, filter: ResizeFilter) -> ImageBuffer {
  let src_w = source.width();
  let src_h = source.height();
  if new_width == src_w && new_height == src_h {
    return source.clone();
  }

  let mut out = ImageBuffer::new(new_width, new_height).expect("caller-validated positive dimensions");
  let scale_x = src_w as f32 / new_width as f32;
  let scale_y = src_h as f32 / new_height as f32;

  for y in 0..new_height {
    let src_y = (y as f32 + 0.5) * scale_y - 0.5;
    for x in 0..new_width {
      let src_x = (x as f32 + 0.5) * scale_x - 0.5;
      let pixel = match filter {
        ResizeFilter::Nearest => sample_nearest(source, src_x, src_y),
        ResizeFilter::Bilinear => sample_bilinear(source, src_x, src_y),
        ResizeFilter::BoxArea => sample_box_area(source, src_x, src_y, scale_x, scale_y),
      };
      out.set_pixel(i64::from(x), i64::from(y), pixel);
    }
  }

  out
}

fn sample_nearest(source: &ImageBuffer, src_x: f32, src_y: f32) -> PixelRGBA8 {
  source.sample_clamped(src_x.round() as i64, src_y.round() as i64)
}

fn sample_bilinear(source: &ImageBuffer, src_x: f32, src_y: f32) -> PixelRGBA8 {
  let x0 = src_x.floor() as i64;
  let y0 = src_y.floor() as i64;
  let fx = src_x - x0 as f32;
  let fy = src_y - y0 as f32;

  let c00 = source.sample_clamped(x0, y0);
  let c10 = source.sample_clamped(x0 + 1, y0);
  let c01 = source.sample_clamped(x0, y0 + 1);
  let c11 = source.sample_clamped(x0 + 1, y0 + 1);

  let top = lerp_pixel(c00, c10, fx);
  let bottom = lerp_pixel(c01, c11, fx);
  lerp_pixel(top, bottom, fy)
}

fn sample_box_area(source: &ImageBuffer, src_x: f32, src_y: f32, scale_x: f32, scale_y: f32) -> PixelRGBA8 {
  let footprint_x = scale_x.max(1.0);
  let footprint_y = scale_y.max(1.0);
  let x_left = src_x - footprint_x * 0.5;
  let x_right = src_x + footprint_x * 0.5;
  let y_top = src_y - footprint_y * 0.5;
  let y_bottom = src_y + footprint_y * 0.5;

  let src_w = source.width() as i64;
  let src_h = source.height() as i64;
  let x_start = ((x_left - 0.5).floor() as i64).clamp(0, src_w - 1);
  let x_end = ((x_right + 0.5).floor() as i64).clamp(0, src_w - 1);
  let y_start = ((y_top - 0.5).floor() as i64).clamp(0, src_h - 1);
  let y_end = ((y_bottom + 0.5).floor() as i64).clamp(0, src_h - 1);

  let mut sum = [0.0f32; 4];
  let mut total_weight = 0.0f32;
  for sy in y_start..=y_end {
    let sy_min = sy as f32 - 0.5;
    let sy_max = sy as f32 + 0.5;
    let overlap_y = (y_bottom.min(sy_max) - y_top.max(sy_min)).max(0.0);
    if overlap_y <= 0.0 {
      continue;
    }
    for sx in x_start..=x_end {
      let sx_min = sx as f32 - 0.5;
      let sx_max = sx as f32 + 0.5;
      let overlap_x = (x_right.min(sx_max) - x_left.max(sx_min)).max(0.0);
      if overlap_x <= 0.0 {
        continue;
      }
      let weight = overlap_x * overlap_y;
      let c = source.sample_clamped(sx, sy);
      sum[0] += f32::from(c.r) * weight;
      sum[1] += f32::from(c.g) * weight;
      sum[2] += f32::from(c.b) * weight;
      sum[3] += f32::from(c.a) * weight;
      total_weight += weight;
    }
  }

  if total_weight <= 0.0 {
    return sample_nearest(source, src_x, src_y);
  }
  PixelRGBA8::new(
    to_byte(sum[0] / total_weight),
    to_byte(sum[1] / total_weight),
    to_byte(sum[2] / total_weight),
    to_byte(sum[3] / total_weight),
  )
}

#[cfg(test)]
mod tests {
  use super::*;

  fn quad_source() -> ImageBuffer {
    let mut img = ImageBuffer::new(2, 2).unwrap();
    img.set_pixel(0, 0, PixelRGBA8::opaque(0, 0, 0));
    img.set_pixel(1, 0, PixelRGBA8::opaque(100, 0, 0));
    img.set_pixel(0, 1, PixelRGBA8::opaque(0, 100, 0));
    img.set_pixel(1, 1, PixelRGBA8::opaque(100, 100, 0));
    img
  }

  #[test]
  fn identity_resize_is_pixel_exact() {
    let img = quad_source();
    let resized = resize(&img, 2, 2, ResizeFilter::Bilinear);
    assert_eq!(resized, img);
  }

  #[test]
  fn resize_reports_requested_dimensions() {
    let img = quad_source();
    let resized = resize(&img, 5, 7, ResizeFilter::Nearest);
    assert_eq!(resized.width(), 5);
    assert_eq!(resized.height(), 7);
  }

  #[test]
  fn nearest_resize_to_4x4_matches_quadrant_layout() {
    let img = quad_source();
    let resized = resize(&img, 4, 4, ResizeFilter::Nearest);
    assert_eq!(resized.get_pixel(0, 0).unwrap(), PixelRGBA8::opaque(0, 0, 0));
    assert_eq!(resized.get_pixel(1, 1).unwrap(), PixelRGBA8::opaque(0, 0, 0));
    assert_eq!(resized.get_pixel(2, 2).unwrap(), PixelRGBA8::opaque(100, 100, 0));
  }

  #[test]
  fn bilinear_resize_to_4x4_interpolates_at_quadrant_centers() {
    let img = quad_source();
    let resized = resize(&img, 4, 4, ResizeFilter::Bilinear);
    let p11 = resized.get_pixel(1, 1).unwrap();
    assert_eq!(p11, PixelRGBA8::opaque(25, 25, 0));
    let p22 = resized.get_pixel(2, 2).unwrap();
    assert_eq!(p22, PixelRGBA8::opaque(75, 75, 0));
  }
}
