//! Sobel and Canny edge detection (spec.md §4.9). Grounded on
//! `original_source/src/cli_ops_effects.cpp`'s `applySobelToBuffer` /
//! `applyCannyToBuffer`.

use crate::pixel::PixelRGBA8;
use crate::surface::ImageBuffer;
use std::collections::VecDeque;

const KX: [[i32; 3]; 3] = [[-1, 0, 1], [-2, 0, 2], [-1, 0, 1]];
const KY: [[i32; 3]; 3] = [[-1, -2, -1], [0, 0, 0], [1, 2, 1]];

fn luma01(p: PixelRGBA8) -> f32 {
  p.luma() / 255.0
}

fn clamp_byte(v: f32) -> u8 {
  v.round().clamp(0.0, 255.0) as u8
}

/// 3x3 Sobel gradient magnitude on luma, scaled by `min(1, mag/4)`.
/// Monochrome output; `keep_alpha` copies the source alpha through
/// unchanged, otherwise the result is fully opaque.
pub fn sobel(image: &mut ImageBuffer, keep_alpha: bool) {
  let (w, h) = (image.width(), image.height());
  let mut out = ImageBuffer::new(w, h).expect("source dims already validated");
  for y in 0..h as i64 {
    for x in 0..w as i64 {
      let mut gx = 0.0f64;
      let mut gy = 0.0f64;
      for j in -1..=1i64 {
        for i in -1..=1i64 {
          let l = f64::from(luma01(image.sample_clamped(x + i, y + j)));
          gx += f64::from(KX[(j + 1) as usize][(i + 1) as usize]) * l;
          gy += f64::from(KY[(j + 1) as usize][(i + 1) as usize]) * l;
        }
      }
      let mag = (gx * gx + gy * gy).sqrt();
      let m = clamp_byte((255.0 * (mag / 4.0).min(1.0)) as f32);
      let alpha = if keep_alpha { image.get_pixel(x, y).expect("x,y in bounds").a } else { 255 };
      out.set_pixel(x, y, PixelRGBA8::new(m, m, m, alpha));
    }
  }
  *image = out;
}

/// Sobel -> non-maximum suppression (4-bin quantized gradient direction) ->
/// double threshold -> 8-connected hysteresis flood from strong pixels.
/// Output is binary (0 or 255), monochrome.
pub fn canny(image: &mut ImageBuffer, low_threshold: i32, high_threshold: i32, keep_alpha: bool) {
  let w = image.width() as i64;
  let h = image.height() as i64;
  if w <= 0 || h <= 0 {
    return;
  }
  let idx = |x: i64, y: i64| -> usize { (y * w + x) as usize };

  let mut gx = vec![0.0f32; (w * h) as usize];
  let mut gy = vec![0.0f32; (w * h) as usize];
  let mut mag = vec![0.0f32; (w * h) as usize];
  let mut dir = vec![0.0f32; (w * h) as usize];

  for y in 0..h {
    for x in 0..w {
      let mut sx = 0.0f32;
      let mut sy = 0.0f32;
      for j in -1..=1i64 {
        for i in -1..=1i64 {
          let l = luma01(image.sample_clamped(x + i, y + j));
          sx += KX[(j + 1) as usize][(i + 1) as usize] as f32 * l;
          sy += KY[(j + 1) as usize][(i + 1) as usize] as f32 * l;
        }
      }
      gx[idx(x, y)] = sx;
      gy[idx(x, y)] = sy;
      mag[idx(x, y)] = (sx * sx + sy * sy).sqrt();
      dir[idx(x, y)] = sy.atan2(sx);
    }
  }

  let mut nms = vec![0.0f32; (w * h) as usize];
  for y in 1..h - 1 {
    for x in 1..w - 1 {
      let angle = dir[idx(x, y)] * 180.0 / std::f32::consts::PI;
      let norm = if angle < 0.0 { angle + 180.0 } else { angle };

      let (q, r) = if (0.0..22.5).contains(&norm) || (157.5..=180.0).contains(&norm) {
        (mag[idx(x + 1, y)], mag[idx(x - 1, y)])
      } else if (22.5..67.5).contains(&norm) {
        (mag[idx(x + 1, y - 1)], mag[idx(x - 1, y + 1)])
      } else if (67.5..112.5).contains(&norm) {
        (mag[idx(x, y + 1)], mag[idx(x, y - 1)])
      } else {
        (mag[idx(x - 1, y - 1)], mag[idx(x + 1, y + 1)])
      };

      let m = mag[idx(x, y)];
      nms[idx(x, y)] = if m >= q && m >= r { m } else { 0.0 };
    }
  }

  let low = f32::from(low_threshold.clamp(0, 255) as u8) / 255.0;
  let high = f32::from(high_threshold.clamp(0, 255) as u8) / 255.0;

  let mut edges = vec![0u8; (w * h) as usize];
  let mut queue: VecDeque<(i64, i64)> = VecDeque::new();
  for y in 1..h - 1 {
    for x in 1..w - 1 {
      let m = nms[idx(x, y)];
      if m >= high {
        edges[idx(x, y)] = 255;
        queue.push_back((x, y));
      } else if m >= low {
        edges[idx(x, y)] = 128;
      }
    }
  }

  while let Some((x, y)) = queue.pop_front() {
    for j in -1..=1i64 {
      for i in -1..=1i64 {
        if i == 0 && j == 0 {
          continue;
        }
        let (nx, ny) = (x + i, y + j);
        if nx < 0 || nx >= w || ny < 0 || ny >= h {
          continue;
        }
        if edges[idx(nx, ny)] == 128 {
          edges[idx(nx, ny)] = 255;
          queue.push_back((nx, ny));
        }
      }
    }
  }

  let mut out = ImageBuffer::new(w as u32, h as u32).expect("source dims already validated");
  for y in 0..h {
    for x in 0..w {
      let v = if edges[idx(x, y)] == 255 { 255 } else { 0 };
      let alpha = if keep_alpha { image.get_pixel(x, y).expect("x,y in bounds").a } else { 255 };
      out.set_pixel(x, y, PixelRGBA8::new(v, v, v, alpha));
    }
  }
  *image = out;
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn sobel_is_monochrome_and_flat_on_uniform_input() {
    let mut img = ImageBuffer::new(5, 5).unwrap();
    img.fill(PixelRGBA8::opaque(40, 40, 40));
    sobel(&mut img, true);
    assert!(img.pixels().iter().all(|p| p.r == p.g && p.g == p.b));
    assert!(img.pixels().iter().all(|p| p.r == 0));
  }

  #[test]
  fn sobel_fires_on_a_hard_vertical_edge() {
    let mut img = ImageBuffer::new(6, 6).unwrap();
    img.fill(PixelRGBA8::OPAQUE_BLACK);
    for y in 0..6i64 {
      for x in 3..6i64 {
        img.set_pixel(x, y, PixelRGBA8::OPAQUE_WHITE);
      }
    }
    sobel(&mut img, true);
    assert!(img.get_pixel(3, 3).unwrap().r > 0);
    assert_eq!(img.get_pixel(0, 3).unwrap().r, 0);
  }

  #[test]
  fn canny_output_is_binary() {
    let mut img = ImageBuffer::new(8, 8).unwrap();
    img.fill(PixelRGBA8::OPAQUE_BLACK);
    for y in 0..8i64 {
      for x in 4..8i64 {
        img.set_pixel(x, y, PixelRGBA8::OPAQUE_WHITE);
      }
    }
    canny(&mut img, 40, 90, true);
    assert!(img.pixels().iter().all(|p| p.r == 0 || p.r == 255));
  }
}
