//! Separable Gaussian blur (spec.md §4.9). Grounded on
//! `original_source/src/cli_ops_effects.cpp`'s `applyGaussianBlurToBuffer`:
//! a horizontal pass into a scratch buffer followed by a vertical pass,
//! both clamp-to-edge.

use crate::surface::ImageBuffer;

fn clamp_byte(v: f64) -> u8 {
  v.round().clamp(0.0, 255.0) as u8
}

fn build_kernel(radius: i32, sigma: f64) -> Vec<f64> {
  let mut kernel = vec![0.0; (radius * 2 + 1) as usize];
  let mut sum = 0.0;
  for i in -radius..=radius {
    let x = f64::from(i);
    let w = (-(x * x) / (2.0 * sigma * sigma)).exp();
    kernel[(i + radius) as usize] = w;
    sum += w;
  }
  for w in &mut kernel {
    *w /= sum;
  }
  kernel
}

/// Blurs `image` in place with a `radius`-tap separable Gaussian kernel.
/// `sigma <= 0.0` selects the spec.md-documented default
/// `max(userSigma, 0.3*radius + 0.8)`; `radius <= 0` is a no-op.
pub fn gaussian_blur(image: &mut ImageBuffer, radius: i32, sigma: f64) {
  if radius <= 0 {
    return;
  }
  let effective_sigma = if sigma > 0.0 { sigma } else { 0.3 * f64::from(radius) + 0.8 };
  let kernel = build_kernel(radius, effective_sigma);

  let (w, h) = (image.width(), image.height());
  let mut horizontal = ImageBuffer::new(w, h).expect("source dims already validated");
  for y in 0..h as i64 {
    for x in 0..w as i64 {
      let mut acc = [0.0f64; 4];
      for k in -radius..=radius {
        let s = image.sample_clamped(x + i64::from(k), y);
        let weight = kernel[(k + radius) as usize];
        acc[0] += weight * f64::from(s.r);
        acc[1] += weight * f64::from(s.g);
        acc[2] += weight * f64::from(s.b);
        acc[3] += weight * f64::from(s.a);
      }
      horizontal.set_pixel(x, y, crate::pixel::PixelRGBA8::new(clamp_byte(acc[0]), clamp_byte(acc[1]), clamp_byte(acc[2]), clamp_byte(acc[3])));
    }
  }

  let mut vertical = ImageBuffer::new(w, h).expect("source dims already validated");
  for y in 0..h as i64 {
    for x in 0..w as i64 {
      let mut acc = [0.0f64; 4];
      for k in -radius..=radius {
        let s = horizontal.sample_clamped(x, y + i64::from(k));
        let weight = kernel[(k + radius) as usize];
        acc[0] += weight * f64::from(s.r);
        acc[1] += weight * f64::from(s.g);
        acc[2] += weight * f64::from(s.b);
        acc[3] += weight * f64::from(s.a);
      }
      vertical.set_pixel(x, y, crate::pixel::PixelRGBA8::new(clamp_byte(acc[0]), clamp_byte(acc[1]), clamp_byte(acc[2]), clamp_byte(acc[3])));
    }
  }

  *image = vertical;
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::pixel::PixelRGBA8;

  #[test]
  fn blur_is_a_noop_for_nonpositive_radius() {
    let mut img = ImageBuffer::new(2, 2).unwrap();
    img.set_pixel(0, 0, PixelRGBA8::opaque(10, 20, 30));
    let before = img.clone();
    gaussian_blur(&mut img, 0, 1.0);
    assert_eq!(img, before);
  }

  #[test]
  fn blur_smooths_a_single_bright_pixel_toward_its_neighbors() {
    let mut img = ImageBuffer::new(5, 5).unwrap();
    img.fill(PixelRGBA8::OPAQUE_BLACK);
    img.set_pixel(2, 2, PixelRGBA8::OPAQUE_WHITE);
    gaussian_blur(&mut img, 2, 1.0);
    let center = img.get_pixel(2, 2).unwrap();
    let corner = img.get_pixel(0, 0).unwrap();
    assert!(center.r < 255);
    assert!(corner.r > 0);
    assert!(center.r > corner.r);
  }

  #[test]
  fn uniform_image_is_unchanged_by_blur() {
    let mut img = ImageBuffer::new(4, 4).unwrap();
    img.fill(PixelRGBA8::opaque(50, 60, 70));
    gaussian_blur(&mut img, 3, 0.0);
    assert!(img.pixels().iter().all(|&p| p == PixelRGBA8::opaque(50, 60, 70)));
  }
}
