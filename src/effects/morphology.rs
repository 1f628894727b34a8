//! Binary morphology: erode/dilate over a disk structuring element
//! (spec.md §4.9). Grounded on
//! `original_source/src/cli_ops_effects.cpp`'s `applyMorphologyToBuffer`.

use crate::surface::ImageBuffer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MorphologyOp {
  Erode,
  Dilate,
}

/// Applies `iterations` sequential passes of min (`Erode`) or max
/// (`Dilate`) over every channel across a disk of radius `r`
/// (`i*i + j*j <= r*r`). A no-op when `radius <= 0` or `iterations <= 0`.
pub fn morphology(image: &mut ImageBuffer, op: MorphologyOp, radius: i64, iterations: u32) {
  if radius <= 0 || iterations == 0 {
    return;
  }
  for _ in 0..iterations {
    let (w, h) = (image.width(), image.height());
    let mut out = ImageBuffer::new(w, h).expect("source dims already validated");
    for y in 0..h as i64 {
      for x in 0..w as i64 {
        let mut best = match op {
          MorphologyOp::Dilate => [0i32; 4],
          MorphologyOp::Erode => [255i32; 4],
        };
        for j in -radius..=radius {
          for i in -radius..=radius {
            if i * i + j * j > radius * radius {
              continue;
            }
            let s = image.sample_clamped(x + i, y + j);
            let channels = [i32::from(s.r), i32::from(s.g), i32::from(s.b), i32::from(s.a)];
            for c in 0..4 {
              best[c] = match op {
                MorphologyOp::Dilate => best[c].max(channels[c]),
                MorphologyOp::Erode => best[c].min(channels[c]),
              };
            }
          }
        }
        out.set_pixel(x, y, crate::pixel::PixelRGBA8::new(best[0] as u8, best[1] as u8, best[2] as u8, best[3] as u8));
      }
    }
    *image = out;
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::pixel::PixelRGBA8;

  #[test]
  fn dilate_grows_a_white_dot() {
    let mut img = ImageBuffer::new(7, 7).unwrap();
    img.fill(PixelRGBA8::OPAQUE_BLACK);
    img.set_pixel(3, 3, PixelRGBA8::OPAQUE_WHITE);
    morphology(&mut img, MorphologyOp::Dilate, 1, 1);
    assert_eq!(img.get_pixel(3, 2).unwrap(), PixelRGBA8::OPAQUE_WHITE);
    assert_eq!(img.get_pixel(0, 0).unwrap(), PixelRGBA8::OPAQUE_BLACK);
  }

  #[test]
  fn erode_shrinks_a_white_block() {
    let mut img = ImageBuffer::new(7, 7).unwrap();
    img.fill(PixelRGBA8::OPAQUE_WHITE);
    img.set_pixel(0, 0, PixelRGBA8::OPAQUE_BLACK);
    morphology(&mut img, MorphologyOp::Erode, 1, 1);
    assert_eq!(img.get_pixel(1, 0).unwrap(), PixelRGBA8::OPAQUE_BLACK);
  }

  #[test]
  fn nonpositive_radius_is_a_noop() {
    let mut img = ImageBuffer::new(3, 3).unwrap();
    img.fill(PixelRGBA8::opaque(1, 2, 3));
    let before = img.clone();
    morphology(&mut img, MorphologyOp::Dilate, 0, 1);
    assert_eq!(img, before);
  }
}
