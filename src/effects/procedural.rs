//! Procedural effects: fractal value noise, diagonal hatching, and
//! stochastic pencil strokes (spec.md §4.9). Grounded on
//! `original_source/src/cli_ops_effects.cpp`'s
//! `applyFractalNoiseToBuffer`/`applyHatchToBuffer`/`applyPencilStrokesToBuffer`,
//! which share a hash-based `std::mt19937` RNG seeded per call; this crate
//! uses a small local xorshift-style PRNG instead of pulling in `rand`,
//! since the spec only needs a seeded, reproducible stream, not a
//! cryptographically-reviewed generator.

use super::{clamp01, clamp_byte, lerp_pixel};
use crate::pixel::PixelRGBA8;
use crate::surface::ImageBuffer;

fn hash_unit_noise(x: i32, y: i32, seed: u32) -> f32 {
  let mut n = (x as u32).wrapping_mul(374_761_393);
  n ^= (y as u32).wrapping_mul(668_265_263);
  n ^= seed.wrapping_mul(2_246_822_519);
  n = (n ^ (n >> 13)).wrapping_mul(1_274_126_177);
  n ^= n >> 16;
  (n & 0x00ff_ffff) as f32 / 0x0100_0000 as f32
}

fn smoothstep01(t: f32) -> f32 {
  let c = clamp01(t);
  c * c * (3.0 - 2.0 * c)
}

fn value_noise(x: f32, y: f32, seed: u32) -> f32 {
  let x0 = x.floor() as i32;
  let y0 = y.floor() as i32;
  let tx = smoothstep01(x - x0 as f32);
  let ty = smoothstep01(y - y0 as f32);

  let v00 = hash_unit_noise(x0, y0, seed);
  let v10 = hash_unit_noise(x0 + 1, y0, seed);
  let v01 = hash_unit_noise(x0, y0 + 1, seed);
  let v11 = hash_unit_noise(x0 + 1, y0 + 1, seed);

  let a = v00 + (v10 - v00) * tx;
  let b = v01 + (v11 - v01) * tx;
  a + (b - a) * ty
}

fn fractal_value(x: f32, y: f32, octaves: u32, lacunarity: f32, gain: f32, seed: u32) -> f32 {
  let mut amplitude = 1.0f32;
  let mut frequency = 1.0f32;
  let mut sum = 0.0f32;
  let mut norm = 0.0f32;
  for o in 0..octaves {
    let octave_seed = seed.wrapping_add(o.wrapping_mul(1013));
    sum += amplitude * value_noise(x * frequency, y * frequency, octave_seed);
    norm += amplitude;
    amplitude *= gain;
    frequency *= lacunarity;
  }
  if norm <= 0.0 {
    return 0.0;
  }
  sum / norm
}

#[derive(Debug, Clone, Copy)]
pub struct FractalNoiseOptions {
  pub scale: f32,
  pub octaves: u32,
  pub lacunarity: f32,
  pub gain: f32,
  pub amount: f32,
  pub seed: u32,
  pub monochrome: bool,
}

impl Default for FractalNoiseOptions {
  fn default() -> Self {
    Self { scale: 64.0, octaves: 5, lacunarity: 2.0, gain: 0.5, amount: 0.2, seed: 1337, monochrome: true }
  }
}

/// Adds `(-1..1) * amount * 255` of summed-octave value noise to each
/// channel (monochrome: the same delta on every channel; color: three
/// independently-offset noise fields).
pub fn fractal_noise(image: &mut ImageBuffer, opts: FractalNoiseOptions) {
  let scale = if opts.scale <= 0.0 { 64.0 } else { opts.scale };
  let octaves = opts.octaves.max(1);
  let lacunarity = opts.lacunarity.max(1.01);
  let gain = opts.gain.clamp(0.01, 1.0);
  let mix = clamp01(opts.amount);

  let (w, h) = (image.width(), image.height());
  for y in 0..h as i64 {
    for x in 0..w as i64 {
      let nx = x as f32 / scale;
      let ny = y as f32 / scale;
      let n = fractal_value(nx, ny, octaves, lacunarity, gain, opts.seed);
      let c = n * 2.0 - 1.0;
      let dr = (c * 255.0 * mix).round() as i32;
      let mut dg = dr;
      let mut db = dr;
      if !opts.monochrome {
        let n2 = fractal_value(nx + 37.2, ny + 11.7, octaves, lacunarity, gain, opts.seed.wrapping_add(97));
        let n3 = fractal_value(nx + 73.9, ny + 19.3, octaves, lacunarity, gain, opts.seed.wrapping_add(211));
        dg = ((n2 * 2.0 - 1.0) * 255.0 * mix).round() as i32;
        db = ((n3 * 2.0 - 1.0) * 255.0 * mix).round() as i32;
      }
      let src = image.get_pixel(x, y).expect("x,y in bounds");
      image.set_pixel(
        x,
        y,
        PixelRGBA8::new(clamp_byte(i32::from(src.r) as f32 + dr as f32), clamp_byte(i32::from(src.g) as f32 + dg as f32), clamp_byte(i32::from(src.b) as f32 + db as f32), src.a),
      );
    }
  }
}

fn hatch_hit(x: i64, y: i64, spacing: i64, width: i64, mode: u8) -> bool {
  let m = spacing.max(1);
  let w = width.max(1);
  match mode {
    0 => (x + y).rem_euclid(m) < w,
    1 => (x - y).rem_euclid(m) < w,
    2 => y.rem_euclid(m) < w,
    _ => x.rem_euclid(m) < w,
  }
}

#[derive(Debug, Clone, Copy)]
pub struct HatchOptions {
  pub spacing: i64,
  pub line_width: i64,
  pub ink: PixelRGBA8,
  pub opacity: f32,
  pub preserve_highlights: bool,
}

impl Default for HatchOptions {
  fn default() -> Self {
    Self { spacing: 8, line_width: 1, ink: PixelRGBA8::new(28, 28, 28, 255), opacity: 0.9, preserve_highlights: true }
  }
}

/// Four progressively-activated diagonal/horizontal/vertical hatch layers,
/// darker regions picking up more of them, lerped toward `ink` scaled by
/// local darkness (spec.md §4.9).
pub fn hatch(image: &mut ImageBuffer, opts: HatchOptions) {
  let mix_base = clamp01(opts.opacity);
  let (w, h) = (image.width(), image.height());
  for y in 0..h as i64 {
    for x in 0..w as i64 {
      let src = image.get_pixel(x, y).expect("x,y in bounds");
      let darkness = 1.0 - src.luma() / 255.0;
      if darkness <= 0.05 && opts.preserve_highlights {
        continue;
      }

      let mut hit = false;
      if darkness > 0.18 {
        hit |= hatch_hit(x, y, opts.spacing, opts.line_width, 0);
      }
      if darkness > 0.35 {
        hit |= hatch_hit(x, y, opts.spacing + 2, opts.line_width, 1);
      }
      if darkness > 0.55 {
        hit |= hatch_hit(x, y, opts.spacing + 4, opts.line_width, 2);
      }
      if darkness > 0.75 {
        hit |= hatch_hit(x, y, opts.spacing + 6, opts.line_width, 3);
      }
      if !hit {
        continue;
      }

      let mix = clamp01(mix_base * darkness);
      let target = PixelRGBA8::new(opts.ink.r, opts.ink.g, opts.ink.b, src.a);
      image.set_pixel(x, y, lerp_pixel(src, target, mix));
    }
  }
}

/// A tiny, seedable xorshift PRNG. Not cryptographic; exists purely so
/// pencil-stroke placement is reproducible across runs for the same seed,
/// the same contract `original_source` gets from seeding `std::mt19937`.
struct Rng(u64);

impl Rng {
  fn new(seed: u32) -> Self {
    Self(u64::from(seed).wrapping_mul(0x9E37_79B9_7F4A_7C15).max(1))
  }

  fn next_u32(&mut self) -> u32 {
    // xorshift64*
    self.0 ^= self.0 >> 12;
    self.0 ^= self.0 << 25;
    self.0 ^= self.0 >> 27;
    (self.0.wrapping_mul(0x2545_F491_4F6C_DD1D) >> 32) as u32
  }

  fn unit_f32(&mut self) -> f32 {
    (self.next_u32() as f32) / (u32::MAX as f32)
  }

  fn range_f32(&mut self, lo: f32, hi: f32) -> f32 {
    lo + self.unit_f32() * (hi - lo)
  }

  fn range_i32(&mut self, lo: i32, hi: i32) -> i32 {
    if hi <= lo {
      return lo;
    }
    lo + (self.next_u32() % ((hi - lo + 1) as u32)) as i32
  }
}

#[derive(Debug, Clone, Copy)]
pub struct PencilStrokeOptions {
  pub spacing: i64,
  pub length: i64,
  pub thickness: i64,
  pub angle_degrees: f64,
  pub angle_jitter_degrees: f64,
  pub position_jitter: i64,
  pub ink: PixelRGBA8,
  pub opacity: f32,
  pub min_darkness: f32,
  pub seed: u32,
}

impl Default for PencilStrokeOptions {
  fn default() -> Self {
    Self {
      spacing: 8,
      length: 14,
      thickness: 1,
      angle_degrees: 28.0,
      angle_jitter_degrees: 26.0,
      position_jitter: 2,
      ink: PixelRGBA8::new(26, 26, 26, 255),
      opacity: 0.22,
      min_darkness: 0.15,
      seed: 1337,
    }
  }
}

fn blend_pixel_over(image: &mut ImageBuffer, x: i64, y: i64, color: PixelRGBA8, alpha: f32) {
  if alpha <= 0.0 || !image.in_bounds(x, y) {
    return;
  }
  let dst = image.get_pixel(x, y).expect("checked in_bounds");
  image.set_pixel(x, y, lerp_pixel(dst, PixelRGBA8::new(color.r, color.g, color.b, dst.a), clamp01(alpha)));
}

fn draw_soft_line(image: &mut ImageBuffer, x0: i64, y0: i64, x1: i64, y1: i64, ink: PixelRGBA8, opacity: f32, thickness: i64) {
  let dx = (x1 - x0).abs();
  let dy = (y1 - y0).abs();
  let steps = dx.max(dy).max(1);
  let radius = (thickness / 2).max(0);

  for i in 0..=steps {
    let t = i as f64 / steps as f64;
    let x = (x0 as f64 + (x1 - x0) as f64 * t).round() as i64;
    let y = (y0 as f64 + (y1 - y0) as f64 * t).round() as i64;

    for oy in -radius..=radius {
      for ox in -radius..=radius {
        let d2 = (ox * ox + oy * oy) as f64;
        let falloff = if radius == 0 { 1.0 } else { (1.0 - d2 / ((radius + 1) * (radius + 1)) as f64).max(0.0) };
        blend_pixel_over(image, x + ox, y + oy, ink, opacity * falloff as f32);
      }
    }
  }
}

/// Scatters short strokes on a `spacing`-pixel grid (jittered in position
/// and angle), biased toward darker regions, and blends a soft round brush
/// over the buffer along each stroke (spec.md §4.9).
pub fn pencil_strokes(image: &mut ImageBuffer, opts: PencilStrokeOptions) {
  let step = opts.spacing.max(1);
  let stroke_length = opts.length.max(1);
  let jitter = opts.position_jitter.max(0);
  let min_dark = clamp01(opts.min_darkness);

  let mut rng = Rng::new(opts.seed);
  let base_rad = opts.angle_degrees.to_radians();
  let (w, h) = (image.width() as i64, image.height() as i64);

  let mut y = 0i64;
  while y < h {
    let mut x = 0i64;
    while x < w {
      let sx = x + rng.range_i32(-(jitter as i32), jitter as i32) as i64;
      let sy = y + rng.range_i32(-(jitter as i32), jitter as i32) as i64;
      if !image.in_bounds(sx, sy) {
        x += step;
        continue;
      }

      let darkness = 1.0 - image.get_pixel(sx, sy).expect("checked in_bounds").luma() / 255.0;
      if darkness < min_dark {
        x += step;
        continue;
      }

      let spawn_chance = clamp01((darkness - min_dark) / (1.0 - min_dark).max(0.0001));
      if rng.unit_f32() > spawn_chance {
        x += step;
        continue;
      }

      let theta = base_rad + f64::from(rng.range_f32(-opts.angle_jitter_degrees as f32, opts.angle_jitter_degrees as f32)).to_radians();
      let half = stroke_length as f64 * 0.5;
      let x0 = (sx as f64 - theta.cos() * half).round() as i64;
      let y0 = (sy as f64 - theta.sin() * half).round() as i64;
      let x1 = (sx as f64 + theta.cos() * half).round() as i64;
      let y1 = (sy as f64 + theta.sin() * half).round() as i64;
      let stroke_opacity = clamp01(opts.opacity * (0.45 + darkness * 0.9));
      draw_soft_line(image, x0, y0, x1, y1, opts.ink, stroke_opacity, opts.thickness);

      x += step;
    }
    y += step;
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn fractal_noise_is_a_noop_at_zero_amount() {
    let mut img = ImageBuffer::new(8, 8).unwrap();
    img.fill(PixelRGBA8::opaque(50, 50, 50));
    let before = img.clone();
    fractal_noise(&mut img, FractalNoiseOptions { amount: 0.0, ..Default::default() });
    assert_eq!(img, before);
  }

  #[test]
  fn hatch_leaves_bright_regions_untouched_when_preserving_highlights() {
    let mut img = ImageBuffer::new(4, 4).unwrap();
    img.fill(PixelRGBA8::OPAQUE_WHITE);
    let before = img.clone();
    hatch(&mut img, HatchOptions::default());
    assert_eq!(img, before);
  }

  #[test]
  fn hatch_darkens_a_fully_black_region() {
    let mut img = ImageBuffer::new(4, 4).unwrap();
    img.fill(PixelRGBA8::OPAQUE_BLACK);
    hatch(&mut img, HatchOptions::default());
    assert!(img.pixels().iter().any(|p| p.r != 0));
  }

  #[test]
  fn pencil_strokes_runs_deterministically_for_a_fixed_seed() {
    let mut a = ImageBuffer::new(16, 16).unwrap();
    a.fill(PixelRGBA8::OPAQUE_WHITE);
    a.set_pixel(8, 8, PixelRGBA8::OPAQUE_BLACK);
    let mut b = a.clone();
    pencil_strokes(&mut a, PencilStrokeOptions { seed: 42, ..Default::default() });
    pencil_strokes(&mut b, PencilStrokeOptions { seed: 42, ..Default::default() });
    assert_eq!(a.pixels(), b.pixels());
  }
}
