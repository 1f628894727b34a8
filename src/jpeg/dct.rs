//! Naive O(N^4) 8x8 forward/inverse DCT-II, exactly as spec.md §4.5 calls
//! for ("the reference naive O(N⁴) formulation is sufficient"). No
//! separable fast-DCT trick is used; this mirrors the straightforward
//! textbook double sum, accumulated in `f64` per spec.md's numeric-stability
//! note.

use std::f64::consts::PI;

const N: usize = 8;

fn alpha(u: usize) -> f64 {
  if u == 0 {
    1.0 / std::f64::consts::SQRT_2
  } else {
    1.0
  }
}

/// Forward DCT-II over an 8x8 block of level-shifted samples, returning
/// coefficients in natural (row-major) order.
pub fn forward_dct_8x8(block: &[f64; 64]) -> [f64; 64] {
  let mut out = [0.0f64; 64];
  for v in 0..N {
    for u in 0..N {
      let mut sum = 0.0;
      for y in 0..N {
        for x in 0..N {
          let sample = block[y * N + x];
          let cu = ((2 * x + 1) as f64 * u as f64 * PI / (2.0 * N as f64)).cos();
          let cv = ((2 * y + 1) as f64 * v as f64 * PI / (2.0 * N as f64)).cos();
          sum += sample * cu * cv;
        }
      }
      out[v * N + u] = 0.25 * alpha(u) * alpha(v) * sum;
    }
  }
  out
}

/// Inverse DCT-II ("DCT-III") over an 8x8 coefficient block, returning
/// spatial-domain samples (still level-shifted, caller re-adds 128).
pub fn inverse_dct_8x8(coeffs: &[f64; 64]) -> [f64; 64] {
  let mut out = [0.0f64; 64];
  for y in 0..N {
    for x in 0..N {
      let mut sum = 0.0;
      for v in 0..N {
        for u in 0..N {
          let cu = ((2 * x + 1) as f64 * u as f64 * PI / (2.0 * N as f64)).cos();
          let cv = ((2 * y + 1) as f64 * v as f64 * PI / (2.0 * N as f64)).cos();
          sum += alpha(u) * alpha(v) * coeffs[v * N + u] * cu * cv;
        }
      }
      out[y * N + x] = 0.25 * sum;
    }
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn roundtrips_within_float_tolerance() {
    let mut block = [0.0f64; 64];
    for (i, v) in block.iter_mut().enumerate() {
      *v = ((i * 37) % 256) as f64 - 128.0;
    }
    let coeffs = forward_dct_8x8(&block);
    let back = inverse_dct_8x8(&coeffs);
    for i in 0..64 {
      assert!((back[i] - block[i]).abs() < 1e-6, "index {i}: {} vs {}", back[i], block[i]);
    }
  }

  #[test]
  fn dc_only_block_is_uniform() {
    let mut coeffs = [0.0f64; 64];
    coeffs[0] = 100.0;
    let back = inverse_dct_8x8(&coeffs);
    let first = back[0];
    for v in back {
      assert!((v - first).abs() < 1e-9);
    }
  }
}
