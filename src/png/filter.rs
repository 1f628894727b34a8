//! Scanline filtering/unfiltering for 24-bit RGB PNG data (3 bytes/pixel).
//!
//! The encoder always emits filter type 0 (None) per spec.md §4.3's Non-goal;
//! the decoder reconstructs all five filter types. Grounded on the teacher's
//! `reconstruct_in_place`/Paeth predictor
//! (`examples/Lokathor-imagine/src/filtering.rs`,
//! `examples/Lokathor-imagine/src/png/mod.rs`), narrowed from the teacher's
//! generic-BPP byte-stream version to the fixed 3-bytes-per-pixel case this
//! crate needs.

const BPP: usize = 3;

#[inline]
fn paeth(a: u8, b: u8, c: u8) -> u8 {
  let a_ = i32::from(a);
  let b_ = i32::from(b);
  let c_ = i32::from(c);
  let p = a_ + b_ - c_;
  let pa = (p - a_).abs();
  let pb = (p - b_).abs();
  let pc = (p - c_).abs();
  // The PNG spec requires this exact tie-break order.
  if pa <= pb && pa <= pc {
    a
  } else if pb <= pc {
    b
  } else {
    c
  }
}

/// Prefixes each `width*3`-byte row of `rgb` with a filter-type byte (always
/// 0 / None) and returns the concatenated scanlines ready for the deflate
/// stage.
pub fn filter_none(rgb: &[u8], width: u32, height: u32) -> Vec<u8> {
  let row_len = width as usize * BPP;
  let mut out = Vec::with_capacity((row_len + 1) * height as usize);
  for row in rgb.chunks_exact(row_len) {
    out.push(0u8);
    out.extend_from_slice(row);
  }
  out
}

/// Reconstructs raw `width*3`-byte-per-row RGB pixel data from a filtered
/// scanline stream (filter byte + `width*3` bytes, repeated per row).
///
/// # Errors
/// Returns the offending filter type byte if it isn't in `0..=4`.
pub fn unfilter(filtered: &[u8], width: u32, height: u32) -> Result<Vec<u8>, u8> {
  let row_len = width as usize * BPP;
  let mut out = vec![0u8; row_len * height as usize];
  let mut prev_row: Option<usize> = None;

  for y in 0..height as usize {
    let src_start = y * (row_len + 1);
    let filter_type = filtered[src_start];
    let src = &filtered[src_start + 1..src_start + 1 + row_len];
    let dst_start = y * row_len;

    for i in 0..row_len {
      let x = src[i];
      let a = if i >= BPP { out[dst_start + i - BPP] } else { 0 };
      let b = prev_row.map_or(0, |p| out[p + i]);
      let c = match (i >= BPP, prev_row) {
        (true, Some(p)) => out[p + i - BPP],
        _ => 0,
      };
      let recon = match filter_type {
        0 => x,
        1 => x.wrapping_add(a),
        2 => x.wrapping_add(b),
        3 => x.wrapping_add(((u16::from(a) + u16::from(b)) / 2) as u8),
        4 => x.wrapping_add(paeth(a, b, c)),
        other => return Err(other),
      };
      out[dst_start + i] = recon;
    }
    prev_row = Some(dst_start);
  }

  Ok(out)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn filter_none_roundtrips_through_unfilter() {
    let width = 2;
    let height = 2;
    let rgb: Vec<u8> = (0..(width * height * 3) as u8).collect();
    let filtered = filter_none(&rgb, width, height);
    let back = unfilter(&filtered, width, height).unwrap();
    assert_eq!(back, rgb);
  }

  #[test]
  fn sub_filter_reconstructs() {
    // Row: [10, 20, 30, 15, 25, 35] filtered with Sub gives deltas of
    // [10,20,30, 5,5,5] relative to the left pixel.
    let width = 2;
    let height = 1;
    let mut filtered = vec![1u8]; // filter type 1 = Sub
    filtered.extend_from_slice(&[10, 20, 30, 5, 5, 5]);
    let back = unfilter(&filtered, width, height).unwrap();
    assert_eq!(back, vec![10, 20, 30, 15, 25, 35]);
  }

  #[test]
  fn unknown_filter_type_errors() {
    let filtered = vec![9u8, 0, 0, 0];
    assert_eq!(unfilter(&filtered, 1, 1), Err(9));
  }
}
