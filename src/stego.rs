//! LSB-in-R steganography, the collaborator spec.md §6 gives a contract
//! (`capacity_bytes`/`encode`/`decode`) without internals. Grounded on
//! `original_source/steganography.h`'s `Steganography` class and the
//! round-trip behavior `original_source/tests.cpp`'s `testSteganography`
//! exercises (including the "tiny image can't even fit 1 byte" failure
//! case); the message is stored as a big-endian length prefix followed by
//! its bytes, one bit per pixel in the red channel's LSB, scan order.
//!
//! Only lossless codecs (BMP/PNG/GIF) preserve these LSBs through a
//! save/load round-trip; JPEG's DCT quantization does not (spec.md §6).

use crate::surface::ImageBuffer;

const LENGTH_HEADER_BITS: usize = 32;

/// How many payload bytes `image` can carry, after reserving
/// [`LENGTH_HEADER_BITS`] for the length prefix.
#[must_use]
pub fn capacity_bytes(image: &ImageBuffer) -> usize {
  let total_bits = image.pixels().len();
  total_bits.saturating_sub(LENGTH_HEADER_BITS) / 8
}

fn bit_at(byte: u8, bit_index: u32) -> u8 {
  (byte >> (7 - bit_index)) & 1
}

fn set_lsb(value: u8, bit: u8) -> u8 {
  (value & !1) | (bit & 1)
}

/// Encodes `message`'s big-endian length followed by its bytes, one bit
/// per pixel's red-channel LSB, in place. Returns `false` (without
/// modifying `image`) when `message` doesn't fit in [`capacity_bytes`].
pub fn encode(image: &mut ImageBuffer, message: &[u8]) -> bool {
  if message.len() > capacity_bytes(image) {
    return false;
  }

  let len_bits = (message.len() as u32).to_be_bytes();
  let mut bit_index = 0usize;
  let pixels = image.pixels_mut();

  for byte in len_bits.iter().chain(message.iter()) {
    for b in 0..8 {
      let bit = bit_at(*byte, b);
      pixels[bit_index].r = set_lsb(pixels[bit_index].r, bit);
      bit_index += 1;
    }
  }
  true
}

/// Recovers the message previously written by [`encode`]. Returns an empty
/// vector if the embedded length exceeds what the image can actually carry
/// (a non-stego image read back as garbage rather than panicking).
#[must_use]
pub fn decode(image: &ImageBuffer) -> Vec<u8> {
  let pixels = image.pixels();
  if pixels.len() < LENGTH_HEADER_BITS {
    return Vec::new();
  }

  let mut length_bytes = [0u8; 4];
  for (i, byte) in length_bytes.iter_mut().enumerate() {
    let mut value = 0u8;
    for b in 0..8 {
      let bit = pixels[i * 8 + b].r & 1;
      value = (value << 1) | bit;
    }
    *byte = value;
  }
  let length = u32::from_be_bytes(length_bytes) as usize;
  if length > capacity_bytes(image) {
    return Vec::new();
  }

  let mut message = vec![0u8; length];
  for (i, byte) in message.iter_mut().enumerate() {
    let mut value = 0u8;
    for b in 0..8 {
      let bit_index = LENGTH_HEADER_BITS + i * 8 + b;
      let bit = pixels[bit_index].r & 1;
      value = (value << 1) | bit;
    }
    *byte = value;
  }
  message
}
