//! A minimal zlib wrapper restricted to the subset PNG's Non-goals allow:
//! `BTYPE=00` stored deflate blocks only (spec.md §4.3, §1 — "The PNG
//! encoder emits only uncompressed deflate blocks and decodes only the
//! same"). There is no Huffman/LZ77 engine here at all; a general-purpose
//! inflate implementation (the teacher depends on `miniz_oxide` for exactly
//! this) is never exercised, so it isn't carried as a dependency — see
//! DESIGN.md.

use super::PngError;

const MAX_STORED_BLOCK: usize = 0xFFFF;

/// Wraps `data` in a zlib stream made of one or more stored deflate blocks.
pub fn zlib_store(data: &[u8]) -> Vec<u8> {
  let mut out = Vec::with_capacity(data.len() + data.len() / MAX_STORED_BLOCK + 16);
  out.push(0x78); // CMF: CM=8 (deflate), CINFO=7 (32K window)
  out.push(0x01); // FLG: FCHECK chosen so (CMF<<8|FLG) % 31 == 0, FDICT=0

  if data.is_empty() {
    write_stored_block(&mut out, &[], true);
  } else {
    let mut chunks = data.chunks(MAX_STORED_BLOCK).peekable();
    while let Some(chunk) = chunks.next() {
      write_stored_block(&mut out, chunk, chunks.peek().is_none());
    }
  }

  out.extend_from_slice(&adler32(data).to_be_bytes());
  out
}

fn write_stored_block(out: &mut Vec<u8>, chunk: &[u8], is_final: bool) {
  out.push(u8::from(is_final)); // BFINAL in bit 0, BTYPE=00 in bits 1-2
  let len = chunk.len() as u16;
  out.extend_from_slice(&len.to_le_bytes());
  out.extend_from_slice(&(!len).to_le_bytes());
  out.extend_from_slice(chunk);
}

/// Unwraps a zlib stream of stored deflate blocks back to the original
/// bytes. Fails on anything but `BTYPE=00`, on a `LEN`/`NLEN` mismatch, or on
/// an Adler-32 mismatch.
pub fn zlib_unstore(bytes: &[u8]) -> Result<Vec<u8>, PngError> {
  if bytes.len() < 6 {
    return Err(PngError::UnexpectedEndOfInput);
  }
  let cmf = bytes[0];
  let flg = bytes[1];
  if (u16::from(cmf) << 8 | u16::from(flg)) % 31 != 0 {
    return Err(PngError::IllegalFlagCheck);
  }
  if cmf & 0x0F != 8 {
    return Err(PngError::IllegalCompressionMethod);
  }
  if flg & 0x20 != 0 {
    return Err(PngError::IllegalFlagDictionary);
  }

  let body_end = bytes.len() - 4;
  let mut pos = 2;
  let mut out = Vec::new();
  loop {
    if pos + 5 > body_end {
      return Err(PngError::UnexpectedEndOfInput);
    }
    let header = bytes[pos];
    let is_final = header & 1 != 0;
    let btype = (header >> 1) & 0b11;
    if btype != 0 {
      return Err(PngError::IllegalBlockType);
    }
    pos += 1;
    let len = u16::from_le_bytes([bytes[pos], bytes[pos + 1]]);
    let nlen = u16::from_le_bytes([bytes[pos + 2], bytes[pos + 3]]);
    if nlen != !len {
      return Err(PngError::LenAndNLenDidNotMatch);
    }
    pos += 4;
    let len = len as usize;
    if pos + len > body_end {
      return Err(PngError::UnexpectedEndOfInput);
    }
    out.extend_from_slice(&bytes[pos..pos + len]);
    pos += len;
    if is_final {
      break;
    }
  }

  let expected_adler = u32::from_be_bytes(bytes[body_end..body_end + 4].try_into().unwrap());
  if adler32(&out) != expected_adler {
    return Err(PngError::AdlerMismatch);
  }

  Ok(out)
}

fn adler32(data: &[u8]) -> u32 {
  const MOD_ADLER: u32 = 65521;
  let mut a: u32 = 1;
  let mut b: u32 = 0;
  for &byte in data {
    a = (a + u32::from(byte)) % MOD_ADLER;
    b = (b + a) % MOD_ADLER;
  }
  (b << 16) | a
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn roundtrip_small() {
    let data = b"the quick brown fox jumps over the lazy dog";
    let wrapped = zlib_store(data);
    assert_eq!(&wrapped[0..2], &[0x78, 0x01]);
    assert_eq!(zlib_unstore(&wrapped).unwrap(), data);
  }

  #[test]
  fn roundtrip_multi_block() {
    let data = vec![7u8; MAX_STORED_BLOCK * 2 + 123];
    let wrapped = zlib_store(&data);
    assert_eq!(zlib_unstore(&wrapped).unwrap(), data);
  }

  #[test]
  fn rejects_dynamic_huffman_block_type() {
    let mut wrapped = zlib_store(b"hi");
    wrapped[2] = (wrapped[2] & !0b110) | 0b100; // BTYPE=10
    assert_eq!(zlib_unstore(&wrapped), Err(PngError::IllegalBlockType));
  }

  #[test]
  fn empty_input_roundtrips() {
    let wrapped = zlib_store(&[]);
    assert_eq!(zlib_unstore(&wrapped).unwrap(), Vec::<u8>::new());
  }
}
