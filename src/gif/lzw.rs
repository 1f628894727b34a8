//! GIF-variant LZW: LSB-first bit packing, explicit clear/end codes, code
//! width growth up to 12 bits (spec.md §4.4). This is its own dialect (distinct
//! from TIFF/PDF LZW) so it's implemented directly rather than borrowed from
//! an existing crate, grounded on spec.md's exact bit-packing/table-growth
//! rules rather than any one file in the retrieval pack.

struct BitWriter {
  bytes: Vec<u8>,
  acc: u32,
  acc_bits: u32,
}

impl BitWriter {
  fn new() -> Self {
    Self { bytes: Vec::new(), acc: 0, acc_bits: 0 }
  }

  fn push_code(&mut self, code: u32, width: u32) {
    self.acc |= code << self.acc_bits;
    self.acc_bits += width;
    while self.acc_bits >= 8 {
      self.bytes.push((self.acc & 0xFF) as u8);
      self.acc >>= 8;
      self.acc_bits -= 8;
    }
  }

  fn finish(mut self) -> Vec<u8> {
    if self.acc_bits > 0 {
      self.bytes.push((self.acc & 0xFF) as u8);
    }
    self.bytes
  }
}

struct BitReader<'a> {
  bytes: &'a [u8],
  pos: usize,
  acc: u32,
  acc_bits: u32,
}

impl<'a> BitReader<'a> {
  fn new(bytes: &'a [u8]) -> Self {
    Self { bytes, pos: 0, acc: 0, acc_bits: 0 }
  }

  /// Returns `None` once there are no more full codes available.
  fn read_code(&mut self, width: u32) -> Option<u32> {
    while self.acc_bits < width {
      if self.pos >= self.bytes.len() {
        if self.acc_bits == 0 {
          return None;
        }
        break;
      }
      self.acc |= u32::from(self.bytes[self.pos]) << self.acc_bits;
      self.acc_bits += 8;
      self.pos += 1;
    }
    if self.acc_bits < width {
      return None;
    }
    let code = self.acc & ((1 << width) - 1);
    self.acc >>= width;
    self.acc_bits -= width;
    Some(code)
  }
}

/// Compresses a stream of palette indices (each `< 2^min_code_size`) into the
/// GIF LZW bitstream (without sub-block framing).
pub fn compress(indices: &[u8], min_code_size: u8) -> Vec<u8> {
  let clear_code: u32 = 1 << min_code_size;
  let end_code = clear_code + 1;
  let mut writer = BitWriter::new();

  let mut code_size = u32::from(min_code_size) + 1;
  let mut next_code = end_code + 1;
  let mut table: std::collections::HashMap<(u32, u8), u32> = std::collections::HashMap::new();

  let reset = |table: &mut std::collections::HashMap<(u32, u8), u32>, code_size: &mut u32, next_code: &mut u32| {
    table.clear();
    *code_size = u32::from(min_code_size) + 1;
    *next_code = end_code + 1;
  };

  writer.push_code(clear_code, code_size);

  if indices.is_empty() {
    writer.push_code(end_code, code_size);
    return writer.finish();
  }

  let mut current: u32 = u32::from(indices[0]);
  for &byte in &indices[1..] {
    let k = byte;
    if let Some(&code) = table.get(&(current, k)) {
      current = code;
      continue;
    }
    writer.push_code(current, code_size);
    table.insert((current, k), next_code);
    next_code += 1;
    if next_code == (1 << code_size) && code_size < 12 {
      code_size += 1;
    }
    if next_code >= 4096 {
      writer.push_code(clear_code, code_size);
      reset(&mut table, &mut code_size, &mut next_code);
    }
    current = u32::from(k);
  }
  writer.push_code(current, code_size);
  writer.push_code(end_code, code_size);
  writer.finish()
}

/// Decompresses a GIF LZW bitstream back to exactly `expected_len` palette
/// indices.
pub fn decompress(bytes: &[u8], min_code_size: u8, expected_len: usize) -> Option<Vec<u8>> {
  let clear_code: u32 = 1 << min_code_size;
  let end_code = clear_code + 1;
  let mut reader = BitReader::new(bytes);

  let mut code_size;
  let mut table: Vec<Vec<u8>>;
  let mut next_code;

  let mut reset = |code_size: &mut u32, table: &mut Vec<Vec<u8>>, next_code: &mut u32| {
    *code_size = u32::from(min_code_size) + 1;
    *table = (0..clear_code).map(|i| vec![i as u8]).collect();
    table.push(Vec::new()); // clear code placeholder
    table.push(Vec::new()); // end code placeholder
    *next_code = end_code + 1;
  };

  code_size = u32::from(min_code_size) + 1;
  table = Vec::new();
  next_code = end_code + 1;
  reset(&mut code_size, &mut table, &mut next_code);

  let mut out = Vec::with_capacity(expected_len);
  let mut prev: Option<Vec<u8>> = None;

  loop {
    let code = reader.read_code(code_size)?;
    if code == clear_code {
      reset(&mut code_size, &mut table, &mut next_code);
      prev = None;
      continue;
    }
    if code == end_code {
      break;
    }

    let entry: Vec<u8> = if (code as usize) < table.len() && !table[code as usize].is_empty() {
      table[code as usize].clone()
    } else if code as usize == table.len() {
      let mut e = prev.clone().unwrap_or_default();
      let first = e.first().copied().unwrap_or(0);
      e.push(first);
      e
    } else {
      return None;
    };

    out.extend_from_slice(&entry);

    if let Some(p) = prev {
      if next_code < 4096 {
        let mut new_entry = p;
        new_entry.push(entry[0]);
        if (next_code as usize) < table.len() {
          table[next_code as usize] = new_entry;
        } else {
          table.push(new_entry);
        }
        next_code += 1;
        if next_code == (1 << code_size) && code_size < 12 {
          code_size += 1;
        }
      }
    }
    prev = Some(entry);

    if out.len() >= expected_len {
      break;
    }
  }

  out.truncate(expected_len);
  if out.len() == expected_len {
    Some(out)
  } else {
    None
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn roundtrips_arbitrary_index_stream() {
    let min_code_size = 3u8; // palette of up to 8 colors
    let indices: Vec<u8> = (0..200).map(|i| (i % 8) as u8).collect();
    let compressed = compress(&indices, min_code_size);
    let back = decompress(&compressed, min_code_size, indices.len()).unwrap();
    assert_eq!(back, indices);
  }

  #[test]
  fn roundtrips_single_color() {
    let indices = vec![0u8; 50];
    let compressed = compress(&indices, 2);
    let back = decompress(&compressed, 2, indices.len()).unwrap();
    assert_eq!(back, indices);
  }

  #[test]
  fn roundtrips_past_table_overflow() {
    // Enough distinct short runs to push the code table past 4096 entries
    // and exercise the explicit clear-code reset.
    let min_code_size = 8u8;
    let mut indices = Vec::new();
    for i in 0..20000u32 {
      indices.push((i % 256) as u8);
    }
    let compressed = compress(&indices, min_code_size);
    let back = decompress(&compressed, min_code_size, indices.len()).unwrap();
    assert_eq!(back, indices);
  }
}
