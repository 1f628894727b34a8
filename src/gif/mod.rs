//! Single-frame GIF89a encode/decode with a global color table and LZW
//! compression (spec.md §4.4). GCE/animation extensions are skipped on read,
//! never emitted on write — the GIF Non-goal from spec.md §1.

mod lzw;

use crate::pixel::PixelRGB;
use crate::surface::RasterSurface;

pub type GifRaster = RasterSurface<PixelRGB>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum GifError {
  Truncated,
  BadMagic,
  TooManyColors(usize),
  NoImageDescriptor,
  LzwDecodeFailed,
  Dimensions(crate::surface::SurfaceError),
}

impl core::fmt::Display for GifError {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    match self {
      Self::Truncated => write!(f, "GIF data is truncated"),
      Self::BadMagic => write!(f, "missing GIF87a/GIF89a signature"),
      Self::TooManyColors(n) => write!(f, "image has {n} distinct colors, more than the 256 a GIF palette allows"),
      Self::NoImageDescriptor => write!(f, "no image descriptor (0x2C) found before the trailer"),
      Self::LzwDecodeFailed => write!(f, "LZW stream did not decode to the expected pixel count"),
      Self::Dimensions(e) => write!(f, "{e}"),
    }
  }
}
impl std::error::Error for GifError {}

impl From<crate::surface::SurfaceError> for GifError {
  fn from(e: crate::surface::SurfaceError) -> Self {
    Self::Dimensions(e)
  }
}

const INTERLACE_STARTS: [u32; 4] = [0, 4, 2, 1];
const INTERLACE_STRIDES: [u32; 4] = [8, 8, 4, 2];

fn palette_bits(palette_len: usize) -> u8 {
  let mut bits = 1u8;
  while (1usize << bits) < palette_len {
    bits += 1;
  }
  bits
}

/// Builds an ordered, deduplicated palette in first-seen scan order. Fails
/// if the image uses more than 256 distinct colors.
fn build_palette(image: &GifRaster) -> Result<(Vec<PixelRGB>, Vec<u8>), GifError> {
  let mut palette = Vec::new();
  let mut lookup = std::collections::HashMap::new();
  let mut indices = Vec::with_capacity(image.pixels().len());
  for &px in image.pixels() {
    let idx = *lookup.entry(px).or_insert_with(|| {
      palette.push(px);
      palette.len() - 1
    });
    if palette.len() > 256 {
      return Err(GifError::TooManyColors(palette.len()));
    }
    indices.push(idx as u8);
  }
  Ok((palette, indices))
}

fn write_sub_blocks(out: &mut Vec<u8>, data: &[u8]) {
  for chunk in data.chunks(255) {
    out.push(chunk.len() as u8);
    out.extend_from_slice(chunk);
  }
  out.push(0); // terminator
}

/// Encodes a raster as a single-frame GIF89a with a global color table.
pub fn encode(image: &GifRaster) -> Result<Vec<u8>, GifError> {
  let (palette, indices) = build_palette(image)?;
  let width = image.width();
  let height = image.height();

  let bits = palette_bits(palette.len().max(2));
  let table_size = 1usize << (bits + 1);

  let mut out = Vec::new();
  out.extend_from_slice(b"GIF89a");

  // Logical screen descriptor.
  out.extend_from_slice(&(width as u16).to_le_bytes());
  out.extend_from_slice(&(height as u16).to_le_bytes());
  let packed = 0b1000_0000 | ((7u8) << 4) | bits; // GCT present, color res=7, sort=0, size=bits
  out.push(packed);
  out.push(0); // background color index
  out.push(0); // pixel aspect ratio

  for i in 0..table_size {
    if let Some(c) = palette.get(i) {
      out.extend_from_slice(&[c.r, c.g, c.b]);
    } else {
      out.extend_from_slice(&[0, 0, 0]);
    }
  }

  // Image descriptor.
  out.push(0x2C);
  out.extend_from_slice(&0u16.to_le_bytes()); // left
  out.extend_from_slice(&0u16.to_le_bytes()); // top
  out.extend_from_slice(&(width as u16).to_le_bytes());
  out.extend_from_slice(&(height as u16).to_le_bytes());
  out.push(0); // packed: no local color table, no interlace

  let min_code_size = bits.max(2);
  out.push(min_code_size);
  let compressed = lzw::compress(&indices, min_code_size);
  write_sub_blocks(&mut out, &compressed);

  out.push(0x3B); // trailer

  #[cfg(feature = "log-diagnostics")]
  log::trace!("encoded {width}x{height} GIF ({} palette entries)", palette.len());

  Ok(out)
}

fn read_sub_blocks(bytes: &[u8], pos: &mut usize) -> Result<Vec<u8>, GifError> {
  let mut out = Vec::new();
  loop {
    if *pos >= bytes.len() {
      return Err(GifError::Truncated);
    }
    let len = bytes[*pos] as usize;
    *pos += 1;
    if len == 0 {
      break;
    }
    if *pos + len > bytes.len() {
      return Err(GifError::Truncated);
    }
    out.extend_from_slice(&bytes[*pos..*pos + len]);
    *pos += len;
  }
  Ok(out)
}

fn skip_sub_blocks(bytes: &[u8], pos: &mut usize) -> Result<(), GifError> {
  loop {
    if *pos >= bytes.len() {
      return Err(GifError::Truncated);
    }
    let len = bytes[*pos] as usize;
    *pos += 1;
    if len == 0 {
      break;
    }
    if *pos + len > bytes.len() {
      return Err(GifError::Truncated);
    }
    *pos += len;
  }
  Ok(())
}

/// Decodes the first image frame of a GIF87a/GIF89a stream.
pub fn decode(bytes: &[u8]) -> Result<GifRaster, GifError> {
  if bytes.len() < 13 {
    return Err(GifError::Truncated);
  }
  if &bytes[0..6] != b"GIF87a" && &bytes[0..6] != b"GIF89a" {
    return Err(GifError::BadMagic);
  }

  let screen_width = u16::from_le_bytes(bytes[6..8].try_into().unwrap());
  let screen_height = u16::from_le_bytes(bytes[8..10].try_into().unwrap());
  let lsd_packed = bytes[10];
  let has_gct = lsd_packed & 0x80 != 0;
  let gct_size = 1usize << ((lsd_packed & 0x07) + 1);

  let mut pos = 13usize;
  let mut global_table = Vec::new();
  if has_gct {
    if bytes.len() < pos + gct_size * 3 {
      return Err(GifError::Truncated);
    }
    for i in 0..gct_size {
      let o = pos + i * 3;
      global_table.push(PixelRGB::new(bytes[o], bytes[o + 1], bytes[o + 2]));
    }
    pos += gct_size * 3;
  }

  loop {
    if pos >= bytes.len() {
      return Err(GifError::NoImageDescriptor);
    }
    match bytes[pos] {
      0x21 => {
        // Extension block: introducer, label, then sub-blocks.
        pos += 2;
        skip_sub_blocks(bytes, &mut pos)?;
      }
      0x2C => {
        pos += 1;
        break;
      }
      0x3B => return Err(GifError::NoImageDescriptor),
      _ => return Err(GifError::Truncated),
    }
  }

  if bytes.len() < pos + 9 {
    return Err(GifError::Truncated);
  }
  let _left = u16::from_le_bytes(bytes[pos..pos + 2].try_into().unwrap());
  let _top = u16::from_le_bytes(bytes[pos + 2..pos + 4].try_into().unwrap());
  let image_w = u16::from_le_bytes(bytes[pos + 4..pos + 6].try_into().unwrap());
  let image_h = u16::from_le_bytes(bytes[pos + 6..pos + 8].try_into().unwrap());
  let image_packed = bytes[pos + 8];
  pos += 9;

  let has_lct = image_packed & 0x80 != 0;
  let interlaced = image_packed & 0x40 != 0;
  let lct_size = 1usize << ((image_packed & 0x07) + 1);

  let palette = if has_lct {
    if bytes.len() < pos + lct_size * 3 {
      return Err(GifError::Truncated);
    }
    let mut table = Vec::new();
    for i in 0..lct_size {
      let o = pos + i * 3;
      table.push(PixelRGB::new(bytes[o], bytes[o + 1], bytes[o + 2]));
    }
    pos += lct_size * 3;
    table
  } else {
    global_table
  };

  if pos >= bytes.len() {
    return Err(GifError::Truncated);
  }
  let min_code_size = bytes[pos];
  pos += 1;
  let compressed = read_sub_blocks(bytes, &mut pos)?;

  let width = if screen_width > 0 { screen_width } else { image_w } as u32;
  let height = if screen_height > 0 { screen_height } else { image_h } as u32;
  let pixel_count = image_w as usize * image_h as usize;
  let indices =
    lzw::decompress(&compressed, min_code_size, pixel_count).ok_or(GifError::LzwDecodeFailed)?;

  let mut pixels = vec![PixelRGB::default(); width as usize * height as usize];
  let mut src = 0usize;
  if interlaced {
    for pass in 0..4 {
      let mut y = INTERLACE_STARTS[pass];
      while y < image_h as u32 {
        for x in 0..image_w as u32 {
          let idx = indices[src];
          src += 1;
          pixels[(y * width + x) as usize] = palette.get(idx as usize).copied().unwrap_or_default();
        }
        y += INTERLACE_STRIDES[pass];
      }
    }
  } else {
    for y in 0..image_h as u32 {
      for x in 0..image_w as u32 {
        let idx = indices[src];
        src += 1;
        pixels[(y * width + x) as usize] = palette.get(idx as usize).copied().unwrap_or_default();
      }
    }
  }

  GifRaster::from_pixels(width, height, pixels).map_err(GifError::from)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn sample(n_colors: usize) -> GifRaster {
    let mut s = GifRaster::new(4, 4).unwrap();
    for y in 0..4i64 {
      for x in 0..4i64 {
        let c = ((y * 4 + x) as usize) % n_colors;
        s.set_pixel(x, y, PixelRGB::new((c * 10) as u8, (c * 20) as u8, (c * 30) as u8));
      }
    }
    s
  }

  #[test]
  fn roundtrip_is_pixel_exact() {
    let img = sample(5);
    let bytes = encode(&img).unwrap();
    assert_eq!(&bytes[0..6], b"GIF89a");
    assert_eq!(*bytes.last().unwrap(), 0x3B);
    let back = decode(&bytes).unwrap();
    assert_eq!(back, img);
  }

  #[test]
  fn rejects_too_many_colors() {
    let mut img = GifRaster::new(20, 20).unwrap();
    let mut c = 0u8;
    for y in 0..20i64 {
      for x in 0..20i64 {
        c = c.wrapping_add(1);
        img.set_pixel(x, y, PixelRGB::new(c, c.wrapping_mul(3), c.wrapping_mul(7)));
      }
    }
    // Force > 256 unique colors via a per-pixel nonlinear mix.
    for y in 0..20i64 {
      for x in 0..20i64 {
        let v = (y * 20 + x) as u8;
        img.set_pixel(x, y, PixelRGB::new(v, v.wrapping_mul(2), v.wrapping_mul(5)));
      }
    }
    assert!(matches!(encode(&img), Err(GifError::TooManyColors(_))));
  }

  #[test]
  fn rejects_bad_magic() {
    let bytes = b"GIF88a\0\0\0\0\0\0\0".to_vec();
    assert_eq!(decode(&bytes), Err(GifError::BadMagic));
  }
}
