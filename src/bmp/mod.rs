//! 24-bit uncompressed BMP encode/decode.
//!
//! Grounded on the teacher's header-parsing shape
//! (`examples/Lokathor-imagine/src/bmp/mod.rs`, `BmpHeader`/`for_each_pal_index`)
//! but narrowed to spec.md §4.2's scope: 24bpp, `BI_RGB`, single palette-free
//! image, bottom-up by default with top-down accepted on read via a negative
//! height.

use crate::pixel::PixelRGB;
use crate::surface::RasterSurface;

pub type BmpRaster = RasterSurface<PixelRGB>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum BmpError {
  Truncated,
  BadMagic,
  UnsupportedHeaderSize(u32),
  UnsupportedBitsPerPixel(u16),
  UnsupportedCompression(u32),
  NonPositiveWidth(i32),
  ZeroHeight,
  Dimensions(crate::surface::SurfaceError),
}

impl core::fmt::Display for BmpError {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    match self {
      Self::Truncated => write!(f, "BMP data is truncated"),
      Self::BadMagic => write!(f, "missing 'BM' signature"),
      Self::UnsupportedHeaderSize(n) => write!(f, "unsupported DIB header size: {n}"),
      Self::UnsupportedBitsPerPixel(n) => write!(f, "unsupported bit depth: {n} (only 24bpp is supported)"),
      Self::UnsupportedCompression(n) => write!(f, "unsupported compression method: {n} (only BI_RGB is supported)"),
      Self::NonPositiveWidth(w) => write!(f, "width must be positive, got {w}"),
      Self::ZeroHeight => write!(f, "height must not be zero"),
      Self::Dimensions(e) => write!(f, "{e}"),
    }
  }
}
impl std::error::Error for BmpError {}

impl From<crate::surface::SurfaceError> for BmpError {
  fn from(e: crate::surface::SurfaceError) -> Self {
    Self::Dimensions(e)
  }
}

const FILE_HEADER_LEN: u32 = 14;
const DIB_HEADER_LEN: u32 = 40;
const BI_RGB: u32 = 0;

fn row_stride(width: u32) -> usize {
  ((width as usize * 3) + 3) & !3
}

/// Encodes a 24bpp raster to bottom-up BMP bytes.
pub fn encode(image: &BmpRaster) -> Vec<u8> {
  let width = image.width();
  let height = image.height();
  let stride = row_stride(width);
  let image_size = stride * height as usize;
  let file_size = FILE_HEADER_LEN as usize + DIB_HEADER_LEN as usize + image_size;

  let mut out = Vec::with_capacity(file_size);
  // File header.
  out.extend_from_slice(b"BM");
  out.extend_from_slice(&(file_size as u32).to_le_bytes());
  out.extend_from_slice(&0u16.to_le_bytes()); // reserved1
  out.extend_from_slice(&0u16.to_le_bytes()); // reserved2
  out.extend_from_slice(&(FILE_HEADER_LEN + DIB_HEADER_LEN).to_le_bytes()); // offset = 54

  // DIB header (BITMAPINFOHEADER).
  out.extend_from_slice(&DIB_HEADER_LEN.to_le_bytes());
  out.extend_from_slice(&(width as i32).to_le_bytes());
  out.extend_from_slice(&(height as i32).to_le_bytes());
  out.extend_from_slice(&1u16.to_le_bytes()); // planes
  out.extend_from_slice(&24u16.to_le_bytes()); // bitCount
  out.extend_from_slice(&BI_RGB.to_le_bytes());
  out.extend_from_slice(&(image_size as u32).to_le_bytes());
  out.extend_from_slice(&0i32.to_le_bytes()); // ppm x
  out.extend_from_slice(&0i32.to_le_bytes()); // ppm y
  out.extend_from_slice(&0u32.to_le_bytes()); // colors used
  out.extend_from_slice(&0u32.to_le_bytes()); // colors important

  let pad = stride - width as usize * 3;
  for row in image.rows().rev() {
    for px in row {
      out.push(px.b);
      out.push(px.g);
      out.push(px.r);
    }
    out.extend(std::iter::repeat(0u8).take(pad));
  }

  out
}

/// Decodes 24bpp `BI_RGB` BMP bytes. Accepts both bottom-up (positive
/// height) and top-down (negative height) images.
pub fn decode(bytes: &[u8]) -> Result<BmpRaster, BmpError> {
  if bytes.len() < (FILE_HEADER_LEN + DIB_HEADER_LEN) as usize {
    return Err(BmpError::Truncated);
  }
  if &bytes[0..2] != b"BM" {
    return Err(BmpError::BadMagic);
  }
  let offset_data = u32::from_le_bytes(bytes[10..14].try_into().unwrap());

  let header_size = u32::from_le_bytes(bytes[14..18].try_into().unwrap());
  if header_size != DIB_HEADER_LEN {
    return Err(BmpError::UnsupportedHeaderSize(header_size));
  }
  let raw_width = i32::from_le_bytes(bytes[18..22].try_into().unwrap());
  let raw_height = i32::from_le_bytes(bytes[22..26].try_into().unwrap());
  let bit_count = u16::from_le_bytes(bytes[28..30].try_into().unwrap());
  let compression = u32::from_le_bytes(bytes[30..34].try_into().unwrap());

  if raw_width <= 0 {
    return Err(BmpError::NonPositiveWidth(raw_width));
  }
  if raw_height == 0 {
    return Err(BmpError::ZeroHeight);
  }
  if bit_count != 24 {
    return Err(BmpError::UnsupportedBitsPerPixel(bit_count));
  }
  if compression != BI_RGB {
    return Err(BmpError::UnsupportedCompression(compression));
  }

  let width = raw_width as u32;
  let origin_top_left = raw_height < 0;
  let height = raw_height.unsigned_abs();

  let stride = row_stride(width);
  let data_start = offset_data as usize;
  let needed = stride * height as usize;
  if bytes.len() < data_start + needed {
    return Err(BmpError::Truncated);
  }
  let data = &bytes[data_start..data_start + needed];

  let mut pixels = vec![PixelRGB::default(); (width as usize) * (height as usize)];
  for disk_row in 0..height {
    let dst_row = if origin_top_left { disk_row } else { height - 1 - disk_row };
    let row_bytes = &data[disk_row as usize * stride..][..width as usize * 3];
    let dst_start = dst_row as usize * width as usize;
    for (x, chunk) in row_bytes.chunks_exact(3).enumerate() {
      pixels[dst_start + x] = PixelRGB::new(chunk[2], chunk[1], chunk[0]);
    }
  }

  #[cfg(feature = "log-diagnostics")]
  log::trace!("decoded {width}x{height} BMP (top_left={origin_top_left})");

  BmpRaster::from_pixels(width, height, pixels).map_err(BmpError::from)
}
