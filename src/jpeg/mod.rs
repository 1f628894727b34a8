//! Baseline sequential JPEG, 3-component Y'CbCr with 4:2:0 chroma
//! subsampling (spec.md §4.5). Single scan, Huffman entropy coding, the
//! standard Annex K tables — no progressive, no arithmetic coding, no
//! quality selection (spec.md §1's Non-goal). Grounded on spec.md §4.5 and
//! §9's exact marker layout; the DCT/Huffman machinery lives in
//! [`dct`]/[`huffman`]/[`tables`] since no crate in the retrieval pack
//! implements a JPEG codec to imitate directly.

mod dct;
mod huffman;
mod tables;

use crate::pixel::PixelRGB;
use crate::surface::RasterSurface;
use huffman::{BitReader, BitWriter, DecodeTable, EncodeTable};
use tables::{HuffSpec, ZIGZAG};

pub type JpegRaster = RasterSurface<PixelRGB>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum JpegError {
  Truncated,
  BadMagic,
  MissingSof0,
  MissingQuantizationTable(u8),
  MissingHuffmanTable { class: u8, id: u8 },
  UnsupportedPrecision(u8),
  UnsupportedComponentCount(u8),
  InvalidHuffmanCode,
  TruncatedScanData,
  Dimensions(crate::surface::SurfaceError),
}

impl core::fmt::Display for JpegError {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    match self {
      Self::Truncated => write!(f, "JPEG data is truncated"),
      Self::BadMagic => write!(f, "missing SOI marker"),
      Self::MissingSof0 => write!(f, "no SOF0 (baseline) frame header found"),
      Self::MissingQuantizationTable(id) => write!(f, "SOS referenced quantization table {id} which was never defined"),
      Self::MissingHuffmanTable { class, id } => {
        write!(f, "SOS referenced Huffman table (class {class}, id {id}) which was never defined")
      }
      Self::UnsupportedPrecision(p) => write!(f, "unsupported sample precision {p}, only 8 is supported"),
      Self::UnsupportedComponentCount(n) => write!(f, "unsupported component count {n}, only 3 is supported"),
      Self::InvalidHuffmanCode => write!(f, "entropy-coded segment contained an undecodable Huffman code"),
      Self::TruncatedScanData => write!(f, "entropy-coded segment ended before all MCUs were decoded"),
      Self::Dimensions(e) => write!(f, "{e}"),
    }
  }
}
impl std::error::Error for JpegError {}

impl From<crate::surface::SurfaceError> for JpegError {
  fn from(e: crate::surface::SurfaceError) -> Self {
    Self::Dimensions(e)
  }
}

const MARKER_SOI: u16 = 0xFFD8;
const MARKER_APP0: u16 = 0xFFE0;
const MARKER_DQT: u16 = 0xFFDB;
const MARKER_SOF0: u16 = 0xFFC0;
const MARKER_DHT: u16 = 0xFFC4;
const MARKER_SOS: u16 = 0xFFDA;
const MARKER_EOI: u16 = 0xFFD9;

struct Component {
  id: u8,
  h_sampling: u8,
  v_sampling: u8,
  quant_table: u8,
}

fn rgb_to_ycbcr(r: f64, g: f64, b: f64) -> (f64, f64, f64) {
  let y = 0.299 * r + 0.587 * g + 0.114 * b;
  let cb = -0.168736 * r - 0.331264 * g + 0.5 * b + 128.0;
  let cr = 0.5 * r - 0.418688 * g - 0.081312 * b + 128.0;
  (y, cb, cr)
}

fn ycbcr_to_rgb(y: f64, cb: f64, cr: f64) -> (u8, u8, u8) {
  let r = y + 1.402 * (cr - 128.0);
  let g = y - 0.344136 * (cb - 128.0) - 0.714136 * (cr - 128.0);
  let b = y + 1.772 * (cb - 128.0);
  (clamp_u8(r), clamp_u8(g), clamp_u8(b))
}

fn clamp_u8(v: f64) -> u8 {
  v.round().clamp(0.0, 255.0) as u8
}

fn sample_rgb_clamped(image: &JpegRaster, x: i64, y: i64) -> (f64, f64, f64) {
  let p = image.sample_clamped(x, y);
  (f64::from(p.r), f64::from(p.g), f64::from(p.b))
}

fn zigzag_forward(natural: &[i32; 64]) -> [i32; 64] {
  let mut out = [0i32; 64];
  for (k, slot) in out.iter_mut().enumerate() {
    *slot = natural[ZIGZAG[k]];
  }
  out
}

fn zigzag_inverse(zz: &[i32; 64]) -> [i32; 64] {
  let mut out = [0i32; 64];
  for (k, &v) in zz.iter().enumerate() {
    out[ZIGZAG[k]] = v;
  }
  out
}

fn quantize(coeffs: &[f64; 64], table: &[u16; 64]) -> [i32; 64] {
  let mut out = [0i32; 64];
  for i in 0..64 {
    out[i] = (coeffs[i] / f64::from(table[i])).round() as i32;
  }
  out
}

fn dequantize(coeffs: &[i32; 64], table: &[u16; 64]) -> [f64; 64] {
  let mut out = [0.0f64; 64];
  for i in 0..64 {
    out[i] = f64::from(coeffs[i]) * f64::from(table[i]);
  }
  out
}

fn encode_block(
  writer: &mut BitWriter,
  zz: &[i32; 64],
  dc_predictor: &mut i32,
  dc_table: &EncodeTable,
  ac_table: &EncodeTable,
) {
  let diff = zz[0] - *dc_predictor;
  *dc_predictor = zz[0];
  let size = huffman::magnitude_category(diff);
  let (code_size, code) = dc_table.code_for(size);
  writer.write_bits(code, code_size);
  writer.write_bits(huffman::encode_magnitude_bits(diff, size), size);

  let mut run = 0u8;
  for k in 1..64 {
    let v = zz[k];
    if v == 0 {
      run += 1;
      continue;
    }
    while run >= 16 {
      let (cs, c) = ac_table.code_for(0xF0);
      writer.write_bits(c, cs);
      run -= 16;
    }
    let size = huffman::magnitude_category(v);
    let symbol = (run << 4) | size;
    let (cs, c) = ac_table.code_for(symbol);
    writer.write_bits(c, cs);
    writer.write_bits(huffman::encode_magnitude_bits(v, size), size);
    run = 0;
  }
  if run > 0 {
    let (cs, c) = ac_table.code_for(0x00); // EOB
    writer.write_bits(c, cs);
  }
}

fn decode_block(
  reader: &mut BitReader,
  dc_predictor: &mut i32,
  dc_table: &DecodeTable,
  ac_table: &DecodeTable,
) -> Result<[i32; 64], JpegError> {
  let mut zz = [0i32; 64];

  let size = reader.decode_symbol(dc_table).ok_or(JpegError::TruncatedScanData)?;
  let bits = if size > 0 { reader.read_bits(size).ok_or(JpegError::TruncatedScanData)? } else { 0 };
  let diff = huffman::decode_magnitude_bits(bits, size);
  *dc_predictor += diff;
  zz[0] = *dc_predictor;

  let mut k = 1usize;
  while k < 64 {
    let symbol = reader.decode_symbol(ac_table).ok_or(JpegError::InvalidHuffmanCode)?;
    if symbol == 0x00 {
      break; // EOB
    }
    if symbol == 0xF0 {
      k += 16;
      continue;
    }
    let run = symbol >> 4;
    let size = symbol & 0x0F;
    k += run as usize;
    if k >= 64 {
      break;
    }
    let bits = reader.read_bits(size).ok_or(JpegError::TruncatedScanData)?;
    zz[k] = huffman::decode_magnitude_bits(bits, size);
    k += 1;
  }

  Ok(zz)
}

fn write_marker(out: &mut Vec<u8>, marker: u16) {
  out.extend_from_slice(&marker.to_be_bytes());
}

fn write_segment(out: &mut Vec<u8>, marker: u16, body: &[u8]) {
  write_marker(out, marker);
  out.extend_from_slice(&((body.len() + 2) as u16).to_be_bytes());
  out.extend_from_slice(body);
}

fn huffman_segment_body(class: u8, id: u8, spec: &HuffSpec) -> Vec<u8> {
  let mut body = vec![(class << 4) | id];
  body.extend_from_slice(&spec.counts);
  body.extend_from_slice(spec.symbols);
  body
}

/// Encodes a raster as a baseline sequential 4:2:0 JPEG.
pub fn encode(image: &JpegRaster) -> Vec<u8> {
  let width = image.width();
  let height = image.height();

  let mut out = Vec::new();
  write_marker(&mut out, MARKER_SOI);

  // APP0 JFIF.
  let mut app0 = Vec::new();
  app0.extend_from_slice(b"JFIF\0");
  app0.extend_from_slice(&[1, 1]); // version 1.1
  app0.push(0); // units: none
  app0.extend_from_slice(&1u16.to_be_bytes());
  app0.extend_from_slice(&1u16.to_be_bytes());
  app0.extend_from_slice(&[0, 0]); // no thumbnail
  write_segment(&mut out, MARKER_APP0, &app0);

  // DQT: luma (id 0), chroma (id 1), both stored in zig-zag order.
  let mut dqt = Vec::new();
  dqt.push(0x00);
  for k in 0..64 {
    dqt.push(tables::LUMA_QUANT[ZIGZAG[k]] as u8);
  }
  dqt.push(0x01);
  for k in 0..64 {
    dqt.push(tables::CHROMA_QUANT[ZIGZAG[k]] as u8);
  }
  write_segment(&mut out, MARKER_DQT, &dqt);

  // SOF0.
  let mut sof0 = Vec::new();
  sof0.push(8); // precision
  sof0.extend_from_slice(&(height as u16).to_be_bytes());
  sof0.extend_from_slice(&(width as u16).to_be_bytes());
  sof0.push(3);
  sof0.extend_from_slice(&[1, 0x22, 0]); // Y: id=1, H=2 V=2, quant table 0
  sof0.extend_from_slice(&[2, 0x11, 1]); // Cb: id=2, H=1 V=1, quant table 1
  sof0.extend_from_slice(&[3, 0x11, 1]); // Cr: id=3, H=1 V=1, quant table 1
  write_segment(&mut out, MARKER_SOF0, &sof0);

  // DHT: DC luma, AC luma, DC chroma, AC chroma.
  write_segment(&mut out, MARKER_DHT, &huffman_segment_body(0, 0, &tables::DC_LUMA));
  write_segment(&mut out, MARKER_DHT, &huffman_segment_body(1, 0, &tables::AC_LUMA));
  write_segment(&mut out, MARKER_DHT, &huffman_segment_body(0, 1, &tables::DC_CHROMA));
  write_segment(&mut out, MARKER_DHT, &huffman_segment_body(1, 1, &tables::AC_CHROMA));

  // SOS.
  let sos = [3, 1, 0x00, 2, 0x11, 3, 0x11, 0, 63, 0];
  write_segment(&mut out, MARKER_SOS, &sos);

  let dc_luma_enc = EncodeTable::build(&tables::DC_LUMA);
  let ac_luma_enc = EncodeTable::build(&tables::AC_LUMA);
  let dc_chroma_enc = EncodeTable::build(&tables::DC_CHROMA);
  let ac_chroma_enc = EncodeTable::build(&tables::AC_CHROMA);

  let mcu_cols = width.div_ceil(16);
  let mcu_rows = height.div_ceil(16);

  let mut writer = BitWriter::new();
  let mut dc_y = 0i32;
  let mut dc_cb = 0i32;
  let mut dc_cr = 0i32;

  for my in 0..mcu_rows {
    for mx in 0..mcu_cols {
      let base_x = (mx * 16) as i64;
      let base_y = (my * 16) as i64;

      let mut y_plane = [0.0f64; 256];
      let mut cb_sum = [0.0f64; 64];
      let mut cr_sum = [0.0f64; 64];
      for dy in 0..16i64 {
        for dx in 0..16i64 {
          let (r, g, b) = sample_rgb_clamped(image, base_x + dx, base_y + dy);
          let (y, cb, cr) = rgb_to_ycbcr(r, g, b);
          y_plane[(dy * 16 + dx) as usize] = y;
          let ci = ((dy / 2) * 8 + (dx / 2)) as usize;
          cb_sum[ci] += cb;
          cr_sum[ci] += cr;
        }
      }
      let mut cb_block = [0.0f64; 64];
      let mut cr_block = [0.0f64; 64];
      for i in 0..64 {
        cb_block[i] = cb_sum[i] / 4.0;
        cr_block[i] = cr_sum[i] / 4.0;
      }

      for by in 0..2usize {
        for bx in 0..2usize {
          let mut block = [0.0f64; 64];
          for row in 0..8usize {
            for col in 0..8usize {
              let src = (by * 8 + row) * 16 + (bx * 8 + col);
              block[row * 8 + col] = y_plane[src] - 128.0;
            }
          }
          let coeffs = dct::forward_dct_8x8(&block);
          let quant = quantize(&coeffs, &tables::LUMA_QUANT);
          let zz = zigzag_forward(&quant);
          encode_block(&mut writer, &zz, &mut dc_y, &dc_luma_enc, &ac_luma_enc);
        }
      }

      let mut cb_shifted = [0.0f64; 64];
      let mut cr_shifted = [0.0f64; 64];
      for i in 0..64 {
        cb_shifted[i] = cb_block[i] - 128.0;
        cr_shifted[i] = cr_block[i] - 128.0;
      }
      let cb_coeffs = dct::forward_dct_8x8(&cb_shifted);
      let cb_quant = zigzag_forward(&quantize(&cb_coeffs, &tables::CHROMA_QUANT));
      encode_block(&mut writer, &cb_quant, &mut dc_cb, &dc_chroma_enc, &ac_chroma_enc);

      let cr_coeffs = dct::forward_dct_8x8(&cr_shifted);
      let cr_quant = zigzag_forward(&quantize(&cr_coeffs, &tables::CHROMA_QUANT));
      encode_block(&mut writer, &cr_quant, &mut dc_cr, &dc_chroma_enc, &ac_chroma_enc);
    }
  }

  out.extend_from_slice(&writer.finish());
  write_marker(&mut out, MARKER_EOI);

  #[cfg(feature = "log-diagnostics")]
  log::trace!("encoded {width}x{height} JPEG across {} MCUs", mcu_cols * mcu_rows);

  out
}

struct DqtSet {
  tables: std::collections::HashMap<u8, [u16; 64]>,
}

struct DhtSet {
  dc: std::collections::HashMap<u8, DecodeTable>,
  ac: std::collections::HashMap<u8, DecodeTable>,
}

/// Decodes a baseline sequential JPEG (4:2:0 or any sampling where `Hmax %
/// H_c == 0` and `Vmax % V_c == 0`, per spec.md §4.5) back to RGB.
pub fn decode(bytes: &[u8]) -> Result<JpegRaster, JpegError> {
  if bytes.len() < 4 || u16::from_be_bytes([bytes[0], bytes[1]]) != MARKER_SOI {
    return Err(JpegError::BadMagic);
  }

  let mut pos = 2usize;
  let mut dqt = DqtSet { tables: std::collections::HashMap::new() };
  let mut dht = DhtSet { dc: std::collections::HashMap::new(), ac: std::collections::HashMap::new() };
  let mut width = 0u32;
  let mut height = 0u32;
  let mut components: Vec<Component> = Vec::new();
  let mut scan_components: Vec<(u8, u8, u8)> = Vec::new(); // (id, dc_table, ac_table)

  loop {
    if pos + 2 > bytes.len() {
      return Err(JpegError::Truncated);
    }
    let marker = u16::from_be_bytes([bytes[pos], bytes[pos + 1]]);
    pos += 2;

    if marker == MARKER_EOI {
      break;
    }

    if pos + 2 > bytes.len() {
      return Err(JpegError::Truncated);
    }
    let seg_len = u16::from_be_bytes([bytes[pos], bytes[pos + 1]]) as usize;
    if seg_len < 2 || pos + seg_len > bytes.len() {
      return Err(JpegError::Truncated);
    }
    let body = &bytes[pos + 2..pos + seg_len];
    pos += seg_len;

    match marker {
      MARKER_DQT => {
        let mut i = 0;
        while i < body.len() {
          let id = body[i] & 0x0F;
          i += 1;
          let mut natural = [0u16; 64];
          for k in 0..64 {
            natural[ZIGZAG[k]] = u16::from(body[i + k]);
          }
          i += 64;
          dqt.tables.insert(id, natural);
        }
      }
      MARKER_SOF0 => {
        let precision = body[0];
        if precision != 8 {
          return Err(JpegError::UnsupportedPrecision(precision));
        }
        height = u16::from_be_bytes([body[1], body[2]]) as u32;
        width = u16::from_be_bytes([body[3], body[4]]) as u32;
        let n = body[5];
        if n != 3 {
          return Err(JpegError::UnsupportedComponentCount(n));
        }
        components.clear();
        for c in 0..n as usize {
          let o = 6 + c * 3;
          components.push(Component {
            id: body[o],
            h_sampling: body[o + 1] >> 4,
            v_sampling: body[o + 1] & 0x0F,
            quant_table: body[o + 2],
          });
        }
      }
      MARKER_DHT => {
        let class = body[0] >> 4;
        let id = body[0] & 0x0F;
        let mut counts = [0u8; 16];
        counts.copy_from_slice(&body[1..17]);
        let symbols = &body[17..];
        let table = DecodeTable::from_parts(&counts, symbols);
        if class == 0 {
          dht.dc.insert(id, table);
        } else {
          dht.ac.insert(id, table);
        }
      }
      MARKER_SOS => {
        let n = body[0] as usize;
        scan_components.clear();
        for c in 0..n {
          let o = 1 + c * 2;
          scan_components.push((body[o], body[o + 1] >> 4, body[o + 1] & 0x0F));
        }
        break;
      }
      _ => {}
    }
  }

  if components.is_empty() {
    return Err(JpegError::MissingSof0);
  }
  if width == 0 || height == 0 {
    return Err(JpegError::MissingSof0);
  }

  for comp in &components {
    if !dqt.tables.contains_key(&comp.quant_table) {
      return Err(JpegError::MissingQuantizationTable(comp.quant_table));
    }
  }
  for &(_, dc_id, ac_id) in &scan_components {
    if !dht.dc.contains_key(&dc_id) {
      return Err(JpegError::MissingHuffmanTable { class: 0, id: dc_id });
    }
    if !dht.ac.contains_key(&ac_id) {
      return Err(JpegError::MissingHuffmanTable { class: 1, id: ac_id });
    }
  }

  let h_max = components.iter().map(|c| c.h_sampling).max().unwrap_or(1);
  let v_max = components.iter().map(|c| c.v_sampling).max().unwrap_or(1);
  let mcu_cols = width.div_ceil(8 * u32::from(h_max));
  let mcu_rows = height.div_ceil(8 * u32::from(v_max));

  let mut planes: Vec<Vec<f64>> = Vec::new();
  let mut plane_dims: Vec<(u32, u32)> = Vec::new();
  for comp in &components {
    let pw = mcu_cols * u32::from(comp.h_sampling) * 8;
    let ph = mcu_rows * u32::from(comp.v_sampling) * 8;
    planes.push(vec![0.0f64; (pw * ph) as usize]);
    plane_dims.push((pw, ph));
  }

  let mut reader = BitReader::new(&bytes[pos..]);
  let mut dc_predictors = vec![0i32; components.len()];

  for my in 0..mcu_rows {
    for mx in 0..mcu_cols {
      for (ci, comp) in components.iter().enumerate() {
        let (_, dc_id, ac_id) = scan_components[ci];
        let dc_table = &dht.dc[&dc_id];
        let ac_table = &dht.ac[&ac_id];
        let quant_table = &dqt.tables[&comp.quant_table];
        let (pw, _) = plane_dims[ci];

        for by in 0..comp.v_sampling as u32 {
          for bx in 0..comp.h_sampling as u32 {
            let zz = decode_block(&mut reader, &mut dc_predictors[ci], dc_table, ac_table)?;
            let natural = zigzag_inverse(&zz);
            let coeffs = dequantize(&natural, quant_table);
            let spatial = dct::inverse_dct_8x8(&coeffs);

            let block_x = (mx * u32::from(comp.h_sampling) + bx) * 8;
            let block_y = (my * u32::from(comp.v_sampling) + by) * 8;
            for row in 0..8u32 {
              for col in 0..8u32 {
                let v = spatial[(row * 8 + col) as usize] + 128.0;
                let px = block_x + col;
                let py = block_y + row;
                planes[ci][(py * pw + px) as usize] = v;
              }
            }
          }
        }
      }
    }
  }

  let mut pixels = vec![PixelRGB::default(); (width * height) as usize];
  for y in 0..height {
    for x in 0..width {
      let mut sample = |ci: usize| -> f64 {
        let comp = &components[ci];
        let (pw, ph) = plane_dims[ci];
        let cx = (x * u32::from(comp.h_sampling) / h_max as u32).min(pw - 1);
        let cy = (y * u32::from(comp.v_sampling) / v_max as u32).min(ph - 1);
        planes[ci][(cy * pw + cx) as usize]
      };
      let (yv, cb, cr) = (sample(0), sample(1), sample(2));
      let (r, g, b) = ycbcr_to_rgb(yv, cb, cr);
      pixels[(y * width + x) as usize] = PixelRGB::new(r, g, b);
    }
  }

  JpegRaster::from_pixels(width, height, pixels).map_err(JpegError::from)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn gradient_image(w: u32, h: u32) -> JpegRaster {
    let mut img = JpegRaster::new(w, h).unwrap();
    for y in 0..h as i64 {
      for x in 0..w as i64 {
        img.set_pixel(
          x,
          y,
          PixelRGB::new((x * 8) as u8, (y * 8) as u8, ((x + y) * 4) as u8),
        );
      }
    }
    img
  }

  fn mean_abs_channel_error(a: &JpegRaster, b: &JpegRaster) -> f64 {
    let mut total = 0i64;
    let mut count = 0i64;
    for (pa, pb) in a.pixels().iter().zip(b.pixels()) {
      total += i64::from(pa.r.abs_diff(pb.r));
      total += i64::from(pa.g.abs_diff(pb.g));
      total += i64::from(pa.b.abs_diff(pb.b));
      count += 3;
    }
    total as f64 / count as f64
  }

  #[test]
  fn markers_are_well_formed() {
    let img = gradient_image(32, 16);
    let bytes = encode(&img);
    assert_eq!(&bytes[0..2], &MARKER_SOI.to_be_bytes());
    assert_eq!(&bytes[bytes.len() - 2..], &MARKER_EOI.to_be_bytes());
    assert_eq!(&bytes[4..8], b"JFIF");
  }

  #[test]
  fn roundtrip_stays_within_lossy_error_bounds() {
    let img = gradient_image(64, 48);
    let bytes = encode(&img);
    let back = decode(&bytes).unwrap();
    assert_eq!(back.width(), img.width());
    assert_eq!(back.height(), img.height());
    assert!(mean_abs_channel_error(&img, &back) <= 20.0);
  }

  #[test]
  fn rejects_missing_soi() {
    assert_eq!(decode(&[0, 0, 0, 0]), Err(JpegError::BadMagic));
  }
}
