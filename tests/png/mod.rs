//! PNG encode/decode coverage, mirroring
//! `examples/Lokathor-imagine/tests/png/mod.rs`'s placement.

use pixelflow::pixel::PixelRGB;
use pixelflow::png;
use pixelflow::surface::RasterSurface;

fn gradient_image(w: u32, h: u32) -> png::PngRaster {
  let mut img = RasterSurface::new(w, h).unwrap();
  for y in 0..h as i64 {
    for x in 0..w as i64 {
      img.set_pixel(x, y, PixelRGB { r: (x * 8) as u8, g: (y * 8) as u8, b: 128 });
    }
  }
  img
}

#[test]
fn encode_then_decode_preserves_pixels() {
  let original = gradient_image(16, 12);
  let bytes = png::encode(&original);
  let decoded = png::decode(&bytes).unwrap();
  assert_eq!(decoded.pixels(), original.pixels());
  assert_eq!((decoded.width(), decoded.height()), (16, 12));
}

#[test]
fn encoded_bytes_carry_the_png_signature() {
  let bytes = png::encode(&gradient_image(2, 2));
  assert_eq!(&bytes[0..8], &png::PNG_SIGNATURE);
}

#[test]
fn decode_rejects_data_without_the_signature() {
  let err = png::decode(b"not a png file at all").unwrap_err();
  assert!(matches!(err, png::PngError::NoPngSignature));
}

#[test]
fn decode_never_panics_on_truncated_valid_png() {
  let bytes = png::encode(&gradient_image(8, 8));
  for cut in [0, 1, 8, 16, bytes.len() / 2] {
    let _ = png::decode(&bytes[..cut.min(bytes.len())]);
  }
}
