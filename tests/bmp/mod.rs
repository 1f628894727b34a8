//! BMP encode/decode roundtrip coverage, mirroring the teacher's
//! `tests/bmp/mod.rs` placement (`examples/Lokathor-imagine/tests/bmp/mod.rs`).

use pixelflow::bmp;
use pixelflow::pixel::PixelRGB;
use pixelflow::surface::RasterSurface;

fn striped_image() -> bmp::BmpRaster {
  let mut img = RasterSurface::new(4, 3).unwrap();
  for y in 0..3 {
    for x in 0..4 {
      let shade = ((x + y) * 30) as u8;
      img.set_pixel(x, y, PixelRGB { r: shade, g: 255 - shade, b: shade / 2 });
    }
  }
  img
}

#[test]
fn encode_then_decode_preserves_pixels_and_dimensions() {
  let original = striped_image();
  let bytes = bmp::encode(&original);
  let decoded = bmp::decode(&bytes).unwrap();
  assert_eq!(decoded.width(), original.width());
  assert_eq!(decoded.height(), original.height());
  assert_eq!(decoded.pixels(), original.pixels());
}

#[test]
fn encoded_bytes_start_with_the_bm_signature() {
  let bytes = bmp::encode(&striped_image());
  assert_eq!(&bytes[0..2], b"BM");
}

#[test]
fn decode_rejects_truncated_input() {
  let bytes = bmp::encode(&striped_image());
  let err = bmp::decode(&bytes[..10]).unwrap_err();
  assert!(matches!(err, bmp::BmpError::Truncated));
}

#[test]
fn decode_never_panics_on_random_bytes() {
  // A malformed file should fail cleanly, never panic the decoder.
  let mut seed: u32 = 0x1234_5678;
  let mut garbage = vec![0u8; 200];
  for byte in garbage.iter_mut() {
    seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12345);
    *byte = (seed >> 16) as u8;
  }
  let _ = bmp::decode(&garbage);
}
