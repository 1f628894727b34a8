//! Baseline JPEG encode/decode coverage. Lossy by construction (DCT +
//! quantization + 4:2:0 subsampling), so these assert bounded channel drift
//! rather than exact roundtrip, unlike the lossless codecs' tests.

use pixelflow::jpeg;
use pixelflow::pixel::PixelRGB;
use pixelflow::surface::RasterSurface;

fn checker_image() -> jpeg::JpegRaster {
  let mut img = RasterSurface::new(16, 16).unwrap();
  for y in 0..16i64 {
    for x in 0..16i64 {
      let on = (x / 4 + y / 4) % 2 == 0;
      let c = if on { PixelRGB { r: 220, g: 40, b: 40 } } else { PixelRGB { r: 30, g: 120, b: 200 } };
      img.set_pixel(x, y, c);
    }
  }
  img
}

fn max_channel_diff(a: &jpeg::JpegRaster, b: &jpeg::JpegRaster) -> i32 {
  a.pixels()
    .iter()
    .zip(b.pixels().iter())
    .flat_map(|(p, q)| [(p.r as i32 - q.r as i32).abs(), (p.g as i32 - q.g as i32).abs(), (p.b as i32 - q.b as i32).abs()])
    .max()
    .unwrap_or(0)
}

#[test]
fn encode_then_decode_preserves_dimensions() {
  let original = checker_image();
  let bytes = jpeg::encode(&original);
  let decoded = jpeg::decode(&bytes).unwrap();
  assert_eq!((decoded.width(), decoded.height()), (original.width(), original.height()));
}

#[test]
fn encode_then_decode_stays_within_lossy_tolerance() {
  let original = checker_image();
  let bytes = jpeg::encode(&original);
  let decoded = jpeg::decode(&bytes).unwrap();
  assert!(max_channel_diff(&original, &decoded) <= 60, "decoded image drifted too far from the source");
}

#[test]
fn encoded_bytes_start_with_the_soi_marker() {
  let bytes = jpeg::encode(&checker_image());
  assert_eq!(&bytes[0..2], &[0xFF, 0xD8]);
}

#[test]
fn decode_rejects_bad_magic() {
  let err = jpeg::decode(b"not a jpeg").unwrap_err();
  assert!(matches!(err, jpeg::JpegError::BadMagic));
}
