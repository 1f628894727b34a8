//! Single-frame GIF encode/decode coverage.

use pixelflow::gif;
use pixelflow::pixel::PixelRGB;
use pixelflow::surface::RasterSurface;

fn three_color_image() -> gif::GifRaster {
  let mut img = RasterSurface::new(6, 4).unwrap();
  for y in 0..4 {
    for x in 0..6 {
      let color = match (x + y) % 3 {
        0 => PixelRGB { r: 255, g: 0, b: 0 },
        1 => PixelRGB { r: 0, g: 255, b: 0 },
        _ => PixelRGB { r: 0, g: 0, b: 255 },
      };
      img.set_pixel(x, y, color);
    }
  }
  img
}

#[test]
fn encode_then_decode_preserves_pixels() {
  let original = three_color_image();
  let bytes = gif::encode(&original).unwrap();
  let decoded = gif::decode(&bytes).unwrap();
  assert_eq!(decoded.pixels(), original.pixels());
}

#[test]
fn encode_rejects_more_than_256_distinct_colors() {
  let mut img = RasterSurface::new(20, 20).unwrap();
  let mut n = 0u32;
  for y in 0..20i64 {
    for x in 0..20i64 {
      img.set_pixel(x, y, PixelRGB { r: (n % 256) as u8, g: ((n / 2) % 256) as u8, b: ((n / 3) % 256) as u8 });
      n += 1;
    }
  }
  let err = gif::encode(&img).unwrap_err();
  assert!(matches!(err, gif::GifError::TooManyColors(_)));
}

#[test]
fn decode_rejects_bad_magic() {
  let err = gif::decode(b"not a gif").unwrap_err();
  assert!(matches!(err, gif::GifError::BadMagic));
}
