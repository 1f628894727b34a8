//! Integration suite aggregator, mirroring the teacher's
//! `tests/all_tests.rs` + `tests/{bmp,png}/mod.rs` layout
//! (`examples/Lokathor-imagine/tests/all_tests.rs`).

mod bmp;
mod compositor;
mod gif;
mod jpeg;
mod png;
mod rasterizer;

/// Builds the 256x256 reference scene described in `original_source`'s
/// `example_api::createSmiley256*` family: a background fill, a round face,
/// two eyes, and a mouth, drawn straight onto one buffer with the
/// rasterizer primitives (the "direct" path the layered-equivalence tests
/// compare against).
pub fn smiley_256_direct() -> pixelflow::ImageBuffer {
  use pixelflow::pixel::PixelRGBA8;
  let mut img = pixelflow::ImageBuffer::new(256, 256).unwrap();
  pixelflow::raster2d::fill(&mut img, PixelRGBA8::opaque(255, 224, 130));
  pixelflow::raster2d::fill_circle(&mut img, 128, 128, 110, PixelRGBA8::opaque(255, 205, 60));
  pixelflow::raster2d::fill_circle(&mut img, 92, 100, 14, PixelRGBA8::OPAQUE_BLACK);
  pixelflow::raster2d::fill_circle(&mut img, 164, 100, 14, PixelRGBA8::OPAQUE_BLACK);
  pixelflow::raster2d::arc(&mut img, 128, 140, 60, 0.0, std::f64::consts::PI, PixelRGBA8::OPAQUE_BLACK, false);
  img
}

/// Builds the same reference scene by driving the operation interpreter
/// over a one-layer document, for the layered-vs-direct equivalence test
/// `original_source/src/main.cpp` computes a pixel diff for.
pub fn smiley_256_layered() -> pixelflow::ImageBuffer {
  let mut doc = pixelflow::Document::new(256, 256);
  pixelflow::ops::run_op_script(
    &mut doc,
    "add-layer name=Bg\n\
     draw-fill path=/0 rgba=255,224,130,255\n\
     draw-fill-circle path=/0 cx=128 cy=128 radius=110 rgba=255,205,60,255\n\
     draw-fill-circle path=/0 cx=92 cy=100 radius=14 rgba=0,0,0,255\n\
     draw-fill-circle path=/0 cx=164 cy=100 radius=14 rgba=0,0,0,255\n\
     draw-arc path=/0 cx=128 cy=140 radius=60 start_rad=0 end_rad=3.14159265358979 rgba=0,0,0,255",
  )
  .unwrap();
  pixelflow::compositor::composite(&doc)
}
