//! End-to-end rasterizer coverage through the operation interpreter's
//! `draw-*` dispatch, complementing `src/raster2d.rs`'s colocated unit
//! tests (which exercise the primitives directly) and `src/ops/draw.rs`'s
//! (which exercise one action at a time).

use pixelflow::ops::run_op_script;
use pixelflow::pixel::PixelRGBA8;
use pixelflow::resample::{resize, ResizeFilter};
use pixelflow::{Document, ImageBuffer};

fn layer_image(doc: &Document, path: &str) -> ImageBuffer {
  resolve_layer(doc, path).image().clone()
}

fn resolve_layer<'a>(doc: &'a Document, path: &str) -> &'a pixelflow::Layer {
  let indices: Vec<usize> = path.trim_start_matches('/').split('/').filter(|s| !s.is_empty()).map(|s| s.parse().unwrap()).collect();
  let mut group = doc.root_group();
  for (i, idx) in indices.iter().enumerate() {
    let node = group.node(*idx).unwrap();
    if i == indices.len() - 1 {
      return node.as_layer().unwrap();
    }
    group = node.as_group().unwrap();
  }
  unreachable!("root path is never a layer")
}

#[test]
fn a_closed_polygon_outline_draws_straight_edges() {
  let mut doc = Document::new(10, 10);
  run_op_script(&mut doc, "add-layer width=10 height=10").unwrap();
  run_op_script(&mut doc, "draw-polygon path=/0 points=1,1;8,1;8,8;1,8 rgba=255,255,255,255").unwrap();
  let img = layer_image(&doc, "/0");
  assert_eq!(img.get_pixel(4, 1).unwrap(), PixelRGBA8::new(255, 255, 255, 255));
  assert_eq!(img.get_pixel(1, 4).unwrap(), PixelRGBA8::new(255, 255, 255, 255));
  assert_eq!(img.get_pixel(4, 4).unwrap(), PixelRGBA8::TRANSPARENT);
}

#[test]
fn fill_polygon_paints_the_interior_too() {
  let mut doc = Document::new(10, 10);
  run_op_script(&mut doc, "add-layer width=10 height=10").unwrap();
  run_op_script(&mut doc, "draw-fill-polygon path=/0 points=1,1;8,1;8,8;1,8 rgba=10,20,30,255").unwrap();
  let img = layer_image(&doc, "/0");
  assert_eq!(img.get_pixel(4, 4).unwrap(), PixelRGBA8::new(10, 20, 30, 255));
}

#[test]
fn flood_fill_stops_at_a_rectangular_border() {
  let mut doc = Document::new(10, 10);
  run_op_script(&mut doc, "add-layer width=10 height=10 fill=0,0,0,255").unwrap();
  run_op_script(&mut doc, "draw-rect path=/0 x=2 y=2 width=6 height=6 rgba=255,0,0,255").unwrap();
  run_op_script(&mut doc, "draw-flood-fill path=/0 x=5 y=5 rgba=0,255,0,255").unwrap();
  let img = layer_image(&doc, "/0");
  assert_eq!(img.get_pixel(5, 5).unwrap(), PixelRGBA8::new(0, 255, 0, 255));
  // Outside the red border, the original black background is untouched.
  assert_eq!(img.get_pixel(0, 0).unwrap(), PixelRGBA8::new(0, 0, 0, 255));
  // The border itself is never flooded since it's a different color.
  assert_eq!(img.get_pixel(2, 5).unwrap(), PixelRGBA8::new(255, 0, 0, 255));
}

#[test]
fn draw_arc_with_degree_keys_matches_radian_keys() {
  let mut doc_rad = Document::new(12, 12);
  run_op_script(&mut doc_rad, "add-layer width=12 height=12").unwrap();
  run_op_script(&mut doc_rad, "draw-arc path=/0 cx=6 cy=6 radius=5 start_rad=0 end_rad=1.5707963267948966 rgba=255,255,255,255").unwrap();

  let mut doc_deg = Document::new(12, 12);
  run_op_script(&mut doc_deg, "add-layer width=12 height=12").unwrap();
  run_op_script(&mut doc_deg, "draw-arc path=/0 cx=6 cy=6 radius=5 start_deg=0 end_deg=90 rgba=255,255,255,255").unwrap();

  assert_eq!(layer_image(&doc_rad, "/0").pixels(), layer_image(&doc_deg, "/0").pixels());
}

#[test]
fn resizing_a_2x2_source_to_4x4_matches_quadrant_layout() {
  let mut src = ImageBuffer::new(2, 2).unwrap();
  src.set_pixel(0, 0, PixelRGBA8::opaque(0, 0, 0));
  src.set_pixel(1, 0, PixelRGBA8::opaque(255, 0, 0));
  src.set_pixel(0, 1, PixelRGBA8::opaque(0, 255, 0));
  src.set_pixel(1, 1, PixelRGBA8::opaque(255, 255, 0));
  let resized = resize(&src, 4, 4, ResizeFilter::Nearest);
  assert_eq!(resized.get_pixel(0, 0).unwrap(), PixelRGBA8::opaque(0, 0, 0));
  assert_eq!(resized.get_pixel(3, 0).unwrap(), PixelRGBA8::opaque(255, 0, 0));
  assert_eq!(resized.get_pixel(0, 3).unwrap(), PixelRGBA8::opaque(0, 255, 0));
  assert_eq!(resized.get_pixel(3, 3).unwrap(), PixelRGBA8::opaque(255, 255, 0));
}
