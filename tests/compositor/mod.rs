//! End-to-end compositor coverage, driving full [`pixelflow::Document`]s
//! through the operation interpreter rather than constructing layer trees
//! by hand (the colocated `#[cfg(test)]` module in `src/compositor.rs`
//! already covers the per-pixel blend math directly).

use pixelflow::ops::run_op_script;
use pixelflow::pixel::PixelRGBA8;
use pixelflow::Document;

#[test]
fn layered_and_direct_renderings_of_the_same_scene_match_closely() {
  let direct = crate::smiley_256_direct();
  let layered = crate::smiley_256_layered();
  assert_eq!(direct.width(), layered.width());
  assert_eq!(direct.height(), layered.height());

  let mut sum_abs_diff: u64 = 0;
  let mut max_diff: i32 = 0;
  for (a, b) in direct.pixels().iter().zip(layered.pixels().iter()) {
    let dr = (a.r as i32 - b.r as i32).abs();
    let dg = (a.g as i32 - b.g as i32).abs();
    let db = (a.b as i32 - b.b as i32).abs();
    sum_abs_diff += (dr + dg + db) as u64;
    max_diff = max_diff.max(dr).max(dg).max(db);
  }
  let mean_diff = sum_abs_diff as f64 / (256.0 * 256.0 * 3.0);
  // Same primitives, same order, drawn either straight onto one buffer or
  // through a single unmasked, untransformed, fully opaque layer: the two
  // paths should be pixel-identical modulo the arc angle's decimal-literal
  // rounding in the op script versus `f64::consts::PI` in the direct path.
  assert!(mean_diff < 0.01, "mean channel drift too large: {mean_diff}");
  assert!(max_diff <= 1, "max channel drift too large: {max_diff}");
}

#[test]
fn group_with_transform_and_mask_composites_without_panicking() {
  let mut doc = Document::new(32, 32);
  run_op_script(
    &mut doc,
    "add-group name=G\n\
     add-layer parent=/0 name=Inner width=32 height=32 fill=10,200,10,255\n\
     set-transform path=/0 rotate=15 translate=2,3\n\
     mask-enable path=/0/0 fill=255,255,255,255",
  )
  .unwrap();
  let flat = pixelflow::compositor::composite(&doc);
  assert_eq!(flat.width(), 32);
  assert_eq!(flat.height(), 32);
}

#[test]
fn emit_round_trips_a_composited_document_through_bmp() {
  let dir = std::env::temp_dir().join("pixelflow_compositor_integration_emit");
  let _ = std::fs::create_dir_all(&dir);
  let path = dir.join("emit_roundtrip.bmp");

  let mut doc = Document::new(4, 4);
  run_op_script(&mut doc, "add-layer name=Bg fill=40,80,120,255").unwrap();
  run_op_script(&mut doc, &format!("emit file={}", path.display())).unwrap();

  let bytes = std::fs::read(&path).unwrap();
  let decoded = pixelflow::bmp::decode(&bytes).unwrap();
  assert_eq!((decoded.width(), decoded.height()), (4, 4));
  let composited = pixelflow::compositor::composite(&doc);
  assert_eq!(composited.get_pixel(0, 0).unwrap(), PixelRGBA8::new(40, 80, 120, 255));

  let _ = std::fs::remove_file(&path);
}
