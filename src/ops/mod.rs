//! The operation interpreter (spec.md §4.10): tokenizes a textual op spec,
//! splits it into an action and `key=value` pairs, and dispatches to one of
//! five categories in the same try-each-category order
//! `original_source/src/cli_ops_core.cpp`'s `applyDocumentOperation` uses —
//! effects first, then drawing, then this module's own structural/transform/
//! emit arms, falling through to [`OpError::UnknownAction`] when nothing
//! claims the action.

mod draw;
mod effects_ops;
mod error;
mod parse;
mod resolve;
mod structural;
mod transform_ops;

pub use error::OpError;
pub use parse::tokenize_op_spec;

use crate::layer::Document;
use std::collections::HashMap;

/// Applies one op-spec line to `document`. `emit_dir` is the base directory
/// `emit`'s `file=`/`out=` path is resolved against when relative (pass
/// `None` to resolve against the process's current directory, matching
/// `original_source`'s behavior of writing wherever `file=` names).
pub fn apply_document_operation(document: &mut Document, op_spec: &str) -> Result<(), OpError> {
  let tokens = parse::tokenize_op_spec(op_spec)?;
  if tokens.is_empty() {
    return Err(OpError::Empty);
  }
  let action = tokens[0].as_str();
  let kv = parse::parse_key_values(&tokens[1..])?;

  #[cfg(feature = "log-diagnostics")]
  log::trace!("op: {action} {kv:?}");

  if effects_ops::try_apply_effects_operation(document, action, &kv)? {
    return Ok(());
  }
  if draw::try_apply_draw_operation(document, action, &kv)? {
    return Ok(());
  }
  if structural::try_apply_structural_operation(document, action, &kv)? {
    return Ok(());
  }
  if try_apply_transform_operation(document, action, &kv)? {
    return Ok(());
  }
  if action == "emit" {
    return apply_emit(document, &kv);
  }

  Err(OpError::UnknownAction(action.to_string()))
}

/// Runs every non-blank, non-`#`-comment line of `script` through
/// [`apply_document_operation`] in order, stopping at the first error.
pub fn run_op_script(document: &mut Document, script: &str) -> Result<(), OpError> {
  for line in script.lines() {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
      continue;
    }
    apply_document_operation(document, line)?;
  }
  Ok(())
}

fn try_apply_transform_operation(document: &mut Document, action: &str, kv: &HashMap<String, String>) -> Result<bool, OpError> {
  let path = match kv.get("path") {
    Some(p) => p.clone(),
    None if matches!(action, "set-transform" | "concat-transform" | "clear-transform") => return Err(error::missing_keys(action, &["path"])),
    None => return Ok(false),
  };

  match action {
    "set-transform" => {
      let transform = transform_ops::build_transform_from_kv(kv)?;
      let node = resolve::resolve_node_mut(document, &path)?;
      *node_transform_mut(node) = transform;
    }
    "concat-transform" => {
      let transform = transform_ops::build_transform_from_kv(kv)?;
      let node = resolve::resolve_node_mut(document, &path)?;
      let current = *node_transform_mut(node);
      *node_transform_mut(node) = current.compose(transform);
    }
    "clear-transform" => {
      let node = resolve::resolve_node_mut(document, &path)?;
      *node_transform_mut(node) = crate::transform::Transform2D::identity();
    }
    _ => return Ok(false),
  }
  Ok(true)
}

fn node_transform_mut(node: &mut crate::layer::LayerNode) -> &mut crate::transform::Transform2D {
  match node {
    crate::layer::LayerNode::Layer(l) => l.transform_mut(),
    crate::layer::LayerNode::Group(g) => g.transform_mut(),
  }
}

/// Encodes `image` (an RGBA8 composite, alpha dropped: every codec this
/// crate writes is opaque-only) by `ext`, matching spec.md §4.10's "write
/// to a path whose extension selects the codec".
fn encode_by_extension(ext: &str, image: &crate::surface::ImageBuffer) -> Result<Vec<u8>, OpError> {
  let rgb: Vec<crate::pixel::PixelRGB> = image.pixels().iter().map(|&p| crate::pixel::PixelRGB::from(p)).collect();
  let raster = crate::surface::RasterSurface::from_pixels(image.width(), image.height(), rgb).expect("image dims already validated");
  match ext {
    "png" => Ok(crate::png::encode(&raster)),
    "bmp" => Ok(crate::bmp::encode(&raster)),
    "gif" => Ok(crate::gif::encode(&raster)?),
    "jpg" | "jpeg" => Ok(crate::jpeg::encode(&raster)),
    other => Err(OpError::UnsupportedExtension(other.to_string())),
  }
}

fn apply_emit(document: &Document, kv: &HashMap<String, String>) -> Result<(), OpError> {
  let output_path = kv.get("file").or_else(|| kv.get("out")).ok_or_else(|| error::missing_keys("emit", &["file"]))?;
  let ext = std::path::Path::new(output_path).extension().and_then(|e| e.to_str()).unwrap_or("").to_ascii_lowercase();
  let flattened = crate::compositor::composite(document);
  let bytes = encode_by_extension(&ext, &flattened)?;
  std::fs::write(output_path, bytes).map_err(|e| OpError::Io(format!("writing {output_path}: {e}")))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::pixel::PixelRGBA8;

  #[test]
  fn unknown_action_fails_with_name() {
    let mut doc = Document::new(2, 2);
    let err = apply_document_operation(&mut doc, "not-a-real-op").unwrap_err();
    assert!(matches!(err, OpError::UnknownAction(ref a) if a == "not-a-real-op"));
  }

  #[test]
  fn script_runs_sequential_structural_ops() {
    let mut doc = Document::new(4, 4);
    run_op_script(
      &mut doc,
      "add-layer name=Bg\nfill-layer path=/0 rgba=10,20,30,255\n# a comment\n\nset-layer path=/0 opacity=0.5",
    )
    .unwrap();
    let layer = resolve::resolve_layer(&doc, "/0").unwrap();
    assert_eq!(layer.image().get_pixel(0, 0).unwrap(), PixelRGBA8::new(10, 20, 30, 255));
    assert_eq!(layer.opacity(), 0.5);
  }

  #[test]
  fn set_transform_then_clear_transform_round_trips_identity() {
    let mut doc = Document::new(4, 4);
    apply_document_operation(&mut doc, "add-layer").unwrap();
    apply_document_operation(&mut doc, "set-transform path=/0 translate=2,3").unwrap();
    let layer = resolve::resolve_layer(&doc, "/0").unwrap();
    assert_eq!(layer.transform().apply(0.0, 0.0), (2.0, 3.0));
    apply_document_operation(&mut doc, "clear-transform path=/0").unwrap();
    let layer = resolve::resolve_layer(&doc, "/0").unwrap();
    assert!(layer.transform().is_identity(1e-9));
  }

  #[test]
  fn concat_transform_composes_onto_existing() {
    let mut doc = Document::new(4, 4);
    apply_document_operation(&mut doc, "add-layer").unwrap();
    apply_document_operation(&mut doc, "set-transform path=/0 translate=2,0").unwrap();
    apply_document_operation(&mut doc, "concat-transform path=/0 translate=0,3").unwrap();
    let layer = resolve::resolve_layer(&doc, "/0").unwrap();
    assert_eq!(layer.transform().apply(0.0, 0.0), (2.0, 3.0));
  }

  #[test]
  fn emit_requires_file_or_out() {
    let doc = Document::new(2, 2);
    let err = apply_emit(&doc, &HashMap::new()).unwrap_err();
    assert!(matches!(err, OpError::Message(_)));
  }

  #[test]
  fn emit_writes_a_bmp_file() {
    let dir = std::env::temp_dir().join("pixelflow_ops_mod_test_emit");
    let _ = std::fs::create_dir_all(&dir);
    let path = dir.join("out.bmp");
    let mut doc = Document::new(2, 2);
    apply_document_operation(&mut doc, "add-layer").unwrap();
    apply_document_operation(&mut doc, "fill-layer path=/0 rgba=1,2,3,255").unwrap();
    let op = format!("emit file={}", path.display());
    apply_document_operation(&mut doc, &op).unwrap();
    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(&bytes[0..2], b"BM");
    let _ = std::fs::remove_file(&path);
  }
}
