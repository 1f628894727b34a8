//! `path=`/`target=` resolution shared by every op. Grounded on
//! `original_source/src/cli_ops_resolve.cpp`'s `resolveGroupPath`/
//! `resolveNodePath`/`resolveLayerPath` (thin wrappers over
//! `crate::layer`'s own path resolvers, just translating [`PathError`] into
//! [`OpError`]) and `resolveDrawTargetBuffer`.

use super::error::OpError;
use crate::layer::{Document, Layer, LayerGroup, LayerNode};
use crate::pixel::PixelRGBA8;
use crate::surface::ImageBuffer;
use std::collections::HashMap;

/// The `mask_fill=` default when a draw op targets a mask that doesn't
/// exist yet: opaque black, so the freshly painted stroke is the only
/// visible part of the mask until more is drawn (unlike `mask-enable`'s
/// opaque-white "no effect yet" default).
const DEFAULT_MASK_FILL: PixelRGBA8 = PixelRGBA8::OPAQUE_BLACK;

pub fn require_path<'a>(kv: &'a HashMap<String, String>, action: &str) -> Result<&'a str, OpError> {
  kv.get("path").map(String::as_str).ok_or_else(|| super::error::missing_keys(action, &["path"]))
}

pub fn resolve_group<'a>(document: &'a Document, path: &str) -> Result<&'a LayerGroup, OpError> {
  crate::layer::resolve_group_path(document, path).map_err(OpError::from)
}

pub fn resolve_group_mut<'a>(document: &'a mut Document, path: &str) -> Result<&'a mut LayerGroup, OpError> {
  crate::layer::resolve_group_path_mut(document, path).map_err(OpError::from)
}

pub fn resolve_node<'a>(document: &'a Document, path: &str) -> Result<&'a LayerNode, OpError> {
  crate::layer::resolve_node_path(document, path).map_err(OpError::from)
}

pub fn resolve_node_mut<'a>(document: &'a mut Document, path: &str) -> Result<&'a mut LayerNode, OpError> {
  crate::layer::resolve_node_path_mut(document, path).map_err(OpError::from)
}

pub fn resolve_layer<'a>(document: &'a Document, path: &str) -> Result<&'a Layer, OpError> {
  crate::layer::resolve_layer_path(document, path).map_err(OpError::from)
}

pub fn resolve_layer_mut<'a>(document: &'a mut Document, path: &str) -> Result<&'a mut Layer, OpError> {
  crate::layer::resolve_layer_path_mut(document, path).map_err(OpError::from)
}

/// `target=image|mask` (default `image`). When the target is `mask` and the
/// layer has none yet, creates one filled with `mask_fill=` (default opaque
/// black).
pub fn resolve_draw_target_buffer<'a>(layer: &'a mut Layer, kv: &HashMap<String, String>) -> Result<&'a mut ImageBuffer, OpError> {
  let target = kv.get("target").map(String::as_str).unwrap_or("image");
  match target {
    "image" => Ok(layer.image_mut()),
    "mask" => {
      if !layer.has_mask() {
        let fill = match kv.get("mask_fill") {
          Some(spec) => super::parse::parse_rgba(spec, true)?,
          None => DEFAULT_MASK_FILL,
        };
        layer.enable_mask(fill);
      }
      Ok(layer.mask_mut().expect("mask just enabled"))
    }
    other => Err(OpError::Message(format!("Unsupported target=: {other} (expected image or mask)"))),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::layer::Layer;

  #[test]
  fn draw_target_defaults_to_image() {
    let mut layer = Layer::new("l", 2, 2);
    let kv = HashMap::new();
    let buf = resolve_draw_target_buffer(&mut layer, &kv).unwrap();
    assert_eq!(buf.width(), 2);
  }

  #[test]
  fn draw_target_mask_creates_with_default_black_fill() {
    let mut layer = Layer::new("l", 2, 2);
    let mut kv = HashMap::new();
    kv.insert("target".to_string(), "mask".to_string());
    let buf = resolve_draw_target_buffer(&mut layer, &kv).unwrap();
    assert!(buf.pixels().iter().all(|&p| p == PixelRGBA8::OPAQUE_BLACK));
  }

  #[test]
  fn draw_target_mask_honors_mask_fill() {
    let mut layer = Layer::new("l", 2, 2);
    let mut kv = HashMap::new();
    kv.insert("target".to_string(), "mask".to_string());
    kv.insert("mask_fill".to_string(), "255,255,255".to_string());
    let buf = resolve_draw_target_buffer(&mut layer, &kv).unwrap();
    assert!(buf.pixels().iter().all(|&p| p == PixelRGBA8::OPAQUE_WHITE));
  }

  #[test]
  fn rejects_unknown_target() {
    let mut layer = Layer::new("l", 2, 2);
    let mut kv = HashMap::new();
    kv.insert("target".to_string(), "bogus".to_string());
    assert!(resolve_draw_target_buffer(&mut layer, &kv).is_err());
  }
}
