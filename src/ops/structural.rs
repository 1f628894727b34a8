//! `add-layer`/`add-group`/`add-grid-layers`/`set-layer`/`set-group`/
//! `fill-layer`/`set-pixel`/`mask-*`/`import-image`/`resize-layer`
//! dispatch. Grounded on `original_source/src/cli_ops_core.cpp`'s
//! `applyDocumentOperation` switch, one arm per action.

use super::error::{missing_keys, OpError};
use super::parse::{parse_blend_mode, parse_bool_flag, parse_byte, parse_double_strict, parse_int_pair, parse_int_strict, parse_resize_filter, parse_rgba};
use super::resolve::{resolve_group_mut, resolve_layer_mut, resolve_node_mut};
use crate::layer::{Document, Layer, LayerGroup};
use crate::pixel::{PixelRGB, PixelRGBA8};
use crate::surface::ImageBuffer;
use std::collections::HashMap;

fn opt_str<'a>(kv: &'a HashMap<String, String>, key: &str, default: &'a str) -> &'a str {
  kv.get(key).map(String::as_str).unwrap_or(default)
}

fn opt_int(kv: &HashMap<String, String>, key: &str, default: i64) -> Result<i64, OpError> {
  match kv.get(key) {
    Some(v) => parse_int_strict(v, key),
    None => Ok(default),
  }
}

fn opt_float(kv: &HashMap<String, String>, key: &str, default: f32) -> Result<f32, OpError> {
  match kv.get(key) {
    Some(v) => parse_double_strict(v, key).map(|v| v as f32),
    None => Ok(default),
  }
}

fn opt_rgba(kv: &HashMap<String, String>, key: &str, default: PixelRGBA8) -> Result<PixelRGBA8, OpError> {
  match kv.get(key) {
    Some(v) => parse_rgba(v, true),
    None => Ok(default),
  }
}

fn req_path<'a>(kv: &'a HashMap<String, String>, action: &str) -> Result<&'a str, OpError> {
  kv.get("path").map(String::as_str).ok_or_else(|| missing_keys(action, &["path"]))
}

/// Decodes encoded image `bytes` by file extension (spec.md §4.10's `emit`
/// extension-selects-the-codec convention, applied symmetrically on
/// import) into an `ImageBuffer`, applying straight `alpha` to every pixel
/// (codecs only round-trip opaque `PixelRGB`).
fn decode_by_extension(ext: &str, bytes: &[u8], alpha: u8) -> Result<ImageBuffer, OpError> {
  let rgb_to_rgba = |raster: crate::surface::RasterSurface<PixelRGB>| -> ImageBuffer {
    let pixels: Vec<PixelRGBA8> = raster.pixels().iter().map(|p| PixelRGBA8::new(p.r, p.g, p.b, alpha)).collect();
    ImageBuffer::from_pixels(raster.width(), raster.height(), pixels).expect("raster dims already validated")
  };
  match ext {
    "png" => Ok(rgb_to_rgba(crate::png::decode(bytes)?)),
    "bmp" => Ok(rgb_to_rgba(crate::bmp::decode(bytes)?)),
    "gif" => Ok(rgb_to_rgba(crate::gif::decode(bytes)?)),
    "jpg" | "jpeg" => Ok(rgb_to_rgba(crate::jpeg::decode(bytes)?)),
    other => Err(OpError::UnsupportedExtension(other.to_string())),
  }
}

fn file_extension_lower(path: &str) -> String {
  std::path::Path::new(path).extension().and_then(|e| e.to_str()).unwrap_or("").to_ascii_lowercase()
}

/// Dispatches a structural action. Returns `Ok(false)` when `action` isn't
/// one of these, `Ok(true)` once handled. `emit` is handled by the caller
/// ([`super::apply_document_operation`]) since only it touches an output
/// path/codec and needs the whole document rather than a single node.
pub fn try_apply_structural_operation(document: &mut Document, action: &str, kv: &HashMap<String, String>) -> Result<bool, OpError> {
  match action {
    "add-layer" => {
      let parent_path = opt_str(kv, "parent", "/").to_string();
      let name = opt_str(kv, "name", "Layer").to_string();
      let width = opt_int(kv, "width", i64::from(document.width()))?.max(1) as u32;
      let height = opt_int(kv, "height", i64::from(document.height()))?.max(1) as u32;
      let fill = opt_rgba(kv, "fill", PixelRGBA8::TRANSPARENT)?;
      let group = resolve_group_mut(document, &parent_path)?;
      group.add_layer(Layer::filled(name, width, height, fill));
    }
    "add-grid-layers" => {
      let parent_path = opt_str(kv, "parent", "/").to_string();
      let rows = opt_int(kv, "rows", 1)?;
      let cols = opt_int(kv, "cols", 1)?;
      if rows <= 0 || cols <= 0 {
        return Err(OpError::Message("add-grid-layers requires rows>0 and cols>0".to_string()));
      }
      let border = opt_int(kv, "border", 0)?;
      let start_x = opt_int(kv, "start_x", 0)?;
      let start_y = opt_int(kv, "start_y", 0)?;
      let tile_width = opt_int(kv, "tile_width", i64::from(document.width()) / cols)?;
      let tile_height = opt_int(kv, "tile_height", i64::from(document.height()) / rows)?;
      if tile_width <= 0 || tile_height <= 0 {
        return Err(OpError::Message("add-grid-layers tile dimensions must be positive".to_string()));
      }
      let inner_width = tile_width - border * 2;
      let inner_height = tile_height - border * 2;
      if inner_width <= 0 || inner_height <= 0 {
        return Err(OpError::Message("add-grid-layers border is too large for tile size".to_string()));
      }
      let prefix = opt_str(kv, "name_prefix", "Tile").to_string();
      let opacity = opt_float(kv, "opacity", 1.0)?;
      let blend = match kv.get("blend") {
        Some(v) => parse_blend_mode(v)?,
        None => crate::layer::BlendMode::Normal,
      };
      let default_fill = opt_rgba(kv, "fill", PixelRGBA8::TRANSPARENT)?;

      let fill_sequence: Vec<PixelRGBA8> = match kv.get("fills") {
        Some(spec) => spec.split(';').filter(|s| !s.is_empty()).map(|tok| parse_rgba(tok, true)).collect::<Result<_, _>>()?,
        None => Vec::new(),
      };
      let blend_sequence: Vec<crate::layer::BlendMode> = match kv.get("blends") {
        Some(spec) => spec.split(';').filter(|s| !s.is_empty()).map(parse_blend_mode).collect::<Result<_, _>>()?,
        None => Vec::new(),
      };

      let group = resolve_group_mut(document, &parent_path)?;
      let mut index = 0usize;
      for row in 0..rows {
        for col in 0..cols {
          let x = start_x + col * tile_width + border;
          let y = start_y + row * tile_height + border;
          let fill = if fill_sequence.is_empty() { default_fill } else { fill_sequence[index % fill_sequence.len()] };
          let layer_blend = if blend_sequence.is_empty() { blend } else { blend_sequence[index % blend_sequence.len()] };

          let mut layer = Layer::filled(format!("{prefix}_{row}_{col}"), inner_width as u32, inner_height as u32, fill);
          layer.set_opacity(opacity);
          layer.set_blend_mode(layer_blend);
          layer.set_offset(x, y);
          group.add_layer(layer);
          index += 1;
        }
      }
    }
    "add-group" => {
      let parent_path = opt_str(kv, "parent", "/").to_string();
      let name = opt_str(kv, "name", "Group").to_string();
      let group = resolve_group_mut(document, &parent_path)?;
      group.add_group(LayerGroup::new(name));
    }
    "set-layer" => {
      let path = req_path(kv, action)?.to_string();
      let layer = resolve_layer_mut(document, &path)?;
      if let Some(name) = kv.get("name") {
        layer.set_name(name.clone());
      }
      if let Some(v) = kv.get("visible") {
        layer.set_visible(parse_bool_flag(v)?);
      }
      if let Some(v) = kv.get("opacity") {
        layer.set_opacity(parse_double_strict(v, "opacity")? as f32);
      }
      if let Some(v) = kv.get("blend") {
        layer.set_blend_mode(parse_blend_mode(v)?);
      }
      if let Some(v) = kv.get("offset") {
        let (ox, oy) = parse_int_pair(v)?;
        layer.set_offset(ox, oy);
      }
    }
    "set-group" => {
      let path = req_path(kv, action)?.to_string();
      let node = resolve_node_mut(document, &path)?;
      let group = node.as_group_mut().ok_or_else(|| OpError::Message("set-group path must resolve to a group".to_string()))?;
      if let Some(name) = kv.get("name") {
        group.set_name(name.clone());
      }
      if let Some(v) = kv.get("visible") {
        group.set_visible(parse_bool_flag(v)?);
      }
      if let Some(v) = kv.get("opacity") {
        group.set_opacity(parse_double_strict(v, "opacity")? as f32);
      }
      if let Some(v) = kv.get("blend") {
        group.set_blend_mode(parse_blend_mode(v)?);
      }
      if let Some(v) = kv.get("offset") {
        let (ox, oy) = parse_int_pair(v)?;
        group.set_offset(ox, oy);
      }
    }
    "fill-layer" => {
      if !kv.contains_key("path") || !kv.contains_key("rgba") {
        return Err(missing_keys(action, &["path", "rgba"]));
      }
      let path = kv["path"].clone();
      let color = parse_rgba(&kv["rgba"], true)?;
      let layer = resolve_layer_mut(document, &path)?;
      layer.image_mut().fill(color);
    }
    "set-pixel" => {
      if !kv.contains_key("path") || !kv.contains_key("x") || !kv.contains_key("y") || !kv.contains_key("rgba") {
        return Err(missing_keys(action, &["path", "x", "y", "rgba"]));
      }
      let path = kv["path"].clone();
      let x = parse_int_strict(&kv["x"], "x")?;
      let y = parse_int_strict(&kv["y"], "y")?;
      let color = parse_rgba(&kv["rgba"], true)?;
      let layer = resolve_layer_mut(document, &path)?;
      layer.image_mut().set_pixel(x, y, color);
    }
    "mask-enable" => {
      let path = req_path(kv, action)?.to_string();
      let fill = opt_rgba(kv, "fill", PixelRGBA8::OPAQUE_WHITE)?;
      let layer = resolve_layer_mut(document, &path)?;
      layer.enable_mask(fill);
    }
    "mask-clear" => {
      let path = req_path(kv, action)?.to_string();
      let layer = resolve_layer_mut(document, &path)?;
      layer.clear_mask();
    }
    "mask-set-pixel" => {
      if !kv.contains_key("path") || !kv.contains_key("x") || !kv.contains_key("y") || !kv.contains_key("rgba") {
        return Err(missing_keys(action, &["path", "x", "y", "rgba"]));
      }
      let path = kv["path"].clone();
      let x = parse_int_strict(&kv["x"], "x")?;
      let y = parse_int_strict(&kv["y"], "y")?;
      let color = parse_rgba(&kv["rgba"], true)?;
      let layer = resolve_layer_mut(document, &path)?;
      if !layer.has_mask() {
        layer.enable_mask(PixelRGBA8::OPAQUE_WHITE);
      }
      layer.mask_mut().expect("mask just enabled").set_pixel(x, y, color);
    }
    "import-image" => {
      if !kv.contains_key("path") || !kv.contains_key("file") {
        return Err(missing_keys(action, &["path", "file"]));
      }
      let path = kv["path"].clone();
      let file = kv["file"].clone();
      let alpha = match kv.get("alpha") {
        Some(v) => parse_byte(v, "alpha")?,
        None => 255,
      };
      let ext = file_extension_lower(&file);
      let bytes = std::fs::read(&file).map_err(|e| OpError::Io(format!("reading {file}: {e}")))?;
      let decoded = decode_by_extension(&ext, &bytes, alpha)?;
      let layer = resolve_layer_mut(document, &path)?;
      *layer.image_mut() = decoded;
      layer.clear_mask();
    }
    "resize-layer" => {
      if !kv.contains_key("path") || !kv.contains_key("width") || !kv.contains_key("height") {
        return Err(missing_keys(action, &["path", "width", "height"]));
      }
      let path = kv["path"].clone();
      let width = parse_int_strict(&kv["width"], "width")?.max(1) as u32;
      let height = parse_int_strict(&kv["height"], "height")?.max(1) as u32;
      let filter = match kv.get("filter") {
        Some(v) => parse_resize_filter(v)?,
        None => crate::resample::ResizeFilter::Bilinear,
      };
      let layer = resolve_layer_mut(document, &path)?;
      let resized = crate::resample::resize(layer.image(), width, height, filter);
      *layer.image_mut() = resized;
    }
    _ => return Ok(false),
  }
  Ok(true)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn kv(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
  }

  #[test]
  fn add_layer_uses_document_dims_by_default() {
    let mut doc = Document::new(8, 6);
    try_apply_structural_operation(&mut doc, "add-layer", &kv(&[("name", "Bg")])).unwrap();
    let layer = super::super::resolve::resolve_layer(&doc, "/0").unwrap();
    assert_eq!((layer.image().width(), layer.image().height()), (8, 6));
    assert_eq!(layer.name(), "Bg");
  }

  #[test]
  fn add_group_then_nested_add_layer() {
    let mut doc = Document::new(4, 4);
    try_apply_structural_operation(&mut doc, "add-group", &kv(&[("name", "g")])).unwrap();
    try_apply_structural_operation(&mut doc, "add-layer", &kv(&[("parent", "/0"), ("name", "child")])).unwrap();
    let layer = super::super::resolve::resolve_layer(&doc, "/0/0").unwrap();
    assert_eq!(layer.name(), "child");
  }

  #[test]
  fn add_grid_layers_tiles_the_document() {
    let mut doc = Document::new(4, 4);
    try_apply_structural_operation(&mut doc, "add-grid-layers", &kv(&[("rows", "2"), ("cols", "2")])).unwrap();
    let group = super::super::resolve::resolve_group(&doc, "/").unwrap();
    assert_eq!(group.node_count(), 4);
    let tile = group.node(3).unwrap().as_layer().unwrap();
    assert_eq!(tile.offset(), (2, 2));
  }

  #[test]
  fn set_layer_updates_opacity_and_offset() {
    let mut doc = Document::new(4, 4);
    try_apply_structural_operation(&mut doc, "add-layer", &kv(&[])).unwrap();
    try_apply_structural_operation(&mut doc, "set-layer", &kv(&[("path", "/0"), ("opacity", "0.5"), ("offset", "2,3")])).unwrap();
    let layer = super::super::resolve::resolve_layer(&doc, "/0").unwrap();
    assert_eq!(layer.opacity(), 0.5);
    assert_eq!(layer.offset(), (2, 3));
  }

  #[test]
  fn fill_layer_requires_rgba() {
    let mut doc = Document::new(2, 2);
    try_apply_structural_operation(&mut doc, "add-layer", &kv(&[])).unwrap();
    assert!(try_apply_structural_operation(&mut doc, "fill-layer", &kv(&[("path", "/0")])).is_err());
  }

  #[test]
  fn mask_set_pixel_creates_mask_on_demand() {
    let mut doc = Document::new(2, 2);
    try_apply_structural_operation(&mut doc, "add-layer", &kv(&[])).unwrap();
    try_apply_structural_operation(&mut doc, "mask-set-pixel", &kv(&[("path", "/0"), ("x", "0"), ("y", "0"), ("rgba", "10,10,10,255")])).unwrap();
    let layer = super::super::resolve::resolve_layer(&doc, "/0").unwrap();
    assert!(layer.has_mask());
    assert_eq!(layer.mask().unwrap().get_pixel(0, 0).unwrap(), PixelRGBA8::new(10, 10, 10, 255));
  }

  #[test]
  fn resize_layer_changes_image_dims() {
    let mut doc = Document::new(4, 4);
    try_apply_structural_operation(&mut doc, "add-layer", &kv(&[])).unwrap();
    try_apply_structural_operation(&mut doc, "resize-layer", &kv(&[("path", "/0"), ("width", "2"), ("height", "2")])).unwrap();
    let layer = super::super::resolve::resolve_layer(&doc, "/0").unwrap();
    assert_eq!((layer.image().width(), layer.image().height()), (2, 2));
  }

  #[test]
  fn unknown_action_returns_false() {
    let mut doc = Document::new(2, 2);
    assert!(!try_apply_structural_operation(&mut doc, "draw-line", &kv(&[])).unwrap());
  }
}
