//! `apply-effect`/`gaussian-blur`/`edge-detect`/`morphology`/`gamma`/
//! `levels`/`curves`/`fractal-noise`/`hatch`/`pencil-strokes`/
//! `replace-color`/`channel-mix` dispatch. Grounded on
//! `original_source/src/cli_ops_effects.cpp`'s
//! `tryApplyLambdaDispatchedOperation`: one table entry per action there,
//! one `match` arm here, each pulling its own `key=value`s and calling
//! straight into [`crate::effects`].

use super::error::{missing_keys, OpError};
use super::parse::{parse_bool_flag, parse_byte, parse_curve_points, parse_double_strict, parse_int_strict, parse_rgba};
use super::resolve::{resolve_draw_target_buffer, resolve_layer_mut};
use crate::effects::{self, ChannelMixMatrix, CurvePoint, MorphologyOp};
use crate::layer::Document;
use std::collections::HashMap;

fn opt_double(kv: &HashMap<String, String>, key: &str, default: f64) -> Result<f64, OpError> {
  match kv.get(key) {
    Some(v) => parse_double_strict(v, key),
    None => Ok(default),
  }
}

fn opt_float(kv: &HashMap<String, String>, key: &str, default: f32) -> Result<f32, OpError> {
  Ok(opt_double(kv, key, f64::from(default))? as f32)
}

fn opt_int(kv: &HashMap<String, String>, key: &str, default: i64) -> Result<i64, OpError> {
  match kv.get(key) {
    Some(v) => parse_int_strict(v, key),
    None => Ok(default),
  }
}

fn opt_bool(kv: &HashMap<String, String>, key: &str, default: bool) -> Result<bool, OpError> {
  match kv.get(key) {
    Some(v) => parse_bool_flag(v),
    None => Ok(default),
  }
}

fn opt_rgba(kv: &HashMap<String, String>, key: &str, default: crate::pixel::PixelRGBA8) -> Result<crate::pixel::PixelRGBA8, OpError> {
  match kv.get(key) {
    Some(v) => parse_rgba(v, true),
    None => Ok(default),
  }
}

fn req_path<'a>(kv: &'a HashMap<String, String>, action: &str) -> Result<&'a str, OpError> {
  kv.get("path").map(String::as_str).ok_or_else(|| missing_keys(action, &["path"]))
}

/// Dispatches an effects action. Returns `Ok(false)` when `action` isn't an
/// effects op (caller should keep trying other dispatch categories), and
/// `Ok(true)` once handled.
pub fn try_apply_effects_operation(document: &mut Document, action: &str, kv: &HashMap<String, String>) -> Result<bool, OpError> {
  use crate::pixel::PixelRGBA8;

  match action {
    "apply-effect" => {
      let path = req_path(kv, action)?.to_string();
      let effect = kv.get("effect").map(|s| s.to_ascii_lowercase()).ok_or_else(|| missing_keys(action, &["effect"]))?;
      let layer = resolve_layer_mut(document, &path)?;
      let image = layer.image_mut();
      match effect.as_str() {
        "grayscale" => effects::grayscale(image),
        "sepia" => {
          let strength = opt_float(kv, "strength", 1.0)?;
          effects::apply_sepia(image, strength);
        }
        "invert" => {
          let preserve_alpha = opt_bool(kv, "preserve_alpha", true)?;
          effects::apply_invert(image, preserve_alpha);
        }
        "threshold" => {
          let threshold = opt_int(kv, "threshold", 128)?;
          let lo = opt_rgba(kv, "lo", PixelRGBA8::OPAQUE_BLACK)?;
          let hi = opt_rgba(kv, "hi", PixelRGBA8::OPAQUE_WHITE)?;
          effects::apply_threshold(image, threshold as i32, lo, hi);
        }
        other => return Err(OpError::Message(format!("Unsupported effect: {other}"))),
      }
    }
    "gaussian-blur" => {
      let path = req_path(kv, action)?.to_string();
      let layer = resolve_layer_mut(document, &path)?;
      let target = resolve_draw_target_buffer(layer, kv)?;
      let radius = opt_int(kv, "radius", 3)?;
      let sigma = opt_double(kv, "sigma", 0.0)?;
      effects::gaussian_blur(target, radius as i32, sigma);
    }
    "edge-detect" => {
      let path = req_path(kv, action)?.to_string();
      let layer = resolve_layer_mut(document, &path)?;
      let target = resolve_draw_target_buffer(layer, kv)?;
      let method = kv.get("method").map(|s| s.to_ascii_lowercase()).unwrap_or_else(|| "sobel".to_string());
      let keep_alpha = opt_bool(kv, "keep_alpha", true)?;
      match method.as_str() {
        "sobel" => effects::sobel(target, keep_alpha),
        "canny" => {
          let low = opt_int(kv, "low", 40)?;
          let high = opt_int(kv, "high", 90)?;
          effects::canny(target, low as i32, high as i32, keep_alpha);
        }
        other => return Err(OpError::Message(format!("edge-detect method must be sobel or canny, got: {other}"))),
      }
    }
    "morphology" => {
      let path = req_path(kv, action)?.to_string();
      let layer = resolve_layer_mut(document, &path)?;
      let target = resolve_draw_target_buffer(layer, kv)?;
      let op = match kv.get("op").map(|s| s.to_ascii_lowercase()).unwrap_or_else(|| "dilate".to_string()).as_str() {
        "dilate" => MorphologyOp::Dilate,
        "erode" => MorphologyOp::Erode,
        other => return Err(OpError::Message(format!("morphology op must be dilate or erode, got: {other}"))),
      };
      let radius = opt_int(kv, "radius", 1)?;
      let iterations = opt_int(kv, "iterations", 1)?;
      effects::morphology(target, op, radius, iterations.max(0) as u32);
    }
    "gamma" => {
      let path = req_path(kv, action)?.to_string();
      let layer = resolve_layer_mut(document, &path)?;
      let target = resolve_draw_target_buffer(layer, kv)?;
      let gamma = match kv.get("value") {
        Some(v) => parse_double_strict(v, "value")?,
        None => opt_double(kv, "gamma", 1.0)?,
      };
      effects::apply_gamma(target, gamma);
    }
    "levels" => {
      let path = req_path(kv, action)?.to_string();
      let layer = resolve_layer_mut(document, &path)?;
      let target = resolve_draw_target_buffer(layer, kv)?;
      let in_black = opt_int(kv, "in_black", 0)?;
      let in_white = opt_int(kv, "in_white", 255)?;
      let mid_gamma = opt_double(kv, "gamma", 1.0)?;
      let out_black = opt_int(kv, "out_black", 0)?;
      let out_white = opt_int(kv, "out_white", 255)?;
      effects::apply_levels(target, in_black as i32, in_white as i32, mid_gamma, out_black as i32, out_white as i32);
    }
    "curves" => {
      let path = req_path(kv, action)?.to_string();
      let layer = resolve_layer_mut(document, &path)?;
      let target = resolve_draw_target_buffer(layer, kv)?;
      let default_points: Vec<CurvePoint> = vec![(0, 0), (255, 255)];
      let rgb_points = match kv.get("rgb") {
        Some(spec) => parse_curve_points(spec)?,
        None => default_points,
      };
      let rgb_lut = effects::build_curve_lut(&rgb_points);
      let r_lut = kv.get("r").map(|spec| parse_curve_points(spec)).transpose()?.map(|p| effects::build_curve_lut(&p));
      let g_lut = kv.get("g").map(|spec| parse_curve_points(spec)).transpose()?.map(|p| effects::build_curve_lut(&p));
      let b_lut = kv.get("b").map(|spec| parse_curve_points(spec)).transpose()?.map(|p| effects::build_curve_lut(&p));
      effects::apply_curves(target, &rgb_lut, r_lut.as_ref(), g_lut.as_ref(), b_lut.as_ref());
    }
    "fractal-noise" => {
      let path = req_path(kv, action)?.to_string();
      let layer = resolve_layer_mut(document, &path)?;
      let target = resolve_draw_target_buffer(layer, kv)?;
      let opts = crate::effects::FractalNoiseOptions {
        scale: opt_float(kv, "scale", 64.0)?,
        octaves: opt_int(kv, "octaves", 5)?.max(1) as u32,
        lacunarity: opt_float(kv, "lacunarity", 2.0)?,
        gain: opt_float(kv, "gain", 0.5)?,
        amount: opt_float(kv, "amount", 0.2)?,
        seed: opt_int(kv, "seed", 1337)? as u32,
        monochrome: opt_bool(kv, "monochrome", true)?,
      };
      effects::fractal_noise(target, opts);
    }
    "hatch" => {
      let path = req_path(kv, action)?.to_string();
      let layer = resolve_layer_mut(document, &path)?;
      let target = resolve_draw_target_buffer(layer, kv)?;
      let opts = crate::effects::HatchOptions {
        spacing: opt_int(kv, "spacing", 8)?,
        line_width: opt_int(kv, "line_width", 1)?,
        ink: opt_rgba(kv, "ink", PixelRGBA8::new(28, 28, 28, 255))?,
        opacity: opt_float(kv, "opacity", 0.9)?,
        preserve_highlights: opt_bool(kv, "preserve_highlights", true)?,
      };
      effects::hatch(target, opts);
    }
    "pencil-strokes" => {
      let path = req_path(kv, action)?.to_string();
      let layer = resolve_layer_mut(document, &path)?;
      let target = resolve_draw_target_buffer(layer, kv)?;
      let opts = crate::effects::PencilStrokeOptions {
        spacing: opt_int(kv, "spacing", 8)?,
        length: opt_int(kv, "length", 14)?,
        thickness: opt_int(kv, "thickness", 1)?,
        angle_degrees: opt_double(kv, "angle", 28.0)?,
        angle_jitter_degrees: opt_double(kv, "angle_jitter", 26.0)?,
        position_jitter: opt_int(kv, "jitter", 2)?,
        ink: opt_rgba(kv, "ink", PixelRGBA8::new(26, 26, 26, 255))?,
        opacity: opt_float(kv, "opacity", 0.22)?,
        min_darkness: opt_float(kv, "min_darkness", 0.15)?,
        seed: opt_int(kv, "seed", 1337)? as u32,
      };
      effects::pencil_strokes(target, opts);
    }
    "replace-color" => {
      let path = req_path(kv, action)?.to_string();
      if !kv.contains_key("from") || !kv.contains_key("to") {
        return Err(missing_keys(action, &["path", "from", "to"]));
      }
      let from_color = parse_rgba(&kv["from"], true)?;
      let to_color = parse_rgba(&kv["to"], true)?;
      let tolerance = opt_double(kv, "tolerance", 36.0)?;
      let softness = opt_double(kv, "softness", 24.0)?;
      let preserve_luma = opt_bool(kv, "preserve_luma", true)?;
      let layer = resolve_layer_mut(document, &path)?;
      effects::apply_replace_color(layer.image_mut(), from_color, to_color, tolerance, softness, preserve_luma);
    }
    "channel-mix" => {
      let path = req_path(kv, action)?.to_string();
      let layer = resolve_layer_mut(document, &path)?;
      let matrix: ChannelMixMatrix = [
        opt_float(kv, "rr", 1.0)?,
        opt_float(kv, "rg", 0.0)?,
        opt_float(kv, "rb", 0.0)?,
        opt_float(kv, "gr", 0.0)?,
        opt_float(kv, "gg", 1.0)?,
        opt_float(kv, "gb", 0.0)?,
        opt_float(kv, "br", 0.0)?,
        opt_float(kv, "bg", 0.0)?,
        opt_float(kv, "bb", 1.0)?,
      ];
      let clamp_min = opt_float(kv, "min", 0.0)?;
      let clamp_max = opt_float(kv, "max", 255.0)?;
      effects::apply_channel_mix(layer.image_mut(), matrix, clamp_min, clamp_max);
    }
    _ => return Ok(false),
  }
  Ok(true)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::layer::Layer;
  use crate::pixel::PixelRGBA8;

  fn doc_with_layer() -> Document {
    let mut doc = Document::new(4, 4);
    let mut layer = Layer::new("l", 4, 4);
    layer.image_mut().fill(PixelRGBA8::opaque(200, 10, 10));
    doc.root_group_mut().add_layer(layer);
    doc
  }

  fn kv(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
  }

  #[test]
  fn apply_effect_grayscale_collapses_channels() {
    let mut doc = doc_with_layer();
    let handled = try_apply_effects_operation(&mut doc, "apply-effect", &kv(&[("path", "/0"), ("effect", "grayscale")])).unwrap();
    assert!(handled);
    let layer = super::super::resolve::resolve_layer(&doc, "/0").unwrap();
    let p = layer.image().get_pixel(0, 0).unwrap();
    assert_eq!(p.g, p.r);
  }

  #[test]
  fn gamma_requires_path() {
    let mut doc = doc_with_layer();
    assert!(try_apply_effects_operation(&mut doc, "gamma", &kv(&[])).is_err());
  }

  #[test]
  fn unknown_action_returns_false() {
    let mut doc = doc_with_layer();
    assert!(!try_apply_effects_operation(&mut doc, "add-layer", &kv(&[])).unwrap());
  }

  #[test]
  fn morphology_rejects_bad_op_name() {
    let mut doc = doc_with_layer();
    assert!(try_apply_effects_operation(&mut doc, "morphology", &kv(&[("path", "/0"), ("op", "bogus")])).is_err());
  }
}
