//! `draw-*` dispatch. Grounded on
//! `original_source/src/cli_ops_draw.cpp`'s `tryApplyDrawOperation`: one
//! arm per action, each pulling its own required `key=value`s and calling
//! straight into [`crate::raster2d`].

use super::error::{missing_keys, OpError};
use super::parse::{parse_byte, parse_double_strict, parse_draw_points, parse_int_strict, parse_rgba};
use super::resolve::{resolve_draw_target_buffer, resolve_layer_mut};
use crate::layer::Document;
use std::collections::HashMap;

fn req<'a>(kv: &'a HashMap<String, String>, key: &str, action: &str) -> Result<&'a str, OpError> {
  kv.get(key).map(String::as_str).ok_or_else(|| missing_keys(action, &[key]))
}

fn req_int(kv: &HashMap<String, String>, key: &str, action: &str) -> Result<i64, OpError> {
  parse_int_strict(req(kv, key, action)?, key)
}

fn req_double(kv: &HashMap<String, String>, key: &str, action: &str) -> Result<f64, OpError> {
  parse_double_strict(req(kv, key, action)?, key)
}

fn req_rgba(kv: &HashMap<String, String>, action: &str) -> Result<crate::pixel::PixelRGBA8, OpError> {
  parse_rgba(req(kv, "rgba", action)?, true)
}

/// Dispatches a `draw-*` action. Returns `Ok(false)` when `action` isn't a
/// drawing op (caller should keep trying other dispatch categories), and
/// `Ok(true)` once handled.
pub fn try_apply_draw_operation(document: &mut Document, action: &str, kv: &HashMap<String, String>) -> Result<bool, OpError> {
  use crate::raster2d;

  match action {
    "draw-fill" => {
      let path = req(kv, "path", action)?.to_string();
      let color = req_rgba(kv, action)?;
      let layer = resolve_layer_mut(document, &path)?;
      let buf = resolve_draw_target_buffer(layer, kv)?;
      raster2d::fill(buf, color);
    }
    "draw-line" => {
      let path = req(kv, "path", action)?.to_string();
      let (x0, y0, x1, y1) = (req_int(kv, "x0", action)?, req_int(kv, "y0", action)?, req_int(kv, "x1", action)?, req_int(kv, "y1", action)?);
      let color = req_rgba(kv, action)?;
      let layer = resolve_layer_mut(document, &path)?;
      let buf = resolve_draw_target_buffer(layer, kv)?;
      raster2d::line(buf, x0, y0, x1, y1, color);
    }
    "draw-rect" | "draw-fill-rect" => {
      let path = req(kv, "path", action)?.to_string();
      let (x, y, w, h) = (req_int(kv, "x", action)?, req_int(kv, "y", action)?, req_int(kv, "width", action)?, req_int(kv, "height", action)?);
      let color = req_rgba(kv, action)?;
      let layer = resolve_layer_mut(document, &path)?;
      let buf = resolve_draw_target_buffer(layer, kv)?;
      if action == "draw-rect" {
        raster2d::rect(buf, x, y, w, h, color);
      } else {
        raster2d::fill_rect(buf, x, y, w, h, color);
      }
    }
    "draw-round-rect" | "draw-fill-round-rect" => {
      let path = req(kv, "path", action)?.to_string();
      let (x, y, w, h) = (req_int(kv, "x", action)?, req_int(kv, "y", action)?, req_int(kv, "width", action)?, req_int(kv, "height", action)?);
      let radius = req_int(kv, "radius", action)?;
      let color = req_rgba(kv, action)?;
      let layer = resolve_layer_mut(document, &path)?;
      let buf = resolve_draw_target_buffer(layer, kv)?;
      if action == "draw-round-rect" {
        raster2d::round_rect(buf, x, y, w, h, radius, color);
      } else {
        raster2d::fill_round_rect(buf, x, y, w, h, radius, color);
      }
    }
    "draw-ellipse" | "draw-fill-ellipse" => {
      let path = req(kv, "path", action)?.to_string();
      let (cx, cy, rx, ry) = (req_int(kv, "cx", action)?, req_int(kv, "cy", action)?, req_int(kv, "rx", action)?, req_int(kv, "ry", action)?);
      let color = req_rgba(kv, action)?;
      let layer = resolve_layer_mut(document, &path)?;
      let buf = resolve_draw_target_buffer(layer, kv)?;
      if action == "draw-ellipse" {
        raster2d::ellipse(buf, cx, cy, rx, ry, color);
      } else {
        raster2d::fill_ellipse(buf, cx, cy, rx, ry, color);
      }
    }
    "draw-polyline" => {
      let path = req(kv, "path", action)?.to_string();
      let points = parse_draw_points(req(kv, "points", action)?, 2, action)?;
      let color = req_rgba(kv, action)?;
      let layer = resolve_layer_mut(document, &path)?;
      let buf = resolve_draw_target_buffer(layer, kv)?;
      raster2d::polyline(buf, &points, color);
    }
    "draw-polygon" | "draw-fill-polygon" => {
      let path = req(kv, "path", action)?.to_string();
      let points = parse_draw_points(req(kv, "points", action)?, 3, action)?;
      let color = req_rgba(kv, action)?;
      let layer = resolve_layer_mut(document, &path)?;
      let buf = resolve_draw_target_buffer(layer, kv)?;
      if action == "draw-polygon" {
        raster2d::polygon(buf, &points, color);
      } else {
        raster2d::fill_polygon(buf, &points, color);
      }
    }
    "draw-flood-fill" => {
      let path = req(kv, "path", action)?.to_string();
      let (x, y) = (req_int(kv, "x", action)?, req_int(kv, "y", action)?);
      let color = req_rgba(kv, action)?;
      let tolerance = match kv.get("tolerance") {
        Some(v) => parse_byte(v, "tolerance")?,
        None => 0,
      };
      let layer = resolve_layer_mut(document, &path)?;
      let buf = resolve_draw_target_buffer(layer, kv)?;
      raster2d::flood_fill(buf, x, y, color, tolerance);
    }
    "draw-circle" | "draw-fill-circle" => {
      let path = req(kv, "path", action)?.to_string();
      let (cx, cy, radius) = (req_int(kv, "cx", action)?, req_int(kv, "cy", action)?, req_int(kv, "radius", action)?);
      let color = req_rgba(kv, action)?;
      let layer = resolve_layer_mut(document, &path)?;
      let buf = resolve_draw_target_buffer(layer, kv)?;
      if action == "draw-circle" {
        raster2d::circle(buf, cx, cy, radius, color);
      } else {
        raster2d::fill_circle(buf, cx, cy, radius, color);
      }
    }
    "draw-arc" => {
      let path = req(kv, "path", action)?.to_string();
      let (cx, cy, radius) = (req_int(kv, "cx", action)?, req_int(kv, "cy", action)?, req_int(kv, "radius", action)?);
      let color = req_rgba(kv, action)?;
      let (start, end) = if let (Some(s), Some(e)) = (kv.get("start_rad"), kv.get("end_rad")) {
        (parse_double_strict(s, "start_rad")?, parse_double_strict(e, "end_rad")?)
      } else {
        let s = req_double(kv, "start_deg", action)?;
        let e = req_double(kv, "end_deg", action)?;
        (s.to_radians(), e.to_radians())
      };
      let ccw = match kv.get("counterclockwise") {
        Some(v) => super::parse::parse_bool_flag(v)?,
        None => false,
      };
      let layer = resolve_layer_mut(document, &path)?;
      let buf = resolve_draw_target_buffer(layer, kv)?;
      raster2d::arc(buf, cx, cy, radius, start, end, color, ccw);
    }
    "draw-quadratic-bezier" => {
      let path = req(kv, "path", action)?.to_string();
      let p0 = (req_double(kv, "x0", action)?, req_double(kv, "y0", action)?);
      let control = (req_double(kv, "cx", action)?, req_double(kv, "cy", action)?);
      let p1 = (req_double(kv, "x1", action)?, req_double(kv, "y1", action)?);
      let color = req_rgba(kv, action)?;
      let layer = resolve_layer_mut(document, &path)?;
      let buf = resolve_draw_target_buffer(layer, kv)?;
      raster2d::quadratic_bezier(buf, p0, control, p1, color);
    }
    "draw-bezier" => {
      let path = req(kv, "path", action)?.to_string();
      let p0 = (req_double(kv, "x0", action)?, req_double(kv, "y0", action)?);
      let c1 = (req_double(kv, "cx1", action)?, req_double(kv, "cy1", action)?);
      let c2 = (req_double(kv, "cx2", action)?, req_double(kv, "cy2", action)?);
      let p1 = (req_double(kv, "x1", action)?, req_double(kv, "y1", action)?);
      let color = req_rgba(kv, action)?;
      let layer = resolve_layer_mut(document, &path)?;
      let buf = resolve_draw_target_buffer(layer, kv)?;
      raster2d::cubic_bezier(buf, p0, c1, c2, p1, color);
    }
    _ => return Ok(false),
  }
  Ok(true)
}
