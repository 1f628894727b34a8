//! `set-transform`/`concat-transform`/`clear-transform`. Grounded on
//! `original_source/src/cli_ops.cpp`'s `buildTransformFromKV` and the
//! `applyOperation` cases that call it.

use super::error::OpError;
use super::parse::parse_double_strict;
use crate::transform::Transform2D;
use std::collections::HashMap;

fn pivot(kv: &HashMap<String, String>) -> Result<(f64, f64), OpError> {
  match kv.get("pivot") {
    Some(spec) => super::parse::parse_double_pair(spec),
    None => Ok((0.0, 0.0)),
  }
}

/// Builds a transform from `matrix=a,b,c,d,tx,ty`, or from any combination
/// of `translate=`/`scale=`/`skew=`/`rotate=` composed about an optional
/// `pivot=` (in that order — translate, then scale, then skew, then
/// rotate), matching `buildTransformFromKV`.
pub fn build_transform_from_kv(kv: &HashMap<String, String>) -> Result<Transform2D, OpError> {
  if let Some(spec) = kv.get("matrix") {
    let parts: Vec<&str> = spec.split(',').collect();
    if parts.len() != 6 {
      return Err(OpError::Message(format!("matrix= requires 6 comma-separated values but got: {spec}")));
    }
    let mut values = [0.0f64; 6];
    for (i, part) in parts.iter().enumerate() {
      values[i] = parse_double_strict(part, "matrix")?;
    }
    return Ok(Transform2D::from_matrix(values[0], values[1], values[2], values[3], values[4], values[5]));
  }

  let (px, py) = pivot(kv)?;
  let mut t = Transform2D::identity();

  if let Some(spec) = kv.get("translate") {
    let (dx, dy) = super::parse::parse_double_pair(spec)?;
    t.translate(dx, dy);
  }
  if let Some(spec) = kv.get("scale") {
    let (sx, sy) = super::parse::parse_double_pair(spec)?;
    t.scale(sx, sy, px, py);
  }
  if let Some(spec) = kv.get("skew") {
    let (shx, shy) = super::parse::parse_double_pair(spec)?;
    t.shear(shx, shy, px, py);
  }
  if let Some(spec) = kv.get("rotate") {
    let degrees = parse_double_strict(spec, "rotate")?;
    t.rotate_degrees(degrees, px, py);
  }
  Ok(t)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn kv(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
  }

  #[test]
  fn matrix_overrides_everything_else() {
    let t = build_transform_from_kv(&kv(&[("matrix", "1,0,0,1,5,6"), ("translate", "100,100")])).unwrap();
    assert_eq!(t.apply(0.0, 0.0), (5.0, 6.0));
  }

  #[test]
  fn translate_alone() {
    let t = build_transform_from_kv(&kv(&[("translate", "3,4")])).unwrap();
    assert_eq!(t.apply(0.0, 0.0), (3.0, 4.0));
  }

  #[test]
  fn rotate_about_pivot_keeps_pivot_fixed() {
    let t = build_transform_from_kv(&kv(&[("rotate", "90"), ("pivot", "5,5")])).unwrap();
    let (x, y) = t.apply(5.0, 5.0);
    assert!((x - 5.0).abs() < 1e-9);
    assert!((y - 5.0).abs() < 1e-9);
  }

  #[test]
  fn malformed_matrix_is_rejected() {
    assert!(build_transform_from_kv(&kv(&[("matrix", "1,2,3")])).is_err());
  }
}
