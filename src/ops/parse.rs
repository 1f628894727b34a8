//! Tokenizing and scalar parsing for operation specs. Grounded on
//! `original_source/src/cli_parse.cpp`, translated call-for-call:
//! `tokenizeOpSpec` becomes [`tokenize_op_spec`], `splitByChar`/
//! `splitNonEmptyByChar` become the iterator-based splits inlined at their
//! call sites, and the strict numeric parsers keep the same "reject trailing
//! garbage" behavior `std::stoll`/`std::stod`'s `parsed-length` check gave
//! the original.

use super::error::OpError;
use crate::pixel::PixelRGBA8;
use std::collections::HashMap;

/// Splits `text` into whitespace-delimited tokens, honoring `'`/`"` quoting
/// and `\`-escaping of the following character.
pub fn tokenize_op_spec(text: &str) -> Result<Vec<String>, OpError> {
  let mut tokens = Vec::new();
  let mut current = String::new();
  let mut quote: Option<char> = None;
  let mut escaping = false;

  for ch in text.chars() {
    if escaping {
      current.push(ch);
      escaping = false;
      continue;
    }
    if ch == '\\' {
      escaping = true;
      continue;
    }
    if let Some(q) = quote {
      if ch == q {
        quote = None;
      } else {
        current.push(ch);
      }
      continue;
    }
    if ch == '"' || ch == '\'' {
      quote = Some(ch);
      continue;
    }
    if ch.is_whitespace() {
      if !current.is_empty() {
        tokens.push(std::mem::take(&mut current));
      }
      continue;
    }
    current.push(ch);
  }

  if escaping {
    return Err(OpError::TrailingEscape);
  }
  if quote.is_some() {
    return Err(OpError::UnterminatedQuote);
  }
  if !current.is_empty() {
    tokens.push(current);
  }
  Ok(tokens)
}

/// Builds the `key=value` map from every token after the action name.
pub fn parse_key_values(tokens: &[String]) -> Result<HashMap<String, String>, OpError> {
  let mut kv = HashMap::new();
  for tok in tokens {
    match tok.find('=') {
      Some(0) | None => return Err(OpError::MalformedKeyValue(tok.clone())),
      Some(split) if split + 1 >= tok.len() => return Err(OpError::MalformedKeyValue(tok.clone())),
      Some(split) => {
        kv.insert(tok[..split].to_string(), tok[split + 1..].to_string());
      }
    }
  }
  Ok(kv)
}

fn split_by_char(text: &str, delimiter: char) -> Vec<&str> {
  text.split(delimiter).collect()
}

fn split_nonempty_by_char(text: &str, delimiter: char) -> Vec<&str> {
  text.split(delimiter).filter(|s| !s.is_empty()).collect()
}

pub fn parse_int_strict(text: &str, field: &str) -> Result<i64, OpError> {
  text.trim().parse::<i64>().map_err(|_| OpError::Message(format!("Invalid integer for {field}: {text}")))
}

pub fn parse_int_in_range(text: &str, field: &str, min: i64, max: i64) -> Result<i64, OpError> {
  let value = parse_int_strict(text, field)?;
  if value < min || value > max {
    return Err(OpError::Message(format!("Value out of range for {field}: {text} (expected {min}..{max})")));
  }
  Ok(value)
}

pub fn parse_double_strict(text: &str, field: &str) -> Result<f64, OpError> {
  text.trim().parse::<f64>().map_err(|_| OpError::Message(format!("Invalid number for {field}: {text}")))
}

pub fn parse_byte(text: &str, field: &str) -> Result<u8, OpError> {
  Ok(parse_int_in_range(text, field, 0, 255)? as u8)
}

pub fn parse_bool_flag(value: &str) -> Result<bool, OpError> {
  match value.to_ascii_lowercase().as_str() {
    "1" | "true" | "yes" | "on" => Ok(true),
    "0" | "false" | "no" | "off" => Ok(false),
    _ => Err(OpError::Message(format!("Invalid boolean value: {value}"))),
  }
}

pub fn parse_int_pair(text: &str) -> Result<(i64, i64), OpError> {
  let parts = split_by_char(text, ',');
  if parts.len() != 2 {
    return Err(OpError::Message(format!("Expected integer pair x,y but got: {text}")));
  }
  Ok((parse_int_strict(parts[0], "x")?, parse_int_strict(parts[1], "y")?))
}

pub fn parse_double_pair(text: &str) -> Result<(f64, f64), OpError> {
  let parts = split_by_char(text, ',');
  if parts.len() != 2 {
    return Err(OpError::Message(format!("Expected numeric pair x,y but got: {text}")));
  }
  Ok((parse_double_strict(parts[0], "x")?, parse_double_strict(parts[1], "y")?))
}

/// `x0,y0;x1,y1;...`, at least `min_points` long.
pub fn parse_draw_points(text: &str, min_points: usize, action: &str) -> Result<Vec<(i64, i64)>, OpError> {
  let points: Result<Vec<_>, _> = split_nonempty_by_char(text, ';').into_iter().map(parse_int_pair).collect();
  let points = points?;
  if points.len() < min_points {
    return Err(OpError::Message(format!("{action} requires at least {min_points} points in points=x0,y0;x1,y1;...")));
  }
  Ok(points)
}

/// `r,g,b,a`, or `r,g,b` (implied `a=255`) when `allow_rgb` is set.
pub fn parse_rgba(text: &str, allow_rgb: bool) -> Result<PixelRGBA8, OpError> {
  let parts = split_by_char(text, ',');
  if parts.len() == 3 && allow_rgb {
    return Ok(PixelRGBA8::new(parse_byte(parts[0], "r")?, parse_byte(parts[1], "g")?, parse_byte(parts[2], "b")?, 255));
  }
  if parts.len() != 4 {
    return Err(OpError::Message(format!("Expected rgba=r,g,b,a but got: {text}")));
  }
  Ok(PixelRGBA8::new(parse_byte(parts[0], "r")?, parse_byte(parts[1], "g")?, parse_byte(parts[2], "b")?, parse_byte(parts[3], "a")?))
}

/// `x_in,y_out;x_in,y_out;...`, clamped to `[0,255]`, sorted ascending by
/// `x_in`, at least 2 points (spec.md §4.9's curves requirement).
pub fn parse_curve_points(text: &str) -> Result<Vec<(u8, u8)>, OpError> {
  let mut points = Vec::new();
  for tok in split_nonempty_by_char(text, ';') {
    let (x, y) = parse_int_pair(tok)?;
    points.push((x.clamp(0, 255) as u8, y.clamp(0, 255) as u8));
  }
  if points.len() < 2 {
    return Err(OpError::Message("curve requires at least 2 points".to_string()));
  }
  points.sort_by_key(|p| p.0);
  Ok(points)
}

pub fn parse_blend_mode(value: &str) -> Result<crate::layer::BlendMode, OpError> {
  use crate::layer::BlendMode;
  match value.to_ascii_lowercase().as_str() {
    "normal" => Ok(BlendMode::Normal),
    "multiply" => Ok(BlendMode::Multiply),
    "screen" => Ok(BlendMode::Screen),
    "overlay" => Ok(BlendMode::Overlay),
    "darken" => Ok(BlendMode::Darken),
    "lighten" => Ok(BlendMode::Lighten),
    "add" => Ok(BlendMode::Add),
    "subtract" => Ok(BlendMode::Subtract),
    "difference" => Ok(BlendMode::Difference),
    "color-dodge" | "colordodge" => Ok(BlendMode::ColorDodge),
    other => Err(OpError::Message(format!("Unsupported blend mode: {other}"))),
  }
}

pub fn parse_resize_filter(value: &str) -> Result<crate::resample::ResizeFilter, OpError> {
  use crate::resample::ResizeFilter;
  match value.to_ascii_lowercase().as_str() {
    "nearest" => Ok(ResizeFilter::Nearest),
    "bilinear" => Ok(ResizeFilter::Bilinear),
    "box" | "boxaverage" | "box_average" => Ok(ResizeFilter::BoxAverage),
    other => Err(OpError::Message(format!("Unsupported resize filter: {other}"))),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn tokenizer_splits_on_whitespace() {
    let tokens = tokenize_op_spec("add-layer name=Bg width=4").unwrap();
    assert_eq!(tokens, vec!["add-layer", "name=Bg", "width=4"]);
  }

  #[test]
  fn tokenizer_honors_quoting_and_escapes() {
    let tokens = tokenize_op_spec(r#"add-layer name="My Layer" note=a\ b"#).unwrap();
    assert_eq!(tokens, vec!["add-layer", "name=My Layer", "note=a b"]);
  }

  #[test]
  fn tokenizer_rejects_unterminated_quote() {
    assert!(matches!(tokenize_op_spec("name=\"oops"), Err(OpError::UnterminatedQuote)));
  }

  #[test]
  fn tokenizer_rejects_trailing_escape() {
    assert!(matches!(tokenize_op_spec("name=oops\\"), Err(OpError::TrailingEscape)));
  }

  #[test]
  fn key_values_reject_non_kv_tokens() {
    let tokens = vec!["bogus".to_string()];
    assert!(parse_key_values(&tokens).is_err());
  }

  #[test]
  fn rgba_accepts_implied_alpha() {
    assert_eq!(parse_rgba("10,20,30", true).unwrap(), PixelRGBA8::new(10, 20, 30, 255));
    assert!(parse_rgba("10,20,30", false).is_err());
  }

  #[test]
  fn draw_points_enforces_minimum() {
    assert!(parse_draw_points("1,1;2,2", 3, "draw-polygon").is_err());
    assert_eq!(parse_draw_points("1,1;2,2;3,3", 3, "draw-polygon").unwrap(), vec![(1, 1), (2, 2), (3, 3)]);
  }

  #[test]
  fn curve_points_sort_ascending() {
    let points = parse_curve_points("255,0;0,255").unwrap();
    assert_eq!(points, vec![(0, 255), (255, 0)]);
  }
}
