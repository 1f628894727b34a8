//! 2D rasterizer primitives: lines, rects, circles, ellipses, polygons,
//! Bezier strokes, flood fill (spec.md §4.7). Every primitive draws
//! directly into an [`ImageBuffer`] by overwriting pixels (not blending) —
//! matching `original_source/src/cli_ops_draw.cpp`'s `BufferImageView`,
//! which always forces the drawn alpha onto the destination rather than
//! compositing through it. Grounded on
//! `original_source/src/drawable.h`/`cli_ops_draw.cpp`'s method set,
//! translated from the `Drawable`-over-abstract-`Image` design to free
//! functions over a concrete [`ImageBuffer`] since this crate has no
//! equivalent of the C++ `Image` interface to preserve.

use crate::pixel::PixelRGBA8;
use crate::surface::ImageBuffer;
use std::f64::consts::PI;

pub fn fill(surface: &mut ImageBuffer, color: PixelRGBA8) {
  surface.fill(color);
}

/// Bresenham's line algorithm.
pub fn line(surface: &mut ImageBuffer, x0: i64, y0: i64, x1: i64, y1: i64, color: PixelRGBA8) {
  let dx = (x1 - x0).abs();
  let dy = -(y1 - y0).abs();
  let sx = if x0 < x1 { 1 } else { -1 };
  let sy = if y0 < y1 { 1 } else { -1 };
  let mut err = dx + dy;
  let (mut x, mut y) = (x0, y0);
  loop {
    surface.set_pixel(x, y, color);
    if x == x1 && y == y1 {
      break;
    }
    let e2 = 2 * err;
    if e2 >= dy {
      err += dy;
      x += sx;
    }
    if e2 <= dx {
      err += dx;
      y += sy;
    }
  }
}

pub fn rect(surface: &mut ImageBuffer, x: i64, y: i64, width: i64, height: i64, color: PixelRGBA8) {
  if width <= 0 || height <= 0 {
    return;
  }
  line(surface, x, y, x + width - 1, y, color);
  line(surface, x, y + height - 1, x + width - 1, y + height - 1, color);
  line(surface, x, y, x, y + height - 1, color);
  line(surface, x + width - 1, y, x + width - 1, y + height - 1, color);
}

pub fn fill_rect(surface: &mut ImageBuffer, x: i64, y: i64, width: i64, height: i64, color: PixelRGBA8) {
  for row in y..y + height {
    for col in x..x + width {
      surface.set_pixel(col, row, color);
    }
  }
}

fn round_rect_corner_mask(width: i64, height: i64, radius: i64, local_x: i64, local_y: i64) -> bool {
  let r = radius.min(width / 2).min(height / 2);
  if r <= 0 {
    return true;
  }
  let (cx, cy) = if local_x < r && local_y < r {
    (r, r)
  } else if local_x >= width - r && local_y < r {
    (width - r - 1, r)
  } else if local_x < r && local_y >= height - r {
    (r, height - r - 1)
  } else if local_x >= width - r && local_y >= height - r {
    (width - r - 1, height - r - 1)
  } else {
    return true;
  };
  let dx = local_x - cx;
  let dy = local_y - cy;
  dx * dx + dy * dy <= r * r
}

pub fn round_rect(surface: &mut ImageBuffer, x: i64, y: i64, width: i64, height: i64, radius: i64, color: PixelRGBA8) {
  if width <= 0 || height <= 0 {
    return;
  }
  for local_x in 0..width {
    for local_y in [0i64, height - 1] {
      if round_rect_corner_mask(width, height, radius, local_x, local_y) {
        surface.set_pixel(x + local_x, y + local_y, color);
      }
    }
  }
  for local_y in 0..height {
    for local_x in [0i64, width - 1] {
      if round_rect_corner_mask(width, height, radius, local_x, local_y) {
        surface.set_pixel(x + local_x, y + local_y, color);
      }
    }
  }
}

pub fn fill_round_rect(surface: &mut ImageBuffer, x: i64, y: i64, width: i64, height: i64, radius: i64, color: PixelRGBA8) {
  if width <= 0 || height <= 0 {
    return;
  }
  for local_y in 0..height {
    for local_x in 0..width {
      if round_rect_corner_mask(width, height, radius, local_x, local_y) {
        surface.set_pixel(x + local_x, y + local_y, color);
      }
    }
  }
}

fn plot_circle_octants(surface: &mut ImageBuffer, cx: i64, cy: i64, x: i64, y: i64, color: PixelRGBA8) {
  surface.set_pixel(cx + x, cy + y, color);
  surface.set_pixel(cx - x, cy + y, color);
  surface.set_pixel(cx + x, cy - y, color);
  surface.set_pixel(cx - x, cy - y, color);
  surface.set_pixel(cx + y, cy + x, color);
  surface.set_pixel(cx - y, cy + x, color);
  surface.set_pixel(cx + y, cy - x, color);
  surface.set_pixel(cx - y, cy - x, color);
}

/// Midpoint circle algorithm.
pub fn circle(surface: &mut ImageBuffer, cx: i64, cy: i64, radius: i64, color: PixelRGBA8) {
  if radius < 0 {
    return;
  }
  let mut x = radius;
  let mut y = 0i64;
  let mut err = 1 - radius;
  while x >= y {
    plot_circle_octants(surface, cx, cy, x, y, color);
    y += 1;
    if err < 0 {
      err += 2 * y + 1;
    } else {
      x -= 1;
      err += 2 * (y - x) + 1;
    }
  }
}

pub fn fill_circle(surface: &mut ImageBuffer, cx: i64, cy: i64, radius: i64, color: PixelRGBA8) {
  if radius < 0 {
    return;
  }
  for dy in -radius..=radius {
    let span = ((radius * radius - dy * dy) as f64).sqrt() as i64;
    for dx in -span..=span {
      surface.set_pixel(cx + dx, cy + dy, color);
    }
  }
}

pub fn ellipse(surface: &mut ImageBuffer, cx: i64, cy: i64, rx: i64, ry: i64, color: PixelRGBA8) {
  if rx <= 0 || ry <= 0 {
    return;
  }
  let steps = (4 * (rx.max(ry))).max(32);
  for i in 0..steps {
    let t = 2.0 * PI * i as f64 / steps as f64;
    let x = cx + (rx as f64 * t.cos()).round() as i64;
    let y = cy + (ry as f64 * t.sin()).round() as i64;
    surface.set_pixel(x, y, color);
  }
}

pub fn fill_ellipse(surface: &mut ImageBuffer, cx: i64, cy: i64, rx: i64, ry: i64, color: PixelRGBA8) {
  if rx <= 0 || ry <= 0 {
    return;
  }
  for dy in -ry..=ry {
    let t = 1.0 - (dy as f64 * dy as f64) / (ry as f64 * ry as f64);
    if t < 0.0 {
      continue;
    }
    let span = (rx as f64 * t.sqrt()).round() as i64;
    for dx in -span..=span {
      surface.set_pixel(cx + dx, cy + dy, color);
    }
  }
}

pub fn polyline(surface: &mut ImageBuffer, points: &[(i64, i64)], color: PixelRGBA8) {
  for pair in points.windows(2) {
    line(surface, pair[0].0, pair[0].1, pair[1].0, pair[1].1, color);
  }
}

pub fn polygon(surface: &mut ImageBuffer, points: &[(i64, i64)], color: PixelRGBA8) {
  polyline(surface, points, color);
  if let (Some(&first), Some(&last)) = (points.first(), points.last()) {
    line(surface, last.0, last.1, first.0, first.1, color);
  }
}

/// Scanline polygon fill. Samples at `y + 0.5` and uses half-open Y
/// extents so a vertex sitting exactly on a scanline isn't counted by both
/// edges that meet there (spec.md §9's numeric-stability note).
pub fn fill_polygon(surface: &mut ImageBuffer, points: &[(i64, i64)], color: PixelRGBA8) {
  if points.len() < 3 {
    return;
  }
  let y_min = points.iter().map(|p| p.1).min().unwrap();
  let y_max = points.iter().map(|p| p.1).max().unwrap();

  for y in y_min..=y_max {
    let sample_y = y as f64 + 0.5;
    let mut crossings = Vec::new();
    for i in 0..points.len() {
      let (x0, y0) = points[i];
      let (x1, y1) = points[(i + 1) % points.len()];
      let (y0, y1) = (y0 as f64, y1 as f64);
      // Half-open [y0, y1) extent test handles the shared-vertex case.
      if (y0 <= sample_y && sample_y < y1) || (y1 <= sample_y && sample_y < y0) {
        let t = (sample_y - y0) / (y1 - y0);
        let x = x0 as f64 + t * (x1 as f64 - x0 as f64);
        crossings.push(x);
      }
    }
    crossings.sort_by(|a, b| a.partial_cmp(b).unwrap());
    for pair in crossings.chunks(2) {
      if pair.len() < 2 {
        continue;
      }
      let start = pair[0].ceil() as i64;
      let end = pair[1].floor() as i64;
      for x in start..=end {
        surface.set_pixel(x, y, color);
      }
    }
  }
}

/// 4-connected flood fill with chebyshev-distance tolerance against the
/// seed pixel's color.
pub fn flood_fill(surface: &mut ImageBuffer, x: i64, y: i64, color: PixelRGBA8, tolerance: u8) {
  let Ok(seed) = surface.get_pixel(x, y) else { return };
  if seed == color {
    return;
  }
  let mut stack = vec![(x, y)];
  let mut visited = std::collections::HashSet::new();
  while let Some((cx, cy)) = stack.pop() {
    if !visited.insert((cx, cy)) {
      continue;
    }
    let Ok(current) = surface.get_pixel(cx, cy) else { continue };
    if current.chebyshev_distance(seed) > tolerance {
      continue;
    }
    surface.set_pixel(cx, cy, color);
    stack.push((cx + 1, cy));
    stack.push((cx - 1, cy));
    stack.push((cx, cy + 1));
    stack.push((cx, cy - 1));
  }
}

/// Strokes an arc between `start_radians` and `end_radians`. `counterclockwise`
/// sweeps the opposite direction when the two angles could be interpreted
/// either way.
pub fn arc(
  surface: &mut ImageBuffer,
  cx: i64,
  cy: i64,
  radius: i64,
  start_radians: f64,
  end_radians: f64,
  color: PixelRGBA8,
  counterclockwise: bool,
) {
  if radius < 0 {
    return;
  }
  // spec.md §4.7: "if end<start, swap" — the documented default draws the
  // short arc between the two angles, not the complementary long way round.
  let (start_radians, end_radians) = if end_radians < start_radians { (end_radians, start_radians) } else { (start_radians, end_radians) };
  let mut sweep = end_radians - start_radians;
  if counterclockwise && sweep > 0.0 {
    sweep -= 2.0 * PI;
  }
  let steps = ((radius.max(1) as f64 * sweep.abs()) as i64).max(8);
  for i in 0..=steps {
    let t = start_radians + sweep * (i as f64 / steps as f64);
    let x = cx + (radius as f64 * t.cos()).round() as i64;
    let y = cy + (radius as f64 * t.sin()).round() as i64;
    surface.set_pixel(x, y, color);
  }
}

fn flatten_quadratic(p0: (f64, f64), control: (f64, f64), p1: (f64, f64), steps: usize, out: &mut Vec<(i64, i64)>) {
  for i in 0..=steps {
    let t = i as f64 / steps as f64;
    let mt = 1.0 - t;
    let x = mt * mt * p0.0 + 2.0 * mt * t * control.0 + t * t * p1.0;
    let y = mt * mt * p0.1 + 2.0 * mt * t * control.1 + t * t * p1.1;
    out.push((x.round() as i64, y.round() as i64));
  }
}

fn flatten_cubic(p0: (f64, f64), c1: (f64, f64), c2: (f64, f64), p1: (f64, f64), steps: usize, out: &mut Vec<(i64, i64)>) {
  for i in 0..=steps {
    let t = i as f64 / steps as f64;
    let mt = 1.0 - t;
    let x = mt * mt * mt * p0.0 + 3.0 * mt * mt * t * c1.0 + 3.0 * mt * t * t * c2.0 + t * t * t * p1.0;
    let y = mt * mt * mt * p0.1 + 3.0 * mt * mt * t * c1.1 + 3.0 * mt * t * t * c2.1 + t * t * t * p1.1;
    out.push((x.round() as i64, y.round() as i64));
  }
}

const BEZIER_FLATTEN_STEPS: usize = 64;

pub fn quadratic_bezier(
  surface: &mut ImageBuffer,
  p0: (f64, f64),
  control: (f64, f64),
  p1: (f64, f64),
  color: PixelRGBA8,
) {
  let mut points = Vec::with_capacity(BEZIER_FLATTEN_STEPS + 1);
  flatten_quadratic(p0, control, p1, BEZIER_FLATTEN_STEPS, &mut points);
  polyline(surface, &points, color);
}

pub fn cubic_bezier(
  surface: &mut ImageBuffer,
  p0: (f64, f64),
  c1: (f64, f64),
  c2: (f64, f64),
  p1: (f64, f64),
  color: PixelRGBA8,
) {
  let mut points = Vec::with_capacity(BEZIER_FLATTEN_STEPS + 1);
  flatten_cubic(p0, c1, c2, p1, BEZIER_FLATTEN_STEPS, &mut points);
  polyline(surface, &points, color);
}

#[cfg(test)]
mod tests {
  use super::*;

  fn blank(w: u32, h: u32) -> ImageBuffer {
    ImageBuffer::new(w, h).unwrap()
  }

  #[test]
  fn line_draws_endpoints() {
    let mut surf = blank(10, 10);
    line(&mut surf, 0, 0, 5, 5, PixelRGBA8::OPAQUE_BLACK);
    assert_eq!(surf.get_pixel(0, 0).unwrap(), PixelRGBA8::OPAQUE_BLACK);
    assert_eq!(surf.get_pixel(5, 5).unwrap(), PixelRGBA8::OPAQUE_BLACK);
  }

  #[test]
  fn fill_rect_covers_exact_region() {
    let mut surf = blank(10, 10);
    fill_rect(&mut surf, 2, 2, 3, 3, PixelRGBA8::OPAQUE_BLACK);
    assert_eq!(surf.get_pixel(2, 2).unwrap(), PixelRGBA8::OPAQUE_BLACK);
    assert_eq!(surf.get_pixel(4, 4).unwrap(), PixelRGBA8::OPAQUE_BLACK);
    assert_eq!(surf.get_pixel(5, 5).unwrap(), PixelRGBA8::TRANSPARENT);
  }

  #[test]
  fn fill_circle_covers_center_and_not_far_corner() {
    let mut surf = blank(20, 20);
    fill_circle(&mut surf, 10, 10, 5, PixelRGBA8::OPAQUE_BLACK);
    assert_eq!(surf.get_pixel(10, 10).unwrap(), PixelRGBA8::OPAQUE_BLACK);
    assert_eq!(surf.get_pixel(0, 0).unwrap(), PixelRGBA8::TRANSPARENT);
  }

  #[test]
  fn fill_polygon_fills_a_triangle_interior() {
    let mut surf = blank(10, 10);
    fill_polygon(&mut surf, &[(1, 1), (8, 1), (1, 8)], PixelRGBA8::OPAQUE_BLACK);
    assert_eq!(surf.get_pixel(2, 2).unwrap(), PixelRGBA8::OPAQUE_BLACK);
    assert_eq!(surf.get_pixel(8, 8).unwrap(), PixelRGBA8::TRANSPARENT);
  }

  #[test]
  fn flood_fill_stays_within_tolerance_region() {
    let mut surf = blank(5, 5);
    fill_rect(&mut surf, 0, 0, 5, 5, PixelRGBA8::OPAQUE_WHITE);
    surf.set_pixel(4, 4, PixelRGBA8::OPAQUE_BLACK);
    flood_fill(&mut surf, 0, 0, PixelRGBA8::new(255, 0, 0, 255), 0);
    assert_eq!(surf.get_pixel(0, 0).unwrap(), PixelRGBA8::new(255, 0, 0, 255));
    assert_eq!(surf.get_pixel(4, 4).unwrap(), PixelRGBA8::OPAQUE_BLACK);
  }

  #[test]
  fn quadratic_bezier_passes_near_endpoints() {
    let mut surf = blank(20, 20);
    quadratic_bezier(&mut surf, (0.0, 0.0), (10.0, 0.0), (19.0, 19.0), PixelRGBA8::OPAQUE_BLACK);
    assert_eq!(surf.get_pixel(0, 0).unwrap(), PixelRGBA8::OPAQUE_BLACK);
    assert_eq!(surf.get_pixel(19, 19).unwrap(), PixelRGBA8::OPAQUE_BLACK);
  }
}
