//! The layered document model: [`Layer`], [`LayerGroup`], and the
//! [`Document`] tree that owns them (spec.md §3/§4.8). Grounded on
//! `original_source/src/layer.h`, collapsed from its `LayerNode` tagged
//! union (a `Kind` enum plus a `Layer` value and an `Option<Box<LayerGroup>>`
//! in the C++) into a plain Rust enum, which makes the "layer or group"
//! distinction exhaustive-matchable instead of runtime-checked.

use crate::pixel::PixelRGBA8;
use crate::surface::ImageBuffer;
use crate::transform::Transform2D;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendMode {
  Normal,
  Multiply,
  Screen,
  Overlay,
  Darken,
  Lighten,
  Add,
  Subtract,
  Difference,
  /// Some legacy pipelines treat this as an alias for `Normal` rather than
  /// implementing the dodge formula; this crate implements the real
  /// formula (see [`crate::compositor`]) per the canonical choice recorded
  /// in DESIGN.md.
  ColorDodge,
}

/// A single raster layer: an image, an optional same-size mask, and the
/// placement/appearance state the compositor reads.
#[derive(Debug, Clone)]
pub struct Layer {
  name: String,
  visible: bool,
  opacity: f32,
  blend_mode: BlendMode,
  offset: (i64, i64),
  transform: Transform2D,
  image: ImageBuffer,
  mask: Option<ImageBuffer>,
}

impl Layer {
  #[must_use]
  pub fn new(name: impl Into<String>, width: u32, height: u32) -> Self {
    Self::filled(name, width, height, PixelRGBA8::TRANSPARENT)
  }

  #[must_use]
  pub fn filled(name: impl Into<String>, width: u32, height: u32, fill: PixelRGBA8) -> Self {
    Self {
      name: name.into(),
      visible: true,
      opacity: 1.0,
      blend_mode: BlendMode::Normal,
      offset: (0, 0),
      transform: Transform2D::identity(),
      image: ImageBuffer::filled(width, height, fill).expect("caller-validated positive dimensions"),
      mask: None,
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn set_name(&mut self, name: impl Into<String>) {
    self.name = name.into();
  }

  pub fn visible(&self) -> bool {
    self.visible
  }

  pub fn set_visible(&mut self, visible: bool) {
    self.visible = visible;
  }

  pub fn opacity(&self) -> f32 {
    self.opacity
  }

  /// Clamped to `[0, 1]` per spec.md §3's layer invariant.
  pub fn set_opacity(&mut self, opacity: f32) {
    self.opacity = opacity.clamp(0.0, 1.0);
  }

  pub fn blend_mode(&self) -> BlendMode {
    self.blend_mode
  }

  pub fn set_blend_mode(&mut self, mode: BlendMode) {
    self.blend_mode = mode;
  }

  pub fn offset(&self) -> (i64, i64) {
    self.offset
  }

  pub fn set_offset(&mut self, x: i64, y: i64) {
    self.offset = (x, y);
  }

  pub fn transform(&self) -> &Transform2D {
    &self.transform
  }

  pub fn transform_mut(&mut self) -> &mut Transform2D {
    &mut self.transform
  }

  pub fn image(&self) -> &ImageBuffer {
    &self.image
  }

  pub fn image_mut(&mut self) -> &mut ImageBuffer {
    &mut self.image
  }

  pub fn has_mask(&self) -> bool {
    self.mask.is_some()
  }

  /// Enables the mask, filling it white (fully opaque — "no effect") when
  /// newly created. A fully-white mask is equivalent to no mask at all
  /// (spec.md §9's testable property), so this default keeps
  /// `enable_mask` a no-op on compositing until the caller paints into it.
  pub fn enable_mask(&mut self, fill: PixelRGBA8) {
    if self.mask.is_none() {
      self.mask = Some(ImageBuffer::filled(self.image.width(), self.image.height(), fill).expect("image dims are already validated positive"));
    }
  }

  pub fn clear_mask(&mut self) {
    self.mask = None;
  }

  pub fn mask(&self) -> Option<&ImageBuffer> {
    self.mask.as_ref()
  }

  pub fn mask_mut(&mut self) -> Option<&mut ImageBuffer> {
    self.mask.as_mut()
  }
}

/// A node in the layer tree: either a leaf [`Layer`] or a nested
/// [`LayerGroup`].
#[derive(Debug, Clone)]
pub enum LayerNode {
  Layer(Layer),
  Group(LayerGroup),
}

impl LayerNode {
  pub fn is_layer(&self) -> bool {
    matches!(self, Self::Layer(_))
  }

  pub fn is_group(&self) -> bool {
    matches!(self, Self::Group(_))
  }

  pub fn as_layer(&self) -> Option<&Layer> {
    match self {
      Self::Layer(l) => Some(l),
      Self::Group(_) => None,
    }
  }

  pub fn as_layer_mut(&mut self) -> Option<&mut Layer> {
    match self {
      Self::Layer(l) => Some(l),
      Self::Group(_) => None,
    }
  }

  pub fn as_group(&self) -> Option<&LayerGroup> {
    match self {
      Self::Group(g) => Some(g),
      Self::Layer(_) => None,
    }
  }

  pub fn as_group_mut(&mut self) -> Option<&mut LayerGroup> {
    match self {
      Self::Group(g) => Some(g),
      Self::Layer(_) => None,
    }
  }
}

/// A named, orderable collection of [`LayerNode`]s with its own
/// appearance state, composited as a unit (spec.md §4.8's "tree flatten").
#[derive(Debug, Clone)]
pub struct LayerGroup {
  name: String,
  visible: bool,
  opacity: f32,
  blend_mode: BlendMode,
  offset: (i64, i64),
  transform: Transform2D,
  nodes: Vec<LayerNode>,
}

impl Default for LayerGroup {
  fn default() -> Self {
    Self::new("group")
  }
}

impl LayerGroup {
  #[must_use]
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      visible: true,
      opacity: 1.0,
      blend_mode: BlendMode::Normal,
      offset: (0, 0),
      transform: Transform2D::identity(),
      nodes: Vec::new(),
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn set_name(&mut self, name: impl Into<String>) {
    self.name = name.into();
  }

  pub fn visible(&self) -> bool {
    self.visible
  }

  pub fn set_visible(&mut self, visible: bool) {
    self.visible = visible;
  }

  pub fn opacity(&self) -> f32 {
    self.opacity
  }

  pub fn set_opacity(&mut self, opacity: f32) {
    self.opacity = opacity.clamp(0.0, 1.0);
  }

  pub fn blend_mode(&self) -> BlendMode {
    self.blend_mode
  }

  pub fn set_blend_mode(&mut self, mode: BlendMode) {
    self.blend_mode = mode;
  }

  pub fn offset(&self) -> (i64, i64) {
    self.offset
  }

  pub fn set_offset(&mut self, x: i64, y: i64) {
    self.offset = (x, y);
  }

  pub fn transform(&self) -> &Transform2D {
    &self.transform
  }

  pub fn transform_mut(&mut self) -> &mut Transform2D {
    &mut self.transform
  }

  pub fn add_layer(&mut self, layer: Layer) -> &mut Layer {
    self.nodes.push(LayerNode::Layer(layer));
    self.nodes.last_mut().unwrap().as_layer_mut().unwrap()
  }

  pub fn add_group(&mut self, group: LayerGroup) -> &mut LayerGroup {
    self.nodes.push(LayerNode::Group(group));
    self.nodes.last_mut().unwrap().as_group_mut().unwrap()
  }

  pub fn node_count(&self) -> usize {
    self.nodes.len()
  }

  pub fn node(&self, index: usize) -> Option<&LayerNode> {
    self.nodes.get(index)
  }

  pub fn node_mut(&mut self, index: usize) -> Option<&mut LayerNode> {
    self.nodes.get_mut(index)
  }

  pub fn nodes(&self) -> &[LayerNode] {
    &self.nodes
  }
}

/// The top-level document: fixed canvas dimensions and a root group every
/// layer ultimately nests under.
#[derive(Debug, Clone)]
pub struct Document {
  width: u32,
  height: u32,
  root: LayerGroup,
}

impl Document {
  #[must_use]
  pub fn new(width: u32, height: u32) -> Self {
    Self { width, height, root: LayerGroup::new("root") }
  }

  pub fn width(&self) -> u32 {
    self.width
  }

  pub fn height(&self) -> u32 {
    self.height
  }

  pub fn root_group(&self) -> &LayerGroup {
    &self.root
  }

  pub fn root_group_mut(&mut self) -> &mut LayerGroup {
    &mut self.root
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum PathError {
  MustStartWithSlash,
  EmptySegment,
  NegativeSegment,
  NotAGroup,
  NotALayer,
  IndexOutOfRange { index: usize, len: usize },
  RootIsNotANode,
}

impl core::fmt::Display for PathError {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    match self {
      Self::MustStartWithSlash => write!(f, "path must start with '/'"),
      Self::EmptySegment => write!(f, "path has an empty segment"),
      Self::NegativeSegment => write!(f, "path segment must be a non-negative integer"),
      Self::NotAGroup => write!(f, "path does not resolve to a group"),
      Self::NotALayer => write!(f, "path does not resolve to a layer"),
      Self::IndexOutOfRange { index, len } => write!(f, "path index {index} is out of range (node count {len})"),
      Self::RootIsNotANode => write!(f, "path '/' resolves to the root group, not a node"),
    }
  }
}
impl std::error::Error for PathError {}

fn parse_path_indices(path: &str) -> Result<Vec<usize>, PathError> {
  if !path.starts_with('/') {
    return Err(PathError::MustStartWithSlash);
  }
  if path == "/" {
    return Ok(Vec::new());
  }
  path[1..]
    .split('/')
    .map(|segment| {
      if segment.is_empty() {
        return Err(PathError::EmptySegment);
      }
      segment.parse::<i64>().map_err(|_| PathError::NegativeSegment).and_then(|v| {
        if v < 0 {
          Err(PathError::NegativeSegment)
        } else {
          Ok(v as usize)
        }
      })
    })
    .collect()
}

/// Resolves a `/i/j/...` path to a group, following only group nodes.
pub fn resolve_group_path<'a>(document: &'a Document, path: &str) -> Result<&'a LayerGroup, PathError> {
  let indices = parse_path_indices(path)?;
  let mut group = document.root_group();
  for index in indices {
    let node = group.node(index).ok_or(PathError::IndexOutOfRange { index, len: group.node_count() })?;
    group = node.as_group().ok_or(PathError::NotAGroup)?;
  }
  Ok(group)
}

pub fn resolve_group_path_mut<'a>(document: &'a mut Document, path: &str) -> Result<&'a mut LayerGroup, PathError> {
  let indices = parse_path_indices(path)?;
  let mut group = document.root_group_mut();
  for index in indices {
    let len = group.node_count();
    let node = group.node_mut(index).ok_or(PathError::IndexOutOfRange { index, len })?;
    group = node.as_group_mut().ok_or(PathError::NotAGroup)?;
  }
  Ok(group)
}

/// Resolves a `/i/j/...` path to a node (layer or group); the last segment
/// selects the node itself, earlier segments must each be a group.
pub fn resolve_node_path<'a>(document: &'a Document, path: &str) -> Result<&'a LayerNode, PathError> {
  let indices = parse_path_indices(path)?;
  let (last, init) = indices.split_last().ok_or(PathError::RootIsNotANode)?;
  let mut group = document.root_group();
  for &index in init {
    let node = group.node(index).ok_or(PathError::IndexOutOfRange { index, len: group.node_count() })?;
    group = node.as_group().ok_or(PathError::NotAGroup)?;
  }
  group.node(*last).ok_or(PathError::IndexOutOfRange { index: *last, len: group.node_count() })
}

pub fn resolve_node_path_mut<'a>(document: &'a mut Document, path: &str) -> Result<&'a mut LayerNode, PathError> {
  let indices = parse_path_indices(path)?;
  let (last, init) = indices.split_last().ok_or(PathError::RootIsNotANode)?;
  let mut group = document.root_group_mut();
  for &index in init {
    let len = group.node_count();
    let node = group.node_mut(index).ok_or(PathError::IndexOutOfRange { index, len })?;
    group = node.as_group_mut().ok_or(PathError::NotAGroup)?;
  }
  let len = group.node_count();
  group.node_mut(*last).ok_or(PathError::IndexOutOfRange { index: *last, len })
}

pub fn resolve_layer_path<'a>(document: &'a Document, path: &str) -> Result<&'a Layer, PathError> {
  resolve_node_path(document, path)?.as_layer().ok_or(PathError::NotALayer)
}

pub fn resolve_layer_path_mut<'a>(document: &'a mut Document, path: &str) -> Result<&'a mut Layer, PathError> {
  resolve_node_path_mut(document, path)?.as_layer_mut().ok_or(PathError::NotALayer)
}
