#![forbid(unsafe_code)]
//! A layered-document raster toolkit: pluggable image codecs, a
//! layer/group compositor with masks and affine transforms, a 2D
//! rasterizer, pixel-space effects, and a textual operation interpreter
//! that drives all of it.
//!
//! Grounded on the teacher crate's flat, `pub mod` + re-export shape
//! (`examples/Lokathor-imagine/src/lib.rs`), generalized from a single
//! image-format crate into this toolkit's several independent subsystems
//! (pixels/surfaces, four codecs, transforms, layers, the compositor, the
//! rasterizer, the resampler, effects, steganography, and the operation
//! interpreter). Unlike the teacher, this crate is `std`-only (see
//! `DESIGN.md`) since the operation interpreter's `import-image`/`emit`
//! actions and the codecs' "each opens a file, streams bytes, and closes
//! it" contract (spec.md §5) need `std::fs`/`std::io`.

pub mod bmp;
pub mod compositor;
pub mod effects;
pub mod error;
pub mod gif;
pub mod jpeg;
pub mod layer;
pub mod ops;
pub mod pixel;
pub mod png;
pub mod raster2d;
pub mod resample;
pub mod stego;
pub mod surface;
pub mod transform;

pub use error::PixelflowError;
pub use layer::{BlendMode, Document, Layer, LayerGroup, LayerNode};
pub use pixel::{PixelRGB, PixelRGBA8};
pub use surface::{ImageBuffer, RasterSurface};
pub use transform::Transform2D;
