//! Crate-wide error aggregation.
//!
//! Each subsystem (BMP, PNG, GIF, JPEG, the document model, the operation
//! interpreter) defines its own small `non_exhaustive` enum next to the code
//! that raises it — grounded on the teacher's `PngError`
//! (`examples/Lokathor-imagine/src/lib.rs`) and `ImagineError`
//! (`examples/Lokathor-imagine/src/error.rs`): plain data, a manual
//! `Display` impl, no `thiserror`/`anyhow` derive. [`PixelflowError`] is the
//! `From`-glue an interpreter or CLI driver needs to handle "any of the
//! above" with one `?`.

use crate::bmp::BmpError;
use crate::gif::GifError;
use crate::jpeg::JpegError;
use crate::ops::OpError;
use crate::png::PngError;
use crate::surface::SurfaceError;

/// Any failure the crate can raise, spanning every codec plus the document
/// model and operation interpreter.
#[derive(Debug)]
#[non_exhaustive]
pub enum PixelflowError {
  Surface(SurfaceError),
  Bmp(BmpError),
  Png(PngError),
  Gif(GifError),
  Jpeg(JpegError),
  Op(OpError),
  Io(std::io::Error),
}

impl core::fmt::Display for PixelflowError {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    match self {
      Self::Surface(e) => write!(f, "{e}"),
      Self::Bmp(e) => write!(f, "{e}"),
      Self::Png(e) => write!(f, "{e}"),
      Self::Gif(e) => write!(f, "{e}"),
      Self::Jpeg(e) => write!(f, "{e}"),
      Self::Op(e) => write!(f, "{e}"),
      Self::Io(e) => write!(f, "{e}"),
    }
  }
}

impl std::error::Error for PixelflowError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      Self::Surface(e) => Some(e),
      Self::Bmp(e) => Some(e),
      Self::Png(e) => Some(e),
      Self::Gif(e) => Some(e),
      Self::Jpeg(e) => Some(e),
      Self::Op(e) => Some(e),
      Self::Io(e) => Some(e),
    }
  }
}

impl From<SurfaceError> for PixelflowError {
  fn from(e: SurfaceError) -> Self {
    Self::Surface(e)
  }
}
impl From<BmpError> for PixelflowError {
  fn from(e: BmpError) -> Self {
    Self::Bmp(e)
  }
}
impl From<PngError> for PixelflowError {
  fn from(e: PngError) -> Self {
    Self::Png(e)
  }
}
impl From<GifError> for PixelflowError {
  fn from(e: GifError) -> Self {
    Self::Gif(e)
  }
}
impl From<JpegError> for PixelflowError {
  fn from(e: JpegError) -> Self {
    Self::Jpeg(e)
  }
}
impl From<OpError> for PixelflowError {
  fn from(e: OpError) -> Self {
    Self::Op(e)
  }
}
impl From<std::io::Error> for PixelflowError {
  fn from(e: std::io::Error) -> Self {
    Self::Io(e)
  }
}
