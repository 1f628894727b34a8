//! The interpreter's error type. Grounded on `original_source/src/cli_ops.cpp`
//! and friends, which raise `std::runtime_error` with an ad hoc message at
//! every call site; collapsed here into a small `non_exhaustive` enum with a
//! handful of structured variants for the failures callers might want to
//! match on, plus a [`OpError::Message`] catch-all for the rest (path
//! resolution failures, malformed colors, out-of-range op-specific checks)
//! that carries the same text the original would have thrown.

use crate::bmp::BmpError;
use crate::gif::GifError;
use crate::jpeg::JpegError;
use crate::layer::PathError;
use crate::png::PngError;

#[derive(Debug)]
#[non_exhaustive]
pub enum OpError {
  /// `tokenizeOpSpec` hit a trailing `\` or an unterminated `"`/`'` quote.
  TrailingEscape,
  UnterminatedQuote,
  /// The op spec tokenized to nothing.
  Empty,
  /// A dispatch token wasn't `key=value`.
  MalformedKeyValue(String),
  /// The first token didn't match any known action.
  UnknownAction(String),
  /// A `path=` resolution failed.
  Path(PathError),
  /// Decoding or encoding an imported/emitted image failed.
  Bmp(BmpError),
  Png(PngError),
  Gif(GifError),
  Jpeg(JpegError),
  /// `import-image`/`emit` saw an extension with no matching codec.
  UnsupportedExtension(String),
  /// A file read or write requested by the interpreter failed.
  Io(String),
  /// Everything else: missing required keys, malformed numbers/colors,
  /// op-specific range checks. Carries the same message the original
  /// implementation's `std::runtime_error` would have.
  Message(String),
}

impl core::fmt::Display for OpError {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    match self {
      Self::TrailingEscape => write!(f, "Invalid op: trailing escape character"),
      Self::UnterminatedQuote => write!(f, "Invalid op: unterminated quoted value"),
      Self::Empty => write!(f, "Empty op value"),
      Self::MalformedKeyValue(tok) => write!(f, "Expected key=value token but got: {tok}"),
      Self::UnknownAction(action) => write!(f, "Unknown op action: {action}"),
      Self::Path(e) => write!(f, "{e}"),
      Self::Bmp(e) => write!(f, "{e}"),
      Self::Png(e) => write!(f, "{e}"),
      Self::Gif(e) => write!(f, "{e}"),
      Self::Jpeg(e) => write!(f, "{e}"),
      Self::UnsupportedExtension(ext) => write!(f, "Unsupported image extension: {ext}"),
      Self::Io(msg) => write!(f, "{msg}"),
      Self::Message(msg) => write!(f, "{msg}"),
    }
  }
}

impl std::error::Error for OpError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      Self::Path(e) => Some(e),
      Self::Bmp(e) => Some(e),
      Self::Png(e) => Some(e),
      Self::Gif(e) => Some(e),
      Self::Jpeg(e) => Some(e),
      _ => None,
    }
  }
}

impl From<PathError> for OpError {
  fn from(e: PathError) -> Self {
    Self::Path(e)
  }
}
impl From<BmpError> for OpError {
  fn from(e: BmpError) -> Self {
    Self::Bmp(e)
  }
}
impl From<PngError> for OpError {
  fn from(e: PngError) -> Self {
    Self::Png(e)
  }
}
impl From<GifError> for OpError {
  fn from(e: GifError) -> Self {
    Self::Gif(e)
  }
}
impl From<JpegError> for OpError {
  fn from(e: JpegError) -> Self {
    Self::Jpeg(e)
  }
}

pub(crate) fn missing_keys(action: &str, keys: &[&str]) -> OpError {
  OpError::Message(format!("{action} requires {}", keys.iter().map(|k| format!("{k}=")).collect::<Vec<_>>().join(" ")))
}
