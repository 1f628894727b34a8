//! Thin CLI driver: reads an operation script (spec.md §4.10) from a file
//! argument or, absent one, from stdin, runs it against a freshly created
//! [`Document`], and exits with the contract of spec.md §6 — 0 on success,
//! 1 with the error printed to stderr on any failure.
//!
//! Argument binding itself is out of scope (spec.md §1): this driver takes
//! at most a script path and an optional `WIDTHxHEIGHT` for the initial
//! document, defaulting to 256x256, matching the `createSmiley256*` demos
//! in `original_source/src/main.cpp`.

use pixelflow::{ops, Document};
use std::io::Read;
use std::process::ExitCode;

const DEFAULT_WIDTH: u32 = 256;
const DEFAULT_HEIGHT: u32 = 256;

fn main() -> ExitCode {
  #[cfg(feature = "log-diagnostics")]
  env_logger::init();

  match run() {
    Ok(()) => ExitCode::SUCCESS,
    Err(message) => {
      eprintln!("{message}");
      ExitCode::FAILURE
    }
  }
}

fn run() -> Result<(), String> {
  let mut script_path: Option<String> = None;
  let mut dims: Option<(u32, u32)> = None;

  for arg in std::env::args().skip(1) {
    if let Some(parsed) = parse_dims(&arg) {
      dims = Some(parsed);
    } else {
      script_path = Some(arg);
    }
  }

  let script = match script_path {
    Some(path) => std::fs::read_to_string(&path).map_err(|e| format!("reading {path}: {e}"))?,
    None => {
      let mut buf = String::new();
      std::io::stdin().read_to_string(&mut buf).map_err(|e| format!("reading stdin: {e}"))?;
      buf
    }
  };

  let (width, height) = dims.unwrap_or((DEFAULT_WIDTH, DEFAULT_HEIGHT));
  let mut document = Document::new(width, height);

  ops::run_op_script(&mut document, &script).map_err(|e| e.to_string())
}

fn parse_dims(arg: &str) -> Option<(u32, u32)> {
  let (w, h) = arg.split_once('x')?;
  Some((w.parse().ok()?, h.parse().ok()?))
}
