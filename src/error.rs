//! Error types for the upload pipeline.
//!
//! Only whole-run preconditions live here: unreadable input, an undecodable
//! structured document, rejected credentials, zero eligible records. Per-row
//! and per-field trouble is recovered inside the normalizer, and per-write
//! trouble is tallied by the uploader; neither surfaces as an `Error`.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
  /// Input file could not be read.
  #[error("IO error: {0}")]
  Io(#[from] std::io::Error),

  /// Structured input document could not be decoded at all.
  #[error("JSON error: {0}")]
  Json(#[from] serde_json::Error),

  /// Input was readable but has no usable shape or content.
  #[error("invalid input: {0}")]
  InvalidInput(String),

  /// Missing or malformed configuration (credentials, config file).
  #[error("configuration error: {0}")]
  Config(String),

  /// The storage capability rejected us up front (credentials, account).
  #[error("storage error: {0}")]
  Storage(String),
}
