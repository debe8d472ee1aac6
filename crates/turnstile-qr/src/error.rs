//! Error types for the turnstile-qr codec.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("payload cannot be encoded as a QR code: {0}")]
  Encode(String),

  #[error("image error: {0}")]
  Image(#[from] image::ImageError),

  #[error("no QR code found in image")]
  NoCodeFound,

  /// The located code could not be read. Expected per-frame noise in a
  /// continuous scan stream; never fatal to the scanner.
  #[error("QR decode failed: {0}")]
  DecodeFailed(String),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
