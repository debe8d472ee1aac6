//! QR codec for turnstile.
//!
//! Renders a record's code payload as a scannable QR image, exports it as a
//! PNG named after the record, and decodes QR images back to raw payload
//! text for the scan path. Pure synchronous; no database dependencies.
//! Structural validation of the payload itself lives in
//! `turnstile_core::payload`.
//!
//! # Quick start
//!
//! ```no_run
//! let path = turnstile_qr::export_png(
//!   r#"{"name":"John Doe","license_plate":"ABC123","identity_card_number":"1234567890"}"#,
//!   "John Doe",
//!   std::path::Path::new("."),
//! )
//! .unwrap();
//! assert!(path.ends_with("qr-code-john-doe.png"));
//! ```

pub mod error;

mod decode;
mod render;

use std::path::{Path, PathBuf};

pub use error::{Error, Result};

// ─── Public API ──────────────────────────────────────────────────────────────

/// Rasterize `payload` as a QR image: error-correction level H, at least
/// 256 px per side, with a white quiet zone.
pub fn to_image(payload: &str) -> Result<image::GrayImage> {
  render::to_image(payload)
}

/// The deterministic file name for an exported code: the display name
/// lower-cased with whitespace runs replaced by `-`.
pub fn export_file_name(display_name: &str) -> String {
  render::export_file_name(display_name)
}

/// Render `payload` and write it to `<dir>/qr-code-<slug>.png`, creating
/// `dir` if needed. Returns the written path.
pub fn export_png(
  payload: &str,
  display_name: &str,
  dir: &Path,
) -> Result<PathBuf> {
  render::export_png(payload, display_name, dir)
}

/// Decode the first QR code found in the image file at `path`, returning the
/// raw embedded text.
pub fn decode_image(path: &Path) -> Result<String> {
  decode::decode_image(path)
}

/// Decode the first QR code in an in-memory grayscale image.
pub fn decode_gray(img: image::GrayImage) -> Result<String> {
  decode::decode_gray(img)
}

// ─── Round-trip tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod roundtrip_tests {
  use turnstile_core::payload::CodePayload;

  use super::*;

  fn payload() -> CodePayload {
    CodePayload {
      name:                 "John Doe".into(),
      license_plate:        "ABC123".into(),
      identity_card_number: "1234567890".into(),
    }
  }

  #[test]
  fn render_then_decode_roundtrip() {
    let text = payload().encode().unwrap();
    let img = to_image(&text).expect("render failed");

    let decoded = decode_gray(img).expect("decode failed");
    assert_eq!(decoded, text);

    // Field-for-field identity with the original triple.
    let parsed = CodePayload::decode(&decoded).unwrap();
    assert_eq!(parsed, payload());
  }

  #[test]
  fn export_file_name_slugifies_display_name() {
    assert_eq!(export_file_name("John Doe"), "qr-code-john-doe.png");
    assert_eq!(
      export_file_name("  Ada   Lovelace "),
      "qr-code-ada-lovelace.png"
    );
  }

  #[test]
  fn export_writes_decodable_png() {
    let dir = std::env::temp_dir()
      .join(format!("turnstile-qr-test-{}", std::process::id()));

    let path = export_png(&payload().encode().unwrap(), "John Doe", &dir)
      .expect("export failed");
    assert!(path.ends_with("qr-code-john-doe.png"));

    let decoded = decode_image(&path).expect("decode failed");
    assert_eq!(CodePayload::decode(&decoded).unwrap(), payload());

    std::fs::remove_dir_all(&dir).ok();
  }

  #[test]
  fn blank_image_reports_no_code() {
    let blank = image::GrayImage::from_pixel(64, 64, image::Luma([255u8]));
    let err = decode_gray(blank).unwrap_err();
    assert!(matches!(err, Error::NoCodeFound));
  }
}
