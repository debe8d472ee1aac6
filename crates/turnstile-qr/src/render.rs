//! QR rendering and PNG export.

use std::{
  fs,
  path::{Path, PathBuf},
};

use image::{GrayImage, Luma};
use qrcode::{EcLevel, QrCode};

use crate::{Error, Result};

/// Minimum rendered side length in pixels, matching the printed code size.
const MIN_SIDE: u32 = 256;

pub(crate) fn to_image(payload: &str) -> Result<GrayImage> {
  let code = QrCode::with_error_correction_level(payload.as_bytes(), EcLevel::H)
    .map_err(|e| Error::Encode(e.to_string()))?;

  Ok(
    code
      .render::<Luma<u8>>()
      .min_dimensions(MIN_SIDE, MIN_SIDE)
      .quiet_zone(true)
      .build(),
  )
}

pub(crate) fn export_file_name(display_name: &str) -> String {
  let slug = display_name
    .to_lowercase()
    .split_whitespace()
    .collect::<Vec<_>>()
    .join("-");
  format!("qr-code-{slug}.png")
}

pub(crate) fn export_png(
  payload: &str,
  display_name: &str,
  dir: &Path,
) -> Result<PathBuf> {
  let img = to_image(payload)?;
  fs::create_dir_all(dir)?;
  let path = dir.join(export_file_name(display_name));
  img.save(&path)?;
  Ok(path)
}
