//! QR decoding — the scan path.

use std::path::Path;

use image::GrayImage;

use crate::{Error, Result};

pub(crate) fn decode_image(path: &Path) -> Result<String> {
  let img = image::open(path)?.to_luma8();
  decode_gray(img)
}

pub(crate) fn decode_gray(img: GrayImage) -> Result<String> {
  let (width, height) = img.dimensions();
  let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
    width as usize,
    height as usize,
    |x, y| img.get_pixel(x as u32, y as u32).0[0],
  );
  let grids = prepared.detect_grids();
  let grid = grids.first().ok_or(Error::NoCodeFound)?;

  let (_meta, content) = grid
    .decode()
    .map_err(|e| Error::DecodeFailed(e.to_string()))?;
  Ok(content)
}
