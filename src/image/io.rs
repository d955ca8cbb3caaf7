//! I/O helpers for detector images, masks and JSON reports.
//!
//! - `load_intensity_image`: read a TIFF/PNG into an `ImageF32` (raw counts for gray).
//! - `load_mask_image`: read a mask image, any non-zero pixel is masked.
//! - `save_mask_png`: write a `Mask` as 8-bit PNG (255 = masked, 0 = good).
//! - `write_json_file`: pretty-print a serializable value to disk.
use super::{ImageF32, Mask};
use crate::error::{MaskError, Result};
use image::{GrayImage, Luma};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Load an image from disk as single-channel intensities.
pub fn load_intensity_image(path: &Path) -> Result<ImageF32> {
    let img = image::open(path)
        .map_err(|e| MaskError::Io(format!("Failed to open {}: {e}", path.display())))?;
    ImageF32::try_from(img)
}

/// Load a previously stored mask; any non-zero luminance counts as masked.
pub fn load_mask_image(path: &Path) -> Result<Mask> {
    let img = image::open(path)
        .map_err(|e| MaskError::Io(format!("Failed to open mask {}: {e}", path.display())))?
        .into_luma16();
    let (w, h) = (img.width() as usize, img.height() as usize);
    let masked = img.into_raw().into_iter().map(|v| v != 0).collect();
    Mask::from_bools(w, h, masked)
}

/// Save a mask as an 8-bit grayscale PNG.
pub fn save_mask_png(mask: &Mask, path: &Path) -> Result<()> {
    ensure_parent_dir(path)?;
    let mut out = GrayImage::new(mask.width() as u32, mask.height() as u32);
    for (i, &masked) in mask.as_slice().iter().enumerate() {
        let (x, y) = (i % mask.width(), i / mask.width());
        out.put_pixel(x as u32, y as u32, Luma([if masked { 255 } else { 0 }]));
    }
    out.save(path)
        .map_err(|e| MaskError::Io(format!("Failed to save {}: {e}", path.display())))
}

/// Serialize a value as pretty JSON to `path`, creating parent directories.
pub fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    ensure_parent_dir(path)?;
    let json = serde_json::to_string_pretty(value).map_err(|e| {
        MaskError::Io(format!("Failed to serialize JSON for {}: {e}", path.display()))
    })?;
    fs::write(path, json)
        .map_err(|e| MaskError::Io(format!("Failed to write JSON {}: {e}", path.display())))
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| {
                MaskError::Io(format!("Failed to create {}: {e}", parent.display()))
            })?;
        }
    }
    Ok(())
}
