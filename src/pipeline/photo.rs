use std::path::{Path, PathBuf};

use crate::foundation::core::Grid;
use crate::foundation::error::{CinemagraphError, CinemagraphResult};

/// File names probed, in order, for the input photo of a directory.
pub const PHOTO_FILE_NAMES: [&str; 2] = ["image.png", "image.jpg"];

/// Locate the input photo in `dir`.
pub fn find_photo(dir: &Path) -> CinemagraphResult<PathBuf> {
    PHOTO_FILE_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.is_file())
        .ok_or_else(|| {
            CinemagraphError::io(format!(
                "no {} in '{}'",
                PHOTO_FILE_NAMES.join(" or "),
                dir.display()
            ))
        })
}

/// Decode a photo as 8-bit RGB.
pub fn load_photo(path: &Path) -> CinemagraphResult<image::RgbImage> {
    let img = image::open(path)
        .map_err(|e| CinemagraphError::io(format!("read '{}': {e}", path.display())))?;
    Ok(img.into_rgb8())
}

/// Size of a `width`x`height` image shrunk by `ds_factor`, at least 1x1.
pub fn downsampled_size(width: u32, height: u32, ds_factor: f32) -> (u32, u32) {
    let scale = |v: u32| ((v as f32 / ds_factor).round() as u32).max(1);
    (scale(width), scale(height))
}

/// Shrink (or enlarge) `photo` by `ds_factor` with bilinear filtering.
pub fn downsample(photo: &image::RgbImage, ds_factor: f32) -> image::RgbImage {
    let (w, h) = downsampled_size(photo.width(), photo.height(), ds_factor);
    if (w, h) == photo.dimensions() {
        return photo.clone();
    }
    image::imageops::resize(photo, w, h, image::imageops::FilterType::Triangle)
}

/// 8-bit RGB to a 3-channel map in `[0, 1]`.
pub fn photo_grid(photo: &image::RgbImage) -> CinemagraphResult<Grid<f32>> {
    let data = photo
        .as_raw()
        .iter()
        .map(|&v| f32::from(v) / 255.0)
        .collect();
    Grid::new(photo.width(), photo.height(), 3, data)
}
