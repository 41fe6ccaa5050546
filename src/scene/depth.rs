use std::path::Path;

use rayon::prelude::*;

use crate::foundation::core::Grid;
use crate::foundation::error::{CinemagraphError, CinemagraphResult};

/// Smallest disparity used before inversion.
pub const MIN_DISPARITY: f32 = 1e-6;

/// Median window used to denoise estimated disparity.
pub const DISPARITY_MEDIAN_KERNEL: u32 = 5;

/// Single-channel median filter with a `kernel x kernel` window and replicated borders.
///
/// `kernel` must be odd.
pub fn median_filter(map: &Grid<f32>, kernel: u32) -> CinemagraphResult<Grid<f32>> {
    if map.channels() != 1 {
        return Err(CinemagraphError::validation(
            "median filter expects a single-channel map",
        ));
    }
    if kernel % 2 == 0 {
        return Err(CinemagraphError::validation(format!(
            "median kernel must be odd, got {kernel}"
        )));
    }
    let (w, h) = (map.width(), map.height());
    if w == 0 || h == 0 {
        return Ok(map.clone());
    }
    let r = (kernel / 2) as i64;

    let data: Vec<f32> = (0..h)
        .into_par_iter()
        .flat_map_iter(|y| {
            let mut window = Vec::with_capacity((kernel * kernel) as usize);
            (0..w)
                .map(|x| {
                    window.clear();
                    for dy in -r..=r {
                        let yy = (y as i64 + dy).clamp(0, h as i64 - 1) as u32;
                        for dx in -r..=r {
                            let xx = (x as i64 + dx).clamp(0, w as i64 - 1) as u32;
                            window.push(map.at(xx, yy));
                        }
                    }
                    let mid = window.len() / 2;
                    *window.select_nth_unstable_by(mid, f32::total_cmp).1
                })
                .collect::<Vec<_>>()
        })
        .collect();

    Grid::new(w, h, 1, data)
}

/// Invert a normalized disparity map to depth, clamping disparity away from zero.
pub fn disparity_to_depth(disparity: &Grid<f32>) -> CinemagraphResult<Grid<f32>> {
    if let Some((x, y)) = disparity.first_non_finite() {
        return Err(CinemagraphError::NonFiniteField {
            what: "disparity",
            x,
            y,
        });
    }
    let data = disparity
        .data()
        .iter()
        .map(|&d| 1.0 / d.max(MIN_DISPARITY))
        .collect();
    Grid::new(disparity.width(), disparity.height(), disparity.channels(), data)
}

/// Normalize a 16-bit disparity image to `[0, 1]`.
pub fn disparity_from_luma16(
    img: &image::ImageBuffer<image::Luma<u16>, Vec<u16>>,
) -> CinemagraphResult<Grid<f32>> {
    let data = img
        .as_raw()
        .iter()
        .map(|&v| v as f32 / u16::MAX as f32)
        .collect();
    Grid::new(img.width(), img.height(), 1, data)
}

/// Read a 16-bit disparity PNG and turn it into a denoised depth map.
///
/// Disparity is normalized by 65535, median filtered, then inverted. The depth map is
/// resampled to `target` when given.
#[tracing::instrument(skip_all, fields(path = %path.display()))]
pub fn load_disparity_png(
    path: &Path,
    target: Option<(u32, u32)>,
) -> CinemagraphResult<Grid<f32>> {
    let img = image::open(path)
        .map_err(|e| CinemagraphError::io(format!("read '{}': {e}", path.display())))?
        .into_luma16();
    let disparity = disparity_from_luma16(&img)?;
    let disparity = median_filter(&disparity, DISPARITY_MEDIAN_KERNEL)?;
    let depth = disparity_to_depth(&disparity)?;
    Ok(match target {
        Some((w, h)) => resize_depth(&depth, w, h),
        None => depth,
    })
}

/// Resample a depth map to a new resolution.
pub fn resize_depth(depth: &Grid<f32>, width: u32, height: u32) -> Grid<f32> {
    depth.resize_bilinear(width, height)
}

#[cfg(test)]
#[path = "../../tests/unit/scene/depth.rs"]
mod tests;
