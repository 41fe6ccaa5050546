use crate::foundation::core::{Canvas, Grid};
use crate::foundation::error::{CinemagraphError, CinemagraphResult};
use crate::foundation::math::unit_to_u8;

/// Counters gathered while rasterizing one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RasterStats {
    /// Points handed to the rasterizer.
    pub points_total: usize,
    /// Points in front of the camera with at least one covered pixel.
    pub points_in_view: usize,
    /// Point/pixel samples composited.
    pub fragments: usize,
    /// Pixels that received any contribution.
    pub covered_pixels: usize,
}

/// One rendered output frame.
///
/// `rgb` is straight color in `[0, 1]`; `coverage`, `depth` and `features` are auxiliary maps for
/// diagnostics and downstream decoders. Uncovered pixels hold the background color, zero
/// coverage, zero depth and zero features.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderedFrame {
    /// Normalized time the frame was rendered for.
    pub time: f32,
    /// RGB, 3 channels.
    pub rgb: Grid<f32>,
    /// Accumulated opacity after pass blending, 1 channel.
    pub coverage: Grid<f32>,
    /// Opacity-weighted camera-space depth, 1 channel.
    pub depth: Grid<f32>,
    /// Composited feature embedding, `feature_dim` channels.
    pub features: Grid<f32>,
    /// Rasterization counters.
    pub stats: RasterStats,
}

impl RenderedFrame {
    /// Pixel dimensions.
    pub fn canvas(&self) -> Canvas {
        self.rgb.canvas()
    }

    /// Quantize to an 8-bit RGB image.
    ///
    /// Fails with [`CinemagraphError::Encoding`] when `rgb` does not hold three channels.
    pub fn to_rgb8(&self) -> CinemagraphResult<image::RgbImage> {
        let canvas = self.canvas();
        if self.rgb.channels() != 3 {
            return Err(CinemagraphError::encoding(format!(
                "frame color buffer has {} channels, expected 3",
                self.rgb.channels()
            )));
        }
        let bytes = self.rgb.data().iter().map(|&v| unit_to_u8(v)).collect();
        image::RgbImage::from_raw(canvas.width, canvas.height, bytes).ok_or_else(|| {
            CinemagraphError::encoding(format!(
                "frame color buffer does not match {}x{}",
                canvas.width, canvas.height
            ))
        })
    }

    /// Fraction of pixels with non-zero coverage.
    pub fn covered_fraction(&self) -> f32 {
        let n = self.canvas().pixel_count();
        if n == 0 {
            return 0.0;
        }
        self.stats.covered_pixels as f32 / n as f32
    }
}
