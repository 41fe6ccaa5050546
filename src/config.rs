use std::path::Path;

use nalgebra::Vector3;

use crate::camera::ease::Ease;
use crate::camera::path::{CameraPathGenerator, PathType};
use crate::flow::integrate::EulerScheme;
use crate::foundation::error::{CinemagraphError, CinemagraphResult};

/// Frame-level parallelism.
///
/// Frames are independent of each other, so chunks of frames may render on a dedicated pool.
/// Output order is preserved either way.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderThreading {
    /// Render frames of a chunk in parallel.
    pub parallel: bool,
    /// Frames per chunk.
    pub chunk_size: usize,
    /// Worker threads; `None` uses rayon's default.
    pub threads: Option<usize>,
}

impl Default for RenderThreading {
    fn default() -> Self {
        Self {
            parallel: false,
            chunk_size: 16,
            threads: None,
        }
    }
}

/// Every knob of one run.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Output frame count.
    pub n_frames: usize,
    /// Lateral camera travel; the path amplitude along x is `-x_motion`.
    pub x_motion: f32,
    /// Vertical camera travel.
    pub y_motion: f32,
    /// Forward camera travel.
    pub z_motion: f32,
    /// Camera path tag, e.g. `double-straight-line`.
    pub path: String,
    /// The estimated flow is divided by this before integration.
    pub flow_scale: f32,
    /// Photo and depth are resized by `1 / ds_factor` before the scene is built.
    pub ds_factor: f32,
    /// Pixels cropped from every edge of every frame.
    pub crop: u32,
    /// Output frame rate.
    pub fps: u32,
    /// Encoder quality, `0..=10`.
    pub quality: u8,
    /// Side of the square dilation kernel applied to the validity mask.
    pub dilation_kernel: u32,
    /// Warp background (inpainted) layers as well as the observed one.
    pub with_inpainted: bool,
    /// Easing curve of the eased camera paths.
    pub ease: Ease,
    /// Point footprint radius in pixels.
    pub point_radius_px: f32,
    /// Euler integration variant.
    pub integration: EulerScheme,
    /// Color of uncovered pixels, in `[0, 1]`.
    pub background: [f32; 3],
    /// Also write every frame as PNG.
    pub save_frames: bool,
    /// Frame-level threading.
    pub threading: RenderThreading,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            n_frames: 60,
            x_motion: 0.20,
            y_motion: 0.0,
            z_motion: 0.0,
            path: PathType::DoubleStraightLine.tag().to_string(),
            flow_scale: 1.0,
            ds_factor: 1.0,
            crop: 32,
            fps: 25,
            quality: 8,
            dilation_kernel: 5,
            with_inpainted: true,
            ease: Ease::InOutCubic,
            point_radius_px: 1.5,
            integration: EulerScheme::FixedField,
            background: [0.0; 3],
            save_frames: false,
            threading: RenderThreading::default(),
        }
    }
}

impl PipelineConfig {
    /// Parse a JSON config; missing fields take their defaults.
    pub fn from_json_str(s: &str) -> CinemagraphResult<Self> {
        let cfg: Self = serde_json::from_str(s)
            .map_err(|e| CinemagraphError::validation(format!("invalid config json: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read and parse a JSON config file.
    pub fn from_json_path(path: &Path) -> CinemagraphResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            CinemagraphError::io(format!("failed to read config '{}': {e}", path.display()))
        })?;
        Self::from_json_str(&text)
    }

    /// Reject values no run can use. The camera path tag is checked separately by
    /// [`PipelineConfig::camera_path`].
    pub fn validate(&self) -> CinemagraphResult<()> {
        if self.n_frames == 0 {
            return Err(CinemagraphError::validation("n_frames must be >= 1"));
        }
        if self.fps == 0 {
            return Err(CinemagraphError::validation("fps must be >= 1"));
        }
        if !(self.flow_scale.is_finite() && self.flow_scale > 0.0) {
            return Err(CinemagraphError::validation(format!(
                "flow_scale must be positive, got {}",
                self.flow_scale
            )));
        }
        if !(self.ds_factor.is_finite() && self.ds_factor > 0.0) {
            return Err(CinemagraphError::validation(format!(
                "ds_factor must be positive, got {}",
                self.ds_factor
            )));
        }
        if self.quality > 10 {
            return Err(CinemagraphError::validation(format!(
                "quality must be within 0..=10, got {}",
                self.quality
            )));
        }
        if self.dilation_kernel % 2 == 0 {
            return Err(CinemagraphError::validation(format!(
                "dilation_kernel must be odd, got {}",
                self.dilation_kernel
            )));
        }
        if !(self.point_radius_px.is_finite() && self.point_radius_px > 0.0) {
            return Err(CinemagraphError::validation(format!(
                "point_radius_px must be positive, got {}",
                self.point_radius_px
            )));
        }
        if ![self.x_motion, self.y_motion, self.z_motion]
            .iter()
            .all(|v| v.is_finite())
        {
            return Err(CinemagraphError::validation("camera motion must be finite"));
        }
        if self.threading.threads == Some(0) {
            return Err(CinemagraphError::validation(
                "threading.threads must be >= 1 when set",
            ));
        }
        Ok(())
    }

    /// Path amplitude: the camera moves against `x_motion` along x.
    pub fn amplitude(&self) -> Vector3<f32> {
        Vector3::new(-self.x_motion, self.y_motion, self.z_motion)
    }

    /// Resolve the camera path generator. Fails with
    /// [`CinemagraphError::UnsupportedPathType`] on an unknown tag.
    pub fn camera_path(&self) -> CinemagraphResult<CameraPathGenerator> {
        Ok(CameraPathGenerator::from_tag(&self.path, self.amplitude())?.with_ease(self.ease))
    }

    /// `<label>_flow_scale=<flow_scale>.mp4`; the scale always carries a decimal point.
    pub fn video_file_name(&self, path_type: PathType) -> String {
        format!("{}_flow_scale={:?}.mp4", path_type.label(), self.flow_scale)
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
