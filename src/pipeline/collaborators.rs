use std::path::PathBuf;

use crate::flow::field::FlowField;
use crate::foundation::core::Grid;
use crate::foundation::error::{CinemagraphError, CinemagraphResult};
use crate::pipeline::flo::load_flo;
use crate::scene::depth::load_disparity_png;
use crate::scene::layers::{Layer, LayeredScene};

/// Produces a dense depth map for a photo.
pub trait DepthEstimator: Send + Sync {
    /// Depth for `rgb` (3 channels), at the same resolution.
    fn estimate_depth(&self, rgb: &Grid<f32>) -> CinemagraphResult<Grid<f32>>;
}

/// Splits a photo with depth into depth-ordered layers, inpainting what the photo hides.
pub trait SceneDecomposer: Send + Sync {
    /// Layered scene whose base layer is the observed photo.
    fn decompose(&self, rgb: &Grid<f32>, depth: Grid<f32>) -> CinemagraphResult<LayeredScene>;
}

/// Produces the per-pixel motion of the base layer, in pixels per frame.
pub trait SceneFlowEstimator: Send + Sync {
    /// Flow at the scene resolution.
    fn estimate_flow(&self, scene: &LayeredScene) -> CinemagraphResult<FlowField>;
}

/// The external models one run calls, each exactly once, before the first frame.
pub struct Collaborators {
    /// Depth source.
    pub depth: Box<dyn DepthEstimator>,
    /// Layering and inpainting.
    pub decomposer: Box<dyn SceneDecomposer>,
    /// Motion source.
    pub flow: Box<dyn SceneFlowEstimator>,
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}

/// Depth read from a 16-bit disparity PNG, resampled to the photo.
#[derive(Clone, Debug)]
pub struct DisparityPngDepth {
    path: PathBuf,
}

impl DisparityPngDepth {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DepthEstimator for DisparityPngDepth {
    fn estimate_depth(&self, rgb: &Grid<f32>) -> CinemagraphResult<Grid<f32>> {
        load_disparity_png(&self.path, Some((rgb.width(), rgb.height())))
    }
}

/// The same depth at every pixel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConstantDepth(f32);

impl ConstantDepth {
    /// Fails with [`CinemagraphError::Validation`] unless `depth` is finite and positive.
    pub fn new(depth: f32) -> CinemagraphResult<Self> {
        if !(depth.is_finite() && depth > 0.0) {
            return Err(CinemagraphError::validation(format!(
                "constant depth must be positive, got {depth}"
            )));
        }
        Ok(Self(depth))
    }
}

impl DepthEstimator for ConstantDepth {
    fn estimate_depth(&self, rgb: &Grid<f32>) -> CinemagraphResult<Grid<f32>> {
        Ok(Grid::filled(rgb.width(), rgb.height(), 1, self.0))
    }
}

/// The whole photo as one opaque, fully valid layer.
#[derive(Clone, Copy, Debug, Default)]
pub struct SingleLayerDecomposer;

impl SceneDecomposer for SingleLayerDecomposer {
    fn decompose(&self, rgb: &Grid<f32>, depth: Grid<f32>) -> CinemagraphResult<LayeredScene> {
        LayeredScene::new(vec![Layer::opaque(rgb, depth)?])
    }
}

/// Flow read from a Middlebury `.flo` file and resampled to the scene.
#[derive(Clone, Debug)]
pub struct FloFlowReader {
    path: PathBuf,
}

impl FloFlowReader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SceneFlowEstimator for FloFlowReader {
    fn estimate_flow(&self, scene: &LayeredScene) -> CinemagraphResult<FlowField> {
        let field = load_flo(&self.path)?;
        if field.canvas() != scene.canvas() {
            tracing::debug!(
                from = ?field.canvas(),
                to = ?scene.canvas(),
                "resampling flow to scene resolution"
            );
        }
        field.resampled(scene.canvas())
    }
}

/// A still scene.
#[derive(Clone, Copy, Debug, Default)]
pub struct ZeroFlow;

impl SceneFlowEstimator for ZeroFlow {
    fn estimate_flow(&self, scene: &LayeredScene) -> CinemagraphResult<FlowField> {
        Ok(FlowField::zeros(scene.canvas()))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/collaborators.rs"]
mod tests;
