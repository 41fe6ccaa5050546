use crate::foundation::core::{Canvas, Grid};
use crate::foundation::error::{CinemagraphError, CinemagraphResult};

/// One depth-ordered slice of the decomposed photo.
///
/// All maps share the same pixel dimensions.
#[derive(Clone, Debug)]
pub struct Layer {
    rgba: Grid<f32>,
    depth: Grid<f32>,
    features: Grid<f32>,
    mask: Grid<bool>,
}

impl Layer {
    /// Assemble a layer from `rgba` (4 channels), `depth` (1), `features` (any count,
    /// possibly 0) and a binary `mask` (1).
    pub fn new(
        rgba: Grid<f32>,
        depth: Grid<f32>,
        features: Grid<f32>,
        mask: Grid<bool>,
    ) -> CinemagraphResult<Self> {
        if rgba.channels() != 4 {
            return Err(CinemagraphError::validation(format!(
                "layer rgba must have 4 channels, got {}",
                rgba.channels()
            )));
        }
        if depth.channels() != 1 || mask.channels() != 1 {
            return Err(CinemagraphError::validation(
                "layer depth and mask must have 1 channel",
            ));
        }
        if !(rgba.same_canvas(&depth) && rgba.same_canvas(&features) && rgba.same_canvas(&mask)) {
            return Err(CinemagraphError::validation(format!(
                "layer maps must share one shape: rgba {:?}, depth {:?}, features {:?}, mask {:?}",
                rgba.canvas(),
                depth.canvas(),
                features.canvas(),
                mask.canvas()
            )));
        }
        Ok(Self {
            rgba,
            depth,
            features,
            mask,
        })
    }

    /// Fully opaque, fully valid layer without features.
    pub fn opaque(rgb: &Grid<f32>, depth: Grid<f32>) -> CinemagraphResult<Self> {
        if rgb.channels() != 3 {
            return Err(CinemagraphError::validation(format!(
                "rgb map must have 3 channels, got {}",
                rgb.channels()
            )));
        }
        let rgba = rgb
            .data()
            .chunks_exact(3)
            .flat_map(|c| [c[0], c[1], c[2], 1.0])
            .collect();
        let rgba = Grid::new(rgb.width(), rgb.height(), 4, rgba)?;
        let features = Grid::new(rgb.width(), rgb.height(), 0, Vec::new())?;
        let mask = Grid::filled(rgb.width(), rgb.height(), 1, true);
        Self::new(rgba, depth, features, mask)
    }

    /// Pixel dimensions.
    pub fn canvas(&self) -> Canvas {
        self.rgba.canvas()
    }

    /// Straight-alpha RGBA map.
    pub fn rgba(&self) -> &Grid<f32> {
        &self.rgba
    }

    /// Camera-space depth map.
    pub fn depth(&self) -> &Grid<f32> {
        &self.depth
    }

    /// Feature embedding map.
    pub fn features(&self) -> &Grid<f32> {
        &self.features
    }

    /// Validity mask.
    pub fn mask(&self) -> &Grid<bool> {
        &self.mask
    }

    /// Feature channels per pixel.
    pub fn feature_dim(&self) -> usize {
        self.features.channels()
    }

    /// Number of pixels with `mask == 1`.
    pub fn valid_count(&self) -> usize {
        self.mask.data().iter().filter(|&&m| m).count()
    }
}

/// Ordered layers of one photo. Layer 0 is the observed content, later layers hold
/// disoccluded, inpainted background.
#[derive(Clone, Debug)]
pub struct LayeredScene {
    layers: Vec<Layer>,
}

impl LayeredScene {
    /// Validate that all layers share one canvas and one feature dimension.
    pub fn new(layers: Vec<Layer>) -> CinemagraphResult<Self> {
        let Some(first) = layers.first() else {
            return Err(CinemagraphError::validation(
                "layered scene needs at least one layer",
            ));
        };
        let canvas = first.canvas();
        let feature_dim = first.feature_dim();
        if canvas.is_empty() {
            return Err(CinemagraphError::validation(
                "layered scene canvas must be non-empty",
            ));
        }
        for (i, layer) in layers.iter().enumerate() {
            if layer.canvas() != canvas {
                return Err(CinemagraphError::validation(format!(
                    "layer {i} is {:?}, expected {:?}",
                    layer.canvas(),
                    canvas
                )));
            }
            if layer.feature_dim() != feature_dim {
                return Err(CinemagraphError::validation(format!(
                    "layer {i} has {} feature channels, expected {feature_dim}",
                    layer.feature_dim()
                )));
            }
        }
        Ok(Self { layers })
    }

    /// All layers, base first.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Directly observed layer.
    pub fn base(&self) -> &Layer {
        &self.layers[0]
    }

    /// Number of layers.
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Always `false`; a scene holds at least one layer.
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Shared pixel dimensions.
    pub fn canvas(&self) -> Canvas {
        self.base().canvas()
    }

    /// Shared feature dimension.
    pub fn feature_dim(&self) -> usize {
        self.base().feature_dim()
    }
}
