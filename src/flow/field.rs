use crate::foundation::core::{Canvas, Grid};
use crate::foundation::error::{CinemagraphError, CinemagraphResult};

/// Dense in-plane velocity, in source pixels per step, aligned to the source image.
///
/// Always two channels (`dx`, `dy`) and always finite.
#[derive(Clone, Debug, PartialEq)]
pub struct FlowField {
    grid: Grid<f32>,
}

impl FlowField {
    /// Wrap a two-channel grid, rejecting NaN or infinite vectors.
    pub fn new(grid: Grid<f32>) -> CinemagraphResult<Self> {
        if grid.channels() != 2 {
            return Err(CinemagraphError::validation(format!(
                "flow field must have 2 channels, got {}",
                grid.channels()
            )));
        }
        if let Some((x, y)) = grid.first_non_finite() {
            return Err(CinemagraphError::NonFiniteField {
                what: "flow field",
                x,
                y,
            });
        }
        Ok(Self { grid })
    }

    /// Motionless field.
    pub fn zeros(canvas: Canvas) -> Self {
        Self {
            grid: Grid::filled(canvas.width, canvas.height, 2, 0.0),
        }
    }

    /// Field with the same vector at every pixel.
    pub fn uniform(canvas: Canvas, v: [f32; 2]) -> CinemagraphResult<Self> {
        let data = std::iter::repeat_n(v, canvas.pixel_count())
            .flatten()
            .collect();
        Self::new(Grid::new(canvas.width, canvas.height, 2, data)?)
    }

    /// Pixel dimensions.
    pub fn canvas(&self) -> Canvas {
        self.grid.canvas()
    }

    /// Underlying two-channel grid.
    pub fn grid(&self) -> &Grid<f32> {
        &self.grid
    }

    /// Velocity at a pixel.
    #[inline]
    pub fn at(&self, x: u32, y: u32) -> [f32; 2] {
        let v = self.grid.pixel(x, y);
        [v[0], v[1]]
    }

    /// Field with every vector multiplied by `s`.
    pub fn scaled(&self, s: f32) -> CinemagraphResult<Self> {
        Self::new(self.grid.map(|v| v * s))
    }

    /// Field pointing the other way.
    pub fn negated(&self) -> Self {
        Self {
            grid: self.grid.map(|v| -v),
        }
    }

    /// Resample to `canvas`, scaling vectors by the size ratio so they stay in pixels.
    pub fn resampled(&self, canvas: Canvas) -> CinemagraphResult<Self> {
        let src = self.canvas();
        if src == canvas {
            return Ok(self.clone());
        }
        if src.is_empty() {
            return Ok(Self::zeros(canvas));
        }
        let resized = self.grid.resize_bilinear(canvas.width, canvas.height);
        let sx = canvas.width as f32 / src.width as f32;
        let sy = canvas.height as f32 / src.height as f32;
        let data = resized
            .data()
            .chunks_exact(2)
            .flat_map(|v| [v[0] * sx, v[1] * sy])
            .collect();
        Self::new(Grid::new(canvas.width, canvas.height, 2, data)?)
    }
}
