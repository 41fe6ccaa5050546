use rayon::prelude::*;

use crate::flow::field::FlowField;
use crate::foundation::core::{Canvas, Grid};
use crate::foundation::error::{CinemagraphError, CinemagraphResult};

/// Explicit Euler variant used to accumulate the flow field.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EulerScheme {
    /// The field is added `n` times at the starting pixel; never re-sampled.
    #[default]
    FixedField,
    /// The field is re-sampled at the rounded current position every step; trajectories that
    /// leave the image are reset to zero displacement.
    Advected,
}

/// Cumulative per-pixel displacement after a signed number of Euler steps.
#[derive(Clone, Debug, PartialEq)]
pub struct IntegratedDisplacement {
    steps: i64,
    grid: Grid<f32>,
}

impl IntegratedDisplacement {
    /// Zero displacement over `canvas`.
    pub fn zeros(canvas: Canvas) -> Self {
        Self {
            steps: 0,
            grid: Grid::filled(canvas.width, canvas.height, 2, 0.0),
        }
    }

    /// Signed step count this displacement was integrated for.
    pub fn steps(&self) -> i64 {
        self.steps
    }

    /// Pixel dimensions.
    pub fn canvas(&self) -> Canvas {
        self.grid.canvas()
    }

    /// Two-channel displacement grid.
    pub fn grid(&self) -> &Grid<f32> {
        &self.grid
    }

    /// Displacement at a pixel.
    #[inline]
    pub fn at(&self, x: u32, y: u32) -> [f32; 2] {
        let v = self.grid.pixel(x, y);
        [v[0], v[1]]
    }

    /// Whether every vector is exactly zero.
    pub fn is_zero(&self) -> bool {
        self.grid.data().iter().all(|&v| v == 0.0)
    }
}

/// Euler-integrates a static flow field for a signed step count.
#[derive(Clone, Debug)]
pub struct FlowIntegrator {
    field: FlowField,
    scheme: EulerScheme,
}

impl FlowIntegrator {
    /// Integrator over `field`.
    pub fn new(field: FlowField, scheme: EulerScheme) -> Self {
        Self { field, scheme }
    }

    /// The velocity field.
    pub fn field(&self) -> &FlowField {
        &self.field
    }

    /// Active scheme.
    pub fn scheme(&self) -> EulerScheme {
        self.scheme
    }

    /// Steps of the forward pass for frame `index`, anchored at `start`.
    pub fn forward_steps(index: u64, start: u64) -> i64 {
        index as i64 - start as i64
    }

    /// Steps of the backward pass for frame `index`, anchored at the last frame `end`.
    ///
    /// One step more than the distance, so the backward pass fully crosses the step at which
    /// the two passes swap roles.
    pub fn backward_steps(index: u64, end: u64) -> i64 {
        end as i64 - index as i64 + 1
    }

    /// Displacement after `steps` Euler steps. Negative steps integrate the negated field;
    /// zero steps yield zero displacement.
    pub fn integrate(&self, steps: i64) -> CinemagraphResult<IntegratedDisplacement> {
        let canvas = self.field.canvas();
        if steps == 0 {
            return Ok(IntegratedDisplacement::zeros(canvas));
        }
        let sign = if steps < 0 { -1.0f32 } else { 1.0 };
        let n = steps.unsigned_abs();
        let field = &self.field;

        let data: Vec<f32> = (0..canvas.height)
            .into_par_iter()
            .flat_map_iter(|y| {
                (0..canvas.width).flat_map(move |x| match self.scheme {
                    EulerScheme::FixedField => fixed_field_at(field, x, y, sign, n),
                    EulerScheme::Advected => advected_at(field, x, y, sign, n),
                })
            })
            .collect();
        let grid = Grid::new(canvas.width, canvas.height, 2, data)?;

        if let Some((x, y)) = grid.first_non_finite() {
            return Err(CinemagraphError::NonFiniteField {
                what: "integrated displacement",
                x,
                y,
            });
        }
        Ok(IntegratedDisplacement { steps, grid })
    }

    /// Forward-pass displacement for frame `index` of a trajectory starting at `start`.
    pub fn forward(&self, index: u64, start: u64) -> CinemagraphResult<IntegratedDisplacement> {
        self.integrate(Self::forward_steps(index, start))
    }

    /// Backward-pass displacement for frame `index` of a trajectory ending at `end`: the
    /// negated field integrated for [`FlowIntegrator::backward_steps`] steps.
    pub fn backward(&self, index: u64, end: u64) -> CinemagraphResult<IntegratedDisplacement> {
        self.integrate(-Self::backward_steps(index, end))
    }
}

fn fixed_field_at(field: &FlowField, x: u32, y: u32, sign: f32, n: u64) -> [f32; 2] {
    let v = field.at(x, y);
    let mut d = [0.0f32; 2];
    for _ in 0..n {
        d[0] += sign * v[0];
        d[1] += sign * v[1];
    }
    d
}

fn advected_at(field: &FlowField, x: u32, y: u32, sign: f32, n: u64) -> [f32; 2] {
    let canvas = field.canvas();
    let (max_x, max_y) = ((canvas.width - 1) as f32, (canvas.height - 1) as f32);
    let (mut px, mut py) = (x as f32, y as f32);
    for _ in 0..n {
        let v = field.at(px.round() as u32, py.round() as u32);
        px += sign * v[0];
        py += sign * v[1];
        if !(0.0..=max_x).contains(&px) || !(0.0..=max_y).contains(&py) {
            return [0.0, 0.0];
        }
    }
    [px - x as f32, py - y as f32]
}

#[cfg(test)]
#[path = "../../tests/unit/flow/integrate.rs"]
mod tests;
