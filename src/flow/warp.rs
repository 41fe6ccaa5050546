use rayon::prelude::*;

use crate::camera::intrinsics::Intrinsics;
use crate::camera::pose::Pose;
use crate::flow::integrate::IntegratedDisplacement;
use crate::flow::morph::{Kernel, dilate};
use crate::foundation::core::{Canvas, Grid};
use crate::foundation::error::{CinemagraphError, CinemagraphResult};
use crate::scene::layers::LayeredScene;
use crate::scene::points::{FlowedPoint, FlowedPointSet, PointSet, Side};

/// Moves the static point cloud along an integrated displacement.
///
/// The flow is defined on the observed (base layer) pixels. Background layers revealed by the
/// motion borrow the flow of their observed neighbours within the dilation kernel, so layer
/// boundaries move together instead of tearing apart.
#[derive(Clone, Debug)]
pub struct SceneFlowWarper {
    intrinsics: Intrinsics,
    pose: Pose,
    kernel: Kernel,
    support: Grid<bool>,
    dilated_support: Grid<bool>,
    layer_count: usize,
}

impl SceneFlowWarper {
    /// Warper for `scene`, viewed by the source camera `intrinsics`/`pose`.
    pub fn new(
        scene: &LayeredScene,
        intrinsics: Intrinsics,
        pose: Pose,
        kernel: Kernel,
    ) -> Self {
        let support = scene.base().mask().clone();
        let dilated_support = dilate(&support, kernel);
        Self {
            intrinsics,
            pose,
            kernel,
            support,
            dilated_support,
            layer_count: scene.len(),
        }
    }

    /// Pixel dimensions of the scene.
    pub fn canvas(&self) -> Canvas {
        self.support.canvas()
    }

    /// Dilation kernel.
    pub fn kernel(&self) -> Kernel {
        self.kernel
    }

    /// Whether `layer` takes part in a pass.
    pub fn warps_layer(layer: u16, with_inpainted: bool) -> bool {
        layer == 0 || with_inpainted
    }

    /// Displacement of background layers: the flow itself on observed pixels, the mean of
    /// observed neighbours inside the dilated support, zero elsewhere.
    pub fn extend_displacement(
        &self,
        displacement: &IntegratedDisplacement,
    ) -> CinemagraphResult<Grid<f32>> {
        let canvas = self.canvas();
        let (w, h) = (canvas.width, canvas.height);
        let r = self.kernel.radius();
        let data: Vec<f32> = (0..h)
            .into_par_iter()
            .flat_map_iter(|y| {
                (0..w).flat_map(move |x| {
                    if self.support.at(x, y) {
                        return displacement.at(x, y);
                    }
                    if !self.dilated_support.at(x, y) {
                        return [0.0, 0.0];
                    }
                    let mut sum = [0.0f32; 2];
                    let mut count = 0u32;
                    for yy in y.saturating_sub(r)..=(y + r).min(h - 1) {
                        for xx in x.saturating_sub(r)..=(x + r).min(w - 1) {
                            if self.support.at(xx, yy) {
                                let d = displacement.at(xx, yy);
                                sum[0] += d[0];
                                sum[1] += d[1];
                                count += 1;
                            }
                        }
                    }
                    if count == 0 {
                        [0.0, 0.0]
                    } else {
                        [sum[0] / count as f32, sum[1] / count as f32]
                    }
                })
            })
            .collect();
        Grid::new(w, h, 2, data)
    }

    /// Warp `points` for one pass.
    ///
    /// Every produced point is labelled with `side`. Only the base layer warps unless
    /// `with_inpainted` is set.
    #[tracing::instrument(skip(self, points, displacement), fields(steps = displacement.steps()))]
    pub fn warp(
        &self,
        points: &PointSet,
        side: Side,
        displacement: &IntegratedDisplacement,
        with_inpainted: bool,
    ) -> CinemagraphResult<FlowedPointSet> {
        if displacement.canvas() != self.canvas() {
            return Err(CinemagraphError::validation(format!(
                "displacement is {:?}, scene is {:?}",
                displacement.canvas(),
                self.canvas()
            )));
        }
        let extended = if with_inpainted && self.layer_count > 1 {
            Some(self.extend_displacement(displacement)?)
        } else {
            None
        };

        let warped: Vec<(usize, FlowedPoint)> = points
            .points()
            .par_iter()
            .enumerate()
            .filter(|(_, p)| Self::warps_layer(p.layer, with_inpainted))
            .map(|(i, p)| {
                let [x, y] = p.pixel;
                let d = match (&extended, p.layer) {
                    (Some(ext), l) if l > 0 => {
                        let v = ext.pixel(x, y);
                        [v[0], v[1]]
                    }
                    _ => displacement.at(x, y),
                };
                let cam = self
                    .intrinsics
                    .unproject(x as f32 + d[0], y as f32 + d[1], p.depth);
                let point = FlowedPoint {
                    position: self.pose.transform_point(&cam),
                    color: p.color,
                    alpha: p.alpha,
                    layer: p.layer,
                    side,
                    flow: d,
                };
                (i, point)
            })
            .collect();

        let mut features = Vec::with_capacity(warped.len() * points.feature_dim());
        for (i, _) in &warped {
            features.extend_from_slice(points.features_of(*i));
        }
        let flowed = warped.into_iter().map(|(_, p)| p).collect();
        FlowedPointSet::from_parts(points.feature_dim(), flowed, features)
    }

    /// Concatenate the forward and backward passes. Fails with
    /// [`CinemagraphError::EmptySceneFlow`] when both are empty.
    pub fn combine(
        &self,
        forward: FlowedPointSet,
        backward: FlowedPointSet,
        with_inpainted: bool,
    ) -> CinemagraphResult<FlowedPointSet> {
        if forward.is_empty() && backward.is_empty() {
            let layers = if with_inpainted {
                format!("layers 0..{}", self.layer_count)
            } else {
                "layer 0".to_string()
            };
            return Err(CinemagraphError::empty_scene_flow(format!(
                "forward and backward passes produced no points ({layers}, {} valid base pixels)",
                self.support.data().iter().filter(|&&m| m).count()
            )));
        }
        if forward.feature_dim() != backward.feature_dim() {
            return Err(CinemagraphError::validation(format!(
                "forward pass has {} feature channels, backward pass {}",
                forward.feature_dim(),
                backward.feature_dim()
            )));
        }
        Ok(forward.concat(backward))
    }

    /// Run both passes and combine them.
    pub fn warp_both(
        &self,
        points: &PointSet,
        forward: &IntegratedDisplacement,
        backward: &IntegratedDisplacement,
        with_inpainted: bool,
    ) -> CinemagraphResult<FlowedPointSet> {
        let f = self.warp(points, Side::Forward, forward, with_inpainted)?;
        let b = self.warp(points, Side::Backward, backward, with_inpainted)?;
        tracing::debug!(
            forward = f.len(),
            backward = b.len(),
            "scene flow passes warped"
        );
        self.combine(f, b, with_inpainted)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/flow/warp.rs"]
mod tests;
