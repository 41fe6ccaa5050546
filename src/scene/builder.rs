use rayon::prelude::*;

use crate::camera::intrinsics::Intrinsics;
use crate::camera::pose::Pose;
use crate::foundation::error::{CinemagraphError, CinemagraphResult};
use crate::scene::layers::{Layer, LayeredScene};
use crate::scene::points::{Point, PointSet};

/// Per-layer outcome of a scene build.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BuildReport {
    /// Points produced per layer.
    pub points_per_layer: Vec<usize>,
    /// Valid pixels dropped for invalid depth, per layer.
    pub dropped_per_layer: Vec<usize>,
}

impl BuildReport {
    /// Total dropped pixels.
    pub fn dropped(&self) -> usize {
        self.dropped_per_layer.iter().sum()
    }
}

/// Lifts every valid pixel of every layer into a world-space point.
#[derive(Clone, Copy, Debug)]
pub struct LayeredSceneBuilder {
    intrinsics: Intrinsics,
    pose: Pose,
}

impl LayeredSceneBuilder {
    /// Builder for a source camera with `intrinsics` and camera-to-world `pose`.
    pub fn new(intrinsics: Intrinsics, pose: Pose) -> Self {
        Self { intrinsics, pose }
    }

    /// Source intrinsics.
    pub fn intrinsics(&self) -> &Intrinsics {
        &self.intrinsics
    }

    /// Source pose.
    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    /// Lift one pixel of `layer`. The caller has already checked the mask.
    ///
    /// Fails with [`CinemagraphError::InvalidDepth`] on non-positive or non-finite depth.
    pub fn unproject_pixel(
        &self,
        layer_idx: usize,
        layer: &Layer,
        x: u32,
        y: u32,
    ) -> CinemagraphResult<Point> {
        let depth = layer.depth().at(x, y);
        if !(depth.is_finite() && depth > 0.0) {
            return Err(CinemagraphError::InvalidDepth {
                layer: layer_idx,
                x,
                y,
                depth,
            });
        }
        let rgba = layer.rgba().pixel(x, y);
        let cam = self.intrinsics.unproject(x as f32, y as f32, depth);
        Ok(Point {
            position: self.pose.transform_point(&cam),
            color: [rgba[0], rgba[1], rgba[2]],
            alpha: rgba[3].clamp(0.0, 1.0),
            layer: layer_idx as u16,
            pixel: [x, y],
            depth,
        })
    }

    /// Build the point cloud of `scene`.
    ///
    /// Pixels with `mask == 0` are skipped; pixels with invalid depth are dropped and
    /// counted in the report. Output order is layer, then row, then column.
    #[tracing::instrument(skip_all, fields(layers = scene.len()))]
    pub fn build(&self, scene: &LayeredScene) -> CinemagraphResult<(PointSet, BuildReport)> {
        if scene.len() > usize::from(u16::MAX) {
            return Err(CinemagraphError::validation(format!(
                "too many layers: {}",
                scene.len()
            )));
        }

        let feature_dim = scene.feature_dim();
        let mut set = PointSet::new(feature_dim);
        let mut report = BuildReport::default();

        for (layer_idx, layer) in scene.layers().iter().enumerate() {
            let canvas = layer.canvas();
            let rows = (0..canvas.height)
                .into_par_iter()
                .map(|y| {
                    let mut points = Vec::new();
                    let mut features = Vec::new();
                    let mut dropped = 0usize;
                    for x in 0..canvas.width {
                        if !layer.mask().at(x, y) {
                            continue;
                        }
                        match self.unproject_pixel(layer_idx, layer, x, y) {
                            Ok(p) => {
                                points.push(p);
                                features.extend_from_slice(layer.features().pixel(x, y));
                            }
                            Err(CinemagraphError::InvalidDepth { .. }) => dropped += 1,
                            Err(e) => return Err(e),
                        }
                    }
                    Ok((points, features, dropped))
                })
                .collect::<CinemagraphResult<Vec<_>>>()?;

            let mut points = Vec::with_capacity(layer.valid_count());
            let mut features = Vec::with_capacity(layer.valid_count() * feature_dim);
            let mut dropped = 0usize;
            for (p, f, d) in rows {
                points.extend(p);
                features.extend(f);
                dropped += d;
            }

            if dropped > 0 {
                tracing::warn!(layer = layer_idx, dropped, "dropped pixels with invalid depth");
            }
            tracing::debug!(layer = layer_idx, points = points.len(), "layer lifted");

            report.points_per_layer.push(points.len());
            report.dropped_per_layer.push(dropped);
            set.push_layer(points, features);
        }

        Ok((set, report))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/builder.rs"]
mod tests;
