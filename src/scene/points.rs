use std::ops::Range;

use nalgebra::Point3;

use crate::foundation::error::{CinemagraphError, CinemagraphResult};

/// Which temporal integration pass produced a point.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Side {
    /// Integrated forward from the first frame.
    Forward,
    /// Integrated backward from the last frame.
    Backward,
}

impl Side {
    /// Both sides, forward first.
    pub const BOTH: [Side; 2] = [Side::Forward, Side::Backward];

    /// `0` for forward, `1` for backward.
    pub fn index(self) -> usize {
        match self {
            Self::Forward => 0,
            Self::Backward => 1,
        }
    }

    /// Human-readable pass name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Forward => "forward",
            Self::Backward => "backward",
        }
    }
}

/// A point lifted from one valid layer pixel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point {
    /// World-space position.
    pub position: Point3<f32>,
    /// Straight RGB in `[0, 1]`.
    pub color: [f32; 3],
    /// Opacity in `[0, 1]`.
    pub alpha: f32,
    /// Source layer.
    pub layer: u16,
    /// Source pixel `(x, y)`.
    pub pixel: [u32; 2],
    /// Source camera-space depth.
    pub depth: f32,
}

/// Static point cloud of a layered scene.
///
/// Points are ordered by layer, then by pixel scan order. Feature vectors are stored flat,
/// `feature_dim` values per point, in point order.
#[derive(Clone, Debug, Default)]
pub struct PointSet {
    feature_dim: usize,
    points: Vec<Point>,
    features: Vec<f32>,
    layer_ranges: Vec<Range<usize>>,
}

impl PointSet {
    /// Empty set without layers.
    pub fn new(feature_dim: usize) -> Self {
        Self {
            feature_dim,
            ..Self::default()
        }
    }

    /// Append the points of the next layer. `features` holds `feature_dim` values per point.
    pub(crate) fn push_layer(&mut self, points: Vec<Point>, features: Vec<f32>) {
        debug_assert_eq!(features.len(), points.len() * self.feature_dim);
        let start = self.points.len();
        self.points.extend(points);
        self.features.extend(features);
        self.layer_ranges.push(start..self.points.len());
    }

    /// Feature values per point.
    pub fn feature_dim(&self) -> usize {
        self.feature_dim
    }

    /// All points.
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Feature vector of point `i`.
    pub fn features_of(&self, i: usize) -> &[f32] {
        &self.features[i * self.feature_dim..(i + 1) * self.feature_dim]
    }

    /// Index range of each layer's points.
    pub fn layer_ranges(&self) -> &[Range<usize>] {
        &self.layer_ranges
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether there is no point.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// A point displaced by one integration pass, tagged with the pass that produced it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlowedPoint {
    /// World-space position after displacement.
    pub position: Point3<f32>,
    /// Straight RGB in `[0, 1]`.
    pub color: [f32; 3],
    /// Opacity in `[0, 1]`.
    pub alpha: f32,
    /// Source layer.
    pub layer: u16,
    /// Producing pass.
    pub side: Side,
    /// Applied in-plane displacement, in source pixels.
    pub flow: [f32; 2],
}

/// Output of the scene-flow warper, possibly holding both passes.
#[derive(Clone, Debug, Default)]
pub struct FlowedPointSet {
    feature_dim: usize,
    points: Vec<FlowedPoint>,
    features: Vec<f32>,
}

impl FlowedPointSet {
    /// Empty set.
    pub fn empty(feature_dim: usize) -> Self {
        Self {
            feature_dim,
            points: Vec::new(),
            features: Vec::new(),
        }
    }

    /// Wrap points and their flat features (`feature_dim` values per point).
    pub fn from_parts(
        feature_dim: usize,
        points: Vec<FlowedPoint>,
        features: Vec<f32>,
    ) -> CinemagraphResult<Self> {
        if features.len() != points.len() * feature_dim {
            return Err(CinemagraphError::validation(format!(
                "expected {} feature values for {} points, got {}",
                points.len() * feature_dim,
                points.len(),
                features.len()
            )));
        }
        Ok(Self {
            feature_dim,
            points,
            features,
        })
    }

    /// Concatenate `other` after `self`. Side labels travel with each point.
    pub fn concat(mut self, other: FlowedPointSet) -> Self {
        debug_assert_eq!(self.feature_dim, other.feature_dim);
        self.points.extend(other.points);
        self.features.extend(other.features);
        self
    }

    /// Feature values per point.
    pub fn feature_dim(&self) -> usize {
        self.feature_dim
    }

    /// All points.
    pub fn points(&self) -> &[FlowedPoint] {
        &self.points
    }

    /// Flat feature storage, `feature_dim` values per point.
    pub fn features(&self) -> &[f32] {
        &self.features
    }

    /// Feature vector of point `i`.
    pub fn features_of(&self, i: usize) -> &[f32] {
        &self.features[i * self.feature_dim..(i + 1) * self.feature_dim]
    }

    /// Side label of every point, in point order.
    pub fn side_tags(&self) -> Vec<Side> {
        self.points.iter().map(|p| p.side).collect()
    }

    /// Number of points produced by `side`.
    pub fn count_side(&self, side: Side) -> usize {
        self.points.iter().filter(|p| p.side == side).count()
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether there is no point.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
