use crate::scene::points::Side;

/// Numeric rule deciding how much each point sample contributes to a pixel.
///
/// The rasterizer composites each pass front to back with [`CompositingPolicy::sample_opacity`],
/// then mixes the passes with [`CompositingPolicy::side_weight`]. Implementations must keep
/// opacity non-decreasing in alpha and coverage, and must not favour a side that is temporally
/// farther from `time`.
pub trait CompositingPolicy: Send + Sync + std::fmt::Debug {
    /// Opacity of one sample given the point's alpha and its footprint coverage, both in `[0, 1]`.
    fn sample_opacity(&self, alpha: f32, coverage: f32) -> f32;

    /// Weight of a whole pass at normalized time `time` in `[0, 1]`.
    fn side_weight(&self, side: Side, time: f32) -> f32;
}

/// Default policy: opacity is `alpha * coverage` (capped below 1), the forward pass weighs
/// `1 - time` and the backward pass `time`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TemporalBlendPolicy {
    /// Opacity cap per sample, so one point never hides everything behind it.
    pub max_opacity: f32,
    /// Lower bound of a pass weight, so content seen by one pass only still shows near the ends.
    pub min_side_weight: f32,
}

impl Default for TemporalBlendPolicy {
    fn default() -> Self {
        Self {
            max_opacity: 0.99,
            min_side_weight: 1e-4,
        }
    }
}

impl CompositingPolicy for TemporalBlendPolicy {
    fn sample_opacity(&self, alpha: f32, coverage: f32) -> f32 {
        (alpha * coverage).clamp(0.0, self.max_opacity)
    }

    fn side_weight(&self, side: Side, time: f32) -> f32 {
        let t = time.clamp(0.0, 1.0);
        let w = match side {
            Side::Forward => 1.0 - t,
            Side::Backward => t,
        };
        w.max(self.min_side_weight)
    }
}

/// Hard single-pass choice: only the temporally closer pass contributes.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct NearestSidePolicy;

impl CompositingPolicy for NearestSidePolicy {
    fn sample_opacity(&self, alpha: f32, coverage: f32) -> f32 {
        (alpha * coverage).clamp(0.0, 0.99)
    }

    fn side_weight(&self, side: Side, time: f32) -> f32 {
        let forward_wins = time < 0.5;
        match (side, forward_wins) {
            (Side::Forward, true) | (Side::Backward, false) => 1.0,
            _ => 0.0,
        }
    }
}
