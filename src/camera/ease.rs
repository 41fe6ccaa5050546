/// Easing curves used to shape camera motion over normalized path time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Ease {
    /// Constant velocity.
    Linear,
    /// Quadratic ease-in/out.
    InOutQuad,
    /// Cubic ease-in/out.
    InOutCubic,
    /// Half-cosine ease-in/out.
    InOutSine,
}

impl Ease {
    /// Map normalized progress `t` in `[0, 1]` (clamped) to eased progress.
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::InOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - ((-2.0 * t + 2.0).powi(2) / 2.0)
                }
            }
            Self::InOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - ((-2.0 * t + 2.0).powi(3) / 2.0)
                }
            }
            Self::InOutSine => 0.5 - 0.5 * (std::f64::consts::PI * t).cos(),
        }
    }

    /// Whether the curve starts and ends with zero velocity.
    pub fn is_smooth_at_ends(self) -> bool {
        !matches!(self, Self::Linear)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/camera/ease.rs"]
mod tests;
