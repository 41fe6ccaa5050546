use std::str::FromStr;

use nalgebra::Vector3;

use crate::camera::ease::Ease;
use crate::camera::pose::Pose;
use crate::foundation::error::{CinemagraphError, CinemagraphResult};
use crate::foundation::math::linspace_unit;

/// Registered camera trajectories.
///
/// Every trajectory starts at the source camera (identity) at `t = 0`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PathType {
    /// Out along the amplitude and back, easing at both ends and at the turn.
    DoubleStraightLine,
    /// One-way eased move to the amplitude.
    StraightLine,
    /// Closed loop in the x/y plane with a forward bulge along z.
    Circle,
    /// Eased dolly along the optical axis, using the z amplitude.
    ZoomIn,
    /// Vertical out-and-back, using the y amplitude.
    UpDown,
}

impl PathType {
    /// Every registered trajectory.
    pub const ALL: [PathType; 5] = [
        Self::DoubleStraightLine,
        Self::StraightLine,
        Self::Circle,
        Self::ZoomIn,
        Self::UpDown,
    ];

    /// Registry tag.
    pub fn tag(self) -> &'static str {
        match self {
            Self::DoubleStraightLine => "double-straight-line",
            Self::StraightLine => "straight-line",
            Self::Circle => "circle",
            Self::ZoomIn => "zoom-in",
            Self::UpDown => "up-down",
        }
    }

    /// Short label used in output file names.
    pub fn label(self) -> &'static str {
        match self {
            Self::DoubleStraightLine => "side",
            other => other.tag(),
        }
    }
}

impl FromStr for PathType {
    type Err = CinemagraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.tag() == s)
            .ok_or_else(|| CinemagraphError::UnsupportedPathType(s.to_owned()))
    }
}

impl std::fmt::Display for PathType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// Ordered camera poses for one trajectory, one per output frame.
#[derive(Clone, Debug)]
pub struct CameraPath {
    /// Trajectory that produced the poses.
    pub path_type: PathType,
    /// Normalized path time of each frame.
    pub times: Vec<f64>,
    /// Camera-to-source transform of each frame.
    pub poses: Vec<Pose>,
}

impl CameraPath {
    /// Number of frames.
    pub fn len(&self) -> usize {
        self.poses.len()
    }

    /// Whether the path holds no frame.
    pub fn is_empty(&self) -> bool {
        self.poses.is_empty()
    }
}

/// Deterministic camera trajectory sampler.
#[derive(Clone, Copy, Debug)]
pub struct CameraPathGenerator {
    path_type: PathType,
    amplitude: Vector3<f32>,
    ease: Ease,
}

impl CameraPathGenerator {
    /// Sampler for `path_type` with per-axis `amplitude` (source-camera units).
    pub fn new(path_type: PathType, amplitude: Vector3<f32>) -> Self {
        Self {
            path_type,
            amplitude,
            ease: Ease::InOutCubic,
        }
    }

    /// Resolve a path tag first; unknown tags fail with
    /// [`CinemagraphError::UnsupportedPathType`].
    pub fn from_tag(tag: &str, amplitude: Vector3<f32>) -> CinemagraphResult<Self> {
        Ok(Self::new(tag.parse()?, amplitude))
    }

    /// Override the easing curve of the eased trajectories.
    pub fn with_ease(mut self, ease: Ease) -> Self {
        self.ease = ease;
        self
    }

    /// Trajectory being sampled.
    pub fn path_type(&self) -> PathType {
        self.path_type
    }

    /// Camera position offset at normalized time `t` (clamped to `[0, 1]`).
    pub fn offset_at(&self, t: f64) -> Vector3<f32> {
        use std::f64::consts::PI;

        let t = t.clamp(0.0, 1.0);
        let a = self.amplitude.cast::<f64>();
        let out_and_back = || {
            let phase = if t <= 0.5 { 2.0 * t } else { 2.0 - 2.0 * t };
            self.ease.apply(phase)
        };
        let v = match self.path_type {
            PathType::DoubleStraightLine => a * out_and_back(),
            PathType::StraightLine => a * self.ease.apply(t),
            PathType::Circle => Vector3::new(
                a.x * (2.0 * PI * t).sin(),
                a.y * 0.5 * (1.0 - (2.0 * PI * t).cos()),
                a.z * (PI * t).sin(),
            ),
            PathType::ZoomIn => Vector3::new(0.0, 0.0, a.z * self.ease.apply(t)),
            PathType::UpDown => Vector3::new(0.0, a.y * out_and_back(), 0.0),
        };
        v.cast::<f32>()
    }

    /// Camera-to-source transform at normalized time `t`.
    pub fn pose_at(&self, t: f64) -> Pose {
        Pose::from_translation(self.offset_at(t))
    }

    /// Sample `n_frames` poses at evenly spaced times over `[0, 1]`.
    pub fn generate(&self, n_frames: usize) -> CameraPath {
        let times = linspace_unit(n_frames);
        let poses = times.iter().map(|&t| self.pose_at(t)).collect();
        CameraPath {
            path_type: self.path_type,
            times,
            poses,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/camera/path.rs"]
mod tests;
