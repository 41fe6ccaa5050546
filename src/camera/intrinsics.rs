use nalgebra::{Matrix3, Point2, Point3};

use crate::foundation::core::Canvas;
use crate::foundation::error::{CinemagraphError, CinemagraphResult};

/// Pinhole intrinsics mapping camera space to pixel space.
///
/// ```text
/// [fx  0 cx]
/// [ 0 fy cy]
/// [ 0  0  1]
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Intrinsics {
    /// Focal length along x, in pixels.
    pub fx: f32,
    /// Focal length along y, in pixels.
    pub fy: f32,
    /// Principal point x, in pixels.
    pub cx: f32,
    /// Principal point y, in pixels.
    pub cy: f32,
}

impl Intrinsics {
    /// Build intrinsics, rejecting non-positive or non-finite focal lengths.
    pub fn new(fx: f32, fy: f32, cx: f32, cy: f32) -> CinemagraphResult<Self> {
        if !(fx.is_finite() && fy.is_finite() && fx > 0.0 && fy > 0.0) {
            return Err(CinemagraphError::validation(format!(
                "intrinsics focal lengths must be positive and finite, got ({fx}, {fy})"
            )));
        }
        if !(cx.is_finite() && cy.is_finite()) {
            return Err(CinemagraphError::validation(
                "intrinsics principal point must be finite",
            ));
        }
        Ok(Self { fx, fy, cx, cy })
    }

    /// Default intrinsics for an image: `focal = max(w, h)`, principal point at the
    /// (integer) image center.
    pub fn from_canvas(canvas: Canvas) -> Self {
        let focal = canvas.width.max(canvas.height).max(1) as f32;
        Self {
            fx: focal,
            fy: focal,
            cx: (canvas.width / 2) as f32,
            cy: (canvas.height / 2) as f32,
        }
    }

    /// Read intrinsics from a 3x3 calibration matrix.
    pub fn from_matrix(k: &Matrix3<f32>) -> CinemagraphResult<Self> {
        Self::new(k[(0, 0)], k[(1, 1)], k[(0, 2)], k[(1, 2)])
    }

    /// The 3x3 calibration matrix.
    pub fn matrix(&self) -> Matrix3<f32> {
        Matrix3::new(
            self.fx, 0.0, self.cx, //
            0.0, self.fy, self.cy, //
            0.0, 0.0, 1.0,
        )
    }

    /// Lift pixel `(u, v)` at camera-space depth `z` into camera space.
    #[inline]
    pub fn unproject(&self, u: f32, v: f32, z: f32) -> Point3<f32> {
        Point3::new((u - self.cx) / self.fx * z, (v - self.cy) / self.fy * z, z)
    }

    /// Project a camera-space point. `None` when the point is not in front of the camera.
    #[inline]
    pub fn project(&self, p: &Point3<f32>) -> Option<Point2<f32>> {
        if p.z <= 0.0 || !p.z.is_finite() {
            return None;
        }
        Some(Point2::new(
            self.fx * p.x / p.z + self.cx,
            self.fy * p.y / p.z + self.cy,
        ))
    }
}
