use nalgebra::{
    Isometry3, Matrix3, Matrix4, Point3, Rotation3, Translation3, UnitQuaternion, Vector3,
};

use crate::foundation::error::{CinemagraphError, CinemagraphResult};

/// Rigid camera-to-world transform.
///
/// The source camera is the world frame by convention, so the source pose is usually
/// [`Pose::identity`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pose(Isometry3<f32>);

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}

impl Pose {
    /// Identity transform.
    pub fn identity() -> Self {
        Self(Isometry3::identity())
    }

    /// Pure translation.
    pub fn from_translation(t: Vector3<f32>) -> Self {
        Self(Isometry3::from_parts(
            Translation3::from(t),
            UnitQuaternion::identity(),
        ))
    }

    /// Wrap an isometry.
    pub fn from_isometry(iso: Isometry3<f32>) -> Self {
        Self(iso)
    }

    /// Parse a 4x4 homogeneous matrix, rejecting anything that is not a rigid transform.
    pub fn from_matrix(m: &Matrix4<f32>) -> CinemagraphResult<Self> {
        const TOL: f32 = 1e-3;

        if m.iter().any(|v| !v.is_finite()) {
            return Err(CinemagraphError::validation("pose matrix must be finite"));
        }
        let bottom = m.fixed_view::<1, 4>(3, 0);
        if (bottom[(0, 0)].abs() + bottom[(0, 1)].abs() + bottom[(0, 2)].abs()) > TOL
            || (bottom[(0, 3)] - 1.0).abs() > TOL
        {
            return Err(CinemagraphError::validation(
                "pose matrix bottom row must be [0 0 0 1]",
            ));
        }
        let r: Matrix3<f32> = m.fixed_view::<3, 3>(0, 0).into_owned();
        if (r.transpose() * r - Matrix3::identity()).norm() > TOL || r.determinant() <= 0.0 {
            return Err(CinemagraphError::validation(
                "pose rotation block must be orthonormal with determinant +1",
            ));
        }
        let t = Vector3::new(m[(0, 3)], m[(1, 3)], m[(2, 3)]);
        let rotation =
            UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(r));
        Ok(Self(Isometry3::from_parts(Translation3::from(t), rotation)))
    }

    /// 4x4 homogeneous matrix.
    pub fn matrix(&self) -> Matrix4<f32> {
        self.0.to_homogeneous()
    }

    /// Underlying isometry.
    pub fn isometry(&self) -> &Isometry3<f32> {
        &self.0
    }

    /// Translation part.
    pub fn translation(&self) -> Vector3<f32> {
        self.0.translation.vector
    }

    /// Inverse transform.
    pub fn inverse(&self) -> Self {
        Self(self.0.inverse())
    }

    /// `self * other` (apply `other` first).
    pub fn compose(&self, other: &Pose) -> Self {
        Self(self.0 * other.0)
    }

    /// Apply to a point.
    #[inline]
    pub fn transform_point(&self, p: &Point3<f32>) -> Point3<f32> {
        self.0.transform_point(p)
    }

    /// Apply the rotation part to a direction.
    #[inline]
    pub fn transform_vector(&self, v: &Vector3<f32>) -> Vector3<f32> {
        self.0.transform_vector(v)
    }

    /// Whether this is the identity within `tol`.
    pub fn is_identity(&self, tol: f32) -> bool {
        (self.matrix() - Matrix4::identity()).abs().max() <= tol
    }
}
