//! Small math helpers shared by the manifold kernel and the constraints.

use glam::{Mat3, Quat, Vec3};

/// Rigid transform: rotation followed by translation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RigidTransform {
    pub position: Vec3,
    pub orientation: Quat,
}

impl Default for RigidTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl RigidTransform {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        orientation: Quat::IDENTITY,
    };

    pub fn new(position: Vec3, orientation: Quat) -> Self {
        Self {
            position,
            orientation,
        }
    }

    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            orientation: Quat::IDENTITY,
        }
    }

    /// Transform a point from local space to world space.
    #[inline]
    pub fn transform_point(&self, local: Vec3) -> Vec3 {
        self.position + self.orientation * local
    }

    /// Transform a world-space point into local space.
    #[inline]
    pub fn inverse_transform_point(&self, world: Vec3) -> Vec3 {
        self.orientation.inverse() * (world - self.position)
    }
}

/// Cross-product matrix: `skew(a) * b == a.cross(b)`.
#[inline]
pub fn skew(v: Vec3) -> Mat3 {
    Mat3::from_cols(
        Vec3::new(0.0, v.z, -v.y),
        Vec3::new(-v.z, 0.0, v.x),
        Vec3::new(v.y, -v.x, 0.0),
    )
}

/// Two unit tangents completing an orthonormal basis with `normal`.
///
/// The basis depends only on `normal`, so the same normal always yields the
/// same tangents and warm-started friction impulses stay meaningful.
pub fn tangent_basis(normal: Vec3) -> (Vec3, Vec3) {
    let reference = if normal.x.abs() < 0.57735 {
        Vec3::X
    } else {
        Vec3::Y
    };
    let t1 = normal.cross(reference).normalize_or_zero();
    let t2 = normal.cross(t1);
    (t1, t2)
}

/// Invert `m`, or return the zero matrix if it is singular.
#[inline]
pub fn inverse_or_zero(m: Mat3) -> Mat3 {
    if m.determinant().abs() > 1e-12 {
        m.inverse()
    } else {
        Mat3::ZERO
    }
}
