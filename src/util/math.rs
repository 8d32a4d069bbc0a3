//! Math type re-exports and KF-specific matrix layouts.
//!
//! This module re-exports the `glam` types used by the exporter and
//! provides the row-major float layouts the KF format stores matrices in.

pub use glam::{Affine3A, Mat2, Mat3, Mat3A, Mat4, Vec2, Vec3, Vec3A, Vec4};

/// A 4x3 matrix: three basis rows followed by a translation row.
///
/// This is the KF on-disk transform. It carries the same information as an
/// [`Affine3A`], laid out as rows instead of glam's columns.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Mat4x3 {
    pub rows: [Vec3; 4],
}

impl Mat4x3 {
    pub const IDENTITY: Self = Self { rows: [Vec3::X, Vec3::Y, Vec3::Z, Vec3::ZERO] };

    /// Row layout of an affine transform: X axis, Y axis, Z axis, translation.
    #[inline]
    pub fn from_affine(affine: &Affine3A) -> Self {
        Self {
            rows: [
                affine.matrix3.x_axis.into(),
                affine.matrix3.y_axis.into(),
                affine.matrix3.z_axis.into(),
                affine.translation.into(),
            ],
        }
    }

    #[inline]
    pub fn to_affine(&self) -> Affine3A {
        Affine3A::from_cols(
            self.rows[0].into(),
            self.rows[1].into(),
            self.rows[2].into(),
            self.rows[3].into(),
        )
    }

    /// Flattened row-major floats, 12 values.
    pub fn to_floats(&self) -> [f32; 12] {
        let mut out = [0.0; 12];
        for (i, row) in self.rows.iter().enumerate() {
            out[i * 3..i * 3 + 3].copy_from_slice(&row.to_array());
        }
        out
    }

    pub fn from_floats(v: &[f32; 12]) -> Self {
        Self {
            rows: [
                Vec3::new(v[0], v[1], v[2]),
                Vec3::new(v[3], v[4], v[5]),
                Vec3::new(v[6], v[7], v[8]),
                Vec3::new(v[9], v[10], v[11]),
            ],
        }
    }
}

impl Default for Mat4x3 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl From<Affine3A> for Mat4x3 {
    fn from(affine: Affine3A) -> Self {
        Self::from_affine(&affine)
    }
}

/// Row-major floats of a 2x2 matrix (glam stores columns).
#[inline]
pub fn mat2_rows(m: &Mat2) -> [f32; 4] {
    m.transpose().to_cols_array()
}

/// Row-major floats of a 3x3 matrix.
#[inline]
pub fn mat3_rows(m: &Mat3) -> [f32; 9] {
    m.transpose().to_cols_array()
}

/// Row-major floats of a 4x4 matrix.
#[inline]
pub fn mat4_rows(m: &Mat4) -> [f32; 16] {
    m.transpose().to_cols_array()
}

/// Approximate equality for affine transforms, used when comparing
/// flattened node transforms.
pub fn affine_abs_diff_eq(a: &Affine3A, b: &Affine3A, max_abs_diff: f32) -> bool {
    a.matrix3.abs_diff_eq(b.matrix3, max_abs_diff)
        && a.translation.abs_diff_eq(b.translation, max_abs_diff)
}
