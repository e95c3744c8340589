use nalgebra as na;
use crate::math::{Real, Vec2, Vec3};
use std::ops::Mul;

#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

/// A 2x2 matrix stored as two column vectors
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Mat22 {
    /// First column
    pub ex: Vec2,

    /// Second column
    pub ey: Vec2,
}

/// A 3x3 matrix stored as three column vectors
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Mat33 {
    /// First column
    pub ex: Vec3,

    /// Second column
    pub ey: Vec3,

    /// Third column
    pub ez: Vec3,
}

// === Mat22 Implementation ===

impl Mat22 {
    /// Creates a matrix from its columns
    #[inline]
    pub fn new(ex: Vec2, ey: Vec2) -> Self {
        Self { ex, ey }
    }

    /// Creates the identity matrix
    #[inline]
    pub fn identity() -> Self {
        Self::new(Vec2::unit_x(), Vec2::unit_y())
    }

    /// Creates the zero matrix
    #[inline]
    pub fn zero() -> Self {
        Self::default()
    }

    /// Returns the inverse, or the zero matrix if it's singular
    pub fn get_inverse(&self) -> Self {
        let (a, b, c, d) = (self.ex.x, self.ey.x, self.ex.y, self.ey.y);
        let mut det = a * d - b * c;
        if det != 0.0 {
            det = 1.0 / det;
        }
        Self::new(Vec2::new(det * d, -det * c), Vec2::new(-det * b, det * a))
    }

    /// Solves `A * x = b`. Cheaper than computing the inverse when only one
    /// solve is needed. Returns zero if the matrix is singular.
    pub fn solve(&self, b: Vec2) -> Vec2 {
        let (a11, a12, a21, a22) = (self.ex.x, self.ey.x, self.ex.y, self.ey.y);
        let mut det = a11 * a22 - a12 * a21;
        if det != 0.0 {
            det = 1.0 / det;
        }
        Vec2::new(det * (a22 * b.x - a12 * b.y), det * (a11 * b.y - a21 * b.x))
    }

    /// Converts to an nalgebra matrix
    pub fn to_nalgebra(&self) -> na::Matrix2<Real> {
        na::Matrix2::new(self.ex.x, self.ey.x, self.ex.y, self.ey.y)
    }
}

impl Mul<Vec2> for Mat22 {
    type Output = Vec2;
    #[inline]
    fn mul(self, v: Vec2) -> Vec2 {
        Vec2::new(
            self.ex.x * v.x + self.ey.x * v.y,
            self.ex.y * v.x + self.ey.y * v.y,
        )
    }
}

// === Mat33 Implementation ===

impl Mat33 {
    /// Creates a matrix from its columns
    #[inline]
    pub fn new(ex: Vec3, ey: Vec3, ez: Vec3) -> Self {
        Self { ex, ey, ez }
    }

    /// Solves `A * x = b`. Returns zero if the matrix is singular.
    pub fn solve33(&self, b: Vec3) -> Vec3 {
        let mut det = self.ex.dot(&self.ey.cross(&self.ez));
        if det != 0.0 {
            det = 1.0 / det;
        }
        Vec3::new(
            det * b.dot(&self.ey.cross(&self.ez)),
            det * self.ex.dot(&b.cross(&self.ez)),
            det * self.ex.dot(&self.ey.cross(&b)),
        )
    }

    /// Solves `A * x = b` using only the upper 2x2 block. Returns zero if
    /// that block is singular.
    pub fn solve22(&self, b: Vec2) -> Vec2 {
        let (a11, a12, a21, a22) = (self.ex.x, self.ey.x, self.ex.y, self.ey.y);
        let mut det = a11 * a22 - a12 * a21;
        if det != 0.0 {
            det = 1.0 / det;
        }
        Vec2::new(det * (a22 * b.x - a12 * b.y), det * (a11 * b.y - a21 * b.x))
    }

    /// Returns the inverse of the upper 2x2 block as a 3x3 matrix with a
    /// zeroed third row and column
    pub fn get_inverse22(&self) -> Self {
        let (a, b, c, d) = (self.ex.x, self.ey.x, self.ex.y, self.ey.y);
        let mut det = a * d - b * c;
        if det != 0.0 {
            det = 1.0 / det;
        }
        Self::new(
            Vec3::new(det * d, -det * c, 0.0),
            Vec3::new(-det * b, det * a, 0.0),
            Vec3::zero(),
        )
    }

    /// Returns the symmetric inverse, or zero if singular
    pub fn get_sym_inverse33(&self) -> Self {
        let mut det = self.ex.dot(&self.ey.cross(&self.ez));
        if det != 0.0 {
            det = 1.0 / det;
        }

        let (a11, a12, a13) = (self.ex.x, self.ey.x, self.ez.x);
        let (a22, a23) = (self.ey.y, self.ez.y);
        let a33 = self.ez.z;

        let m11 = det * (a22 * a33 - a23 * a23);
        let m12 = det * (a13 * a23 - a12 * a33);
        let m13 = det * (a12 * a23 - a13 * a22);
        let m22 = det * (a11 * a33 - a13 * a13);
        let m23 = det * (a13 * a12 - a11 * a23);
        let m33 = det * (a11 * a22 - a12 * a12);

        Self::new(
            Vec3::new(m11, m12, m13),
            Vec3::new(m12, m22, m23),
            Vec3::new(m13, m23, m33),
        )
    }

    /// Converts to an nalgebra matrix
    pub fn to_nalgebra(&self) -> na::Matrix3<Real> {
        na::Matrix3::new(
            self.ex.x, self.ey.x, self.ez.x,
            self.ex.y, self.ey.y, self.ez.y,
            self.ex.z, self.ey.z, self.ez.z,
        )
    }
}

impl Mul<Vec3> for Mat33 {
    type Output = Vec3;
    #[inline]
    fn mul(self, v: Vec3) -> Vec3 {
        self.ex * v.x + self.ey * v.y + self.ez * v.z
    }
}
