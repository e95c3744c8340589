use crate::math::{Real, Vec2};
use std::fmt;
use std::ops::Neg;

#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

/// A unit-length 2D direction. Doubles as a rotation, storing the cosine in
/// `x` and the sine in `y` of the angle it represents.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct UnitVec2 {
    /// Cosine component
    x: Real,

    /// Sine component
    y: Real,
}

impl UnitVec2 {
    /// The rotation by zero radians, pointing along +x
    pub const RIGHT: Self = Self { x: 1.0, y: 0.0 };

    /// Pointing along +y
    pub const TOP: Self = Self { x: 0.0, y: 1.0 };

    /// Pointing along -x
    pub const LEFT: Self = Self { x: -1.0, y: 0.0 };

    /// Pointing along -y
    pub const BOTTOM: Self = Self { x: 0.0, y: -1.0 };

    /// Creates the rotation for the given angle in radians
    #[inline]
    pub fn from_angle(angle: Real) -> Self {
        let (s, c) = angle.sin_cos();
        Self { x: c, y: s }
    }

    /// Returns the unit vector pointing in the direction of `v`, or `None`
    /// if `v` is too short to have a direction
    #[inline]
    pub fn from_vec(v: Vec2) -> Option<Self> {
        v.get_unit_vector().map(|(u, _)| Self { x: u.x, y: u.y })
    }

    /// Returns the identity rotation
    #[inline]
    pub fn identity() -> Self {
        Self::RIGHT
    }

    /// Cosine of the rotation angle
    #[inline]
    pub fn cos(&self) -> Real {
        self.x
    }

    /// Sine of the rotation angle
    #[inline]
    pub fn sin(&self) -> Real {
        self.y
    }

    /// The x component
    #[inline]
    pub fn get_x(&self) -> Real {
        self.x
    }

    /// The y component
    #[inline]
    pub fn get_y(&self) -> Real {
        self.y
    }

    /// Returns the angle in radians, in the range [-PI, PI]
    #[inline]
    pub fn get_angle(&self) -> Real {
        self.y.atan2(self.x)
    }

    /// Returns this direction as a plain vector
    #[inline]
    pub fn to_vec(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    /// Rotates a vector by this rotation
    #[inline]
    pub fn rotate(&self, v: Vec2) -> Vec2 {
        Vec2::new(self.x * v.x - self.y * v.y, self.y * v.x + self.x * v.y)
    }

    /// Rotates a vector by the inverse of this rotation
    #[inline]
    pub fn inverse_rotate(&self, v: Vec2) -> Vec2 {
        Vec2::new(self.x * v.x + self.y * v.y, -self.y * v.x + self.x * v.y)
    }

    /// Rotates another unit vector by this rotation
    #[inline]
    pub fn rotate_unit(&self, other: UnitVec2) -> UnitVec2 {
        let v = self.rotate(other.to_vec());
        Self { x: v.x, y: v.y }
    }

    /// Rotates another unit vector by the inverse of this rotation
    #[inline]
    pub fn inverse_rotate_unit(&self, other: UnitVec2) -> UnitVec2 {
        let v = self.inverse_rotate(other.to_vec());
        Self { x: v.x, y: v.y }
    }

    /// Counter-clockwise perpendicular
    #[inline]
    pub fn rev_perpendicular(&self) -> Self {
        Self { x: -self.y, y: self.x }
    }

    /// Clockwise perpendicular
    #[inline]
    pub fn fwd_perpendicular(&self) -> Self {
        Self { x: self.y, y: -self.x }
    }

    /// Dot product with a plain vector
    #[inline]
    pub fn dot(&self, v: &Vec2) -> Real {
        self.x * v.x + self.y * v.y
    }
}

impl Default for UnitVec2 {
    fn default() -> Self {
        Self::RIGHT
    }
}

impl Neg for UnitVec2 {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self::Output {
        Self { x: -self.x, y: -self.y }
    }
}

impl From<UnitVec2> for Vec2 {
    #[inline]
    fn from(u: UnitVec2) -> Self {
        u.to_vec()
    }
}

impl fmt::Display for UnitVec2 {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}
