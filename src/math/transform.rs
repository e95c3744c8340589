use crate::math::{Real, UnitVec2, Vec2, TWO_PI};
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

/// A rigid transformation: a rotation followed by a translation
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Transformation {
    /// Translation
    pub p: Vec2,

    /// Rotation
    pub q: UnitVec2,
}

impl Transformation {
    /// Creates a new transformation
    #[inline]
    pub fn new(p: Vec2, q: UnitVec2) -> Self {
        Self { p, q }
    }

    /// Creates a transformation from a location and an angle in radians
    #[inline]
    pub fn from_position_angle(p: Vec2, angle: Real) -> Self {
        Self { p, q: UnitVec2::from_angle(angle) }
    }

    /// Creates an identity transformation
    #[inline]
    pub fn identity() -> Self {
        Self { p: Vec2::zero(), q: UnitVec2::identity() }
    }

    /// Transforms a point from local into world space
    #[inline]
    pub fn transform(&self, v: Vec2) -> Vec2 {
        self.q.rotate(v) + self.p
    }

    /// Transforms a point from world into local space
    #[inline]
    pub fn inverse_transform(&self, v: Vec2) -> Vec2 {
        self.q.inverse_rotate(v - self.p)
    }

    /// Composes two transformations: `self * other`
    #[inline]
    pub fn mul(&self, other: &Self) -> Self {
        Self {
            p: self.q.rotate(other.p) + self.p,
            q: self.q.rotate_unit(other.q),
        }
    }

    /// Composes the inverse of this transformation with another:
    /// `inverse(self) * other`
    #[inline]
    pub fn mul_t(&self, other: &Self) -> Self {
        Self {
            p: self.q.inverse_rotate(other.p - self.p),
            q: self.q.inverse_rotate_unit(other.q),
        }
    }
}

impl Default for Transformation {
    fn default() -> Self {
        Self::identity()
    }
}

/// A linear location combined with an angular orientation
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Position {
    /// Location of the center of mass
    pub linear: Vec2,

    /// Angle in radians
    pub angular: Real,
}

impl Position {
    /// Creates a new position
    #[inline]
    pub fn new(linear: Vec2, angular: Real) -> Self {
        Self { linear, angular }
    }
}

impl Add for Position {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.linear + rhs.linear, self.angular + rhs.angular)
    }
}

impl Sub for Position {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.linear - rhs.linear, self.angular - rhs.angular)
    }
}

impl Mul<Real> for Position {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: Real) -> Self {
        Self::new(self.linear * rhs, self.angular * rhs)
    }
}

impl AddAssign for Position {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        self.linear += rhs.linear;
        self.angular += rhs.angular;
    }
}

impl SubAssign for Position {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        self.linear -= rhs.linear;
        self.angular -= rhs.angular;
    }
}

/// Interpolates between two positions. A `beta` of 0 yields `p0` and a
/// `beta` of 1 yields `p1`.
#[inline]
pub fn get_position(p0: Position, p1: Position, beta: Real) -> Position {
    p0 + (p1 - p0) * beta
}

/// Linear and angular velocity
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Velocity {
    /// Linear velocity in meters per second
    pub linear: Vec2,

    /// Angular velocity in radians per second
    pub angular: Real,
}

impl Velocity {
    /// Creates a new velocity
    #[inline]
    pub fn new(linear: Vec2, angular: Real) -> Self {
        Self { linear, angular }
    }

    /// The zero velocity
    #[inline]
    pub fn zero() -> Self {
        Self::default()
    }
}

impl Add for Velocity {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.linear + rhs.linear, self.angular + rhs.angular)
    }
}

impl Sub for Velocity {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.linear - rhs.linear, self.angular - rhs.angular)
    }
}

impl Mul<Real> for Velocity {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: Real) -> Self {
        Self::new(self.linear * rhs, self.angular * rhs)
    }
}

impl Neg for Velocity {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        Self::new(-self.linear, -self.angular)
    }
}

/// Describes the motion of a body's center of mass over a step. The
/// transformation at any fraction of the step is derived from `pos0` and
/// `pos1`, which lets continuous collision treat motion as a function of
/// time.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Sweep {
    /// Center world position and angle at `alpha0`
    pub pos0: Position,

    /// Center world position and angle at the end of the step
    pub pos1: Position,

    /// Local center of mass relative to the body's origin
    pub local_center: Vec2,

    /// Fraction of the current time step in the range [0,1] that `pos0`
    /// corresponds to
    pub alpha0: Real,
}

impl Sweep {
    /// Creates a sweep that isn't moving
    pub fn new(pos: Position, local_center: Vec2) -> Self {
        Self { pos0: pos, pos1: pos, local_center, alpha0: 0.0 }
    }

    /// Returns the interpolated transformation at `beta` in [0,1] of the
    /// `alpha0..1` interval
    pub fn get_transform(&self, beta: Real) -> Transformation {
        get_transformation(get_position(self.pos0, self.pos1, beta), self.local_center)
    }

    /// The transformation at `pos0`
    #[inline]
    pub fn get_transform0(&self) -> Transformation {
        get_transformation(self.pos0, self.local_center)
    }

    /// The transformation at `pos1`
    #[inline]
    pub fn get_transform1(&self) -> Transformation {
        get_transformation(self.pos1, self.local_center)
    }

    /// Advances `pos0` forward to the time `alpha`, where `alpha` is a
    /// fraction of the whole step and must not be smaller than `alpha0`
    pub fn advance0(&mut self, alpha: Real) {
        debug_assert!(self.alpha0 < 1.0);
        let beta = (alpha - self.alpha0) / (1.0 - self.alpha0);
        self.pos0 = get_position(self.pos0, self.pos1, beta);
        self.alpha0 = alpha;
    }

    /// Shifts both angles by a whole number of turns so that `pos0`'s angle
    /// lands in [0, 2PI)
    pub fn normalize(&mut self) {
        let d = TWO_PI * (self.pos0.angular / TWO_PI).floor();
        self.pos0.angular -= d;
        self.pos1.angular -= d;
    }
}

/// Gets the body's transformation from a center of mass position and the
/// local center of mass
#[inline]
pub fn get_transformation(pos: Position, local_center: Vec2) -> Transformation {
    let q = UnitVec2::from_angle(pos.angular);
    Transformation::new(pos.linear - q.rotate(local_center), q)
}
