mod vector;
mod matrix;
mod transform;
mod rotation;
mod aabb;
mod ray;

pub use vector::{Vec2, Vec3, cross_sv, cross_vs};
pub use matrix::{Mat22, Mat33};
pub use transform::{Transformation, Position, Velocity, Sweep, get_position, get_transformation};
pub use rotation::UnitVec2;
pub use aabb::{cast_aabb, Aabb};
pub use ray::{RayCastInput, RayCastHit, RayCastOutput, RayCastOpcode};

#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

/// The floating point type used throughout the engine
pub type Real = f32;

/// Constant for a very small number, used for comparisons
pub const EPSILON: Real = 1.0e-6;

/// Largest finite value
pub const MAX_FLOAT: Real = Real::MAX;

/// Half a turn in radians
pub const PI: Real = std::f32::consts::PI;

/// A full turn in radians
pub const TWO_PI: Real = 2.0 * PI;

/// Default collision and constraint tolerance in meters
pub const LINEAR_SLOP: Real = 0.005;

/// Default angular tolerance in radians (two degrees)
pub const ANGULAR_SLOP: Real = 2.0 * PI / 180.0;

/// Maximum number of points a contact manifold can hold
pub const MAX_MANIFOLD_POINTS: usize = 2;

/// Maximum number of vertices a convex polygon can have
pub const MAX_POLYGON_VERTICES: usize = 8;

/// Clamps a value between a minimum and maximum value
#[inline]
pub fn clamp(value: Real, min: Real, max: Real) -> Real {
    value.max(min).min(max)
}

/// Linearly interpolates between two values
#[inline]
pub fn lerp(a: Real, b: Real, t: Real) -> Real {
    a + (b - a) * t
}

/// Converts degrees to radians
#[inline]
pub fn to_radians(degrees: Real) -> Real {
    degrees * PI / 180.0
}

/// Normalizes an angle into the half-open range [-PI, PI)
pub fn get_normalized(angle: Real) -> Real {
    let mut value = angle % TWO_PI;
    if value < -PI {
        value += TWO_PI;
    } else if value >= PI {
        value -= TWO_PI;
    }
    // Guards against the addition above rounding up onto PI.
    if value >= PI {
        -PI
    } else {
        value
    }
}

/// Returns the shortest angular delta from `a0` to `a1`, in [-PI, PI)
#[inline]
pub fn get_shortest_delta(a0: Real, a1: Real) -> Real {
    get_normalized(a1 - a0)
}

/// Returns the clockwise angle to get from `a1` to `a2`. The result is in
/// the range (-2PI, 0].
pub fn get_fwd_rotational_angle(a1: Real, a2: Real) -> Real {
    let mut value = (a2 - a1) % TWO_PI;
    if value > 0.0 {
        value -= TWO_PI;
    }
    if value <= -TWO_PI {
        0.0
    } else {
        value
    }
}

/// Returns the counter-clockwise angle to get from `a1` to `a2`. The result
/// is in the range [0, 2PI).
pub fn get_rev_rotational_angle(a1: Real, a2: Real) -> Real {
    let mut value = (a2 - a1) % TWO_PI;
    if value < 0.0 {
        value += TWO_PI;
    }
    if value >= TWO_PI {
        0.0
    } else {
        value
    }
}

/// Closed interval of values
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Interval<T> {
    /// Lower bound
    pub min: T,

    /// Upper bound
    pub max: T,
}

impl<T: PartialOrd + Copy> Interval<T> {
    /// Creates an interval. The bounds are swapped if given out of order.
    pub fn new(a: T, b: T) -> Self {
        if b < a {
            Self { min: b, max: a }
        } else {
            Self { min: a, max: b }
        }
    }

    /// Whether `value` lies within the inclusive bounds
    #[inline]
    pub fn contains(&self, value: T) -> bool {
        self.min <= value && value <= self.max
    }

    /// Lower bound
    #[inline]
    pub fn get_min(&self) -> T {
        self.min
    }

    /// Upper bound
    #[inline]
    pub fn get_max(&self) -> T {
        self.max
    }
}
