use crate::math::{Real, UnitVec2, Vec2};

#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

/// Ray-cast input. The ray extends from `p1` to
/// `p1 + max_fraction * (p2 - p1)`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct RayCastInput {
    /// Start point of the ray
    pub p1: Vec2,

    /// End point of the ray at fraction 1
    pub p2: Vec2,

    /// Fraction of `p2 - p1` the ray extends to
    pub max_fraction: Real,
}

impl RayCastInput {
    /// Creates a new ray-cast input
    #[inline]
    pub fn new(p1: Vec2, p2: Vec2, max_fraction: Real) -> Self {
        Self { p1, p2, max_fraction }
    }

    /// Returns the point at fraction `t` of `p2 - p1`
    #[inline]
    pub fn point_at(&self, t: Real) -> Vec2 {
        self.p1 + (self.p2 - self.p1) * t
    }
}

/// A ray hit: the fraction along the ray where it hit and the surface
/// normal there, both in the frame the ray was given in
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct RayCastHit {
    /// Surface normal at the hit point
    pub normal: UnitVec2,

    /// Fraction of `p2 - p1` at which the hit occurs
    pub fraction: Real,
}

/// Result of a ray cast. `None` means no hit.
pub type RayCastOutput = Option<RayCastHit>;

/// Opcode returned by world ray-cast callbacks to steer the traversal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RayCastOpcode {
    /// Stop the ray cast immediately
    Terminate,

    /// Ignore this hit and keep the current ray length
    IgnoreFixture,

    /// Clip the ray to this hit and continue looking for closer ones
    ClipRay,

    /// Keep going with the full ray
    ResetRay,
}
