use crate::math::{Real, Vec2};

#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

/// Mass properties of a shape, computed from its geometry and density
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct MassData {
    /// Mass in kilograms
    pub mass: Real,

    /// Center of mass relative to the shape's origin
    pub center: Vec2,

    /// Rotational inertia about the shape's origin
    pub inertia: Real,
}
