#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

/// Type of body, determining how it behaves in the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum BodyType {
    /// Static bodies have zero mass and velocity and never move on their own
    #[default]
    Static,

    /// Kinematic bodies move by their velocity alone; forces and contacts
    /// don't affect them
    Kinematic,

    /// Dynamic bodies are fully simulated (affected by forces, collisions, etc.)
    Dynamic,
}

impl BodyType {
    /// Whether bodies of this type may have a non-zero velocity
    #[inline]
    pub fn is_speedable(self) -> bool {
        self != BodyType::Static
    }

    /// Whether bodies of this type respond to forces and contacts
    #[inline]
    pub fn is_accelerable(self) -> bool {
        self == BodyType::Dynamic
    }
}
