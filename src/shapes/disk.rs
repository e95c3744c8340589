use crate::collision::DistanceProxy;
use crate::math::{Real, Vec2, PI};
use crate::shapes::MassData;

#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

/// A solid circle. Its radius doubles as its vertex radius.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct DiskShape {
    /// Center relative to the body origin
    center: [Vec2; 1],

    /// The radius of the disk
    radius: Real,
}

impl DiskShape {
    /// Creates a new disk with the given radius centered on the body origin
    pub fn new(radius: Real) -> Self {
        Self::with_center(radius, Vec2::zero())
    }

    /// Creates a new disk with the given radius and local center
    pub fn with_center(radius: Real, center: Vec2) -> Self {
        Self { center: [center], radius: radius.max(0.0) }
    }

    /// Returns the radius of the disk
    pub fn get_radius(&self) -> Real {
        self.radius
    }

    /// Returns the local center of the disk
    pub fn get_center(&self) -> Vec2 {
        self.center[0]
    }

    /// Distance proxy for the single child of a disk
    pub fn child(&self) -> DistanceProxy<'_> {
        DistanceProxy::new(self.radius, &self.center, &[])
    }

    /// Mass of a solid disk of the given density
    pub fn compute_mass(&self, density: Real) -> MassData {
        let r2 = self.radius * self.radius;
        let mass = density * PI * r2;
        let center = self.center[0];
        // Inertia about the local origin
        let inertia = mass * (0.5 * r2 + center.length_squared());
        MassData { mass, center, inertia }
    }
}
