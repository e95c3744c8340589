use crate::collision::DistanceProxy;
use crate::math::{Real, UnitVec2, Vec2, LINEAR_SLOP};
use crate::shapes::MassData;

#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

/// A line segment between two vertices. Collides as a two-vertex polygon
/// with two opposing normals.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct EdgeShape {
    vertices: [Vec2; 2],
    normals: [UnitVec2; 2],
    vertex_radius: Real,
}

impl EdgeShape {
    /// Creates a new edge from `v1` to `v2` with the default vertex radius
    pub fn new(v1: Vec2, v2: Vec2) -> Self {
        Self::with_vertex_radius(v1, v2, LINEAR_SLOP * 2.0)
    }

    /// Creates a new edge with an explicit vertex radius
    pub fn with_vertex_radius(v1: Vec2, v2: Vec2, vertex_radius: Real) -> Self {
        // A zero length edge has no facing; pick an arbitrary one.
        let n = UnitVec2::from_vec((v2 - v1).fwd_perpendicular()).unwrap_or(UnitVec2::TOP);
        Self {
            vertices: [v1, v2],
            normals: [n, -n],
            vertex_radius,
        }
    }

    /// First vertex
    pub fn get_vertex1(&self) -> Vec2 {
        self.vertices[0]
    }

    /// Second vertex
    pub fn get_vertex2(&self) -> Vec2 {
        self.vertices[1]
    }

    /// Rounding radius
    pub fn get_vertex_radius(&self) -> Real {
        self.vertex_radius
    }

    /// Distance proxy for the single child of an edge
    pub fn child(&self) -> DistanceProxy<'_> {
        DistanceProxy::new(self.vertex_radius, &self.vertices, &self.normals)
    }

    /// Edges have no area and so no mass
    pub fn compute_mass(&self, _density: Real) -> MassData {
        MassData {
            mass: 0.0,
            center: (self.vertices[0] + self.vertices[1]) * 0.5,
            inertia: 0.0,
        }
    }
}
