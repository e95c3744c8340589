use crate::collision::DistanceProxy;
use crate::error::PhysicsError;
use crate::math::{Real, UnitVec2, Vec2, LINEAR_SLOP};
use crate::shapes::MassData;
use crate::Result;

#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

/// A chain of line segments. Each segment is a child that collides like an
/// edge, so one chain shape gets one broad-phase proxy per segment.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct ChainShape {
    /// Vertices; a closed loop repeats the first vertex at the end
    vertices: Vec<Vec2>,

    /// Two opposing normals per segment
    normals: Vec<UnitVec2>,

    vertex_radius: Real,
}

impl ChainShape {
    /// Creates an open chain through the given vertices
    pub fn new(vertices: &[Vec2]) -> Result<Self> {
        Self::build(vertices.to_vec())
    }

    /// Creates a closed chain, connecting the last vertex back to the first
    pub fn new_loop(vertices: &[Vec2]) -> Result<Self> {
        let mut closed = vertices.to_vec();
        if let Some(first) = vertices.first() {
            closed.push(*first);
        }
        Self::build(closed)
    }

    fn build(vertices: Vec<Vec2>) -> Result<Self> {
        if vertices.len() < 2 {
            return Err(PhysicsError::InvalidArgument(format!(
                "chain needs at least 2 vertices, got {}", vertices.len()
            )));
        }

        let mut normals = Vec::with_capacity((vertices.len() - 1) * 2);
        for pair in vertices.windows(2) {
            let n = UnitVec2::from_vec((pair[1] - pair[0]).fwd_perpendicular()).ok_or_else(|| {
                PhysicsError::InvalidArgument(format!("chain segment at {} has zero length", pair[0]))
            })?;
            normals.push(n);
            normals.push(-n);
        }

        Ok(Self { vertices, normals, vertex_radius: LINEAR_SLOP * 2.0 })
    }

    /// Returns this chain with a different vertex radius
    pub fn with_vertex_radius(mut self, vertex_radius: Real) -> Self {
        self.vertex_radius = vertex_radius;
        self
    }

    /// Number of segments
    pub fn get_child_count(&self) -> usize {
        self.vertices.len() - 1
    }

    /// Vertex at `index`
    pub fn get_vertex(&self, index: usize) -> Vec2 {
        self.vertices[index]
    }

    /// Rounding radius
    pub fn get_vertex_radius(&self) -> Real {
        self.vertex_radius
    }

    /// Distance proxy for segment `index`
    pub fn child(&self, index: usize) -> DistanceProxy<'_> {
        DistanceProxy::new(
            self.vertex_radius,
            &self.vertices[index..index + 2],
            &self.normals[index * 2..index * 2 + 2],
        )
    }

    /// Chains have no area and so no mass
    pub fn compute_mass(&self, _density: Real) -> MassData {
        MassData::default()
    }
}
