use crate::collision::{DistanceProxy, Filter};
use crate::math::{Aabb, Real, Transformation};
use crate::shapes::{ChainShape, DiskShape, EdgeShape, MassData, PolygonShape};

#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

/// The geometric part of a shape
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum Geometry {
    /// A solid circle
    Disk(DiskShape),

    /// A single line segment
    Edge(EdgeShape),

    /// A solid convex polygon
    Polygon(PolygonShape),

    /// A chain of line segments
    Chain(ChainShape),
}

/// A shape: geometry together with its material and filtering properties.
///
/// Shapes are pure values. A world stores a copy of each shape it creates,
/// and the same shape can be attached to any number of bodies.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Shape {
    /// The geometry
    pub geometry: Geometry,

    /// Density in kilograms per square meter
    pub density: Real,

    /// Coulomb friction coefficient, usually in [0,1]
    pub friction: Real,

    /// Restitution (bounciness), usually in [0,1]
    pub restitution: Real,

    /// Sensors detect overlap but never generate contact points
    pub is_sensor: bool,

    /// Contact filtering data
    pub filter: Filter,
}

impl Shape {
    /// Creates a shape with default material properties
    pub fn new(geometry: Geometry) -> Self {
        Self {
            geometry,
            density: 0.0,
            friction: 0.2,
            restitution: 0.0,
            is_sensor: false,
            filter: Filter::default(),
        }
    }

    /// Creates a disk shape
    pub fn disk(disk: DiskShape) -> Self {
        Self::new(Geometry::Disk(disk))
    }

    /// Creates an edge shape
    pub fn edge(edge: EdgeShape) -> Self {
        Self::new(Geometry::Edge(edge))
    }

    /// Creates a polygon shape
    pub fn polygon(polygon: PolygonShape) -> Self {
        Self::new(Geometry::Polygon(polygon))
    }

    /// Creates a chain shape
    pub fn chain(chain: ChainShape) -> Self {
        Self::new(Geometry::Chain(chain))
    }

    /// Sets the density
    pub fn with_density(mut self, density: Real) -> Self {
        self.density = density;
        self
    }

    /// Sets the friction
    pub fn with_friction(mut self, friction: Real) -> Self {
        self.friction = friction;
        self
    }

    /// Sets the restitution
    pub fn with_restitution(mut self, restitution: Real) -> Self {
        self.restitution = restitution;
        self
    }

    /// Sets whether this shape is a sensor
    pub fn with_sensor(mut self, is_sensor: bool) -> Self {
        self.is_sensor = is_sensor;
        self
    }

    /// Sets the contact filter
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    /// Number of children, each of which gets its own broad-phase proxy
    pub fn get_child_count(&self) -> usize {
        match &self.geometry {
            Geometry::Chain(chain) => chain.get_child_count(),
            _ => 1,
        }
    }

    /// Distance proxy for child `index`
    pub fn get_child(&self, index: usize) -> DistanceProxy<'_> {
        match &self.geometry {
            Geometry::Disk(disk) => disk.child(),
            Geometry::Edge(edge) => edge.child(),
            Geometry::Polygon(polygon) => polygon.child(),
            Geometry::Chain(chain) => chain.child(index),
        }
    }

    /// Rounding radius of the shape's vertices
    pub fn get_vertex_radius(&self) -> Real {
        match &self.geometry {
            Geometry::Disk(disk) => disk.get_radius(),
            Geometry::Edge(edge) => edge.get_vertex_radius(),
            Geometry::Polygon(polygon) => polygon.get_vertex_radius(),
            Geometry::Chain(chain) => chain.get_vertex_radius(),
        }
    }

    /// Mass properties at this shape's density
    pub fn compute_mass(&self) -> MassData {
        match &self.geometry {
            Geometry::Disk(disk) => disk.compute_mass(self.density),
            Geometry::Edge(edge) => edge.compute_mass(self.density),
            Geometry::Polygon(polygon) => polygon.compute_mass(self.density),
            Geometry::Chain(chain) => chain.compute_mass(self.density),
        }
    }

    /// World AABB of child `index` under `xf`
    pub fn compute_aabb(&self, index: usize, xf: &Transformation) -> Aabb {
        self.get_child(index).compute_aabb(xf)
    }
}
