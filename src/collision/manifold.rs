use crate::math::{Real, UnitVec2, Vec2, LINEAR_SLOP, MAX_MANIFOLD_POINTS};

#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

/// Kind of geometric feature a contact point came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum ContactFeatureType {
    /// A vertex
    #[default]
    Vertex,

    /// A face (edge)
    Face,
}

/// Identifies the features on both shapes that produced a contact point.
/// Matching features across steps lets cached impulses be reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct ContactFeature {
    /// Feature type on shape A
    pub type_a: ContactFeatureType,

    /// Feature index on shape A
    pub index_a: u8,

    /// Feature type on shape B
    pub type_b: ContactFeatureType,

    /// Feature index on shape B
    pub index_b: u8,
}

impl ContactFeature {
    /// Creates a new contact feature
    #[inline]
    pub fn new(type_a: ContactFeatureType, index_a: u8, type_b: ContactFeatureType, index_b: u8) -> Self {
        Self { type_a, index_a, type_b, index_b }
    }

    /// Vertex of A against vertex of B
    #[inline]
    pub fn vertex_vertex(index_a: u8, index_b: u8) -> Self {
        Self::new(ContactFeatureType::Vertex, index_a, ContactFeatureType::Vertex, index_b)
    }

    /// Face of A against vertex of B
    #[inline]
    pub fn face_vertex(index_a: u8, index_b: u8) -> Self {
        Self::new(ContactFeatureType::Face, index_a, ContactFeatureType::Vertex, index_b)
    }

    /// Returns the feature with A and B swapped
    #[inline]
    pub fn flip(&self) -> Self {
        Self::new(self.type_b, self.index_b, self.type_a, self.index_a)
    }
}

/// A manifold point: a contact point belonging to a manifold, holding the
/// impulses accumulated for it by the solver
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct ManifoldPoint {
    /// Usage depends on the manifold type:
    /// circles: the local center of B;
    /// face A: the local center of B or the clip point of polygon B;
    /// face B: the clip point of polygon A
    pub local_point: Vec2,

    /// Uniquely identifies a contact point between two shapes
    pub contact_feature: ContactFeature,

    /// The non-penetration impulse
    pub normal_impulse: Real,

    /// The friction impulse
    pub tangent_impulse: Real,
}

impl ManifoldPoint {
    /// Creates a point with no accumulated impulse
    #[inline]
    pub fn new(local_point: Vec2, contact_feature: ContactFeature) -> Self {
        Self { local_point, contact_feature, normal_impulse: 0.0, tangent_impulse: 0.0 }
    }
}

/// How the local fields of a manifold are interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum ManifoldType {
    /// No points
    #[default]
    Unset,

    /// Point to point: the normal runs between the two centers
    Circles,

    /// The reference face is on shape A
    FaceA,

    /// The reference face is on shape B
    FaceB,
}

/// A contact manifold: up to two points where two convex shapes touch,
/// kept in local coordinates so that it stays meaningful as the bodies
/// move slightly. Used by the solver and by warm starting.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Manifold {
    kind: ManifoldType,

    local_normal: Option<UnitVec2>,

    local_point: Vec2,

    points: [ManifoldPoint; MAX_MANIFOLD_POINTS],

    point_count: usize,
}

impl Manifold {
    /// An empty manifold
    pub fn new() -> Self {
        Self::default()
    }

    /// A circles manifold with one point
    pub fn circles(local_point: Vec2, point: ManifoldPoint) -> Self {
        let mut manifold = Self { kind: ManifoldType::Circles, local_point, ..Default::default() };
        manifold.add_point(point);
        manifold
    }

    /// An empty face-A manifold
    pub fn face_a(local_normal: UnitVec2, local_point: Vec2) -> Self {
        Self { kind: ManifoldType::FaceA, local_normal: Some(local_normal), local_point, ..Default::default() }
    }

    /// An empty face-B manifold
    pub fn face_b(local_normal: UnitVec2, local_point: Vec2) -> Self {
        Self { kind: ManifoldType::FaceB, local_normal: Some(local_normal), local_point, ..Default::default() }
    }

    /// The manifold's type
    #[inline]
    pub fn get_type(&self) -> ManifoldType {
        self.kind
    }

    /// Normal in the reference shape's frame. `None` for circles manifolds
    /// and for manifolds without points.
    #[inline]
    pub fn get_local_normal(&self) -> Option<UnitVec2> {
        if self.point_count == 0 {
            return None;
        }
        self.local_normal
    }

    /// Usage depends on the manifold type:
    /// circles: the local center of A;
    /// face A: the center of the reference face on A;
    /// face B: the center of the reference face on B
    #[inline]
    pub fn get_local_point(&self) -> Vec2 {
        self.local_point
    }

    /// Number of points
    #[inline]
    pub fn get_point_count(&self) -> usize {
        self.point_count
    }

    /// Point `index`
    #[inline]
    pub fn get_point(&self, index: usize) -> &ManifoldPoint {
        debug_assert!(index < self.point_count);
        &self.points[index]
    }

    /// Mutable point `index`
    #[inline]
    pub fn get_point_mut(&mut self, index: usize) -> &mut ManifoldPoint {
        debug_assert!(index < self.point_count);
        &mut self.points[index]
    }

    /// The points
    #[inline]
    pub fn points(&self) -> &[ManifoldPoint] {
        &self.points[..self.point_count]
    }

    /// Appends a point. Points past the capacity are dropped.
    pub fn add_point(&mut self, point: ManifoldPoint) {
        debug_assert!(self.point_count < MAX_MANIFOLD_POINTS);
        if self.point_count < MAX_MANIFOLD_POINTS {
            self.points[self.point_count] = point;
            self.point_count += 1;
        }
    }

    /// Sets the accumulated impulses of point `index`
    pub fn set_point_impulses(&mut self, index: usize, normal: Real, tangent: Real) {
        let point = self.get_point_mut(index);
        point.normal_impulse = normal;
        point.tangent_impulse = tangent;
    }

    /// Copies the impulses of `old`'s points onto the points of this
    /// manifold with matching contact features
    pub fn copy_matching_impulses(&mut self, old: &Manifold) {
        for point in self.points[..self.point_count].iter_mut() {
            point.normal_impulse = 0.0;
            point.tangent_impulse = 0.0;
            if let Some(old_point) = old.points().iter().find(|p| p.contact_feature == point.contact_feature) {
                point.normal_impulse = old_point.normal_impulse;
                point.tangent_impulse = old_point.tangent_impulse;
            }
        }
    }
}

/// Tuning for manifold generation
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct ManifoldConf {
    /// Collision tolerance. Decides which of two nearly equal separating
    /// faces becomes the reference face.
    pub linear_slop: Real,
}

impl Default for ManifoldConf {
    fn default() -> Self {
        Self { linear_slop: LINEAR_SLOP }
    }
}
