use crate::collision::{ContactFeature, ContactFeatureType};
use crate::math::{Real, UnitVec2, Vec2, MAX_MANIFOLD_POINTS};

/// A vertex produced by clipping, tagged with the feature it came from
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ClipVertex {
    /// Vertex position
    pub v: Vec2,

    /// Contact feature of the vertex
    pub cf: ContactFeature,
}

impl ClipVertex {
    /// Creates a new clip vertex
    #[inline]
    pub fn new(v: Vec2, cf: ContactFeature) -> Self {
        Self { v, cf }
    }
}

/// Fixed-capacity list of clip vertices
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ClipList {
    vertices: [ClipVertex; MAX_MANIFOLD_POINTS],
    count: usize,
}

impl ClipList {
    /// An empty list
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a list from up to two vertices
    pub fn from_slice(vertices: &[ClipVertex]) -> Self {
        let mut list = Self::new();
        for v in vertices.iter().take(MAX_MANIFOLD_POINTS) {
            list.push(*v);
        }
        list
    }

    /// Appends a vertex
    #[inline]
    pub fn push(&mut self, vertex: ClipVertex) {
        debug_assert!(self.count < MAX_MANIFOLD_POINTS);
        self.vertices[self.count] = vertex;
        self.count += 1;
    }

    /// Number of vertices
    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    /// Whether the list is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// The vertices
    #[inline]
    pub fn as_slice(&self) -> &[ClipVertex] {
        &self.vertices[..self.count]
    }
}

impl std::ops::Index<usize> for ClipList {
    type Output = ClipVertex;

    fn index(&self, index: usize) -> &ClipVertex {
        &self.as_slice()[index]
    }
}

/// Sutherland-Hodgman clipping of a segment against the half plane
/// `dot(normal, v) - offset <= 0`.
///
/// Only a two-vertex input is clipped; any other input gives an empty list.
/// A vertex created on the line gets the feature "vertex `index_a` of A,
/// face of B where the segment came from".
pub fn clip_segment_to_line(
    v_in: &ClipList,
    normal: UnitVec2,
    offset: Real,
    index_a: u8,
) -> ClipList {
    let mut v_out = ClipList::new();

    if v_in.len() != 2 {
        return v_out;
    }

    // Calculate the distance of end points to the line
    let distance0 = normal.dot(&v_in[0].v) - offset;
    let distance1 = normal.dot(&v_in[1].v) - offset;

    // If the points are behind the plane
    if distance0 <= 0.0 {
        v_out.push(v_in[0]);
    }
    if distance1 <= 0.0 {
        v_out.push(v_in[1]);
    }

    // If the points are on different sides of the plane
    if distance0 * distance1 < 0.0 {
        // Find intersection point of edge and plane
        let interp = distance0 / (distance0 - distance1);
        let v = v_in[0].v + (v_in[1].v - v_in[0].v) * interp;

        // VertexA is hitting edgeB.
        let cf = ContactFeature::new(
            ContactFeatureType::Vertex,
            index_a,
            ContactFeatureType::Face,
            v_in[0].cf.index_b,
        );
        v_out.push(ClipVertex::new(v, cf));
    }

    v_out
}
