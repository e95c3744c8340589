use crate::collision::{DistanceProxy, IndexPair, INVALID_INDEX};
use crate::math::{Real, Transformation, UnitVec2, Vec2};

/// The kind of axis a separation finder measures along
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeparationType {
    /// Between a vertex of A and a vertex of B
    Points,

    /// Along the normal of an edge of A
    FaceA,

    /// Along the normal of an edge of B
    FaceB,
}

/// Separation and the witness vertex pair it was measured at
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LengthIndexPair {
    /// Signed separation
    pub distance: Real,

    /// Vertex indices; the face side's index is [`INVALID_INDEX`]
    pub indices: IndexPair,
}

/// Measures the separation of two proxies along an axis fixed by the
/// result of a distance query. The axis is carried in the local frame of
/// the proxy it belongs to, so it can be evaluated at any pair of
/// transformations while the bodies move.
#[derive(Debug, Clone, Copy)]
pub struct SeparationFinder<'a> {
    proxy_a: DistanceProxy<'a>,
    proxy_b: DistanceProxy<'a>,
    axis: UnitVec2,
    local_point: Vec2,
    kind: SeparationType,
}

impl<'a> SeparationFinder<'a> {
    /// Builds a finder from the 1 to 3 index pairs of a distance query's
    /// final simplex, evaluated at the given transformations
    pub fn get(
        indices: &[IndexPair],
        proxy_a: DistanceProxy<'a>,
        xf_a: &Transformation,
        proxy_b: DistanceProxy<'a>,
        xf_b: &Transformation,
    ) -> Self {
        debug_assert!(!indices.is_empty() && indices.len() <= 3);

        if indices.len() == 1 {
            let local_point_a = proxy_a.get_vertex(indices[0].a);
            let local_point_b = proxy_b.get_vertex(indices[0].b);
            let point_a = xf_a.transform(local_point_a);
            let point_b = xf_b.transform(local_point_b);
            let axis = UnitVec2::from_vec(point_b - point_a).unwrap_or(UnitVec2::RIGHT);
            return Self {
                proxy_a,
                proxy_b,
                axis,
                local_point: Vec2::zero(),
                kind: SeparationType::Points,
            };
        }

        if indices[0].a == indices[1].a {
            // Two points on B and one on A.
            let local_point_b1 = proxy_b.get_vertex(indices[0].b);
            let local_point_b2 = proxy_b.get_vertex(indices[1].b);
            let mut axis = UnitVec2::from_vec((local_point_b2 - local_point_b1).fwd_perpendicular())
                .unwrap_or(UnitVec2::RIGHT);
            let normal = xf_b.q.rotate_unit(axis);

            let local_point = (local_point_b1 + local_point_b2) * 0.5;
            let point_b = xf_b.transform(local_point);

            let local_point_a = proxy_a.get_vertex(indices[0].a);
            let point_a = xf_a.transform(local_point_a);

            if normal.dot(&(point_a - point_b)) < 0.0 {
                axis = -axis;
            }
            return Self { proxy_a, proxy_b, axis, local_point, kind: SeparationType::FaceB };
        }

        // Two points on A and one or two points on B.
        let local_point_a1 = proxy_a.get_vertex(indices[0].a);
        let local_point_a2 = proxy_a.get_vertex(indices[1].a);
        let mut axis = UnitVec2::from_vec((local_point_a2 - local_point_a1).fwd_perpendicular())
            .unwrap_or(UnitVec2::RIGHT);
        let normal = xf_a.q.rotate_unit(axis);

        let local_point = (local_point_a1 + local_point_a2) * 0.5;
        let point_a = xf_a.transform(local_point);

        let local_point_b = proxy_b.get_vertex(indices[0].b);
        let point_b = xf_b.transform(local_point_b);

        if normal.dot(&(point_b - point_a)) < 0.0 {
            axis = -axis;
        }
        Self { proxy_a, proxy_b, axis, local_point, kind: SeparationType::FaceA }
    }

    /// The finder's axis type
    pub fn get_type(&self) -> SeparationType {
        self.kind
    }

    /// The axis, in world coordinates for `Points` and in the owning
    /// proxy's frame for the face types
    pub fn get_axis(&self) -> UnitVec2 {
        self.axis
    }

    /// Midpoint of the reference face for the face types
    pub fn get_local_point(&self) -> Vec2 {
        self.local_point
    }

    /// Finds the deepest pair of vertices along the axis at the given
    /// transformations
    pub fn find_min_separation(&self, xf_a: &Transformation, xf_b: &Transformation) -> LengthIndexPair {
        match self.kind {
            SeparationType::Points => {
                let axis = self.axis.to_vec();
                let index_a = self.proxy_a.get_support_index(xf_a.q.inverse_rotate(axis));
                let index_b = self.proxy_b.get_support_index(xf_b.q.inverse_rotate(-axis));
                let point_a = xf_a.transform(self.proxy_a.get_vertex(index_a));
                let point_b = xf_b.transform(self.proxy_b.get_vertex(index_b));
                LengthIndexPair {
                    distance: self.axis.dot(&(point_b - point_a)),
                    indices: IndexPair::new(index_a, index_b),
                }
            }
            SeparationType::FaceA => {
                let normal = xf_a.q.rotate_unit(self.axis);
                let point_a = xf_a.transform(self.local_point);
                let index_b = self.proxy_b.get_support_index(xf_b.q.inverse_rotate(-normal.to_vec()));
                let point_b = xf_b.transform(self.proxy_b.get_vertex(index_b));
                LengthIndexPair {
                    distance: normal.dot(&(point_b - point_a)),
                    indices: IndexPair::new(INVALID_INDEX, index_b),
                }
            }
            SeparationType::FaceB => {
                let normal = xf_b.q.rotate_unit(self.axis);
                let point_b = xf_b.transform(self.local_point);
                let index_a = self.proxy_a.get_support_index(xf_a.q.inverse_rotate(-normal.to_vec()));
                let point_a = xf_a.transform(self.proxy_a.get_vertex(index_a));
                LengthIndexPair {
                    distance: normal.dot(&(point_a - point_b)),
                    indices: IndexPair::new(index_a, INVALID_INDEX),
                }
            }
        }
    }

    /// Separation of a specific vertex pair along the axis. For the face
    /// types the face side's index is ignored.
    pub fn evaluate(&self, indices: IndexPair, xf_a: &Transformation, xf_b: &Transformation) -> Real {
        match self.kind {
            SeparationType::Points => {
                let point_a = xf_a.transform(self.proxy_a.get_vertex(indices.a));
                let point_b = xf_b.transform(self.proxy_b.get_vertex(indices.b));
                self.axis.dot(&(point_b - point_a))
            }
            SeparationType::FaceA => {
                let normal = xf_a.q.rotate_unit(self.axis);
                let point_a = xf_a.transform(self.local_point);
                let point_b = xf_b.transform(self.proxy_b.get_vertex(indices.b));
                normal.dot(&(point_b - point_a))
            }
            SeparationType::FaceB => {
                let normal = xf_b.q.rotate_unit(self.axis);
                let point_b = xf_b.transform(self.local_point);
                let point_a = xf_a.transform(self.proxy_a.get_vertex(indices.a));
                normal.dot(&(point_a - point_b))
            }
        }
    }
}
